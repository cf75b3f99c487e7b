//! Moodcart daemon - emotion-aware product recommendation service.
//!
//! Classifies the user's emotional state from their message, then walks a
//! fixed-priority chain of product sources until one delivers, learning
//! from explicit feedback which categories work for which moods.

pub mod emotion;
pub mod feedback;
pub mod llm;
pub mod orchestrator;
pub mod reply;
pub mod routes;
pub mod server;
pub mod sources;
