//! Empathetic reply composition.
//!
//! The final chat reply is written by the completion service from the
//! emotion reading, the chain's rationale and a short product digest.
//! When the service is down the reply falls back to canned per-emotion
//! text, so the user always gets an answer.

use crate::llm::CompletionClient;
use moodcart_common::{ChatTurn, Emotion, EmotionReading, Recommendation};
use tracing::debug;

/// How many products the prompt digests.
const DIGEST_PRODUCTS: usize = 3;

/// How many trailing conversation turns the prompt includes.
const HISTORY_TURNS: usize = 2;

/// Compose the reply shown above the product cards.
pub async fn compose(
    llm: &dyn CompletionClient,
    query: &str,
    reading: EmotionReading,
    recommendation: &Recommendation,
    history: &[ChatTurn],
) -> String {
    let prompt = build_prompt(query, reading, recommendation, history);

    match llm.complete(&prompt).await {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => fallback(reading.emotion),
        Err(e) => {
            debug!("Reply composition unavailable: {:#}", e);
            fallback(reading.emotion)
        }
    }
}

fn build_prompt(
    query: &str,
    reading: EmotionReading,
    recommendation: &Recommendation,
    history: &[ChatTurn],
) -> String {
    let mut digest = String::new();
    for (i, product) in recommendation.products.iter().take(DIGEST_PRODUCTS).enumerate() {
        digest.push_str(&format!(
            "{}. {} ({}) - {}\n   {}\n",
            i + 1,
            product.title,
            product.source.label(),
            product.price,
            truncate(&product.description, 120),
        ));
    }

    let mut context = String::new();
    for turn in history.iter().rev().take(HISTORY_TURNS).rev() {
        let role = if turn.role == "user" { "User" } else { "Assistant" };
        context.push_str(&format!("{}: {}\n", role, truncate(&turn.content, 100)));
    }

    format!(
        "You are Moodcart, a warm and caring shopping assistant.\n\
         \n\
         Current context:\n\
         - User emotion: {emotion} (confidence {confidence:.2})\n\
         - How products were found: {rationale}\n\
         - Products found: {count}\n\
         \n\
         Response pattern:\n\
         1. Acknowledge their emotion with genuine empathy\n\
         2. Briefly say how the products were found\n\
         3. Highlight the products, local businesses first\n\
         4. Ask one caring follow-up question\n\
         \n\
         Keep it warm and concise, 2-3 short paragraphs.\n\
         \n\
         Conversation so far:\n{context}\n\
         Current user message: {query}\n\
         \n\
         Recommended products:\n{digest}",
        emotion = reading.emotion,
        confidence = reading.confidence,
        rationale = recommendation.rationale,
        count = recommendation.products.len(),
        context = context,
        query = query,
        digest = digest,
    )
}

/// Canned replies used when the completion service is unreachable.
fn fallback(emotion: Emotion) -> String {
    match emotion {
        Emotion::Sad => {
            "I can sense you're feeling down, and that's completely okay. \
             I've picked out some things that might help lift your spirits. \
             What kind of things usually make you feel better?"
        }
        Emotion::Stressed => {
            "I can feel the stress in your message, and I understand. \
             Take a deep breath - here are some picks that might help you \
             unwind. What usually helps you relax?"
        }
        Emotion::Excited => {
            "Your excitement is wonderful! I've found some options that \
             match your energy. What's got you feeling so great today?"
        }
        _ => {
            "Here's what I found for you. Tell me a bit more about what \
             you're looking for and I can narrow it down."
        }
    }
    .to_string()
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((idx, _)) => format!("{}...", &s[..idx]),
        None => s.to_string(),
    }
}
