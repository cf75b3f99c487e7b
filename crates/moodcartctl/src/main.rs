//! Moodcart Control - CLI client for the moodcart daemon.
//!
//! Talks HTTP to `moodcartd` for recommendations, feedback and stats;
//! the `seed` command writes demo marketplace rows straight to the
//! shared store.

mod client;
mod commands;
mod display;

use anyhow::Result;
use clap::{Parser, Subcommand};
use client::{DaemonClient, DEFAULT_DAEMON_URL};
use moodcart_common::{FeedbackVerdict, Strategy};

#[derive(Parser)]
#[command(name = "moodcartctl")]
#[command(about = "Moodcart - emotion-aware product recommendations", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the moodcartd daemon
    #[arg(long, global = true, default_value = DEFAULT_DAEMON_URL)]
    daemon_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session
    Chat,

    /// Ask a single question and print the recommendations
    Ask {
        /// What you are looking for, in your own words
        query: String,
    },

    /// Tell the daemon whether a shown product helped
    Feedback {
        /// Title of the product the verdict is about
        #[arg(long)]
        title: String,

        /// The query that produced the product
        #[arg(long)]
        query: String,

        /// accept or reject
        verdict: FeedbackVerdict,

        /// Which step produced it (e.g. semantic_ai, web_search)
        #[arg(long, default_value = "semantic_ai")]
        source: Strategy,

        /// Product category, if known
        #[arg(long)]
        category: Option<String>,
    },

    /// Show learning and marketplace analytics
    Stats,

    /// Insert a demo partner business with emotion-tagged products
    Seed,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let client = DaemonClient::new(&cli.daemon_url);

    match cli.command {
        Commands::Chat => commands::chat(&client).await,
        Commands::Ask { query } => commands::ask(&client, &query).await,
        Commands::Feedback {
            title,
            query,
            verdict,
            source,
            category,
        } => commands::feedback(&client, title, query, verdict, source, category).await,
        Commands::Stats => commands::stats(&client).await,
        Commands::Seed => commands::seed().await,
    }
}
