//! Command implementations.

use crate::client::DaemonClient;
use crate::display;
use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use moodcart_common::{
    ChatTurn, FeedbackRequest, FeedbackVerdict, MarketConfig, MarketDb, NewBusinessProduct,
    Strategy,
};
use std::io::{self, BufRead, Write};
use std::time::Duration;

fn spinner(message: &str) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner} {msg}").unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// One-shot question.
pub async fn ask(client: &DaemonClient, query: &str) -> Result<()> {
    let bar = spinner("Thinking about your request...");
    let response = client.recommend(query, Vec::new()).await;
    bar.finish_and_clear();

    display::render_response(&response?);
    Ok(())
}

/// Interactive chat loop. History is kept client-side and replayed to the
/// daemon each turn; the daemon itself is stateless.
pub async fn chat(client: &DaemonClient) -> Result<()> {
    let health = client.health().await?;
    println!(
        "Connected to {} v{} (up {}s). Type your message, or 'quit' to leave.",
        health.service, health.version, health.uptime_secs
    );

    let stdin = io::stdin();
    let mut history: Vec<ChatTurn> = Vec::new();

    loop {
        print!("{} ", style("you>").cyan().bold());
        io::stdout().flush().ok();

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        if matches!(message, "quit" | "exit" | "q") {
            break;
        }

        let bar = spinner("Thinking...");
        let response = client.recommend(message, history.clone()).await;
        bar.finish_and_clear();

        let response = response?;
        display::render_response(&response);

        history.push(ChatTurn {
            role: "user".to_string(),
            content: message.to_string(),
        });
        history.push(ChatTurn {
            role: "assistant".to_string(),
            content: response.reply.clone(),
        });
    }

    println!("Bye!");
    Ok(())
}

/// Forward an accept/reject verdict for a shown product.
pub async fn feedback(
    client: &DaemonClient,
    title: String,
    query: String,
    verdict: FeedbackVerdict,
    source: Strategy,
    category: Option<String>,
) -> Result<()> {
    let request = FeedbackRequest {
        product_title: title,
        query,
        verdict,
        source,
        category,
    };
    client.feedback(&request).await?;

    match verdict {
        FeedbackVerdict::Accept => println!("Thanks! I'll remember what worked."),
        FeedbackVerdict::Reject => println!("Noted. I'll keep looking for better matches."),
    }
    Ok(())
}

/// Show the analytics report.
pub async fn stats(client: &DaemonClient) -> Result<()> {
    let report = client.stats().await?;
    display::render_stats(&report);
    Ok(())
}

/// Insert a demo partner business with a few emotion-tagged products,
/// writing straight to the shared store. Useful for trying the local
/// step without a real partner.
pub async fn seed() -> Result<()> {
    let config = MarketConfig::load();
    let db = MarketDb::open(config.database.location())
        .await
        .context("could not open the market database")?;

    let business_id = db
        .upsert_business("Corner Comforts", "hello@cornercomforts.example")
        .await?;

    let demo: &[(&str, &str, f64, &str, &[&str])] = &[
        (
            "Weighted Blanket",
            "A calming 6kg weighted blanket for deep, restful sleep",
            2999.0,
            "home-decoration",
            &["stressed", "tired"],
        ),
        (
            "Aromatherapy Candle Set",
            "Lavender and sandalwood candles, hand poured in small batches",
            899.0,
            "home-decoration",
            &["stressed", "sad"],
        ),
        (
            "Celebration Gift Hamper",
            "Chocolates, sparkling juice and a handwritten card",
            1499.0,
            "groceries",
            &["happy", "excited"],
        ),
    ];

    for (name, description, price, category, tags) in demo {
        db.add_product(NewBusinessProduct {
            business_id,
            name: name.to_string(),
            description: description.to_string(),
            price: *price,
            category: category.to_string(),
            emotion_tags: tags.iter().map(|t| t.to_string()).collect(),
            link: None,
        })
        .await?;
    }

    println!(
        "Seeded {} demo products for business #{}",
        demo.len(),
        business_id
    );
    Ok(())
}
