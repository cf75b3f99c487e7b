//! Terminal rendering for replies, product cards and reports.

use moodcart_common::{AnalyticsReport, Product, RecommendResponse};
use owo_colors::OwoColorize;

/// Print the assistant's reply, rationale and product cards.
pub fn render_response(response: &RecommendResponse) {
    println!();
    println!(
        "{} {}  {}",
        response.glyph,
        response.emotion.to_string().bold(),
        format!("({:.0}% confidence)", response.confidence * 100.0).dimmed()
    );
    println!();
    println!("{}", response.reply);
    println!();
    println!("{}", response.rationale.italic().dimmed());

    if response.products.is_empty() {
        return;
    }

    println!();
    for (i, product) in response.products.iter().enumerate() {
        render_card(i + 1, product);
    }
    println!(
        "{}",
        "Tip: moodcartctl feedback --title \"...\" --query \"...\" accept".dimmed()
    );
}

fn render_card(index: usize, product: &Product) {
    println!(
        "{} {}  {}",
        format!("{}.", index).bold(),
        product.title.bold(),
        product.price.green().bold()
    );
    println!("   {}", product.description);
    println!(
        "   {} | {} | {} | {}",
        product.category.cyan(),
        product.rating,
        product.stock,
        product.brand
    );
    println!("   {}", format!("via {}", product.source.label()).dimmed());
    if let Some(link) = &product.link {
        println!("   {}", link.underline().blue());
    }
    println!();
}

/// Print the analytics report from /v1/stats.
pub fn render_stats(report: &AnalyticsReport) {
    println!("{}", "Marketplace".bold().underline());
    println!(
        "  {} active products from {} partner businesses",
        report.counters.active_products, report.counters.partner_businesses
    );
    println!(
        "  {} recommendation calls, {} accepted products",
        report.counters.total_attempts, report.counters.accepted_total
    );

    println!();
    println!("{}", "Method performance (last 7 days)".bold().underline());
    if report.methods.is_empty() {
        println!("  {}", "no recommendation calls yet".dimmed());
    }
    for method in &report.methods {
        println!(
            "  {:<20} {:>4} uses  {:>5.1} avg products  {:>7.0} ms avg",
            method.strategy, method.uses, method.avg_products, method.avg_latency_ms
        );
    }

    println!();
    println!("{}", "Feedback".bold().underline());
    if report.feedback.is_empty() {
        println!("  {}", "no feedback yet".dimmed());
    }
    for row in &report.feedback {
        let verdict = if row.verdict == "accept" {
            row.verdict.green().to_string()
        } else {
            row.verdict.red().to_string()
        };
        println!("  {:<16} via {:<20} {:>4}", verdict, row.source, row.count);
    }

    println!();
    println!("{}", "Top learned patterns".bold().underline());
    if report.top_patterns.is_empty() {
        println!("  {}", "nothing learned yet".dimmed());
    }
    for pattern in &report.top_patterns {
        println!(
            "  \"{}\" while {} -> {}  ({}x)",
            pattern.query_prefix,
            pattern.emotion,
            pattern.categories.join(", "),
            pattern.success_count
        );
    }
}
