//! Display-currency policy.
//!
//! Catalog upstreams quote USD; local businesses and the generative sources
//! quote the display currency directly. All conversion and formatting goes
//! through the configured [`CurrencyPolicy`] so no adapter hardcodes a rate.

use serde::{Deserialize, Serialize};

/// Placeholder shown when a source could not determine a price.
pub const PRICE_UNKNOWN: &str = "Price varies";

/// The single display currency and its USD conversion rate.
///
/// Deserialized straight from the `[currency]` section of the config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyPolicy {
    /// ISO 4217 code, e.g. "INR".
    #[serde(default = "default_code")]
    pub code: String,

    /// Symbol prefixed to formatted amounts, e.g. "₹".
    #[serde(default = "default_symbol")]
    pub symbol: String,

    /// How many units of the display currency one USD buys.
    #[serde(default = "default_usd_rate")]
    pub usd_rate: f64,
}

fn default_code() -> String {
    "INR".to_string()
}

fn default_symbol() -> String {
    "₹".to_string()
}

fn default_usd_rate() -> f64 {
    83.0
}

impl Default for CurrencyPolicy {
    fn default() -> Self {
        Self {
            code: default_code(),
            symbol: default_symbol(),
            usd_rate: default_usd_rate(),
        }
    }
}

impl CurrencyPolicy {
    /// Convert a USD amount into a formatted display price.
    ///
    /// Fractions are dropped after conversion; catalog prices are shown as
    /// whole units of the display currency.
    pub fn convert_usd(&self, usd: f64) -> String {
        let amount = (usd * self.usd_rate) as i64;
        format!("{}{}", self.symbol, group_thousands(amount))
    }

    /// Format an amount already quoted in the display currency.
    pub fn format_price(&self, amount: f64) -> String {
        format!("{}{}", self.symbol, group_thousands(amount.round() as i64))
    }

    /// Normalize a price field from generative output.
    ///
    /// Models are asked for numeric prices in the display currency but
    /// routinely answer with strings or leave the field out.
    pub fn normalize_generated(&self, value: Option<&serde_json::Value>) -> String {
        match value {
            Some(serde_json::Value::Number(n)) => match n.as_f64() {
                Some(amount) => self.format_price(amount),
                None => PRICE_UNKNOWN.to_string(),
            },
            Some(serde_json::Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            _ => PRICE_UNKNOWN.to_string(),
        }
    }
}

/// Group an integer amount with commas every three digits.
fn group_thousands(amount: i64) -> String {
    let negative = amount < 0;
    let digits = amount.unsigned_abs().to_string();

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if negative {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_convert_usd_truncates_fractions() {
        let policy = CurrencyPolicy::default();
        // 12.5 * 83 = 1037.5, shown as whole units
        assert_eq!(policy.convert_usd(12.5), "₹1,037");
    }

    #[test]
    fn test_format_price_rounds() {
        let policy = CurrencyPolicy::default();
        assert_eq!(policy.format_price(499.6), "₹500");
    }

    #[test]
    fn test_grouping() {
        assert_eq!(group_thousands(0), "0");
        assert_eq!(group_thousands(999), "999");
        assert_eq!(group_thousands(1_000), "1,000");
        assert_eq!(group_thousands(1_234_567), "1,234,567");
    }

    #[test]
    fn test_custom_rate_and_symbol() {
        let policy = CurrencyPolicy {
            code: "EUR".to_string(),
            symbol: "€".to_string(),
            usd_rate: 0.9,
        };
        assert_eq!(policy.convert_usd(100.0), "€90");
    }

    #[test]
    fn test_normalize_generated_variants() {
        let policy = CurrencyPolicy::default();

        let number = serde_json::json!(1200);
        assert_eq!(policy.normalize_generated(Some(&number)), "₹1,200");

        let text = serde_json::json!("₹999 approx");
        assert_eq!(policy.normalize_generated(Some(&text)), "₹999 approx");

        let blank = serde_json::json!("   ");
        assert_eq!(policy.normalize_generated(Some(&blank)), PRICE_UNKNOWN);

        assert_eq!(policy.normalize_generated(None), PRICE_UNKNOWN);
    }
}
