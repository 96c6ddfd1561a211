//! Prediction-market signal filter.
//!
//! Pulls the most active open markets from a Polymarket-style listing
//! endpoint and keeps the ones with a strong signal: a yes price far from
//! even odds, or heavy volume. Listing order (volume, descending) is kept.

use crate::config::PredictionSettings;
use crate::error::DigestError;
use crate::models::PredictionMarket;
use crate::utils::truncate_for_log;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

const DEFAULT_YES_PRICE: f64 = 50.0;

/// A market as returned by the listing endpoint.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawMarket {
    #[serde(default)]
    pub question: Option<String>,
    /// Stringified JSON array, e.g. `"[\"0.02\", \"0.98\"]"`.
    #[serde(default)]
    pub outcome_prices: Option<String>,
    /// Usually a numeric string; some responses send a number.
    #[serde(default)]
    pub volume: Option<Value>,
    #[serde(default)]
    pub volume_num: Option<f64>,
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
}

impl RawMarket {
    /// First outcome price scaled to 0..=100; 50 when absent or unparseable.
    pub fn yes_price(&self) -> f64 {
        self.outcome_prices
            .as_deref()
            .and_then(|raw| serde_json::from_str::<Vec<Value>>(raw).ok())
            .and_then(|prices| prices.first().and_then(number))
            .filter(|p| p.is_finite())
            .map(|p| p * 100.0)
            .unwrap_or(DEFAULT_YES_PRICE)
    }

    /// `volumeNum`, else `volume` parsed; 0 when neither is usable.
    pub fn volume(&self) -> f64 {
        self.volume_num
            .or_else(|| self.volume.as_ref().and_then(number))
            .filter(|v| v.is_finite())
            .unwrap_or(0.0)
    }

    pub fn to_prediction(&self) -> PredictionMarket {
        PredictionMarket {
            title: self.question.clone().unwrap_or_default(),
            yes_price: self.yes_price(),
            volume: self.volume(),
        }
    }
}

/// Whether a market carries enough signal to show.
pub fn is_interesting(market: &PredictionMarket, settings: &PredictionSettings) -> bool {
    if market.title.trim().is_empty() || !market.yes_price.is_finite() {
        return false;
    }
    let discrepancy = (market.yes_price - 50.0).abs();
    discrepancy > settings.min_discrepancy || market.volume > settings.min_volume
}

/// Convert, filter and cap a listing, preserving its order.
pub fn select(markets: &[RawMarket], settings: &PredictionSettings) -> Vec<PredictionMarket> {
    markets
        .iter()
        .map(RawMarket::to_prediction)
        .filter(|m| is_interesting(m, settings))
        .take(settings.max_results)
        .collect()
}

async fn fetch_markets(
    client: &Client,
    settings: &PredictionSettings,
) -> Result<Vec<RawMarket>, DigestError> {
    let url = format!("{}/markets", settings.base_url.trim_end_matches('/'));
    let response = client
        .get(&url)
        .query(&[
            ("closed", "false"),
            ("order", "volume"),
            ("ascending", "false"),
            ("limit", "25"),
        ])
        .send()
        .await?;
    let status = response.status();
    if !status.is_success() {
        return Err(DigestError::Status {
            status: status.as_u16(),
            url,
        });
    }
    let body = response.text().await?;
    serde_json::from_str(&body).map_err(|e| {
        warn!(
            error = %e,
            body_preview = %truncate_for_log(&body, 300),
            "Market listing is not the expected JSON"
        );
        DigestError::Json(e)
    })
}

/// Fetch and filter markets; any failure yields an empty list.
#[instrument(level = "info", skip_all, fields(base_url = %settings.base_url))]
pub async fn fetch_predictions(client: &Client, settings: &PredictionSettings) -> Vec<PredictionMarket> {
    match fetch_markets(client, settings).await {
        Ok(markets) => {
            let selected = select(&markets, settings);
            info!(listed = markets.len(), selected = selected.len(), "Filtered prediction markets");
            selected
        }
        Err(e) => {
            error!(error = %e, "Failed to fetch predictions");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn market(question: &str, prices: Option<&str>, volume_num: Option<f64>) -> RawMarket {
        RawMarket {
            question: Some(question.to_string()),
            outcome_prices: prices.map(str::to_string),
            volume: None,
            volume_num,
        }
    }

    #[test]
    fn test_yes_price_parsing() {
        assert_eq!(market("q", Some(r#"["0.7", "0.3"]"#), None).yes_price(), 70.0);
        assert_eq!(market("q", Some("[0.25, 0.75]"), None).yes_price(), 25.0);
        assert_eq!(market("q", None, None).yes_price(), 50.0);
        assert_eq!(market("q", Some("not json"), None).yes_price(), 50.0);
        assert_eq!(market("q", Some("[]"), None).yes_price(), 50.0);
        assert_eq!(market("q", Some(r#"["abc"]"#), None).yes_price(), 50.0);
        assert_eq!(market("q", Some(r#"["NaN"]"#), None).yes_price(), 50.0);
    }

    #[test]
    fn test_volume_sources() {
        let mut m = market("q", None, Some(1234.0));
        m.volume = Some(json!("99"));
        assert_eq!(m.volume(), 1234.0);

        m.volume_num = None;
        assert_eq!(m.volume(), 99.0);

        m.volume = Some(json!(15000.5));
        assert_eq!(m.volume(), 15000.5);

        m.volume = Some(json!("lots"));
        assert_eq!(m.volume(), 0.0);
    }

    #[test]
    fn test_signal_filter() {
        let settings = PredictionSettings::default();
        let weak = market("Will it snow?", Some(r#"["0.55","0.45"]"#), Some(500.0)).to_prediction();
        let strong = market("Will it rain?", Some(r#"["0.70","0.30"]"#), Some(1.0)).to_prediction();
        let busy = market("Coin flip?", Some(r#"["0.50","0.50"]"#), Some(10_001.0)).to_prediction();
        let edge = market("Edge case?", Some(r#"["0.60","0.40"]"#), Some(10_000.0)).to_prediction();
        assert!(!is_interesting(&weak, &settings));
        assert!(is_interesting(&strong, &settings));
        assert!(is_interesting(&busy, &settings));
        assert!(!is_interesting(&edge, &settings));
    }

    #[test]
    fn test_select_drops_untitled_and_caps_in_order() {
        let settings = PredictionSettings::default();
        let mut markets = vec![market("", Some(r#"["0.99"]"#), None)];
        markets.extend((0..20).map(|i| market(&format!("Market {i}"), Some(r#"["0.05"]"#), None)));
        let selected = select(&markets, &settings);
        assert_eq!(selected.len(), 12);
        assert_eq!(selected[0].title, "Market 0");
        assert_eq!(selected[11].title, "Market 11");
    }

    #[test]
    fn test_raw_market_deserialization() {
        let raw = r#"[{"question":"Fed cut in June?","outcomePrices":"[\"0.12\", \"0.88\"]","volume":"25000.5","closed":false}]"#;
        let markets: Vec<RawMarket> = serde_json::from_str(raw).unwrap();
        let p = markets[0].to_prediction();
        assert_eq!(p.title, "Fed cut in June?");
        assert_eq!(p.yes_price, 12.0);
        assert_eq!(p.volume, 25000.5);
    }
}
