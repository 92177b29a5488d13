use async_trait::async_trait;
use market_core::{clamp_score, MarketError, TrendScore, TrendScoring};
use market_data::{MarketDataset, RegionKey};
use serde_json::json;
use statrs::statistics::Statistics;
use std::sync::Arc;

/// Lookback window applied when the caller does not specify one
pub const DEFAULT_LOOKBACK_MONTHS: usize = 36;

/// Minimum number of price points required to score a trend
pub const MIN_HISTORY_POINTS: usize = 12;

/// Scores a region's price-trend history from appreciation and volatility
/// of month-over-month changes.
pub struct TrendAnalysisEngine {
    dataset: Arc<MarketDataset>,
}

impl TrendAnalysisEngine {
    pub fn new(dataset: Arc<MarketDataset>) -> Self {
        Self { dataset }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[async_trait]
impl TrendScoring for TrendAnalysisEngine {
    async fn trend_score(
        &self,
        region: &str,
        lookback_months: usize,
    ) -> Result<TrendScore, MarketError> {
        let key = RegionKey::new(region);
        let Some(series) = self.dataset.price_history(&key) else {
            return Ok(TrendScore::unavailable(format!(
                "Region not found: {region}"
            )));
        };

        let window = &series[series.len().saturating_sub(lookback_months)..];
        if window.len() < MIN_HISTORY_POINTS {
            return Ok(TrendScore::unavailable(format!(
                "Insufficient data for {region}. Need at least {MIN_HISTORY_POINTS} months."
            )));
        }

        let changes: Vec<f64> = window.windows(2).map(|w| (w[1] - w[0]) / w[0]).collect();
        let changes_slice: &[f64] = &changes;
        let avg_appreciation = changes_slice.mean();
        let volatility = changes_slice.population_std_dev();

        let base_score = clamp_score(50.0 + avg_appreciation * 500.0 - volatility * 300.0);

        let (score, strength_note) = if avg_appreciation > 0.06 && volatility < 0.07 {
            (
                clamp_score(base_score + 15.0),
                "Strong appreciation with low volatility",
            )
        } else if avg_appreciation > 0.04 {
            (
                clamp_score(base_score + 5.0),
                "Stable growth with moderate volatility",
            )
        } else if avg_appreciation > 0.02 {
            (base_score, "Modest but consistent appreciation")
        } else if avg_appreciation > 0.0 {
            (
                clamp_score(base_score - 5.0),
                "Slow but positive appreciation",
            )
        } else {
            (
                clamp_score(base_score - 15.0),
                "Low or negative appreciation",
            )
        };

        let volatility_note = if volatility > 0.1 {
            " (High price volatility)"
        } else if volatility > 0.05 {
            " (Moderate price volatility)"
        } else {
            " (Stable prices)"
        };

        tracing::debug!(
            region,
            score,
            avg_appreciation,
            volatility,
            "scored price trend"
        );

        Ok(TrendScore::new(
            round_to(score, 1),
            round_to(avg_appreciation, 4),
            round_to(volatility, 4),
            format!("{strength_note}{volatility_note}"),
            json!({
                "price_history": window,
                "monthly_changes": changes,
                "base_score": base_score,
            }),
        ))
    }
}
