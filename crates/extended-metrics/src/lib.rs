use async_trait::async_trait;
use market_core::{ExtendedMetrics, ExtendedScoring, MarketError, MarketPhase, RiskLevel};
use market_data::{MarketDataset, RegionKey};
use std::sync::Arc;

/// Fallbacks applied when a region has a price series but lacks the
/// auxiliary indicator rows.
const DEFAULT_MONTHLY_RENT: f64 = 2_000.0;
const DEFAULT_COST_OF_LIVING: f64 = 100.0;
const DEFAULT_PERMITS: i64 = 0;

/// Scores derived metrics: price-to-rent, cost of living and construction
/// activity, each as an independent sub-dimension.
pub struct ExtendedMetricsEngine {
    dataset: Arc<MarketDataset>,
}

impl ExtendedMetricsEngine {
    pub fn new(dataset: Arc<MarketDataset>) -> Self {
        Self { dataset }
    }
}

fn round_to(value: f64, decimals: u32) -> f64 {
    let factor = 10f64.powi(decimals as i32);
    (value * factor).round() / factor
}

#[async_trait]
impl ExtendedScoring for ExtendedMetricsEngine {
    async fn extended_metrics(&self, region: &str) -> Result<ExtendedMetrics, MarketError> {
        let key = RegionKey::new(region);
        let Some(latest_price) = self.dataset.latest_price(&key) else {
            return Ok(ExtendedMetrics::unavailable(format!(
                "Region not found: {region}"
            )));
        };

        let monthly_rent = self
            .dataset
            .monthly_rent(&key)
            .unwrap_or(DEFAULT_MONTHLY_RENT);
        let cost_of_living = self
            .dataset
            .cost_of_living(&key)
            .unwrap_or(DEFAULT_COST_OF_LIVING);
        let permits = self.dataset.active_permits(&key).unwrap_or(DEFAULT_PERMITS);

        let annual_rent = monthly_rent * 12.0;
        let price_to_rent = latest_price / annual_rent;
        let rental_yield = annual_rent / latest_price;
        let saturation = permits as f64 / 10.0;

        let mut opportunities = Vec::new();
        let mut concerns = Vec::new();

        let ptr_score = if price_to_rent < 15.0 {
            opportunities.push("Favorable price-to-rent ratio".to_string());
            85.0
        } else if price_to_rent < 20.0 {
            70.0
        } else {
            concerns.push("High price-to-rent ratio".to_string());
            50.0
        };

        let col_score = if cost_of_living <= 100.0 {
            opportunities.push("Below average cost of living".to_string());
            80.0
        } else if cost_of_living <= 120.0 {
            65.0
        } else {
            concerns.push("High cost of living".to_string());
            50.0
        };

        let construction_score = if permits > 10 {
            concerns.push("Potential market saturation".to_string());
            60.0
        } else if permits > 5 {
            75.0
        } else {
            opportunities.push("Limited new supply".to_string());
            90.0
        };

        let investment_score = (ptr_score + col_score + construction_score) / 3.0;
        let market_phase = MarketPhase::from_investment_score(investment_score);
        let risk_level = RiskLevel::from_concern_count(concerns.len());

        tracing::debug!(
            region,
            investment_score,
            ?market_phase,
            ?risk_level,
            "scored extended metrics"
        );

        let note = format!(
            "Market is in {} phase with {} risk. Rental yield is {:.1}%. \
             Cost of living is {:.2}x national average. \
             Construction activity: {} active permits.",
            market_phase.as_str().to_lowercase(),
            risk_level.as_str().to_lowercase(),
            rental_yield * 100.0,
            cost_of_living / 100.0,
            permits
        );

        Ok(ExtendedMetrics {
            price_to_rent_ratio: Some(round_to(price_to_rent, 2)),
            rental_yield_pct: Some(round_to(rental_yield * 100.0, 1)),
            cost_of_living_index: Some(round_to(cost_of_living, 1)),
            active_permits: Some(permits),
            saturation_index: Some(round_to(saturation, 2)),
            investment_score: Some(round_to(investment_score, 1)),
            market_phase,
            risk_level,
            opportunities,
            concerns,
            note,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine(dataset: MarketDataset) -> ExtendedMetricsEngine {
        ExtendedMetricsEngine::new(Arc::new(dataset))
    }

    #[tokio::test]
    async fn test_favorable_market_is_growth_low_risk() {
        // price-to-rent 10.5, cheap living, almost no construction
        let dataset = MarketDataset::new()
            .with_price_history("Atlanta", vec![250_000.0, 252_000.0])
            .with_monthly_rent("Atlanta", 2_000.0)
            .with_cost_of_living("Atlanta", 96.5)
            .with_active_permits("Atlanta", 3);
        let result = engine(dataset).extended_metrics("Atlanta").await.unwrap();

        // (85 + 80 + 90) / 3 = 85
        assert_eq!(result.investment_score, Some(85.0));
        assert_eq!(result.market_phase, MarketPhase::Growth);
        assert_eq!(result.risk_level, RiskLevel::Low);
        assert_eq!(result.opportunities.len(), 3);
        assert!(result.concerns.is_empty());
    }

    #[tokio::test]
    async fn test_overheated_market_is_caution_high_risk() {
        // price-to-rent ~25, expensive, heavy construction
        let dataset = MarketDataset::new()
            .with_price_history("Los Angeles", vec![850_000.0, 870_000.0])
            .with_monthly_rent("Los Angeles", 2_900.0)
            .with_cost_of_living("Los Angeles", 134.7)
            .with_active_permits("Los Angeles", 12);
        let result = engine(dataset)
            .extended_metrics("Los Angeles")
            .await
            .unwrap();

        // (50 + 50 + 60) / 3 = 53.3
        assert_eq!(result.investment_score, Some(53.3));
        assert_eq!(result.market_phase, MarketPhase::Caution);
        assert_eq!(result.risk_level, RiskLevel::High);
        assert_eq!(result.concerns.len(), 3);
    }

    #[tokio::test]
    async fn test_single_concern_is_moderate_risk() {
        // Only cost of living flags a concern
        let dataset = MarketDataset::new()
            .with_price_history("Chicago", vec![390_000.0])
            .with_monthly_rent("Chicago", 1_800.0)
            .with_cost_of_living("Chicago", 125.0)
            .with_active_permits("Chicago", 7);
        let result = engine(dataset).extended_metrics("Chicago").await.unwrap();

        assert_eq!(result.risk_level, RiskLevel::Moderate);
        assert_eq!(result.concerns, vec!["High cost of living".to_string()]);
    }

    #[tokio::test]
    async fn test_auxiliary_fallbacks_apply_when_rows_missing() {
        // Price series only: rent 2000, col 100, permits 0
        let dataset = MarketDataset::new().with_price_history("Tulsa", vec![300_000.0]);
        let result = engine(dataset).extended_metrics("Tulsa").await.unwrap();

        // price-to-rent 12.5 -> 85, col 100 -> 80, permits 0 -> 90
        assert_eq!(result.price_to_rent_ratio, Some(12.5));
        assert_eq!(result.cost_of_living_index, Some(100.0));
        assert_eq!(result.active_permits, Some(0));
        assert_eq!(result.investment_score, Some(85.0));
    }

    #[tokio::test]
    async fn test_region_not_found() {
        let dataset = MarketDataset::new();
        let result = engine(dataset)
            .extended_metrics("NonExistentCity")
            .await
            .unwrap();

        assert!(result.investment_score.is_none());
        assert_eq!(result.market_phase, MarketPhase::Unknown);
        assert_eq!(result.risk_level, RiskLevel::Unknown);
        assert!(result.note.contains("Region not found"));
    }

    #[tokio::test]
    async fn test_saturation_index_is_permits_over_ten() {
        let dataset = MarketDataset::new()
            .with_price_history("Phoenix", vec![420_000.0])
            .with_active_permits("Phoenix", 12);
        let result = engine(dataset).extended_metrics("Phoenix").await.unwrap();

        assert_eq!(result.saturation_index, Some(1.2));
    }
}
