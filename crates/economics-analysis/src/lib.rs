use async_trait::async_trait;
use market_core::{clamp_score, EconomicsScore, EconomicsScoring, MarketError, MarketHealth};
use market_data::{MarketDataset, RegionKey};
use std::sync::Arc;

/// Household income assumed when the caller does not supply one
pub const DEFAULT_INCOME: f64 = 80_000.0;

/// Share of income conventionally budgeted for housing debt service
const DTI_RATIO: f64 = 0.28;

/// Container for derived market metrics
#[derive(Debug, Clone, Copy)]
struct MarketMetrics {
    affordability_ratio: f64,
    inventory_months: f64,
    sales_velocity: f64,
    price_to_income: f64,
}

/// Scores macro-affordability economics: income requirements, sales volume
/// and inventory pressure.
pub struct EconomicsAnalysisEngine {
    dataset: Arc<MarketDataset>,
}

impl EconomicsAnalysisEngine {
    pub fn new(dataset: Arc<MarketDataset>) -> Self {
        Self { dataset }
    }

    fn calculate_metrics(
        income_required: f64,
        monthly_sales: f64,
        inventory: f64,
        actual_income: f64,
    ) -> MarketMetrics {
        let affordability_ratio = income_required / actual_income;
        let inventory_months = if monthly_sales > 0.0 {
            inventory / monthly_sales
        } else {
            f64::INFINITY
        };
        let sales_velocity = if inventory > 0.0 {
            monthly_sales / inventory
        } else {
            0.0
        };
        let price_to_income = income_required / (actual_income * DTI_RATIO);

        MarketMetrics {
            affordability_ratio,
            inventory_months,
            sales_velocity,
            price_to_income,
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[async_trait]
impl EconomicsScoring for EconomicsAnalysisEngine {
    async fn market_score(
        &self,
        region: &str,
        actual_income: f64,
    ) -> Result<EconomicsScore, MarketError> {
        if !actual_income.is_finite() || actual_income <= 0.0 {
            return Err(MarketError::Validation(format!(
                "household income must be positive, got {actual_income}"
            )));
        }

        let key = RegionKey::new(region);

        // The three indicator tables are independently sourced; a partial
        // match produces no score rather than a misleading one.
        let (Some(income_required), Some(monthly_sales), Some(inventory)) = (
            self.dataset.income_required(&key),
            self.dataset.monthly_sales(&key),
            self.dataset.inventory(&key),
        ) else {
            return Ok(EconomicsScore::unavailable(format!(
                "Region not found or incomplete data: {region}"
            )));
        };

        let metrics =
            Self::calculate_metrics(income_required, monthly_sales, inventory, actual_income);

        let mut score = 70.0;
        let mut warnings = Vec::new();

        if metrics.affordability_ratio > 1.5 {
            score -= 15.0;
            warnings.push("Severe affordability concerns".to_string());
        } else if metrics.affordability_ratio > 1.2 {
            score -= 10.0;
            warnings.push("Moderate affordability concerns".to_string());
        }

        if metrics.inventory_months < 3.0 {
            score += 10.0;
            warnings.push("Low inventory levels".to_string());
        } else if metrics.inventory_months > 6.0 {
            score -= 10.0;
            warnings.push("High inventory levels".to_string());
        }

        if metrics.sales_velocity > 0.33 {
            score += 5.0;
        } else if metrics.sales_velocity < 0.15 {
            score -= 5.0;
            warnings.push("Slow sales velocity".to_string());
        }

        let score = clamp_score(score);
        let market_health = MarketHealth::from_score(score);

        tracing::debug!(region, score, ?market_health, "scored market economics");

        let note = format!(
            "Market shows {} conditions with {:.1} months of inventory. \
             Required income is {:.1}x actual income. Monthly sales velocity: {:.2}",
            market_health.as_str().to_lowercase(),
            metrics.inventory_months,
            metrics.affordability_ratio,
            metrics.sales_velocity
        );

        Ok(EconomicsScore {
            score: Some(score),
            affordability_ratio: Some(round2(metrics.affordability_ratio)),
            monthly_sales: Some(monthly_sales as i64),
            inventory_level: Some(inventory as i64),
            price_to_income: Some(round2(metrics.price_to_income)),
            market_health,
            note,
            warnings,
        })
    }
}
