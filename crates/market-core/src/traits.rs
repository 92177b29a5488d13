use crate::{
    EconomicsScore, ExtendedMetrics, MarketAnalysisResult, MarketError, PropertyScore, TrendScore,
};
use async_trait::async_trait;

/// Trait for price-trend scoring engines
#[async_trait]
pub trait TrendScoring: Send + Sync {
    async fn trend_score(
        &self,
        region: &str,
        lookback_months: usize,
    ) -> Result<TrendScore, MarketError>;
}

/// Trait for market-economics scoring engines
#[async_trait]
pub trait EconomicsScoring: Send + Sync {
    async fn market_score(
        &self,
        region: &str,
        actual_income: f64,
    ) -> Result<EconomicsScore, MarketError>;
}

/// Trait for extended-metrics scoring engines
#[async_trait]
pub trait ExtendedScoring: Send + Sync {
    async fn extended_metrics(&self, region: &str) -> Result<ExtendedMetrics, MarketError>;
}

/// Optional narrative collaborator, invoked only after the numeric result
/// is final. Its failure never alters scores or classifications.
#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(
        &self,
        result: &MarketAnalysisResult,
        property: &PropertyScore,
    ) -> Result<String, MarketError>;
}
