use economics_analysis::EconomicsAnalysisEngine;
use extended_metrics::ExtendedMetricsEngine;
use market_core::{
    EconomicsScoring, ExtendedScoring, KeyMetrics, MarketAnalysisResult, MarketError,
    NarrativeGenerator, PropertyScore, TrendScoring,
};
use market_data::MarketDataset;
use std::sync::Arc;
use trend_analysis::{TrendAnalysisEngine, DEFAULT_LOOKBACK_MONTHS};

pub use economics_analysis::DEFAULT_INCOME;

/// Aggregation weights for the three sub-scores; they sum to 1.0.
const TREND_WEIGHT: f64 = 0.3;
const ECONOMIC_WEIGHT: f64 = 0.3;
const INVESTMENT_WEIGHT: f64 = 0.4;

/// Fans out to the three scoring engines, folds their outputs into one
/// immutable result, and never fails: every error mode resolves to a
/// populated result with `error` set.
pub struct MarketAnalysisOrchestrator {
    trend_analyzer: Arc<dyn TrendScoring>,
    economics_analyzer: Arc<dyn EconomicsScoring>,
    extended_analyzer: Arc<dyn ExtendedScoring>,
    narrator: Option<Arc<dyn NarrativeGenerator>>,
}

impl MarketAnalysisOrchestrator {
    pub fn new(
        trend_analyzer: Arc<dyn TrendScoring>,
        economics_analyzer: Arc<dyn EconomicsScoring>,
        extended_analyzer: Arc<dyn ExtendedScoring>,
    ) -> Self {
        Self {
            trend_analyzer,
            economics_analyzer,
            extended_analyzer,
            narrator: None,
        }
    }

    /// Wire the three dataset-backed engines over one shared dataset.
    pub fn from_dataset(dataset: Arc<MarketDataset>) -> Self {
        Self::new(
            Arc::new(TrendAnalysisEngine::new(Arc::clone(&dataset))),
            Arc::new(EconomicsAnalysisEngine::new(Arc::clone(&dataset))),
            Arc::new(ExtendedMetricsEngine::new(dataset)),
        )
    }

    /// Attach the optional narrative collaborator.
    pub fn with_narrator(mut self, narrator: Arc<dyn NarrativeGenerator>) -> Self {
        self.narrator = Some(narrator);
        self
    }

    pub async fn analyze_with_default_income(
        &self,
        region: &str,
        rent: f64,
        value: f64,
    ) -> MarketAnalysisResult {
        self.analyze(region, rent, value, DEFAULT_INCOME).await
    }

    /// Perform a comprehensive market analysis for one region.
    pub async fn analyze(
        &self,
        region: &str,
        rent: f64,
        value: f64,
        income: f64,
    ) -> MarketAnalysisResult {
        tracing::info!(region, rent, value, income, "starting market analysis");

        if let Err(e) = validate_inputs(rent, value, income) {
            tracing::warn!(region, "rejected analysis request: {e}");
            return MarketAnalysisResult::failure(region, e.to_string());
        }

        // The three engines are mutually independent; run them concurrently
        // and wait for all three before combining.
        let (trend_result, econ_result, ext_result) = tokio::join!(
            self.trend_analyzer
                .trend_score(region, DEFAULT_LOOKBACK_MONTHS),
            self.economics_analyzer.market_score(region, income),
            self.extended_analyzer.extended_metrics(region),
        );

        // A missing required sub-score is never defaulted to a number; the
        // first gap short-circuits into the reported error.
        let trend = match trend_result {
            Ok(t) => t,
            Err(e) => {
                tracing::warn!(region, "trend analysis failed: {e}");
                return MarketAnalysisResult::failure(
                    region,
                    format!("Failed to get trend data: {e}"),
                );
            }
        };
        let Some(trend_score) = trend.score else {
            return MarketAnalysisResult::failure(
                region,
                format!("Failed to get trend data: {}", trend.note),
            );
        };

        let econ = match econ_result {
            Ok(e) => e,
            Err(e) => {
                tracing::warn!(region, "economics analysis failed: {e}");
                return MarketAnalysisResult::failure(
                    region,
                    format!("Failed to get economic data: {e}"),
                );
            }
        };
        let Some(economic_score) = econ.score else {
            return MarketAnalysisResult::failure(
                region,
                format!("Failed to get economic data: {}", econ.note),
            );
        };

        let extended = match ext_result {
            Ok(x) => x,
            Err(e) => {
                tracing::warn!(region, "extended metrics failed: {e}");
                return MarketAnalysisResult::failure(
                    region,
                    format!("Failed to get extended metrics: {e}"),
                );
            }
        };
        let Some(investment_score) = extended.investment_score else {
            return MarketAnalysisResult::failure(
                region,
                format!("Failed to get extended metrics: {}", extended.note),
            );
        };

        // Deterministic per-property math, independent of any dataset
        let property = PropertyScore::evaluate(rent, value);

        let final_score = trend_score * TREND_WEIGHT
            + economic_score * ECONOMIC_WEIGHT
            + investment_score * INVESTMENT_WEIGHT;
        let final_score = (final_score * 10.0).round() / 10.0;

        let mut opportunities = extended.opportunities.clone();
        if trend_score >= 75.0 {
            opportunities.push("Strong price appreciation trend".to_string());
        }
        if economic_score >= 75.0 {
            opportunities.push("Favorable economic conditions".to_string());
        }

        let mut risks = extended.concerns.clone();
        if trend_score < 50.0 {
            risks.push("Weak price appreciation".to_string());
        }
        if economic_score < 50.0 {
            risks.push("Challenging economic conditions".to_string());
        }

        let key_metrics = KeyMetrics {
            price_to_rent: extended.price_to_rent_ratio,
            rental_yield: extended.rental_yield_pct,
            appreciation_rate: trend.avg_appreciation.map(|a| a * 100.0),
            cost_of_living: extended.cost_of_living_index,
            affordability_ratio: econ.affordability_ratio,
            inventory_level: econ.inventory_level,
            monthly_sales: econ.monthly_sales,
        };

        let mut result = MarketAnalysisResult {
            region: region.to_string(),
            final_score: Some(final_score),
            trend_score: Some(trend_score),
            economic_score: Some(economic_score),
            investment_score: Some(investment_score),
            // Phase and risk come from the extended analyzer alone; it is
            // the most holistic of the three and this asymmetry is kept.
            risk_level: extended.risk_level,
            market_phase: extended.market_phase,
            key_metrics,
            opportunities,
            risks,
            summary: None,
            error: None,
        };

        // The narrative is strictly post-processing: the numeric result is
        // already final, and a narrator failure leaves it untouched.
        if let Some(narrator) = &self.narrator {
            match narrator.generate(&result, &property).await {
                Ok(summary) => result.summary = Some(summary),
                Err(e) => {
                    tracing::warn!(region, "narrative generation failed: {e}");
                }
            }
        }

        result
    }
}

fn validate_inputs(rent: f64, value: f64, income: f64) -> Result<(), MarketError> {
    for (name, amount) in [("rent", rent), ("value", value), ("income", income)] {
        if !amount.is_finite() || amount <= 0.0 {
            return Err(MarketError::Validation(format!(
                "{name} must be a positive amount, got {amount}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use market_core::{
        EconomicsScore, ExtendedMetrics, MarketHealth, MarketPhase, RiskLevel, TrendScore,
    };

    /// Monthly series compounding at `rate` per month
    fn compounding_series(months: usize, rate: f64) -> Vec<f64> {
        let mut series = Vec::with_capacity(months);
        let mut price = 250_000.0;
        for _ in 0..months {
            series.push(price);
            price *= 1.0 + rate;
        }
        series
    }

    /// Atlanta with full indicator coverage; Sixmonth with a short price
    /// history but complete economics rows.
    fn fixture_dataset() -> Arc<MarketDataset> {
        let dataset = MarketDataset::new()
            .with_price_history("Atlanta", compounding_series(36, 0.015))
            .with_income_required("Atlanta", 80_000.0)
            .with_monthly_sales("Atlanta", 500.0)
            .with_inventory("Atlanta", 1_000.0)
            .with_monthly_rent("Atlanta", 2_000.0)
            .with_cost_of_living("Atlanta", 96.5)
            .with_active_permits("Atlanta", 3)
            .with_price_history("Sixmonth", compounding_series(6, 0.01))
            .with_income_required("Sixmonth", 80_000.0)
            .with_monthly_sales("Sixmonth", 500.0)
            .with_inventory("Sixmonth", 1_000.0);
        Arc::new(dataset)
    }

    fn orchestrator() -> MarketAnalysisOrchestrator {
        MarketAnalysisOrchestrator::from_dataset(fixture_dataset())
    }

    #[tokio::test]
    async fn test_full_analysis_produces_bounded_scores() {
        let result = orchestrator()
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        assert!(result.error.is_none());
        for score in [
            result.final_score,
            result.trend_score,
            result.economic_score,
            result.investment_score,
        ] {
            let score = score.expect("all scores present");
            assert!((0.0..=100.0).contains(&score));
        }
        assert_ne!(result.risk_level, RiskLevel::Unknown);
        assert_ne!(result.market_phase, MarketPhase::Unknown);
    }

    #[tokio::test]
    async fn test_final_score_is_weighted_blend() {
        let result = orchestrator()
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        let blend = result.trend_score.unwrap() * 0.3
            + result.economic_score.unwrap() * 0.3
            + result.investment_score.unwrap() * 0.4;
        // Final score is rounded to one decimal
        assert!((result.final_score.unwrap() - blend).abs() <= 0.05 + 1e-9);
    }

    #[tokio::test]
    async fn test_analysis_is_deterministic() {
        let orchestrator = orchestrator();
        let first = orchestrator
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;
        let second = orchestrator
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[tokio::test]
    async fn test_missing_region_short_circuits_on_trend() {
        let result = orchestrator()
            .analyze("NonExistentCity", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        let error = result.error.expect("error must be set");
        assert!(error.contains("Failed to get trend data"));
        assert!(error.contains("Region not found"));
        assert_eq!(result.risk_level, RiskLevel::Unknown);
        assert_eq!(result.market_phase, MarketPhase::Unknown);
        assert!(result.final_score.is_none());
    }

    #[tokio::test]
    async fn test_insufficient_history_is_reported() {
        let result = orchestrator()
            .analyze("Sixmonth", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        let error = result.error.expect("error must be set");
        assert!(error.contains("at least 12 months"));
        assert!(result.final_score.is_none());
    }

    #[tokio::test]
    async fn test_invalid_inputs_rejected_before_analysis() {
        let orchestrator = orchestrator();

        for (rent, value, income) in [
            (-2_400.0, 330_000.0, 80_000.0),
            (2_400.0, 0.0, 80_000.0),
            (2_400.0, 330_000.0, f64::NAN),
        ] {
            let result = orchestrator.analyze("Atlanta", rent, value, income).await;
            assert!(result.error.unwrap().contains("Validation"));
            assert!(result.final_score.is_none());
        }
    }

    // Fixed-output stubs for exercising the combination logic in isolation

    struct StubTrend(f64);

    #[async_trait]
    impl TrendScoring for StubTrend {
        async fn trend_score(&self, _: &str, _: usize) -> Result<TrendScore, MarketError> {
            Ok(TrendScore::new(
                self.0,
                0.02,
                0.01,
                "stub",
                serde_json::json!({}),
            ))
        }
    }

    struct StubEconomics(Result<f64, ()>);

    #[async_trait]
    impl EconomicsScoring for StubEconomics {
        async fn market_score(&self, _: &str, _: f64) -> Result<EconomicsScore, MarketError> {
            match self.0 {
                Ok(score) => Ok(EconomicsScore {
                    score: Some(score),
                    affordability_ratio: Some(1.0),
                    monthly_sales: Some(500),
                    inventory_level: Some(1_000),
                    price_to_income: Some(3.57),
                    market_health: MarketHealth::Stable,
                    note: "stub".to_string(),
                    warnings: Vec::new(),
                }),
                Err(()) => Err(MarketError::ExternalService("indicator feed down".into())),
            }
        }
    }

    struct StubExtended {
        phase: MarketPhase,
        risk: RiskLevel,
    }

    #[async_trait]
    impl ExtendedScoring for StubExtended {
        async fn extended_metrics(&self, _: &str) -> Result<ExtendedMetrics, MarketError> {
            Ok(ExtendedMetrics {
                price_to_rent_ratio: Some(14.0),
                rental_yield_pct: Some(7.1),
                cost_of_living_index: Some(98.0),
                active_permits: Some(2),
                saturation_index: Some(0.2),
                investment_score: Some(85.0),
                market_phase: self.phase,
                risk_level: self.risk,
                opportunities: vec!["Limited new supply".to_string()],
                concerns: Vec::new(),
                note: "stub".to_string(),
            })
        }
    }

    fn stub_orchestrator(trend: f64, econ: f64) -> MarketAnalysisOrchestrator {
        MarketAnalysisOrchestrator::new(
            Arc::new(StubTrend(trend)),
            Arc::new(StubEconomics(Ok(econ))),
            Arc::new(StubExtended {
                phase: MarketPhase::Growth,
                risk: RiskLevel::Low,
            }),
        )
    }

    #[tokio::test]
    async fn test_phase_and_risk_taken_from_extended_analyzer() {
        let result = stub_orchestrator(40.0, 40.0)
            .analyze("Anywhere", 2_000.0, 300_000.0, DEFAULT_INCOME)
            .await;

        // Weak trend/economics do not override the extended classification
        assert_eq!(result.market_phase, MarketPhase::Growth);
        assert_eq!(result.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn test_opportunity_and_risk_merging() {
        let result = stub_orchestrator(80.0, 45.0)
            .analyze("Anywhere", 2_000.0, 300_000.0, DEFAULT_INCOME)
            .await;

        assert!(result
            .opportunities
            .contains(&"Strong price appreciation trend".to_string()));
        assert!(result
            .opportunities
            .contains(&"Limited new supply".to_string()));
        assert!(result
            .risks
            .contains(&"Challenging economic conditions".to_string()));
        assert!(!result
            .risks
            .contains(&"Weak price appreciation".to_string()));
    }

    #[tokio::test]
    async fn test_exact_weighted_sum_with_stub_scores() {
        let result = stub_orchestrator(80.0, 60.0)
            .analyze("Anywhere", 2_000.0, 300_000.0, DEFAULT_INCOME)
            .await;

        // 80*0.3 + 60*0.3 + 85*0.4 = 76.0, already at one decimal
        assert!((result.final_score.unwrap() - 76.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_analyzer_transport_error_folds_into_result() {
        let orchestrator = MarketAnalysisOrchestrator::new(
            Arc::new(StubTrend(80.0)),
            Arc::new(StubEconomics(Err(()))),
            Arc::new(StubExtended {
                phase: MarketPhase::Growth,
                risk: RiskLevel::Low,
            }),
        );
        let result = orchestrator
            .analyze("Anywhere", 2_000.0, 300_000.0, DEFAULT_INCOME)
            .await;

        let error = result.error.unwrap();
        assert!(error.contains("Failed to get economic data"));
        assert!(error.contains("indicator feed down"));
        assert_eq!(result.risk_level, RiskLevel::Unknown);
    }

    struct StaticNarrator;

    #[async_trait]
    impl NarrativeGenerator for StaticNarrator {
        async fn generate(
            &self,
            result: &MarketAnalysisResult,
            property: &PropertyScore,
        ) -> Result<String, MarketError> {
            Ok(format!(
                "{} scores {:.1}; rent rated {}",
                result.region,
                result.final_score.unwrap_or(0.0),
                property.rent_score
            ))
        }
    }

    struct FailingNarrator;

    #[async_trait]
    impl NarrativeGenerator for FailingNarrator {
        async fn generate(
            &self,
            _: &MarketAnalysisResult,
            _: &PropertyScore,
        ) -> Result<String, MarketError> {
            Err(MarketError::ExternalService("model endpoint down".into()))
        }
    }

    #[tokio::test]
    async fn test_narrator_populates_summary() {
        let orchestrator = MarketAnalysisOrchestrator::from_dataset(fixture_dataset())
            .with_narrator(Arc::new(StaticNarrator));
        let result = orchestrator
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        let summary = result.summary.unwrap();
        assert!(summary.contains("Atlanta"));
        assert!(summary.contains("85")); // rent_score for this rent/value
    }

    #[tokio::test]
    async fn test_narrator_failure_never_alters_numbers() {
        let plain = MarketAnalysisOrchestrator::from_dataset(fixture_dataset());
        let with_failing = MarketAnalysisOrchestrator::from_dataset(fixture_dataset())
            .with_narrator(Arc::new(FailingNarrator));

        let baseline = plain
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;
        let result = with_failing
            .analyze("Atlanta", 2_400.0, 330_000.0, DEFAULT_INCOME)
            .await;

        assert!(result.summary.is_none());
        assert_eq!(
            serde_json::to_string(&baseline).unwrap(),
            serde_json::to_string(&result).unwrap()
        );
    }

    #[tokio::test]
    async fn test_default_income_entry_point() {
        let result = orchestrator()
            .analyze_with_default_income("Atlanta", 2_400.0, 330_000.0)
            .await;
        assert!(result.error.is_none());
    }
}
