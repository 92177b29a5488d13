use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Investment risk classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Unknown,
    Error,
}

impl RiskLevel {
    /// Risk rises with the number of accumulated concern flags.
    pub fn from_concern_count(concerns: usize) -> Self {
        match concerns {
            0 => RiskLevel::Low,
            1 => RiskLevel::Moderate,
            _ => RiskLevel::High,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Moderate => "Moderate",
            RiskLevel::High => "High",
            RiskLevel::Unknown => "Unknown",
            RiskLevel::Error => "Error",
        }
    }
}

/// Market-cycle classification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketPhase {
    Growth,
    Stability,
    Caution,
    Unknown,
    Error,
}

impl MarketPhase {
    pub fn from_investment_score(score: f64) -> Self {
        if score >= 80.0 {
            MarketPhase::Growth
        } else if score >= 65.0 {
            MarketPhase::Stability
        } else {
            MarketPhase::Caution
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketPhase::Growth => "Growth",
            MarketPhase::Stability => "Stability",
            MarketPhase::Caution => "Caution",
            MarketPhase::Unknown => "Unknown",
            MarketPhase::Error => "Error",
        }
    }
}

/// Overall market-health label derived from the economics score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MarketHealth {
    Strong,
    Healthy,
    Stable,
    Challenging,
    Unknown,
    Error,
}

impl MarketHealth {
    pub fn from_score(score: f64) -> Self {
        if score >= 80.0 {
            MarketHealth::Strong
        } else if score >= 65.0 {
            MarketHealth::Healthy
        } else if score >= 50.0 {
            MarketHealth::Stable
        } else {
            MarketHealth::Challenging
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketHealth::Strong => "Strong",
            MarketHealth::Healthy => "Healthy",
            MarketHealth::Stable => "Stable",
            MarketHealth::Challenging => "Challenging",
            MarketHealth::Unknown => "Unknown",
            MarketHealth::Error => "Error",
        }
    }
}

/// Clamp a raw score into the documented [0, 100] range
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Price-trend analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrendScore {
    /// 0-100 score; None when the region cannot be scored
    pub score: Option<f64>,
    pub avg_appreciation: Option<f64>,
    pub volatility: Option<f64>,
    pub note: String,
    /// Raw series and per-period changes, kept for auditability
    #[serde(default)]
    pub detail: Option<Value>,
}

impl TrendScore {
    pub fn new(
        score: f64,
        avg_appreciation: f64,
        volatility: f64,
        note: impl Into<String>,
        detail: Value,
    ) -> Self {
        Self {
            score: Some(clamp_score(score)),
            avg_appreciation: Some(avg_appreciation),
            volatility: Some(volatility),
            note: note.into(),
            detail: Some(detail),
        }
    }

    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            score: None,
            avg_appreciation: None,
            volatility: None,
            note: note.into(),
            detail: None,
        }
    }
}

/// Market-economics analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicsScore {
    /// 0-100 score; None when any required indicator is missing
    pub score: Option<f64>,
    pub affordability_ratio: Option<f64>,
    pub monthly_sales: Option<i64>,
    pub inventory_level: Option<i64>,
    /// Income required vs a 28% debt-to-income budget
    pub price_to_income: Option<f64>,
    pub market_health: MarketHealth,
    pub note: String,
    #[serde(default)]
    pub warnings: Vec<String>,
}

impl EconomicsScore {
    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            score: None,
            affordability_ratio: None,
            monthly_sales: None,
            inventory_level: None,
            price_to_income: None,
            market_health: MarketHealth::Unknown,
            note: note.into(),
            warnings: Vec::new(),
        }
    }
}

/// Extended market-metrics analysis result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtendedMetrics {
    pub price_to_rent_ratio: Option<f64>,
    pub rental_yield_pct: Option<f64>,
    pub cost_of_living_index: Option<f64>,
    pub active_permits: Option<i64>,
    pub saturation_index: Option<f64>,
    /// 0-100 score; None when the region cannot be scored
    pub investment_score: Option<f64>,
    pub market_phase: MarketPhase,
    pub risk_level: RiskLevel,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub concerns: Vec<String>,
    pub note: String,
}

impl ExtendedMetrics {
    pub fn unavailable(note: impl Into<String>) -> Self {
        Self {
            price_to_rent_ratio: None,
            rental_yield_pct: None,
            cost_of_living_index: None,
            active_permits: None,
            saturation_index: None,
            investment_score: None,
            market_phase: MarketPhase::Unknown,
            risk_level: RiskLevel::Unknown,
            opportunities: Vec::new(),
            concerns: Vec::new(),
            note: note.into(),
        }
    }
}

/// Deterministic per-property affordability math, independent of any
/// external dataset.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyScore {
    pub rent_score: f64,
    pub rent_note: String,
    pub monthly_payment: f64,
    pub rental_yield: f64,
    pub rent_ratio: f64,
}

impl PropertyScore {
    /// Estimate carrying cost at 6% of value annually and rate the rent
    /// against it.
    pub fn evaluate(rent: f64, value: f64) -> Self {
        let monthly_payment = value * 0.06 / 12.0;
        let rental_yield = (rent * 12.0) / value;
        let rent_ratio = rent / monthly_payment;

        let (rent_score, rent_note) = if rent_ratio > 1.2 {
            (85.0, "Strong rental potential")
        } else if rent_ratio > 1.0 {
            (70.0, "Fair rental potential")
        } else {
            (55.0, "Below average rental potential")
        };

        Self {
            rent_score,
            rent_note: rent_note.to_string(),
            monthly_payment,
            rental_yield,
            rent_ratio,
        }
    }
}

/// Headline indicators surfaced alongside the final score
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct KeyMetrics {
    pub price_to_rent: Option<f64>,
    pub rental_yield: Option<f64>,
    /// Average monthly appreciation, as a percentage
    pub appreciation_rate: Option<f64>,
    pub cost_of_living: Option<f64>,
    pub affordability_ratio: Option<f64>,
    pub inventory_level: Option<i64>,
    pub monthly_sales: Option<i64>,
}

/// Combined analysis from all scoring engines.
///
/// Immutable once constructed; carries no wall-clock fields so identical
/// inputs serialize identically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketAnalysisResult {
    pub region: String,
    pub final_score: Option<f64>,
    pub trend_score: Option<f64>,
    pub economic_score: Option<f64>,
    pub investment_score: Option<f64>,
    pub risk_level: RiskLevel,
    pub market_phase: MarketPhase,
    #[serde(default)]
    pub key_metrics: KeyMetrics,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub risks: Vec<String>,
    /// Narrative from the optional text-generation collaborator
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

impl MarketAnalysisResult {
    /// A well-formed result for a request that could not be scored.
    pub fn failure(region: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            region: region.into(),
            final_score: None,
            trend_score: None,
            economic_score: None,
            investment_score: None,
            risk_level: RiskLevel::Unknown,
            market_phase: MarketPhase::Unknown,
            key_metrics: KeyMetrics::default(),
            opportunities: Vec::new(),
            risks: Vec::new(),
            summary: None,
            error: Some(error.into()),
        }
    }
}
