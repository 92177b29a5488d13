use crate::region::RegionKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Read-only, region-keyed indicator tables supplied by an external data
/// loader. The engine never writes to a dataset after it is handed over.
///
/// The indicator tables are independently sourced, so a region present in
/// one table may be missing from another; lookups return `None` per table
/// and the analyzers decide how strict to be.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketDataset {
    /// Time-ordered monthly home values per region
    price_history: HashMap<RegionKey, Vec<f64>>,
    /// Income needed to purchase the typical home
    income_required: HashMap<RegionKey, f64>,
    /// Recent monthly sales volume
    monthly_sales: HashMap<RegionKey, f64>,
    /// Current for-sale inventory count
    inventory: HashMap<RegionKey, f64>,
    /// Typical monthly rent
    monthly_rent: HashMap<RegionKey, f64>,
    /// Cost-of-living index, 100 = national average
    cost_of_living: HashMap<RegionKey, f64>,
    /// Active construction permits
    active_permits: HashMap<RegionKey, i64>,
}

impl MarketDataset {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_price_history(mut self, region: &str, series: Vec<f64>) -> Self {
        self.price_history.insert(RegionKey::new(region), series);
        self
    }

    pub fn with_income_required(mut self, region: &str, income: f64) -> Self {
        self.income_required.insert(RegionKey::new(region), income);
        self
    }

    pub fn with_monthly_sales(mut self, region: &str, sales: f64) -> Self {
        self.monthly_sales.insert(RegionKey::new(region), sales);
        self
    }

    pub fn with_inventory(mut self, region: &str, inventory: f64) -> Self {
        self.inventory.insert(RegionKey::new(region), inventory);
        self
    }

    pub fn with_monthly_rent(mut self, region: &str, rent: f64) -> Self {
        self.monthly_rent.insert(RegionKey::new(region), rent);
        self
    }

    pub fn with_cost_of_living(mut self, region: &str, index: f64) -> Self {
        self.cost_of_living.insert(RegionKey::new(region), index);
        self
    }

    pub fn with_active_permits(mut self, region: &str, permits: i64) -> Self {
        self.active_permits.insert(RegionKey::new(region), permits);
        self
    }

    pub fn price_history(&self, region: &RegionKey) -> Option<&[f64]> {
        self.price_history.get(region).map(|s| s.as_slice())
    }

    /// Latest price point of the region's value series
    pub fn latest_price(&self, region: &RegionKey) -> Option<f64> {
        self.price_history
            .get(region)
            .and_then(|s| s.last().copied())
    }

    pub fn income_required(&self, region: &RegionKey) -> Option<f64> {
        self.income_required.get(region).copied()
    }

    pub fn monthly_sales(&self, region: &RegionKey) -> Option<f64> {
        self.monthly_sales.get(region).copied()
    }

    pub fn inventory(&self, region: &RegionKey) -> Option<f64> {
        self.inventory.get(region).copied()
    }

    pub fn monthly_rent(&self, region: &RegionKey) -> Option<f64> {
        self.monthly_rent.get(region).copied()
    }

    pub fn cost_of_living(&self, region: &RegionKey) -> Option<f64> {
        self.cost_of_living.get(region).copied()
    }

    pub fn active_permits(&self, region: &RegionKey) -> Option<i64> {
        self.active_permits.get(region).copied()
    }
}
