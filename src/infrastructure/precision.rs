use crate::domain::ports::PricePrecision;
use std::collections::HashMap;

/// Price decimals per symbol, configured up front
#[derive(Debug, Clone)]
pub struct StaticPrecisionTable {
    decimals: HashMap<String, u32>,
    default: u32,
}

impl StaticPrecisionTable {
    pub fn new(decimals: HashMap<String, u32>, default: u32) -> Self {
        let decimals = decimals
            .into_iter()
            .map(|(symbol, dp)| (symbol.to_uppercase(), dp))
            .collect();
        Self { decimals, default }
    }
}

impl Default for StaticPrecisionTable {
    fn default() -> Self {
        Self::new(HashMap::new(), 2)
    }
}

impl PricePrecision for StaticPrecisionTable {
    fn precision(&self, symbol: &str) -> u32 {
        self.decimals
            .get(&symbol.to_uppercase())
            .copied()
            .unwrap_or(self.default)
    }
}
