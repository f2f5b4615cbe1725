//! Pipeline configuration
use crate::calc::GwpConstants;
use crate::types::Year;
use std::ops::RangeInclusive;
use std::time::Duration;

const MIB: u64 = 1024 * 1024;

/// Storage ceilings checked before every user write.
#[derive(Debug, Clone, PartialEq)]
pub struct QuotaPolicy {
    pub warn_bytes: u64,
    pub hard_bytes: u64,
    pub warn_rows: u64,
    pub hard_rows: u64,
    /// How long a usage measurement is served from cache.
    pub cache_ttl: Duration,
}

impl Default for QuotaPolicy {
    fn default() -> Self {
        Self {
            warn_bytes: 400 * MIB,
            hard_bytes: 500 * MIB,
            warn_rows: 800_000,
            hard_rows: 1_000_000,
            cache_ttl: Duration::from_secs(30),
        }
    }
}

impl QuotaPolicy {
    pub fn set_bytes(mut self, warn: u64, hard: u64) -> Self {
        self.warn_bytes = warn;
        self.hard_bytes = hard;
        self
    }
    pub fn set_rows(mut self, warn: u64, hard: u64) -> Self {
        self.warn_rows = warn;
        self.hard_rows = hard;
        self
    }
    pub fn set_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PipelineConfig {
    pub gwp: GwpConstants,
    pub supported_years: RangeInclusive<Year>,
    /// Quantities above this are flagged, never rejected.
    pub quantity_warning_limit: f64,
    /// Year-on-year change, in percent, that must be exceeded to raise an alert.
    pub threshold_pct: f64,
    pub quota: QuotaPolicy,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            gwp: GwpConstants::AR6,
            supported_years: 2007..=2027,
            quantity_warning_limit: 10_000_000.0,
            threshold_pct: 10.0,
            quota: QuotaPolicy::default(),
        }
    }
}

impl PipelineConfig {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set_gwp(mut self, gwp: GwpConstants) -> Self {
        self.gwp = gwp;
        self
    }
    pub fn set_supported_years(mut self, years: RangeInclusive<Year>) -> Self {
        self.supported_years = years;
        self
    }
    pub fn set_quantity_warning_limit(mut self, limit: f64) -> Self {
        self.quantity_warning_limit = limit;
        self
    }
    pub fn set_threshold_pct(mut self, pct: f64) -> Self {
        self.threshold_pct = pct;
        self
    }
    pub fn set_quota(mut self, quota: QuotaPolicy) -> Self {
        self.quota = quota;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_values() {
        let config = PipelineConfig::default();
        assert_eq!(config.gwp.ch4, 27.9);
        assert_eq!(config.gwp.n2o, 273.0);
        assert_eq!(config.supported_years, 2007..=2027);
        assert_eq!(config.threshold_pct, 10.0);
        assert!(config.quota.warn_bytes < config.quota.hard_bytes);
        assert!(config.quota.warn_rows < config.quota.hard_rows);
    }

    #[test]
    fn setters_override_defaults() {
        let config = PipelineConfig::new()
            .set_threshold_pct(5.0)
            .set_quota(QuotaPolicy::default().set_bytes(10, 20).set_cache_ttl(Duration::from_secs(1)));
        assert_eq!(config.threshold_pct, 5.0);
        assert_eq!(config.quota.hard_bytes, 20);
        assert_eq!(config.quota.cache_ttl, Duration::from_secs(1));
    }
}
