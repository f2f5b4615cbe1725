//! Property-based tests for the emission formulas and the threshold check
//!
//! The calculation engine must be deterministic and monotone in its
//! quantities; these properties hold for any factor set, not only the
//! published tables.

use carbon_footprint::{
    calc::{EmissionCalculator, FactorTriple, StandardCalculator},
    pipeline::threshold_alert,
};
use proptest::prelude::*;

// PROPERTY TEST STRATEGIES

fn factor_strategy() -> impl Strategy<Value = FactorTriple> {
    (0.0f64..5.0, 0.0f64..1.0, 0.0f64..1.0).prop_map(|(co2, ch4, n2o)| FactorTriple::new(co2, ch4, n2o))
}

fn quantity_strategy() -> impl Strategy<Value = f64> {
    0.0f64..1_000_000.0
}

proptest! {
    #[test]
    fn zero_quantity_emits_nothing(factor in factor_strategy()) {
        let totals = StandardCalculator::default().combustion(0.0, factor);
        prop_assert_eq!(totals.total_kg_co2e, 0.0);
        prop_assert_eq!(totals.co2_kg, 0.0);
        let calc = StandardCalculator::default();
        prop_assert_eq!(calc.fugitive(0.0, factor.co2_kg * 1000.0), 0.0);
        prop_assert_eq!(calc.electricity(0.0, factor.co2_kg, false), 0.0);
    }

    #[test]
    fn combustion_is_monotone(factor in factor_strategy(), a in quantity_strategy(), b in quantity_strategy()) {
        let calc = StandardCalculator::default();
        let (low, high) = if a <= b { (a, b) } else { (b, a) };
        prop_assert!(calc.combustion(low, factor).total_kg_co2e <= calc.combustion(high, factor).total_kg_co2e);
    }

    #[test]
    fn combustion_is_deterministic(factor in factor_strategy(), q in quantity_strategy()) {
        let calc = StandardCalculator::default();
        prop_assert_eq!(calc.combustion(q, factor), calc.combustion(q, factor));
    }

    #[test]
    fn co2e_never_below_co2(factor in factor_strategy(), q in quantity_strategy()) {
        let totals = StandardCalculator::default().combustion(q, factor);
        prop_assert!(totals.total_kg_co2e + 0.001 >= totals.co2_kg);
    }

    #[test]
    fn fugitive_is_not_scaled(recharge in 0u32..10_000, gwp in 0u32..25_000) {
        // integer inputs keep the product exact
        let kg = StandardCalculator::default().fugitive(recharge as f64, gwp as f64);
        prop_assert_eq!(kg, recharge as f64 * gwp as f64);
    }

    #[test]
    fn certificate_zeroes_electricity(kwh in quantity_strategy(), factor in 0.0f64..1.0) {
        prop_assert_eq!(StandardCalculator::default().electricity(kwh, factor, true), 0.0);
    }

    #[test]
    fn small_changes_never_alert(previous in 1.0f64..10_000.0, pct in -9.9f64..9.9) {
        let current = previous * (1.0 + pct / 100.0);
        prop_assert!(threshold_alert(previous, current, 10.0).is_none());
    }

    #[test]
    fn large_changes_always_alert(previous in 1.0f64..10_000.0, pct in 10.1f64..500.0) {
        let current = previous * (1.0 + pct / 100.0);
        prop_assert!(threshold_alert(previous, current, 10.0).is_some());
    }
}
