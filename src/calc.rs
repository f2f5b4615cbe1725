//! Emission calculation engine
//!
//! Pure arithmetic that turns an activity quantity and its emission factor
//! into kilograms of CO2-equivalent. Nothing here performs I/O or validates
//! input; negative quantities are rejected upstream by the validator.
//!
//! Every function returns **kilograms**. Conversion to tonnes happens once,
//! when results are aggregated (see [`crate::results::aggregate`]).
use crate::utils::round_half_up;

/// Decimal places kept on every kilogram figure.
pub const KG_DECIMALS: u32 = 3;

/// 100-year global warming potentials used to fold CH4 and N2O into CO2e.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GwpConstants {
    pub ch4: f64,
    pub n2o: f64,
}

impl GwpConstants {
    /// IPCC sixth assessment report values.
    pub const AR6: GwpConstants = GwpConstants {
        ch4: 27.9,
        n2o: 273.0,
    };
}

impl Default for GwpConstants {
    fn default() -> Self {
        Self::AR6
    }
}

/// Combustion factor: kg CO2, g CH4 and g N2O per unit of fuel.
#[derive(Debug, Clone, Copy, PartialEq, Default, minicbor::Encode, minicbor::Decode)]
pub struct FactorTriple {
    #[n(0)]
    pub co2_kg: f64,
    #[n(1)]
    pub ch4_g: f64,
    #[n(2)]
    pub n2o_g: f64,
}

impl FactorTriple {
    pub const fn new(co2_kg: f64, ch4_g: f64, n2o_g: f64) -> Self {
        Self {
            co2_kg,
            ch4_g,
            n2o_g,
        }
    }

    /// Builds a triple from factors where all three gases are given in kg per unit.
    pub fn from_kg_per_unit(co2_kg: f64, ch4_kg: f64, n2o_kg: f64) -> Self {
        Self::new(co2_kg, ch4_kg * 1000.0, n2o_kg * 1000.0)
    }

    /// A CO2-only factor, used by per-distance transport factors.
    pub const fn co2_only(co2_kg: f64) -> Self {
        Self::new(co2_kg, 0.0, 0.0)
    }
}

/// Per-record emission totals. All masses are kg except the two gram fields.
#[derive(Debug, Clone, Copy, PartialEq, Default, minicbor::Encode, minicbor::Decode)]
pub struct EmissionTotals {
    #[n(0)]
    pub co2_kg: f64,
    #[n(1)]
    pub ch4_g: f64,
    #[n(2)]
    pub n2o_g: f64,
    #[n(3)]
    pub total_kg_co2e: f64,
}

impl EmissionTotals {
    /// Totals for a gas that is already expressed as CO2e.
    pub fn co2e_only(total_kg_co2e: f64) -> Self {
        Self {
            total_kg_co2e,
            ..Self::default()
        }
    }
}

pub trait EmissionCalculator: Send + Sync {
    /// Fuel combustion. Returns rounded kg CO2, g CH4, g N2O and kg CO2e.
    fn combustion(&self, quantity: f64, factor: FactorTriple) -> EmissionTotals;

    /// Refrigerant or process gas release, in kg CO2e. Never scaled to tonnes.
    fn fugitive(&self, recharge_kg: f64, gwp: f64) -> f64;

    /// Purchased electricity, in kg CO2. A renewable certificate zeroes it.
    fn electricity(&self, kwh: f64, factor_kg_per_kwh: f64, has_renewable_certificate: bool)
    -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardCalculator {
    gwp: GwpConstants,
}

impl StandardCalculator {
    pub fn new(gwp: GwpConstants) -> Self {
        Self { gwp }
    }
    pub fn gwp(&self) -> GwpConstants {
        self.gwp
    }
}

impl EmissionCalculator for StandardCalculator {
    fn combustion(&self, quantity: f64, factor: FactorTriple) -> EmissionTotals {
        let co2_kg = quantity * factor.co2_kg;
        let ch4_g = quantity * factor.ch4_g;
        let n2o_g = quantity * factor.n2o_g;
        let total = co2_kg + (ch4_g / 1000.0) * self.gwp.ch4 + (n2o_g / 1000.0) * self.gwp.n2o;

        EmissionTotals {
            co2_kg: round_half_up(co2_kg, KG_DECIMALS),
            ch4_g: round_half_up(ch4_g, KG_DECIMALS),
            n2o_g: round_half_up(n2o_g, KG_DECIMALS),
            total_kg_co2e: round_half_up(total, KG_DECIMALS),
        }
    }

    fn fugitive(&self, recharge_kg: f64, gwp: f64) -> f64 {
        round_half_up(recharge_kg * gwp, KG_DECIMALS)
    }

    fn electricity(
        &self,
        kwh: f64,
        factor_kg_per_kwh: f64,
        has_renewable_certificate: bool,
    ) -> f64 {
        if has_renewable_certificate {
            return 0.0;
        }
        round_half_up(kwh * factor_kg_per_kwh, KG_DECIMALS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_quantity_yields_zero() {
        let calc = StandardCalculator::default();
        let totals = calc.combustion(0.0, FactorTriple::new(2.868, 0.08, 0.016));
        assert_eq!(totals, EmissionTotals::default());
        assert_eq!(calc.fugitive(0.0, 25_200.0), 0.0);
        assert_eq!(calc.electricity(0.0, 0.372, false), 0.0);
    }

    #[test]
    fn combustion_with_kg_factors() {
        let calc = StandardCalculator::default();
        let totals = calc.combustion(50_000.0, FactorTriple::from_kg_per_unit(0.202, 0.00004, 0.00001));

        assert!((totals.co2_kg - 10_100.0).abs() < 0.1);
        assert!((totals.total_kg_co2e - 10_292.3).abs() < 0.1);
    }

    #[test]
    fn combustion_with_gram_factors() {
        let calc = StandardCalculator::default();
        // 50 000 l heating gas-oil: 143 400 kg CO2, 4 000 g CH4, 800 g N2O
        let totals = calc.combustion(50_000.0, FactorTriple::new(2.868, 0.08, 0.016));

        assert_eq!(totals.co2_kg, 143_400.0);
        assert_eq!(totals.ch4_g, 4_000.0);
        assert_eq!(totals.n2o_g, 800.0);
        // 143 400 + 4 * 27.9 + 0.8 * 273
        assert!((totals.total_kg_co2e - 143_730.0).abs() < 1e-6);
    }

    #[test]
    fn fugitive_is_reported_in_kilograms() {
        let calc = StandardCalculator::default();
        assert_eq!(calc.fugitive(10.0, 1430.0), 14_300.0);
        assert_ne!(calc.fugitive(10.0, 1430.0), 14.3);
    }

    #[test]
    fn renewable_certificate_zeroes_electricity() {
        let calc = StandardCalculator::default();
        assert_eq!(calc.electricity(100_000.0, 0.26, true), 0.0);
        assert_eq!(calc.electricity(100_000.0, 0.26, false), 26_000.0);
    }

    #[test]
    fn gwp_constants_are_injected() {
        let calc = StandardCalculator::new(GwpConstants { ch4: 0.0, n2o: 0.0 });
        let totals = calc.combustion(1_000.0, FactorTriple::new(1.0, 500.0, 500.0));
        assert_eq!(totals.total_kg_co2e, 1_000.0);
    }
}
