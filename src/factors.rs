//! Emission factor tables and dropdown catalogs
//!
//! Reference data is loaded once and never mutated by the pipeline. Lookups
//! accept either the catalog key (`gasoleo_calefaccion_litros`) or the
//! display name (`Gasóleo calefacción (litros)`).
use crate::calc::FactorTriple;
use crate::field::CatalogKind;
use crate::types::Year;
use std::collections::BTreeMap;

/// Provider used when a record names a retailer with no published factors.
pub const DEFAULT_PROVIDER: &str = "mix_nacional";
/// Category used when a road fuel publishes nothing for the requested one.
pub const DEFAULT_VEHICLE_CATEGORY: &str = "turismos_M1";
/// Vehicle category used to look up mobile machinery factors.
pub const MACHINERY_CATEGORY: &str = "maquinaria_movil";

/// A value looked up for a year, plus the year it actually came from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Resolved<T> {
    pub value: T,
    pub year: Year,
}

impl<T> Resolved<T> {
    pub fn is_fallback(&self, requested: Year) -> bool {
        self.year != requested
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct YearSeries<T> {
    values: BTreeMap<Year, T>,
}

impl<T: Copy> YearSeries<T> {
    pub fn from_pairs(pairs: &[(Year, T)]) -> Self {
        Self {
            values: pairs.iter().copied().collect(),
        }
    }

    /// Same value for every year in `years`.
    pub fn constant(years: std::ops::RangeInclusive<Year>, value: T) -> Self {
        Self {
            values: years.map(|year| (year, value)).collect(),
        }
    }

    pub fn get(&self, year: Year) -> Option<T> {
        self.values.get(&year).copied()
    }

    pub fn contains_year(&self, year: Year) -> bool {
        self.values.contains_key(&year)
    }

    /// Exact year if present, otherwise the nearest year. Ties go to the earlier year.
    pub fn resolve(&self, year: Year) -> Option<Resolved<T>> {
        if let Some(value) = self.get(year) {
            return Some(Resolved { value, year });
        }
        let below = self.values.range(..year).next_back();
        let above = self.values.range(year..).next();

        let (found, value) = match (below, above) {
            (Some(b), Some(a)) => {
                if year - b.0 <= a.0 - year {
                    b
                } else {
                    a
                }
            }
            (Some(b), None) => b,
            (None, Some(a)) => a,
            (None, None) => return None,
        };
        Some(Resolved {
            value: *value,
            year: *found,
        })
    }

    pub fn years(&self) -> impl Iterator<Item = Year> + '_ {
        self.values.keys().copied()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FuelEntry {
    pub name: String,
    pub unit: String,
    pub factors: YearSeries<FactorTriple>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MobileFuelEntry {
    pub name: String,
    pub unit: String,
    /// Keyed by vehicle category key.
    pub categories: BTreeMap<String, YearSeries<FactorTriple>>,
}

/// Series of single coefficients (kg CO2 per km, per t·km or per kWh).
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientEntry {
    pub name: String,
    pub unit: String,
    pub factors: YearSeries<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Refrigerant {
    pub name: String,
    pub formula: String,
    pub gwp: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct FactorTable {
    pub fixed_fuels: BTreeMap<String, FuelEntry>,
    pub mobile_fuels: BTreeMap<String, MobileFuelEntry>,
    /// Vehicle category key to display name.
    pub vehicle_categories: BTreeMap<String, String>,
    pub non_road: BTreeMap<String, CoefficientEntry>,
    pub refrigerants: BTreeMap<String, Refrigerant>,
    pub electricity: BTreeMap<String, CoefficientEntry>,
}

fn find<'a, V>(map: &'a BTreeMap<String, V>, key: &str, name: impl Fn(&V) -> &str) -> Option<&'a V> {
    map.get(key)
        .or_else(|| map.values().find(|entry| name(*entry) == key))
}

/// Key or display name, a key in any ASCII case, or the display name without
/// its trailing parenthetical (`Iberdrola` for `Iberdrola (sin GdO)`).
fn label_matches(key: &str, name: &str, value: &str) -> bool {
    let short = name.split_once(" (").map_or(name, |(head, _)| head);
    value == key || value == name || value.eq_ignore_ascii_case(key) || value == short.trim()
}

impl FactorTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_fixed_fuel(mut self, key: &str, name: &str, unit: &str, factors: YearSeries<FactorTriple>) -> Self {
        self.fixed_fuels.insert(
            key.to_string(),
            FuelEntry {
                name: name.to_string(),
                unit: unit.to_string(),
                factors,
            },
        );
        self
    }

    pub fn with_mobile_fuel(
        mut self,
        key: &str,
        name: &str,
        unit: &str,
        categories: &[(&str, YearSeries<FactorTriple>)],
    ) -> Self {
        self.mobile_fuels.insert(
            key.to_string(),
            MobileFuelEntry {
                name: name.to_string(),
                unit: unit.to_string(),
                categories: categories
                    .iter()
                    .map(|(category, series)| (category.to_string(), series.clone()))
                    .collect(),
            },
        );
        self
    }

    pub fn with_vehicle_category(mut self, key: &str, name: &str) -> Self {
        self.vehicle_categories.insert(key.to_string(), name.to_string());
        self
    }

    pub fn with_non_road(mut self, key: &str, name: &str, unit: &str, factors: YearSeries<f64>) -> Self {
        self.non_road.insert(
            key.to_string(),
            CoefficientEntry {
                name: name.to_string(),
                unit: unit.to_string(),
                factors,
            },
        );
        self
    }

    pub fn with_refrigerant(mut self, key: &str, formula: &str, name: &str, gwp: f64) -> Self {
        self.refrigerants.insert(
            key.to_string(),
            Refrigerant {
                name: name.to_string(),
                formula: formula.to_string(),
                gwp,
            },
        );
        self
    }

    pub fn with_provider(mut self, key: &str, name: &str, factors: YearSeries<f64>) -> Self {
        self.electricity.insert(
            key.to_string(),
            CoefficientEntry {
                name: name.to_string(),
                unit: "kWh".to_string(),
                factors,
            },
        );
        self
    }

    pub fn fixed_fuel(&self, fuel: &str, year: Year) -> Option<Resolved<FactorTriple>> {
        find(&self.fixed_fuels, fuel, |e| e.name.as_str())?.factors.resolve(year)
    }

    /// Category key for a key or display name (`Turismos (M1)`).
    pub fn vehicle_category_key(&self, category: &str) -> Option<&str> {
        self.vehicle_categories
            .iter()
            .find(|(key, name)| label_matches(key, name, category))
            .map(|(key, _)| key.as_str())
    }

    /// Factors for a road fuel and vehicle category. A category the fuel does
    /// not publish resolves to [`DEFAULT_VEHICLE_CATEGORY`].
    pub fn mobile_fuel(&self, fuel: &str, category: &str, year: Year) -> Option<Resolved<FactorTriple>> {
        let entry = find(&self.mobile_fuels, fuel, |e| e.name.as_str())?;
        let category = self.vehicle_category_key(category).unwrap_or(category);
        entry
            .categories
            .get(category)
            .or_else(|| entry.categories.get(DEFAULT_VEHICLE_CATEGORY))?
            .resolve(year)
    }

    pub fn non_road(&self, mode: &str, year: Year) -> Option<Resolved<f64>> {
        find(&self.non_road, mode, |e| e.name.as_str())?.factors.resolve(year)
    }

    pub fn refrigerant_gwp(&self, gas: &str) -> Option<f64> {
        find(&self.refrigerants, gas, |e| e.name.as_str()).map(|r| r.gwp)
    }

    fn provider(&self, provider: &str) -> Option<&CoefficientEntry> {
        self.electricity
            .iter()
            .find(|(key, entry)| label_matches(key, &entry.name, provider))
            .map(|(_, entry)| entry)
    }

    /// Provider factor, falling back to the national mix for unknown retailers.
    pub fn electricity(&self, provider: &str, year: Year) -> Option<Resolved<f64>> {
        self.provider(provider)
            .or_else(|| self.electricity.get(DEFAULT_PROVIDER))?
            .factors
            .resolve(year)
    }

    /// True when at least one series publishes a factor for exactly `year`.
    pub fn has_factors_for_year(&self, year: Year) -> bool {
        self.fixed_fuels.values().any(|e| e.factors.contains_year(year))
            || self
                .mobile_fuels
                .values()
                .flat_map(|e| e.categories.values())
                .any(|s| s.contains_year(year))
            || self.non_road.values().any(|e| e.factors.contains_year(year))
            || self.electricity.values().any(|e| e.factors.contains_year(year))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEntry {
    pub key: String,
    pub name: String,
}

impl CatalogEntry {
    fn new(key: &str, name: &str) -> Self {
        Self {
            key: key.to_string(),
            name: name.to_string(),
        }
    }
    fn matches(&self, value: &str) -> bool {
        self.key == value || self.name == value
    }
    fn matches_label(&self, value: &str) -> bool {
        label_matches(&self.key, &self.name, value)
    }
}

/// Option lists offered to users when entering data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DropdownCatalogs {
    pub fuel_types: Vec<CatalogEntry>,
    pub gas_types: Vec<CatalogEntry>,
    pub vehicle_categories: Vec<CatalogEntry>,
    pub transport_modes: Vec<CatalogEntry>,
    pub providers: Vec<CatalogEntry>,
    pub sectors: Vec<String>,
}

impl DropdownCatalogs {
    /// Derives the option lists from the keys present in a factor table.
    pub fn from_factors(factors: &FactorTable) -> Self {
        let fuel_types = factors
            .fixed_fuels
            .iter()
            .map(|(k, e)| CatalogEntry::new(k, &e.name))
            .chain(factors.mobile_fuels.iter().map(|(k, e)| CatalogEntry::new(k, &e.name)))
            .collect();
        // named categories first so dedup keeps their display names
        let mut vehicle_categories: Vec<CatalogEntry> = factors
            .vehicle_categories
            .iter()
            .map(|(k, name)| CatalogEntry::new(k, name))
            .chain(
                factors
                    .mobile_fuels
                    .values()
                    .flat_map(|e| e.categories.keys())
                    .map(|k| CatalogEntry::new(k, k)),
            )
            .collect();
        vehicle_categories.sort_by(|a, b| a.key.cmp(&b.key));
        vehicle_categories.dedup_by(|later, earlier| later.key == earlier.key);

        Self {
            fuel_types,
            gas_types: factors
                .refrigerants
                .iter()
                .map(|(k, r)| CatalogEntry::new(k, &r.name))
                .collect(),
            vehicle_categories,
            transport_modes: factors
                .non_road
                .iter()
                .map(|(k, e)| CatalogEntry::new(k, &e.name))
                .collect(),
            providers: factors
                .electricity
                .iter()
                .map(|(k, e)| CatalogEntry::new(k, &e.name))
                .collect(),
            sectors: Vec::new(),
        }
    }

    pub fn with_sectors(mut self, sectors: &[&str]) -> Self {
        self.sectors = sectors.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Fuels and gases need a key or an exact name. Categories and providers
    /// also accept the labels [`FactorTable`] lookups resolve.
    pub fn contains(&self, catalog: CatalogKind, value: &str) -> bool {
        match catalog {
            CatalogKind::FuelTypes => self.fuel_types.iter().any(|entry| entry.matches(value)),
            CatalogKind::GasTypes => self.gas_types.iter().any(|entry| entry.matches(value)),
            CatalogKind::VehicleCategories => self
                .vehicle_categories
                .iter()
                .any(|entry| entry.matches_label(value)),
            CatalogKind::Providers => self.providers.iter().any(|entry| entry.matches_label(value)),
        }
    }
}

/// Read-only provider of reference data.
pub trait ReferenceData: Send + Sync {
    fn emission_factors(&self) -> &FactorTable;
    fn dropdown_catalogs(&self) -> &DropdownCatalogs;
}

#[derive(Debug, Clone)]
pub struct StaticReferenceData {
    factors: FactorTable,
    catalogs: DropdownCatalogs,
}

impl StaticReferenceData {
    pub fn new(factors: FactorTable) -> Self {
        let catalogs = DropdownCatalogs::from_factors(&factors);
        Self { factors, catalogs }
    }

    pub fn with_catalogs(factors: FactorTable, catalogs: DropdownCatalogs) -> Self {
        Self { factors, catalogs }
    }

    /// National reference factors (calculator version 31).
    pub fn standard() -> Self {
        let factors = standard_factor_table();
        let catalogs = DropdownCatalogs::from_factors(&factors).with_sectors(&SECTORS);
        Self { factors, catalogs }
    }
}

impl ReferenceData for StaticReferenceData {
    fn emission_factors(&self) -> &FactorTable {
        &self.factors
    }
    fn dropdown_catalogs(&self) -> &DropdownCatalogs {
        &self.catalogs
    }
}

const SECTORS: [&str; 19] = [
    "Agricultura, ganadería, silvicultura y pesca",
    "Industrias extractivas",
    "Industria manufacturera",
    "Suministro de energía eléctrica, gas, vapor y aire acondicionado",
    "Suministro de agua, actividades de saneamiento",
    "Construcción",
    "Comercio al por mayor y al por menor",
    "Transporte y almacenamiento",
    "Hostelería",
    "Información y comunicaciones",
    "Actividades financieras y de seguros",
    "Actividades inmobiliarias",
    "Actividades profesionales, científicas y técnicas",
    "Actividades administrativas y servicios auxiliares",
    "Administración Pública y defensa",
    "Educación",
    "Actividades sanitarias y de servicios sociales",
    "Actividades artísticas, recreativas y de entretenimiento",
    "Otros servicios",
];

// Published tables. Triples are (kg CO2, g CH4, g N2O) per unit.

type Triple = (f64, f64, f64);

const RECENT: &[Year] = &[2023, 2024];
const RECENT3: &[Year] = &[2022, 2023, 2024];

const FIXED_FUELS: &[(&str, &str, &str, &[Year], Triple)] = &[
    ("gas_natural_kWhPCS", "Gas natural (kWh PCS)", "kWh PCS", &[2020, 2021, 2022, 2023, 2024], (0.182, 0.004, 0.001)),
    ("gas_natural_m3", "Gas natural (m³)", "m³", RECENT3, (2.016, 0.044, 0.008)),
    ("gasoleo_calefaccion_litros", "Gasóleo calefacción (litros)", "litros", RECENT3, (2.868, 0.080, 0.016)),
    ("glp_litros", "GLP (litros)", "litros", RECENT3, (1.612, 0.023, 0.023)),
    ("glp_kg", "GLP (kg)", "kg", RECENT, (2.938, 0.042, 0.042)),
    ("carbon_kg", "Carbón (kg)", "kg", RECENT, (2.533, 0.028, 0.057)),
    ("biomasa_pellets_kg", "Biomasa - Pellets (kg)", "kg", RECENT, (0.0, 0.540, 0.054)),
    ("biomasa_astillas_kg", "Biomasa - Astillas (kg)", "kg", RECENT, (0.0, 1.080, 0.054)),
];

const VEHICLE_CATEGORIES: &[(&str, &str)] = &[
    ("turismos_M1", "Turismos (M1)"),
    ("furgonetas_N1", "Furgonetas (N1)"),
    ("camiones_pesados_N2_N3", "Camiones pesados (N2/N3)"),
    ("autobuses_M2_M3", "Autobuses (M2/M3)"),
    ("motocicletas_L", "Motocicletas (L)"),
    (MACHINERY_CATEGORY, "Maquinaria móvil"),
];

const ROAD_FUELS: &[(&str, &str, &str)] = &[
    ("gasolina_litros", "Gasolina (litros)", "litros"),
    ("gasoleo_litros", "Gasóleo (litros)", "litros"),
    ("glp_litros_vehiculos", "GLP vehículos (litros)", "litros"),
    ("gas_natural_vehiculos_kWh", "Gas natural vehículos (kWh)", "kWh"),
    ("km_gasolina", "Distancia gasolina (km)", "km"),
    ("km_gasoleo", "Distancia gasóleo (km)", "km"),
];

/// (fuel, vehicle category, years, factors)
const ROAD_FACTORS: &[(&str, &str, &[Year], Triple)] = &[
    ("gasolina_litros", "turismos_M1", RECENT3, (2.196, 0.238, 0.025)),
    ("gasolina_litros", "furgonetas_N1", RECENT, (2.196, 0.316, 0.062)),
    ("gasolina_litros", "camiones_pesados_N2_N3", RECENT, (2.196, 0.316, 0.062)),
    ("gasolina_litros", "autobuses_M2_M3", RECENT, (2.196, 0.316, 0.062)),
    ("gasolina_litros", "motocicletas_L", RECENT, (2.196, 0.572, 0.019)),
    ("gasoleo_litros", "turismos_M1", RECENT3, (2.607, 0.005, 0.028)),
    ("gasoleo_litros", "furgonetas_N1", RECENT, (2.607, 0.005, 0.028)),
    ("gasoleo_litros", "camiones_pesados_N2_N3", RECENT, (2.607, 0.010, 0.107)),
    ("gasoleo_litros", "autobuses_M2_M3", RECENT, (2.607, 0.010, 0.107)),
    ("gasoleo_litros", MACHINERY_CATEGORY, RECENT, (2.607, 0.010, 0.107)),
    ("glp_litros_vehiculos", "turismos_M1", RECENT, (1.612, 0.572, 0.019)),
    ("gas_natural_vehiculos_kWh", "turismos_M1", RECENT, (0.182, 1.349, 0.019)),
    ("km_gasolina", "turismos_M1", RECENT, (0.148, 0.016, 0.002)),
    ("km_gasolina", "furgonetas_N1", RECENT, (0.186, 0.027, 0.005)),
    ("km_gasoleo", "turismos_M1", RECENT, (0.153, 0.000, 0.002)),
    ("km_gasoleo", "furgonetas_N1", RECENT, (0.195, 0.000, 0.002)),
];

const NON_ROAD: &[(&str, &str, &str, [(Year, f64); 2])] = &[
    ("ferroviario", "Transporte ferroviario", "km", [(2023, 0.028), (2024, 0.026)]),
    ("maritimo_carga", "Transporte marítimo de carga", "t·km", [(2023, 0.016), (2024, 0.016)]),
    ("aereo_nacional", "Transporte aéreo nacional", "km", [(2023, 0.165), (2024, 0.163)]),
    ("aereo_internacional_corto", "Transporte aéreo internacional corto (<3700 km)", "km", [(2023, 0.099), (2024, 0.097)]),
    ("aereo_internacional_largo", "Transporte aéreo internacional largo (>3700 km)", "km", [(2023, 0.114), (2024, 0.112)]),
];

/// (key, formula, name, GWP)
const REFRIGERANTS: &[(&str, &str, &str, f64)] = &[
    ("R-134a", "CH2FCF3", "R-134a (HFC)", 1530.0),
    ("R-410A", "R410A", "R-410A (mezcla HFC)", 2088.0),
    ("R-407C", "R407C", "R-407C (mezcla HFC)", 1774.0),
    ("R-404A", "R404A", "R-404A (mezcla HFC)", 3922.0),
    ("R-507A", "R507A", "R-507A (mezcla HFC)", 3985.0),
    ("R-32", "CH2F2", "R-32 (HFC)", 771.0),
    ("R-125", "C2HF5", "R-125 (HFC)", 3740.0),
    ("R-143a", "C2H3F3", "R-143a (HFC)", 5810.0),
    ("R-227ea", "C3HF7", "R-227ea (HFC)", 3600.0),
    ("R-245fa", "C3H3F5", "R-245fa (HFC)", 1030.0),
    ("R-236fa", "C3H2F6", "R-236fa (HFC)", 8690.0),
    ("R-422D", "R422D", "R-422D (mezcla HFC)", 2729.0),
    ("R-417A", "R417A", "R-417A (mezcla HFC)", 2346.0),
    ("R-290", "C3H8", "R-290 Propano (HC)", 0.02),
    ("R-600a", "C4H10", "R-600a Isobutano (HC)", 0.02),
    ("R-744", "CO2", "R-744 CO2", 1.0),
    ("R-717", "NH3", "R-717 Amoniaco", 0.0),
    ("SF6", "SF6", "Hexafluoruro de azufre", 25200.0),
    ("HFC-23", "CHF3", "HFC-23", 14800.0),
    ("NF3", "NF3", "Trifluoruro de nitrógeno", 17200.0),
];

/// kg CO2 per kWh without guarantees of origin.
const PROVIDERS: &[(&str, &str, &[(Year, f64)])] = &[
    (
        DEFAULT_PROVIDER,
        "Mix eléctrico peninsular (sin GdO)",
        &[
            (2007, 0.372), (2008, 0.338), (2009, 0.290), (2010, 0.218), (2011, 0.267), (2012, 0.309),
            (2013, 0.248), (2014, 0.267), (2015, 0.265), (2016, 0.225), (2017, 0.245), (2018, 0.208),
            (2019, 0.157), (2020, 0.122), (2021, 0.151), (2022, 0.144), (2023, 0.127), (2024, 0.120),
        ],
    ),
    ("iberdrola", "Iberdrola (sin GdO)", &[(2022, 0.090), (2023, 0.075), (2024, 0.070)]),
    ("endesa", "Endesa (sin GdO)", &[(2022, 0.130), (2023, 0.110), (2024, 0.100)]),
    ("naturgy", "Naturgy (sin GdO)", &[(2022, 0.170), (2023, 0.150), (2024, 0.140)]),
    ("repsol", "Repsol (sin GdO)", &[(2022, 0.200), (2023, 0.190), (2024, 0.180)]),
    ("edp", "EDP (sin GdO)", &[(2022, 0.110), (2023, 0.095), (2024, 0.090)]),
    ("totalenergies", "TotalEnergies (sin GdO)", &[(2023, 0.170), (2024, 0.160)]),
];

fn triple_years(years: &[Year], (co2, ch4, n2o): Triple) -> YearSeries<FactorTriple> {
    let pairs: Vec<_> = years
        .iter()
        .map(|y| (*y, FactorTriple::new(co2, ch4, n2o)))
        .collect();
    YearSeries::from_pairs(&pairs)
}

fn standard_factor_table() -> FactorTable {
    let mut table = FactorTable::new();
    for &(key, name, unit, years, factors) in FIXED_FUELS {
        table = table.with_fixed_fuel(key, name, unit, triple_years(years, factors));
    }
    for &(key, name) in VEHICLE_CATEGORIES {
        table = table.with_vehicle_category(key, name);
    }
    for &(key, name, unit) in ROAD_FUELS {
        let categories: Vec<_> = ROAD_FACTORS
            .iter()
            .filter(|row| row.0 == key)
            .map(|&(_, category, years, factors)| (category, triple_years(years, factors)))
            .collect();
        table = table.with_mobile_fuel(key, name, unit, &categories);
    }
    for (key, name, unit, pairs) in NON_ROAD {
        table = table.with_non_road(key, name, unit, YearSeries::from_pairs(pairs));
    }
    for &(key, formula, name, gwp) in REFRIGERANTS {
        table = table.with_refrigerant(key, formula, name, gwp);
    }
    for &(key, name, pairs) in PROVIDERS {
        table = table.with_provider(key, name, YearSeries::from_pairs(pairs));
    }
    table.with_provider(
        "con_garantia_origen",
        "Con Garantía de Origen (GdO) - cualquier comercializadora",
        YearSeries::constant(2007..=2024, 0.0),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_exact_year() {
        let series = YearSeries::from_pairs(&[(2022, 1.0), (2024, 3.0)]);
        let resolved = series.resolve(2024).unwrap();
        assert_eq!(resolved.value, 3.0);
        assert!(!resolved.is_fallback(2024));
    }

    #[test]
    fn falls_back_to_nearest_year() {
        let series = YearSeries::from_pairs(&[(2020, 1.0), (2024, 3.0)]);
        assert_eq!(series.resolve(2027).unwrap().year, 2024);
        assert_eq!(series.resolve(2010).unwrap().year, 2020);
        assert_eq!(series.resolve(2023).unwrap().year, 2024);
        // equidistant picks the earlier year
        assert_eq!(series.resolve(2022).unwrap().year, 2020);
    }

    #[test]
    fn empty_series_resolves_nothing() {
        let series: YearSeries<f64> = YearSeries::default();
        assert!(series.resolve(2024).is_none());
    }

    #[test]
    fn lookups_accept_display_names() {
        let data = StaticReferenceData::standard();
        let factors = data.emission_factors();
        let by_key = factors.fixed_fuel("gasoleo_calefaccion_litros", 2024).unwrap();
        let by_name = factors.fixed_fuel("Gasóleo calefacción (litros)", 2024).unwrap();
        assert_eq!(by_key, by_name);
        assert_eq!(factors.refrigerant_gwp("R-410A"), Some(2088.0));
    }

    #[test]
    fn unknown_provider_uses_national_mix() {
        let data = StaticReferenceData::standard();
        let resolved = data.emission_factors().electricity("otra", 2015).unwrap();
        assert_eq!(resolved.value, 0.265);
    }

    #[test]
    fn machinery_has_its_own_category() {
        let data = StaticReferenceData::standard();
        let resolved = data
            .emission_factors()
            .mobile_fuel("gasoleo_litros", MACHINERY_CATEGORY, 2024)
            .unwrap();
        assert_eq!(resolved.value, FactorTriple::new(2.607, 0.010, 0.107));
    }

    #[test]
    fn standard_table_covers_the_national_mix_years() {
        let data = StaticReferenceData::standard();
        assert!(data.emission_factors().has_factors_for_year(2007));
        assert!(data.emission_factors().has_factors_for_year(2024));
        assert!(!data.emission_factors().has_factors_for_year(2026));
    }

    #[test]
    fn catalogs_match_keys_and_names() {
        let data = StaticReferenceData::standard();
        let catalogs = data.dropdown_catalogs();
        assert!(catalogs.contains(CatalogKind::FuelTypes, "glp_kg"));
        assert!(catalogs.contains(CatalogKind::FuelTypes, "Gasolina (litros)"));
        assert!(catalogs.contains(CatalogKind::GasTypes, "SF6"));
        assert!(!catalogs.contains(CatalogKind::GasTypes, "R-999"));
        assert_eq!(catalogs.sectors.len(), 19);
    }

    #[test]
    fn vehicle_category_display_names_resolve() {
        let data = StaticReferenceData::standard();
        let factors = data.emission_factors();
        let by_name = factors.mobile_fuel("gasolina_litros", "Turismos (M1)", 2024).unwrap();
        let by_key = factors.mobile_fuel("gasolina_litros", "turismos_M1", 2024).unwrap();
        assert_eq!(by_name, by_key);
        let vans = factors.mobile_fuel("Gasolina (litros)", "Furgonetas (N1)", 2024).unwrap();
        assert_eq!(vans.value, FactorTriple::new(2.196, 0.316, 0.062));
    }

    #[test]
    fn unknown_vehicle_category_uses_passenger_cars() {
        let data = StaticReferenceData::standard();
        let factors = data.emission_factors();
        let resolved = factors.mobile_fuel("gasolina_litros", "tractor", 2024).unwrap();
        assert_eq!(resolved.value, FactorTriple::new(2.196, 0.238, 0.025));
        // gasolina publishes no machinery factors
        let machinery = factors
            .mobile_fuel("gasolina_litros", MACHINERY_CATEGORY, 2024)
            .unwrap();
        assert_eq!(machinery.value, resolved.value);
    }

    #[test]
    fn provider_short_labels_resolve() {
        let data = StaticReferenceData::standard();
        let factors = data.emission_factors();
        assert_eq!(factors.electricity("Iberdrola", 2024).unwrap().value, 0.070);
        assert_eq!(factors.electricity("Iberdrola (sin GdO)", 2024).unwrap().value, 0.070);
        assert_eq!(factors.electricity("ENDESA", 2024).unwrap().value, 0.100);
        assert_eq!(factors.electricity("Mix eléctrico peninsular", 2024).unwrap().value, 0.120);
        assert_eq!(factors.electricity("Otra (usar mix peninsular)", 2024).unwrap().value, 0.120);
    }

    #[test]
    fn category_and_provider_catalogs_carry_names() {
        let data = StaticReferenceData::standard();
        let catalogs = data.dropdown_catalogs();
        let cars = catalogs
            .vehicle_categories
            .iter()
            .find(|entry| entry.key == "turismos_M1")
            .unwrap();
        assert_eq!(cars.name, "Turismos (M1)");
        assert_eq!(catalogs.vehicle_categories.len(), VEHICLE_CATEGORIES.len());
        assert!(catalogs.contains(CatalogKind::VehicleCategories, "Autobuses (M2/M3)"));
        assert!(!catalogs.contains(CatalogKind::VehicleCategories, "tractor"));
        assert!(catalogs.contains(CatalogKind::Providers, "Naturgy"));
        assert!(!catalogs.contains(CatalogKind::Providers, "Otra (usar mix peninsular)"));
    }
}
