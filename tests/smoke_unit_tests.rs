//! Smoke tests across the public API
//!
//! Happy-path checks of each component in isolation, through the crate's
//! public surface only. Pipeline flows live in `scenarios.rs`.

use carbon_footprint::{
    calc::{EmissionCalculator, FactorTriple, GwpConstants, StandardCalculator},
    factors::{ReferenceData, StaticReferenceData},
    field::{CatalogKind, Field, FieldValue},
    types::{DatasetKey, DatasetKind, TimeStamp},
    utils::new_uuid_to_bech32,
};
use chrono::{Datelike, Utc};

// UTILS MODULE TESTS
#[cfg(test)]
mod utils_tests {
    use super::*;

    /// Ids carry their human-readable prefix
    #[test]
    fn generates_valid_bech32_with_hrp() {
        let encoded = new_uuid_to_bech32("rec_").unwrap();
        assert!(encoded.starts_with("rec_1"));
        assert!(encoded.len() > 10);
    }

    #[test]
    fn handles_empty_hrp() {
        assert!(new_uuid_to_bech32("").is_err());
    }
}

// TYPES MODULE TESTS
#[cfg(test)]
mod types_tests {
    use super::*;

    #[test]
    fn timestamp_cbor_roundtrip() {
        let original = TimeStamp::new();
        let encoded = minicbor::to_vec(&original).unwrap();
        let decoded: TimeStamp<Utc> = minicbor::decode(&encoded).unwrap();
        assert_eq!(original, decoded);
    }

    #[test]
    fn timestamp_new_with_creates_specific_time() {
        let ts = TimeStamp::new_with(2024, 6, 15, 10, 30, 0).unwrap();
        assert_eq!(ts.to_datetime_utc().year(), 2024);
        assert!(TimeStamp::new_with(2024, 2, 30, 0, 0, 0).is_none());
    }

    #[test]
    fn dataset_keys_are_scoped_by_org_and_year() {
        let a = DatasetKey::new("org-1".into(), 2024, DatasetKind::Vehicles);
        let b = DatasetKey::new("org-1".into(), 2023, DatasetKind::Vehicles);
        assert_ne!(a.to_storage_key(), b.to_storage_key());
        assert!(a.to_storage_key().starts_with("org-1/2024/"));
    }
}

// CALC MODULE TESTS
#[cfg(test)]
mod calc_tests {
    use super::*;

    #[test]
    fn ar6_constants_are_the_default() {
        let calc = StandardCalculator::default();
        assert_eq!(calc.gwp(), GwpConstants::AR6);
    }

    #[test]
    fn combustion_reference_vector() {
        let calc = StandardCalculator::default();
        let totals = calc.combustion(50_000.0, FactorTriple::from_kg_per_unit(0.202, 0.00004, 0.00001));
        assert_eq!(totals.co2_kg, 10_100.0);
        assert_eq!(totals.total_kg_co2e, 10_292.3);
    }

    #[test]
    fn fugitive_stays_in_kilograms() {
        assert_eq!(StandardCalculator::default().fugitive(10.0, 1430.0), 14_300.0);
    }
}

// FACTORS AND FIELDS
#[cfg(test)]
mod reference_tests {
    use super::*;

    #[test]
    fn standard_reference_data_has_catalogs() {
        let reference = StaticReferenceData::standard();
        let catalogs = reference.dropdown_catalogs();
        assert!(catalogs.contains(CatalogKind::FuelTypes, "gas_natural_m3"));
        assert!(catalogs.contains(CatalogKind::GasTypes, "R-410A"));
        assert!(!catalogs.contains(CatalogKind::FuelTypes, "hidrogeno_kg"));
    }

    #[test]
    fn field_keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("cantidad"), Some(Field::Quantity));
        assert!(Field::from_key("desconocido").is_none());
    }

    #[test]
    fn field_values_convert() {
        assert_eq!(FieldValue::from(2.5).as_number(), Some(2.5));
        assert_eq!(FieldValue::from("R-32").as_text(), Some("R-32"));
        assert_eq!(FieldValue::from(true).as_flag(), Some(true));
        assert_eq!(FieldValue::Absent.as_number(), None);
    }
}
