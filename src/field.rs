//! Typed field identifiers and values for change events
use std::fmt;

/// Every editable field of an activity record or organization profile.
///
/// Keys follow the stored data format, which is why they read as `cantidad`,
/// `recarga_kg` and so on rather than the Rust names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, minicbor::Encode, minicbor::Decode)]
pub enum Field {
    #[n(0)]
    Site,
    #[n(1)]
    FuelType,
    #[n(2)]
    VehicleCategory,
    #[n(3)]
    Quantity,
    #[n(4)]
    TransportMode,
    #[n(5)]
    Distance,
    #[n(6)]
    Gas,
    #[n(7)]
    Gwp,
    #[n(8)]
    RechargeKg,
    #[n(9)]
    Provider,
    #[n(10)]
    Kwh,
    #[n(11)]
    RenewableCertificate,
    #[n(12)]
    Supplier,
    #[n(13)]
    FactorKgPerKwh,
    #[n(14)]
    Name,
    #[n(15)]
    TaxId,
    #[n(16)]
    Sector,
    #[n(17)]
    Employees,
    #[n(18)]
    FloorArea,
    #[n(19)]
    ActivityValue,
    #[n(20)]
    ActivityUnit,
}

/// Reference catalog a field's value is checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogKind {
    FuelTypes,
    GasTypes,
    VehicleCategories,
    Providers,
}

impl Field {
    pub const ALL: [Field; 21] = [
        Field::Site,
        Field::FuelType,
        Field::VehicleCategory,
        Field::Quantity,
        Field::TransportMode,
        Field::Distance,
        Field::Gas,
        Field::Gwp,
        Field::RechargeKg,
        Field::Provider,
        Field::Kwh,
        Field::RenewableCertificate,
        Field::Supplier,
        Field::FactorKgPerKwh,
        Field::Name,
        Field::TaxId,
        Field::Sector,
        Field::Employees,
        Field::FloorArea,
        Field::ActivityValue,
        Field::ActivityUnit,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Field::Site => "sede",
            Field::FuelType => "tipo_combustible",
            Field::VehicleCategory => "categoria_vehiculo",
            Field::Quantity => "cantidad",
            Field::TransportMode => "modo_transporte",
            Field::Distance => "distancia",
            Field::Gas => "gas",
            Field::Gwp => "pca",
            Field::RechargeKg => "recarga_kg",
            Field::Provider => "comercializadora",
            Field::Kwh => "kwh",
            Field::RenewableCertificate => "garantia_origen",
            Field::Supplier => "proveedor",
            Field::FactorKgPerKwh => "factor_kg_kwh",
            Field::Name => "nombre",
            Field::TaxId => "nif",
            Field::Sector => "sector",
            Field::Employees => "empleados",
            Field::FloorArea => "superficie_m2",
            Field::ActivityValue => "indicador_actividad",
            Field::ActivityUnit => "unidad_actividad",
        }
    }

    pub fn from_key(key: &str) -> Option<Field> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }

    /// Amounts of activity. Negative is an error, very large is flagged.
    pub fn is_quantity(&self) -> bool {
        matches!(
            self,
            Field::Quantity
                | Field::Distance
                | Field::RechargeKg
                | Field::Kwh
                | Field::Employees
                | Field::FloorArea
                | Field::ActivityValue
        )
    }

    /// Coefficients supplied by the user. Must not be negative.
    pub fn is_coefficient(&self) -> bool {
        matches!(self, Field::Gwp | Field::FactorKgPerKwh)
    }

    pub fn catalog(&self) -> Option<CatalogKind> {
        match self {
            Field::FuelType => Some(CatalogKind::FuelTypes),
            Field::Gas => Some(CatalogKind::GasTypes),
            Field::VehicleCategory => Some(CatalogKind::VehicleCategories),
            Field::Provider => Some(CatalogKind::Providers),
            _ => None,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub enum FieldValue {
    #[n(0)]
    Number(#[n(0)] f64),
    #[n(1)]
    Text(#[n(0)] String),
    #[n(2)]
    Flag(#[n(0)] bool),
    #[n(3)]
    Absent,
}

impl FieldValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FieldValue::Number(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FieldValue::Text(s) => Some(s),
            _ => None,
        }
    }
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            FieldValue::Flag(b) => Some(*b),
            _ => None,
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldValue::Number(n) => write!(f, "{n}"),
            FieldValue::Text(s) => f.write_str(s),
            FieldValue::Flag(b) => write!(f, "{b}"),
            FieldValue::Absent => f.write_str("-"),
        }
    }
}

impl From<f64> for FieldValue {
    fn from(value: f64) -> Self {
        FieldValue::Number(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::Text(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::Text(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Flag(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_key(field.key()), Some(field));
        }
        assert_eq!(Field::from_key("unknown"), None);
    }

    #[test]
    fn cantidad_is_a_quantity() {
        assert!(Field::from_key("cantidad").unwrap().is_quantity());
        assert!(!Field::FuelType.is_quantity());
        assert_eq!(Field::Gas.catalog(), Some(CatalogKind::GasTypes));
        assert_eq!(Field::Provider.catalog(), Some(CatalogKind::Providers));
    }
}
