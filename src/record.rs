//! Activity records, one variant per emission category
use crate::calc::EmissionTotals;
use crate::error::FieldError;
use crate::field::{Field, FieldValue};
use crate::types::DatasetKind;

/// Use of purchased electricity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, minicbor::Encode, minicbor::Decode)]
pub enum ElectricityUse {
    #[n(0)]
    Building,
    #[n(1)]
    Vehicle,
}

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub enum Activity {
    /// Fuel burnt in boilers, furnaces and other fixed equipment.
    #[n(0)]
    FixedInstallation {
        #[n(0)]
        fuel_type: String,
        #[n(1)]
        quantity: f64,
    },
    #[n(1)]
    RoadVehicle {
        #[n(0)]
        fuel_type: String,
        #[n(1)]
        vehicle_category: String,
        #[n(2)]
        quantity: f64,
    },
    /// Rail, sea and air transport, charged per distance (or t·km).
    #[n(2)]
    NonRoadTransport {
        #[n(0)]
        mode: String,
        #[n(1)]
        distance: f64,
    },
    #[n(3)]
    MobileMachinery {
        #[n(0)]
        fuel_type: String,
        #[n(1)]
        quantity: f64,
    },
    /// Refrigerant recharge. `gwp` overrides the catalog value when set.
    #[n(4)]
    Fugitive {
        #[n(0)]
        gas: String,
        #[n(1)]
        gwp: Option<f64>,
        #[n(2)]
        recharge_kg: f64,
    },
    #[n(5)]
    Process {
        #[n(0)]
        gas: String,
        #[n(1)]
        gwp: Option<f64>,
        #[n(2)]
        quantity: f64,
    },
    #[n(6)]
    Electricity {
        #[n(0)]
        usage: ElectricityUse,
        #[n(1)]
        provider: String,
        #[n(2)]
        kwh: f64,
        #[n(3)]
        has_renewable_certificate: bool,
    },
    /// Purchased heat, steam or cooling with a supplier-declared factor.
    #[n(7)]
    HeatSteamCold {
        #[n(0)]
        supplier: String,
        #[n(1)]
        kwh: f64,
        #[n(2)]
        factor_kg_per_kwh: f64,
    },
}

#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct ActivityRecord {
    #[n(0)]
    pub id: String,
    #[n(1)]
    pub site: String,
    #[n(2)]
    pub activity: Activity,
    /// Totals as of the last recalculation.
    #[n(3)]
    pub totals: EmissionTotals,
}

impl Activity {
    pub fn dataset_kind(&self) -> DatasetKind {
        match self {
            Activity::FixedInstallation { .. } => DatasetKind::FixedInstallations,
            Activity::RoadVehicle { .. }
            | Activity::NonRoadTransport { .. }
            | Activity::MobileMachinery { .. } => DatasetKind::Vehicles,
            Activity::Fugitive { .. } => DatasetKind::Fugitive,
            Activity::Process { .. } => DatasetKind::Process,
            Activity::Electricity { .. } | Activity::HeatSteamCold { .. } => {
                DatasetKind::Electricity
            }
        }
    }
}

fn number(field: Field, value: &FieldValue) -> Result<f64, FieldError> {
    value.as_number().ok_or_else(|| FieldError::WrongType {
        field: field.key(),
        expected: "number",
    })
}

fn text(field: Field, value: &FieldValue) -> Result<String, FieldError> {
    value
        .as_text()
        .map(str::to_string)
        .ok_or_else(|| FieldError::WrongType {
            field: field.key(),
            expected: "text",
        })
}

fn flag(field: Field, value: &FieldValue) -> Result<bool, FieldError> {
    value.as_flag().ok_or_else(|| FieldError::WrongType {
        field: field.key(),
        expected: "flag",
    })
}

impl ActivityRecord {
    pub fn new(id: impl Into<String>, site: impl Into<String>, activity: Activity) -> Self {
        Self {
            id: id.into(),
            site: site.into(),
            activity,
            totals: EmissionTotals::default(),
        }
    }

    pub fn dataset_kind(&self) -> DatasetKind {
        self.activity.dataset_kind()
    }

    /// Every field this record carries, in entry order.
    pub fn field_values(&self) -> Vec<(Field, FieldValue)> {
        let mut fields = vec![(Field::Site, FieldValue::from(self.site.as_str()))];
        match &self.activity {
            Activity::FixedInstallation {
                fuel_type,
                quantity,
            }
            | Activity::MobileMachinery {
                fuel_type,
                quantity,
            } => {
                fields.push((Field::FuelType, fuel_type.as_str().into()));
                fields.push((Field::Quantity, (*quantity).into()));
            }
            Activity::RoadVehicle {
                fuel_type,
                vehicle_category,
                quantity,
            } => {
                fields.push((Field::FuelType, fuel_type.as_str().into()));
                fields.push((Field::VehicleCategory, vehicle_category.as_str().into()));
                fields.push((Field::Quantity, (*quantity).into()));
            }
            Activity::NonRoadTransport { mode, distance } => {
                fields.push((Field::TransportMode, mode.as_str().into()));
                fields.push((Field::Distance, (*distance).into()));
            }
            Activity::Fugitive {
                gas,
                gwp,
                recharge_kg,
            } => {
                fields.push((Field::Gas, gas.as_str().into()));
                if let Some(gwp) = gwp {
                    fields.push((Field::Gwp, (*gwp).into()));
                }
                fields.push((Field::RechargeKg, (*recharge_kg).into()));
            }
            Activity::Process { gas, gwp, quantity } => {
                fields.push((Field::Gas, gas.as_str().into()));
                if let Some(gwp) = gwp {
                    fields.push((Field::Gwp, (*gwp).into()));
                }
                fields.push((Field::Quantity, (*quantity).into()));
            }
            Activity::Electricity {
                provider,
                kwh,
                has_renewable_certificate,
                ..
            } => {
                fields.push((Field::Provider, provider.as_str().into()));
                fields.push((Field::Kwh, (*kwh).into()));
                fields.push((
                    Field::RenewableCertificate,
                    (*has_renewable_certificate).into(),
                ));
            }
            Activity::HeatSteamCold {
                supplier,
                kwh,
                factor_kg_per_kwh,
            } => {
                fields.push((Field::Supplier, supplier.as_str().into()));
                fields.push((Field::Kwh, (*kwh).into()));
                fields.push((Field::FactorKgPerKwh, (*factor_kg_per_kwh).into()));
            }
        }
        fields
    }

    pub fn field_value(&self, field: Field) -> Option<FieldValue> {
        self.field_values()
            .into_iter()
            .find(|(f, _)| *f == field)
            .map(|(_, v)| v)
    }

    /// Sets one field, returning the value it replaced.
    pub fn apply_field(&mut self, field: Field, value: &FieldValue) -> Result<FieldValue, FieldError> {
        if field == Field::Site {
            let old = std::mem::replace(&mut self.site, text(field, value)?);
            return Ok(old.into());
        }

        let unknown = FieldError::UnknownField {
            field: field.key(),
            kind: self.dataset_kind(),
        };
        let old = match (&mut self.activity, field) {
            (
                Activity::FixedInstallation { fuel_type, .. }
                | Activity::MobileMachinery { fuel_type, .. }
                | Activity::RoadVehicle { fuel_type, .. },
                Field::FuelType,
            ) => FieldValue::from(std::mem::replace(fuel_type, text(field, value)?)),
            (
                Activity::FixedInstallation { quantity, .. }
                | Activity::MobileMachinery { quantity, .. }
                | Activity::RoadVehicle { quantity, .. }
                | Activity::Process { quantity, .. },
                Field::Quantity,
            ) => FieldValue::from(std::mem::replace(quantity, number(field, value)?)),
            (Activity::RoadVehicle { vehicle_category, .. }, Field::VehicleCategory) => {
                FieldValue::from(std::mem::replace(vehicle_category, text(field, value)?))
            }
            (Activity::NonRoadTransport { mode, .. }, Field::TransportMode) => {
                FieldValue::from(std::mem::replace(mode, text(field, value)?))
            }
            (Activity::NonRoadTransport { distance, .. }, Field::Distance) => {
                FieldValue::from(std::mem::replace(distance, number(field, value)?))
            }
            (Activity::Fugitive { gas, .. } | Activity::Process { gas, .. }, Field::Gas) => {
                FieldValue::from(std::mem::replace(gas, text(field, value)?))
            }
            (Activity::Fugitive { gwp, .. } | Activity::Process { gwp, .. }, Field::Gwp) => {
                let new = match value {
                    FieldValue::Absent => None,
                    other => Some(number(field, other)?),
                };
                std::mem::replace(gwp, new).map_or(FieldValue::Absent, FieldValue::from)
            }
            (Activity::Fugitive { recharge_kg, .. }, Field::RechargeKg) => {
                FieldValue::from(std::mem::replace(recharge_kg, number(field, value)?))
            }
            (Activity::Electricity { provider, .. }, Field::Provider) => {
                FieldValue::from(std::mem::replace(provider, text(field, value)?))
            }
            (
                Activity::Electricity { kwh, .. } | Activity::HeatSteamCold { kwh, .. },
                Field::Kwh,
            ) => FieldValue::from(std::mem::replace(kwh, number(field, value)?)),
            (
                Activity::Electricity {
                    has_renewable_certificate,
                    ..
                },
                Field::RenewableCertificate,
            ) => FieldValue::from(std::mem::replace(
                has_renewable_certificate,
                flag(field, value)?,
            )),
            (Activity::HeatSteamCold { supplier, .. }, Field::Supplier) => {
                FieldValue::from(std::mem::replace(supplier, text(field, value)?))
            }
            (
                Activity::HeatSteamCold {
                    factor_kg_per_kwh, ..
                },
                Field::FactorKgPerKwh,
            ) => FieldValue::from(std::mem::replace(factor_kg_per_kwh, number(field, value)?)),
            _ => return Err(unknown),
        };
        Ok(old)
    }
}
