//! Organization profile: administrative data and ratio denominators
use crate::error::FieldError;
use crate::field::{Field, FieldValue};
use crate::types::{DatasetKind, OrganizationId, Year};

#[derive(Debug, Clone, PartialEq, Default, minicbor::Encode, minicbor::Decode)]
pub struct OrganizationProfile {
    #[n(0)]
    pub organization_id: Option<OrganizationId>,
    #[n(1)]
    pub name: String,
    #[n(2)]
    pub tax_id: String,
    #[n(3)]
    pub sector: String,
    #[n(4)]
    pub calculation_year: Option<Year>,
    #[n(5)]
    pub employees: f64,
    #[n(6)]
    pub floor_area_m2: f64,
    #[n(7)]
    pub activity_value: f64,
    #[n(8)]
    pub activity_unit: String,
}

impl OrganizationProfile {
    pub fn new(organization_id: OrganizationId, calculation_year: Year) -> Self {
        Self {
            organization_id: Some(organization_id),
            calculation_year: Some(calculation_year),
            ..Self::default()
        }
    }
    pub fn set_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }
    pub fn set_tax_id(mut self, tax_id: &str) -> Self {
        self.tax_id = tax_id.to_string();
        self
    }
    pub fn set_sector(mut self, sector: &str) -> Self {
        self.sector = sector.to_string();
        self
    }
    pub fn set_employees(mut self, employees: f64) -> Self {
        self.employees = employees;
        self
    }
    pub fn set_floor_area(mut self, m2: f64) -> Self {
        self.floor_area_m2 = m2;
        self
    }
    pub fn set_activity(mut self, value: f64, unit: &str) -> Self {
        self.activity_value = value;
        self.activity_unit = unit.to_string();
        self
    }

    pub fn field_values(&self) -> Vec<(Field, FieldValue)> {
        vec![
            (Field::Name, self.name.as_str().into()),
            (Field::TaxId, self.tax_id.as_str().into()),
            (Field::Sector, self.sector.as_str().into()),
            (Field::Employees, self.employees.into()),
            (Field::FloorArea, self.floor_area_m2.into()),
            (Field::ActivityValue, self.activity_value.into()),
            (Field::ActivityUnit, self.activity_unit.as_str().into()),
        ]
    }

    /// Sets one field, returning the value it replaced.
    pub fn apply_field(&mut self, field: Field, value: &FieldValue) -> Result<FieldValue, FieldError> {
        let wrong = |expected| FieldError::WrongType {
            field: field.key(),
            expected,
        };
        let text = |value: &FieldValue| value.as_text().map(str::to_string).ok_or(wrong("text"));
        let number = |value: &FieldValue| value.as_number().ok_or(wrong("number"));

        let old = match field {
            Field::Name => FieldValue::from(std::mem::replace(&mut self.name, text(value)?)),
            Field::TaxId => FieldValue::from(std::mem::replace(&mut self.tax_id, text(value)?)),
            Field::Sector => FieldValue::from(std::mem::replace(&mut self.sector, text(value)?)),
            Field::ActivityUnit => {
                FieldValue::from(std::mem::replace(&mut self.activity_unit, text(value)?))
            }
            Field::Employees => FieldValue::from(std::mem::replace(&mut self.employees, number(value)?)),
            Field::FloorArea => {
                FieldValue::from(std::mem::replace(&mut self.floor_area_m2, number(value)?))
            }
            Field::ActivityValue => {
                FieldValue::from(std::mem::replace(&mut self.activity_value, number(value)?))
            }
            _ => {
                return Err(FieldError::UnknownField {
                    field: field.key(),
                    kind: DatasetKind::OrganizationProfile,
                });
            }
        };
        Ok(old)
    }
}
