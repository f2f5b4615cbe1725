//! Rule-based validation of proposed changes
//!
//! Every rule runs on every event and issues accumulate; nothing
//! short-circuits. Only `Severity::Error` blocks a change. Warnings are
//! handed back to the caller alongside the successful result.
use crate::change::ChangeEvent;
use crate::config::PipelineConfig;
use crate::factors::ReferenceData;
use crate::field::{Field, FieldValue};
use crate::types::Year;
use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;

/// Pseudo-field name used for issues about the event's calculation year.
pub const YEAR_FIELD: &str = "anio";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ValidationIssue {
    pub field: String,
    pub message: String,
    pub severity: Severity,
}

impl ValidationIssue {
    fn error(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
            severity: Severity::Error,
        }
    }
    fn warning(field: &str, message: String) -> Self {
        Self {
            field: field.to_string(),
            message,
            severity: Severity::Warning,
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "[{level}] {}: {}", self.field, self.message)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        !self.issues.iter().any(|i| i.severity == Severity::Error)
    }
    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }
    pub fn warnings(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Warning)
    }
    pub fn has_issue_for(&self, field: &str) -> bool {
        self.issues.iter().any(|i| i.field == field)
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self.errors().map(ToString::to_string).collect();
        if rendered.is_empty() {
            return f.write_str("no errors");
        }
        f.write_str(&rendered.join("; "))
    }
}

pub trait ChangeValidator: Send + Sync {
    fn validate(&self, event: &ChangeEvent) -> ValidationReport;
}

pub struct RuleValidator {
    reference: Arc<dyn ReferenceData>,
    supported_years: RangeInclusive<Year>,
    quantity_warning_limit: f64,
}

impl RuleValidator {
    pub fn new(reference: Arc<dyn ReferenceData>, config: &PipelineConfig) -> Self {
        Self {
            reference,
            supported_years: config.supported_years.clone(),
            quantity_warning_limit: config.quantity_warning_limit,
        }
    }

    fn check_year(&self, year: Year, issues: &mut Vec<ValidationIssue>) {
        if !self.supported_years.contains(&year) {
            issues.push(ValidationIssue::error(
                YEAR_FIELD,
                format!(
                    "year {year} is outside the supported range {}-{}",
                    self.supported_years.start(),
                    self.supported_years.end()
                ),
            ));
            return;
        }
        if !self.reference.emission_factors().has_factors_for_year(year) {
            issues.push(ValidationIssue::warning(
                YEAR_FIELD,
                format!("no emission factors published for {year}; the nearest available year will be used"),
            ));
        }
    }

    fn check_field(&self, key: &str, value: &FieldValue, issues: &mut Vec<ValidationIssue>) {
        // keys we cannot classify are reported when the change is applied
        let Some(field) = Field::from_key(key) else {
            return;
        };

        if let FieldValue::Number(n) = value {
            if !n.is_finite() {
                issues.push(ValidationIssue::error(key, format!("{key} must be a finite number")));
                return;
            }
            if (field.is_quantity() || field.is_coefficient()) && *n < 0.0 {
                issues.push(ValidationIssue::error(
                    key,
                    format!("{key} cannot be negative (got {n})"),
                ));
            }
            if field.is_quantity() && *n > self.quantity_warning_limit {
                issues.push(ValidationIssue::warning(
                    key,
                    format!(
                        "{key} of {n} exceeds {} and looks unusually large; please double-check it",
                        self.quantity_warning_limit
                    ),
                ));
            }
        }

        if let (Some(catalog), FieldValue::Text(text)) = (field.catalog(), value) {
            if !self.reference.dropdown_catalogs().contains(catalog, text) {
                issues.push(ValidationIssue::warning(
                    key,
                    format!("'{text}' is not in the reference catalog"),
                ));
            }
        }
    }
}

impl ChangeValidator for RuleValidator {
    fn validate(&self, event: &ChangeEvent) -> ValidationReport {
        let mut issues = Vec::new();
        self.check_year(event.year, &mut issues);
        for (key, value) in event.proposed_fields() {
            self.check_field(&key, &value, &mut issues);
        }
        ValidationReport { issues }
    }
}
