//! Change-processing pipeline
//!
//! Each mutation moves through
//! `Received -> Audited -> Validated -> (Rejected | Calculated) -> ThresholdChecked -> Completed`.
//! Stages are awaited strictly in that order. The pipeline does not lock an
//! (organization, year): callers that allow concurrent writers must serialize
//! them per pair themselves.
use crate::audit::{AuditAction, AuditEntry, AuditLog, AuditReceipt, SledAuditLog};
use crate::calc::{EmissionCalculator, EmissionTotals, FactorTriple, StandardCalculator};
use crate::change::{ChangeEvent, Mutation};
use crate::config::PipelineConfig;
use crate::error::{FieldError, PipelineError, StoreError};
use crate::factors::{MACHINERY_CATEGORY, ReferenceData, Resolved, StaticReferenceData};
use crate::field::{Field, FieldValue};
use crate::profile::OrganizationProfile;
use crate::quota::{CachedQuotaGuard, QuotaGuard};
use crate::record::{Activity, ActivityRecord};
use crate::results::{self, OrganizationYearResults};
use crate::store::{Datasets, SledStore};
use crate::types::{DatasetKind, OrganizationId, Year};
use crate::utils::round_half_up;
use crate::validation::{ChangeValidator, RuleValidator, ValidationIssue, ValidationReport};
use std::fmt;
use std::sync::Arc;
use tracing::Instrument;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Received,
    Audited,
    Validated,
    Rejected,
    Calculated,
    ThresholdChecked,
    Completed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Increase,
    Decrease,
}

/// Year-on-year movement of the combined total beyond the configured threshold.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdAlert {
    pub direction: Direction,
    /// Signed percentage change against the prior year.
    pub change_pct: f64,
    pub previous_total: f64,
    pub current_total: f64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    ValidationWarning(ValidationIssue),
    StorageWarning(String),
    Threshold(ThresholdAlert),
}

impl fmt::Display for Alert {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alert::ValidationWarning(issue) => write!(f, "{issue}"),
            Alert::StorageWarning(message) => f.write_str(message),
            Alert::Threshold(alert) => f.write_str(&alert.message),
        }
    }
}

/// What a successful run hands back. `validation` is empty for recalculations.
#[derive(Debug, Clone, PartialEq)]
pub struct ChangeOutcome {
    pub results: OrganizationYearResults,
    pub alerts: Vec<Alert>,
    pub validation: ValidationReport,
}

/// Compares two combined totals, in tonnes. Exceeding `threshold_pct` is
/// required; equality does not alert. No prior emissions means no baseline.
pub fn threshold_alert(previous_total: f64, current_total: f64, threshold_pct: f64) -> Option<ThresholdAlert> {
    if previous_total <= 0.0 {
        return None;
    }
    // six decimals absorbs float noise at the boundary
    let change_pct = round_half_up((current_total - previous_total) * 100.0 / previous_total, 6);
    if change_pct.abs() <= threshold_pct {
        return None;
    }

    let (direction, verb) = if change_pct > 0.0 {
        (Direction::Increase, "increased")
    } else {
        (Direction::Decrease, "decreased")
    };
    let message = format!(
        "Total emissions {verb} by {:.1}% compared with the previous year ({previous_total:.3} t CO2e to {current_total:.3} t CO2e)",
        change_pct.abs()
    );

    Some(ThresholdAlert {
        direction,
        change_pct,
        previous_total,
        current_total,
        message,
    })
}

pub struct Pipeline {
    datasets: Datasets,
    reference: Arc<dyn ReferenceData>,
    audit: Arc<dyn AuditLog>,
    validator: Arc<dyn ChangeValidator>,
    calculator: Arc<dyn EmissionCalculator>,
    quota: Arc<dyn QuotaGuard>,
    config: PipelineConfig,
}

impl Pipeline {
    /// Wires the default validator and calculator from `config`. Replace
    /// either with [`Pipeline::with_validator`] or [`Pipeline::with_calculator`].
    pub fn new(
        datasets: Datasets,
        reference: Arc<dyn ReferenceData>,
        audit: Arc<dyn AuditLog>,
        quota: Arc<dyn QuotaGuard>,
        config: PipelineConfig,
    ) -> Self {
        let validator = Arc::new(RuleValidator::new(reference.clone(), &config));
        let calculator = Arc::new(StandardCalculator::new(config.gwp));
        Self {
            datasets,
            reference,
            audit,
            validator,
            calculator,
            quota,
            config,
        }
    }

    /// Everything on one sled database with the built-in reference tables.
    pub fn open(instance: Arc<sled::Db>, config: PipelineConfig) -> Result<Self, StoreError> {
        let store = Arc::new(SledStore::new(instance.clone())?);
        let audit = Arc::new(SledAuditLog::open(&instance)?);
        let quota = Arc::new(CachedQuotaGuard::new(store.clone(), config.quota.clone()));
        Ok(Self::new(
            Datasets::new(store),
            Arc::new(StaticReferenceData::standard()),
            audit,
            quota,
            config,
        ))
    }

    pub fn with_validator(mut self, validator: Arc<dyn ChangeValidator>) -> Self {
        self.validator = validator;
        self
    }
    pub fn with_calculator(mut self, calculator: Arc<dyn EmissionCalculator>) -> Self {
        self.calculator = calculator;
        self
    }

    pub fn datasets(&self) -> &Datasets {
        &self.datasets
    }
    pub fn audit_log(&self) -> &Arc<dyn AuditLog> {
        &self.audit
    }

    /// Audits, validates, applies and recalculates one mutation.
    pub async fn process_change(&self, event: ChangeEvent) -> Result<ChangeOutcome, PipelineError> {
        let span = tracing::info_span!(
            "process_change",
            org = %event.organization_id,
            year = event.year,
            kind = %event.entity_kind,
            entity = %event.entity_id
        );
        self.run_change(event).instrument(span).await
    }

    async fn run_change(&self, event: ChangeEvent) -> Result<ChangeOutcome, PipelineError> {
        tracing::debug!(stage = ?Stage::Received);

        // audit first: attempts are logged even when they are rejected below
        let entry = self.audit_entry(&event).await?;
        self.audit.record(entry).await?;
        self.quota.invalidate();
        tracing::debug!(stage = ?Stage::Audited);

        let validation = self.validator.validate(&event);
        if !validation.is_valid() {
            tracing::info!(stage = ?Stage::Rejected, errors = validation.errors().count(), "change rejected");
            return Err(PipelineError::Validation(validation));
        }
        tracing::debug!(stage = ?Stage::Validated, warnings = validation.warnings().count());

        let mut alerts: Vec<Alert> = validation.warnings().cloned().map(Alert::ValidationWarning).collect();

        let verdict = self.quota.check_write_allowed().await?;
        if !verdict.allowed {
            return Err(PipelineError::StorageQuotaExceeded(verdict));
        }
        if let Some(warning) = verdict.warning_message {
            alerts.push(Alert::StorageWarning(warning));
        }

        self.apply(&event).await?;
        self.quota.invalidate();

        let results = self.recalculate(&event.organization_id, event.year).await?;
        if let Some(alert) = self.check_threshold(&results).await? {
            alerts.push(Alert::Threshold(alert));
        }
        tracing::info!(stage = ?Stage::Completed, total = results.total, alerts = alerts.len());

        Ok(ChangeOutcome {
            results,
            alerts,
            validation,
        })
    }

    /// Full recompute for an organization and year without an incoming change.
    pub async fn recalculate_only(
        &self,
        actor: &str,
        organization_id: &OrganizationId,
        year: Year,
    ) -> Result<ChangeOutcome, PipelineError> {
        let entry = AuditEntry::new(actor, organization_id.clone(), AuditAction::Recalculate)
            .set_detail(&format!("year {year}"));
        self.audit.record(entry).await?;
        self.quota.invalidate();

        let results = self.recalculate(organization_id, year).await?;
        let alerts = self
            .check_threshold(&results)
            .await?
            .map(Alert::Threshold)
            .into_iter()
            .collect();

        Ok(ChangeOutcome {
            results,
            alerts,
            validation: ValidationReport::default(),
        })
    }

    /// Logs an export. Computed state is untouched.
    pub async fn record_export(
        &self,
        actor: &str,
        organization_id: &OrganizationId,
        format: &str,
    ) -> Result<AuditReceipt, PipelineError> {
        let entry = AuditEntry::new(actor, organization_id.clone(), AuditAction::Export).set_detail(format);
        let receipt = self.audit.record(entry).await?;
        self.quota.invalidate();
        Ok(receipt)
    }

    async fn audit_entry(&self, event: &ChangeEvent) -> Result<AuditEntry, PipelineError> {
        let entry = AuditEntry::new(&event.actor, event.organization_id.clone(), event.audit_action())
            .set_entity(event.entity_kind, &event.entity_id);

        let Mutation::SetField { field, value } = &event.mutation else {
            return Ok(entry);
        };
        let old = self.current_value(event, field).await?;
        Ok(entry.set_change(field, old, Some(value.clone())))
    }

    /// The value a `SetField` would replace, if the target exists.
    async fn current_value(&self, event: &ChangeEvent, key: &str) -> Result<Option<FieldValue>, StoreError> {
        let Some(field) = Field::from_key(key) else {
            return Ok(None);
        };
        let (org, year) = (&event.organization_id, event.year);

        if event.entity_kind == DatasetKind::OrganizationProfile {
            let profile = self.datasets.load_profile(org, year).await?;
            return Ok(profile.and_then(|p| {
                p.field_values()
                    .into_iter()
                    .find(|(f, _)| *f == field)
                    .map(|(_, v)| v)
            }));
        }
        if !event.entity_kind.holds_records() {
            return Ok(None);
        }

        let records = self.datasets.load_records(org, year, event.entity_kind).await?;
        Ok(records
            .iter()
            .find(|r| r.id == event.entity_id)
            .and_then(|r| r.field_value(field)))
    }

    async fn apply(&self, event: &ChangeEvent) -> Result<(), PipelineError> {
        let (org, year, kind) = (&event.organization_id, event.year, event.entity_kind);

        if kind == DatasetKind::OrganizationProfile {
            let mut profile = self
                .datasets
                .load_profile(org, year)
                .await?
                .unwrap_or_else(|| OrganizationProfile::new(org.clone(), year));
            match &event.mutation {
                Mutation::SetField { field, value } => {
                    profile.apply_field(parse_key(field)?, value)?;
                }
                Mutation::Insert(record) => {
                    return Err(FieldError::WrongDataset {
                        expected: kind,
                        actual: record.dataset_kind(),
                    }
                    .into());
                }
                Mutation::Remove => profile = OrganizationProfile::new(org.clone(), year),
            }
            self.datasets.save_profile(org, year, &profile).await?;
            return Ok(());
        }

        if !kind.holds_records() {
            return Err(FieldError::ReadOnly(kind).into());
        }

        let mut records = self.datasets.load_records(org, year, kind).await?;
        let position = records.iter().position(|r| r.id == event.entity_id);
        let missing = || FieldError::MissingEntity {
            kind,
            id: event.entity_id.clone(),
        };

        match &event.mutation {
            Mutation::SetField { field, value } => {
                let index = position.ok_or_else(missing)?;
                records[index].apply_field(parse_key(field)?, value)?;
            }
            Mutation::Insert(record) => {
                if record.dataset_kind() != kind {
                    return Err(FieldError::WrongDataset {
                        expected: kind,
                        actual: record.dataset_kind(),
                    }
                    .into());
                }
                if records.iter().any(|r| r.id == record.id) {
                    return Err(FieldError::DuplicateEntity {
                        kind,
                        id: record.id.clone(),
                    }
                    .into());
                }
                records.push(record.clone());
            }
            Mutation::Remove => {
                let index = position.ok_or_else(missing)?;
                records.remove(index);
            }
        }

        self.datasets.save_records(org, year, kind, &records).await?;
        Ok(())
    }

    /// Recomputes every record of every category for the year, then the
    /// aggregate. Never incremental.
    async fn recalculate(
        &self,
        organization_id: &OrganizationId,
        year: Year,
    ) -> Result<OrganizationYearResults, PipelineError> {
        let mut all = Vec::new();
        for kind in DatasetKind::RECORD_KINDS {
            let mut records = self.datasets.load_records(organization_id, year, kind).await?;
            if records.is_empty() {
                continue;
            }
            for record in records.iter_mut() {
                record.totals = self.record_totals(record, year);
            }
            self.datasets.save_records(organization_id, year, kind, &records).await?;
            all.extend(records);
        }

        let profile = self.datasets.load_profile(organization_id, year).await?;
        let results = results::aggregate(organization_id.clone(), year, &all, profile.as_ref());
        self.datasets.save_results(&results).await?;
        self.quota.invalidate();

        tracing::debug!(
            stage = ?Stage::Calculated,
            records = results.record_count,
            scope1 = results.scope1.total,
            scope2 = results.scope2.total,
            "results recalculated"
        );
        Ok(results)
    }

    fn record_totals(&self, record: &ActivityRecord, year: Year) -> EmissionTotals {
        let factors = self.reference.emission_factors();
        let calc = self.calculator.as_ref();

        let totals = match &record.activity {
            Activity::FixedInstallation { fuel_type, quantity } => {
                resolved(factors.fixed_fuel(fuel_type, year), year, record)
                    .map(|f| calc.combustion(*quantity, f))
            }
            Activity::RoadVehicle {
                fuel_type,
                vehicle_category,
                quantity,
            } => resolved(factors.mobile_fuel(fuel_type, vehicle_category, year), year, record)
                .map(|f| calc.combustion(*quantity, f)),
            Activity::MobileMachinery { fuel_type, quantity } => {
                resolved(factors.mobile_fuel(fuel_type, MACHINERY_CATEGORY, year), year, record)
                    .map(|f| calc.combustion(*quantity, f))
            }
            Activity::NonRoadTransport { mode, distance } => {
                resolved(factors.non_road(mode, year), year, record)
                    .map(|f| calc.combustion(*distance, FactorTriple::co2_only(f)))
            }
            Activity::Fugitive { gas, gwp, recharge_kg } => gwp
                .or_else(|| factors.refrigerant_gwp(gas))
                .map(|gwp| EmissionTotals::co2e_only(calc.fugitive(*recharge_kg, gwp))),
            Activity::Process { gas, gwp, quantity } => gwp
                .or_else(|| factors.refrigerant_gwp(gas))
                .map(|gwp| EmissionTotals::co2e_only(calc.fugitive(*quantity, gwp))),
            Activity::Electricity {
                provider,
                kwh,
                has_renewable_certificate,
                ..
            } => resolved(factors.electricity(provider, year), year, record).map(|f| {
                let co2 = calc.electricity(*kwh, f, *has_renewable_certificate);
                EmissionTotals {
                    co2_kg: co2,
                    total_kg_co2e: co2,
                    ..EmissionTotals::default()
                }
            }),
            Activity::HeatSteamCold {
                kwh,
                factor_kg_per_kwh,
                ..
            } => {
                let co2 = calc.electricity(*kwh, *factor_kg_per_kwh, false);
                Some(EmissionTotals {
                    co2_kg: co2,
                    total_kg_co2e: co2,
                    ..EmissionTotals::default()
                })
            }
        };

        totals.unwrap_or_else(|| {
            tracing::warn!(record = %record.id, kind = %record.dataset_kind(), "no emission factor found, counted as zero");
            EmissionTotals::default()
        })
    }

    async fn check_threshold(&self, results: &OrganizationYearResults) -> Result<Option<ThresholdAlert>, PipelineError> {
        let Some(previous) = self
            .datasets
            .load_results(&results.organization_id, results.year - 1)
            .await?
        else {
            tracing::debug!(stage = ?Stage::ThresholdChecked, "no prior year results");
            return Ok(None);
        };

        let alert = threshold_alert(previous.total, results.total, self.config.threshold_pct);
        tracing::debug!(stage = ?Stage::ThresholdChecked, alerted = alert.is_some());
        Ok(alert)
    }
}

fn parse_key(key: &str) -> Result<Field, FieldError> {
    Field::from_key(key).ok_or_else(|| FieldError::UnknownKey(key.to_string()))
}

fn resolved<T>(found: Option<Resolved<T>>, year: Year, record: &ActivityRecord) -> Option<T> {
    let found = found?;
    if found.is_fallback(year) {
        tracing::debug!(record = %record.id, requested = year, used = found.year, "using nearest factor year");
    }
    Some(found.value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fifteen_percent_rise_alerts() {
        let alert = threshold_alert(100.0, 115.0, 10.0).unwrap();
        assert_eq!(alert.direction, Direction::Increase);
        assert_eq!(alert.change_pct, 15.0);
        assert!(alert.message.contains("15.0%"));
        assert!(alert.message.contains("100.000"));
        assert!(alert.message.contains("115.000"));
    }

    #[test]
    fn five_percent_rise_is_quiet() {
        assert!(threshold_alert(100.0, 105.0, 10.0).is_none());
    }

    #[test]
    fn exactly_the_threshold_is_quiet() {
        assert!(threshold_alert(100.0, 110.0, 10.0).is_none());
        assert!(threshold_alert(100.0, 90.0, 10.0).is_none());
        assert!(threshold_alert(20.88, 22.968, 10.0).is_none());
    }

    #[test]
    fn drops_alert_as_decrease() {
        let alert = threshold_alert(100.0, 80.0, 10.0).unwrap();
        assert_eq!(alert.direction, Direction::Decrease);
        assert_eq!(alert.change_pct, -20.0);
        assert!(alert.message.contains("decreased by 20.0%"));
    }

    #[test]
    fn no_baseline_no_alert() {
        assert!(threshold_alert(0.0, 50.0, 10.0).is_none());
    }
}
