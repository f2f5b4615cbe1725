//! Organization-year results, derived wholesale from activity records
//!
//! Records carry kilograms. This module is the only place where kilograms are
//! turned into tonnes.
use crate::profile::OrganizationProfile;
use crate::record::{Activity, ActivityRecord, ElectricityUse};
use crate::types::{OrganizationId, TimeStamp, Year};
use crate::utils::round_half_up;
use chrono::Utc;

pub const KG_PER_TONNE: f64 = 1000.0;
/// Decimal places kept on tonne figures.
pub const TONNE_DECIMALS: u32 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Default, minicbor::Encode, minicbor::Decode)]
pub struct Scope1 {
    #[n(0)]
    pub fixed_installations: f64,
    #[n(1)]
    pub road_transport: f64,
    #[n(2)]
    pub non_road_transport: f64,
    #[n(3)]
    pub mobile_machinery: f64,
    #[n(4)]
    pub fugitive: f64,
    #[n(5)]
    pub process: f64,
    #[n(6)]
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, minicbor::Encode, minicbor::Decode)]
pub struct Scope2 {
    #[n(0)]
    pub building_electricity: f64,
    #[n(1)]
    pub vehicle_electricity: f64,
    #[n(2)]
    pub heat_steam_cold: f64,
    #[n(3)]
    pub total: f64,
}

/// Tonnes CO2e per unit of each profile denominator.
#[derive(Debug, Clone, Copy, PartialEq, Default, minicbor::Encode, minicbor::Decode)]
pub struct IntensityRatios {
    #[n(0)]
    pub per_employee: Option<f64>,
    #[n(1)]
    pub per_floor_area: Option<f64>,
    #[n(2)]
    pub per_activity: Option<f64>,
}

/// All figures in tonnes CO2e.
#[derive(Debug, Clone, PartialEq, minicbor::Encode, minicbor::Decode)]
pub struct OrganizationYearResults {
    #[n(0)]
    pub organization_id: OrganizationId,
    #[n(1)]
    pub year: Year,
    #[n(2)]
    pub scope1: Scope1,
    #[n(3)]
    pub scope2: Scope2,
    #[n(4)]
    pub total: f64,
    #[n(5)]
    pub intensity: IntensityRatios,
    #[n(6)]
    pub record_count: u64,
    #[n(7)]
    pub calculated_at: TimeStamp<Utc>,
}

impl Scope1 {
    fn close(mut self) -> Self {
        for value in [
            &mut self.fixed_installations,
            &mut self.road_transport,
            &mut self.non_road_transport,
            &mut self.mobile_machinery,
            &mut self.fugitive,
            &mut self.process,
        ] {
            *value = to_tonnes(*value);
        }
        self.total = self.fixed_installations
            + self.road_transport
            + self.non_road_transport
            + self.mobile_machinery
            + self.fugitive
            + self.process;
        self
    }
}

impl Scope2 {
    fn close(mut self) -> Self {
        for value in [
            &mut self.building_electricity,
            &mut self.vehicle_electricity,
            &mut self.heat_steam_cold,
        ] {
            *value = to_tonnes(*value);
        }
        self.total = self.building_electricity + self.vehicle_electricity + self.heat_steam_cold;
        self
    }
}

fn to_tonnes(kg: f64) -> f64 {
    round_half_up(kg / KG_PER_TONNE, TONNE_DECIMALS)
}

fn ratio(total: f64, denominator: f64) -> Option<f64> {
    (denominator > 0.0).then(|| total / denominator)
}

/// Sums each record's cached kg CO2e into its category, converts to tonnes
/// and derives the ratios.
///
/// Category subtotals are rounded first; grand totals are the plain sum of
/// the rounded subtotals so they always add up.
pub fn aggregate<'a>(
    organization_id: OrganizationId,
    year: Year,
    records: impl IntoIterator<Item = &'a ActivityRecord>,
    profile: Option<&OrganizationProfile>,
) -> OrganizationYearResults {
    let mut scope1 = Scope1::default();
    let mut scope2 = Scope2::default();
    let mut record_count = 0u64;

    for record in records {
        let kg = record.totals.total_kg_co2e;
        let bucket = match &record.activity {
            Activity::FixedInstallation { .. } => &mut scope1.fixed_installations,
            Activity::RoadVehicle { .. } => &mut scope1.road_transport,
            Activity::NonRoadTransport { .. } => &mut scope1.non_road_transport,
            Activity::MobileMachinery { .. } => &mut scope1.mobile_machinery,
            Activity::Fugitive { .. } => &mut scope1.fugitive,
            Activity::Process { .. } => &mut scope1.process,
            Activity::Electricity {
                usage: ElectricityUse::Building,
                ..
            } => &mut scope2.building_electricity,
            Activity::Electricity {
                usage: ElectricityUse::Vehicle,
                ..
            } => &mut scope2.vehicle_electricity,
            Activity::HeatSteamCold { .. } => &mut scope2.heat_steam_cold,
        };
        *bucket += kg;
        record_count += 1;
    }

    let scope1 = scope1.close();
    let scope2 = scope2.close();
    let total = scope1.total + scope2.total;

    let intensity = profile
        .map(|p| IntensityRatios {
            per_employee: ratio(total, p.employees),
            per_floor_area: ratio(total, p.floor_area_m2),
            per_activity: ratio(total, p.activity_value),
        })
        .unwrap_or_default();

    OrganizationYearResults {
        organization_id,
        year,
        scope1,
        scope2,
        total,
        intensity,
        record_count,
        calculated_at: TimeStamp::new(),
    }
}
