//! Shared identifiers, timestamps and dataset keys
use chrono::{DateTime, TimeZone, Utc};
use std::fmt;

/// Calculation year of an organization's inventory.
pub type Year = i32;

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone)]
pub struct TimeStamp<T: TimeZone>(DateTime<T>);

impl TimeStamp<Utc> {
    pub fn new() -> Self {
        Self(Utc::now())
    }
    pub fn new_with(year: i32, month: u32, day: u32, hour: u32, min: u32, sec: u32) -> Option<Self> {
        Utc.with_ymd_and_hms(year, month, day, hour, min, sec)
            .single()
            .map(Self)
    }
    pub fn to_datetime_utc(&self) -> DateTime<Utc> {
        self.0
    }
}

impl Default for TimeStamp<Utc> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TimeZone> From<DateTime<T>> for TimeStamp<T> {
    fn from(value: DateTime<T>) -> Self {
        TimeStamp(value)
    }
}

impl fmt::Display for TimeStamp<Utc> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.to_rfc3339())
    }
}

impl<C> minicbor::Encode<C> for TimeStamp<Utc> {
    fn encode<W: minicbor::encode::Write>(
        &self,
        e: &mut minicbor::Encoder<W>,
        _: &mut C,
    ) -> Result<(), minicbor::encode::Error<W::Error>> {
        if let Some(nsec) = self.0.timestamp_nanos_opt() {
            return e.i64(nsec)?.ok();
        }

        Err(minicbor::encode::Error::message(
            "failed to encode timestamp. timestamp_nanos_opt returned None",
        ))
    }
}

impl<'b, C> minicbor::Decode<'b, C> for TimeStamp<Utc> {
    fn decode(d: &mut minicbor::Decoder<'b>, _: &mut C) -> Result<Self, minicbor::decode::Error> {
        let nsecs = d.i64()?;

        Ok(TimeStamp(DateTime::from_timestamp_nanos(nsecs)))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, minicbor::Encode, minicbor::Decode)]
pub struct OrganizationId(#[n(0)] String);

impl OrganizationId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OrganizationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OrganizationId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Kinds of dataset persisted per (organization, year).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, minicbor::Encode, minicbor::Decode)]
pub enum DatasetKind {
    #[n(0)]
    OrganizationProfile,
    #[n(1)]
    FixedInstallations,
    #[n(2)]
    Vehicles,
    #[n(3)]
    Fugitive,
    #[n(4)]
    Process,
    #[n(5)]
    Electricity,
    #[n(6)]
    Results,
}

impl DatasetKind {
    /// Dataset kinds that hold activity records.
    pub const RECORD_KINDS: [DatasetKind; 5] = [
        DatasetKind::FixedInstallations,
        DatasetKind::Vehicles,
        DatasetKind::Fugitive,
        DatasetKind::Process,
        DatasetKind::Electricity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DatasetKind::OrganizationProfile => "organization-profile",
            DatasetKind::FixedInstallations => "fixed-installations",
            DatasetKind::Vehicles => "vehicles",
            DatasetKind::Fugitive => "fugitive",
            DatasetKind::Process => "process",
            DatasetKind::Electricity => "electricity",
            DatasetKind::Results => "results",
        }
    }

    pub fn holds_records(&self) -> bool {
        Self::RECORD_KINDS.contains(self)
    }
}

impl fmt::Display for DatasetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DatasetKey {
    pub organization_id: OrganizationId,
    pub year: Year,
    pub kind: DatasetKind,
}

impl DatasetKey {
    pub fn new(organization_id: OrganizationId, year: Year, kind: DatasetKind) -> Self {
        Self {
            organization_id,
            year,
            kind,
        }
    }
    /// Storage key in the form `{org}/{year}/{kind}`.
    pub fn to_storage_key(&self) -> String {
        format!("{}/{}/{}", self.organization_id, self.year, self.kind)
    }
}

impl fmt::Display for DatasetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_storage_key())
    }
}
