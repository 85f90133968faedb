use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};
use crate::store::Record;

/// The four kinds of wheelchair kept in stock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WheelchairType {
    Manual,
    Electric,
    Sports,
    Standard,
}

impl WheelchairType {
    pub const ALL: [Self; 4] = [Self::Manual, Self::Electric, Self::Sports, Self::Standard];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "MANUAL",
            Self::Electric => "ELECTRIC",
            Self::Sports => "SPORTS",
            Self::Standard => "STANDARD",
        }
    }
}

/// Physical condition recorded at intake or on later inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    NeedsRepair,
}

impl Condition {
    pub const ALL: [Self; 4] = [Self::Excellent, Self::Good, Self::Fair, Self::NeedsRepair];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Excellent => "EXCELLENT",
            Self::Good => "GOOD",
            Self::Fair => "FAIR",
            Self::NeedsRepair => "NEEDS_REPAIR",
        }
    }
}

/// Where a wheelchair came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Source {
    Purchase,
    Donation,
    Partner,
    Government,
}

impl Source {
    pub const ALL: [Self; 4] = [
        Self::Purchase,
        Self::Donation,
        Self::Partner,
        Self::Government,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Purchase => "PURCHASE",
            Self::Donation => "DONATION",
            Self::Partner => "PARTNER",
            Self::Government => "GOVERNMENT",
        }
    }
}

/// Inventory status, without the data attached to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WheelchairStatus {
    Available,
    Assigned,
    Maintenance,
    Retired,
}

impl WheelchairStatus {
    pub const ALL: [Self; 4] = [
        Self::Available,
        Self::Assigned,
        Self::Maintenance,
        Self::Retired,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Assigned => "ASSIGNED",
            Self::Maintenance => "MAINTENANCE",
            Self::Retired => "RETIRED",
        }
    }
}

/// Who holds an assigned wheelchair and since when.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    pub assigned_to: String,
    pub assigned_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assigned_by: Option<String>,
}

/// Inventory status together with the fields that only exist in it.
///
/// Serialized inline into the wheelchair record under a `status` tag, so the
/// back-reference to the beneficiary exists exactly when the status is
/// `ASSIGNED`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WheelchairState {
    Available,
    Assigned { allocation: Allocation },
    Maintenance,
    Retired,
}

impl WheelchairState {
    #[must_use]
    pub const fn status(&self) -> WheelchairStatus {
        match self {
            Self::Available => WheelchairStatus::Available,
            Self::Assigned { .. } => WheelchairStatus::Assigned,
            Self::Maintenance => WheelchairStatus::Maintenance,
            Self::Retired => WheelchairStatus::Retired,
        }
    }
}

/// A wheelchair in the association's inventory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Wheelchair {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brand: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(rename = "type")]
    pub kind: WheelchairType,
    pub condition: Condition,
    pub source: Source,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub donor_contact: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub purchase_date: Option<NaiveDate>,
    pub received_date: NaiveDate,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(flatten)]
    pub state: WheelchairState,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Wheelchair {
    #[must_use]
    pub const fn status(&self) -> WheelchairStatus {
        self.state.status()
    }

    /// Beneficiary id holding this wheelchair, if any.
    #[must_use]
    pub fn assigned_to(&self) -> Option<&str> {
        match &self.state {
            WheelchairState::Assigned { allocation } => Some(&allocation.assigned_to),
            _ => None,
        }
    }
}

impl Record for Wheelchair {
    const COLLECTION: &'static str = "wheelchairs";
    const ID_PREFIX: &'static str = "whc";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Validated input for creating a wheelchair.
#[derive(Debug, Clone, PartialEq)]
pub struct NewWheelchair {
    pub serial_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub kind: WheelchairType,
    pub condition: Condition,
    pub source: Source,
    pub donor_name: Option<String>,
    pub donor_contact: Option<String>,
    pub cost: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
    /// Starting status; `None` means `AVAILABLE`. `ASSIGNED` is refused.
    pub status: Option<WheelchairStatus>,
}

impl NewWheelchair {
    #[must_use]
    pub const fn new(kind: WheelchairType, condition: Condition, source: Source) -> Self {
        Self {
            serial_number: None,
            brand: None,
            model: None,
            kind,
            condition,
            source,
            donor_name: None,
            donor_contact: None,
            cost: None,
            purchase_date: None,
            received_date: None,
            notes: None,
            status: None,
        }
    }
}

/// Partial update of descriptive wheelchair fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WheelchairPatch {
    pub serial_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    pub kind: Option<WheelchairType>,
    pub condition: Option<Condition>,
    pub source: Option<Source>,
    pub donor_name: Option<String>,
    pub donor_contact: Option<String>,
    pub cost: Option<f64>,
    pub purchase_date: Option<NaiveDate>,
    pub received_date: Option<NaiveDate>,
    pub notes: Option<String>,
}

impl WheelchairPatch {
    pub(crate) fn apply(self, target: &mut Wheelchair) {
        if let Some(v) = self.serial_number {
            target.serial_number = Some(v);
        }
        if let Some(v) = self.brand {
            target.brand = Some(v);
        }
        if let Some(v) = self.model {
            target.model = Some(v);
        }
        if let Some(v) = self.kind {
            target.kind = v;
        }
        if let Some(v) = self.condition {
            target.condition = v;
        }
        if let Some(v) = self.source {
            target.source = v;
        }
        if let Some(v) = self.donor_name {
            target.donor_name = Some(v);
        }
        if let Some(v) = self.donor_contact {
            target.donor_contact = Some(v);
        }
        if let Some(v) = self.cost {
            target.cost = Some(v);
        }
        if let Some(v) = self.purchase_date {
            target.purchase_date = Some(v);
        }
        if let Some(v) = self.received_date {
            target.received_date = v;
        }
        if let Some(v) = self.notes {
            target.notes = Some(v);
        }
    }
}

/// Inventory counts by status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WheelchairStats {
    pub total: usize,
    pub available: usize,
    pub assigned: usize,
    pub maintenance: usize,
    pub retired: usize,
}

impl WheelchairStats {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a Wheelchair>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.status() {
                WheelchairStatus::Available => stats.available += 1,
                WheelchairStatus::Assigned => stats.assigned += 1,
                WheelchairStatus::Maintenance => stats.maintenance += 1,
                WheelchairStatus::Retired => stats.retired += 1,
            }
        }
        stats
    }
}

impl fmt::Display for WheelchairType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for WheelchairStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WheelchairType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "MANUAL" => Ok(Self::Manual),
            "ELECTRIC" => Ok(Self::Electric),
            "SPORTS" => Ok(Self::Sports),
            "STANDARD" => Ok(Self::Standard),
            _ => Err(ParseEnumError {
                expected: "type",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Condition {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "EXCELLENT" => Ok(Self::Excellent),
            "GOOD" => Ok(Self::Good),
            "FAIR" => Ok(Self::Fair),
            "NEEDS_REPAIR" => Ok(Self::NeedsRepair),
            _ => Err(ParseEnumError {
                expected: "condition",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Source {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PURCHASE" => Ok(Self::Purchase),
            "DONATION" => Ok(Self::Donation),
            "PARTNER" => Ok(Self::Partner),
            "GOVERNMENT" => Ok(Self::Government),
            _ => Err(ParseEnumError {
                expected: "source",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for WheelchairStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "AVAILABLE" => Ok(Self::Available),
            "ASSIGNED" => Ok(Self::Assigned),
            "MAINTENANCE" => Ok(Self::Maintenance),
            "RETIRED" => Ok(Self::Retired),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}
