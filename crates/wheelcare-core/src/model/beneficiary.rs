use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use super::{ParseEnumError, normalize};
use crate::store::Record;

/// The five beneficiary lifecycle statuses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BeneficiaryStatus {
    Pending,
    Approved,
    Rejected,
    Delivered,
    FollowUp,
}

impl BeneficiaryStatus {
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::Approved,
        Self::Rejected,
        Self::Delivered,
        Self::FollowUp,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Approved => "APPROVED",
            Self::Rejected => "REJECTED",
            Self::Delivered => "DELIVERED",
            Self::FollowUp => "FOLLOW_UP",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Gender {
    Male,
    Female,
}

impl Gender {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Male => "MALE",
            Self::Female => "FEMALE",
        }
    }
}

/// The wheelchair reserved for a beneficiary at approval time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Assignment {
    pub wheelchair_id: String,
    pub approved_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
}

/// The recorded hand-over of the assigned wheelchair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Delivery {
    pub delivery_date: NaiveDate,
    pub delivery_location: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ceremony_date: Option<NaiveDate>,
}

/// The latest post-delivery check-in. Each follow-up replaces the previous one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUp {
    pub follow_up_date: NaiveDate,
    pub follow_up_notes: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction_rating: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feedback: Option<String>,
}

/// Lifecycle status together with the data each status carries.
///
/// Later stages keep the data of earlier ones, so a delivered beneficiary
/// still knows which wheelchair it received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Stage {
    Pending,
    Approved {
        assignment: Assignment,
    },
    Rejected,
    Delivered {
        assignment: Assignment,
        delivery: Delivery,
    },
    FollowUp {
        assignment: Assignment,
        delivery: Delivery,
        follow_up: FollowUp,
    },
}

impl Stage {
    #[must_use]
    pub const fn status(&self) -> BeneficiaryStatus {
        match self {
            Self::Pending => BeneficiaryStatus::Pending,
            Self::Approved { .. } => BeneficiaryStatus::Approved,
            Self::Rejected => BeneficiaryStatus::Rejected,
            Self::Delivered { .. } => BeneficiaryStatus::Delivered,
            Self::FollowUp { .. } => BeneficiaryStatus::FollowUp,
        }
    }

    #[must_use]
    pub const fn assignment(&self) -> Option<&Assignment> {
        match self {
            Self::Approved { assignment }
            | Self::Delivered { assignment, .. }
            | Self::FollowUp { assignment, .. } => Some(assignment),
            Self::Pending | Self::Rejected => None,
        }
    }

    #[must_use]
    pub const fn delivery(&self) -> Option<&Delivery> {
        match self {
            Self::Delivered { delivery, .. } | Self::FollowUp { delivery, .. } => Some(delivery),
            _ => None,
        }
    }

    #[must_use]
    pub const fn follow_up(&self) -> Option<&FollowUp> {
        match self {
            Self::FollowUp { follow_up, .. } => Some(follow_up),
            _ => None,
        }
    }
}

/// A person registered to potentially receive a wheelchair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disability_description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub application_date: NaiveDate,
    pub is_active: bool,
    #[serde(flatten)]
    pub stage: Stage,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Beneficiary {
    #[must_use]
    pub const fn status(&self) -> BeneficiaryStatus {
        self.stage.status()
    }

    /// Id of the wheelchair reserved for this beneficiary, if any.
    #[must_use]
    pub fn wheelchair_id(&self) -> Option<&str> {
        self.stage.assignment().map(|a| a.wheelchair_id.as_str())
    }

    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Record for Beneficiary {
    const COLLECTION: &'static str = "beneficiaries";
    const ID_PREFIX: &'static str = "ben";

    fn id(&self) -> &str {
        &self.id
    }
}

/// Validated input for registering a beneficiary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBeneficiary {
    pub first_name: String,
    pub last_name: String,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub disability_type: Option<String>,
    pub disability_description: Option<String>,
    pub notes: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl NewBeneficiary {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            gender: None,
            date_of_birth: None,
            national_id: None,
            phone: None,
            email: None,
            address: None,
            city: None,
            disability_type: None,
            disability_description: None,
            notes: None,
            application_date: None,
            is_active: None,
        }
    }
}

/// Partial update of personal beneficiary fields. Lifecycle data is only
/// changed by the assign, deliver and follow-up transitions.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BeneficiaryPatch {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<Gender>,
    pub date_of_birth: Option<NaiveDate>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub disability_type: Option<String>,
    pub disability_description: Option<String>,
    pub notes: Option<String>,
    pub application_date: Option<NaiveDate>,
    pub is_active: Option<bool>,
}

impl BeneficiaryPatch {
    pub(crate) fn apply(self, target: &mut Beneficiary) {
        fn set(slot: &mut Option<String>, value: Option<String>) {
            if value.is_some() {
                *slot = value;
            }
        }

        if let Some(v) = self.first_name {
            target.first_name = v;
        }
        if let Some(v) = self.last_name {
            target.last_name = v;
        }
        if self.gender.is_some() {
            target.gender = self.gender;
        }
        if self.date_of_birth.is_some() {
            target.date_of_birth = self.date_of_birth;
        }
        set(&mut target.national_id, self.national_id);
        set(&mut target.phone, self.phone);
        set(&mut target.email, self.email);
        set(&mut target.address, self.address);
        set(&mut target.city, self.city);
        set(&mut target.disability_type, self.disability_type);
        set(&mut target.disability_description, self.disability_description);
        set(&mut target.notes, self.notes);
        if let Some(v) = self.application_date {
            target.application_date = v;
        }
        if let Some(v) = self.is_active {
            target.is_active = v;
        }
    }
}

/// Registry counts by lifecycle status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeneficiaryStats {
    pub total: usize,
    pub pending: usize,
    pub approved: usize,
    pub rejected: usize,
    pub delivered: usize,
    pub follow_up: usize,
}

impl BeneficiaryStats {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a Beneficiary>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total += 1;
            match record.status() {
                BeneficiaryStatus::Pending => stats.pending += 1,
                BeneficiaryStatus::Approved => stats.approved += 1,
                BeneficiaryStatus::Rejected => stats.rejected += 1,
                BeneficiaryStatus::Delivered => stats.delivered += 1,
                BeneficiaryStatus::FollowUp => stats.follow_up += 1,
            }
        }
        stats
    }
}

impl fmt::Display for BeneficiaryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Gender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BeneficiaryStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "PENDING" => Ok(Self::Pending),
            "APPROVED" => Ok(Self::Approved),
            "REJECTED" => Ok(Self::Rejected),
            "DELIVERED" => Ok(Self::Delivered),
            "FOLLOW_UP" | "FOLLOWUP" => Ok(Self::FollowUp),
            _ => Err(ParseEnumError {
                expected: "status",
                got: s.to_string(),
            }),
        }
    }
}

impl FromStr for Gender {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match normalize(s).as_str() {
            "MALE" | "M" => Ok(Self::Male),
            "FEMALE" | "F" => Ok(Self::Female),
            _ => Err(ParseEnumError {
                expected: "gender",
                got: s.to_string(),
            }),
        }
    }
}
