//! Registry records: wheelchairs, beneficiaries and their lifecycle states.

pub mod beneficiary;
pub mod wheelchair;

use std::fmt;

pub use beneficiary::{
    Assignment, Beneficiary, BeneficiaryPatch, BeneficiaryStats, BeneficiaryStatus, Delivery,
    FollowUp, Gender, NewBeneficiary, Stage,
};
pub use wheelchair::{
    Allocation, Condition, NewWheelchair, Source, Wheelchair, WheelchairPatch, WheelchairState,
    WheelchairStats, WheelchairStatus, WheelchairType,
};

/// Error returned when parsing an enum value from text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseEnumError {
    pub expected: &'static str,
    pub got: String,
}

impl fmt::Display for ParseEnumError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: '{}'", self.expected, self.got)
    }
}

impl std::error::Error for ParseEnumError {}

/// Canonical spelling for categorical input: `needs repair`, `Needs-Repair`
/// and `NEEDS_REPAIR` all normalize to `NEEDS_REPAIR`.
pub(crate) fn normalize(input: &str) -> String {
    input
        .trim()
        .chars()
        .map(|c| match c {
            '-' | ' ' => '_',
            other => other.to_ascii_uppercase(),
        })
        .collect()
}
