//! Input validation and sanitization.
//!
//! Every create, update and lifecycle operation receives a loosely typed
//! *form* (optional strings, as submitted). A schema in [`schema`] checks the
//! whole form, collecting one [`FieldError`] per violated field, and only then
//! produces the typed input the services accept. Free-text values of a valid
//! form pass through [`sanitize::clean`] on the way.

pub mod sanitize;
pub mod schema;

use chrono::{DateTime, NaiveDate};
use std::fmt;
use std::str::FromStr;

pub use schema::{
    AssignForm, AssignInput, BeneficiaryForm, DeliveryForm, FollowUpForm, WheelchairForm,
};

/// A single constraint a field value can violate.
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    Required,
    TooLong { max: usize },
    InvalidChoice { allowed: &'static [&'static str] },
    InvalidDate,
    FutureDate,
    NotANumber,
    NotAnInteger,
    NotABoolean,
    OutOfRange { min: f64, max: f64 },
    ReadOnly,
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Required => f.write_str("is required"),
            Self::TooLong { max } => write!(f, "must be at most {max} characters"),
            Self::InvalidChoice { allowed } => {
                write!(f, "must be one of {}", allowed.join(", "))
            }
            Self::InvalidDate => f.write_str("is not a valid date (YYYY-MM-DD)"),
            Self::FutureDate => f.write_str("must not be in the future"),
            Self::NotANumber => f.write_str("must be a number"),
            Self::NotAnInteger => f.write_str("must be a whole number"),
            Self::NotABoolean => f.write_str("must be true or false"),
            Self::OutOfRange { min, max } => write!(f, "must be between {min} and {max}"),
            Self::ReadOnly => f.write_str("cannot be changed by this operation"),
        }
    }
}

/// A rule violation tied to the form field that caused it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldError {
    pub field: &'static str,
    pub rule: Rule,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.field, self.rule)
    }
}

/// Every field error found in one form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationErrors(pub Vec<FieldError>);

impl ValidationErrors {
    #[must_use]
    pub fn single(field: &'static str, rule: Rule) -> Self {
        Self(vec![FieldError { field, rule }])
    }

    #[must_use]
    pub fn fields(&self) -> &[FieldError] {
        &self.0
    }

    /// Whether `field` has at least one error.
    #[must_use]
    pub fn has(&self, field: &str) -> bool {
        self.0.iter().any(|e| e.field == field)
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

/// Collects field errors across a whole form.
///
/// Each check returns the parsed (and, for text, sanitized) value when the
/// input is present and valid, and `None` otherwise. Callers build the typed
/// result from those values and call [`Checker::finish`], which fails if any
/// check recorded an error.
#[derive(Debug)]
pub struct Checker {
    today: NaiveDate,
    errors: Vec<FieldError>,
}

impl Checker {
    #[must_use]
    pub const fn new(today: NaiveDate) -> Self {
        Self {
            today,
            errors: Vec::new(),
        }
    }

    pub fn fail(&mut self, field: &'static str, rule: Rule) {
        self.errors.push(FieldError { field, rule });
    }

    /// Required free text, trimmed and sanitized.
    pub fn required_text(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        max: usize,
    ) -> Option<String> {
        let recorded = self.errors.len();
        let cleaned = self.text(field, value, max);
        // blank before or after sanitizing
        if cleaned.is_none() && self.errors.len() == recorded {
            self.fail(field, Rule::Required);
        }
        cleaned
    }

    /// Optional free text; input that is blank once sanitized counts as absent.
    pub fn text(&mut self, field: &'static str, value: Option<&str>, max: usize) -> Option<String> {
        let raw = present(value)?;
        if raw.chars().count() > max {
            self.fail(field, Rule::TooLong { max });
            return None;
        }
        Some(sanitize::clean(raw, max)).filter(|cleaned| !cleaned.is_empty())
    }

    /// Categorical value parsed through the type's `FromStr`.
    pub fn choice<T: FromStr>(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        allowed: &'static [&'static str],
    ) -> Option<T> {
        let raw = present(value)?;
        raw.parse::<T>().map_or_else(
            |_| {
                self.fail(field, Rule::InvalidChoice { allowed });
                None
            },
            Some,
        )
    }

    pub fn required_choice<T: FromStr>(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        allowed: &'static [&'static str],
    ) -> Option<T> {
        if present(value).is_none() {
            self.fail(field, Rule::Required);
            return None;
        }
        self.choice(field, value, allowed)
    }

    /// Optional calendar date that must not be after today.
    pub fn past_date(&mut self, field: &'static str, value: Option<&str>) -> Option<NaiveDate> {
        let raw = present(value)?;
        let Some(date) = parse_date(raw) else {
            self.fail(field, Rule::InvalidDate);
            return None;
        };
        if date > self.today {
            self.fail(field, Rule::FutureDate);
            return None;
        }
        Some(date)
    }

    pub fn required_past_date(
        &mut self,
        field: &'static str,
        value: Option<&str>,
    ) -> Option<NaiveDate> {
        if present(value).is_none() {
            self.fail(field, Rule::Required);
            return None;
        }
        self.past_date(field, value)
    }

    /// Optional number within `[min, max]`.
    pub fn number(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: f64,
        max: f64,
    ) -> Option<f64> {
        let raw = present(value)?;
        let Some(number) = raw.parse::<f64>().ok().filter(|n| n.is_finite()) else {
            self.fail(field, Rule::NotANumber);
            return None;
        };
        if number < min || number > max {
            self.fail(field, Rule::OutOfRange { min, max });
            return None;
        }
        Some(number)
    }

    /// Optional whole number within `[min, max]`.
    pub fn integer(
        &mut self,
        field: &'static str,
        value: Option<&str>,
        min: u8,
        max: u8,
    ) -> Option<u8> {
        let raw = present(value)?;
        let Some(number) = raw.parse::<f64>().ok().filter(|n| n.is_finite()) else {
            self.fail(field, Rule::NotANumber);
            return None;
        };
        if number.fract() != 0.0 {
            self.fail(field, Rule::NotAnInteger);
            return None;
        }
        if number < f64::from(min) || number > f64::from(max) {
            self.fail(
                field,
                Rule::OutOfRange {
                    min: f64::from(min),
                    max: f64::from(max),
                },
            );
            return None;
        }
        // whole and within u8 bounds, so the rendering parses
        format!("{:.0}", number.abs()).parse::<u8>().ok()
    }

    pub fn boolean(&mut self, field: &'static str, value: Option<&str>) -> Option<bool> {
        let raw = present(value)?;
        match raw.to_ascii_lowercase().as_str() {
            "true" | "yes" | "1" | "on" => Some(true),
            "false" | "no" | "0" | "off" => Some(false),
            _ => {
                self.fail(field, Rule::NotABoolean);
                None
            }
        }
    }

    /// Rejects any value for a field the operation does not allow to change.
    pub fn read_only(&mut self, field: &'static str, value: Option<&str>) {
        if present(value).is_some() {
            self.fail(field, Rule::ReadOnly);
        }
    }

    /// # Errors
    ///
    /// Returns every recorded field error if any check failed.
    pub fn finish<T>(self, value: T) -> Result<T, ValidationErrors> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ValidationErrors(self.errors))
        }
    }

    /// Like [`Checker::finish`] for schemas that can only assemble their
    /// output once the required parts parsed.
    ///
    /// # Errors
    ///
    /// Returns every recorded field error if any check failed.
    pub fn finish_with<T>(self, build: impl FnOnce() -> Option<T>) -> Result<T, ValidationErrors> {
        if !self.errors.is_empty() {
            return Err(ValidationErrors(self.errors));
        }
        build().ok_or_else(|| ValidationErrors::single("form", Rule::Required))
    }
}

/// Trimmed value, or `None` for missing and blank input.
fn present(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Accepts `YYYY-MM-DD` or an RFC 3339 timestamp (its calendar date is used).
#[must_use]
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}
