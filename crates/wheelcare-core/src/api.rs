//! Presentation-facing adapters.
//!
//! [`Api`] is what a front end talks to. Each operation takes a raw form,
//! validates and sanitizes it, calls the matching service and wraps the
//! outcome in an [`Envelope`]:
//!
//! ```json
//! {"success": true, "data": {"id": "whc-1f3a9c0b", "status": "AVAILABLE"}}
//! {"success": false, "error": "some fields are invalid", "code": "E1101",
//!  "fields": [{"field": "first_name", "message": "is required"}]}
//! ```
//!
//! Internal failures are logged here and reach the caller only as the
//! localized generic message.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::i18n::Locale;
use crate::model::{
    Beneficiary, BeneficiaryStats, BeneficiaryStatus, Wheelchair, WheelchairStats, WheelchairStatus,
};
use crate::page::{DEFAULT_PAGE_LIMIT, Page, PageRequest};
use crate::service::Database;
use crate::validate::{
    AssignForm, BeneficiaryForm, DeliveryForm, FollowUpForm, Rule, ValidationErrors, WheelchairForm,
};

pub const DEFAULT_MAX_LIMIT: u32 = 100;

const WHEELCHAIR_STATUS_CHOICES: &[&str] = &["AVAILABLE", "ASSIGNED", "MAINTENANCE", "RETIRED"];
const BENEFICIARY_STATUS_CHOICES: &[&str] =
    &["PENDING", "APPROVED", "REJECTED", "DELIVERED", "FOLLOW_UP"];

/// One field-scoped message of a failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMessage {
    pub field: String,
    pub message: String,
}

/// Uniform result shape returned by every adapter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Envelope<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<&'static str>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldMessage>,
}

impl<T> Envelope<T> {
    #[must_use]
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            code: None,
            fields: Vec::new(),
        }
    }

    fn failure(err: &Error, locale: Locale) -> Self {
        let fields = match err {
            Error::Validation(errors) => errors
                .fields()
                .iter()
                .map(|e| FieldMessage {
                    field: e.field.to_string(),
                    message: locale.rule(&e.rule),
                })
                .collect(),
            _ => Vec::new(),
        };
        Self {
            success: false,
            data: None,
            error: Some(locale.error(err)),
            code: Some(err.code().code()),
            fields,
        }
    }

    /// Turn a failure into `Err(message)`, for callers that only need the text.
    ///
    /// # Errors
    ///
    /// Returns the localized message of a failure envelope.
    pub fn into_result(self) -> std::result::Result<T, String> {
        match self.data {
            Some(data) if self.success => Ok(data),
            _ => Err(self.error.unwrap_or_default()),
        }
    }
}

/// Paging and filter parameters of a list call, as submitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<String>,
}

/// Page size policy applied to every list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageLimits {
    pub default_limit: u32,
    pub max_limit: u32,
}

impl Default for PageLimits {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_PAGE_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
        }
    }
}

/// Outcome of a successful assignment: both updated records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assigned {
    pub beneficiary: Beneficiary,
    pub wheelchair: Wheelchair,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deleted {
    pub id: String,
}

#[derive(Debug)]
pub struct Api {
    db: Database,
    locale: Locale,
    limits: PageLimits,
}

impl Api {
    #[must_use]
    pub fn new(db: Database, locale: Locale) -> Self {
        Self {
            db,
            locale,
            limits: PageLimits::default(),
        }
    }

    #[must_use]
    pub const fn with_limits(mut self, limits: PageLimits) -> Self {
        self.limits = limits;
        self
    }

    #[must_use]
    pub const fn locale(&self) -> Locale {
        self.locale
    }

    pub const fn set_locale(&mut self, locale: Locale) {
        self.locale = locale;
    }

    #[must_use]
    pub const fn database(&self) -> &Database {
        &self.db
    }

    pub fn create_wheelchair(&mut self, form: &WheelchairForm) -> Envelope<Wheelchair> {
        let result = form
            .validate_new(self.db.today())
            .map_err(Error::from)
            .and_then(|input| self.db.wheelchairs().create(input));
        self.respond("create_wheelchair", result)
    }

    pub fn list_wheelchairs(&mut self, query: &ListQuery) -> Envelope<Page<Wheelchair>> {
        let request = self.page_request(query);
        let result = parse_status::<WheelchairStatus>(query, WHEELCHAIR_STATUS_CHOICES)
            .map(|status| self.db.wheelchairs().list(request, status));
        self.respond("list_wheelchairs", result)
    }

    pub fn get_wheelchair(&mut self, id: &str) -> Envelope<Wheelchair> {
        let result = self.db.wheelchairs().get(id.trim());
        self.respond("get_wheelchair", result)
    }

    pub fn update_wheelchair(&mut self, id: &str, form: &WheelchairForm) -> Envelope<Wheelchair> {
        let result = form
            .validate_patch(self.db.today())
            .map_err(Error::from)
            .and_then(|patch| self.db.wheelchairs().update(id.trim(), patch));
        self.respond("update_wheelchair", result)
    }

    pub fn delete_wheelchair(&mut self, id: &str) -> Envelope<Deleted> {
        let id = id.trim();
        let result = self.db.wheelchairs().delete(id).map(|()| Deleted { id: id.to_string() });
        self.respond("delete_wheelchair", result)
    }

    pub fn wheelchair_stats(&mut self) -> Envelope<WheelchairStats> {
        Envelope::success(self.db.wheelchairs().stats())
    }

    pub fn create_beneficiary(&mut self, form: &BeneficiaryForm) -> Envelope<Beneficiary> {
        let result = form
            .validate_new(self.db.today())
            .map_err(Error::from)
            .and_then(|input| self.db.beneficiaries().create(input));
        self.respond("create_beneficiary", result)
    }

    pub fn list_beneficiaries(&mut self, query: &ListQuery) -> Envelope<Page<Beneficiary>> {
        let request = self.page_request(query);
        let result = parse_status::<BeneficiaryStatus>(query, BENEFICIARY_STATUS_CHOICES)
            .map(|status| self.db.beneficiaries().list(request, status));
        self.respond("list_beneficiaries", result)
    }

    pub fn get_beneficiary(&mut self, id: &str) -> Envelope<Beneficiary> {
        let result = self.db.beneficiaries().get(id.trim());
        self.respond("get_beneficiary", result)
    }

    pub fn update_beneficiary(
        &mut self,
        id: &str,
        form: &BeneficiaryForm,
    ) -> Envelope<Beneficiary> {
        let result = form
            .validate_patch(self.db.today())
            .map_err(Error::from)
            .and_then(|patch| self.db.beneficiaries().update(id.trim(), patch));
        self.respond("update_beneficiary", result)
    }

    pub fn delete_beneficiary(&mut self, id: &str) -> Envelope<Deleted> {
        let id = id.trim();
        let result = self.db.beneficiaries().delete(id).map(|()| Deleted { id: id.to_string() });
        self.respond("delete_beneficiary", result)
    }

    pub fn beneficiary_stats(&mut self) -> Envelope<BeneficiaryStats> {
        Envelope::success(self.db.beneficiaries().stats())
    }

    pub fn assign_wheelchair(&mut self, form: &AssignForm) -> Envelope<Assigned> {
        let result = form
            .validate(self.db.today())
            .map_err(Error::from)
            .and_then(|input| self.db.beneficiaries().assign(input))
            .map(|(beneficiary, wheelchair)| Assigned {
                beneficiary,
                wheelchair,
            });
        self.respond("assign_wheelchair", result)
    }

    pub fn record_delivery(&mut self, id: &str, form: &DeliveryForm) -> Envelope<Beneficiary> {
        let result = form
            .validate(self.db.today())
            .map_err(Error::from)
            .and_then(|delivery| self.db.beneficiaries().deliver(id.trim(), delivery));
        self.respond("record_delivery", result)
    }

    pub fn record_follow_up(&mut self, id: &str, form: &FollowUpForm) -> Envelope<Beneficiary> {
        let result = form
            .validate(self.db.today())
            .map_err(Error::from)
            .and_then(|follow_up| self.db.beneficiaries().follow_up(id.trim(), follow_up));
        self.respond("record_follow_up", result)
    }

    fn page_request(&self, query: &ListQuery) -> PageRequest {
        let page = query.page.unwrap_or(1);
        let limit = query.limit.unwrap_or_else(|| i64::from(self.limits.default_limit));
        PageRequest::new(clamp_to_u32(page), clamp_to_u32(limit), self.limits.max_limit)
    }

    fn respond<T>(&self, operation: &'static str, result: Result<T>) -> Envelope<T> {
        match result {
            Ok(data) => Envelope::success(data),
            Err(err) => {
                if err.is_internal() {
                    tracing::error!(
                        operation,
                        code = %err.code(),
                        error = %err,
                        "operation failed"
                    );
                } else {
                    tracing::debug!(operation, code = %err.code(), error = %err, "request refused");
                }
                Envelope::failure(&err, self.locale)
            }
        }
    }
}

fn clamp_to_u32(value: i64) -> u32 {
    u32::try_from(value.max(0)).unwrap_or(u32::MAX)
}

/// Optional status filter; blank means no filter.
fn parse_status<T: FromStr>(
    query: &ListQuery,
    allowed: &'static [&'static str],
) -> Result<Option<T>> {
    let Some(raw) = query.status.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(None);
    };
    raw.parse()
        .map(Some)
        .map_err(|_| ValidationErrors::single("status", Rule::InvalidChoice { allowed }).into())
}
