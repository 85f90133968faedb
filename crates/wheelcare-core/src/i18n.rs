//! Message catalog for the two supported locales.
//!
//! Field names stay as machine keys; only the human-readable text is
//! translated.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{EntityKind, Error, Transition};
use crate::validate::Rule;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

impl Locale {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ar => "ar",
        }
    }

    /// Message shown for internal failures whose details stay in the logs.
    #[must_use]
    pub const fn generic_failure(self) -> &'static str {
        match self {
            Self::En => "something went wrong, please try again",
            Self::Ar => "حدث خطأ ما، يرجى المحاولة مرة أخرى",
        }
    }

    /// Summary line of a failed validation.
    #[must_use]
    pub const fn validation_failed(self) -> &'static str {
        match self {
            Self::En => "some fields are invalid",
            Self::Ar => "بعض الحقول غير صالحة",
        }
    }

    #[must_use]
    pub fn rule(self, rule: &Rule) -> String {
        match self {
            Self::En => rule.to_string(),
            Self::Ar => match rule {
                Rule::Required => "هذا الحقل مطلوب".to_string(),
                Rule::TooLong { max } => format!("يجب ألا يتجاوز {max} حرفًا"),
                Rule::InvalidChoice { allowed } => {
                    format!("يجب أن تكون القيمة إحدى: {}", allowed.join("، "))
                }
                Rule::InvalidDate => "تاريخ غير صالح (YYYY-MM-DD)".to_string(),
                Rule::FutureDate => "لا يمكن أن يكون التاريخ في المستقبل".to_string(),
                Rule::NotANumber => "يجب أن تكون القيمة رقمًا".to_string(),
                Rule::NotAnInteger => "يجب أن تكون القيمة عددًا صحيحًا".to_string(),
                Rule::NotABoolean => "يجب أن تكون القيمة true أو false".to_string(),
                Rule::OutOfRange { min, max } => format!("يجب أن تكون القيمة بين {min} و {max}"),
                Rule::ReadOnly => "لا يمكن تغيير هذا الحقل بهذه العملية".to_string(),
            },
        }
    }

    /// The message a caller sees for `err`.
    #[must_use]
    pub fn error(self, err: &Error) -> String {
        match err {
            Error::Validation(_) => self.validation_failed().to_string(),
            Error::NotFound { kind, id } => self.not_found(*kind, id),
            Error::WheelchairUnavailable { .. } => match self {
                Self::En => "assignment failed, check wheelchair availability".to_string(),
                Self::Ar => "فشل التخصيص، تحقق من توفر الكرسي المتحرك".to_string(),
            },
            Error::InvalidTransition {
                transition, status, ..
            } => self.invalid_transition(*transition, status.as_str()),
            Error::InUse { kind, id, linked_id } => match self {
                Self::En => format!("{kind} {id} is linked to {linked_id} and cannot be deleted"),
                Self::Ar => format!("{} {id} مرتبط بـ {linked_id} ولا يمكن حذفه", noun_ar(*kind)),
            },
            Error::Store(_) => self.generic_failure().to_string(),
        }
    }

    fn not_found(self, kind: EntityKind, id: &str) -> String {
        match self {
            Self::En => format!("{kind} {id} not found"),
            Self::Ar => format!("{} {id} غير موجود", noun_ar(kind)),
        }
    }

    fn invalid_transition(self, transition: Transition, status: &str) -> String {
        match (self, transition) {
            (Self::En, Transition::Assign) => {
                format!(
                    "only pending beneficiaries can be assigned a wheelchair (status is {status})"
                )
            }
            (Self::En, Transition::Deliver) => {
                format!("delivery requires an approved assignment (status is {status})")
            }
            (Self::En, Transition::FollowUp) => {
                format!("follow-up requires a completed delivery (status is {status})")
            }
            (Self::Ar, Transition::Assign) => {
                format!("يمكن تخصيص كرسي متحرك للمستفيدين قيد الانتظار فقط (الحالة {status})")
            }
            (Self::Ar, Transition::Deliver) => {
                format!("يتطلب التسليم تخصيصًا معتمدًا (الحالة {status})")
            }
            (Self::Ar, Transition::FollowUp) => {
                format!("تتطلب المتابعة إتمام التسليم (الحالة {status})")
            }
        }
    }
}

const fn noun_ar(kind: EntityKind) -> &'static str {
    match kind {
        EntityKind::Wheelchair => "الكرسي المتحرك",
        EntityKind::Beneficiary => "المستفيد",
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unsupported locale '{0}' (expected en or ar)")]
pub struct UnknownLocale(pub String);

impl FromStr for Locale {
    type Err = UnknownLocale;

    /// Accepts bare codes and region-tagged ones such as `en-US` or `ar_SA`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lang = s
            .trim()
            .split(['-', '_', '.'])
            .next()
            .unwrap_or_default()
            .to_ascii_lowercase();
        match lang.as_str() {
            "en" => Ok(Self::En),
            "ar" => Ok(Self::Ar),
            _ => Err(UnknownLocale(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::WheelchairStatus;
    use crate::store::StoreError;

    #[test]
    fn parses_region_tagged_codes() {
        assert_eq!("en-US".parse::<Locale>().unwrap(), Locale::En);
        assert_eq!("ar_SA.UTF-8".parse::<Locale>().unwrap(), Locale::Ar);
        assert_eq!(" AR ".parse::<Locale>().unwrap(), Locale::Ar);
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn unavailable_wheelchair_message() {
        let err = Error::WheelchairUnavailable {
            id: "whc-1".into(),
            status: WheelchairStatus::Assigned,
        };
        assert_eq!(
            Locale::En.error(&err),
            "assignment failed, check wheelchair availability"
        );
        assert_ne!(Locale::Ar.error(&err), Locale::En.error(&err));
    }

    #[test]
    fn internal_errors_render_generic_message() {
        let err = Error::Store(StoreError::Io {
            path: "wheelchairs.json".into(),
            source: std::io::Error::other("disk full"),
        });
        for locale in [Locale::En, Locale::Ar] {
            let text = locale.error(&err);
            assert_eq!(text, locale.generic_failure());
            assert!(!text.contains("disk full"));
        }
    }

    #[test]
    fn every_rule_has_arabic_text() {
        let rules = [
            Rule::Required,
            Rule::TooLong { max: 50 },
            Rule::InvalidChoice { allowed: &["MALE", "FEMALE"] },
            Rule::InvalidDate,
            Rule::FutureDate,
            Rule::NotANumber,
            Rule::NotAnInteger,
            Rule::NotABoolean,
            Rule::OutOfRange { min: 1.0, max: 5.0 },
            Rule::ReadOnly,
        ];
        for rule in &rules {
            let ar = Locale::Ar.rule(rule);
            assert!(!ar.is_empty());
            assert_ne!(ar, Locale::En.rule(rule));
        }
    }

    #[test]
    fn serde_uses_lowercase_codes() {
        assert_eq!(serde_json::to_string(&Locale::Ar).unwrap(), "\"ar\"");
        assert_eq!(serde_json::from_str::<Locale>("\"en\"").unwrap(), Locale::En);
    }
}
