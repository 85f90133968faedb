//! Form schemas for every registry operation.

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use super::{Checker, Rule, ValidationErrors};
use crate::model::{
    BeneficiaryPatch, Condition, Delivery, FollowUp, Gender, NewBeneficiary, NewWheelchair, Source,
    WheelchairPatch, WheelchairStatus, WheelchairType,
};

pub const MAX_NAME_LEN: usize = 50;
pub const MAX_LABEL_LEN: usize = 100;
pub const MAX_ID_LEN: usize = 64;
pub const MAX_NATIONAL_ID_LEN: usize = 20;
pub const MAX_PHONE_LEN: usize = 20;
pub const MAX_ADDRESS_LEN: usize = 200;
pub const MAX_TEXT_LEN: usize = 1000;
pub const MAX_COST: f64 = 100_000.0;
pub const RATING_RANGE: (u8, u8) = (1, 5);

const TYPE_CHOICES: &[&str] = &["MANUAL", "ELECTRIC", "SPORTS", "STANDARD"];
const CONDITION_CHOICES: &[&str] = &["EXCELLENT", "GOOD", "FAIR", "NEEDS_REPAIR"];
const SOURCE_CHOICES: &[&str] = &["PURCHASE", "DONATION", "PARTNER", "GOVERNMENT"];
pub(crate) const INITIAL_STATUS_CHOICES: &[&str] = &["AVAILABLE", "MAINTENANCE", "RETIRED"];
const GENDER_CHOICES: &[&str] = &["MALE", "FEMALE"];

/// Accepts JSON strings, numbers and booleans for a form field, the way a
/// submitted form or a hand-written JSON document may carry them.
fn loose<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

/// Wheelchair intake and edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WheelchairForm {
    pub serial_number: Option<String>,
    pub brand: Option<String>,
    pub model: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<String>,
    pub condition: Option<String>,
    pub source: Option<String>,
    pub donor_name: Option<String>,
    pub donor_contact: Option<String>,
    #[serde(deserialize_with = "loose")]
    pub cost: Option<String>,
    pub purchase_date: Option<String>,
    pub received_date: Option<String>,
    pub notes: Option<String>,
    pub status: Option<String>,
}

impl WheelchairForm {
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate_new(&self, today: NaiveDate) -> Result<NewWheelchair, ValidationErrors> {
        let mut check = Checker::new(today);
        let kind =
            check.required_choice::<WheelchairType>("type", self.kind.as_deref(), TYPE_CHOICES);
        let condition = check.required_choice::<Condition>(
            "condition",
            self.condition.as_deref(),
            CONDITION_CHOICES,
        );
        let source =
            check.required_choice::<Source>("source", self.source.as_deref(), SOURCE_CHOICES);
        let status = check.choice::<WheelchairStatus>(
            "status",
            self.status.as_deref(),
            INITIAL_STATUS_CHOICES,
        );
        if status == Some(WheelchairStatus::Assigned) {
            check.fail(
                "status",
                Rule::InvalidChoice {
                    allowed: INITIAL_STATUS_CHOICES,
                },
            );
        }

        let serial_number =
            check.text("serial_number", self.serial_number.as_deref(), MAX_LABEL_LEN);
        let brand = check.text("brand", self.brand.as_deref(), MAX_LABEL_LEN);
        let model = check.text("model", self.model.as_deref(), MAX_LABEL_LEN);
        let donor_name = check.text("donor_name", self.donor_name.as_deref(), MAX_LABEL_LEN);
        let donor_contact =
            check.text("donor_contact", self.donor_contact.as_deref(), MAX_LABEL_LEN);
        let cost = check.number("cost", self.cost.as_deref(), 0.0, MAX_COST);
        let purchase_date = check.past_date("purchase_date", self.purchase_date.as_deref());
        let received_date = check.past_date("received_date", self.received_date.as_deref());
        let notes = check.text("notes", self.notes.as_deref(), MAX_TEXT_LEN);

        check.finish_with(|| {
            Some(NewWheelchair {
                serial_number,
                brand,
                model,
                kind: kind?,
                condition: condition?,
                source: source?,
                donor_name,
                donor_contact,
                cost,
                purchase_date,
                received_date,
                notes,
                status,
            })
        })
    }

    /// Only the fields present in the form are checked; status is refused.
    ///
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate_patch(&self, today: NaiveDate) -> Result<WheelchairPatch, ValidationErrors> {
        let mut check = Checker::new(today);
        check.read_only("status", self.status.as_deref());
        let patch = WheelchairPatch {
            serial_number: check.text(
                "serial_number",
                self.serial_number.as_deref(),
                MAX_LABEL_LEN,
            ),
            brand: check.text("brand", self.brand.as_deref(), MAX_LABEL_LEN),
            model: check.text("model", self.model.as_deref(), MAX_LABEL_LEN),
            kind: check.choice("type", self.kind.as_deref(), TYPE_CHOICES),
            condition: check.choice("condition", self.condition.as_deref(), CONDITION_CHOICES),
            source: check.choice("source", self.source.as_deref(), SOURCE_CHOICES),
            donor_name: check.text("donor_name", self.donor_name.as_deref(), MAX_LABEL_LEN),
            donor_contact: check.text(
                "donor_contact",
                self.donor_contact.as_deref(),
                MAX_LABEL_LEN,
            ),
            cost: check.number("cost", self.cost.as_deref(), 0.0, MAX_COST),
            purchase_date: check.past_date("purchase_date", self.purchase_date.as_deref()),
            received_date: check.past_date("received_date", self.received_date.as_deref()),
            notes: check.text("notes", self.notes.as_deref(), MAX_TEXT_LEN),
        };
        check.finish(patch)
    }
}

/// Beneficiary registration and edit form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeneficiaryForm {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub date_of_birth: Option<String>,
    pub national_id: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub disability_type: Option<String>,
    pub disability_description: Option<String>,
    pub notes: Option<String>,
    pub application_date: Option<String>,
    #[serde(deserialize_with = "loose")]
    pub is_active: Option<String>,
    pub status: Option<String>,
    pub wheelchair_id: Option<String>,
}

impl BeneficiaryForm {
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate_new(&self, today: NaiveDate) -> Result<NewBeneficiary, ValidationErrors> {
        let mut check = Checker::new(today);
        check.read_only("status", self.status.as_deref());
        check.read_only("wheelchair_id", self.wheelchair_id.as_deref());
        let first_name =
            check.required_text("first_name", self.first_name.as_deref(), MAX_NAME_LEN);
        let last_name = check.required_text("last_name", self.last_name.as_deref(), MAX_NAME_LEN);
        let fields = self.optional_fields(&mut check);

        check.finish_with(|| {
            Some(NewBeneficiary {
                first_name: first_name?,
                last_name: last_name?,
                gender: fields.gender,
                date_of_birth: fields.date_of_birth,
                national_id: fields.national_id,
                phone: fields.phone,
                email: fields.email,
                address: fields.address,
                city: fields.city,
                disability_type: fields.disability_type,
                disability_description: fields.disability_description,
                notes: fields.notes,
                application_date: fields.application_date,
                is_active: fields.is_active,
            })
        })
    }

    /// Only the fields present in the form are checked; lifecycle fields are
    /// refused.
    ///
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate_patch(&self, today: NaiveDate) -> Result<BeneficiaryPatch, ValidationErrors> {
        let mut check = Checker::new(today);
        check.read_only("status", self.status.as_deref());
        check.read_only("wheelchair_id", self.wheelchair_id.as_deref());
        let first_name = check.text("first_name", self.first_name.as_deref(), MAX_NAME_LEN);
        let last_name = check.text("last_name", self.last_name.as_deref(), MAX_NAME_LEN);
        let fields = self.optional_fields(&mut check);

        check.finish(BeneficiaryPatch {
            first_name,
            last_name,
            gender: fields.gender,
            date_of_birth: fields.date_of_birth,
            national_id: fields.national_id,
            phone: fields.phone,
            email: fields.email,
            address: fields.address,
            city: fields.city,
            disability_type: fields.disability_type,
            disability_description: fields.disability_description,
            notes: fields.notes,
            application_date: fields.application_date,
            is_active: fields.is_active,
        })
    }

    fn optional_fields(&self, check: &mut Checker) -> BeneficiaryPatch {
        BeneficiaryPatch {
            first_name: None,
            last_name: None,
            gender: check.choice::<Gender>("gender", self.gender.as_deref(), GENDER_CHOICES),
            date_of_birth: check.past_date("date_of_birth", self.date_of_birth.as_deref()),
            national_id: check.text(
                "national_id",
                self.national_id.as_deref(),
                MAX_NATIONAL_ID_LEN,
            ),
            phone: check.text("phone", self.phone.as_deref(), MAX_PHONE_LEN),
            email: check.text("email", self.email.as_deref(), MAX_LABEL_LEN),
            address: check.text("address", self.address.as_deref(), MAX_ADDRESS_LEN),
            city: check.text("city", self.city.as_deref(), MAX_NAME_LEN),
            disability_type: check.text(
                "disability_type",
                self.disability_type.as_deref(),
                MAX_LABEL_LEN,
            ),
            disability_description: check.text(
                "disability_description",
                self.disability_description.as_deref(),
                MAX_TEXT_LEN,
            ),
            notes: check.text("notes", self.notes.as_deref(), MAX_TEXT_LEN),
            application_date: check.past_date("application_date", self.application_date.as_deref()),
            is_active: check.boolean("is_active", self.is_active.as_deref()),
        }
    }
}

/// Request to reserve a wheelchair for a beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssignForm {
    pub beneficiary_id: Option<String>,
    pub wheelchair_id: Option<String>,
    pub assigned_by: Option<String>,
}

/// Validated assignment request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignInput {
    pub beneficiary_id: String,
    pub wheelchair_id: String,
    pub assigned_by: Option<String>,
}

impl AssignForm {
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate(&self, today: NaiveDate) -> Result<AssignInput, ValidationErrors> {
        let mut check = Checker::new(today);
        let beneficiary_id =
            check.required_text("beneficiary_id", self.beneficiary_id.as_deref(), MAX_ID_LEN);
        let wheelchair_id =
            check.required_text("wheelchair_id", self.wheelchair_id.as_deref(), MAX_ID_LEN);
        let assigned_by = check.text("assigned_by", self.assigned_by.as_deref(), MAX_LABEL_LEN);
        check.finish_with(|| {
            Some(AssignInput {
                beneficiary_id: beneficiary_id?,
                wheelchair_id: wheelchair_id?,
                assigned_by,
            })
        })
    }
}

/// Delivery record for an approved beneficiary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryForm {
    pub delivery_date: Option<String>,
    pub delivery_location: Option<String>,
    pub ceremony_date: Option<String>,
}

impl DeliveryForm {
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate(&self, today: NaiveDate) -> Result<Delivery, ValidationErrors> {
        let mut check = Checker::new(today);
        let delivery_date =
            check.required_past_date("delivery_date", self.delivery_date.as_deref());
        let delivery_location = check.required_text(
            "delivery_location",
            self.delivery_location.as_deref(),
            MAX_ADDRESS_LEN,
        );
        let ceremony_date = check.past_date("ceremony_date", self.ceremony_date.as_deref());
        check.finish_with(|| {
            Some(Delivery {
                delivery_date: delivery_date?,
                delivery_location: delivery_location?,
                ceremony_date,
            })
        })
    }
}

/// Post-delivery check-in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FollowUpForm {
    pub follow_up_date: Option<String>,
    pub follow_up_notes: Option<String>,
    #[serde(deserialize_with = "loose")]
    pub satisfaction_rating: Option<String>,
    pub feedback: Option<String>,
}

impl FollowUpForm {
    /// # Errors
    ///
    /// Returns every field error found in the form.
    pub fn validate(&self, today: NaiveDate) -> Result<FollowUp, ValidationErrors> {
        let mut check = Checker::new(today);
        let follow_up_date =
            check.required_past_date("follow_up_date", self.follow_up_date.as_deref());
        let follow_up_notes =
            check.required_text("follow_up_notes", self.follow_up_notes.as_deref(), MAX_TEXT_LEN);
        let (min, max) = RATING_RANGE;
        let satisfaction_rating =
            check.integer("satisfaction_rating", self.satisfaction_rating.as_deref(), min, max);
        let feedback = check.text("feedback", self.feedback.as_deref(), MAX_TEXT_LEN);
        check.finish_with(|| {
            Some(FollowUp {
                follow_up_date: follow_up_date?,
                follow_up_notes: follow_up_notes?,
                satisfaction_rating,
                feedback,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn s(value: &str) -> Option<String> {
        Some(value.to_string())
    }

    #[test]
    fn wheelchair_requires_type_condition_source() {
        let errors = WheelchairForm::default().validate_new(today()).unwrap_err();
        assert!(errors.has("type"));
        assert!(errors.has("condition"));
        assert!(errors.has("source"));
        assert_eq!(errors.fields().len(), 3);
    }

    #[test]
    fn wheelchair_form_parses_and_sanitizes() {
        let form = WheelchairForm {
            kind: s("standard"),
            condition: s("EXCELLENT"),
            source: s("donation"),
            brand: s("  <i>Invacare</i> "),
            cost: s("1250.50"),
            ..WheelchairForm::default()
        };
        let input = form.validate_new(today()).unwrap();
        assert_eq!(input.kind, WheelchairType::Standard);
        assert_eq!(input.source, Source::Donation);
        assert_eq!(input.brand.as_deref(), Some("iInvacare/i"));
        assert_eq!(input.cost, Some(1250.5));
        assert!(input.status.is_none());
    }

    #[test]
    fn wheelchair_cannot_start_assigned() {
        let form = WheelchairForm {
            kind: s("MANUAL"),
            condition: s("GOOD"),
            source: s("PURCHASE"),
            status: s("ASSIGNED"),
            ..WheelchairForm::default()
        };
        let errors = form.validate_new(today()).unwrap_err();
        assert!(errors.has("status"));

        let form = WheelchairForm {
            status: s("maintenance"),
            ..form
        };
        assert_eq!(
            form.validate_new(today()).unwrap().status,
            Some(WheelchairStatus::Maintenance)
        );
    }

    #[test]
    fn wheelchair_cost_and_dates_are_bounded() {
        let form = WheelchairForm {
            kind: s("SPORTS"),
            condition: s("FAIR"),
            source: s("PARTNER"),
            cost: s("100001"),
            purchase_date: s("2024-06-02"),
            ..WheelchairForm::default()
        };
        let errors = form.validate_new(today()).unwrap_err();
        assert!(errors.has("cost"));
        assert!(errors.has("purchase_date"));
    }

    #[test]
    fn wheelchair_patch_refuses_status() {
        let form = WheelchairForm {
            status: s("RETIRED"),
            ..WheelchairForm::default()
        };
        let errors = form.validate_patch(today()).unwrap_err();
        assert_eq!(errors.fields()[0].rule, Rule::ReadOnly);

        let form = WheelchairForm {
            notes: s("new tyres"),
            ..WheelchairForm::default()
        };
        let patch = form.validate_patch(today()).unwrap();
        assert_eq!(patch.notes.as_deref(), Some("new tyres"));
        assert!(patch.kind.is_none());
    }

    #[test]
    fn form_accepts_json_numbers() {
        let form: WheelchairForm = serde_json::from_value(serde_json::json!({
            "type": "ELECTRIC",
            "condition": "GOOD",
            "source": "GOVERNMENT",
            "cost": 900
        }))
        .unwrap();
        assert_eq!(form.cost.as_deref(), Some("900"));

        let form: FollowUpForm = serde_json::from_value(serde_json::json!({
            "follow_up_date": "2024-04-01",
            "follow_up_notes": "Doing well",
            "satisfaction_rating": 5
        }))
        .unwrap();
        assert_eq!(form.validate(today()).unwrap().satisfaction_rating, Some(5));
    }

    #[test]
    fn beneficiary_requires_names() {
        let errors = BeneficiaryForm::default().validate_new(today()).unwrap_err();
        assert!(errors.has("first_name"));
        assert!(errors.has("last_name"));

        let form = BeneficiaryForm {
            first_name: s("Aisha"),
            last_name: s("K"),
            gender: s("female"),
            is_active: s("false"),
            ..BeneficiaryForm::default()
        };
        let input = form.validate_new(today()).unwrap();
        assert_eq!(input.first_name, "Aisha");
        assert_eq!(input.gender, Some(Gender::Female));
        assert_eq!(input.is_active, Some(false));
    }

    #[test]
    fn beneficiary_form_refuses_lifecycle_fields() {
        let form = BeneficiaryForm {
            first_name: s("Aisha"),
            last_name: s("K"),
            status: s("APPROVED"),
            wheelchair_id: s("whc-00000000"),
            ..BeneficiaryForm::default()
        };
        let errors = form.validate_new(today()).unwrap_err();
        assert!(errors.has("status"));
        assert!(errors.has("wheelchair_id"));
    }

    #[test]
    fn beneficiary_name_length_capped() {
        let form = BeneficiaryForm {
            first_name: Some("x".repeat(51)),
            last_name: s("K"),
            ..BeneficiaryForm::default()
        };
        let errors = form.validate_new(today()).unwrap_err();
        assert_eq!(errors.fields()[0].rule, Rule::TooLong { max: MAX_NAME_LEN });
    }

    #[test]
    fn markup_only_required_text_is_missing() {
        let form = BeneficiaryForm {
            first_name: s("<>"),
            last_name: s("< >"),
            ..BeneficiaryForm::default()
        };
        let errors = form.validate_new(today()).unwrap_err();
        assert_eq!(errors.fields().len(), 2);
        assert!(errors.fields().iter().all(|e| e.rule == Rule::Required));

        let delivery = DeliveryForm {
            delivery_date: s("2024-03-01"),
            delivery_location: s("<<>>"),
            ceremony_date: None,
        };
        assert!(delivery.validate(today()).unwrap_err().has("delivery_location"));

        let follow_up = FollowUpForm {
            follow_up_date: s("2024-04-01"),
            follow_up_notes: s("><"),
            ..FollowUpForm::default()
        };
        assert!(follow_up.validate(today()).unwrap_err().has("follow_up_notes"));
    }

    #[test]
    fn delivery_requires_date_and_location() {
        let errors = DeliveryForm::default().validate(today()).unwrap_err();
        assert!(errors.has("delivery_date"));
        assert!(errors.has("delivery_location"));

        let form = DeliveryForm {
            delivery_date: s("2024-03-01"),
            delivery_location: s("Community Hall"),
            ceremony_date: s("2099-01-01"),
        };
        let errors = form.validate(today()).unwrap_err();
        assert_eq!(errors.fields().len(), 1);
        assert!(errors.has("ceremony_date"));
    }

    #[test]
    fn follow_up_rating_must_be_one_to_five() {
        let base = FollowUpForm {
            follow_up_date: s("2024-04-01"),
            follow_up_notes: s("Doing well"),
            ..FollowUpForm::default()
        };
        assert!(base.validate(today()).unwrap().satisfaction_rating.is_none());

        let six = FollowUpForm {
            satisfaction_rating: s("6"),
            ..base.clone()
        };
        assert!(six.validate(today()).unwrap_err().has("satisfaction_rating"));

        let five = FollowUpForm {
            satisfaction_rating: s("5"),
            ..base
        };
        assert_eq!(five.validate(today()).unwrap().satisfaction_rating, Some(5));
    }

    #[test]
    fn assign_requires_both_ids() {
        let errors = AssignForm {
            beneficiary_id: s("ben-00000001"),
            ..AssignForm::default()
        }
        .validate(today())
        .unwrap_err();
        assert!(errors.has("wheelchair_id"));
        assert!(!errors.has("beneficiary_id"));
    }
}
