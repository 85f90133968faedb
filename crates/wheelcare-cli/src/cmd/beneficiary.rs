use anyhow::Result;
use clap::{Args, Subcommand};
use std::io::{self, Write};
use wheelcare_core::api::Assigned;
use wheelcare_core::model::{Beneficiary, BeneficiaryStats};
use wheelcare_core::page::Page;
use wheelcare_core::validate::{AssignForm, BeneficiaryForm, DeliveryForm, FollowUpForm};

use super::{ListArgs, Session};
use crate::output::{pretty_kv, record_fields, render_envelope};

#[derive(Subcommand, Debug)]
pub enum BeneficiaryCommand {
    /// Register an applicant (status PENDING).
    Create(BeneficiaryFields),
    /// List beneficiaries in insertion order.
    List(ListArgs),
    /// Show one beneficiary.
    Show { id: String },
    /// Change personal fields; lifecycle fields are managed by transitions.
    Update {
        id: String,
        #[command(flatten)]
        fields: BeneficiaryFields,
    },
    /// Delete a beneficiary that holds no wheelchair.
    Delete { id: String },
    /// Count beneficiaries by status.
    Stats,
    /// Reserve an AVAILABLE wheelchair for a PENDING beneficiary.
    Assign {
        beneficiary_id: String,
        wheelchair_id: String,
        /// Who made the assignment.
        #[arg(long = "by", value_name = "NAME")]
        assigned_by: Option<String>,
    },
    /// Record the hand-over of the assigned wheelchair.
    Deliver {
        id: String,
        #[command(flatten)]
        delivery: DeliveryFields,
    },
    /// Record a post-delivery check-in.
    FollowUp {
        id: String,
        #[command(flatten)]
        follow_up: FollowUpFields,
    },
}

/// Flags mirroring the beneficiary form; omitted flags stay unset.
#[derive(Args, Debug, Clone, Default)]
pub struct BeneficiaryFields {
    #[arg(long)]
    pub first_name: Option<String>,
    #[arg(long)]
    pub last_name: Option<String>,
    /// MALE or FEMALE.
    #[arg(long)]
    pub gender: Option<String>,
    /// YYYY-MM-DD.
    #[arg(long)]
    pub date_of_birth: Option<String>,
    #[arg(long)]
    pub national_id: Option<String>,
    #[arg(long)]
    pub phone: Option<String>,
    #[arg(long)]
    pub email: Option<String>,
    #[arg(long)]
    pub address: Option<String>,
    #[arg(long)]
    pub city: Option<String>,
    #[arg(long)]
    pub disability_type: Option<String>,
    #[arg(long)]
    pub disability_description: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// YYYY-MM-DD; defaults to today on create.
    #[arg(long)]
    pub application_date: Option<String>,
    /// true or false.
    #[arg(long, value_name = "BOOL")]
    pub active: Option<String>,
}

impl BeneficiaryFields {
    pub fn form(&self) -> BeneficiaryForm {
        BeneficiaryForm {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            date_of_birth: self.date_of_birth.clone(),
            national_id: self.national_id.clone(),
            phone: self.phone.clone(),
            email: self.email.clone(),
            address: self.address.clone(),
            city: self.city.clone(),
            disability_type: self.disability_type.clone(),
            disability_description: self.disability_description.clone(),
            notes: self.notes.clone(),
            application_date: self.application_date.clone(),
            is_active: self.active.clone(),
            status: None,
            wheelchair_id: None,
        }
    }
}

#[derive(Args, Debug, Clone, Default)]
pub struct DeliveryFields {
    /// YYYY-MM-DD, not in the future.
    #[arg(long = "date")]
    pub delivery_date: Option<String>,
    #[arg(long = "location")]
    pub delivery_location: Option<String>,
    /// YYYY-MM-DD.
    #[arg(long)]
    pub ceremony_date: Option<String>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct FollowUpFields {
    /// YYYY-MM-DD, not in the future.
    #[arg(long = "date")]
    pub follow_up_date: Option<String>,
    #[arg(long = "notes")]
    pub follow_up_notes: Option<String>,
    /// Whole number from 1 to 5.
    #[arg(long = "rating", allow_negative_numbers = true)]
    pub satisfaction_rating: Option<String>,
    #[arg(long)]
    pub feedback: Option<String>,
}

/// Dispatch a `wheelcare beneficiary` subcommand; returns `false` on a failure envelope.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run(command: &BeneficiaryCommand, session: &mut Session) -> Result<bool> {
    let mode = session.mode;
    let api = &mut session.api;
    match command {
        BeneficiaryCommand::Create(fields) => {
            let envelope = api.create_beneficiary(&fields.form());
            render_envelope(mode, "Beneficiary created", &envelope, |b, out| record_fields(out, b))
        }
        BeneficiaryCommand::List(args) => {
            let envelope = api.list_beneficiaries(&args.query());
            render_envelope(mode, "Beneficiaries", &envelope, write_list)
        }
        BeneficiaryCommand::Show { id } => {
            let envelope = api.get_beneficiary(id);
            render_envelope(mode, "Beneficiary", &envelope, |b, out| record_fields(out, b))
        }
        BeneficiaryCommand::Update { id, fields } => {
            let envelope = api.update_beneficiary(id, &fields.form());
            render_envelope(mode, "Beneficiary updated", &envelope, |b, out| record_fields(out, b))
        }
        BeneficiaryCommand::Delete { id } => {
            let envelope = api.delete_beneficiary(id);
            render_envelope(mode, "Beneficiary deleted", &envelope, |d, out| {
                pretty_kv(out, "deleted", &d.id)
            })
        }
        BeneficiaryCommand::Stats => {
            let envelope = api.beneficiary_stats();
            render_envelope(mode, "Beneficiary stats", &envelope, write_stats)
        }
        BeneficiaryCommand::Assign {
            beneficiary_id,
            wheelchair_id,
            assigned_by,
        } => {
            let envelope = api.assign_wheelchair(&AssignForm {
                beneficiary_id: Some(beneficiary_id.clone()),
                wheelchair_id: Some(wheelchair_id.clone()),
                assigned_by: assigned_by.clone(),
            });
            render_envelope(mode, "Wheelchair assigned", &envelope, write_assigned)
        }
        BeneficiaryCommand::Deliver { id, delivery } => {
            let form = DeliveryForm {
                delivery_date: delivery.delivery_date.clone(),
                delivery_location: delivery.delivery_location.clone(),
                ceremony_date: delivery.ceremony_date.clone(),
            };
            let envelope = api.record_delivery(id, &form);
            render_envelope(mode, "Delivery recorded", &envelope, |b, out| record_fields(out, b))
        }
        BeneficiaryCommand::FollowUp { id, follow_up } => {
            let form = FollowUpForm {
                follow_up_date: follow_up.follow_up_date.clone(),
                follow_up_notes: follow_up.follow_up_notes.clone(),
                satisfaction_rating: follow_up.satisfaction_rating.clone(),
                feedback: follow_up.feedback.clone(),
            };
            let envelope = api.record_follow_up(id, &form);
            render_envelope(mode, "Follow-up recorded", &envelope, |b, out| record_fields(out, b))
        }
    }
}

fn write_list(page: &Page<Beneficiary>, out: &mut dyn Write) -> io::Result<()> {
    for b in &page.items {
        writeln!(
            out,
            "{}  {:<9} {:<24} {}",
            b.id,
            b.status().as_str(),
            b.full_name(),
            b.wheelchair_id().unwrap_or("-")
        )?;
    }
    let p = &page.pagination;
    writeln!(out, "page {}/{} ({} total)", p.page, p.pages.max(1), p.total)
}

fn write_assigned(assigned: &Assigned, out: &mut dyn Write) -> io::Result<()> {
    pretty_kv(out, "beneficiary", &assigned.beneficiary.id)?;
    pretty_kv(out, "status", assigned.beneficiary.status().as_str())?;
    pretty_kv(out, "wheelchair", &assigned.wheelchair.id)?;
    pretty_kv(out, "status", assigned.wheelchair.status().as_str())
}

fn write_stats(stats: &BeneficiaryStats, out: &mut dyn Write) -> io::Result<()> {
    pretty_kv(out, "total", stats.total.to_string())?;
    pretty_kv(out, "pending", stats.pending.to_string())?;
    pretty_kv(out, "approved", stats.approved.to_string())?;
    pretty_kv(out, "rejected", stats.rejected.to_string())?;
    pretty_kv(out, "delivered", stats.delivered.to_string())?;
    pretty_kv(out, "follow_up", stats.follow_up.to_string())
}
