use anyhow::Result;
use clap::{Args, Subcommand};
use std::io::{self, Write};
use wheelcare_core::model::{Wheelchair, WheelchairStats};
use wheelcare_core::page::Page;
use wheelcare_core::validate::WheelchairForm;

use super::{ListArgs, Session};
use crate::output::{pretty_kv, record_fields, render_envelope};

#[derive(Subcommand, Debug)]
pub enum WheelchairCommand {
    /// Register a wheelchair (status defaults to AVAILABLE).
    Create(WheelchairFields),
    /// List wheelchairs in insertion order.
    List(ListArgs),
    /// Show one wheelchair.
    Show { id: String },
    /// Change descriptive fields; status is managed by assignment.
    Update {
        id: String,
        #[command(flatten)]
        fields: WheelchairFields,
    },
    /// Delete a wheelchair that is not assigned.
    Delete { id: String },
    /// Count wheelchairs by status.
    Stats,
}

/// Flags mirroring the wheelchair form; omitted flags stay unset.
#[derive(Args, Debug, Clone, Default)]
pub struct WheelchairFields {
    /// MANUAL, ELECTRIC, SPORTS or STANDARD.
    #[arg(long = "type", value_name = "TYPE")]
    pub kind: Option<String>,
    /// EXCELLENT, GOOD, FAIR or NEEDS_REPAIR.
    #[arg(long)]
    pub condition: Option<String>,
    /// DONATION, PURCHASE, PARTNER or GOVERNMENT.
    #[arg(long)]
    pub source: Option<String>,
    #[arg(long)]
    pub serial_number: Option<String>,
    #[arg(long)]
    pub brand: Option<String>,
    #[arg(long)]
    pub model: Option<String>,
    #[arg(long)]
    pub donor_name: Option<String>,
    #[arg(long)]
    pub donor_contact: Option<String>,
    #[arg(long, allow_negative_numbers = true)]
    pub cost: Option<String>,
    /// YYYY-MM-DD.
    #[arg(long)]
    pub purchase_date: Option<String>,
    /// YYYY-MM-DD; defaults to today on create.
    #[arg(long)]
    pub received_date: Option<String>,
    #[arg(long)]
    pub notes: Option<String>,
    /// Initial status on create: AVAILABLE, MAINTENANCE or RETIRED.
    #[arg(long)]
    pub status: Option<String>,
}

impl WheelchairFields {
    pub fn form(&self) -> WheelchairForm {
        WheelchairForm {
            serial_number: self.serial_number.clone(),
            brand: self.brand.clone(),
            model: self.model.clone(),
            kind: self.kind.clone(),
            condition: self.condition.clone(),
            source: self.source.clone(),
            donor_name: self.donor_name.clone(),
            donor_contact: self.donor_contact.clone(),
            cost: self.cost.clone(),
            purchase_date: self.purchase_date.clone(),
            received_date: self.received_date.clone(),
            notes: self.notes.clone(),
            status: self.status.clone(),
        }
    }
}

/// Dispatch a `wheelcare wheelchair` subcommand; returns `false` on a failure envelope.
///
/// # Errors
///
/// Returns an error if output cannot be written.
pub fn run(command: &WheelchairCommand, session: &mut Session) -> Result<bool> {
    let mode = session.mode;
    let api = &mut session.api;
    match command {
        WheelchairCommand::Create(fields) => {
            let envelope = api.create_wheelchair(&fields.form());
            render_envelope(mode, "Wheelchair created", &envelope, |w, out| record_fields(out, w))
        }
        WheelchairCommand::List(args) => {
            let envelope = api.list_wheelchairs(&args.query());
            render_envelope(mode, "Wheelchairs", &envelope, write_list)
        }
        WheelchairCommand::Show { id } => {
            let envelope = api.get_wheelchair(id);
            render_envelope(mode, "Wheelchair", &envelope, |w, out| record_fields(out, w))
        }
        WheelchairCommand::Update { id, fields } => {
            let envelope = api.update_wheelchair(id, &fields.form());
            render_envelope(mode, "Wheelchair updated", &envelope, |w, out| record_fields(out, w))
        }
        WheelchairCommand::Delete { id } => {
            let envelope = api.delete_wheelchair(id);
            render_envelope(mode, "Wheelchair deleted", &envelope, |d, out| {
                pretty_kv(out, "deleted", &d.id)
            })
        }
        WheelchairCommand::Stats => {
            let envelope = api.wheelchair_stats();
            render_envelope(mode, "Wheelchair stats", &envelope, write_stats)
        }
    }
}

fn write_row(out: &mut dyn Write, w: &Wheelchair) -> io::Result<()> {
    writeln!(
        out,
        "{}  {:<11} {:<8} {:<12} {}",
        w.id,
        w.status().as_str(),
        w.kind.as_str(),
        w.condition.as_str(),
        w.assigned_to().unwrap_or("-")
    )
}

fn write_list(page: &Page<Wheelchair>, out: &mut dyn Write) -> io::Result<()> {
    for w in &page.items {
        write_row(out, w)?;
    }
    let p = &page.pagination;
    writeln!(out, "page {}/{} ({} total)", p.page, p.pages.max(1), p.total)
}

fn write_stats(stats: &WheelchairStats, out: &mut dyn Write) -> io::Result<()> {
    pretty_kv(out, "total", stats.total.to_string())?;
    pretty_kv(out, "available", stats.available.to_string())?;
    pretty_kv(out, "assigned", stats.assigned.to_string())?;
    pretty_kv(out, "maintenance", stats.maintenance.to_string())?;
    pretty_kv(out, "retired", stats.retired.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fields_map_onto_the_form() {
        let fields = WheelchairFields {
            kind: Some("manual".into()),
            cost: Some("120.5".into()),
            status: Some("maintenance".into()),
            ..WheelchairFields::default()
        };
        let form = fields.form();
        assert_eq!(form.kind.as_deref(), Some("manual"));
        assert_eq!(form.cost.as_deref(), Some("120.5"));
        assert_eq!(form.status.as_deref(), Some("maintenance"));
        assert!(form.brand.is_none());
    }

    #[test]
    fn list_footer_counts_pages() {
        let mut api = wheelcare_core::Api::new(
            wheelcare_core::Database::in_memory(),
            wheelcare_core::Locale::En,
        );
        let page = api
            .list_wheelchairs(&wheelcare_core::api::ListQuery::default())
            .into_result()
            .unwrap();
        let mut buf = Vec::new();
        write_list(&page, &mut buf).unwrap();
        assert_eq!(String::from_utf8(buf).unwrap(), "page 1/1 (0 total)\n");
    }
}
