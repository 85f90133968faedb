use super::Database;
use crate::error::{EntityKind, Error, Result};
use crate::model::{
    NewWheelchair, Wheelchair, WheelchairPatch, WheelchairState, WheelchairStats, WheelchairStatus,
};
use crate::page::{Page, PageRequest};
use crate::validate::schema::INITIAL_STATUS_CHOICES;
use crate::validate::{Rule, ValidationErrors};

/// Inventory operations, borrowed from a [`Database`].
#[derive(Debug)]
pub struct Wheelchairs<'a> {
    pub(super) db: &'a mut Database,
}

impl Wheelchairs<'_> {
    /// Register a wheelchair. It starts `AVAILABLE` unless another starting
    /// status is given.
    ///
    /// # Errors
    ///
    /// Returns a validation error for an `ASSIGNED` starting status, or a
    /// store error if the collection cannot be written.
    pub fn create(&mut self, input: NewWheelchair) -> Result<Wheelchair> {
        let state = match input.status.unwrap_or(WheelchairStatus::Available) {
            WheelchairStatus::Available => WheelchairState::Available,
            WheelchairStatus::Maintenance => WheelchairState::Maintenance,
            WheelchairStatus::Retired => WheelchairState::Retired,
            WheelchairStatus::Assigned => {
                let rule = Rule::InvalidChoice {
                    allowed: INITIAL_STATUS_CHOICES,
                };
                return Err(ValidationErrors::single("status", rule).into());
            }
        };

        let now = self.db.now();
        let today = self.db.today();
        let record = Wheelchair {
            id: self.db.next_wheelchair_id(),
            serial_number: input.serial_number,
            brand: input.brand,
            model: input.model,
            kind: input.kind,
            condition: input.condition,
            source: input.source,
            donor_name: input.donor_name,
            donor_contact: input.donor_contact,
            cost: input.cost,
            purchase_date: input.purchase_date,
            received_date: input.received_date.unwrap_or(today),
            notes: input.notes,
            state,
            created_at: now,
            updated_at: now,
        };

        let mut next = self.db.wheelchairs.clone();
        next.insert(record.clone());
        self.db.commit_wheelchairs(next)?;
        tracing::info!(id = %record.id, status = %record.status(), "wheelchair registered");
        Ok(record)
    }

    /// One page of wheelchairs in registration order, optionally filtered by
    /// status.
    #[must_use]
    pub fn list(&self, request: PageRequest, status: Option<WheelchairStatus>) -> Page<Wheelchair> {
        let rows: Vec<&Wheelchair> = self
            .db
            .wheelchairs
            .all()
            .iter()
            .filter(|whc| status.is_none_or(|s| whc.status() == s))
            .collect();
        Page::of(&rows, request)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no wheelchair has this id.
    pub fn get(&self, id: &str) -> Result<Wheelchair> {
        self.db
            .wheelchairs
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Wheelchair, id))
    }

    /// Merge descriptive fields into an existing wheelchair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or a store error.
    pub fn update(&mut self, id: &str, patch: WheelchairPatch) -> Result<Wheelchair> {
        let mut record = self.get(id)?;
        patch.apply(&mut record);
        record.updated_at = self.db.now();

        let mut next = self.db.wheelchairs.clone();
        next.replace(record.clone());
        self.db.commit_wheelchairs(next)?;
        tracing::debug!(id, "wheelchair updated");
        Ok(record)
    }

    /// Remove a wheelchair that is not assigned to anyone.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, [`Error::InUse`] while
    /// the wheelchair is assigned, or a store error.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let record = self.get(id)?;
        if let Some(holder) = record.assigned_to() {
            tracing::warn!(id, holder, "refusing to delete an assigned wheelchair");
            return Err(Error::InUse {
                kind: EntityKind::Wheelchair,
                id: id.to_string(),
                linked_id: holder.to_string(),
            });
        }

        let mut next = self.db.wheelchairs.clone();
        next.remove(id);
        self.db.commit_wheelchairs(next)?;
        tracing::info!(id, "wheelchair deleted");
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> WheelchairStats {
        WheelchairStats::tally(self.db.wheelchairs.all())
    }
}
