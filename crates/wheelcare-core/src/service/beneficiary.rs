use super::Database;
use crate::error::{EntityKind, Error, Result, Transition};
use crate::model::{
    Allocation, Assignment, Beneficiary, BeneficiaryPatch, BeneficiaryStats, BeneficiaryStatus,
    Delivery, FollowUp, NewBeneficiary, Stage, Wheelchair, WheelchairState,
};
use crate::page::{Page, PageRequest};
use crate::validate::AssignInput;

/// Registry and lifecycle operations, borrowed from a [`Database`].
#[derive(Debug)]
pub struct Beneficiaries<'a> {
    pub(super) db: &'a mut Database,
}

impl Beneficiaries<'_> {
    /// Register an applicant as `PENDING`.
    ///
    /// # Errors
    ///
    /// Returns a store error if the collection cannot be written.
    pub fn create(&mut self, input: NewBeneficiary) -> Result<Beneficiary> {
        let now = self.db.now();
        let today = self.db.today();
        let record = Beneficiary {
            id: self.db.next_beneficiary_id(),
            first_name: input.first_name,
            last_name: input.last_name,
            gender: input.gender,
            date_of_birth: input.date_of_birth,
            national_id: input.national_id,
            phone: input.phone,
            email: input.email,
            address: input.address,
            city: input.city,
            disability_type: input.disability_type,
            disability_description: input.disability_description,
            notes: input.notes,
            application_date: input.application_date.unwrap_or(today),
            is_active: input.is_active.unwrap_or(true),
            stage: Stage::Pending,
            created_at: now,
            updated_at: now,
        };

        let mut next = self.db.beneficiaries.clone();
        next.insert(record.clone());
        self.db.commit_beneficiaries(next)?;
        tracing::info!(id = %record.id, "beneficiary registered");
        Ok(record)
    }

    #[must_use]
    pub fn list(
        &self,
        request: PageRequest,
        status: Option<BeneficiaryStatus>,
    ) -> Page<Beneficiary> {
        let rows: Vec<&Beneficiary> = self
            .db
            .beneficiaries
            .all()
            .iter()
            .filter(|ben| status.is_none_or(|s| ben.status() == s))
            .collect();
        Page::of(&rows, request)
    }

    /// # Errors
    ///
    /// Returns [`Error::NotFound`] if no beneficiary has this id.
    pub fn get(&self, id: &str) -> Result<Beneficiary> {
        self.db
            .beneficiaries
            .get(id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Beneficiary, id))
    }

    /// Merge personal fields into an existing beneficiary.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, or a store error.
    pub fn update(&mut self, id: &str, patch: BeneficiaryPatch) -> Result<Beneficiary> {
        let mut record = self.get(id)?;
        patch.apply(&mut record);
        record.updated_at = self.db.now();
        self.save(record)
    }

    /// Remove a beneficiary that holds no wheelchair.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id, [`Error::InUse`] while a
    /// wheelchair is reserved for the beneficiary, or a store error.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let record = self.get(id)?;
        if let Some(whc_id) = record.wheelchair_id() {
            tracing::warn!(
                id,
                wheelchair = whc_id,
                "refusing to delete a beneficiary holding a wheelchair"
            );
            return Err(Error::InUse {
                kind: EntityKind::Beneficiary,
                id: id.to_string(),
                linked_id: whc_id.to_string(),
            });
        }

        let mut next = self.db.beneficiaries.clone();
        next.remove(id);
        self.db.commit_beneficiaries(next)?;
        tracing::info!(id, "beneficiary deleted");
        Ok(())
    }

    #[must_use]
    pub fn stats(&self) -> BeneficiaryStats {
        BeneficiaryStats::tally(self.db.beneficiaries.all())
    }

    /// Reserve an available wheelchair for a pending beneficiary.
    ///
    /// The beneficiary becomes `APPROVED` and the wheelchair `ASSIGNED` in
    /// one store write; on any failure neither record changes.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for either unknown id,
    /// [`Error::InvalidTransition`] unless the beneficiary is `PENDING`,
    /// [`Error::WheelchairUnavailable`] unless the wheelchair is `AVAILABLE`,
    /// or a store error.
    pub fn assign(&mut self, input: AssignInput) -> Result<(Beneficiary, Wheelchair)> {
        let mut ben = self.get(&input.beneficiary_id)?;
        let mut whc = self
            .db
            .wheelchairs
            .get(&input.wheelchair_id)
            .cloned()
            .ok_or_else(|| Error::not_found(EntityKind::Wheelchair, &input.wheelchair_id))?;

        if ben.stage != Stage::Pending {
            return Err(refuse(&ben, Transition::Assign));
        }
        let status = whc.status();
        if whc.state != WheelchairState::Available {
            tracing::warn!(
                wheelchair = %whc.id,
                %status,
                "assignment refused, wheelchair not available"
            );
            return Err(Error::WheelchairUnavailable { id: whc.id, status });
        }

        let now = self.db.now();
        ben.stage = Stage::Approved {
            assignment: Assignment {
                wheelchair_id: whc.id.clone(),
                approved_at: now,
                approved_by: input.assigned_by.clone(),
            },
        };
        ben.updated_at = now;
        whc.state = WheelchairState::Assigned {
            allocation: Allocation {
                assigned_to: ben.id.clone(),
                assigned_at: now,
                assigned_by: input.assigned_by,
            },
        };
        whc.updated_at = now;

        let mut beneficiaries = self.db.beneficiaries.clone();
        beneficiaries.replace(ben.clone());
        let mut wheelchairs = self.db.wheelchairs.clone();
        wheelchairs.replace(whc.clone());
        self.db.commit_both(wheelchairs, beneficiaries)?;
        tracing::info!(beneficiary = %ben.id, wheelchair = %whc.id, "wheelchair assigned");
        Ok((ben, whc))
    }

    /// Record the hand-over of the assigned wheelchair.
    ///
    /// Allowed from `APPROVED`, and from `DELIVERED` to correct an earlier
    /// delivery record. The wheelchair stays `ASSIGNED`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id,
    /// [`Error::InvalidTransition`] from any other status, or a store error.
    pub fn deliver(&mut self, id: &str, delivery: Delivery) -> Result<Beneficiary> {
        let mut record = self.get(id)?;
        let assignment = match &record.stage {
            Stage::Approved { assignment } | Stage::Delivered { assignment, .. } => {
                assignment.clone()
            }
            _ => return Err(refuse(&record, Transition::Deliver)),
        };
        record.stage = Stage::Delivered {
            assignment,
            delivery,
        };
        record.updated_at = self.db.now();
        let record = self.save(record)?;
        tracing::info!(id, "wheelchair delivered");
        Ok(record)
    }

    /// Record a post-delivery check-in, replacing any previous one.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotFound`] for an unknown id,
    /// [`Error::InvalidTransition`] unless the beneficiary is `DELIVERED` or
    /// `FOLLOW_UP`, or a store error.
    pub fn follow_up(&mut self, id: &str, follow_up: FollowUp) -> Result<Beneficiary> {
        let mut record = self.get(id)?;
        let (assignment, delivery) = match &record.stage {
            Stage::Delivered {
                assignment,
                delivery,
            }
            | Stage::FollowUp {
                assignment,
                delivery,
                ..
            } => (assignment.clone(), delivery.clone()),
            _ => return Err(refuse(&record, Transition::FollowUp)),
        };
        record.stage = Stage::FollowUp {
            assignment,
            delivery,
            follow_up,
        };
        record.updated_at = self.db.now();
        let record = self.save(record)?;
        tracing::info!(id, "follow-up recorded");
        Ok(record)
    }

    fn save(&mut self, record: Beneficiary) -> Result<Beneficiary> {
        let mut next = self.db.beneficiaries.clone();
        next.replace(record.clone());
        self.db.commit_beneficiaries(next)?;
        Ok(record)
    }
}

fn refuse(record: &Beneficiary, transition: Transition) -> Error {
    tracing::warn!(id = %record.id, %transition, status = %record.status(), "transition refused");
    Error::InvalidTransition {
        id: record.id.clone(),
        transition,
        status: record.status(),
    }
}
