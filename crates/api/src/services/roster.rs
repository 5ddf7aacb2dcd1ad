//! Guest roster management.
//!
//! Every mutation is scoped to the caller's invitation. Capacity is enforced
//! by the conditional insert in the guest repository and full-form
//! resubmissions are applied in a single transaction.

use chrono::{DateTime, Utc};
use domain::models::guest::{normalize_dietary, Guest, GuestRsvp, MealOptions, UpdateGuestRequest};
use domain::models::invitation::{Invitation, InvitationKey};
use domain::models::roster::{RosterSubmission, RosterView};
use domain::services::roster::plan_reconciliation;
use persistence::repositories::{GuestRepository, InvitationRepository};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::services::ServiceError;

/// Service for reading and changing an invitation's guests.
#[derive(Clone)]
pub struct RosterService {
    invitations: InvitationRepository,
    guests: GuestRepository,
    meals: MealOptions,
}

impl RosterService {
    pub fn new(pool: SqlitePool, meals: MealOptions) -> Self {
        Self {
            invitations: InvitationRepository::new(pool.clone()),
            guests: GuestRepository::new(pool),
            meals,
        }
    }

    /// The invitation behind a live session. A missing row means the
    /// session no longer points anywhere, so the caller must sign in again.
    async fn invitation(&self, key: &InvitationKey) -> Result<Invitation, ServiceError> {
        self.invitations
            .find_by_key(key.as_str())
            .await?
            .map(Invitation::from)
            .ok_or(ServiceError::SessionExpired)
    }

    async fn guests(&self, key: &InvitationKey) -> Result<Vec<Guest>, ServiceError> {
        Ok(self
            .guests
            .list_by_invitation(key.as_str())
            .await?
            .into_iter()
            .map(Guest::from)
            .collect())
    }

    /// Everything the RSVP page shows for one invitation.
    pub async fn view(&self, key: &InvitationKey) -> Result<RosterView, ServiceError> {
        let invitation = self.invitation(key).await?;
        let guests = self.guests(key).await?;
        Ok(RosterView::new(&invitation, guests, self.meals.clone()))
    }

    /// `max_guests` minus the current guest count (never negative).
    pub async fn capacity_remaining(&self, key: &InvitationKey) -> Result<i64, ServiceError> {
        let invitation = self.invitation(key).await?;
        let count = self.guests.count_by_invitation(key.as_str()).await?;
        Ok((invitation.max_guests - count).max(0))
    }

    pub async fn check_can_add_guest(&self, key: &InvitationKey) -> Result<bool, ServiceError> {
        Ok(self.capacity_remaining(key).await? > 0)
    }

    /// Add a guest with an unknown RSVP. Fails with `CapacityExceeded` when
    /// the invitation is full, checked atomically with the insert.
    pub async fn create_guest(
        &self,
        key: &InvitationKey,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<Guest, ServiceError> {
        let name = name.trim();
        match self
            .guests
            .insert_within_capacity(key.as_str(), name, None, now)
            .await?
        {
            Some(entity) => {
                info!(invitation_key = %key, guest_id = entity.id, "Guest added");
                Ok(entity.into())
            }
            None => {
                let invitation = self.invitation(key).await?;
                info!(
                    invitation_key = %key,
                    max_guests = invitation.max_guests,
                    "Guest rejected, invitation full"
                );
                Err(ServiceError::CapacityExceeded {
                    max_guests: invitation.max_guests,
                })
            }
        }
    }

    /// Rename a guest owned by `key`.
    pub async fn update_guest_name(
        &self,
        key: &InvitationKey,
        guest_id: i64,
        name: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let affected = self
            .guests
            .update_name(guest_id, key.as_str(), name.trim(), now)
            .await?;
        ensure_owned(affected, key, guest_id)
    }

    /// Overwrite the RSVP fields of a guest owned by `key`.
    pub async fn update_guest_rsvp(
        &self,
        key: &InvitationKey,
        guest_id: i64,
        rsvp: &GuestRsvp,
        now: DateTime<Utc>,
    ) -> Result<(), ServiceError> {
        let affected = self
            .guests
            .update_rsvp(guest_id, key.as_str(), rsvp, now)
            .await?;
        ensure_owned(affected, key, guest_id)
    }

    /// Apply a partial update. Absent fields keep their stored values.
    pub async fn update_guest(
        &self,
        key: &InvitationKey,
        guest_id: i64,
        request: &UpdateGuestRequest,
        now: DateTime<Utc>,
    ) -> Result<Guest, ServiceError> {
        let existing: Guest = self
            .guests
            .find_owned(guest_id, key.as_str())
            .await?
            .map(Guest::from)
            .ok_or_else(|| {
                info!(invitation_key = %key, guest_id, "Update of guest not owned by invitation");
                ServiceError::Unauthorized
            })?;

        let name = request
            .name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty());

        let rsvp = if request.touches_rsvp() {
            let meal_preference = match request.meal_preference.as_deref() {
                Some(meal) => self
                    .meals
                    .resolve(Some(meal))
                    .map_err(|e| ServiceError::Validation(e.to_string()))?,
                None => existing.meal_preference.clone(),
            };
            let dietary_restrictions = match request.dietary_restrictions.as_deref() {
                Some(dietary) => normalize_dietary(Some(dietary)),
                None => existing.dietary_restrictions.clone(),
            };
            Some(GuestRsvp {
                attending: request.attending.unwrap_or(existing.attending),
                meal_preference,
                dietary_restrictions,
            })
        } else {
            None
        };

        // Nothing is written until every field has been accepted.
        let mut tx = self.guests.begin_roster(key.as_str()).await?;
        if let Some(name) = name {
            ensure_owned(tx.update_name(guest_id, name, now).await?, key, guest_id)?;
        }
        if let Some(rsvp) = &rsvp {
            ensure_owned(tx.update_rsvp(guest_id, rsvp, now).await?, key, guest_id)?;
        }
        tx.commit().await?;

        self.guests
            .find_owned(guest_id, key.as_str())
            .await?
            .map(Guest::from)
            .ok_or(ServiceError::Unauthorized)
    }

    /// Delete a guest owned by `key`. Zero rows affected is `Unauthorized`.
    pub async fn delete_guest(&self, key: &InvitationKey, guest_id: i64) -> Result<(), ServiceError> {
        let affected = self.guests.delete(guest_id, key.as_str()).await?;
        ensure_owned(affected, key, guest_id)?;
        info!(invitation_key = %key, guest_id, "Guest deleted");
        Ok(())
    }

    /// Make the stored roster match a resubmitted form.
    ///
    /// Deletes stored guests absent from the submission, updates the ones
    /// present and creates guests for temporary ids, then stores the party
    /// decision. All of it commits together or not at all.
    pub async fn reconcile(
        &self,
        key: &InvitationKey,
        submission: &RosterSubmission,
        now: DateTime<Utc>,
    ) -> Result<RosterView, ServiceError> {
        let mut tx = self.guests.begin_roster(key.as_str()).await?;

        let max_guests = tx.max_guests().await?.ok_or(ServiceError::SessionExpired)?;
        let stored: Vec<Guest> = tx.list_guests().await?.into_iter().map(Guest::from).collect();
        let plan = plan_reconciliation(&stored, submission, max_guests, &self.meals)?;

        for guest_id in &plan.delete {
            tx.delete_guest(*guest_id).await?;
        }

        for update in &plan.update {
            if let Some(name) = &update.name {
                ensure_owned(tx.update_name(update.id, name, now).await?, key, update.id)?;
            }
            ensure_owned(
                tx.update_rsvp(update.id, &update.rsvp, now).await?,
                key,
                update.id,
            )?;
        }

        for guest in &plan.create {
            if tx
                .insert_within_capacity(&guest.name, &guest.rsvp, now)
                .await?
                .is_none()
            {
                return Err(ServiceError::CapacityExceeded { max_guests });
            }
        }

        tx.set_attendance_decision(plan.party_attending).await?;
        tx.commit().await?;

        info!(
            invitation_key = %key,
            deleted = plan.delete.len(),
            updated = plan.update.len(),
            created = plan.create.len(),
            party_attending = plan.party_attending,
            "Roster reconciled"
        );

        self.view(key).await
    }

    /// Record the party decision without touching guest rows.
    pub async fn record_attendance(
        &self,
        key: &InvitationKey,
        attending: bool,
    ) -> Result<(), ServiceError> {
        let affected = self
            .invitations
            .set_attendance_decision(key.as_str(), Some(attending))
            .await?;
        if affected == 0 {
            return Err(ServiceError::SessionExpired);
        }
        info!(invitation_key = %key, attending, "Attendance decision recorded");
        Ok(())
    }
}

fn ensure_owned(affected: u64, key: &InvitationKey, guest_id: i64) -> Result<(), ServiceError> {
    if affected == 0 {
        debug!(invitation_key = %key, guest_id, "Guest not owned by invitation");
        return Err(ServiceError::Unauthorized);
    }
    Ok(())
}
