//! Roster reconciliation planner.
//!
//! Computes the changes needed to turn the stored guest list of one
//! invitation into a resubmitted RSVP form:
//! 1. Stored guests missing from the submission are deleted
//! 2. Submitted guests with a positive id are updated
//! 3. Submitted guests with an id of zero or below are created
//!
//! The planner is pure. Applying the plan (inside one transaction) is the
//! caller's job.

use std::collections::HashSet;

use thiserror::Error;

use crate::models::guest::{Attendance, Guest, GuestRsvp, MealOptions, UnknownMealOption};
use crate::models::roster::RosterSubmission;

/// Reasons a submission cannot be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A positive id that is not one of this invitation's guests.
    #[error("guest {0} does not belong to this invitation")]
    ForeignGuest(i64),

    #[error("guest id {0} appears more than once")]
    DuplicateGuest(i64),

    #[error(transparent)]
    InvalidMeal(#[from] UnknownMealOption),

    #[error("submission has {requested} guests but the invitation allows {max_guests}")]
    CapacityExceeded { max_guests: i64, requested: i64 },
}

/// Update of an existing guest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestUpdate {
    pub id: i64,
    /// `None` keeps the stored name.
    pub name: Option<String>,
    pub rsvp: GuestRsvp,
}

/// Guest to create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewGuest {
    pub name: String,
    pub rsvp: GuestRsvp,
}

/// Changes to apply, in order: delete, update, create.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RosterPlan {
    pub delete: Vec<i64>,
    pub update: Vec<GuestUpdate>,
    pub create: Vec<NewGuest>,
    pub party_attending: bool,
}

impl RosterPlan {
    /// Number of guests left once the plan is applied.
    pub fn resulting_count(&self, stored: usize) -> i64 {
        (stored - self.delete.len() + self.create.len()) as i64
    }
}

/// Diffs a submission against the stored guests of one invitation.
///
/// A submission that only removes or edits guests is accepted even if the
/// stored roster is already above `max_guests`; adding guests never is.
pub fn plan_reconciliation(
    stored: &[Guest],
    submission: &RosterSubmission,
    max_guests: i64,
    meals: &MealOptions,
) -> Result<RosterPlan, PlanError> {
    let stored_ids: HashSet<i64> = stored.iter().map(|g| g.id).collect();
    let mut seen = HashSet::new();
    let mut plan = RosterPlan {
        party_attending: submission.party_attending,
        ..Default::default()
    };

    for submitted in &submission.guests {
        if !seen.insert(submitted.id) {
            return Err(PlanError::DuplicateGuest(submitted.id));
        }

        let attending = Attendance::from(submitted.attending.unwrap_or(submission.party_attending));
        let rsvp = GuestRsvp::new(
            attending,
            submitted.meal_preference.as_deref(),
            submitted.dietary_restrictions.as_deref(),
            meals,
        )?;
        let name = submitted.name.trim();

        if submitted.is_new() {
            plan.create.push(NewGuest {
                name: name.to_string(),
                rsvp,
            });
        } else if stored_ids.contains(&submitted.id) {
            plan.update.push(GuestUpdate {
                id: submitted.id,
                name: (!name.is_empty()).then(|| name.to_string()),
                rsvp,
            });
        } else {
            return Err(PlanError::ForeignGuest(submitted.id));
        }
    }

    plan.delete = stored
        .iter()
        .map(|g| g.id)
        .filter(|id| !seen.contains(id))
        .collect();
    plan.delete.sort_unstable();

    let requested = plan.resulting_count(stored.len());
    if !plan.create.is_empty() && requested > max_guests {
        return Err(PlanError::CapacityExceeded {
            max_guests,
            requested,
        });
    }

    Ok(plan)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::invitation::InvitationKey;
    use crate::models::roster::SubmittedGuest;
    use chrono::Utc;

    fn stored(id: i64, name: &str) -> Guest {
        Guest {
            id,
            invitation_key: InvitationKey::from_stored("abcd1234"),
            name: name.to_string(),
            attending: Attendance::Unknown,
            meal_preference: None,
            dietary_restrictions: None,
            last_updated: Utc::now(),
        }
    }

    fn submitted(id: i64, name: &str) -> SubmittedGuest {
        SubmittedGuest {
            id,
            name: name.to_string(),
            attending: None,
            meal_preference: None,
            dietary_restrictions: None,
        }
    }

    fn submission(party_attending: bool, guests: Vec<SubmittedGuest>) -> RosterSubmission {
        RosterSubmission {
            party_attending,
            guests,
        }
    }

    #[test]
    fn test_delete_update_create() {
        let stored = vec![stored(5, "Alice"), stored(7, "Bob")];
        let sub = submission(true, vec![submitted(-1, "Carol"), submitted(5, "Alicia")]);

        let plan = plan_reconciliation(&stored, &sub, 4, &MealOptions::default()).unwrap();

        assert_eq!(plan.delete, vec![7]);
        assert_eq!(plan.update.len(), 1);
        assert_eq!(plan.update[0].id, 5);
        assert_eq!(plan.update[0].name.as_deref(), Some("Alicia"));
        assert_eq!(plan.create.len(), 1);
        assert_eq!(plan.create[0].name, "Carol");
        assert_eq!(plan.resulting_count(stored.len()), 2);
        assert!(plan.party_attending);
    }

    #[test]
    fn test_empty_submission_deletes_everything() {
        let stored = vec![stored(3, "A"), stored(1, "B")];
        let plan =
            plan_reconciliation(&stored, &submission(false, vec![]), 2, &MealOptions::default())
                .unwrap();
        assert_eq!(plan.delete, vec![1, 3]);
        assert!(plan.update.is_empty());
        assert!(plan.create.is_empty());
        assert!(!plan.party_attending);
    }

    #[test]
    fn test_attending_falls_back_to_party_decision() {
        let stored = vec![stored(1, "A"), stored(2, "B")];
        let mut explicit = submitted(2, "B");
        explicit.attending = Some(true);
        let sub = submission(false, vec![submitted(1, "A"), explicit]);

        let plan = plan_reconciliation(&stored, &sub, 2, &MealOptions::default()).unwrap();
        assert_eq!(plan.update[0].rsvp.attending, Attendance::No);
        assert_eq!(plan.update[1].rsvp.attending, Attendance::Yes);
    }

    #[test]
    fn test_blank_name_keeps_stored_name() {
        let stored = vec![stored(1, "Alice")];
        let sub = submission(true, vec![submitted(1, "   ")]);
        let plan = plan_reconciliation(&stored, &sub, 2, &MealOptions::default()).unwrap();
        assert_eq!(plan.update[0].name, None);
    }

    #[test]
    fn test_foreign_guest_rejected() {
        let stored = vec![stored(1, "Alice")];
        let sub = submission(true, vec![submitted(1, "Alice"), submitted(42, "Mallory")]);
        assert_eq!(
            plan_reconciliation(&stored, &sub, 5, &MealOptions::default()),
            Err(PlanError::ForeignGuest(42))
        );
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let stored = vec![stored(1, "Alice")];
        let sub = submission(true, vec![submitted(1, "Alice"), submitted(1, "Again")]);
        assert_eq!(
            plan_reconciliation(&stored, &sub, 5, &MealOptions::default()),
            Err(PlanError::DuplicateGuest(1))
        );

        let sub = submission(true, vec![submitted(-1, "A"), submitted(-1, "B")]);
        assert_eq!(
            plan_reconciliation(&[], &sub, 5, &MealOptions::default()),
            Err(PlanError::DuplicateGuest(-1))
        );
    }

    #[test]
    fn test_capacity_exceeded() {
        let stored = vec![stored(1, "Alice"), stored(2, "Bob")];
        let sub = submission(
            true,
            vec![submitted(1, "Alice"), submitted(2, "Bob"), submitted(-1, "Carol")],
        );
        assert_eq!(
            plan_reconciliation(&stored, &sub, 2, &MealOptions::default()),
            Err(PlanError::CapacityExceeded {
                max_guests: 2,
                requested: 3
            })
        );
    }

    #[test]
    fn test_replacing_guest_at_capacity_is_allowed() {
        let stored = vec![stored(1, "Alice"), stored(2, "Bob")];
        let sub = submission(true, vec![submitted(1, "Alice"), submitted(-1, "Carol")]);
        let plan = plan_reconciliation(&stored, &sub, 2, &MealOptions::default()).unwrap();
        assert_eq!(plan.delete, vec![2]);
        assert_eq!(plan.resulting_count(stored.len()), 2);
    }

    #[test]
    fn test_over_capacity_roster_can_still_shrink() {
        let stored = vec![stored(1, "A"), stored(2, "B"), stored(3, "C")];
        let sub = submission(true, vec![submitted(1, "A"), submitted(2, "B")]);
        let plan = plan_reconciliation(&stored, &sub, 1, &MealOptions::default()).unwrap();
        assert_eq!(plan.delete, vec![3]);
    }

    #[test]
    fn test_invalid_meal_rejected() {
        let mut guest = submitted(-1, "Carol");
        guest.meal_preference = Some("Lobster".to_string());
        let err = plan_reconciliation(&[], &submission(true, vec![guest]), 2, &MealOptions::default())
            .unwrap_err();
        assert_eq!(err, PlanError::InvalidMeal(UnknownMealOption("Lobster".to_string())));
    }

    #[test]
    fn test_zero_id_is_temporary() {
        let plan = plan_reconciliation(
            &[],
            &submission(true, vec![submitted(0, "New")]),
            1,
            &MealOptions::default(),
        )
        .unwrap();
        assert_eq!(plan.create.len(), 1);
    }
}
