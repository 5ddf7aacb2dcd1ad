//! Roster read model and full-form submission DTOs.

use serde::{Deserialize, Serialize};
use shared::validation::validate_guest_name;
use validator::Validate;

use super::guest::{Guest, MealOptions};
use super::invitation::{Invitation, InvitationSummary};

/// Everything the RSVP page needs about the caller's party.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct RosterView {
    pub invitation: InvitationSummary,
    pub guests: Vec<Guest>,
    pub max_guests: i64,
    pub remaining: i64,
    pub can_add_more: bool,
    pub meal_options: MealOptions,
    pub attendance_decision: Option<bool>,
}

impl RosterView {
    /// Builds the view; guests are ordered by id.
    pub fn new(invitation: &Invitation, mut guests: Vec<Guest>, meal_options: MealOptions) -> Self {
        guests.sort_by_key(|g| g.id);
        let remaining = (invitation.max_guests - guests.len() as i64).max(0);
        Self {
            invitation: InvitationSummary::from(invitation),
            max_guests: invitation.max_guests,
            remaining,
            can_add_more: remaining > 0,
            attendance_decision: invitation.attendance_decision,
            meal_options,
            guests,
        }
    }
}

/// One guest entry of a resubmitted RSVP form.
///
/// Ids of zero or below are temporary ids for guests added in the form.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct SubmittedGuest {
    pub id: i64,

    #[serde(default)]
    #[validate(custom(function = "validate_guest_name"))]
    pub name: String,

    /// Falls back to the party decision when absent.
    pub attending: Option<bool>,

    pub meal_preference: Option<String>,

    #[validate(length(max = 500, message = "Dietary restrictions too long"))]
    pub dietary_restrictions: Option<String>,
}

impl SubmittedGuest {
    pub fn is_new(&self) -> bool {
        self.id <= 0
    }
}

/// Full RSVP form submission.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct RosterSubmission {
    pub party_attending: bool,

    #[serde(default)]
    #[validate(length(max = 100, message = "Too many guests in submission"))]
    #[validate(nested)]
    pub guests: Vec<SubmittedGuest>,
}
