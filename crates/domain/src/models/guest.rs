//! Guest domain models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared::validation::{validate_guest_name, MAX_DIETARY_LENGTH};
use thiserror::Error;
use validator::Validate;

use super::invitation::InvitationKey;

/// Meal choices offered when no list is configured.
pub const DEFAULT_MEAL_OPTIONS: &[&str] = &[
    "Standard",
    "Vegetarian",
    "Ovo-Lacto Vegetarian",
    "Ovo-Lacto with Fish",
    "Muslim",
    "Gluten-Free",
    "Lactose-Free",
    "Child",
];

/// Tri-state attendance of a single guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attendance {
    #[default]
    Unknown,
    Yes,
    No,
}

impl Attendance {
    /// Storage representation (nullable boolean).
    pub fn as_option(&self) -> Option<bool> {
        match self {
            Attendance::Unknown => None,
            Attendance::Yes => Some(true),
            Attendance::No => Some(false),
        }
    }
}

impl From<Option<bool>> for Attendance {
    fn from(value: Option<bool>) -> Self {
        match value {
            None => Attendance::Unknown,
            Some(true) => Attendance::Yes,
            Some(false) => Attendance::No,
        }
    }
}

impl From<bool> for Attendance {
    fn from(value: bool) -> Self {
        Attendance::from(Some(value))
    }
}

/// Guest entry owned by an invitation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct Guest {
    pub id: i64,
    #[serde(skip_serializing)]
    pub invitation_key: InvitationKey,
    pub name: String,
    pub attending: Attendance,
    pub meal_preference: Option<String>,
    pub dietary_restrictions: Option<String>,
    pub last_updated: DateTime<Utc>,
}

/// A meal preference that is not on the configured menu.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown meal option: {0}")]
pub struct UnknownMealOption(pub String);

/// The configured list of meal options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct MealOptions(Vec<String>);

impl MealOptions {
    pub fn new(options: Vec<String>) -> Self {
        Self(options)
    }

    /// Normalizes a submitted preference. Blank means no preference.
    pub fn resolve(&self, submitted: Option<&str>) -> Result<Option<String>, UnknownMealOption> {
        match submitted.map(str::trim).filter(|s| !s.is_empty()) {
            None => Ok(None),
            Some(meal) => self
                .0
                .iter()
                .find(|option| option.as_str() == meal)
                .map(|option| Some(option.clone()))
                .ok_or_else(|| UnknownMealOption(meal.to_string())),
        }
    }
}

impl Default for MealOptions {
    fn default() -> Self {
        Self(DEFAULT_MEAL_OPTIONS.iter().map(|s| s.to_string()).collect())
    }
}

/// Trims free-text dietary notes; blank becomes `None`.
pub fn normalize_dietary(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Request to add a guest to the caller's invitation.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct CreateGuestRequest {
    #[serde(default)]
    #[validate(custom(function = "validate_guest_name"))]
    pub name: String,
}

/// Partial update of a guest. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(rename_all = "snake_case")]
pub struct UpdateGuestRequest {
    #[validate(custom(function = "validate_guest_name"))]
    pub name: Option<String>,

    pub attending: Option<Attendance>,

    pub meal_preference: Option<String>,

    #[validate(length(max = 500, message = "Dietary restrictions too long"))]
    pub dietary_restrictions: Option<String>,
}

impl UpdateGuestRequest {
    /// True when any RSVP field (not the name) was supplied.
    pub fn touches_rsvp(&self) -> bool {
        self.attending.is_some()
            || self.meal_preference.is_some()
            || self.dietary_restrictions.is_some()
    }
}

/// Request to record the party decision without touching guests.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct AttendanceRequest {
    pub attending: bool,
}

/// Validated RSVP fields written to a guest row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuestRsvp {
    pub attending: Attendance,
    pub meal_preference: Option<String>,
    pub dietary_restrictions: Option<String>,
}

impl GuestRsvp {
    /// Builds the RSVP fields, checking the meal against the menu.
    pub fn new(
        attending: Attendance,
        meal: Option<&str>,
        dietary: Option<&str>,
        meals: &MealOptions,
    ) -> Result<Self, UnknownMealOption> {
        Ok(Self {
            attending,
            meal_preference: meals.resolve(meal)?,
            dietary_restrictions: normalize_dietary(dietary)
                .map(|d| d.chars().take(MAX_DIETARY_LENGTH).collect()),
        })
    }
}
