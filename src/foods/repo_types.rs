use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

time::serde::format_description!(date_format, Date, "[year]-[month]-[day]");

/// Parses a `YYYY-MM-DD` calendar date.
pub fn parse_date(raw: &str) -> Option<Date> {
    let fmt = time::macros::format_description!("[year]-[month]-[day]");
    Date::parse(raw.trim(), fmt).ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "food_status")]
pub enum FoodStatus {
    Available,
    Requested,
    Approved,
}

impl FoodStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            FoodStatus::Available => "Available",
            FoodStatus::Requested => "Requested",
            FoodStatus::Approved => "Approved",
        }
    }
}

impl fmt::Display for FoodStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FoodStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(FoodStatus::Available),
            "Requested" => Ok(FoodStatus::Requested),
            "Approved" => Ok(FoodStatus::Approved),
            other => Err(format!("unknown food status: {other}")),
        }
    }
}

/// Food listing row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Food {
    pub id: Uuid,
    pub food_name: String,
    pub food_image: String,
    pub food_quantity: i32,
    pub pickup_location: String,
    #[serde(with = "date_format")]
    pub expire_date: Date,
    pub additional_notes: String,
    pub donator_email: String,
    pub donator_name: String,
    pub donator_image: String,
    pub food_status: FoodStatus,
    pub requested_by_email: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Validated fields for a new listing. Donor fields come from the caller's profile.
#[derive(Debug, Clone)]
pub struct NewFood {
    pub food_name: String,
    pub food_image: String,
    pub food_quantity: i32,
    pub pickup_location: String,
    pub expire_date: Date,
    pub additional_notes: String,
    pub donator_email: String,
    pub donator_name: String,
    pub donator_image: String,
}

impl NewFood {
    /// Builds the stored record: fresh id, `Available`, stamped now.
    pub fn into_food(self) -> Food {
        Food {
            id: Uuid::new_v4(),
            food_name: self.food_name,
            food_image: self.food_image,
            food_quantity: self.food_quantity,
            pickup_location: self.pickup_location,
            expire_date: self.expire_date,
            additional_notes: self.additional_notes,
            donator_email: self.donator_email,
            donator_name: self.donator_name,
            donator_image: self.donator_image,
            food_status: FoodStatus::Available,
            requested_by_email: None,
            created_at: OffsetDateTime::now_utc(),
        }
    }
}

/// Field replacements for the generic update. `None` leaves a field alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FoodPatch {
    pub food_name: Option<String>,
    pub food_image: Option<String>,
    pub food_quantity: Option<i32>,
    pub pickup_location: Option<String>,
    pub expire_date: Option<Date>,
    pub additional_notes: Option<String>,
    pub donator_email: Option<String>,
    pub donator_name: Option<String>,
    pub donator_image: Option<String>,
}

impl FoodPatch {
    pub fn is_empty(&self) -> bool {
        *self == FoodPatch::default()
    }

    /// Writes the supplied fields into `food`; returns whether any value changed.
    pub fn apply(&self, food: &mut Food) -> bool {
        fn set<T: Clone + PartialEq>(slot: &mut T, value: &Option<T>) -> bool {
            match value {
                Some(v) if slot != v => {
                    *slot = v.clone();
                    true
                }
                _ => false,
            }
        }

        let mut changed = false;
        changed |= set(&mut food.food_name, &self.food_name);
        changed |= set(&mut food.food_image, &self.food_image);
        changed |= set(&mut food.food_quantity, &self.food_quantity);
        changed |= set(&mut food.pickup_location, &self.pickup_location);
        changed |= set(&mut food.expire_date, &self.expire_date);
        changed |= set(&mut food.additional_notes, &self.additional_notes);
        changed |= set(&mut food.donator_email, &self.donator_email);
        changed |= set(&mut food.donator_name, &self.donator_name);
        changed |= set(&mut food.donator_image, &self.donator_image);
        changed
    }
}

/// Result of a single-record update, counted like a document store reports it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

impl UpdateOutcome {
    pub fn not_found() -> Self {
        Self::default()
    }

    pub fn unchanged() -> Self {
        Self {
            matched: 1,
            modified: 0,
        }
    }

    pub fn changed() -> Self {
        Self {
            matched: 1,
            modified: 1,
        }
    }
}

/// Unpaginated list views, newest first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FoodFilter {
    Donor(String),
    Requester(String),
    Status(FoodStatus),
}

impl FoodFilter {
    pub fn matches(&self, food: &Food) -> bool {
        match self {
            FoodFilter::Donor(email) => food.donator_email == *email,
            FoodFilter::Requester(email) => food.requested_by_email.as_deref() == Some(email),
            FoodFilter::Status(status) => food.food_status == *status,
        }
    }
}

#[cfg(test)]
pub(crate) fn sample_food(name: &str, quantity: i32, expire: &str) -> Food {
    NewFood {
        food_name: name.into(),
        food_image: String::new(),
        food_quantity: quantity,
        pickup_location: "Main St".into(),
        expire_date: parse_date(expire).expect("valid date"),
        additional_notes: String::new(),
        donator_email: "donor@example.com".into(),
        donator_name: "Donor".into(),
        donator_image: String::new(),
    }
    .into_food()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_exact_names_only() {
        assert_eq!("Approved".parse::<FoodStatus>(), Ok(FoodStatus::Approved));
        assert!("approved".parse::<FoodStatus>().is_err());
        assert!("Not Available".parse::<FoodStatus>().is_err());
    }

    #[test]
    fn new_food_starts_available_without_requester() {
        let food = sample_food("Rice", 3, "2030-01-02");
        assert_eq!(food.food_status, FoodStatus::Available);
        assert!(food.requested_by_email.is_none());
    }

    #[test]
    fn food_serializes_date_and_status_as_strings() {
        let food = sample_food("Rice", 3, "2030-01-02");
        let json = serde_json::to_value(&food).unwrap();
        assert_eq!(json["expire_date"], "2030-01-02");
        assert_eq!(json["food_status"], "Available");
    }

    #[test]
    fn patch_reports_only_real_changes() {
        let mut food = sample_food("Rice", 3, "2030-01-02");
        let same = FoodPatch {
            food_name: Some("Rice".into()),
            ..Default::default()
        };
        assert!(!same.apply(&mut food));

        let patch = FoodPatch {
            food_quantity: Some(9),
            pickup_location: Some("Elm St".into()),
            ..Default::default()
        };
        assert!(patch.apply(&mut food));
        assert_eq!(food.food_quantity, 9);
        assert_eq!(food.pickup_location, "Elm St");
        assert_eq!(food.food_name, "Rice");
    }

    #[test]
    fn parse_date_rejects_garbage() {
        assert!(parse_date("2030-02-30").is_none());
        assert!(parse_date("tomorrow").is_none());
        assert!(parse_date(" 2030-02-03 ").is_some());
    }
}
