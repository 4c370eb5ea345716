use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::repo_types::{parse_date, Food, FoodPatch, NewFood, UpdateOutcome};
use crate::{error::AppError, users::repo_types::User};

/// Form inputs arrive as strings, API clients send numbers. Accept both.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum QuantityInput {
    Number(i64),
    Text(String),
}

impl QuantityInput {
    fn parse(&self) -> Result<i32, AppError> {
        let value = match self {
            QuantityInput::Number(n) => Some(*n),
            QuantityInput::Text(s) => s.trim().parse::<i64>().ok(),
        };
        value
            .filter(|n| *n >= 1)
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| AppError::validation("food_quantity must be a positive whole number"))
    }
}

fn required(value: Option<String>, field: &str) -> Result<String, AppError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| AppError::validation(format!("{field} is required")))
}

fn date(raw: &str) -> Result<time::Date, AppError> {
    parse_date(raw).ok_or_else(|| AppError::validation("expire_date must be YYYY-MM-DD"))
}

/// Body of `POST /add-food`. Donor, status and requester fields are not read.
#[derive(Debug, Default, Deserialize)]
pub struct CreateFoodRequest {
    pub food_name: Option<String>,
    pub food_image: Option<String>,
    pub food_quantity: Option<QuantityInput>,
    pub pickup_location: Option<String>,
    pub expire_date: Option<String>,
    pub additional_notes: Option<String>,
}

impl CreateFoodRequest {
    /// Validates the body and stamps donor fields from `donor`'s stored profile.
    pub fn into_new_food(self, donor: &User) -> Result<NewFood, AppError> {
        let food_name = required(self.food_name, "food_name")?;
        let pickup_location = required(self.pickup_location, "pickup_location")?;
        let food_quantity = self
            .food_quantity
            .ok_or_else(|| AppError::validation("food_quantity is required"))?
            .parse()?;
        let expire_date = date(&required(self.expire_date, "expire_date")?)?;

        Ok(NewFood {
            food_name,
            food_image: self.food_image.unwrap_or_default(),
            food_quantity,
            pickup_location,
            expire_date,
            additional_notes: self.additional_notes.unwrap_or_default(),
            donator_email: donor.email.clone(),
            donator_name: donor.display_name.clone(),
            donator_image: donor.photo_url.clone(),
        })
    }
}

/// Body of `PUT /foods/:id`. `_id`/`id` and unknown keys are dropped.
#[derive(Debug, Default, Deserialize)]
pub struct UpdateFoodRequest {
    pub food_name: Option<String>,
    pub food_image: Option<String>,
    pub food_quantity: Option<QuantityInput>,
    pub pickup_location: Option<String>,
    pub expire_date: Option<String>,
    pub additional_notes: Option<String>,
    pub donator_email: Option<String>,
    pub donator_name: Option<String>,
    pub donator_image: Option<String>,
}

impl TryFrom<UpdateFoodRequest> for FoodPatch {
    type Error = AppError;

    fn try_from(req: UpdateFoodRequest) -> Result<Self, Self::Error> {
        let non_blank = |value: Option<String>, field: &str| -> Result<Option<String>, AppError> {
            match value {
                Some(v) => required(Some(v), field).map(Some),
                None => Ok(None),
            }
        };

        Ok(FoodPatch {
            food_name: non_blank(req.food_name, "food_name")?,
            food_image: req.food_image,
            food_quantity: req.food_quantity.map(|q| q.parse()).transpose()?,
            pickup_location: non_blank(req.pickup_location, "pickup_location")?,
            expire_date: req.expire_date.as_deref().map(date).transpose()?,
            additional_notes: req.additional_notes,
            donator_email: non_blank(req.donator_email, "donator_email")?,
            donator_name: req.donator_name,
            donator_image: req.donator_image,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StatusChangeRequest {
    pub status: String,
}

#[derive(Debug, Serialize)]
pub struct ListingPage {
    pub foods: Vec<Food>,
    pub total: i64,
    pub page: i64,
    pub limit: i64,
}

#[derive(Debug, Serialize)]
pub struct InsertResponse {
    pub acknowledged: bool,
    pub inserted_id: Uuid,
}

#[derive(Debug, Serialize)]
pub struct UpdateResponse {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<UpdateOutcome> for UpdateResponse {
    fn from(o: UpdateOutcome) -> Self {
        Self {
            acknowledged: true,
            matched_count: o.matched,
            modified_count: o.modified,
            message: None,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub acknowledged: bool,
    pub deleted_count: u64,
}
