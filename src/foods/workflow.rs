//! Availability state machine for a listing.
//!
//! `Available -> Requested -> Approved`, and back to `Available` on reject.

use crate::error::AppError;

use super::repo_types::{Food, FoodStatus};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Any caller may request from any state. Re-requesting by the recorded requester is a no-op.
    Request { requester: String },
    /// Keeps the recorded requester.
    Approve,
    /// Clears the recorded requester.
    Reject,
}

impl Transition {
    /// Maps the admin status body onto a transition.
    pub fn from_target(status: FoodStatus) -> Result<Self, AppError> {
        match status {
            FoodStatus::Approved => Ok(Transition::Approve),
            FoodStatus::Available => Ok(Transition::Reject),
            FoodStatus::Requested => Err(AppError::validation(
                "status must be Approved or Available",
            )),
        }
    }

    pub fn target(&self) -> FoodStatus {
        match self {
            Transition::Request { .. } => FoodStatus::Requested,
            Transition::Approve => FoodStatus::Approved,
            Transition::Reject => FoodStatus::Available,
        }
    }

    /// Applies the transition in place and reports whether the record changed.
    pub fn apply(&self, food: &mut Food) -> bool {
        match self {
            Transition::Request { requester } => {
                if food.requested_by_email.as_deref() == Some(requester.as_str()) {
                    return false;
                }
                food.requested_by_email = Some(requester.clone());
                food.food_status = FoodStatus::Requested;
                true
            }
            Transition::Approve => {
                if food.food_status == FoodStatus::Approved {
                    return false;
                }
                food.food_status = FoodStatus::Approved;
                true
            }
            Transition::Reject => {
                if food.food_status == FoodStatus::Available && food.requested_by_email.is_none() {
                    return false;
                }
                food.food_status = FoodStatus::Available;
                food.requested_by_email = None;
                true
            }
        }
    }
}
