use tracing::info;
use uuid::Uuid;

use super::dto::CreateFoodRequest;
use super::repo_types::{Food, FoodPatch, FoodStatus, UpdateOutcome};
use super::workflow::Transition;
use crate::{
    auth::policy::{authorize, Operation},
    error::AppError,
    state::AppState,
    users::repo_types::User,
};

fn found(outcome: UpdateOutcome) -> Result<UpdateOutcome, AppError> {
    if outcome.matched == 0 {
        return Err(AppError::NotFound("Food"));
    }
    Ok(outcome)
}

pub async fn create_food(
    state: &AppState,
    caller: &User,
    body: CreateFoodRequest,
) -> Result<Food, AppError> {
    authorize(caller, Operation::CreateFood, None)?;
    let new = body.into_new_food(caller)?;
    let food = state.foods.insert(new).await?;
    info!(food_id = %food.id, donor = %food.donator_email, "food created");
    Ok(food)
}

pub async fn request_food(state: &AppState, caller: &User, id: Uuid) -> Result<UpdateOutcome, AppError> {
    authorize(caller, Operation::RequestFood, Some(id))?;
    let transition = Transition::Request {
        requester: caller.email.clone(),
    };
    let outcome = found(state.foods.transition(id, &transition).await?)?;
    info!(food_id = %id, requester = %caller.email, modified = outcome.modified, "food requested");
    Ok(outcome)
}

/// Caller must already be authorized for `Operation::DecideRequest`.
pub async fn decide_request(
    state: &AppState,
    caller: &User,
    id: Uuid,
    target: FoodStatus,
) -> Result<UpdateOutcome, AppError> {
    let transition = Transition::from_target(target)?;
    let outcome = found(state.foods.transition(id, &transition).await?)?;
    info!(food_id = %id, status = %target, admin = %caller.email, "request decided");
    Ok(outcome)
}

pub async fn delete_food(state: &AppState, admin: &User, id: Uuid) -> Result<u64, AppError> {
    let deleted = state.foods.delete(id).await?;
    info!(food_id = %id, deleted, admin = %admin.email, "food delete");
    Ok(deleted)
}

pub async fn update_food(state: &AppState, id: Uuid, patch: FoodPatch) -> Result<UpdateOutcome, AppError> {
    let outcome = found(state.foods.update(id, &patch).await?)?;
    info!(food_id = %id, modified = outcome.modified, "food updated");
    Ok(outcome)
}
