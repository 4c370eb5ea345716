use axum::{
    extract::{rejection::JsonRejection, Path, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tracing::{instrument, warn};
use uuid::Uuid;

use super::dto::{
    CreateFoodRequest, DeleteResponse, InsertResponse, ListingPage, StatusChangeRequest,
    UpdateFoodRequest, UpdateResponse,
};
use super::query::{ListingParams, ListingQuery};
use super::repo_types::{Food, FoodFilter, FoodPatch, FoodStatus};
use super::services;
use crate::{
    auth::{
        extractors::Caller,
        policy::{authorize, Operation},
    },
    error::AppError,
    state::AppState,
};

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/foods", get(list_foods))
        .route("/foods/status/:status", get(list_foods_by_status))
        .route("/foods/:id", get(get_food).put(update_food).delete(delete_food))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/add-food", post(create_food))
        .route("/my-foods", get(my_foods))
        .route("/foods/:id/request", patch(request_food))
        .route("/food-requests", get(my_requests))
        .route("/foods-requested", get(pending_requests))
        .route("/foods/:id/status", patch(change_status))
}

/// Unparseable ids cannot name a listing.
fn food_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Food"))
}

// --- handlers ---

async fn run_listing(state: &AppState, query: ListingQuery) -> Result<Json<ListingPage>, AppError> {
    let page = state.foods.list(&query).await?;
    Ok(Json(ListingPage {
        foods: page.items,
        total: page.total,
        page: query.page,
        limit: query.limit,
    }))
}

#[instrument(skip(state))]
pub async fn list_foods(
    State(state): State<AppState>,
    Query(params): Query<ListingParams>,
) -> Result<Json<ListingPage>, AppError> {
    run_listing(&state, ListingQuery::from_params(&params, None)).await
}

#[instrument(skip(state))]
pub async fn list_foods_by_status(
    State(state): State<AppState>,
    Path(status): Path<String>,
    Query(params): Query<ListingParams>,
) -> Result<Json<ListingPage>, AppError> {
    let status = status.parse::<FoodStatus>().map_err(|e| {
        warn!(error = %e, "bad status filter");
        AppError::validation(e)
    })?;
    run_listing(&state, ListingQuery::from_params(&params, Some(status))).await
}

#[instrument(skip(state))]
pub async fn get_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Food>, AppError> {
    let id = food_id(&id)?;
    let food = state.foods.get(id).await?.ok_or(AppError::NotFound("Food"))?;
    Ok(Json(food))
}

/// POST /add-food
#[instrument(skip(state, caller, body), fields(user_id = %caller.0.id))]
pub async fn create_food(
    State(state): State<AppState>,
    caller: Caller,
    body: Result<Json<CreateFoodRequest>, JsonRejection>,
) -> Result<(StatusCode, HeaderMap, Json<InsertResponse>), AppError> {
    let Json(body) = body?;
    let food = services::create_food(&state, &caller.0, body).await?;

    let mut headers = HeaderMap::new();
    if let Ok(location) = HeaderValue::from_str(&format!("/foods/{}", food.id)) {
        headers.insert(header::LOCATION, location);
    }

    Ok((
        StatusCode::CREATED,
        headers,
        Json(InsertResponse {
            acknowledged: true,
            inserted_id: food.id,
        }),
    ))
}

#[instrument(skip(state, caller), fields(user_id = %caller.0.id))]
pub async fn my_foods(State(state): State<AppState>, caller: Caller) -> Result<Json<Vec<Food>>, AppError> {
    authorize(&caller.0, Operation::ViewOwnFoods, None)?;
    let foods = state
        .foods
        .list_where(&FoodFilter::Donor(caller.0.email.clone()))
        .await?;
    Ok(Json(foods))
}

#[instrument(skip(state, caller), fields(user_id = %caller.0.id))]
pub async fn my_requests(State(state): State<AppState>, caller: Caller) -> Result<Json<Vec<Food>>, AppError> {
    authorize(&caller.0, Operation::ViewOwnRequests, None)?;
    let foods = state
        .foods
        .list_where(&FoodFilter::Requester(caller.0.email.clone()))
        .await?;
    Ok(Json(foods))
}

#[instrument(skip(state, caller), fields(user_id = %caller.0.id))]
pub async fn pending_requests(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<Food>>, AppError> {
    authorize(&caller.0, Operation::ReviewRequests, None)?;
    let foods = state
        .foods
        .list_where(&FoodFilter::Status(FoodStatus::Requested))
        .await?;
    Ok(Json(foods))
}

/// PATCH /foods/:id/request
#[instrument(skip(state, caller), fields(user_id = %caller.0.id))]
pub async fn request_food(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<UpdateResponse>, AppError> {
    let outcome = services::request_food(&state, &caller.0, food_id(&id)?).await?;
    let mut response = UpdateResponse::from(outcome);
    if outcome.modified == 0 {
        response.message = Some("Already requested by you".into());
    }
    Ok(Json(response))
}

/// PATCH /foods/:id/status { "status": "Approved" | "Available" }
///
/// Non-admins are refused before the id or body is inspected.
#[instrument(skip(state, caller, body), fields(user_id = %caller.0.id))]
pub async fn change_status(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    body: Result<Json<StatusChangeRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    authorize(&caller.0, Operation::DecideRequest, None)?;
    let id = food_id(&id)?;
    let Json(body) = body?;
    let target = body.status.parse::<FoodStatus>().map_err(AppError::validation)?;
    let outcome = services::decide_request(&state, &caller.0, id, target).await?;
    Ok(Json(outcome.into()))
}

/// DELETE /foods/:id. Non-admins are refused before the id is parsed.
#[instrument(skip(state, caller), fields(user_id = %caller.0.id))]
pub async fn delete_food(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    authorize(&caller.0, Operation::DeleteFood, None)?;
    let deleted_count = match Uuid::parse_str(&id) {
        Ok(id) => services::delete_food(&state, &caller.0, id).await?,
        Err(_) => 0,
    };
    Ok(Json(DeleteResponse {
        acknowledged: true,
        deleted_count,
    }))
}

/// PUT /foods/:id
#[instrument(skip(state, body))]
pub async fn update_food(
    State(state): State<AppState>,
    Path(id): Path<String>,
    body: Result<Json<UpdateFoodRequest>, JsonRejection>,
) -> Result<Json<UpdateResponse>, AppError> {
    let id = food_id(&id)?;
    let Json(body) = body?;
    let patch = FoodPatch::try_from(body)?;
    let outcome = services::update_food(&state, id, patch).await?;
    Ok(Json(outcome.into()))
}
