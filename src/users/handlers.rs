use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::dto::{PublicUser, SyncUserRequest, SyncUserResponse};
use super::repo_types::{NewUser, Role};
use crate::{
    auth::{
        extractors::Caller,
        password::{hash_password, is_valid_email, normalize_email, MIN_PASSWORD_LEN},
        policy::{authorize, Operation},
    },
    error::AppError,
    state::AppState,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(sync_user).get(list_users))
        .route("/users/:email", get(get_user))
}

/// Idempotent sign-in sync: creates the profile once, later calls are no-ops.
#[instrument(skip(state, payload))]
pub async fn sync_user(
    State(state): State<AppState>,
    payload: Result<Json<SyncUserRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<SyncUserResponse>), AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    let display_name = payload.display_name.trim().to_string();

    if email.is_empty() || display_name.is_empty() {
        warn!("sync without email or display name");
        return Err(AppError::validation("Email & displayName required"));
    }
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    if state.users.find_by_email(&email).await?.is_some() {
        info!(email = %email, "user already synced");
        return Ok((StatusCode::OK, Json(already_exists())));
    }

    if payload.password.len() < MIN_PASSWORD_LEN {
        warn!(email = %email, "password too short");
        return Err(AppError::validation("Password too short"));
    }
    let password_hash = hash_password(&payload.password)?;

    let new = NewUser {
        email: email.clone(),
        display_name,
        photo_url: payload.photo_url.unwrap_or_default(),
        password_hash,
        role: Role::User,
    };
    match state.users.insert_if_absent(new).await? {
        Some(user) => {
            info!(user_id = %user.id, email = %user.email, "user created");
            Ok((
                StatusCode::CREATED,
                Json(SyncUserResponse {
                    acknowledged: true,
                    inserted_id: Some(user.id),
                    message: None,
                }),
            ))
        }
        // lost a race with a concurrent sync for the same email
        None => Ok((StatusCode::OK, Json(already_exists()))),
    }
}

fn already_exists() -> SyncUserResponse {
    SyncUserResponse {
        acknowledged: true,
        inserted_id: None,
        message: Some("User already exists".into()),
    }
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<PublicUser>, AppError> {
    let user = state
        .users
        .find_by_email(&normalize_email(&email))
        .await?
        .ok_or(AppError::NotFound("User"))?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, caller), fields(user_id = %caller.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<Json<Vec<PublicUser>>, AppError> {
    authorize(&caller.0, Operation::ListUsers, None)?;
    let users = state.users.list().await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{call, request, seed_user, test_app};
    use crate::users::repo_types::Role;

    #[tokio::test]
    async fn sync_creates_once_then_noops() {
        let (state, app) = test_app();
        let body = json!({
            "email": "Ann@Example.com",
            "displayName": "Ann",
            "photoURL": "https://img/ann.png",
            "password": "long-enough-pw"
        });

        let (status, first) = call(&app, request(Method::POST, "/users", None, Some(body.clone()))).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(first["acknowledged"], true);
        assert!(first["inserted_id"].is_string());

        let mut renamed = body.clone();
        renamed["displayName"] = json!("Someone Else");
        let (status, second) = call(&app, request(Method::POST, "/users", None, Some(renamed))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(second["message"], "User already exists");

        let stored = state.users.find_by_email("ann@example.com").await.unwrap().unwrap();
        assert_eq!(stored.display_name, "Ann");
        assert_eq!(stored.role, Role::User);
        assert_eq!(stored.photo_url, "https://img/ann.png");
    }

    #[tokio::test]
    async fn sync_requires_email_and_display_name() {
        let (_, app) = test_app();
        let (status, body) = call(
            &app,
            request(Method::POST, "/users", None, Some(json!({ "email": "a@example.com", "password": "password1" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "ValidationFailed");
    }

    #[tokio::test]
    async fn sync_with_mistyped_body_is_validation_error() {
        let (_, app) = test_app();
        let (status, body) = call(
            &app,
            request(Method::POST, "/users", None, Some(json!({ "email": 42, "display_name": "A" }))),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "ValidationFailed");
    }

    #[tokio::test]
    async fn sync_rejects_short_password() {
        let (_, app) = test_app();
        let (status, _) = call(
            &app,
            request(
                Method::POST,
                "/users",
                None,
                Some(json!({ "email": "a@example.com", "display_name": "A", "password": "short" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn get_user_by_email() {
        let (state, app) = test_app();
        seed_user(&state, "bob@example.com", Role::User).await;

        let (status, body) = call(&app, request(Method::GET, "/users/bob@example.com", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "bob@example.com");
        assert_eq!(body["role"], "user");
        assert!(body.get("password_hash").is_none());

        let (status, _) = call(&app, request(Method::GET, "/users/nobody@example.com", None, None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn listing_users_is_admin_only() {
        let (state, app) = test_app();
        let (_, user_token) = seed_user(&state, "u@example.com", Role::User).await;
        let (_, admin_token) = seed_user(&state, "admin@example.com", Role::Admin).await;

        let (status, _) = call(&app, request(Method::GET, "/users", Some(&user_token), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, _) = call(&app, request(Method::GET, "/users", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) = call(&app, request(Method::GET, "/users", Some(&admin_token), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 2);
    }
}
