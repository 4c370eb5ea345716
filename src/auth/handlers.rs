use axum::{
    extract::{rejection::JsonRejection, FromRef, State},
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use super::{
    dto::{AuthResponse, LoginRequest, RefreshRequest},
    extractors::Caller,
    jwt::JwtKeys,
    password::{is_valid_email, normalize_email, verify_password},
};
use crate::{error::AppError, state::AppState, users::dto::PublicUser, users::repo_types::User};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/login", post(login))
        .route("/auth/refresh", post(refresh))
}

pub fn me_routes() -> Router<AppState> {
    Router::new().route("/me", get(get_me))
}

fn issue_tokens(state: &AppState, user: User) -> Result<AuthResponse, AppError> {
    let keys = JwtKeys::from_ref(state);
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        token_type: "Bearer",
        access_token,
        expires_in: keys.access_ttl_secs(),
        refresh_token,
        user: user.into(),
    })
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);
    if !is_valid_email(&email) {
        warn!(email = %email, "invalid email");
        return Err(AppError::validation("Invalid email"));
    }

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "login unknown email");
        return Err(AppError::NotAuthenticated);
    };

    if !verify_password(&payload.password, &user.password_hash)? {
        warn!(email = %email, user_id = %user.id, "login invalid password");
        return Err(AppError::NotAuthenticated);
    }

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    payload: Result<Json<RefreshRequest>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(payload) = payload?;
    let keys = JwtKeys::from_ref(&state);
    let claims = keys.verify_refresh(&payload.refresh_token).map_err(|e| {
        warn!(error = %e, "refresh rejected");
        AppError::NotAuthenticated
    })?;

    let user = state
        .users
        .find_by_id(claims.sub)
        .await?
        .ok_or(AppError::NotAuthenticated)?;
    Ok(Json(issue_tokens(&state, user)?))
}

#[instrument(skip(caller), fields(user_id = %caller.0.id))]
pub async fn get_me(caller: Caller) -> Json<PublicUser> {
    Json(caller.0.into())
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;

    use crate::test_support::{call, request, test_app};

    async fn register(app: &axum::Router, email: &str, password: &str) {
        let body = json!({ "email": email, "display_name": "Tester", "password": password });
        let (status, _) = call(app, request(Method::POST, "/users", None, Some(body))).await;
        assert_eq!(status, StatusCode::CREATED);
    }

    #[tokio::test]
    async fn login_then_me_then_refresh() {
        let (_, app) = test_app();
        register(&app, "t@example.com", "password123").await;

        let (status, tokens) = call(
            &app,
            request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "email": "T@example.com", "password": "password123" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(tokens["token_type"], "Bearer");
        assert_eq!(tokens["expires_in"], 300);
        assert!(tokens["user"].get("password_hash").is_none());
        let access = tokens["access_token"].as_str().unwrap().to_string();
        let refresh = tokens["refresh_token"].as_str().unwrap().to_string();

        let (status, me) = call(&app, request(Method::GET, "/me", Some(&access), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["email"], "t@example.com");

        // refresh tokens are not accepted as bearer credentials
        let (status, _) = call(&app, request(Method::GET, "/me", Some(&refresh), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, renewed) = call(
            &app,
            request(Method::POST, "/auth/refresh", None, Some(json!({ "refresh_token": refresh }))),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(renewed["access_token"].is_string());
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let (_, app) = test_app();
        register(&app, "t@example.com", "password123").await;

        for (email, password) in [("t@example.com", "wrong-pass"), ("x@example.com", "password123")] {
            let (status, body) = call(
                &app,
                request(Method::POST, "/auth/login", None, Some(json!({ "email": email, "password": password }))),
            )
            .await;
            assert_eq!(status, StatusCode::UNAUTHORIZED);
            assert_eq!(body["code"], "NotAuthenticated");
        }
    }

    #[tokio::test]
    async fn me_without_token_is_unauthorized() {
        let (_, app) = test_app();
        let (status, _) = call(&app, request(Method::GET, "/me", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, request(Method::GET, "/me", Some("garbage"), None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}
