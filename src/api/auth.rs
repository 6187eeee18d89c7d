use super::extract::{ApiJson, ApiQuery};
use crate::auth::google::OAUTH_STATE_COOKIE;
use crate::auth::{CurrentUser, GoogleOAuthClient};
use crate::error::{AppError, AppResult};
use crate::models::User;
use crate::services::auth_service::{
    PinLoginRequest, ResetPinRequest, SigninRequest, SignupRequest, UsernamePinRequest,
};
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::warn;

/// Lifetime of the OAuth state cookie
const OAUTH_STATE_TTL_SECS: i64 = 600;

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct UsernameQuery {
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct GoogleCallbackQuery {
    pub code: Option<String>,
    pub state: Option<String>,
    pub error: Option<String>,
}

/// Attach a fresh session cookie and return the user's profile
fn signed_in(state: &AppState, jar: CookieJar, user: &User) -> AppResult<(CookieJar, Json<Value>)> {
    let token = state.sessions.issue(user.id)?;
    let jar = jar.add(state.sessions.session_cookie(token));
    Ok((jar, Json(json!({ "success": true, "user": user.to_profile() }))))
}

pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SignupRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth_service.signup(&req).await?;
    Ok((StatusCode::CREATED, signed_in(&state, jar, &user)?))
}

pub async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<SigninRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth_service.signin(&req).await?;
    signed_in(&state, jar, &user)
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<PinLoginRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth_service.login(&req).await?;
    signed_in(&state, jar, &user)
}

pub async fn create(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiJson(req): ApiJson<UsernamePinRequest>,
) -> AppResult<impl IntoResponse> {
    let user = state.auth_service.create_quick(&req).await?;
    Ok((StatusCode::CREATED, signed_in(&state, jar, &user)?))
}

pub async fn complete_profile(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<UsernamePinRequest>,
) -> AppResult<Json<Value>> {
    let user = state.auth_service.complete_profile(current.id, &req).await?;
    Ok(Json(json!({ "success": true, "user": user.to_profile() })))
}

pub async fn reset_pin(
    State(state): State<AppState>,
    current: CurrentUser,
    ApiJson(req): ApiJson<ResetPinRequest>,
) -> AppResult<Json<Value>> {
    state.auth_service.reset_pin(current.id, &req).await?;
    Ok(Json(json!({ "success": true })))
}

pub async fn user(State(state): State<AppState>, current: CurrentUser) -> AppResult<Json<Value>> {
    let user = state.auth_service.current_user(current.id).await?;
    Ok(Json(json!({
        "success": true,
        "user": user.to_profile(),
        "profile_complete": user.profile_complete(),
    })))
}

pub async fn check_email(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<EmailQuery>,
) -> AppResult<Json<Value>> {
    let available = state.auth_service.email_available(&query.email).await?;
    Ok(Json(json!({ "success": true, "available": available })))
}

pub async fn check_username(
    State(state): State<AppState>,
    ApiQuery(query): ApiQuery<UsernameQuery>,
) -> AppResult<Json<Value>> {
    let available = state.auth_service.username_available(&query.username).await?;
    Ok(Json(json!({ "success": true, "available": available })))
}

pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> impl IntoResponse {
    let jar = jar.add(state.sessions.clear_cookie());
    (jar, Json(json!({ "success": true })))
}

fn google_client(state: &AppState) -> AppResult<&GoogleOAuthClient> {
    state
        .google
        .as_deref()
        .ok_or_else(|| AppError::ServiceUnavailable("Google sign-in is not configured".to_string()))
}

/// Redirect to Google's consent screen
pub async fn google(State(state): State<AppState>, jar: CookieJar) -> AppResult<Response> {
    let client = google_client(&state)?;
    let oauth_state = GoogleOAuthClient::new_state();

    let cookie = Cookie::build((OAUTH_STATE_COOKIE, oauth_state.clone()))
        .http_only(true)
        .same_site(SameSite::Lax)
        .path("/")
        .secure(state.config.session.secure_cookie)
        .max_age(time::Duration::seconds(OAUTH_STATE_TTL_SECS))
        .build();

    Ok((jar.add(cookie), Redirect::to(&client.authorize_url(&oauth_state))).into_response())
}

/// Google redirects back here with `code` and `state`
pub async fn google_callback(
    State(state): State<AppState>,
    jar: CookieJar,
    ApiQuery(query): ApiQuery<GoogleCallbackQuery>,
) -> AppResult<Response> {
    let client = google_client(&state)?;
    let base = state.config.app_base_url.clone();
    let failed = |jar: CookieJar| {
        Ok((
            jar.remove(Cookie::build(OAUTH_STATE_COOKIE).path("/")),
            Redirect::to(&format!("{}/login?error=google", base)),
        )
            .into_response())
    };

    if let Some(error) = query.error.as_deref() {
        warn!("Google sign-in cancelled: {}", error);
        return failed(jar);
    }

    let expected = jar.get(OAUTH_STATE_COOKIE).map(|c| c.value().to_string());
    let (Some(code), Some(returned)) = (query.code.as_deref(), query.state.as_deref()) else {
        return failed(jar);
    };
    if expected.as_deref() != Some(returned) {
        warn!("Google callback state mismatch");
        return failed(jar);
    }

    let profile = match client.exchange_code(code).await {
        Ok(profile) => profile,
        Err(e) => {
            warn!("Google code exchange failed: {}", e);
            return failed(jar);
        }
    };
    let user = match state.auth_service.google_sign_in(&profile).await {
        Ok(user) => user,
        Err(e) => {
            warn!("Google sign-in rejected: {}", e);
            return failed(jar);
        }
    };

    let token = state.sessions.issue(user.id)?;
    let jar = jar
        .remove(Cookie::build(OAUTH_STATE_COOKIE).path("/"))
        .add(state.sessions.session_cookie(token));

    let target = if user.profile_complete() {
        base
    } else {
        format!("{}/complete-profile", base)
    };
    Ok((jar, Redirect::to(&target)).into_response())
}
