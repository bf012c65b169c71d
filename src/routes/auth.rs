/// Authentication Routes
///
/// Handles login, access token refresh, logout and current identity lookup.

use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{bearer_token, AuthGateway, Credentials, Identity};
use crate::error::AppError;

/// Logout request
#[derive(Deserialize)]
pub struct LogoutRequest {
    pub token: String,
}

/// Login response with access and (optionally) refresh token
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub token_type: String,
    pub expires_in: Option<i64>,
}

/// Access token response for refresh
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessTokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: Option<i64>,
}

/// Identity of the caller
#[derive(Serialize)]
pub struct IdentityResponse {
    pub name: String,
}

/// POST /login
///
/// Resolve credentials to an identity and issue a token pair.
///
/// # Errors
/// - 400: Malformed or missing username
/// - 401: Invalid credentials (only when passwords are configured)
/// - 500: Internal server error
pub async fn login(
    form: web::Json<Credentials>,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AppError> {
    let pair = gateway.login(&form)?;

    tracing::info!(name = %form.username.trim(), "User logged in successfully");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
        token_type: "Bearer".to_string(),
        expires_in: gateway.access_codec().expiry_seconds(),
    }))
}

/// POST /token, GET /accessToken
///
/// Exchange the bearer refresh token for a new access token.
/// The refresh token is not rotated.
///
/// # Errors
/// - 401: Missing bearer token
/// - 403: Unrecognized, revoked, invalid or expired refresh token
pub async fn refresh(
    req: HttpRequest,
    gateway: web::Data<AuthGateway>,
) -> Result<HttpResponse, AppError> {
    let presented = bearer_token(req.headers())?;
    let access_token = gateway.refresh(&presented)?;

    tracing::info!("Token refreshed successfully");

    Ok(HttpResponse::Ok().json(AccessTokenResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: gateway.access_codec().expiry_seconds(),
    }))
}

/// DELETE /logout
///
/// Revoke a refresh token. Revoking an unknown token also succeeds.
pub async fn logout(
    form: web::Json<LogoutRequest>,
    gateway: web::Data<AuthGateway>,
) -> HttpResponse {
    gateway.revoke(form.token.trim());
    HttpResponse::NoContent().finish()
}

/// DELETE /logout/all
///
/// Revoke every refresh token of the authenticated caller.
/// **Requires valid access token** in Authorization header.
pub async fn logout_all(
    identity: web::ReqData<Identity>,
    gateway: web::Data<AuthGateway>,
) -> HttpResponse {
    let revoked = gateway.revoke_all(&identity);

    tracing::info!(name = %identity.name, revoked, "Logged out everywhere");

    HttpResponse::NoContent().finish()
}

/// GET /me
///
/// Identity resolved from the access token.
/// **Requires valid access token** in Authorization header.
pub async fn current_identity(identity: web::ReqData<Identity>) -> HttpResponse {
    HttpResponse::Ok().json(IdentityResponse {
        name: identity.name.clone(),
    })
}
