//! Request handlers.

use axum::extract::State;
use axum::http::header;
use axum::response::IntoResponse;
use axum::{Extension, Json};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use dailyread_sources::SourceError;
use dailyread_types::{Account, AccountId, DailyArticle};
use serde::{Deserialize, Serialize};

use crate::{AppState, RpcError, Session};

// ── Challenge ────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct CaptchaResponse {
    /// Base64-encoded PNG.
    pub image: String,
    pub expires_in: u64,
}

pub async fn captcha(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<impl IntoResponse, RpcError> {
    let mut slot = session.lock().await;
    let issued = state
        .workflows
        .gate()
        .issue(&mut *slot)
        .map_err(|e| RpcError::Internal(e.to_string()))?;
    state.metrics.challenges_issued.inc();
    Ok((
        [(header::CACHE_CONTROL, "no-store")],
        Json(CaptchaResponse {
            image: STANDARD.encode(&issued.png),
            expires_in: issued.expires_in,
        }),
    ))
}

// ── Accounts ─────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountView {
    pub id: AccountId,
    pub username: String,
    pub email: Option<String>,
    pub email_verified: bool,
}

impl From<Account> for AccountView {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            email: account.email,
            email_verified: account.email_verified,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OkResponse {
    pub ok: bool,
}

const OK: OkResponse = OkResponse { ok: true };

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
    pub captcha: String,
}

pub async fn login(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<AccountView>, RpcError> {
    {
        let mut slot = session.lock().await;
        state
            .workflows
            .gate()
            .validate(&mut *slot, &req.captcha)
            .map_err(|e| state.reject(e.into()))?;
    }
    // The session stays unlocked while the password hash is checked.
    let account = state
        .workflows
        .authenticate(&req.username, &req.password)
        .await
        .map_err(|e| state.reject(e))?;
    session.lock().await.user_id = Some(account.id);
    Ok(Json(account.into()))
}

pub async fn logout(Extension(session): Extension<Session>) -> Json<OkResponse> {
    session.lock().await.user_id = None;
    Json(OK)
}

pub async fn me(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
) -> Result<Json<AccountView>, RpcError> {
    let user_id = current_user(&session).await?;
    let account = state.workflows.account(user_id).map_err(|e| state.reject(e))?;
    Ok(Json(account.into()))
}

#[derive(Deserialize)]
pub struct SendCodeRequest {
    pub email: String,
    pub captcha: String,
}

pub async fn send_registration_code(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<OkResponse>, RpcError> {
    let mut slot = session.lock().await;
    state
        .workflows
        .send_registration_code(&mut *slot, &req.captcha, &req.email)
        .await
        .map_err(|e| state.reject(e))?;
    state.metrics.codes_issued.inc();
    Ok(Json(OK))
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub code: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<AccountView>, RpcError> {
    let account = state
        .workflows
        .register(&req.username, &req.email, &req.password, &req.code)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(account.into()))
}

#[derive(Deserialize)]
pub struct PasswordResetRequest {
    pub email: String,
    pub captcha: String,
}

pub async fn request_password_reset(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<PasswordResetRequest>,
) -> Result<Json<OkResponse>, RpcError> {
    let mut slot = session.lock().await;
    state
        .workflows
        .request_password_reset(&mut *slot, &req.captcha, &req.email)
        .await
        .map_err(|e| state.reject(e))?;
    state.metrics.codes_issued.inc();
    Ok(Json(OK))
}

#[derive(Deserialize)]
pub struct PasswordResetConfirm {
    pub email: String,
    pub code: String,
    pub new_password: String,
}

pub async fn confirm_password_reset(
    State(state): State<AppState>,
    Json(req): Json<PasswordResetConfirm>,
) -> Result<Json<OkResponse>, RpcError> {
    state
        .workflows
        .reset_password(&req.email, &req.code, &req.new_password)
        .await
        .map_err(|e| state.reject(e))?;
    Ok(Json(OK))
}

#[derive(Deserialize)]
pub struct EmailChangeRequest {
    pub new_email: String,
    pub captcha: String,
}

pub async fn request_email_change(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<EmailChangeRequest>,
) -> Result<Json<OkResponse>, RpcError> {
    let mut slot = session.lock().await;
    let user_id = slot.user_id.ok_or(RpcError::Unauthorized)?;
    state
        .workflows
        .request_email_change(&mut *slot, &req.captcha, user_id, &req.new_email)
        .await
        .map_err(|e| state.reject(e))?;
    state.metrics.codes_issued.inc();
    Ok(Json(OK))
}

#[derive(Deserialize)]
pub struct EmailChangeConfirm {
    pub new_email: String,
    pub code: String,
}

pub async fn confirm_email_change(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Json(req): Json<EmailChangeConfirm>,
) -> Result<Json<AccountView>, RpcError> {
    let user_id = current_user(&session).await?;
    let account = state
        .workflows
        .confirm_email_change(user_id, &req.new_email, &req.code)
        .map_err(|e| state.reject(e))?;
    Ok(Json(account.into()))
}

async fn current_user(session: &Session) -> Result<AccountId, RpcError> {
    session.lock().await.user_id.ok_or(RpcError::Unauthorized)
}

// ── Content ──────────────────────────────────────────────────────────────

pub async fn daily(State(state): State<AppState>) -> Result<Json<DailyArticle>, RpcError> {
    match state.daily.fetch_daily_content().await {
        Ok(outcome) => {
            state
                .metrics
                .source_attempts_failed
                .inc_by(outcome.failed_attempts as u64);
            Ok(Json(outcome.article))
        }
        Err(e) => {
            match &e {
                SourceError::AllSourcesExhausted { attempts } => {
                    state.metrics.source_attempts_failed.inc_by(*attempts as u64);
                    state.metrics.daily_exhausted.inc();
                }
                SourceError::NoEnabledSources => state.metrics.daily_exhausted.inc(),
                _ => {}
            }
            Err(e.into())
        }
    }
}

// ── Node ─────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub sessions: usize,
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        sessions: state.sessions.len(),
    })
}

pub async fn metrics(State(state): State<AppState>) -> Result<impl IntoResponse, RpcError> {
    let body = state.metrics.encode()?;
    Ok(([(header::CONTENT_TYPE, "text/plain; version=0.0.4")], body))
}
