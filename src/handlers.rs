use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
};
use serde::Deserialize;

use crate::{
    AppState,
    auth::{AdminUser, build_session_cookie, clear_session_cookie, session_id_from_headers},
    config::Env,
    error::ApiError,
    models::{
        AckResponse, AnalysisText, AnalyzeRequest, AnalyzeResponse, AnalyzeStatusResponse,
        CaptchaResponse, CreateSubmissionRequest, ErrorResponse, LoginRequest, SessionResponse,
        StorageStatusResponse, Submission, SubmissionCreatedResponse, SubmissionListResponse,
    },
};

/// Upstream chat-completion endpoint the analysis proxy forwards to.
const OPENAI_CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// Token ceiling forwarded with every analysis request.
const ANALYZE_MAX_TOKENS: u32 = 2000;

// --- Upstream Response Shapes ---

/// ChatCompletionResponse
///
/// Minimal struct to deserialize the upstream chat-completion response,
/// capturing only the first completion's message text.
#[derive(Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: String,
}

// --- Handlers ---

/// get_captcha
///
/// [Public Route] Issues a fresh arithmetic challenge. The returned token is
/// signed and time-limited; the client echoes it back with its answer on the
/// admin login request.
#[utoipa::path(
    get,
    path = "/api/captcha",
    responses((status = 200, description = "Challenge issued", body = CaptchaResponse))
)]
pub async fn get_captcha(State(state): State<AppState>) -> Json<CaptchaResponse> {
    let challenge = state.captcha.issue();
    Json(CaptchaResponse {
        question: challenge.question,
        token: challenge.token,
    })
}

/// login
///
/// [Public Route] Admin authentication. The captcha is verified **first** with
/// its own failure path (400), then the username is looked up in the static
/// credential table and the password compared exactly (401 on mismatch, with a
/// message that does not reveal which half was wrong). Success creates a
/// server-side session and sets the session cookie.
#[utoipa::path(
    post,
    path = "/api/admin/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session created", body = SessionResponse),
        (status = 400, description = "Captcha failed", body = ErrorResponse),
        (status = 401, description = "Bad credentials", body = ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<(HeaderMap, Json<SessionResponse>), ApiError> {
    if !state
        .captcha
        .verify(&payload.captcha_token, &payload.captcha_answer)
    {
        return Err(ApiError::Validation(
            "Incorrect captcha. Please try again.".to_string(),
        ));
    }

    let authenticated = !payload.username.is_empty()
        && !payload.password.is_empty()
        && state.config.admin_users.get(&payload.username) == Some(&payload.password);
    if !authenticated {
        return Err(ApiError::Unauthorized(
            "Invalid username or password".to_string(),
        ));
    }

    let session_id = state.sessions.create(&payload.username).await;
    tracing::info!("admin login: {}", payload.username);

    let cookie = build_session_cookie(&session_id, state.config.env == Env::Production);
    let mut headers = HeaderMap::new();
    // The session id is a UUID, always a valid header value.
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).expect("session cookie is a valid header value"),
    );

    Ok((
        headers,
        Json(SessionResponse {
            success: true,
            user: payload.username,
        }),
    ))
}

/// me
///
/// [Admin Route] Reports the current session's user. The `AdminUser` extractor
/// rejects with 401 when no valid session accompanies the request.
#[utoipa::path(
    get,
    path = "/api/admin/me",
    responses(
        (status = 200, description = "Active session", body = SessionResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    )
)]
pub async fn me(AdminUser { user }: AdminUser) -> Json<SessionResponse> {
    Json(SessionResponse {
        success: true,
        user,
    })
}

/// logout
///
/// [Public Route] Destroys whatever session the request presents and clears the
/// cookie. Deliberately not session-gated and always successful: logging out an
/// already-dead session is not an error.
#[utoipa::path(
    post,
    path = "/api/admin/logout",
    responses((status = 200, description = "Session destroyed", body = AckResponse))
)]
pub async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> (HeaderMap, Json<AckResponse>) {
    if let Some(session_id) = session_id_from_headers(&headers) {
        state.sessions.destroy(&session_id).await;
    }

    let cookie = clear_session_cookie(state.config.env == Env::Production);
    let mut response_headers = HeaderMap::new();
    response_headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&cookie).expect("clear cookie is a valid header value"),
    );

    (response_headers, Json(AckResponse { success: true }))
}

/// get_submissions
///
/// [Admin Route] Returns the full submission sequence in insertion order.
/// When the database backend is active and the cache is empty, the store
/// re-attempts one load first (covers a failed startup load).
#[utoipa::path(
    get,
    path = "/api/submissions",
    responses(
        (status = 200, description = "All submissions", body = SubmissionListResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    )
)]
pub async fn get_submissions(
    AdminUser { .. }: AdminUser,
    State(state): State<AppState>,
) -> Json<SubmissionListResponse> {
    Json(SubmissionListResponse {
        success: true,
        data: state.store.snapshot().await,
    })
}

/// create_submission
///
/// [Public Route] The employee feedback form endpoint. Accepts a partial
/// payload (every field optional), assigns id + timestamp server-side, appends
/// to the store and persists.
///
/// **Always-ack policy**: a failed persist is logged and the client still
/// receives 201 — the public form favors availability over durability. The
/// record remains in the in-memory sequence either way.
#[utoipa::path(
    post,
    path = "/api/submissions",
    request_body = CreateSubmissionRequest,
    responses((status = 201, description = "Stored", body = SubmissionCreatedResponse))
)]
pub async fn create_submission(
    State(state): State<AppState>,
    Json(payload): Json<CreateSubmissionRequest>,
) -> (StatusCode, Json<SubmissionCreatedResponse>) {
    let record = Submission::from_request(payload);

    if let Err(e) = state.store.append(record.clone()).await {
        tracing::error!("failed to persist submission {}: {e}", record.id);
    }

    (
        StatusCode::CREATED,
        Json(SubmissionCreatedResponse {
            success: true,
            data: record,
        }),
    )
}

/// clear_submissions
///
/// [Admin Route] Replaces the collection with the empty sequence, in memory and
/// in the durable backend. Same always-ack policy as creation: a failed persist
/// is logged, the clear of the in-memory sequence has already happened.
#[utoipa::path(
    delete,
    path = "/api/submissions",
    responses(
        (status = 200, description = "Cleared", body = SubmissionListResponse),
        (status = 401, description = "No session", body = ErrorResponse)
    )
)]
pub async fn clear_submissions(
    AdminUser { user }: AdminUser,
    State(state): State<AppState>,
) -> Json<SubmissionListResponse> {
    tracing::info!("{user} cleared all submissions");
    if let Err(e) = state.store.replace_all(Vec::new()).await {
        tracing::error!("failed to persist cleared submissions: {e}");
    }
    Json(SubmissionListResponse {
        success: true,
        data: Vec::new(),
    })
}

/// analyze
///
/// [Admin Route] Server-side AI proxy. Validates the prompt, requires a
/// configured upstream credential (503 otherwise), forwards the prompt verbatim
/// as a single user message, and returns the first completion's text. Upstream
/// failures are proxied with their original status and `error.message` where
/// the body provides one.
#[utoipa::path(
    post,
    path = "/api/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Analysis text", body = AnalyzeResponse),
        (status = 400, description = "Missing prompt", body = ErrorResponse),
        (status = 503, description = "AI not configured", body = ErrorResponse)
    )
)]
pub async fn analyze(
    AdminUser { .. }: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, ApiError> {
    if payload.prompt.trim().is_empty() {
        return Err(ApiError::Validation("Missing prompt".to_string()));
    }

    let Some(api_key) = state.config.openai_api_key.as_deref() else {
        return Err(ApiError::ServiceUnavailable(
            "AI not configured. Set OPENAI_API_KEY and restart the server.".to_string(),
        ));
    };

    let client = reqwest::Client::new();
    let response = client
        .post(OPENAI_CHAT_COMPLETIONS_URL)
        .bearer_auth(api_key)
        .json(&serde_json::json!({
            "model": state.config.openai_model,
            "max_tokens": ANALYZE_MAX_TOKENS,
            "messages": [{ "role": "user", "content": payload.prompt }],
        }))
        .send()
        .await
        .map_err(|e| ApiError::Upstream(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let status =
        StatusCode::from_u16(response.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);

    if !status.is_success() {
        // Surface the provider's own message when the error body carries one.
        let body: serde_json::Value = response.json().await.unwrap_or_default();
        let message = body
            .pointer("/error/message")
            .and_then(|m| m.as_str())
            .unwrap_or("OpenAI API error")
            .to_string();
        return Err(ApiError::Upstream(status, message));
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| ApiError::Upstream(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;

    let text = completion
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .unwrap_or_default();

    Ok(Json(AnalyzeResponse {
        success: true,
        data: AnalysisText { text },
    }))
}

/// analyze_status
///
/// [Admin Route] Reports whether the upstream AI credential is loaded and which
/// model requests are forwarded to, without exposing the key itself.
#[utoipa::path(
    get,
    path = "/api/analyze/status",
    responses((status = 200, description = "Proxy status", body = AnalyzeStatusResponse))
)]
pub async fn analyze_status(
    AdminUser { .. }: AdminUser,
    State(state): State<AppState>,
) -> Json<AnalyzeStatusResponse> {
    Json(AnalyzeStatusResponse {
        configured: state.config.openai_api_key.is_some(),
        model: state.config.openai_model.clone(),
    })
}

/// storage_status
///
/// [Public Route] Deployment probe: which persistence strategy is live and how
/// many submissions the cache holds. Public so a hosted instance can be checked
/// without shell access; exposes counts only, never submission content.
#[utoipa::path(
    get,
    path = "/api/debug/storage",
    responses((status = 200, description = "Active storage backend", body = StorageStatusResponse))
)]
pub async fn storage_status(State(state): State<AppState>) -> Json<StorageStatusResponse> {
    Json(StorageStatusResponse {
        storage: state.store.backend_kind().as_str().to_string(),
        in_memory_count: state.store.len().await,
        database_configured: state.config.database_url.is_some(),
    })
}
