use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

// --- Core Application Schemas ---

/// Submission
///
/// One employee's structured SWOT feedback record. Immutable once created; the
/// collection as a whole is only ever appended to or replaced wholesale on clear.
/// This is the unit persisted by the storage backends (JSON-encoded, full-array
/// writes) and the primary data structure of the application.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq)]
#[ts(export)]
pub struct Submission {
    /// Creation-timestamp id (epoch milliseconds as a string). Monotonic-ish,
    /// unique enough for an internal tool with human-paced submission rates.
    pub id: String,
    /// Creation instant; serializes as an ISO-8601 string.
    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub email: String,
    pub dept: String,
    pub tenure: String,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub opportunities: Vec<String>,
    pub threats: Vec<String>,
    pub comments: String,
}

impl Submission {
    /// from_request
    ///
    /// Builds the canonical immutable record from a (possibly partial) form payload.
    /// Missing scalar fields default to empty strings and missing list fields to
    /// empty sequences, so the stored shape is always complete.
    pub fn from_request(req: CreateSubmissionRequest) -> Self {
        let now = Utc::now();
        Self {
            id: now.timestamp_millis().to_string(),
            timestamp: now,
            name: req.name,
            email: req.email,
            dept: req.dept,
            tenure: req.tenure,
            strengths: req.strengths,
            weaknesses: req.weaknesses,
            opportunities: req.opportunities,
            threats: req.threats,
            comments: req.comments,
        }
    }
}

// --- Request Payloads (Input Schemas) ---

/// CreateSubmissionRequest
///
/// Input payload for the public feedback form (POST /api/submissions).
/// Every field is optional on the wire; `#[serde(default)]` normalizes absent
/// fields so the handler never has to branch on partial bodies.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateSubmissionRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub dept: String,
    #[serde(default)]
    pub tenure: String,
    #[serde(default)]
    pub strengths: Vec<String>,
    #[serde(default)]
    pub weaknesses: Vec<String>,
    #[serde(default)]
    pub opportunities: Vec<String>,
    #[serde(default)]
    pub threats: Vec<String>,
    #[serde(default)]
    pub comments: String,
}

/// LoginRequest
///
/// Input payload for the admin login endpoint (POST /api/admin/login).
/// The captcha pair is validated before the credentials are even looked at,
/// giving the two failure modes distinct responses (400 vs 401).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub captcha_answer: String,
    #[serde(default)]
    pub captcha_token: String,
}

/// AnalyzeRequest
///
/// Input payload for the AI analysis proxy (POST /api/analyze). The prompt is
/// forwarded verbatim to the upstream chat-completion API.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyzeRequest {
    #[serde(default)]
    pub prompt: String,
}

// --- Response Schemas (Output) ---

/// CaptchaResponse
///
/// Output of GET /api/captcha: a human-readable arithmetic question plus the
/// signed token the client must echo back alongside its answer.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CaptchaResponse {
    pub question: String,
    pub token: String,
}

/// SessionResponse
///
/// Output of POST /api/admin/login and GET /api/admin/me: the authenticated
/// admin username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SessionResponse {
    pub success: bool,
    pub user: String,
}

/// AckResponse
///
/// Minimal `{success:true}` acknowledgment (POST /api/admin/logout).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AckResponse {
    pub success: bool,
}

/// SubmissionListResponse
///
/// Output of GET /api/submissions and DELETE /api/submissions: the full
/// in-memory sequence (empty after a clear).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmissionListResponse {
    pub success: bool,
    pub data: Vec<Submission>,
}

/// SubmissionCreatedResponse
///
/// Output of POST /api/submissions: the stored record, with id and timestamp
/// assigned server-side.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SubmissionCreatedResponse {
    pub success: bool,
    pub data: Submission,
}

/// AnalysisText
///
/// The extracted first-completion text from the upstream AI response.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalysisText {
    pub text: String,
}

/// AnalyzeResponse
///
/// Output of POST /api/analyze.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyzeResponse {
    pub success: bool,
    pub data: AnalysisText,
}

/// AnalyzeStatusResponse
///
/// Output of GET /api/analyze/status: whether the upstream credential is loaded
/// and which model requests will be forwarded to.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AnalyzeStatusResponse {
    pub configured: bool,
    pub model: String,
}

/// StorageStatusResponse
///
/// Output of GET /api/debug/storage: which persistence strategy is live and how
/// many submissions the in-memory cache currently holds. Public on purpose, so a
/// deployment can be checked from the outside without shell access.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct StorageStatusResponse {
    pub storage: String,
    pub in_memory_count: usize,
    pub database_configured: bool,
}

/// ErrorResponse
///
/// The uniform error envelope: `{success:false, error}` with a user-visible message.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
}
