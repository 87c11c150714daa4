use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Token lifetime: 5 minutes from issuance.
pub const CAPTCHA_TTL_MS: i64 = 5 * 60 * 1000;

/// CaptchaPayload
///
/// The signed token body: the expected answer and the expiry instant
/// (epoch milliseconds). Field names are kept short because the encoded
/// payload travels on every form submission.
#[derive(Serialize, Deserialize)]
struct CaptchaPayload {
    a: i64,
    exp: i64,
}

/// CaptchaChallenge
///
/// A freshly issued challenge: the human-readable question and the signed token
/// the client must return together with its answer.
#[derive(Debug, Clone)]
pub struct CaptchaChallenge {
    pub question: String,
    pub token: String,
}

/// CaptchaService
///
/// Issues and verifies signed, short-lived arithmetic challenges gating the
/// admin login endpoint. The token is
/// `base64url(JSON{a, exp}) + "." + base64url(HMAC-SHA256(payload))`, keyed by a
/// server-side secret, so correctness depends on signature integrity rather than
/// secrecy of the question, and no server-side challenge state is needed.
///
/// Tokens are **not** invalidated after first use: a captured token+answer pair
/// is replayable until the TTL elapses. Accepted tradeoff of the stateless
/// design for an internal tool.
#[derive(Clone)]
pub struct CaptchaService {
    secret: String,
}

impl CaptchaService {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// issue
    ///
    /// Picks two random single-digit operands (1-9) and returns the question
    /// plus a token encoding their sum, expiring `CAPTCHA_TTL_MS` from now.
    pub fn issue(&self) -> CaptchaChallenge {
        let mut rng = rand::thread_rng();
        let a: i64 = rng.gen_range(1..=9);
        let b: i64 = rng.gen_range(1..=9);
        let expires_at = Utc::now().timestamp_millis() + CAPTCHA_TTL_MS;

        CaptchaChallenge {
            question: format!("What is {} + {}?", a, b),
            token: self.encode_token(a + b, expires_at),
        }
    }

    /// encode_token
    ///
    /// Deterministic token encoding for a given answer and expiry. Public so
    /// tests can mint tokens with known answers or already-elapsed expiries.
    pub fn encode_token(&self, answer: i64, expires_at_ms: i64) -> String {
        let payload = CaptchaPayload {
            a: answer,
            exp: expires_at_ms,
        };
        // A two-field struct of integers cannot fail to serialize.
        let encoded =
            URL_SAFE_NO_PAD.encode(serde_json::to_vec(&payload).expect("payload serializes"));
        let sig = self.sign(&encoded);
        format!("{}.{}", encoded, sig)
    }

    /// verify
    ///
    /// Returns true iff the token is well-formed, carries a valid signature over
    /// the payload, has not expired, and the trimmed user answer string-equals
    /// the encoded answer. Malformed input of any kind is a verification
    /// failure, never a panic.
    pub fn verify(&self, token: &str, user_answer: &str) -> bool {
        let Some((encoded, sig)) = token.split_once('.') else {
            return false;
        };
        // Exactly one separator: a second '.' means a malformed token.
        if encoded.is_empty() || sig.is_empty() || sig.contains('.') {
            return false;
        }

        let Ok(sig_bytes) = URL_SAFE_NO_PAD.decode(sig) else {
            return false;
        };
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(encoded.as_bytes());
        // Constant-time comparison via the Mac trait.
        if mac.verify_slice(&sig_bytes).is_err() {
            return false;
        }

        let Ok(raw) = URL_SAFE_NO_PAD.decode(encoded) else {
            return false;
        };
        let Ok(payload) = serde_json::from_slice::<CaptchaPayload>(&raw) else {
            return false;
        };

        if Utc::now().timestamp_millis() > payload.exp {
            return false;
        }

        user_answer.trim() == payload.a.to_string()
    }

    fn sign(&self, encoded_payload: &str) -> String {
        let mut mac = HmacSha256::new_from_slice(self.secret.as_bytes())
            .expect("HMAC accepts any key length");
        mac.update(encoded_payload.as_bytes());
        URL_SAFE_NO_PAD.encode(mac.finalize().into_bytes())
    }
}
