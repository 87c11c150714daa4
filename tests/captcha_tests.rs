use chrono::Utc;
use swot_portal::captcha::{CAPTCHA_TTL_MS, CaptchaService};

fn service() -> CaptchaService {
    CaptchaService::new("test-captcha-secret")
}

fn future_expiry() -> i64 {
    Utc::now().timestamp_millis() + CAPTCHA_TTL_MS
}

#[test]
fn test_round_trip_verifies() {
    let service = service();
    let token = service.encode_token(12, future_expiry());

    assert!(service.verify(&token, "12"));
}

#[test]
fn test_answer_is_trimmed_before_comparison() {
    let service = service();
    let token = service.encode_token(7, future_expiry());

    assert!(service.verify(&token, "  7  "));
    assert!(service.verify(&token, "7\n"));
}

#[test]
fn test_wrong_answer_fails() {
    let service = service();
    let token = service.encode_token(9, future_expiry());

    assert!(!service.verify(&token, "8"));
    assert!(!service.verify(&token, ""));
    assert!(!service.verify(&token, "nine"));
}

#[test]
fn test_expired_token_fails_even_with_correct_answer() {
    let service = service();
    let token = service.encode_token(5, Utc::now().timestamp_millis() - 1_000);

    assert!(!service.verify(&token, "5"));
}

#[test]
fn test_tampered_payload_fails() {
    let service = service();
    let token = service.encode_token(4, future_expiry());
    let (_, sig) = token.split_once('.').unwrap();

    // Re-encode a payload claiming a different answer but keep the old signature.
    let forged_payload = {
        use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
        URL_SAFE_NO_PAD.encode(format!(
            r#"{{"a":1,"exp":{}}}"#,
            Utc::now().timestamp_millis() + 60_000
        ))
    };
    let forged = format!("{}.{}", forged_payload, sig);

    assert!(!service.verify(&forged, "1"));
}

#[test]
fn test_tampered_signature_fails() {
    let service = service();
    let token = service.encode_token(4, future_expiry());
    let (payload, _) = token.split_once('.').unwrap();

    let forged = format!("{}.AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA", payload);

    assert!(!service.verify(&forged, "4"));
}

#[test]
fn test_token_signed_with_different_secret_fails() {
    let issuer = CaptchaService::new("secret-a");
    let verifier = CaptchaService::new("secret-b");
    let token = issuer.encode_token(6, future_expiry());

    assert!(issuer.verify(&token, "6"));
    assert!(!verifier.verify(&token, "6"));
}

#[test]
fn test_malformed_tokens_fail_without_panicking() {
    let service = service();

    for token in [
        "",
        ".",
        "no-separator",
        "a.b.c",
        "!!!not-base64!!!.alsobad",
        "aGVsbG8.d29ybGQ", // valid base64, not JSON
    ] {
        assert!(!service.verify(token, "3"), "token {token:?} should fail");
    }
}

#[test]
fn test_issue_produces_verifiable_challenge() {
    let service = service();
    let challenge = service.issue();

    // The question has the fixed "What is A + B?" shape; recover the answer.
    let digits: Vec<i64> = challenge
        .question
        .split(|c: char| !c.is_ascii_digit())
        .filter(|s| !s.is_empty())
        .map(|s| s.parse().unwrap())
        .collect();
    assert_eq!(digits.len(), 2);
    let answer = digits[0] + digits[1];
    assert!((2..=18).contains(&answer));

    assert!(service.verify(&challenge.token, &answer.to_string()));
    assert!(!service.verify(&challenge.token, &(answer + 1).to_string()));
}
