use revu::{
    auth::{
        CONFIRMATION_CODE_LEN, create_token, decode_token, generate_confirmation_code,
        hash_confirmation_code, verify_confirmation_code,
    },
    config::{AppConfig, Env},
    error::ApiError,
};
use uuid::Uuid;

// --- Confirmation codes ---

#[test]
fn test_generated_code_shape() {
    let code = generate_confirmation_code();
    assert_eq!(code.len(), CONFIRMATION_CODE_LEN);
    assert!(code.chars().all(|c| c.is_ascii_hexdigit()));
}

#[test]
fn test_codes_are_unique_per_issue() {
    assert_ne!(generate_confirmation_code(), generate_confirmation_code());
}

#[test]
fn test_code_hash_roundtrip() {
    let code = generate_confirmation_code();
    let hash = hash_confirmation_code(&code).unwrap();

    // The stored value is a PHC string, never the plaintext.
    assert!(hash.starts_with("$argon2"));
    assert!(!hash.contains(&code));

    assert!(verify_confirmation_code(&code, &hash).unwrap());
}

#[test]
fn test_wrong_code_verifies_false_not_err() {
    let hash = hash_confirmation_code(&generate_confirmation_code()).unwrap();
    let other = generate_confirmation_code();
    assert_eq!(verify_confirmation_code(&other, &hash).unwrap(), false);
}

#[test]
fn test_garbage_stored_hash_is_an_internal_error() {
    let result = verify_confirmation_code("whatever", "not-a-phc-string");
    assert!(matches!(result, Err(ApiError::Internal(_))));
}

// --- Access tokens ---

#[test]
fn test_token_roundtrip() {
    let config = AppConfig::default();
    let user_id = Uuid::new_v4();

    let token = create_token(user_id, &config).unwrap();
    let claims = decode_token(&token, &config).unwrap();

    assert_eq!(claims.sub, user_id);
    assert!(claims.exp > claims.iat);
    assert_eq!(
        claims.exp - claims.iat,
        config.token_ttl_secs as usize,
        "expiry must honor the configured TTL"
    );
}

#[test]
fn test_tampered_token_is_rejected() {
    let config = AppConfig::default();
    let token = create_token(Uuid::new_v4(), &config).unwrap();

    let mut tampered = token.clone();
    tampered.pop();
    assert!(matches!(
        decode_token(&tampered, &config),
        Err(ApiError::Unauthorized(_))
    ));
}

#[test]
fn test_token_signed_with_other_secret_is_rejected() {
    let config = AppConfig::default();
    let other = AppConfig {
        jwt_secret: "another-secret-entirely".to_string(),
        ..AppConfig::default()
    };

    let token = create_token(Uuid::new_v4(), &other).unwrap();
    assert!(matches!(
        decode_token(&token, &config),
        Err(ApiError::Unauthorized(_))
    ));
}

// --- Test configuration defaults ---

#[test]
fn test_default_config_targets_local() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.jwt_secret, "super-secure-test-secret-value-local");
    assert_eq!(config.token_ttl_secs, 60 * 60 * 24);
}
