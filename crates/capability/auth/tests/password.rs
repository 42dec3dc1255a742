use quill_auth::{AuthError, hash_password, verify_password};

#[test]
fn argon2_hash_verifies() {
    let hash = hash_password("hunter22").expect("hash");
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password(&hash, "hunter22").expect("verify"));
}

#[test]
fn wrong_password_rejected() {
    let hash = hash_password("hunter22").expect("hash");
    assert!(!verify_password(&hash, "hunter23").expect("verify"));
}

#[test]
fn unparseable_hash_is_internal_error() {
    let result = verify_password("plaintext", "plaintext");
    assert!(matches!(result, Err(AuthError::Internal(_))));
}
