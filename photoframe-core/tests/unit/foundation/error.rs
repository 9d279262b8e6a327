use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert_eq!(
        PhotoframeError::AuthRequired.to_string(),
        "authentication required"
    );
    assert!(
        PhotoframeError::bad_input("x")
            .to_string()
            .contains("bad input:")
    );
    assert!(
        PhotoframeError::decode("x")
            .to_string()
            .contains("decode error:")
    );
    assert!(
        PhotoframeError::storage("x")
            .to_string()
            .contains("storage unavailable:")
    );
    assert!(
        PhotoframeError::composition("x")
            .to_string()
            .contains("composition error:")
    );
    assert!(
        PhotoframeError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn status_codes_follow_error_kind() {
    assert_eq!(PhotoframeError::AuthRequired.status(), 401);
    assert_eq!(PhotoframeError::bad_input("x").status(), 400);
    assert_eq!(PhotoframeError::decode("x").status(), 400);
    assert_eq!(PhotoframeError::storage("x").status(), 500);
    assert_eq!(PhotoframeError::composition("x").status(), 500);
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = PhotoframeError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
    assert_eq!(err.status(), 500);
}
