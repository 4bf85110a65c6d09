//! Tests to ensure error messages are actionable and consistent
//!
//! These tests verify that the failures returned by lifecycle operations and
//! configuration validation name the problem clearly.

use fake_xhr::{FakeXhr, HeaderList, XhrConfig, XhrError, XhrFactory};

#[test]
fn test_config_validation_errors_are_descriptive() {
    let config = XhrConfig {
        chunk_size: 0,
        ..Default::default()
    };
    let result = config.validate();
    assert!(result.is_err(), "Zero chunk_size should fail validation");
    if let Err(e) = result {
        assert_eq!(e.field, "chunk_size");
        assert!(e.message.contains("greater than 0"),
            "Error should mention valid range");
        assert!(e.to_string().contains("chunk_size"));
    }

    assert!(XhrConfig::default().validate().is_ok());
    assert!(XhrFactory::new(config).is_err(), "Factory should validate its config");
}

#[test]
fn test_invalid_state_message() {
    let xhr = FakeXhr::new();
    let err = xhr.send(None).unwrap_err();
    assert_eq!(err.to_string(), "INVALID_STATE_ERR");
    assert_eq!(err.name(), "InvalidStateError");
}

#[test]
fn test_unsafe_header_message_names_header() {
    let xhr = FakeXhr::new();
    xhr.open("GET", "/");
    let err = xhr.set_request_header("Referer", "https://example.com").unwrap_err();
    assert_eq!(err.to_string(), "Refused to set unsafe header \"Referer\"");
}

#[test]
fn test_invalid_body_is_named() {
    let xhr = FakeXhr::new();
    xhr.open("GET", "/");
    xhr.send(None).unwrap();
    let err = xhr.respond(200, HeaderList::new(), vec![0xff_u8]).unwrap_err();
    assert!(matches!(err, XhrError::InvalidBody(_)));
    assert_eq!(err.name(), "InvalidBodyException");
    assert!(err.to_string().ends_with("which is not a string"));
}

#[test]
fn test_error_messages_are_actionable() {
    let errors = [
        XhrError::InvalidState,
        XhrError::UnsafeHeader("Host".to_string()),
        XhrError::RequestDone,
        XhrError::NoHeadersReceived,
        XhrError::InvalidBody("raw bytes".to_string()),
        XhrError::Transport(anyhow::anyhow!("socket closed")),
    ];
    for err in errors {
        assert!(!err.to_string().is_empty(), "Error message should not be empty");
        assert!(err.name().ends_with("Error") || err.name().ends_with("Exception"));
    }
}
