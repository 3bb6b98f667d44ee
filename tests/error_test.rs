//! Tests for error codes, display and transience classification.

use std::time::Duration;

use bifrost::{BifrostError, Result};

#[test]
fn display_carries_context() {
    let err = BifrostError::ProviderNotFound("openai-main".to_string());
    assert!(err.to_string().contains("openai-main"));

    let err = BifrostError::UnsupportedFeature {
        operation: "embeddings",
        provider: "chat-only".into(),
    };
    assert!(err.to_string().contains("embeddings"));
    assert!(err.to_string().contains("chat-only"));
}

#[test]
fn missing_variables_lists_names_in_message() {
    let err = BifrostError::MissingVariables {
        names: vec!["alpha".into(), "beta".into()],
    };
    assert_eq!(
        err.to_string(),
        "missing template variables: alpha, beta"
    );
}

#[test]
fn result_alias() {
    fn returns_error() -> Result<()> {
        Err(BifrostError::AuthenticationFailed)
    }
    assert!(returns_error().is_err());
}

// ============================================================================
// Stable codes
// ============================================================================

#[test]
fn codes_are_stable() {
    let cases: Vec<(BifrostError, &str)> = vec![
        (
            BifrostError::ProviderNotFound("x".into()),
            "provider_not_found",
        ),
        (
            BifrostError::ProviderConfiguration("x".into()),
            "provider_configuration",
        ),
        (
            BifrostError::UnsupportedFeature {
                operation: "vision",
                provider: "p".into(),
            },
            "unsupported_feature",
        ),
        (BifrostError::Validation("x".into()), "validation"),
        (
            BifrostError::TemplateNotFound("x".into()),
            "template_not_found",
        ),
        (
            BifrostError::MissingVariables { names: vec![] },
            "missing_variables",
        ),
        (BifrostError::TemplateParse("x".into()), "template_parse"),
        (BifrostError::Http("x".into()), "http"),
        (
            BifrostError::Api {
                status: 404,
                message: "x".into(),
            },
            "api",
        ),
        (
            BifrostError::RateLimited { retry_after: None },
            "rate_limited",
        ),
        (BifrostError::AuthenticationFailed, "authentication_failed"),
        (BifrostError::Stream("x".into()), "stream"),
        (BifrostError::Cache("x".into()), "cache"),
    ];
    for (err, code) in cases {
        assert_eq!(err.code(), code, "code mismatch for {err:?}");
    }
}

// ============================================================================
// Transient error classification
// ============================================================================

#[test]
fn transient_errors() {
    assert!(BifrostError::RateLimited { retry_after: None }.is_transient());
    assert!(
        BifrostError::RateLimited {
            retry_after: Some(Duration::from_secs(1))
        }
        .is_transient()
    );
    assert!(BifrostError::Http("connection reset".into()).is_transient());
    assert!(
        BifrostError::Api {
            status: 503,
            message: "overloaded".into()
        }
        .is_transient()
    );
}

#[test]
fn permanent_errors() {
    assert!(!BifrostError::AuthenticationFailed.is_transient());
    assert!(
        !BifrostError::Api {
            status: 400,
            message: "bad request".into()
        }
        .is_transient()
    );
    assert!(!BifrostError::Validation("bad".into()).is_transient());
    assert!(!BifrostError::ProviderNotFound("x".into()).is_transient());
}
