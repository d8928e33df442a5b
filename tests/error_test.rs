//! Tests for error types

use sampling_lab::generation::GenerationError;
use sampling_lab::Error;

#[test]
fn test_validation_error() {
    let error = Error::Validation("Prompt must be at least 10 characters".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Invalid request"));
    assert!(error_str.contains("Prompt must be at least 10 characters"));
}

#[test]
fn test_persistence_error() {
    let error = Error::Persistence("connection refused".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Persistence error"));
    assert!(error_str.contains("connection refused"));
}

#[test]
fn test_generation_error_conversion() {
    let error: Error = GenerationError::RateLimited("try later".to_string()).into();
    let error_str = format!("{error}");
    assert!(error_str.contains("Generation failed"));
    assert!(error_str.contains("rate limit exceeded"));
    assert!(matches!(error, Error::Generation(GenerationError::RateLimited(_))));
}

#[test]
fn test_generation_error_labels() {
    assert_eq!(GenerationError::Unauthorized(String::new()).label(), "unauthorized");
    assert_eq!(GenerationError::Network(String::new()).label(), "network");
    assert_eq!(GenerationError::EmptyResponse.label(), "empty_response");
    assert_eq!(GenerationError::Other("x".into()).to_string(), "x");
}

#[test]
fn test_scoring_error() {
    let error = Error::Scoring("index out of bounds".to_string());
    let error_str = format!("{error}");
    assert!(error_str.contains("Scoring failed"));
    assert!(error_str.contains("Please report this issue"));
}

#[test]
fn test_not_found_error() {
    let error = Error::NotFound("Experiment not found: 42".to_string());
    assert!(format!("{error}").contains("Not found"));
}

#[test]
fn test_io_error_conversion() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
    let error: Error = io_error.into();
    let error_str = format!("{error}");
    assert!(error_str.contains("IO error"));
}

#[test]
fn test_serde_error_conversion() {
    let serde_error = serde_json::from_str::<serde_json::Value>("{not json").unwrap_err();
    let error: Error = serde_error.into();
    assert!(format!("{error}").contains("Serialization error"));
}

#[test]
fn test_error_debug() {
    let error = Error::Config("model must not be empty".to_string());
    let debug_str = format!("{error:?}");
    assert!(debug_str.contains("Config"));
}

#[test]
fn test_result_type_alias() {
    #[allow(clippy::unnecessary_wraps)]
    fn returns_result() -> sampling_lab::Result<i32> {
        Ok(42)
    }

    let result = returns_result();
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), 42);
}

#[test]
fn test_result_type_alias_error() {
    fn returns_error() -> sampling_lab::Result<i32> {
        Err(Error::Validation("test error".to_string()))
    }

    let result = returns_error();
    assert!(result.is_err());
}
