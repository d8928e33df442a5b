//! Pre-flight request validation

use crate::grid::{TEMPERATURE_RANGE, TOP_P_RANGE};
use crate::{Error, Result};

/// Reject a request before any record is created.
///
/// Prompt length is counted in characters.
///
/// # Errors
///
/// Returns `Error::Validation` with a user-facing message when the prompt
/// is too short, a parameter list is empty, or a value is out of range.
pub fn validate_request(
    prompt: &str,
    temperatures: &[f64],
    top_ps: &[f64],
    min_prompt_chars: usize,
) -> Result<()> {
    if prompt.is_empty() || prompt.chars().count() < min_prompt_chars {
        return Err(Error::Validation(format!(
            "Prompt must be at least {min_prompt_chars} characters"
        )));
    }

    if temperatures.is_empty() || top_ps.is_empty() {
        return Err(Error::Validation(
            "At least one value must be provided for each parameter".to_string(),
        ));
    }

    if let Some(bad) = temperatures.iter().find(|t| !TEMPERATURE_RANGE.contains(*t)) {
        return Err(Error::Validation(format!(
            "Temperature {bad} is outside {}..={}",
            TEMPERATURE_RANGE.start(),
            TEMPERATURE_RANGE.end()
        )));
    }

    if let Some(bad) = top_ps.iter().find(|p| !TOP_P_RANGE.contains(*p)) {
        return Err(Error::Validation(format!(
            "Top P {bad} is outside {}..={}",
            TOP_P_RANGE.start(),
            TOP_P_RANGE.end()
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROMPT: &str = "Explain quantum computing in simple terms";

    fn message(result: Result<()>) -> String {
        match result {
            Err(Error::Validation(msg)) => msg,
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn test_accepts_valid_request() {
        assert!(validate_request(PROMPT, &[0.0, 2.0], &[0.0, 1.0], 10).is_ok());
    }

    #[test]
    fn test_short_prompt() {
        assert_eq!(
            message(validate_request("too short", &[0.5], &[0.5], 10)),
            "Prompt must be at least 10 characters"
        );
        assert!(validate_request("", &[0.5], &[0.5], 0).is_err());
    }

    #[test]
    fn test_prompt_length_counts_chars() {
        // 10 chars, 20 bytes
        assert!(validate_request("ééééééééé.", &[0.5], &[0.5], 10).is_ok());
    }

    #[test]
    fn test_empty_parameter_lists() {
        let expected = "At least one value must be provided for each parameter";
        assert_eq!(message(validate_request(PROMPT, &[], &[0.5], 10)), expected);
        assert_eq!(message(validate_request(PROMPT, &[0.5], &[], 10)), expected);
    }

    #[test]
    fn test_out_of_range_values() {
        assert!(message(validate_request(PROMPT, &[2.5], &[0.5], 10)).starts_with("Temperature"));
        assert!(message(validate_request(PROMPT, &[0.5], &[1.1], 10)).starts_with("Top P"));
        assert!(validate_request(PROMPT, &[f64::NAN], &[0.5], 10).is_err());
    }
}
