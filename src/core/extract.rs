//! Tolerant extraction of JSON arrays from free-text model output.
//!
//! The generator is asked for "only JSON" but routinely wraps the array in
//! prose or code fences. The span from the first `[` to the last `]` is
//! taken as the candidate and must parse as an array of `T`.

use serde::de::DeserializeOwned;
use thiserror::Error;

/// Why a response could not be turned into a list
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No JSON array found in response")]
    NoArray,

    #[error("Malformed JSON array: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// The first-`[`-to-last-`]` span of `text`, if there is one.
pub fn find_array_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

/// Locate and parse the embedded JSON array.
pub fn extract_array<T: DeserializeOwned>(text: &str) -> Result<Vec<T>, ExtractError> {
    let span = find_array_span(text).ok_or(ExtractError::NoArray)?;
    Ok(serde_json::from_str(span)?)
}
