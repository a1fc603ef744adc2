//! Persona intensity marker.
//!
//! The backend persona may open a reply with `!!!!` to signal an "intense"
//! tone. The marker is metadata: it drives presentation and never reaches the
//! conversation history.

use serde::Serialize;

/// Literal prefix the persona uses to flag an intense reply.
pub const INTENSITY_MARKER: &str = "!!!!";

/// Answer text split into what is shown and whether it was flagged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntensitySignal {
    pub display_text: String,
    pub is_intense: bool,
}

/// Detects and strips the intensity marker from accumulated answer text.
///
/// Runs on every partial accumulation. Detection only looks at the prefix,
/// so once a prefix carries the marker every longer prefix does too.
pub fn process(text: &str) -> IntensitySignal {
    match strip_marker(text) {
        Some(rest) => IntensitySignal {
            display_text: rest.to_string(),
            is_intense: true,
        },
        None => IntensitySignal {
            display_text: text.to_string(),
            is_intense: false,
        },
    }
}

/// Returns the text following the marker (and any whitespace after it), or
/// `None` when the left-trimmed text does not start with the marker.
pub fn strip_marker(text: &str) -> Option<&str> {
    text.trim_start()
        .strip_prefix(INTENSITY_MARKER)
        .map(str::trim_start)
}

/// Text suitable for the conversation history: the marker is always removed.
pub fn clean(text: &str) -> &str {
    strip_marker(text).unwrap_or(text)
}
