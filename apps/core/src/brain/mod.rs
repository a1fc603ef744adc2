//! # Brain Module
//!
//! Fast, non-LLM text analysis around a chat turn.
//! Runs before the request (can it be answered locally?) and after it
//! (how should the answer be shown, what should be suggested next).
//!
//! ## Components
//! - `presets`: exact-match canned answers (checked before the network)
//! - `intensity`: persona `!!!!` marker detection and stripping
//! - `suggestions`: keyword classifier for follow-up suggestions

pub mod intensity;
pub mod presets;
pub mod suggestions;

pub use intensity::{IntensitySignal, INTENSITY_MARKER};
pub use presets::{PresetEntry, PresetMatcher};
pub use suggestions::{SuggestionEngine, Topic, TopicRule};
