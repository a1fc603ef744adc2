//! Canned answers for known questions.
//!
//! Lookups are exact after case folding: no trimming, no punctuation
//! tolerance, no fuzzy matching.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::info;

use crate::error::AppError;

/// One question/answer pair as stored in a presets file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PresetEntry {
    pub question: String,
    pub answer: String,
}

const DEFAULT_PRESETS: &[(&str, &str)] = &[
    (
        "who are you?",
        "yo, i'm zihan. design engineer and ai builder based in the US. check [z1han.com](https://z1han.com) ✌️",
    ),
    (
        "what do you do?",
        "design + strategy + ai systems. currently building **biuty.ai** as coo. before that samsung, avatr, grabarz.",
    ),
    (
        "show me your projects",
        "check [z1han.com/works](https://z1han.com/works) – samsung design research, olig agency, skya are some highlights.",
    ),
];

/// Exact-match table from known questions to canned answers.
#[derive(Debug, Clone)]
pub struct PresetMatcher {
    answers: HashMap<String, String>,
}

impl Default for PresetMatcher {
    fn default() -> Self {
        Self::new(
            DEFAULT_PRESETS
                .iter()
                .map(|(question, answer)| PresetEntry {
                    question: question.to_string(),
                    answer: answer.to_string(),
                }),
        )
    }
}

impl PresetMatcher {
    /// Builds a matcher from entries. Later duplicates replace earlier ones.
    pub fn new(entries: impl IntoIterator<Item = PresetEntry>) -> Self {
        let answers = entries
            .into_iter()
            .map(|entry| (entry.question.to_lowercase(), entry.answer))
            .collect();
        Self { answers }
    }

    /// A matcher that never matches.
    pub fn empty() -> Self {
        Self {
            answers: HashMap::new(),
        }
    }

    /// Loads a JSON array of `{ "question", "answer" }` objects.
    pub fn from_json_file(path: &Path) -> Result<Self, AppError> {
        let raw = fs::read_to_string(path)?;
        let entries: Vec<PresetEntry> = serde_json::from_str(&raw)?;
        info!("Loaded {} preset answers from {:?}", entries.len(), path);
        Ok(Self::new(entries))
    }

    /// Canned answer for `input`, if the table has an exact case-insensitive key.
    pub fn lookup(&self, input: &str) -> Option<&str> {
        self.answers.get(&input.to_lowercase()).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.answers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }
}
