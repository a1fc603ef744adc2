//! Follow-up suggestion classification.
//!
//! Picks the suggestion buttons shown under an answer from plain keyword
//! checks on the last answer. Topics are tested in a fixed priority order and
//! the first hit wins.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Topic a suggestion set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Topic {
    /// Nothing has been asked yet.
    Initial,
    /// Work and portfolio (samsung, olig, projects...)
    Projects,
    /// Writing (blog, articles...)
    Blog,
    /// Who the persona is
    Identity,
    /// No keyword matched
    Default,
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl Topic {
    pub fn label(&self) -> &'static str {
        match self {
            Topic::Initial => "initial",
            Topic::Projects => "projects",
            Topic::Blog => "blog",
            Topic::Identity => "identity",
            Topic::Default => "default",
        }
    }
}

/// Keyword rule for one topic.
#[derive(Debug, Clone)]
pub struct TopicRule {
    pub topic: Topic,
    /// Lower-case substrings; any one of them selects the topic.
    pub keywords: Vec<String>,
    pub suggestions: Vec<String>,
}

impl TopicRule {
    pub fn new(topic: Topic, keywords: &[&str], suggestions: &[&str]) -> Self {
        Self {
            topic,
            keywords: to_owned(keywords),
            suggestions: to_owned(suggestions),
        }
    }

    fn matches(&self, lower: &str) -> bool {
        self.keywords.iter().any(|k| lower.contains(k.as_str()))
    }
}

const INITIAL_SUGGESTIONS: &[&str] = &["who are you?", "what do you do?", "show me your projects"];
const DEFAULT_SUGGESTIONS: &[&str] = &[
    "contact info",
    "what are you working on?",
    "recommend something",
];

/// Maps (last answer, turn count) to an ordered list of suggestions.
#[derive(Debug, Clone)]
pub struct SuggestionEngine {
    initial: Vec<String>,
    rules: Vec<TopicRule>,
    fallback: Vec<String>,
}

impl Default for SuggestionEngine {
    fn default() -> Self {
        let rules = vec![
            TopicRule::new(
                Topic::Projects,
                &["samsung", "olig", "project", "works"],
                &["tell me about samsung", "what is olig agency?", "your blogs?"],
            ),
            TopicRule::new(
                Topic::Blog,
                &["blog", "wrote", "article"],
                &["what is ai dlc?", "vibecoding?", "how do you define yourself?"],
            ),
            TopicRule::new(
                Topic::Identity,
                &["zihan", "design", "i'm", "i am"],
                &["your background?", "design philosophy?", "see your works"],
            ),
        ];
        Self::new(
            to_owned(INITIAL_SUGGESTIONS),
            rules,
            to_owned(DEFAULT_SUGGESTIONS),
        )
    }
}

impl SuggestionEngine {
    /// `rules` are checked in the given order.
    pub fn new(initial: Vec<String>, rules: Vec<TopicRule>, fallback: Vec<String>) -> Self {
        Self {
            initial,
            rules,
            fallback,
        }
    }

    /// Topic for the last answer. Turn zero is always [`Topic::Initial`].
    pub fn classify(&self, last_answer: &str, turn_count: usize) -> Topic {
        if turn_count == 0 {
            return Topic::Initial;
        }
        let lower = last_answer.to_lowercase();
        self.rules
            .iter()
            .find(|rule| rule.matches(&lower))
            .map_or(Topic::Default, |rule| rule.topic)
    }

    /// Suggestions for the last answer: `classify`, then that topic's set.
    pub fn suggest(&self, last_answer: &str, turn_count: usize) -> &[String] {
        self.suggestions_for(self.classify(last_answer, turn_count))
    }

    /// The set shown for `topic`. A topic without a rule gets the fallback set.
    pub fn suggestions_for(&self, topic: Topic) -> &[String] {
        match topic {
            Topic::Initial => &self.initial,
            Topic::Default => &self.fallback,
            topic => self
                .rules
                .iter()
                .find(|rule| rule.topic == topic)
                .map_or(&self.fallback, |rule| &rule.suggestions),
        }
    }

    pub fn initial(&self) -> &[String] {
        &self.initial
    }
}

fn to_owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
