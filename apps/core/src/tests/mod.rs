//! Test Module
//!
//! Cross-module tests for the chat pipeline.
//!
//! ## Test Categories
//! - `session_tests`: orchestrator state machine with scripted transports
//! - `markdown_tests`: tokenizer properties (round trip, precedence)
//! - `config_tests`: environment loading and preset files
//! - `integration_tests`: full turns against a mock HTTP endpoint

pub mod session_tests;
