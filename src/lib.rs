//! inbox-triage - Calendar-aware email triage
//!
//! This crate reads the most recent inbox messages, answers scheduling
//! questions with calendar availability, and drafts replies to urgent mail
//! with a language model.

pub mod config;
pub mod domain;
pub mod providers;
pub mod services;
pub mod storage;
