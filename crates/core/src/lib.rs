//! Lampstand Core - Shared types library.
//!
//! This crate provides the types exchanged with the Lampstand backend:
//! - topics, questions/answers, discussion messages, activity and dashboard
//!   counters
//! - the response envelopes every endpoint answers with
//! - admin views that annotate questions with status and priority
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no caches. `lampstand-client` builds the data-access layer on top.
//!
//! # Modules
//!
//! - [`types`] - Entity DTOs, newtype IDs and status enums
//! - [`envelope`] - `ApiResponse`, `AuthResponse`, pagination
//! - [`thread`] - Reply-tree construction from flat message lists

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod envelope;
pub mod thread;
pub mod types;

pub use envelope::{ApiResponse, AuthResponse, Page, Pagination};
pub use thread::{ThreadNode, build_threads};
pub use types::*;
