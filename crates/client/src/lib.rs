//! Lampstand Client - data-access and caching layer.
//!
//! This crate talks to the Lampstand REST backend on behalf of UI code:
//! - [`gateway`] attaches bearer tokens, unwraps envelopes and refreshes an
//!   expired session once before giving up
//! - [`cache`] keeps read results fresh for a per-resource window and drops
//!   them when a write makes them stale
//! - [`api`] exposes one operation per resource read or write on [`ApiClient`]
//! - [`observe`] wraps operations as watchable query and mutation state
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use lampstand_client::{ApiClient, ClientConfig, MemoryCredentialStore, TopicListParams};
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ClientConfig::from_env()?;
//! let client = ApiClient::new(&config, Arc::new(MemoryCredentialStore::new()))?;
//! client.on_session_expired(|| eprintln!("Session expired. Please log in again."));
//!
//! let topics = client.topics(&TopicListParams::default()).await?;
//! println!("{} topics", topics.len());
//! # Ok(())
//! # }
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod gateway;
pub mod observe;
pub mod session;

pub use api::ApiClient;
pub use api::params::{
    ActivityParams, AdminAnswerParams, AdminQuestionParams, ConversationParams,
    MessageListParams, QuestionListParams, TopicListParams,
};
pub use cache::{MutationKind, QueryCache, QueryFamily, QueryKey, StalenessConfig};
pub use config::{ClientConfig, ConfigError, Environment};
pub use error::{ApiError, Result};
pub use gateway::{ApiRequest, Gateway};
pub use observe::{Mutation, MutationState, Query, QueryState};
pub use session::{
    CredentialStore, FileCredentialStore, MemoryCredentialStore, SessionExpiredHandler,
    StoreError,
};
