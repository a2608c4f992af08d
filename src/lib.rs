//! Muse Dashboard - read-only viewer for AI assistant conversation logs
//!
//! This library provides the pieces behind the dashboard:
//! - Lenient decoding of conversation, analytics and context documents
//! - A cached query gateway over a pluggable document store
//! - Timeline assembly and rendering into view models
//! - Optional conversation summaries through a chat completions API
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 HTTP (axum)                          │
//! │   HTML pages  │  JSON API  │  health / ready         │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │   render  │  timeline  │  summary                    │
//! └────────────────────┬────────────────────────────────┘
//!                      │
//! ┌────────────────────▼────────────────────────────────┐
//! │        QueryGateway (TTL cache)                      │
//! │   DocumentStore: MongoDB  │  in-memory               │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod api;
pub mod config;
pub mod error;
pub mod format;
pub mod gateway;
pub mod model;
pub mod render;
pub mod store;
pub mod summary;
pub mod timeline;

pub use config::Config;
pub use error::{Error, Result};
pub use format::TimeFormatter;
pub use gateway::{LoadedConversation, QueryGateway, TitleQuery};
pub use render::{ConversationView, render_conversation};
pub use store::{DocumentStore, MemoryStore, MongoStore, SearchFilter};
pub use summary::Summarizer;
