//! Typed records decoded from the document store
//!
//! Every record keeps a closed set of known optional fields plus an `extra`
//! map holding whatever else the producer wrote. Decoding never fails for a
//! well-formed JSON object; unusable fields decode as absent.

mod context;
mod conversation;
pub mod lenient;
mod message;

pub use context::{ContextEntry, decode_contexts};
pub use conversation::{
    AnalyticsRecord, Conversation, ConversationSummary, FunctionCatalogEntry, FunctionParameter,
    PREVIEW_CHARS, SchemaVersion, UNNAMED,
};
pub use message::{
    Classification, KnowledgeLevel, Message, PerformanceMetrics, Role, Sentiment, decode_messages,
};
