//! MongoDB-backed document store

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{Bson, Document, doc};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::{Client, Collection};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::{DocumentStore, SearchFilter};
use crate::config::MongoConfig;
use crate::{Error, Result};

const CONVERSATIONS: &str = "conversations";
const CONTEXT: &str = "context";
const ANALYTICS: &str = "analytics";
const APP_NAME: &str = "muse-dashboard";

/// Store reading from the application and feedback databases
///
/// When the connection string cannot be resolved at startup (for example a
/// transient SRV lookup failure), resolution is retried on the next call and
/// each failed call reports a connection failure.
pub struct MongoStore {
    config: MongoConfig,
    handles: OnceCell<Handles>,
}

struct Handles {
    client: Client,
    conversations: Collection<Document>,
    contexts: Collection<Document>,
    analytics: Collection<Document>,
}

impl std::fmt::Debug for MongoStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MongoStore")
            .field("app_database", &self.config.app_database)
            .field("feedback_database", &self.config.feedback_database)
            .field("resolved", &self.handles.initialized())
            .finish_non_exhaustive()
    }
}

impl Handles {
    async fn open(config: &MongoConfig) -> Result<Self> {
        let mut options = ClientOptions::parse(config.uri()).await.map_err(options_error)?;
        options.app_name = Some(APP_NAME.to_string());
        options.connect_timeout = Some(config.timeout);
        options.server_selection_timeout = Some(config.timeout);

        let client = Client::with_options(options)?;
        let app = client.database(&config.app_database);
        let feedback = client.database(&config.feedback_database);

        tracing::debug!(
            app_database = %config.app_database,
            feedback_database = %config.feedback_database,
            timeout_ms = u64::try_from(config.timeout.as_millis()).unwrap_or(u64::MAX),
            "mongodb client created"
        );

        Ok(Self {
            conversations: app.collection(CONVERSATIONS),
            contexts: app.collection(CONTEXT),
            analytics: feedback.collection(ANALYTICS),
            client,
        })
    }
}

/// Classify a connection-string failure: lookups that could succeed later are
/// connection failures, everything else is a configuration error
fn options_error(err: mongodb::error::Error) -> Error {
    match err.kind.as_ref() {
        ErrorKind::DnsResolve { .. } | ErrorKind::Io(_) => {
            Error::ConnectionFailure(format!("cannot resolve MONGO_URI: {err}"))
        }
        _ => Error::Config(format!("invalid MONGO_URI: {err}")),
    }
}

impl MongoStore {
    /// Create a client for the configured deployment
    ///
    /// The driver connects lazily; call [`DocumentStore::ping`] to verify the
    /// deployment is reachable. A connection string whose hosts cannot be
    /// resolved yet does not fail here.
    ///
    /// # Errors
    ///
    /// Returns error if the connection string cannot be parsed
    pub async fn connect(config: &MongoConfig) -> Result<Self> {
        let handles = match Handles::open(config).await {
            Ok(handles) => OnceCell::new_with(Some(handles)),
            Err(e) if e.is_retryable() => {
                tracing::warn!(error = %e, "mongodb deployment not resolvable yet; will retry on demand");
                OnceCell::new()
            }
            Err(e) => return Err(e),
        };

        Ok(Self {
            config: config.clone(),
            handles,
        })
    }

    async fn handles(&self) -> Result<&Handles> {
        self.handles
            .get_or_try_init(|| Handles::open(&self.config))
            .await
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn find_conversation(&self, id: &str) -> Result<Option<Value>> {
        let found = self
            .handles()
            .await?
            .conversations
            .find_one(conversation_query(id))
            .await?;
        Ok(found.map(to_json))
    }

    async fn find_analytics(&self, conversation_id: &str) -> Result<Option<Value>> {
        let found = self
            .handles()
            .await?
            .analytics
            .find_one(doc! { "conversation_id": conversation_id })
            .await?;
        Ok(found.map(to_json))
    }

    async fn find_contexts(&self, conversation_id: &str, context_ids: &[String]) -> Result<Vec<Value>> {
        let cursor = self
            .handles()
            .await?
            .contexts
            .find(context_query(conversation_id, context_ids))
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        Ok(documents.into_iter().map(to_json).collect())
    }

    async fn search_conversations(&self, filter: &SearchFilter) -> Result<Vec<Value>> {
        let cursor = self
            .handles()
            .await?
            .conversations
            .find(search_query(filter))
            .skip(filter.skip)
            .limit(i64::try_from(filter.limit).unwrap_or(i64::MAX))
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;
        tracing::debug!(count = documents.len(), "conversation search complete");
        Ok(documents.into_iter().map(to_json).collect())
    }

    async fn ping(&self) -> Result<()> {
        self.handles()
            .await?
            .client
            .database("admin")
            .run_command(doc! { "ping": 1 })
            .await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "mongodb"
    }
}

fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn conversation_query(id: &str) -> Document {
    doc! { "$or": [{ "id": id }, { "conversation_id": id }] }
}

fn context_query(conversation_id: &str, context_ids: &[String]) -> Document {
    let mut clauses = vec![Bson::Document(doc! { "conversation_id": conversation_id })];
    if !context_ids.is_empty() {
        clauses.insert(0, Bson::Document(doc! { "id": { "$in": context_ids.to_vec() } }));
    }
    doc! { "$or": clauses }
}

/// Build the conversation search query
///
/// The title is matched as an escaped literal. Message-count bounds use
/// `$expr` over the size of `history`.
fn search_query(filter: &SearchFilter) -> Document {
    let mut query = Document::new();

    if let Some(pattern) = filter.title_pattern() {
        query.insert("title", doc! { "$regex": pattern, "$options": "i" });
    }

    let size = doc! { "$cond": [{ "$isArray": "$history" }, { "$size": "$history" }, 0] };
    let mut bounds = Vec::new();
    if let Some(min) = filter.min_messages {
        bounds.push(Bson::Document(doc! { "$gte": [size.clone(), to_i64(min)] }));
    }
    if let Some(max) = filter.max_messages {
        bounds.push(Bson::Document(doc! { "$lte": [size, to_i64(max)] }));
    }
    if !bounds.is_empty() {
        query.insert("$expr", doc! { "$and": bounds });
    }

    let mut range = Document::new();
    if let Some(from) = filter.first_message_from {
        range.insert("$gte", from);
    }
    if let Some(until) = filter.first_message_until {
        range.insert("$lte", until);
    }
    if !range.is_empty() {
        query.insert("history.0.timestamp", range);
    }

    query
}

fn to_i64(n: u64) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}
