use std::fmt;

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{self, doc, oid::ObjectId, Bson, Document};
use mongodb::{Client, Collection};
use serde_json::{Map, Value};

use crate::error::{ActionError, ConfigError};
use crate::payload::Subject;
use crate::uid::Uid;

use super::{Actor, ActorResponse};

/// Storage seam for the Mongo actor and its read helpers.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Insert one document and return its id as text.
    async fn insert(&self, document: Map<String, Value>) -> Result<String, ActionError>;

    /// Up to `n` documents matching `query`, newest first, without `_id`.
    async fn latest(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Value>, ActionError>;

    /// The document with the given hex object id, without `_id`.
    async fn get_single(&self, id: &str) -> Result<Option<Value>, ActionError>;

    /// Up to `n` documents matching `query`, newest first, `_id` as a hex string.
    async fn get_ids(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Value>, ActionError>;

    /// Where documents go, without credentials.
    fn location(&self) -> String;
}

fn store_error(context: &str, e: impl fmt::Display) -> ActionError {
    ActionError::new("mongo", format!("{}: {}", context, e))
}

fn to_document(map: Map<String, Value>) -> Result<Document, ActionError> {
    bson::to_document(&Value::Object(map)).map_err(|e| store_error("document not representable", e))
}

fn to_json(document: Document) -> Value {
    Bson::Document(document).into_relaxed_extjson()
}

/// [`DocumentStore`] backed by a MongoDB collection.
pub struct MongoStore {
    collection: Collection<Document>,
    url: String,
    db: String,
}

impl MongoStore {
    /// Builds the client for `mongodb://{usr}:{pwd}@{url}/{db}?retrywrites=false`.
    ///
    /// The driver connects lazily, so an unreachable server shows up on the
    /// first insert rather than here.
    pub async fn connect(usr: &str, pwd: &str, url: &str, db: &str, col: &str) -> Result<Self, ConfigError> {
        let uri = format!("mongodb://{}:{}@{}/{}?retrywrites=false", usr, pwd, url, db);
        let client = Client::with_uri_str(&uri)
            .await
            .map_err(|e| ConfigError::init("mongo", format!("invalid connection settings: {}", e)))?;
        tracing::info!(url = %url, db = %db, collection = %col, "MongoDB client configured");
        Ok(Self {
            collection: client.database(db).collection(col),
            url: url.to_string(),
            db: db.to_string(),
        })
    }

    async fn find_newest(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Document>, ActionError> {
        let cursor = self
            .collection
            .find(to_document(query)?)
            .sort(doc! { "_id": -1 })
            .limit(n)
            .await
            .map_err(|e| store_error("query failed", e))?;
        cursor
            .try_collect()
            .await
            .map_err(|e| store_error("query failed", e))
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn insert(&self, document: Map<String, Value>) -> Result<String, ActionError> {
        let result = self
            .collection
            .insert_one(to_document(document)?)
            .await
            .map_err(|e| store_error("insert failed", e))?;
        Ok(match result.inserted_id {
            Bson::ObjectId(id) => id.to_hex(),
            other => other.to_string(),
        })
    }

    async fn latest(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Value>, ActionError> {
        let documents = self.find_newest(query, n).await?;
        Ok(documents
            .into_iter()
            .map(|mut document| {
                document.remove("_id");
                to_json(document)
            })
            .collect())
    }

    async fn get_single(&self, id: &str) -> Result<Option<Value>, ActionError> {
        let oid = ObjectId::parse_str(id).map_err(|e| store_error("invalid object id", e))?;
        let found = self
            .collection
            .find_one(doc! { "_id": oid })
            .projection(doc! { "_id": 0 })
            .await
            .map_err(|e| store_error("query failed", e))?;
        Ok(found.map(to_json))
    }

    async fn get_ids(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Value>, ActionError> {
        let documents = self.find_newest(query, n).await?;
        Ok(documents
            .into_iter()
            .map(|mut document| {
                if let Some(Bson::ObjectId(id)) = document.get("_id") {
                    let hex = id.to_hex();
                    document.insert("_id", hex);
                }
                to_json(document)
            })
            .collect())
    }

    fn location(&self) -> String {
        format!("{}/{}.{}", self.url, self.db, self.collection.name())
    }
}

/// Inserts each object, with its uid under `"uid"`, as one document.
pub struct MongoActor {
    store: Box<dyn DocumentStore>,
}

impl MongoActor {
    pub fn new(store: Box<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn latest(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Value>, ActionError> {
        self.store.latest(query, n).await
    }

    pub async fn get_single(&self, id: &str) -> Result<Option<Value>, ActionError> {
        self.store.get_single(id).await
    }

    pub async fn get_ids(&self, query: Map<String, Value>, n: i64) -> Result<Vec<Value>, ActionError> {
        self.store.get_ids(query, n).await
    }
}

#[async_trait]
impl Actor for MongoActor {
    fn name(&self) -> &str {
        "mongo"
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError> {
        let mut document = subject
            .to_document()
            .ok_or_else(|| ActionError::new(self.name(), "Data was not a mapping"))?;
        if document.is_empty() {
            return Ok(ActorResponse::message("Empty data, nothing inserted"));
        }
        document.insert("uid".to_string(), Value::String(uid.to_string()));

        let id = self.store.insert(document).await?;
        tracing::debug!(uid = %uid, id = %id, "Document inserted");
        Ok(ActorResponse::Message(format!("Inserted document {}", id)))
    }
}

impl fmt::Display for MongoActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MongoActor with setup: location: {}", self.store.location())
    }
}
