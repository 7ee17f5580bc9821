//! Actors: side effects applied to a validated request half.

pub mod local;
pub mod mongo;
pub mod s3;

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;

use crate::args::Arguments;
use crate::error::{ActionError, ConfigError};
use crate::payload::Subject;
use crate::target::Accepts;
use crate::uid::Uid;

pub use local::{FileActor, ImageActor, JsonActor};
pub use mongo::{DocumentStore, MongoActor, MongoStore};
pub use s3::{BlobStore, S3Actor, S3Store, S3Settings};

/// What an actor reports back after acting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ActorResponse {
    Message(String),
    Many(Vec<ActorResponse>),
}

impl ActorResponse {
    pub fn message(text: impl Into<String>) -> Self {
        ActorResponse::Message(text.into())
    }
}

impl fmt::Display for ActorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActorResponse::Message(text) => f.write_str(text),
            ActorResponse::Many(responses) => {
                f.write_str("[")?;
                for (i, response) in responses.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", response)?;
                }
                f.write_str("]")
            }
        }
    }
}

#[async_trait]
pub trait Actor: fmt::Display + Send + Sync {
    /// Short name used when attributing failures.
    fn name(&self) -> &str;

    fn accepts(&self) -> Accepts {
        Accepts::ANY
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError>;
}

/// Does nothing. Takes no arguments.
#[derive(Debug, Default)]
pub struct DummyActor;

#[async_trait]
impl Actor for DummyActor {
    fn name(&self) -> &str {
        "none"
    }

    async fn act(&self, _subject: Subject<'_>, _uid: &Uid) -> Result<ActorResponse, ActionError> {
        Ok(ActorResponse::message("Did nothing"))
    }
}

impl fmt::Display for DummyActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DummyActor")
    }
}

/// Logs what it was given and reports what it would have stored.
#[derive(Debug, Default)]
pub struct PrinterActor {
    extras: Vec<Value>,
}

impl PrinterActor {
    pub fn new(extras: Vec<Value>) -> Self {
        Self { extras }
    }

    fn extras(&self) -> Value {
        Value::Array(self.extras.clone())
    }
}

#[async_trait]
impl Actor for PrinterActor {
    fn name(&self) -> &str {
        "print"
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError> {
        let extras = self.extras();
        tracing::info!(
            target: "librarian::printer",
            uid = %uid,
            target_half = %subject.target(),
            extras = %extras,
            "{}",
            subject
        );
        Ok(ActorResponse::Message(format!(
            "\tDATA: {}\n\tUID: {}\n\t{}",
            subject, uid, extras
        )))
    }
}

impl fmt::Display for PrinterActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PrinterActor with setup: extras: {}", self.extras())
    }
}

/// Runs every child on the same subject and uid, collecting results in order.
#[derive(Default)]
pub struct CompositeActor {
    actors: Vec<Box<dyn Actor>>,
}

impl CompositeActor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, actor: Box<dyn Actor>) {
        self.actors.push(actor);
    }

    pub fn with(mut self, actor: Box<dyn Actor>) -> Self {
        self.push(actor);
        self
    }

    pub fn len(&self) -> usize {
        self.actors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

#[async_trait]
impl Actor for CompositeActor {
    fn name(&self) -> &str {
        "composite"
    }

    fn accepts(&self) -> Accepts {
        self.actors
            .iter()
            .fold(Accepts::ANY, |acc, a| acc.and(a.accepts()))
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError> {
        let mut responses = Vec::with_capacity(self.actors.len());
        for (index, actor) in self.actors.iter().enumerate() {
            let response = actor
                .act(subject, uid)
                .await
                .map_err(|e| e.within(self.name(), index))?;
            responses.push(response);
        }
        Ok(ActorResponse::Many(responses))
    }
}

impl fmt::Display for CompositeActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CompositeActor with Actors:")?;
        for actor in &self.actors {
            write!(f, " [{}]", actor)?;
        }
        Ok(())
    }
}

/// The actor tags a config entry may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorKind {
    None,
    Print,
    File,
    Json,
    Image,
    Mongo,
    S3,
}

impl ActorKind {
    pub const ALL: [ActorKind; 7] = [
        ActorKind::File,
        ActorKind::Image,
        ActorKind::Json,
        ActorKind::S3,
        ActorKind::Mongo,
        ActorKind::Print,
        ActorKind::None,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            ActorKind::None => "none",
            ActorKind::Print => "print",
            ActorKind::File => "file",
            ActorKind::Json => "json",
            ActorKind::Image => "image",
            ActorKind::Mongo => "mongo",
            ActorKind::S3 => "S3",
        }
    }

    /// Request halves this kind can be configured for.
    pub fn accepts(&self) -> Accepts {
        match self {
            ActorKind::File | ActorKind::Image | ActorKind::S3 => Accepts::DATA,
            _ => Accepts::ANY,
        }
    }

    pub fn describe(&self) -> &'static str {
        match self {
            ActorKind::None => "DummyActor\n\tDoes nothing. Takes no arguments.",
            ActorKind::Print => {
                "PrinterActor\n\tLogs information about the object. Great for debugging!\n\
                 \tArgs:\n\t\t*extras: anything extra to include in the output"
            }
            ActorKind::File => {
                "FileActor\n\tSaves an uploaded file under its own filename.\n\
                 \tArgs:\n\t\tdirectory (str): target directory, created if missing"
            }
            ActorKind::Json => {
                "JsonActor\n\tPrepends the object, with its uid, to a JSON array file.\n\
                 \tArgs:\n\t\tjsonfile (str): JSON file; its directory must already exist"
            }
            ActorKind::Image => {
                "ImageActor\n\tDecodes the payload as an image and saves it as <uid>.jpg.\n\
                 \tArgs:\n\t\tdirectory (str): target directory, created if missing"
            }
            ActorKind::Mongo => {
                "MongoActor\n\tInserts the object, with its uid, into a MongoDB collection.\n\
                 \tThe connection string is 'mongodb://{usr}:{pwd}@{url}/{db}'.\n\
                 \tArgs:\n\t\tusr (str): username\n\t\tpwd (str): password\n\
                 \t\turl (str): host[:port]\n\t\tdb (str): database name\n\t\tcol (str): collection name"
            }
            ActorKind::S3 => {
                "S3Actor\n\tUploads the payload to S3 as '<prefix><uid><ext><suffix>'.\n\
                 \tArgs:\n\t\tacess_key (str): access key id (also 'access_key')\n\
                 \t\tsecret_key (str): secret access key\n\t\tbucket_name (str): target bucket\n\
                 \t\tprefix (str): key prefix, default \"\"\n\t\tsuffix (str): key suffix, default \"\"\n\
                 \t\tregion (str): default \"us-east-1\"\n\t\tendpoint (str): custom endpoint, default none"
            }
        }
    }

    pub async fn configure(&self, mut args: Arguments<'_>) -> Result<Box<dyn Actor>, ConfigError> {
        let actor: Box<dyn Actor> = match self {
            ActorKind::None => {
                args.finish()?;
                Box::new(DummyActor)
            }
            ActorKind::Print => {
                let extras = args.rest();
                args.finish()?;
                Box::new(PrinterActor::new(extras))
            }
            ActorKind::File => {
                let directory: String = args.required("directory")?;
                args.finish()?;
                Box::new(FileActor::new(directory)?)
            }
            ActorKind::Json => {
                let jsonfile: String = args.required("jsonfile")?;
                args.finish()?;
                Box::new(JsonActor::new(jsonfile))
            }
            ActorKind::Image => {
                let directory: String = args.required("directory")?;
                args.finish()?;
                Box::new(ImageActor::new(directory)?)
            }
            ActorKind::Mongo => {
                let usr: String = args.required("usr")?;
                let pwd: String = args.required("pwd")?;
                let url: String = args.required("url")?;
                let db: String = args.required("db")?;
                let col: String = args.required("col")?;
                args.finish()?;
                let store = MongoStore::connect(&usr, &pwd, &url, &db, &col).await?;
                Box::new(MongoActor::new(Box::new(store)))
            }
            ActorKind::S3 => {
                let settings = S3Settings {
                    access_key: args.required_aliased("acess_key", "access_key")?,
                    secret_key: args.required("secret_key")?,
                    bucket_name: args.required("bucket_name")?,
                    prefix: args.optional_or("prefix", String::new())?,
                    suffix: args.optional_or("suffix", String::new())?,
                    region: args.optional_or("region", "us-east-1".to_string())?,
                    endpoint: args.optional("endpoint")?.flatten(),
                };
                args.finish()?;
                let store = S3Store::new(&settings);
                Box::new(S3Actor::new(Box::new(store), settings.prefix, settings.suffix))
            }
        };
        Ok(actor)
    }
}

impl FromStr for ActorKind {
    type Err = ConfigError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        if tag == "s3" {
            return Ok(ActorKind::S3);
        }
        ActorKind::ALL
            .into_iter()
            .find(|kind| kind.tag() == tag)
            .ok_or_else(|| ConfigError::UnknownTag {
                kind: "actor",
                tag: tag.to_string(),
            })
    }
}
