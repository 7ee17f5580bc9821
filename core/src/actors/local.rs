//! Actors that write to the local filesystem.

use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use image::{ImageFormat, ImageReader};
use serde_json::Value;

use crate::error::{ActionError, ConfigError};
use crate::payload::Subject;
use crate::target::Accepts;
use crate::uid::Uid;

use super::{Actor, ActorResponse};

fn ensure_directory(directory: &Path) -> Result<(), ConfigError> {
    if !directory.is_dir() {
        std::fs::create_dir_all(directory)?;
        tracing::info!(directory = %directory.display(), "Created output directory");
    }
    Ok(())
}

/// Saves an uploaded file into a directory under its own filename.
#[derive(Debug)]
pub struct FileActor {
    directory: PathBuf,
}

impl FileActor {
    /// Creates `directory` when it does not exist yet.
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let directory = directory.into();
        ensure_directory(&directory)?;
        Ok(Self { directory })
    }

    fn fail(&self, reason: impl Into<String>) -> ActionError {
        ActionError::new(self.name(), reason)
    }
}

#[async_trait]
impl Actor for FileActor {
    fn name(&self) -> &str {
        "file"
    }

    fn accepts(&self) -> Accepts {
        Accepts::DATA
    }

    async fn act(&self, subject: Subject<'_>, _uid: &Uid) -> Result<ActorResponse, ActionError> {
        let file = subject
            .file()
            .ok_or_else(|| self.fail("payload is not a file"))?;
        // Only the final path component is used so uploads stay inside the directory.
        let name = Path::new(&file.filename)
            .file_name()
            .ok_or_else(|| self.fail(format!("unusable filename '{}'", file.filename)))?;
        let path = self.directory.join(name);

        tokio::fs::write(&path, &file.bytes)
            .await
            .map_err(|e| self.fail(format!("could not write {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), bytes = file.bytes.len(), "File saved");
        Ok(ActorResponse::message("File saved successfully"))
    }
}

impl fmt::Display for FileActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FileActor with setup: directory: {}", self.directory.display())
    }
}

/// Prepends each object, tagged with its uid, to a JSON array file.
///
/// Every call reads the whole array and rewrites the file. Two requests
/// writing the same file at once can lose one of the entries; give each
/// `JsonActor` its own file and do not share it between instances.
#[derive(Debug)]
pub struct JsonActor {
    jsonfile: PathBuf,
}

impl JsonActor {
    pub fn new(jsonfile: impl Into<PathBuf>) -> Self {
        Self {
            jsonfile: jsonfile.into(),
        }
    }

    fn fail(&self, reason: impl Into<String>) -> ActionError {
        ActionError::new(self.name(), reason)
    }

    async fn read_entries(&self) -> Result<Vec<Value>, ActionError> {
        let raw = match tokio::fs::read(&self.jsonfile).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(self.fail(format!(
                    "could not read {}: {}",
                    self.jsonfile.display(),
                    e
                )))
            }
        };
        match serde_json::from_slice(&raw) {
            Ok(Value::Array(entries)) => Ok(entries),
            Ok(_) => Err(self.fail(format!("{} does not hold a JSON array", self.jsonfile.display()))),
            Err(e) => Err(self.fail(format!("{} is not valid JSON: {}", self.jsonfile.display(), e))),
        }
    }
}

#[async_trait]
impl Actor for JsonActor {
    fn name(&self) -> &str {
        "json"
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError> {
        let mut document = subject
            .to_document()
            .ok_or_else(|| self.fail("object is not a mapping"))?;
        document.insert("uid".to_string(), Value::String(uid.to_string()));

        let mut entries = self.read_entries().await?;
        entries.insert(0, Value::Object(document));

        let encoded = serde_json::to_vec(&entries)
            .map_err(|e| self.fail(format!("could not encode entries: {}", e)))?;
        tokio::fs::write(&self.jsonfile, encoded)
            .await
            .map_err(|e| self.fail(format!("could not write {}: {}", self.jsonfile.display(), e)))?;
        tracing::debug!(file = %self.jsonfile.display(), entries = entries.len(), "Json saved");
        Ok(ActorResponse::message("Json saved successfully"))
    }
}

impl fmt::Display for JsonActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "JsonActor with setup: jsonfile: {}", self.jsonfile.display())
    }
}

/// Decodes the payload as an image and stores it as `<uid>.jpg`.
#[derive(Debug)]
pub struct ImageActor {
    directory: PathBuf,
}

impl ImageActor {
    pub fn new(directory: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let directory = directory.into();
        ensure_directory(&directory)?;
        Ok(Self { directory })
    }

    fn fail(&self, reason: impl Into<String>) -> ActionError {
        ActionError::new(self.name(), reason)
    }
}

fn encode_jpeg(raw: &[u8]) -> Result<Vec<u8>, String> {
    let decoded = ImageReader::new(Cursor::new(raw))
        .with_guessed_format()
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| format!("could not decode image: {}", e))?;

    let mut out = Cursor::new(Vec::new());
    decoded
        .to_rgb8()
        .write_to(&mut out, ImageFormat::Jpeg)
        .map_err(|e| format!("could not encode jpeg: {}", e))?;
    Ok(out.into_inner())
}

#[async_trait]
impl Actor for ImageActor {
    fn name(&self) -> &str {
        "image"
    }

    fn accepts(&self) -> Accepts {
        Accepts::DATA
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError> {
        let file = subject
            .file()
            .ok_or_else(|| self.fail("payload is not a file"))?;
        let raw = file.bytes.clone();

        let jpeg = tokio::task::spawn_blocking(move || encode_jpeg(&raw))
            .await
            .map_err(|e| self.fail(format!("image task failed: {}", e)))?
            .map_err(|reason| self.fail(reason))?;

        let path = self.directory.join(format!("{}.jpg", uid));
        tokio::fs::write(&path, jpeg)
            .await
            .map_err(|e| self.fail(format!("could not write {}: {}", path.display(), e)))?;
        Ok(ActorResponse::Message(format!("Image saved to {}", path.display())))
    }
}

impl fmt::Display for ImageActor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImageActor with setup: directory: {}", self.directory.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::LabelSet;
    use crate::payload::{DataPayload, FilePayload};
    use image::RgbImage;
    use serde_json::json;

    #[tokio::test]
    async fn test_file_actor_creates_directory_and_writes() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let actor = FileActor::new(&dir).unwrap();
        assert!(dir.is_dir());

        let data = DataPayload::File(FilePayload::new("note.txt", b"hello".to_vec()));
        actor.act(Subject::Data(&data), &Uid::generate()).await.unwrap();
        assert_eq!(std::fs::read(dir.join("note.txt")).unwrap(), b"hello");
    }

    #[tokio::test]
    async fn test_file_actor_strips_directories_from_filename() {
        let tmp = tempfile::tempdir().unwrap();
        let actor = FileActor::new(tmp.path()).unwrap();
        let data = DataPayload::File(FilePayload::new("../../escape.txt", b"x".to_vec()));
        actor.act(Subject::Data(&data), &Uid::generate()).await.unwrap();
        assert!(tmp.path().join("escape.txt").exists());
    }

    #[tokio::test]
    async fn test_file_actor_needs_a_file() {
        let tmp = tempfile::tempdir().unwrap();
        let actor = FileActor::new(tmp.path()).unwrap();
        let data = DataPayload::Json(json!({"filename": "a.txt"}));
        let err = actor
            .act(Subject::Data(&data), &Uid::generate())
            .await
            .unwrap_err();
        assert_eq!(err.actor, "file");
    }

    #[tokio::test]
    async fn test_json_actor_prepends_with_uid() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        let actor = JsonActor::new(&path);

        let first = LabelSet::from_query(vec![("n", "1")]);
        let second = DataPayload::Json(json!({"n": 2}));
        actor.act(Subject::Labels(&first), &Uid::from("u1")).await.unwrap();
        actor.act(Subject::Data(&second), &Uid::from("u2")).await.unwrap();

        let stored: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(stored, json!([{"n": 2, "uid": "u2"}, {"n": 1, "uid": "u1"}]));
    }

    #[tokio::test]
    async fn test_json_actor_rejects_non_array_file() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("store.json");
        std::fs::write(&path, b"{\"not\": \"a list\"}").unwrap();
        let actor = JsonActor::new(&path);

        let data = DataPayload::Json(json!({"n": 1}));
        let err = actor
            .act(Subject::Data(&data), &Uid::generate())
            .await
            .unwrap_err();
        assert!(err.reason.contains("does not hold a JSON array"));
    }

    #[tokio::test]
    async fn test_image_actor_writes_jpeg_named_by_uid() {
        let tmp = tempfile::tempdir().unwrap();
        let actor = ImageActor::new(tmp.path()).unwrap();

        let mut png = Cursor::new(Vec::new());
        RgbImage::new(8, 8).write_to(&mut png, ImageFormat::Png).unwrap();
        let data = DataPayload::File(FilePayload::new("pic.png", png.into_inner()));

        actor.act(Subject::Data(&data), &Uid::from("abc123")).await.unwrap();
        let written = std::fs::read(tmp.path().join("abc123.jpg")).unwrap();
        assert_eq!(image::guess_format(&written).unwrap(), ImageFormat::Jpeg);
    }

    #[tokio::test]
    async fn test_image_actor_rejects_garbage() {
        let tmp = tempfile::tempdir().unwrap();
        let actor = ImageActor::new(tmp.path()).unwrap();
        let data = DataPayload::File(FilePayload::new("pic.png", b"nope".to_vec()));
        assert!(actor.act(Subject::Data(&data), &Uid::generate()).await.is_err());
    }
}
