use std::fmt;

use async_trait::async_trait;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;

use crate::error::ActionError;
use crate::payload::{extension_of, DataPayload, Subject};
use crate::target::Accepts;
use crate::uid::Uid;

use super::{Actor, ActorResponse};

/// Connection settings bound from an `S3` config entry.
#[derive(Clone)]
pub struct S3Settings {
    pub access_key: String,
    pub secret_key: String,
    pub bucket_name: String,
    pub prefix: String,
    pub suffix: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl fmt::Debug for S3Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("S3Settings")
            .field("bucket_name", &self.bucket_name)
            .field("prefix", &self.prefix)
            .field("suffix", &self.suffix)
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

/// Storage seam for the S3 actor.
#[async_trait]
pub trait BlobStore: Send + Sync {
    async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>) -> Result<(), ActionError>;

    /// The bucket objects land in.
    fn bucket(&self) -> &str;
}

/// [`BlobStore`] backed by the AWS SDK.
pub struct S3Store {
    client: Client,
    bucket: String,
}

impl S3Store {
    pub fn new(settings: &S3Settings) -> Self {
        let credentials = Credentials::new(
            settings.access_key.clone(),
            settings.secret_key.clone(),
            None,
            None,
            "librarian",
        );
        let mut config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(settings.region.clone()))
            .credentials_provider(credentials);
        if let Some(endpoint) = &settings.endpoint {
            config = config.endpoint_url(endpoint).force_path_style(true);
        }
        tracing::info!(bucket = %settings.bucket_name, region = %settings.region, "S3 client configured");

        Self {
            client: Client::from_conf(config.build()),
            bucket: settings.bucket_name.clone(),
        }
    }
}

#[async_trait]
impl BlobStore for S3Store {
    async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>) -> Result<(), ActionError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .set_content_type(content_type.map(str::to_string))
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| ActionError::new("S3", format!("upload failed: {}", DisplayErrorContext(&e))))?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }
}

/// Uploads the payload under `prefix + uid + extension + suffix`.
pub struct S3Actor {
    store: Box<dyn BlobStore>,
    prefix: String,
    suffix: String,
}

impl S3Actor {
    pub fn new(store: Box<dyn BlobStore>, prefix: String, suffix: String) -> Self {
        Self { store, prefix, suffix }
    }

    pub fn key_for(&self, uid: &Uid, filename: Option<&str>) -> String {
        let ext = filename.map(extension_of).unwrap_or_default();
        format!("{}{}{}{}", self.prefix, uid, ext, self.suffix)
    }
}

#[async_trait]
impl Actor for S3Actor {
    fn name(&self) -> &str {
        "S3"
    }

    fn accepts(&self) -> Accepts {
        Accepts::DATA
    }

    async fn act(&self, subject: Subject<'_>, uid: &Uid) -> Result<ActorResponse, ActionError> {
        let Subject::Data(data) = subject else {
            return Err(ActionError::new(self.name(), "labels cannot be uploaded"));
        };
        let (body, content_type) = match data {
            DataPayload::File(file) => (file.bytes.clone(), file.content_type.as_deref()),
            DataPayload::Json(value) => {
                let encoded = serde_json::to_vec(value)
                    .map_err(|e| ActionError::new(self.name(), format!("could not encode data: {}", e)))?;
                (Bytes::from(encoded), Some("application/json"))
            }
        };

        let key = self.key_for(uid, data.filename());
        self.store.put(&key, body, content_type).await?;
        tracing::debug!(uid = %uid, bucket = %self.store.bucket(), key = %key, "Object uploaded");
        Ok(ActorResponse::Message(format!(
            "Uploaded to s3://{}/{}",
            self.store.bucket(),
            key
        )))
    }
}

impl fmt::Display for S3Actor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "S3Actor with setup: bucket_name: {}, prefix: {:?}, suffix: {:?}",
            self.store.bucket(),
            self.prefix,
            self.suffix
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::FilePayload;
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    #[derive(Default, Clone)]
    struct MemoryBucket {
        objects: Arc<Mutex<Vec<(String, Bytes, Option<String>)>>>,
    }

    #[async_trait]
    impl BlobStore for MemoryBucket {
        async fn put(&self, key: &str, body: Bytes, content_type: Option<&str>) -> Result<(), ActionError> {
            self.objects
                .lock()
                .unwrap()
                .push((key.to_string(), body, content_type.map(str::to_string)));
            Ok(())
        }

        fn bucket(&self) -> &str {
            "test-bucket"
        }
    }

    fn actor(bucket: &MemoryBucket, prefix: &str, suffix: &str) -> S3Actor {
        S3Actor::new(Box::new(bucket.clone()), prefix.into(), suffix.into())
    }

    #[test]
    fn test_key_derivation() {
        let bucket = MemoryBucket::default();
        let s3 = actor(&bucket, "in/", ".raw");
        let uid = Uid::from("abc");
        assert_eq!(s3.key_for(&uid, Some("cat.png")), "in/abc.png.raw");
        assert_eq!(s3.key_for(&uid, Some("README")), "in/abc.raw");
        assert_eq!(s3.key_for(&uid, None), "in/abc.raw");
    }

    #[tokio::test]
    async fn test_uploads_file_bytes() {
        let bucket = MemoryBucket::default();
        let s3 = actor(&bucket, "", "");
        let data = DataPayload::File(FilePayload::new("photo.jpg", b"jpegbytes".to_vec()));

        let response = s3.act(Subject::Data(&data), &Uid::from("u1")).await.unwrap();
        assert_eq!(response.to_string(), "Uploaded to s3://test-bucket/u1.jpg");

        let objects = bucket.objects.lock().unwrap();
        assert_eq!(objects[0].0, "u1.jpg");
        assert_eq!(&objects[0].1[..], b"jpegbytes");
    }

    #[tokio::test]
    async fn test_uploads_json_as_document() {
        let bucket = MemoryBucket::default();
        let s3 = actor(&bucket, "docs/", "");
        let data = DataPayload::Json(json!({"filename": "a.txt", "val": 1}));

        s3.act(Subject::Data(&data), &Uid::from("u2")).await.unwrap();
        let objects = bucket.objects.lock().unwrap();
        assert_eq!(objects[0].0, "docs/u2.txt");
        assert_eq!(objects[0].2.as_deref(), Some("application/json"));
    }

    #[test]
    fn test_settings_debug_hides_secrets() {
        let settings = S3Settings {
            access_key: "AKIA".into(),
            secret_key: "very-secret".into(),
            bucket_name: "b".into(),
            prefix: String::new(),
            suffix: String::new(),
            region: "us-east-1".into(),
            endpoint: None,
        };
        let shown = format!("{:?}", settings);
        assert!(!shown.contains("very-secret"));
        assert!(!shown.contains("AKIA"));
    }
}
