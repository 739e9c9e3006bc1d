//! Object storage for uploaded images
//!
//! Two backends: a local directory served by the HTTP server, and any
//! S3-compatible store reached with AWS Signature V4 signed `PUT` requests.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info};
use url::Url;
use uuid::Uuid;

use crate::config::{S3Config, StorageBackend, StorageConfig};
use crate::utils::errors::{Result, WaddleError};

type HmacSha256 = Hmac<Sha256>;

#[async_trait]
pub trait ObjectStorage: Send + Sync {
    /// Store `bytes` under `key`
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;
}

pub type SharedStorage = Arc<dyn ObjectStorage>;

pub fn build_storage(config: &StorageConfig) -> Result<SharedStorage> {
    match config.backend {
        StorageBackend::Local => Ok(Arc::new(LocalStorage::new(&config.local_dir))),
        StorageBackend::S3 => {
            let s3 = config
                .s3
                .as_ref()
                .ok_or_else(|| WaddleError::Config("storage.s3 section is required".to_string()))?;
            Ok(Arc::new(S3Storage::new(s3)?))
        }
    }
}

/// Files on the local disk
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    fn path_for(&self, key: &str) -> Result<PathBuf> {
        if key.is_empty() || key.split('/').any(|part| part.is_empty() || part == "..") {
            return Err(WaddleError::Storage(format!("invalid object key: {key}")));
        }
        Ok(self.root.join(key))
    }
}

#[async_trait]
impl ObjectStorage for LocalStorage {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<()> {
        let path = self.path_for(key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, bytes).await?;
        debug!(path = %path.display(), "Object written to local storage");
        Ok(())
    }
}

/// S3-compatible bucket (AWS, R2, MinIO) using path-style addressing
pub struct S3Storage {
    http: Client,
    endpoint: Url,
    bucket: String,
    region: String,
    access_key_id: String,
    secret_access_key: String,
}

impl S3Storage {
    pub fn new(config: &S3Config) -> Result<Self> {
        Ok(Self {
            http: Client::builder().timeout(Duration::from_secs(60)).build()?,
            endpoint: Url::parse(&config.endpoint)?,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
        })
    }

    fn host(&self) -> Result<String> {
        let host = self
            .endpoint
            .host_str()
            .ok_or_else(|| WaddleError::Config("storage.s3.endpoint has no host".to_string()))?;
        Ok(match self.endpoint.port() {
            Some(port) => format!("{host}:{port}"),
            None => host.to_string(),
        })
    }

    fn canonical_uri(&self, key: &str) -> String {
        let encoded: Vec<String> = key.split('/').map(|s| urlencoding::encode(s).into_owned()).collect();
        format!("/{}/{}", self.bucket, encoded.join("/"))
    }
}

#[async_trait]
impl ObjectStorage for S3Storage {
    async fn put(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()> {
        let host = self.host()?;
        let uri = self.canonical_uri(key);
        let payload_hash = hex::encode(Sha256::digest(&bytes));
        let now = Utc::now();

        let signed = sign_put_request(&SigningInput {
            host: &host,
            canonical_uri: &uri,
            content_type,
            payload_hash: &payload_hash,
            region: &self.region,
            access_key_id: &self.access_key_id,
            secret_access_key: &self.secret_access_key,
            now,
        });

        let url = format!("{}://{}{}", self.endpoint.scheme(), host, uri);
        let response = self
            .http
            .put(url)
            .header("Content-Type", content_type)
            .header("x-amz-content-sha256", &payload_hash)
            .header("x-amz-date", &signed.amz_date)
            .header("Authorization", &signed.authorization)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(WaddleError::Storage(format!("S3 PUT failed with {status}: {body}")));
        }
        debug!(key = %key, "Object uploaded to S3");
        Ok(())
    }
}

struct SigningInput<'a> {
    host: &'a str,
    canonical_uri: &'a str,
    content_type: &'a str,
    payload_hash: &'a str,
    region: &'a str,
    access_key_id: &'a str,
    secret_access_key: &'a str,
    now: DateTime<Utc>,
}

struct SignedHeaders {
    amz_date: String,
    authorization: String,
}

fn hmac(key: &[u8], data: &[u8]) -> Vec<u8> {
    // HMAC accepts keys of any length
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => return Vec::new(),
    };
    mac.update(data);
    mac.finalize().into_bytes().to_vec()
}

fn signing_key(secret: &str, date: &str, region: &str, service: &str) -> Vec<u8> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes());
    let k_region = hmac(&k_date, region.as_bytes());
    let k_service = hmac(&k_region, service.as_bytes());
    hmac(&k_service, b"aws4_request")
}

fn sign_put_request(input: &SigningInput<'_>) -> SignedHeaders {
    let amz_date = input.now.format("%Y%m%dT%H%M%SZ").to_string();
    let date = input.now.format("%Y%m%d").to_string();
    let scope = format!("{date}/{}/s3/aws4_request", input.region);
    let signed_headers = "content-type;host;x-amz-content-sha256;x-amz-date";

    let canonical_request = format!(
        "PUT\n{uri}\n\ncontent-type:{ct}\nhost:{host}\nx-amz-content-sha256:{hash}\nx-amz-date:{amz_date}\n\n{signed_headers}\n{hash}",
        uri = input.canonical_uri,
        ct = input.content_type,
        host = input.host,
        hash = input.payload_hash,
    );
    let string_to_sign = format!(
        "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
        hex::encode(Sha256::digest(canonical_request.as_bytes()))
    );

    let key = signing_key(input.secret_access_key, &date, input.region, "s3");
    let signature = hex::encode(hmac(&key, string_to_sign.as_bytes()));

    SignedHeaders {
        authorization: format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            input.access_key_id
        ),
        amz_date,
    }
}

/// Image formats accepted by the upload endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Webp,
    Gif,
}

impl ImageKind {
    /// Detect the format from the leading bytes of the file
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(ImageKind::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(ImageKind::Png),
            [b'G', b'I', b'F', b'8', ..] => Some(ImageKind::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(ImageKind::Webp),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "jpg",
            ImageKind::Png => "png",
            ImageKind::Webp => "webp",
            ImageKind::Gif => "gif",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ImageKind::Jpeg => "image/jpeg",
            ImageKind::Png => "image/png",
            ImageKind::Webp => "image/webp",
            ImageKind::Gif => "image/gif",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
}

/// Validates and stores uploaded images
#[derive(Clone)]
pub struct UploadService {
    storage: SharedStorage,
    public_base_url: String,
    max_bytes: usize,
}

impl UploadService {
    pub fn new(storage: SharedStorage, config: &StorageConfig) -> Self {
        Self {
            storage,
            public_base_url: config.public_base_url.trim_end_matches('/').to_string(),
            max_bytes: config.max_upload_bytes,
        }
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    pub async fn store_image(&self, bytes: Vec<u8>) -> Result<StoredObject> {
        if bytes.is_empty() {
            return Err(WaddleError::Validation("file is empty".to_string()));
        }
        if bytes.len() > self.max_bytes {
            return Err(WaddleError::PayloadTooLarge(format!(
                "images may be at most {} bytes",
                self.max_bytes
            )));
        }
        let kind = ImageKind::sniff(&bytes).ok_or_else(|| {
            WaddleError::Validation("only jpeg, png, webp and gif images are accepted".to_string())
        })?;

        let key = format!("images/{}.{}", Uuid::new_v4(), kind.extension());
        let size = bytes.len();
        self.storage.put(&key, bytes, kind.content_type()).await?;

        info!(key = %key, size = size, "Image stored");
        Ok(StoredObject {
            url: format!("{}/{}", self.public_base_url, key),
            key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const PNG_HEADER: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

    fn storage_config(dir: &Path, max: usize) -> StorageConfig {
        StorageConfig {
            backend: StorageBackend::Local,
            local_dir: dir.to_string_lossy().into_owned(),
            public_base_url: "http://localhost:8080/uploads/".to_string(),
            max_upload_bytes: max,
            s3: None,
        }
    }

    #[test]
    fn test_image_sniffing() {
        assert_eq!(ImageKind::sniff(&[0xFF, 0xD8, 0xFF, 0xE0]), Some(ImageKind::Jpeg));
        assert_eq!(ImageKind::sniff(&PNG_HEADER), Some(ImageKind::Png));
        assert_eq!(ImageKind::sniff(b"GIF89a"), Some(ImageKind::Gif));
        assert_eq!(ImageKind::sniff(b"RIFF\0\0\0\0WEBPVP8 "), Some(ImageKind::Webp));
        assert_eq!(ImageKind::sniff(b"%PDF-1.7"), None);
        assert_eq!(ImageKind::sniff(b""), None);
    }

    #[tokio::test]
    async fn test_local_upload_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let config = storage_config(dir.path(), 1024);
        let service = UploadService::new(build_storage(&config).unwrap(), &config);

        let mut bytes = PNG_HEADER.to_vec();
        bytes.extend_from_slice(&[0u8; 16]);
        let stored = service.store_image(bytes.clone()).await.unwrap();

        assert!(stored.key.starts_with("images/"));
        assert!(stored.key.ends_with(".png"));
        assert_eq!(stored.url, format!("http://localhost:8080/uploads/{}", stored.key));
        let written = tokio::fs::read(dir.path().join(&stored.key)).await.unwrap();
        assert_eq!(written, bytes);
    }

    #[tokio::test]
    async fn test_upload_limits() {
        let dir = tempfile::tempdir().unwrap();
        let config = storage_config(dir.path(), 10);
        let service = UploadService::new(build_storage(&config).unwrap(), &config);

        let mut big = PNG_HEADER.to_vec();
        big.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            service.store_image(big).await,
            Err(WaddleError::PayloadTooLarge(_))
        ));
        assert!(matches!(
            service.store_image(b"hello".to_vec()).await,
            Err(WaddleError::Validation(_))
        ));
        assert!(matches!(
            service.store_image(Vec::new()).await,
            Err(WaddleError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_local_rejects_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let storage = LocalStorage::new(dir.path());
        assert!(storage.put("../escape.png", vec![1], "image/png").await.is_err());
        assert!(storage.put("images//x.png", vec![1], "image/png").await.is_err());
    }

    #[test]
    fn test_signing_key_matches_aws_example() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20120215",
            "us-east-1",
            "iam",
        );
        assert_eq!(
            hex::encode(key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_put_signature_shape() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let signed = sign_put_request(&SigningInput {
            host: "storage.example.com",
            canonical_uri: "/bucket/images/a.png",
            content_type: "image/png",
            payload_hash: &hex::encode(Sha256::digest(b"data")),
            region: "auto",
            access_key_id: "AKIDEXAMPLE",
            secret_access_key: "secret",
            now,
        });
        assert_eq!(signed.amz_date, "20240501T123000Z");
        assert!(signed
            .authorization
            .starts_with("AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20240501/auto/s3/aws4_request, "));
        assert!(signed
            .authorization
            .contains("SignedHeaders=content-type;host;x-amz-content-sha256;x-amz-date, Signature="));
        let signature = signed.authorization.rsplit("Signature=").next().unwrap();
        assert_eq!(signature.len(), 64);
    }

    #[test]
    fn test_s3_canonical_uri_encodes_segments() {
        let storage = S3Storage::new(&S3Config {
            endpoint: "https://account.r2.cloudflarestorage.com".into(),
            bucket: "media".into(),
            region: "auto".into(),
            access_key_id: "id".into(),
            secret_access_key: "secret".into(),
        })
        .unwrap();
        assert_eq!(storage.canonical_uri("images/a b.png"), "/media/images/a%20b.png");
        assert_eq!(storage.host().unwrap(), "account.r2.cloudflarestorage.com");
    }
}
