use std::collections::HashMap;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_config::Region;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use bytes::Bytes;
use tokio::sync::RwLock;

use crate::config::AppConfig;

/// Write-once blob storage for post images. Returns the public location.
#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn put_image(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String>;
}

#[derive(Clone)]
pub struct ObjectStorage {
    client: Client,
    bucket: String,
    public_base: String,
}

impl ObjectStorage {
    pub async fn new(config: &AppConfig) -> Result<Self> {
        let endpoint = config
            .s3_endpoint
            .clone()
            .ok_or_else(|| anyhow!("missing required env var: S3_ENDPOINT"))?;
        let bucket = config
            .s3_bucket
            .clone()
            .ok_or_else(|| anyhow!("missing required env var: S3_BUCKET"))?;

        let region_provider = RegionProviderChain::first_try(Region::new(config.s3_region.clone()));
        let shared_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .load()
            .await;

        let mut s3_builder = aws_sdk_s3::config::Builder::from(&shared_config)
            .region(shared_config.region().cloned())
            .endpoint_url(endpoint.clone())
            .force_path_style(true);
        if let Some(provider) = shared_config.credentials_provider() {
            s3_builder = s3_builder.credentials_provider(provider);
        }
        let client = Client::from_conf(s3_builder.build());

        let public_base = config
            .s3_public_endpoint
            .clone()
            .unwrap_or(endpoint)
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            bucket,
            public_base,
        })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }
}

#[async_trait]
impl MediaStore for ObjectStorage {
    async fn put_image(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await?;
        Ok(format!("{}/{}/{}", self.public_base, self.bucket, key))
    }
}

#[derive(Default)]
pub struct MemoryMediaStore {
    objects: RwLock<HashMap<String, (String, Bytes)>>,
}

impl MemoryMediaStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, key: &str) -> Option<(String, Bytes)> {
        self.objects.read().await.get(key).cloned()
    }

    pub async fn object_count(&self) -> usize {
        self.objects.read().await.len()
    }
}

#[async_trait]
impl MediaStore for MemoryMediaStore {
    async fn put_image(&self, key: &str, bytes: Bytes, content_type: &str) -> Result<String> {
        self.objects
            .write()
            .await
            .entry(key.to_string())
            .or_insert_with(|| (content_type.to_string(), bytes));
        Ok(format!("memory://{}", key))
    }
}
