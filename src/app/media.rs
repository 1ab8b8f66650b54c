use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use image::ImageFormat;
use sha2::{Digest, Sha256};

use crate::app::error::{TimelineError, TimelineResult};
use crate::infra::storage::MediaStore;

#[derive(Debug)]
pub struct DecodedImage {
    pub bytes: Bytes,
    pub content_type: &'static str,
    pub extension: &'static str,
}

/// Turns client-supplied image payloads into stored objects.
#[derive(Clone)]
pub struct MediaService {
    media: Arc<dyn MediaStore>,
    max_bytes: usize,
}

impl MediaService {
    pub fn new(media: Arc<dyn MediaStore>, max_bytes: usize) -> Self {
        Self { media, max_bytes }
    }

    /// Stores a `data:image/...;base64,` payload and returns its location.
    pub async fn store_data_url(&self, data_url: &str) -> TimelineResult<String> {
        let image = decode_data_url(data_url, self.max_bytes)?;
        let key = format!(
            "timeline_images/{}.{}",
            hex::encode(Sha256::digest(&image.bytes)),
            image.extension
        );
        let location = self
            .media
            .put_image(&key, image.bytes, image.content_type)
            .await?;
        tracing::info!(key = %key, "stored timeline image");
        Ok(location)
    }
}

pub fn decode_data_url(data_url: &str, max_bytes: usize) -> TimelineResult<DecodedImage> {
    let invalid = || TimelineError::validation("image must be a base64 data URL");

    let rest = data_url.trim().strip_prefix("data:").ok_or_else(invalid)?;
    let (meta, payload) = rest.split_once(',').ok_or_else(invalid)?;
    let mime = meta.strip_suffix(";base64").ok_or_else(invalid)?;
    if !mime.starts_with("image/") {
        return Err(TimelineError::validation("image must have an image/* type"));
    }

    let compact: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    let bytes = STANDARD
        .decode(compact.as_bytes())
        .map_err(|_| TimelineError::validation("image payload is not valid base64"))?;
    if bytes.is_empty() {
        return Err(TimelineError::validation("image payload is empty"));
    }
    if bytes.len() > max_bytes {
        return Err(TimelineError::validation(format!(
            "image exceeds {} bytes",
            max_bytes
        )));
    }

    let (content_type, extension) = match image::guess_format(&bytes) {
        Ok(ImageFormat::Png) => ("image/png", "png"),
        Ok(ImageFormat::Jpeg) => ("image/jpeg", "jpg"),
        Ok(ImageFormat::Gif) => ("image/gif", "gif"),
        Ok(ImageFormat::WebP) => ("image/webp", "webp"),
        _ => return Err(TimelineError::validation("unsupported image format")),
    };

    Ok(DecodedImage {
        bytes: Bytes::from(bytes),
        content_type,
        extension,
    })
}
