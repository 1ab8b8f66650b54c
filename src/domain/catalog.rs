use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resource {
    pub id: i64,
    pub title: String,
    pub youtube_url: String,
    pub thumbnail_url: Option<String>,
}

impl Resource {
    /// Stored thumbnail, or the YouTube poster frame for the linked video.
    pub fn thumbnail(&self) -> Option<String> {
        match self.thumbnail_url.as_deref() {
            Some(url) if !url.is_empty() => Some(url.to_string()),
            _ => youtube_video_id(&self.youtube_url)
                .map(|id| format!("https://img.youtube.com/vi/{}/hqdefault.jpg", id)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SportswearBrand {
    pub id: i64,
    pub brand_name: String,
    pub link: String,
    pub thumbnail_url: Option<String>,
}

/// Extracts the video id from `embed/<id>`, `watch?v=<id>` and `youtu.be/<id>` links.
pub fn youtube_video_id(link: &str) -> Option<String> {
    let url = Url::parse(link).ok()?;
    let segments: Vec<&str> = url
        .path_segments()
        .map(|segments| segments.filter(|s| !s.is_empty()).collect())
        .unwrap_or_default();

    if let Some(pos) = segments.iter().position(|s| *s == "embed") {
        if let Some(id) = segments.get(pos + 1) {
            return Some((*id).to_string());
        }
    }

    if let Some((_, id)) = url.query_pairs().find(|(key, _)| key == "v") {
        if !id.is_empty() {
            return Some(id.into_owned());
        }
    }

    if url.host_str() == Some("youtu.be") {
        return segments.first().map(|id| (*id).to_string());
    }

    None
}
