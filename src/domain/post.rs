use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub author_id: i64,
    pub author_username: String,
    pub text: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub attachment: Option<Attachment>,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
}

/// Catalog entry a post points at. A post carries at most one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Attachment {
    Resource(i64),
    Sportswear(i64),
}

impl Attachment {
    pub fn from_db(kind: Option<&str>, id: Option<i64>) -> Option<Self> {
        match (kind, id) {
            (Some("resource"), Some(id)) => Some(Self::Resource(id)),
            (Some("sportswear"), Some(id)) => Some(Self::Sportswear(id)),
            _ => None,
        }
    }

    pub fn as_db(&self) -> (&'static str, i64) {
        match self {
            Self::Resource(id) => ("resource", *id),
            Self::Sportswear(id) => ("sportswear", *id),
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            Self::Resource(id) | Self::Sportswear(id) => *id,
        }
    }

    /// Discriminator used on the wire. The plural "Resources" is what
    /// existing clients expect.
    pub fn wire_type(&self) -> &'static str {
        match self {
            Self::Resource(_) => "Resources",
            Self::Sportswear(_) => "Sportswear",
        }
    }

    /// Parses the `type` field sent by clients when attaching.
    pub fn from_wire(kind: &str, id: i64) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "resources" | "resource" => Some(Self::Resource(id)),
            "sportswear" | "sportswearbrand" => Some(Self::Sportswear(id)),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct NewPost {
    pub author_id: i64,
    pub text: String,
    pub image_url: Option<String>,
    pub video_url: Option<String>,
    pub attachment: Option<Attachment>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LikeState {
    pub count: i64,
    pub liked: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn db_columns_map_to_single_variant() {
        assert_eq!(
            Attachment::from_db(Some("resource"), Some(4)),
            Some(Attachment::Resource(4))
        );
        assert_eq!(
            Attachment::from_db(Some("sportswear"), Some(9)),
            Some(Attachment::Sportswear(9))
        );
        assert_eq!(Attachment::from_db(Some("resource"), None), None);
        assert_eq!(Attachment::from_db(None, Some(3)), None);
        assert_eq!(Attachment::from_db(Some("video"), Some(3)), None);
    }

    #[test]
    fn wire_type_keeps_legacy_plural() {
        assert_eq!(Attachment::Resource(1).wire_type(), "Resources");
        assert_eq!(Attachment::Sportswear(1).wire_type(), "Sportswear");
    }

    #[test]
    fn from_wire_accepts_both_resource_spellings() {
        assert_eq!(
            Attachment::from_wire("Resources", 2),
            Some(Attachment::Resource(2))
        );
        assert_eq!(
            Attachment::from_wire("resource", 2),
            Some(Attachment::Resource(2))
        );
        assert_eq!(
            Attachment::from_wire("Sportswear", 5),
            Some(Attachment::Sportswear(5))
        );
        assert_eq!(Attachment::from_wire("studio", 5), None);
    }
}
