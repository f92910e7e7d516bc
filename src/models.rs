use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    pub id: String,
    pub username: String,
    pub picture_url: String,
}

/// A caption placed on a meme picture, in the 800x450 reference frame.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MemeText {
    pub content: String,
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meme {
    pub id: String,
    pub author_id: String,
    pub picture_url: String,
    pub description: String,
    #[serde(deserialize_with = "number_or_string")]
    pub comments_count: u64,
    #[serde(default)]
    pub texts: Vec<MemeText>,
    pub created_at: DateTime<Utc>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub author_id: String,
    pub meme_id: String,
}

/// One fetch unit of a paginated resource.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub page_size: u64,
    pub results: Vec<T>,
}

impl<T> Page<T> {
    /// `ceil(total / page_size)`; a zero page size means there is nothing to page through.
    pub fn total_pages(&self) -> u64 {
        if self.page_size == 0 {
            return 0;
        }
        self.total.div_ceil(self.page_size)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginResponse {
    pub jwt: String,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CreateCommentRequest {
    pub content: String,
}

/// Payload of `POST /memes`, sent as multipart.
#[derive(Debug, Clone)]
pub struct NewMeme {
    pub picture_name: String,
    pub picture: Vec<u8>,
    pub description: String,
    pub texts: Vec<MemeText>,
}

// commentsCount arrives as a JSON number from some backends and as a string from others.
fn number_or_string<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
    }
}

/// Renders a "time ago" label for a timestamp relative to `now`.
pub fn relative_time(created_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - created_at).num_seconds();
    if secs < 0 {
        return "in the future".to_string();
    }
    if secs < 45 {
        return "just now".to_string();
    }

    let (value, unit) = match secs {
        s if s < 3_600 => (s / 60, "minute"),
        s if s < 86_400 => (s / 3_600, "hour"),
        s if s < 604_800 => (s / 86_400, "day"),
        s if s < 2_592_000 => (s / 604_800, "week"),
        s if s < 31_536_000 => (s / 2_592_000, "month"),
        s => (s / 31_536_000, "year"),
    };
    let value = value.max(1);
    if value == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", value, unit)
    }
}
