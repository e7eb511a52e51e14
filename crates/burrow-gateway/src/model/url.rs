use jiff::Timestamp;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadRequest {
    pub url: String,
    /// RFC 3339 timestamp. Absent or `null` means the link never expires.
    #[serde(default)]
    pub expire_at: Option<Timestamp>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShortUrlResponse {
    pub id: String,
    pub short_url: String,
}
