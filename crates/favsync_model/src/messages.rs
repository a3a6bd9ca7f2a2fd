//! Protocol messages for favorites sync.

use crate::error::{ModelError, ModelResult};
use crate::record::WireFavorite;
use serde::{Deserialize, Serialize};

/// Push request: the full local snapshot of one user's favorites.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PushRequest {
    /// Owner of the snapshot.
    pub user_id: String,
    /// Every local favorite, each with `is_favorite = true`.
    pub favorites: Vec<WireFavorite>,
}

impl PushRequest {
    /// Creates a new push request.
    pub fn new(user_id: impl Into<String>, favorites: Vec<WireFavorite>) -> Self {
        Self {
            user_id: user_id.into(),
            favorites,
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ModelError::EmptyBody);
        }
        Ok(serde_json::from_slice(bytes)?)
    }
}

/// Pull response: changes since the requested cursor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullResponse {
    /// Server time at which the change set was cut, if the server sent one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub server_timestamp: Option<String>,
    /// Changed favorites; removals carry `is_favorite = false`.
    #[serde(default)]
    pub favorites: Vec<WireFavorite>,
}

impl PullResponse {
    /// Creates a new pull response.
    pub fn new(server_timestamp: Option<String>, favorites: Vec<WireFavorite>) -> Self {
        Self {
            server_timestamp,
            favorites,
        }
    }

    /// Encodes to JSON.
    pub fn encode(&self) -> ModelResult<Vec<u8>> {
        Ok(serde_json::to_vec(self)?)
    }

    /// Decodes from JSON.
    ///
    /// An empty or whitespace-only body is [`ModelError::EmptyBody`];
    /// a JSON `null` is treated the same way.
    pub fn decode(bytes: &[u8]) -> ModelResult<Self> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Err(ModelError::EmptyBody);
        }
        let parsed: Option<Self> = serde_json::from_slice(bytes)?;
        parsed.ok_or(ModelError::EmptyBody)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FavoriteRecord;

    #[test]
    fn pull_response_decode() {
        let body = r#"{
            "serverTimestamp": "2024-01-01T00:00:00Z",
            "favorites": [
                {"userId": "u1", "poiId": "p1", "nombre": "Café", "isFavorite": true},
                {"userId": "u1", "poiId": "p2", "isFavorite": false}
            ]
        }"#;
        let response = PullResponse::decode(body.as_bytes()).unwrap();
        assert_eq!(
            response.server_timestamp.as_deref(),
            Some("2024-01-01T00:00:00Z")
        );
        assert_eq!(response.favorites.len(), 2);
        assert!(response.favorites[0].is_favorite);
        assert!(!response.favorites[1].is_favorite);
    }

    #[test]
    fn pull_response_without_timestamp_or_records() {
        let response = PullResponse::decode(b"{}").unwrap();
        assert_eq!(response, PullResponse::default());
    }

    #[test]
    fn empty_bodies_are_rejected() {
        assert!(matches!(PullResponse::decode(b""), Err(ModelError::EmptyBody)));
        assert!(matches!(PullResponse::decode(b"  \n"), Err(ModelError::EmptyBody)));
        assert!(matches!(PullResponse::decode(b"null"), Err(ModelError::EmptyBody)));
        assert!(matches!(PullResponse::decode(b"<html>"), Err(ModelError::Json(_))));
    }

    #[test]
    fn push_request_encodes_snapshot() {
        let record = FavoriteRecord::new("u1", "p1", "Café");
        let request = PushRequest::new("u1", vec![record.to_wire("t")]);
        let bytes = request.encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["userId"], "u1");
        assert_eq!(json["favorites"][0]["isFavorite"], true);
        assert_eq!(PushRequest::decode(&bytes).unwrap(), request);
    }

    #[test]
    fn empty_push_request_has_empty_list() {
        let bytes = PushRequest::new("u1", Vec::new()).encode().unwrap();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["favorites"], serde_json::json!([]));
    }
}
