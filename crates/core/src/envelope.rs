//! Response envelopes used by the backend.
//!
//! Every resource endpoint wraps its payload in [`ApiResponse`]. The login and
//! refresh endpoints are the exception: they answer with [`AuthResponse`].

use serde::{Deserialize, Serialize};

use crate::types::User;

/// Fallback message when a failed envelope carries neither `error` nor `message`.
pub const GENERIC_FAILURE: &str = "Request failed";

/// Pagination block attached to list responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub limit: u32,
    pub total: u64,
    pub pages: u32,
}

impl Pagination {
    /// Whether another page follows this one.
    #[must_use]
    pub const fn has_next(&self) -> bool {
        self.page < self.pages
    }
}

/// Standard response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(default = "Option::default", skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> ApiResponse<T> {
    /// Build a successful envelope around `data`.
    #[must_use]
    pub const fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            message: None,
            pagination: None,
        }
    }

    /// Human-readable reason for a failed envelope.
    #[must_use]
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }
}

impl<T> ApiResponse<Vec<T>> {
    /// Collapse a list envelope into a [`Page`]. A missing `data` field is an
    /// empty page.
    #[must_use]
    pub fn into_page(self) -> Page<T> {
        Page {
            items: self.data.unwrap_or_default(),
            pagination: self.pagination,
        }
    }
}

/// One page of a list resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T> Default for Page<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            pagination: None,
        }
    }
}

impl<T> Page<T> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Response from `/auth/login` and `/auth/refresh`.
///
/// Implements `Debug` manually to redact tokens.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<User>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AuthResponse {
    /// Human-readable reason for a rejected login or refresh.
    #[must_use]
    pub fn failure_message(&self) -> String {
        self.error
            .clone()
            .or_else(|| self.message.clone())
            .unwrap_or_else(|| GENERIC_FAILURE.to_string())
    }
}

impl std::fmt::Debug for AuthResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthResponse")
            .field("success", &self.success)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user", &self.user)
            .field("message", &self.message)
            .field("error", &self.error)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_list_envelope_into_page() {
        let json = r#"{
            "success": true,
            "data": [1, 2, 3],
            "pagination": {"page": 1, "limit": 3, "total": 7, "pages": 3}
        }"#;
        let response: ApiResponse<Vec<u32>> = serde_json::from_str(json).unwrap();
        let page = response.into_page();
        assert_eq!(page.items, vec![1, 2, 3]);
        assert!(page.pagination.unwrap().has_next());
    }

    #[test]
    fn test_missing_list_data_is_empty_page() {
        let response: ApiResponse<Vec<u32>> = serde_json::from_str(r#"{"success": true}"#).unwrap();
        assert!(response.into_page().is_empty());
    }

    #[test]
    fn test_failure_message_prefers_error() {
        let response: ApiResponse<()> = serde_json::from_str(
            r#"{"success": false, "error": "Topic not found", "message": "ignored"}"#,
        )
        .unwrap();
        assert_eq!(response.failure_message(), "Topic not found");

        let bare: ApiResponse<()> = serde_json::from_str(r#"{"success": false}"#).unwrap();
        assert_eq!(bare.failure_message(), GENERIC_FAILURE);
    }

    #[test]
    fn test_auth_response_debug_redacts_tokens() {
        let response = AuthResponse {
            success: true,
            token: Some("eyJhbGciOi.super-secret".to_string()),
            refresh_token: Some("refresh-secret".to_string()),
            ..AuthResponse::default()
        };
        let debug = format!("{response:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("super-secret"));
        assert!(!debug.contains("refresh-secret"));
    }
}
