/// Success-response envelope
///
/// Every successful response carries the same shape:
///
/// ```json
/// {
///   "success": true,
///   "message": "Notes Found",
///   "data": { ... },
///   "pagination": { ... }
/// }
/// ```
///
/// `data` and `pagination` are omitted when absent; error responses use the
/// counterpart envelope in the error module.
use cashnotes_shared::pagination::Pagination;
use serde::Serialize;

/// Response envelope for successful requests
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Always true for this envelope
    pub success: bool,

    /// Human-readable outcome
    pub message: String,

    /// Response payload
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,

    /// Page metadata, present on paged listings only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pagination: Option<Pagination>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Envelope with a payload
    pub fn ok(message: impl Into<String>, data: T) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: None,
        }
    }

    /// Envelope with a payload and page metadata
    pub fn paged(message: impl Into<String>, data: T, pagination: Pagination) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            pagination: Some(pagination),
        }
    }

    /// Envelope with no payload (e.g. delete confirmations)
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: None,
            pagination: None,
        }
    }
}
