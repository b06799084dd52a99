//! The `{timestamp, description, data}` response envelope.

use crate::error::ServiceError;
use crate::model::now_millis;
use serde::Serialize;
use serde_json::Value;

pub const CREATED: &str = "Successfully created";
pub const FETCHED: &str = "Successfully fetched";
pub const FETCHED_CATEGORIES: &str = "Fetched categories";
pub const UPDATED: &str = "Successfully updated";
pub const DELETED: &str = "Successfully deleted";
pub const INVALID_PARAMETER: &str = "Api parameter invalid";
pub const INTERNAL_ERROR: &str = "Internal Server Error";

#[derive(Debug, Serialize)]
pub struct Envelope<T: Serialize> {
    pub timestamp: i64,
    pub description: String,
    pub data: T,
}

/// A response ready to be written: status, body and content type.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub content_type: &'static str,
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Wrap `data` in the envelope.
    pub fn json<T: Serialize>(status: u16, description: &str, data: T) -> Self {
        let envelope = Envelope {
            timestamp: now_millis(),
            description: description.to_string(),
            data,
        };
        match serde_json::to_vec(&envelope) {
            Ok(body) => Self {
                status,
                content_type: "application/json",
                body,
            },
            Err(e) => {
                log::error!("cannot serialize response: {}", e);
                Self::internal_error()
            }
        }
    }

    pub fn ok<T: Serialize>(description: &str, data: T) -> Self {
        Self::json(200, description, data)
    }

    pub fn invalid(message: impl Into<String>) -> Self {
        Self::json(400, INVALID_PARAMETER, message.into())
    }

    pub fn not_found(description: &str) -> Self {
        Self::json(404, description, "Not found")
    }

    pub fn internal_error() -> Self {
        // built by hand so it cannot fail
        let body = format!(
            r#"{{"timestamp":{},"description":"{}","data":null}}"#,
            now_millis(),
            INTERNAL_ERROR
        );
        Self {
            status: 500,
            content_type: "application/json",
            body: body.into_bytes(),
        }
    }

    pub fn no_content() -> Self {
        Self {
            status: 204,
            content_type: "text/plain",
            body: Vec::new(),
        }
    }

    pub fn text(status: u16, body: String) -> Self {
        Self {
            status,
            content_type: "text/plain; version=0.0.4",
            body: body.into_bytes(),
        }
    }

    pub fn from_service_error(err: &ServiceError) -> Self {
        match err {
            ServiceError::Validation(msg) => Self::invalid(msg.clone()),
            ServiceError::InvalidReference(msg) => Self::json(400, msg, Value::Null),
            ServiceError::NotFound(msg) => Self::not_found(msg),
            ServiceError::Conflict(msg) => Self::json(409, msg, Value::Null),
            ServiceError::Integrity(_) | ServiceError::Database(_) => Self::internal_error(),
        }
    }
}

/// Reason phrase for the status line.
pub fn reason_phrase(status: u16) -> &'static str {
    match status {
        200 => "OK",
        204 => "No Content",
        400 => "Bad Request",
        404 => "Not Found",
        405 => "Method Not Allowed",
        409 => "Conflict",
        500 => "Internal Server Error",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(resp: &ApiResponse) -> Value {
        serde_json::from_slice(&resp.body).unwrap()
    }

    #[test]
    fn test_envelope_shape() {
        let resp = ApiResponse::ok(FETCHED, vec![1, 2]);
        let json = body(&resp);
        assert_eq!(resp.status, 200);
        assert_eq!(json["description"], FETCHED);
        assert_eq!(json["data"], serde_json::json!([1, 2]));
        assert!(json["timestamp"].as_i64().unwrap() > 0);
    }

    #[test]
    fn test_internal_error_is_valid_json() {
        let json = body(&ApiResponse::internal_error());
        assert_eq!(json["description"], INTERNAL_ERROR);
        assert!(json["data"].is_null());
    }

    #[test]
    fn test_service_error_mapping() {
        let resp = ApiResponse::from_service_error(&ServiceError::NotFound("Brand Not Found".into()));
        assert_eq!(resp.status, 404);
        assert_eq!(body(&resp)["data"], "Not found");

        let resp = ApiResponse::from_service_error(&ServiceError::InvalidReference(
            "Brand not found".into(),
        ));
        assert_eq!(resp.status, 400);
        assert_eq!(body(&resp)["description"], "Brand not found");

        let resp = ApiResponse::from_service_error(&ServiceError::Integrity("cycle".into()));
        assert_eq!(resp.status, 500);
        assert_eq!(body(&resp)["description"], INTERNAL_ERROR);
    }
}
