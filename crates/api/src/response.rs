//! The common success envelope.
//!
//! Every route answers `{"success": bool, "message"?: string, "data"?: …}`;
//! building the body in one place keeps the envelope uniform across
//! handlers.

use axum::Json;
use serde::Serialize;
use serde_json::{json, Value};

/// `{"success": true, "data": …}`
pub fn success(data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "data": data }))
}

/// `{"success": true, "message": …, "data": …}`
pub fn success_with_message(message: &str, data: impl Serialize) -> Json<Value> {
    Json(json!({ "success": true, "message": message, "data": data }))
}

/// `{"success": true, "message": …}`
pub fn success_message(message: &str) -> Json<Value> {
    Json(json!({ "success": true, "message": message }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_shape() {
        let Json(body) = success(json!({ "id": 1 }));
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["id"], 1);
        assert!(body.get("message").is_none());
    }

    #[test]
    fn test_success_with_message_shape() {
        let Json(body) = success_with_message("done", json!({ "id": 2 }));
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "done");
        assert_eq!(body["data"]["id"], 2);
    }

    #[test]
    fn test_success_message_shape() {
        let Json(body) = success_message("cancelled");
        assert_eq!(body["success"], true);
        assert_eq!(body["message"], "cancelled");
        assert!(body.get("data").is_none());
    }
}
