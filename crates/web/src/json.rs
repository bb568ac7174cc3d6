//! JSON API response helpers.
//!
//! Construction only — request bodies are handed to the application as text,
//! a general-purpose JSON parser is out of scope for this layer.

use serde_json::{Value, json};

use lantern_http::protocol::{ContentType, Request, Response, Status};

/// A `200 OK` envelope: `{"success": true, "message": ..., "data": ...}`.
pub fn json_response(data: Value, message: &str) -> Response {
    Response::json(json!({ "success": true, "message": message, "data": data }).to_string())
}

/// An error envelope carrying the numeric status:
/// `{"success": false, "error": ..., "status": ...}`.
pub fn json_error(status: Status, message: &str) -> Response {
    Response::new(
        status,
        ContentType::Json,
        json!({ "success": false, "error": message, "status": status.code() }).to_string(),
    )
}

/// Returns the request body as text when the request declares a JSON
/// content type.
pub fn json_payload(request: &Request) -> Option<&str> {
    let content_type = request.header("Content-Type")?;
    if !content_type.contains("application/json") {
        return None;
    }
    request.body().and_then(|body| std::str::from_utf8(body).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::Value;

    fn body_json(response: &Response) -> Value {
        serde_json::from_slice(response.body()).unwrap()
    }

    #[test]
    fn success_envelope() {
        let response = json_response(json!({ "count": 3 }), "listed items");
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.content_type(), ContentType::Json);

        let value = body_json(&response);
        assert_eq!(value["success"], json!(true));
        assert_eq!(value["message"], json!("listed items"));
        assert_eq!(value["data"]["count"], json!(3));
    }

    #[test]
    fn error_envelope_carries_status() {
        let response = json_error(Status::Conflict, "already exists");
        assert_eq!(response.status(), Status::Conflict);

        let value = body_json(&response);
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["error"], json!("already exists"));
        assert_eq!(value["status"], json!(409));
    }

    #[test]
    fn payload_requires_json_content_type() {
        let request = Request::builder()
            .header("Content-Type", "application/json; charset=utf-8")
            .body(&br#"{"ok":true}"#[..])
            .build();
        assert_eq!(json_payload(&request), Some(r#"{"ok":true}"#));

        let request = Request::builder()
            .header("Content-Type", "text/plain")
            .body(&b"{}"[..])
            .build();
        assert_eq!(json_payload(&request), None);

        let request = Request::builder().body(&b"{}"[..]).build();
        assert_eq!(json_payload(&request), None);
    }
}
