//! Synchronous (single document) query responses

use serde_json::Value;
use tracing::warn;

use crate::error::{ClientError, ClientResult};
use crate::http::BufferedResponse;
use crate::protocol::{ContextField, FinalResponse};

/// Status the query endpoint answers with on success, in both modes
pub const QUERY_OK: u16 = 200;

/// Turn a buffered query response into the final document
///
/// The server's document is kept as-is apart from `data.contextMetadata`,
/// which is replaced by the caller's fields.
pub fn handle_sync_response(
    response: BufferedResponse,
    context_metadata: &[ContextField],
) -> ClientResult<FinalResponse> {
    if response.status != QUERY_OK {
        warn!("Sync query returned {}", response.status);
        return Err(ClientError::QueryRejected {
            mode: "sync",
            status: response.status,
            body: response.body,
        });
    }

    let mut document: Value =
        serde_json::from_str(&response.body).map_err(|source| ClientError::Decode {
            what: "sync query response",
            source,
        })?;

    splice_context_metadata(&mut document, context_metadata)?;
    Ok(FinalResponse::new(document))
}

/// Insert or overwrite `data.contextMetadata` when `data` is an object
///
/// An existing key keeps its position; a new one goes last.
pub fn splice_context_metadata(
    document: &mut Value,
    context_metadata: &[ContextField],
) -> ClientResult<()> {
    if let Some(data) = document.get_mut("data").and_then(Value::as_object_mut) {
        let fields = serde_json::to_value(context_metadata).map_err(|source| {
            ClientError::Encode {
                what: "context metadata",
                source,
            }
        })?;
        data.insert("contextMetadata".to_string(), fields);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(body: &str) -> BufferedResponse {
        BufferedResponse {
            status: 200,
            body: body.to_string(),
        }
    }

    #[test]
    fn test_context_appended_to_data() {
        let context = vec![ContextField::new("a", "b")];
        let document = handle_sync_response(ok(r#"{"data":{"foo":"bar"}}"#), &context).unwrap();

        assert_eq!(
            serde_json::to_string(document.document()).unwrap(),
            r#"{"data":{"foo":"bar","contextMetadata":[{"key":"a","value":"b"}]}}"#
        );
    }

    #[test]
    fn test_existing_context_overwritten_in_place() {
        let body = r#"{"message":"ok","data":{"contextMetadata":[{"key":"x","value":"y"}],"answer":"42"}}"#;
        let context = vec![ContextField::new("userId", "1"), ContextField::new("name", "John")];
        let document = handle_sync_response(ok(body), &context).unwrap();

        let data = document.document()["data"].as_object().unwrap();
        let keys: Vec<_> = data.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["contextMetadata", "answer"]);
        assert_eq!(
            data["contextMetadata"],
            json!([{"key": "userId", "value": "1"}, {"key": "name", "value": "John"}])
        );
    }

    #[test]
    fn test_empty_context_still_written() {
        let document = handle_sync_response(ok(r#"{"data":{"answer":"hi"}}"#), &[]).unwrap();
        assert_eq!(document.document()["data"]["contextMetadata"], json!([]));
    }

    #[test]
    fn test_document_without_data_object_untouched() {
        for body in [r#"{"message":"ok"}"#, r#"{"data":null}"#, r#"{"data":"text"}"#, "[1,2]"] {
            let document = handle_sync_response(ok(body), &[ContextField::new("a", "b")]).unwrap();
            let original: Value = serde_json::from_str(body).unwrap();
            assert_eq!(document.document(), &original, "body {body}");
        }
    }

    #[test]
    fn test_non_200_rejected_with_body() {
        let response = BufferedResponse {
            status: 201,
            body: "created?".to_string(),
        };
        match handle_sync_response(response, &[]) {
            Err(ClientError::QueryRejected { mode, status, body }) => {
                assert_eq!(mode, "sync");
                assert_eq!(status, 201);
                assert_eq!(body, "created?");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_invalid_json_body() {
        let result = handle_sync_response(ok("not json"), &[]);
        assert!(matches!(result, Err(ClientError::Decode { .. })));
    }
}
