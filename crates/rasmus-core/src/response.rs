use crate::{CoreError, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Outcome of a single request.
///
/// `completed` records whether the operation reached a defined end state,
/// `success` whether a child process exited with status zero. The
/// correlation id only selects the destination key and is never part of
/// the serialized body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Response {
    #[serde(rename = "Completed")]
    pub completed: bool,

    #[serde(rename = "Success")]
    pub success: bool,

    #[serde(rename = "Output")]
    pub output: String,

    #[serde(rename = "Msg")]
    pub message: String,

    /// Unix seconds at which the response was finalized
    #[serde(rename = "At")]
    pub timestamp: i64,

    #[serde(skip)]
    pub correlation_id: String,
}

impl Response {
    pub const OK: &'static str = "OK";

    /// Fresh response for a request: nothing completed yet, message `OK`
    pub fn for_request(correlation_id: impl Into<String>) -> Self {
        Response {
            completed: false,
            success: false,
            output: String::new(),
            message: Self::OK.to_string(),
            timestamp: 0,
            correlation_id: correlation_id.into(),
        }
    }

    /// Stamp the response with the current time
    pub fn finalize(mut self) -> Self {
        self.timestamp = Utc::now().timestamp();
        self
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(CoreError::Encode)
    }

    /// Decode a response body; the correlation id is left empty
    pub fn decode(payload: &[u8]) -> Result<Self> {
        serde_json::from_slice(payload).map_err(CoreError::MalformedResponse)
    }

    pub fn with_correlation_id(mut self, correlation_id: impl Into<String>) -> Self {
        self.correlation_id = correlation_id.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_new_response_defaults() {
        let response = Response::for_request("a1");

        assert!(!response.completed);
        assert!(!response.success);
        assert_eq!(response.message, "OK");
        assert_eq!(response.correlation_id, "a1");
        assert_eq!(response.timestamp, 0);
    }

    #[test]
    fn test_finalize_sets_timestamp() {
        let before = Utc::now().timestamp();
        let response = Response::for_request("a1").finalize();
        assert!(response.timestamp >= before);
    }

    #[test]
    fn test_encode_field_order_and_no_id() {
        let mut response = Response::for_request("secret-id");
        response.completed = true;
        response.output = "hello\n".to_string();
        response.timestamp = 1_700_000_000;

        let encoded = String::from_utf8(response.encode().unwrap()).unwrap();
        assert_eq!(
            encoded,
            r#"{"Completed":true,"Success":false,"Output":"hello\n","Msg":"OK","At":1700000000}"#
        );
        assert!(!encoded.contains("secret-id"));
    }

    #[test]
    fn test_decode_drops_correlation_id() {
        let response = Response::decode(br#"{"Completed":false,"Success":false,"Output":"","Msg":"Unknown command x","At":5}"#).unwrap();

        assert_eq!(response.message, "Unknown command x");
        assert_eq!(response.timestamp, 5);
        assert!(response.correlation_id.is_empty());
    }

    proptest! {
        #[test]
        fn prop_reencoding_is_byte_identical(
            completed in any::<bool>(),
            success in any::<bool>(),
            output in ".*",
            message in ".*",
            timestamp in any::<i64>(),
        ) {
            let response = Response { completed, success, output, message, timestamp, correlation_id: String::new() };
            let first = response.encode().unwrap();
            let second = Response::decode(&first).unwrap().encode().unwrap();
            prop_assert_eq!(first, second);
        }
    }
}
