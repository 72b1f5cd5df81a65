//! JSON payloads exchanged with the analysis backend, and the rules for
//! turning a raw response into either a typed payload or an error.

use crate::transport::WireResponse;
use crate::verdict::Verdict;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

pub const DOMAIN_CHECK_PATH: &str = "/api/domain/check";
pub const EMAIL_ANALYZE_PATH: &str = "/api/analyze";
pub const LOGIN_PATH: &str = "/api/auth/login";
pub const REGISTER_PATH: &str = "/api/auth/register";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainCheckRequest {
    pub domain: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailAnalyzeRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    pub body: String,
    pub user_id: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainCheckResult {
    pub domain: String,
    pub status: Verdict,
    #[serde(default)]
    pub confidence: f64,
    #[serde(default)]
    pub message: String,
}

impl DomainCheckResult {
    /// Confidence as a two-decimal percentage, or `None` for error-type verdicts.
    pub fn confidence_percent(&self) -> Option<String> {
        if self.status.shows_confidence() {
            Some(format!("{:.2}%", self.confidence * 100.0))
        } else {
            None
        }
    }
}

/// Email analysis payload. The backend does not publish a schema for it, so
/// it is carried as-is and only inspected for display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EmailAnalysis(pub serde_json::Value);

impl EmailAnalysis {
    pub fn message(&self) -> Option<&str> {
        self.0.get("message").and_then(|m| m.as_str())
    }

    pub fn raw(&self) -> &serde_json::Value {
        &self.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
    pub email: &'a str,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user_id: Option<i64>,
    pub username: Option<String>,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RegisterResponse {
    #[serde(default)]
    pub message: String,
    pub success: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("malformed response body: {0}")]
    Malformed(String),
    #[error("{message}")]
    Server { status: u16, message: String },
}

/// Decode a response: 2xx bodies into `R`, other JSON bodies into a server error.
///
/// Any body that is not JSON is malformed, whatever the status. A JSON error
/// body without a usable `message` yields a message naming the status code.
pub fn decode_response<R: DeserializeOwned>(response: &WireResponse) -> Result<R, ResponseError> {
    if response.is_success() {
        return serde_json::from_str(&response.body)
            .map_err(|e| ResponseError::Malformed(e.to_string()));
    }

    let value: serde_json::Value = serde_json::from_str(&response.body).map_err(|e| {
        ResponseError::Malformed(format!("status {}: {e}", response.status))
    })?;
    let message = server_message(&value)
        .unwrap_or_else(|| format!("request failed with status {}; please try again", response.status));

    Err(ResponseError::Server {
        status: response.status,
        message,
    })
}

/// The server's `message`, verbatim. Empty strings count as absent.
fn server_message(value: &serde_json::Value) -> Option<String> {
    value
        .get("message")
        .and_then(|m| m.as_str())
        .filter(|m| !m.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_request_wire_shape() {
        let request = DomainCheckRequest {
            domain: "example.com".to_string(),
            user_id: 7,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "domain": "example.com", "userId": 7 })
        );
    }

    #[test]
    fn test_email_request_omits_absent_headers() {
        let request = EmailAnalyzeRequest {
            sender: None,
            subject: Some("Invoice".to_string()),
            body: "Pay now".to_string(),
            user_id: 3,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({ "subject": "Invoice", "body": "Pay now", "userId": 3 })
        );
    }

    #[test]
    fn test_decode_success() {
        let response = WireResponse::new(
            200,
            r#"{"domain":"example.com","status":"SAFE","confidence":0.97,"message":"No threats found"}"#,
        );
        let result: DomainCheckResult = decode_response(&response).unwrap();
        assert_eq!(result.status, Verdict::Safe);
        assert_eq!(result.confidence_percent(), Some("97.00%".to_string()));
    }

    #[test]
    fn test_decode_server_message() {
        let response = WireResponse::new(400, r#"{"status":"INVALID_FORMAT","message":"Bad format"}"#);
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert_eq!(
            err,
            ResponseError::Server {
                status: 400,
                message: "Bad format".to_string()
            }
        );
    }

    #[test]
    fn test_decode_server_without_message() {
        let response = WireResponse::new(503, r#"{"error":"unavailable"}"#);
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert!(err.to_string().contains("503"));

        let response = WireResponse::new(500, r#"{"message":""}"#);
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert!(err.to_string().contains("500"));
    }

    #[test]
    fn test_decode_server_message_kept_verbatim() {
        let response = WireResponse::new(400, r#"{"message":"  Bad format \n"}"#);
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert_eq!(
            err,
            ResponseError::Server {
                status: 400,
                message: "  Bad format \n".to_string()
            }
        );

        let response = WireResponse::new(400, r#"{"message":"   "}"#);
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert_eq!(err.to_string(), "   ");
    }

    #[test]
    fn test_decode_non_json_error_body() {
        let response = WireResponse::new(502, "<html>Bad Gateway</html>");
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert!(matches!(err, ResponseError::Malformed(_)));

        let response = WireResponse::new(500, "");
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert!(matches!(err, ResponseError::Malformed(_)));
    }

    #[test]
    fn test_decode_malformed_success_body() {
        let response = WireResponse::new(200, "not json");
        let err = decode_response::<DomainCheckResult>(&response).unwrap_err();
        assert!(matches!(err, ResponseError::Malformed(_)));
    }

    #[test]
    fn test_confidence_hidden_for_error_verdicts() {
        let result = DomainCheckResult {
            domain: "bad..url".to_string(),
            status: Verdict::InvalidFormat,
            confidence: 0.0,
            message: "Malformed domain".to_string(),
        };
        assert_eq!(result.confidence_percent(), None);
    }

    #[test]
    fn test_email_analysis_message() {
        let analysis = EmailAnalysis(serde_json::json!({
            "primaryPredictionLabel": "PHISHING",
            "message": "Email analysis complete."
        }));
        assert_eq!(analysis.message(), Some("Email analysis complete."));
        assert_eq!(EmailAnalysis(serde_json::json!([1, 2])).message(), None);
    }
}
