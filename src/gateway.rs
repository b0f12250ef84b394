//! Remote gateway — typed request/response boundary for the loan backend.
//!
//! One function per collaborator call, no retry logic, no caching. Non-success
//! responses are turned into a human-readable message with the precedence
//! JSON `message` → JSON `error` → raw body text → fixed fallback. The catalog
//! and evaluation calls accept a caller-supplied cancellation token; a fired
//! token yields [`GatewayError::Cancelled`], which callers discard silently
//! instead of surfacing to the user.

use tokio_util::sync::CancellationToken;

use crate::config::{self, MissingSetting};
use crate::models::{ChatReply, ChatRequest, EligibilityRequest, EligibilityResult, LoanType};

/// Shown when a failed response carries no usable message.
pub const FALLBACK_MESSAGE: &str = "Request failed. Please try again.";

// ═══════════════════════════════════════════════════════════
// Errors
// ═══════════════════════════════════════════════════════════

/// Errors from gateway calls.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A required endpoint URL is not configured. Raised at first use.
    #[error(transparent)]
    Config(#[from] MissingSetting),
    /// The caller's cancellation token fired before the call completed.
    #[error("request cancelled")]
    Cancelled,
    /// The backend answered with a non-success status; the payload is the
    /// extracted human-readable message.
    #[error("{0}")]
    Api(String),
    /// The request never produced a usable response (connect failure,
    /// malformed body, ...).
    #[error("network error: {0}")]
    Transport(String),
}

impl GatewayError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Message suitable for a toast or inline error. Backend-supplied
    /// messages and configuration errors pass through; transport noise
    /// collapses to the caller's fallback text.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api(message) if !message.trim().is_empty() => message.clone(),
            Self::Config(missing) => missing.to_string(),
            _ => fallback.to_string(),
        }
    }
}

/// Extract a human-readable message from a failed response body.
/// Precedence: JSON `message`, JSON `error`, raw text, fixed fallback.
/// Blank candidates are skipped.
pub(crate) fn extract_error_message(body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for key in ["message", "error"] {
            if let Some(text) = value.get(key).and_then(|v| v.as_str()) {
                let text = text.trim();
                if !text.is_empty() {
                    return text.to_string();
                }
            }
        }
    }
    let trimmed = body.trim();
    if trimmed.is_empty() {
        FALLBACK_MESSAGE.to_string()
    } else {
        trimmed.to_string()
    }
}

// ═══════════════════════════════════════════════════════════
// Endpoints
// ═══════════════════════════════════════════════════════════

/// Endpoint overrides, mainly for tests. A `None` field falls back to the
/// environment-driven value from [`config`] at call time, so a missing
/// required URL fails at first use rather than at startup.
#[derive(Debug, Clone, Default)]
pub struct Endpoints {
    pub loan_types_url: Option<String>,
    pub check_eligibility_url: Option<String>,
    pub chat_api_url: Option<String>,
    pub chat_user: Option<String>,
}

impl Endpoints {
    fn loan_types_url(&self) -> Result<String, GatewayError> {
        match &self.loan_types_url {
            Some(url) => Ok(url.clone()),
            None => Ok(config::loan_types_url()?),
        }
    }

    fn check_eligibility_url(&self) -> Result<String, GatewayError> {
        match &self.check_eligibility_url {
            Some(url) => Ok(url.clone()),
            None => Ok(config::check_eligibility_url()?),
        }
    }

    fn chat_api_url(&self) -> String {
        match &self.chat_api_url {
            Some(url) => url.trim_end_matches('/').to_string(),
            None => config::chat_api_url(),
        }
    }

    fn chat_user(&self) -> String {
        match &self.chat_user {
            Some(user) => user.clone(),
            None => config::chat_user(),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Gateway
// ═══════════════════════════════════════════════════════════

/// Typed HTTP boundary to the catalog, evaluation, and chat collaborators.
pub struct Gateway {
    client: reqwest::Client,
    endpoints: Endpoints,
}

impl Gateway {
    /// Gateway resolving all endpoints from the environment.
    pub fn new() -> Self {
        Self::with_endpoints(Endpoints::default())
    }

    pub fn with_endpoints(endpoints: Endpoints) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoints,
        }
    }

    /// Fetch the loan-product catalog.
    ///
    /// A non-array (or otherwise malformed) success body degrades to an
    /// empty catalog rather than an error.
    pub async fn fetch_loan_types(
        &self,
        cancel: &CancellationToken,
    ) -> Result<Vec<LoanType>, GatewayError> {
        let url = self.endpoints.loan_types_url()?;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            result = self.client.get(&url).send() => {
                result.map_err(|e| GatewayError::Transport(e.to_string()))?
            }
        };

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        let value: serde_json::Value = response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        if !value.is_array() {
            tracing::warn!("Loan catalog response was not an array, treating as empty");
            return Ok(Vec::new());
        }
        Ok(serde_json::from_value(value).unwrap_or_default())
    }

    /// Evaluate eligibility for a fully-typed request.
    pub async fn check_eligibility(
        &self,
        request: &EligibilityRequest,
        cancel: &CancellationToken,
    ) -> Result<EligibilityResult, GatewayError> {
        let url = self.endpoints.check_eligibility_url()?;
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(GatewayError::Cancelled),
            result = self.client.post(&url).json(request).send() => {
                result.map_err(|e| GatewayError::Transport(e.to_string()))?
            }
        };

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    /// Send one chat turn. The configured placeholder user identifier is
    /// attached here; callers supply only the session and the text.
    pub async fn send_chat_message(
        &self,
        session_id: &str,
        message: &str,
    ) -> Result<ChatReply, GatewayError> {
        let url = self.endpoints.chat_api_url();
        let body = ChatRequest {
            session_id: session_id.to_string(),
            user: self.endpoints.chat_user(),
            message: message.to_string(),
        };

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(api_error(response).await);
        }

        response
            .json()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    /// Delete a chat session on the backend. A 404 means the server never
    /// knew the session; the clear is idempotent, so that counts as success.
    pub async fn clear_chat_session(&self, session_id: &str) -> Result<(), GatewayError> {
        let url = format!("{}/{}", self.endpoints.chat_api_url(), session_id);
        let response = self
            .client
            .delete(&url)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;

        let status = response.status();
        if status.is_success() || status == reqwest::StatusCode::NOT_FOUND {
            return Ok(());
        }
        Err(api_error(response).await)
    }
}

impl Default for Gateway {
    fn default() -> Self {
        Self::new()
    }
}

async fn api_error(response: reqwest::Response) -> GatewayError {
    let body = response.text().await.unwrap_or_default();
    GatewayError::Api(extract_error_message(&body))
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EmploymentType;
    use crate::testutil::serve;
    use axum::http::StatusCode;
    use axum::routing::{delete, get, post};
    use axum::{Json, Router};
    use chrono::NaiveDate;

    fn endpoints_for(base: &str) -> Endpoints {
        Endpoints {
            loan_types_url: Some(format!("{base}/api/Loan/loantypes")),
            check_eligibility_url: Some(format!("{base}/api/Loan/check-eligibility")),
            chat_api_url: Some(format!("{base}/api/Chat")),
            chat_user: Some("test-user".to_string()),
        }
    }

    fn sample_request() -> EligibilityRequest {
        EligibilityRequest {
            loan_type_id: 1,
            requested_amount: 500000.0,
            tenure_in_months: 24,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 14).unwrap(),
            employment_type: EmploymentType::Salaried,
            monthly_income: 50000.0,
            existing_emi: 0.0,
            credit_score: 750,
        }
    }

    // ── Error-message extraction ──

    #[test]
    fn extract_prefers_json_message() {
        let body = r#"{"message":"Loan type not found","error":"ignored"}"#;
        assert_eq!(extract_error_message(body), "Loan type not found");
    }

    #[test]
    fn extract_falls_back_to_json_error() {
        let body = r#"{"message":"   ","error":"Validation failed"}"#;
        assert_eq!(extract_error_message(body), "Validation failed");
    }

    #[test]
    fn extract_falls_back_to_raw_text() {
        assert_eq!(extract_error_message("  upstream timeout  "), "upstream timeout");
    }

    #[test]
    fn extract_falls_back_to_fixed_message() {
        assert_eq!(extract_error_message(""), FALLBACK_MESSAGE);
        assert_eq!(extract_error_message("   \n"), FALLBACK_MESSAGE);
    }

    #[test]
    fn extract_ignores_non_string_fields() {
        let body = r#"{"message":42}"#;
        assert_eq!(extract_error_message(body), r#"{"message":42}"#);
    }

    // ── Catalog ──

    #[tokio::test]
    async fn fetch_loan_types_parses_array() {
        let app = Router::new().route(
            "/api/Loan/loantypes",
            get(|| async {
                Json(serde_json::json!([
                    {"loanTypeId": 1, "loanTypeName": "Personal Loan"},
                    {"loanTypeId": 2, "loanTypeName": "Home Loan (Salaried)"}
                ]))
            }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let types = gateway
            .fetch_loan_types(&CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(types.len(), 2);
        assert_eq!(types[1].loan_type_name, "Home Loan (Salaried)");
    }

    #[tokio::test]
    async fn fetch_loan_types_non_array_is_empty() {
        let app = Router::new().route(
            "/api/Loan/loantypes",
            get(|| async { Json(serde_json::json!({"unexpected": "shape"})) }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let types = gateway
            .fetch_loan_types(&CancellationToken::new())
            .await
            .unwrap();
        assert!(types.is_empty());
    }

    #[tokio::test]
    async fn fetch_loan_types_surfaces_backend_message() {
        let app = Router::new().route(
            "/api/Loan/loantypes",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"message": "Catalog unavailable"})),
                )
            }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let err = gateway
            .fetch_loan_types(&CancellationToken::new())
            .await
            .unwrap_err();
        match err {
            GatewayError::Api(message) => assert_eq!(message, "Catalog unavailable"),
            other => panic!("Expected Api error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn fetch_loan_types_missing_config_names_setting() {
        std::env::remove_var(crate::config::ENV_LOAN_TYPES_URL);
        let gateway = Gateway::new();

        let err = gateway
            .fetch_loan_types(&CancellationToken::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("LOANASSIST_LOAN_TYPES_URL"));
    }

    #[tokio::test]
    async fn fetch_loan_types_cancelled_token_short_circuits() {
        let gateway = Gateway::with_endpoints(endpoints_for("http://127.0.0.1:1"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = gateway.fetch_loan_types(&cancel).await.unwrap_err();
        assert!(err.is_cancelled());
    }

    // ── Eligibility ──

    #[tokio::test]
    async fn check_eligibility_round_trip() {
        let app = Router::new().route(
            "/api/Loan/check-eligibility",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["loanTypeId"], 1);
                assert_eq!(body["existingEMI"], 0.0);
                Json(serde_json::json!({
                    "isEligible": true,
                    "eligibilityStatus": "Approved",
                    "remarks": "Within limits",
                    "calculatedEMI": 21500.45,
                    "emiToIncomePct": 43.0
                }))
            }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let result = gateway
            .check_eligibility(&sample_request(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(result.is_eligible);
        assert_eq!(result.calculated_emi, Some(21500.45));
        assert_eq!(result.emi_to_income_pct, Some(43.0));
    }

    #[tokio::test]
    async fn check_eligibility_failure_uses_error_field() {
        let app = Router::new().route(
            "/api/Loan/check-eligibility",
            post(|| async {
                (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({"error": "Tenure out of range"})),
                )
            }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let err = gateway
            .check_eligibility(&sample_request(), &CancellationToken::new())
            .await
            .unwrap_err();
        assert_eq!(err.user_message("fallback"), "Tenure out of range");
    }

    // ── Chat ──

    #[tokio::test]
    async fn send_chat_message_posts_session_and_user() {
        let app = Router::new().route(
            "/api/Chat",
            post(|Json(body): Json<serde_json::Value>| async move {
                assert_eq!(body["sessionId"], "session-1");
                assert_eq!(body["user"], "test-user");
                assert_eq!(body["message"], "What is my eligibility?");
                Json(serde_json::json!({
                    "sessionId": "session-1",
                    "reply": "You may qualify for a personal loan.",
                    "timestampUtc": "2026-08-26T10:00:00Z"
                }))
            }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let reply = gateway
            .send_chat_message("session-1", "What is my eligibility?")
            .await
            .unwrap();
        assert_eq!(reply.reply, "You may qualify for a personal loan.");
        assert_eq!(reply.timestamp_utc.as_deref(), Some("2026-08-26T10:00:00Z"));
    }

    #[tokio::test]
    async fn clear_chat_session_treats_404_as_success() {
        let app = Router::new().route(
            "/api/Chat/:id",
            delete(|| async { StatusCode::NOT_FOUND }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        assert!(gateway.clear_chat_session("gone-session").await.is_ok());
    }

    #[tokio::test]
    async fn clear_chat_session_other_failures_error() {
        let app = Router::new().route(
            "/api/Chat/:id",
            delete(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "session store down") }),
        );
        let base = serve(app).await;
        let gateway = Gateway::with_endpoints(endpoints_for(&base));

        let err = gateway.clear_chat_session("session-1").await.unwrap_err();
        match err {
            GatewayError::Api(message) => assert_eq!(message, "session store down"),
            other => panic!("Expected Api error, got: {other}"),
        }
    }

    #[tokio::test]
    async fn unreachable_backend_is_transport_error() {
        let gateway = Gateway::with_endpoints(endpoints_for("http://127.0.0.1:1"));
        let err = gateway.send_chat_message("s", "hello").await.unwrap_err();
        assert!(matches!(err, GatewayError::Transport(_)));
        assert_eq!(err.user_message("fallback text"), "fallback text");
    }
}
