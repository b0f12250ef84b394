use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "Loan Assistant";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Environment keys for the backend endpoints.
pub const ENV_LOAN_TYPES_URL: &str = "LOANASSIST_LOAN_TYPES_URL";
pub const ENV_CHECK_ELIGIBILITY_URL: &str = "LOANASSIST_CHECK_ELIGIBILITY_URL";
pub const ENV_CHAT_API_URL: &str = "LOANASSIST_CHAT_API_URL";
pub const ENV_CHAT_USER: &str = "LOANASSIST_CHAT_USER";

/// Fallbacks for the optional chat settings.
pub const DEFAULT_CHAT_API_URL: &str = "http://localhost:5000/api/Chat";
pub const DEFAULT_CHAT_USER: &str = "default-user";

/// File name (under the app data dir) holding the persisted chat session id.
pub const SESSION_ID_FILE: &str = "loan-eligibility-chat-session-id";

/// A required endpoint setting is missing or blank.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{0} is not configured. Please set it in your environment.")]
pub struct MissingSetting(pub &'static str);

/// Get the application data directory.
/// ~/LoanAssistant/ on all platforms (user-visible).
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    home.join("LoanAssistant")
}

/// Path of the persisted chat session identifier.
pub fn session_id_path() -> PathBuf {
    app_data_dir().join(SESSION_ID_FILE)
}

/// Default tracing filter when RUST_LOG is not set.
pub fn default_log_filter() -> &'static str {
    "loan_assistant=info"
}

/// Resolve a required URL setting. Blank values count as missing,
/// so the error names the setting the operator has to fix.
pub fn require_url(
    value: Option<String>,
    key: &'static str,
) -> Result<String, MissingSetting> {
    match value {
        Some(raw) => {
            let trimmed = raw.trim();
            if trimmed.is_empty() {
                Err(MissingSetting(key))
            } else {
                Ok(trimmed.to_string())
            }
        }
        None => Err(MissingSetting(key)),
    }
}

/// The catalog endpoint. Required; checked at first use, not at startup.
pub fn loan_types_url() -> Result<String, MissingSetting> {
    require_url(std::env::var(ENV_LOAN_TYPES_URL).ok(), ENV_LOAN_TYPES_URL)
}

/// The eligibility evaluation endpoint. Required; checked at first use.
pub fn check_eligibility_url() -> Result<String, MissingSetting> {
    require_url(
        std::env::var(ENV_CHECK_ELIGIBILITY_URL).ok(),
        ENV_CHECK_ELIGIBILITY_URL,
    )
}

/// The chat endpoint, with a documented default. Trailing slash trimmed
/// because the clear call appends `/{sessionId}`.
pub fn chat_api_url() -> String {
    let configured = std::env::var(ENV_CHAT_API_URL)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CHAT_API_URL.to_string());
    configured.trim_end_matches('/').to_string()
}

/// The placeholder chat user identifier. No authentication in this client.
pub fn chat_user() -> String {
    std::env::var(ENV_CHAT_USER)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_CHAT_USER.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        assert!(dir.ends_with("LoanAssistant"));
    }

    #[test]
    fn session_id_path_under_app_data() {
        let path = session_id_path();
        assert!(path.starts_with(app_data_dir()));
        assert!(path.ends_with(SESSION_ID_FILE));
    }

    #[test]
    fn require_url_accepts_trimmed_value() {
        let url = require_url(
            Some("  http://localhost:5000/api/Loan/loantypes  ".into()),
            ENV_LOAN_TYPES_URL,
        )
        .unwrap();
        assert_eq!(url, "http://localhost:5000/api/Loan/loantypes");
    }

    #[test]
    fn require_url_rejects_missing() {
        let err = require_url(None, ENV_LOAN_TYPES_URL).unwrap_err();
        assert_eq!(err, MissingSetting(ENV_LOAN_TYPES_URL));
        assert_eq!(
            err.to_string(),
            "LOANASSIST_LOAN_TYPES_URL is not configured. Please set it in your environment."
        );
    }

    #[test]
    fn require_url_rejects_blank() {
        let err = require_url(Some("   ".into()), ENV_CHECK_ELIGIBILITY_URL).unwrap_err();
        assert_eq!(err, MissingSetting(ENV_CHECK_ELIGIBILITY_URL));
    }

    #[test]
    fn app_version_matches_cargo() {
        assert_eq!(APP_VERSION, env!("CARGO_PKG_VERSION"));
    }
}
