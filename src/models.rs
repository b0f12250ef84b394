//! Wire and domain entities shared across the workflow layer.
//!
//! Wire types carry explicit serde renames so the JSON field names match the
//! backend contracts exactly (`loanTypeId`, `existingEMI`, `timestampUtc`).
//! Responses are coerced into these strongly-typed shapes at the gateway
//! boundary; malformed payloads degrade to the documented fallbacks instead of
//! leaking raw JSON inward.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ═══════════════════════════════════════════════════════════
// Loan catalog
// ═══════════════════════════════════════════════════════════

/// A selectable loan product from the catalog collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoanType {
    pub loan_type_id: u32,
    pub loan_type_name: String,
}

/// Employment type as the evaluation backend expects it.
/// Wire values are `"Salaried"` and `"Self Employed"` (with the space).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EmploymentType {
    Salaried,
    #[serde(rename = "Self Employed")]
    SelfEmployed,
}

impl EmploymentType {
    /// All selectable options, in display order.
    pub const ALL: [EmploymentType; 2] = [EmploymentType::Salaried, EmploymentType::SelfEmployed];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Salaried => "Salaried",
            Self::SelfEmployed => "Self Employed",
        }
    }
}

impl std::fmt::Display for EmploymentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ═══════════════════════════════════════════════════════════
// Eligibility
// ═══════════════════════════════════════════════════════════

/// Fully-typed eligibility request. Only buildable from a valid form,
/// so every field is present and within its constraints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityRequest {
    pub loan_type_id: u32,
    pub requested_amount: f64,
    pub tenure_in_months: u32,
    pub date_of_birth: NaiveDate,
    pub employment_type: EmploymentType,
    pub monthly_income: f64,
    #[serde(rename = "existingEMI")]
    pub existing_emi: f64,
    pub credit_score: u32,
}

/// Outcome of an eligibility evaluation. The computed fields are present
/// only when the applicant is eligible; absence means "not applicable".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EligibilityResult {
    pub is_eligible: bool,
    pub eligibility_status: String,
    pub remarks: String,
    #[serde(rename = "calculatedEMI", default, skip_serializing_if = "Option::is_none")]
    pub calculated_emi: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emi_to_income_pct: Option<f64>,
}

// ═══════════════════════════════════════════════════════════
// Chat
// ═══════════════════════════════════════════════════════════

/// Who authored a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Assistant,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// One turn in a conversation. Ids are unique within a session and
/// never reused; history order is insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub id: Uuid,
    pub text: String,
    pub sender: Sender,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn new(sender: Sender, text: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            text: text.into(),
            sender,
            timestamp,
        }
    }
}

/// Request body for the chat send call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    pub session_id: String,
    pub user: String,
    pub message: String,
}

/// Response body from the chat send call. The session id may differ from
/// the one sent (server-driven session migration); the timestamp may be
/// absent or unparseable, in which case callers fall back to local time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    #[serde(default)]
    pub session_id: String,
    pub reply: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp_utc: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loan_type_wire_field_names() {
        let parsed: LoanType =
            serde_json::from_str(r#"{"loanTypeId":2,"loanTypeName":"Home Loan (Salaried)"}"#)
                .unwrap();
        assert_eq!(parsed.loan_type_id, 2);
        assert_eq!(parsed.loan_type_name, "Home Loan (Salaried)");
    }

    #[test]
    fn employment_type_wire_values() {
        assert_eq!(
            serde_json::to_string(&EmploymentType::SelfEmployed).unwrap(),
            r#""Self Employed""#
        );
        assert_eq!(
            serde_json::to_string(&EmploymentType::Salaried).unwrap(),
            r#""Salaried""#
        );
        let parsed: EmploymentType = serde_json::from_str(r#""Self Employed""#).unwrap();
        assert_eq!(parsed, EmploymentType::SelfEmployed);
    }

    #[test]
    fn eligibility_request_serializes_wire_names() {
        let request = EligibilityRequest {
            loan_type_id: 1,
            requested_amount: 500000.0,
            tenure_in_months: 24,
            date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 14).unwrap(),
            employment_type: EmploymentType::Salaried,
            monthly_income: 50000.0,
            existing_emi: 0.0,
            credit_score: 750,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["loanTypeId"], 1);
        assert_eq!(value["tenureInMonths"], 24);
        assert_eq!(value["dateOfBirth"], "1990-05-14");
        assert_eq!(value["employmentType"], "Salaried");
        assert_eq!(value["existingEMI"], 0.0);
        assert_eq!(value["creditScore"], 750);
    }

    #[test]
    fn eligibility_result_optional_metrics_absent() {
        let parsed: EligibilityResult = serde_json::from_str(
            r#"{"isEligible":false,"eligibilityStatus":"Rejected","remarks":"Credit score too low"}"#,
        )
        .unwrap();
        assert!(!parsed.is_eligible);
        assert!(parsed.calculated_emi.is_none());
        assert!(parsed.emi_to_income_pct.is_none());
    }

    #[test]
    fn eligibility_result_optional_metrics_present() {
        let parsed: EligibilityResult = serde_json::from_str(
            r#"{"isEligible":true,"eligibilityStatus":"Approved","remarks":"ok","calculatedEMI":21500.45,"emiToIncomePct":43.0}"#,
        )
        .unwrap();
        assert_eq!(parsed.calculated_emi, Some(21500.45));
        assert_eq!(parsed.emi_to_income_pct, Some(43.0));
    }

    #[test]
    fn chat_reply_tolerates_missing_fields() {
        let parsed: ChatReply = serde_json::from_str(r#"{"reply":"Hello"}"#).unwrap();
        assert_eq!(parsed.reply, "Hello");
        assert!(parsed.session_id.is_empty());
        assert!(parsed.timestamp_utc.is_none());
    }

    #[test]
    fn chat_message_ids_are_unique() {
        let now = Utc::now();
        let a = ChatMessage::new(Sender::User, "hi", now);
        let b = ChatMessage::new(Sender::User, "hi", now);
        assert_ne!(a.id, b.id);
    }
}
