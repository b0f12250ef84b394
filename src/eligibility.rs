//! Eligibility form controller.
//!
//! Owns the form field state, derives validity, infers the employment-type
//! constraint from the selected loan product's name, and drives the
//! submission lifecycle against the evaluation collaborator. Raw input is
//! parsed defensively: blank or non-numeric text leaves a field unset (never
//! zero, never an error), decimals round to two places, integers truncate
//! toward zero and floor at zero, and the credit score clamps to [0, 900].

use std::sync::LazyLock;

use chrono::NaiveDate;
use regex::Regex;
use tokio_util::sync::CancellationToken;

use crate::gateway::{Gateway, GatewayError};
use crate::models::{EligibilityRequest, EligibilityResult, EmploymentType, LoanType};
use crate::notify::{Severity, ToastCenter};

/// Shown when the catalog fetch fails without a usable backend message.
pub const CATALOG_ERROR_FALLBACK: &str = "Unable to load loan types. Please try again.";
/// Shown when the evaluation call fails without a usable backend message.
pub const SUBMIT_ERROR_FALLBACK: &str = "Unable to check loan eligibility. Please try again.";
/// Raised after a successful evaluation.
pub const SUBMIT_SUCCESS_MESSAGE: &str = "Eligibility check completed.";

/// Trailing parenthesized qualifier of a loan type name, e.g.
/// "Home Loan (Salaried)".
static EMPLOYMENT_SUFFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(([^)]+)\)\s*$").unwrap());

// ═══════════════════════════════════════════════════════════
// Input parsing
// ═══════════════════════════════════════════════════════════

/// Parse a decimal field. Blank or non-numeric input yields unset;
/// values round to two decimal places and floor at zero.
pub fn parse_decimal_input(raw: &str) -> Option<f64> {
    let parsed: f64 = raw.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    let rounded = (parsed * 100.0).round() / 100.0;
    Some(rounded.max(0.0))
}

/// Parse an integer-only field. Blank or non-numeric input yields unset;
/// fractional values truncate toward zero and negatives floor at zero.
pub fn parse_integer_input(raw: &str) -> Option<u32> {
    let parsed: f64 = raw.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(parsed.trunc().max(0.0).min(u32::MAX as f64) as u32)
}

/// Parse the credit score field, clamping into the closed range [0, 900].
pub fn parse_credit_score_input(raw: &str) -> Option<u32> {
    let parsed: f64 = raw.trim().parse().ok()?;
    if !parsed.is_finite() {
        return None;
    }
    Some(parsed.trunc().clamp(0.0, 900.0) as u32)
}

/// Parse a `YYYY-MM-DD` date of birth. Anything else yields unset.
pub fn parse_date_input(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").ok()
}

/// Infer the employment type a loan product requires from its display name.
/// Only a trailing parenthesized "salaried" / "self employed" qualifier
/// (case-insensitive) creates a constraint.
pub fn infer_required_employment(loan_type_name: &str) -> Option<EmploymentType> {
    let qualifier = EMPLOYMENT_SUFFIX
        .captures(loan_type_name)?
        .get(1)?
        .as_str()
        .trim()
        .to_lowercase();
    match qualifier.as_str() {
        "salaried" => Some(EmploymentType::Salaried),
        "self employed" => Some(EmploymentType::SelfEmployed),
        _ => None,
    }
}

// ═══════════════════════════════════════════════════════════
// Catalog state
// ═══════════════════════════════════════════════════════════

/// Lifecycle of the loan-type catalog fetch.
#[derive(Debug, Clone, PartialEq)]
pub enum CatalogState {
    Loading,
    Ready(Vec<LoanType>),
    Failed(String),
}

impl CatalogState {
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading)
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed(message) => Some(message),
            _ => None,
        }
    }

    fn loan_types(&self) -> &[LoanType] {
        match self {
            Self::Ready(types) => types,
            _ => &[],
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Form controller
// ═══════════════════════════════════════════════════════════

/// State machine per submission: Idle → Submitting → Idle-with-Result or
/// Idle-with-Error. A submit while submitting is a no-op, as is a submit
/// while the catalog is loading, errored, or empty.
pub struct EligibilityForm {
    toasts: ToastCenter,
    catalog: CatalogState,
    catalog_generation: u64,
    loan_type_id: Option<u32>,
    requested_amount: Option<f64>,
    tenure_in_months: Option<u32>,
    date_of_birth: Option<NaiveDate>,
    employment_type: Option<EmploymentType>,
    monthly_income: Option<f64>,
    existing_emi: Option<f64>,
    credit_score: Option<u32>,
    result: Option<EligibilityResult>,
    submitting: bool,
}

impl EligibilityForm {
    pub fn new(toasts: ToastCenter) -> Self {
        Self {
            toasts,
            catalog: CatalogState::Loading,
            catalog_generation: 0,
            loan_type_id: None,
            requested_amount: None,
            tenure_in_months: None,
            date_of_birth: None,
            employment_type: None,
            monthly_income: None,
            existing_emi: None,
            credit_score: None,
            result: None,
            submitting: false,
        }
    }

    // ── Catalog lifecycle ───────────────────────────────────

    /// Fetch the catalog and apply the outcome, unless a newer load
    /// superseded this one while the request was in flight.
    pub async fn load_loan_types(&mut self, gateway: &Gateway, cancel: &CancellationToken) {
        let generation = self.begin_catalog_load();
        let outcome = gateway.fetch_loan_types(cancel).await;
        self.apply_catalog_result(generation, outcome);
    }

    /// Mark a new load as the current one. Any response carrying an older
    /// generation is stale and must not apply.
    pub fn begin_catalog_load(&mut self) -> u64 {
        self.catalog_generation += 1;
        self.catalog = CatalogState::Loading;
        self.catalog_generation
    }

    /// Apply a catalog outcome. Stale generations and cancellations are
    /// discarded silently; failures disable the form and raise an error
    /// toast with the backend message or the fixed fallback.
    pub fn apply_catalog_result(
        &mut self,
        generation: u64,
        outcome: Result<Vec<LoanType>, GatewayError>,
    ) {
        if generation != self.catalog_generation {
            tracing::debug!(generation, "Discarding superseded catalog response");
            return;
        }
        match outcome {
            Ok(types) => {
                tracing::info!(count = types.len(), "Loan catalog loaded");
                self.catalog = CatalogState::Ready(types);
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                let message = err.user_message(CATALOG_ERROR_FALLBACK);
                tracing::error!("Loan catalog load failed: {err}");
                self.catalog = CatalogState::Failed(message.clone());
                self.toasts.show(&message, Severity::Error);
            }
        }
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn loan_types(&self) -> &[LoanType] {
        self.catalog.loan_types()
    }

    /// Placeholder text for the loan-type field in its three disabled states.
    pub fn loan_type_placeholder(&self) -> &'static str {
        match &self.catalog {
            CatalogState::Loading => "Loading loan types...",
            CatalogState::Ready(types) if types.is_empty() => "No loan types available",
            _ => "Select a loan type",
        }
    }

    /// The loan-type field (and everything depending on it) is unusable
    /// while the catalog is loading, errored, or empty.
    pub fn catalog_unavailable(&self) -> bool {
        match &self.catalog {
            CatalogState::Loading | CatalogState::Failed(_) => true,
            CatalogState::Ready(types) => types.is_empty(),
        }
    }

    /// Dependent fields also stay locked until a loan type is selected.
    pub fn fields_locked(&self) -> bool {
        self.catalog_unavailable() || self.loan_type_id.is_none()
    }

    // ── Field setters ───────────────────────────────────────

    pub fn set_loan_type(&mut self, raw: &str) {
        self.loan_type_id = parse_integer_input(raw);
    }

    pub fn set_requested_amount(&mut self, raw: &str) {
        self.requested_amount = parse_decimal_input(raw);
    }

    pub fn set_tenure(&mut self, raw: &str) {
        self.tenure_in_months = parse_integer_input(raw);
    }

    pub fn set_date_of_birth(&mut self, raw: &str) {
        self.date_of_birth = parse_date_input(raw);
    }

    pub fn set_employment_type(&mut self, employment: Option<EmploymentType>) {
        self.employment_type = employment;
    }

    pub fn set_monthly_income(&mut self, raw: &str) {
        self.monthly_income = parse_decimal_input(raw);
    }

    pub fn set_existing_emi(&mut self, raw: &str) {
        self.existing_emi = parse_decimal_input(raw);
    }

    pub fn set_credit_score(&mut self, raw: &str) {
        self.credit_score = parse_credit_score_input(raw);
    }

    pub fn credit_score(&self) -> Option<u32> {
        self.credit_score
    }

    pub fn employment_type(&self) -> Option<EmploymentType> {
        self.employment_type
    }

    // ── Derivations ─────────────────────────────────────────

    /// The catalog entry matching the selected loan type id.
    pub fn selected_loan_type(&self) -> Option<&LoanType> {
        let id = self.loan_type_id?;
        self.loan_types().iter().find(|t| t.loan_type_id == id)
    }

    /// Employment constraint inferred from the current selection. Derived
    /// on every read so a stale constraint can never outlive a selection
    /// change.
    pub fn required_employment_type(&self) -> Option<EmploymentType> {
        self.selected_loan_type()
            .and_then(|t| infer_required_employment(&t.loan_type_name))
    }

    /// Inline message when the chosen employment type conflicts with the
    /// selected loan product.
    pub fn employment_mismatch(&self) -> Option<String> {
        let required = self.required_employment_type()?;
        let chosen = self.employment_type?;
        if chosen != required {
            Some(format!("This loan requires {required} employment."))
        } else {
            None
        }
    }

    /// Pure validity derivation over current field state.
    pub fn is_valid(&self) -> bool {
        let (Some(_), Some(amount), Some(tenure), Some(income), Some(_), Some(_)) = (
            self.loan_type_id,
            self.requested_amount,
            self.tenure_in_months,
            self.monthly_income,
            self.existing_emi,
            self.credit_score,
        ) else {
            return false;
        };
        if self.date_of_birth.is_none() || self.employment_type.is_none() {
            return false;
        }
        amount > 0.0 && tenure > 0 && income > 0.0 && self.employment_mismatch().is_none()
    }

    /// Submit is enabled iff the form is valid, the catalog is usable, and
    /// no submission is in flight.
    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.catalog_unavailable() && self.is_valid()
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn result(&self) -> Option<&EligibilityResult> {
        self.result.as_ref()
    }

    /// The fully-typed payload, available only when the form is valid.
    pub fn build_request(&self) -> Option<EligibilityRequest> {
        if !self.is_valid() {
            return None;
        }
        Some(EligibilityRequest {
            loan_type_id: self.loan_type_id?,
            requested_amount: self.requested_amount?,
            tenure_in_months: self.tenure_in_months?,
            date_of_birth: self.date_of_birth?,
            employment_type: self.employment_type?,
            monthly_income: self.monthly_income?,
            existing_emi: self.existing_emi?,
            credit_score: self.credit_score?,
        })
    }

    // ── Submission ──────────────────────────────────────────

    /// Run the eligibility evaluation. The previous result is cleared up
    /// front and stays cleared on failure; the in-flight flag is released
    /// on every path out.
    pub async fn submit(&mut self, gateway: &Gateway, cancel: &CancellationToken) {
        if !self.can_submit() {
            return;
        }
        let Some(request) = self.build_request() else {
            return;
        };

        self.submitting = true;
        self.result = None;

        match gateway.check_eligibility(&request, cancel).await {
            Ok(result) => {
                tracing::info!(eligible = result.is_eligible, "Eligibility evaluated");
                self.result = Some(result);
                self.toasts.show(SUBMIT_SUCCESS_MESSAGE, Severity::Success);
            }
            Err(err) if err.is_cancelled() => {}
            Err(err) => {
                tracing::error!("Eligibility check failed: {err}");
                self.toasts
                    .show(&err.user_message(SUBMIT_ERROR_FALLBACK), Severity::Error);
            }
        }
        self.submitting = false;
    }
}

// ═══════════════════════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════════════════════
