//! Loan Assistant — interactive workflow layer for a loan-products backend.
//!
//! The crate is a client: it collects and validates user input, calls a small
//! number of backend endpoints, and holds the resulting state. Underwriting
//! logic lives entirely behind the eligibility endpoint; the only durable
//! state on this side is the chat session identifier.
//!
//! Layering, leaf-first:
//! - [`notify`] — queue of transient, self-expiring notifications
//! - [`gateway`] — typed request/response boundary to the backend
//! - [`eligibility`] — form state, validation, submission lifecycle
//! - [`chat`] — conversation history and session lifecycle

pub mod chat;
pub mod config;
pub mod eligibility;
pub mod gateway;
pub mod models;
pub mod notify;
pub mod session_store;

#[cfg(test)]
pub(crate) mod testutil;
