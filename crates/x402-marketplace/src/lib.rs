//! A pay-per-resource marketplace coordinator on top of X402.
//!
//! Buyers pay vendors for either an access credential, issued on the spot, or an asynchronously
//! fulfilled task. [`orchestrator::RequestOrchestrator`] decides each purchase request: it
//! answers unpaid requests with payment terms, verifies and settles presented payments through
//! a [`Facilitator`](x402_core::facilitator::Facilitator), and records the resulting
//! [`Payment`](domain::payment::Payment) and [`Task`](domain::task::Task).
//!
//! With a [`custody::CaptureMode::Custodial`] configuration, payments for tasks are held in
//! custody until [`fulfillment::FulfillmentCoordinator`] learns the task outcome, then
//! released to the vendor or refunded to the buyer.
//!
//! Storage and collaborators sit behind the traits in [`ports`] and [`custody`];
//! [`infrastructure`] provides in-memory implementations.

pub mod config;
pub mod custody;
pub mod domain;
pub mod errors;
pub mod fulfillment;
pub mod gateway;
pub mod infrastructure;
pub mod orchestrator;
pub mod outcome;
pub mod ports;
pub mod reconcile;

pub use errors::{Error, Result};

#[cfg(feature = "facilitator-client")]
pub use x402_core::facilitator_client::HttpFacilitator;
