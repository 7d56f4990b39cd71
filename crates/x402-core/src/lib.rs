//! X402 core library.
//!
//! Protocol-level building blocks for a seller that gets paid through a facilitator:
//!
//! - [`transport`]: payment terms, presented payment proofs, the `402` envelope, settlement
//!   proofs, and the base64 header codecs used to move them over HTTP.
//! - [`facilitator`]: the [`Facilitator`](facilitator::Facilitator) interface used to verify and
//!   settle a payment proof.
//! - [`networks`]: the networks a seller can be paid on, their USDC assets and address formats.
//! - [`types`]: small shared value types.
//!
//! With the `facilitator-client` feature (on by default), [`facilitator_client`] provides an HTTP
//! client for a remote facilitator.

pub mod errors;
pub mod facilitator;
pub mod networks;
pub mod transport;
pub mod types;

#[cfg(feature = "facilitator-client")]
pub mod facilitator_client;

pub use errors::{Error, Result};
