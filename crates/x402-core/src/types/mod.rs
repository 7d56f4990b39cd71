//! Core types used across the X402 protocol crates.

mod amount;
mod common;

pub use amount::*;
pub use common::*;
