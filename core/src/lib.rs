//! Core primitives, traits, and types for the Chainweb bridge.
//!
//! This crate holds everything the on-ledger mailbox and the off-chain
//! tooling share: the canonical interchain message encoding, the
//! incremental merkle accumulator over dispatched message ids, checkpoint
//! types signed by validators, and the ECDSA signing/recovery plumbing.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

/// Accumulator management
pub mod accumulator;

/// Traits for canonical binary representations and checkpoint signing
pub mod traits;

/// Core bridge data structures
pub mod types;

/// Hashing and address-conversion utilities
pub mod utils;

mod error;

pub use error::ProtocolError;
pub use traits::*;
pub use types::*;

pub use primitive_types::{H160, H256};

/// Protocol version carried by every dispatched message.
pub const MESSAGE_VERSION: u8 = 3;

/// Maximum allowed message body size in bytes.
pub const MAX_MESSAGE_BODY_BYTES: usize = 2 * 2_usize.pow(10);
