//! The on-ledger half of the Chainweb bridge: the mailbox state machine
//! and the multisig interchain security module.
//!
//! Everything here is synchronous and runs inside a single-writer,
//! transactional host (a smart-contract VM or equivalent ledger). An
//! operation either returns `Ok` having fully applied its state changes,
//! or returns an error having applied none.

#![warn(missing_docs)]
#![warn(unused_extern_crates)]
#![forbid(unsafe_code)]

mod error;
mod ism;
mod mailbox;
mod multisig;

pub use error::{IsmError, MailboxError};
pub use ism::{InterchainSecurityModule, ProcessMetadata};
pub use mailbox::{Mailbox, MessageRecipient, RecipientError};
pub use multisig::{MultisigIsm, ValidatorsAndThreshold};
