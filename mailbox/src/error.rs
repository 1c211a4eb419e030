use chainweb_bridge_core::H256;

/// Errors raised while verifying an inbound message or administering the
/// validator sets.
#[derive(Debug, thiserror::Error)]
pub enum IsmError {
    /// The merkle branch does not reconstruct the checkpoint root
    #[error("Proof for leaf {leaf:?} does not reconstruct checkpoint root")]
    ProofInvalid {
        /// The message id the proof was evaluated for
        leaf: H256,
    },
    /// The checkpoint does not cover the claimed leaf index
    #[error("Checkpoint index {checkpoint_index} does not cover leaf index {leaf_index}")]
    CheckpointStale {
        /// Index attested by the checkpoint
        checkpoint_index: u32,
        /// Index of the leaf being proven
        leaf_index: u32,
    },
    /// Not enough distinct validator signatures
    #[error("Quorum not met: {valid} distinct validator signature(s), {threshold} required")]
    QuorumNotMet {
        /// Count of distinct recovered validator addresses
        valid: usize,
        /// The configured threshold
        threshold: u8,
    },
    /// A signature could not be recovered at all
    #[error(transparent)]
    InvalidSignature(#[from] chainweb_bridge_core::ProtocolError),
    /// Threshold is zero or exceeds the validator count
    #[error("Invalid threshold {threshold} for {validators} validator(s)")]
    InvalidThreshold {
        /// The rejected threshold
        threshold: u8,
        /// Size of the proposed validator set
        validators: usize,
    },
    /// No validator set is configured for the origin domain
    #[error("No validator set configured for domain {0}")]
    UnknownDomain(u32),
    /// Caller lacks the admin capability
    #[error("Caller lacks admin capability")]
    Unauthorized,
}

/// Errors raised by the mailbox state machine.
#[derive(Debug, thiserror::Error)]
pub enum MailboxError {
    /// The message was delivered before
    #[error("Message {0:?} has already been processed")]
    AlreadyProcessed(H256),
    /// The message carries an unknown protocol version
    #[error("Unsupported message version {0}")]
    UnsupportedVersion(u8),
    /// The message is not destined for this mailbox's domain
    #[error("Message destined for domain {destination}, local domain is {local}")]
    WrongDestination {
        /// The message's destination domain
        destination: u32,
        /// This mailbox's domain
        local: u32,
    },
    /// The message body exceeds the dispatch cap
    #[error("Message body is {actual} bytes, maximum is {max}")]
    MessageTooLarge {
        /// Size of the rejected body
        actual: usize,
        /// The configured cap
        max: usize,
    },
    /// The dispatch tree has no free slots left
    #[error("Dispatch tree is full")]
    TreeFull,
    /// The mailbox is paused
    #[error("Mailbox is paused")]
    Paused,
    /// Caller lacks the admin capability
    #[error("Caller lacks admin capability")]
    Unauthorized,
    /// Verification of the inbound message failed
    #[error(transparent)]
    Verification(#[from] IsmError),
    /// The recipient rejected delivery
    #[error("Recipient rejected delivery: {0}")]
    RouterDeliveryFailed(#[source] crate::RecipientError),
}
