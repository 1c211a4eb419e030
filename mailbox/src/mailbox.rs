use std::collections::HashSet;

use chainweb_bridge_core::{
    accumulator::{merkle::Proof, prover::ProverError, Prover},
    BridgeMessage, Checkpoint, Secp256k1Recoverer, SignatureRecoverer, H160, H256,
    MAX_MESSAGE_BODY_BYTES, MESSAGE_VERSION,
};

use crate::{InterchainSecurityModule, IsmError, MailboxError, ProcessMetadata};

/// Error returned by a recipient refusing delivery.
#[derive(Debug, thiserror::Error)]
#[error("{0}")]
pub struct RecipientError(pub String);

/// An application router on the destination chain.
///
/// Called synchronously by `Mailbox::process` once a message has been
/// verified; a failure here aborts the whole process call.
pub trait MessageRecipient {
    /// Deliver a verified message body.
    fn handle(&mut self, origin: u32, sender: H256, body: &[u8]) -> Result<(), RecipientError>;
}

/// The bridge endpoint on one chain.
///
/// Outbound, `dispatch` assigns nonces and accumulates message ids into the
/// dispatch tree that validators checkpoint. Inbound, `process` verifies a
/// relayed message through the ISM and delivers it exactly once.
///
/// All state is owned by the instance and reached only through these
/// operations, so independent mailboxes (one per domain, one per test)
/// never share anything. Persistence across host restarts is the ledger's
/// concern, not modeled here.
#[derive(Debug)]
pub struct Mailbox<R: SignatureRecoverer = Secp256k1Recoverer> {
    address: H256,
    local_domain: u32,
    admin: H256,
    paused: bool,
    nonce: u32,
    tree: Prover,
    dispatched: Vec<BridgeMessage>,
    delivered: HashSet<H256>,
    ism: InterchainSecurityModule<R>,
}

impl Mailbox<Secp256k1Recoverer> {
    /// A mailbox at `address` on `local_domain`, administered by `admin`.
    pub fn new(address: H256, local_domain: u32, admin: H256) -> Self {
        Self::with_ism(
            address,
            local_domain,
            admin,
            InterchainSecurityModule::new(admin),
        )
    }
}

impl<R: SignatureRecoverer> Mailbox<R> {
    /// A mailbox verifying inbound messages with a custom ISM.
    pub fn with_ism(
        address: H256,
        local_domain: u32,
        admin: H256,
        ism: InterchainSecurityModule<R>,
    ) -> Self {
        Self {
            address,
            local_domain,
            admin,
            paused: false,
            nonce: 0,
            tree: Prover::default(),
            dispatched: Vec::new(),
            delivered: HashSet::new(),
            ism,
        }
    }

    /// The domain this mailbox lives on.
    pub fn local_domain(&self) -> u32 {
        self.local_domain
    }

    /// Current root of the dispatch tree.
    pub fn root(&self) -> H256 {
        self.tree.root()
    }

    /// Number of messages dispatched so far.
    pub fn count(&self) -> u32 {
        self.nonce
    }

    /// Whether a message id has been delivered on this mailbox.
    pub fn delivered(&self, id: H256) -> bool {
        self.delivered.contains(&id)
    }

    /// The dispatched message with the given nonce, replayable by relayers.
    pub fn dispatched(&self, nonce: u32) -> Option<&BridgeMessage> {
        self.dispatched.get(nonce as usize)
    }

    /// The checkpoint a validator would sign right now, or `None` while no
    /// message has been dispatched.
    pub fn checkpoint(&self) -> Option<Checkpoint> {
        let index = self.nonce.checked_sub(1)?;
        Some(Checkpoint {
            origin_mailbox: self.address,
            origin_domain: self.local_domain,
            root: self.tree.root(),
            index,
        })
    }

    /// Produce an inclusion proof for the dispatched message at `index`
    /// against the current root.
    pub fn prove(&self, index: u32) -> Result<Proof, ProverError> {
        self.tree.prove(index as usize)
    }

    /// Replace the validator set for an origin domain. Admin-gated.
    pub fn set_validators(
        &mut self,
        caller: H256,
        domain: u32,
        validators: Vec<H160>,
        threshold: u8,
    ) -> Result<(), IsmError> {
        self.ism.set_validators(caller, domain, validators, threshold)
    }

    /// Halt dispatch and process. Admin-gated.
    pub fn pause(&mut self, caller: H256) -> Result<(), MailboxError> {
        if caller != self.admin {
            return Err(MailboxError::Unauthorized);
        }
        self.paused = true;
        tracing::info!(domain = self.local_domain, "mailbox paused");
        Ok(())
    }

    /// Resume dispatch and process. Admin-gated.
    pub fn unpause(&mut self, caller: H256) -> Result<(), MailboxError> {
        if caller != self.admin {
            return Err(MailboxError::Unauthorized);
        }
        self.paused = false;
        tracing::info!(domain = self.local_domain, "mailbox unpaused");
        Ok(())
    }

    /// Whether the mailbox is currently paused.
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Dispatch a message to `recipient` on `destination`.
    ///
    /// Assigns the next nonce for this origin, inserts the message id into
    /// the dispatch tree, and returns the id. The message itself is
    /// retained in the outbox log for relayers to fetch.
    pub fn dispatch(
        &mut self,
        sender: H256,
        destination: u32,
        recipient: H256,
        body: Vec<u8>,
    ) -> Result<H256, MailboxError> {
        if self.paused {
            return Err(MailboxError::Paused);
        }
        if body.len() > MAX_MESSAGE_BODY_BYTES {
            return Err(MailboxError::MessageTooLarge {
                actual: body.len(),
                max: MAX_MESSAGE_BODY_BYTES,
            });
        }

        let message = BridgeMessage {
            version: MESSAGE_VERSION,
            nonce: self.nonce,
            origin: self.local_domain,
            sender,
            destination,
            recipient,
            body,
        };
        let id = message.id();

        // the tree rejects the insert before mutating anything, so a full
        // tree leaves the nonce and the outbox log untouched
        self.tree.ingest(id).map_err(|_| MailboxError::TreeFull)?;
        self.nonce += 1;
        self.dispatched.push(message);

        tracing::debug!(
            ?id,
            nonce = self.nonce - 1,
            destination,
            "dispatched message"
        );
        Ok(id)
    }

    /// Process an inbound message: verify it through the ISM, record it as
    /// delivered, and hand the body to the recipient router.
    ///
    /// Either the message becomes permanently delivered and the recipient
    /// ran, or nothing changed: the delivered mark is written before the
    /// recipient call and taken back if the recipient fails, so a retry
    /// after a recipient fix can still succeed, and a reentrant second
    /// delivery of the same id cannot.
    pub fn process(
        &mut self,
        message: &BridgeMessage,
        metadata: &ProcessMetadata,
        recipient: &mut dyn MessageRecipient,
    ) -> Result<(), MailboxError> {
        if self.paused {
            return Err(MailboxError::Paused);
        }
        if message.version != MESSAGE_VERSION {
            return Err(MailboxError::UnsupportedVersion(message.version));
        }
        if message.destination != self.local_domain {
            return Err(MailboxError::WrongDestination {
                destination: message.destination,
                local: self.local_domain,
            });
        }

        let id = message.id();
        if self.delivered.contains(&id) {
            return Err(MailboxError::AlreadyProcessed(id));
        }

        self.ism.verify(message, metadata)?;

        self.delivered.insert(id);
        if let Err(e) = recipient.handle(message.origin, message.sender, &message.body) {
            self.delivered.remove(&id);
            return Err(MailboxError::RouterDeliveryFailed(e));
        }

        tracing::info!(?id, origin = message.origin, "processed message");
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const ADMIN: H256 = H256::repeat_byte(0x0a);
    const LOCAL: H256 = H256::repeat_byte(0xab);

    fn mailbox() -> Mailbox {
        Mailbox::new(LOCAL, 626, ADMIN)
    }

    #[test]
    fn dispatch_assigns_monotonic_nonces() {
        let mut mailbox = mailbox();
        let a = mailbox
            .dispatch(H256::repeat_byte(0x01), 1, H256::repeat_byte(0x02), vec![1])
            .expect("!dispatch");
        let b = mailbox
            .dispatch(H256::repeat_byte(0x01), 1, H256::repeat_byte(0x02), vec![1])
            .expect("!dispatch");

        assert_ne!(a, b);
        assert_eq!(mailbox.count(), 2);
        assert_eq!(mailbox.dispatched(0).unwrap().nonce, 0);
        assert_eq!(mailbox.dispatched(1).unwrap().nonce, 1);
        assert_eq!(mailbox.dispatched(0).unwrap().id(), a);
    }

    #[test]
    fn dispatch_mutates_the_tree() {
        let mut mailbox = mailbox();
        let r0 = mailbox.root();
        mailbox
            .dispatch(H256::repeat_byte(0x01), 1, H256::repeat_byte(0x02), vec![])
            .expect("!dispatch");
        assert_ne!(mailbox.root(), r0);
    }

    #[test]
    fn dispatch_rejects_oversized_bodies() {
        let mut mailbox = mailbox();
        let result = mailbox.dispatch(
            H256::repeat_byte(0x01),
            1,
            H256::repeat_byte(0x02),
            vec![0u8; MAX_MESSAGE_BODY_BYTES + 1],
        );
        assert!(matches!(result, Err(MailboxError::MessageTooLarge { .. })));
        assert_eq!(mailbox.count(), 0);
    }

    #[test]
    fn checkpoint_tracks_the_latest_dispatch() {
        let mut mailbox = mailbox();
        assert!(mailbox.checkpoint().is_none());

        mailbox
            .dispatch(H256::repeat_byte(0x01), 1, H256::repeat_byte(0x02), vec![])
            .expect("!dispatch");
        let checkpoint = mailbox.checkpoint().expect("!checkpoint");
        assert_eq!(checkpoint.index, 0);
        assert_eq!(checkpoint.root, mailbox.root());
        assert_eq!(checkpoint.origin_domain, 626);
        assert_eq!(checkpoint.origin_mailbox, LOCAL);
    }

    #[test]
    fn pause_gates_dispatch() {
        let mut mailbox = mailbox();
        assert!(matches!(
            mailbox.pause(H256::repeat_byte(0xff)),
            Err(MailboxError::Unauthorized)
        ));

        mailbox.pause(ADMIN).expect("!pause");
        assert!(mailbox.is_paused());
        assert!(matches!(
            mailbox.dispatch(H256::repeat_byte(0x01), 1, H256::repeat_byte(0x02), vec![]),
            Err(MailboxError::Paused)
        ));

        mailbox.unpause(ADMIN).expect("!unpause");
        mailbox
            .dispatch(H256::repeat_byte(0x01), 1, H256::repeat_byte(0x02), vec![])
            .expect("!dispatch");
    }
}
