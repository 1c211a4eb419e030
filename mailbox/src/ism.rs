use chainweb_bridge_core::{
    accumulator::{merkle::verify_merkle_proof, TREE_DEPTH},
    BridgeMessage, Checkpoint, Secp256k1Recoverer, Signature, SignatureRecoverer, H160, H256,
};

use crate::{IsmError, MultisigIsm};

/// Everything a relayer must submit alongside a message for verification:
/// the merkle branch proving the message id's inclusion, the leaf index,
/// the validator-signed checkpoint, and the signatures over it.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ProcessMetadata {
    /// Sibling hashes from the leaf to the root, bottom-up
    pub proof: [H256; TREE_DEPTH],
    /// Index of the message id in the origin dispatch tree
    pub index: u32,
    /// The checkpoint the validators signed
    pub checkpoint: Checkpoint,
    /// Validator signatures over the checkpoint
    pub signatures: Vec<Signature>,
}

/// Decides whether an inbound message is authentic.
///
/// Relayer input is untrusted; the module independently reconstructs the
/// merkle root from the claimed branch and requires a validator quorum over
/// that same root. The three checks are order-insensitive for correctness
/// and run cheapest-first.
#[derive(Debug)]
pub struct InterchainSecurityModule<R: SignatureRecoverer = Secp256k1Recoverer> {
    multisig: MultisigIsm<R>,
}

impl InterchainSecurityModule<Secp256k1Recoverer> {
    /// An ISM using secp256k1 checkpoint signatures, administered by `admin`.
    pub fn new(admin: H256) -> Self {
        Self {
            multisig: MultisigIsm::new(admin),
        }
    }
}

impl<R: SignatureRecoverer> InterchainSecurityModule<R> {
    /// An ISM with a custom signature scheme.
    pub fn with_multisig(multisig: MultisigIsm<R>) -> Self {
        Self { multisig }
    }

    /// Replace the validator set for an origin domain. Admin-gated.
    pub fn set_validators(
        &mut self,
        caller: H256,
        domain: u32,
        validators: Vec<H160>,
        threshold: u8,
    ) -> Result<(), IsmError> {
        self.multisig
            .set_validators(caller, domain, validators, threshold)
    }

    /// The multisig configuration backing this module.
    pub fn multisig(&self) -> &MultisigIsm<R> {
        &self.multisig
    }

    /// Verify that `message` was dispatched on its origin chain and that a
    /// validator quorum attests to the tree containing it.
    pub fn verify(
        &self,
        message: &BridgeMessage,
        metadata: &ProcessMetadata,
    ) -> Result<(), IsmError> {
        // the checkpoint must cover the leaf being proven
        if metadata.checkpoint.index < metadata.index {
            return Err(IsmError::CheckpointStale {
                checkpoint_index: metadata.checkpoint.index,
                leaf_index: metadata.index,
            });
        }

        let leaf = message.id();
        if !verify_merkle_proof(
            leaf,
            &metadata.proof,
            TREE_DEPTH,
            metadata.index as usize,
            metadata.checkpoint.root,
        ) {
            return Err(IsmError::ProofInvalid { leaf });
        }

        self.multisig
            .verify_quorum(message.origin, &metadata.checkpoint, &metadata.signatures)
    }
}
