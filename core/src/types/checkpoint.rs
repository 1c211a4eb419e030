use sha3::{digest::Update, Digest, Keccak256};

use crate::{utils::domain_hash, Signable, Signature, SignedType, H256};

/// A validator attestation that the origin mailbox's dispatch tree had a
/// given root once `index + 1` leaves were inserted.
#[derive(Copy, Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Checkpoint {
    /// The address of the origin mailbox, chain-agnostic form
    pub origin_mailbox: H256,
    /// The domain of the origin mailbox
    pub origin_domain: u32,
    /// The checkpointed root
    pub root: H256,
    /// The index of the last leaf covered by this checkpoint
    pub index: u32,
}

impl Signable for Checkpoint {
    /// A hash of the checkpoint contents.
    /// The EIP-191 compliant version of this hash is signed by validators.
    fn signing_hash(&self) -> H256 {
        // sign:
        // domain_hash(origin_mailbox, origin_domain) || root || index (as u32)
        H256::from_slice(
            Keccak256::new()
                .chain(domain_hash(self.origin_mailbox, self.origin_domain))
                .chain(self.root)
                .chain(self.index.to_be_bytes())
                .finalize()
                .as_slice(),
        )
    }
}

/// A checkpoint signed by a single validator.
pub type SignedCheckpoint = SignedType<Checkpoint>;

/// A checkpoint and the signatures of multiple validators over it.
#[derive(Clone, Debug)]
pub struct MultisigSignedCheckpoint {
    /// The checkpoint
    pub checkpoint: Checkpoint,
    /// Signatures over the checkpoint
    pub signatures: Vec<Signature>,
}

/// Error types for aggregating signed checkpoints
#[derive(Debug, thiserror::Error)]
pub enum MultisigSignedCheckpointError {
    /// The signed checkpoints are over inconsistent checkpoints
    #[error("Multisig signed checkpoint is for inconsistent checkpoints")]
    InconsistentCheckpoints(),
    /// No signed checkpoints were provided
    #[error("Multisig signed checkpoint has no signatures")]
    EmptySignatures(),
}

impl TryFrom<&[SignedCheckpoint]> for MultisigSignedCheckpoint {
    type Error = MultisigSignedCheckpointError;

    /// Aggregate per-validator signed checkpoints into one multisig
    /// checkpoint, requiring every signature to cover the same checkpoint.
    fn try_from(signed_checkpoints: &[SignedCheckpoint]) -> Result<Self, Self::Error> {
        if signed_checkpoints.is_empty() {
            return Err(MultisigSignedCheckpointError::EmptySignatures());
        }
        let checkpoint = signed_checkpoints[0].value;
        if !signed_checkpoints.iter().all(|c| c.value == checkpoint) {
            return Err(MultisigSignedCheckpointError::InconsistentCheckpoints());
        }

        let signatures = signed_checkpoints.iter().map(|c| c.signature).collect();

        Ok(MultisigSignedCheckpoint {
            checkpoint,
            signatures,
        })
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::CheckpointSigner;

    fn checkpoint(index: u32) -> Checkpoint {
        Checkpoint {
            origin_mailbox: H256::repeat_byte(0xab),
            origin_domain: 626,
            root: H256::repeat_byte(0xcd),
            index,
        }
    }

    #[test]
    fn signing_hash_is_domain_separated() {
        let base = checkpoint(69);
        let other_domain = Checkpoint {
            origin_domain: 1,
            ..base
        };
        let other_mailbox = Checkpoint {
            origin_mailbox: H256::repeat_byte(0xac),
            ..base
        };
        assert_ne!(base.signing_hash(), other_domain.signing_hash());
        assert_ne!(base.signing_hash(), other_mailbox.signing_hash());
    }

    #[test]
    fn it_signs_checkpoints() {
        let signer = CheckpointSigner::new(&H256::repeat_byte(0x22)).expect("!key");
        let signed = signer.sign(checkpoint(69)).expect("!sign");
        assert_eq!(signed.recover().expect("!recover"), signer.address());
    }

    #[test]
    fn it_aggregates_consistent_checkpoints() {
        let signers = [
            CheckpointSigner::new(&H256::repeat_byte(0x22)).expect("!key"),
            CheckpointSigner::new(&H256::repeat_byte(0x33)).expect("!key"),
        ];
        let signed: Vec<_> = signers
            .iter()
            .map(|s| s.sign(checkpoint(69)).expect("!sign"))
            .collect();

        let multisig = MultisigSignedCheckpoint::try_from(&signed[..]).expect("!aggregate");
        assert_eq!(multisig.checkpoint, checkpoint(69));
        assert_eq!(multisig.signatures.len(), 2);
    }

    #[test]
    fn it_rejects_inconsistent_checkpoints() {
        let signer = CheckpointSigner::new(&H256::repeat_byte(0x22)).expect("!key");
        let signed = vec![
            signer.sign(checkpoint(69)).expect("!sign"),
            signer.sign(checkpoint(70)).expect("!sign"),
        ];
        assert!(matches!(
            MultisigSignedCheckpoint::try_from(&signed[..]),
            Err(MultisigSignedCheckpointError::InconsistentCheckpoints())
        ));
    }

    #[test]
    fn signed_checkpoints_round_trip_through_json() {
        // relayers ship signed checkpoints around as JSON
        let signer = CheckpointSigner::new(&H256::repeat_byte(0x22)).expect("!key");
        let signed = signer.sign(checkpoint(69)).expect("!sign");

        let json = serde_json::to_string(&signed).expect("!serialize");
        let parsed: SignedCheckpoint = serde_json::from_str(&json).expect("!deserialize");
        assert_eq!(parsed, signed);
        assert_eq!(parsed.recover().expect("!recover"), signer.address());
    }

    #[test]
    fn it_rejects_empty_aggregation() {
        assert!(matches!(
            MultisigSignedCheckpoint::try_from(&[][..]),
            Err(MultisigSignedCheckpointError::EmptySignatures())
        ));
    }
}
