use std::collections::{BTreeSet, HashMap};

use chainweb_bridge_core::{
    Checkpoint, Secp256k1Recoverer, Signable, Signature, SignatureRecoverer, H160, H256,
};

use crate::IsmError;

/// The validator set and quorum threshold configured for one origin domain.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ValidatorsAndThreshold {
    /// Addresses authorized to sign checkpoints for the domain
    pub validators: Vec<H160>,
    /// Minimum count of distinct validator signatures
    pub threshold: u8,
}

/// Per-origin-domain validator sets with quorum verification.
///
/// Signature recovery is pluggable so the scheme can vary by deployment
/// without touching the quorum-counting logic.
#[derive(Debug)]
pub struct MultisigIsm<R: SignatureRecoverer = Secp256k1Recoverer> {
    admin: H256,
    sets: HashMap<u32, ValidatorsAndThreshold>,
    recoverer: R,
}

impl MultisigIsm<Secp256k1Recoverer> {
    /// A multisig ISM using secp256k1 recovery, administered by `admin`.
    pub fn new(admin: H256) -> Self {
        Self::with_recoverer(admin, Secp256k1Recoverer)
    }
}

impl<R: SignatureRecoverer> MultisigIsm<R> {
    /// A multisig ISM with a custom signature scheme.
    pub fn with_recoverer(admin: H256, recoverer: R) -> Self {
        Self {
            admin,
            sets: HashMap::new(),
            recoverer,
        }
    }

    /// The validator set configured for `domain`, if any.
    pub fn validators_and_threshold(&self, domain: u32) -> Option<&ValidatorsAndThreshold> {
        self.sets.get(&domain)
    }

    /// Replace the validator set for an origin domain. Admin-gated.
    pub fn set_validators(
        &mut self,
        caller: H256,
        domain: u32,
        validators: Vec<H160>,
        threshold: u8,
    ) -> Result<(), IsmError> {
        if caller != self.admin {
            return Err(IsmError::Unauthorized);
        }
        if threshold == 0 || threshold as usize > validators.len() {
            return Err(IsmError::InvalidThreshold {
                threshold,
                validators: validators.len(),
            });
        }

        tracing::info!(domain, ?validators, threshold, "validator set updated");
        self.sets.insert(
            domain,
            ValidatorsAndThreshold {
                validators,
                threshold,
            },
        );
        Ok(())
    }

    /// Check that at least `threshold` distinct validators of `domain`
    /// signed this exact checkpoint.
    ///
    /// Signatures from addresses outside the validator set are ignored
    /// rather than rejected, so over-collection never blocks a quorum.
    /// Unrecoverable signatures are an error: a relayer submitting garbage
    /// should learn so rather than see a misleading quorum count.
    pub fn verify_quorum(
        &self,
        domain: u32,
        checkpoint: &Checkpoint,
        signatures: &[Signature],
    ) -> Result<(), IsmError> {
        let set = self
            .sets
            .get(&domain)
            .ok_or(IsmError::UnknownDomain(domain))?;

        let digest = checkpoint.eth_signed_message_hash();
        let mut signers = BTreeSet::new();
        for signature in signatures {
            let signer = self.recoverer.recover(&digest, signature)?;
            signers.insert(signer);
        }

        let valid = signers
            .iter()
            .filter(|signer| set.validators.contains(signer))
            .count();
        if valid < set.threshold as usize {
            return Err(IsmError::QuorumNotMet {
                valid,
                threshold: set.threshold,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use chainweb_bridge_core::CheckpointSigner;

    const DOMAIN: u32 = 626;
    const ADMIN: H256 = H256::repeat_byte(0x0a);

    fn signers(n: u8) -> Vec<CheckpointSigner> {
        (1..=n)
            .map(|i| CheckpointSigner::new(&H256::repeat_byte(i)).expect("!key"))
            .collect()
    }

    fn checkpoint() -> Checkpoint {
        Checkpoint {
            origin_mailbox: H256::repeat_byte(0xab),
            origin_domain: DOMAIN,
            root: H256::repeat_byte(0xcd),
            index: 69,
        }
    }

    fn ism_with(signers: &[CheckpointSigner], threshold: u8) -> MultisigIsm {
        let mut ism = MultisigIsm::new(ADMIN);
        ism.set_validators(
            ADMIN,
            DOMAIN,
            signers.iter().map(|s| s.address()).collect(),
            threshold,
        )
        .expect("!set_validators");
        ism
    }

    fn sign_all(signers: &[CheckpointSigner]) -> Vec<Signature> {
        signers
            .iter()
            .map(|s| s.sign(checkpoint()).expect("!sign").signature)
            .collect()
    }

    #[test]
    fn it_meets_quorum_at_exactly_threshold() {
        let validators = signers(5);
        let ism = ism_with(&validators, 3);
        let signatures = sign_all(&validators[..3]);

        ism.verify_quorum(DOMAIN, &checkpoint(), &signatures)
            .expect("!quorum");
    }

    #[test]
    fn it_rejects_below_threshold() {
        let validators = signers(5);
        let ism = ism_with(&validators, 3);
        let signatures = sign_all(&validators[..2]);

        assert!(matches!(
            ism.verify_quorum(DOMAIN, &checkpoint(), &signatures),
            Err(IsmError::QuorumNotMet {
                valid: 2,
                threshold: 3
            })
        ));
    }

    #[test]
    fn non_member_signatures_are_ignored_not_fatal() {
        let validators = signers(5);
        let ism = ism_with(&validators, 3);

        // 3 member signatures plus 2 from keys outside the set
        let outsiders = vec![
            CheckpointSigner::new(&H256::repeat_byte(0xe1)).expect("!key"),
            CheckpointSigner::new(&H256::repeat_byte(0xe2)).expect("!key"),
        ];
        let mut signatures = sign_all(&validators[..3]);
        signatures.extend(sign_all(&outsiders));

        ism.verify_quorum(DOMAIN, &checkpoint(), &signatures)
            .expect("!quorum");
    }

    #[test]
    fn duplicate_signatures_count_once() {
        let validators = signers(5);
        let ism = ism_with(&validators, 3);

        let mut signatures = sign_all(&validators[..2]);
        signatures.push(signatures[0]);

        assert!(matches!(
            ism.verify_quorum(DOMAIN, &checkpoint(), &signatures),
            Err(IsmError::QuorumNotMet { valid: 2, .. })
        ));
    }

    #[test]
    fn signatures_over_another_checkpoint_do_not_count() {
        let validators = signers(5);
        let ism = ism_with(&validators, 3);

        let other = Checkpoint {
            index: 70,
            ..checkpoint()
        };
        let signatures: Vec<_> = validators[..3]
            .iter()
            .map(|s| s.sign(other).expect("!sign").signature)
            .collect();

        // recovery against the wrong digest yields addresses outside the set
        let result = ism.verify_quorum(DOMAIN, &checkpoint(), &signatures);
        assert!(matches!(result, Err(IsmError::QuorumNotMet { .. })));
    }

    #[test]
    fn it_rejects_unconfigured_domains() {
        let ism = MultisigIsm::new(ADMIN);
        assert!(matches!(
            ism.verify_quorum(DOMAIN, &checkpoint(), &[]),
            Err(IsmError::UnknownDomain(DOMAIN))
        ));
    }

    #[test]
    fn set_validators_is_admin_gated() {
        let mut ism = MultisigIsm::new(ADMIN);
        let result = ism.set_validators(
            H256::repeat_byte(0xff),
            DOMAIN,
            vec![H160::repeat_byte(0x01)],
            1,
        );
        assert!(matches!(result, Err(IsmError::Unauthorized)));
    }

    #[test]
    fn it_validates_thresholds() {
        let mut ism = MultisigIsm::new(ADMIN);
        let validators = vec![H160::repeat_byte(0x01), H160::repeat_byte(0x02)];

        assert!(matches!(
            ism.set_validators(ADMIN, DOMAIN, validators.clone(), 0),
            Err(IsmError::InvalidThreshold {
                threshold: 0,
                validators: 2
            })
        ));
        assert!(matches!(
            ism.set_validators(ADMIN, DOMAIN, validators.clone(), 3),
            Err(IsmError::InvalidThreshold {
                threshold: 3,
                validators: 2
            })
        ));
        ism.set_validators(ADMIN, DOMAIN, validators, 2)
            .expect("!set_validators");
    }
}
