use k256::ecdsa::{RecoveryId, Signature as EcdsaSignature, SigningKey, VerifyingKey};
use sha3::{digest::Update, Digest, Keccak256};

use crate::{ProtocolError, Signature, H160, H256};

/// A type that can be signed. The signature will be of a hash of select
/// contents defined by `signing_hash`.
pub trait Signable: Sized {
    /// A hash of the contents.
    /// The EIP-191 compliant version of this hash is signed by validators.
    fn signing_hash(&self) -> H256;

    /// EIP-191 compliant hash of the signing hash.
    fn eth_signed_message_hash(&self) -> H256 {
        H256::from_slice(
            Keccak256::new()
                .chain(eip_191_message_payload(self.signing_hash()))
                .finalize()
                .as_slice(),
        )
    }
}

/// Creates a message payload according to [EIP-191] (version `0x01`).
///
/// The final message is a UTF-8 string, encoded as follows:
/// `"\x19Ethereum Signed Message:\n" + message.length + message`
///
/// [EIP-191]: https://eips.ethereum.org/EIPS/eip-191
fn eip_191_message_payload<T: AsRef<[u8]>>(message: T) -> Vec<u8> {
    const PREFIX: &str = "\x19Ethereum Signed Message:\n";

    let message = message.as_ref();
    let len_string = message.len().to_string();

    let mut eth_message = Vec::with_capacity(PREFIX.len() + len_string.len() + message.len());
    eth_message.extend_from_slice(PREFIX.as_bytes());
    eth_message.extend_from_slice(len_string.as_bytes());
    eth_message.extend_from_slice(message);

    eth_message
}

/// A signed type. Contains the original value and the signature.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SignedType<T: Signable> {
    /// The value which was signed
    pub value: T,
    /// The signature for the value
    pub signature: Signature,
}

impl<T: Signable> SignedType<T> {
    /// Recover the address of the signer
    pub fn recover(&self) -> Result<H160, ProtocolError> {
        Secp256k1Recoverer.recover(&self.value.eth_signed_message_hash(), &self.signature)
    }

    /// Check whether the value was signed by a specific address
    pub fn verify(&self, signer: H160) -> Result<(), ProtocolError> {
        let digest = self.value.eth_signed_message_hash();
        let recovered = Secp256k1Recoverer.recover(&digest, &self.signature)?;
        if recovered == signer {
            Ok(())
        } else {
            Err(ProtocolError::InvalidSignature { digest })
        }
    }
}

/// Recovers a signer address from a signature over a 32-byte digest.
///
/// The quorum-counting logic never touches curve arithmetic directly, so a
/// deployment targeting a different signature scheme only swaps this
/// implementation out.
pub trait SignatureRecoverer {
    /// Recover the address that produced `signature` over `digest`.
    fn recover(&self, digest: &H256, signature: &Signature) -> Result<H160, ProtocolError>;
}

/// ECDSA secp256k1 recovery with Ethereum-style addressing.
#[derive(Clone, Copy, Debug, Default)]
pub struct Secp256k1Recoverer;

impl SignatureRecoverer for Secp256k1Recoverer {
    fn recover(&self, digest: &H256, signature: &Signature) -> Result<H160, ProtocolError> {
        let invalid = || ProtocolError::InvalidSignature { digest: *digest };

        let recovery_id = RecoveryId::from_byte(signature.recovery_id()).ok_or_else(invalid)?;
        let mut rs = [0u8; 64];
        rs[..32].copy_from_slice(signature.r.as_bytes());
        rs[32..].copy_from_slice(signature.s.as_bytes());
        let ecdsa = EcdsaSignature::from_slice(&rs).map_err(|_| invalid())?;

        let key = VerifyingKey::recover_from_prehash(digest.as_bytes(), &ecdsa, recovery_id)
            .map_err(|_| invalid())?;
        Ok(address_of(&key))
    }
}

/// A local secp256k1 key that signs checkpoints the way validators do.
///
/// Off-chain validator tooling and tests use this; the on-ledger side only
/// ever recovers.
#[derive(Clone)]
pub struct CheckpointSigner {
    key: SigningKey,
}

impl std::fmt::Debug for CheckpointSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CheckpointSigner {{ address: {:?} }}", self.address())
    }
}

impl CheckpointSigner {
    /// Instantiate a signer from a raw 32-byte private key.
    pub fn new(private_key: &H256) -> Result<Self, ProtocolError> {
        let key =
            SigningKey::from_slice(private_key.as_bytes()).map_err(|_| ProtocolError::InvalidKey)?;
        Ok(Self { key })
    }

    /// The Ethereum-style address of this signer.
    pub fn address(&self) -> H160 {
        address_of(self.key.verifying_key())
    }

    /// Sign a `Signable` value over its EIP-191 digest.
    pub fn sign<T: Signable>(&self, value: T) -> Result<SignedType<T>, ProtocolError> {
        let digest = value.eth_signed_message_hash();
        let (ecdsa, recovery_id) = self
            .key
            .sign_prehash_recoverable(digest.as_bytes())
            .map_err(|_| ProtocolError::InvalidSignature { digest })?;

        let bytes = ecdsa.to_bytes();
        let signature = Signature {
            r: H256::from_slice(&bytes[..32]),
            s: H256::from_slice(&bytes[32..]),
            v: u64::from(recovery_id.to_byte()) + 27,
        };
        Ok(SignedType { value, signature })
    }
}

fn address_of(key: &VerifyingKey) -> H160 {
    let uncompressed = key.to_encoded_point(false);
    let hash = Keccak256::digest(&uncompressed.as_bytes()[1..]);
    H160::from_slice(&hash[12..])
}
