use sha3::{digest::Update, Digest, Keccak256};

use crate::{H160, H256};

/// Computes the domain separator mixed into every checkpoint signing hash.
///
/// Binds signatures to one mailbox deployment on one origin domain so a
/// checkpoint signed for one chain can never be replayed against another.
pub fn domain_hash(mailbox: H256, domain: impl Into<u32>) -> H256 {
    H256::from_slice(
        Keccak256::new()
            .chain(domain.into().to_be_bytes())
            .chain(mailbox.as_ref())
            .chain("CHAINWEB_BRIDGE".as_bytes())
            .finalize()
            .as_slice(),
    )
}

/// Left-pads a 20-byte EVM address into the chain-agnostic 32-byte form.
pub fn pad_evm_address(address: H160) -> H256 {
    let mut padded = H256::zero();
    padded.as_bytes_mut()[12..].copy_from_slice(address.as_bytes());
    padded
}

/// Derives a chain-agnostic 32-byte id from a Kadena principal.
///
/// Principals of up to 32 bytes are left-padded verbatim; longer ones
/// (e.g. `w:` multi-key principals) are keccak-hashed down to 32 bytes.
pub fn kadena_principal_to_h256(principal: &str) -> H256 {
    let bytes = principal.as_bytes();
    if bytes.len() <= 32 {
        let mut padded = H256::zero();
        padded.as_bytes_mut()[32 - bytes.len()..].copy_from_slice(bytes);
        padded
    } else {
        H256::from_slice(Keccak256::digest(bytes).as_slice())
    }
}
