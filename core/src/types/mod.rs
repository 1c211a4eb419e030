use std::fmt;

use crate::{Decode, Encode, ProtocolError};

pub use checkpoint::*;
pub use message::*;

mod checkpoint;
mod message;

/// An ECDSA signature in the 65-byte `r ‖ s ‖ v` wire form.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Signature {
    /// R value
    pub r: crate::H256,
    /// S value
    pub s: crate::H256,
    /// V value, in Ethereum convention (27 or 28)
    pub v: u64,
}

impl Signature {
    /// The recovery id encoded by `v`, normalized to 0/1.
    pub fn recovery_id(&self) -> u8 {
        match self.v {
            27 | 28 => (self.v - 27) as u8,
            v => v as u8,
        }
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let bytes = <[u8; 65]>::from(self);
        write!(f, "{}", hex::encode(bytes))
    }
}

impl From<&Signature> for [u8; 65] {
    fn from(src: &Signature) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(src.r.as_bytes());
        bytes[32..64].copy_from_slice(src.s.as_bytes());
        bytes[64] = src.v as u8;
        bytes
    }
}

impl Encode for Signature {
    fn write_to<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        writer.write_all(&<[u8; 65]>::from(self))?;
        Ok(65)
    }
}

impl Decode for Signature {
    fn read_from<R>(reader: &mut R) -> Result<Self, ProtocolError>
    where
        R: std::io::Read,
        Self: Sized,
    {
        let mut bytes = [0u8; 65];
        reader.read_exact(&mut bytes)?;
        Ok(Self {
            r: crate::H256::from_slice(&bytes[..32]),
            s: crate::H256::from_slice(&bytes[32..64]),
            v: bytes[64] as u64,
        })
    }
}
