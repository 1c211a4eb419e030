use sha3::{Digest, Keccak256};

use crate::{Decode, Encode, ProtocolError, H256};

/// Length of the fixed-width fields preceding the body.
pub const MESSAGE_PREFIX_LEN: usize = 1 + 4 + 4 + 32 + 4 + 32;

/// A full interchain message between chains.
///
/// All fixed-width fields are big-endian; the variable-length body is last,
/// so the encoding has no internal framing.
#[derive(Clone, Debug, Default, Eq, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BridgeMessage {
    /// 1   Protocol version
    pub version: u8,
    /// 4   Count of all previous messages dispatched from the origin
    pub nonce: u32,
    /// 4   Domain of the origin chain
    pub origin: u32,
    /// 32  Address in origin convention, chain-agnostic form
    pub sender: H256,
    /// 4   Domain of the destination chain
    pub destination: u32,
    /// 32  Address in destination convention, chain-agnostic form
    pub recipient: H256,
    /// 0+  Message contents
    pub body: Vec<u8>,
}

impl Encode for BridgeMessage {
    fn write_to<W>(&self, writer: &mut W) -> std::io::Result<usize>
    where
        W: std::io::Write,
    {
        writer.write_all(&[self.version])?;
        writer.write_all(&self.nonce.to_be_bytes())?;
        writer.write_all(&self.origin.to_be_bytes())?;
        writer.write_all(self.sender.as_ref())?;
        writer.write_all(&self.destination.to_be_bytes())?;
        writer.write_all(self.recipient.as_ref())?;
        writer.write_all(&self.body)?;
        Ok(MESSAGE_PREFIX_LEN + self.body.len())
    }
}

impl Decode for BridgeMessage {
    fn read_from<R>(reader: &mut R) -> Result<Self, ProtocolError>
    where
        R: std::io::Read,
    {
        let mut version = [0u8; 1];
        reader.read_exact(&mut version)?;

        let mut nonce = [0u8; 4];
        reader.read_exact(&mut nonce)?;

        let mut origin = [0u8; 4];
        reader.read_exact(&mut origin)?;

        let mut sender = H256::zero();
        reader.read_exact(sender.as_mut())?;

        let mut destination = [0u8; 4];
        reader.read_exact(&mut destination)?;

        let mut recipient = H256::zero();
        reader.read_exact(recipient.as_mut())?;

        let mut body = vec![];
        reader.read_to_end(&mut body)?;

        Ok(Self {
            version: version[0],
            nonce: u32::from_be_bytes(nonce),
            origin: u32::from_be_bytes(origin),
            sender,
            destination: u32::from_be_bytes(destination),
            recipient,
            body,
        })
    }
}

impl BridgeMessage {
    /// Decode a message from its canonical byte form.
    pub fn decode(buf: &[u8]) -> Result<Self, ProtocolError> {
        if buf.len() < MESSAGE_PREFIX_LEN {
            return Err(ProtocolError::MalformedMessage {
                actual: buf.len(),
                expected: MESSAGE_PREFIX_LEN,
            });
        }
        Self::read_from(&mut std::io::Cursor::new(buf))
    }

    /// The keccak256 digest of the canonical encoding; the message's
    /// globally unique id and its leaf in the dispatch tree.
    pub fn id(&self) -> H256 {
        H256::from_slice(Keccak256::digest(self.to_vec()).as_slice())
    }
}
