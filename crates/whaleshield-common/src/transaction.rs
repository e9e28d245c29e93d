//! Base-layer transaction wire format
//!
//! Only the parts of the format needed to sign a transaction built elsewhere
//! (by the swap aggregator or the shielded pool) are decoded: the signature
//! slots, the message header and the static account keys. Everything after
//! the account keys is carried as opaque message bytes.
//!
//! ```text
//! transaction := compact_u16(n) || signature[64] * n || message
//! message     := [0x80 | version]? || header[3] || compact_u16(k) || key[32] * k || rest
//! ```

use std::fmt;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, Verifier, VerifyingKey};
use serde::{Deserialize, Serialize};

use crate::address::{Address, ADDRESS_LEN};
use crate::error::Error;

/// Length of an ed25519 signature
pub const SIGNATURE_LEN: usize = 64;

/// Length of a recent blockhash
pub const BLOCKHASH_LEN: usize = 32;

const VERSION_PREFIX_MASK: u8 = 0x80;

/// Reference to a submitted transaction (its base58 signature)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransactionRef(String);

impl TransactionRef {
    /// Create new [`TransactionRef`]
    pub fn new<S: Into<String>>(reference: S) -> Self {
        Self(reference.into())
    }

    /// Reference as str
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TransactionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ed25519 signature slot
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature([u8; SIGNATURE_LEN]);

impl Signature {
    /// Empty (unsigned) slot
    pub const EMPTY: Signature = Signature([0u8; SIGNATURE_LEN]);

    /// Raw bytes
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LEN] {
        self.0
    }

    /// True when the slot has not been filled
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; SIGNATURE_LEN]
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Signature({self})")
    }
}

impl From<&Signature> for TransactionRef {
    fn from(signature: &Signature) -> Self {
        TransactionRef(signature.to_string())
    }
}

/// Message header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MessageHeader {
    /// Number of signatures required for the message to be valid
    pub num_required_signatures: u8,
    /// Number of signed accounts that are read only
    pub num_readonly_signed_accounts: u8,
    /// Number of unsigned accounts that are read only
    pub num_readonly_unsigned_accounts: u8,
}

/// Transaction (legacy or versioned) with decoded signer set
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionedTransaction {
    signatures: Vec<Signature>,
    message: Vec<u8>,
    version: Option<u8>,
    header: MessageHeader,
    account_keys: Vec<Address>,
}

impl VersionedTransaction {
    /// Wrap an unsigned message, allocating one empty slot per required signer
    pub fn new_unsigned(message: Vec<u8>) -> Result<Self, Error> {
        let (version, header, account_keys) = decode_message(&message)?;

        Ok(Self {
            signatures: vec![Signature::EMPTY; header.num_required_signatures as usize],
            message,
            version,
            header,
            account_keys,
        })
    }

    /// Decode from wire bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, Error> {
        let (signature_count, mut offset) = decode_compact_u16(bytes, 0)?;

        let mut signatures = Vec::with_capacity(signature_count as usize);
        for _ in 0..signature_count {
            let slot = bytes
                .get(offset..offset + SIGNATURE_LEN)
                .ok_or_else(|| Error::InvalidTransaction("truncated signatures".to_string()))?;
            let mut signature = [0u8; SIGNATURE_LEN];
            signature.copy_from_slice(slot);
            signatures.push(Signature(signature));
            offset += SIGNATURE_LEN;
        }

        let message = bytes[offset..].to_vec();
        let (version, header, account_keys) = decode_message(&message)?;

        if signatures.len() != header.num_required_signatures as usize {
            return Err(Error::InvalidTransaction(format!(
                "{} signature slots for {} required signers",
                signatures.len(),
                header.num_required_signatures
            )));
        }

        Ok(Self {
            signatures,
            message,
            version,
            header,
            account_keys,
        })
    }

    /// Decode from base64, the encoding used by the aggregator and RPC
    pub fn from_base64(encoded: &str) -> Result<Self, Error> {
        let bytes = BASE64.decode(encoded.trim())?;
        Self::from_bytes(&bytes)
    }

    /// Encode to wire bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes =
            Vec::with_capacity(3 + self.signatures.len() * SIGNATURE_LEN + self.message.len());
        encode_compact_u16(self.signatures.len() as u16, &mut bytes);
        for signature in &self.signatures {
            bytes.extend_from_slice(&signature.0);
        }
        bytes.extend_from_slice(&self.message);
        bytes
    }

    /// Encode to base64
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.to_bytes())
    }

    /// Message bytes covered by the signatures
    pub fn message_bytes(&self) -> &[u8] {
        &self.message
    }

    /// Message version, `None` for legacy messages
    pub fn version(&self) -> Option<u8> {
        self.version
    }

    /// Message header
    pub fn header(&self) -> MessageHeader {
        self.header
    }

    /// Static account keys
    pub fn account_keys(&self) -> &[Address] {
        &self.account_keys
    }

    /// Accounts that must sign, in slot order
    pub fn required_signers(&self) -> &[Address] {
        let count = (self.header.num_required_signatures as usize).min(self.account_keys.len());
        &self.account_keys[..count]
    }

    /// Fee payer is always the first account key
    pub fn fee_payer(&self) -> Option<&Address> {
        self.account_keys.first()
    }

    /// Signature slots
    pub fn signatures(&self) -> &[Signature] {
        &self.signatures
    }

    /// The fee payer's signature identifies the transaction on the ledger
    pub fn id(&self) -> Option<TransactionRef> {
        self.signatures
            .first()
            .filter(|s| !s.is_empty())
            .map(TransactionRef::from)
    }

    /// Sign with `key`, filling the slot that belongs to its address
    pub fn sign(&mut self, key: &SigningKey) -> Result<(), Error> {
        let address = Address::from(key.verifying_key());
        let position = self
            .required_signers()
            .iter()
            .position(|signer| signer == &address)
            .ok_or(Error::SignerNotRequired(address))?;

        let signature = key.sign(&self.message);
        self.signatures[position] = Signature(signature.to_bytes());

        tracing::trace!("Signed transaction slot {} for {}", position, address);

        Ok(())
    }

    /// True when every required signer has filled its slot
    pub fn is_fully_signed(&self) -> bool {
        self.signatures.iter().all(|s| !s.is_empty())
    }

    /// Verify every signature slot against its signer
    pub fn verify(&self) -> Result<(), Error> {
        for (signature, signer) in self.signatures.iter().zip(self.required_signers()) {
            if signature.is_empty() {
                return Err(Error::MissingSignature(*signer));
            }

            let key = VerifyingKey::try_from(*signer)?;
            let signature = ed25519_dalek::Signature::from_bytes(&signature.0);
            key.verify(&self.message, &signature)
                .map_err(|_| Error::InvalidSignature(*signer))?;
        }

        Ok(())
    }
}

/// Instruction with account indexes into the message key list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledInstruction {
    /// Index of the program account
    pub program_id_index: u8,
    /// Indexes of the accounts passed to the program
    pub accounts: Vec<u8>,
    /// Program input
    pub data: Vec<u8>,
}

/// Legacy message builder
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LegacyMessage {
    /// Header
    pub header: MessageHeader,
    /// Account keys, signers first
    pub account_keys: Vec<Address>,
    /// Recent blockhash
    pub recent_blockhash: [u8; BLOCKHASH_LEN],
    /// Instructions
    pub instructions: Vec<CompiledInstruction>,
}

impl LegacyMessage {
    /// Message paid and signed by `payer` carrying a single instruction
    pub fn new_with_payer(
        payer: Address,
        program: Address,
        data: Vec<u8>,
        recent_blockhash: [u8; BLOCKHASH_LEN],
    ) -> Self {
        Self {
            header: MessageHeader {
                num_required_signatures: 1,
                num_readonly_signed_accounts: 0,
                num_readonly_unsigned_accounts: 1,
            },
            account_keys: vec![payer, program],
            recent_blockhash,
            instructions: vec![CompiledInstruction {
                program_id_index: 1,
                accounts: vec![0],
                data,
            }],
        }
    }

    /// Serialize to message bytes
    pub fn serialize(&self) -> Vec<u8> {
        let mut bytes = vec![
            self.header.num_required_signatures,
            self.header.num_readonly_signed_accounts,
            self.header.num_readonly_unsigned_accounts,
        ];

        encode_compact_u16(self.account_keys.len() as u16, &mut bytes);
        for key in &self.account_keys {
            bytes.extend_from_slice(key.as_bytes());
        }

        bytes.extend_from_slice(&self.recent_blockhash);

        encode_compact_u16(self.instructions.len() as u16, &mut bytes);
        for instruction in &self.instructions {
            bytes.push(instruction.program_id_index);
            encode_compact_u16(instruction.accounts.len() as u16, &mut bytes);
            bytes.extend_from_slice(&instruction.accounts);
            encode_compact_u16(instruction.data.len() as u16, &mut bytes);
            bytes.extend_from_slice(&instruction.data);
        }

        bytes
    }

    /// Unsigned transaction wrapping this message
    pub fn into_transaction(self) -> Result<VersionedTransaction, Error> {
        VersionedTransaction::new_unsigned(self.serialize())
    }
}

fn decode_message(message: &[u8]) -> Result<(Option<u8>, MessageHeader, Vec<Address>), Error> {
    let first = *message
        .first()
        .ok_or_else(|| Error::InvalidTransaction("empty message".to_string()))?;

    let (version, mut offset) = if first & VERSION_PREFIX_MASK != 0 {
        let version = first & !VERSION_PREFIX_MASK;
        if version != 0 {
            return Err(Error::UnsupportedTransactionVersion(version));
        }
        (Some(version), 1)
    } else {
        (None, 0)
    };

    let header = message
        .get(offset..offset + 3)
        .map(|h| MessageHeader {
            num_required_signatures: h[0],
            num_readonly_signed_accounts: h[1],
            num_readonly_unsigned_accounts: h[2],
        })
        .ok_or_else(|| Error::InvalidTransaction("truncated header".to_string()))?;
    offset += 3;

    let (key_count, next) = decode_compact_u16(message, offset)?;
    offset = next;

    let mut account_keys = Vec::with_capacity(key_count as usize);
    for _ in 0..key_count {
        let key = message
            .get(offset..offset + ADDRESS_LEN)
            .ok_or_else(|| Error::InvalidTransaction("truncated account keys".to_string()))?;
        account_keys.push(Address::from_slice(key)?);
        offset += ADDRESS_LEN;
    }

    if (header.num_required_signatures as usize) > account_keys.len() {
        return Err(Error::InvalidTransaction(format!(
            "{} required signers but only {} account keys",
            header.num_required_signatures,
            account_keys.len()
        )));
    }

    Ok((version, header, account_keys))
}

/// Decode a compact-u16 starting at `offset`, returning the value and the next offset
fn decode_compact_u16(bytes: &[u8], offset: usize) -> Result<(u16, usize), Error> {
    let mut value: u32 = 0;
    for i in 0..3 {
        let byte = *bytes
            .get(offset + i)
            .ok_or_else(|| Error::InvalidTransaction("truncated length prefix".to_string()))?;
        value |= ((byte & 0x7f) as u32) << (i * 7);
        if byte & 0x80 == 0 {
            return u16::try_from(value)
                .map(|v| (v, offset + i + 1))
                .map_err(|_| Error::InvalidTransaction("length prefix overflow".to_string()));
        }
    }

    Err(Error::InvalidTransaction(
        "length prefix longer than 3 bytes".to_string(),
    ))
}

fn encode_compact_u16(value: u16, out: &mut Vec<u8>) {
    let mut rem = value;
    loop {
        let mut byte = (rem & 0x7f) as u8;
        rem >>= 7;
        if rem == 0 {
            out.push(byte);
            break;
        }
        byte |= 0x80;
        out.push(byte);
    }
}
