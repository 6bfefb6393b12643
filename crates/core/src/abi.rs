//! Minimal Solidity ABI codec
//!
//! Covers exactly what the arena contracts need: static argument words,
//! one dynamic `uint8[]` argument, flat return tuples, offset-based dynamic
//! structs and `address[]`/`uint8[]` returns.

use tiny_keccak::{Hasher, Keccak};

use crate::error::AbiError;
use crate::types::{Address, Hash, U256};

/// Size of one ABI word
pub const WORD: usize = 32;

/// Selector of the standard `Error(string)` revert payload
pub const ERROR_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Selector of the compiler-inserted `Panic(uint256)` revert payload
pub const PANIC_SELECTOR: [u8; 4] = [0x4e, 0x48, 0x7b, 0x71];

/// Compute keccak256 hash
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak::v256();
    hasher.update(data);
    let mut output = [0u8; 32];
    hasher.finalize(&mut output);
    output
}

/// Function selector: first four bytes of `keccak256(signature)`
pub fn selector(signature: &str) -> [u8; 4] {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Event topic0: full `keccak256(signature)`
pub fn event_topic(signature: &str) -> Hash {
    keccak256(signature.as_bytes())
}

/// A single call argument
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Uint(U256),
    Address(Address),
    FixedBytes(Hash),
    Bool(bool),
    /// Dynamic `uint8[]`
    Uint8Array(Vec<u8>),
}

impl From<u64> for Token {
    fn from(value: u64) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl From<u8> for Token {
    fn from(value: u8) -> Self {
        Self::Uint(U256::from(value))
    }
}

impl From<U256> for Token {
    fn from(value: U256) -> Self {
        Self::Uint(value)
    }
}

impl From<Address> for Token {
    fn from(value: Address) -> Self {
        Self::Address(value)
    }
}

/// Left-pad a `u64` into an ABI word
pub fn u64_word(value: u64) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[24..32].copy_from_slice(&value.to_be_bytes());
    word
}

fn address_word(address: &Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..32].copy_from_slice(address.as_slice());
    word
}

/// Encode a head/tail argument list
pub fn encode_args(args: &[Token]) -> Vec<u8> {
    let head_len = args.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();

    for arg in args {
        match arg {
            Token::Uint(v) => head.extend_from_slice(&v.to_be_bytes::<32>()),
            Token::Address(a) => head.extend_from_slice(&address_word(a)),
            Token::FixedBytes(b) => head.extend_from_slice(b),
            Token::Bool(b) => head.extend_from_slice(&u64_word(u64::from(*b))),
            Token::Uint8Array(items) => {
                head.extend_from_slice(&u64_word((head_len + tail.len()) as u64));
                tail.extend_from_slice(&u64_word(items.len() as u64));
                for item in items {
                    tail.extend_from_slice(&u64_word(u64::from(*item)));
                }
            }
        }
    }

    head.extend_from_slice(&tail);
    head
}

/// Encode `selector(signature) ++ encode_args(args)`
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let body = encode_args(args);
    let mut calldata = Vec::with_capacity(4 + body.len());
    calldata.extend_from_slice(&selector(signature));
    calldata.extend_from_slice(&body);
    calldata
}

/// Word-addressed view over ABI return data
#[derive(Debug, Clone, Copy)]
pub struct Words<'a> {
    data: &'a [u8],
}

impl<'a> Words<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    /// Number of complete words
    pub const fn len(&self) -> usize {
        self.data.len() / WORD
    }

    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Fail unless at least `count` words are present
    pub fn require(&self, count: usize) -> Result<(), AbiError> {
        let got = self.data.len();
        let need = count.checked_mul(WORD).ok_or(AbiError::TooShort { need: usize::MAX, got })?;
        if got < need {
            return Err(AbiError::TooShort { need, got });
        }
        Ok(())
    }

    /// Raw word at `index`
    pub fn word(&self, index: usize) -> Result<&'a [u8], AbiError> {
        self.require(index.saturating_add(1))?;
        Ok(&self.data[index * WORD..(index + 1) * WORD])
    }

    pub fn u256(&self, index: usize) -> Result<U256, AbiError> {
        Ok(U256::from_be_slice(self.word(index)?))
    }

    pub fn u64(&self, index: usize) -> Result<u64, AbiError> {
        let word = self.word(index)?;
        if word[..24].iter().any(|b| *b != 0) {
            return Err(AbiError::Overflow { index, ty: "u64" });
        }
        let mut bytes = [0u8; 8];
        bytes.copy_from_slice(&word[24..32]);
        Ok(u64::from_be_bytes(bytes))
    }

    pub fn u8(&self, index: usize) -> Result<u8, AbiError> {
        let value = self.u64(index)?;
        u8::try_from(value).map_err(|_| AbiError::Overflow { index, ty: "u8" })
    }

    pub fn bool(&self, index: usize) -> Result<bool, AbiError> {
        Ok(self.u64(index)? != 0)
    }

    pub fn address(&self, index: usize) -> Result<Address, AbiError> {
        Ok(Address::from_slice(&self.word(index)?[12..32]))
    }

    pub fn bytes32(&self, index: usize) -> Result<Hash, AbiError> {
        let mut out = [0u8; 32];
        out.copy_from_slice(self.word(index)?);
        Ok(out)
    }

    fn offset(&self, index: usize) -> Result<usize, AbiError> {
        let offset = self.u64(index)? as usize;
        if offset > self.data.len() {
            return Err(AbiError::InvalidOffset { offset });
        }
        Ok(offset)
    }

    /// Follow the offset stored at `index` into a nested dynamic tuple
    pub fn tuple_at(&self, index: usize) -> Result<Self, AbiError> {
        let offset = self.offset(index)?;
        Ok(Self::new(&self.data[offset..]))
    }

    /// Length-prefixed element words of the dynamic array referenced at `index`
    fn array_at(&self, index: usize) -> Result<(usize, Self), AbiError> {
        let inner = self.tuple_at(index)?;
        let len = inner.u64(0)? as usize;
        let elements = Self::new(&inner.data[WORD..]);
        elements.require(len)?;
        Ok((len, elements))
    }

    pub fn address_array(&self, index: usize) -> Result<Vec<Address>, AbiError> {
        let (len, elements) = self.array_at(index)?;
        (0..len).map(|i| elements.address(i)).collect()
    }

    pub fn u8_array(&self, index: usize) -> Result<Vec<u8>, AbiError> {
        let (len, elements) = self.array_at(index)?;
        (0..len).map(|i| elements.u8(i)).collect()
    }

    /// Dynamic `string` referenced at `index`, lossily decoded
    pub fn string(&self, index: usize) -> Result<String, AbiError> {
        let inner = self.tuple_at(index)?;
        let len = inner.u64(0)? as usize;
        let bytes = &inner.data[WORD..];
        if bytes.len() < len {
            return Err(AbiError::TooShort { need: len, got: bytes.len() });
        }
        Ok(String::from_utf8_lossy(&bytes[..len]).into_owned())
    }
}

/// Decode a revert payload into a readable reason
///
/// `Error(string)` yields the message, `Panic(uint256)` yields
/// `panic 0x..`; anything else is `None`.
pub fn decode_revert_reason(data: &[u8]) -> Option<String> {
    if data.len() < 4 {
        return None;
    }
    let (sel, body) = data.split_at(4);
    let words = Words::new(body);
    if sel == ERROR_SELECTOR {
        words.string(0).ok()
    } else if sel == PANIC_SELECTOR {
        words.u256(0).ok().map(|code| format!("panic 0x{:x}", code))
    } else {
        None
    }
}

/// `0x`-prefixed lowercase hex
pub fn to_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Decode hex with or without `0x`
pub fn from_hex(s: &str) -> Result<Vec<u8>, hex::FromHexError> {
    let s = s.trim();
    let s = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
    if s.len() % 2 == 1 {
        return hex::decode(format!("0{}", s));
    }
    hex::decode(s)
}

/// Decode a 32-byte hex value
pub fn hash_from_hex(s: &str) -> Result<Hash, hex::FromHexError> {
    let bytes = from_hex(s)?;
    if bytes.len() != 32 {
        return Err(hex::FromHexError::InvalidStringLength);
    }
    let mut out = [0u8; 32];
    out.copy_from_slice(&bytes);
    Ok(out)
}
