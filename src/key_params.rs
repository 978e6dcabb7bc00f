//! Key algorithms, digest algorithms, and key-generation parameters.
//!
//! SM2 shares its PKCS#8 structure with ECDSA P-256, so `KeyType` travels
//! as side-band metadata next to every key blob; where a blob arrives
//! without metadata, the signature type of the enclosing certificate is
//! authoritative.

use std::fmt;

use crate::error::{Error, Result};
use crate::tlv;

/// Tagged key algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyType {
    None,
    Rsa,
    Ec,
    Sm2,
    Hmac,
}

impl KeyType {
    /// Whether keys of this type can produce signatures.
    pub fn is_signing_capable(self) -> bool {
        !matches!(self, KeyType::None)
    }

    /// Stable tag used when persisting the type next to a key blob.
    pub fn as_tag(self) -> &'static str {
        match self {
            KeyType::None => "NONE",
            KeyType::Rsa => "RSA",
            KeyType::Ec => "EC",
            KeyType::Sm2 => "SM2",
            KeyType::Hmac => "HMAC",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            "NONE" => Some(KeyType::None),
            "RSA" => Some(KeyType::Rsa),
            "EC" => Some(KeyType::Ec),
            "SM2" => Some(KeyType::Sm2),
            "HMAC" => Some(KeyType::Hmac),
            _ => None,
        }
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            KeyType::None => "NONE",
            KeyType::Rsa => "RSA",
            KeyType::Ec => "EC",
            KeyType::Sm2 => "SM2",
            KeyType::Hmac => "HMAC",
        };
        write!(f, "{}", s)
    }
}

/// Digest algorithm selector for signing and verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DigestAlgorithm {
    None,
    Sha256,
    Sm3,
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DigestAlgorithm::None => "NONE",
            DigestAlgorithm::Sha256 => "SHA256",
            DigestAlgorithm::Sm3 => "SM3",
        };
        write!(f, "{}", s)
    }
}

/// Map a (key type, digest algorithm) pair to the wire SignatureType.
///
/// The digest argument is accepted for interface symmetry; each key type
/// fixes its digest on the wire (SHA-256, or SM3 for SM2).
pub fn signature_type_for(key_type: KeyType, _digest: DigestAlgorithm) -> Result<u64> {
    match key_type {
        KeyType::Rsa => Ok(tlv::SIGNATURE_SHA256_WITH_RSA),
        KeyType::Ec => Ok(tlv::SIGNATURE_SHA256_WITH_ECDSA),
        KeyType::Sm2 => Ok(tlv::SIGNATURE_SM3_WITH_SM2),
        KeyType::Hmac => Ok(tlv::SIGNATURE_HMAC_WITH_SHA256),
        KeyType::None => Err(Error::KeyChain(format!(
            "Unsupported key type {}",
            key_type
        ))),
    }
}

/// Map a wire SignatureType back to the key type that produced it.
/// Total on the defined set; unknown values map to `KeyType::None`.
pub fn key_type_from_signature_type(signature_type: u64) -> KeyType {
    match signature_type {
        tlv::SIGNATURE_SHA256_WITH_RSA => KeyType::Rsa,
        tlv::SIGNATURE_SHA256_WITH_ECDSA => KeyType::Ec,
        tlv::SIGNATURE_HMAC_WITH_SHA256 => KeyType::Hmac,
        tlv::SIGNATURE_SM3_WITH_SM2 => KeyType::Sm2,
        _ => KeyType::None,
    }
}

/// Parameters for key generation, dispatched on by the TPM and the
/// PrivateKey factories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyParams {
    Rsa { bits: u32 },
    Ec { bits: u32 },
    Sm2 { bits: u32 },
    Hmac { bits: u32 },
}

impl KeyParams {
    pub const DEFAULT_RSA_BITS: u32 = 2048;
    pub const DEFAULT_EC_BITS: u32 = 256;
    pub const DEFAULT_HMAC_BITS: u32 = 256;

    pub fn rsa() -> Self {
        KeyParams::Rsa {
            bits: Self::DEFAULT_RSA_BITS,
        }
    }

    pub fn ec() -> Self {
        KeyParams::Ec {
            bits: Self::DEFAULT_EC_BITS,
        }
    }

    pub fn sm2() -> Self {
        KeyParams::Sm2 { bits: 256 }
    }

    pub fn hmac() -> Self {
        KeyParams::Hmac {
            bits: Self::DEFAULT_HMAC_BITS,
        }
    }

    pub fn key_type(&self) -> KeyType {
        match self {
            KeyParams::Rsa { .. } => KeyType::Rsa,
            KeyParams::Ec { .. } => KeyType::Ec,
            KeyParams::Sm2 { .. } => KeyType::Sm2,
            KeyParams::Hmac { .. } => KeyType::Hmac,
        }
    }

    pub fn bits(&self) -> u32 {
        match *self {
            KeyParams::Rsa { bits }
            | KeyParams::Ec { bits }
            | KeyParams::Sm2 { bits }
            | KeyParams::Hmac { bits } => bits,
        }
    }
}

impl Default for KeyParams {
    /// EC P-256.
    fn default() -> Self {
        KeyParams::ec()
    }
}
