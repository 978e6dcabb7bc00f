//! Error taxonomy for the security core.
//!
//! Every fallible operation in the crate returns [`Result`]. The variants
//! mirror the layers they originate from: PIB lookups, TPM backends, key
//! codecs, TLV parsing, and the KeyChain itself. Callers that only care
//! about success can treat [`Error`] as opaque; callers implementing
//! recovery (locator reset, bare-digest fallback) match on the variant.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// The TPM locator recorded in the PIB disagrees with the requested one
    /// and the caller did not permit a reset.
    #[error("TPM locator supplied does not match TPM locator in PIB: {recorded} != {requested}")]
    LocatorMismatch { recorded: String, requested: String },

    /// Signing parameters could not be resolved to a usable key.
    #[error("invalid signing info: {0}")]
    InvalidSigningInfo(String),

    /// PIB lookup miss or missing default pointer.
    #[error("PIB error: {0}")]
    Pib(String),

    /// TPM backend failure (file I/O, missing key material, backend state).
    #[error("TPM error: {0}")]
    Tpm(String),

    /// Private key load/save/generate/sign/decrypt failure.
    #[error("private key error: {0}")]
    PrivateKey(String),

    /// Public key load/save/encrypt failure.
    #[error("public key error: {0}")]
    PublicKey(String),

    /// Contract violation by the caller (mismatched names, wrong key type).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Malformed TLV or URI input.
    #[error("parse error: {0}")]
    Parse(String),

    /// KeyChain-level failure (unsupported backend scheme, SafeBag wrap).
    #[error("{0}")]
    KeyChain(String),

    #[error(transparent)]
    OpenSsl(#[from] openssl::error::ErrorStack),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),
}

impl Error {
    /// Shorthand for the unsupported-scheme failure raised during backend
    /// resolution.
    pub fn unsupported_scheme(scheme: &str) -> Self {
        Error::KeyChain(format!("{} is not supported", scheme))
    }
}
