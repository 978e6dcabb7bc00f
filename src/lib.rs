//! NDN KeyChain - Named-Data Networking client security core
//!
//! This library implements the security subsystem of an NDN client stack:
//! the KeyChain facade over a Public Information Base (PIB) and a Trusted
//! Platform Module (TPM) abstraction, built on an OpenSSL-backed transform
//! pipeline.
//!
//! # Overview
//!
//! ```text
//! KeyChain
//!   ├── Pib (pib-memory | pib-sqlite3)      identities / keys / certificates
//!   └── Tpm (tpm-memory | tpm-file)         protected private-key material
//!         └── PrivateKey / PublicKey        over the transform pipeline
//! ```
//!
//! The KeyChain composes one PIB and one TPM, selected by locator URIs of
//! the form `scheme:location`, and keeps them consistent: every key
//! recorded in the PIB has matching private material in the TPM, and the
//! PIB remembers which TPM it was paired with.
//!
//! # Quick Start
//!
//! ```no_run
//! use ndn_keychain::{KeyChain, KeyParams, Name, SigningInfo};
//! use ndn_keychain::data::Data;
//!
//! # fn example() -> ndn_keychain::Result<()> {
//! let mut key_chain = KeyChain::new("pib-memory:", "tpm-memory:", true)?;
//! key_chain.create_identity(&Name::from_uri("/alice")?, &KeyParams::default())?;
//!
//! let mut data = Data::new(Name::from_uri("/alice/hello")?);
//! data.set_content(b"payload".to_vec());
//! key_chain.sign_data(&mut data, &SigningInfo::default())?;
//! # Ok(())
//! # }
//! ```
//!
//! # Key-type handling
//!
//! RSA, ECDSA, SM2, and HMAC keys are supported end to end. SM2 key blobs
//! are structurally identical to ECDSA P-256 at the PKCS#8 level, so the
//! key type travels as side-band metadata next to every blob; when a key
//! arrives inside a SafeBag, the signature type of the enclosing
//! certificate is authoritative.
//!
//! # Concurrency
//!
//! A KeyChain instance is single-threaded: all operations are synchronous
//! and callers must serialize access externally. Separate instances
//! sharing a `pib-sqlite3` database rely on SQLite's own locking.

pub mod certificate;
pub mod configs;
pub mod data;
pub mod error;
pub mod interest;
pub mod key_chain;
pub mod key_params;
pub mod name;
pub mod pib;
pub mod private_key;
pub mod public_key;
pub mod safe_bag;
pub mod signing_info;
pub mod tlv;
pub mod tpm;
pub mod transform;
pub mod verification_helpers;

pub use certificate::Certificate;
pub use error::{Error, Result};
pub use key_chain::KeyChain;
pub use key_params::{DigestAlgorithm, KeyParams, KeyType};
pub use name::{Component, Name};
pub use private_key::PrivateKey;
pub use public_key::PublicKey;
pub use safe_bag::SafeBag;
pub use signing_info::{SignedInterestFormat, Signer, SigningInfo};
