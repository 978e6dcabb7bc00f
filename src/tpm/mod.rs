//! TPM front: the protected private-key store.
//!
//! The front owns one backend, derives key names, and routes signing
//! requests. Key material never leaves the TPM except as encrypted PKCS#8
//! through the explicit export operation.

mod back_end;
mod back_end_file;
mod back_end_mem;

pub use back_end::TpmBackEnd;
pub use back_end_file::FileBackEnd;
pub use back_end_mem::MemoryBackEnd;

use tracing::debug;

use crate::certificate::construct_key_name;
use crate::error::{Error, Result};
use crate::key_params::{DigestAlgorithm, KeyParams, KeyType};
use crate::name::{Component, Name};
use crate::private_key::PrivateKey;

/// Number of random octets in a generated key id component.
const KEY_ID_LENGTH: usize = 8;

pub struct Tpm {
    scheme: String,
    location: String,
    back_end: Box<dyn TpmBackEnd>,
}

impl Tpm {
    pub(crate) fn new(scheme: String, location: String, back_end: Box<dyn TpmBackEnd>) -> Self {
        Tpm {
            scheme,
            location,
            back_end,
        }
    }

    /// Canonical locator `scheme:location`.
    pub fn locator(&self) -> String {
        format!("{}:{}", self.scheme, self.location)
    }

    pub fn has_key(&self, key_name: &Name) -> Result<bool> {
        self.back_end.has_key(key_name)
    }

    /// Generate a key for `identity` and return the derived key name
    /// `<identity>/KEY/<key-id>`. The key id is random and retried on the
    /// (unlikely) collision.
    pub fn create_key(&mut self, identity: &Name, params: &KeyParams) -> Result<Name> {
        loop {
            let mut key_id = [0u8; KEY_ID_LENGTH];
            openssl::rand::rand_bytes(&mut key_id)?;
            let key_name = construct_key_name(identity, Component::generic(key_id.to_vec()));
            if self.back_end.has_key(&key_name)? {
                continue;
            }
            self.back_end.create_key(&key_name, params)?;
            debug!(key = %key_name, "created key in TPM");
            return Ok(key_name);
        }
    }

    /// Remove the key; absent keys are ignored.
    pub fn delete_key(&mut self, key_name: &Name) -> Result<()> {
        self.back_end.delete_key(key_name)
    }

    /// The key's public half in PKCS#8 form; `None` when the key is absent.
    pub fn get_public_key(&self, key_name: &Name) -> Result<Option<Vec<u8>>> {
        match self.back_end.get_key(key_name)? {
            None => Ok(None),
            Some(key) => Ok(Some(key.derive_public_key()?)),
        }
    }

    /// Sign `bufs` with the named key; `None` when the key is absent.
    ///
    /// `key_type` is the caller's side-band knowledge (PIB record or
    /// certificate signature type) and overrides the stored tag, which
    /// cannot distinguish SM2 from EC for imported blobs.
    pub fn sign(
        &self,
        bufs: &[&[u8]],
        key_name: &Name,
        key_type: KeyType,
        digest: DigestAlgorithm,
    ) -> Result<Option<Vec<u8>>> {
        match self.back_end.get_key(key_name)? {
            None => Ok(None),
            Some(key) => {
                let sig = key.with_key_type(key_type).sign_buffers(bufs, digest)?;
                Ok(Some(sig))
            }
        }
    }

    /// Export the named key as encrypted PKCS#8 under `password`.
    pub fn export_private_key(&self, key_name: &Name, password: &[u8]) -> Result<Vec<u8>> {
        self.back_end.export_key(key_name, password)
    }

    /// Import an encrypted PKCS#8 blob under `key_name`.
    pub fn import_private_key(
        &mut self,
        key_name: &Name,
        pkcs8: &[u8],
        password: &[u8],
    ) -> Result<()> {
        self.back_end.import_key(key_name, pkcs8, password)
    }

    /// Import an already-loaded key under `key_name`.
    pub fn import_key_pair(&mut self, key_name: &Name, key: PrivateKey) -> Result<()> {
        self.back_end.import_key_pair(key_name, key)
    }

    /// Unlock the backend where supported.
    pub fn unlock(&mut self, password: &[u8]) -> bool {
        self.back_end.unlock(password)
    }

    /// Remove every key. Test support.
    pub fn clear(&mut self) -> Result<()> {
        self.back_end.clear()
    }
}

impl std::fmt::Debug for Tpm {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tpm").field("locator", &self.locator()).finish()
    }
}

/// Instantiate a TPM from a parsed locator. The scheme set is closed;
/// unknown schemes fail with "<scheme> is not supported".
pub(crate) fn create_tpm(scheme: &str, location: &str) -> Result<Tpm> {
    let back_end: Box<dyn TpmBackEnd> = match scheme {
        MemoryBackEnd::SCHEME => Box::new(MemoryBackEnd::new(location)),
        FileBackEnd::SCHEME => Box::new(FileBackEnd::new(location)?),
        other => return Err(Error::unsupported_scheme(other)),
    };
    Ok(Tpm::new(scheme.to_string(), location.to_string(), back_end))
}
