//! TPM backend capability interface.

use crate::error::Result;
use crate::key_params::KeyParams;
use crate::name::Name;
use crate::private_key::PrivateKey;

/// Storage backend for private key material.
///
/// Backends are self-contained: the front resolves names and policies, the
/// backend only stores, loads, and deletes keys. All key blobs crossing
/// this interface are PKCS#8; protection at rest is the backend's business.
pub trait TpmBackEnd {
    fn has_key(&self, key_name: &Name) -> Result<bool>;

    /// Load a key; `None` when the backend has no key of that name.
    fn get_key(&self, key_name: &Name) -> Result<Option<PrivateKey>>;

    /// Generate and persist a key under `key_name`.
    fn create_key(&mut self, key_name: &Name, params: &KeyParams) -> Result<()>;

    /// Remove a key; deleting an absent key is not an error.
    fn delete_key(&mut self, key_name: &Name) -> Result<()>;

    /// Export as encrypted PKCS#8 under `password`.
    fn export_key(&self, key_name: &Name, password: &[u8]) -> Result<Vec<u8>>;

    /// Import an encrypted PKCS#8 blob. Fails if the name is taken.
    fn import_key(&mut self, key_name: &Name, pkcs8: &[u8], password: &[u8]) -> Result<()>;

    /// Import an already-loaded key. Fails if the name is taken.
    fn import_key_pair(&mut self, key_name: &Name, key: PrivateKey) -> Result<()>;

    /// Unlock the backend where supported; the default is unlocked.
    fn unlock(&mut self, _password: &[u8]) -> bool {
        true
    }

    /// Remove every key. Test support.
    fn clear(&mut self) -> Result<()>;
}
