//! PIB backend capability interface.

use crate::certificate::Certificate;
use crate::error::Result;
use crate::key_params::KeyType;
use crate::name::Name;

/// CRUD storage for identity, key, and certificate metadata, keyed by
/// names.
///
/// Backends enforce the structural invariants: adding a key implies its
/// identity exists, the first child added becomes the default, and
/// removing a defaulted child clears the default pointer instead of
/// leaving it dangling.
pub trait PibImpl {
    // Paired-TPM bookkeeping.
    fn set_tpm_locator(&mut self, locator: &str) -> Result<()>;
    fn tpm_locator(&self) -> Result<Option<String>>;

    // Identities.
    fn has_identity(&self, identity: &Name) -> Result<bool>;
    /// Idempotent; the first identity added becomes the default.
    fn add_identity(&mut self, identity: &Name) -> Result<()>;
    /// Removes the identity and, transitively, its keys and certificates.
    fn remove_identity(&mut self, identity: &Name) -> Result<()>;
    fn clear_identities(&mut self) -> Result<()>;
    fn identities(&self) -> Result<Vec<Name>>;
    fn set_default_identity(&mut self, identity: &Name) -> Result<()>;
    fn default_identity(&self) -> Result<Option<Name>>;

    // Keys.
    fn has_key(&self, key_name: &Name) -> Result<bool>;
    /// Adds the identity when absent; replaces the bits of an existing
    /// key; the identity's first key becomes its default.
    fn add_key(
        &mut self,
        identity: &Name,
        key_name: &Name,
        key_bits: &[u8],
        key_type: KeyType,
    ) -> Result<()>;
    /// Removes the key and, transitively, its certificates.
    fn remove_key(&mut self, key_name: &Name) -> Result<()>;
    fn key_bits(&self, key_name: &Name) -> Result<Vec<u8>>;
    fn key_type(&self, key_name: &Name) -> Result<KeyType>;
    fn keys_of_identity(&self, identity: &Name) -> Result<Vec<Name>>;
    fn set_default_key_of_identity(&mut self, identity: &Name, key_name: &Name) -> Result<()>;
    fn default_key_of_identity(&self, identity: &Name) -> Result<Option<Name>>;

    // Certificates.
    fn has_certificate(&self, cert_name: &Name) -> Result<bool>;
    /// The covered key must already exist; the key's first certificate
    /// becomes its default.
    fn add_certificate(&mut self, cert: &Certificate) -> Result<()>;
    fn remove_certificate(&mut self, cert_name: &Name) -> Result<()>;
    fn certificate(&self, cert_name: &Name) -> Result<Certificate>;
    fn certificates_of_key(&self, key_name: &Name) -> Result<Vec<Name>>;
    fn set_default_certificate_of_key(&mut self, key_name: &Name, cert_name: &Name) -> Result<()>;
    fn default_certificate_of_key(&self, key_name: &Name) -> Result<Option<Certificate>>;
}
