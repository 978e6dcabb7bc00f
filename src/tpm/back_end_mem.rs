//! In-memory TPM backend (`tpm-memory`).

use std::collections::HashMap;

use crate::error::{Error, Result};
use crate::key_params::KeyParams;
use crate::name::Name;
use crate::private_key::PrivateKey;

use super::back_end::TpmBackEnd;

/// Keeps key material in process memory only. Suited to tests and
/// throwaway key chains.
#[derive(Default)]
pub struct MemoryBackEnd {
    keys: HashMap<Name, PrivateKey>,
}

impl MemoryBackEnd {
    pub const SCHEME: &'static str = "tpm-memory";

    /// The location part of the locator is ignored.
    pub fn new(_location: &str) -> Self {
        MemoryBackEnd::default()
    }
}

impl TpmBackEnd for MemoryBackEnd {
    fn has_key(&self, key_name: &Name) -> Result<bool> {
        Ok(self.keys.contains_key(key_name))
    }

    fn get_key(&self, key_name: &Name) -> Result<Option<PrivateKey>> {
        Ok(self.keys.get(key_name).cloned())
    }

    fn create_key(&mut self, key_name: &Name, params: &KeyParams) -> Result<()> {
        let key = PrivateKey::generate(params)?;
        self.keys.insert(key_name.clone(), key);
        Ok(())
    }

    fn delete_key(&mut self, key_name: &Name) -> Result<()> {
        self.keys.remove(key_name);
        Ok(())
    }

    fn export_key(&self, key_name: &Name, password: &[u8]) -> Result<Vec<u8>> {
        let key = self
            .keys
            .get(key_name)
            .ok_or_else(|| Error::Tpm(format!("Key `{}` does not exist", key_name)))?;
        key.to_encrypted_pkcs8(password)
            .map_err(|e| Error::Tpm(format!("Failed to export key `{}`: {}", key_name, e)))
    }

    fn import_key(&mut self, key_name: &Name, pkcs8: &[u8], password: &[u8]) -> Result<()> {
        let key = PrivateKey::from_pkcs8(pkcs8, password)
            .map_err(|e| Error::Tpm(format!("Failed to import key `{}`: {}", key_name, e)))?;
        self.import_key_pair(key_name, key)
    }

    fn import_key_pair(&mut self, key_name: &Name, key: PrivateKey) -> Result<()> {
        if self.keys.contains_key(key_name) {
            return Err(Error::Tpm(format!("Key `{}` already exists", key_name)));
        }
        self.keys.insert(key_name.clone(), key);
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.keys.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_delete_cycle() {
        let mut tpm = MemoryBackEnd::new("");
        let name = Name::from_uri("/alice/KEY/%01").unwrap();
        assert!(!tpm.has_key(&name).unwrap());
        tpm.create_key(&name, &KeyParams::ec()).unwrap();
        assert!(tpm.has_key(&name).unwrap());
        tpm.delete_key(&name).unwrap();
        assert!(!tpm.has_key(&name).unwrap());
        // Deleting again is not an error.
        tpm.delete_key(&name).unwrap();
    }

    #[test]
    fn test_import_collision_rejected() {
        let mut tpm = MemoryBackEnd::new("");
        let name = Name::from_uri("/alice/KEY/%01").unwrap();
        tpm.create_key(&name, &KeyParams::ec()).unwrap();
        let other = PrivateKey::generate_ec(256).unwrap();
        assert!(tpm.import_key_pair(&name, other).is_err());
    }

    #[test]
    fn test_export_import_round_trip() {
        let mut tpm = MemoryBackEnd::new("");
        let name = Name::from_uri("/alice/KEY/%01").unwrap();
        tpm.create_key(&name, &KeyParams::ec()).unwrap();
        let blob = tpm.export_key(&name, b"pw").unwrap();

        let mut other = MemoryBackEnd::new("");
        other.import_key(&name, &blob, b"pw").unwrap();
        assert_eq!(
            other
                .get_key(&name)
                .unwrap()
                .unwrap()
                .derive_public_key()
                .unwrap(),
            tpm.get_key(&name).unwrap().unwrap().derive_public_key().unwrap()
        );
    }
}
