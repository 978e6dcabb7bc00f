//! In-memory PIB backend (`pib-memory`).

use std::collections::{BTreeMap, BTreeSet};

use crate::certificate::Certificate;
use crate::error::{Error, Result};
use crate::key_params::KeyType;
use crate::name::Name;

use super::pib_impl::PibImpl;

struct KeyRecord {
    identity: Name,
    bits: Vec<u8>,
    key_type: KeyType,
}

/// Volatile PIB for tests and scratch key chains.
#[derive(Default)]
pub struct MemoryPib {
    tpm_locator: Option<String>,
    identities: BTreeSet<Name>,
    default_identity: Option<Name>,
    keys: BTreeMap<Name, KeyRecord>,
    default_keys: BTreeMap<Name, Name>,
    certificates: BTreeMap<Name, Certificate>,
    default_certificates: BTreeMap<Name, Name>,
}

impl MemoryPib {
    pub const SCHEME: &'static str = "pib-memory";

    /// The location part of the locator is ignored.
    pub fn new(_location: &str) -> Self {
        MemoryPib::default()
    }

    fn missing_key_error(key_name: &Name) -> Error {
        Error::Pib(format!("Key `{}` does not exist", key_name))
    }
}

impl PibImpl for MemoryPib {
    fn set_tpm_locator(&mut self, locator: &str) -> Result<()> {
        self.tpm_locator = if locator.is_empty() {
            None
        } else {
            Some(locator.to_string())
        };
        Ok(())
    }

    fn tpm_locator(&self) -> Result<Option<String>> {
        Ok(self.tpm_locator.clone())
    }

    fn has_identity(&self, identity: &Name) -> Result<bool> {
        Ok(self.identities.contains(identity))
    }

    fn add_identity(&mut self, identity: &Name) -> Result<()> {
        self.identities.insert(identity.clone());
        if self.default_identity.is_none() {
            self.default_identity = Some(identity.clone());
        }
        Ok(())
    }

    fn remove_identity(&mut self, identity: &Name) -> Result<()> {
        self.identities.remove(identity);
        if self.default_identity.as_ref() == Some(identity) {
            self.default_identity = None;
        }
        let key_names: Vec<Name> = self
            .keys
            .iter()
            .filter(|(_, rec)| rec.identity == *identity)
            .map(|(name, _)| name.clone())
            .collect();
        for key_name in key_names {
            self.remove_key(&key_name)?;
        }
        Ok(())
    }

    fn clear_identities(&mut self) -> Result<()> {
        self.identities.clear();
        self.default_identity = None;
        self.keys.clear();
        self.default_keys.clear();
        self.certificates.clear();
        self.default_certificates.clear();
        Ok(())
    }

    fn identities(&self) -> Result<Vec<Name>> {
        Ok(self.identities.iter().cloned().collect())
    }

    fn set_default_identity(&mut self, identity: &Name) -> Result<()> {
        if !self.identities.contains(identity) {
            return Err(Error::Pib(format!(
                "Identity `{}` does not exist",
                identity
            )));
        }
        self.default_identity = Some(identity.clone());
        Ok(())
    }

    fn default_identity(&self) -> Result<Option<Name>> {
        Ok(self.default_identity.clone())
    }

    fn has_key(&self, key_name: &Name) -> Result<bool> {
        Ok(self.keys.contains_key(key_name))
    }

    fn add_key(
        &mut self,
        identity: &Name,
        key_name: &Name,
        key_bits: &[u8],
        key_type: KeyType,
    ) -> Result<()> {
        self.add_identity(identity)?;
        self.keys.insert(
            key_name.clone(),
            KeyRecord {
                identity: identity.clone(),
                bits: key_bits.to_vec(),
                key_type,
            },
        );
        self.default_keys
            .entry(identity.clone())
            .or_insert_with(|| key_name.clone());
        Ok(())
    }

    fn remove_key(&mut self, key_name: &Name) -> Result<()> {
        if let Some(rec) = self.keys.remove(key_name) {
            if self.default_keys.get(&rec.identity) == Some(key_name) {
                self.default_keys.remove(&rec.identity);
            }
        }
        let cert_names: Vec<Name> = self
            .certificates
            .keys()
            .filter(|cert_name| key_name.is_prefix_of(cert_name))
            .cloned()
            .collect();
        for cert_name in cert_names {
            self.remove_certificate(&cert_name)?;
        }
        Ok(())
    }

    fn key_bits(&self, key_name: &Name) -> Result<Vec<u8>> {
        self.keys
            .get(key_name)
            .map(|rec| rec.bits.clone())
            .ok_or_else(|| Self::missing_key_error(key_name))
    }

    fn key_type(&self, key_name: &Name) -> Result<KeyType> {
        self.keys
            .get(key_name)
            .map(|rec| rec.key_type)
            .ok_or_else(|| Self::missing_key_error(key_name))
    }

    fn keys_of_identity(&self, identity: &Name) -> Result<Vec<Name>> {
        Ok(self
            .keys
            .iter()
            .filter(|(_, rec)| rec.identity == *identity)
            .map(|(name, _)| name.clone())
            .collect())
    }

    fn set_default_key_of_identity(&mut self, identity: &Name, key_name: &Name) -> Result<()> {
        let rec = self
            .keys
            .get(key_name)
            .ok_or_else(|| Self::missing_key_error(key_name))?;
        if rec.identity != *identity {
            return Err(Error::InvalidArgument(format!(
                "Key `{}` does not belong to identity `{}`",
                key_name, identity
            )));
        }
        self.default_keys.insert(identity.clone(), key_name.clone());
        Ok(())
    }

    fn default_key_of_identity(&self, identity: &Name) -> Result<Option<Name>> {
        Ok(self.default_keys.get(identity).cloned())
    }

    fn has_certificate(&self, cert_name: &Name) -> Result<bool> {
        Ok(self.certificates.contains_key(cert_name))
    }

    fn add_certificate(&mut self, cert: &Certificate) -> Result<()> {
        let key_name = cert.key_name();
        if !self.keys.contains_key(&key_name) {
            return Err(Self::missing_key_error(&key_name));
        }
        self.certificates
            .insert(cert.name().clone(), cert.clone());
        self.default_certificates
            .entry(key_name)
            .or_insert_with(|| cert.name().clone());
        Ok(())
    }

    fn remove_certificate(&mut self, cert_name: &Name) -> Result<()> {
        if let Some(cert) = self.certificates.remove(cert_name) {
            let key_name = cert.key_name();
            if self.default_certificates.get(&key_name) == Some(cert_name) {
                self.default_certificates.remove(&key_name);
            }
        }
        Ok(())
    }

    fn certificate(&self, cert_name: &Name) -> Result<Certificate> {
        self.certificates
            .get(cert_name)
            .cloned()
            .ok_or_else(|| Error::Pib(format!("Certificate `{}` does not exist", cert_name)))
    }

    fn certificates_of_key(&self, key_name: &Name) -> Result<Vec<Name>> {
        Ok(self
            .certificates
            .values()
            .filter(|cert| cert.key_name() == *key_name)
            .map(|cert| cert.name().clone())
            .collect())
    }

    fn set_default_certificate_of_key(&mut self, key_name: &Name, cert_name: &Name) -> Result<()> {
        let cert = self
            .certificates
            .get(cert_name)
            .ok_or_else(|| Error::Pib(format!("Certificate `{}` does not exist", cert_name)))?;
        if cert.key_name() != *key_name {
            return Err(Error::InvalidArgument(format!(
                "Certificate `{}` does not belong to key `{}`",
                cert_name, key_name
            )));
        }
        self.default_certificates
            .insert(key_name.clone(), cert_name.clone());
        Ok(())
    }

    fn default_certificate_of_key(&self, key_name: &Name) -> Result<Option<Certificate>> {
        match self.default_certificates.get(key_name) {
            None => Ok(None),
            Some(cert_name) => Ok(Some(self.certificate(cert_name)?)),
        }
    }
}
