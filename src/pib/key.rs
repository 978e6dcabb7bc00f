//! Key façade.

use crate::certificate::{extract_identity_from_key_name, Certificate};
use crate::error::{Error, Result};
use crate::key_params::KeyType;
use crate::name::Name;

use super::SharedPibImpl;

/// A lookup handle onto one key in the PIB, with its metadata snapshot.
///
/// Like [`Identity`](super::Identity), this is a back-reference, not an
/// owner; the snapshot reflects the PIB at lookup time.
#[derive(Clone)]
pub struct Key {
    pib: SharedPibImpl,
    name: Name,
    identity: Name,
    key_type: KeyType,
    public_key_bits: Vec<u8>,
}

impl Key {
    pub(crate) fn lookup(pib: &SharedPibImpl, key_name: &Name) -> Result<Self> {
        let (public_key_bits, key_type) = {
            let imp = pib.borrow();
            (imp.key_bits(key_name)?, imp.key_type(key_name)?)
        };
        Ok(Key {
            pib: pib.clone(),
            name: key_name.clone(),
            identity: extract_identity_from_key_name(key_name)?,
            key_type,
            public_key_bits,
        })
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    pub fn identity(&self) -> &Name {
        &self.identity
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// The public key in PKCS#8 (SubjectPublicKeyInfo) form.
    pub fn public_key_bits(&self) -> &[u8] {
        &self.public_key_bits
    }

    fn check_cert_ownership(&self, cert_name: &Name) -> Result<()> {
        if !Certificate::is_valid_name(cert_name)
            || cert_name.prefix(cert_name.size() - 2) != self.name
        {
            return Err(Error::InvalidArgument(format!(
                "Certificate `{}` does not belong to key `{}`",
                cert_name, self.name
            )));
        }
        Ok(())
    }

    pub fn add_certificate(&self, cert: &Certificate) -> Result<()> {
        self.check_cert_ownership(cert.name())?;
        self.pib.borrow_mut().add_certificate(cert)
    }

    pub fn remove_certificate(&self, cert_name: &Name) -> Result<()> {
        self.check_cert_ownership(cert_name)?;
        self.pib.borrow_mut().remove_certificate(cert_name)
    }

    pub fn certificate(&self, cert_name: &Name) -> Result<Certificate> {
        self.check_cert_ownership(cert_name)?;
        self.pib.borrow().certificate(cert_name)
    }

    pub fn certificates(&self) -> Result<Vec<Certificate>> {
        let names = self.pib.borrow().certificates_of_key(&self.name)?;
        names
            .iter()
            .map(|name| self.pib.borrow().certificate(name))
            .collect()
    }

    pub fn set_default_certificate(&self, cert_name: &Name) -> Result<Certificate> {
        self.check_cert_ownership(cert_name)?;
        self.pib
            .borrow_mut()
            .set_default_certificate_of_key(&self.name, cert_name)?;
        self.pib.borrow().certificate(cert_name)
    }

    /// The designated default certificate; `Pib` error when none is set.
    pub fn default_certificate(&self) -> Result<Certificate> {
        self.pib
            .borrow()
            .default_certificate_of_key(&self.name)?
            .ok_or_else(|| {
                Error::Pib(format!(
                    "Key `{}` does not have a default certificate",
                    self.name
                ))
            })
    }
}

impl std::fmt::Debug for Key {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Key")
            .field("name", &self.name)
            .field("key_type", &self.key_type)
            .finish()
    }
}
