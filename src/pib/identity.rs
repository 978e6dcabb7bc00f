//! Identity façade.

use crate::certificate::extract_identity_from_key_name;
use crate::error::{Error, Result};
use crate::key_params::KeyType;
use crate::name::Name;

use super::key::Key;
use super::SharedPibImpl;

/// A lookup handle onto one identity in the PIB.
///
/// The façade holds a back-reference into the PIB, not the data itself;
/// rebuilding it after a mutation is legal and cheap.
#[derive(Clone)]
pub struct Identity {
    pib: SharedPibImpl,
    name: Name,
}

impl Identity {
    pub(crate) fn new(pib: SharedPibImpl, name: Name) -> Self {
        Identity { pib, name }
    }

    pub fn name(&self) -> &Name {
        &self.name
    }

    fn check_key_ownership(&self, key_name: &Name) -> Result<()> {
        let owner = extract_identity_from_key_name(key_name)?;
        if owner != self.name {
            return Err(Error::InvalidArgument(format!(
                "Identity `{}` does not match key `{}`",
                self.name, key_name
            )));
        }
        Ok(())
    }

    /// Record a key under this identity. The key name must be a strict
    /// extension of the identity name.
    pub fn add_key(&self, key_bits: &[u8], key_name: &Name, key_type: KeyType) -> Result<Key> {
        self.check_key_ownership(key_name)?;
        self.pib
            .borrow_mut()
            .add_key(&self.name, key_name, key_bits, key_type)?;
        Key::lookup(&self.pib, key_name)
    }

    pub fn remove_key(&self, key_name: &Name) -> Result<()> {
        self.check_key_ownership(key_name)?;
        self.pib.borrow_mut().remove_key(key_name)
    }

    pub fn get_key(&self, key_name: &Name) -> Result<Key> {
        self.check_key_ownership(key_name)?;
        Key::lookup(&self.pib, key_name)
    }

    pub fn keys(&self) -> Result<Vec<Key>> {
        let names = self.pib.borrow().keys_of_identity(&self.name)?;
        names
            .iter()
            .map(|name| Key::lookup(&self.pib, name))
            .collect()
    }

    pub fn set_default_key(&self, key_name: &Name) -> Result<Key> {
        self.check_key_ownership(key_name)?;
        self.pib
            .borrow_mut()
            .set_default_key_of_identity(&self.name, key_name)?;
        Key::lookup(&self.pib, key_name)
    }

    /// The designated default key; `Pib` error when none is set.
    pub fn default_key(&self) -> Result<Key> {
        let name = self
            .pib
            .borrow()
            .default_key_of_identity(&self.name)?
            .ok_or_else(|| {
                Error::Pib(format!(
                    "Identity `{}` does not have a default key",
                    self.name
                ))
            })?;
        Key::lookup(&self.pib, &name)
    }
}

impl std::fmt::Debug for Identity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Identity").field("name", &self.name).finish()
    }
}
