//! PIB front: the public information base.
//!
//! The front owns one backend behind a shared cell so that [`Identity`]
//! and [`Key`] façades can hold lookups into it. A PIB records the locator
//! of the TPM it was last paired with; the KeyChain uses that record to
//! detect stale pairings.

mod identity;
mod key;
mod pib_impl;
mod pib_memory;
mod pib_sqlite3;

pub use identity::Identity;
pub use key::Key;
pub use pib_impl::PibImpl;
pub use pib_memory::MemoryPib;
pub use pib_sqlite3::SqlitePib;

use std::cell::RefCell;
use std::rc::Rc;

use tracing::debug;

use crate::error::{Error, Result};
use crate::name::Name;

pub(crate) type SharedPibImpl = Rc<RefCell<dyn PibImpl>>;

pub struct Pib {
    scheme: String,
    location: String,
    imp: SharedPibImpl,
}

impl Pib {
    pub(crate) fn new(scheme: String, location: String, imp: SharedPibImpl) -> Self {
        Pib {
            scheme,
            location,
            imp,
        }
    }

    /// Canonical locator `scheme:location`.
    pub fn locator(&self) -> String {
        format!("{}:{}", self.scheme, self.location)
    }

    /// The recorded locator of the paired TPM, if any.
    pub fn tpm_locator(&self) -> Result<Option<String>> {
        self.imp.borrow().tpm_locator()
    }

    pub fn set_tpm_locator(&self, locator: &str) -> Result<()> {
        self.imp.borrow_mut().set_tpm_locator(locator)
    }

    /// Drop every identity, key, and certificate, and forget the paired
    /// TPM locator.
    pub fn reset(&self) -> Result<()> {
        debug!(pib = %self.locator(), "resetting PIB");
        let mut imp = self.imp.borrow_mut();
        imp.clear_identities()?;
        imp.set_tpm_locator("")
    }

    /// Idempotent identity creation.
    pub fn add_identity(&self, identity: &Name) -> Result<Identity> {
        self.imp.borrow_mut().add_identity(identity)?;
        Ok(Identity::new(self.imp.clone(), identity.clone()))
    }

    pub fn remove_identity(&self, identity: &Name) -> Result<()> {
        self.imp.borrow_mut().remove_identity(identity)
    }

    pub fn get_identity(&self, identity: &Name) -> Result<Identity> {
        if !self.imp.borrow().has_identity(identity)? {
            return Err(Error::Pib(format!(
                "Identity `{}` does not exist",
                identity
            )));
        }
        Ok(Identity::new(self.imp.clone(), identity.clone()))
    }

    pub fn identities(&self) -> Result<Vec<Identity>> {
        Ok(self
            .imp
            .borrow()
            .identities()?
            .into_iter()
            .map(|name| Identity::new(self.imp.clone(), name))
            .collect())
    }

    pub fn set_default_identity(&self, identity: &Name) -> Result<Identity> {
        self.imp.borrow_mut().set_default_identity(identity)?;
        Ok(Identity::new(self.imp.clone(), identity.clone()))
    }

    /// The designated default identity; `Pib` error when none is set.
    pub fn default_identity(&self) -> Result<Identity> {
        let name = self
            .imp
            .borrow()
            .default_identity()?
            .ok_or_else(|| Error::Pib("No default identity is set".to_string()))?;
        Ok(Identity::new(self.imp.clone(), name))
    }
}

impl std::fmt::Debug for Pib {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pib").field("locator", &self.locator()).finish()
    }
}

/// Instantiate a PIB from a parsed locator. The scheme set is closed;
/// unknown schemes fail with "<scheme> is not supported".
pub(crate) fn create_pib(scheme: &str, location: &str) -> Result<Pib> {
    let imp: SharedPibImpl = match scheme {
        MemoryPib::SCHEME => Rc::new(RefCell::new(MemoryPib::new(location))),
        SqlitePib::SCHEME => Rc::new(RefCell::new(SqlitePib::new(location)?)),
        other => return Err(Error::unsupported_scheme(other)),
    };
    Ok(Pib::new(scheme.to_string(), location.to_string(), imp))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::key_params::KeyType;

    fn memory_pib() -> Pib {
        create_pib(MemoryPib::SCHEME, "").unwrap()
    }

    fn key_name(identity: &str, id: u8) -> Name {
        let mut name = Name::from_uri(identity).unwrap();
        name.append_str("KEY");
        name.push(crate::name::Component::generic(vec![id]));
        name
    }

    #[test]
    fn test_add_identity_is_idempotent() {
        let pib = memory_pib();
        let alice = Name::from_uri("/alice").unwrap();
        pib.add_identity(&alice).unwrap();
        pib.add_identity(&alice).unwrap();
        assert_eq!(pib.identities().unwrap().len(), 1);
    }

    #[test]
    fn test_missing_lookups_are_pib_errors() {
        let pib = memory_pib();
        let nobody = Name::from_uri("/nobody").unwrap();
        assert!(matches!(pib.get_identity(&nobody), Err(Error::Pib(_))));
        assert!(matches!(pib.default_identity(), Err(Error::Pib(_))));

        let identity = pib.add_identity(&Name::from_uri("/alice").unwrap()).unwrap();
        assert!(matches!(identity.default_key(), Err(Error::Pib(_))));
    }

    #[test]
    fn test_facade_survives_mutation() {
        let pib = memory_pib();
        let alice = Name::from_uri("/alice").unwrap();
        let identity = pib.add_identity(&alice).unwrap();

        let k = key_name("/alice", 1);
        identity.add_key(&[1, 2, 3], &k, KeyType::Ec).unwrap();

        // A façade created before the mutation still observes it.
        let again = pib.get_identity(&alice).unwrap();
        assert_eq!(again.default_key().unwrap().name(), &k);
        assert_eq!(identity.default_key().unwrap().public_key_bits(), &[1, 2, 3]);
    }

    #[test]
    fn test_key_must_extend_identity() {
        let pib = memory_pib();
        let identity = pib.add_identity(&Name::from_uri("/alice").unwrap()).unwrap();
        let foreign = key_name("/bob", 1);
        assert!(matches!(
            identity.add_key(&[1], &foreign, KeyType::Ec),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_reset_clears_everything() {
        let pib = memory_pib();
        let identity = pib.add_identity(&Name::from_uri("/alice").unwrap()).unwrap();
        identity
            .add_key(&[1], &key_name("/alice", 1), KeyType::Ec)
            .unwrap();
        pib.set_tpm_locator("tpm-memory:").unwrap();

        pib.reset().unwrap();
        assert!(pib.identities().unwrap().is_empty());
        assert_eq!(pib.tpm_locator().unwrap(), None);
    }
}
