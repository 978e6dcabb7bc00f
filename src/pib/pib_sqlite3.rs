//! SQLite PIB backend (`pib-sqlite3`).
//!
//! The database lives in `pib.db` inside the location directory. Names are
//! stored as their TLV wire encoding; foreign keys with `ON DELETE
//! CASCADE` keep keys and certificates consistent with their parents, and
//! `is_default` columns implement the default pointers (deleting the
//! defaulted row clears the default with it).

use std::fs;
use std::path::PathBuf;

use rusqlite::{params, Connection, OptionalExtension};

use crate::certificate::Certificate;
use crate::error::{Error, Result};
use crate::key_params::KeyType;
use crate::name::Name;

use super::pib_impl::PibImpl;

const INITIALIZATION: &str = "
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS tpmInfo (
      tpm_locator TEXT
    );

    CREATE TABLE IF NOT EXISTS identities (
      id         INTEGER PRIMARY KEY,
      identity   BLOB NOT NULL UNIQUE,
      is_default INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS keys (
      id          INTEGER PRIMARY KEY,
      identity_id INTEGER NOT NULL
                  REFERENCES identities (id) ON DELETE CASCADE,
      key_name    BLOB NOT NULL UNIQUE,
      key_type    TEXT NOT NULL,
      key_bits    BLOB NOT NULL,
      is_default  INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS certificates (
      id               INTEGER PRIMARY KEY,
      key_id           INTEGER NOT NULL
                       REFERENCES keys (id) ON DELETE CASCADE,
      certificate_name BLOB NOT NULL UNIQUE,
      certificate_data BLOB NOT NULL,
      is_default       INTEGER NOT NULL DEFAULT 0
    );
";

pub struct SqlitePib {
    conn: Connection,
}

impl SqlitePib {
    pub const SCHEME: &'static str = "pib-sqlite3";

    /// An empty location selects `$HOME/.ndn`.
    pub fn new(location: &str) -> Result<Self> {
        let dir = if location.is_empty() {
            crate::configs::home_dir()?.join(".ndn")
        } else {
            PathBuf::from(location)
        };
        fs::create_dir_all(&dir)?;
        let conn = Connection::open(dir.join("pib.db"))?;
        conn.execute_batch(INITIALIZATION)?;
        Ok(SqlitePib { conn })
    }

    fn key_row_identity(&self, key_name: &Name) -> Result<Option<Name>> {
        let wire: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT i.identity FROM keys k
                 JOIN identities i ON k.identity_id = i.id
                 WHERE k.key_name = ?1",
                params![key_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        wire.map(|w| Name::from_wire(&w)).transpose()
    }
}

impl PibImpl for SqlitePib {
    fn set_tpm_locator(&mut self, locator: &str) -> Result<()> {
        self.conn.execute("DELETE FROM tpmInfo", [])?;
        if !locator.is_empty() {
            self.conn.execute(
                "INSERT INTO tpmInfo (tpm_locator) VALUES (?1)",
                params![locator],
            )?;
        }
        Ok(())
    }

    fn tpm_locator(&self) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row("SELECT tpm_locator FROM tpmInfo", [], |row| row.get(0))
            .optional()?)
    }

    fn has_identity(&self, identity: &Name) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM identities WHERE identity = ?1",
                params![identity.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn add_identity(&mut self, identity: &Name) -> Result<()> {
        let wire = identity.wire_encode();
        self.conn.execute(
            "INSERT OR IGNORE INTO identities (identity) VALUES (?1)",
            params![wire],
        )?;
        let has_default: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM identities WHERE is_default = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        if has_default.is_none() {
            self.conn.execute(
                "UPDATE identities SET is_default = 1 WHERE identity = ?1",
                params![wire],
            )?;
        }
        Ok(())
    }

    fn remove_identity(&mut self, identity: &Name) -> Result<()> {
        self.conn.execute(
            "DELETE FROM identities WHERE identity = ?1",
            params![identity.wire_encode()],
        )?;
        Ok(())
    }

    fn clear_identities(&mut self) -> Result<()> {
        self.conn.execute("DELETE FROM identities", [])?;
        Ok(())
    }

    fn identities(&self) -> Result<Vec<Name>> {
        let mut stmt = self.conn.prepare("SELECT identity FROM identities")?;
        let rows = stmt.query_map([], |row| row.get::<_, Vec<u8>>(0))?;
        let mut names = Vec::new();
        for wire in rows {
            names.push(Name::from_wire(&wire?)?);
        }
        Ok(names)
    }

    fn set_default_identity(&mut self, identity: &Name) -> Result<()> {
        if !self.has_identity(identity)? {
            return Err(Error::Pib(format!(
                "Identity `{}` does not exist",
                identity
            )));
        }
        self.conn.execute("UPDATE identities SET is_default = 0", [])?;
        self.conn.execute(
            "UPDATE identities SET is_default = 1 WHERE identity = ?1",
            params![identity.wire_encode()],
        )?;
        Ok(())
    }

    fn default_identity(&self) -> Result<Option<Name>> {
        let wire: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT identity FROM identities WHERE is_default = 1",
                [],
                |row| row.get(0),
            )
            .optional()?;
        wire.map(|w| Name::from_wire(&w)).transpose()
    }

    fn has_key(&self, key_name: &Name) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM keys WHERE key_name = ?1",
                params![key_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn add_key(
        &mut self,
        identity: &Name,
        key_name: &Name,
        key_bits: &[u8],
        key_type: KeyType,
    ) -> Result<()> {
        self.add_identity(identity)?;
        if self.has_key(key_name)? {
            self.conn.execute(
                "UPDATE keys SET key_bits = ?1, key_type = ?2 WHERE key_name = ?3",
                params![key_bits, key_type.as_tag(), key_name.wire_encode()],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO keys (identity_id, key_name, key_type, key_bits)
                 VALUES ((SELECT id FROM identities WHERE identity = ?1), ?2, ?3, ?4)",
                params![
                    identity.wire_encode(),
                    key_name.wire_encode(),
                    key_type.as_tag(),
                    key_bits
                ],
            )?;
        }
        if self.default_key_of_identity(identity)?.is_none() {
            self.conn.execute(
                "UPDATE keys SET is_default = 1 WHERE key_name = ?1",
                params![key_name.wire_encode()],
            )?;
        }
        Ok(())
    }

    fn remove_key(&mut self, key_name: &Name) -> Result<()> {
        self.conn.execute(
            "DELETE FROM keys WHERE key_name = ?1",
            params![key_name.wire_encode()],
        )?;
        Ok(())
    }

    fn key_bits(&self, key_name: &Name) -> Result<Vec<u8>> {
        self.conn
            .query_row(
                "SELECT key_bits FROM keys WHERE key_name = ?1",
                params![key_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?
            .ok_or_else(|| Error::Pib(format!("Key `{}` does not exist", key_name)))
    }

    fn key_type(&self, key_name: &Name) -> Result<KeyType> {
        let tag: Option<String> = self
            .conn
            .query_row(
                "SELECT key_type FROM keys WHERE key_name = ?1",
                params![key_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        let tag = tag.ok_or_else(|| Error::Pib(format!("Key `{}` does not exist", key_name)))?;
        KeyType::from_tag(&tag)
            .ok_or_else(|| Error::Pib(format!("Key `{}` has unknown type `{}`", key_name, tag)))
    }

    fn keys_of_identity(&self, identity: &Name) -> Result<Vec<Name>> {
        let mut stmt = self.conn.prepare(
            "SELECT k.key_name FROM keys k
             JOIN identities i ON k.identity_id = i.id
             WHERE i.identity = ?1",
        )?;
        let rows = stmt.query_map(params![identity.wire_encode()], |row| {
            row.get::<_, Vec<u8>>(0)
        })?;
        let mut names = Vec::new();
        for wire in rows {
            names.push(Name::from_wire(&wire?)?);
        }
        Ok(names)
    }

    fn set_default_key_of_identity(&mut self, identity: &Name, key_name: &Name) -> Result<()> {
        match self.key_row_identity(key_name)? {
            None => {
                return Err(Error::Pib(format!("Key `{}` does not exist", key_name)));
            }
            Some(owner) if owner != *identity => {
                return Err(Error::InvalidArgument(format!(
                    "Key `{}` does not belong to identity `{}`",
                    key_name, identity
                )));
            }
            Some(_) => {}
        }
        self.conn.execute(
            "UPDATE keys SET is_default = 0
             WHERE identity_id = (SELECT id FROM identities WHERE identity = ?1)",
            params![identity.wire_encode()],
        )?;
        self.conn.execute(
            "UPDATE keys SET is_default = 1 WHERE key_name = ?1",
            params![key_name.wire_encode()],
        )?;
        Ok(())
    }

    fn default_key_of_identity(&self, identity: &Name) -> Result<Option<Name>> {
        let wire: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT k.key_name FROM keys k
                 JOIN identities i ON k.identity_id = i.id
                 WHERE i.identity = ?1 AND k.is_default = 1",
                params![identity.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        wire.map(|w| Name::from_wire(&w)).transpose()
    }

    fn has_certificate(&self, cert_name: &Name) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM certificates WHERE certificate_name = ?1",
                params![cert_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    fn add_certificate(&mut self, cert: &Certificate) -> Result<()> {
        let key_name = cert.key_name();
        if !self.has_key(&key_name)? {
            return Err(Error::Pib(format!("Key `{}` does not exist", key_name)));
        }
        let wire = cert.wire_encode()?;
        if self.has_certificate(cert.name())? {
            self.conn.execute(
                "UPDATE certificates SET certificate_data = ?1 WHERE certificate_name = ?2",
                params![wire, cert.name().wire_encode()],
            )?;
        } else {
            self.conn.execute(
                "INSERT INTO certificates (key_id, certificate_name, certificate_data)
                 VALUES ((SELECT id FROM keys WHERE key_name = ?1), ?2, ?3)",
                params![key_name.wire_encode(), cert.name().wire_encode(), wire],
            )?;
        }
        if self.default_certificate_of_key(&key_name)?.is_none() {
            self.conn.execute(
                "UPDATE certificates SET is_default = 1 WHERE certificate_name = ?1",
                params![cert.name().wire_encode()],
            )?;
        }
        Ok(())
    }

    fn remove_certificate(&mut self, cert_name: &Name) -> Result<()> {
        self.conn.execute(
            "DELETE FROM certificates WHERE certificate_name = ?1",
            params![cert_name.wire_encode()],
        )?;
        Ok(())
    }

    fn certificate(&self, cert_name: &Name) -> Result<Certificate> {
        let wire: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT certificate_data FROM certificates WHERE certificate_name = ?1",
                params![cert_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        let wire = wire
            .ok_or_else(|| Error::Pib(format!("Certificate `{}` does not exist", cert_name)))?;
        Certificate::from_wire(&wire)
    }

    fn certificates_of_key(&self, key_name: &Name) -> Result<Vec<Name>> {
        let mut stmt = self.conn.prepare(
            "SELECT c.certificate_name FROM certificates c
             JOIN keys k ON c.key_id = k.id
             WHERE k.key_name = ?1",
        )?;
        let rows = stmt.query_map(params![key_name.wire_encode()], |row| {
            row.get::<_, Vec<u8>>(0)
        })?;
        let mut names = Vec::new();
        for wire in rows {
            names.push(Name::from_wire(&wire?)?);
        }
        Ok(names)
    }

    fn set_default_certificate_of_key(&mut self, key_name: &Name, cert_name: &Name) -> Result<()> {
        let cert = self.certificate(cert_name)?;
        if cert.key_name() != *key_name {
            return Err(Error::InvalidArgument(format!(
                "Certificate `{}` does not belong to key `{}`",
                cert_name, key_name
            )));
        }
        self.conn.execute(
            "UPDATE certificates SET is_default = 0
             WHERE key_id = (SELECT id FROM keys WHERE key_name = ?1)",
            params![key_name.wire_encode()],
        )?;
        self.conn.execute(
            "UPDATE certificates SET is_default = 1 WHERE certificate_name = ?1",
            params![cert_name.wire_encode()],
        )?;
        Ok(())
    }

    fn default_certificate_of_key(&self, key_name: &Name) -> Result<Option<Certificate>> {
        let wire: Option<Vec<u8>> = self
            .conn
            .query_row(
                "SELECT c.certificate_data FROM certificates c
                 JOIN keys k ON c.key_id = k.id
                 WHERE k.key_name = ?1 AND c.is_default = 1",
                params![key_name.wire_encode()],
                |row| row.get(0),
            )
            .optional()?;
        wire.map(|w| Certificate::from_wire(&w)).transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_pib() -> (tempfile::TempDir, SqlitePib) {
        let dir = tempfile::tempdir().unwrap();
        let pib = SqlitePib::new(dir.path().to_str().unwrap()).unwrap();
        (dir, pib)
    }

    fn key_name(identity: &str, id: u8) -> Name {
        let mut name = Name::from_uri(identity).unwrap();
        name.append_str("KEY");
        name.push(crate::name::Component::generic(vec![id]));
        name
    }

    #[test]
    fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let location = dir.path().to_str().unwrap().to_string();
        let alice = Name::from_uri("/alice").unwrap();
        {
            let mut pib = SqlitePib::new(&location).unwrap();
            pib.add_identity(&alice).unwrap();
            pib.set_tpm_locator("tpm-memory:").unwrap();
        }
        let pib = SqlitePib::new(&location).unwrap();
        assert!(pib.has_identity(&alice).unwrap());
        assert_eq!(pib.tpm_locator().unwrap(), Some("tpm-memory:".to_string()));
    }

    #[test]
    fn test_key_round_trip() {
        let (_dir, mut pib) = temp_pib();
        let alice = Name::from_uri("/alice").unwrap();
        let k = key_name("/alice", 1);
        pib.add_key(&alice, &k, &[0xAB, 0xCD], KeyType::Sm2).unwrap();
        assert_eq!(pib.key_bits(&k).unwrap(), vec![0xAB, 0xCD]);
        assert_eq!(pib.key_type(&k).unwrap(), KeyType::Sm2);
        assert_eq!(pib.default_key_of_identity(&alice).unwrap(), Some(k.clone()));
        assert_eq!(pib.keys_of_identity(&alice).unwrap(), vec![k]);
    }

    #[test]
    fn test_cascade_on_identity_removal() {
        let (_dir, mut pib) = temp_pib();
        let alice = Name::from_uri("/alice").unwrap();
        let k = key_name("/alice", 1);
        pib.add_key(&alice, &k, &[1], KeyType::Ec).unwrap();
        pib.remove_identity(&alice).unwrap();
        assert!(!pib.has_key(&k).unwrap());
        assert!(matches!(pib.key_bits(&k), Err(Error::Pib(_))));
    }

    #[test]
    fn test_default_key_cleared_on_removal() {
        let (_dir, mut pib) = temp_pib();
        let alice = Name::from_uri("/alice").unwrap();
        let k1 = key_name("/alice", 1);
        let k2 = key_name("/alice", 2);
        pib.add_key(&alice, &k1, &[1], KeyType::Ec).unwrap();
        pib.add_key(&alice, &k2, &[2], KeyType::Ec).unwrap();
        pib.remove_key(&k1).unwrap();
        assert_eq!(pib.default_key_of_identity(&alice).unwrap(), None);
    }

    #[test]
    fn test_set_default_key_requires_matching_identity() {
        let (_dir, mut pib) = temp_pib();
        let alice = Name::from_uri("/alice").unwrap();
        let bob = Name::from_uri("/bob").unwrap();
        let k = key_name("/alice", 1);
        pib.add_key(&alice, &k, &[1], KeyType::Ec).unwrap();
        pib.add_identity(&bob).unwrap();
        assert!(matches!(
            pib.set_default_key_of_identity(&bob, &k),
            Err(Error::InvalidArgument(_))
        ));
    }
}
