//! File-based TPM backend (`tpm-file`).
//!
//! One file per key under the location directory. File names are the hex
//! SHA-256 of the key name's wire encoding with a `.privkey` extension;
//! contents are base64 PKCS#8 (EncryptedPrivateKeyInfo under an empty
//! passphrase). Directory and files are private to the user on Unix.

use std::fs;
use std::path::{Path, PathBuf};

use openssl::hash::{hash, MessageDigest};
use tracing::debug;

use crate::error::{Error, Result};
use crate::key_params::{KeyParams, KeyType};
use crate::name::Name;
use crate::private_key::PrivateKey;
use crate::transform::{buffer_source, Base64Decode, Base64Encode};

use super::back_end::TpmBackEnd;

const KEY_FILE_EXTENSION: &str = ".privkey";

pub struct FileBackEnd {
    key_store_dir: PathBuf,
}

impl FileBackEnd {
    pub const SCHEME: &'static str = "tpm-file";

    /// An empty location selects `$HOME/.ndn/ndnsec-key-file`.
    pub fn new(location: &str) -> Result<Self> {
        let key_store_dir = if location.is_empty() {
            crate::configs::home_dir()?.join(".ndn").join("ndnsec-key-file")
        } else {
            PathBuf::from(location)
        };
        fs::create_dir_all(&key_store_dir)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&key_store_dir, fs::Permissions::from_mode(0o700))?;
        }
        Ok(FileBackEnd { key_store_dir })
    }

    fn key_file_path(&self, key_name: &Name) -> Result<PathBuf> {
        let digest = hash(MessageDigest::sha256(), &key_name.wire_encode())?;
        Ok(self
            .key_store_dir
            .join(format!("{}{}", hex::encode(&digest[..]), KEY_FILE_EXTENSION)))
    }

    fn save_key(&self, path: &Path, key: &PrivateKey) -> Result<()> {
        if key.key_type() == KeyType::Hmac {
            // EVP HMAC keys have no PKCS#8 form.
            return Err(Error::Tpm(
                "HMAC keys are not supported by the file-based TPM".to_string(),
            ));
        }
        let pkcs8 = key.to_encrypted_pkcs8(b"")?;
        let encoded = buffer_source(&pkcs8).push(Base64Encode::new()).into_vec()?;
        fs::write(path, encoded)?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600))?;
        }
        Ok(())
    }

    fn load_key(&self, path: &Path) -> Result<PrivateKey> {
        let encoded = fs::read(path)?;
        let pkcs8 = buffer_source(&encoded).push(Base64Decode::new()).into_vec()?;
        PrivateKey::from_pkcs8(&pkcs8, b"")
            .map_err(|e| Error::Tpm(format!("Failed to load key file {:?}: {}", path, e)))
    }
}

impl TpmBackEnd for FileBackEnd {
    fn has_key(&self, key_name: &Name) -> Result<bool> {
        Ok(self.key_file_path(key_name)?.exists())
    }

    fn get_key(&self, key_name: &Name) -> Result<Option<PrivateKey>> {
        let path = self.key_file_path(key_name)?;
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.load_key(&path)?))
    }

    fn create_key(&mut self, key_name: &Name, params: &KeyParams) -> Result<()> {
        let key = PrivateKey::generate(params)?;
        let path = self.key_file_path(key_name)?;
        self.save_key(&path, &key)?;
        debug!(key = %key_name, file = ?path, "stored private key");
        Ok(())
    }

    fn delete_key(&mut self, key_name: &Name) -> Result<()> {
        let path = self.key_file_path(key_name)?;
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn export_key(&self, key_name: &Name, password: &[u8]) -> Result<Vec<u8>> {
        let key = self
            .get_key(key_name)?
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
        let path = self.key_file_path(key_name)?;
        if path.exists() {
            return Err(Error::Tpm(format!("Key `{}` already exists", key_name)));
        }
        self.save_key(&path, &key)
    }

    fn clear(&mut self) -> Result<()> {
        for entry in fs::read_dir(&self.key_store_dir)? {
            let path = entry?.path();
            if path
                .file_name()
                .and_then(|n| n.to_str())
                .map(|n| n.ends_with(KEY_FILE_EXTENSION))
                .unwrap_or(false)
            {
                fs::remove_file(path)?;
            }
        }
        Ok(())
    }
}
