//! Client configuration: default PIB/TPM locator resolution.
//!
//! Resolution order for each locator: the environment variable
//! (`NDN_CLIENT_PIB` / `NDN_CLIENT_TPM`), the `pib` / `tpm` properties of
//! `$HOME/.ndn/client.conf`, then `<default scheme>:`.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::error::{Error, Result};

pub const DEFAULT_PIB_SCHEME: &str = "pib-sqlite3";
pub const DEFAULT_TPM_SCHEME: &str = "tpm-file";

const PIB_ENV: &str = "NDN_CLIENT_PIB";
const TPM_ENV: &str = "NDN_CLIENT_TPM";

pub(crate) fn home_dir() -> Result<PathBuf> {
    env::var_os("HOME")
        .map(PathBuf::from)
        .ok_or_else(|| Error::KeyChain("HOME is not set".to_string()))
}

/// Key-value properties from the client configuration file.
#[derive(Debug, Default)]
pub struct ClientConfig {
    properties: HashMap<String, String>,
}

impl ClientConfig {
    /// Load `$HOME/.ndn/client.conf`; a missing file yields an empty
    /// configuration.
    pub fn load() -> Self {
        let path = match home_dir() {
            Ok(home) => home.join(".ndn").join("client.conf"),
            Err(_) => return ClientConfig::default(),
        };
        match fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(_) => ClientConfig::default(),
        }
    }

    /// Parse `key=value` lines; `;` and `#` start comments.
    pub fn parse(text: &str) -> Self {
        let mut properties = HashMap::new();
        for line in text.lines() {
            let line = line
                .split(|c| c == ';' || c == '#')
                .next()
                .unwrap_or("")
                .trim();
            if line.is_empty() {
                continue;
            }
            if let Some((key, value)) = line.split_once('=') {
                properties.insert(key.trim().to_string(), value.trim().to_string());
            }
        }
        ClientConfig { properties }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// The default PIB locator, before canonicalization.
pub fn default_pib_locator() -> String {
    if let Ok(locator) = env::var(PIB_ENV) {
        if !locator.is_empty() {
            return locator;
        }
    }
    ClientConfig::load()
        .get("pib")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:", DEFAULT_PIB_SCHEME))
}

/// The default TPM locator, before canonicalization.
pub fn default_tpm_locator() -> String {
    if let Ok(locator) = env::var(TPM_ENV) {
        if !locator.is_empty() {
            return locator;
        }
    }
    ClientConfig::load()
        .get("tpm")
        .map(str::to_string)
        .unwrap_or_else(|| format!("{}:", DEFAULT_TPM_SCHEME))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value_lines() {
        let conf = ClientConfig::parse(
            "; sample configuration\n\
             pib=pib-sqlite3:/tmp/pib\n\
             tpm = tpm-file:/tmp/tpm  # trailing comment\n\
             \n\
             malformed line\n",
        );
        assert_eq!(conf.get("pib"), Some("pib-sqlite3:/tmp/pib"));
        assert_eq!(conf.get("tpm"), Some("tpm-file:/tmp/tpm"));
        assert_eq!(conf.get("malformed line"), None);
    }

    #[test]
    fn test_empty_config() {
        let conf = ClientConfig::parse("");
        assert_eq!(conf.get("pib"), None);
    }
}
