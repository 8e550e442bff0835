use std::fmt;

use serde::{de, Deserialize, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

/// Where trial input/output data is mounted from.
#[derive(
    Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum StorageKind {
    /// An NFS share exported by a server reachable from the cluster.
    Nfs,
    /// An Azure file-storage share, unlocked with a key vault secret.
    AzureStorage,
}

impl Default for StorageKind {
    fn default() -> Self {
        StorageKind::Nfs
    }
}

/// Reads the `storage` discriminant of a cluster config.
/// A missing field selects NFS storage.
pub(crate) fn storage_kind<E>(value: &Value) -> Result<StorageKind, E>
where
    E: de::Error,
{
    match value.get("storage") {
        None => Ok(StorageKind::default()),
        Some(Value::String(kind)) => kind.parse().map_err(|_| {
            E::custom(format!(
                "invalid storage kind {:?}, expected nfs or azureStorage",
                kind
            ))
        }),
        Some(other) => Err(E::custom(format!(
            "invalid storage kind {}, expected a string",
            other
        ))),
    }
}

pub(crate) fn azure_storage_default() -> StorageKind {
    StorageKind::AzureStorage
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NfsConfig {
    /// Address of the NFS server.
    pub server: String,
    /// Exported path on the server.
    pub path: String,
}

impl fmt::Display for NfsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Server:", self.server)?;
        writeln!(f, "{:<16} {}", "Path:", self.path)
    }
}

/// Key vault holding the access key of the storage account.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KeyVaultConfig {
    /// Name of the key vault instance.
    pub vault_name: String,
    /// Name of the secret storing the account key.
    pub name: String,
}

impl fmt::Display for KeyVaultConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Vault:", self.vault_name)?;
        writeln!(f, "{:<16} {}", "Secret:", self.name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureStorageConfig {
    /// Name of the storage account.
    pub account_name: String,
    /// Name of the file share inside the account.
    pub azure_share: String,
}

impl fmt::Display for AzureStorageConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Account:", self.account_name)?;
        writeln!(f, "{:<16} {}", "Share:", self.azure_share)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn storage_kind_wire_names() {
        assert_eq!(StorageKind::Nfs.to_string(), "nfs");
        assert_eq!(StorageKind::AzureStorage.to_string(), "azureStorage");
        assert_eq!(
            serde_json::to_value(StorageKind::AzureStorage).unwrap(),
            json!("azureStorage")
        );
    }

    #[test]
    fn missing_discriminant_defaults_to_nfs() {
        let value = json!({"nfs": {"server": "10.0.0.1", "path": "/export"}});
        let kind: StorageKind = storage_kind::<serde_json::Error>(&value).unwrap();
        assert_eq!(kind, StorageKind::Nfs);
    }

    #[test]
    fn unknown_discriminant_is_rejected() {
        let value = json!({"storage": "hdfs"});
        let err = storage_kind::<serde_json::Error>(&value).unwrap_err();
        assert!(err.to_string().contains("hdfs"));
    }

    #[test]
    fn non_string_discriminant_is_rejected() {
        let value = json!({"storage": 3});
        let err = storage_kind::<serde_json::Error>(&value).unwrap_err();
        assert!(err.to_string().contains("expected a string"));
    }
}
