use std::fmt::{self, Write};

use indenter::indented;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::storage::{
    azure_storage_default, storage_kind, AzureStorageConfig, KeyVaultConfig, NfsConfig,
    StorageKind,
};

/// Cluster-level settings shared by every Kubernetes-based training service.
/// The `storage` field decides which concrete shape applies.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum KubernetesClusterConfig {
    Nfs(NfsClusterConfig),
    AzureStorage(AzureClusterConfig),
}

impl KubernetesClusterConfig {
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            KubernetesClusterConfig::Nfs(config) => config.storage,
            KubernetesClusterConfig::AzureStorage(config) => config.storage,
        }
    }

    pub fn api_version(&self) -> Option<&str> {
        match self {
            KubernetesClusterConfig::Nfs(config) => config.api_version.as_deref(),
            KubernetesClusterConfig::AzureStorage(config) => config.api_version.as_deref(),
        }
    }
}

impl<'de> Deserialize<'de> for KubernetesClusterConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match storage_kind(&value)? {
            StorageKind::Nfs => serde_json::from_value(value)
                .map(KubernetesClusterConfig::Nfs)
                .map_err(de::Error::custom),
            StorageKind::AzureStorage => serde_json::from_value(value)
                .map(KubernetesClusterConfig::AzureStorage)
                .map_err(de::Error::custom),
        }
    }
}

impl fmt::Display for KubernetesClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(api_version) = self.api_version() {
            writeln!(f, "{:<16} {}", "API Version:", api_version)?;
        }
        writeln!(f, "{:<16} {}", "Storage:", self.storage_kind())?;
        match self {
            KubernetesClusterConfig::Nfs(config) => {
                writeln!(f, "NFS:")?;
                write!(indented(f), "{}", config.nfs)
            },
            KubernetesClusterConfig::AzureStorage(config) => {
                writeln!(f, "Key Vault:")?;
                write!(indented(f), "{}", config.key_vault)?;
                writeln!(f, "Azure Storage:")?;
                write!(indented(f), "{}", config.azure_storage)
            },
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NfsClusterConfig {
    /// API version of the job controller the trials are submitted to.
    pub api_version: Option<String>,
    #[serde(default)]
    pub storage: StorageKind,
    pub nfs: NfsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AzureClusterConfig {
    /// API version of the job controller the trials are submitted to.
    pub api_version: Option<String>,
    #[serde(default = "azure_storage_default")]
    pub storage: StorageKind,
    pub key_vault: KeyVaultConfig,
    pub azure_storage: AzureStorageConfig,
    /// How many times uploading trial code to the share is retried.
    pub upload_retry_count: Option<u32>,
}

/// Runtime requirements of a single trial container.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TrialTemplate {
    /// Command launching the trial. Executed within a shell.
    pub command: String,
    pub gpu_num: u32,
    pub cpu_num: u32,
    /// Memory limit in megabytes.
    #[serde(rename = "memoryMB")]
    pub memory_mb: u32,
    /// Docker image name.
    pub image: String,
    /// Path to a docker config file holding private registry credentials.
    pub private_registry_auth_path: Option<String>,
}

impl fmt::Display for TrialTemplate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Command:", self.command)?;
        writeln!(f, "{:<16} {}", "Image:", self.image)?;
        writeln!(
            f,
            "{:<16} {} GPU, {} CPU, {} MB",
            "Resources:", self.gpu_num, self.cpu_num, self.memory_mb
        )?;
        if let Some(path) = &self.private_registry_auth_path {
            writeln!(f, "{:<16} {}", "Registry Auth:", path)?;
        }
        Ok(())
    }
}
