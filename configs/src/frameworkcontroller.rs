use std::{
    collections::HashSet,
    fmt::{self, Write},
};

use anyhow::{ensure, Result};
use indenter::indented;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::{
    kubernetes::TrialTemplate,
    storage::{
        azure_storage_default, storage_kind, AzureStorageConfig, KeyVaultConfig, NfsConfig,
        StorageKind,
    },
};

/// Cluster settings for the FrameworkController training service.
/// The `storage` field decides which concrete shape applies.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum FrameworkControllerClusterConfig {
    Nfs(FrameworkControllerNfsClusterConfig),
    AzureStorage(FrameworkControllerAzureClusterConfig),
}

impl FrameworkControllerClusterConfig {
    pub fn storage_kind(&self) -> StorageKind {
        match self {
            FrameworkControllerClusterConfig::Nfs(config) => config.storage,
            FrameworkControllerClusterConfig::AzureStorage(config) => config.storage,
        }
    }

    pub fn service_account_name(&self) -> Option<&str> {
        match self {
            FrameworkControllerClusterConfig::Nfs(config) => {
                config.service_account_name.as_deref()
            },
            FrameworkControllerClusterConfig::AzureStorage(config) => {
                config.service_account_name.as_deref()
            },
        }
    }
}

impl<'de> Deserialize<'de> for FrameworkControllerClusterConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match storage_kind(&value)? {
            StorageKind::Nfs => serde_json::from_value(value)
                .map(FrameworkControllerClusterConfig::Nfs)
                .map_err(de::Error::custom),
            StorageKind::AzureStorage => serde_json::from_value(value)
                .map(FrameworkControllerClusterConfig::AzureStorage)
                .map_err(de::Error::custom),
        }
    }
}

impl fmt::Display for FrameworkControllerClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Storage:", self.storage_kind())?;
        if let Some(name) = self.service_account_name() {
            writeln!(f, "{:<16} {}", "Service Account:", name)?;
        }
        match self {
            FrameworkControllerClusterConfig::Nfs(config) => {
                writeln!(f, "NFS:")?;
                write!(indented(f), "{}", config.nfs)
            },
            FrameworkControllerClusterConfig::AzureStorage(config) => {
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
pub struct FrameworkControllerNfsClusterConfig {
    pub api_version: Option<String>,
    /// Service account granting the controller access to the cluster.
    pub service_account_name: Option<String>,
    #[serde(default)]
    pub storage: StorageKind,
    pub nfs: NfsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkControllerAzureClusterConfig {
    pub api_version: Option<String>,
    /// Service account granting the controller access to the cluster.
    pub service_account_name: Option<String>,
    #[serde(default = "azure_storage_default")]
    pub storage: StorageKind,
    pub key_vault: KeyVaultConfig,
    pub azure_storage: AzureStorageConfig,
    /// How many times uploading trial code to the share is retried.
    pub upload_retry_count: Option<u32>,
}

/// When a framework attempt is considered finished.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CompletionPolicy {
    /// Number of failed tasks that marks the attempt failed.
    pub min_failed_task_count: u32,
    /// Number of succeeded tasks that marks the attempt succeeded.
    pub min_succeeded_task_count: u32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkControllerTaskRole {
    /// Role name, unique within the trial.
    pub name: String,
    /// Number of tasks to run for this role.
    pub task_num: u32,
    pub framework_attempt_completion_policy: CompletionPolicy,
    #[serde(flatten)]
    pub template: TrialTemplate,
}

impl fmt::Display for FrameworkControllerTaskRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Tasks:", self.task_num)?;
        writeln!(
            f,
            "{:<16} {} failed / {} succeeded",
            "Completes After:",
            self.framework_attempt_completion_policy.min_failed_task_count,
            self.framework_attempt_completion_policy
                .min_succeeded_task_count
        )?;
        write!(f, "{}", self.template)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FrameworkControllerTrialConfig {
    /// Directory holding the trial code, uploaded to the shared storage.
    pub code_dir: String,
    pub task_roles: Vec<FrameworkControllerTaskRole>,
}

impl FrameworkControllerTrialConfig {
    pub fn validate(&self) -> Result<()> {
        ensure!(
            !self.task_roles.is_empty(),
            "trial must define at least one task role"
        );
        let mut names = HashSet::new();
        for role in &self.task_roles {
            ensure!(
                role.task_num > 0,
                "task role {} must run at least one task",
                role.name
            );
            ensure!(
                names.insert(role.name.as_str()),
                "duplicate task role name {}",
                role.name
            );
        }
        Ok(())
    }
}

impl fmt::Display for FrameworkControllerTrialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Code Dir:", self.code_dir)?;
        for role in &self.task_roles {
            writeln!(f, "Task Role {}:", role.name)?;
            write!(indented(f), "{}", role)?;
        }
        Ok(())
    }
}
