use std::fmt::{self, Write};

use anyhow::{ensure, Result};
use indenter::indented;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::{
    kubernetes::TrialTemplate,
    storage::{
        azure_storage_default, storage_kind, AzureStorageConfig, KeyVaultConfig, NfsConfig,
        StorageKind,
    },
};

/// Kubernetes custom controller running the distributed-training job.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
pub enum KubeflowOperator {
    #[serde(rename = "tf-operator")]
    #[strum(serialize = "tf-operator")]
    TfOperator,
    #[serde(rename = "pytorch-operator")]
    #[strum(serialize = "pytorch-operator")]
    PytorchOperator,
}

/// Role a replica plays in a distributed-training job.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DistTrainRole {
    Worker,
    Ps,
    Master,
}

/// Cluster settings for the Kubeflow training service.
/// The `storage` field decides which concrete shape applies.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum KubeflowClusterConfig {
    Nfs(KubeflowNfsClusterConfig),
    AzureStorage(KubeflowAzureClusterConfig),
}

impl KubeflowClusterConfig {
    pub fn operator(&self) -> KubeflowOperator {
        match self {
            KubeflowClusterConfig::Nfs(config) => config.operator,
            KubeflowClusterConfig::AzureStorage(config) => config.operator,
        }
    }

    pub fn storage_kind(&self) -> StorageKind {
        match self {
            KubeflowClusterConfig::Nfs(config) => config.storage,
            KubeflowClusterConfig::AzureStorage(config) => config.storage,
        }
    }

    pub fn api_version(&self) -> &str {
        match self {
            KubeflowClusterConfig::Nfs(config) => &config.api_version,
            KubeflowClusterConfig::AzureStorage(config) => &config.api_version,
        }
    }
}

impl<'de> Deserialize<'de> for KubeflowClusterConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        match storage_kind(&value)? {
            StorageKind::Nfs => serde_json::from_value(value)
                .map(KubeflowClusterConfig::Nfs)
                .map_err(de::Error::custom),
            StorageKind::AzureStorage => serde_json::from_value(value)
                .map(KubeflowClusterConfig::AzureStorage)
                .map_err(de::Error::custom),
        }
    }
}

impl fmt::Display for KubeflowClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Operator:", self.operator())?;
        writeln!(f, "{:<16} {}", "API Version:", self.api_version())?;
        writeln!(f, "{:<16} {}", "Storage:", self.storage_kind())?;
        match self {
            KubeflowClusterConfig::Nfs(config) => {
                writeln!(f, "NFS:")?;
                write!(indented(f), "{}", config.nfs)
            },
            KubeflowClusterConfig::AzureStorage(config) => {
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
pub struct KubeflowNfsClusterConfig {
    pub operator: KubeflowOperator,
    /// API version of the operator, e.g. "v1".
    pub api_version: String,
    #[serde(default)]
    pub storage: StorageKind,
    pub nfs: NfsConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeflowAzureClusterConfig {
    pub operator: KubeflowOperator,
    /// API version of the operator, e.g. "v1".
    pub api_version: String,
    #[serde(default = "azure_storage_default")]
    pub storage: StorageKind,
    pub key_vault: KeyVaultConfig,
    pub azure_storage: AzureStorageConfig,
    /// How many times uploading trial code to the share is retried.
    pub upload_retry_count: Option<u32>,
}

/// One distributed-training role: how many replicas to run
/// and what each replica needs.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct KubeflowRoleConfig {
    pub replicas: u32,
    #[serde(flatten)]
    pub template: TrialTemplate,
}

impl fmt::Display for KubeflowRoleConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Replicas:", self.replicas)?;
        write!(f, "{}", self.template)
    }
}

/// Trial settings for the Kubeflow training service.
/// The trial section carries no discriminant of its own:
/// the cluster's operator decides which shape applies.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(untagged)]
pub enum KubeflowTrialConfig {
    Tensorflow(KubeflowTensorflowTrialConfig),
    Pytorch(KubeflowPytorchTrialConfig),
}

impl KubeflowTrialConfig {
    pub fn from_value(
        operator: KubeflowOperator,
        value: Value,
    ) -> Result<Self, serde_json::Error> {
        match operator {
            KubeflowOperator::TfOperator => {
                serde_json::from_value(value).map(KubeflowTrialConfig::Tensorflow)
            },
            KubeflowOperator::PytorchOperator => {
                serde_json::from_value(value).map(KubeflowTrialConfig::Pytorch)
            },
        }
    }

    pub fn operator(&self) -> KubeflowOperator {
        match self {
            KubeflowTrialConfig::Tensorflow(..) => KubeflowOperator::TfOperator,
            KubeflowTrialConfig::Pytorch(..) => KubeflowOperator::PytorchOperator,
        }
    }

    pub fn code_dir(&self) -> &str {
        match self {
            KubeflowTrialConfig::Tensorflow(config) => &config.code_dir,
            KubeflowTrialConfig::Pytorch(config) => &config.code_dir,
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            KubeflowTrialConfig::Tensorflow(config) => {
                validate_role(DistTrainRole::Worker, &config.worker)?;
                if let Some(ps) = &config.ps {
                    validate_role(DistTrainRole::Ps, ps)?;
                }
            },
            KubeflowTrialConfig::Pytorch(config) => {
                validate_role(DistTrainRole::Master, &config.master)?;
                if let Some(worker) = &config.worker {
                    validate_role(DistTrainRole::Worker, worker)?;
                }
            },
        }
        Ok(())
    }
}

fn validate_role(role: DistTrainRole, config: &KubeflowRoleConfig) -> Result<()> {
    ensure!(
        config.replicas > 0,
        "{} role must run at least one replica",
        role
    );
    Ok(())
}

impl fmt::Display for KubeflowTrialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Code Dir:", self.code_dir())?;
        match self {
            KubeflowTrialConfig::Tensorflow(config) => {
                writeln!(f, "Worker:")?;
                write!(indented(f), "{}", config.worker)?;
                if let Some(ps) = &config.ps {
                    writeln!(f, "PS:")?;
                    write!(indented(f), "{}", ps)?;
                }
            },
            KubeflowTrialConfig::Pytorch(config) => {
                writeln!(f, "Master:")?;
                write!(indented(f), "{}", config.master)?;
                if let Some(worker) = &config.worker {
                    writeln!(f, "Worker:")?;
                    write!(indented(f), "{}", worker)?;
                }
            },
        }
        Ok(())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeflowTensorflowTrialConfig {
    /// Directory holding the trial code, uploaded to the shared storage.
    pub code_dir: String,
    pub worker: KubeflowRoleConfig,
    pub ps: Option<KubeflowRoleConfig>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KubeflowPytorchTrialConfig {
    /// Directory holding the trial code, uploaded to the shared storage.
    pub code_dir: String,
    pub master: KubeflowRoleConfig,
    pub worker: Option<KubeflowRoleConfig>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn worker_role() -> Value {
        json!({
            "replicas": 2,
            "command": "python mnist.py",
            "gpuNum": 1,
            "cpuNum": 2,
            "memoryMB": 8192,
            "image": "mnist-trial:latest"
        })
    }

    #[test]
    fn operator_wire_names() {
        assert_eq!(KubeflowOperator::TfOperator.to_string(), "tf-operator");
        assert_eq!(
            serde_json::from_value::<KubeflowOperator>(json!("pytorch-operator")).unwrap(),
            KubeflowOperator::PytorchOperator
        );
    }

    #[test]
    fn unknown_operator_is_rejected() {
        let err = serde_json::from_value::<KubeflowOperator>(json!("mxnet-operator")).unwrap_err();
        assert!(err.to_string().contains("mxnet-operator"));
    }

    #[test]
    fn cluster_config_dispatches_on_storage() {
        let value = json!({
            "operator": "tf-operator",
            "apiVersion": "v1",
            "nfs": {"server": "10.0.0.1", "path": "/export/trials"}
        });
        let config: KubeflowClusterConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.operator(), KubeflowOperator::TfOperator);
        assert_eq!(config.storage_kind(), StorageKind::Nfs);
        assert_eq!(config.api_version(), "v1");
    }

    #[test]
    fn tf_operator_selects_tensorflow_trial() {
        let value = json!({
            "codeDir": "/data/mnist",
            "worker": worker_role(),
            "ps": {
                "replicas": 1,
                "command": "python mnist.py",
                "gpuNum": 0,
                "cpuNum": 1,
                "memoryMB": 4096,
                "image": "mnist-trial:latest"
            }
        });
        let trial = KubeflowTrialConfig::from_value(KubeflowOperator::TfOperator, value).unwrap();
        match trial {
            KubeflowTrialConfig::Tensorflow(config) => {
                assert_eq!(config.code_dir, "/data/mnist");
                assert_eq!(config.worker.replicas, 2);
                assert_eq!(config.worker.template.gpu_num, 1);
                assert_eq!(config.ps.unwrap().template.memory_mb, 4096);
            },
            other => panic!("expected TensorFlow trial, got {:?}", other),
        }
    }

    #[test]
    fn pytorch_operator_selects_pytorch_trial() {
        let value = json!({
            "codeDir": "/data/cifar10",
            "master": worker_role()
        });
        let trial =
            KubeflowTrialConfig::from_value(KubeflowOperator::PytorchOperator, value).unwrap();
        assert_eq!(trial.operator(), KubeflowOperator::PytorchOperator);
        match trial {
            KubeflowTrialConfig::Pytorch(config) => {
                assert_eq!(config.master.replicas, 2);
                assert!(config.worker.is_none());
            },
            other => panic!("expected PyTorch trial, got {:?}", other),
        }
    }

    #[test]
    fn zero_replicas_fail_validation() {
        let mut role = worker_role();
        role["replicas"] = json!(0);
        let value = json!({"codeDir": "/data/mnist", "worker": role});
        let trial = KubeflowTrialConfig::from_value(KubeflowOperator::TfOperator, value).unwrap();
        let err = trial.validate().unwrap_err();
        assert!(err.to_string().contains("worker"));
    }

    #[test]
    fn trial_config_round_trips() {
        let value = json!({"codeDir": "/data/mnist", "worker": worker_role()});
        let trial = KubeflowTrialConfig::from_value(KubeflowOperator::TfOperator, value).unwrap();
        let encoded = serde_json::to_value(&trial).unwrap();
        let decoded =
            KubeflowTrialConfig::from_value(KubeflowOperator::TfOperator, encoded).unwrap();
        assert_eq!(trial, decoded);
    }
}
