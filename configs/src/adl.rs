use std::fmt::{self, Write};

use indenter::indented;
use serde::{Deserialize, Serialize};

/// Cluster settings for the AdaptDL training service.
/// AdaptDL brings its own storage handling, so only the
/// controller API version is configurable here.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdlClusterConfig {
    pub api_version: Option<String>,
}

impl fmt::Display for AdlClusterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{:<16} {}",
            "API Version:",
            self.api_version.as_deref().unwrap_or("-")
        )
    }
}

/// Persistent volume claim used to checkpoint trial state.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Checkpoint {
    pub storage_class: String,
    /// Requested volume size, e.g. "1Gi".
    pub storage_size: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ImagePullSecret {
    pub name: String,
}

/// The AdaptDL NFS shape also names the mount point inside the container.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdlNfsConfig {
    pub server: String,
    pub path: String,
    pub container_mount_path: String,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AdlTrialConfig {
    /// Directory holding the trial code.
    pub code_dir: String,
    /// Command launching the trial. Executed within a shell.
    pub command: String,
    pub gpu_num: u32,
    /// Docker image name.
    pub image: String,
    /// Namespace the trial jobs are created in. Defaults to "default".
    pub namespace: Option<String>,
    #[serde(default)]
    pub image_pull_secrets: Vec<ImagePullSecret>,
    pub nfs: Option<AdlNfsConfig>,
    pub checkpoint: Option<Checkpoint>,
    pub cpu_num: Option<u32>,
    /// Memory limit with unit, e.g. "8Gi".
    pub memory_size: Option<String>,
    /// Let AdaptDL rescale the number of replicas while the trial runs.
    pub adaptive: Option<bool>,
}

impl fmt::Display for AdlTrialConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Code Dir:", self.code_dir)?;
        writeln!(f, "{:<16} {}", "Command:", self.command)?;
        writeln!(f, "{:<16} {}", "Image:", self.image)?;
        writeln!(f, "{:<16} {}", "GPUs:", self.gpu_num)?;
        if let Some(namespace) = &self.namespace {
            writeln!(f, "{:<16} {}", "Namespace:", namespace)?;
        }
        if let Some(nfs) = &self.nfs {
            writeln!(f, "NFS:")?;
            write!(indented(f), "{}", nfs)?;
        }
        if let Some(checkpoint) = &self.checkpoint {
            writeln!(
                f,
                "{:<16} {} ({})",
                "Checkpoint:", checkpoint.storage_size, checkpoint.storage_class
            )?;
        }
        Ok(())
    }
}

impl fmt::Display for AdlNfsConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Server:", self.server)?;
        writeln!(f, "{:<16} {}", "Path:", self.path)?;
        writeln!(f, "{:<16} {}", "Mount Path:", self.container_mount_path)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn minimal_trial_config() {
        let value = json!({
            "codeDir": "/data/mnist",
            "command": "python mnist.py",
            "gpuNum": 1,
            "image": "mnist-trial:latest"
        });
        let config: AdlTrialConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.namespace, None);
        assert!(config.image_pull_secrets.is_empty());
        assert_eq!(config.adaptive, None);
    }

    #[test]
    fn full_trial_config() {
        let value = json!({
            "codeDir": "/data/mnist",
            "command": "python mnist.py",
            "gpuNum": 2,
            "image": "mnist-trial:latest",
            "namespace": "ml-experiments",
            "imagePullSecrets": [{"name": "regcred"}],
            "nfs": {
                "server": "10.0.0.1",
                "path": "/export/trials",
                "containerMountPath": "/mnt/nfs"
            },
            "checkpoint": {"storageClass": "dfs", "storageSize": "1Gi"},
            "cpuNum": 4,
            "memorySize": "8Gi",
            "adaptive": true
        });
        let config: AdlTrialConfig = serde_json::from_value(value).unwrap();
        assert_eq!(config.image_pull_secrets[0].name, "regcred");
        assert_eq!(
            config.nfs.as_ref().unwrap().container_mount_path,
            "/mnt/nfs"
        );
        assert_eq!(config.checkpoint.as_ref().unwrap().storage_size, "1Gi");
        assert_eq!(config.adaptive, Some(true));
    }

    #[test]
    fn trial_config_round_trips() {
        let value = json!({
            "codeDir": "/data/mnist",
            "command": "python mnist.py",
            "gpuNum": 1,
            "image": "mnist-trial:latest",
            "memorySize": "8Gi"
        });
        let config: AdlTrialConfig = serde_json::from_value(value).unwrap();
        let encoded = serde_json::to_value(&config).unwrap();
        let decoded: AdlTrialConfig = serde_json::from_value(encoded).unwrap();
        assert_eq!(config, decoded);
    }
}
