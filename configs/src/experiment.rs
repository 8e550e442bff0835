use std::fmt::{self, Write};

use anyhow::Result;
use indenter::indented;
use serde::{de, Deserialize, Deserializer, Serialize};
use serde_json::Value;
use strum::{Display, EnumString};

use crate::{
    adl::{AdlClusterConfig, AdlTrialConfig},
    frameworkcontroller::{FrameworkControllerClusterConfig, FrameworkControllerTrialConfig},
    kubeflow::{KubeflowClusterConfig, KubeflowTrialConfig},
};

/// Training service the experiment runs its trials on.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TrainingServicePlatform {
    Kubeflow,
    FrameworkController,
    Adl,
}

/// A parsed experiment configuration file: the platform-specific
/// cluster section paired with the matching trial section.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "trainingServicePlatform", rename_all = "lowercase")]
pub enum ExperimentConfig {
    Kubeflow {
        #[serde(rename = "kubeflowConfig")]
        config: KubeflowClusterConfig,
        trial: KubeflowTrialConfig,
    },
    FrameworkController {
        #[serde(rename = "frameworkcontrollerConfig")]
        config: FrameworkControllerClusterConfig,
        trial: FrameworkControllerTrialConfig,
    },
    Adl {
        #[serde(rename = "adlConfig")]
        config: AdlClusterConfig,
        trial: AdlTrialConfig,
    },
}

impl ExperimentConfig {
    pub fn platform(&self) -> TrainingServicePlatform {
        match self {
            ExperimentConfig::Kubeflow { .. } => TrainingServicePlatform::Kubeflow,
            ExperimentConfig::FrameworkController { .. } => {
                TrainingServicePlatform::FrameworkController
            },
            ExperimentConfig::Adl { .. } => TrainingServicePlatform::Adl,
        }
    }

    /// Structural checks beyond what decoding enforces.
    pub fn validate(&self) -> Result<()> {
        match self {
            ExperimentConfig::Kubeflow { trial, .. } => trial.validate(),
            ExperimentConfig::FrameworkController { trial, .. } => trial.validate(),
            ExperimentConfig::Adl { .. } => Ok(()),
        }
    }
}

impl<'de> Deserialize<'de> for ExperimentConfig {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        let platform = match value.get("trainingServicePlatform") {
            None => return Err(de::Error::missing_field("trainingServicePlatform")),
            Some(Value::String(platform)) => {
                platform.parse::<TrainingServicePlatform>().map_err(|_| {
                    de::Error::custom(format!(
                        "unknown training service platform {:?}",
                        platform
                    ))
                })?
            },
            Some(other) => {
                return Err(de::Error::custom(format!(
                    "invalid training service platform: {}",
                    other
                )))
            },
        };
        match platform {
            TrainingServicePlatform::Kubeflow => {
                let config: KubeflowClusterConfig =
                    decode_section(&value, "kubeflowConfig")?;
                let trial = section(&value, "trial")?;
                let trial = KubeflowTrialConfig::from_value(config.operator(), trial.clone())
                    .map_err(de::Error::custom)?;
                Ok(ExperimentConfig::Kubeflow { config, trial })
            },
            TrainingServicePlatform::FrameworkController => {
                Ok(ExperimentConfig::FrameworkController {
                    config: decode_section(&value, "frameworkcontrollerConfig")?,
                    trial: decode_section(&value, "trial")?,
                })
            },
            TrainingServicePlatform::Adl => Ok(ExperimentConfig::Adl {
                config: decode_section(&value, "adlConfig")?,
                trial: decode_section(&value, "trial")?,
            }),
        }
    }
}

fn section<'a, E>(value: &'a Value, name: &'static str) -> Result<&'a Value, E>
where
    E: de::Error,
{
    value.get(name).ok_or_else(|| E::missing_field(name))
}

fn decode_section<T, E>(value: &Value, name: &'static str) -> Result<T, E>
where
    T: serde::de::DeserializeOwned,
    E: de::Error,
{
    serde_json::from_value(section(value, name)?.clone()).map_err(E::custom)
}

impl fmt::Display for ExperimentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<16} {}", "Platform:", self.platform())?;
        match self {
            ExperimentConfig::Kubeflow { config, trial } => {
                writeln!(f, "Cluster:")?;
                write!(indented(f), "{}", config)?;
                writeln!(f, "Trial:")?;
                write!(indented(f), "{}", trial)
            },
            ExperimentConfig::FrameworkController { config, trial } => {
                writeln!(f, "Cluster:")?;
                write!(indented(f), "{}", config)?;
                writeln!(f, "Trial:")?;
                write!(indented(f), "{}", trial)
            },
            ExperimentConfig::Adl { config, trial } => {
                writeln!(f, "Cluster:")?;
                write!(indented(f), "{}", config)?;
                writeln!(f, "Trial:")?;
                write!(indented(f), "{}", trial)
            },
        }
    }
}
