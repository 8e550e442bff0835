use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::utils::load_experiment;

#[derive(Args)]
pub struct Arg {
    /// The experiment configuration file to check
    #[clap(short, long, parse(from_os_str), value_name = "FILE")]
    file: PathBuf,
}

impl Arg {
    pub fn handle(&self) -> Result<()> {
        let config = load_experiment(self.file.as_path())?;
        config.validate().with_context(|| {
            format!("Invalid experiment configuration {}", self.file.display())
        })?;
        println!(
            "{} is a valid {} experiment configuration",
            self.file.display(),
            config.platform()
        );
        Ok(())
    }
}
