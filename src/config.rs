//! @ai:module:intent Run parameters for the generator, loadable from TOML
//! @ai:module:layer infrastructure
//! @ai:module:public_api GeneratorConfig, PathConfig, RunConfig
//! @ai:module:stateless true

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// @ai:intent Main configuration of a generation run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratorConfig {
    #[serde(default)]
    pub paths: PathConfig,
    #[serde(default)]
    pub run: RunConfig,
}

/// @ai:intent Input and output roots
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathConfig {
    #[serde(default = "default_benchmarks_dir")]
    pub benchmarks_dir: PathBuf,
    #[serde(default = "default_generated_dir")]
    pub generated_dir: PathBuf,
}

/// @ai:intent Which sub-directories of the input root to process
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub benchmarks: Vec<String>,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            benchmarks_dir: default_benchmarks_dir(),
            generated_dir: default_generated_dir(),
        }
    }
}

fn default_benchmarks_dir() -> PathBuf {
    PathBuf::from("benchmarks")
}

fn default_generated_dir() -> PathBuf {
    PathBuf::from("generated")
}

impl GeneratorConfig {
    /// @ai:intent Load configuration from a TOML file
    /// @ai:pre path exists and is readable
    /// @ai:effects fs:read
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// @ai:intent Save configuration to a TOML file
    /// @ai:effects fs:write
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self).map_err(|e| Error::Config {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        fs::write(path, content).map_err(|source| Error::FileWrite {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Input directory of one named benchmark.
    pub fn input_dir(&self, benchmark: &str) -> PathBuf {
        self.paths.benchmarks_dir.join(benchmark)
    }

    /// Output directory of one named benchmark.
    pub fn output_dir(&self, benchmark: &str) -> PathBuf {
        self.paths.generated_dir.join(benchmark)
    }
}
