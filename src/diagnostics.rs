//! @ai:module:intent Collect non-fatal specification warnings
//! @ai:module:layer domain
//! @ai:module:public_api Location, Warning, Diagnostics

use crate::error::display_name;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// @ai:intent Represents a source code location
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Location {
    pub file: PathBuf,
    pub line: usize,
}

impl Location {
    /// @ai:intent Create a new Location
    pub fn new(file: impl Into<PathBuf>, line: usize) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// @ai:intent Get the file name without its directory
    pub fn file_name(&self) -> String {
        display_name(&self.file)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_name(), self.line)
    }
}

/// @ai:intent A warning about a suspicious but usable annotation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Warning {
    pub location: Location,
    pub message: String,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Spec WARNING in file \"{}\", line {}: {}",
            self.location.file_name(),
            self.location.line,
            self.message
        )
    }
}

/// @ai:intent Accumulates warnings raised during one run
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Diagnostics {
    warnings: Vec<Warning>,
}

impl Diagnostics {
    /// @ai:intent Record a warning and forward it to the log
    /// @ai:effects log
    pub fn warn(&mut self, file: &Path, line: usize, message: impl Into<String>) {
        let warning = Warning {
            location: Location::new(file, line),
            message: message.into(),
        };
        tracing::warn!("{}", warning);
        self.warnings.push(warning);
    }

    pub fn warnings(&self) -> &[Warning] {
        &self.warnings
    }

    pub fn is_empty(&self) -> bool {
        self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_is_recorded() {
        let mut diags = Diagnostics::default();
        diags.warn(Path::new("dir/queue.h"), 4, "Primitive Print is empty.");

        assert_eq!(diags.warnings().len(), 1);
        assert_eq!(
            diags.warnings()[0].to_string(),
            "Spec WARNING in file \"queue.h\", line 4: Primitive Print is empty."
        );
    }
}
