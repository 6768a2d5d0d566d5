//! @ai:module:intent Classify C/C++ source files by role
//! @ai:module:layer domain
//! @ai:module:public_api SourceKind, detect_source_kind, is_supported_file
//! @ai:module:stateless true

use std::path::Path;

/// @ai:intent Role of an input file in the instrumented build
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SourceKind {
    Header,
    CSource,
    CppSource,
}

impl SourceKind {
    /// @ai:intent Get file extensions for this kind
    /// @ai:effects pure
    pub fn extensions(&self) -> &[&str] {
        match self {
            SourceKind::Header => &["h", "hh", "hpp"],
            SourceKind::CSource => &["c"],
            SourceKind::CppSource => &["cc", "cpp"],
        }
    }

    /// Primary sources get the generated header included at their top.
    pub fn is_primary_source(&self) -> bool {
        !matches!(self, SourceKind::Header)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SourceKind::Header => "header",
            SourceKind::CSource => "c",
            SourceKind::CppSource => "cpp",
        }
    }
}

/// @ai:intent Detect the source kind from a file path
/// @ai:example ("queue.h") -> Some(Header)
/// @ai:example ("main.cc") -> Some(CppSource)
/// @ai:example ("notes.txt") -> None
/// @ai:effects pure
pub fn detect_source_kind(path: &Path) -> Option<SourceKind> {
    let ext = path.extension()?.to_str()?;

    [SourceKind::Header, SourceKind::CSource, SourceKind::CppSource]
        .into_iter()
        .find(|kind| kind.extensions().contains(&ext))
}

/// @ai:intent Check if a file should be scanned for annotations
/// @ai:effects pure
pub fn is_supported_file(path: &Path) -> bool {
    detect_source_kind(path).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_header() {
        assert_eq!(
            detect_source_kind(Path::new("ms-queue/queue.h")),
            Some(SourceKind::Header)
        );
        assert_eq!(
            detect_source_kind(Path::new("deque.hpp")),
            Some(SourceKind::Header)
        );
    }

    #[test]
    fn test_detect_primary_sources() {
        assert_eq!(detect_source_kind(Path::new("main.c")), Some(SourceKind::CSource));
        assert_eq!(
            detect_source_kind(Path::new("testcase1.cc")),
            Some(SourceKind::CppSource)
        );
        assert!(SourceKind::CppSource.is_primary_source());
        assert!(!SourceKind::Header.is_primary_source());
    }

    #[test]
    fn test_unsupported() {
        assert_eq!(detect_source_kind(Path::new("Makefile")), None);
        assert!(!is_supported_file(Path::new("README.md")));
    }
}
