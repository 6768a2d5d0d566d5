//! @ai:module:intent Split a raw annotation block into named primitives
//! @ai:module:layer application
//! @ai:module:public_api Primitive, PrimitiveSplitter, extract_primitive, trim_comment_close
//! @ai:module:depends_on diagnostics, error

use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Matches a primitive header such as `@DeclareState:`.
static PRIMITIVE_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"@(\w+):").expect("Invalid regex"));

/// @ai:intent One `@Name: content...` sub-section of an annotation block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Primitive {
    pub name: String,
    pub begin_line: usize,
    pub contents: Vec<String>,
}

impl Primitive {
    fn new(name: &str, begin_line: usize) -> Self {
        Self {
            name: name.to_string(),
            begin_line,
            contents: Vec::new(),
        }
    }

    fn push_trimmed(&mut self, raw: &str) {
        let line = trim_comment_close(raw);
        if !line.is_empty() {
            self.contents.push(line.to_string());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.contents.is_empty()
    }
}

/// @ai:intent Strip a trailing comment-close marker and surrounding whitespace
/// @ai:example ("  x = 0; */ ") -> "x = 0;"
/// @ai:effects pure
pub fn trim_comment_close(line: &str) -> &str {
    let line = line.trim_end();
    let line = line.strip_suffix("*/").unwrap_or(line);
    line.trim()
}

/// @ai:intent Extract the next primitive starting at the cursor
/// @ai:pre begin_line is the file line number of annotations[0]
/// @ai:post cursor points at the next primitive header or the end of the list
/// @ai:effects log
///
/// Returns `Ok(None)` once the cursor has reached the end of the block. Lines
/// before the first header are skipped; a block with no header at all is a
/// fatal error. Empty primitives are returned after a warning.
pub fn extract_primitive(
    file: &Path,
    begin_line: usize,
    annotations: &[String],
    cursor: &mut usize,
    diagnostics: &mut Diagnostics,
) -> Result<Option<Primitive>> {
    if *cursor >= annotations.len() {
        return Ok(None);
    }

    let mut primitive = None;
    while *cursor < annotations.len() {
        let line = &annotations[*cursor];
        if let Some(captures) = PRIMITIVE_HEADER.captures(line) {
            let header = captures.get(0).map_or(0, |m| m.end());
            let name = captures.get(1).map_or("", |m| m.as_str());
            let mut found = Primitive::new(name, begin_line + *cursor);
            found.push_trimmed(&line[header..]);
            primitive = Some(found);
            break;
        }
        *cursor += 1;
    }

    let mut primitive = match primitive {
        Some(p) => p,
        None => {
            let line = begin_line + annotations.len().saturating_sub(1);
            return Err(Error::annotation(
                file,
                line,
                "Expected a primitive (\"@Name:\") in the annotation block.",
            ));
        }
    };

    *cursor += 1;
    while *cursor < annotations.len() {
        let line = &annotations[*cursor];
        if PRIMITIVE_HEADER.is_match(line) {
            break;
        }
        primitive.push_trimmed(line);
        *cursor += 1;
    }

    if primitive.is_empty() {
        diagnostics.warn(
            file,
            primitive.begin_line,
            format!("Primitive {} is empty.", primitive.name),
        );
    }
    Ok(Some(primitive))
}

/// @ai:intent Iterate over the primitives of one annotation block
pub struct PrimitiveSplitter<'a> {
    file: &'a Path,
    begin_line: usize,
    annotations: &'a [String],
    cursor: usize,
}

impl<'a> PrimitiveSplitter<'a> {
    pub fn new(file: &'a Path, begin_line: usize, annotations: &'a [String]) -> Self {
        Self {
            file,
            begin_line,
            annotations,
            cursor: 0,
        }
    }

    /// @ai:intent Pull the next primitive, or None at the end of the block
    pub fn next_primitive(&mut self, diagnostics: &mut Diagnostics) -> Result<Option<Primitive>> {
        extract_primitive(
            self.file,
            self.begin_line,
            self.annotations,
            &mut self.cursor,
            diagnostics,
        )
    }

    /// @ai:intent Split the whole block at once
    pub fn collect_all(mut self, diagnostics: &mut Diagnostics) -> Result<Vec<Primitive>> {
        let mut primitives = Vec::new();
        while let Some(p) = self.next_primitive(diagnostics)? {
            primitives.push(p);
        }
        Ok(primitives)
    }
}
