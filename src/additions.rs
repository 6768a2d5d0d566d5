//! @ai:module:intent Splice generated code into an unmodified source stream
//! @ai:module:layer application
//! @ai:module:public_api CodeAddition, CodeAdditions
//! @ai:module:depends_on code

use crate::code::Code;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::debug;

/// @ai:intent Code to insert after a given line; line 0 means before the first line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeAddition {
    pub line: usize,
    pub code: Code,
}

impl CodeAddition {
    pub fn new(line: usize, code: Code) -> Self {
        Self { line, code }
    }
}

/// @ai:intent Every change planned for one file: insertions, renamed lines and a prelude
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeAdditions {
    pub file: PathBuf,
    additions: Vec<CodeAddition>,
    renames: BTreeMap<usize, String>,
    prelude: Code,
}

impl CodeAdditions {
    pub fn new(file: impl Into<PathBuf>) -> Self {
        Self {
            file: file.into(),
            ..Default::default()
        }
    }

    pub fn file(&self) -> &Path {
        &self.file
    }

    pub fn add(&mut self, addition: CodeAddition) {
        debug!(
            "Insert {} lines after {}:{}",
            addition.code.len(),
            self.file.display(),
            addition.line
        );
        self.additions.push(addition);
    }

    /// @ai:intent Replace a whole line with new text
    /// @ai:post a later rename of the same line wins
    pub fn rename_line(&mut self, line: usize, text: impl Into<String>) {
        self.renames.insert(line, text.into());
    }

    /// Lines emitted before the first original line.
    pub fn set_prelude(&mut self, prelude: Code) {
        self.prelude = prelude;
    }

    /// @ai:intent Order insertions by line, keeping supplied order on ties
    pub fn sort(&mut self) {
        self.additions.sort_by_key(|a| a.line);
    }

    pub fn additions(&self) -> &[CodeAddition] {
        &self.additions
    }

    pub fn renames(&self) -> &BTreeMap<usize, String> {
        &self.renames
    }

    pub fn is_empty(&self) -> bool {
        self.additions.is_empty() && self.renames.is_empty() && self.prelude.is_empty()
    }

    /// @ai:intent Re-stream the original text with every change applied
    /// @ai:pre additions are sorted, or sort() is applied first
    /// @ai:post unchanged lines keep their exact bytes, including line terminators
    /// @ai:effects pure
    ///
    /// A renamed line is replaced by its new text and keeps its terminator;
    /// insertions targeting it still follow. Insertions past the end of the
    /// file are appended.
    pub fn merge(&self, original: &str) -> String {
        let mut sorted: Vec<&CodeAddition> = self.additions.iter().collect();
        sorted.sort_by_key(|a| a.line);
        let mut pending = sorted.into_iter().peekable();

        let mut out = String::with_capacity(original.len() + 256);
        push_code(&mut out, &self.prelude);
        while let Some(addition) = pending.next_if(|a| a.line == 0) {
            push_code(&mut out, &addition.code);
        }

        let mut line_no = 0;
        let mut terminated = true;
        for raw in original.split_inclusive('\n') {
            line_no += 1;
            match self.renames.get(&line_no) {
                Some(text) => {
                    out.push_str(text);
                    out.push_str(line_terminator(raw));
                }
                None => out.push_str(raw),
            }
            terminated = raw.ends_with('\n');

            while let Some(addition) = pending.next_if(|a| a.line <= line_no) {
                if !terminated {
                    out.push('\n');
                    terminated = true;
                }
                push_code(&mut out, &addition.code);
            }
        }

        for addition in pending {
            if !terminated {
                out.push('\n');
                terminated = true;
            }
            push_code(&mut out, &addition.code);
        }
        out
    }
}

fn line_terminator(raw: &str) -> &str {
    if raw.ends_with("\r\n") {
        "\r\n"
    } else if raw.ends_with('\n') {
        "\n"
    } else {
        ""
    }
}

fn push_code(out: &mut String, code: &Code) {
    for line in &code.lines {
        out.push_str(line);
        out.push('\n');
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn code(lines: &[&str]) -> Code {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_insertions_follow_their_lines() {
        let original = "l1\nl2\nl3\nl4\nl5\nl6\n";
        let mut additions = CodeAdditions::new("f.h");
        additions.add(CodeAddition::new(5, code(&["after five"])));
        additions.add(CodeAddition::new(2, code(&["after two"])));
        additions.sort();

        let merged = additions.merge(original);
        let lines: Vec<&str> = merged.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[2], "after two");
        assert_eq!(lines[6], "after five");
        assert_eq!(lines[5], "l5");
    }

    #[test]
    fn test_same_line_insertions_keep_supplied_order() {
        let original = "a\nb\nc\nd\ne\nf\ng\n";
        let mut additions = CodeAdditions::new("f.c");
        additions.add(CodeAddition::new(7, code(&["z"])));
        additions.add(CodeAddition::new(3, code(&["x"])));
        additions.add(CodeAddition::new(3, code(&["y"])));
        additions.sort();

        assert_eq!(
            additions.merge(original),
            "a\nb\nc\nx\ny\nd\ne\nf\ng\nz\n"
        );
    }

    #[test]
    fn test_renamed_line_keeps_its_insertion() {
        let original = "/** @Interface: f */\nint f() { return 1; }\nint g;\n";
        let mut additions = CodeAdditions::new("f.c");
        additions.rename_line(2, "int __wrapper__f() { return 1; }");
        additions.add(CodeAddition::new(2, code(&["int f() {", "\treturn __wrapper__f();", "}"])));

        assert_eq!(
            additions.merge(original),
            "/** @Interface: f */\nint __wrapper__f() { return 1; }\nint f() {\n\treturn __wrapper__f();\n}\nint g;\n"
        );
    }

    #[test]
    fn test_prelude_and_line_zero() {
        let mut additions = CodeAdditions::new("main.c");
        additions.set_prelude(code(&["/* generated */", "#include \"cdsspec-generated.h\""]));
        additions.add(CodeAddition::new(0, code(&["// first"])));

        assert_eq!(
            additions.merge("int x;\n"),
            "/* generated */\n#include \"cdsspec-generated.h\"\n// first\nint x;\n"
        );
    }

    #[test]
    fn test_original_bytes_are_preserved() {
        let original = "a\r\nb\r\n\r\nlast";
        let mut additions = CodeAdditions::new("w.c");
        assert_eq!(additions.merge(original), original);

        additions.add(CodeAddition::new(4, code(&["tail"])));
        additions.add(CodeAddition::new(9, code(&["eof"])));
        assert_eq!(additions.merge(original), "a\r\nb\r\n\r\nlast\ntail\neof\n");
    }
}
