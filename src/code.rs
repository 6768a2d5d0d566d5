//! @ai:module:intent Represent generated or extracted code as an ordered list of lines
//! @ai:module:layer domain
//! @ai:module:public_api Code
//! @ai:module:stateless true

use serde::{Deserialize, Serialize};
use std::fmt;

/// Leading words that open a nested scope when re-indenting.
const SCOPE_KEYWORDS: [&str; 6] = ["for", "ForEach", "if", "else", "while", "do"];

/// @ai:intent A piece of code: an ordered, mutable list of text lines
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Code {
    pub lines: Vec<String>,
}

impl Code {
    pub fn new() -> Self {
        Self::default()
    }

    /// @ai:intent Append one line (usually a single C/C++ statement)
    pub fn add_line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    /// @ai:intent Append several lines in order
    pub fn add_lines<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lines.extend(lines.into_iter().map(Into::into));
    }

    /// @ai:intent Append all lines of another code block
    pub fn append(&mut self, other: &Code) {
        self.lines.extend(other.lines.iter().cloned());
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// @ai:intent Re-indent the code with tabs following its keyword/brace structure
    /// @ai:post applying align twice yields the same lines as applying it once
    /// @ai:effects pure
    ///
    /// A line that starts with a control keyword and ends with `{` indents the
    /// following lines one level deeper until the closing-brace line. A keyword
    /// line that ends in neither `{` nor `;` indents only the statement that
    /// follows it (or the chain of keyword lines that follows it).
    pub fn align(&mut self, initial_tabs: usize) {
        let mut idx = 0;
        self.align_from(&mut idx, initial_tabs, false);
    }

    fn align_from(&mut self, idx: &mut usize, level: usize, no_brace_keyword: bool) {
        while *idx < self.lines.len() {
            let cur = self.lines[*idx].trim().to_string();
            if closes_scope(&cur) {
                return;
            }
            if no_brace_keyword && !keyword_brace(&cur) && !keyword_no_brace(&cur) {
                self.lines[*idx] = indent(level, &cur);
                return;
            }

            self.lines[*idx] = indent(level, &cur);

            if keyword_brace(&cur) {
                *idx += 1;
                self.align_from(idx, level + 1, false);
                if let Some(closing) = self.lines.get(*idx) {
                    let closing = closing.trim().to_string();
                    self.lines[*idx] = indent(level, &closing);
                }
            } else if keyword_no_brace(&cur) {
                *idx += 1;
                self.align_from(idx, level + 1, true);
                if no_brace_keyword {
                    return;
                }
            }
            *idx += 1;
        }
    }
}

fn starts_with_keyword(line: &str) -> bool {
    SCOPE_KEYWORDS.iter().any(|kw| line.starts_with(kw))
}

fn closes_scope(line: &str) -> bool {
    line.ends_with('}')
}

fn keyword_brace(line: &str) -> bool {
    starts_with_keyword(line) && line.ends_with('{')
}

fn keyword_no_brace(line: &str) -> bool {
    starts_with_keyword(line) && !line.ends_with('{') && !line.ends_with(';')
}

fn indent(level: usize, line: &str) -> String {
    if line.is_empty() {
        return String::new();
    }
    format!("{}{}", "\t".repeat(level), line)
}

impl fmt::Display for Code {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in &self.lines {
            writeln!(f, "{}", line)?;
        }
        Ok(())
    }
}

impl From<Vec<String>> for Code {
    fn from(lines: Vec<String>) -> Self {
        Self { lines }
    }
}

impl<S: Into<String>> FromIterator<S> for Code {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            lines: iter.into_iter().map(Into::into).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn code(lines: &[&str]) -> Code {
        lines.iter().copied().collect()
    }

    #[test]
    fn test_align_braced_scope() {
        let mut c = code(&["int x = 0;", "if (x) {", "x++;", "}", "return x;"]);
        c.align(1);
        assert_eq!(
            c.lines,
            vec!["\tint x = 0;", "\tif (x) {", "\t\tx++;", "\t}", "\treturn x;"]
        );
    }

    #[test]
    fn test_align_single_statement_scope() {
        let mut c = code(&["if (x)", "y = 1;", "z = 2;"]);
        c.align(0);
        assert_eq!(c.lines, vec!["if (x)", "\ty = 1;", "z = 2;"]);
    }

    #[test]
    fn test_align_keyword_chain() {
        let mut c = code(&["for (i = 0; i < n; i++)", "if (a[i])", "cnt++;", "done();"]);
        c.align(0);
        assert_eq!(
            c.lines,
            vec!["for (i = 0; i < n; i++)", "\tif (a[i])", "\t\tcnt++;", "done();"]
        );
    }

    #[test]
    fn test_align_is_idempotent() {
        let mut once = code(&[
            "  while (true) {",
            "if (done)",
            "      break;",
            "else {",
            "step();",
            "}",
            "}",
            "finish();",
        ]);
        once.align(1);
        let mut twice = once.clone();
        twice.align(1);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_display_terminates_every_line() {
        let c = code(&["a;", "b;"]);
        assert_eq!(c.to_string(), "a;\nb;\n");
    }
}
