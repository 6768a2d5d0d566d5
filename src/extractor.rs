//! @ai:module:intent Scan annotated C/C++ files into a validated specification model
//! @ai:module:layer application
//! @ai:module:public_api SpecExtractor, SpecModel, FileSpec, extract_paths
//! @ai:module:depends_on construct, decl_parser, diagnostics, error, naming

use crate::construct::{
    Construct, DefineConstruct, EntryConstruct, GlobalConstruct, InterfaceAnnotation,
    InterfaceConstruct, OpConstruct, OpKind,
};
use crate::decl_parser::parse_function_header;
use crate::diagnostics::{Diagnostics, Location};
use crate::error::{Error, Result};
use crate::naming;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::collections::btree_map::Entry as MapEntry;
use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

static HEADER_INCLUDE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"^[ \t]*#include[ \t]+("|<)([a-zA-Z_0-9\-\./]+)("|>)"#).expect("Invalid regex")
});
static ONE_LINE_CONSTRUCT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*/\*\*\s*@(\w+)").expect("Invalid regex"));
static BLOCK_CONSTRUCT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\s*/\*\*\s*@(DeclareState|Interface|PreCondition|JustifyingPrecondition|Transition|JustifyingPostcondition|PostCondition|Define)\b",
    )
    .expect("Invalid regex")
});
static BLOCK_END: Lazy<Regex> = Lazy::new(|| Regex::new(r"\*/\s*$").expect("Invalid regex"));

/// Per-line recognizers, tried in order; the first one that consumes the line wins.
#[derive(Debug, Clone, Copy)]
enum LineRule {
    HeaderInclude,
    OneLineConstruct,
    BlockConstruct,
}

const LINE_RULES: [LineRule; 3] = [
    LineRule::HeaderInclude,
    LineRule::OneLineConstruct,
    LineRule::BlockConstruct,
];

impl LineRule {
    fn pattern(self) -> &'static Regex {
        match self {
            LineRule::HeaderInclude => &HEADER_INCLUDE,
            LineRule::OneLineConstruct => &ONE_LINE_CONSTRUCT,
            LineRule::BlockConstruct => &BLOCK_CONSTRUCT,
        }
    }
}

/// Forward-only cursor over the lines of one file, numbered from 1.
struct LineCursor<'a> {
    lines: Vec<&'a str>,
    next: usize,
}

impl<'a> LineCursor<'a> {
    fn new(text: &'a str) -> Self {
        Self {
            lines: text.lines().collect(),
            next: 0,
        }
    }

    fn next_line(&mut self) -> Option<(usize, &'a str)> {
        let line = self.lines.get(self.next).copied()?;
        self.next += 1;
        Some((self.next, line))
    }
}

/// @ai:intent Running count of unmatched braces in a function body
///
/// Braces are counted in raw text, including those inside string and
/// character literals.
#[derive(Debug, Clone, Copy, Default)]
struct BraceCounter {
    depth: i64,
    seen_open: bool,
}

impl BraceCounter {
    /// True as soon as the count returns to zero after the first `{`.
    /// Text after the closing brace on the same line is ignored.
    fn feed(&mut self, line: &str) -> bool {
        for ch in line.chars() {
            match ch {
                '{' => {
                    self.depth += 1;
                    self.seen_open = true;
                }
                '}' if self.seen_open => self.depth -= 1,
                _ => {}
            }
            if self.seen_open && self.depth == 0 {
                return true;
            }
        }
        false
    }
}

/// @ai:intent Constructs found in one file, in source order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileSpec {
    pub path: PathBuf,
    pub defines: Vec<DefineConstruct>,
    pub interfaces: Vec<InterfaceConstruct>,
    pub ops: Vec<OpConstruct>,
    pub entry: Option<EntryConstruct>,
}

impl FileSpec {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            defines: Vec::new(),
            interfaces: Vec::new(),
            ops: Vec::new(),
            entry: None,
        }
    }

    pub fn construct_count(&self) -> usize {
        self.defines.len() + self.interfaces.len() + self.ops.len() + usize::from(self.entry.is_some())
    }

    pub fn is_empty(&self) -> bool {
        self.construct_count() == 0
    }
}

/// @ai:intent The validated result of one extraction run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpecModel {
    pub global: GlobalConstruct,
    pub files: Vec<FileSpec>,
    /// Interface label to where it was declared.
    pub interface_labels: BTreeMap<String, Location>,
    /// Labels of potential ordering points and their checks.
    pub op_labels: BTreeSet<String>,
    pub headers: BTreeSet<String>,
    pub forward_classes: BTreeSet<String>,
    pub diagnostics: Diagnostics,
}

impl SpecModel {
    pub fn interfaces(&self) -> impl Iterator<Item = &InterfaceConstruct> {
        self.files.iter().flat_map(|f| f.interfaces.iter())
    }
}

/// @ai:intent Run context shared by every per-file extraction of one run
#[derive(Debug, Default)]
pub struct SpecExtractor {
    global: Option<GlobalConstruct>,
    headers: BTreeSet<String>,
    forward_classes: BTreeSet<String>,
    files: Vec<FileSpec>,
    diagnostics: Diagnostics,
}

impl SpecExtractor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// @ai:intent Extract every file in order
    /// @ai:effects fs:read
    pub fn extract_files(&mut self, paths: &[PathBuf]) -> Result<()> {
        for path in paths {
            self.extract_file(path)?;
        }
        Ok(())
    }

    /// @ai:intent Extract the constructs of one file into the run
    /// @ai:effects fs:read
    pub fn extract_file(&mut self, path: &Path) -> Result<()> {
        let text = fs::read_to_string(path).map_err(|source| Error::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        self.extract_source(path, &text)
    }

    /// @ai:intent Scan source text in one pass and record its constructs
    /// @ai:pre path identifies the text in diagnostics
    /// @ai:effects log
    pub fn extract_source(&mut self, path: &Path, text: &str) -> Result<()> {
        let mut spec = FileSpec::new(path);
        let mut cursor = LineCursor::new(text);

        while let Some((line_no, line)) = cursor.next_line() {
            for rule in LINE_RULES {
                let Some(captures) = rule.pattern().captures(line) else {
                    continue;
                };
                let consumed = match rule {
                    LineRule::HeaderInclude => {
                        self.record_header(&captures);
                        true
                    }
                    LineRule::OneLineConstruct => {
                        self.one_line_construct(&mut spec, line_no, line, &captures)?
                    }
                    LineRule::BlockConstruct => {
                        let tag = captures.get(1).map_or("", |m| m.as_str());
                        self.block_construct(&mut spec, &mut cursor, line_no, line, tag)?;
                        true
                    }
                };
                if consumed {
                    break;
                }
            }
        }

        debug!(
            "{}: {} constructs",
            path.display(),
            spec.construct_count()
        );
        self.files.push(spec);
        Ok(())
    }

    /// The closing delimiter always matches the opening one.
    fn record_header(&mut self, captures: &Captures<'_>) {
        let name = captures.get(2).map_or("", |m| m.as_str());
        let header = match captures.get(1).map(|m| m.as_str()) {
            Some("<") => format!("<{}>", name),
            _ => format!("\"{}\"", name),
        };
        if !naming::is_pre_included_header(&header) {
            self.headers.insert(header);
        }
    }

    /// Returns false when the tag is not a one-line construct.
    fn one_line_construct(
        &mut self,
        spec: &mut FileSpec,
        line_no: usize,
        line: &str,
        captures: &Captures<'_>,
    ) -> Result<bool> {
        let tag = captures.get(1).map_or("", |m| m.as_str());
        let rest = &line[captures.get(0).map_or(line.len(), |m| m.end())..];

        if tag == naming::ENTRY {
            if let Some(previous) = &spec.entry {
                return Err(Error::annotation(
                    &spec.path,
                    line_no,
                    format!(
                        "Multiple @Entry annotations in the same file.\n\t Other @Entry at Line {}.",
                        previous.begin_line()
                    ),
                ));
            }
            debug!("@Entry at {}:{}", spec.path.display(), line_no);
            spec.entry = Some(EntryConstruct::new(&spec.path, line_no, line.trim()));
            return Ok(true);
        }

        let Some(kind) = OpKind::from_tag(tag) else {
            return Ok(false);
        };
        let op = OpConstruct::parse(&spec.path, line_no, kind, rest, line.trim())?;
        debug!("@{} at {}:{}", op.tag(), spec.path.display(), line_no);
        spec.ops.push(op);
        Ok(true)
    }

    fn block_construct(
        &mut self,
        spec: &mut FileSpec,
        cursor: &mut LineCursor<'_>,
        begin_line: usize,
        first_line: &str,
        tag: &str,
    ) -> Result<()> {
        let path = spec.path.clone();
        let mut block = vec![first_line.to_string()];
        let mut end_line = begin_line;
        let mut last = first_line;
        while !BLOCK_END.is_match(last) {
            let (line_no, line) = cursor.next_line().ok_or_else(|| {
                Error::annotation(
                    &path,
                    begin_line,
                    format!("The @{} annotation block is never closed with \"*/\".", tag),
                )
            })?;
            block.push(line.to_string());
            end_line = line_no;
            last = line;
        }
        debug!("@{} block at {}:{}-{}", tag, path.display(), begin_line, end_line);

        match tag {
            naming::DECLARE_STATE => {
                let global =
                    GlobalConstruct::build(&path, begin_line, &block, &mut self.diagnostics)?;
                self.record_global(global)
            }
            naming::DEFINE => {
                let define = DefineConstruct::build(
                    &path,
                    begin_line,
                    end_line,
                    &block,
                    &mut self.diagnostics,
                )?;
                spec.defines.push(define);
                Ok(())
            }
            _ => {
                let annotation = InterfaceAnnotation::build(
                    &path,
                    begin_line,
                    end_line,
                    &block,
                    &mut self.diagnostics,
                )?;
                let interface = self.finish_interface(spec, cursor, annotation)?;
                spec.interfaces.push(interface);
                Ok(())
            }
        }
    }

    fn record_global(&mut self, global: GlobalConstruct) -> Result<()> {
        if let Some(existing) = &self.global {
            return Err(Error::annotation(
                &global.location.file,
                global.location.line,
                format!(
                    "Multiple definition of global state.\n\t Another definition is in File \"{}\" (Line {}).",
                    existing.location.file_name(),
                    existing.location.line
                ),
            ));
        }
        self.global = Some(global);
        Ok(())
    }

    /// Reads the declaration after an interface annotation, then its body.
    fn finish_interface(
        &mut self,
        spec: &mut FileSpec,
        cursor: &mut LineCursor<'_>,
        annotation: InterfaceAnnotation,
    ) -> Result<InterfaceConstruct> {
        let path = spec.path.clone();
        let (decl_line, decl_text) = cursor.next_line().ok_or_else(|| {
            Error::annotation(
                &path,
                annotation.end_line,
                "Missing the function declaration after the interface annotation.",
            )
        })?;
        let header = parse_function_header(decl_text)
            .map_err(|e| Error::annotation(&path, decl_line, e.to_string()))?;
        self.forward_classes.extend(header.user_defined_types());

        let mut braces = BraceCounter::default();
        let mut body_end = decl_line;
        let mut closed = braces.feed(decl_text);
        while !closed {
            let (line_no, line) = cursor.next_line().ok_or_else(|| {
                Error::annotation(
                    &path,
                    decl_line,
                    format!("Unmatched braces in the body of {}.", header.name),
                )
            })?;
            if let Some(captures) = ONE_LINE_CONSTRUCT.captures(line) {
                self.one_line_construct(spec, line_no, line, &captures)?;
            }
            body_end = line_no;
            closed = braces.feed(line);
        }

        let interface = annotation.finalize(header, body_end);
        debug!(
            "@Interface {} at {}:{} (body ends at line {})",
            interface.label,
            path.display(),
            interface.begin_line(),
            body_end
        );
        Ok(interface)
    }

    /// @ai:intent Run-wide validation; consumes the run context
    /// @ai:post exactly one global state; interface labels are unique
    pub fn check_semantics(self) -> Result<SpecModel> {
        let global = self.global.ok_or(Error::MissingGlobalState)?;

        let mut interface_labels: BTreeMap<String, Location> = BTreeMap::new();
        let mut op_labels = BTreeSet::new();
        for file in &self.files {
            for interface in &file.interfaces {
                match interface_labels.entry(interface.label.clone()) {
                    MapEntry::Occupied(other) => {
                        return Err(Error::annotation(
                            &interface.location.file,
                            interface.location.line,
                            format!(
                                "Multiple interfaces labelled \"{}\".\n\t Another definition is in File \"{}\" (Line {}).",
                                interface.label,
                                other.get().file_name(),
                                other.get().line
                            ),
                        ));
                    }
                    MapEntry::Vacant(slot) => {
                        slot.insert(interface.location.clone());
                    }
                }
            }
            op_labels.extend(
                file.ops
                    .iter()
                    .filter(|op| op.kind.requires_label())
                    .filter_map(|op| op.label.clone()),
            );
        }

        Ok(SpecModel {
            global,
            files: self.files,
            interface_labels,
            op_labels,
            headers: self.headers,
            forward_classes: self.forward_classes,
            diagnostics: self.diagnostics,
        })
    }
}

/// @ai:intent Extract and validate a list of files as one run
/// @ai:effects fs:read, log
pub fn extract_paths(paths: &[PathBuf]) -> Result<SpecModel> {
    let mut extractor = SpecExtractor::new();
    extractor.extract_files(paths)?;
    extractor.check_semantics()
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE_SOURCE: &str = "#include \"queue.h\"
#include <threads.h>
/** @DeclareState: IntList *q;
    @Commutativity: enq <-> enq (true) */

/** @Interface: enq
    @Transition: STATE(q)->push_back(val); */
void enqueue(queue_t *queue, int val) {
    int x = 1;
    /** @OPDefine: true */
    store(x);
}
/** @Entry */
";

    fn extract(sources: &[(&str, &str)]) -> Result<SpecModel> {
        let mut extractor = SpecExtractor::new();
        for (name, text) in sources {
            extractor.extract_source(Path::new(name), text)?;
        }
        extractor.check_semantics()
    }

    #[test]
    fn test_extract_every_construct() {
        let model = extract(&[("queue.c", QUEUE_SOURCE)]).unwrap();
        let file = &model.files[0];

        assert_eq!(model.global.location.line, 3);
        assert_eq!(model.global.commutativity_rules.len(), 1);

        let iface = &file.interfaces[0];
        assert_eq!(iface.label, "enq");
        assert_eq!(iface.location.line, 6);
        assert_eq!(iface.end_line, 7);
        assert_eq!(iface.declaration_line(), 8);
        assert_eq!(iface.body_end_line, 12);

        assert_eq!(file.ops.len(), 1);
        assert_eq!(file.ops[0].location.line, 10);
        assert_eq!(file.ops[0].kind, OpKind::Define);
        assert_eq!(file.entry.as_ref().map(|e| e.location.line), Some(13));

        assert!(model.headers.contains("\"queue.h\""));
        assert!(!model.headers.contains("<threads.h>"));
        assert!(model.forward_classes.contains("queue_t"));
        assert_eq!(model.interface_labels["enq"].line, 6);
    }

    fn body_end(source: &str) -> Result<usize> {
        let text = format!("/** @DeclareState: int x; */\n{}", source);
        let model = extract(&[("b.c", text.as_str())])?;
        Ok(model.files[0].interfaces[0].body_end_line)
    }

    #[test]
    fn test_brace_matching() {
        let nested = "/** @Interface: foo */\nvoid foo() {\n  if (x) { y(); }\n}\n";
        assert_eq!(body_end(nested).unwrap(), 5);

        let one_line = "/** @Interface: f */\nvoid f() { }\nint after;\n";
        assert_eq!(body_end(one_line).unwrap(), 3);

        let open = "/** @Interface: foo */\nvoid foo() {\n  if (x) { y(); }\n";
        assert!(body_end(open).unwrap_err().to_string().contains("Unmatched braces"));
    }

    #[test]
    fn test_body_ends_where_braces_first_balance() {
        let source = "/** @Interface: get */
int get() { return x; } static int helper() {
    return 1;
}
";
        assert_eq!(body_end(source).unwrap(), 3);
    }

    #[test]
    fn test_missing_declaration_after_interface_is_fatal() {
        let text = "/** @DeclareState: int x; */
/** @Interface: get
    @Transition: x++; */";
        let err = extract(&[("g.h", text)]).unwrap_err();
        assert!(err.is_annotation_error());
        assert!(err.to_string().contains("line 3"), "{}", err);
        assert!(err.to_string().contains("Missing the function declaration"), "{}", err);
    }

    #[test]
    fn test_unattached_ordering_points() {
        let text = "/** @DeclareState: int x; */
/** @Interface: put */
void put(int v) {
    /** @OPDefineUnattached: v > 0 */
    /** @OPClearDefineUnattached: true */
    x = v;
}
";
        let model = extract(&[("p.c", text)]).unwrap();
        let kinds: Vec<OpKind> = model.files[0].ops.iter().map(|op| op.kind).collect();
        assert_eq!(kinds, vec![OpKind::DefineUnattached, OpKind::ClearDefineUnattached]);
        assert_eq!(model.files[0].ops[0].condition, "v > 0");
        assert!(model.op_labels.is_empty());
    }

    #[test]
    fn test_include_delimiters_are_normalized() {
        let text = "#include \"foo.h>\n#include <bar.h\"\n/** @DeclareState: int x; */\n";
        let model = extract(&[("i.h", text)]).unwrap();
        assert_eq!(
            model.headers.iter().cloned().collect::<Vec<_>>(),
            vec!["\"foo.h\"", "<bar.h>"]
        );
    }

    #[test]
    fn test_second_global_state_is_fatal() {
        let other = "/** @DeclareState: int x; */\n";
        let err = extract(&[("queue.c", QUEUE_SOURCE), ("other.h", other)]).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("Multiple definition of global state"), "{}", msg);
        assert!(msg.contains("other.h"), "{}", msg);
        assert!(msg.contains("\"queue.c\" (Line 3)"), "{}", msg);
    }

    #[test]
    fn test_missing_global_state_is_fatal() {
        let err = extract(&[("a.c", "int main() { return 0; }\n")]).unwrap_err();
        assert!(matches!(err, Error::MissingGlobalState));
    }

    #[test]
    fn test_duplicate_interface_label_across_files() {
        let other = "/** @Transition: q->clear(); */
void enq(int v) {
}
";
        let err = extract(&[("queue.c", QUEUE_SOURCE), ("more.c", other)]).unwrap_err();
        assert!(err.to_string().contains("Multiple interfaces labelled \"enq\""));
    }

    #[test]
    fn test_duplicate_entry_in_one_file() {
        let text = format!("{}/** @Entry */\n", QUEUE_SOURCE);
        let err = extract(&[("queue.c", text.as_str())]).unwrap_err();
        assert!(err.to_string().contains("Other @Entry at Line 13"));
    }

    #[test]
    fn test_unmatched_braces_are_fatal() {
        let text = "/** @DeclareState: int x; */
/** @Interface: get */
int get() {
    return x;
";
        let err = extract(&[("g.c", text)]).unwrap_err();
        assert!(err.to_string().contains("Unmatched braces"));
    }

    #[test]
    fn test_unclosed_block_is_fatal() {
        let text = "/** @DeclareState: int x;\n   int y;\n";
        let err = extract(&[("g.h", text)]).unwrap_err();
        assert!(err.to_string().contains("never closed"));
    }

    #[test]
    fn test_op_labels_are_collected() {
        let text = "/** @DeclareState: int x; */
/** @Interface: deq */
int deq() {
    /** @PotentialOP(Read): x > 0 */
    /** @OPCheck(Read): true */
    /** @OPClear: true */
    return x;
}
";
        let model = extract(&[("d.c", text)]).unwrap();
        assert_eq!(model.files[0].ops.len(), 3);
        assert_eq!(model.op_labels.iter().collect::<Vec<_>>(), vec!["Read"]);
    }
}
