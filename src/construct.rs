//! @ai:module:intent Typed specification constructs built from annotation blocks
//! @ai:module:layer domain
//! @ai:module:public_api Construct, GlobalConstruct, InterfaceAnnotation, InterfaceConstruct, DefineConstruct, OpConstruct, OpKind, EntryConstruct, CommutativityRule
//! @ai:module:depends_on primitive, declaration, decl_parser, field_kind, code, naming, diagnostics

use crate::code::Code;
use crate::decl_parser::parse_declaration;
use crate::declaration::{FunctionHeader, VariableDeclaration};
use crate::diagnostics::{Diagnostics, Location};
use crate::error::{Error, Result};
use crate::field_kind::{AutoGen, FieldKind};
use crate::naming;
use crate::primitive::{Primitive, PrimitiveSplitter};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

static COMMUTATIVITY_RULE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*(\w+)\s*<->\s*(\w+)\s*\((.*)\)\s*$").expect("Invalid regex")
});
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\w+$").expect("Invalid regex"));
static OP_BODY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:\s*\(\s*(\w+)\s*\))?\s*:\s*(.+?)\s*\*/\s*$").expect("Invalid regex")
});

/// @ai:intent Common view of every construct: where it was written
pub trait Construct {
    fn location(&self) -> &Location;

    /// The annotation tag that introduced the construct.
    fn tag(&self) -> &'static str;

    fn begin_line(&self) -> usize {
        self.location().line
    }
}

/// @ai:intent A `Method1 <-> Method2 (condition)` rule of the global state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommutativityRule {
    pub method1: String,
    pub method2: String,
    pub condition: String,
}

impl fmt::Display for CommutativityRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <-> {} ({})", self.method1, self.method2, self.condition)
    }
}

/// Which global state code blocks were generated instead of written by the user.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoGenFlags {
    pub initial: bool,
    pub copy: bool,
    pub clear: bool,
    pub print: bool,
}

/// @ai:intent The single `@DeclareState` block describing the abstract state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConstruct {
    pub location: Location,
    pub declared_state: Vec<VariableDeclaration>,
    pub init_state: Code,
    pub copy_state: Code,
    pub clear_state: Code,
    pub final_state: Code,
    pub print_state: Code,
    pub commutativity_rules: Vec<CommutativityRule>,
    /// The user declared no state; `declared_state` holds a placeholder field.
    pub empty_state: bool,
    pub auto_gen: AutoGenFlags,
}

impl GlobalConstruct {
    /// @ai:intent Build the global construct from a raw `@DeclareState` block
    /// @ai:pre annotations[0] is the line at begin_line
    /// @ai:post declared_state is never empty
    /// @ai:effects log
    pub fn build(
        file: &Path,
        begin_line: usize,
        annotations: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut global = Self {
            location: Location::new(file, begin_line),
            declared_state: Vec::new(),
            init_state: Code::new(),
            copy_state: Code::new(),
            clear_state: Code::new(),
            final_state: Code::new(),
            print_state: Code::new(),
            commutativity_rules: Vec::new(),
            empty_state: false,
            auto_gen: AutoGenFlags::default(),
        };

        let mut splitter = PrimitiveSplitter::new(file, begin_line, annotations);
        while let Some(primitive) = splitter.next_primitive(diagnostics)? {
            global.apply_primitive(file, primitive)?;
        }

        global.empty_state = global.declared_state.is_empty();
        if global.empty_state {
            diagnostics.warn(
                file,
                begin_line,
                "The state is empty. Make sure that's what you want!",
            );
            global
                .declared_state
                .push(VariableDeclaration::new("int", "FakeState"));
        }
        global.auto_generate(file)?;
        Ok(global)
    }

    fn apply_primitive(&mut self, file: &Path, primitive: Primitive) -> Result<()> {
        let target = match primitive.name.as_str() {
            naming::DECLARE_STATE
            | naming::INITIAL_STATE
            | naming::COPY_STATE
            | naming::CLEAR_STATE
            | naming::FINAL_STATE
            | naming::PRINT_STATE
            | naming::COMMUTATIVITY => primitive.name.as_str(),
            other => {
                return Err(Error::annotation(
                    file,
                    primitive.begin_line,
                    format!("{} is NOT a valid CDSSpec global state primitive.", other),
                ))
            }
        };
        if primitive.is_empty() {
            return Ok(());
        }

        match target {
            naming::DECLARE_STATE => {
                for (offset, line) in primitive.contents.iter().enumerate() {
                    let decl = parse_declaration(line).map_err(|e| {
                        Error::annotation(file, primitive.begin_line + offset, e.to_string())
                    })?;
                    self.declared_state.push(decl);
                }
            }
            naming::INITIAL_STATE => self.init_state.add_lines(primitive.contents),
            naming::COPY_STATE => self.copy_state.add_lines(primitive.contents),
            naming::CLEAR_STATE => self.clear_state.add_lines(primitive.contents),
            naming::FINAL_STATE => self.final_state.add_lines(primitive.contents),
            naming::PRINT_STATE => self.print_state.add_lines(primitive.contents),
            _ => {
                for (offset, line) in primitive.contents.iter().enumerate() {
                    let rule = parse_commutativity_rule(line).ok_or_else(|| {
                        Error::annotation(
                            file,
                            primitive.begin_line + offset,
                            format!(
                                "The @Commutativity annotation should be: @Commutativity: Method1 <-> Method2 (condition)\n\tProblematic line: \"{}\"",
                                line
                            ),
                        )
                    })?;
                    self.commutativity_rules.push(rule);
                }
            }
        }
        Ok(())
    }

    fn auto_generate(&mut self, file: &Path) -> Result<()> {
        let line = self.location.line;
        let fields: Vec<(FieldKind, String)> = if self.empty_state {
            Vec::new()
        } else {
            self.declared_state
                .iter()
                .map(|d| (FieldKind::classify(&d.ty), d.name.clone()))
                .collect()
        };
        let unsupported = |op: AutoGen, kind: &FieldKind, name: &str| {
            let ty = match kind {
                FieldKind::Unsupported(ty) => ty.clone(),
                other => format!("{:?}", other),
            };
            Error::annotation(
                file,
                line,
                format!(
                    "Cannot auto-generate {} for state field \"{}\" of unsupported type \"{}\"; write the primitive explicitly.",
                    op.primitive_name(),
                    name,
                    ty
                ),
            )
        };

        self.auto_gen.initial = self.init_state.is_empty();
        if self.auto_gen.initial {
            for (kind, name) in &fields {
                let stmt = kind
                    .initial_statement(name)
                    .ok_or_else(|| unsupported(AutoGen::Initial, kind, name))?;
                self.init_state.add_line(stmt);
            }
        }

        self.auto_gen.copy = self.copy_state.is_empty();
        if self.auto_gen.copy {
            for (kind, name) in &fields {
                let stmt = kind
                    .copy_statement(name)
                    .ok_or_else(|| unsupported(AutoGen::Copy, kind, name))?;
                self.copy_state.add_line(stmt);
            }
        }

        self.auto_gen.clear = self.clear_state.is_empty();
        if self.auto_gen.clear {
            for (kind, name) in &fields {
                if let Some(stmt) = kind.clear_statement(name) {
                    self.clear_state.add_line(stmt);
                }
            }
        }

        self.auto_gen.print = self.print_state.is_empty();
        if self.auto_gen.print {
            for (kind, name) in &fields {
                let code = kind
                    .print_statements(name)
                    .ok_or_else(|| unsupported(AutoGen::Print, kind, name))?;
                self.print_state.append(&code);
            }
        }
        Ok(())
    }
}

impl Construct for GlobalConstruct {
    fn location(&self) -> &Location {
        &self.location
    }

    fn tag(&self) -> &'static str {
        naming::DECLARE_STATE
    }
}

/// @ai:intent Parse one commutativity line, None if it is malformed
/// @ai:example ("Push <-> Pop (M1->RET != M2->RET)") -> Push, Pop, "M1->RET != M2->RET"
pub fn parse_commutativity_rule(line: &str) -> Option<CommutativityRule> {
    let captures = COMMUTATIVITY_RULE.captures(line)?;
    Some(CommutativityRule {
        method1: captures.get(1)?.as_str().to_string(),
        method2: captures.get(2)?.as_str().to_string(),
        condition: captures.get(3)?.as_str().trim().to_string(),
    })
}

/// @ai:intent An interface annotation whose function declaration is not yet known
#[derive(Debug, Clone)]
pub struct InterfaceAnnotation {
    pub location: Location,
    pub end_line: usize,
    pub label: Option<String>,
    pub pre_condition: Code,
    pub justifying_precondition: Code,
    pub transition: Code,
    pub justifying_postcondition: Code,
    pub post_condition: Code,
    pub print: Code,
}

impl InterfaceAnnotation {
    /// @ai:intent Build the annotation half of an interface construct
    /// @ai:effects log
    pub fn build(
        file: &Path,
        begin_line: usize,
        end_line: usize,
        annotations: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut annotation = Self {
            location: Location::new(file, begin_line),
            end_line,
            label: None,
            pre_condition: Code::new(),
            justifying_precondition: Code::new(),
            transition: Code::new(),
            justifying_postcondition: Code::new(),
            post_condition: Code::new(),
            print: Code::new(),
        };

        let mut splitter = PrimitiveSplitter::new(file, begin_line, annotations);
        while let Some(primitive) = splitter.next_primitive(diagnostics)? {
            annotation.apply_primitive(file, primitive)?;
        }
        Ok(annotation)
    }

    fn apply_primitive(&mut self, file: &Path, primitive: Primitive) -> Result<()> {
        let block = match primitive.name.as_str() {
            naming::INTERFACE => None,
            naming::TRANSITION | naming::SIDE_EFFECT => Some(&mut self.transition),
            naming::PRE_CONDITION => Some(&mut self.pre_condition),
            naming::JUSTIFYING_PRECONDITION => Some(&mut self.justifying_precondition),
            naming::JUSTIFYING_POSTCONDITION => Some(&mut self.justifying_postcondition),
            naming::POST_CONDITION => Some(&mut self.post_condition),
            naming::PRINT_VALUE => Some(&mut self.print),
            other => {
                return Err(Error::annotation(
                    file,
                    primitive.begin_line,
                    format!("{} is NOT a valid CDSSpec interface primitive.", other),
                ))
            }
        };
        if primitive.is_empty() {
            return Ok(());
        }

        match block {
            Some(code) => code.add_lines(primitive.contents),
            None => {
                let label = interface_label(file, &primitive)?;
                if let Some(previous) = &self.label {
                    return Err(Error::annotation(
                        file,
                        primitive.begin_line,
                        format!(
                            "The interface is already labelled \"{}\"; only one @Interface primitive is allowed.",
                            previous
                        ),
                    ));
                }
                self.label = Some(label);
            }
        }
        Ok(())
    }

    /// @ai:intent Complete the construct once the declaration and body end are known
    /// @ai:post label defaults to the function's bare name; print is never empty for non-void signatures
    pub fn finalize(self, header: FunctionHeader, body_end_line: usize) -> InterfaceConstruct {
        let label = self
            .label
            .unwrap_or_else(|| header.name.bare_name.clone());
        let auto_gen_print = self.print.is_empty();
        let mut print = self.print;
        if auto_gen_print {
            print.append(
                &FieldKind::classify(&header.return_type)
                    .print_statements_or_placeholder(naming::C_RET),
            );
            for arg in &header.args {
                print.append(&FieldKind::classify(&arg.ty).print_statements_or_placeholder(&arg.name));
            }
        }

        InterfaceConstruct {
            struct_name: naming::struct_name(&label),
            label,
            location: self.location,
            end_line: self.end_line,
            body_end_line,
            header,
            pre_condition: self.pre_condition,
            justifying_precondition: self.justifying_precondition,
            transition: self.transition,
            justifying_postcondition: self.justifying_postcondition,
            post_condition: self.post_condition,
            print,
            auto_gen_print,
        }
    }
}

fn interface_label(file: &Path, primitive: &Primitive) -> Result<String> {
    match primitive.contents.as_slice() {
        [label] if WORD.is_match(label) => Ok(label.clone()),
        [label] => Err(Error::annotation(
            file,
            primitive.begin_line,
            format!("\"{}\" is NOT a valid CDSSpec @Interface label.", label),
        )),
        _ => Err(Error::annotation(
            file,
            primitive.begin_line,
            "The @Interface primitive has wrong syntax: it takes exactly one label.",
        )),
    }
}

/// @ai:intent A fully built interface: annotation plus its function declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InterfaceConstruct {
    pub location: Location,
    pub label: String,
    pub struct_name: String,
    /// Last line of the annotation comment.
    pub end_line: usize,
    /// Line holding the closing brace of the function body.
    pub body_end_line: usize,
    pub header: FunctionHeader,
    pub pre_condition: Code,
    pub justifying_precondition: Code,
    pub transition: Code,
    pub justifying_postcondition: Code,
    pub post_condition: Code,
    pub print: Code,
    pub auto_gen_print: bool,
}

impl InterfaceConstruct {
    /// @ai:intent Line of the function declaration that follows the annotation
    pub fn declaration_line(&self) -> usize {
        self.end_line + 1
    }
}

impl Construct for InterfaceConstruct {
    fn location(&self) -> &Location {
        &self.location
    }

    fn tag(&self) -> &'static str {
        naming::INTERFACE
    }
}

/// @ai:intent User code from a `@Define` block, inserted after the comment
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DefineConstruct {
    pub location: Location,
    pub end_line: usize,
    pub code: Code,
}

impl DefineConstruct {
    pub fn build(
        file: &Path,
        begin_line: usize,
        end_line: usize,
        annotations: &[String],
        diagnostics: &mut Diagnostics,
    ) -> Result<Self> {
        let mut code = Code::new();
        let mut splitter = PrimitiveSplitter::new(file, begin_line, annotations);
        while let Some(primitive) = splitter.next_primitive(diagnostics)? {
            if primitive.name != naming::DEFINE {
                return Err(Error::annotation(
                    file,
                    primitive.begin_line,
                    format!("{} is NOT a valid CDSSpec @Define primitive.", primitive.name),
                ));
            }
            code.add_lines(primitive.contents);
        }
        Ok(Self {
            location: Location::new(file, begin_line),
            end_line,
            code,
        })
    }
}

impl Construct for DefineConstruct {
    fn location(&self) -> &Location {
        &self.location
    }

    fn tag(&self) -> &'static str {
        naming::DEFINE
    }
}

/// @ai:intent The kinds of ordering point annotations
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpKind {
    Define,
    PotentialDefine,
    Check,
    Clear,
    ClearDefine,
    DefineUnattached,
    ClearDefineUnattached,
}

impl OpKind {
    /// @ai:intent Map an annotation tag to its ordering point kind
    /// @ai:example ("PotentialOP") -> Some(PotentialDefine)
    pub fn from_tag(tag: &str) -> Option<Self> {
        match tag {
            naming::OP_DEFINE => Some(OpKind::Define),
            naming::POTENTIAL_OP => Some(OpKind::PotentialDefine),
            naming::OP_CHECK => Some(OpKind::Check),
            naming::OP_CLEAR => Some(OpKind::Clear),
            naming::OP_CLEAR_DEFINE => Some(OpKind::ClearDefine),
            naming::OP_DEFINE_UNATTACHED => Some(OpKind::DefineUnattached),
            naming::OP_CLEAR_DEFINE_UNATTACHED => Some(OpKind::ClearDefineUnattached),
            _ => None,
        }
    }

    pub fn tag(self) -> &'static str {
        match self {
            OpKind::Define => naming::OP_DEFINE,
            OpKind::PotentialDefine => naming::POTENTIAL_OP,
            OpKind::Check => naming::OP_CHECK,
            OpKind::Clear => naming::OP_CLEAR,
            OpKind::ClearDefine => naming::OP_CLEAR_DEFINE,
            OpKind::DefineUnattached => naming::OP_DEFINE_UNATTACHED,
            OpKind::ClearDefineUnattached => naming::OP_CLEAR_DEFINE_UNATTACHED,
        }
    }

    /// Potential ordering points and their checks are paired by label.
    pub fn requires_label(self) -> bool {
        matches!(self, OpKind::PotentialDefine | OpKind::Check)
    }
}

/// @ai:intent A one-line ordering point annotation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpConstruct {
    pub location: Location,
    pub kind: OpKind,
    pub label: Option<String>,
    pub condition: String,
    /// The annotation line as written.
    pub annotation: String,
}

impl OpConstruct {
    /// @ai:intent Parse the `(label)? : condition */` part that follows the tag
    /// @ai:pre body is the text after `@Tag` on the annotation line
    pub fn parse(file: &Path, line: usize, kind: OpKind, body: &str, annotation: &str) -> Result<Self> {
        let captures = OP_BODY.captures(body).ok_or_else(|| {
            Error::annotation(
                file,
                line,
                "Wrong syntax for the ordering point construct. You might need a colon before the condition.",
            )
        })?;
        let label = captures.get(1).map(|m| m.as_str().to_string());
        let condition = captures.get(2).map_or("", |m| m.as_str()).trim().to_string();

        if kind.requires_label() && label.is_none() {
            return Err(Error::annotation(
                file,
                line,
                format!("@{} requires a label: @{}(Label): condition", kind.tag(), kind.tag()),
            ));
        }

        Ok(Self {
            location: Location::new(file, line),
            kind,
            label,
            condition,
            annotation: annotation.to_string(),
        })
    }
}

impl Construct for OpConstruct {
    fn location(&self) -> &Location {
        &self.location
    }

    fn tag(&self) -> &'static str {
        self.kind.tag()
    }
}

/// @ai:intent The `@Entry` marker where the specification is initialized
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryConstruct {
    pub location: Location,
    pub annotation: String,
}

impl EntryConstruct {
    pub fn new(file: &Path, line: usize, annotation: &str) -> Self {
        Self {
            location: Location::new(file, line),
            annotation: annotation.to_string(),
        }
    }
}

impl Construct for EntryConstruct {
    fn location(&self) -> &Location {
        &self.location
    }

    fn tag(&self) -> &'static str {
        naming::ENTRY
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decl_parser::parse_function_header;

    fn block(lines: &[&str]) -> Vec<String> {
        lines.iter().map(|l| l.to_string()).collect()
    }

    #[test]
    fn test_global_autogen_for_supported_types() {
        let raw = block(&[
            "/** @DeclareState: IntList *stack;",
            "\tint size;",
            "\t@Commutativity: Push <-> Pop (true)",
            "*/",
        ]);
        let mut diags = Diagnostics::default();
        let global = GlobalConstruct::build(Path::new("stack.h"), 5, &raw, &mut diags).unwrap();

        assert_eq!(global.declared_state.len(), 2);
        assert_eq!(
            global.init_state.lines,
            vec!["stack = new IntList();", "size = 0;"]
        );
        assert_eq!(
            global.copy_state.lines,
            vec!["NEW->stack = new IntList(*OLD->stack);", "NEW->size = OLD->size;"]
        );
        assert_eq!(global.clear_state.lines, vec!["if (stack) delete stack;"]);
        assert_eq!(global.print_state.len(), 4);
        assert!(global.auto_gen.initial && global.auto_gen.copy && global.auto_gen.print);
        assert_eq!(
            global.commutativity_rules,
            vec![CommutativityRule {
                method1: "Push".to_string(),
                method2: "Pop".to_string(),
                condition: "true".to_string(),
            }]
        );
    }

    #[test]
    fn test_global_user_code_disables_autogen() {
        let raw = block(&[
            "/** @DeclareState: Foo f;",
            "@Initial: f.reset();",
            "@Copy: NEW->f = OLD->f;",
            "@Print: f.dump(); */",
        ]);
        let mut diags = Diagnostics::default();
        let global = GlobalConstruct::build(Path::new("a.h"), 1, &raw, &mut diags).unwrap();

        assert!(!global.auto_gen.initial);
        assert!(!global.auto_gen.copy);
        assert!(global.auto_gen.clear);
        assert!(global.clear_state.is_empty());
        assert_eq!(global.init_state.lines, vec!["f.reset();"]);
    }

    #[test]
    fn test_global_unsupported_type_without_copy_is_fatal() {
        let raw = block(&["/** @DeclareState: Foo f;", "@Initial: f.reset(); */"]);
        let mut diags = Diagnostics::default();
        let err = GlobalConstruct::build(Path::new("a.h"), 1, &raw, &mut diags).unwrap_err();
        let msg = err.to_string();
        assert!(msg.contains("@Copy"), "{}", msg);
        assert!(msg.contains("Foo"), "{}", msg);
    }

    #[test]
    fn test_global_empty_state_gets_placeholder() {
        let raw = block(&["/** @DeclareState:", "@Commutativity: A <-> B (true) */"]);
        let mut diags = Diagnostics::default();
        let global = GlobalConstruct::build(Path::new("a.h"), 1, &raw, &mut diags).unwrap();

        assert!(global.empty_state);
        assert_eq!(global.declared_state, vec![VariableDeclaration::new("int", "FakeState")]);
        assert!(global.init_state.is_empty());
        assert_eq!(diags.warnings().len(), 2);
    }

    #[test]
    fn test_global_rejects_unknown_primitive() {
        let raw = block(&["/** @DeclareState: int x;", "@Bogus: y */"]);
        let mut diags = Diagnostics::default();
        let err = GlobalConstruct::build(Path::new("a.h"), 1, &raw, &mut diags).unwrap_err();
        assert!(err.to_string().contains("Bogus"));
    }

    #[test]
    fn test_global_rejects_malformed_commutativity() {
        let raw = block(&["/** @DeclareState: int x;", "@Commutativity: Push Pop true */"]);
        let mut diags = Diagnostics::default();
        let err = GlobalConstruct::build(Path::new("a.h"), 1, &raw, &mut diags).unwrap_err();
        assert!(err.to_string().contains("Problematic line: \"Push Pop true\""));
    }

    #[test]
    fn test_interface_two_phase_build() {
        let raw = block(&[
            "/** @PreCondition: return size > 0;",
            "    @Transition: size--; */",
        ]);
        let mut diags = Diagnostics::default();
        let annotation =
            InterfaceAnnotation::build(Path::new("s.h"), 10, 11, &raw, &mut diags).unwrap();
        assert!(annotation.label.is_none());

        let header = parse_function_header("int pop(IntList *from) {").unwrap();
        let iface = annotation.finalize(header, 20);
        assert_eq!(iface.label, "pop");
        assert_eq!(iface.struct_name, "__struct_pop__");
        assert_eq!(iface.declaration_line(), 12);
        assert_eq!(iface.body_end_line, 20);
        assert!(iface.auto_gen_print);
        assert_eq!(
            iface.print.lines,
            vec![
                "model_print(\"\\tRET=%d\\n\", RET);",
                "model_print(\"\\tfrom: \");",
                "printContainer(from);",
                "model_print(\"\\n\");",
            ]
        );
    }

    #[test]
    fn test_interface_label_must_be_a_word() {
        let raw = block(&["/** @Interface: Push Back */"]);
        let mut diags = Diagnostics::default();
        let err = InterfaceAnnotation::build(Path::new("s.h"), 1, 1, &raw, &mut diags).unwrap_err();
        assert!(err.to_string().contains("label"));
    }

    #[test]
    fn test_side_effect_is_a_transition() {
        let raw = block(&[
            "/** @Interface: Inc",
            "    @SideEffect: count++;",
            "    @Transition: total++; */",
        ]);
        let mut diags = Diagnostics::default();
        let annotation =
            InterfaceAnnotation::build(Path::new("c.h"), 1, 3, &raw, &mut diags).unwrap();
        assert_eq!(annotation.transition.lines, vec!["count++;", "total++;"]);
        assert!(diags.is_empty());
    }

    #[test]
    fn test_interface_label_given_twice_is_fatal() {
        let raw = block(&["/** @Interface: Push", "    @Interface: PushAgain */"]);
        let mut diags = Diagnostics::default();
        let err = InterfaceAnnotation::build(Path::new("s.h"), 4, 5, &raw, &mut diags).unwrap_err();
        assert!(err.is_annotation_error());
        assert!(err.to_string().contains("line 5"), "{}", err);
        assert!(err.to_string().contains("already labelled \"Push\""), "{}", err);
    }

    #[test]
    fn test_define_keeps_code_verbatim() {
        let raw = block(&["/** @Define:", "    #define MAX 4", "    int helper() { return MAX; }", "*/"]);
        let mut diags = Diagnostics::default();
        let define = DefineConstruct::build(Path::new("d.h"), 3, 6, &raw, &mut diags).unwrap();
        assert_eq!(define.code.lines, vec!["#define MAX 4", "int helper() { return MAX; }"]);
        assert_eq!(define.end_line, 6);
    }

    #[test]
    fn test_op_parse() {
        let op = OpConstruct::parse(
            Path::new("q.c"),
            40,
            OpKind::PotentialDefine,
            "(DeqRead): succ == true */",
            "\t/** @PotentialOP(DeqRead): succ == true */",
        )
        .unwrap();
        assert_eq!(op.label.as_deref(), Some("DeqRead"));
        assert_eq!(op.condition, "succ == true");

        let op = OpConstruct::parse(Path::new("q.c"), 41, OpKind::Define, ": true */", "").unwrap();
        assert_eq!(op.label, None);
        assert_eq!(op.condition, "true");
    }

    #[test]
    fn test_op_check_requires_label() {
        let err = OpConstruct::parse(Path::new("q.c"), 3, OpKind::Check, ": x */", "").unwrap_err();
        assert!(err.to_string().contains("requires a label"));
        let err = OpConstruct::parse(Path::new("q.c"), 3, OpKind::Define, " true */", "").unwrap_err();
        assert!(err.to_string().contains("colon"));
    }
}
