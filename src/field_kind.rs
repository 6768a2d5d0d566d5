//! @ai:module:intent Classify declared types and auto-generate state and print code for them
//! @ai:module:layer domain
//! @ai:module:public_api FieldKind, ContainerKind, ScalarKind, AutoGen
//! @ai:module:depends_on code, naming
//! @ai:module:stateless true

use crate::code::Code;
use crate::naming::{NEW_STATE_INST, OLD_STATE_INST, PRINT, PRINT_CONTAINER, PRINT_MAP};
use serde::{Deserialize, Serialize};

/// @ai:intent The container types the specification runtime knows how to handle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerKind {
    IntList,
    IntSet,
    IntMap,
}

impl ContainerKind {
    pub fn type_name(self) -> &'static str {
        match self {
            ContainerKind::IntList => "IntList",
            ContainerKind::IntSet => "IntSet",
            ContainerKind::IntMap => "IntMap",
        }
    }

    fn from_type_name(name: &str) -> Option<Self> {
        match name {
            "IntList" => Some(ContainerKind::IntList),
            "IntSet" => Some(ContainerKind::IntSet),
            "IntMap" => Some(ContainerKind::IntMap),
            _ => None,
        }
    }

    fn print_function(self) -> &'static str {
        match self {
            ContainerKind::IntMap => PRINT_MAP,
            ContainerKind::IntList | ContainerKind::IntSet => PRINT_CONTAINER,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScalarKind {
    Integer,
    Floating,
}

impl ScalarKind {
    fn format_spec(self) -> &'static str {
        match self {
            ScalarKind::Integer => "%d",
            ScalarKind::Floating => "%f",
        }
    }
}

/// @ai:intent Closed classification of a declared type for code auto-generation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldKind {
    Scalar(ScalarKind),
    ScalarPointer(ScalarKind),
    Container(ContainerKind),
    ContainerPointer(ContainerKind),
    /// Any other pointer; only its address can be printed.
    OpaquePointer,
    Void,
    Unsupported(String),
}

/// @ai:intent Which auto-generated operation is being requested
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoGen {
    Initial,
    Copy,
    Print,
}

impl AutoGen {
    pub fn primitive_name(self) -> &'static str {
        match self {
            AutoGen::Initial => "@Initial",
            AutoGen::Copy => "@Copy",
            AutoGen::Print => "@Print",
        }
    }
}

fn scalar_kind(ty: &str) -> Option<ScalarKind> {
    match ty {
        "int" | "unsigned" | "unsigned int" | "int unsigned" | "bool" => Some(ScalarKind::Integer),
        "double" | "float" => Some(ScalarKind::Floating),
        _ => None,
    }
}

impl FieldKind {
    /// @ai:intent Classify a normalized type string
    /// @ai:example ("IntList *") -> ContainerPointer(IntList)
    /// @ai:example ("unsigned int") -> Scalar(Integer)
    /// @ai:effects pure
    pub fn classify(ty: &str) -> Self {
        let ty = ty.trim();
        if ty == "void" {
            return FieldKind::Void;
        }
        if let Some(base) = ty.strip_suffix('*') {
            let base = base.trim();
            if base.ends_with('*') {
                return FieldKind::OpaquePointer;
            }
            if let Some(kind) = scalar_kind(base) {
                return FieldKind::ScalarPointer(kind);
            }
            if let Some(kind) = ContainerKind::from_type_name(base) {
                return FieldKind::ContainerPointer(kind);
            }
            return FieldKind::OpaquePointer;
        }
        if let Some(kind) = scalar_kind(ty) {
            return FieldKind::Scalar(kind);
        }
        if let Some(kind) = ContainerKind::from_type_name(ty) {
            return FieldKind::Container(kind);
        }
        FieldKind::Unsupported(ty.to_string())
    }

    /// @ai:intent Statement initializing a state field, or None if unsupported
    /// @ai:example (Scalar, "x") -> "x = 0;"
    pub fn initial_statement(&self, name: &str) -> Option<String> {
        match self {
            FieldKind::Scalar(_) => Some(format!("{} = 0;", name)),
            FieldKind::Container(kind) => Some(format!("{} = {}();", name, kind.type_name())),
            FieldKind::ContainerPointer(kind) => {
                Some(format!("{} = new {}();", name, kind.type_name()))
            }
            FieldKind::ScalarPointer(_)
            | FieldKind::OpaquePointer
            | FieldKind::Void
            | FieldKind::Unsupported(_) => None,
        }
    }

    /// @ai:intent Statement copying a state field from the old to the new instance
    /// @ai:example (Container(IntList), "q") -> "NEW->q = IntList(OLD->q);"
    pub fn copy_statement(&self, name: &str) -> Option<String> {
        let new = format!("{}->{}", NEW_STATE_INST, name);
        let old = format!("{}->{}", OLD_STATE_INST, name);
        match self {
            FieldKind::Scalar(_) => Some(format!("{} = {};", new, old)),
            FieldKind::Container(kind) => Some(format!("{} = {}({});", new, kind.type_name(), old)),
            FieldKind::ContainerPointer(kind) => {
                Some(format!("{} = new {}(*{});", new, kind.type_name(), old))
            }
            FieldKind::ScalarPointer(_)
            | FieldKind::OpaquePointer
            | FieldKind::Void
            | FieldKind::Unsupported(_) => None,
        }
    }

    /// @ai:intent Statement releasing a state field; most kinds need nothing
    /// @ai:example (ContainerPointer(IntList), "q") -> "if (q) delete q;"
    pub fn clear_statement(&self, name: &str) -> Option<String> {
        match self {
            FieldKind::ContainerPointer(_) => Some(format!("if ({}) delete {};", name, name)),
            FieldKind::Scalar(_)
            | FieldKind::ScalarPointer(_)
            | FieldKind::Container(_)
            | FieldKind::OpaquePointer
            | FieldKind::Void
            | FieldKind::Unsupported(_) => None,
        }
    }

    /// @ai:intent Statements printing a value, or None if the type cannot be printed
    /// @ai:post Void yields an empty code block
    pub fn print_statements(&self, name: &str) -> Option<Code> {
        let mut code = Code::new();
        match self {
            FieldKind::Scalar(kind) => {
                code.add_line(format!(
                    "{}(\"\\t{}={}\\n\", {});",
                    PRINT,
                    name,
                    kind.format_spec(),
                    name
                ));
            }
            FieldKind::ScalarPointer(kind) => {
                code.add_line(format!(
                    "{}(\"\\t*{}={}\\n\", *{});",
                    PRINT,
                    name,
                    kind.format_spec(),
                    name
                ));
            }
            FieldKind::Container(kind) => {
                code.add_line(format!("{}(\"\\t{}: \");", PRINT, name));
                code.add_line(format!("{}(&{});", kind.print_function(), name));
                code.add_line(format!("{}(\"\\n\");", PRINT));
            }
            FieldKind::ContainerPointer(kind) => {
                code.add_line(format!("{}(\"\\t{}: \");", PRINT, name));
                code.add_line(format!("{}({});", kind.print_function(), name));
                code.add_line(format!("{}(\"\\n\");", PRINT));
            }
            FieldKind::OpaquePointer => {
                code.add_line(format!("{}(\"\\t{}=%p\\n\", {});", PRINT, name, name));
            }
            FieldKind::Void => {}
            FieldKind::Unsupported(_) => return None,
        }
        Some(code)
    }

    /// @ai:intent Print statements that degrade to a placeholder comment
    pub fn print_statements_or_placeholder(&self, name: &str) -> Code {
        match (self.print_statements(name), self) {
            (Some(code), _) => code,
            (None, FieldKind::Unsupported(ty)) => {
                let mut code = Code::new();
                code.add_line(format!(
                    "// We do not support auto-gen print-out for type: {}.",
                    ty
                ));
                code
            }
            (None, _) => Code::new(),
        }
    }
}
