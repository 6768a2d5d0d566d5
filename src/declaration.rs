//! @ai:module:intent Typed model of C/C++ declarations referenced by annotations
//! @ai:module:layer domain
//! @ai:module:public_api VariableDeclaration, QualifiedName, FunctionHeader, user_defined_type
//! @ai:module:depends_on naming

use crate::naming;
use serde::{Deserialize, Serialize};
use std::fmt;

/// @ai:intent A typed binding such as `IntList *q` or an interface argument
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariableDeclaration {
    #[serde(rename = "type")]
    pub ty: String,
    pub name: String,
}

impl VariableDeclaration {
    pub fn new(ty: impl AsRef<str>, name: impl AsRef<str>) -> Self {
        Self {
            ty: ty.as_ref().trim().to_string(),
            name: name.as_ref().trim().to_string(),
        }
    }
}

impl fmt::Display for VariableDeclaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// @ai:intent A scope-qualified identifier split into qualifier and bare name
/// @ai:example ("Base::Mine::func") -> bare "func", qualifier "Base::Mine::"
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualifiedName {
    pub full_name: String,
    pub bare_name: String,
    pub qualifier: String,
}

impl QualifiedName {
    /// @ai:intent Split a full name at its last scope separator
    /// @ai:effects pure
    pub fn new(full_name: impl Into<String>) -> Self {
        let full_name = full_name.into();
        let split = full_name.rfind(':').map_or(0, |idx| idx + 1);
        let (qualifier, bare_name) = full_name.split_at(split);
        Self {
            qualifier: qualifier.to_string(),
            bare_name: bare_name.to_string(),
            full_name: full_name.clone(),
        }
    }

    pub fn is_qualified(&self) -> bool {
        !self.qualifier.is_empty()
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.full_name)
    }
}

/// @ai:intent The parsed one-line declaration of an annotated interface function
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionHeader {
    pub return_type: String,
    pub name: QualifiedName,
    pub args: Vec<VariableDeclaration>,
    /// The declaration line exactly as it appears in the source.
    pub header_line: String,
}

impl FunctionHeader {
    pub fn is_return_void(&self) -> bool {
        self.return_type == "void"
    }

    /// @ai:intent Name of the renamed original function, without qualifier
    /// @ai:example (push) -> "__wrapper__push"
    pub fn wrapper_bare_name(&self) -> String {
        naming::wrapper_name(&self.name.bare_name)
    }

    /// @ai:intent Fully qualified name of the renamed original function
    pub fn renamed_name(&self) -> String {
        format!("{}{}", self.name.qualifier, self.wrapper_bare_name())
    }

    /// @ai:intent Rewrite the original declaration line to declare the wrapper name
    /// @ai:post only the first textual occurrence of the bare name is replaced
    /// @ai:example ("bool push(int x) {") -> "bool __wrapper__push(int x) {"
    /// @ai:effects pure
    pub fn renamed_line(&self) -> String {
        self.header_line
            .replacen(&self.name.bare_name, &self.wrapper_bare_name(), 1)
    }

    /// @ai:intent Expression that calls the renamed function and captures its result
    /// @ai:example (bool push(int x)) -> "bool RET = __wrapper__push(x)"
    pub fn renamed_call(&self) -> String {
        let args = self
            .args
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let call = format!("{}({})", self.renamed_name(), args);
        if self.is_return_void() {
            call
        } else {
            format!("{} {} = {}", self.return_type, naming::C_RET, call)
        }
    }

    /// @ai:intent Plain declaration string with the original name
    /// @ai:example -> "bool Stack::push(int x)"
    pub fn declaration(&self) -> String {
        let args = self
            .args
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ");
        format!("{} {}({})", self.return_type, self.name.full_name, args)
    }

    /// @ai:intent Types used by this header that need a forward declaration
    pub fn user_defined_types(&self) -> Vec<String> {
        std::iter::once(self.return_type.as_str())
            .chain(self.args.iter().map(|a| a.ty.as_str()))
            .filter_map(user_defined_type)
            .collect()
    }
}

impl fmt::Display for FunctionHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.declaration())
    }
}

const BUILTIN_TYPES: [&str; 13] = [
    "void", "bool", "char", "short", "int", "long", "unsigned", "signed", "float", "double",
    "size_t", "ssize_t", "uintptr_t",
];

/// @ai:intent Plain user-defined type name of a declared type, if any
/// @ai:example ("struct node *") -> Some("node")
/// @ai:example ("unsigned int") -> None
/// @ai:effects pure
pub fn user_defined_type(ty: &str) -> Option<String> {
    let plain: Vec<&str> = ty
        .split(|c: char| c == '*' || c == '&' || c.is_whitespace())
        .filter(|w| !w.is_empty() && !matches!(*w, "const" | "volatile" | "struct"))
        .collect();
    if plain.is_empty() || plain.iter().all(|w| is_builtin_word(w)) {
        return None;
    }
    Some(plain.join(" "))
}

fn is_builtin_word(word: &str) -> bool {
    BUILTIN_TYPES.contains(&word)
        || word.starts_with("atomic_")
        || word.starts_with("std::")
        || ((word.starts_with("int") || word.starts_with("uint")) && word.ends_with("_t"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header(line: &str, ret: &str, name: &str, args: &[(&str, &str)]) -> FunctionHeader {
        FunctionHeader {
            return_type: ret.to_string(),
            name: QualifiedName::new(name),
            args: args.iter().map(|(t, n)| VariableDeclaration::new(t, n)).collect(),
            header_line: line.to_string(),
        }
    }

    #[test]
    fn test_qualified_name_split() {
        let name = QualifiedName::new("Base::Mine::func");
        assert_eq!(name.bare_name, "func");
        assert_eq!(name.qualifier, "Base::Mine::");
        assert!(name.is_qualified());

        let plain = QualifiedName::new("push");
        assert_eq!(plain.bare_name, "push");
        assert_eq!(plain.qualifier, "");
    }

    #[test]
    fn test_renamed_line_replaces_first_occurrence_only() {
        let h = header("bool push(int x) { return push_impl(x); }", "bool", "push", &[("int", "x")]);
        assert_eq!(
            h.renamed_line(),
            "bool __wrapper__push(int x) { return push_impl(x); }"
        );

        let h = header("bool push(int x) {", "bool", "push", &[("int", "x")]);
        assert_eq!(h.renamed_line(), "bool __wrapper__push(int x) {");
    }

    #[test]
    fn test_renamed_call_and_declaration() {
        let h = header(
            "bool Stack::push(int x, int y) {",
            "bool",
            "Stack::push",
            &[("int", "x"), ("int", "y")],
        );
        assert_eq!(h.renamed_name(), "Stack::__wrapper__push");
        assert_eq!(h.renamed_call(), "bool RET = Stack::__wrapper__push(x, y)");
        assert_eq!(h.declaration(), "bool Stack::push(int x, int y)");

        let v = header("void clear() {", "void", "clear", &[]);
        assert_eq!(v.renamed_call(), "__wrapper__clear()");
    }

    #[test]
    fn test_user_defined_type() {
        assert_eq!(user_defined_type("struct node *"), Some("node".to_string()));
        assert_eq!(user_defined_type("queue_t *"), Some("queue_t".to_string()));
        assert_eq!(user_defined_type("unsigned int"), None);
        assert_eq!(user_defined_type("atomic_int *"), None);
        assert_eq!(user_defined_type("uint32_t"), None);
    }
}
