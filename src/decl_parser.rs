//! @ai:module:intent Parse one-line C/C++ variable and function declarations
//! @ai:module:layer application
//! @ai:module:public_api parse_declaration, parse_function_header, ParseError
//! @ai:module:depends_on declaration
//! @ai:module:stateless true

use crate::declaration::{FunctionHeader, QualifiedName, VariableDeclaration};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

static IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_]\w*$").expect("Invalid regex"));
static QUALIFIED_IDENTIFIER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z_]\w*::)*~?[A-Za-z_]\w*$").expect("Invalid regex"));
static TYPE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][\w:]*(?:<.*>)?$").expect("Invalid regex"));

/// Words that can never be the declared name.
const TYPE_KEYWORDS: [&str; 14] = [
    "void", "bool", "char", "short", "int", "long", "unsigned", "signed", "float", "double",
    "const", "volatile", "struct", "enum",
];

/// Specifiers that precede a function's return type but are not part of it.
const FUNCTION_SPECIFIERS: [&str; 5] = ["static", "inline", "extern", "virtual", "explicit"];

/// @ai:intent A declaration that the parser cannot interpret
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("The declaration \"{text}\" has wrong syntax: {reason}")]
pub struct ParseError {
    pub text: String,
    pub reason: String,
}

impl ParseError {
    fn new(text: &str, reason: impl Into<String>) -> Self {
        Self {
            text: text.trim().to_string(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Token {
    Word(String),
    Pointer(char),
}

/// Split into words and pointer/reference markers, keeping template ids whole.
fn tokenize(text: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut word = String::new();
    let mut depth = 0usize;

    fn flush(word: &mut String, tokens: &mut Vec<Token>) {
        if !word.is_empty() {
            tokens.push(Token::Word(std::mem::take(word)));
        }
    }

    for ch in text.chars() {
        match ch {
            '<' => {
                depth += 1;
                word.push(ch);
            }
            '>' => {
                depth = depth.saturating_sub(1);
                word.push(ch);
            }
            '*' | '&' if depth == 0 => {
                flush(&mut word, &mut tokens);
                tokens.push(Token::Pointer(ch));
            }
            c if c.is_whitespace() && depth == 0 => flush(&mut word, &mut tokens),
            c => word.push(c),
        }
    }
    flush(&mut word, &mut tokens);
    tokens
}

/// Normalized type text: words separated by one space, then the pointer markers.
fn type_text(tokens: &[Token]) -> Option<String> {
    let words: Vec<&str> = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Word(w) => Some(w.as_str()),
            Token::Pointer(_) => None,
        })
        .collect();
    let pointers: String = tokens
        .iter()
        .filter_map(|t| match t {
            Token::Pointer(c) => Some(*c),
            Token::Word(_) => None,
        })
        .collect();

    if words.iter().all(|w| matches!(*w, "const" | "volatile")) {
        return None;
    }
    if pointers.is_empty() {
        Some(words.join(" "))
    } else {
        Some(format!("{} {}", words.join(" "), pointers))
    }
}

/// Split `type-tokens name` into its parts, checking every type word.
fn split_binding<'t>(
    text: &str,
    tokens: &'t [Token],
    name_pattern: &Regex,
) -> Result<(String, &'t str), ParseError> {
    let (name, type_tokens) = match tokens.split_last() {
        Some((Token::Word(name), rest)) => (name.as_str(), rest),
        _ => return Err(ParseError::new(text, "missing declared name")),
    };
    if !name_pattern.is_match(name) || TYPE_KEYWORDS.contains(&name) {
        return Err(ParseError::new(text, format!("\"{}\" is not a valid name", name)));
    }
    for token in type_tokens {
        if let Token::Word(w) = token {
            if !TYPE_WORD.is_match(w) {
                return Err(ParseError::new(text, format!("unexpected \"{}\"", w)));
            }
        }
    }
    let ty = type_text(type_tokens).ok_or_else(|| ParseError::new(text, "missing type"))?;
    Ok((ty, name))
}

/// @ai:intent Parse a variable declaration such as `IntList *q;`
/// @ai:example ("IntList* q;") -> type "IntList *", name "q"
/// @ai:example ("unsigned int  size") -> type "unsigned int", name "size"
/// @ai:effects pure
pub fn parse_declaration(text: &str) -> Result<VariableDeclaration, ParseError> {
    let decl = text.trim();
    let decl = decl.strip_suffix(';').unwrap_or(decl).trim_end();
    let decl = match decl.split_once('=') {
        Some((binding, _initializer)) => binding.trim_end(),
        None => decl,
    };
    if decl.contains('(') || decl.contains('[') {
        return Err(ParseError::new(
            text,
            "function pointers and arrays are not supported",
        ));
    }

    let tokens = tokenize(decl);
    let (ty, name) = split_binding(text, &tokens, &IDENTIFIER)?;
    Ok(VariableDeclaration::new(ty, name))
}

/// @ai:intent Parse the one-line declaration that follows an interface annotation
/// @ai:pre line holds the whole declaration, optionally followed by `{`
/// @ai:example ("bool Stack::push(int x) {") -> bool, Stack::push, [int x]
/// @ai:effects pure
pub fn parse_function_header(line: &str) -> Result<FunctionHeader, ParseError> {
    let open = line
        .find('(')
        .ok_or_else(|| ParseError::new(line, "missing argument list"))?;
    let close = matching_paren(line, open)
        .ok_or_else(|| ParseError::new(line, "unbalanced parentheses"))?;

    let trailer = line[close + 1..].trim();
    let trailer_ok = trailer.is_empty()
        || trailer.starts_with('{')
        || trailer.starts_with(';')
        || trailer.starts_with("const")
        || trailer.starts_with("noexcept");
    if !trailer_ok {
        return Err(ParseError::new(
            line,
            "the declaration must fit on one line",
        ));
    }

    let head = &line[..open];
    if head.contains("template") || head.trim_end().ends_with('>') {
        return Err(ParseError::new(line, "templates are not supported"));
    }
    let tokens: Vec<Token> = tokenize(head)
        .into_iter()
        .skip_while(|t| matches!(t, Token::Word(w) if FUNCTION_SPECIFIERS.contains(&w.as_str())))
        .collect();
    let (return_type, name) = split_binding(line, &tokens, &QUALIFIED_IDENTIFIER)?;

    let args = split_arguments(&line[open + 1..close])
        .into_iter()
        .map(parse_declaration)
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| ParseError::new(line, format!("argument {}", e.reason)))?;

    Ok(FunctionHeader {
        return_type,
        name: QualifiedName::new(name),
        args,
        header_line: line.to_string(),
    })
}

fn matching_paren(text: &str, open: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (idx, ch) in text.char_indices().skip_while(|(i, _)| *i < open) {
        match ch {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some(idx);
                }
            }
            _ => {}
        }
    }
    None
}

/// Split an argument list at top-level commas; `()` and `(void)` are empty.
fn split_arguments(list: &str) -> Vec<&str> {
    let list = list.trim();
    if list.is_empty() || list == "void" {
        return Vec::new();
    }

    let mut args = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (idx, ch) in list.char_indices() {
        match ch {
            '(' | '<' => depth += 1,
            ')' | '>' => depth -= 1,
            ',' if depth == 0 => {
                args.push(list[start..idx].trim());
                start = idx + 1;
            }
            _ => {}
        }
    }
    args.push(list[start..].trim());
    args
}
