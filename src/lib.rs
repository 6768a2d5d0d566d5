//! @ai:module:intent CDSSpec compiler library: extract specification annotations and generate instrumented code
//! @ai:module:layer infrastructure
//! @ai:module:public_api extractor, generator, additions, render, construct, config, output, error
//!
//! # CDSSpec compiler
//!
//! Reads C/C++ sources annotated with CDSSpec comments (`@DeclareState`,
//! `@Interface`, ordering points, ...), validates them as one run, and writes
//! copies of the sources with generated code spliced in, together with the
//! shared `cdsspec-generated.h` / `cdsspec-generated.cc` files.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cdsspec_compiler::{output, CodeGenerator};
//!
//! let generator = CodeGenerator::new("benchmarks/ms-queue", "generated/ms-queue");
//! let report = generator.generate().unwrap();
//! print!("{}", output::format_report(&report));
//! ```

pub mod additions;
pub mod code;
pub mod config;
pub mod construct;
pub mod decl_parser;
pub mod declaration;
pub mod diagnostics;
pub mod error;
pub mod extractor;
pub mod field_kind;
pub mod generator;
pub mod language;
pub mod naming;
pub mod output;
pub mod primitive;
pub mod render;

pub use additions::{CodeAddition, CodeAdditions};
pub use code::Code;
pub use config::GeneratorConfig;
pub use construct::{
    CommutativityRule, Construct, DefineConstruct, EntryConstruct, GlobalConstruct,
    InterfaceConstruct, OpConstruct, OpKind,
};
pub use decl_parser::{parse_declaration, parse_function_header, ParseError};
pub use declaration::{FunctionHeader, QualifiedName, VariableDeclaration};
pub use diagnostics::{Diagnostics, Location, Warning};
pub use error::{Error, Result};
pub use extractor::{extract_paths, FileSpec, SpecExtractor, SpecModel};
pub use generator::{CodeGenerator, GenerationReport};
pub use language::{detect_source_kind, is_supported_file, SourceKind};
pub use output::{format_model, format_report, to_json, OutputFormat};
pub use render::{CdsSpecRenderer, Renderer};
