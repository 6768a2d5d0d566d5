//! @ai:module:intent Drive one generation run: discover, extract, derive changes, write outputs
//! @ai:module:layer application
//! @ai:module:public_api CodeGenerator, GenerationReport, discover_source_files, derive_code_changes
//! @ai:module:depends_on additions, extractor, render, language, naming

use crate::additions::{CodeAddition, CodeAdditions};
use crate::code::Code;
use crate::diagnostics::Diagnostics;
use crate::error::{Error, Result};
use crate::extractor::{FileSpec, SpecExtractor, SpecModel};
use crate::language::{detect_source_kind, is_supported_file};
use crate::naming::{GENERATED_HEADER, GENERATED_SOURCE};
use crate::render::{CdsSpecRenderer, Renderer};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use walkdir::WalkDir;

/// @ai:intent Outcome of a successful run
#[derive(Debug, Clone)]
pub struct GenerationReport {
    pub output_dir: PathBuf,
    /// Every file written, aggregate files first.
    pub written: Vec<PathBuf>,
    pub diagnostics: Diagnostics,
}

/// @ai:intent Generates instrumented copies of one directory of annotated sources
pub struct CodeGenerator<R: Renderer = CdsSpecRenderer> {
    input_dir: PathBuf,
    output_dir: PathBuf,
    renderer: R,
}

impl CodeGenerator<CdsSpecRenderer> {
    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self::with_renderer(input_dir, output_dir, CdsSpecRenderer::new())
    }
}

impl<R: Renderer> CodeGenerator<R> {
    pub fn with_renderer(
        input_dir: impl Into<PathBuf>,
        output_dir: impl Into<PathBuf>,
        renderer: R,
    ) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            renderer,
        }
    }

    /// @ai:intent Extract and validate every source file of the input directory
    /// @ai:effects fs:read, log
    pub fn extract(&self) -> Result<SpecModel> {
        let files = discover_source_files(&self.input_dir)?;
        info!(
            "Processing {} ({} files)",
            self.input_dir.display(),
            files.len()
        );
        let mut extractor = SpecExtractor::new();
        for file in &files {
            debug!("Extracting {}", file.display());
            extractor.extract_file(file)?;
        }
        extractor.check_semantics()
    }

    /// @ai:intent Run extraction and write every output file
    /// @ai:post the aggregate header exists before any rewritten file is written
    /// @ai:effects fs:read, fs:write, log
    pub fn generate(&self) -> Result<GenerationReport> {
        let model = self.extract()?;
        let changes: Vec<CodeAdditions> = model
            .files
            .iter()
            .map(|file| derive_code_changes(file, &self.renderer))
            .collect();

        fs::create_dir_all(&self.output_dir).map_err(|source| Error::FileWrite {
            path: self.output_dir.clone(),
            source,
        })?;

        let mut written = Vec::new();
        let header = self.output_dir.join(GENERATED_HEADER);
        write_atomically(&header, &self.renderer.render_header_file(&model).to_string())?;
        written.push(header);
        let companion = self.output_dir.join(GENERATED_SOURCE);
        write_atomically(
            &companion,
            &self.renderer.render_companion_source(&model).to_string(),
        )?;
        written.push(companion);

        for additions in &changes {
            let source = additions.file();
            let original = fs::read_to_string(source).map_err(|e| Error::FileRead {
                path: source.to_path_buf(),
                source: e,
            })?;
            let dest = self
                .output_dir
                .join(source.file_name().unwrap_or(source.as_os_str()));
            write_atomically(&dest, &additions.merge(&original))?;
            info!("Wrote {}", dest.display());
            written.push(dest);
        }

        Ok(GenerationReport {
            output_dir: self.output_dir.clone(),
            written,
            diagnostics: model.diagnostics,
        })
    }
}

/// @ai:intent List the C/C++ sources directly inside a directory, sorted by name
/// @ai:effects fs:read
pub fn discover_source_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(Error::NotADirectory(dir.to_path_buf()));
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| Error::FileRead {
            path: e.path().unwrap_or(dir).to_path_buf(),
            source: e.into(),
        })?;
        if entry.file_type().is_file() && is_supported_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// @ai:intent Insertion records and renamed lines for one file
/// @ai:post records are sorted by line, stable on ties
/// @ai:effects pure
pub fn derive_code_changes(file: &FileSpec, renderer: &impl Renderer) -> CodeAdditions {
    let mut additions = CodeAdditions::new(&file.path);

    for op in &file.ops {
        additions.add(CodeAddition::new(op.location.line, renderer.render_op(op)));
    }
    if let Some(entry) = &file.entry {
        additions.add(CodeAddition::new(
            entry.location.line,
            renderer.render_entry(entry),
        ));
    }
    for define in &file.defines {
        additions.add(CodeAddition::new(define.end_line, renderer.render_define(define)));
    }
    for interface in &file.interfaces {
        additions.add(CodeAddition::new(
            interface.body_end_line,
            renderer.render_interface_wrapper(interface),
        ));
        additions.rename_line(interface.declaration_line(), interface.header.renamed_line());
    }

    if detect_source_kind(&file.path).is_some_and(|kind| kind.is_primary_source()) {
        additions.set_prelude(generated_header_prelude());
    }
    additions.sort();
    additions
}

fn generated_header_prelude() -> Code {
    let mut code = Code::new();
    code.add_line(format!("/* Add the {} header file */", GENERATED_HEADER));
    code.add_line(format!("#include \"{}\"", GENERATED_HEADER));
    code
}

/// Write through a sibling temporary file so a failed write never leaves a partial output.
fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let tmp = path.with_file_name(format!(".{}.tmp", file_name));
    let result = fs::write(&tmp, contents).and_then(|_| fs::rename(&tmp, path));
    result.map_err(|source| {
        let _ = fs::remove_file(&tmp);
        Error::FileWrite {
            path: path.to_path_buf(),
            source,
        }
    })
}
