//! Source-set discovery and test-file classification.

use std::fs;
use std::path::{Path, PathBuf};

use glob::Pattern;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Expression, Statement};
use walkdir::WalkDir;

use crate::markers;
use crate::parse;
use crate::validate::GeneratorError;

/// Walk the project root and keep every file matching an include pattern and
/// no exclude pattern. Exclusion wins. Traversal errors are fatal.
pub fn list_source_files(
    root: &Path,
    include: &[String],
    exclude: &[String],
) -> Result<Vec<PathBuf>, GeneratorError> {
    let include = compile_patterns(include);
    let exclude = compile_patterns(exclude);
    let mut files = Vec::new();

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| root.to_path_buf());
            GeneratorError::io(path, e.into())
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        if exclude.iter().any(|p| p.matches_path(relative) || p.matches_path(path)) {
            continue;
        }
        if include.iter().any(|p| p.matches_path(relative) || p.matches_path(path)) {
            files.push(path.to_path_buf());
        }
    }

    tracing::debug!(count = files.len(), "discovered source files");
    Ok(files)
}

fn compile_patterns(patterns: &[String]) -> Vec<Pattern> {
    patterns
        .iter()
        .filter_map(|raw| match Pattern::new(raw) {
            Ok(pattern) => Some(pattern),
            Err(err) => {
                tracing::warn!(pattern = %raw, %err, "ignoring malformed glob pattern");
                None
            }
        })
        .collect()
}

/// Narrow the source set to annotated test files: files where a `@uijar` or
/// `@hostcomponent` marker sits in a doc comment on a variable declaration or
/// in a block comment fronting a call expression. Files where the marker text
/// only appears in some other position (a string literal, a trailing comment)
/// are not annotated.
pub fn select_annotated_files(files: &[PathBuf]) -> Result<Vec<PathBuf>, GeneratorError> {
    let mut annotated = Vec::new();
    for path in files {
        let source =
            fs::read_to_string(path).map_err(|e| GeneratorError::io(path.clone(), e))?;
        // Cheap pre-filter before paying for a parse.
        if !source.contains("@uijar") && !source.contains("@hostcomponent") {
            continue;
        }
        if is_annotated(&source) {
            annotated.push(path.clone());
        }
    }
    tracing::debug!(count = annotated.len(), "selected annotated test files");
    Ok(annotated)
}

fn is_annotated(source: &str) -> bool {
    let allocator = Allocator::default();
    let Some(program) = parse::parse_source(&allocator, source) else {
        return false;
    };
    statements_carry_marker(&program.body, source)
}

fn statements_carry_marker(statements: &[Statement], source: &str) -> bool {
    for stmt in statements {
        match stmt {
            Statement::VariableDeclaration(decl) => {
                if marker_fronts(source, decl.span.start) {
                    return true;
                }
            }
            Statement::ExpressionStatement(stmt) => {
                if marker_fronts(source, stmt.span.start) {
                    return true;
                }
                if let Expression::CallExpression(call) = &stmt.expression {
                    for arg in &call.arguments {
                        if let Some(body) = arg
                            .as_expression()
                            .and_then(parse::function_body_statements)
                        {
                            if statements_carry_marker(body, source) {
                                return true;
                            }
                        }
                    }
                }
            }
            _ => {}
        }
    }
    false
}

fn marker_fronts(source: &str, offset: u32) -> bool {
    parse::block_comment_before(source, offset)
        .map(parse::strip_comment_margins)
        .is_some_and(|text| markers::has_primary_marker(&text))
}
