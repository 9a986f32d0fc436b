//! Error taxonomy and cross-file validation.
//!
//! Two of the four failure classes live here as typed errors (`Io`,
//! `UnresolvedBootstrap`); the recoverable and best-effort classes are logged
//! at their call sites and never surface as `Err`.

use std::collections::HashSet;
use std::path::PathBuf;

use thiserror::Error;

use crate::extract::SourceDocs;
use crate::testdocs::TestDoc;

#[derive(Debug, Error)]
pub enum GeneratorError {
    /// Fatal I/O: unreadable directories, missing template/style files,
    /// unwritable output paths. Never retried.
    #[error("i/o error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A harness that cannot bootstrap its target component is useless
    /// output, so the whole run stops before generation.
    #[error("unresolved bootstrap component \"{component}\" in {file}: not declared in the test module setup and not exported by any imported module")]
    UnresolvedBootstrap { component: String, file: String },
}

impl GeneratorError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        GeneratorError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Every `TestDoc.bootstrap_component_name` must resolve to a symbol that is
/// either declared in its own module setup (including inline declarations) or
/// exported, transitively, by one of its imported modules.
///
/// All failures are reported before the first one is returned, so a run with
/// several broken test files prints every offender in one pass.
pub fn check_bootstrap_targets(
    tests: &[TestDoc],
    docs: &SourceDocs,
) -> Result<(), GeneratorError> {
    let mut first_failure: Option<GeneratorError> = None;

    for test in tests {
        if resolvable_components(test, docs).contains(test.bootstrap_component_name.as_str()) {
            continue;
        }

        eprintln!(
            "Could not resolve bootstrap component \"{}\" in {}.",
            test.bootstrap_component_name, test.file_path
        );
        tracing::error!(
            component = %test.bootstrap_component_name,
            file = %test.file_path,
            "unresolved bootstrap component"
        );
        if first_failure.is_none() {
            first_failure = Some(GeneratorError::UnresolvedBootstrap {
                component: test.bootstrap_component_name.clone(),
                file: test.file_path.clone(),
            });
        }
    }

    match first_failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// The set of component names a test's harness could instantiate: its own
/// declarations, its inline component classes, and everything exported by its
/// imported modules. Module exports may name further modules; those are
/// followed with a visited-set guard.
fn resolvable_components<'a>(test: &'a TestDoc, docs: &'a SourceDocs) -> HashSet<&'a str> {
    let mut reachable: HashSet<&str> = HashSet::new();

    for decl in &test.module_setup.declarations {
        reachable.insert(expression_root(decl));
    }
    for inline in &test.inline_component_declarations {
        reachable.insert(inline.ref_name.as_str());
    }

    let mut pending: Vec<&str> = test
        .module_setup
        .imports
        .iter()
        .map(|e| expression_root(e))
        .collect();
    let mut visited: HashSet<&str> = HashSet::new();

    while let Some(module_name) = pending.pop() {
        if !visited.insert(module_name) {
            continue;
        }
        if let Some(module) = docs.modules.iter().find(|m| m.ref_name == module_name) {
            for member in &module.exported_members {
                reachable.insert(member.as_str());
                // An exported member may itself be a module (re-export chain).
                pending.push(member.as_str());
            }
        }
    }

    reachable
}

/// Root identifier of a raw expression string: `RouterTestingModule.withRoutes([])`
/// and `SharedModule` both resolve to their leading identifier.
pub fn expression_root(expression: &str) -> &str {
    let trimmed = expression.trim();
    let end = trimmed
        .find(|c: char| !(c.is_alphanumeric() || c == '_' || c == '$'))
        .unwrap_or(trimmed.len());
    &trimmed[..end]
}
