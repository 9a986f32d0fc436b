//! Pipeline driver.
//!
//! `generate` runs the whole five-stage pipeline: discovery, component and
//! module extraction, test extraction, harness generation, bundle assembly.
//! `regenerate_file` is the watch-mode entry point: it re-runs extraction but
//! rewrites only the harnesses implicated by one changed file, leaving the
//! bundle untouched.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::codegen;
use crate::discovery;
use crate::extract;
use crate::finalize;
use crate::testdocs;
use crate::validate::GeneratorError;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorConfig {
    /// Project root the source walk starts from.
    pub root_dir: PathBuf,
    /// Where harness files and the bundle land.
    pub output_dir: PathBuf,
    /// Prepended to every navigation path.
    pub url_prefix: String,
    pub include_patterns: Vec<String>,
    pub exclude_patterns: Vec<String>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig::new(PathBuf::from("."), PathBuf::from("styledoc"))
    }
}

impl GeneratorConfig {
    pub fn new(root_dir: PathBuf, output_dir: PathBuf) -> Self {
        GeneratorConfig {
            root_dir,
            output_dir,
            url_prefix: String::new(),
            include_patterns: vec!["**/*.ts".to_string()],
            exclude_patterns: vec![
                "**/node_modules/**".to_string(),
                "**/*.d.ts".to_string(),
            ],
        }
    }
}

/// What a full run produced.
#[derive(Debug)]
pub struct GenerationSummary {
    pub documented_component_count: usize,
    pub harness_files: Vec<PathBuf>,
    pub bundle_file: PathBuf,
}

/// Full pipeline run. Fatal on I/O failures and unresolved bootstrap
/// components; everything else degrades per file.
pub fn generate(config: &GeneratorConfig) -> Result<GenerationSummary, GeneratorError> {
    println!("Generating resources...");

    let (docs, tests) = analyze(config)?;

    fs::create_dir_all(&config.output_dir)
        .map_err(|e| GeneratorError::io(config.output_dir.clone(), e))?;
    let harnesses = codegen::generate_harnesses(&tests, &docs, config)?;
    let bundle_file = finalize::write_bundle(&docs, &harnesses, config)?;

    println!("Generated resources successfully.");
    Ok(GenerationSummary {
        documented_component_count: docs.documented.len(),
        harness_files: harnesses.into_iter().map(|h| h.file_path).collect(),
        bundle_file,
    })
}

/// Re-run extraction after one file changed and rewrite only the harness
/// whose originating test file is that file. The bundle is not rewritten and
/// goes stale until the next full run; harness names are path-hashed, so
/// membership cannot have changed.
pub fn regenerate_file(
    config: &GeneratorConfig,
    changed: &Path,
) -> Result<Vec<PathBuf>, GeneratorError> {
    let (docs, tests) = analyze(config)?;
    let changed_text = changed.display().to_string();

    let implicated: Vec<_> = tests
        .into_iter()
        .filter(|test| test.file_path == changed_text)
        .collect();

    fs::create_dir_all(&config.output_dir)
        .map_err(|e| GeneratorError::io(config.output_dir.clone(), e))?;
    let harnesses = codegen::generate_harnesses(&implicated, &docs, config)?;
    Ok(harnesses.into_iter().map(|h| h.file_path).collect())
}

fn analyze(
    config: &GeneratorConfig,
) -> Result<(extract::SourceDocs, Vec<testdocs::TestDoc>), GeneratorError> {
    let files = discovery::list_source_files(
        &config.root_dir,
        &config.include_patterns,
        &config.exclude_patterns,
    )?;
    let annotated = discovery::select_annotated_files(&files)?;

    let mut docs = extract::extract_docs(&files)?;
    extract::resolve_inheritance(&mut docs);

    // Catalog paths are reported relative to the project root.
    let root_text = format!("{}/", config.root_dir.display());
    for doc in docs.documented.iter_mut().chain(docs.undocumented.iter_mut()) {
        if let Some(stripped) = doc.source_file_path.strip_prefix(&root_text) {
            doc.source_file_path = stripped.to_string();
        }
    }

    let tests = testdocs::extract_test_docs(&annotated, &docs)?;
    Ok((docs, tests))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sensible_patterns() {
        let config = GeneratorConfig::default();
        assert_eq!(config.include_patterns, vec!["**/*.ts"]);
        assert!(config
            .exclude_patterns
            .contains(&"**/node_modules/**".to_string()));
        assert!(config.url_prefix.is_empty());
    }

    #[test]
    fn config_round_trips_through_json() {
        let json = r#"{
            "rootDir": "src",
            "outputDir": "src/styledoc",
            "urlPrefix": "docs",
            "includePatterns": ["src/**/*.ts"],
            "excludePatterns": []
        }"#;
        let config: GeneratorConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.root_dir, PathBuf::from("src"));
        assert_eq!(config.url_prefix, "docs");
        assert_eq!(config.include_patterns, vec!["src/**/*.ts"]);
        assert!(config.exclude_patterns.is_empty());
    }
}
