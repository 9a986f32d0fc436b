//! Harness-module synthesis.
//!
//! Every test file with at least one example becomes one generated
//! TypeScript file: a module class that declares the bootstrap component,
//! pulls in the test's module setup, and exports the example metadata the
//! viewer renders. Names derive from a hash of the test file path, so output
//! is byte-stable across runs.

use std::fs;
use std::path::{Component, Path, PathBuf};

use sha2::{Digest, Sha256};

use crate::extract::SourceDocs;
use crate::generator::GeneratorConfig;
use crate::testdocs::TestDoc;
use crate::validate::{self, GeneratorError};

/// One synthesized harness, already written to disk.
#[derive(Debug, Clone)]
pub struct GeneratedHarness {
    pub file_path: PathBuf,
    pub module_name: String,
    pub component_ref_name: String,
    pub bootstrap_component_name: String,
}

/// Marker lines the bundle pass reads back out of generated files.
pub const COMPONENT_MARKER: &str = "// @styledoc-component";
pub const BOOTSTRAP_MARKER: &str = "// @styledoc-bootstrap";

/// Write a harness file for every test that produced examples.
pub fn generate_harnesses(
    tests: &[TestDoc],
    docs: &SourceDocs,
    config: &GeneratorConfig,
) -> Result<Vec<GeneratedHarness>, GeneratorError> {
    let mut harnesses = Vec::new();
    for test in tests {
        if test.examples.is_empty() {
            tracing::debug!(file = %test.file_path, "no examples, skipping harness");
            continue;
        }
        let hash = path_hash(&test.file_path);
        let file_path = config.output_dir.join(format!("harness_{hash}.ts"));
        let source = synthesize_harness(test, docs, config, &hash);
        fs::write(&file_path, source).map_err(|e| GeneratorError::io(file_path.clone(), e))?;
        tracing::info!(file = %file_path.display(), "wrote harness");
        harnesses.push(GeneratedHarness {
            file_path,
            module_name: module_name(&hash),
            component_ref_name: test.target_component_name.clone(),
            bootstrap_component_name: test.bootstrap_component_name.clone(),
        });
    }
    Ok(harnesses)
}

/// First 16 hex characters of the test file path's digest.
pub fn path_hash(file_path: &str) -> String {
    let digest = Sha256::digest(file_path.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..16].to_string()
}

pub fn module_name(hash: &str) -> String {
    format!("Harness{}Module", hash)
}

/// Build the harness source text. Pure; callers decide where it lands.
pub fn synthesize_harness(
    test: &TestDoc,
    docs: &SourceDocs,
    config: &GeneratorConfig,
    hash: &str,
) -> String {
    let module_name = module_name(hash);
    let mut out = String::new();

    // ── 1. Provenance markers ────────────────────────────────────────────
    out.push_str(&format!(
        "{COMPONENT_MARKER} {}\n{BOOTSTRAP_MARKER} {}\n",
        test.target_component_name, test.bootstrap_component_name
    ));

    // ── 2. Imports: framework, then the test file's own, path-rewritten ──
    out.push_str("import { NgModule } from '@angular/core';\n");
    out.push_str("import { CommonModule } from '@angular/common';\n");
    if test.uses_http_mocks() {
        out.push_str(
            "import { HttpClientTestingModule } from '@angular/common/http/testing';\n",
        );
    }
    let source_dir = Path::new(&test.file_path)
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let mut seen_imports = Vec::new();
    for import in &test.import_statements {
        let rewritten = rewrite_import(
            &import.raw_text,
            &import.module_path_literal,
            &source_dir,
            &config.output_dir,
        );
        if seen_imports.contains(&rewritten) {
            continue;
        }
        out.push_str(&rewritten);
        out.push('\n');
        seen_imports.push(rewritten);
    }
    out.push('\n');

    // ── 3. Inline declarations carried over from the test file ───────────
    for func in &test.inline_function_declarations {
        out.push_str(&func.source_text);
        out.push_str("\n\n");
    }
    for inline in &test.inline_component_declarations {
        out.push_str(&inline.source_text);
        out.push_str("\n\n");
    }

    // ── 4. Example metadata the viewer consumes ──────────────────────────
    let selector = docs
        .component(&test.target_component_name)
        .map(|doc| doc.selector.clone())
        .unwrap_or_default();
    out.push_str(&format!(
        "export const exampleProperties_{hash} = [\n{}\n];\n\n",
        test.examples
            .iter()
            .map(|e| example_entry(e, &test.bootstrap_component_name, &selector))
            .collect::<Vec<_>>()
            .join(",\n")
    ));

    // ── 5. Optional module metadata override ─────────────────────────────
    if !test.module_setup.entry_components.is_empty() {
        out.push_str(&format!(
            "export function moduleMetadataOverride_{hash}() {{\n  return {{ entryComponents: [ {} ] }};\n}}\n\n",
            test.module_setup.entry_components.join(", ")
        ));
    }

    // ── 6. The harness module itself ─────────────────────────────────────
    // One entry per example; repeats stay as-is for compatibility with the
    // legacy bootstrap behavior.
    let entry_components: Vec<&str> = test
        .examples
        .iter()
        .map(|_| test.bootstrap_component_name.as_str())
        .collect();
    let declarations = module_declarations(test);
    out.push_str(&format!(
        "@NgModule({{\n  imports: [ {imports} ],\n  declarations: [ {declarations} ],\n  providers: [ {providers} ],\n  entryComponents: [ {entries} ],\n  exports: [ {exports} ]{schemas}\n}})\nexport class {module_name} {{}}\n",
        imports = module_imports(test).join(", "),
        declarations = declarations.join(", "),
        providers = test.module_setup.providers.join(", "),
        entries = entry_components.join(", "),
        exports = declarations.join(", "),
        schemas = if test.module_setup.schemas.is_empty() {
            String::new()
        } else {
            format!(",\n  schemas: [ {} ]", test.module_setup.schemas.join(", "))
        },
        module_name = module_name
    ));

    out
}

/// `CommonModule` is always present; the mocked-backend module joins when any
/// example expects requests; `RouterTestingModule` gets a catch-all route so
/// harness navigation never throws.
fn module_imports(test: &TestDoc) -> Vec<String> {
    let mut imports = vec!["CommonModule".to_string()];
    if test.uses_http_mocks() {
        imports.push("HttpClientTestingModule".to_string());
    }
    for entry in &test.module_setup.imports {
        let entry = if validate::expression_root(entry) == "RouterTestingModule"
            && !entry.contains("withRoutes")
        {
            "RouterTestingModule.withRoutes([{ path: '**', redirectTo: '' }])".to_string()
        } else {
            entry.clone()
        };
        if !imports.contains(&entry) {
            imports.push(entry);
        }
    }
    imports
}

fn module_declarations(test: &TestDoc) -> Vec<String> {
    let mut declarations: Vec<String> = test.module_setup.declarations.clone();
    for inline in &test.inline_component_declarations {
        if !declarations.contains(&inline.ref_name) {
            declarations.push(inline.ref_name.clone());
        }
    }
    if !declarations.contains(&test.bootstrap_component_name) {
        declarations.push(test.bootstrap_component_name.clone());
    }
    declarations
}

fn example_entry(
    example: &crate::testdocs::ExampleDoc,
    bootstrap: &str,
    selector: &str,
) -> String {
    let properties = example
        .property_assignments
        .iter()
        .map(|p| {
            format!(
                "      {{ name: {}, expression: {} }}",
                sq_string(&p.target_path),
                ts_string(&render_literal(&p.expression))
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    let mocks = example
        .http_mocks
        .iter()
        .map(|m| {
            format!(
                "      {{ name: {}, url: {}, expression: {} }}",
                sq_string(&m.request_var_name),
                sq_string(&m.url),
                ts_string(&m.expression)
            )
        })
        .collect::<Vec<_>>()
        .join(",\n");
    format!(
        "  {{\n    title: {title},\n    bootstrapComponent: {bootstrap},\n    selector: {selector},\n    template: {template},\n    sourceCode: {source},\n    properties: [\n{properties}\n    ],\n    httpRequests: [\n{mocks}\n    ]\n  }}",
        title = ts_string(&example.title),
        bootstrap = sq_string(bootstrap),
        selector = sq_string(selector),
        template = ts_string(&example.template),
        source = ts_string(&example.generated_source_code),
    )
}

/// Literal property values are re-serialized when they parse as plain data,
/// with a depth guard standing in for runtime cycle detection; anything the
/// generator cannot statically read stays verbatim.
pub fn render_literal(expression: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(expression) {
        Ok(value) => {
            let mut out = String::new();
            write_value(&value, 0, &mut out);
            out
        }
        Err(_) => expression.to_string(),
    }
}

const MAX_LITERAL_DEPTH: usize = 32;

fn write_value(value: &serde_json::Value, depth: usize, out: &mut String) {
    if depth > MAX_LITERAL_DEPTH {
        out.push_str("undefined");
        return;
    }
    match value {
        serde_json::Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                write_value(item, depth + 1, out);
            }
            out.push(']');
        }
        serde_json::Value::Object(map) => {
            out.push_str("{ ");
            for (i, (key, item)) in map.iter().enumerate() {
                if i > 0 {
                    out.push_str(", ");
                }
                out.push_str(key);
                out.push_str(": ");
                write_value(item, depth + 1, out);
            }
            out.push_str(" }");
        }
        other => out.push_str(&other.to_string()),
    }
}

/// Backtick-quoted TypeScript string. Backticks and `${` are escaped so
/// example text containing template interpolations stays inert in the
/// generated file.
fn ts_string(text: &str) -> String {
    format!(
        "`{}`",
        text.replace('\\', "\\\\")
            .replace('`', "\\`")
            .replace("${", "\\${")
    )
}

/// Single-quoted TypeScript string with quotes and backslashes escaped.
fn sq_string(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}

/// Rewrite a relative import so it resolves from the output directory:
/// the specifier becomes the path of the imported file, re-rooted at the
/// test file's directory, expressed relative to where harnesses live.
/// Bare specifiers (packages) pass through untouched.
pub fn rewrite_import(
    raw_text: &str,
    specifier: &str,
    source_dir: &Path,
    output_dir: &Path,
) -> String {
    if !specifier.starts_with('.') {
        return raw_text.to_string();
    }
    let resolved = normalize(&source_dir.join(specifier));
    let rewritten = relative_path(output_dir, &resolved);
    let mut text = rewritten
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    if !text.starts_with('.') {
        text = format!("./{text}");
    }
    raw_text.replace(specifier, &text)
}

/// Lexical normalization: `a/b/../c` becomes `a/c`. No filesystem access.
fn normalize(path: &Path) -> PathBuf {
    let mut parts: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if matches!(parts.last(), Some(Component::Normal(_))) {
                    parts.pop();
                } else {
                    parts.push(component);
                }
            }
            other => parts.push(other),
        }
    }
    parts.iter().collect()
}

/// `to` expressed relative to `from`, both lexically normalized.
fn relative_path(from: &Path, to: &Path) -> PathBuf {
    let from = normalize(from);
    let to = normalize(to);
    let from_parts: Vec<_> = from.components().collect();
    let to_parts: Vec<_> = to.components().collect();

    let common = from_parts
        .iter()
        .zip(to_parts.iter())
        .take_while(|(a, b)| a == b)
        .count();

    let mut result = PathBuf::new();
    for _ in common..from_parts.len() {
        result.push("..");
    }
    for part in &to_parts[common..] {
        result.push(part);
    }
    result
}
