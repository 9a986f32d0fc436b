//! Bundle assembly.
//!
//! The harness files on disk are the source of truth here: each one is read
//! back, its provenance markers and module class recovered, and the results
//! cross-linked with the component catalog into a single generated manifest
//! (`styledoc.bundle.ts`) exposing `getComponentDocs()`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use regex::Regex;

use crate::codegen::GeneratedHarness;
use crate::extract::{ComponentDoc, SourceDocs};
use crate::generator::GeneratorConfig;
use crate::markers::{self, ClassKind};
use crate::parse;
use crate::validate::GeneratorError;

pub const BUNDLE_FILE_NAME: &str = "styledoc.bundle.ts";

lazy_static! {
    static ref COMPONENT_MARKER: Regex =
        Regex::new(r"//\s*@styledoc-component\s+(\w+)").expect("valid matcher");
    static ref BOOTSTRAP_MARKER: Regex =
        Regex::new(r"//\s*@styledoc-bootstrap\s+(\w+)").expect("valid matcher");
}

/// A harness file as recovered from disk.
#[derive(Debug, Clone)]
pub struct RecoveredHarness {
    pub file_path: PathBuf,
    pub module_name: String,
    pub component_ref_name: String,
    pub bootstrap_component_name: String,
    pub has_metadata_override: bool,
}

/// Read a generated harness back: markers give the provenance, the syntax
/// tree gives the exported module class name. Files without both are skipped.
pub fn recover_harness(path: &Path) -> Result<Option<RecoveredHarness>, GeneratorError> {
    let source = fs::read_to_string(path).map_err(|e| GeneratorError::io(path.to_path_buf(), e))?;

    let component = COMPONENT_MARKER
        .captures(&source)
        .map(|caps| caps[1].to_string());
    let bootstrap = BOOTSTRAP_MARKER
        .captures(&source)
        .map(|caps| caps[1].to_string());
    let (Some(component_ref_name), Some(bootstrap_component_name)) = (component, bootstrap) else {
        tracing::warn!(file = %path.display(), "harness file missing provenance markers");
        return Ok(None);
    };

    let allocator = Allocator::default();
    let Some(program) = parse::parse_source(&allocator, &source) else {
        return Ok(None);
    };
    let mut module_name = None;
    parse::for_each_class(&program, |class, _| {
        if markers::classify_class(class) == ClassKind::Module {
            if let Some(id) = &class.id {
                module_name.get_or_insert_with(|| id.name.to_string());
            }
        }
    });
    let Some(module_name) = module_name else {
        tracing::warn!(file = %path.display(), "harness file has no module class");
        return Ok(None);
    };

    Ok(Some(RecoveredHarness {
        file_path: path.to_path_buf(),
        module_name,
        component_ref_name,
        bootstrap_component_name,
        has_metadata_override: source.contains("export function moduleMetadataOverride_"),
    }))
}

/// Assemble and write the bundle manifest. Documented components with no
/// harness are reported but do not fail the run.
pub fn write_bundle(
    docs: &SourceDocs,
    harnesses: &[GeneratedHarness],
    config: &GeneratorConfig,
) -> Result<PathBuf, GeneratorError> {
    let mut recovered = Vec::new();
    for harness in harnesses {
        if let Some(r) = recover_harness(&harness.file_path)? {
            recovered.push(r);
        }
    }

    for doc in &docs.documented {
        if !recovered.iter().any(|r| r.component_ref_name == doc.ref_name) {
            eprintln!("Could not find any tests for \"{}\".", doc.ref_name);
            tracing::warn!(component = %doc.ref_name, "documented component has no examples");
        }
    }

    let bundle_path = config.output_dir.join(BUNDLE_FILE_NAME);
    let source = bundle_source(docs, &recovered, config);
    fs::write(&bundle_path, source)
        .map_err(|e| GeneratorError::io(bundle_path.clone(), e))?;
    tracing::info!(file = %bundle_path.display(), "wrote bundle");
    Ok(bundle_path)
}

fn bundle_source(
    docs: &SourceDocs,
    harnesses: &[RecoveredHarness],
    config: &GeneratorConfig,
) -> String {
    let mut out = String::new();

    // ── 1. Import every harness module (and its example metadata) ────────
    for harness in harnesses {
        let stem = harness
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let hash = stem.trim_start_matches("harness_");
        out.push_str(&format!(
            "import {{ {module}, exampleProperties_{hash}{override_import} }} from './{stem}';\n",
            module = harness.module_name,
            override_import = if harness.has_metadata_override {
                format!(", moduleMetadataOverride_{hash}")
            } else {
                String::new()
            },
        ));
    }
    out.push('\n');

    // ── 2. Modules table: one row per module, bootstraps unioned ─────────
    let mut modules: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for harness in harnesses {
        modules
            .entry(harness.module_name.as_str())
            .or_default()
            .push(harness.bootstrap_component_name.as_str());
    }
    out.push_str("const moduleRefs = [\n");
    for (name, mut bootstraps) in modules {
        bootstraps.dedup();
        out.push_str(&format!(
            "  {{ moduleRef: {name}, bootstrapComponents: [ {} ] }},\n",
            bootstraps.join(", ")
        ));
    }
    out.push_str("];\n\n");

    // ── 3. Component-to-harness mapping and example metadata ─────────────
    out.push_str("const componentRefs = {\n");
    for harness in harnesses {
        out.push_str(&format!(
            "  {}: {},\n",
            sq_string(&harness.component_ref_name),
            harness.module_name
        ));
    }
    out.push_str("};\n\n");

    // Examples are keyed by the documented component's own module, the name
    // viewers navigate by; harnesses without a linked module fall back to
    // their own synthetic name.
    out.push_str("const examples = {\n");
    for harness in harnesses {
        let stem = harness
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let hash = stem.trim_start_matches("harness_");
        out.push_str(&format!(
            "  {}: exampleProperties_{hash},\n",
            sq_string(example_key(docs, harness))
        ));
    }
    out.push_str("};\n\n");

    out.push_str("const moduleMetadataOverrides = {\n");
    for harness in harnesses.iter().filter(|h| h.has_metadata_override) {
        let stem = harness
            .file_path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let hash = stem.trim_start_matches("harness_");
        out.push_str(&format!(
            "  '{}': moduleMetadataOverride_{hash}(),\n",
            harness.module_name
        ));
    }
    out.push_str("};\n\n");

    // ── 4. Navigation, grouped by group name ─────────────────────────────
    let mut nav: Vec<&ComponentDoc> = docs
        .documented
        .iter()
        .filter(|doc| harnesses.iter().any(|h| h.component_ref_name == doc.ref_name))
        .collect();
    // Stable sort keeps source order within a group.
    nav.sort_by(|a, b| a.group_name.cmp(&b.group_name));
    out.push_str("const navigationLinks = [\n");
    for doc in &nav {
        let group = doc.group_name.as_deref().unwrap_or_default();
        let title = doc.display_name.as_deref().unwrap_or_default();
        out.push_str(&format!(
            "  {{ groupName: {}, title: {}, path: {} }},\n",
            sq_string(group),
            sq_string(title),
            sq_string(&navigation_path(&config.url_prefix, group, title))
        ));
    }
    out.push_str("];\n\n");

    // ── 5. Component catalog ─────────────────────────────────────────────
    out.push_str("const components = {\n");
    for doc in &nav {
        out.push_str(&format!(
            "  {}: {},\n",
            sq_string(&doc.ref_name),
            catalog_entry(doc)
        ));
    }
    out.push_str("};\n\n");

    // ── 6. The factory the viewer calls ──────────────────────────────────
    out.push_str(&format!(
        "export function getComponentDocs() {{\n  return {{\n    modules: moduleRefs,\n    componentRefs: componentRefs,\n    navigationLinks: navigationLinks,\n    components: components,\n    urlPrefix: '{}',\n    examples: examples,\n    moduleMetadataOverrides: moduleMetadataOverrides\n  }};\n}}\n",
        config.url_prefix
    ));

    out
}

fn navigation_path(url_prefix: &str, group: &str, title: &str) -> String {
    let slug = format!("{}/{}", slugify(group), slugify(title));
    if url_prefix.is_empty() {
        slug
    } else {
        format!("{}/{}", url_prefix.trim_matches('/'), slug)
    }
}

fn slugify(text: &str) -> String {
    text.trim().to_lowercase().replace(' ', "-")
}

fn example_key<'a>(docs: &'a SourceDocs, harness: &'a RecoveredHarness) -> &'a str {
    docs.component(&harness.component_ref_name)
        .and_then(|doc| doc.module_ref.as_ref())
        .map(|m| m.module_ref_name.as_str())
        .unwrap_or(harness.module_name.as_str())
}

fn catalog_entry(doc: &ComponentDoc) -> String {
    let properties = api_json(doc, "property");
    let methods = api_json(doc, "method");
    format!(
        "{{\n    title: {title},\n    description: {description},\n    sourceFilePath: {path},\n    moduleName: {module},\n    api: {{ properties: {properties}, methods: {methods} }}\n  }}",
        title = sq_string(doc.display_name.as_deref().unwrap_or_default()),
        description = bt_string(doc.description.as_deref().unwrap_or_default()),
        path = sq_string(&doc.source_file_path),
        module = sq_string(
            doc.module_ref
                .as_ref()
                .map(|m| m.module_ref_name.as_str())
                .unwrap_or_default()
        ),
    )
}

fn api_json(doc: &ComponentDoc, kind: &str) -> String {
    let entries: Vec<String> = doc
        .api_surface
        .iter()
        .filter(|e| e.kind == kind)
        .map(|e| {
            serde_json::to_string(e).unwrap_or_else(|_| "{}".to_string())
        })
        .collect();
    format!("[{}]", entries.join(", "))
}

/// Backtick-quoted string with backticks and `${` neutralized.
fn bt_string(text: &str) -> String {
    format!(
        "`{}`",
        text.replace('\\', "\\\\")
            .replace('`', "\\`")
            .replace("${", "\\${")
    )
}

fn sq_string(text: &str) -> String {
    format!("'{}'", text.replace('\\', "\\\\").replace('\'', "\\'"))
}
