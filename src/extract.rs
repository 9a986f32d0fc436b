//! Component and module extraction.
//!
//! One pass over every discovered file, collecting decorated component
//! classes (with their doc tags and public API surface) and module classes
//! (with their exported member lists). A second pass links components to the
//! first module that exports them and flattens inherited API members.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use lazy_static::lazy_static;
use oxc_allocator::Allocator;
use oxc_ast::ast::{Class, ClassElement, Expression, MethodDefinitionKind, ObjectPropertyKind};
use oxc_span::GetSpan;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::markers::{self, ClassKind};
use crate::parse;
use crate::validate::GeneratorError;

/// One public class member. Getter/setter pairs collapse into a single
/// property entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiEntry {
    pub member_name: String,
    /// `"property"` or `"method"`, for the catalog's api split.
    pub kind: String,
    pub decorator_tags: Vec<String>,
    pub type_signature: String,
    pub description: String,
}

/// The module a component belongs to, by export membership.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleRef {
    pub module_ref_name: String,
    pub file_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComponentDoc {
    pub ref_name: String,
    pub selector: String,
    pub source_file_path: String,
    pub group_name: Option<String>,
    pub display_name: Option<String>,
    pub description: Option<String>,
    pub api_surface: Vec<ApiEntry>,
    pub extends_from: Vec<String>,
    /// Class source with `templateUrl`/`styleUrls` already inlined.
    pub raw_source_text: String,
    pub module_ref: Option<ModuleRef>,
}

impl ComponentDoc {
    /// Documented components carry both a group and a display name; anything
    /// less stays in the inheritance pool only.
    pub fn is_documented(&self) -> bool {
        self.group_name.is_some() && self.display_name.is_some()
    }

    /// `@Input()`-tagged member names, for template synthesis.
    pub fn input_member_names(&self) -> Vec<&str> {
        self.api_surface
            .iter()
            .filter(|entry| {
                entry
                    .decorator_tags
                    .iter()
                    .any(|tag| tag.starts_with("@Input"))
            })
            .map(|entry| entry.member_name.as_str())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleDoc {
    pub ref_name: String,
    pub file_name: String,
    pub exported_members: Vec<String>,
}

/// Everything the source pass produced, split by documentation status.
#[derive(Debug, Default)]
pub struct SourceDocs {
    pub documented: Vec<ComponentDoc>,
    pub undocumented: Vec<ComponentDoc>,
    pub modules: Vec<ModuleDoc>,
}

impl SourceDocs {
    pub fn component(&self, ref_name: &str) -> Option<&ComponentDoc> {
        self.documented
            .iter()
            .chain(self.undocumented.iter())
            .find(|doc| doc.ref_name == ref_name)
    }
}

lazy_static! {
    static ref TEMPLATE_URL: Regex =
        Regex::new(r#"templateUrl\s*:\s*['"]([^'"]+)['"]"#).expect("valid matcher");
    static ref STYLE_URLS: Regex =
        Regex::new(r"styleUrls\s*:\s*\[([^\]]*)\]").expect("valid matcher");
    static ref QUOTED_PATH: Regex =
        Regex::new(r#"['"]([^'"]+)['"]"#).expect("valid matcher");
    static ref EXPORTS_LIST: Regex =
        Regex::new(r"exports:\[([^\]]*)\]").expect("valid matcher");
}

/// Extract component and module docs from every file. Files that fail to
/// parse are skipped; missing external template or style files are fatal.
pub fn extract_docs(files: &[PathBuf]) -> Result<SourceDocs, GeneratorError> {
    let mut docs = SourceDocs::default();

    for path in files {
        let source =
            fs::read_to_string(path).map_err(|e| GeneratorError::io(path.clone(), e))?;
        extract_file(path, &source, &mut docs)?;
    }

    link_modules(&mut docs);
    Ok(docs)
}

fn extract_file(
    path: &Path,
    source: &str,
    docs: &mut SourceDocs,
) -> Result<(), GeneratorError> {
    let allocator = Allocator::default();
    let Some(program) = parse::parse_source(&allocator, source) else {
        tracing::debug!(path = %path.display(), "skipping unparsable file");
        return Ok(());
    };

    // Collect first, then do the fallible template inlining outside the
    // visitor closure.
    let mut components: Vec<(ComponentDoc, String)> = Vec::new();
    parse::for_each_class(&program, |class, lead_offset| {
        match markers::classify_class(class) {
            ClassKind::Component => {
                if let Some((doc, raw)) = component_doc(path, source, class, lead_offset) {
                    components.push((doc, raw));
                } else {
                    tracing::debug!(path = %path.display(), "skipping anonymous component class");
                }
            }
            ClassKind::Module => {
                if let Some(module) = module_doc(path, source, class, lead_offset) {
                    docs.modules.push(module);
                }
            }
            ClassKind::Plain => {
                if let Some(doc) = plain_class_doc(path, source, class) {
                    docs.undocumented.push(doc);
                }
            }
        }
    });

    let file_dir = path.parent().unwrap_or_else(|| Path::new("."));
    for (mut doc, raw) in components {
        doc.raw_source_text = inline_external_assets(&raw, file_dir)?;
        if doc.is_documented() {
            docs.documented.push(doc);
        } else {
            docs.undocumented.push(doc);
        }
    }
    Ok(())
}

fn component_doc(
    path: &Path,
    source: &str,
    class: &Class,
    lead_offset: u32,
) -> Option<(ComponentDoc, String)> {
    let ref_name = class.id.as_ref()?.name.to_string();

    let doc_text = parse::block_comment_before(source, lead_offset)
        .map(parse::strip_comment_margins)
        .unwrap_or_default();

    let selector = class
        .decorators
        .iter()
        .filter(|d| markers::decorator_name(&d.expression) == Some("Component"))
        .filter_map(|d| markers::decorator_metadata(&d.expression))
        .filter_map(|obj| object_string_property(source, obj, "selector"))
        .next()
        .unwrap_or_default();

    let raw = parse::span_text(
        source,
        oxc_span::Span::new(lead_offset.min(class.span.start), class.span.end),
    )
    .to_string();

    let doc = ComponentDoc {
        ref_name,
        selector,
        source_file_path: path.display().to_string(),
        group_name: markers::group_name(&doc_text),
        display_name: markers::display_name(&doc_text),
        description: markers::description(&doc_text),
        api_surface: api_surface(source, class),
        extends_from: superclass_names(source, class),
        raw_source_text: String::new(),
        module_ref: None,
    };
    Some((doc, raw))
}

/// Undecorated classes still join the pool so inheritance chains can resolve
/// through them.
fn plain_class_doc(path: &Path, source: &str, class: &Class) -> Option<ComponentDoc> {
    let ref_name = class.id.as_ref()?.name.to_string();
    Some(ComponentDoc {
        ref_name,
        selector: String::new(),
        source_file_path: path.display().to_string(),
        group_name: None,
        display_name: None,
        description: None,
        api_surface: api_surface(source, class),
        extends_from: superclass_names(source, class),
        raw_source_text: String::new(),
        module_ref: None,
    })
}

fn module_doc(path: &Path, source: &str, class: &Class, lead_offset: u32) -> Option<ModuleDoc> {
    let ref_name = class.id.as_ref()?.name.to_string();
    let class_text = parse::span_text(
        source,
        oxc_span::Span::new(lead_offset.min(class.span.start), class.span.end),
    );

    // Whitespace-stripped text makes the exports list match regardless of
    // formatting.
    let stripped: String = class_text.split_whitespace().collect();
    let exported_members = EXPORTS_LIST
        .captures(&stripped)
        .map(|caps| {
            caps[1]
                .split(',')
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    Some(ModuleDoc {
        ref_name,
        file_name: path.display().to_string(),
        exported_members,
    })
}

fn superclass_names(source: &str, class: &Class) -> Vec<String> {
    let Some(super_class) = &class.super_class else {
        return Vec::new();
    };
    let name = match super_class {
        Expression::Identifier(ident) => ident.name.to_string(),
        other => parse::span_text(source, other.span())
            .split('<')
            .next()
            .unwrap_or_default()
            .trim()
            .to_string(),
    };
    if name.is_empty() {
        Vec::new()
    } else {
        vec![name]
    }
}

fn api_surface(source: &str, class: &Class) -> Vec<ApiEntry> {
    let mut entries: Vec<ApiEntry> = Vec::new();

    for element in &class.body.body {
        if !parse::is_public_member(element) {
            continue;
        }
        let Some(entry) = member_entry(source, element) else {
            continue;
        };
        if let Some(existing) = entries.iter_mut().find(|e| e.member_name == entry.member_name) {
            merge_accessor(existing, entry);
        } else {
            entries.push(entry);
        }
    }
    entries
}

/// Getter/setter pairs merge into one property: descriptions concatenate,
/// decorator tags union, the first non-empty type signature wins.
fn merge_accessor(existing: &mut ApiEntry, incoming: ApiEntry) {
    if !incoming.description.is_empty() {
        if existing.description.is_empty() {
            existing.description = incoming.description;
        } else {
            existing.description.push(' ');
            existing.description.push_str(&incoming.description);
        }
    }
    for tag in incoming.decorator_tags {
        if !existing.decorator_tags.contains(&tag) {
            existing.decorator_tags.push(tag);
        }
    }
    if existing.type_signature.is_empty() {
        existing.type_signature = incoming.type_signature;
    }
}

fn member_entry(source: &str, element: &ClassElement) -> Option<ApiEntry> {
    match element {
        ClassElement::PropertyDefinition(prop) => {
            let member_name = parse::property_key_name(&prop.key)?;
            let type_signature = prop
                .type_annotation
                .as_ref()
                .map(|ta| parse::span_text(source, ta.type_annotation.span()).to_string())
                .unwrap_or_default();
            Some(ApiEntry {
                member_name,
                kind: "property".to_string(),
                decorator_tags: decorator_tags(source, &prop.decorators),
                type_signature,
                description: member_description(source, prop.span.start, &prop.decorators),
            })
        }
        ClassElement::MethodDefinition(method) => {
            let member_name = parse::property_key_name(&method.key)?;
            let description =
                member_description(source, method.span.start, &method.decorators);
            let tags = decorator_tags(source, &method.decorators);
            match method.kind {
                MethodDefinitionKind::Constructor => None,
                MethodDefinitionKind::Get => Some(ApiEntry {
                    member_name,
                    kind: "property".to_string(),
                    decorator_tags: tags,
                    type_signature: method
                        .value
                        .return_type
                        .as_ref()
                        .map(|rt| parse::span_text(source, rt.type_annotation.span()).to_string())
                        .unwrap_or_default(),
                    description,
                }),
                MethodDefinitionKind::Set => Some(ApiEntry {
                    member_name,
                    kind: "property".to_string(),
                    decorator_tags: tags,
                    type_signature: setter_param_type(source, method),
                    description,
                }),
                MethodDefinitionKind::Method => {
                    let params = parse::span_text(source, method.value.params.span);
                    let returns = method
                        .value
                        .return_type
                        .as_ref()
                        .map(|rt| parse::span_text(source, rt.type_annotation.span()))
                        .unwrap_or("void");
                    Some(ApiEntry {
                        member_name,
                        kind: "method".to_string(),
                        decorator_tags: tags,
                        type_signature: format!("{params} => {returns}"),
                        description,
                    })
                }
            }
        }
        _ => None,
    }
}

fn setter_param_type(source: &str, method: &oxc_ast::ast::MethodDefinition) -> String {
    method
        .value
        .params
        .items
        .first()
        .and_then(|param| param.type_annotation.as_ref())
        .map(|ta| parse::span_text(source, ta.type_annotation.span()).to_string())
        .unwrap_or_default()
}

fn decorator_tags(source: &str, decorators: &[oxc_ast::ast::Decorator]) -> Vec<String> {
    decorators
        .iter()
        .map(|d| {
            let text = parse::span_text(source, d.span).trim().to_string();
            if text.starts_with('@') {
                text
            } else {
                format!("@{text}")
            }
        })
        .collect()
}

fn member_description(
    source: &str,
    member_start: u32,
    decorators: &[oxc_ast::ast::Decorator],
) -> String {
    let lead = decorators
        .iter()
        .map(|d| d.span.start)
        .min()
        .map_or(member_start, |s| s.min(member_start));
    parse::block_comment_before(source, lead)
        .filter(|c| c.starts_with("/**"))
        .map(parse::strip_comment_margins)
        .unwrap_or_default()
}

fn object_string_property(
    source: &str,
    obj: &oxc_ast::ast::ObjectExpression,
    name: &str,
) -> Option<String> {
    for property in &obj.properties {
        if let ObjectPropertyKind::ObjectProperty(prop) = property {
            if parse::property_key_name(&prop.key).as_deref() == Some(name) {
                return parse::string_literal_value(source, &prop.value);
            }
        }
    }
    None
}

/// Replace `templateUrl`/`styleUrls` metadata with the inlined file contents.
/// A referenced file that cannot be read is fatal.
pub fn inline_external_assets(
    class_text: &str,
    file_dir: &Path,
) -> Result<String, GeneratorError> {
    let mut result = class_text.to_string();

    if let Some(caps) = TEMPLATE_URL.captures(&result) {
        let url = caps[1].to_string();
        let full = caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let template = read_asset(file_dir, &url)?;
        result = result.replace(&full, &format!("template: `{}`", escape_backticks(&template)));
    }

    if let Some(caps) = STYLE_URLS.captures(&result) {
        let full = caps
            .get(0)
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        let mut styles = Vec::new();
        for path_match in QUOTED_PATH.captures_iter(&caps[1]) {
            let contents = read_asset(file_dir, &path_match[1])?;
            styles.push(format!("`{}`", escape_backticks(&contents)));
        }
        result = result.replace(&full, &format!("styles: [{}]", styles.join(", ")));
    }

    Ok(result)
}

fn read_asset(file_dir: &Path, relative: &str) -> Result<String, GeneratorError> {
    let path = file_dir.join(relative);
    fs::read_to_string(&path).map_err(|e| GeneratorError::io(path, e))
}

fn escape_backticks(text: &str) -> String {
    text.replace('`', "\\`")
}

/// Link each component to the first module whose exports include it.
fn link_modules(docs: &mut SourceDocs) {
    for doc in docs
        .documented
        .iter_mut()
        .chain(docs.undocumented.iter_mut())
    {
        doc.module_ref = docs.modules.iter().find_map(|module| {
            module
                .exported_members
                .iter()
                .any(|m| *m == doc.ref_name)
                .then(|| ModuleRef {
                    module_ref_name: module.ref_name.clone(),
                    file_name: module.file_name.clone(),
                })
        });
    }
}

/// Flatten inherited API members onto every documented component: own members
/// first, then the direct parent's flattened surface, then its parent's, with
/// subclass members shadowing same-named base members. Safe to run twice.
pub fn resolve_inheritance(docs: &mut SourceDocs) {
    let pool: HashMap<String, (Vec<ApiEntry>, Vec<String>)> = docs
        .documented
        .iter()
        .chain(docs.undocumented.iter())
        .map(|doc| {
            (
                doc.ref_name.clone(),
                (doc.api_surface.clone(), doc.extends_from.clone()),
            )
        })
        .collect();

    for doc in docs
        .documented
        .iter_mut()
        .chain(docs.undocumented.iter_mut())
    {
        let mut visited: Vec<String> = vec![doc.ref_name.clone()];
        let mut pending: Vec<String> = doc.extends_from.clone();

        while let Some(parent_name) = pending.first().cloned() {
            pending.remove(0);
            if visited.contains(&parent_name) {
                // Inheritance cycle; stop following this chain.
                continue;
            }
            visited.push(parent_name.clone());

            let Some((parent_entries, parent_extends)) = pool.get(&parent_name) else {
                continue;
            };
            for entry in parent_entries {
                if !doc
                    .api_surface
                    .iter()
                    .any(|e| e.member_name == entry.member_name)
                {
                    doc.api_surface.push(entry.clone());
                }
            }
            // Direct parent's own parents come after any remaining siblings.
            pending.extend(parent_extends.iter().cloned());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn docs_from(source: &str) -> SourceDocs {
        let mut docs = SourceDocs::default();
        extract_file(Path::new("src/button.component.ts"), source, &mut docs).unwrap();
        link_modules(&mut docs);
        docs
    }

    #[test]
    fn documented_component_carries_tags_and_selector() {
        let docs = docs_from(
            r#"
            /**
             * @group Buttons
             * @component Primary Button
             * @description A clickable thing.
             */
            @Component({ selector: 'x-button', template: '<button></button>' })
            export class ButtonComponent {
                @Input() label: string;
            }
            "#,
        );
        assert_eq!(docs.documented.len(), 1);
        let doc = &docs.documented[0];
        assert_eq!(doc.ref_name, "ButtonComponent");
        assert_eq!(doc.selector, "x-button");
        assert_eq!(doc.group_name.as_deref(), Some("Buttons"));
        assert_eq!(doc.display_name.as_deref(), Some("Primary Button"));
        assert_eq!(doc.description.as_deref(), Some("A clickable thing."));
        assert!(doc.raw_source_text.contains("@Component"));
    }

    #[test]
    fn component_without_group_is_undocumented() {
        let docs = docs_from(
            r#"
            @Component({ selector: 'x-plain' })
            export class PlainComponent {}
            "#,
        );
        assert!(docs.documented.is_empty());
        assert_eq!(docs.undocumented.len(), 1);
    }

    #[test]
    fn api_surface_excludes_private_static_and_constructor() {
        let docs = docs_from(
            r#"
            @Component({ selector: 'x-a' })
            export class A {
                /** Visible label. */
                @Input() label: string;
                private secret: number;
                protected shade: number;
                static shared: boolean;
                constructor(private svc: Thing) {}
                /** Does a thing. */
                run(count: number): boolean { return true; }
            }
            "#,
        );
        let doc = &docs.undocumented[0];
        let names: Vec<&str> = doc.api_surface.iter().map(|e| e.member_name.as_str()).collect();
        assert_eq!(names, vec!["label", "run"]);

        let label = &doc.api_surface[0];
        assert_eq!(label.kind, "property");
        assert_eq!(label.type_signature, "string");
        assert_eq!(label.decorator_tags, vec!["@Input()"]);
        assert_eq!(label.description, "Visible label.");

        let run = &doc.api_surface[1];
        assert_eq!(run.kind, "method");
        assert_eq!(run.type_signature, "(count: number) => boolean");
        assert_eq!(run.description, "Does a thing.");
    }

    #[test]
    fn getter_setter_pair_merges_into_one_property() {
        let docs = docs_from(
            r#"
            @Component({ selector: 'x-a' })
            export class A {
                /** Read side. */
                get value(): string { return this._v; }
                /** Write side. */
                @Input() set value(v: string) { this._v = v; }
            }
            "#,
        );
        let doc = &docs.undocumented[0];
        assert_eq!(doc.api_surface.len(), 1);
        let entry = &doc.api_surface[0];
        assert_eq!(entry.member_name, "value");
        assert_eq!(entry.kind, "property");
        assert_eq!(entry.type_signature, "string");
        assert_eq!(entry.description, "Read side. Write side.");
        assert_eq!(entry.decorator_tags, vec!["@Input()"]);
    }

    #[test]
    fn module_exports_link_components() {
        let docs = docs_from(
            r#"
            @Component({ selector: 'x-a' })
            export class AComponent {}

            @NgModule({
                declarations: [ AComponent ],
                exports: [
                    AComponent
                ]
            })
            export class AModule {}
            "#,
        );
        assert_eq!(docs.modules.len(), 1);
        assert_eq!(docs.modules[0].exported_members, vec!["AComponent"]);
        let doc = docs.component("AComponent").unwrap();
        assert_eq!(
            doc.module_ref.as_ref().map(|m| m.module_ref_name.as_str()),
            Some("AModule")
        );
    }

    #[test]
    fn inheritance_flattens_direct_parent_first() {
        let mut docs = docs_from(
            r#"
            export class Base {
                shared: number;
                label: string;
            }

            export class Mid extends Base {
                middle: boolean;
            }

            /**
             * @group G
             * @component C
             */
            @Component({ selector: 'x-c' })
            export class C extends Mid {
                label: string;
            }
            "#,
        );
        resolve_inheritance(&mut docs);
        let doc = &docs.documented[0];
        let names: Vec<&str> = doc.api_surface.iter().map(|e| e.member_name.as_str()).collect();
        // Own member shadows the base `label`; parent chain follows in order.
        assert_eq!(names, vec!["label", "middle", "shared"]);

        // Idempotent: flattening again adds nothing.
        let before = doc.api_surface.len();
        resolve_inheritance(&mut docs);
        assert_eq!(docs.documented[0].api_surface.len(), before);
    }

    #[test]
    fn inheritance_cycle_terminates() {
        let mut docs = docs_from(
            r#"
            /**
             * @group G
             * @component A
             */
            @Component({ selector: 'x-a' })
            export class A extends B { own: string; }

            export class B extends A { other: string; }
            "#,
        );
        resolve_inheritance(&mut docs);
        let names: Vec<&str> = docs.documented[0]
            .api_surface
            .iter()
            .map(|e| e.member_name.as_str())
            .collect();
        assert_eq!(names, vec!["own", "other"]);
    }

    #[test]
    fn template_url_inlines_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("button.html"), "<button>Go</button>").unwrap();
        let inlined = inline_external_assets(
            "@Component({ selector: 'x-b', templateUrl: './button.html' })\nclass B {}",
            dir.path(),
        )
        .unwrap();
        assert!(inlined.contains("template: `<button>Go</button>`"));
        assert!(!inlined.contains("templateUrl"));
    }

    #[test]
    fn style_urls_inline_each_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.css"), ".a {}").unwrap();
        fs::write(dir.path().join("b.css"), ".b {}").unwrap();
        let inlined = inline_external_assets(
            "@Component({ styleUrls: ['./a.css', './b.css'] })\nclass B {}",
            dir.path(),
        )
        .unwrap();
        assert!(inlined.contains("styles: [`.a {}`, `.b {}`]"));
    }

    #[test]
    fn missing_template_file_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let err = inline_external_assets(
            "@Component({ templateUrl: './missing.html' })\nclass B {}",
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(err, GeneratorError::Io { .. }));
    }
}
