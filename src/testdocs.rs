//! Test-file extraction.
//!
//! Each annotated test file becomes one `TestDoc`: the component under
//! documentation, the bootstrap (host) component, the testing-module setup,
//! inline declarations, and every `@uijarexample`-marked test body. A single
//! accumulator threads through the recursive statement walk; nothing is
//! resolved until the whole file has been seen, because markers and the
//! declarations they refer to arrive in any order.

use std::fs;
use std::path::PathBuf;

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Argument, AssignmentTarget, CallExpression, Declaration, Expression,
    ExportDefaultDeclarationKind, ObjectPropertyKind, Statement,
};
use oxc_span::GetSpan;
use serde::{Deserialize, Serialize};

use crate::extract::SourceDocs;
use crate::markers::{self, ClassKind};
use crate::parse;
use crate::validate::{self, GeneratorError};

/// One property assignment on the bootstrap component instance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PropertyAssignment {
    /// Member path without the leading variable, e.g. `items[0].label`.
    pub target_path: String,
    pub expression: String,
}

/// A mocked backend expectation captured from the example body.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HttpMock {
    pub request_var_name: String,
    pub url: String,
    pub expression: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleDoc {
    pub title: String,
    pub property_assignments: Vec<PropertyAssignment>,
    pub http_mocks: Vec<HttpMock>,
    /// Example body text, shown verbatim in the style guide.
    pub generated_source_code: String,
    /// Render template: the bootstrap component's own, or one synthesized
    /// from the target selector and its `@Input` members.
    pub template: String,
}

#[derive(Debug, Clone)]
pub struct ImportStatement {
    pub raw_text: String,
    pub module_path_literal: String,
}

#[derive(Debug, Clone)]
pub struct InlineComponent {
    pub ref_name: String,
    pub source_text: String,
    pub template: Option<String>,
}

#[derive(Debug, Clone)]
pub struct InlineFunction {
    pub name: String,
    pub source_text: String,
}

#[derive(Debug, Clone, Default)]
pub struct ModuleSetup {
    pub imports: Vec<String>,
    pub declarations: Vec<String>,
    pub providers: Vec<String>,
    pub schemas: Vec<String>,
    pub entry_components: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct TestDoc {
    pub file_path: String,
    pub target_component_name: String,
    pub bootstrap_component_name: String,
    pub module_setup: ModuleSetup,
    pub import_statements: Vec<ImportStatement>,
    pub inline_component_declarations: Vec<InlineComponent>,
    pub inline_function_declarations: Vec<InlineFunction>,
    pub examples: Vec<ExampleDoc>,
}

impl TestDoc {
    /// Whether any example body touches the mocked-backend controller.
    pub fn uses_http_mocks(&self) -> bool {
        self.examples.iter().any(|e| !e.http_mocks.is_empty())
    }
}

/// Accumulator for one file's walk. Raw captures only; resolution happens in
/// `finish`.
#[derive(Default)]
struct TraversalContext {
    target_component: Option<String>,
    bootstrap_component: Option<String>,
    /// `(variable name, annotated type)` for every typed variable seen.
    typed_vars: Vec<(String, String)>,
    imports: Vec<ImportStatement>,
    inline_components: Vec<InlineComponent>,
    inline_functions: Vec<InlineFunction>,
    module_setup: ModuleSetup,
    raw_examples: Vec<RawExample>,
}

struct RawExample {
    title: String,
    /// Every top-level assignment in the example body, attributed later.
    candidates: Vec<CandidateAssignment>,
    http_mocks: Vec<HttpMock>,
    body_text: String,
}

struct CandidateAssignment {
    root: String,
    target_path: String,
    expression: String,
}

/// Extract a `TestDoc` from every annotated file. Component docs are needed
/// to locate bootstrap templates and synthesize missing ones. Unresolvable
/// bootstrap components abort the run.
pub fn extract_test_docs(
    files: &[PathBuf],
    docs: &SourceDocs,
) -> Result<Vec<TestDoc>, GeneratorError> {
    let mut tests = Vec::new();
    for path in files {
        let source =
            fs::read_to_string(path).map_err(|e| GeneratorError::io(path.clone(), e))?;
        if let Some(test) = extract_test_file(&path.display().to_string(), &source, docs) {
            tests.push(test);
        }
    }
    validate::check_bootstrap_targets(&tests, docs)?;
    Ok(tests)
}

fn extract_test_file(file_path: &str, source: &str, docs: &SourceDocs) -> Option<TestDoc> {
    let allocator = Allocator::default();
    let program = parse::parse_source(&allocator, source)?;

    let mut ctx = TraversalContext::default();
    walk_statements(&program.body, source, &mut ctx);
    finish(file_path, ctx, docs)
}

fn finish(file_path: &str, ctx: TraversalContext, docs: &SourceDocs) -> Option<TestDoc> {
    let target_component_name = match ctx.target_component {
        Some(name) => name,
        None => {
            tracing::debug!(file = %file_path, "no target marker, skipping test file");
            return None;
        }
    };
    // Without an explicit host, the target bootstraps itself.
    let bootstrap_component_name = ctx
        .bootstrap_component
        .unwrap_or_else(|| target_component_name.clone());

    // The example variable is whichever one was declared with the bootstrap
    // component's type.
    let bootstrap_var = ctx
        .typed_vars
        .iter()
        .find(|(_, ty)| *ty == bootstrap_component_name)
        .map(|(name, _)| name.clone());

    let examples: Vec<ExampleDoc> = ctx
        .raw_examples
        .into_iter()
        .map(|raw| {
            let property_assignments: Vec<PropertyAssignment> = raw
                .candidates
                .into_iter()
                .filter(|c| Some(&c.root) == bootstrap_var.as_ref())
                .map(|c| PropertyAssignment {
                    target_path: c.target_path,
                    expression: c.expression,
                })
                .collect();
            let template = example_template(
                &target_component_name,
                &bootstrap_component_name,
                &ctx.inline_components,
                &property_assignments,
                docs,
            );
            ExampleDoc {
                title: raw.title,
                property_assignments,
                http_mocks: raw.http_mocks,
                generated_source_code: raw.body_text,
                template,
            }
        })
        .collect();

    let inline_functions = retained_functions(ctx.inline_functions, &examples);

    Some(TestDoc {
        file_path: file_path.to_string(),
        target_component_name,
        bootstrap_component_name,
        module_setup: ctx.module_setup,
        import_statements: ctx.imports,
        inline_component_declarations: ctx.inline_components,
        inline_function_declarations: inline_functions,
        examples,
    })
}

/// Bootstrap's own template wins; otherwise synthesize an element for the
/// target's selector, binding each `@Input` member the example actually
/// assigns, in API-declaration order.
fn example_template(
    target: &str,
    bootstrap: &str,
    inline_components: &[InlineComponent],
    assignments: &[PropertyAssignment],
    docs: &SourceDocs,
) -> String {
    if let Some(inline) = inline_components.iter().find(|c| c.ref_name == bootstrap) {
        if let Some(template) = &inline.template {
            return template.clone();
        }
    }
    if let Some(doc) = docs.component(bootstrap) {
        if bootstrap != target {
            // Host components render the target themselves; their inlined
            // source carries the template, nothing to synthesize.
            if let Some(template) = template_from_source(&doc.raw_source_text) {
                return template;
            }
        }
    }
    let Some(doc) = docs.component(target) else {
        return String::new();
    };
    if doc.selector.is_empty() {
        return String::new();
    }
    let assigned: Vec<&str> = assignments
        .iter()
        .map(|p| assignment_root_member(&p.target_path))
        .collect();
    let bindings: String = doc
        .input_member_names()
        .iter()
        .filter(|name| assigned.contains(name))
        .map(|name| format!(" [{name}]=\"{name}\""))
        .collect();
    format!("<{selector}{bindings}></{selector}>", selector = doc.selector)
}

/// First member segment of an assignment path: `config.label` and
/// `items[0].label` both resolve to their leading member.
fn assignment_root_member(target_path: &str) -> &str {
    let end = target_path
        .find(|c: char| c == '.' || c == '[')
        .unwrap_or(target_path.len());
    &target_path[..end]
}

fn template_from_source(class_text: &str) -> Option<String> {
    lazy_static::lazy_static! {
        static ref TEMPLATE_PROP: regex::Regex =
            regex::Regex::new(r#"(?s)template\s*:\s*(?:`([^`]*)`|'([^']*)'|"([^"]*)")"#)
                .expect("valid matcher");
    }
    let caps = TEMPLATE_PROP.captures(class_text)?;
    (1..=3)
        .filter_map(|i| caps.get(i))
        .next()
        .map(|m| m.as_str().to_string())
}

/// An inline function survives only when some example body references it by a
/// call-shaped occurrence of its name.
fn retained_functions(
    functions: Vec<InlineFunction>,
    examples: &[ExampleDoc],
) -> Vec<InlineFunction> {
    functions
        .into_iter()
        .filter(|f| is_function_referenced(&f.name, examples))
        .collect()
}

fn is_function_referenced(name: &str, examples: &[ExampleDoc]) -> bool {
    let needle = format!("{name}(");
    examples.iter().any(|example| {
        example.generated_source_code.contains(&needle)
            || example
                .property_assignments
                .iter()
                .any(|p| p.expression.contains(&needle))
    })
}

fn walk_statements(statements: &[Statement], source: &str, ctx: &mut TraversalContext) {
    for stmt in statements {
        match stmt {
            Statement::ImportDeclaration(import) => {
                ctx.imports.push(ImportStatement {
                    raw_text: parse::span_text(source, import.span).to_string(),
                    module_path_literal: import.source.value.to_string(),
                });
            }
            Statement::VariableDeclaration(decl) => {
                collect_markers(source, decl.span.start, ctx);
                for declarator in &decl.declarations {
                    if let oxc_ast::ast::BindingPattern::BindingIdentifier(ident) =
                        &declarator.id
                    {
                        if let Some(ta) = &declarator.type_annotation {
                            ctx.typed_vars.push((
                                ident.name.to_string(),
                                parse::span_text(source, ta.type_annotation.span())
                                    .trim()
                                    .to_string(),
                            ));
                        }
                    }
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    ctx.inline_functions.push(InlineFunction {
                        name: id.name.to_string(),
                        source_text: parse::span_text(source, func.span).to_string(),
                    });
                }
            }
            Statement::ClassDeclaration(class) => {
                collect_inline_class(source, class, class.span.start, ctx);
            }
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::ClassDeclaration(class)) => {
                    collect_inline_class(source, class, export.span.start, ctx);
                }
                Some(Declaration::FunctionDeclaration(func)) => {
                    if let Some(id) = &func.id {
                        ctx.inline_functions.push(InlineFunction {
                            name: id.name.to_string(),
                            source_text: parse::span_text(source, export.span).to_string(),
                        });
                    }
                }
                _ => {}
            },
            Statement::ExportDefaultDeclaration(export) => {
                if let ExportDefaultDeclarationKind::ClassDeclaration(class) = &export.declaration
                {
                    collect_inline_class(source, class, export.span.start, ctx);
                }
            }
            Statement::ExpressionStatement(expr_stmt) => {
                collect_markers(source, expr_stmt.span.start, ctx);
                if let Expression::CallExpression(call) = &expr_stmt.expression {
                    visit_call(call, source, expr_stmt.span.start, ctx);
                }
            }
            _ => {}
        }
    }
}

fn collect_markers(source: &str, offset: u32, ctx: &mut TraversalContext) {
    let Some(text) = parse::block_comment_before(source, offset).map(parse::strip_comment_margins)
    else {
        return;
    };
    if let Some(name) = markers::target_component(&text) {
        // First occurrence fixes the target.
        ctx.target_component.get_or_insert(name);
    }
    if let Some(name) = markers::bootstrap_component(&text) {
        // Last occurrence wins.
        ctx.bootstrap_component = Some(name);
    }
}

fn collect_inline_class(
    source: &str,
    class: &oxc_ast::ast::Class,
    stmt_start: u32,
    ctx: &mut TraversalContext,
) {
    if markers::classify_class(class) != ClassKind::Component {
        return;
    }
    let Some(id) = &class.id else {
        return;
    };
    let lead = class
        .decorators
        .iter()
        .map(|d| d.span.start)
        .min()
        .map_or(stmt_start, |s| s.min(stmt_start));
    let template = class
        .decorators
        .iter()
        .filter_map(|d| markers::decorator_metadata(&d.expression))
        .flat_map(|obj| obj.properties.iter())
        .find_map(|prop| match prop {
            ObjectPropertyKind::ObjectProperty(p)
                if parse::property_key_name(&p.key).as_deref() == Some("template") =>
            {
                parse::string_literal_value(source, &p.value)
            }
            _ => None,
        });
    ctx.inline_components.push(InlineComponent {
        ref_name: id.name.to_string(),
        source_text: parse::span_text(
            source,
            oxc_span::Span::new(lead.min(class.span.start), class.span.end),
        )
        .to_string(),
        template,
    });
}

fn visit_call(call: &CallExpression, source: &str, stmt_start: u32, ctx: &mut TraversalContext) {
    if is_member_call(call, "configureTestingModule") {
        if let Some(Expression::ObjectExpression(obj)) =
            call.arguments.first().and_then(Argument::as_expression)
        {
            collect_module_setup(source, obj, ctx);
        }
    }

    let example_title = parse::block_comment_before(source, stmt_start)
        .map(parse::strip_comment_margins)
        .and_then(|text| markers::example_title(&text));

    for arg in &call.arguments {
        let Some(expr) = arg.as_expression() else {
            continue;
        };
        if let Some(body) = parse::function_body_statements(expr) {
            if let Some(title) = &example_title {
                ctx.raw_examples
                    .push(collect_example(title, body, expr, source));
            } else {
                walk_statements(body, source, ctx);
            }
        }
    }
}

fn is_member_call(call: &CallExpression, method: &str) -> bool {
    matches!(
        &call.callee,
        Expression::StaticMemberExpression(member) if member.property.name == method
    )
}

/// One example body: every top-level assignment becomes a candidate, mocked
/// request expectations are captured, and the body text is kept verbatim.
fn collect_example(
    title: &str,
    body: &[Statement],
    body_fn: &Expression,
    source: &str,
) -> RawExample {
    let mut candidates = Vec::new();
    let mut http_mocks = Vec::new();

    for stmt in body {
        match stmt {
            Statement::ExpressionStatement(expr_stmt) => {
                if let Expression::AssignmentExpression(assign) = &expr_stmt.expression {
                    if let Some((root, target_path)) =
                        assignment_target_path(&assign.left, source)
                    {
                        candidates.push(CandidateAssignment {
                            root,
                            target_path,
                            expression: parse::span_text(source, assign.right.span())
                                .to_string(),
                        });
                    }
                }
            }
            Statement::VariableDeclaration(decl) => {
                for declarator in &decl.declarations {
                    if let Some(mock) = http_mock(declarator, source) {
                        http_mocks.push(mock);
                    }
                }
            }
            _ => {}
        }
    }

    RawExample {
        title: title.to_string(),
        candidates,
        http_mocks,
        body_text: function_body_text(body_fn, source),
    }
}

/// `(root variable, member path)` of an assignment target:
/// `comp.items[0].label = x` yields `("comp", "items[0].label")`.
fn assignment_target_path(target: &AssignmentTarget, source: &str) -> Option<(String, String)> {
    let (root, full_text) = match target {
        AssignmentTarget::AssignmentTargetIdentifier(ident) => {
            (ident.name.to_string(), ident.name.to_string())
        }
        AssignmentTarget::StaticMemberExpression(member) => (
            parse::root_identifier(&member.object)?.to_string(),
            parse::span_text(source, member.span).to_string(),
        ),
        AssignmentTarget::ComputedMemberExpression(member) => (
            parse::root_identifier(&member.object)?.to_string(),
            parse::span_text(source, member.span).to_string(),
        ),
        _ => return None,
    };
    let path = full_text
        .strip_prefix(&root)
        .map(|rest| rest.trim_start_matches('.').to_string())
        .unwrap_or(full_text.clone());
    Some((root, if path.is_empty() { full_text } else { path }))
}

/// `const req = httpMock.expectOne('/api/items');` becomes an `HttpMock`.
fn http_mock(
    declarator: &oxc_ast::ast::VariableDeclarator,
    source: &str,
) -> Option<HttpMock> {
    let init = declarator.init.as_ref()?;
    let Expression::CallExpression(call) = init else {
        return None;
    };
    if !is_member_call(call, "expectOne") {
        return None;
    }
    let oxc_ast::ast::BindingPattern::BindingIdentifier(ident) = &declarator.id else {
        return None;
    };
    let url = call
        .arguments
        .first()
        .and_then(Argument::as_expression)
        .and_then(|e| parse::string_literal_value(source, e))
        .unwrap_or_default();
    Some(HttpMock {
        request_var_name: ident.name.to_string(),
        url,
        expression: parse::span_text(source, declarator.span).to_string(),
    })
}

/// Example body without its enclosing braces, trimmed line by line.
fn function_body_text(body_fn: &Expression, source: &str) -> String {
    let span = match body_fn {
        Expression::ArrowFunctionExpression(arrow) => arrow.body.span,
        Expression::FunctionExpression(func) => match &func.body {
            Some(body) => body.span,
            None => return String::new(),
        },
        _ => return String::new(),
    };
    let raw = parse::span_text(source, span).trim();
    let inner = raw
        .strip_prefix('{')
        .and_then(|s| s.strip_suffix('}'))
        .unwrap_or(raw);
    dedent(inner)
}

fn dedent(text: &str) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let margin = lines
        .iter()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.len() - l.trim_start().len())
        .min()
        .unwrap_or(0);
    lines
        .iter()
        .map(|l| if l.len() >= margin { &l[margin..] } else { l.trim_start() })
        .collect::<Vec<_>>()
        .join("\n")
        .trim_matches('\n')
        .to_string()
}

fn collect_module_setup(
    source: &str,
    obj: &oxc_ast::ast::ObjectExpression,
    ctx: &mut TraversalContext,
) {
    for property in &obj.properties {
        let ObjectPropertyKind::ObjectProperty(prop) = property else {
            continue;
        };
        let Some(key) = parse::property_key_name(&prop.key) else {
            continue;
        };
        let Expression::ArrayExpression(array) = &prop.value else {
            continue;
        };
        let entries: Vec<String> = array
            .elements
            .iter()
            .filter_map(|el| el.as_expression())
            .map(|e| parse::span_text(source, e.span()).trim().to_string())
            .collect();
        let bucket = match key.as_str() {
            "imports" => &mut ctx.module_setup.imports,
            "declarations" => &mut ctx.module_setup.declarations,
            "providers" => &mut ctx.module_setup.providers,
            "schemas" => &mut ctx.module_setup.schemas,
            "entryComponents" => &mut ctx.module_setup.entry_components,
            _ => continue,
        };
        // Repeats are preserved as written.
        bucket.extend(entries);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract;
    use pretty_assertions::assert_eq;

    fn docs_for(source: &str) -> SourceDocs {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("button.component.ts");
        std::fs::write(&file, source).unwrap();
        extract::extract_docs(&[file]).unwrap()
    }

    const BUTTON_SOURCE: &str = r#"
        /**
         * @group Buttons
         * @component Button
         */
        @Component({ selector: 'x-button', template: '<button></button>' })
        export class ButtonComponent {
            @Input() label: string;
            @Input() disabled: boolean;
        }

        @NgModule({ declarations: [ButtonComponent], exports: [ButtonComponent] })
        export class ButtonModule {}
    "#;

    const SPEC_SOURCE: &str = r#"
        import { ButtonComponent, ButtonModule } from './button.component';

        describe('ButtonComponent', () => {
            /** @uijar ButtonComponent */
            const moduleDef = { imports: [ButtonModule] };
            let comp: ButtonComponent;

            beforeEach(() => {
                TestBed.configureTestingModule({
                    imports: [ ButtonModule ],
                    declarations: [],
                    providers: [ { provide: Thing, useValue: {} } ]
                });
            });

            /** @uijarexample Primary button */
            it('renders', () => {
                comp.label = "Save";
                comp.disabled = false;
                expect(comp).toBeTruthy();
            });
        });
    "#;

    fn button_test_doc() -> TestDoc {
        let docs = docs_for(BUTTON_SOURCE);
        extract_test_file("src/button.component.spec.ts", SPEC_SOURCE, &docs).unwrap()
    }

    #[test]
    fn target_and_bootstrap_default_together() {
        let test = button_test_doc();
        assert_eq!(test.target_component_name, "ButtonComponent");
        assert_eq!(test.bootstrap_component_name, "ButtonComponent");
    }

    #[test]
    fn module_setup_buckets_fill_from_testbed_call() {
        let test = button_test_doc();
        assert_eq!(test.module_setup.imports, vec!["ButtonModule"]);
        assert!(test.module_setup.declarations.is_empty());
        assert_eq!(test.module_setup.providers.len(), 1);
        assert!(test.module_setup.providers[0].contains("provide: Thing"));
    }

    #[test]
    fn example_captures_attributed_assignments() {
        let test = button_test_doc();
        assert_eq!(test.examples.len(), 1);
        let example = &test.examples[0];
        assert_eq!(example.title, "Primary button");
        assert_eq!(example.property_assignments.len(), 2);
        assert_eq!(example.property_assignments[0].target_path, "label");
        assert_eq!(example.property_assignments[0].expression, "\"Save\"");
        assert_eq!(example.property_assignments[1].target_path, "disabled");
        assert_eq!(example.property_assignments[1].expression, "false");
        assert!(example.generated_source_code.contains("comp.label = \"Save\";"));
    }

    #[test]
    fn template_synthesized_from_selector_and_inputs() {
        let test = button_test_doc();
        assert_eq!(
            test.examples[0].template,
            "<x-button [label]=\"label\" [disabled]=\"disabled\"></x-button>"
        );
    }

    #[test]
    fn import_statements_keep_raw_text() {
        let test = button_test_doc();
        assert_eq!(test.import_statements.len(), 1);
        assert_eq!(
            test.import_statements[0].module_path_literal,
            "./button.component"
        );
        assert!(test.import_statements[0].raw_text.starts_with("import"));
    }

    #[test]
    fn host_component_marker_wins_and_inline_template_used() {
        let spec = r#"
            describe('ListComponent', () => {
                /**
                 * @uijar ListComponent
                 * @hostcomponent ListHostComponent
                 */
                const moduleDef = {};
                let host: ListHostComponent;

                @Component({ selector: 'x-host', template: '<x-list [items]="items"></x-list>' })
                class ListHostComponent {
                    items = [];
                }

                /** @uijarexample With items */
                it('renders items', () => {
                    host.items = [1, 2, 3];
                });
            });
        "#;
        let docs = SourceDocs::default();
        let test = extract_test_file("src/list.component.spec.ts", spec, &docs).unwrap();
        assert_eq!(test.bootstrap_component_name, "ListHostComponent");
        assert_eq!(test.inline_component_declarations.len(), 1);
        assert_eq!(
            test.examples[0].template,
            "<x-list [items]=\"items\"></x-list>"
        );
        assert_eq!(test.examples[0].property_assignments.len(), 1);
        assert_eq!(test.examples[0].property_assignments[0].target_path, "items");
    }

    #[test]
    fn http_mocks_captured_from_expect_one() {
        let spec = r#"
            describe('FeedComponent', () => {
                /** @uijar FeedComponent */
                const moduleDef = {};
                let comp: FeedComponent;

                /** @uijarexample Loads the feed */
                it('loads', () => {
                    comp.refresh();
                    const request = httpMock.expectOne('/api/feed');
                    request.flush([]);
                });
            });
        "#;
        let docs = SourceDocs::default();
        let test = extract_test_file("src/feed.component.spec.ts", spec, &docs).unwrap();
        assert!(test.uses_http_mocks());
        let mock = &test.examples[0].http_mocks[0];
        assert_eq!(mock.request_var_name, "request");
        assert_eq!(mock.url, "/api/feed");
        assert!(mock.expression.contains("expectOne"));
    }

    #[test]
    fn unreferenced_inline_function_is_dropped() {
        let spec = r#"
            describe('A', () => {
                /** @uijar AComponent */
                const moduleDef = {};
                let comp: AComponent;

                function makeItems() { return [1]; }
                function unusedHelper() { return 0; }

                /** @uijarexample Uses helper */
                it('works', () => {
                    comp.items = makeItems();
                });
            });
        "#;
        let docs = SourceDocs::default();
        let test = extract_test_file("src/a.component.spec.ts", spec, &docs).unwrap();
        let names: Vec<&str> = test
            .inline_function_declarations
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(names, vec!["makeItems"]);
    }

    #[test]
    fn assignments_to_other_variables_are_ignored() {
        let spec = r#"
            describe('A', () => {
                /** @uijar AComponent */
                const moduleDef = {};
                let comp: AComponent;
                let fixture: ComponentFixture<AComponent>;

                /** @uijarexample Mixed statements */
                it('works', () => {
                    comp.value = 1;
                    fixture.detectChanges = noop;
                });
            });
        "#;
        let docs = SourceDocs::default();
        let test = extract_test_file("src/a.component.spec.ts", spec, &docs).unwrap();
        let paths: Vec<&str> = test.examples[0]
            .property_assignments
            .iter()
            .map(|p| p.target_path.as_str())
            .collect();
        assert_eq!(paths, vec!["value"]);
    }

    #[test]
    fn file_without_target_marker_yields_nothing() {
        let spec = "describe('x', () => { it('y', () => {}); });";
        let docs = SourceDocs::default();
        assert!(extract_test_file("src/x.spec.ts", spec, &docs).is_none());
    }

    #[test]
    fn entry_components_repeats_preserved() {
        let spec = r#"
            describe('A', () => {
                /** @uijar AComponent */
                const moduleDef = {};
                beforeEach(() => {
                    TestBed.configureTestingModule({ entryComponents: [DialogComponent] });
                    TestBed.configureTestingModule({ entryComponents: [DialogComponent] });
                });
            });
        "#;
        let docs = SourceDocs::default();
        let test = extract_test_file("src/a.spec.ts", spec, &docs).unwrap();
        assert_eq!(
            test.module_setup.entry_components,
            vec!["DialogComponent", "DialogComponent"]
        );
    }
}
