//! Shared syntax-tree helpers.
//!
//! Every extraction pass parses with its own allocator and hands back owned
//! `String`s; no AST node crosses a module boundary. Doc comments are
//! recovered by scanning the raw source text backwards from a declaration
//! instead of going through trivia attachment, which keeps marker handling
//! tolerant of the half-formed input test files tend to be.

use oxc_allocator::Allocator;
use oxc_ast::ast::{
    Class, ClassElement, Declaration, Expression, ExportDefaultDeclarationKind, Program,
    PropertyKey, Statement,
};
use oxc_parser::Parser;
use oxc_span::{SourceType, Span};

/// Parse a TypeScript module. Returns `None` only when the parser panics
/// outright; recoverable syntax errors still yield a usable (partial) tree.
pub fn parse_source<'a>(allocator: &'a Allocator, source: &'a str) -> Option<Program<'a>> {
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_module(true);
    let ret = Parser::new(allocator, source, source_type).parse();
    if ret.panicked {
        tracing::debug!("parser panicked, skipping file");
        return None;
    }
    Some(ret.program)
}

/// Slice the original text covered by a span.
pub fn span_text<'a>(source: &'a str, span: Span) -> &'a str {
    &source[span.start as usize..span.end as usize]
}

/// Visit every class declaration in the module body, exported or not.
/// The second argument is the byte offset where the declaration's leading
/// trivia ends: the start of its first decorator, or of the (possibly
/// `export`-prefixed) statement itself.
pub fn for_each_class<'a>(
    program: &'a Program<'a>,
    mut visit: impl FnMut(&'a Class<'a>, u32),
) {
    for stmt in &program.body {
        match stmt {
            Statement::ClassDeclaration(class) => {
                visit(class, class_lead_offset(class, class.span.start));
            }
            Statement::ExportNamedDeclaration(export) => {
                if let Some(Declaration::ClassDeclaration(class)) = &export.declaration {
                    visit(class, class_lead_offset(class, export.span.start));
                }
            }
            Statement::ExportDefaultDeclaration(export) => {
                if let ExportDefaultDeclarationKind::ClassDeclaration(class) = &export.declaration
                {
                    visit(class, class_lead_offset(class, export.span.start));
                }
            }
            _ => {}
        }
    }
}

fn class_lead_offset(class: &Class, stmt_start: u32) -> u32 {
    class
        .decorators
        .iter()
        .map(|d| d.span.start)
        .min()
        .map_or(stmt_start, |dec_start| dec_start.min(stmt_start))
}

/// The `/** ... */` or `/* ... */` block that ends immediately before
/// `offset`, with only whitespace in between. Returns the comment including
/// its delimiters.
pub fn block_comment_before(source: &str, offset: u32) -> Option<&str> {
    let head = source[..offset as usize].trim_end();
    if !head.ends_with("*/") {
        return None;
    }
    let open = head.rfind("/*")?;
    Some(&head[open..])
}

/// Strip comment delimiters and per-line `*` margins from a block comment.
pub fn strip_comment_margins(comment: &str) -> String {
    let inner = comment
        .trim()
        .trim_start_matches("/**")
        .trim_start_matches("/*")
        .trim_end_matches("*/");
    inner
        .lines()
        .map(|line| {
            let line = line.trim_start();
            line.strip_prefix('*').map_or(line, |rest| rest.strip_prefix(' ').unwrap_or(rest))
        })
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// Leftmost identifier of a member/call chain: `comp.items[0].label` and
/// `comp.reset()` both resolve to `comp`.
pub fn root_identifier<'a>(expr: &'a Expression<'a>) -> Option<&'a str> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::StaticMemberExpression(member) => root_identifier(&member.object),
        Expression::ComputedMemberExpression(member) => root_identifier(&member.object),
        Expression::CallExpression(call) => root_identifier(&call.callee),
        Expression::ParenthesizedExpression(paren) => root_identifier(&paren.expression),
        Expression::TSAsExpression(cast) => root_identifier(&cast.expression),
        Expression::TSNonNullExpression(assert) => root_identifier(&assert.expression),
        _ => None,
    }
}

/// Printable name of a class-member or object-literal key. Private (`#x`)
/// and computed keys yield `None`.
pub fn property_key_name(key: &PropertyKey) -> Option<String> {
    match key {
        PropertyKey::StaticIdentifier(ident) => Some(ident.name.to_string()),
        PropertyKey::StringLiteral(lit) => Some(lit.value.to_string()),
        _ => None,
    }
}

/// String value of a literal expression: plain string literals and
/// single-quasi template literals. Anything else yields `None`.
pub fn string_literal_value(source: &str, expr: &Expression) -> Option<String> {
    match expr {
        Expression::StringLiteral(lit) => Some(lit.value.to_string()),
        Expression::TemplateLiteral(tpl) => {
            if tpl.expressions.is_empty() {
                let raw = span_text(source, tpl.span);
                Some(raw.trim_matches('`').to_string())
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Statements of a function-valued call argument, for walking `describe`,
/// `beforeEach` and `it` bodies.
pub fn function_body_statements<'a>(
    expr: &'a Expression<'a>,
) -> Option<&'a oxc_allocator::Vec<'a, Statement<'a>>> {
    match expr {
        Expression::ArrowFunctionExpression(arrow) => Some(&arrow.body.statements),
        Expression::FunctionExpression(func) => func.body.as_ref().map(|b| &b.statements),
        _ => None,
    }
}

/// `true` when the element is a non-static, non-private member that belongs
/// in a public API listing.
pub fn is_public_member(element: &ClassElement) -> bool {
    use oxc_ast::ast::TSAccessibility;

    let (is_static, accessibility, key) = match element {
        ClassElement::PropertyDefinition(prop) => {
            (prop.r#static, prop.accessibility, &prop.key)
        }
        ClassElement::MethodDefinition(method) => {
            (method.r#static, method.accessibility, &method.key)
        }
        _ => return false,
    };
    if is_static {
        return false;
    }
    if matches!(
        accessibility,
        Some(TSAccessibility::Private) | Some(TSAccessibility::Protected)
    ) {
        return false;
    }
    !matches!(key, PropertyKey::PrivateIdentifier(_))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_decorated_class() {
        let source = r#"
            @Component({ selector: 'x-button' })
            export class ButtonComponent {}
        "#;
        let allocator = Allocator::default();
        let program = parse_source(&allocator, source).unwrap();
        let mut names = vec![];
        for_each_class(&program, |class, _| {
            names.push(class.id.as_ref().unwrap().name.to_string());
        });
        assert_eq!(names, vec!["ButtonComponent"]);
    }

    #[test]
    fn lead_offset_starts_at_decorator() {
        let source = "/** doc */\n@Component({})\nexport class A {}";
        let allocator = Allocator::default();
        let program = parse_source(&allocator, source).unwrap();
        let mut offsets = vec![];
        for_each_class(&program, |_, offset| offsets.push(offset));
        assert_eq!(offsets.len(), 1);
        let comment = block_comment_before(source, offsets[0]).unwrap();
        assert_eq!(comment, "/** doc */");
    }

    #[test]
    fn block_comment_requires_adjacency() {
        let source = "/* far away */\nconst gap = 1;\nlet x = 2;";
        assert_eq!(block_comment_before(source, source.len() as u32), None);
    }

    #[test]
    fn strips_star_margins() {
        let comment = "/**\n * First line.\n * Second line.\n */";
        assert_eq!(strip_comment_margins(comment), "First line.\nSecond line.");
    }

    #[test]
    fn strips_single_line_comment() {
        assert_eq!(strip_comment_margins("/** @group Buttons */"), "@group Buttons");
    }

    #[test]
    fn root_identifier_walks_member_chains() {
        let source = "comp.items[0].label;";
        let allocator = Allocator::default();
        let program = parse_source(&allocator, source).unwrap();
        let Statement::ExpressionStatement(stmt) = &program.body[0] else {
            panic!("expected expression statement");
        };
        assert_eq!(root_identifier(&stmt.expression), Some("comp"));
    }
}
