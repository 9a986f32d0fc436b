//! Doc-tag and decorator marker conventions.
//!
//! Each marker gets its own matcher so a convention can be retargeted (or a
//! new one added) without touching the extraction passes. Doc tags are read
//! from margin-stripped comment text; decorators are matched by walking the
//! decorator expression for a known identifier, so `@Component`,
//! `@Component({...})` and `@ng.Component({...})` all classify the same way.

use lazy_static::lazy_static;
use oxc_ast::ast::{Class, Expression, ObjectExpression};
use regex::Regex;

/// What a class declaration is, as far as the generator cares.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    Component,
    Module,
    Plain,
}

lazy_static! {
    static ref TARGET_TAG: Regex = tag_matcher("uijar");
    static ref BOOTSTRAP_TAG: Regex = tag_matcher("hostcomponent");
    static ref EXAMPLE_TAG: Regex = tag_matcher("uijarexample");
    static ref GROUP_TAG: Regex = tag_matcher("group");
    static ref DISPLAY_NAME_TAG: Regex = tag_matcher("component");
    static ref DESCRIPTION_TAG: Regex = tag_matcher("description");
}

/// A tag's operand runs from the tag name to the next line that opens with
/// another tag, so multi-line descriptions survive intact.
fn tag_matcher(tag: &str) -> Regex {
    Regex::new(&format!(
        r"(?s)@{tag}\b[ \t]*(.*?)(?:\n[ \t]*@[A-Za-z]|\z)"
    ))
    .expect("valid tag matcher")
}

fn tag_operand(matcher: &Regex, text: &str) -> Option<String> {
    matcher
        .captures(text)
        .map(|caps| caps[1].trim().to_string())
}

/// `@uijar <ComponentName>` on a margin-stripped comment.
pub fn target_component(comment_text: &str) -> Option<String> {
    tag_operand(&TARGET_TAG, comment_text).filter(|s| !s.is_empty())
}

/// `@hostcomponent <ComponentName>` on a margin-stripped comment.
pub fn bootstrap_component(comment_text: &str) -> Option<String> {
    tag_operand(&BOOTSTRAP_TAG, comment_text).filter(|s| !s.is_empty())
}

/// `@uijarexample <title>` on a margin-stripped comment. A bare tag still
/// marks an example; its title is just empty.
pub fn example_title(comment_text: &str) -> Option<String> {
    tag_operand(&EXAMPLE_TAG, comment_text)
}

/// `true` when the comment carries any primary annotation.
pub fn has_primary_marker(comment_text: &str) -> bool {
    TARGET_TAG.is_match(comment_text) || BOOTSTRAP_TAG.is_match(comment_text)
}

pub fn group_name(comment_text: &str) -> Option<String> {
    tag_operand(&GROUP_TAG, comment_text).filter(|s| !s.is_empty())
}

pub fn display_name(comment_text: &str) -> Option<String> {
    tag_operand(&DISPLAY_NAME_TAG, comment_text).filter(|s| !s.is_empty())
}

pub fn description(comment_text: &str) -> Option<String> {
    tag_operand(&DESCRIPTION_TAG, comment_text).filter(|s| !s.is_empty())
}

/// Identifier a decorator resolves to, whatever shape it takes.
pub fn decorator_name<'a>(expr: &'a Expression<'a>) -> Option<&'a str> {
    match expr {
        Expression::Identifier(ident) => Some(ident.name.as_str()),
        Expression::CallExpression(call) => decorator_name(&call.callee),
        Expression::StaticMemberExpression(member) => Some(member.property.name.as_str()),
        Expression::ParenthesizedExpression(paren) => decorator_name(&paren.expression),
        _ => None,
    }
}

pub fn classify_class(class: &Class) -> ClassKind {
    for decorator in &class.decorators {
        match decorator_name(&decorator.expression) {
            Some("Component") => return ClassKind::Component,
            Some("NgModule") => return ClassKind::Module,
            _ => {}
        }
    }
    ClassKind::Plain
}

/// The metadata object literal of a `@Component({...})`-shaped decorator.
pub fn decorator_metadata<'a>(expr: &'a Expression<'a>) -> Option<&'a ObjectExpression<'a>> {
    if let Expression::CallExpression(call) = expr {
        if let Some(Expression::ObjectExpression(obj)) =
            call.arguments.first().and_then(|arg| arg.as_expression())
        {
            return Some(obj);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::{parse_source, for_each_class};
    use oxc_allocator::Allocator;

    #[test]
    fn target_tag_takes_single_operand() {
        assert_eq!(
            target_component("@uijar ButtonComponent"),
            Some("ButtonComponent".to_string())
        );
        assert_eq!(target_component("no markers here"), None);
        assert_eq!(target_component("@uijar"), None);
    }

    #[test]
    fn bootstrap_tag_matches_alongside_target() {
        let text = "@uijar ButtonComponent\n@hostcomponent HostComponent";
        assert_eq!(
            target_component(text),
            Some("ButtonComponent".to_string())
        );
        assert_eq!(
            bootstrap_component(text),
            Some("HostComponent".to_string())
        );
        assert!(has_primary_marker(text));
    }

    #[test]
    fn example_title_may_be_empty() {
        assert_eq!(example_title("@uijarexample"), Some(String::new()));
        assert_eq!(
            example_title("@uijarexample Primary button"),
            Some("Primary button".to_string())
        );
        assert_eq!(example_title("plain text"), None);
    }

    #[test]
    fn description_spans_lines_until_next_tag() {
        let text = "@group Buttons\n@description First line.\nSecond line.\n@component Button";
        assert_eq!(
            description(text),
            Some("First line.\nSecond line.".to_string())
        );
        assert_eq!(group_name(text), Some("Buttons".to_string()));
        assert_eq!(display_name(text), Some("Button".to_string()));
    }

    #[test]
    fn classifies_decorated_classes() {
        let source = r#"
            @Component({ selector: 'x-a' })
            export class A {}

            @NgModule({ exports: [A] })
            export class AModule {}

            export class Plain {}
        "#;
        let allocator = Allocator::default();
        let program = parse_source(&allocator, source).unwrap();
        let mut kinds = vec![];
        for_each_class(&program, |class, _| kinds.push(classify_class(class)));
        assert_eq!(
            kinds,
            vec![ClassKind::Component, ClassKind::Module, ClassKind::Plain]
        );
    }

    #[test]
    fn namespaced_decorator_still_classifies() {
        let source = r#"
            @ng.Component({ selector: 'x-b' })
            class B {}
        "#;
        let allocator = Allocator::default();
        let program = parse_source(&allocator, source).unwrap();
        let mut kinds = vec![];
        for_each_class(&program, |class, _| kinds.push(classify_class(class)));
        assert_eq!(kinds, vec![ClassKind::Component]);
    }
}
