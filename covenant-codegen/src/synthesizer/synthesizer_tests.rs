//! Tests for the code synthesizer

use super::*;
use covenant_core::builder::{ClauseRecord, ClauseSite, ModelBuilder};
use covenant_core::model::MethodElement;

// ===== Test Helper Functions =====

fn public_class(simple: &str, qualified: &str) -> TypeElement {
    let mut ty = TypeElement::new(simple, qualified, TypeKind::Class);
    ty.modifiers.push(Modifier::Public);
    ty
}

fn int_method(name: &str) -> MethodElement {
    MethodElement {
        name: name.to_string(),
        modifiers: vec![Modifier::Public],
        type_parameters: vec![],
        return_type: Some(TypeName::new("int")),
        parameters: vec![],
        exceptions: vec![],
        is_constructor: false,
    }
}

fn assert_balanced(source: &str) {
    let mut depth: i64 = 0;
    for c in source.chars() {
        match c {
            '{' => depth += 1,
            '}' => depth -= 1,
            _ => {}
        }
        assert!(depth >= 0, "unbalanced braces in:\n{}", source);
    }
    assert_eq!(depth, 0, "unbalanced braces in:\n{}", source);
}

fn line_of(source: &str, needle: &str) -> u64 {
    for (idx, line) in source.lines().enumerate() {
        if line.contains(needle) {
            return idx as u64 + 1;
        }
    }
    panic!("{:?} not found in:\n{}", needle, source);
}

// ===== Structural Emission =====

#[test]
fn test_empty_model_is_well_formed() {
    let ty = public_class("Empty", "com.example.Empty");
    let unit = Synthesizer::new().synthesize(&ty);
    assert_balanced(&unit.source);
    assert!(unit.source.starts_with("package com.example;\n"));
    assert!(unit.source.contains("public class Empty {"));
    assert!(unit.line_map.is_empty());
}

#[test]
fn test_default_package_omits_package_declaration() {
    let ty = public_class("Bare", "Bare");
    let unit = Synthesizer::new().synthesize(&ty);
    assert!(!unit.source.contains("package"));
    assert_balanced(&unit.source);
}

#[test]
fn test_imports_are_emitted_for_root_type_only() {
    let mut inner = public_class("Inner", "com.example.Outer.Inner");
    inner.imports = vec!["java.util.Map".to_string()];
    let mut outer = public_class("Outer", "com.example.Outer");
    outer.imports = vec!["java.util.List".to_string()];
    outer.add_element(Element::Type(inner));

    let unit = Synthesizer::new().synthesize(&outer);
    assert!(unit.source.contains("import java.util.List;\n"));
    assert!(!unit.source.contains("import java.util.Map;"));
    assert_balanced(&unit.source);
}

#[test]
fn test_superclass_and_interfaces() {
    let mut ty = public_class("Impl", "Impl");
    ty.superclass = Some(TypeName::new("Base"));
    ty.interfaces = vec![TypeName::new("Runnable"), TypeName::new("Closeable")];
    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit
        .source
        .contains("public class Impl extends Base implements Runnable, Closeable {"));
}

#[test]
fn test_interface_emission_drops_abstract_and_extends() {
    let mut ty = TypeElement::new("Iface", "Iface", TypeKind::Interface);
    ty.modifiers = vec![Modifier::Public, Modifier::Abstract];
    ty.interfaces = vec![TypeName::new("Base")];
    ty.add_element(Element::Method(int_method("get")));

    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains("public interface Iface extends Base {"));
    assert!(unit.source.contains("public int get();"));
    assert_balanced(&unit.source);
}

#[test]
fn test_generic_signature() {
    let mut ty = public_class("Box", "Box");
    ty.type_parameters = vec![TypeName::new("T"), TypeName::new("U")];
    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains("public class Box<T, U> {"));
}

#[test]
fn test_enum_constants_and_dummy_constructor_come_first() {
    let mut ty = TypeElement::new("Color", "Color", TypeKind::Enum);
    ty.modifiers = vec![Modifier::Public];
    for name in ["RED", "GREEN"] {
        ty.add_element(Element::Variable(VariableElement {
            name: name.to_string(),
            kind: VariableKind::Constant,
            type_name: TypeName::new("Color"),
            modifiers: vec![],
        }));
    }
    ty.add_element(Element::Method(MethodElement {
        name: "<init>".to_string(),
        modifiers: vec![Modifier::Private],
        type_parameters: vec![],
        return_type: None,
        parameters: vec![],
        exceptions: vec![],
        is_constructor: true,
    }));
    ty.add_element(Element::Method(int_method("ordinalSquared")));

    let unit = Synthesizer::new().synthesize(&ty);
    assert_balanced(&unit.source);
    let constants = line_of(&unit.source, "RED, GREEN;");
    let ctor = line_of(&unit.source, "private Color() {");
    let member = line_of(&unit.source, "ordinalSquared");
    assert!(constants < ctor && ctor < member);
    // The declared enum constructor is not emitted as a member.
    assert!(!unit.source.contains("<init>"));
}

#[test]
fn test_enum_constructor_stub_is_emitted_even_when_undeclared() {
    let mut ty = TypeElement::new("Unit", "Unit", TypeKind::Enum);
    ty.modifiers = vec![Modifier::Public];
    ty.add_element(Element::Variable(VariableElement {
        name: "ONLY".to_string(),
        kind: VariableKind::Constant,
        type_name: TypeName::new("Unit"),
        modifiers: vec![],
    }));

    let unit = Synthesizer::new().synthesize(&ty);
    assert_balanced(&unit.source);
    assert!(unit.source.contains("ONLY;\n"));
    assert!(unit.source.contains("private Unit() {\n}"));
}

#[test]
fn test_final_field_gets_default_initializer() {
    let mut ty = public_class("Foo", "Foo");
    ty.add_element(Element::Variable(VariableElement {
        name: "count".to_string(),
        kind: VariableKind::Field,
        type_name: TypeName::new("int"),
        modifiers: vec![Modifier::Private, Modifier::Final],
    }));
    ty.add_element(Element::Variable(VariableElement {
        name: "label".to_string(),
        kind: VariableKind::Field,
        type_name: TypeName::new("String"),
        modifiers: vec![Modifier::Private],
    }));

    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains("private final int count = (int)0;"));
    assert!(unit.source.contains("private String label;"));
}

#[test]
fn test_constructor_stub_forwards_defaults_to_super() {
    let mut ty = public_class("Child", "Child");
    ty.superclass = Some(TypeName::new("Parent"));
    ty.super_arguments = vec![TypeName::new("int"), TypeName::new("String")];
    ty.add_element(Element::Method(MethodElement {
        name: "<init>".to_string(),
        modifiers: vec![Modifier::Public],
        type_parameters: vec![],
        return_type: None,
        parameters: vec![],
        exceptions: vec![],
        is_constructor: true,
    }));

    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains("public Child() {"));
    assert!(unit.source.contains("super((int)0, (String)null);"));
}

#[test]
fn test_method_stub_returns_default_value() {
    let mut ty = public_class("Foo", "Foo");
    ty.add_element(Element::Method(int_method("size")));
    ty.add_element(Element::Method(MethodElement {
        return_type: Some(TypeName::new("void")),
        ..int_method("run")
    }));

    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains("public int size() {\nreturn (int)0;\n}"));
    assert!(unit.source.contains("public void run() {\n}"));
}

#[test]
fn test_method_with_exceptions_and_parameters() {
    let mut ty = public_class("Foo", "Foo");
    let mut m = int_method("read");
    m.parameters = vec![VariableElement {
        name: "max".to_string(),
        kind: VariableKind::Field,
        type_name: TypeName::new("int"),
        modifiers: vec![],
    }];
    m.exceptions = vec![TypeName::new("java.io.IOException")];
    ty.add_element(Element::Method(m));

    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit
        .source
        .contains("public int read(int max) throws java.io.IOException {"));
}

// ===== Contract Method Emission =====

fn contracted_class() -> TypeElement {
    let mut ty = public_class("Foo", "com.example.Foo");
    ty.add_element(Element::Method(int_method("m")));
    let builder = ModelBuilder::new();
    builder.attach_clauses(
        &mut ty,
        &ClauseSite::Method("m".to_string()),
        &[ClauseRecord::new(
            "Requires",
            vec!["x > 0".to_string(), "x < 10".to_string()],
        )
        .with_lines(vec![Some(41), None])],
        true,
    );
    ty
}

#[test]
fn test_contract_metadata_record() {
    let ty = contracted_class();
    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains(
        "@covenant.agent.ContractMethodSignature(kind = covenant.model.ClauseKind.REQUIRES, \
         id = 0, target = \"m\", lines = { 41, -1 })"
    ));
    assert_balanced(&unit.source);
}

#[test]
fn test_type_scoped_contract_omits_target() {
    let mut ty = public_class("Foo", "Foo");
    ModelBuilder::new().attach_clauses(
        &mut ty,
        &ClauseSite::Type,
        &[ClauseRecord::new("Invariant", vec!["x >= 0".to_string()])],
        true,
    );
    let unit = Synthesizer::new().synthesize(&ty);
    assert!(unit.source.contains(
        "@covenant.agent.ContractMethodSignature(kind = covenant.model.ClauseKind.INVARIANT, id = 0)"
    ));
    assert!(!unit.source.contains("target ="));
}

#[test]
fn test_line_map_entries_are_exactly_the_guard_lines() {
    let ty = contracted_class();
    let unit = Synthesizer::new().synthesize(&ty);

    let first_guard = line_of(&unit.source, "if (!(x > 0)) {");
    let second_guard = line_of(&unit.source, "if (!(x < 10)) {");
    assert_eq!(unit.line_map.len(), 2);

    let first = unit.origin_at(first_guard).unwrap();
    assert_eq!(first.kind, covenant_core::model::ClauseKind::Requires);
    assert_eq!(first.target, "m");
    assert_eq!(first.line, Some(41));
    assert_eq!(first.expression, "x > 0");

    let second = unit.origin_at(second_guard).unwrap();
    assert_eq!(second.line, None);

    assert_eq!(
        unit.format_error(first_guard, "precondition failed"),
        "line 41: precondition failed"
    );
    assert_eq!(
        unit.format_error(second_guard, "precondition failed"),
        "precondition failed"
    );
}

#[test]
fn test_nested_types_share_one_line_counter() {
    let mut inner = public_class("Inner", "com.example.Outer.Inner");
    inner.add_element(Element::Method(int_method("n")));
    ModelBuilder::new().attach_clauses(
        &mut inner,
        &ClauseSite::Method("n".to_string()),
        &[ClauseRecord::new("Ensures", vec!["result >= 0".to_string()])
            .with_lines(vec![Some(7)])],
        true,
    );

    let mut outer = contracted_class();
    outer.add_element(Element::Type(inner));
    let unit = Synthesizer::new().synthesize(&outer);
    assert_balanced(&unit.source);

    let nested_guard = line_of(&unit.source, "if (!(result >= 0)) {");
    let origin = unit.origin_at(nested_guard).unwrap();
    assert_eq!(origin.line, Some(7));
    assert_eq!(origin.target, "n");
    assert_eq!(unit.line_map.len(), 3);
}

#[test]
fn test_debug_trace_interleaves_clause_text() {
    let ty = contracted_class();
    let unit = Synthesizer::new().with_debug_trace(true).synthesize(&ty);
    assert!(unit.source.contains(
        "covenant.util.DebugUtils.contractInfo(\"checking contract: \
         com.example.Foo.covenant$requires$m$0: x > 0, x < 10\");"
    ));
    assert_balanced(&unit.source);
}

#[test]
fn test_debug_trace_escapes_literal_text() {
    let mut ty = public_class("Foo", "Foo");
    ty.add_element(Element::Method(int_method("m")));
    ModelBuilder::new().attach_clauses(
        &mut ty,
        &ClauseSite::Method("m".to_string()),
        &[ClauseRecord::new(
            "Requires",
            vec!["s.equals(\"ok\")".to_string()],
        )],
        true,
    );
    let unit = Synthesizer::new().with_debug_trace(true).synthesize(&ty);
    assert!(unit.source.contains("s.equals(\\\"ok\\\")"));
}

#[test]
fn test_debug_trace_disabled_by_default() {
    let ty = contracted_class();
    let unit = Synthesizer::new().synthesize(&ty);
    assert!(!unit.source.contains("DebugUtils"));
}
