//! End-to-end pipeline test: metadata records through model building,
//! combination, synthesis and the post-compile fixup pass.

use covenant_codegen::{fix_unit, CompiledUnit, Insn, MethodUnit, Synthesizer};
use covenant_core::builder::{ClauseRecord, ClauseSite, ModelBuilder};
use covenant_core::combinator::{ClauseCombinator, InMemoryRegistry};
use covenant_core::model::{
    Element, MethodElement, Modifier, TypeElement, TypeKind, TypeName,
};

fn account_type(qualified: &str, superclass: Option<&str>) -> TypeElement {
    let simple = qualified.rsplit('.').next().unwrap().to_string();
    let mut ty = TypeElement::new(simple, qualified, TypeKind::Class);
    ty.modifiers.push(Modifier::Public);
    ty.super_qualified = superclass.map(|s| s.to_string());
    ty.superclass = superclass.map(|s| TypeName::new(s.rsplit('.').next().unwrap()));
    ty.add_element(Element::Method(MethodElement {
        name: "withdraw".to_string(),
        modifiers: vec![Modifier::Public],
        type_parameters: vec![],
        return_type: Some(TypeName::new("int")),
        parameters: vec![],
        exceptions: vec![],
        is_constructor: false,
    }));
    ty
}

#[test]
fn test_full_pipeline_produces_unique_recompilable_output() {
    let builder = ModelBuilder::new();

    let mut base = account_type("bank.Account", None);
    builder.attach_clauses(
        &mut base,
        &ClauseSite::Type,
        &[ClauseRecord::new("Invariant", vec!["balance >= 0".to_string()])
            .with_lines(vec![Some(10)])],
        true,
    );
    builder.attach_clauses(
        &mut base,
        &ClauseSite::Method("withdraw".to_string()),
        &[
            ClauseRecord::new("Requires", vec!["amount > 0".to_string()]).with_lines(vec![Some(20)]),
            ClauseRecord::new("Ensures", vec!["result >= 0".to_string()]).with_lines(vec![Some(21)]),
        ],
        true,
    );

    let mut registry = InMemoryRegistry::new();
    registry.register_type(&base);

    let mut derived = account_type("bank.Savings", Some("bank.Account"));
    builder.attach_clauses(
        &mut derived,
        &ClauseSite::Method("withdraw".to_string()),
        &[ClauseRecord::new("Requires", vec!["amount > 10".to_string()])
            .with_lines(vec![Some(30)])],
        true,
    );
    ClauseCombinator::new(&registry)
        .combine(&mut derived)
        .unwrap();

    // Checking-method identities stay pairwise unique after combination.
    derived.validate_identities().unwrap();

    let unit = Synthesizer::new().synthesize(&derived);
    assert!(unit.source.starts_with("package bank;\n"));
    assert!(unit
        .source
        .contains("((amount > 10)) || ((amount > 0))"));

    // Only primary clause sub-expressions enter the line map; combined
    // checks and stubs do not.
    assert_eq!(unit.line_map.len(), 1);
    let (&line, origin) = unit.line_map.iter().next().unwrap();
    assert_eq!(origin.expression, "amount > 10");
    assert_eq!(origin.line, Some(30));
    assert!(unit
        .source
        .lines()
        .nth(line as usize - 1)
        .unwrap()
        .contains("if (!(amount > 10)) {"));

    // The generated unit compiles as a separate unit; after the merge,
    // bridge-accessor calls inside contract methods get re-aliased.
    let compiled = CompiledUnit {
        name: "bank.Savings".to_string(),
        methods: vec![
            MethodUnit {
                name: "withdraw".to_string(),
                descriptor: "(I)I".to_string(),
                contract_tagged: false,
                synthetic: false,
                instructions: vec![Insn::LoadLocal(1), Insn::Return],
            },
            MethodUnit {
                name: "covenant$requires$withdraw$0".to_string(),
                descriptor: "(I)V".to_string(),
                contract_tagged: true,
                synthetic: false,
                instructions: vec![
                    Insn::Invoke {
                        owner: "bank.Savings".to_string(),
                        name: "access$0".to_string(),
                        descriptor: "()I".to_string(),
                    },
                    Insn::Return,
                ],
            },
        ],
    };
    let fixed = fix_unit(&compiled).unwrap();
    assert_eq!(fixed.methods[0], compiled.methods[0]);
    assert_eq!(
        fixed.methods[1].instructions[0],
        Insn::Invoke {
            owner: "bank.Savings".to_string(),
            name: "com$covenant$access$0".to_string(),
            descriptor: "()I".to_string(),
        }
    );
}
