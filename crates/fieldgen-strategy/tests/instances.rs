//! End-to-end tests for record instance generation.
//!
//! Each test declares a record in a fresh `TypeRegistry`, builds a strategy
//! or generator for it and checks the drawn instances.
//!
//! Tests cover:
//! - Explicit, constant and inferred value sources
//! - Manual-draw hooks, including multi-field hooks and rejection
//! - Post-draw hooks: scheduling, snapshot contents, call counts
//! - Hook inheritance: overriding and accumulation
//! - Validation translation on and off
//! - Nested records: up-front planning, nested hooks and nested errors
//! - Determinism and idempotent resolution

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use proptest::strategy::ValueTree;

use fieldgen_core::{FieldDef, RecordDef, RecordInstance, TypeId, TypeRegistry, Value, Violation};
use fieldgen_strategy::{
    build_generator, field_from, instances, instances_with, manual_draw, post_draw, runner_from_seed,
    DrawError, HookDescriptor, HookFn, InstancesConfig, PartialInstance, RecordStrategy,
    StrategyError,
};
use proptest::prelude::*;
use proptest::test_runner::TestRunner;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn register(defs: Vec<RecordDef>) -> (Arc<TypeRegistry>, Vec<TypeId>) {
    let mut reg = TypeRegistry::new();
    let ids = defs
        .into_iter()
        .map(|d| reg.register_record(d).unwrap())
        .collect();
    (Arc::new(reg), ids)
}

fn draw_many(strategy: &RecordStrategy, seed: u64, n: usize) -> Vec<RecordInstance> {
    let mut runner = runner_from_seed(seed);
    (0..n)
        .map(|_| strategy.new_tree(&mut runner).unwrap().current())
        .collect()
}

fn int(inst: &RecordInstance, field: &str) -> i64 {
    inst.get(field).and_then(Value::as_i64).unwrap()
}

fn rejected(reason: &'static str) -> DrawError {
    DrawError::Rejected(reason.into())
}

fn bounded_value_record() -> RecordDef {
    RecordDef::new("ExampleRecord")
        .field(FieldDef::new("value", TypeId::I64))
        .member(
            "draw_value",
            manual_draw(["value"])
                .unwrap()
                .wrap(HookFn::draw(|drawer, _, _| drawer.draw(&(0i64..=5)).map(Value::I64)))
                .unwrap(),
        )
}

// ---------------------------------------------------------------------------
// Value sources
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn explicit_sources_bound_their_fields(
        inst in {
            let (reg, ids) = register(vec![RecordDef::new("Ranges")
                .field(field_from(-3i32..3).into_field("small", TypeId::I32))
                .field(field_from("[a-z]{1,4}").into_field("word", TypeId::TEXT))
                .field(field_from(any::<bool>()).into_field("flag", TypeId::BOOL))]);
            instances(&reg, ids[0]).unwrap()
        }
    ) {
        let small = inst.get("small").and_then(Value::as_i64).unwrap();
        prop_assert!((-3..3).contains(&small));
        let word = inst.get("word").and_then(Value::as_str).unwrap();
        prop_assert!(!word.is_empty() && word.len() <= 4);
        prop_assert!(word.chars().all(|c| c.is_ascii_lowercase()));
        prop_assert!(inst.get("flag").and_then(Value::as_bool).is_some());
    }

    #[test]
    fn defaulted_fields_always_hold_their_default(
        inst in {
            let (reg, ids) = register(vec![RecordDef::new("Defaults")
                .field(FieldDef::new("n", TypeId::I64))
                .field(FieldDef::new("five", TypeId::I64).with_default(5i64))
                .field(FieldDef::new("label", TypeId::TEXT).with_default("fixed"))
                .field(FieldDef::new("count", TypeId::I64).with_default(0i64).no_init())]);
            instances(&reg, ids[0]).unwrap()
        }
    ) {
        prop_assert_eq!(inst.get("five"), Some(&Value::I64(5)));
        prop_assert_eq!(inst.get("label"), Some(&Value::from("fixed")));
        prop_assert_eq!(inst.get("count"), Some(&Value::I64(0)));
    }

    #[test]
    fn manual_draw_controls_its_field(
        inst in {
            let (reg, ids) = register(vec![bounded_value_record()]);
            instances(&reg, ids[0]).unwrap()
        }
    ) {
        let value = int(&inst, "value");
        prop_assert!((0..=5).contains(&value));
    }
}

#[test]
fn drawn_order_is_declaration_order() {
    let (reg, ids) = register(vec![RecordDef::new("Ordered")
        .field(field_from(Just(1i64)).into_field("zeta", TypeId::I64))
        .field(field_from(Just(2i64)).into_field("alpha", TypeId::I64))
        .field(field_from(Just(3i64)).into_field("mid", TypeId::I64))]);
    let generator = build_generator(&reg, ids[0], &InstancesConfig::default()).unwrap();
    assert_eq!(generator.drawn(), ["zeta", "alpha", "mid"]);

    let inst = generator.generate(&mut runner_from_seed(0)).unwrap();
    let keys: Vec<&str> = inst.values().keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["zeta", "alpha", "mid"]);
}

#[test]
fn nested_records_are_inferred() {
    let mut reg = TypeRegistry::new();
    let point = reg
        .register_record(
            RecordDef::new("Point")
                .field(field_from(0i32..10).into_field("x", TypeId::I32))
                .field(field_from(0i32..10).into_field("y", TypeId::I32)),
        )
        .unwrap();
    let segment = reg
        .register_record(
            RecordDef::new("Segment")
                .field(FieldDef::new("from", point))
                .field(FieldDef::new("to", point)),
        )
        .unwrap();
    let reg = Arc::new(reg);

    for inst in draw_many(&instances(&reg, segment).unwrap(), 11, 20) {
        for end in ["from", "to"] {
            let p = inst.get(end).and_then(Value::as_record).unwrap();
            assert_eq!(p.name(), "Point");
            assert!((0..10).contains(&int(p, "x")));
        }
    }
}

/// Registers `inner`, then `Outer { inner: <inner> }`.
fn outer_around(inner: RecordDef) -> (Arc<TypeRegistry>, TypeId, TypeId) {
    let mut reg = TypeRegistry::new();
    let inner = reg.register_record(inner).unwrap();
    let outer = reg
        .register_record(
            RecordDef::new("Outer")
                .field(field_from(0i64..100).into_field("id", TypeId::I64))
                .field(FieldDef::new("inner", inner)),
        )
        .unwrap();
    (Arc::new(reg), outer, inner)
}

fn inner_of(inst: &RecordInstance) -> &RecordInstance {
    inst.get("inner").and_then(Value::as_record).unwrap()
}

#[test]
fn nested_records_are_planned_up_front() {
    let (reg, outer, inner) = outer_around(
        RecordDef::new("Inner").field(field_from(0i64..10).into_field("n", TypeId::I64)),
    );
    let generator = build_generator(&reg, outer, &InstancesConfig::default()).unwrap();
    assert_eq!(generator.nested_records().collect::<Vec<_>>(), vec![inner]);
}

#[test]
fn nested_structural_error_fails_the_outer_build() {
    let (reg, outer, _) = outer_around(
        RecordDef::new("Inner")
            .field(FieldDef::new("n", TypeId::I64).with_default(1i64))
            .member(
                "draw_n",
                manual_draw(["n"])
                    .unwrap()
                    .wrap(HookFn::draw(|_, _, _| Ok(Value::I64(2))))
                    .unwrap(),
            ),
    );
    match instances(&reg, outer) {
        Err(StrategyError::InvalidHookField { record, field, hook }) => {
            assert_eq!((record.as_str(), field.as_str(), hook.as_str()), ("Inner", "n", "draw_n"));
        }
        other => panic!("expected an invalid hook field, got {other:?}"),
    }
}

#[test]
fn nested_validation_failure_propagates_untranslated() {
    let (reg, outer, _) = outer_around(
        RecordDef::new("Inner")
            .field(field_from(0i64..10).into_field("n", TypeId::I64))
            .validator(|_| Err(Violation::field("n", "never valid"))),
    );
    let config = InstancesConfig::without_validation_translation();

    let generator = build_generator(&reg, outer, &config).unwrap();
    match generator.generate(&mut runner_from_seed(0)) {
        Err(DrawError::Validation(err)) => assert_eq!(err.record, "Inner"),
        other => panic!("expected the inner validation error, got {other:?}"),
    }

    let strategy = instances_with(&reg, outer, config).unwrap();
    let reason = strategy.new_tree(&mut TestRunner::deterministic()).unwrap_err();
    assert!(reason.message().contains("1 validation error for Inner"));
}

#[cfg(feature = "validation")]
#[test]
fn nested_validation_failure_is_retried_when_translated() {
    let (reg, outer, _) = outer_around(never_three());
    let config = InstancesConfig {
        disable_validation_translation: Some(false),
    };
    for inst in draw_many(&instances_with(&reg, outer, config).unwrap(), 8, 50) {
        assert_ne!(int(inner_of(&inst), "n"), 3);
    }
}

#[test]
fn nested_hooks_draw_and_reject_nested_fields() {
    let (reg, outer, _) = outer_around(
        RecordDef::new("Inner")
            .field(FieldDef::new("n", TypeId::I64))
            .field(field_from(0i64..10).into_field("m", TypeId::I64))
            .member(
                "draw_n",
                manual_draw(["n"])
                    .unwrap()
                    .wrap(HookFn::draw(|_, _, _| Ok(Value::I64(42))))
                    .unwrap(),
            )
            .member(
                "even_m",
                post_draw(["m"])
                    .unwrap()
                    .wrap(HookFn::check(|_, pi| match pi.field("m")?.as_i64() {
                        Some(m) if m % 2 == 0 => Ok(()),
                        _ => Err(rejected("odd")),
                    }))
                    .unwrap(),
            ),
    );
    for inst in draw_many(&instances(&reg, outer).unwrap(), 9, 30) {
        let inner = inner_of(&inst);
        assert_eq!(int(inner, "n"), 42);
        assert_eq!(int(inner, "m") % 2, 0);
    }
}

#[test]
fn nested_hook_failure_keeps_its_type() {
    let (reg, outer, _) = outer_around(
        RecordDef::new("Inner").field(FieldDef::new("n", TypeId::I64)).member(
            "draw_n",
            manual_draw(["n"])
                .unwrap()
                .wrap(HookFn::draw(|_, _, _| {
                    Err(DrawError::Hook {
                        hook: String::new(),
                        message: "no value today".into(),
                    })
                }))
                .unwrap(),
        ),
    );
    let generator = build_generator(&reg, outer, &InstancesConfig::default()).unwrap();
    match generator.generate(&mut runner_from_seed(0)) {
        Err(DrawError::Hook { hook, message }) => {
            assert_eq!(hook, "draw_n");
            assert_eq!(message, "no value today");
        }
        other => panic!("expected a hook failure, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Manual-draw hooks
// ---------------------------------------------------------------------------

#[test]
fn manual_draw_can_reject() {
    let (reg, ids) = register(vec![RecordDef::new("Rejecting")
        .field(field_from(any::<bool>()).into_field("reject", TypeId::BOOL))
        .field(FieldDef::new("value", TypeId::I64))
        .member(
            "draw_value",
            manual_draw(["value"])
                .unwrap()
                .wrap(HookFn::draw(|drawer, _, others| {
                    let reject = others.field("reject")?.as_bool().unwrap_or(true);
                    drawer.assume(!reject, "reject was drawn")?;
                    drawer.draw(&any::<i64>()).map(Value::I64)
                }))
                .unwrap(),
        )]);

    for inst in draw_many(&instances(&reg, ids[0]).unwrap(), 5, 30) {
        assert_eq!(inst.get("reject"), Some(&Value::Bool(false)));
    }
}

#[test]
fn one_hook_can_draw_several_fields() {
    let calls = Arc::new(Mutex::new(Vec::new()));
    let seen = Arc::clone(&calls);
    let (reg, ids) = register(vec![RecordDef::new("Box")
        .field(FieldDef::new("width", TypeId::I64))
        .field(field_from(0i64..3).into_field("spacer", TypeId::I64))
        .field(FieldDef::new("height", TypeId::I64))
        .member(
            "draw_side",
            manual_draw(["width", "height", "width"])
                .unwrap()
                .wrap(HookFn::draw(move |drawer, field, pi| {
                    seen.lock().unwrap().push((field.to_string(), pi.len()));
                    match field {
                        "width" => drawer.draw(&(1i64..10)).map(Value::I64),
                        _ => {
                            let width = pi.field("width")?.as_i64().unwrap_or(1);
                            Ok(Value::I64(width * 2))
                        }
                    }
                }))
                .unwrap(),
        )]);

    let generator = build_generator(&reg, ids[0], &InstancesConfig::default()).unwrap();
    let inst = generator.generate(&mut runner_from_seed(9)).unwrap();
    assert_eq!(int(&inst, "height"), 2 * int(&inst, "width"));
    assert_eq!(
        *calls.lock().unwrap(),
        vec![("width".to_string(), 0), ("height".to_string(), 2)]
    );
}

// ---------------------------------------------------------------------------
// Post-draw hooks
// ---------------------------------------------------------------------------

#[test]
fn post_draw_hooks_run_after_their_last_dependency() {
    let ijk_calls = Arc::new(AtomicUsize::new(0));
    let ll_calls = Arc::new(AtomicUsize::new(0));
    let ijk_counter = Arc::clone(&ijk_calls);
    let ll_counter = Arc::clone(&ll_calls);

    let def = RecordDef::new("ExampleRecord")
        .field(field_from(0i64..=1).into_field("i", TypeId::I64))
        .field(field_from(0i64..=1).into_field("j", TypeId::I64))
        .field(field_from(0i64..=1).into_field("k", TypeId::I64))
        .field(field_from(0i64..=10).into_field("ll", TypeId::I64))
        .field(field_from(0i64..=10).into_field("mm", TypeId::I64))
        .field(FieldDef::new("num_calls", TypeId::I64).with_default(0i64))
        .member(
            "called_after_ijk",
            post_draw(["i", "j", "k", "j"])
                .unwrap()
                .wrap(HookFn::check(move |fields, pi| {
                    let j = pi.field("j")?;
                    if pi.field("i")? != j || j == pi.field("k")? {
                        return Err(rejected("i == j != k"));
                    }
                    assert_eq!(fields.iter().collect::<Vec<_>>(), vec!["i", "j", "k"]);
                    assert!(pi.has("i") && pi.has("j") && pi.has("k"));
                    assert!(!pi.has("ll") && !pi.has("mm"));
                    ijk_counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
                .unwrap(),
        )
        .member(
            "call_after_ll",
            post_draw(["ll"])
                .unwrap()
                .wrap(HookFn::check_per_type(move |owner, fields, pi| {
                    if pi.field("ll")?.as_i64().unwrap_or(0) <= 5 {
                        return Err(rejected("ll <= 5"));
                    }
                    assert_eq!(owner.name, "ExampleRecord");
                    assert_eq!(fields.len(), 1);
                    assert!(pi.has("k") && pi.has("ll"));
                    assert!(!pi.has("mm"));
                    ll_counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
                .unwrap(),
        );
    let (reg, ids) = register(vec![def]);
    let strategy = instances(&reg, ids[0]).unwrap();

    for inst in draw_many(&strategy, 21, 10) {
        assert_eq!(int(&inst, "i"), int(&inst, "j"));
        assert_ne!(int(&inst, "j"), int(&inst, "k"));
        assert!(int(&inst, "ll") > 5);
        assert_eq!(int(&inst, "num_calls"), 0);
    }
    assert!(ijk_calls.load(Ordering::SeqCst) >= 10);
    assert!(ll_calls.load(Ordering::SeqCst) >= 10);

    // The hooks remain callable outside generation.
    let record = reg.record(ids[0]).unwrap();
    let call_after_ll = record.namespace["call_after_ll"]
        .downcast_ref::<HookDescriptor>()
        .unwrap();
    let before = ll_calls.load(Ordering::SeqCst);
    let pi: PartialInstance = [("i", 1i64), ("j", 1), ("k", 0), ("ll", 7)].into_iter().collect();
    call_after_ll.call_check(record, &pi).unwrap();
    assert_eq!(ll_calls.load(Ordering::SeqCst), before + 1);
}

#[test]
fn post_draw_runs_once_per_successful_pass() {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let (reg, ids) = register(vec![RecordDef::new("Counted")
        .field(field_from(0i64..100).into_field("a", TypeId::I64))
        .field(field_from(0i64..100).into_field("b", TypeId::I64))
        .member(
            "count",
            post_draw(["b", "a"])
                .unwrap()
                .wrap(HookFn::check(move |_, pi| {
                    assert_eq!(pi.len(), 2);
                    counter.fetch_add(1, Ordering::SeqCst);
                    Ok(())
                }))
                .unwrap(),
        )]);
    let generator = build_generator(&reg, ids[0], &InstancesConfig::default()).unwrap();
    let mut runner = runner_from_seed(8);
    for _ in 0..25 {
        generator.generate(&mut runner).unwrap();
    }
    assert_eq!(calls.load(Ordering::SeqCst), 25);
}

// ---------------------------------------------------------------------------
// Inheritance
// ---------------------------------------------------------------------------

fn constant_draw(v: i64) -> HookDescriptor {
    manual_draw(["x"])
        .unwrap()
        .wrap(HookFn::draw(move |_, _, _| Ok(Value::I64(v))))
        .unwrap()
}

#[test]
fn subtype_overrides_manual_draw_by_name() {
    let mut reg = TypeRegistry::new();
    let base = reg
        .register_record(
            RecordDef::new("Base")
                .field(FieldDef::new("x", TypeId::I64))
                .member("draw_x", constant_draw(1)),
        )
        .unwrap();
    let overriding = reg
        .register_record(
            RecordDef::new("Overriding")
                .extends(base)
                .member("draw_x", constant_draw(2)),
        )
        .unwrap();
    let inheriting = reg
        .register_record(
            RecordDef::new("Inheriting")
                .extends(base)
                .field(FieldDef::new("extra", TypeId::BOOL)),
        )
        .unwrap();
    let reg = Arc::new(reg);

    for (id, expected) in [(base, 1), (overriding, 2), (inheriting, 1)] {
        for inst in draw_many(&instances(&reg, id).unwrap(), 3, 5) {
            assert_eq!(int(&inst, "x"), expected, "{}", inst.name());
        }
    }
}

#[test]
fn per_type_hooks_see_the_most_derived_record() {
    let mut reg = TypeRegistry::new();
    let base = reg
        .register_record(
            RecordDef::new("Animal").field(FieldDef::new("kind", TypeId::TEXT)).member(
                "draw_kind",
                manual_draw(["kind"])
                    .unwrap()
                    .wrap(HookFn::draw_per_type(|owner, _, _, _| Ok(Value::from(owner.name.as_str()))))
                    .unwrap(),
            ),
        )
        .unwrap();
    let dog = reg
        .register_record(RecordDef::new("Dog").extends(base))
        .unwrap();
    let reg = Arc::new(reg);

    let generator = build_generator(&reg, dog, &InstancesConfig::default()).unwrap();
    let inst = generator.generate(&mut runner_from_seed(0)).unwrap();
    assert_eq!(inst.get("kind"), Some(&Value::from("Dog")));
    assert_eq!(generator.hooks().manual_for("kind").unwrap().owner(), dog);
}

#[test]
fn subtype_post_draw_hooks_run_after_base_hooks() {
    let order = Arc::new(Mutex::new(Vec::new()));
    let logging = |label: &'static str| {
        let order = Arc::clone(&order);
        post_draw(["x"])
            .unwrap()
            .wrap(HookFn::check(move |_, _| {
                order.lock().unwrap().push(label);
                Ok(())
            }))
            .unwrap()
    };

    let mut reg = TypeRegistry::new();
    let base = reg
        .register_record(
            RecordDef::new("Base")
                .field(field_from(Just(0i64)).into_field("x", TypeId::I64))
                .member("base_check", logging("base")),
        )
        .unwrap();
    let derived = reg
        .register_record(
            RecordDef::new("Derived")
                .extends(base)
                .member("derived_check", logging("derived")),
        )
        .unwrap();
    let reg = Arc::new(reg);

    let generator = build_generator(&reg, derived, &InstancesConfig::default()).unwrap();
    generator.generate(&mut runner_from_seed(0)).unwrap();
    generator.generate(&mut runner_from_seed(1)).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["base", "derived", "base", "derived"]);
}

// ---------------------------------------------------------------------------
// Validation translation
// ---------------------------------------------------------------------------

fn never_three() -> RecordDef {
    RecordDef::new("NeverThree")
        .field(field_from(0i64..5).into_field("n", TypeId::I64))
        .validator(|inst| match inst.get("n").and_then(Value::as_i64) {
            Some(3) => Err(Violation::field("n", "three is not allowed")),
            _ => Ok(()),
        })
}

#[cfg(feature = "validation")]
proptest! {
    #[test]
    fn translated_validation_failures_are_retried(
        inst in {
            let (reg, ids) = register(vec![never_three()]);
            let config = InstancesConfig { disable_validation_translation: Some(false) };
            instances_with(&reg, ids[0], config).unwrap()
        }
    ) {
        prop_assert_ne!(int(&inst, "n"), 3);
    }
}

#[test]
fn untranslated_validation_failure_propagates_on_first_occurrence() {
    let (reg, ids) = register(vec![RecordDef::new("AlwaysInvalid")
        .field(field_from(0i64..5).into_field("n", TypeId::I64))
        .validator(|_| Err(Violation::field("n", "never valid")))]);

    let generator =
        build_generator(&reg, ids[0], &InstancesConfig::without_validation_translation()).unwrap();
    assert!(!generator.translates_validation());
    match generator.generate(&mut runner_from_seed(0)) {
        Err(DrawError::Validation(err)) => {
            assert_eq!(err.record, "AlwaysInvalid");
            assert_eq!(err.violations[0].field.as_deref(), Some("n"));
        }
        other => panic!("expected a validation error, got {other:?}"),
    }

    let strategy =
        instances_with(&reg, ids[0], InstancesConfig::without_validation_translation()).unwrap();
    let reason = strategy.new_tree(&mut TestRunner::deterministic()).unwrap_err();
    assert!(reason.message().contains("1 validation error for AlwaysInvalid"));
}

// ---------------------------------------------------------------------------
// Determinism and resolution
// ---------------------------------------------------------------------------

#[test]
fn same_seed_reproduces_instances() {
    let (reg, ids) = register(vec![RecordDef::new("Sample")
        .field(field_from(0i64..5).into_field("n", TypeId::I64))
        .field(FieldDef::new("label", TypeId::TEXT))
        .field(FieldDef::new("ratio", TypeId::F64))]);
    let strategy = instances(&reg, ids[0]).unwrap();
    let first: Vec<_> = draw_many(&strategy, 1234, 15).iter().map(RecordInstance::to_json).collect();
    let second: Vec<_> = draw_many(&strategy, 1234, 15).iter().map(RecordInstance::to_json).collect();
    assert_eq!(first, second);
}

#[test]
fn resolution_is_idempotent() {
    let (reg, ids) = register(vec![bounded_value_record()
        .field(field_from(0i64..3).into_field("other", TypeId::I64))
        .member(
            "check",
            post_draw(["other", "value"])
                .unwrap()
                .wrap(HookFn::check(|_, _| Ok(())))
                .unwrap(),
        )]);

    let summary = || {
        let g = build_generator(&reg, ids[0], &InstancesConfig::default()).unwrap();
        let manual: Vec<(String, String)> = g
            .hooks()
            .manual_draw
            .iter()
            .map(|(f, h)| (f.clone(), h.member().to_string()))
            .collect();
        let post: Vec<(String, Vec<String>)> = g
            .hooks()
            .post_draw
            .iter()
            .map(|(f, hs)| (f.clone(), hs.iter().map(|h| h.member().to_string()).collect()))
            .collect();
        (g.drawn().to_vec(), manual, post)
    };

    let first = summary();
    assert_eq!(first, summary());
    assert_eq!(first.0, vec!["value", "other"]);
    assert_eq!(first.2, vec![("other".to_string(), vec!["check".to_string()])]);
}
