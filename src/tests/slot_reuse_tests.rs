use super::init_logger;
use crate::{CodeHandler, DefaultNameGenerator, DefaultPolicy, SlotEvaluator, Symbolic};

/// `t1 = sin(x)`, `t2 = cos(t1 * t1)`, `t3 = exp(t2 * t2)`, `y = t3 * t3`
fn staircase(handler: &CodeHandler<f64>) -> (Symbolic<f64>, [Symbolic<f64>; 3]) {
    let x = handler.make_variable();
    let t1 = x.sin();
    let t2 = (&t1 * &t1).cos();
    let t3 = (&t2 * &t2).exp();
    (&t3 * &t3, [t1, t2, t3])
}

fn staircase_reference(x: f64) -> f64 {
    let t1 = x.sin();
    let t2 = (t1 * t1).cos();
    let t3 = (t2 * t2).exp();
    t3 * t3
}

#[test]
fn test_released_slot_is_reused() {
    init_logger();
    let handler = CodeHandler::<f64>::new();
    let (y, temps) = staircase(&handler);

    let names = DefaultNameGenerator::default();
    let data = handler.generate(&[y], &DefaultPolicy, &names).unwrap();
    // x = 1, y = 2, temporaries from 3
    assert_eq!(data.min_temporary_id(), 3);
    assert_eq!(data.variable_order().len(), 4);

    let slot_of = |s: &Symbolic<f64>| {
        let orig = s.node_id().unwrap();
        let id = data.graph().optimized_node(orig).unwrap_or(orig);
        data.node(id).unwrap().slot_id()
    };
    // t1 is last read at rank 2, so t3 (rank 3) takes its slot back
    assert_eq!(slot_of(&temps[0]), 3);
    assert_eq!(slot_of(&temps[1]), 4);
    assert_eq!(slot_of(&temps[2]), 3);
    assert_eq!(data.max_variable_id(), 4);
    assert_eq!(data.temporary_count(), 2);

    let eval = SlotEvaluator::compile(&data).unwrap();
    assert_eq!(eval.evaluate(&[0.3]).unwrap(), vec![staircase_reference(0.3)]);
}

#[test]
fn test_without_reuse_every_temporary_has_its_slot() {
    let handler = CodeHandler::<f64>::new().with_reuse_ids(false);
    let (y, _) = staircase(&handler);

    let names = DefaultNameGenerator::default();
    let data = handler.generate(&[y], &DefaultPolicy, &names).unwrap();
    assert_eq!(data.max_variable_id(), 5);
    assert_eq!(data.temporary_count(), 3);

    let eval = SlotEvaluator::compile(&data).unwrap();
    assert_eq!(eval.evaluate(&[0.3]).unwrap(), vec![staircase_reference(0.3)]);
}

#[test]
fn test_value_read_inside_inlined_expression_stays_alive() {
    let handler = CodeHandler::<f64>::new();
    let x = handler.make_variable();
    let a = x.exp();
    let b = (&a + &a).sin();
    // `inner` is inlined into `c`, so `a` is read by the instruction computing `c`
    let inner = &b * 2.0 + &a;
    let c = inner.cos();
    let d = (&c + &c).tanh() + &a;

    let eval = super::evaluator_for(&handler, &[d]);
    let xr = 0.7_f64;
    let ar = xr.exp();
    let br = (ar + ar).sin();
    let cr = (br * 2.0 + ar).cos();
    let expected = (cr + cr).tanh() + ar;
    super::assert_close(eval.evaluate(&[xr]).unwrap()[0], expected, 1e-14);
}

#[test]
fn test_reuse_never_increases_slot_count() {
    let build = |reuse: bool| {
        let handler = CodeHandler::<f64>::new().with_reuse_ids(reuse);
        let x = handler.make_variables(2);
        let mut acc = &x[0] + &x[1];
        for _ in 0..6 {
            let shared = acc.sin();
            acc = &shared * &shared + &x[0];
        }
        let names = DefaultNameGenerator::default();
        let data = handler.generate(&[acc], &DefaultPolicy, &names).unwrap();
        let eval = SlotEvaluator::compile(&data).unwrap();
        (data.max_variable_id(), eval.evaluate(&[0.1, 0.2]).unwrap())
    };
    let (reused_max, reused_out) = build(true);
    let (plain_max, plain_out) = build(false);
    assert!(reused_max < plain_max);
    assert_eq!(reused_out, plain_out);
}
