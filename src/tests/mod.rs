mod slot_reuse_tests;
mod solver_tests;

use crate::{CodeHandler, DefaultNameGenerator, DefaultPolicy, SlotEvaluator, Symbolic};

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Generate `outputs` with the default policy and compile the result
pub(crate) fn evaluator_for(handler: &CodeHandler<f64>, outputs: &[Symbolic<f64>]) -> SlotEvaluator<f64> {
    let names = DefaultNameGenerator::default();
    let data = handler
        .generate(outputs, &DefaultPolicy, &names)
        .expect("generation failed");
    SlotEvaluator::compile(&data).expect("compilation failed")
}

pub(crate) fn assert_close(got: f64, expected: f64, tol: f64) {
    assert!(
        (got - expected).abs() <= tol,
        "expected {expected}, got {got} (tolerance {tol})"
    );
}
