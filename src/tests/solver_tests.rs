use super::{assert_close, evaluator_for, init_logger};
use crate::{CodeGenError, CodeHandler, OpCode, SolveError, Symbolic};

#[test]
fn test_eliminate_through_nested_logarithms() {
    init_logger();
    let handler = CodeHandler::<f64>::new();
    let u = handler.make_variables(2);
    // log(log(u0)) - u1 * ln(ln(10)) = 0  =>  u0 = 10 when u1 = 1
    let c = 10.0_f64.ln().ln();
    let residual = u[0].log().log() - &u[1] * c;

    handler.substitute_independent(&u[0], &residual).unwrap();
    assert_eq!(handler.independent_count(), 1);
    assert_eq!(handler.independent_index(&u[1]), Ok(0));
    assert_eq!(
        handler.independent_index(&u[0]),
        Err(CodeGenError::NotIndependent)
    );

    let eval = evaluator_for(&handler, &[u[0].clone()]);
    assert_eq!(eval.input_count(), 1);
    assert_close(eval.evaluate(&[1.0]).unwrap()[0], 10.0, 1e-12);
}

#[test]
fn test_eliminated_variable_used_downstream() {
    let handler = CodeHandler::<f64>::new();
    let u = handler.make_variables(3);
    let y = &u[0] * &u[2] + u[1].exp();
    // sqrt(u1) - u2 = 0  =>  u1 = u2 * u2
    let residual = u[1].sqrt() - &u[2];

    handler.substitute_independent(&u[1], &residual).unwrap();
    assert_eq!(handler.independent_count(), 2);

    let eval = evaluator_for(&handler, &[y]);
    let (u0, u2) = (1.5_f64, 0.5_f64);
    assert_close(
        eval.evaluate(&[u0, u2]).unwrap()[0],
        u0 * u2 + (u2 * u2).exp(),
        1e-15,
    );
}

#[test]
fn test_solve_for_builds_inverse() {
    let handler = CodeHandler::<f64>::new();
    let u = handler.make_variables(2);
    // 3 - exp(u0) / u1 = 0  =>  u0 = log(3 * u1)
    let residual = Symbolic::Parameter(3.0) - u[0].exp() / &u[1];
    let solution = handler.solve_for(&residual, &u[0]).unwrap();
    assert_eq!(handler.independent_count(), 2);

    let eval = evaluator_for(&handler, &[solution]);
    assert_close(eval.evaluate(&[0.0, 2.0]).unwrap()[0], 6.0_f64.ln(), 1e-15);
}

#[test]
fn test_failed_elimination_keeps_graph() {
    let handler = CodeHandler::<f64>::new();
    let u = handler.make_variables(2);
    let residual = u[0].cos() - &u[1];
    let nodes = handler.node_count();

    assert_eq!(
        handler.substitute_independent(&u[0], &residual),
        Err(CodeGenError::Solve(SolveError::Unsolvable(OpCode::Cos)))
    );
    assert_eq!(handler.node_count(), nodes);
    assert_eq!(handler.independent_count(), 2);

    // the handler is still fully usable
    let eval = evaluator_for(&handler, &[residual]);
    assert_close(eval.evaluate(&[0.0, 0.25]).unwrap()[0], 0.75, 1e-15);
}

#[test]
fn test_foreign_independent_is_rejected() {
    let h1 = CodeHandler::<f64>::new();
    let h2 = CodeHandler::<f64>::new();
    let x = h1.make_variable();
    let y = h2.make_variable();
    let residual = &y - 1.0;
    assert_eq!(
        h2.substitute_independent(&x, &residual),
        Err(CodeGenError::CrossGraph)
    );
}
