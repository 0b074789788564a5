#![allow(
    clippy::unwrap_used,
    clippy::print_stdout,
    reason = "Demo: unwrap for simplicity, stdout for demonstration"
)]
//! Source Generation Walkthrough
//!
//! Records a small pendulum model, prints the C statements generated with and
//! without chain flattening, eliminates one independent and replays the
//! result numerically.
//!
//! Run with: RUST_LOG=debug cargo run --example `source_generation`

use env_logger::Env;
use symb_codegen::{
    CLanguage, CodeHandler, DaeVarInfo, DefaultNameGenerator, DefaultPolicy, SlotEvaluator,
    Symbolic,
};

fn pendulum(handler: &CodeHandler<f64>) -> (Vec<Symbolic<f64>>, Vec<Symbolic<f64>>) {
    // x, y, vx, vy, tension, length, g
    let u = handler.make_variables(7);
    for (var, name) in u.iter().zip(["x", "y", "vx", "vy", "T", "l", "g"]) {
        var.set_name(name).unwrap();
    }
    let (x, y, vx, vy, t, l, g) = (&u[0], &u[1], &u[2], &u[3], &u[4], &u[5], &u[6]);

    let residuals = vec![
        vx - (t * x) * -1.0,
        vy - (g - t * y),
        x * x + y * y - l * l,
    ];
    (u, residuals)
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let names = DefaultNameGenerator::new("res", "u", "tmp");
    let language = CLanguage::default();

    for optimize in [false, true] {
        let handler = CodeHandler::<f64>::new()
            .with_optimize(optimize)
            .with_verbose(true);
        let (_, residuals) = pendulum(&handler);
        let source = handler
            .generate_code(&residuals, &language, &names, "pendulum")
            .unwrap();
        println!("--- optimize = {optimize} ---\n{source}");
    }

    // eliminate the length: l = sqrt(x^2 + y^2)
    let handler = CodeHandler::<f64>::new();
    let (u, residuals) = pendulum(&handler);
    let length = (&u[0] * &u[0] + &u[1] * &u[1]).sqrt() - &u[5];
    handler.substitute_independent(&u[5], &length).unwrap();
    println!(
        "--- after eliminating l ({} independents) ---\n{}",
        handler.independent_count(),
        handler
            .generate_code(&residuals, &language, &names, "pendulum_reduced")
            .unwrap()
    );

    let data = handler.generate(&residuals, &DefaultPolicy, &names).unwrap();
    let eval = SlotEvaluator::compile(&data).unwrap();
    let point = [0.6, -0.8, 0.0, 0.0, 12.0, 9.81];
    println!("residuals at {point:?}: {:?}", eval.evaluate(&point).unwrap());

    let mut vars: Vec<DaeVarInfo> = ["x", "y", "vx", "vy", "T", "g"]
        .into_iter()
        .map(DaeVarInfo::new)
        .collect();
    vars[2] = DaeVarInfo::derivative_of(0, "vx");
    vars[3] = DaeVarInfo::derivative_of(1, "vy");
    vars[5].make_constant();
    for var in &vars {
        println!("{var}");
    }
}
