use jules::{EngineBuilder, ResultType};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let engine = EngineBuilder::<i64>::new()
        .fact("positive", |n| *n > 0)
        .rule("small", |r| r.test(|n, _| n.abs() < 10))
        .rule("even", |r| r.test(|n, _| n % 2 == 0))
        .rule("positive_even", |r| r.test(|_, _| true).and("even").and("positive"))
        .rule("odd", |r| r.test(|_, _| true).and_not("even"))
        .expect(ResultType::ZeroOrMany)
        .build()
        .expect("failed to build engine");

    let report = engine.run_detailed(&4).expect("evaluation failed");

    println!("{report}");
    println!();
    println!("Evaluation order: {:?}", report.evaluation_order());
    println!("Matched rules: {:?}", report.matched());
    println!("Facts: {:?}", report.facts());
    println!("Duration: {:?}", report.duration());

    if let Some(deps) = engine.dependencies_of("positive_even") {
        println!("positive_even depends on: {deps:?}");
    }
}
