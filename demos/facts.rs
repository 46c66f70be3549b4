use jules::{Engine, EngineConfig, Fact, ResultType, Rule};

#[derive(Debug)]
struct Applicant {
    age: u32,
    location: &'static str,
}

const STATES: &[&str] = &["CA", "FL", "NY", "PA", "TX"];

fn main() -> Result<(), jules::JulesError> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("jules=trace".parse().expect("valid directive")),
        )
        .init();

    // Billing codes: California overrides every age band, and only
    // applicants in a known state are billed at all.
    let config = EngineConfig::new(vec![
        Rule::new("JUNIOR")
            .test(|a: &Applicant, _| (21..30).contains(&a.age))
            .result_with(|a: &Applicant| format!("{}576", a.location))
            .and("IN_US")
            .and_not("CALIFORNIA"),
        Rule::new("STANDARD")
            .test(|a: &Applicant, facts| (30..60).contains(&a.age) && facts.is("IN_US"))
            .result_with(|a: &Applicant| format!("{}330", a.location))
            .and_not("CALIFORNIA"),
        Rule::new("SENIOR")
            .test(|a: &Applicant, _| a.age >= 60)
            .result_with(|a: &Applicant| format!("{}810", a.location))
            .and("IN_US")
            .and_not("CALIFORNIA"),
        Rule::new("CALIFORNIA")
            .test(|a: &Applicant, _| a.location == "CA")
            .result("CA102"),
    ])
    .with_fact(Fact::new("IN_US", |a: &Applicant| {
        STATES.contains(&a.location)
    }))
    .with_result_type(ResultType::ZeroOrOne);

    let engine: Engine<Applicant> = Engine::from_config(config)?;

    for applicant in [
        Applicant { age: 26, location: "PA" },
        Applicant { age: 45, location: "NY" },
        Applicant { age: 70, location: "CA" },
        Applicant { age: 26, location: "Cabo" },
    ] {
        let code = engine.run(&applicant)?;
        println!("{applicant:?} -> {code:?}");
    }

    Ok(())
}
