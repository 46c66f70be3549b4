use jules::{Engine, EngineBuilder};

fn main() {
    // Membership levels by age; the first matching rule's id is the result.
    let engine = EngineBuilder::<u32>::new()
        .rule("JUNIOR", |r| r.test(|age, _| (21..30).contains(age)))
        .rule("STANDARD", |r| r.test(|age, _| (30..60).contains(age)))
        .rule("SENIOR", |r| r.test(|age, _| *age >= 60))
        .build()
        .expect("failed to build engine");

    println!("{engine}");

    for age in [26, 45, 70, 12] {
        match engine.run(&age) {
            Ok(Some(level)) => println!("age {age}: {level}"),
            Ok(None) => println!("age {age}: no level"),
            Err(err) => println!("age {age}: {err}"),
        }
    }

    // Plain predicates resolve to their position.
    let predicates: [fn(&u32) -> bool; 2] = [|n| n % 2 == 0, |n| n % 2 == 1];
    let parity = Engine::<u32>::from_predicates(predicates).expect("failed to build engine");
    println!("parity of 7: {:?}", parity.run(&7));
}
