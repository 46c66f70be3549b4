use std::sync::Arc;
use std::thread;

use jules::{EngineBuilder, ResultType};

fn main() {
    let engine = Arc::new(
        EngineBuilder::<u32>::new()
            .rule("eligible", |r| r.test(|age, _| *age >= 18))
            .rule("retired", |r| r.test(|age, _| *age >= 65))
            .rule("working", |r| r.test(|_, _| true).and("eligible").and_not("retired"))
            .expect(ResultType::ZeroOrMany)
            .build()
            .expect("failed to build engine"),
    );

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let age = 16 + 20 * i;
                let result = engine.test(&age);
                println!("Thread {i} (age {age}): {result:?}");
            })
        })
        .collect();

    for h in handles {
        h.join().unwrap();
    }
}
