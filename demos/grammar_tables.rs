//! Memoized round trip of a small grammar through JSON text.
//!
//! Run with: cargo run --example grammar_tables
//! Set RUST_LOG=serde_memo=trace to watch ids being assigned.

use chrono::{DateTime, Utc};
use num_bigint::BigInt;
use serde_memo::{memo_deserialize, memo_serialize, serializable, Memoizer, Namespace, Value};
use std::error::Error;
use std::rc::Rc;

#[derive(Debug, Default)]
struct Terminal {
    name: String,
    filter_out: bool,
}
serializable!(Terminal { name, filter_out });

#[derive(Debug, Default)]
struct Rule {
    origin: String,
    expansion: Vec<Rc<Terminal>>,
}
serializable!(Rule { origin, expansion });

#[derive(Debug, Default)]
struct Grammar {
    rules: Vec<Rc<Rule>>,
    built_at: Option<DateTime<Utc>>,
    fingerprint: BigInt,
}
serializable!(Grammar { rules, built_at, fingerprint });

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let name = Rc::new(Terminal {
        name: "NAME".to_string(),
        filter_out: false,
    });
    let comma = Rc::new(Terminal {
        name: "COMMA".to_string(),
        filter_out: true,
    });
    let grammar = Rc::new(Grammar {
        rules: vec![
            Rc::new(Rule {
                origin: "list".to_string(),
                expansion: vec![Rc::clone(&name), Rc::clone(&comma), Rc::clone(&name)],
            }),
            Rc::new(Rule {
                origin: "item".to_string(),
                expansion: vec![Rc::clone(&name)],
            }),
        ],
        built_at: Some(Utc::now()),
        fingerprint: "340282366920938463463374607431768211457".parse()?,
    });

    let (payload, memo) = memo_serialize(&grammar, Memoizer::new().track::<Terminal>())?;
    let text = serde_json::to_string_pretty(&(&payload, &memo))?;
    println!("Wire output:\n{}\n", text);

    let (payload, memo): (Value, Value) = serde_json::from_str(&text)?;
    let mut namespace = Namespace::new();
    namespace.register::<Terminal>()?;
    namespace.register::<Rule>()?;
    namespace.register::<Grammar>()?;

    let back: Rc<Grammar> = memo_deserialize(&payload, &memo, &namespace)?;
    let list = &back.rules[0].expansion;
    assert!(Rc::ptr_eq(&list[0], &list[2]));
    assert!(Rc::ptr_eq(&list[0], &back.rules[1].expansion[0]));
    assert_eq!(back.fingerprint, grammar.fingerprint);
    println!("✓ Round-trip successful, NAME is held by {} slots", Rc::strong_count(&list[0]));

    Ok(())
}
