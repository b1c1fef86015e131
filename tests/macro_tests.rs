use serde_memo::{
    deserialize, serializable, serialize, wire, Error, Namespace, Number, Serializable, Value,
    ValueMap,
};
use std::collections::BTreeSet;
use std::rc::Rc;

#[test]
fn test_wire_macro_null() {
    let value = wire!(null);
    assert_eq!(value, Value::Null);
}

#[test]
fn test_wire_macro_booleans() {
    assert_eq!(wire!(true), Value::Bool(true));
    assert_eq!(wire!(false), Value::Bool(false));
}

#[test]
fn test_wire_macro_numbers() {
    assert_eq!(wire!(42), Value::Number(Number::Integer(42)));
    assert_eq!(wire!(3.5), Value::Number(Number::Float(3.5)));
    assert_eq!(wire!(-123), Value::Number(Number::Integer(-123)));
}

#[test]
fn test_wire_macro_strings() {
    assert_eq!(wire!("hello world"), Value::String("hello world".to_string()));
    assert_eq!(wire!(""), Value::String(String::new()));
}

#[test]
fn test_wire_macro_object_keeps_order() {
    let value = wire!({ "z": 1, "a": [true, null], "__type__": "Thing" });
    let map = value.as_object().unwrap();
    let keys: Vec<&str> = map.keys().map(String::as_str).collect();
    assert_eq!(keys, vec!["z", "a", "__type__"]);
    assert_eq!(value.type_tag(), Some("Thing"));
}

#[test]
fn test_wire_macro_expressions() {
    let name = String::from("dynamic");
    let value = wire!({ "name": (name.clone()), "count": (2 + 3) });
    let mut expected = ValueMap::new();
    expected.insert("name".to_string(), Value::String(name));
    expected.insert("count".to_string(), Value::from(5));
    assert_eq!(value, Value::Object(expected));
}

#[derive(Debug, Default, PartialEq)]
struct Token {
    kind: String,
    value: String,
    line: u32,
}
serializable!(Token { kind, value, line });

#[derive(Debug, Default)]
struct Lexicon {
    keywords: BTreeSet<String>,
    first: Option<Rc<Token>>,
}
serializable!(Lexicon as "lexer.Lexicon" { keywords, first });

#[test]
fn test_serializable_macro_encodes_declared_fields_in_order() {
    let token = Rc::new(Token {
        kind: "NAME".to_string(),
        value: "x".to_string(),
        line: 3,
    });
    let value = serialize(&token).unwrap();
    let keys: Vec<&str> = value
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["kind", "value", "line", "__type__"]);

    let namespace = Namespace::new().with::<Token>().unwrap();
    let back: Rc<Token> = deserialize(&value, &namespace).unwrap();
    assert_eq!(*back, *token);
}

#[test]
fn test_serializable_macro_custom_name() {
    assert_eq!(Lexicon::TYPE_NAME, "lexer.Lexicon");

    let lexicon = Rc::new(Lexicon {
        keywords: ["if", "else"].iter().map(|s| s.to_string()).collect(),
        first: None,
    });
    let value = serialize(&lexicon).unwrap();
    assert_eq!(
        value,
        wire!({ "keywords": ["else", "if"], "first": null, "__type__": "lexer.Lexicon" })
    );

    let namespace = Namespace::new().with::<Lexicon>().unwrap();
    let back: Rc<Lexicon> = deserialize(&value, &namespace).unwrap();
    assert_eq!(back.keywords, lexicon.keywords);
    assert!(back.first.is_none());

    let err = deserialize::<Rc<Lexicon>>(&wire!({ "keywords": [], "first": null, "__type__": "Lexicon" }), &namespace)
        .unwrap_err();
    assert_eq!(err, Error::unknown_type("Lexicon"));
}
