use oasguard::schema::SchemaArena;
use oasguard::{ApiDescription, Keyword, ValidationReport, Validator, ValidatorBuilder};
use std::sync::Arc;
use std::thread;

const BODY: &str = r#"{"stringOne": "foo", "oneObject": {"more": "things"}}"#;

fn assert_send_sync<T: Send + Sync>() {}

fn validate(validator: &Validator) -> ValidationReport {
    let request = http::Request::post("http://localhost:8000/api/v1/products.create")
        .header("Content-Type", "application/json")
        .body(BODY)
        .unwrap();
    validator.validate_request(&request).unwrap()
}

#[test]
fn test_shared_types_are_send_and_sync() {
    assert_send_sync::<Validator>();
    assert_send_sync::<ApiDescription>();
    assert_send_sync::<SchemaArena>();
}

#[test]
fn test_one_validator_many_threads() {
    let validator = Arc::new(
        ValidatorBuilder::new()
            .from_file("tests/fixtures/products.yaml")
            .build()
            .unwrap(),
    );
    let expected = validate(&validator);
    assert_eq!(expected.violations.len(), 1);
    assert_eq!(expected.violations[0].keyword, Keyword::Type);

    let reports: Vec<ValidationReport> = thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let validator = Arc::clone(&validator);
                scope.spawn(move || (0..25).map(|_| validate(&validator)).collect::<Vec<_>>())
            })
            .collect();
        handles
            .into_iter()
            .flat_map(|handle| handle.join().unwrap())
            .collect()
    });

    assert_eq!(reports.len(), 200);
    assert!(reports.iter().all(|report| *report == expected));
}
