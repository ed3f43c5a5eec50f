use oasguard::loader::load_openapi;
use oasguard::{
    ApiDescription, GuardError, HttpMethod, Keyword, OperationAddress, ValidatorBuilder,
};
use std::io::Write;
use std::path::Path;

#[test]
fn test_load_yaml_fixture() {
    let document = load_openapi(Path::new("tests/fixtures/petstore.yaml")).unwrap();
    assert_eq!(document.info.title, "Petstore");
    assert_eq!(document.openapi, "3.0.3");
    assert!(document.paths.contains_key("/pets/{petId}"));

    let description = ApiDescription::from_document(&document).unwrap();
    assert_eq!(description.base_paths(), &["/v2".to_string()]);
    let ids: Vec<_> = description
        .operations()
        .filter_map(|op| op.operation_id.as_deref())
        .collect();
    assert_eq!(
        ids,
        vec!["listPets", "createPet", "showPet", "deletePet", "myPets", "replaceNotes"]
    );
}

#[test]
fn test_json_document_with_3_1_keywords() {
    let validator = ValidatorBuilder::new()
        .from_file("tests/fixtures/inventory.json")
        .build()
        .unwrap();
    let address = OperationAddress::new("/items/{sku}", HttpMethod::Patch);

    let valid = http::Request::patch("/items/ABC-12")
        .header("content-type", "application/merge-patch+json")
        .body(r#"{"count": 1, "note": null}"#)
        .unwrap();
    assert!(validator.validate_routed_request(&address, &valid).unwrap().is_valid());

    let invalid = http::Request::patch("/items/abc")
        .header("content-type", "application/merge-patch+json")
        .body(r#"{"count": 0}"#)
        .unwrap();
    let report = validator.validate_request(&invalid).unwrap();
    let keywords: Vec<_> = report.violations.iter().map(|v| v.keyword).collect();
    assert_eq!(keywords, vec![Keyword::Pattern, Keyword::ExclusiveMinimum]);

    let empty_patch = http::Request::patch("/items/ABC-1")
        .header("content-type", "application/merge-patch+json")
        .body("{}")
        .unwrap();
    let report = validator.validate_request(&empty_patch).unwrap();
    assert_eq!(report.violations[0].keyword, Keyword::MinProperties);
}

#[test]
fn test_swagger_2_is_rejected() {
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    writeln!(
        file,
        "swagger: '2.0'\nopenapi: 2.0.0\ninfo:\n  title: Old\n  version: '1'\npaths:\n  /a: {{}}"
    )
    .unwrap();

    let result = ValidatorBuilder::new().from_file(file.path()).build();
    assert!(matches!(result, Err(GuardError::UnsupportedVersion(v)) if v == "2.0.0"));
}

#[test]
fn test_missing_file() {
    let result = ValidatorBuilder::new()
        .from_file("tests/fixtures/does-not-exist.yaml")
        .build();
    assert!(matches!(
        result,
        Err(GuardError::DocumentLoadError(m)) if m.contains("does-not-exist")
    ));
}

#[test]
fn test_external_references_are_unresolved() {
    let yaml = r#"
openapi: 3.0.0
info:
  title: Split
  version: '1'
paths:
  /a:
    get:
      responses:
        '200':
          description: OK
          content:
            application/json:
              schema:
                $ref: 'other.yaml#/components/schemas/Thing'
"#;
    let result = ValidatorBuilder::new().from_yaml(yaml).build();
    assert!(matches!(result, Err(GuardError::UnresolvedReference(_))));
}

#[test]
fn test_schema_reference_cycles_are_rejected() {
    let yaml = r#"
openapi: 3.0.3
info:
  title: Loop
  version: '1'
paths:
  /things:
    post:
      requestBody:
        content:
          application/json:
            schema:
              $ref: '#/components/schemas/A'
      responses:
        '204':
          description: Stored
components:
  schemas:
    A:
      $ref: '#/components/schemas/B'
    B:
      allOf:
        - $ref: '#/components/schemas/A'
"#;
    let result = ValidatorBuilder::new().from_yaml(yaml).build();
    assert!(matches!(result, Err(GuardError::InvalidSchema { .. })), "{:?}", result.err());
}
