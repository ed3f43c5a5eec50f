//! One-stop entry point: load a document once, validate many messages.

use crate::description::ApiDescription;
use crate::error::{GuardError, Result};
use crate::loader::{load_openapi, parse_openapi_json, parse_openapi_yaml};
use crate::models::{OpenApiDocument, OperationAddress};
use crate::routing::{OperationResolver, ResolvedRoute, RouteError};
use crate::validation::{MessageValidator, RoutedRequest, ValidationReport};
use std::path::Path;

/// Engine switches
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidatorOptions {
    /// Check `format` keywords (date-time, uuid, ...)
    pub validate_formats: bool,
    /// Accept request paths prefixed with a server base path such as `/api/v1`
    pub strip_server_prefix: bool,
}

impl Default for ValidatorOptions {
    fn default() -> Self {
        Self {
            validate_formats: true,
            strip_server_prefix: true,
        }
    }
}

enum Source {
    Yaml(String),
    Json(String),
    File(std::path::PathBuf),
    Document(Box<OpenApiDocument>),
}

/// Builder for [`Validator`]
#[derive(Default)]
pub struct ValidatorBuilder {
    source: Option<Source>,
    options: ValidatorOptions,
}

impl ValidatorBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_yaml(mut self, content: impl Into<String>) -> Self {
        self.source = Some(Source::Yaml(content.into()));
        self
    }

    pub fn from_json(mut self, content: impl Into<String>) -> Self {
        self.source = Some(Source::Json(content.into()));
        self
    }

    pub fn from_file(mut self, path: impl AsRef<Path>) -> Self {
        self.source = Some(Source::File(path.as_ref().to_path_buf()));
        self
    }

    pub fn from_document(mut self, document: OpenApiDocument) -> Self {
        self.source = Some(Source::Document(Box::new(document)));
        self
    }

    pub fn with_options(mut self, options: ValidatorOptions) -> Self {
        self.options = options;
        self
    }

    pub fn build(self) -> Result<Validator> {
        let document = match self.source {
            Some(Source::Yaml(content)) => parse_openapi_yaml(&content)?,
            Some(Source::Json(content)) => parse_openapi_json(&content)?,
            Some(Source::File(path)) => load_openapi(path)?,
            Some(Source::Document(document)) => *document,
            None => {
                return Err(GuardError::DocumentLoadError(
                    "no OpenAPI document was given".to_string(),
                ));
            }
        };

        Validator::new(&document, self.options)
    }
}

/// Validates HTTP requests and responses against an OpenAPI document
#[derive(Debug, Clone)]
pub struct Validator {
    description: ApiDescription,
    resolver: OperationResolver,
    options: ValidatorOptions,
}

// Shared across request-handling threads behind an `Arc`
const _: () = {
    const fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Validator>();
    assert_send_sync::<ApiDescription>();
    assert_send_sync::<crate::schema::SchemaArena>();
};

impl Validator {
    pub fn new(document: &OpenApiDocument, options: ValidatorOptions) -> Result<Self> {
        let description = ApiDescription::from_document(document)?;
        let resolver = if options.strip_server_prefix {
            description.resolver()
        } else {
            OperationResolver::new(description.operations().map(|op| &op.address))
        };

        tracing::info!(
            title = %description.title,
            version = %description.version,
            operations = description.operations().count(),
            "Validator ready"
        );

        Ok(Self {
            description,
            resolver,
            options,
        })
    }

    pub fn builder() -> ValidatorBuilder {
        ValidatorBuilder::new()
    }

    pub fn description(&self) -> &ApiDescription {
        &self.description
    }

    pub fn options(&self) -> ValidatorOptions {
        self.options
    }

    /// Route a method and path to a declared operation
    pub fn resolve(
        &self,
        method: &str,
        path: &str,
    ) -> std::result::Result<ResolvedRoute, RouteError> {
        self.resolver.resolve(method, path)
    }

    /// Route the request, then validate it against the matched operation
    pub fn validate_request<B: AsRef<[u8]>>(
        &self,
        request: &http::Request<B>,
    ) -> Result<ValidationReport> {
        let route = self.resolve(request.method().as_str(), request.uri().path())?;
        self.messages()
            .validate_request(&RoutedRequest::new(request, route))
    }

    /// Validate a request already known to belong to `address`
    pub fn validate_routed_request<B: AsRef<[u8]>>(
        &self,
        address: &OperationAddress,
        request: &http::Request<B>,
    ) -> Result<ValidationReport> {
        if self.description.operation(address).is_none() {
            return Err(GuardError::UnknownOperation(address.to_string()));
        }

        // parameters that cannot be bound are reported as missing
        let path_parameters = self
            .resolver
            .bind(&address.path, request.uri().path())
            .unwrap_or_default();
        let route = ResolvedRoute {
            address: address.clone(),
            path_parameters,
        };
        self.messages()
            .validate_request(&RoutedRequest::new(request, route))
    }

    pub fn validate_response<B: AsRef<[u8]>>(
        &self,
        address: &OperationAddress,
        response: &http::Response<B>,
    ) -> Result<ValidationReport> {
        self.messages().validate_response(address, response)
    }

    fn messages(&self) -> MessageValidator<'_> {
        MessageValidator::new(&self.description).with_formats(self.options.validate_formats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HttpMethod;
    use crate::validation::Keyword;

    const DOC: &str = r#"
openapi: 3.1.0
info:
  title: Pets
  version: '1'
servers:
  - url: https://pets.example.com/v1
paths:
  /pets/{petId}:
    get:
      parameters:
        - name: petId
          in: path
          schema:
            type: integer
      responses:
        '200':
          description: OK
"#;

    #[test]
    fn test_builder_requires_source() {
        assert!(matches!(
            ValidatorBuilder::new().build(),
            Err(GuardError::DocumentLoadError(_))
        ));
    }

    #[test]
    fn test_validate_request_routes_through_server_prefix() {
        let validator = ValidatorBuilder::new().from_yaml(DOC).build().unwrap();

        let request = http::Request::get("https://pets.example.com/v1/pets/12")
            .body(Vec::<u8>::new())
            .unwrap();
        let report = validator.validate_request(&request).unwrap();
        assert!(report.is_valid());
        assert_eq!(report.address, OperationAddress::new("/pets/{petId}", HttpMethod::Get));

        let request = http::Request::get("/v1/pets/rex").body(Vec::<u8>::new()).unwrap();
        let report = validator.validate_request(&request).unwrap();
        assert_eq!(report.violations[0].keyword, Keyword::Type);
    }

    #[test]
    fn test_prefix_stripping_can_be_disabled() {
        let options = ValidatorOptions {
            strip_server_prefix: false,
            ..Default::default()
        };
        let validator = Validator::builder()
            .from_yaml(DOC)
            .with_options(options)
            .build()
            .unwrap();

        assert!(matches!(
            validator.resolve("GET", "/v1/pets/12"),
            Err(RouteError::NotFound { .. })
        ));
        assert!(validator.resolve("GET", "/pets/12").is_ok());
    }

    #[test]
    fn test_routing_failures_are_errors() {
        let validator = ValidatorBuilder::new().from_yaml(DOC).build().unwrap();
        let request = http::Request::delete("/pets/1").body("").unwrap();
        assert!(matches!(
            validator.validate_request(&request),
            Err(GuardError::Route(RouteError::MethodNotAllowed { .. }))
        ));
    }

    #[test]
    fn test_validate_routed_request() {
        let validator = ValidatorBuilder::new().from_yaml(DOC).build().unwrap();
        let address = OperationAddress::new("/pets/{petId}", HttpMethod::Get);

        let request = http::Request::get("/v1/pets/3").body("").unwrap();
        assert!(validator.validate_routed_request(&address, &request).unwrap().is_valid());

        let unknown = OperationAddress::new("/pets", HttpMethod::Post);
        assert!(matches!(
            validator.validate_routed_request(&unknown, &request),
            Err(GuardError::UnknownOperation(_))
        ));
    }
}
