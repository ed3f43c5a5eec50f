use super::body::{self, BodyError};
use super::parameters::{ParameterSources, validate_parameters};
use super::{Keyword, Location, Pointer, ValidationReport, Violation};
use crate::description::{ApiDescription, OperationSpec, ResponseSpec};
use crate::error::{GuardError, Result};
use crate::models::OperationAddress;
use crate::routing::ResolvedRoute;
use crate::schema::{SchemaId, SchemaValidator};
use http::{HeaderMap, StatusCode};
use indexmap::IndexMap;

/// An inbound request paired with the operation it was routed to
#[derive(Debug)]
pub struct RoutedRequest<'r, B> {
    pub request: &'r http::Request<B>,
    pub route: ResolvedRoute,
}

impl<'r, B> RoutedRequest<'r, B> {
    pub fn new(request: &'r http::Request<B>, route: ResolvedRoute) -> Self {
        Self { request, route }
    }

    pub fn address(&self) -> &OperationAddress {
        &self.route.address
    }
}

/// Checks messages against the operations of a compiled description
#[derive(Debug, Clone, Copy)]
pub struct MessageValidator<'d> {
    description: &'d ApiDescription,
    schemas: SchemaValidator<'d>,
}

impl<'d> MessageValidator<'d> {
    pub fn new(description: &'d ApiDescription) -> Self {
        Self {
            description,
            schemas: SchemaValidator::new(description.schemas()),
        }
    }

    pub fn with_formats(mut self, validate_formats: bool) -> Self {
        self.schemas = self.schemas.with_formats(validate_formats);
        self
    }

    /// Validate parameters then body of a routed request
    pub fn validate_request<B: AsRef<[u8]>>(
        &self,
        routed: &RoutedRequest<'_, B>,
    ) -> Result<ValidationReport> {
        let operation = self.operation(routed.address())?;
        let request = routed.request;

        let sources = ParameterSources::new(
            routed.route.path_parameters.clone(),
            request.uri().query(),
            request.headers(),
        );
        let mut violations = validate_parameters(
            &operation.parameters,
            &sources,
            &self.schemas,
            self.description.schemas(),
        );

        if let Some(spec) = &operation.request_body {
            violations.extend(self.validate_body(
                &spec.content,
                spec.required,
                request.headers(),
                request.body().as_ref(),
            ));
        }

        tracing::debug!(
            address = %operation.address,
            violations = violations.len(),
            "Validated request"
        );
        Ok(ValidationReport::new(operation.address.clone(), violations))
    }

    /// Validate a response produced by the operation at `address`
    pub fn validate_response<B: AsRef<[u8]>>(
        &self,
        address: &OperationAddress,
        response: &http::Response<B>,
    ) -> Result<ValidationReport> {
        let operation = self.operation(address)?;
        let status = response.status();

        let Some(spec) = select_response(&operation.responses, status) else {
            let violation = Violation::new(
                Location::Body,
                Keyword::UndeclaredResponseCode,
                format!("status {} is not declared for {}", status.as_u16(), address),
            );
            tracing::debug!(%address, status = status.as_u16(), "Undeclared response code");
            return Ok(ValidationReport::new(address.clone(), vec![violation]));
        };

        let sources = ParameterSources::new(IndexMap::new(), None, response.headers());
        let mut violations = validate_parameters(
            &spec.headers,
            &sources,
            &self.schemas,
            self.description.schemas(),
        );

        let body_required = spec.content.values().any(|schema| !schema.is_any());
        violations.extend(self.validate_body(
            &spec.content,
            body_required,
            response.headers(),
            response.body().as_ref(),
        ));

        tracing::debug!(
            %address,
            status = status.as_u16(),
            violations = violations.len(),
            "Validated response"
        );
        Ok(ValidationReport::new(address.clone(), violations))
    }

    fn operation(&self, address: &OperationAddress) -> Result<&'d OperationSpec> {
        self.description
            .operation(address)
            .ok_or_else(|| GuardError::UnknownOperation(address.to_string()))
    }

    fn validate_body(
        &self,
        content: &IndexMap<String, SchemaId>,
        required: bool,
        headers: &HeaderMap,
        body: &[u8],
    ) -> Vec<Violation> {
        if body.is_empty() {
            return if required {
                vec![BodyError::Missing.into_violation()]
            } else {
                vec![]
            };
        }
        if content.is_empty() {
            return vec![];
        }

        let content_type = headers
            .get(http::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let Some((_, schema)) = body::select_media_type(content, content_type) else {
            let shown = if content_type.is_empty() {
                "(none)".to_string()
            } else {
                body::essence(content_type)
            };
            return vec![BodyError::UnsupportedMediaType(shown).into_violation()];
        };

        if schema.is_any() {
            return vec![];
        }

        match body::decode(content_type, body, schema, self.description.schemas()) {
            Ok(Some(value)) => {
                self.schemas
                    .validate(schema, &value, Location::Body, &Pointer::root())
            }
            Ok(None) => vec![],
            Err(error) => vec![error.into_violation()],
        }
    }
}

/// Exact status, then its `NXX` range, then `default`
fn select_response(
    responses: &IndexMap<String, ResponseSpec>,
    status: StatusCode,
) -> Option<&ResponseSpec> {
    let code = status.as_u16();
    let range = format!("{}XX", code / 100);

    responses
        .get(code.to_string().as_str())
        .or_else(|| responses.get(range.as_str()))
        .or_else(|| responses.get("default"))
}
