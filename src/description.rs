//! The compiled, read-only form of an OpenAPI document.

use crate::error::{GuardError, Result};
use crate::models::openapi::{
    Header, MediaType, OpenApiDocument, Parameter, ParameterLocation, Referenceable, RequestBody,
    Response, Server,
};
use crate::models::{HttpMethod, OperationAddress};
use crate::routing::OperationResolver;
use crate::schema::{SchemaArena, SchemaCompiler, SchemaId};
use indexmap::IndexMap;

const MAX_REF_DEPTH: usize = 16;

/// Header parameters OpenAPI says to ignore; they are described elsewhere
const RESERVED_HEADERS: [&str; 3] = ["accept", "content-type", "authorization"];

/// A declared parameter (or response header) with its compiled schema
#[derive(Debug, Clone)]
pub struct ParameterSpec {
    pub name: String,
    pub location: ParameterLocation,
    pub required: bool,
    pub schema: SchemaId,
    /// Array values arrive as repeated keys rather than comma-separated
    pub explode: bool,
}

#[derive(Debug, Clone)]
pub struct RequestBodySpec {
    pub required: bool,
    /// Media type (as declared) → schema
    pub content: IndexMap<String, SchemaId>,
}

#[derive(Debug, Clone, Default)]
pub struct ResponseSpec {
    pub headers: Vec<ParameterSpec>,
    pub content: IndexMap<String, SchemaId>,
}

#[derive(Debug, Clone)]
pub struct OperationSpec {
    pub address: OperationAddress,
    pub operation_id: Option<String>,
    pub parameters: Vec<ParameterSpec>,
    pub request_body: Option<RequestBodySpec>,
    /// Keyed by status code, `NXX` range or `default`
    pub responses: IndexMap<String, ResponseSpec>,
}

/// Everything the validator needs from a document, compiled once
#[derive(Debug, Clone)]
pub struct ApiDescription {
    pub title: String,
    pub version: String,
    schemas: SchemaArena,
    operations: IndexMap<OperationAddress, OperationSpec>,
    base_paths: Vec<String>,
}

impl ApiDescription {
    pub fn from_document(document: &OpenApiDocument) -> Result<Self> {
        let mut schemas = SchemaArena::new();
        let empty = IndexMap::new();
        let component_schemas = document
            .components
            .as_ref()
            .map(|c| &c.schemas)
            .unwrap_or(&empty);

        let mut operations = IndexMap::new();
        {
            let mut builder = Builder {
                document,
                compiler: SchemaCompiler::new(&mut schemas, component_schemas),
            };

            for (path, item) in &document.paths {
                let shared = builder.parameters(&item.parameters, path)?;

                for (method, operation) in item.operations() {
                    let address = OperationAddress::new(path.clone(), method);
                    let context = address.to_string();

                    let mut parameters = shared.clone();
                    for parameter in builder.parameters(&operation.parameters, &context)? {
                        match parameters
                            .iter_mut()
                            .find(|p| p.name == parameter.name && p.location == parameter.location)
                        {
                            Some(existing) => *existing = parameter,
                            None => parameters.push(parameter),
                        }
                    }

                    let request_body = operation
                        .request_body
                        .as_ref()
                        .map(|body| builder.request_body(body, &context))
                        .transpose()?;

                    let mut responses = IndexMap::new();
                    for (status, response) in &operation.responses {
                        let spec = builder.response(response, &format!("{} {}", context, status))?;
                        responses.insert(normalize_status_key(status), spec);
                    }

                    operations.insert(
                        address.clone(),
                        OperationSpec {
                            address,
                            operation_id: operation.operation_id.clone(),
                            parameters,
                            request_body,
                            responses,
                        },
                    );
                }
            }
        }

        let base_paths = document.servers.iter().filter_map(server_base_path).collect();

        tracing::debug!(
            title = %document.info.title,
            operations = operations.len(),
            schemas = schemas.len(),
            "Compiled API description"
        );

        Ok(Self {
            title: document.info.title.clone(),
            version: document.info.version.clone(),
            schemas,
            operations,
            base_paths,
        })
    }

    pub fn operation(&self, address: &OperationAddress) -> Option<&OperationSpec> {
        self.operations.get(address)
    }

    /// Operations in document order
    pub fn operations(&self) -> impl Iterator<Item = &OperationSpec> {
        self.operations.values()
    }

    pub fn schemas(&self) -> &SchemaArena {
        &self.schemas
    }

    pub fn base_paths(&self) -> &[String] {
        &self.base_paths
    }

    /// A resolver over every declared operation and server base path
    pub fn resolver(&self) -> OperationResolver {
        OperationResolver::new(self.operations.keys())
            .with_base_paths(self.base_paths.iter().cloned())
    }

    pub fn methods_for(&self, path: &str) -> Vec<HttpMethod> {
        self.operations
            .keys()
            .filter(|a| a.path == path)
            .map(|a| a.method)
            .collect()
    }
}

struct Builder<'a> {
    document: &'a OpenApiDocument,
    compiler: SchemaCompiler<'a>,
}

impl<'a> Builder<'a> {
    fn parameters(
        &mut self,
        declared: &'a [Referenceable<Parameter>],
        context: &str,
    ) -> Result<Vec<ParameterSpec>> {
        let document = self.document;
        let table = document.components.as_ref().map(|c| &c.parameters);
        let mut specs = vec![];

        for entry in declared {
            let parameter = resolve(entry, "parameters", table)?;
            if parameter.location == ParameterLocation::Header
                && RESERVED_HEADERS.contains(&parameter.name.to_ascii_lowercase().as_str())
            {
                continue;
            }

            let location = format!("{} parameter {}", context, parameter.name);
            let schema = match (&parameter.schema, &parameter.content) {
                (Some(schema), _) => self.compiler.compile(schema, &location)?,
                (None, Some(content)) => self.first_media_schema(content, &location)?,
                (None, None) => SchemaId::ANY,
            };

            let form_style = matches!(
                parameter.location,
                ParameterLocation::Query | ParameterLocation::Cookie
            );
            specs.push(ParameterSpec {
                name: parameter.name.clone(),
                location: parameter.location,
                // path parameters are always required
                required: parameter.location == ParameterLocation::Path
                    || parameter.required.unwrap_or(false),
                schema,
                explode: parameter.explode.unwrap_or(form_style),
            });
        }

        Ok(specs)
    }

    fn request_body(
        &mut self,
        body: &'a Referenceable<RequestBody>,
        context: &str,
    ) -> Result<RequestBodySpec> {
        let document = self.document;
        let table = document.components.as_ref().map(|c| &c.request_bodies);
        let body = resolve(body, "requestBodies", table)?;

        Ok(RequestBodySpec {
            required: body.required.unwrap_or(false),
            content: self.content(&body.content, &format!("{} requestBody", context))?,
        })
    }

    fn response(
        &mut self,
        response: &'a Referenceable<Response>,
        context: &str,
    ) -> Result<ResponseSpec> {
        let document = self.document;
        let table = document.components.as_ref().map(|c| &c.responses);
        let response = resolve(response, "responses", table)?;
        let header_table = document.components.as_ref().map(|c| &c.headers);

        let mut headers = vec![];
        for (name, header) in &response.headers {
            if name.eq_ignore_ascii_case("content-type") {
                continue;
            }
            let header: &Header = resolve(header, "headers", header_table)?;
            let schema = match &header.schema {
                Some(schema) => self
                    .compiler
                    .compile(schema, &format!("{} header {}", context, name))?,
                None => SchemaId::ANY,
            };
            headers.push(ParameterSpec {
                name: name.clone(),
                location: ParameterLocation::Header,
                required: header.required.unwrap_or(false),
                schema,
                explode: header.explode.unwrap_or(false),
            });
        }

        Ok(ResponseSpec {
            headers,
            content: self.content(&response.content, context)?,
        })
    }

    fn content(
        &mut self,
        content: &IndexMap<String, MediaType>,
        context: &str,
    ) -> Result<IndexMap<String, SchemaId>> {
        let mut compiled = IndexMap::new();
        for (media_type, declared) in content {
            let schema = match &declared.schema {
                Some(schema) => self
                    .compiler
                    .compile(schema, &format!("{} {}", context, media_type))?,
                None => SchemaId::ANY,
            };
            compiled.insert(media_type.clone(), schema);
        }
        Ok(compiled)
    }

    fn first_media_schema(
        &mut self,
        content: &IndexMap<String, MediaType>,
        context: &str,
    ) -> Result<SchemaId> {
        match content.values().next().and_then(|m| m.schema.as_ref()) {
            Some(schema) => self.compiler.compile(schema, context),
            None => Ok(SchemaId::ANY),
        }
    }
}

/// `2xx` and `2XX` are the same range; `default` stays lowercase
fn normalize_status_key(status: &str) -> String {
    if status.eq_ignore_ascii_case("default") {
        "default".to_string()
    } else {
        status.to_ascii_uppercase()
    }
}

/// Follow `$ref`s into a components section
fn resolve<'d, T>(
    mut entry: &'d Referenceable<T>,
    section: &str,
    table: Option<&'d IndexMap<String, Referenceable<T>>>,
) -> Result<&'d T> {
    let prefix = format!("#/components/{}/", section);

    for _ in 0..MAX_REF_DEPTH {
        match entry {
            Referenceable::Item(item) => return Ok(item),
            Referenceable::Reference { reference } => {
                entry = reference
                    .strip_prefix(prefix.as_str())
                    .and_then(|name| table?.get(name))
                    .ok_or_else(|| GuardError::UnresolvedReference(reference.clone()))?;
            }
        }
    }

    Err(GuardError::UnresolvedReference(format!(
        "reference chain in components/{} is too deep",
        section
    )))
}

/// Path part of a server URL with variables replaced by their defaults
fn server_base_path(server: &Server) -> Option<String> {
    let mut url = server.url.clone();
    for (name, variable) in &server.variables {
        url = url.replace(&format!("{{{}}}", name), &variable.default);
    }

    let path = match url.find("://") {
        Some(scheme_end) => {
            let after_scheme = &url[scheme_end + 3..];
            after_scheme.find('/').map(|i| &after_scheme[i..]).unwrap_or("")
        }
        None => url.as_str(),
    };

    let path = path.split(['?', '#']).next().unwrap_or("").trim_end_matches('/');
    (path.starts_with('/') && path.len() > 1).then(|| path.to_string())
}
