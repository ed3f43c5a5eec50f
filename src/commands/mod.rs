pub mod request;
pub mod response;
pub mod routes;

pub use request::execute_request;
pub use response::execute_response;
pub use routes::execute_routes;

use crate::cli::MessageArgs;
use crate::models::HttpMethod;
use crate::validation::ValidationReport;
use crate::validator::{Validator, ValidatorBuilder, ValidatorOptions};
use crate::{GuardError, Result};
use colored::*;
use http::{HeaderMap, HeaderName, HeaderValue};
use std::io::Read;
use std::path::Path;

pub(crate) fn load_validator(args: &MessageArgs) -> Result<Validator> {
    let options = ValidatorOptions {
        validate_formats: !args.no_formats,
        strip_server_prefix: !args.no_server_prefix,
    };
    ValidatorBuilder::new()
        .from_file(&args.openapi)
        .with_options(options)
        .build()
}

/// Parse repeated `Name: value` arguments
pub(crate) fn parse_headers(raw: &[String]) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    for line in raw {
        let (name, value) = line.split_once(':').ok_or_else(|| {
            GuardError::InvalidInput(format!("header '{}' is not in 'Name: value' form", line))
        })?;
        let name = HeaderName::from_bytes(name.trim().as_bytes()).map_err(|e| {
            GuardError::InvalidInput(format!("header name '{}': {}", name.trim(), e))
        })?;
        let value = HeaderValue::from_str(value.trim())
            .map_err(|e| GuardError::InvalidInput(format!("header value for '{}': {}", name, e)))?;
        headers.append(name, value);
    }
    Ok(headers)
}

/// Read a body from a file, or stdin for `-`; no path means an empty body
pub(crate) fn read_body(path: Option<&Path>) -> Result<Vec<u8>> {
    match path {
        None => Ok(vec![]),
        Some(p) if p == Path::new("-") => {
            let mut body = vec![];
            std::io::stdin().read_to_end(&mut body)?;
            Ok(body)
        }
        Some(p) => Ok(std::fs::read(p)?),
    }
}

pub(crate) fn colored_method(method: HttpMethod) -> ColoredString {
    let label = format!("{:<7}", method.as_str());
    match method {
        HttpMethod::Get => label.green(),
        HttpMethod::Post => label.yellow(),
        HttpMethod::Put | HttpMethod::Patch => label.blue(),
        HttpMethod::Delete => label.red(),
        _ => label.normal(),
    }
}

/// Print a report; true when it holds no violations
pub(crate) fn print_report(report: &ValidationReport, subject: &str) -> bool {
    println!("  Operation: {}", report.address.to_string().cyan());

    if report.is_valid() {
        println!("{}", format!("✓ {} is valid", subject).green().bold());
        return true;
    }

    println!(
        "{}",
        format!("✗ {} has {} violation(s):", subject, report.len()).red().bold()
    );
    for violation in &report.violations {
        println!("    - {}", violation.format().red());
    }
    false
}
