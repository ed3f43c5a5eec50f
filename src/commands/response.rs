use super::{load_validator, parse_headers, print_report, read_body};
use crate::cli::MessageArgs;
use crate::{GuardError, Result};
use colored::*;

pub fn execute_response(args: &MessageArgs, status: u16) -> Result<bool> {
    let validator = load_validator(args)?;

    let path = args.path.split('?').next().unwrap_or_default();
    let route = match validator.resolve(&args.method, path) {
        Ok(route) => route,
        Err(e) => {
            println!("{}", "✗ Request could not be routed".red().bold());
            println!("    - {}", e.to_string().red());
            return Ok(false);
        }
    };

    let mut builder = http::Response::builder().status(status);
    if let Some(headers) = builder.headers_mut() {
        headers.extend(parse_headers(&args.headers)?);
    }
    let response = builder
        .body(read_body(args.body.as_deref())?)
        .map_err(|e| GuardError::InvalidInput(e.to_string()))?;

    println!("{}", "Validating response...".bright_blue());
    println!("  {} for {}", status, route.address);

    let report = validator.validate_response(&route.address, &response)?;
    Ok(print_report(&report, "Response"))
}
