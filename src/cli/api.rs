//! Arguments for the raw 'api' command

use clap::Parser;

use super::common::OutputFormat;

/// Arguments for 'api'
#[derive(Parser, Debug)]
pub struct ApiArgs {
    /// HTTP method (GET, POST, PUT, DELETE)
    #[arg(value_parser = parse_method)]
    pub method: reqwest::Method,

    /// API path, e.g. /block/volumes/bulk
    pub path: String,

    /// JSON request body
    #[arg(short = 'd', long)]
    pub data: Option<String>,

    /// Query parameter (repeatable)
    #[arg(short = 'p', long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub params: Vec<(String, String)>,

    /// Output format
    #[arg(short = 'o', long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,
}

fn parse_method(s: &str) -> Result<reqwest::Method, String> {
    match s.to_ascii_uppercase().as_str() {
        "GET" => Ok(reqwest::Method::GET),
        "POST" => Ok(reqwest::Method::POST),
        "PUT" => Ok(reqwest::Method::PUT),
        "DELETE" => Ok(reqwest::Method::DELETE),
        other => Err(format!(
            "unsupported method '{}' (expected GET, POST, PUT or DELETE)",
            other
        )),
    }
}

/// Parse a "key=value" query parameter
fn parse_param(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty parameter name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}
