//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI 3 document for the InsightHub-AI REST API to disk.
//! The output path defaults to `openapi.json` and can be given as the first
//! argument.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

fn write_spec(
    api_doc: utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let json = api_doc.to_pretty_json()?;
    std::fs::write(path, json)?;
    println!("OpenAPI document written to {}", path);
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "openapi.json".to_string());
    write_spec(ApiDoc::openapi(), &path)
}
