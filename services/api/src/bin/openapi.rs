//! services/api/src/bin/openapi.rs
//!
//! Writes the OpenAPI document of the catalog REST API to disk.
//!
//! Usage: `openapi [OUTPUT]`, where `OUTPUT` defaults to `openapi.json`.

use api_lib::web::rest::ApiDoc;
use utoipa::OpenApi;

const DEFAULT_OUTPUT: &str = "openapi.json";

/// Serializes `api_doc` as pretty JSON into `path`.
fn write_document(
    api_doc: &utoipa::openapi::OpenApi,
    path: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let document = api_doc.to_pretty_json()?;
    std::fs::write(path, document)?;
    println!(
        "OpenAPI document with {} paths written to {}",
        api_doc.paths.paths.len(),
        path
    );
    Ok(())
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let output = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_OUTPUT.to_string());
    write_document(&ApiDoc::openapi(), &output)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_every_catalog_route() {
        let doc = ApiDoc::openapi();
        for path in ["/books", "/books/{id}", "/genres", "/stats"] {
            assert!(doc.paths.paths.contains_key(path), "missing {}", path);
        }
    }
}
