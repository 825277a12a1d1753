//! Writes the service's OpenAPI document as pretty-printed JSON.
//!
//! Usage:
//!   cargo run --bin generate_openapi > openapi.json
//!   cargo run --bin generate_openapi -- --output openapi.json

use std::{
    env, fs,
    io::{self, Write},
    path::PathBuf,
};

use anyhow::{Context, Result};
use smart_jacket_service::api::handlers::ApiDoc;
use utoipa::OpenApi;

fn output_path() -> Option<PathBuf> {
    let args: Vec<String> = env::args().collect();
    args.windows(2)
        .find(|w| w[0] == "--output")
        .map(|w| PathBuf::from(&w[1]))
}

fn main() -> Result<()> {
    let json = ApiDoc::openapi()
        .to_pretty_json()
        .context("Failed to serialise OpenAPI document")?;

    match output_path() {
        Some(path) => {
            fs::write(&path, &json)
                .with_context(|| format!("Error writing to {}", path.display()))?;
            eprintln!("OpenAPI document written to {}", path.display());
        }
        None => io::stdout()
            .write_all(json.as_bytes())
            .context("Failed to write to stdout")?,
    }
    Ok(())
}
