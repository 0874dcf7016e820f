//! Print the generated `OpenAPI` document to stdout.

use anyhow::Result;

fn main() -> Result<()> {
    let spec = custos::api::openapi().to_pretty_json()?;
    println!("{spec}");
    Ok(())
}
