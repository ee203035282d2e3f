//! The JSON Schema of the resource properties, as published to the construct layer.

use std::io::Write;

use sql_run_configuration::properties_schema;

/// The schema, pretty printed.
pub fn get_schema() -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&properties_schema())
}

/// Write the schema, followed by a newline.
pub fn write_schema(mut writer: impl Write) -> anyhow::Result<()> {
    let schema = get_schema()?;
    writeln!(writer, "{schema}")?;
    Ok(())
}
