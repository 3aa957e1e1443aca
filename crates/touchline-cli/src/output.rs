use serde_json::Value;

use crate::error::CliError;

pub fn to_json(data: &Value, pretty: bool) -> Result<String, CliError> {
    let payload = if pretty {
        serde_json::to_string_pretty(data)?
    } else {
        serde_json::to_string(data)?
    };
    Ok(payload)
}

pub fn render(data: &Value, pretty: bool) -> Result<(), CliError> {
    println!("{}", to_json(data, pretty)?);
    Ok(())
}
