use std::io::Write;

use csv::Writer;
use serde::Serialize;

use crate::transfer::TransferResult;

#[derive(Debug, Serialize)]
pub struct ResultRecord<'a> {
    pub request_id: &'a str,
    pub success: bool,
    pub code: Option<&'static str>,
    pub message: Option<String>,
}

impl<'a> From<&'a TransferResult> for ResultRecord<'a> {
    fn from(result: &'a TransferResult) -> Self {
        Self {
            request_id: &result.request_id,
            success: result.success(),
            code: result.error().map(|err| err.code()),
            message: result.error().map(ToString::to_string),
        }
    }
}

pub fn print_results<'a, W>(
    output: &mut W,
    results: impl Iterator<Item = ResultRecord<'a>>,
) -> anyhow::Result<()>
where
    W: Write,
{
    let mut writer = Writer::from_writer(output);
    for record in results {
        if let Err(err) = writer.serialize(record) {
            anyhow::bail!("Failed to write to CSV: {err}")
        }
    }
    // Ensure all data is flushed to the output
    if let Err(err) = writer.flush() {
        anyhow::bail!("Failed to flush CSV writer: {err}")
    }
    Ok(())
}
