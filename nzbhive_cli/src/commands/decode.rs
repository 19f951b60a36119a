use nzbhive_core::decode_guid;

use crate::commands::Result;

pub async fn run(guid: &str) -> Result<()> {
    let payload = decode_guid(guid)?;
    println!("{}", serde_json::to_string_pretty(&payload).unwrap_or_default());
    Ok(())
}
