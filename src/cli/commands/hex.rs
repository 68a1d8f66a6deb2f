//! `gcmseal hex` — hex encode and decode.

use crate::cli::HexAction;
use crate::encoding::hex;
use crate::errors::{GcmSealError, Result};

/// Execute a `hex` subcommand.
pub fn execute(action: &HexAction) -> Result<()> {
    match action {
        HexAction::Encode { text, prefix } => {
            let encoded = if *prefix {
                hex::encode_prefixed(text.as_bytes())
            } else {
                hex::encode(text.as_bytes())
            };
            println!("{encoded}");
        }
        HexAction::Decode { hex: input } => {
            let bytes = hex::decode(input)?;
            let text = String::from_utf8(bytes).map_err(|_| {
                GcmSealError::CommandFailed("decoded bytes are not valid UTF-8".into())
            })?;
            println!("{text}");
        }
    }
    Ok(())
}
