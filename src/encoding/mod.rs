//! Text encodings used to move keys and envelopes around as strings.

pub mod hex;
