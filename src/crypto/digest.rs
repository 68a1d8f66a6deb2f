//! SHA-256 helpers.

use sha2::{Digest, Sha256};

use crate::encoding::hex;

/// SHA-256 of `data`, hex-encoded (lower-case, no prefix).
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(&Sha256::digest(data))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_abc() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }
}
