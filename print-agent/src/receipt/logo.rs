//! Embedded receipt logo

use std::sync::LazyLock;

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

static LOGO_PNG: &[u8] = include_bytes!("../../assets/logo.png");

static LOGO_BASE64: LazyLock<String> = LazyLock::new(|| STANDARD.encode(LOGO_PNG));

/// Logo PNG as base64, encoded once per process
pub fn logo_base64() -> &'static str {
    &LOGO_BASE64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_logo_is_png() {
        let decoded = STANDARD.decode(logo_base64()).unwrap();
        assert_eq!(&decoded[..8], b"\x89PNG\r\n\x1a\n");
        assert!(std::ptr::eq(logo_base64(), logo_base64()));
    }
}
