use base64::Engine;

/// An Astarte device ID is a 128-bit identifier, URL-safe base64 encoded
/// without padding (22 characters on the wire).
pub fn is_valid_device_id(device_id: &str) -> bool {
    match base64::engine::general_purpose::URL_SAFE_NO_PAD.decode(device_id) {
        Ok(bytes) => bytes.len() == 16,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::is_valid_device_id;

    #[test]
    fn accepts_canonical_ids() {
        assert!(is_valid_device_id("2TBn-jNESuuHamE2Zo1anA"));
        assert!(is_valid_device_id("olFkumNuZ_J0f_d6-8XCDg"));
    }

    #[test]
    fn rejects_wrong_length() {
        assert!(!is_valid_device_id("2TBn-jNESuuHamE2Zo1a"));
        assert!(!is_valid_device_id("2TBn-jNESuuHamE2Zo1anA2TBn"));
        assert!(!is_valid_device_id(""));
    }

    #[test]
    fn rejects_non_base64url() {
        assert!(!is_valid_device_id("2TBn+jNESuuHamE2Zo1anA"));
        assert!(!is_valid_device_id("not a device id!!!!!!!"));
    }
}
