use uuid::Uuid;

/// Mint an opaque 128-bit identifier, rendered as dash-free lowercase hex.
pub fn mint() -> String {
    Uuid::new_v4().simple().to_string()
}

#[cfg(test)]
mod tests {
    use super::mint;

    #[test]
    fn minted_ids_are_hex_and_unique() {
        let a = mint();
        let b = mint();
        assert_eq!(a.len(), 32);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(a, b);
    }
}
