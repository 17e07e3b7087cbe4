pub use alloy::primitives::Address;

/// Key under which an address is stored in the directory: lowercase hex with
/// a `0x` prefix.
///
/// Wallets report addresses in EIP-55 mixed case while documents are keyed in
/// lowercase, so every lookup must go through this function.
pub fn document_id(address: &Address) -> String {
    address.to_string().to_lowercase()
}

#[cfg(test)]
mod tests {
    use {super::*, assertor::*, std::str::FromStr};

    #[test]
    fn document_id_is_lowercase() {
        let address = Address::from_str("0x52908400098527886E0F7030069857D2E4169EE7").unwrap();

        assert_that!(document_id(&address).as_str())
            .is_equal_to("0x52908400098527886e0f7030069857d2e4169ee7");
    }

    #[test]
    fn parsing_ignores_case() {
        let lower = Address::from_str("0x52908400098527886e0f7030069857d2e4169ee7").unwrap();
        let mixed = Address::from_str("0x52908400098527886E0F7030069857D2E4169EE7").unwrap();

        assert_that!(lower).is_equal_to(mixed);
    }
}
