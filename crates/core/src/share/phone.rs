/// Number to address a WhatsApp message to, from whatever the user typed in
/// the mobile field. `None` means the share goes out without a recipient.
///
/// - 10 digits: domestic, prefixed with `country_code`.
/// - 11 digits with a leading `0`: trunk prefix dropped, then prefixed.
/// - already carrying `country_code` and at least 10 more digits: unchanged.
pub fn resolve_whatsapp_number(mobile: &str, country_code: &str) -> Option<String> {
    let digits: String = mobile.chars().filter(char::is_ascii_digit).collect();

    match digits.len() {
        10 => Some(format!("{country_code}{digits}")),
        11 if digits.starts_with('0') => Some(format!("{country_code}{}", &digits[1..])),
        len if !country_code.is_empty()
            && len >= 10 + country_code.len()
            && digits.starts_with(country_code) =>
        {
            Some(digits)
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::resolve_whatsapp_number;

    #[test]
    fn domestic_numbers_get_the_country_code() {
        assert_eq!(resolve_whatsapp_number("98250 12345", "91").as_deref(), Some("919825012345"));
        assert_eq!(resolve_whatsapp_number("098250-12345", "91").as_deref(), Some("919825012345"));
    }

    #[test]
    fn international_form_passes_through() {
        assert_eq!(resolve_whatsapp_number("+91 98250 12345", "91").as_deref(), Some("919825012345"));
        assert_eq!(resolve_whatsapp_number("0091 98250 12345", "91"), None);
    }

    #[test]
    fn anything_else_is_unresolved() {
        assert_eq!(resolve_whatsapp_number("", "91"), None);
        assert_eq!(resolve_whatsapp_number("12345", "91"), None);
        assert_eq!(resolve_whatsapp_number("19825012345", "91"), None);
        assert_eq!(resolve_whatsapp_number("449825012345", "91"), None);
    }
}
