//! Currency display names used by the IMF representative-rates feed.

use crate::models::CurrencyUnit;

/// Display name (lower case) to currency code.
///
/// Covers the names the IMF has used over time, including older spellings.
const CURRENCY_NAMES: &[(&str, &str)] = &[
    ("algerian dinar", "DZD"),
    ("australian dollar", "AUD"),
    ("bahrain dinar", "BHD"),
    ("bahraini dinar", "BHD"),
    ("botswana pula", "BWP"),
    ("brazilian real", "BRL"),
    ("brunei dollar", "BND"),
    ("canadian dollar", "CAD"),
    ("chilean peso", "CLP"),
    ("chinese yuan", "CNY"),
    ("chinese renminbi", "CNY"),
    ("colombian peso", "COP"),
    ("czech koruna", "CZK"),
    ("danish krone", "DKK"),
    ("euro", "EUR"),
    ("hungarian forint", "HUF"),
    ("icelandic krona", "ISK"),
    ("indian rupee", "INR"),
    ("indonesian rupiah", "IDR"),
    ("iranian rial", "IRR"),
    ("israeli new sheqel", "ILS"),
    ("israeli new shekel", "ILS"),
    ("japanese yen", "JPY"),
    ("kazakhstani tenge", "KZT"),
    ("korean won", "KRW"),
    ("kuwaiti dinar", "KWD"),
    ("libyan dinar", "LYD"),
    ("malaysian ringgit", "MYR"),
    ("mauritian rupee", "MUR"),
    ("mexican peso", "MXN"),
    ("nepalese rupee", "NPR"),
    ("new zealand dollar", "NZD"),
    ("norwegian krone", "NOK"),
    ("omani rial", "OMR"),
    ("rial omani", "OMR"),
    ("pakistani rupee", "PKR"),
    ("peruvian sol", "PEN"),
    ("nuevo sol", "PEN"),
    ("philippine peso", "PHP"),
    ("polish zloty", "PLN"),
    ("qatari riyal", "QAR"),
    ("qatar riyal", "QAR"),
    ("russian ruble", "RUB"),
    ("saudi arabian riyal", "SAR"),
    ("singapore dollar", "SGD"),
    ("south african rand", "ZAR"),
    ("sri lankan rupee", "LKR"),
    ("swedish krona", "SEK"),
    ("swedish krone", "SEK"),
    ("swiss franc", "CHF"),
    ("thai baht", "THB"),
    ("trinidadian dollar", "TTD"),
    ("trinidad and tobago dollar", "TTD"),
    ("tunisian dinar", "TND"),
    ("u.a.e. dirham", "AED"),
    ("u.k. pound", "GBP"),
    ("u.k. pound sterling", "GBP"),
    ("u.s. dollar", "USD"),
    ("uruguayan peso", "UYU"),
    ("bolivar fuerte", "VEF"),
    ("venezuelan bolivar", "VEF"),
];

/// Resolves a feed display name such as `"U.S. dollar"` to its currency.
///
/// Matching ignores case, surrounding whitespace and trailing footnote markers
/// like `"Euro (1)"` or `"Euro*"`.
pub fn currency_for_name(name: &str) -> Option<CurrencyUnit> {
    let normalized = normalize(name);
    CURRENCY_NAMES
        .iter()
        .find(|(display, _)| *display == normalized)
        .map(|(_, code)| CurrencyUnit::from_static(code))
}

fn normalize(name: &str) -> String {
    let mut trimmed = name.trim();
    if let Some(idx) = trimmed.find('(') {
        trimmed = &trimmed[..idx];
    }
    trimmed
        .trim_end_matches(|c: char| c == '*' || c.is_ascii_digit() || c.is_whitespace())
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_names() {
        assert_eq!(currency_for_name("Euro"), Some(CurrencyUnit::EUR));
        assert_eq!(currency_for_name("U.S. Dollar"), Some(CurrencyUnit::USD));
        assert_eq!(currency_for_name("U.K. Pound Sterling"), Some(CurrencyUnit::GBP));
        assert_eq!(currency_for_name("  Japanese   yen "), Some(CurrencyUnit::JPY));
    }

    #[test]
    fn test_footnote_markers_are_ignored() {
        assert_eq!(currency_for_name("Euro (1)"), Some(CurrencyUnit::EUR));
        assert_eq!(currency_for_name("Swiss franc*"), Some(CurrencyUnit::CHF));
    }

    #[test]
    fn test_unknown_name() {
        assert_eq!(currency_for_name("Atlantean drachma"), None);
        assert_eq!(currency_for_name(""), None);
    }
}
