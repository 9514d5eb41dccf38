//! Currencies, per-owner rates and money formatting
//!
//! All stored amounts are normalized to the base currency (UZS) at write
//! time. Rates are plain decimal multipliers against the base currency.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The system's accounting currency
pub const BASE_CURRENCY: Currency = Currency::Uzs;

/// Supported currencies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Uzs,
    Usd,
    Eur,
    Rub,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Uzs => "UZS",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Rub => "RUB",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Uzs => "сум",
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Rub => "₽",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.to_uppercase().as_str() {
            "UZS" => Some(Currency::Uzs),
            "USD" => Some(Currency::Usd),
            "EUR" => Some(Currency::Eur),
            "RUB" => Some(Currency::Rub),
            _ => None,
        }
    }

    /// Resolve a currency sigil captured by the free-text parsers
    pub fn from_sigil(sigil: &str) -> Option<Self> {
        match sigil {
            "$" | "USD" | "usd" => Some(Currency::Usd),
            "€" | "EUR" | "eur" => Some(Currency::Eur),
            "₽" | "RUB" | "rub" => Some(Currency::Rub),
            _ => None,
        }
    }

    /// Default rate against the base currency
    pub fn default_rate(&self) -> Decimal {
        match self {
            Currency::Uzs => Decimal::ONE,
            Currency::Usd => Decimal::from(12500),
            Currency::Eur => Decimal::from(13500),
            Currency::Rub => Decimal::from(135),
        }
    }

    /// Currencies that carry a per-owner rate row (everything but base)
    pub fn foreign() -> [Currency; 3] {
        [Currency::Usd, Currency::Eur, Currency::Rub]
    }
}

/// Scan free text for a currency symbol or keyword.
///
/// Checked in fixed order (USD, EUR, RUB, UZS), first match wins,
/// base currency when nothing matches. The scan is intentionally blunt:
/// an unrelated word like "доллар" inside a comment will match.
pub fn detect_currency(text: &str) -> Currency {
    let lower = text.to_lowercase();
    if lower.contains('$') || lower.contains("доллар") || lower.contains("usd") {
        return Currency::Usd;
    }
    if lower.contains('€') || lower.contains("евро") || lower.contains("eur") {
        return Currency::Eur;
    }
    if lower.contains('₽') || lower.contains("рубль") || lower.contains("rub") {
        return Currency::Rub;
    }
    if lower.contains("сум") || lower.contains("uzs") {
        return Currency::Uzs;
    }
    BASE_CURRENCY
}

/// One per-owner rate row against the base currency
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrencyRate {
    pub owner_id: String,
    pub currency: Currency,
    pub rate: Decimal,
    pub symbol: String,
}

impl CurrencyRate {
    pub fn default_for(owner_id: &str, currency: Currency) -> Self {
        Self {
            owner_id: owner_id.to_string(),
            currency,
            rate: currency.default_rate(),
            symbol: currency.symbol().to_string(),
        }
    }
}

/// Format an amount with space-grouped thousands, e.g. `25 000`
pub fn format_amount(amount: Decimal) -> String {
    let normalized = amount.normalize();
    let text = normalized.to_string();
    let (int_part, frac_part) = match text.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (text, None),
    };

    let (sign, digits) = match int_part.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", int_part.as_str()),
    };

    let mut grouped = String::new();
    let len = digits.len();
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (len - i) % 3 == 0 {
            grouped.push(' ');
        }
        grouped.push(ch);
    }

    match frac_part {
        Some(f) => format!("{}{}.{}", sign, grouped, f),
        None => format!("{}{}", sign, grouped),
    }
}

/// Format an amount in its currency, e.g. `100 $`
pub fn format_money(amount: Decimal, currency: Currency) -> String {
    format!("{} {}", format_amount(amount), currency.symbol())
}

/// Format a foreign amount with its base-currency equivalent,
/// e.g. `100 $ (1 250 000 сум)`; base amounts print plainly.
pub fn format_multi(amount: Decimal, currency: Currency, base_amount: Decimal) -> String {
    if currency == BASE_CURRENCY {
        return format_money(amount, currency);
    }
    format!(
        "{} ({})",
        format_money(amount, currency),
        format_money(base_amount, BASE_CURRENCY)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detect_order_is_fixed() {
        assert_eq!(detect_currency("100$ ремонт"), Currency::Usd);
        assert_eq!(detect_currency("оплата евро"), Currency::Eur);
        assert_eq!(detect_currency("500 рубль перевод"), Currency::Rub);
        assert_eq!(detect_currency("25000 такси"), Currency::Uzs);
        // first match wins across groups
        assert_eq!(detect_currency("$ и евро"), Currency::Usd);
    }

    #[test]
    fn test_detect_misfires_on_keywords_inside_comments() {
        // known blunt-scan behavior, preserved
        assert_eq!(detect_currency("купил сувенир доллар сша"), Currency::Usd);
    }

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(Decimal::from(25000)), "25 000");
        assert_eq!(format_amount(Decimal::from(1250000)), "1 250 000");
        assert_eq!(format_amount(Decimal::from(999)), "999");
        assert_eq!(format_amount(Decimal::new(1050, 2)), "10.5");
    }

    #[test]
    fn test_format_multi() {
        assert_eq!(
            format_multi(Decimal::from(100), Currency::Usd, Decimal::from(1250000)),
            "100 $ (1 250 000 сум)"
        );
        assert_eq!(
            format_multi(Decimal::from(25000), Currency::Uzs, Decimal::from(25000)),
            "25 000 сум"
        );
    }

    #[test]
    fn test_sigils() {
        assert_eq!(Currency::from_sigil("$"), Some(Currency::Usd));
        assert_eq!(Currency::from_sigil("€"), Some(Currency::Eur));
        assert_eq!(Currency::from_sigil("RUB"), Some(Currency::Rub));
        assert_eq!(Currency::from_sigil("сум"), None);
    }
}
