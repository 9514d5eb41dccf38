//! Free-text parsers for the chat wizards
//!
//! Every parser returns `Validation` on malformed input so the session
//! can re-prompt without advancing its pending state.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;

use super::currency::{detect_currency, Currency};
use super::result::{Error, Result};

/// Parsed `Сумма Имя Описание` debt entry
#[derive(Debug, Clone, PartialEq)]
pub struct DebtInfo {
    pub amount: Decimal,
    pub currency: Currency,
    pub counterparty: String,
    pub description: String,
}

fn parse_positive_amount(raw: &str) -> Result<Decimal> {
    let amount: Decimal = raw
        .replace(',', ".")
        .parse()
        .map_err(|_| Error::validation("amount is not a number"))?;
    if amount <= Decimal::ZERO {
        return Err(Error::validation("amount must be positive"));
    }
    Ok(amount)
}

/// Parse `Сумма Комментарий`, e.g. `25000 такси` or `12,5 кофе`
pub fn parse_amount_comment(text: &str) -> Result<(Decimal, String)> {
    let re = Regex::new(r"^(\d+[.,]?\d*)\s*(.*)$").unwrap();
    let caps = re
        .captures(text.trim())
        .ok_or_else(|| Error::validation("expected: amount followed by a comment"))?;
    let amount = parse_positive_amount(&caps[1])?;
    let comment = caps[2].trim().to_string();
    Ok((amount, comment))
}

/// Parse a debt entry: `5000 Имя описание`, `5000$ Имя описание`,
/// `$ 5000 Имя описание`, `€500 Мария за машину`.
///
/// An explicit sigil (before or after the number, before wins) fixes the
/// currency; otherwise the description text is scanned like any comment.
/// The description defaults to `Долг` when omitted.
pub fn parse_debt_info(text: &str) -> Result<DebtInfo> {
    let re = Regex::new(
        r"^(?:(\$|€|₽|USD|EUR|RUB)\s*)?(\d+[.,]?\d*)\s*(\$|€|₽|USD|EUR|RUB)?\s+(\S+)\s*(.*)$",
    )
    .unwrap();
    let caps = re
        .captures(text.trim())
        .ok_or_else(|| Error::validation("expected: amount, counterparty, description"))?;

    let amount = parse_positive_amount(&caps[2])?;
    let counterparty = caps[4].trim().to_string();
    let description = {
        let d = caps.get(5).map(|m| m.as_str().trim()).unwrap_or("");
        if d.is_empty() {
            "Долг".to_string()
        } else {
            d.to_string()
        }
    };

    let sigil = caps.get(1).or_else(|| caps.get(3)).map(|m| m.as_str());
    let currency = match sigil.and_then(Currency::from_sigil) {
        Some(c) => c,
        None => detect_currency(&description),
    };

    Ok(DebtInfo {
        amount,
        currency,
        counterparty,
        description,
    })
}

/// Parse a payment amount, e.g. `10000`, `100$`, `€50`.
/// Currency is detected from the whole text, base currency by default.
pub fn parse_payment(text: &str) -> Result<(Decimal, Currency)> {
    let re = Regex::new(r"^(?:(\$|€|₽|USD|EUR|RUB)\s*)?(\d+[.,]?\d*)\s*(\$|€|₽|USD|EUR|RUB)?")
        .unwrap();
    let caps = re
        .captures(text.trim())
        .ok_or_else(|| Error::validation("expected a payment amount"))?;
    let amount = parse_positive_amount(&caps[2])?;
    Ok((amount, detect_currency(text)))
}

/// Parse a `DD.MM.YYYY` date
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    let re = Regex::new(r"^(\d{2})\.(\d{2})\.(\d{4})$").unwrap();
    let caps = re
        .captures(text.trim())
        .ok_or_else(|| Error::validation("expected a date in DD.MM.YYYY form"))?;
    let day: u32 = caps[1].parse().unwrap();
    let month: u32 = caps[2].parse().unwrap();
    let year: i32 = caps[3].parse().unwrap();
    NaiveDate::from_ymd_opt(year, month, day)
        .ok_or_else(|| Error::validation("not a valid calendar date"))
}

/// Format a date back to its `DD.MM.YYYY` wire form
pub fn format_date(date: NaiveDate) -> String {
    date.format("%d.%m.%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_comment() {
        let (amount, comment) = parse_amount_comment("25000 такси").unwrap();
        assert_eq!(amount, Decimal::from(25000));
        assert_eq!(comment, "такси");

        let (amount, comment) = parse_amount_comment("12,5 кофе").unwrap();
        assert_eq!(amount, Decimal::new(125, 1));
        assert_eq!(comment, "кофе");

        // bare amount, empty comment
        let (_, comment) = parse_amount_comment("5000").unwrap();
        assert_eq!(comment, "");
    }

    #[test]
    fn test_amount_comment_rejects_garbage() {
        assert!(parse_amount_comment("такси 25000").is_err());
        assert!(parse_amount_comment("0 такси").is_err());
        assert!(parse_amount_comment("").is_err());
    }

    #[test]
    fn test_debt_info_sigil_positions() {
        let info = parse_debt_info("5000$ Жасур ремонт").unwrap();
        assert_eq!(info.amount, Decimal::from(5000));
        assert_eq!(info.currency, Currency::Usd);
        assert_eq!(info.counterparty, "Жасур");
        assert_eq!(info.description, "ремонт");

        let info = parse_debt_info("$ 5000 Жасур ремонт").unwrap();
        assert_eq!(info.currency, Currency::Usd);

        let info = parse_debt_info("€500 Мария за машину").unwrap();
        assert_eq!(info.currency, Currency::Eur);
        assert_eq!(info.description, "за машину");
    }

    #[test]
    fn test_debt_info_defaults() {
        let info = parse_debt_info("50000 Алексей").unwrap();
        assert_eq!(info.currency, Currency::Uzs);
        assert_eq!(info.description, "Долг");
    }

    #[test]
    fn test_debt_info_requires_counterparty() {
        assert!(parse_debt_info("50000").is_err());
    }

    #[test]
    fn test_payment() {
        let (amount, currency) = parse_payment("10000").unwrap();
        assert_eq!(amount, Decimal::from(10000));
        assert_eq!(currency, Currency::Uzs);

        let (amount, currency) = parse_payment("100$").unwrap();
        assert_eq!(amount, Decimal::from(100));
        assert_eq!(currency, Currency::Usd);

        assert!(parse_payment("нет").is_err());
    }

    #[test]
    fn test_date_round_trip() {
        for s in ["15.02.2024", "01.01.2026", "29.02.2024"] {
            let d = parse_date(s).unwrap();
            assert_eq!(format_date(d), s);
        }
    }

    #[test]
    fn test_date_rejects_malformed() {
        for s in ["2024-02-15", "15.2.2024", "32.01.2026", "29.02.2025", "15.13.2026"] {
            assert!(parse_date(s).is_err(), "should reject {s}");
        }
    }
}
