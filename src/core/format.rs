//! Formatting utilities - Currency, date and distance rendering.
//!
//! Currency rendering is chosen by the *currency code*, not by the interface language:
//! an amount in BRL is always written the Brazilian way, even for an English-speaking
//! user, so prices tied to a market never pick up another region's symbol or grouping.

use crate::core::i18n::Language;
use chrono::NaiveDate;

const NBSP: char = '\u{a0}';

#[derive(Debug, Clone, Copy)]
struct CurrencyStyle {
    symbol: &'static str,
    decimals: usize,
    group_separator: char,
    decimal_separator: char,
    symbol_after: bool,
    spaced: bool,
}

fn currency_style(code: &str) -> Option<CurrencyStyle> {
    let style = match code {
        "USD" => CurrencyStyle {
            symbol: "$",
            decimals: 2,
            group_separator: ',',
            decimal_separator: '.',
            symbol_after: false,
            spaced: false,
        },
        "BRL" => CurrencyStyle {
            symbol: "R$",
            decimals: 2,
            group_separator: '.',
            decimal_separator: ',',
            symbol_after: false,
            spaced: true,
        },
        "EUR" => CurrencyStyle {
            symbol: "€",
            decimals: 2,
            group_separator: '.',
            decimal_separator: ',',
            symbol_after: true,
            spaced: true,
        },
        "GBP" => CurrencyStyle {
            symbol: "£",
            decimals: 2,
            group_separator: ',',
            decimal_separator: '.',
            symbol_after: false,
            spaced: false,
        },
        "JPY" => CurrencyStyle {
            symbol: "￥",
            decimals: 0,
            group_separator: ',',
            decimal_separator: '.',
            symbol_after: false,
            spaced: false,
        },
        _ => return None,
    };
    Some(style)
}

fn group_digits(digits: &str, separator: char) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(ch);
    }
    grouped
}

/// Formats `amount` according to the conventions of `currency_code`.
///
/// Unknown codes fall back to `1234.50 XYZ`. NaN and infinite amounts render as `-- XYZ`.
#[must_use]
pub fn format_currency(amount: f64, currency_code: &str) -> String {
    let code = currency_code.trim().to_uppercase();
    if !amount.is_finite() {
        return format!("-- {code}");
    }
    let Some(style) = currency_style(&code) else {
        return format!("{amount:.2} {code}");
    };

    let fixed = format!("{:.*}", style.decimals, amount.abs());
    let (integer, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), ""));

    let mut number = group_digits(integer, style.group_separator);
    if !fraction.is_empty() {
        number.push(style.decimal_separator);
        number.push_str(fraction);
    }

    let sign = if amount < 0.0 && fixed.chars().any(|c| c != '0' && c != '.') {
        "-"
    } else {
        ""
    };
    let gap = if style.spaced { NBSP.to_string() } else { String::new() };

    if style.symbol_after {
        format!("{sign}{number}{gap}{}", style.symbol)
    } else {
        format!("{sign}{}{gap}{number}", style.symbol)
    }
}

/// Formats a calendar date with the numeric pattern of `language`'s locale.
#[must_use]
pub fn format_date(date: NaiveDate, language: Language) -> String {
    let pattern = match language {
        Language::En => "%m/%d/%Y",
        Language::De => "%d.%m.%Y",
        Language::Zh | Language::Ja => "%Y/%m/%d",
        Language::Pt | Language::Es | Language::Fr | Language::It => "%d/%m/%Y",
    };
    date.format(pattern).to_string()
}

/// Formats a distance in meters: `350 m` below one kilometer, `1.2 km` above.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1_000.0 {
        format!("{meters:.0} m")
    } else {
        format!("{:.1} km", meters / 1_000.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usd_and_brl_formatting() {
        assert_eq!(format_currency(10.0, "USD"), "$10.00");
        assert_eq!(format_currency(10.0, "BRL"), "R$\u{a0}10,00");
        assert_eq!(format_currency(1_234_567.891, "USD"), "$1,234,567.89");
        assert_eq!(format_currency(1_234_567.891, "brl"), "R$\u{a0}1.234.567,89");
    }

    #[test]
    fn test_other_currencies() {
        assert_eq!(format_currency(10.0, "EUR"), "10,00\u{a0}€");
        assert_eq!(format_currency(1500.0, "GBP"), "£1,500.00");
        assert_eq!(format_currency(1500.4, "JPY"), "￥1,500");
        assert_eq!(format_currency(3.5, "XYZ"), "3.50 XYZ");
    }

    #[test]
    fn test_negative_and_zero_amounts() {
        assert_eq!(format_currency(-25.5, "USD"), "-$25.50");
        assert_eq!(format_currency(0.0, "USD"), "$0.00");
        assert_eq!(format_currency(-0.001, "USD"), "$0.00");
        assert_eq!(format_currency(999.0, "BRL"), "R$\u{a0}999,00");
    }

    #[test]
    fn test_non_finite_amounts_render_placeholder() {
        assert_eq!(format_currency(f64::NAN, "USD"), "-- USD");
        assert_eq!(format_currency(f64::INFINITY, "brl"), "-- BRL");
        assert_eq!(format_currency(f64::NEG_INFINITY, "XYZ"), "-- XYZ");
    }

    #[test]
    fn test_format_date_per_language() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 9).unwrap_or_default();
        assert_eq!(format_date(date, Language::Pt), "09/03/2026");
        assert_eq!(format_date(date, Language::En), "03/09/2026");
        assert_eq!(format_date(date, Language::De), "09.03.2026");
        assert_eq!(format_date(date, Language::Ja), "2026/03/09");
    }

    #[test]
    fn test_format_distance() {
        assert_eq!(format_distance(349.6), "350 m");
        assert_eq!(format_distance(1_234.0), "1.2 km");
    }
}
