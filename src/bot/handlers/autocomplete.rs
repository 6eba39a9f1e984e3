//! Autocomplete handlers for Discord slash command parameters.
//!
//! Coupons are offered as `"<id> · <title>"` so the command can recover the id even
//! when several coupons share a title.

use crate::{
    bot::BotData,
    core::{coupon, i18n::Language},
    entities::Category,
    errors::{Error, Result},
};
use sea_orm::{ActiveEnum, Iterable};

/// Discord autocomplete limit
const MAX_CHOICES: usize = 25;

/// Separator between id and title in a coupon reference.
const REF_SEPARATOR: &str = " · ";

/// Formats a coupon as an autocomplete choice.
#[must_use]
pub fn coupon_ref(id: i64, title: &str) -> String {
    format!("{id}{REF_SEPARATOR}{title}")
}

/// Extracts the coupon id from a reference produced by [`coupon_ref`] or a bare id.
pub fn parse_coupon_ref(input: &str) -> Result<i64> {
    let input = input.trim().trim_start_matches('#');
    let id = input
        .split_once(REF_SEPARATOR)
        .map_or(input, |(id, _)| id)
        .trim();
    id.parse()
        .map_err(|_| Error::invalid(format!("'{input}' is not a coupon reference")))
}

/// Provides autocomplete suggestions for coupons.
///
/// Matches the partial input against title and store name, newest coupons first.
pub async fn autocomplete_coupon(
    ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let Ok(coupons) = coupon::get_all_coupons(&ctx.data().database).await else {
        return Vec::new();
    };

    let partial_lower = partial.to_lowercase();
    coupons
        .into_iter()
        .filter(|c| {
            c.title.to_lowercase().contains(&partial_lower)
                || c.store_name.to_lowercase().contains(&partial_lower)
        })
        .map(|c| coupon_ref(c.id, &c.title))
        .take(MAX_CHOICES)
        .collect()
}

/// Provides autocomplete suggestions for coupon categories.
#[allow(clippy::unused_async)]
pub async fn autocomplete_category(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    Category::iter()
        .map(|category| category.to_value())
        .filter(|name| name.contains(&partial_lower))
        .collect()
}

/// Provides autocomplete suggestions for language codes.
#[allow(clippy::unused_async)]
pub async fn autocomplete_language(
    _ctx: poise::Context<'_, BotData, Error>,
    partial: &str,
) -> Vec<String> {
    let partial_lower = partial.to_lowercase();
    Language::ALL
        .iter()
        .map(|language| language.code().to_string())
        .filter(|code| code.starts_with(&partial_lower))
        .collect()
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_coupon_ref_round_trip() {
        assert_eq!(coupon_ref(42, "Two for one"), "42 · Two for one");
        assert_eq!(parse_coupon_ref("42 · Two for one").unwrap(), 42);
        assert_eq!(parse_coupon_ref(" #7 ").unwrap(), 7);
    }

    #[test]
    fn test_parse_coupon_ref_rejects_titles() {
        let err = parse_coupon_ref("Two for one").unwrap_err();
        assert!(matches!(err, Error::InvalidInput { .. }));
    }
}
