//! Coupon Discord commands - catalog browsing, saving, reservations, reviews and votes,
//! plus the vendor-facing campaign tools.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{
            BotData,
            commands::{session, user_id},
            handlers::autocomplete::{self, parse_coupon_ref},
        },
        core::{
            campaign::{self, VariantStats},
            coupon::{self, NewCoupon, Vote},
            format::{format_currency, format_date, format_distance},
            i18n::Language,
            proximity::Coordinates,
            review::{self, NewReview},
        },
        entities::{Category, coupon as coupon_entity},
        errors::{Error, Result},
    };
    use chrono::{Duration, Utc};
    use std::fmt::Write;

    /// Catalog entries shown per listing
    const LISTING_LIMIT: usize = 10;

    /// One-line summary of a coupon.
    pub(crate) fn summarize(
        coupon: &coupon_entity::Model,
        language: Language,
        location: Option<Coordinates>,
    ) -> String {
        let mut line = format!(
            "{} `{}` **{}** @ {} - {}",
            coupon.category.icon(),
            coupon.id,
            coupon.title,
            coupon.store_name,
            coupon.discount
        );
        if let Some(price) = coupon.discounted_price {
            let _ = write!(line, " ({})", format_currency(price, &coupon.currency));
        }
        if let Some(distance) = location.and_then(|at| coupon::distance_to(coupon, at)) {
            let _ = write!(line, " · {}", format_distance(distance));
        }
        let _ = write!(
            line,
            " · ⏳ {}",
            format_date(coupon.expiry_date.date_naive(), language)
        );
        if coupon::is_sold_out(coupon) {
            line.push_str(" · **SOLD OUT**");
        }
        line
    }

    /// Lists current deals, nearest first when you have shared a location.
    #[poise::command(slash_command, prefix_command)]
    pub async fn coupons(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Only show this category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: Option<String>,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let session = session(ctx).await;
        let language = session.language().read().await.language();
        let location = session.last_location();

        let mut listing = match category {
            Some(name) => coupon::get_coupons_by_category(db, Category::from_name(&name)).await?,
            None => coupon::get_all_coupons(db).await?,
        };
        if let Some(at) = location {
            listing.sort_by(|a, b| {
                let left = coupon::distance_to(a, at).unwrap_or(f64::INFINITY);
                let right = coupon::distance_to(b, at).unwrap_or(f64::INFINITY);
                left.total_cmp(&right)
            });
        }

        if listing.is_empty() {
            ctx.say("🏷️ No coupons found.").await?;
            return Ok(());
        }

        let mut reply = String::from("**🏷️ Deals**\n");
        for coupon in listing.iter().take(LISTING_LIMIT) {
            writeln!(&mut reply, "{}", summarize(coupon, language, location))?;
        }
        if listing.len() > LISTING_LIMIT {
            writeln!(&mut reply, "... and {} more", listing.len() - LISTING_LIMIT)?;
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Shows details, menu and latest reviews of a coupon.
    #[poise::command(slash_command, prefix_command)]
    pub async fn coupon_info(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coupon"]
        #[autocomplete = "autocomplete::autocomplete_coupon"]
        coupon: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let coupon_id = parse_coupon_ref(&coupon)?;
        let found = coupon::get_coupon_by_id(db, coupon_id)
            .await?
            .ok_or(Error::CouponNotFound { id: coupon_id })?;
        let session = session(ctx).await;
        let language = session.language().read().await.language();

        let mut reply = format!("{}\n", summarize(&found, language, session.last_location()));
        if !found.description.is_empty() {
            writeln!(&mut reply, "{}", found.description)?;
        }
        if let Some(remaining) = coupon::remaining_inventory(&found) {
            writeln!(&mut reply, "**Remaining:** {remaining}")?;
        }
        if let Some(rating) = found.average_rating {
            writeln!(
                &mut reply,
                "**Rating:** {rating:.1} ⭐ ({} reviews)",
                found.review_count
            )?;
        }
        writeln!(&mut reply, "**Votes:** 👍 {} 👎 {}", found.upvotes, found.downvotes)?;

        let menu = coupon::get_menu_for_coupon(db, coupon_id).await?;
        if !menu.is_empty() {
            reply.push_str("**Menu**\n");
            for item in &menu {
                writeln!(
                    &mut reply,
                    "• {} - {}",
                    item.name,
                    format_currency(item.price, &found.currency)
                )?;
            }
        }

        let reviews = review::get_reviews_for_coupon(db, coupon_id).await?;
        for r in reviews.iter().take(3) {
            writeln!(&mut reply, "> {} ⭐ {}: {}", r.rating, r.user_name, r.comment)?;
        }

        ctx.say(reply).await?;
        Ok(())
    }

    /// Saves a coupon, or removes it if already saved.
    #[poise::command(slash_command, prefix_command)]
    pub async fn save(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coupon"]
        #[autocomplete = "autocomplete::autocomplete_coupon"]
        coupon: String,
    ) -> Result<()> {
        let coupon_id = parse_coupon_ref(&coupon)?;
        let now_saved = coupon::toggle_save(&ctx.data().database, &user_id(ctx), coupon_id).await?;

        let session = session(ctx).await;
        let key = if now_saved {
            "coupon.saved"
        } else {
            "coupon.unsaved"
        };
        let text = session.language().read().await.t(key).to_string();
        ctx.say(format!("💾 {text}")).await?;
        Ok(())
    }

    /// Lists your saved coupons.
    #[poise::command(slash_command, prefix_command)]
    pub async fn saved(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let saved = coupon::get_saved_coupons(&ctx.data().database, &user_id(ctx)).await?;
        if saved.is_empty() {
            ctx.say("💾 You have no saved coupons yet.").await?;
            return Ok(());
        }

        let session = session(ctx).await;
        let language = session.language().read().await.language();
        let mut reply = String::from("**💾 Saved coupons**\n");
        for coupon in &saved {
            writeln!(
                &mut reply,
                "{}",
                summarize(coupon, language, session.last_location())
            )?;
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Reserves one unit of a coupon.
    #[poise::command(slash_command, prefix_command)]
    pub async fn reserve(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coupon"]
        #[autocomplete = "autocomplete::autocomplete_coupon"]
        coupon: String,
    ) -> Result<()> {
        let coupon_id = parse_coupon_ref(&coupon)?;
        let reserved = coupon::reserve_coupon(&ctx.data().database, &user_id(ctx), coupon_id).await?;

        let session = session(ctx).await;
        let text = session
            .language()
            .read()
            .await
            .t_with("coupon.reserved", &[("title", reserved.title.as_str())]);
        let remaining = coupon::remaining_inventory(&reserved)
            .map(|n| format!(" ({n} left)"))
            .unwrap_or_default();
        ctx.say(format!("🎟️ {text}{remaining}")).await?;
        Ok(())
    }

    /// Rates a coupon from 1 to 5 stars.
    #[poise::command(slash_command, prefix_command)]
    pub async fn review(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coupon"]
        #[autocomplete = "autocomplete::autocomplete_coupon"]
        coupon: String,
        #[description = "Rating from 1 to 5"] rating: i32,
        #[description = "What did you think?"] comment: Option<String>,
    ) -> Result<()> {
        let coupon_id = parse_coupon_ref(&coupon)?;
        let new_review = NewReview {
            user_id: user_id(ctx),
            user_name: ctx.author().name.clone(),
            rating,
            comment: comment.unwrap_or_default(),
        };
        review::add_review(&ctx.data().database, coupon_id, new_review).await?;

        let updated = coupon::get_coupon_by_id(&ctx.data().database, coupon_id)
            .await?
            .ok_or(Error::CouponNotFound { id: coupon_id })?;
        ctx.say(format!(
            "⭐ Thanks! **{}** is now rated {:.1} over {} reviews.",
            updated.title,
            updated.average_rating.unwrap_or_default(),
            updated.review_count
        ))
        .await?;
        Ok(())
    }

    /// Reports whether a coupon still works.
    #[poise::command(slash_command, prefix_command)]
    pub async fn vote(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coupon"]
        #[autocomplete = "autocomplete::autocomplete_coupon"]
        coupon: String,
        #[description = "Does it still work?"] still_valid: bool,
    ) -> Result<()> {
        let coupon_id = parse_coupon_ref(&coupon)?;
        let vote = if still_valid { Vote::Up } else { Vote::Down };
        let updated = coupon::vote_coupon(&ctx.data().database, coupon_id, vote).await?;
        ctx.say(format!(
            "🗳️ Vote recorded for **{}**: 👍 {} 👎 {}",
            updated.title, updated.upvotes, updated.downvotes
        ))
        .await?;
        Ok(())
    }

    /// Publishes a coupon on behalf of your store.
    #[allow(clippy::too_many_arguments)]
    #[poise::command(slash_command, prefix_command)]
    pub async fn campaign(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Your store name"] store: String,
        #[description = "Headline"] title: String,
        #[description = "Discount, e.g. 20% OFF"] discount: String,
        #[description = "Category"]
        #[autocomplete = "autocomplete::autocomplete_category"]
        category: String,
        #[description = "Days until it expires"] days: u32,
        #[description = "Units available (unlimited if empty)"] total: Option<i32>,
        #[description = "Store latitude"] latitude: Option<f64>,
        #[description = "Store longitude"] longitude: Option<f64>,
    ) -> Result<()> {
        let draft = NewCoupon {
            store_name: store.clone(),
            title,
            description: String::new(),
            discount,
            category: Category::from_name(&category),
            latitude,
            longitude,
            expiry_date: Utc::now() + Duration::days(i64::from(days)),
            total_available: total,
            max_per_user: None,
            original_price: None,
            discounted_price: None,
            currency: "BRL".to_string(),
        };
        let created = campaign::create_campaign(&ctx.data().database, &store, draft).await?;
        ctx.say(format!(
            "📣 Campaign live as coupon `{}`: **{}**",
            created.id, created.title
        ))
        .await?;
        Ok(())
    }

    /// Compares two campaign variants by conversion rate.
    #[poise::command(slash_command, prefix_command)]
    pub async fn ab_test(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Variant A impressions"] a_impressions: u64,
        #[description = "Variant A conversions"] a_conversions: u64,
        #[description = "Variant B impressions"] b_impressions: u64,
        #[description = "Variant B conversions"] b_conversions: u64,
    ) -> Result<()> {
        let result = campaign::compare_variants(
            VariantStats::new(a_impressions, a_conversions),
            VariantStats::new(b_impressions, b_conversions),
        );

        let rate = |r: Option<f64>| r.map_or_else(|| "n/a".to_string(), |r| format!("{:.2}%", r * 100.0));
        let mut reply = format!(
            "**🧪 A/B test**\nA: {}\nB: {}\n",
            rate(result.rate_a),
            rate(result.rate_b)
        );
        if let Some(lift) = result.lift {
            writeln!(&mut reply, "Lift (B over A): {:+.1}%", lift * 100.0)?;
        }
        match result.winner {
            Some(winner) => writeln!(&mut reply, "Winner: **{winner:?}**")?,
            None => reply.push_str("No winner yet."),
        }
        ctx.say(reply).await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
