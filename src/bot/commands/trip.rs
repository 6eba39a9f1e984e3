//! Trip Discord commands - planning multi-day itineraries from coupons.

// Inner module to suppress missing_docs warnings for poise macro-generated code
mod inner {
    #![allow(missing_docs)]

    use crate::{
        bot::{BotData, commands::user_id},
        core::{format::format_currency, itinerary},
        errors::{Error, Result},
    };
    use std::fmt::Write;

    /// Parses a day plan written as coupon ids, days separated by `;` and stops by `,`.
    ///
    /// `"3,5;8"` is two days: coupons 3 and 5, then coupon 8.
    pub fn parse_days(input: &str) -> Result<Vec<Vec<i64>>> {
        input
            .split(';')
            .map(|day| {
                day.split(',')
                    .map(str::trim)
                    .filter(|stop| !stop.is_empty())
                    .map(|stop| {
                        stop.trim_start_matches('#')
                            .parse()
                            .map_err(|_| Error::invalid(format!("'{stop}' is not a coupon id")))
                    })
                    .collect()
            })
            .collect()
    }

    /// Plans a trip. Days are separated by `;`, coupon ids within a day by `,`.
    #[poise::command(slash_command, prefix_command)]
    pub async fn plan_trip(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Trip title"] title: String,
        #[description = "Coupon ids per day, e.g. 3,5;8"] days: String,
    ) -> Result<()> {
        let plan = parse_days(&days)?;
        let created =
            itinerary::create_itinerary(&ctx.data().database, &user_id(ctx), &title, plan).await?;
        ctx.say(format!(
            "🗺️ Trip `{}` **{}** planned: {} days, saving {}. Use `/activate_trip {}` to get alerts on the way.",
            created.id,
            created.title,
            created.duration_days,
            format_currency(created.total_savings, "BRL"),
            created.id
        ))
        .await?;
        Ok(())
    }

    /// Lists your trips and their stops.
    #[poise::command(slash_command, prefix_command)]
    pub async fn trips(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let db = &ctx.data().database;
        let trips = itinerary::get_itineraries_for_user(db, &user_id(ctx)).await?;
        if trips.is_empty() {
            ctx.say("🗺️ No trips yet. Plan one with `/plan_trip`.").await?;
            return Ok(());
        }

        let mut reply = String::from("**🗺️ Your trips**\n");
        for trip in &trips {
            let active = if trip.is_active { " (active)" } else { "" };
            writeln!(
                &mut reply,
                "`{}` **{}**{active} - saves {}",
                trip.id,
                trip.title,
                format_currency(trip.total_savings, "BRL")
            )?;
            for day in itinerary::get_itinerary_days(db, trip.id).await? {
                let stops: Vec<&str> = day.stops.iter().map(|c| c.title.as_str()).collect();
                writeln!(&mut reply, "  Day {}: {}", day.day_index + 1, stops.join(" → "))?;
            }
        }
        ctx.say(reply).await?;
        Ok(())
    }

    /// Makes a trip the active one; its stops feed smart alerts.
    #[poise::command(slash_command, prefix_command)]
    pub async fn activate_trip(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Trip id"] id: i64,
    ) -> Result<()> {
        let trip = itinerary::set_active_itinerary(&ctx.data().database, &user_id(ctx), id).await?;
        ctx.say(format!("🧭 **{}** is now your active trip.", trip.title))
            .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
