//! Account Discord commands - profile, role, language and checkout.

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
            checkout::{self, PaymentMethod, PaymentRequest},
            coupon,
            format::format_currency,
            i18n::Language,
            notification::{NewNotification, NotificationCategory, NotificationKind},
            user,
        },
        entities::Role,
        errors::{Error, Result},
    };

    /// Payment methods offered in the command picker.
    #[derive(Debug, Clone, Copy, poise::ChoiceParameter)]
    pub enum MethodChoice {
        #[name = "Credit card"]
        CreditCard,
        #[name = "Debit card"]
        DebitCard,
        #[name = "Pix"]
        Pix,
        #[name = "Boleto"]
        Boleto,
    }

    impl From<MethodChoice> for PaymentMethod {
        fn from(choice: MethodChoice) -> Self {
            match choice {
                MethodChoice::CreditCard => Self::CreditCard,
                MethodChoice::DebitCard => Self::DebitCard,
                MethodChoice::Pix => Self::Pix,
                MethodChoice::Boleto => Self::Boleto,
            }
        }
    }

    /// Shows your role, dashboard and loyalty points.
    #[poise::command(slash_command, prefix_command)]
    pub async fn profile(ctx: poise::Context<'_, BotData, Error>) -> Result<()> {
        let me = user::get_or_create_user(&ctx.data().database, &user_id(ctx), &ctx.author().name)
            .await?;
        let session = session(ctx).await;
        let language = session.language().read().await.language();
        ctx.say(format!(
            "**👤 {}**\nRole: {:?} ({:?} dashboard)\nLoyalty points: {}\nLanguage: {}",
            me.name,
            me.role,
            me.role.dashboard(),
            me.loyalty_points,
            language.locale()
        ))
        .await?;
        Ok(())
    }

    /// Switches your role (super_admin, franchisee, shopkeeper, agency, user).
    #[poise::command(slash_command, prefix_command)]
    pub async fn role(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Role name"] name: String,
    ) -> Result<()> {
        let db = &ctx.data().database;
        let id = user_id(ctx);
        user::get_or_create_user(db, &id, &ctx.author().name).await?;
        let updated = user::set_role(db, &id, Role::from_name(&name)).await?;
        ctx.say(format!(
            "🔑 You are now {:?}; `/profile` shows the {:?} dashboard.",
            updated.role,
            updated.role.dashboard()
        ))
        .await?;
        Ok(())
    }

    /// Changes the language of bot replies.
    #[poise::command(slash_command, prefix_command)]
    pub async fn language(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Language code"]
        #[autocomplete = "autocomplete::autocomplete_language"]
        code: String,
    ) -> Result<()> {
        let language = Language::from_code(&code)
            .ok_or_else(|| Error::invalid(format!("Unsupported language '{code}'")))?;

        let session = session(ctx).await;
        let mut store = session.language().write().await;
        store.set_language(language);
        let text = store.t("language.changed").to_string();
        drop(store);

        ctx.say(format!("🌐 {text}")).await?;
        Ok(())
    }

    /// Buys a coupon and earns loyalty points.
    #[poise::command(slash_command, prefix_command)]
    pub async fn checkout(
        ctx: poise::Context<'_, BotData, Error>,
        #[description = "Coupon"]
        #[autocomplete = "autocomplete::autocomplete_coupon"]
        coupon: String,
        #[description = "Email for the receipt"] email: String,
        #[description = "Payment method"] method: MethodChoice,
        #[description = "Installments (credit card only)"] installments: Option<u8>,
        #[description = "Amount, when the coupon has no fixed price"] amount: Option<f64>,
    ) -> Result<()> {
        let data = ctx.data();
        let coupon_id = parse_coupon_ref(&coupon)?;
        let found = coupon::get_coupon_by_id(&data.database, coupon_id)
            .await?
            .ok_or(Error::CouponNotFound { id: coupon_id })?;
        let amount = found
            .discounted_price
            .or(amount)
            .ok_or_else(|| Error::invalid("This coupon has no fixed price; pass an amount"))?;

        let id = user_id(ctx);
        user::get_or_create_user(&data.database, &id, &ctx.author().name).await?;

        ctx.defer().await?;
        let request = PaymentRequest {
            coupon_id,
            amount,
            method: method.into(),
            installments: installments.unwrap_or(1),
        };
        let outcome =
            checkout::checkout(&data.database, &data.processor, &data.settings, &id, &email, request)
                .await?;

        let session = session(ctx).await;
        session
            .notifications()
            .add_notification(
                NewNotification::new(
                    "Points earned",
                    format!("+{} points for {}", outcome.points_awarded, found.title),
                )
                .kind(NotificationKind::Success)
                .category(NotificationCategory::Reward),
            )
            .await;

        ctx.say(format!(
            "💳 Paid {} for **{}** (receipt `{}`). +{} points, {} total.",
            format_currency(outcome.receipt.amount, &found.currency),
            found.title,
            outcome.receipt.transaction_id,
            outcome.points_awarded,
            outcome.total_points
        ))
        .await?;
        Ok(())
    }
}

// Re-export all commands
pub use inner::*;
