//! Support bot administration.
//!
//! [`BotAdminService`] runs the admin operations (list, prepare, create, show
//! and update) for one tenant at a time. Create and update go through the
//! Freshbots provisioning service before the local record is written, so a
//! rejected provisioning call leaves nothing behind.

mod error;
pub mod validation;

#[cfg(test)]
pub(crate) mod tests;

pub use error::BotAdminError;
pub use validation::Delegation;

use std::sync::Arc;
use uuid::Uuid;

use crate::db::{Database, LogoChange, SaveBotError};
use crate::freshbots::{
    BotPayload, ProvisioningClient, BOT_CREATION_SUCCESS_STATUS, BOT_UPDATION_SUCCESS_STATUS,
};
use crate::models::{
    AdditionalSettings, AttachableType, AvatarParam, Bot, BotDetailResponse, BotListResponse,
    CreateBotParams, CreatedBotResponse, NewBotResponse, Portal, ProductInfo, ProductSummary,
    RequestContext, UpdateBotParams,
};

pub struct BotAdminService {
    db: Arc<Database>,
    provisioning: Arc<dyn ProvisioningClient>,
}

impl BotAdminService {
    pub fn new(db: Arc<Database>, provisioning: Arc<dyn ProvisioningClient>) -> Self {
        Self { db, provisioning }
    }

    /// Main portal first, then every product with its bot, if any
    pub fn list(&self, ctx: &RequestContext) -> Result<BotListResponse, BotAdminError> {
        let listed = self.list_products(ctx);
        if let Err(err) = &listed {
            report_failure("list", ctx, None, err);
        }
        listed
    }

    fn list_products(&self, ctx: &RequestContext) -> Result<BotListResponse, BotAdminError> {
        let onboarded = self.db.account_has_bots(ctx.account_id)?;
        let main_portal = self
            .db
            .get_main_portal(ctx.account_id)?
            .ok_or(BotAdminError::MissingMainPortal(ctx.account_id))?;

        let main_bot = self.db.get_bot_for_portal(ctx.account_id, main_portal.id)?;
        let portal_logo = self
            .db
            .get_logo(AttachableType::Portal, main_portal.id)?
            .map(|logo| logo.content_url);

        let mut products = vec![ProductSummary {
            name: main_portal.name,
            portal_enabled: true,
            portal_id: Some(main_portal.id),
            portal_logo,
            bot_name: main_bot.as_ref().map(|bot| bot.name.clone()),
            bot_id: main_bot.map(|bot| bot.id),
        }];
        products.extend(self.db.list_product_bot_info(ctx.account_id)?);

        log::info!(
            "[BOT_ADMIN] Listed {} product(s) for account {}, onboarded={}",
            products.len(),
            ctx.account_id,
            onboarded
        );
        Ok(BotListResponse { onboarded, products })
    }

    /// Portal details plus the default profile for the new-bot form
    pub fn prepare_new(
        &self,
        ctx: &RequestContext,
        portal_id: i64,
    ) -> Result<NewBotResponse, BotAdminError> {
        let prepared = validation::validate_delegator(&self.db, ctx, portal_id, Delegation::Prepare)
            .and_then(|portal| self.product_info(ctx, &portal))
            .map(|product| NewBotResponse {
                product,
                profile: Bot::default_profile(),
            });
        if let Err(err) = &prepared {
            report_failure("new", ctx, None, err);
        }
        prepared
    }

    /// Register a bot with Freshbots, then store it.
    pub async fn create(
        &self,
        ctx: &RequestContext,
        params: CreateBotParams,
    ) -> Result<CreatedBotResponse, BotAdminError> {
        let portal =
            match validation::validate_delegator(&self.db, ctx, params.portal_id, Delegation::Create) {
                Ok(portal) => portal,
                Err(err) => {
                    report_failure("create", ctx, None, &err);
                    return Err(err);
                }
            };

        let mut bot = Bot::build(ctx.account_id, &params);
        bot.external_id = Uuid::now_v7().simple().to_string();
        bot.last_updated_by = Some(ctx.user_id);
        bot.product_id = portal.product_id;
        bot.additional_settings = AdditionalSettings::for_new_bot(params.avatar.as_ref());

        let logo = self.logo_change(ctx, &bot.additional_settings, params.avatar.as_ref());
        let created = self.provision_new_bot(ctx, &mut bot, logo).await;
        if let Err(err) = &created {
            report_failure("create", ctx, Some(&bot), err);
        }
        created?;

        log::info!(
            "[BOT_ADMIN] Created bot {} (external_id={}) for portal {} of account {}",
            bot.id,
            bot.external_id,
            bot.portal_id,
            ctx.account_id
        );
        Ok(CreatedBotResponse { id: bot.id })
    }

    async fn provision_new_bot(
        &self,
        ctx: &RequestContext,
        bot: &mut Bot,
        logo: LogoChange,
    ) -> Result<(), BotAdminError> {
        let payload = BotPayload::new(bot, self.avatar_url(bot, &logo)?);
        let response = self.provisioning.create_bot(ctx.account_id, &payload).await?;

        if response.status != BOT_CREATION_SUCCESS_STATUS {
            return Err(BotAdminError::Provisioning {
                status: response.status,
                body: response.body,
            });
        }
        let Some(bot_hash) = response.bot_hash().map(str::to_string) else {
            return Err(BotAdminError::Provisioning {
                status: response.status,
                body: response.body,
            });
        };

        bot.additional_settings.bot_hash = Some(bot_hash);
        self.save_bot(bot, logo)
    }

    /// A bot of the account with its portal and settings
    pub fn show(&self, ctx: &RequestContext, bot_id: i64) -> Result<BotDetailResponse, BotAdminError> {
        let shown = self.bot_detail(ctx, bot_id);
        if let Err(err) = &shown {
            report_failure("show", ctx, None, err);
        }
        shown
    }

    fn bot_detail(&self, ctx: &RequestContext, bot_id: i64) -> Result<BotDetailResponse, BotAdminError> {
        let bot = self
            .db
            .get_bot(ctx.account_id, bot_id)?
            .ok_or(BotAdminError::NotFound)?;
        let portal = self
            .db
            .get_portal(ctx.account_id, bot.portal_id)?
            .ok_or(BotAdminError::NotFound)?;
        let logo = self.db.get_logo(AttachableType::Bot, bot.id)?;

        Ok(BotDetailResponse {
            product: self.product_info(ctx, &portal)?,
            id: bot.id,
            external_id: bot.external_id.clone(),
            enable_on_portal: bot.enable_in_portal,
            status: bot.status().map(str::to_string),
            profile: bot.profile(logo.as_ref()),
        })
    }

    /// Apply the given changes, push them to Freshbots, then store them.
    pub async fn update(
        &self,
        ctx: &RequestContext,
        bot_id: i64,
        params: UpdateBotParams,
    ) -> Result<(), BotAdminError> {
        let mut bot = match self.db.get_bot(ctx.account_id, bot_id) {
            Ok(Some(bot)) => bot,
            Ok(None) => return Err(BotAdminError::NotFound),
            Err(e) => {
                let err = BotAdminError::from(e);
                report_failure("update", ctx, None, &err);
                return Err(err);
            }
        };

        let delegation = Delegation::Update { bot_id: bot.id };
        if let Err(err) = validation::validate_delegator(&self.db, ctx, bot.portal_id, delegation) {
            report_failure("update", ctx, Some(&bot), &err);
            return Err(err);
        }

        if let Some(name) = params.name {
            bot.name = name;
        }
        if let Some(header) = params.header {
            bot.template_data.header = Some(header);
        }
        if let Some(theme_colour) = params.theme_colour {
            bot.template_data.theme_colour = Some(theme_colour);
        }
        if let Some(widget_size) = params.widget_size {
            bot.template_data.widget_size = Some(widget_size);
        }
        bot.last_updated_by = Some(ctx.user_id);
        if let Some(avatar) = &params.avatar {
            bot.additional_settings.apply_avatar_update(avatar);
        }

        let logo = self.logo_change(ctx, &bot.additional_settings, params.avatar.as_ref());
        let updated = self.provision_changes(ctx, &mut bot, logo).await;
        if let Err(err) = &updated {
            report_failure("update", ctx, Some(&bot), err);
        }
        updated?;

        log::info!(
            "[BOT_ADMIN] Updated bot {} of account {}",
            bot.id,
            ctx.account_id
        );
        Ok(())
    }

    async fn provision_changes(
        &self,
        ctx: &RequestContext,
        bot: &mut Bot,
        logo: LogoChange,
    ) -> Result<(), BotAdminError> {
        let payload = BotPayload::new(bot, self.avatar_url(bot, &logo)?);
        let response = self.provisioning.update_bot(ctx.account_id, &payload).await?;

        if response.status != BOT_UPDATION_SUCCESS_STATUS {
            return Err(BotAdminError::Provisioning {
                status: response.status,
                body: response.body,
            });
        }
        self.save_bot(bot, logo)
    }

    /// Persist a bot and its logo change; record problems become field errors.
    pub fn save_bot(&self, bot: &mut Bot, logo: LogoChange) -> Result<(), BotAdminError> {
        self.db.save_bot(bot, logo).map_err(|err| match err {
            SaveBotError::Invalid(errors) => BotAdminError::RecordInvalid(errors),
            SaveBotError::Db(err) => BotAdminError::Database(err),
        })
    }

    /// Logo to attach for the avatar parameter of a request.
    ///
    /// Only a bot left on a custom avatar gets one, looked up by the
    /// parameter's `avatar_id` within the account.
    fn logo_change(
        &self,
        ctx: &RequestContext,
        settings: &AdditionalSettings,
        avatar: Option<&AvatarParam>,
    ) -> LogoChange {
        let Some(avatar) = avatar else {
            return LogoChange::Keep;
        };
        if settings.uses_default_avatar() {
            return LogoChange::Keep;
        }

        let logo = avatar.avatar_id().and_then(|attachment_id| {
            match self.db.get_attachment(ctx.account_id, attachment_id) {
                Ok(found) => found,
                Err(e) => {
                    log::warn!(
                        "[BOT_ADMIN] Attachment {} lookup failed for account {}: {}",
                        attachment_id,
                        ctx.account_id,
                        e
                    );
                    None
                }
            }
        });
        LogoChange::Replace(logo)
    }

    /// Image the provisioning payload should point at
    fn avatar_url(&self, bot: &Bot, logo: &LogoChange) -> Result<Option<String>, BotAdminError> {
        match logo {
            LogoChange::Replace(new_logo) => Ok(new_logo.as_ref().map(|l| l.content_url.clone())),
            LogoChange::Keep if bot.is_persisted() => Ok(self
                .db
                .get_logo(AttachableType::Bot, bot.id)?
                .map(|l| l.content_url)),
            LogoChange::Keep => Ok(None),
        }
    }

    /// Name the portal is presented under: its own for the main portal, the
    /// product's otherwise.
    fn product_info(&self, ctx: &RequestContext, portal: &Portal) -> Result<ProductInfo, BotAdminError> {
        let product_name = match portal.product_id {
            Some(product_id) if !portal.main_portal => self
                .db
                .get_product(ctx.account_id, product_id)?
                .map(|product| product.name),
            _ => None,
        };
        let portal_logo = self
            .db
            .get_logo(AttachableType::Portal, portal.id)?
            .map(|logo| logo.content_url);

        Ok(ProductInfo {
            name: product_name.unwrap_or_else(|| portal.name.clone()),
            portal_id: portal.id,
            portal_logo,
        })
    }
}

/// Log a failed operation. Internal failures get the full context and cause
/// chain since the caller only sees the generic error body.
fn report_failure(operation: &str, ctx: &RequestContext, bot: Option<&Bot>, err: &BotAdminError) {
    if !err.is_internal() {
        log::info!(
            "[BOT_ADMIN] {} rejected for account {}: {}",
            operation,
            ctx.account_id,
            err
        );
        return;
    }

    match bot {
        Some(bot) => log::error!(
            "[BOT_ADMIN] {} failed: bot_hash={:?} bot_id={} external_id={} account_id={} error={}",
            operation,
            bot.additional_settings.bot_hash,
            bot.id,
            bot.external_id,
            ctx.account_id,
            error_chain(err)
        ),
        None => log::error!(
            "[BOT_ADMIN] {} failed: account_id={} error={}",
            operation,
            ctx.account_id,
            error_chain(err)
        ),
    }
}

fn error_chain(err: &dyn std::error::Error) -> String {
    let mut chain = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        chain.push_str(": ");
        chain.push_str(&cause.to_string());
        source = cause.source();
    }
    chain
}
