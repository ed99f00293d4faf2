//! Scenario tests for the bot admin operations against an in-memory store
//! and a scripted provisioning client.

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use super::{validation, BotAdminError, BotAdminService, Delegation};
use crate::db::Database;
use crate::freshbots::{
    MockProvisioningClient, ProvisioningCallKind, ProvisioningError, ProvisioningResponse,
};
use crate::models::{
    AdditionalSettings, AttachableType, Attachment, AvatarParam, Bot, CreateBotParams, Portal,
    RequestContext, UpdateBotParams, SUPPORT_BOT_FEATURE,
};

pub(crate) struct TestHarness {
    pub db: Arc<Database>,
    pub provisioning: MockProvisioningClient,
    pub service: Arc<BotAdminService>,
    pub ctx: RequestContext,
    pub main_portal: Portal,
}

impl TestHarness {
    /// Account with the support bot feature, an admin user and a main portal
    pub fn new() -> Self {
        let db = Arc::new(Database::new(":memory:").unwrap());
        let account = db.create_account("Acme", &[SUPPORT_BOT_FEATURE]).unwrap();
        let admin = db.create_user(account.id, "Ada", "ada@acme.test", true).unwrap();
        let main_portal = db.create_portal(account.id, "Acme Help", true, None).unwrap();

        let provisioning = MockProvisioningClient::default();
        let service = Arc::new(BotAdminService::new(db.clone(), Arc::new(provisioning.clone())));

        Self {
            db,
            provisioning,
            service,
            ctx: RequestContext { account_id: account.id, user_id: admin.id },
            main_portal,
        }
    }

    /// A product with its own (non-main) portal
    pub fn product_portal(&self, name: &str) -> Portal {
        let product = self.db.create_product(self.ctx.account_id, name).unwrap();
        self.db
            .create_portal(self.ctx.account_id, &format!("{} Help", name), false, Some(product.id))
            .unwrap()
    }

    pub fn attachment(&self, file_name: &str) -> Attachment {
        self.db
            .create_attachment(self.ctx.account_id, file_name, &format!("https://cdn.test/{}", file_name))
            .unwrap()
    }

    pub fn create_params(&self, portal_id: i64, avatar: Option<AvatarParam>) -> CreateBotParams {
        CreateBotParams {
            name: "Helper".to_string(),
            portal_id,
            header: Some("Welcome!".to_string()),
            theme_colour: Some("#112233".to_string()),
            widget_size: Some("COMPACT".to_string()),
            avatar,
        }
    }

    /// Create a bot through the service with a successful provisioning answer
    pub async fn create_bot(&self, portal_id: i64, avatar: Option<AvatarParam>, bot_hash: &str) -> Bot {
        self.provisioning.push_response(Ok(ProvisioningResponse::created(bot_hash)));
        let created = self
            .service
            .create(&self.ctx, self.create_params(portal_id, avatar))
            .await
            .unwrap();
        self.stored(created.id)
    }

    pub fn stored(&self, bot_id: i64) -> Bot {
        self.db.get_bot(self.ctx.account_id, bot_id).unwrap().unwrap()
    }
}

fn failed(status: u16) -> ProvisioningResponse {
    ProvisioningResponse {
        status,
        body: json!({ "error": "upstream rejected the bot" }),
    }
}

#[tokio::test]
async fn test_list_without_bots() {
    let h = TestHarness::new();
    h.product_portal("Billing");
    h.product_portal("Shop");

    let list = h.service.list(&h.ctx).unwrap();
    assert!(!list.onboarded);
    assert_eq!(list.products.len(), 3);
    assert_eq!(list.products[0].name, "Acme Help");
    assert!(list.products[0].portal_enabled);
    assert_eq!(list.products[0].portal_id, Some(h.main_portal.id));
    assert_eq!(list.products[0].bot_id, None);
    assert_eq!(list.products[1].name, "Billing");
    assert_eq!(list.products[2].name, "Shop");
}

#[tokio::test]
async fn test_list_after_create() {
    let h = TestHarness::new();
    let shop = h.product_portal("Shop");
    let logo = h.attachment("main.png");
    h.db.set_portal_logo(h.main_portal.id, logo.id).unwrap();

    let bot = h.create_bot(shop.id, None, "hash-1").await;

    let list = h.service.list(&h.ctx).unwrap();
    assert!(list.onboarded);
    assert_eq!(list.products.len(), 2);
    assert_eq!(list.products[0].bot_id, None);
    assert_eq!(list.products[0].portal_logo.as_deref(), Some("https://cdn.test/main.png"));
    assert_eq!(list.products[1].bot_id, Some(bot.id));
    assert_eq!(list.products[1].bot_name.as_deref(), Some("Helper"));
}

#[tokio::test]
async fn test_list_requires_main_portal() {
    let h = TestHarness::new();
    let other = h.db.create_account("Other", &[SUPPORT_BOT_FEATURE]).unwrap();
    let ctx = RequestContext { account_id: other.id, user_id: h.ctx.user_id };

    let err = h.service.list(&ctx).unwrap_err();
    assert!(matches!(err, BotAdminError::MissingMainPortal(id) if id == other.id));
    assert!(err.is_internal());
}

#[tokio::test]
async fn test_prepare_new_for_main_portal() {
    let h = TestHarness::new();

    let prepared = h.service.prepare_new(&h.ctx, h.main_portal.id).unwrap();
    assert_eq!(prepared.product.name, "Acme Help");
    assert_eq!(prepared.product.portal_id, h.main_portal.id);
    assert_eq!(prepared.profile, Bot::default_profile());

    let json = serde_json::to_value(&prepared).unwrap();
    assert_eq!(json["name"], "Freddy");
    assert_eq!(json["avatar"]["is_default"], true);
    assert_eq!(json["product"]["portal_id"], h.main_portal.id);
}

#[tokio::test]
async fn test_prepare_new_uses_product_name() {
    let h = TestHarness::new();
    let shop = h.product_portal("Shop");

    let prepared = h.service.prepare_new(&h.ctx, shop.id).unwrap();
    assert_eq!(prepared.product.name, "Shop");
    assert_eq!(prepared.product.portal_logo, None);
}

#[tokio::test]
async fn test_prepare_new_rejects_foreign_portal() {
    let h = TestHarness::new();
    let other = h.db.create_account("Other", &[]).unwrap();
    let foreign = h.db.create_portal(other.id, "Other Help", true, None).unwrap();

    for portal_id in [foreign.id, 9999] {
        match h.service.prepare_new(&h.ctx, portal_id) {
            Err(BotAdminError::Validation(errors)) => assert_eq!(errors[0].field, "portal_id"),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}

#[tokio::test]
async fn test_create_with_default_avatar() {
    let h = TestHarness::new();
    let bot = h
        .create_bot(h.main_portal.id, Some(AvatarParam::Default { avatar_id: Some(2) }), "hash-1")
        .await;

    assert_eq!(
        bot.additional_settings,
        AdditionalSettings {
            is_default: Some(true),
            avatar_id: Some(2),
            bot_hash: Some("hash-1".to_string()),
        }
    );
    assert_eq!(bot.external_id.len(), 32);
    assert_eq!(bot.last_updated_by, Some(h.ctx.user_id));
    assert_eq!(bot.product_id, None);
    assert!(!bot.enable_in_portal);

    let calls = h.provisioning.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].kind, ProvisioningCallKind::Create);
    assert_eq!(calls[0].account_id, h.ctx.account_id);
    assert_eq!(calls[0].payload.external_id, bot.external_id);
    assert!(calls[0].payload.avatar.is_default);
    assert_eq!(calls[0].payload.bot_hsh, None);
}

#[tokio::test]
async fn test_external_ids_increase_with_creation() {
    let h = TestHarness::new();
    let shop = h.product_portal("Shop");

    let first = h.create_bot(h.main_portal.id, None, "hash-1").await;
    tokio::time::sleep(Duration::from_millis(2)).await;
    let second = h.create_bot(shop.id, None, "hash-2").await;

    assert_ne!(first.external_id, second.external_id);
    assert!(first.external_id < second.external_id);
    assert!(second.external_id.chars().all(|c| c.is_ascii_hexdigit()));
}

#[tokio::test]
async fn test_create_with_custom_avatar_attaches_logo() {
    let h = TestHarness::new();
    let shop = h.product_portal("Shop");
    let image = h.attachment("bot.png");

    let bot = h
        .create_bot(shop.id, Some(AvatarParam::Custom { avatar_id: Some(image.id) }), "hash-1")
        .await;

    assert_eq!(bot.additional_settings.is_default, Some(false));
    assert_eq!(bot.additional_settings.avatar_id, None);
    assert_eq!(bot.product_id, shop.product_id);

    let logo = h.db.get_logo(AttachableType::Bot, bot.id).unwrap().unwrap();
    assert_eq!(logo.id, image.id);

    let calls = h.provisioning.calls();
    assert_eq!(calls[0].payload.avatar.avatar_url.as_deref(), Some("https://cdn.test/bot.png"));
}

#[tokio::test]
async fn test_create_without_avatar() {
    let h = TestHarness::new();
    let bot = h.create_bot(h.main_portal.id, None, "hash-1").await;

    assert_eq!(bot.additional_settings.is_default, None);
    assert_eq!(bot.additional_settings.avatar_id, None);
    assert_eq!(bot.additional_settings.bot_hash.as_deref(), Some("hash-1"));
}

#[tokio::test]
async fn test_create_with_unspecified_avatar_is_custom() {
    let h = TestHarness::new();
    let bot = h
        .create_bot(h.main_portal.id, Some(AvatarParam::Unspecified { avatar_id: None }), "hash-1")
        .await;

    assert_eq!(bot.additional_settings.is_default, Some(false));
    assert!(h.db.get_logo(AttachableType::Bot, bot.id).unwrap().is_none());
}

#[tokio::test]
async fn test_create_provisioning_rejection_persists_nothing() {
    let h = TestHarness::new();
    let image = h.attachment("bot.png");
    h.provisioning.push_response(Ok(failed(422)));

    let params = h.create_params(h.main_portal.id, Some(AvatarParam::Custom { avatar_id: Some(image.id) }));
    let err = h.service.create(&h.ctx, params).await.unwrap_err();

    assert!(matches!(err, BotAdminError::Provisioning { status: 422, .. }));
    assert!(err.is_internal());
    assert!(!h.db.account_has_bots(h.ctx.account_id).unwrap());
    assert!(h.db.get_bot_for_portal(h.ctx.account_id, h.main_portal.id).unwrap().is_none());
    // The image stays unowned
    let image = h.db.get_attachment(h.ctx.account_id, image.id).unwrap().unwrap();
    assert_eq!(image.attachable_id, None);
}

#[tokio::test]
async fn test_create_success_status_without_token_fails() {
    let h = TestHarness::new();
    h.provisioning.push_response(Ok(ProvisioningResponse {
        status: 201,
        body: json!({ "content": {} }),
    }));

    let err = h
        .service
        .create(&h.ctx, h.create_params(h.main_portal.id, None))
        .await
        .unwrap_err();
    assert!(matches!(err, BotAdminError::Provisioning { status: 201, .. }));
    assert!(!h.db.account_has_bots(h.ctx.account_id).unwrap());
}

#[tokio::test]
async fn test_create_transport_error_persists_nothing() {
    let h = TestHarness::new();
    h.provisioning
        .push_response(Err(ProvisioningError::Unavailable("connection refused".to_string())));

    let err = h
        .service
        .create(&h.ctx, h.create_params(h.main_portal.id, None))
        .await
        .unwrap_err();
    assert!(matches!(err, BotAdminError::Transport(_)));
    assert!(!h.db.account_has_bots(h.ctx.account_id).unwrap());
}

#[tokio::test]
async fn test_second_create_for_portal_is_rejected() {
    let h = TestHarness::new();
    h.create_bot(h.main_portal.id, None, "hash-1").await;

    let err = h
        .service
        .create(&h.ctx, h.create_params(h.main_portal.id, None))
        .await
        .unwrap_err();
    match err {
        BotAdminError::Validation(errors) => assert_eq!(errors[0].field, "portal_id"),
        other => panic!("expected validation error, got {:?}", other),
    }
    // Rejected before Freshbots is asked
    assert_eq!(h.provisioning.calls().len(), 1);
}

#[tokio::test]
async fn test_update_unspecified_on_default_bot_switches_to_custom() {
    let h = TestHarness::new();
    let image = h.attachment("custom.png");
    let bot = h
        .create_bot(h.main_portal.id, Some(AvatarParam::Default { avatar_id: Some(1) }), "hash-1")
        .await;

    h.provisioning.push_response(Ok(ProvisioningResponse::updated()));
    let params = UpdateBotParams {
        avatar: Some(AvatarParam::Unspecified { avatar_id: Some(image.id) }),
        ..Default::default()
    };
    h.service.update(&h.ctx, bot.id, params).await.unwrap();

    let stored = h.stored(bot.id);
    assert_eq!(stored.additional_settings.is_default, Some(false));
    assert_eq!(stored.additional_settings.avatar_id, Some(image.id));
    assert_eq!(stored.additional_settings.bot_hash.as_deref(), Some("hash-1"));
    // Now on a custom avatar, so the named attachment becomes the logo
    assert_eq!(h.db.get_logo(AttachableType::Bot, bot.id).unwrap().unwrap().id, image.id);

    let calls = h.provisioning.calls();
    assert!(!calls[1].payload.avatar.is_default);
    assert_eq!(calls[1].payload.avatar.avatar_url.as_deref(), Some("https://cdn.test/custom.png"));
}

#[tokio::test]
async fn test_update_unspecified_without_id_drops_avatar_id() {
    let h = TestHarness::new();
    let bot = h
        .create_bot(h.main_portal.id, Some(AvatarParam::Default { avatar_id: Some(1) }), "hash-1")
        .await;

    h.provisioning.push_response(Ok(ProvisioningResponse::updated()));
    let params = UpdateBotParams {
        avatar: Some(AvatarParam::Unspecified { avatar_id: None }),
        ..Default::default()
    };
    h.service.update(&h.ctx, bot.id, params).await.unwrap();

    let stored = h.stored(bot.id);
    assert_eq!(stored.additional_settings.is_default, Some(false));
    assert_eq!(stored.additional_settings.avatar_id, None);
    assert!(h.db.get_logo(AttachableType::Bot, bot.id).unwrap().is_none());
}

#[tokio::test]
async fn test_update_to_custom_avatar_detaches_logo() {
    let h = TestHarness::new();
    let first = h.attachment("first.png");
    let bot = h
        .create_bot(h.main_portal.id, Some(AvatarParam::Custom { avatar_id: Some(first.id) }), "hash-1")
        .await;
    assert!(h.db.get_logo(AttachableType::Bot, bot.id).unwrap().is_some());

    h.provisioning.push_response(Ok(ProvisioningResponse::updated()));
    let params = UpdateBotParams {
        avatar: Some(AvatarParam::Custom { avatar_id: None }),
        ..Default::default()
    };
    h.service.update(&h.ctx, bot.id, params).await.unwrap();

    let stored = h.stored(bot.id);
    assert_eq!(stored.additional_settings.is_default, Some(false));
    assert_eq!(stored.additional_settings.avatar_id, None);
    assert!(h.db.get_logo(AttachableType::Bot, bot.id).unwrap().is_none());
}

#[tokio::test]
async fn test_update_default_to_custom_replaces_logo() {
    let h = TestHarness::new();
    let image = h.attachment("custom.png");
    let bot = h
        .create_bot(h.main_portal.id, Some(AvatarParam::Default { avatar_id: Some(1) }), "hash-1")
        .await;

    h.provisioning.push_response(Ok(ProvisioningResponse::updated()));
    let params = UpdateBotParams {
        avatar: Some(AvatarParam::Custom { avatar_id: Some(image.id) }),
        ..Default::default()
    };
    h.service.update(&h.ctx, bot.id, params).await.unwrap();

    let stored = h.stored(bot.id);
    assert_eq!(stored.additional_settings.is_default, Some(false));
    assert_eq!(stored.additional_settings.avatar_id, None);
    assert_eq!(h.db.get_logo(AttachableType::Bot, bot.id).unwrap().unwrap().id, image.id);

    let calls = h.provisioning.calls();
    assert_eq!(calls[1].kind, ProvisioningCallKind::Update);
    assert_eq!(calls[1].payload.avatar.avatar_url.as_deref(), Some("https://cdn.test/custom.png"));
}

#[tokio::test]
async fn test_update_applies_present_fields_only() {
    let h = TestHarness::new();
    let bot = h.create_bot(h.main_portal.id, None, "hash-1").await;

    h.provisioning.push_response(Ok(ProvisioningResponse::updated()));
    let params = UpdateBotParams {
        name: Some("Renamed".to_string()),
        widget_size: Some("STANDARD".to_string()),
        ..Default::default()
    };
    h.service.update(&h.ctx, bot.id, params).await.unwrap();

    let stored = h.stored(bot.id);
    assert_eq!(stored.name, "Renamed");
    assert_eq!(stored.template_data.widget_size.as_deref(), Some("STANDARD"));
    assert_eq!(stored.template_data.header.as_deref(), Some("Welcome!"));
    assert_eq!(stored.template_data.theme_colour.as_deref(), Some("#112233"));
    assert_eq!(stored.external_id, bot.external_id);
    assert_eq!(stored.additional_settings.bot_hash.as_deref(), Some("hash-1"));
    assert_eq!(stored.additional_settings.is_default, None);

    let calls = h.provisioning.calls();
    assert_eq!(calls[1].payload.bot_hsh.as_deref(), Some("hash-1"));
    assert_eq!(calls[1].payload.external_id, bot.external_id);
    assert_eq!(calls[1].payload.name, "Renamed");
}

#[tokio::test]
async fn test_update_provisioning_rejection_keeps_record() {
    let h = TestHarness::new();
    let bot = h.create_bot(h.main_portal.id, None, "hash-1").await;

    h.provisioning.push_response(Ok(failed(500)));
    let params = UpdateBotParams {
        name: Some("Renamed".to_string()),
        ..Default::default()
    };
    let err = h.service.update(&h.ctx, bot.id, params).await.unwrap_err();

    assert!(matches!(err, BotAdminError::Provisioning { status: 500, .. }));
    assert_eq!(h.stored(bot.id).name, "Helper");
}

#[tokio::test]
async fn test_update_unknown_bot() {
    let h = TestHarness::new();

    let err = h
        .service
        .update(&h.ctx, 4242, UpdateBotParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, BotAdminError::NotFound));
    assert!(h.provisioning.calls().is_empty());
}

#[tokio::test]
async fn test_update_rechecks_delegated_portal() {
    let h = TestHarness::new();
    let bot = h.create_bot(h.main_portal.id, None, "hash-1").await;

    let own = Delegation::Update { bot_id: bot.id };
    let portal = validation::validate_delegator(&h.db, &h.ctx, h.main_portal.id, own).unwrap();
    assert_eq!(portal.id, h.main_portal.id);

    let foreign = Delegation::Update { bot_id: bot.id + 1 };
    let err = validation::validate_delegator(&h.db, &h.ctx, h.main_portal.id, foreign).unwrap_err();
    match err {
        BotAdminError::Validation(errors) => assert_eq!(errors[0].field, "portal_id"),
        other => panic!("expected validation error, got {:?}", other),
    }

    let stranger = RequestContext { account_id: h.ctx.account_id + 1, user_id: h.ctx.user_id };
    assert!(validation::validate_delegator(&h.db, &stranger, h.main_portal.id, own).is_err());
}

#[tokio::test]
async fn test_show_status_only_when_training_status_set() {
    let h = TestHarness::new();
    let bot = h.create_bot(h.main_portal.id, None, "hash-1").await;

    let shown = h.service.show(&h.ctx, bot.id).unwrap();
    assert_eq!(shown.status, None);
    let json = serde_json::to_value(&shown).unwrap();
    assert!(json.get("status").is_none());
    assert_eq!(json["bot_hash"], "hash-1");
    assert_eq!(json["enable_on_portal"], false);

    h.db.set_training_status(h.ctx.account_id, bot.id, Some("")).unwrap();
    assert_eq!(h.service.show(&h.ctx, bot.id).unwrap().status, None);

    h.db.set_training_status(h.ctx.account_id, bot.id, Some("TRAINING")).unwrap();
    let json = serde_json::to_value(h.service.show(&h.ctx, bot.id).unwrap()).unwrap();
    assert_eq!(json["status"], "TRAINING");
}

#[tokio::test]
async fn test_show_is_idempotent() {
    let h = TestHarness::new();
    let shop = h.product_portal("Shop");
    let image = h.attachment("bot.png");
    let bot = h
        .create_bot(shop.id, Some(AvatarParam::Custom { avatar_id: Some(image.id) }), "hash-1")
        .await;

    let first = h.service.show(&h.ctx, bot.id).unwrap();
    let second = h.service.show(&h.ctx, bot.id).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.product.name, "Shop");
    assert_eq!(first.external_id, bot.external_id);
    assert_eq!(first.profile.avatar.avatar_url.as_deref(), Some("https://cdn.test/bot.png"));
}

#[tokio::test]
async fn test_show_is_account_scoped() {
    let h = TestHarness::new();
    let bot = h.create_bot(h.main_portal.id, None, "hash-1").await;
    let other = h.db.create_account("Other", &[SUPPORT_BOT_FEATURE]).unwrap();
    let ctx = RequestContext { account_id: other.id, user_id: h.ctx.user_id };

    assert!(matches!(h.service.show(&ctx, bot.id), Err(BotAdminError::NotFound)));
}
