use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{Attachment, FieldError, ProductInfo};

/// Widget sizes the chat widget can be rendered in
pub const WIDGET_SIZES: [&str; 2] = ["STANDARD", "COMPACT"];

/// Longest bot name the store accepts
pub const MAX_NAME_LENGTH: usize = 255;

/// Built-in avatar used until the admin picks one
const DEFAULT_AVATAR_ID: i64 = 1;

/// Presentation settings for the chat widget
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateData {
    #[serde(default)]
    pub header: Option<String>,
    #[serde(default)]
    pub theme_colour: Option<String>,
    #[serde(default)]
    pub widget_size: Option<String>,
}

/// Avatar state plus the provisioning token, stored as one JSON column.
///
/// Keys are omitted when unset so a bot created without an avatar stores `{}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdditionalSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bot_hash: Option<String>,
}

impl AdditionalSettings {
    /// Settings for a bot that is about to be created.
    pub fn for_new_bot(avatar: Option<&AvatarParam>) -> Self {
        match avatar {
            Some(AvatarParam::Default { avatar_id }) => Self {
                is_default: Some(true),
                avatar_id: *avatar_id,
                bot_hash: None,
            },
            Some(AvatarParam::Custom { .. }) | Some(AvatarParam::Unspecified { .. }) => Self {
                is_default: Some(false),
                avatar_id: None,
                bot_hash: None,
            },
            None => Self::default(),
        }
    }

    /// Recompute avatar settings from an update's avatar parameter.
    ///
    /// An explicit default, or an unspecified `is_default` on a bot that is
    /// currently on the default avatar, takes `is_default` from the parameter
    /// (null reads as false) and replaces `avatar_id` with the parameter's,
    /// clearing it when none is given. Every other case moves the bot to a
    /// custom avatar and drops `avatar_id`.
    pub fn apply_avatar_update(&mut self, avatar: &AvatarParam) {
        let takes_param = match avatar {
            AvatarParam::Default { .. } => true,
            AvatarParam::Unspecified { .. } => self.uses_default_avatar(),
            AvatarParam::Custom { .. } => false,
        };

        if takes_param {
            self.is_default = Some(matches!(avatar, AvatarParam::Default { .. }));
            self.avatar_id = avatar.avatar_id();
        } else {
            self.is_default = Some(false);
            self.avatar_id = None;
        }
    }

    pub fn uses_default_avatar(&self) -> bool {
        self.is_default == Some(true)
    }
}

/// Avatar object as it arrives in a request body
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct AvatarInput {
    #[serde(default)]
    pub is_default: Option<bool>,
    #[serde(default)]
    pub avatar_id: Option<i64>,
}

/// The avatar parameter of a create/update request.
///
/// `Unspecified` is an avatar object whose `is_default` was null or missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AvatarParam {
    Default { avatar_id: Option<i64> },
    Custom { avatar_id: Option<i64> },
    Unspecified { avatar_id: Option<i64> },
}

impl AvatarParam {
    pub fn avatar_id(&self) -> Option<i64> {
        match self {
            AvatarParam::Default { avatar_id }
            | AvatarParam::Custom { avatar_id }
            | AvatarParam::Unspecified { avatar_id } => *avatar_id,
        }
    }
}

impl From<AvatarInput> for AvatarParam {
    fn from(input: AvatarInput) -> Self {
        let avatar_id = input.avatar_id;
        match input.is_default {
            Some(true) => AvatarParam::Default { avatar_id },
            Some(false) => AvatarParam::Custom { avatar_id },
            None => AvatarParam::Unspecified { avatar_id },
        }
    }
}

/// Support bot record of one portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bot {
    /// 0 until the record has been saved
    pub id: i64,
    pub account_id: i64,
    pub portal_id: i64,
    pub product_id: Option<i64>,
    pub external_id: String,
    pub name: String,
    pub template_data: TemplateData,
    pub additional_settings: AdditionalSettings,
    pub enable_in_portal: bool,
    pub training_status: Option<String>,
    pub last_updated_by: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Bot {
    /// Unsaved bot built from create parameters
    pub fn build(account_id: i64, params: &CreateBotParams) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            account_id,
            portal_id: params.portal_id,
            product_id: None,
            external_id: String::new(),
            name: params.name.clone(),
            template_data: TemplateData {
                header: params.header.clone(),
                theme_colour: params.theme_colour.clone(),
                widget_size: params.widget_size.clone(),
            },
            additional_settings: AdditionalSettings::default(),
            enable_in_portal: false,
            training_status: None,
            last_updated_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id > 0
    }

    /// Record-level validation run before every save
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();
        let name = self.name.trim();
        if name.is_empty() {
            errors.push(FieldError::invalid_value("name", "can't be blank"));
        } else if name.chars().count() > MAX_NAME_LENGTH {
            errors.push(FieldError::invalid_value(
                "name",
                format!("is too long (maximum is {} characters)", MAX_NAME_LENGTH),
            ));
        }
        if self.external_id.is_empty() {
            errors.push(FieldError::invalid_value("external_id", "can't be blank"));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }

    /// Training state as reported by the provisioning side, if any
    pub fn status(&self) -> Option<&str> {
        self.training_status.as_deref().filter(|s| !s.is_empty())
    }

    pub fn profile(&self, logo: Option<&Attachment>) -> BotProfile {
        BotProfile {
            name: self.name.clone(),
            header: self.template_data.header.clone(),
            theme_colour: self.template_data.theme_colour.clone(),
            widget_size: self.template_data.widget_size.clone(),
            avatar: AvatarProfile {
                is_default: self.additional_settings.is_default,
                avatar_id: self.additional_settings.avatar_id,
                avatar_url: logo.map(|l| l.content_url.clone()),
            },
            bot_hash: self.additional_settings.bot_hash.clone(),
        }
    }

    /// Starting configuration offered when an admin sets up a new bot
    pub fn default_profile() -> BotProfile {
        BotProfile {
            name: "Freddy".to_string(),
            header: Some("Hi there! How can I help you today?".to_string()),
            theme_colour: Some("#039a7b".to_string()),
            widget_size: Some(WIDGET_SIZES[0].to_string()),
            avatar: AvatarProfile {
                is_default: Some(true),
                avatar_id: Some(DEFAULT_AVATAR_ID),
                avatar_url: None,
            },
            bot_hash: None,
        }
    }
}

/// Validated body of a create request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateBotParams {
    pub name: String,
    pub portal_id: i64,
    pub header: Option<String>,
    pub theme_colour: Option<String>,
    pub widget_size: Option<String>,
    pub avatar: Option<AvatarParam>,
}

/// Validated body of an update request; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateBotParams {
    pub name: Option<String>,
    pub header: Option<String>,
    pub theme_colour: Option<String>,
    pub widget_size: Option<String>,
    pub avatar: Option<AvatarParam>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvatarProfile {
    pub is_default: Option<bool>,
    pub avatar_id: Option<i64>,
    pub avatar_url: Option<String>,
}

/// Name, widget template and avatar settings of a bot
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotProfile {
    pub name: String,
    pub header: Option<String>,
    pub theme_colour: Option<String>,
    pub widget_size: Option<String>,
    pub avatar: AvatarProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bot_hash: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotListResponse {
    pub onboarded: bool,
    pub products: Vec<super::ProductSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewBotResponse {
    pub product: ProductInfo,
    #[serde(flatten)]
    pub profile: BotProfile,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CreatedBotResponse {
    pub id: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BotDetailResponse {
    pub product: ProductInfo,
    pub id: i64,
    pub external_id: String,
    pub enable_on_portal: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(flatten)]
    pub profile: BotProfile,
}
