pub mod account;
pub mod attachment;
pub mod bot;
pub mod field_error;
pub mod portal;

pub use account::{Account, AuthSession, RequestContext, User, SUPPORT_BOT_FEATURE};
pub use attachment::{Attachment, AttachableType};
pub use bot::{
    AdditionalSettings, AvatarInput, AvatarParam, AvatarProfile, Bot, BotDetailResponse,
    BotListResponse, BotProfile, CreateBotParams, CreatedBotResponse, NewBotResponse,
    TemplateData, UpdateBotParams, MAX_NAME_LENGTH, WIDGET_SIZES,
};
pub use field_error::FieldError;
pub use portal::{Portal, Product, ProductInfo, ProductSummary};
