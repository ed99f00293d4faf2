pub mod bots;
pub mod health;

use actix_web::{web, HttpRequest};

use crate::bot_admin::BotAdminError;
use crate::models::{RequestContext, SUPPORT_BOT_FEATURE};
use crate::AppState;

/// Resolve the bearer session of a request into the acting admin's context.
///
/// The user has to be an administrator of the session's account, and the
/// account needs the support bot feature.
pub fn authorize(
    state: &web::Data<AppState>,
    req: &HttpRequest,
) -> Result<RequestContext, BotAdminError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or(BotAdminError::Unauthorized)?;

    let session = match state.db.validate_auth_session(token) {
        Ok(Some(session)) => session,
        Ok(None) => return Err(BotAdminError::Unauthorized),
        Err(e) => {
            log::error!("Session validation error: {}", e);
            return Err(e.into());
        }
    };

    let user = state
        .db
        .get_user(session.account_id, session.user_id)?
        .ok_or(BotAdminError::Unauthorized)?;
    if !user.admin {
        log::warn!(
            "[AUTH] User {} of account {} is not an administrator",
            user.id,
            user.account_id
        );
        return Err(BotAdminError::AccessDenied);
    }

    let account = state
        .db
        .get_account(session.account_id)?
        .ok_or(BotAdminError::Unauthorized)?;
    if !account.has_feature(SUPPORT_BOT_FEATURE) {
        return Err(BotAdminError::FeatureDisabled(SUPPORT_BOT_FEATURE));
    }

    Ok(RequestContext::from(&session))
}
