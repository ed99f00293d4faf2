//! Request validation for the bot admin endpoints.
//!
//! Query strings and JSON bodies are checked field by field so every problem
//! is reported at once; delegation checks then resolve the records the
//! request points at.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};
use std::collections::HashMap;

use super::BotAdminError;
use crate::db::Database;
use crate::models::{
    AvatarInput, AvatarParam, CreateBotParams, FieldError, Portal, RequestContext,
    UpdateBotParams, MAX_NAME_LENGTH, WIDGET_SIZES,
};

/// `#RRGGBB` colour codes
static THEME_COLOUR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^#[0-9A-Fa-f]{6}$").unwrap()
});

const CREATE_FIELDS: [&str; 6] = ["name", "portal_id", "header", "theme_colour", "widget_size", "avatar"];
const UPDATE_FIELDS: [&str; 5] = ["name", "header", "theme_colour", "widget_size", "avatar"];
const AVATAR_FIELDS: [&str; 2] = ["is_default", "avatar_id"];

/// What the delegated portal is about to be used for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delegation {
    /// Preparing the new-bot form
    Prepare,
    /// Creating a bot; the portal must not have one yet
    Create,
    /// Updating the given bot; the portal must still exist and belong to it
    Update { bot_id: i64 },
}

fn fail_if_any(errors: Vec<FieldError>) -> Result<(), BotAdminError> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(BotAdminError::Validation(errors))
    }
}

/// Reject query parameters outside `allowed`
pub fn validate_query_params(
    query: &HashMap<String, String>,
    allowed: &[&str],
) -> Result<(), BotAdminError> {
    let mut unknown: Vec<&String> = query
        .keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .collect();
    unknown.sort();
    fail_if_any(unknown.into_iter().map(|key| FieldError::unknown_field(key)).collect())
}

/// Query of the new-bot form: `portal_id` only
pub fn validate_new_query(query: &HashMap<String, String>) -> Result<i64, BotAdminError> {
    validate_query_params(query, &["portal_id"])?;
    match query.get("portal_id") {
        None => Err(BotAdminError::Validation(vec![FieldError::missing("portal_id")])),
        Some(raw) => match raw.trim().parse::<i64>() {
            Ok(id) if id > 0 => Ok(id),
            _ => Err(BotAdminError::Validation(vec![FieldError::datatype_mismatch(
                "portal_id",
                "Positive Integer",
            )])),
        },
    }
}

pub fn validate_create_body(body: &Value) -> Result<CreateBotParams, BotAdminError> {
    let map = body_object(body)?;
    let mut errors = unknown_fields(map, &CREATE_FIELDS, "");

    let name = match map.get("name") {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing("name"));
            None
        }
        Some(_) => name_field(map, &mut errors),
    };
    let portal_id = match map.get("portal_id") {
        None | Some(Value::Null) => {
            errors.push(FieldError::missing("portal_id"));
            None
        }
        Some(value) => positive_integer(value, "portal_id", &mut errors),
    };
    let header = string_field(map, "header", &mut errors);
    let theme_colour = theme_colour_field(map, &mut errors);
    let widget_size = widget_size_field(map, &mut errors);
    let avatar = avatar_field(map, &mut errors);

    fail_if_any(errors)?;
    match (name, portal_id) {
        (Some(name), Some(portal_id)) => Ok(CreateBotParams {
            name,
            portal_id,
            header,
            theme_colour,
            widget_size,
            avatar,
        }),
        // Both are reported above whenever they are missing
        _ => Err(BotAdminError::Validation(vec![])),
    }
}

pub fn validate_update_body(body: &Value) -> Result<UpdateBotParams, BotAdminError> {
    let map = body_object(body)?;
    let mut errors = unknown_fields(map, &UPDATE_FIELDS, "");

    let params = UpdateBotParams {
        name: name_field(map, &mut errors),
        header: string_field(map, "header", &mut errors),
        theme_colour: theme_colour_field(map, &mut errors),
        widget_size: widget_size_field(map, &mut errors),
        avatar: avatar_field(map, &mut errors),
    };

    fail_if_any(errors)?;
    Ok(params)
}

/// Resolve the portal a request is delegated to, scoped to the account
pub fn validate_delegator(
    db: &Database,
    ctx: &RequestContext,
    portal_id: i64,
    delegation: Delegation,
) -> Result<Portal, BotAdminError> {
    let portal = db.get_portal(ctx.account_id, portal_id)?.ok_or_else(|| {
        BotAdminError::Validation(vec![FieldError::invalid_value(
            "portal_id",
            "There is no portal matching the given portal_id",
        )])
    })?;

    let existing = match delegation {
        Delegation::Prepare => None,
        Delegation::Create | Delegation::Update { .. } => db.get_bot_for_portal(ctx.account_id, portal.id)?,
    };
    match (delegation, existing) {
        (Delegation::Create, Some(_)) => {
            return Err(BotAdminError::Validation(vec![FieldError::invalid_value(
                "portal_id",
                "The portal already has a bot",
            )]));
        }
        (Delegation::Update { bot_id }, Some(bot)) if bot.id != bot_id => {
            return Err(BotAdminError::Validation(vec![FieldError::invalid_value(
                "portal_id",
                "The portal belongs to another bot",
            )]));
        }
        _ => {}
    }

    Ok(portal)
}

fn body_object(body: &Value) -> Result<&Map<String, Value>, BotAdminError> {
    body.as_object().ok_or_else(|| {
        BotAdminError::Validation(vec![FieldError::datatype_mismatch("request", "JSON object")])
    })
}

fn unknown_fields(map: &Map<String, Value>, allowed: &[&str], prefix: &str) -> Vec<FieldError> {
    map.keys()
        .filter(|key| !allowed.contains(&key.as_str()))
        .map(|key| FieldError::unknown_field(&format!("{}{}", prefix, key)))
        .collect()
}

/// Optional string; null counts as absent
fn string_field(map: &Map<String, Value>, field: &str, errors: &mut Vec<FieldError>) -> Option<String> {
    match map.get(field) {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s.clone()),
        Some(_) => {
            errors.push(FieldError::datatype_mismatch(field, "String"));
            None
        }
    }
}

fn name_field(map: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<String> {
    let name = string_field(map, "name", errors)?;
    if name.trim().is_empty() {
        errors.push(FieldError::invalid_value("name", "can't be blank"));
        return None;
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        errors.push(FieldError::invalid_value(
            "name",
            format!("Has {} characters, it can have maximum of {} characters", name.chars().count(), MAX_NAME_LENGTH),
        ));
        return None;
    }
    Some(name)
}

fn theme_colour_field(map: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<String> {
    let colour = string_field(map, "theme_colour", errors)?;
    if !THEME_COLOUR_PATTERN.is_match(&colour) {
        errors.push(FieldError::invalid_value(
            "theme_colour",
            "It should be a valid hex colour code like #039a7b",
        ));
        return None;
    }
    Some(colour)
}

fn widget_size_field(map: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<String> {
    let size = string_field(map, "widget_size", errors)?;
    if !WIDGET_SIZES.contains(&size.as_str()) {
        errors.push(FieldError::invalid_value(
            "widget_size",
            format!("It should be one of these values: '{}'", WIDGET_SIZES.join(",")),
        ));
        return None;
    }
    Some(size)
}

fn positive_integer(value: &Value, field: &str, errors: &mut Vec<FieldError>) -> Option<i64> {
    match value.as_i64() {
        Some(n) if n > 0 => Some(n),
        _ => {
            errors.push(FieldError::datatype_mismatch(field, "Positive Integer"));
            None
        }
    }
}

fn avatar_field(map: &Map<String, Value>, errors: &mut Vec<FieldError>) -> Option<AvatarParam> {
    let avatar = match map.get("avatar") {
        None | Some(Value::Null) => return None,
        Some(Value::Object(avatar)) => avatar,
        Some(_) => {
            errors.push(FieldError::datatype_mismatch("avatar", "key/value pair"));
            return None;
        }
    };

    let before = errors.len();
    errors.extend(unknown_fields(avatar, &AVATAR_FIELDS, "avatar."));

    let is_default = match avatar.get("is_default") {
        None | Some(Value::Null) => None,
        Some(Value::Bool(b)) => Some(*b),
        Some(_) => {
            errors.push(FieldError::datatype_mismatch("avatar.is_default", "Boolean"));
            None
        }
    };
    let avatar_id = match avatar.get("avatar_id") {
        None | Some(Value::Null) => {
            // A default avatar has to name which one
            if is_default == Some(true) {
                errors.push(FieldError::missing("avatar.avatar_id"));
            }
            None
        }
        Some(value) => positive_integer(value, "avatar.avatar_id", errors),
    };

    if errors.len() > before {
        return None;
    }
    Some(AvatarParam::from(AvatarInput { is_default, avatar_id }))
}
