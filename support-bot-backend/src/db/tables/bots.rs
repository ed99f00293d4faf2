//! Bot database operations

use chrono::Utc;
use rusqlite::{ErrorCode, OptionalExtension, Row};

use crate::models::{AttachableType, Attachment, Bot, FieldError};
use super::attachments::{assign_owner, delete_logos};
use super::super::sqlite::{parse_json, parse_timestamp};
use super::super::{Database, DbError, DbResult};

const BOT_COLUMNS: &str = "id, account_id, portal_id, product_id, external_id, name, template_data, additional_settings, enable_in_portal, training_status, last_updated_by, created_at, updated_at";

/// What to do with the bot's logo while saving it
#[derive(Debug, Clone, PartialEq)]
pub enum LogoChange {
    Keep,
    /// Drop the current logo and attach this one (`None` leaves the bot without a logo)
    Replace(Option<Attachment>),
}

#[derive(Debug, thiserror::Error)]
pub enum SaveBotError {
    #[error("bot record is invalid")]
    Invalid(Vec<FieldError>),
    #[error(transparent)]
    Db(#[from] DbError),
}

impl From<rusqlite::Error> for SaveBotError {
    fn from(err: rusqlite::Error) -> Self {
        SaveBotError::Db(err.into())
    }
}

fn bot_from_row(row: &Row) -> rusqlite::Result<Bot> {
    let template_data_json: String = row.get(6)?;
    let additional_settings_json: String = row.get(7)?;
    let enable_in_portal: i64 = row.get(8)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    Ok(Bot {
        id: row.get(0)?,
        account_id: row.get(1)?,
        portal_id: row.get(2)?,
        product_id: row.get(3)?,
        external_id: row.get(4)?,
        name: row.get(5)?,
        template_data: parse_json(6, &template_data_json)?,
        additional_settings: parse_json(7, &additional_settings_json)?,
        enable_in_portal: enable_in_portal != 0,
        training_status: row.get(9)?,
        last_updated_by: row.get(10)?,
        created_at: parse_timestamp(11, &created_at_str)?,
        updated_at: parse_timestamp(12, &updated_at_str)?,
    })
}

/// Map a unique index violation to the field it guards
fn unique_violation(err: &rusqlite::Error) -> Option<FieldError> {
    let rusqlite::Error::SqliteFailure(failure, Some(message)) = err else {
        return None;
    };
    if failure.code != ErrorCode::ConstraintViolation || !message.contains("UNIQUE") {
        return None;
    }
    if message.contains("bots.portal_id") {
        Some(FieldError::invalid_value("portal_id", "has already been taken"))
    } else if message.contains("bots.external_id") {
        Some(FieldError::invalid_value("external_id", "has already been taken"))
    } else {
        None
    }
}

impl Database {
    /// Whether the account has set up at least one bot
    pub fn account_has_bots(&self, account_id: i64) -> DbResult<bool> {
        let conn = self.conn()?;
        let exists: i64 = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM bots WHERE account_id = ?1)",
            [account_id],
            |row| row.get(0),
        )?;
        Ok(exists != 0)
    }

    /// Get a bot, scoped to the account
    pub fn get_bot(&self, account_id: i64, bot_id: i64) -> DbResult<Option<Bot>> {
        let conn = self.conn()?;

        let bot = conn
            .query_row(
                &format!("SELECT {} FROM bots WHERE id = ?1 AND account_id = ?2", BOT_COLUMNS),
                [bot_id, account_id],
                bot_from_row,
            )
            .optional()?;

        Ok(bot)
    }

    pub fn get_bot_for_portal(&self, account_id: i64, portal_id: i64) -> DbResult<Option<Bot>> {
        let conn = self.conn()?;

        let bot = conn
            .query_row(
                &format!("SELECT {} FROM bots WHERE portal_id = ?1 AND account_id = ?2", BOT_COLUMNS),
                [portal_id, account_id],
                bot_from_row,
            )
            .optional()?;

        Ok(bot)
    }

    /// Validate and persist a bot together with its logo change.
    ///
    /// Inserts when `bot.id` is 0 (and sets the assigned id), updates otherwise.
    /// Record and logo are written in one transaction.
    pub fn save_bot(&self, bot: &mut Bot, logo: LogoChange) -> Result<(), SaveBotError> {
        bot.validate().map_err(SaveBotError::Invalid)?;

        let template_data = serde_json::to_string(&bot.template_data).map_err(DbError::from)?;
        let additional_settings =
            serde_json::to_string(&bot.additional_settings).map_err(DbError::from)?;
        let now = Utc::now();

        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let written = if bot.is_persisted() {
            tx.execute(
                "UPDATE bots SET name = ?1, template_data = ?2, additional_settings = ?3, last_updated_by = ?4, updated_at = ?5 WHERE id = ?6 AND account_id = ?7",
                rusqlite::params![
                    &bot.name,
                    template_data,
                    additional_settings,
                    bot.last_updated_by,
                    now.to_rfc3339(),
                    bot.id,
                    bot.account_id
                ],
            )
        } else {
            tx.execute(
                "INSERT INTO bots (account_id, portal_id, product_id, external_id, name, template_data, additional_settings, enable_in_portal, training_status, last_updated_by, created_at, updated_at) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?11)",
                rusqlite::params![
                    bot.account_id,
                    bot.portal_id,
                    bot.product_id,
                    &bot.external_id,
                    &bot.name,
                    template_data,
                    additional_settings,
                    if bot.enable_in_portal { 1 } else { 0 },
                    bot.training_status.as_deref(),
                    bot.last_updated_by,
                    now.to_rfc3339()
                ],
            )
        };

        if let Err(err) = written {
            return Err(match unique_violation(&err) {
                Some(field_error) => SaveBotError::Invalid(vec![field_error]),
                None => err.into(),
            });
        }

        let bot_id = if bot.is_persisted() { bot.id } else { tx.last_insert_rowid() };

        if let LogoChange::Replace(new_logo) = logo {
            let keep_id = new_logo.as_ref().map(|l| l.id);
            delete_logos(&tx, AttachableType::Bot, bot_id, keep_id)?;
            if let Some(new_logo) = new_logo {
                assign_owner(&tx, new_logo.id, AttachableType::Bot, bot_id)?;
            }
        }

        tx.commit()?;

        if !bot.is_persisted() {
            bot.id = bot_id;
            bot.created_at = now;
        }
        bot.updated_at = now;
        Ok(())
    }

    /// Record the training state reported for a bot
    pub fn set_training_status(
        &self,
        account_id: i64,
        bot_id: i64,
        training_status: Option<&str>,
    ) -> DbResult<bool> {
        let conn = self.conn()?;
        let rows = conn.execute(
            "UPDATE bots SET training_status = ?1, updated_at = ?2 WHERE id = ?3 AND account_id = ?4",
            rusqlite::params![training_status, Utc::now().to_rfc3339(), bot_id, account_id],
        )?;
        Ok(rows > 0)
    }
}
