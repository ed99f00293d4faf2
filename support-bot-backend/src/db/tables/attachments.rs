//! Attachment database operations

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension, Row};

use crate::models::{AttachableType, Attachment};
use super::super::sqlite::parse_timestamp;
use super::super::{Database, DbResult};

const ATTACHMENT_COLUMNS: &str =
    "id, account_id, attachable_type, attachable_id, content_file_name, content_url, created_at";

fn attachment_from_row(row: &Row) -> rusqlite::Result<Attachment> {
    let created_at_str: String = row.get(6)?;
    Ok(Attachment {
        id: row.get(0)?,
        account_id: row.get(1)?,
        attachable_type: row.get(2)?,
        attachable_id: row.get(3)?,
        content_file_name: row.get(4)?,
        content_url: row.get(5)?,
        created_at: parse_timestamp(6, &created_at_str)?,
    })
}

/// Logo currently owned by a portal or bot
pub(crate) fn logo_for(
    conn: &Connection,
    owner: AttachableType,
    owner_id: i64,
) -> rusqlite::Result<Option<Attachment>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM attachments WHERE attachable_type = ?1 AND attachable_id = ?2 ORDER BY id DESC LIMIT 1",
            ATTACHMENT_COLUMNS
        ),
        rusqlite::params![owner.as_str(), owner_id],
        attachment_from_row,
    )
    .optional()
}

/// Delete every attachment owned by `owner`, keeping `keep_id` if given
pub(crate) fn delete_logos(
    conn: &Connection,
    owner: AttachableType,
    owner_id: i64,
    keep_id: Option<i64>,
) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM attachments WHERE attachable_type = ?1 AND attachable_id = ?2 AND (?3 IS NULL OR id != ?3)",
        rusqlite::params![owner.as_str(), owner_id, keep_id],
    )
}

pub(crate) fn assign_owner(
    conn: &Connection,
    attachment_id: i64,
    owner: AttachableType,
    owner_id: i64,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE attachments SET attachable_type = ?1, attachable_id = ?2 WHERE id = ?3",
        rusqlite::params![owner.as_str(), owner_id, attachment_id],
    )
}

impl Database {
    /// Store an uploaded file that is not attached to anything yet
    pub fn create_attachment(
        &self,
        account_id: i64,
        content_file_name: &str,
        content_url: &str,
    ) -> DbResult<Attachment> {
        let conn = self.conn()?;
        let created_at = Utc::now();

        conn.execute(
            "INSERT INTO attachments (account_id, content_file_name, content_url, created_at) VALUES (?1, ?2, ?3, ?4)",
            rusqlite::params![account_id, content_file_name, content_url, created_at.to_rfc3339()],
        )?;

        Ok(Attachment {
            id: conn.last_insert_rowid(),
            account_id,
            attachable_type: None,
            attachable_id: None,
            content_file_name: content_file_name.to_string(),
            content_url: content_url.to_string(),
            created_at,
        })
    }

    /// Look up an attachment, scoped to the account
    pub fn get_attachment(&self, account_id: i64, attachment_id: i64) -> DbResult<Option<Attachment>> {
        let conn = self.conn()?;

        let attachment = conn
            .query_row(
                &format!(
                    "SELECT {} FROM attachments WHERE id = ?1 AND account_id = ?2",
                    ATTACHMENT_COLUMNS
                ),
                [attachment_id, account_id],
                attachment_from_row,
            )
            .optional()?;

        Ok(attachment)
    }

    pub fn get_logo(&self, owner: AttachableType, owner_id: i64) -> DbResult<Option<Attachment>> {
        let conn = self.conn()?;
        Ok(logo_for(&conn, owner, owner_id)?)
    }

    /// Make `attachment_id` the portal's only logo
    pub fn set_portal_logo(&self, portal_id: i64, attachment_id: i64) -> DbResult<()> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        delete_logos(&tx, AttachableType::Portal, portal_id, Some(attachment_id))?;
        assign_owner(&tx, attachment_id, AttachableType::Portal, portal_id)?;
        tx.commit()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::db::Database;
    use crate::models::AttachableType;

    #[test]
    fn test_attachment_lookup_is_account_scoped() {
        let db = Database::new(":memory:").unwrap();
        let acme = db.create_account("Acme", &[]).unwrap();
        let other = db.create_account("Other", &[]).unwrap();
        let file = db.create_attachment(acme.id, "a.png", "https://cdn.test/a.png").unwrap();

        assert!(db.get_attachment(acme.id, file.id).unwrap().is_some());
        assert!(db.get_attachment(other.id, file.id).unwrap().is_none());
    }

    #[test]
    fn test_set_portal_logo_replaces_previous() {
        let db = Database::new(":memory:").unwrap();
        let acme = db.create_account("Acme", &[]).unwrap();
        let portal = db.create_portal(acme.id, "Help", true, None).unwrap();
        let first = db.create_attachment(acme.id, "a.png", "https://cdn.test/a.png").unwrap();
        let second = db.create_attachment(acme.id, "b.png", "https://cdn.test/b.png").unwrap();

        db.set_portal_logo(portal.id, first.id).unwrap();
        db.set_portal_logo(portal.id, second.id).unwrap();

        let logo = db.get_logo(AttachableType::Portal, portal.id).unwrap().unwrap();
        assert_eq!(logo.id, second.id);
        assert_eq!(logo.attachable_type_enum(), Some(AttachableType::Portal));
        assert!(db.get_attachment(acme.id, first.id).unwrap().is_none());
    }
}
