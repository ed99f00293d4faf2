//! Portal and product database operations

use chrono::Utc;
use rusqlite::{OptionalExtension, Row};

use crate::models::{Portal, Product, ProductSummary};
use super::super::{Database, DbResult};

const PORTAL_COLUMNS: &str = "id, account_id, name, main_portal, product_id";

fn portal_from_row(row: &Row) -> rusqlite::Result<Portal> {
    let main_portal: i64 = row.get(3)?;
    Ok(Portal {
        id: row.get(0)?,
        account_id: row.get(1)?,
        name: row.get(2)?,
        main_portal: main_portal != 0,
        product_id: row.get(4)?,
    })
}

impl Database {
    pub fn create_product(&self, account_id: i64, name: &str) -> DbResult<Product> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO products (account_id, name, created_at) VALUES (?1, ?2, ?3)",
            rusqlite::params![account_id, name, Utc::now().to_rfc3339()],
        )?;

        Ok(Product {
            id: conn.last_insert_rowid(),
            account_id,
            name: name.to_string(),
        })
    }

    pub fn get_product(&self, account_id: i64, product_id: i64) -> DbResult<Option<Product>> {
        let conn = self.conn()?;

        let product = conn
            .query_row(
                "SELECT id, account_id, name FROM products WHERE id = ?1 AND account_id = ?2",
                [product_id, account_id],
                |row| {
                    Ok(Product {
                        id: row.get(0)?,
                        account_id: row.get(1)?,
                        name: row.get(2)?,
                    })
                },
            )
            .optional()?;

        Ok(product)
    }

    pub fn create_portal(
        &self,
        account_id: i64,
        name: &str,
        main_portal: bool,
        product_id: Option<i64>,
    ) -> DbResult<Portal> {
        let conn = self.conn()?;

        conn.execute(
            "INSERT INTO portals (account_id, name, main_portal, product_id, created_at) VALUES (?1, ?2, ?3, ?4, ?5)",
            rusqlite::params![
                account_id,
                name,
                if main_portal { 1 } else { 0 },
                product_id,
                Utc::now().to_rfc3339()
            ],
        )?;

        Ok(Portal {
            id: conn.last_insert_rowid(),
            account_id,
            name: name.to_string(),
            main_portal,
            product_id,
        })
    }

    /// Get a portal, scoped to the account
    pub fn get_portal(&self, account_id: i64, portal_id: i64) -> DbResult<Option<Portal>> {
        let conn = self.conn()?;

        let portal = conn
            .query_row(
                &format!("SELECT {} FROM portals WHERE id = ?1 AND account_id = ?2", PORTAL_COLUMNS),
                [portal_id, account_id],
                portal_from_row,
            )
            .optional()?;

        Ok(portal)
    }

    pub fn get_main_portal(&self, account_id: i64) -> DbResult<Option<Portal>> {
        let conn = self.conn()?;

        let portal = conn
            .query_row(
                &format!(
                    "SELECT {} FROM portals WHERE account_id = ?1 AND main_portal = 1 ORDER BY id LIMIT 1",
                    PORTAL_COLUMNS
                ),
                [account_id],
                portal_from_row,
            )
            .optional()?;

        Ok(portal)
    }

    /// Bot listing projection for every product of the account, in product order.
    ///
    /// Portal, logo and bot are loaded in the same query.
    pub fn list_product_bot_info(&self, account_id: i64) -> DbResult<Vec<ProductSummary>> {
        let conn = self.conn()?;

        let mut stmt = conn.prepare(
            "SELECT p.name, po.id, bo.id, bo.name,
                    (SELECT a.content_url FROM attachments a
                      WHERE a.attachable_type = 'Portal' AND a.attachable_id = po.id
                      ORDER BY a.id DESC LIMIT 1)
             FROM products p
             LEFT JOIN portals po ON po.product_id = p.id AND po.account_id = p.account_id
             LEFT JOIN bots bo ON bo.portal_id = po.id
             WHERE p.account_id = ?1
             GROUP BY p.id
             ORDER BY p.id",
        )?;

        let summaries = stmt
            .query_map([account_id], |row| {
                let portal_id: Option<i64> = row.get(1)?;
                Ok(ProductSummary {
                    name: row.get(0)?,
                    portal_enabled: portal_id.is_some(),
                    portal_id,
                    portal_logo: row.get(4)?,
                    bot_name: row.get(3)?,
                    bot_id: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(summaries)
    }
}
