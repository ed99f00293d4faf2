//! Admin backend for support bots.
//!
//! Account administrators set up one chat bot per portal; the bots
//! themselves are hosted by Freshbots, which this backend keeps in sync.

pub mod bot_admin;
pub mod config;
pub mod controllers;
pub mod db;
pub mod freshbots;
pub mod models;

use std::sync::Arc;

use bot_admin::BotAdminService;
use db::Database;

pub struct AppState {
    pub db: Arc<Database>,
    pub bot_admin: Arc<BotAdminService>,
}
