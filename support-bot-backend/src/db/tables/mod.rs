//! Database model modules - extends Database with domain-specific methods
//!
//! Each module adds `impl Database` blocks with methods for a specific table group.

pub mod accounts;    // accounts, users
pub mod attachments; // attachments (portal and bot logos, uploaded avatars)
pub mod auth;        // auth_sessions
pub mod bots;        // bots
pub mod portals;     // portals, products
