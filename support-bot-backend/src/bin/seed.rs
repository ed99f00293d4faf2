//! Development seed
//!
//! Creates an account with the support bot feature, an admin user, its main
//! portal and one product portal, then prints a bearer token for the admin.
//!
//! Usage:
//!   DATABASE_URL="./.db/support_bot.db" SEED_ACCOUNT="Acme" cargo run --bin seed
//!
//! Environment variables:
//!   DATABASE_URL  - SQLite database path (default: ./.db/support_bot.db)
//!   SEED_ACCOUNT  - Account name (default: Demo)
//!   SEED_PRODUCT  - Product to add a portal for (default: none)

use dotenv::dotenv;
use std::env;

use support_bot_backend::config::Config;
use support_bot_backend::db::{Database, DbResult};
use support_bot_backend::models::SUPPORT_BOT_FEATURE;

fn seed(db: &Database, account_name: &str, product_name: Option<&str>) -> DbResult<String> {
    let account = db.create_account(account_name, &[SUPPORT_BOT_FEATURE])?;
    let email = format!("admin@{}.test", account_name.to_lowercase().replace(' ', "-"));
    let admin = db.create_user(account.id, "Admin", &email, true)?;
    let main_portal = db.create_portal(account.id, &format!("{} Support", account_name), true, None)?;
    log::info!("Seeded account {} with main portal {}", account.id, main_portal.id);

    if let Some(product_name) = product_name {
        let product = db.create_product(account.id, product_name)?;
        let portal = db.create_portal(account.id, &format!("{} Help", product_name), false, Some(product.id))?;
        log::info!("Seeded product {} with portal {}", product.id, portal.id);
    }

    Ok(db.create_auth_session(account.id, admin.id)?.token)
}

fn main() {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let account_name = env::var("SEED_ACCOUNT").unwrap_or_else(|_| "Demo".to_string());
    let product_name = env::var("SEED_PRODUCT").ok().filter(|p| !p.is_empty());

    let result = Database::new(&config.database_url)
        .and_then(|db| seed(&db, &account_name, product_name.as_deref()));

    match result {
        Ok(token) => println!("{}", token),
        Err(e) => {
            eprintln!("Seeding failed: {}", e);
            std::process::exit(1);
        }
    }
}
