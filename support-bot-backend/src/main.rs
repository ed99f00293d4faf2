use actix_cors::Cors;
use actix_web::{middleware::Logger, web, App, HttpServer};
use dotenv::dotenv;
use std::sync::Arc;

use support_bot_backend::bot_admin::BotAdminService;
use support_bot_backend::config::Config;
use support_bot_backend::controllers;
use support_bot_backend::db::Database;
use support_bot_backend::freshbots::FreshbotsClient;
use support_bot_backend::AppState;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenv().ok();
    env_logger::init();

    let config = Config::from_env();
    let port = config.port;

    log::info!("Initializing database at {}", config.database_url);
    let db = Arc::new(Database::new(&config.database_url).map_err(std::io::Error::other)?);

    log::info!("Freshbots API at {}", config.freshbots.base_url);
    let provisioning = FreshbotsClient::new(&config.freshbots).map_err(std::io::Error::other)?;
    let bot_admin = Arc::new(BotAdminService::new(Arc::clone(&db), Arc::new(provisioning)));

    log::info!("Starting support bot admin server on port {}", port);

    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header()
            .max_age(3600);

        App::new()
            .app_data(web::Data::new(AppState {
                db: Arc::clone(&db),
                bot_admin: Arc::clone(&bot_admin),
            }))
            .wrap(Logger::default())
            .wrap(cors)
            .configure(controllers::health::config)
            .configure(controllers::bots::config)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await
}
