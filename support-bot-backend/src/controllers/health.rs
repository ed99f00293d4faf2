use actix_web::{web, HttpResponse};

use crate::AppState;

/// Version from Cargo.toml, available at compile time
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/api/health").route(web::get().to(health_check)));
}

/// Liveness plus a store round trip; 503 while the database is unreachable
async fn health_check(state: web::Data<AppState>) -> HttpResponse {
    match state.db.ping() {
        Ok(()) => HttpResponse::Ok().json(serde_json::json!({
            "status": "ok",
            "version": VERSION,
            "database": "ok"
        })),
        Err(e) => {
            log::error!("[HEALTH] Database check failed: {}", e);
            HttpResponse::ServiceUnavailable().json(serde_json::json!({
                "status": "degraded",
                "version": VERSION,
                "database": "unavailable"
            }))
        }
    }
}
