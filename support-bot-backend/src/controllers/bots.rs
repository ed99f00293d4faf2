use actix_web::{web, HttpRequest, HttpResponse};
use serde_json::Value;
use std::collections::HashMap;

use super::authorize;
use crate::bot_admin::validation::{
    validate_create_body, validate_new_query, validate_query_params, validate_update_body,
};
use crate::bot_admin::BotAdminError;
use crate::models::FieldError;
use crate::AppState;

type Query = web::Query<HashMap<String, String>>;

/// Configure bot admin routes
pub fn config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/admin/bots")
            .route("", web::get().to(index))
            .route("", web::post().to(create))
            .route("/new", web::get().to(new_bot))
            .route("/{id}", web::get().to(show))
            .route("/{id}", web::put().to(update)),
    );
}

/// Request body as JSON; an empty body counts as `{}`
fn json_body(body: &web::Bytes) -> Result<Value, BotAdminError> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Object(Default::default()));
    }
    serde_json::from_slice(body).map_err(|e| {
        log::debug!("[BOTS] Unparseable request body: {}", e);
        BotAdminError::Validation(vec![FieldError::datatype_mismatch("request", "JSON object")])
    })
}

async fn index(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: Query,
) -> Result<HttpResponse, BotAdminError> {
    let ctx = authorize(&state, &req)?;
    validate_query_params(&query, &[])?;

    let list = state.bot_admin.list(&ctx)?;
    Ok(HttpResponse::Ok().json(list))
}

async fn new_bot(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: Query,
) -> Result<HttpResponse, BotAdminError> {
    let ctx = authorize(&state, &req)?;
    let portal_id = validate_new_query(&query)?;

    let prepared = state.bot_admin.prepare_new(&ctx, portal_id)?;
    Ok(HttpResponse::Ok().json(prepared))
}

async fn create(
    state: web::Data<AppState>,
    req: HttpRequest,
    query: Query,
    body: web::Bytes,
) -> Result<HttpResponse, BotAdminError> {
    let ctx = authorize(&state, &req)?;
    validate_query_params(&query, &[])?;
    let params = validate_create_body(&json_body(&body)?)?;

    log::info!(
        "[BOTS] Create requested for portal {} by user {}",
        params.portal_id,
        ctx.user_id
    );
    let created = state.bot_admin.create(&ctx, params).await?;
    Ok(HttpResponse::Created().json(created))
}

async fn show(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: Query,
) -> Result<HttpResponse, BotAdminError> {
    let ctx = authorize(&state, &req)?;
    validate_query_params(&query, &[])?;

    let bot = state.bot_admin.show(&ctx, path.into_inner())?;
    Ok(HttpResponse::Ok().json(bot))
}

async fn update(
    state: web::Data<AppState>,
    req: HttpRequest,
    path: web::Path<i64>,
    query: Query,
    body: web::Bytes,
) -> Result<HttpResponse, BotAdminError> {
    let ctx = authorize(&state, &req)?;
    validate_query_params(&query, &[])?;
    let params = validate_update_body(&json_body(&body)?)?;
    let bot_id = path.into_inner();

    log::info!("[BOTS] Update requested for bot {} by user {}", bot_id, ctx.user_id);
    state.bot_admin.update(&ctx, bot_id, params).await?;
    Ok(HttpResponse::NoContent().finish())
}
