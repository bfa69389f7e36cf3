use actix_web::{web, HttpResponse};

use super::errors::ApiError;
use super::identity::{Identity, Role};
use crate::app::AppContext;

/// Run an escalation sweep now instead of waiting for the next tick.
pub(crate) async fn sweep(ctx: web::Data<AppContext>, identity: Identity) -> Result<HttpResponse, ApiError> {
    if identity.role != Role::Admin {
        return Err(ApiError::forbidden("admins only"));
    }
    tracing::info!(admin_id = %identity.user_id, "Manual escalation sweep requested");
    let outcome = ctx.scheduler.sweep().await;
    Ok(HttpResponse::Ok().json(outcome))
}
