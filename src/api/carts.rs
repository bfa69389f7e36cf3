use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::errors::ApiError;
use super::identity::CartCaller;
use crate::app::AppContext;
use crate::domain::cart::AddLineRequest;

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateLineBody {
    pub quantity: i64,
}

pub(crate) async fn get(ctx: web::Data<AppContext>, caller: CartCaller) -> Result<HttpResponse, ApiError> {
    let cart = ctx.carts.get(&caller.0).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub(crate) async fn clear(ctx: web::Data<AppContext>, caller: CartCaller) -> Result<HttpResponse, ApiError> {
    let cart = ctx.carts.clear(&caller.0).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub(crate) async fn add_line(
    ctx: web::Data<AppContext>,
    caller: CartCaller,
    body: web::Json<AddLineRequest>,
) -> Result<HttpResponse, ApiError> {
    let cart = ctx.carts.add_line(&caller.0, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub(crate) async fn update_line(
    ctx: web::Data<AppContext>,
    caller: CartCaller,
    path: web::Path<Uuid>,
    body: web::Json<UpdateLineBody>,
) -> Result<HttpResponse, ApiError> {
    let cart = ctx
        .carts
        .update_line(&caller.0, path.into_inner(), body.quantity)
        .await?;
    Ok(HttpResponse::Ok().json(cart))
}

pub(crate) async fn remove_line(
    ctx: web::Data<AppContext>,
    caller: CartCaller,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let cart = ctx.carts.remove_line(&caller.0, path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(cart))
}
