use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::errors::ApiError;
use super::identity::{Identity, Role};
use crate::app::AppContext;
use crate::domain::cart::Address;
use crate::domain::order::{CheckoutRequest, Decision, OrderStatus, PaymentMethod, RequestKind, ReturnRequest};

#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutBody {
    #[serde(default)]
    pub cart_id: Option<Uuid>,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub delivery_address: Option<Address>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    pub status: OrderStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RespondBody {
    pub accept: bool,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct CancelBody {
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct DecisionBody {
    pub kind: RequestKind,
    pub decision: Decision,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusFilter {
    #[serde(default)]
    pub status: Option<OrderStatus>,
}

pub(crate) async fn create(
    ctx: web::Data<AppContext>,
    identity: Identity,
    body: web::Json<CheckoutBody>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();
    let order = ctx
        .orders
        .create(CheckoutRequest {
            user_id: identity.customer_id()?,
            cart_id: body.cart_id,
            payment_method: body.payment_method,
            note: body.note,
            delivery_address: body.delivery_address,
        })
        .await?;
    Ok(HttpResponse::Created().json(order))
}

/// Customers get their own orders, partners the orders placed with them,
/// admins everything.
pub(crate) async fn list(ctx: web::Data<AppContext>, identity: Identity) -> Result<HttpResponse, ApiError> {
    let orders = match identity.role {
        Role::Customer => ctx.orders.list_for_user(identity.user_id).await?,
        Role::Partner => ctx.orders.list_for_partner(identity.user_id).await?,
        Role::Admin => ctx.orders.list_all().await?,
    };
    Ok(HttpResponse::Ok().json(orders))
}

pub(crate) async fn get(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = ctx.orders.get(path.into_inner(), identity.actor()).await?;
    Ok(HttpResponse::Ok().json(order))
}

pub(crate) async fn update_status(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<StatusBody>,
) -> Result<HttpResponse, ApiError> {
    let order = ctx
        .orders
        .update_status(path.into_inner(), body.status, identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub(crate) async fn respond(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<RespondBody>,
) -> Result<HttpResponse, ApiError> {
    let order = ctx
        .orders
        .partner_respond(path.into_inner(), identity.partner_id()?, body.accept)
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub(crate) async fn cancel(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: Option<web::Json<CancelBody>>,
) -> Result<HttpResponse, ApiError> {
    let reason = body.map(|b| b.into_inner()).unwrap_or_default().reason;
    let order = ctx
        .orders
        .cancel(path.into_inner(), reason, identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub(crate) async fn request_return(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<ReturnRequest>,
) -> Result<HttpResponse, ApiError> {
    let order = ctx
        .orders
        .request_refund_or_exchange(path.into_inner(), identity.customer_id()?, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub(crate) async fn decide(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<DecisionBody>,
) -> Result<HttpResponse, ApiError> {
    let order = ctx
        .orders
        .decide(path.into_inner(), body.kind, body.decision, identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(order))
}

pub(crate) async fn list_for_business(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    filter: web::Query<StatusFilter>,
) -> Result<HttpResponse, ApiError> {
    let orders = ctx
        .orders
        .list_for_business(path.into_inner(), filter.status, identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(orders))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use super::super::test_support::seeded_context;
    use super::super::{configure, USER_ID_HEADER, USER_ROLE_HEADER};
    use super::*;

    #[actix_web::test]
    async fn test_checkout_and_partner_flow() {
        let (ctx, seed) = seeded_context().await;
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;
        let customer = Uuid::new_v4().to_string();
        let partner = seed.partner_id.to_string();

        let req = test::TestRequest::post()
            .uri("/api/cart/lines")
            .insert_header((USER_ID_HEADER, customer.clone()))
            .set_json(json!({
                "item_id": seed.shirt_id,
                "size": "L",
                "color": "white",
                "delivery_address": seed.address_json(),
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert!(res.status().is_success());

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header((USER_ID_HEADER, customer.clone()))
            .set_json(json!({ "payment_method": "card", "note": "gift wrap" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 201);
        let order: Value = test::read_body_json(res).await;
        assert_eq!(order["status"], "pending");
        let order_id = order["id"].as_str().unwrap().to_string();

        // Customers cannot respond on the partner's behalf
        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{order_id}/respond"))
            .insert_header((USER_ID_HEADER, customer.clone()))
            .set_json(json!({ "accept": true }))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), 403);

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{order_id}/respond"))
            .insert_header((USER_ID_HEADER, partner.clone()))
            .insert_header((USER_ROLE_HEADER, "partner"))
            .set_json(json!({ "accept": true }))
            .to_request();
        let order: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(order["status"], "accepted");

        let req = test::TestRequest::get()
            .uri(&format!("/api/businesses/{}/orders?status=accepted", seed.shop_id))
            .insert_header((USER_ID_HEADER, partner))
            .insert_header((USER_ROLE_HEADER, "partner"))
            .to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(orders.as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri("/api/orders")
            .insert_header((USER_ID_HEADER, customer))
            .to_request();
        let orders: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(orders[0]["id"], order_id.as_str());
    }

    #[actix_web::test]
    async fn test_checkout_with_empty_cart() {
        let (ctx, _) = seeded_context().await;
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/orders")
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .set_json(json!({ "payment_method": "cash_on_delivery" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 422);
        let body: Value = test::read_body_json(res).await;
        assert_eq!(body["code"], "CART_EMPTY");
    }

    #[actix_web::test]
    async fn test_unknown_order_is_404() {
        let (ctx, _) = seeded_context().await;
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri(&format!("/api/orders/{}/cancel", Uuid::new_v4()))
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .insert_header((USER_ROLE_HEADER, "admin"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 404);
    }
}
