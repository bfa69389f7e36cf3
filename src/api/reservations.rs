use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

use super::errors::ApiError;
use super::identity::Identity;
use crate::app::AppContext;
use crate::domain::reservation::{ReservationRequest, ReservationStatus};

#[derive(Debug, Deserialize)]
pub(crate) struct StatusBody {
    pub status: ReservationStatus,
}

#[derive(Debug, Deserialize)]
pub(crate) struct StatusFilter {
    #[serde(default)]
    pub status: Option<ReservationStatus>,
}

pub(crate) async fn create(
    ctx: web::Data<AppContext>,
    identity: Identity,
    body: web::Json<ReservationRequest>,
) -> Result<HttpResponse, ApiError> {
    let reservation = ctx
        .reservations
        .create(identity.customer_id()?, body.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(reservation))
}

pub(crate) async fn get(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let reservation = ctx.reservations.get(path.into_inner(), identity.actor()).await?;
    Ok(HttpResponse::Ok().json(reservation))
}

pub(crate) async fn update_status(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    body: web::Json<StatusBody>,
) -> Result<HttpResponse, ApiError> {
    let reservation = ctx
        .reservations
        .update_status(path.into_inner(), body.status, identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(reservation))
}

pub(crate) async fn list_for_business(
    ctx: web::Data<AppContext>,
    identity: Identity,
    path: web::Path<Uuid>,
    filter: web::Query<StatusFilter>,
) -> Result<HttpResponse, ApiError> {
    let reservations = ctx
        .reservations
        .list_for_business(path.into_inner(), filter.status, identity.actor())
        .await?;
    Ok(HttpResponse::Ok().json(reservations))
}

#[cfg(test)]
mod tests {
    use actix_web::{test, App};
    use serde_json::{json, Value};

    use super::super::test_support::seeded_context;
    use super::super::{configure, USER_ID_HEADER, USER_ROLE_HEADER};
    use super::*;

    #[actix_web::test]
    async fn test_booking_lifecycle_over_http() {
        let (ctx, seed) = seeded_context().await;
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;
        let customer = Uuid::new_v4().to_string();
        let partner = seed.partner_id.to_string();
        let body = json!({
            "partner_id": seed.partner_id,
            "business_id": seed.restaurant_id,
            "date_time": "2024-03-08T19:00:00",
            "guests": 2,
            "dinner_type": "dinner",
        });

        let req = test::TestRequest::post()
            .uri("/api/reservations")
            .insert_header((USER_ID_HEADER, customer.clone()))
            .set_json(body.clone())
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 201);
        let created: Value = test::read_body_json(res).await;
        assert_eq!(created["status"], "pending");
        assert!(created["booking_id"].is_null());
        let id = created["id"].as_str().unwrap().to_string();

        let req = test::TestRequest::post()
            .uri("/api/reservations")
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .set_json(body)
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), 409);
        let error: Value = test::read_body_json(res).await;
        assert_eq!(error["code"], "SLOT_TAKEN");

        let req = test::TestRequest::patch()
            .uri(&format!("/api/reservations/{id}/status"))
            .insert_header((USER_ID_HEADER, partner.clone()))
            .insert_header((USER_ROLE_HEADER, "partner"))
            .set_json(json!({ "status": "accepted" }))
            .to_request();
        let accepted: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(accepted["status"], "accepted");
        assert!(accepted["booking_id"].is_string());

        let req = test::TestRequest::get()
            .uri(&format!("/api/businesses/{}/reservations?status=accepted", seed.restaurant_id))
            .insert_header((USER_ID_HEADER, partner))
            .insert_header((USER_ROLE_HEADER, "partner"))
            .to_request();
        let listed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(listed.as_array().unwrap().len(), 1);

        let req = test::TestRequest::get()
            .uri(&format!("/api/reservations/{id}"))
            .insert_header((USER_ID_HEADER, customer))
            .to_request();
        let fetched: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(fetched["booking_id"], accepted["booking_id"]);
    }

    #[actix_web::test]
    async fn test_reservations_disabled_for_shop() {
        let (ctx, seed) = seeded_context().await;
        let app = test::init_service(App::new().app_data(web::Data::new(ctx)).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/api/reservations")
            .insert_header((USER_ID_HEADER, Uuid::new_v4().to_string()))
            .set_json(json!({
                "partner_id": seed.partner_id,
                "business_id": seed.shop_id,
                "date_time": "2024-03-08T12:00:00",
                "guests": 3,
                "dinner_type": "lunch",
            }))
            .to_request();
        let res = test::call_service(&app, req).await;
        let error: Value = test::read_body_json(res).await;
        assert_eq!(error["code"], "FEATURE_DISABLED");
    }
}
