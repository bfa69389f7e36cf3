// ============================================================================
// HTTP API
// ============================================================================
//
// Thin actix-web layer over the services: extract identity, call one
// service method, render the aggregate as JSON. Domain errors become
// `{"code", "message"}` bodies via `ApiError`.
//
// ============================================================================

mod admin;
mod carts;
mod errors;
mod identity;
mod orders;
mod reservations;

#[cfg(test)]
mod test_support;

use actix_web::web;

pub use errors::ApiError;
pub use identity::{CartCaller, Identity, Role, GUEST_TOKEN_HEADER, USER_ID_HEADER, USER_ROLE_HEADER};

/// Mount every `/api` route on an app carrying `Data<AppContext>`.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::resource("/cart")
                    .route(web::get().to(carts::get))
                    .route(web::delete().to(carts::clear)),
            )
            .route("/cart/lines", web::post().to(carts::add_line))
            .service(
                web::resource("/cart/lines/{line_id}")
                    .route(web::patch().to(carts::update_line))
                    .route(web::delete().to(carts::remove_line)),
            )
            .service(
                web::resource("/orders")
                    .route(web::post().to(orders::create))
                    .route(web::get().to(orders::list)),
            )
            .route("/orders/{id}", web::get().to(orders::get))
            .route("/orders/{id}/status", web::patch().to(orders::update_status))
            .route("/orders/{id}/respond", web::post().to(orders::respond))
            .route("/orders/{id}/cancel", web::post().to(orders::cancel))
            .route("/orders/{id}/requests", web::post().to(orders::request_return))
            .route("/orders/{id}/requests/decision", web::post().to(orders::decide))
            .route("/businesses/{id}/orders", web::get().to(orders::list_for_business))
            .route("/reservations", web::post().to(reservations::create))
            .route("/reservations/{id}", web::get().to(reservations::get))
            .route("/reservations/{id}/status", web::patch().to(reservations::update_status))
            .route(
                "/businesses/{id}/reservations",
                web::get().to(reservations::list_for_business),
            )
            .route("/admin/escalations/sweep", web::post().to(admin::sweep)),
    );
}
