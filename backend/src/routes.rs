use axum::{
    http::{HeaderValue, Method},
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{docs::ApiDoc, handlers, middleware as app_middleware, state::AppState};

/// Builds the full HTTP application over the given state.
pub fn app(state: AppState) -> Router {
    // Build public routes (no auth)
    let public_routes = Router::new()
        .route("/User/register", post(handlers::users::register))
        .route("/User/login", post(handlers::users::login))
        .route(
            "/User/forgot-password",
            post(handlers::users::forgot_password),
        )
        .route("/User/reset-password", post(handlers::users::reset_password))
        .route("/Product", get(handlers::products::list_products))
        .route("/Product/{id}", get(handlers::products::get_product))
        .route("/Voucher", get(handlers::vouchers::list_vouchers))
        .route("/Voucher/{id}", get(handlers::vouchers::get_voucher))
        .route("/Homepage", get(handlers::homepages::list_homepages))
        .route("/Homepage/{id}", get(handlers::homepages::get_homepage));

    // Build user-protected routes (auth required)
    let user_routes = Router::new()
        .route("/User", get(handlers::users::list_users))
        .route("/User/me", get(handlers::users::me))
        .route(
            "/User/change-password",
            post(handlers::users::change_password),
        )
        .route(
            "/User/{id}",
            get(handlers::users::get_user)
                .put(handlers::users::update_user)
                .delete(handlers::users::delete_user),
        )
        .route("/Product", post(handlers::products::create_product))
        .route(
            "/Product/{id}",
            put(handlers::products::update_product).delete(handlers::products::delete_product),
        )
        .route(
            "/Wishlist",
            get(handlers::wishlists::list_wishlists).post(handlers::wishlists::create_wishlist),
        )
        .route(
            "/Wishlist/{id}",
            get(handlers::wishlists::get_wishlist)
                .put(handlers::wishlists::update_wishlist)
                .delete(handlers::wishlists::delete_wishlist),
        )
        .route(
            "/Wishlist/{id}/products",
            post(handlers::wishlists::add_wishlist_product),
        )
        .route(
            "/Wishlist/{id}/products/{product_id}",
            axum::routing::delete(handlers::wishlists::remove_wishlist_product),
        )
        .route("/Voucher", post(handlers::vouchers::create_voucher))
        .route(
            "/Voucher/{id}",
            put(handlers::vouchers::update_voucher).delete(handlers::vouchers::delete_voucher),
        )
        .route(
            "/Voucher/{id}/redeem",
            post(handlers::vouchers::redeem_voucher),
        )
        .route("/UserVoucher", get(handlers::vouchers::list_user_vouchers))
        .route(
            "/UserVoucher/{id}",
            get(handlers::vouchers::get_user_voucher),
        )
        .route(
            "/UserVoucher/{id}/use",
            post(handlers::vouchers::use_user_voucher),
        )
        .route("/Homepage", post(handlers::homepages::create_homepage))
        .route(
            "/Homepage/{id}",
            put(handlers::homepages::update_homepage).delete(handlers::homepages::delete_homepage),
        )
        .route("/api/Cart", get(handlers::cart::get_cart))
        .route("/api/Cart/items", post(handlers::cart::add_cart_item))
        .route(
            "/api/Cart/items/{item_id}",
            put(handlers::cart::update_cart_item).delete(handlers::cart::remove_cart_item),
        )
        .route(
            "/api/Transaction",
            get(handlers::transactions::transaction_history)
                .put(handlers::transactions::update_transaction),
        )
        .route(
            "/api/Transaction/init",
            post(handlers::transactions::init_transaction),
        )
        .route(
            "/api/Transaction/finalize",
            post(handlers::transactions::finalize_transaction),
        )
        .route(
            "/api/Transaction/current",
            get(handlers::transactions::current_transaction),
        )
        .route(
            "/SupportTicket",
            get(handlers::support::list_tickets).post(handlers::support::create_ticket),
        )
        .route(
            "/SupportTicket/{id}",
            get(handlers::support::get_ticket)
                .put(handlers::support::update_ticket)
                .delete(handlers::support::delete_ticket),
        )
        .route(
            "/Chat",
            get(handlers::support::list_chats).post(handlers::support::post_chat),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth,
        ));

    // Build admin-protected routes (auth + admin role)
    let admin_routes = Router::new()
        .route(
            "/api/admin/activity-logs",
            get(handlers::admin::list_activity_logs),
        )
        .route_layer(axum_middleware::from_fn_with_state(
            state.clone(),
            app_middleware::auth_admin,
        ));

    let cors = cors_layer(&state.config.cors_allow_origins);

    Router::new()
        .merge(public_routes)
        .merge(user_routes)
        .merge(admin_routes)
        .merge(SwaggerUi::new("/api/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(
            ServiceBuilder::new()
                .layer(axum_middleware::from_fn(app_middleware::request_id))
                .layer(TraceLayer::new_for_http())
                .layer(cors)
                .layer(axum_middleware::from_fn(
                    app_middleware::log_error_responses,
                )),
        )
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(std::time::Duration::from_secs(24 * 60 * 60));

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn cors_preflight_echoes_configured_origin() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(&["http://localhost:3000".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::OPTIONS)
                    .uri("/ping")
                    .header("origin", "http://localhost:3000")
                    .header("access-control-request-method", "GET")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(
            response
                .headers()
                .get("access-control-allow-origin")
                .and_then(|v| v.to_str().ok()),
            Some("http://localhost:3000")
        );
    }

    #[tokio::test]
    async fn cors_skips_unlisted_origin() {
        let app = Router::new()
            .route("/ping", get(|| async { "pong" }))
            .layer(cors_layer(&["http://localhost:3000".to_string()]));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ping")
                    .header("origin", "http://evil.example")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert!(response
            .headers()
            .get("access-control-allow-origin")
            .is_none());
    }
}
