//! Documentation of the Hardal Restaurant catering service.
//!
//! # General Infrastructure
//! - The storefront talks only to this service; the commerce backend is
//!   never exposed to the browser
//! - One session bootstrap on first load, then a same-site session cookie
//!   plus a client-IP cookie guard every proxied call
//! - Cart, catalog and checkout endpoints are thin proxies; the service adds
//!   the configurator/checkout state machines, local totals and the order
//!   PDF + mail side channel
//!
//! # Ordering guarantee
//! Every cart mutation is a single remote call that is awaited before the
//! response goes out; the next read of the cart reflects it. The service
//! keeps no optimistic copy of the cart anywhere.
//!
//! # Setup
//!
//! View current docs.
//! ```sh
//! cargo doc --open
//! ```
//!
//! Run locally (commerce key and SMTP password come from the environment or
//! `/run/secrets`).
//! ```sh
//! RUST_LOG=info COMMERCE_API_KEY=... SMTP_PASS=... cargo run
//! ```
use std::time::Duration;

use axum::{
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        Method,
    },
    routing::{delete, get, post},
    Router,
};

use signal::{
    ctrl_c,
    unix::{signal, SignalKind},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

pub mod cart;
pub mod checkout;
pub mod commerce;
pub mod config;
pub mod email;
pub mod error;
pub mod models;
pub mod pdf;
pub mod routes;
pub mod session;
pub mod state;
pub mod steps;
pub mod totals;

use state::State;

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new();

    info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    let app = Router::new()
        .route("/api/check-session", get(session::check_session))
        .route("/api/get-cart", get(routes::get_cart))
        .route("/api/get-menu-content", post(routes::get_menu_content))
        .route("/api/get-categories", get(routes::get_categories))
        .route("/api/get-packages", get(routes::get_packages))
        .route("/api/get-products-by-category", post(routes::get_products_by_category))
        .route("/api/get-product-by-id", post(routes::get_product_by_id))
        .route("/api/add-main-product", post(routes::add_main_product))
        .route("/api/add-extra", post(routes::add_extra))
        .route("/api/edit-product", post(routes::edit_product))
        .route("/api/decrement-product", post(routes::decrement_product))
        .route("/api/remove-product", post(routes::remove_product))
        .route("/api/clear-cart", post(routes::clear_cart))
        .route("/api/add-package", post(routes::add_package))
        .route("/api/delete-package", post(routes::delete_package))
        .route("/api/cart-view", get(routes::cart_view))
        .route("/api/get-payment-methods", get(routes::get_payment_methods))
        .route("/api/set-payment-method", post(routes::set_payment_method))
        .route("/api/set-shipping-address", post(routes::set_shipping_address))
        .route("/api/set-payment-address", post(routes::set_payment_address))
        .route("/api/get-shipping-method", get(routes::get_shipping_method))
        .route("/api/set-shipping-method", post(routes::set_shipping_method))
        .route("/api/checkout", get(routes::checkout_state))
        .route("/api/checkout/back", post(routes::checkout_back))
        .route("/api/checkout/confirm", post(routes::checkout_confirm))
        .route("/api/flow", get(routes::flow_state).post(routes::flow_start))
        .route("/api/flow/abandon", delete(routes::flow_abandon))
        .route("/api/flow/next", post(routes::flow_next))
        .route("/api/flow/previous", post(routes::flow_previous))
        .route("/api/flow/jump", post(routes::flow_jump))
        .route("/api/flow/select-extra", post(routes::flow_select_extra))
        .route("/api/flow/modal/add-extra", post(routes::flow_modal_add_extra))
        .route("/api/flow/modal/advance", post(routes::flow_modal_advance))
        .route("/api/submit-order", post(routes::submit_order))
        .layer(cors)
        .with_state(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
