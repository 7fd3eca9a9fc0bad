pub mod config;
pub mod database;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod web;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, get_service, post},
    Router,
};
use http::header::{HeaderValue, CACHE_CONTROL};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::services::ServeDir;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::services::storage_service::MAX_UPLOAD_BYTES;
use crate::state::AppState;
use crate::web::middleware::auth as auth_middleware;
use crate::web::routes::{
    admin, auth, checkin, pages, participants, profile, registration, uploads,
};

pub fn build_router(state: AppState) -> Router {
    // Signed-in users
    let member_routes = Router::new()
        .route(
            "/profile",
            get(profile::profile_page).post(profile::profile_save_handler),
        )
        .route("/profile/qr", get(profile::profile_qr_handler))
        .route(
            "/events/:event_id/register",
            get(registration::register_page).post(registration::register_individual_handler),
        )
        .route(
            "/events/:event_id/teams",
            post(registration::create_team_handler),
        )
        .route(
            "/events/:event_id/teams/join",
            post(registration::join_team_handler),
        )
        .route("/logout", post(auth::logout_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    // Admins; require_auth runs first and require_admin reads its extension.
    let admin_routes = Router::new()
        .route("/admin", get(admin::dashboard_handler))
        .route(
            "/admin/events",
            get(admin::events_handler).post(admin::create_event_handler),
        )
        .route("/admin/events/new", get(admin::new_event_page))
        .route(
            "/admin/events/:event_id",
            get(admin::edit_event_page).post(admin::update_event_handler),
        )
        .route(
            "/admin/events/:event_id/delete",
            post(admin::delete_event_handler),
        )
        .route(
            "/admin/events/:event_id/participants",
            get(participants::participants_page),
        )
        .route(
            "/admin/events/:event_id/participants.json",
            get(participants::participants_json_handler),
        )
        .route(
            "/admin/events/:event_id/participants/stream",
            get(participants::participants_stream_handler),
        )
        .route(
            "/admin/registrations/:registration_id/delete",
            post(participants::delete_registration_handler),
        )
        .route("/admin/gallery", get(admin::gallery_handler))
        .route(
            "/admin/gallery/sections",
            post(admin::create_section_handler),
        )
        .route(
            "/admin/gallery/sections/:id/delete",
            post(admin::delete_section_handler),
        )
        .route(
            "/admin/gallery/collections",
            post(admin::create_collection_handler),
        )
        .route(
            "/admin/gallery/collections/:id/delete",
            post(admin::delete_collection_handler),
        )
        .route("/admin/gallery/images", post(admin::create_image_handler))
        .route(
            "/admin/gallery/images/:id/delete",
            post(admin::delete_image_handler),
        )
        .route(
            "/admin/team",
            get(admin::team_handler).post(admin::create_member_handler),
        )
        .route("/admin/team/:id", post(admin::update_member_handler))
        .route("/admin/team/:id/delete", post(admin::delete_member_handler))
        .route("/admin/messages", get(admin::messages_handler))
        .route("/admin/checkin", get(checkin::checkin_page))
        .route("/api/checkin/scan", post(checkin::scan_handler))
        .route(
            "/admin/uploads/:bucket",
            post(uploads::upload_handler)
                .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES + 64 * 1024)),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_admin,
        ))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware::require_auth,
        ));

    let assets_dir = state.config.assets_dir.clone();

    Router::new()
        // Public routes
        .route("/", get(pages::home_handler))
        .route("/about", get(pages::about_handler))
        .route("/events", get(pages::events_handler))
        .route("/events/:event_id", get(pages::event_detail_handler))
        .route("/esummit", get(pages::esummit_handler))
        .route("/gallery", get(pages::gallery_handler))
        .route(
            "/contact",
            get(pages::contact_page).post(pages::contact_handler),
        )
        .route("/login", get(auth::login_page).post(auth::login_handler))
        .route("/signup", get(auth::signup_page).post(auth::signup_handler))
        .route("/healthz", get(pages::healthz_handler))
        .merge(member_routes)
        .merge(admin_routes)
        // Static files
        .nest_service(
            "/assets",
            get_service(ServeDir::new(assets_dir)).layer(SetResponseHeaderLayer::if_not_present(
                CACHE_CONTROL,
                HeaderValue::from_static("no-store"),
            )),
        )
        // Layers
        .layer(SetResponseHeaderLayer::if_not_present(
            CACHE_CONTROL,
            HeaderValue::from_static("no-store"),
        ))
        .layer(CatchPanicLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
