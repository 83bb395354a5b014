use axum::{
    Router, middleware,
    routing::{get, post},
};

use crate::auth::{self, AppState};
use crate::middleware::require_auth;
use crate::{bids, comments, items, profiles, reviews};

/// The JSON surface consumed by the mobile client. Paths keep their
/// trailing slashes. Item mutation authenticates inside its handlers
/// (token plus ownership scope); only the current-user endpoint sits
/// behind the auth layer.
pub fn api_router(state: AppState) -> Router {
    let open = Router::new()
        .route(
            "/api/profiles/",
            get(profiles::list_profiles).post(profiles::create_profile),
        )
        .route(
            "/api/profile/{id}/",
            get(profiles::get_profile).patch(profiles::update_profile),
        )
        .route("/api/profile/{id}/items/", get(profiles::profile_items))
        .route("/api/profile/{id}/reviews/", get(profiles::profile_reviews))
        .route("/api/items/", get(items::list_items).post(items::create_item))
        .route("/api/items/featured/", get(items::featured_items))
        .route("/api/items/ending-soon/", get(items::ending_soon_items))
        .route(
            "/api/item/{id}/",
            get(items::get_item)
                .patch(items::update_item)
                .delete(items::delete_item),
        )
        .route("/api/item/{id}/bids/", get(items::item_bids))
        .route("/api/item/{id}/comments/", get(items::item_comments))
        .route("/api/bids/", get(bids::list_bids).post(bids::create_bid))
        .route("/api/bid/{id}/", get(bids::get_bid))
        .route(
            "/api/comments/",
            get(comments::list_comments).post(comments::create_comment),
        )
        .route(
            "/api/comment/{id}/",
            get(comments::get_comment)
                .patch(comments::update_comment)
                .delete(comments::delete_comment),
        )
        .route(
            "/api/reviews/",
            get(reviews::list_reviews).post(reviews::create_review),
        )
        .route(
            "/api/review/{id}/",
            get(reviews::get_review)
                .patch(reviews::update_review)
                .delete(reviews::delete_review),
        )
        .route("/api/auth/login/", post(auth::login))
        .route("/api/auth/register/", post(auth::register))
        .with_state(state.clone());

    let protected = Router::new()
        .route("/api/auth/user/", get(auth::current_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth))
        .with_state(state);

    open.merge(protected)
}
