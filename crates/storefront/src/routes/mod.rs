//! HTTP route handlers for the storefront and admin console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                          - Home page (carousel, categories, featured)
//! POST /welcome/dismiss           - Hide the welcome popup
//! POST /preferences/theme         - Toggle light/dark theme
//!
//! # Catalog
//! GET  /shop                      - Listing (?category=&q=&sort=&page=)
//! GET  /products/{slug}           - Product detail
//! GET  /search                    - Search overlay fragment (?q=)
//! GET  /checkout/{product_id}     - Record order, redirect to payment link
//!
//! # Content
//! GET  /about                     - About page
//! GET  /articles                  - Article list (?tag=)
//! GET  /articles/{slug}           - Article detail
//! POST /articles/{slug}/save      - Toggle saved article
//!
//! # Wishlist and feedback
//! GET  /wishlist                  - Wishlist page
//! POST /wishlist/{product_id}     - Toggle wishlist entry
//! POST /feedback                  - Feedback widget (JSON)
//!
//! # Auth
//! GET|POST /auth/login, /auth/register, /auth/forgot-password
//! GET  /auth/oauth/{provider}     - Redirect to OAuth provider
//! GET  /auth/callback             - PKCE code exchange
//! POST /auth/logout
//!
//! # Profile (requires auth)
//! GET|POST /profile               - Overview and edit
//! /profile/addresses, /profile/saved, /profile/appointments, /profile/orders
//!
//! # Admin (requires admin profile)
//! /admin, /admin/products, /admin/categories, /admin/carousel
//! ```

pub mod admin;
pub mod articles;
pub mod auth;
pub mod checkout;
pub mod feedback;
mod forms;
pub mod home;
pub mod pages;
pub mod profile;
pub mod shop;
pub mod views;
pub mod wishlist;

use axum::{
    Router,
    routing::{get, post},
};

use crate::middleware::{auth_rate_limiter, form_rate_limiter};
use crate::state::AppState;

/// Create the auth routes router.
///
/// Form posts that hit the identity provider share one rate limiter.
pub fn auth_routes() -> Router<AppState> {
    let limiter = auth_rate_limiter();

    Router::new()
        .route(
            "/login",
            get(auth::login_page).merge(post(auth::login).layer(limiter.clone())),
        )
        .route(
            "/register",
            get(auth::register_page).merge(post(auth::register).layer(limiter.clone())),
        )
        .route(
            "/forgot-password",
            get(auth::forgot_password_page).merge(post(auth::forgot_password).layer(limiter)),
        )
        .route("/oauth/{provider}", get(auth::oauth_start))
        .route("/callback", get(auth::oauth_callback))
        .route("/logout", post(auth::logout))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::index).post(profile::update))
        .route(
            "/addresses",
            get(profile::addresses).post(profile::create_address),
        )
        .route("/addresses/{id}", post(profile::update_address))
        .route("/addresses/{id}/delete", post(profile::delete_address))
        .route("/addresses/{id}/default", post(profile::set_default_address))
        .route("/saved", get(profile::saved))
        .route("/saved/{product_id}/remove", post(profile::remove_saved))
        .route(
            "/appointments",
            get(profile::appointments).post(profile::book_appointment),
        )
        .route(
            "/appointments/{id}/cancel",
            post(profile::cancel_appointment),
        )
        .route("/orders", get(profile::orders))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        // Home page
        .route("/", get(home::home))
        .route("/welcome/dismiss", post(home::dismiss_welcome))
        .route("/preferences/theme", post(home::toggle_theme))
        // Catalog
        .route("/shop", get(shop::index))
        .route("/products/{slug}", get(shop::show))
        .route("/search", get(shop::search))
        .route("/checkout/{product_id}", get(checkout::checkout))
        // Content
        .route("/about", get(pages::about))
        .route("/articles", get(articles::index))
        .route("/articles/{slug}", get(articles::show))
        .route("/articles/{slug}/save", post(articles::toggle_save))
        // Wishlist
        .route("/wishlist", get(wishlist::show))
        .route("/wishlist/{product_id}", post(wishlist::toggle))
        // Feedback widget
        .route(
            "/feedback",
            post(feedback::submit).layer(form_rate_limiter()),
        )
        // Auth routes
        .nest("/auth", auth_routes())
        // Profile routes
        .nest("/profile", profile_routes())
        // Admin console
        .nest("/admin", admin::routes())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::Body,
        extract::Path,
        http::{Request, StatusCode, header},
        response::Response,
    };
    use chrono::Utc;
    use tower::ServiceExt;
    use tower_sessions::{MemoryStore, Session};

    use apothecary_core::{AppointmentKind, AppointmentStatus, ProductId, UserId};

    use super::*;
    use crate::config::tests::test_config;
    use crate::db::fake::FakeStore;
    use crate::db::{AddressStore, AppointmentStore, ProfileStore, SavedItemStore};
    use crate::middleware::session_layer;
    use crate::models::catalog::fixtures::{dec, product};
    use crate::models::{CurrentUser, UserProfile};
    use crate::session_state;
    use crate::state::tests::test_state;

    const USER_ID: &str = "6f1c1a9e-0d7b-4b7e-9a8c-2f3b4c5d6e7f";

    fn user_id() -> UserId {
        USER_ID.parse().unwrap()
    }

    /// Test-only sign-in: puts a user for the seeded profile in the session.
    async fn sign_in(session: Session, Path(admin): Path<bool>) -> StatusCode {
        let user = CurrentUser {
            id: user_id(),
            email: "pat@example.test".to_string(),
            display_name: "Pat".to_string(),
            is_admin: admin,
            access_token: "token".to_string(),
        };
        session_state::set_current_user(&session, &user).await.unwrap();
        StatusCode::NO_CONTENT
    }

    fn app_with(store: Arc<FakeStore>) -> Router {
        let state = test_state(store);
        routes()
            .route("/test/sign-in/{admin}", post(sign_in))
            .layer(session_layer(MemoryStore::default(), &test_config()))
            .with_state(state)
    }

    async fn seed_profile(store: &FakeStore, is_admin: bool) {
        let now = Utc::now();
        store
            .insert_profile(UserProfile {
                id: user_id(),
                email: "pat@example.test".to_string(),
                full_name: Some("Pat".to_string()),
                phone: None,
                date_of_birth: None,
                avatar_url: None,
                is_admin,
                created_at: now,
                updated_at: now,
            })
            .await;
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get_request(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::empty()).unwrap()
    }

    /// Sign in through the test route and return the session cookie.
    async fn signed_in_cookie(app: &Router, admin: bool) -> String {
        let request = Request::builder()
            .method("POST")
            .uri(format!("/test/sign-in/{admin}"))
            .body(Body::empty())
            .unwrap();
        let response = send(app, request).await;
        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let set_cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    fn location(response: &Response) -> &str {
        response.headers()[header::LOCATION].to_str().unwrap()
    }

    fn form_request(uri: &str, cookie: Option<&str>, body: &str) -> Request<Body> {
        let mut builder = Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        builder.body(Body::from(body.to_string())).unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_home_renders_with_empty_catalog() {
        let app = app_with(Arc::new(FakeStore::default()));
        let response = send(&app, get_request("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_home_renders_when_store_fails() {
        let app = app_with(Arc::new(FakeStore::failing()));
        let response = send(&app, get_request("/", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_unknown_product_is_not_found() {
        let app = app_with(Arc::new(FakeStore::default()));
        let response = send(&app, get_request("/products/nothing-here", None)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_profile_redirects_anonymous_visitors() {
        let app = app_with(Arc::new(FakeStore::default()));
        let response = send(&app, get_request("/profile", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/auth/login");

        let fragment = Request::builder()
            .uri("/profile/orders")
            .header("hx-request", "true")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, fragment).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_admin_requires_admin_profile() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store);

        let response = send(&app, get_request("/admin", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        // The session flag alone does not grant access
        let cookie = signed_in_cookie(&app, true).await;
        let response = send(&app, get_request("/admin", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_admin_dashboard_for_admin() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, true).await;
        let app = app_with(store);

        let cookie = signed_in_cookie(&app, true).await;
        let response = send(&app, get_request("/admin", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_profile_renders_for_signed_in_user() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store);

        let cookie = signed_in_cookie(&app, false).await;
        let response = send(&app, get_request("/profile", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_checkout_redirects_to_payment_link() {
        let store = Arc::new(FakeStore::default());
        let item = product(1, "Vitamin C", dec("12.00"));
        store.insert_product(item.clone()).await;
        let app = app_with(store);

        let response = send(&app, get_request("/checkout/1", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), item.payment_link.as_deref().unwrap());
    }

    #[tokio::test]
    async fn test_checkout_without_stock_returns_to_product() {
        let store = Arc::new(FakeStore::default());
        let mut item = product(1, "Vitamin C", dec("12.00"));
        item.stock = 0;
        store.insert_product(item.clone()).await;
        let app = app_with(store);

        let response = send(&app, get_request("/checkout/1", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), format!("/products/{}", item.slug));
    }

    #[tokio::test]
    async fn test_wishlist_toggle_fragment() {
        let store = Arc::new(FakeStore::default());
        store
            .insert_product(product(4, "Zinc", dec("5.00")))
            .await;
        let app = app_with(store);

        let request = Request::builder()
            .method("POST")
            .uri("/wishlist/4")
            .header("hx-request", "true")
            .body(Body::empty())
            .unwrap();
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_feedback_validation() {
        let app = app_with(Arc::new(FakeStore::default()));

        let submit = |body: &'static str| {
            Request::builder()
                .method("POST")
                .uri("/feedback")
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-forwarded-for", "203.0.113.9")
                .body(Body::from(body))
                .unwrap()
        };

        let response = send(&app, submit(r#"{"rating": 9, "message": "hi"}"#)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = send(&app, submit(r#"{"rating": 5, "message": "Great"}"#)).await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_oauth_rejects_unknown_provider() {
        let app = app_with(Arc::new(FakeStore::default()));
        let response = send(&app, get_request("/auth/oauth/myspace", None)).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/auth/login?error=provider");
    }

    #[tokio::test]
    async fn test_oauth_callback_requires_matching_state() {
        let app = app_with(Arc::new(FakeStore::default()));
        let response = send(
            &app,
            get_request("/auth/callback?code=abc&state=forged", None),
        )
        .await;
        assert_eq!(location(&response), "/auth/login?error=invalid_state");
    }

    #[tokio::test]
    async fn test_public_pages_render() {
        let store = Arc::new(FakeStore::default());
        store
            .insert_product(product(2, "Cetirizine 10mg", dec("3.99")))
            .await;
        let app = app_with(store);

        for uri in [
            "/shop",
            "/shop?q=cetirizine&sort=price_asc",
            "/products/cetirizine-10mg",
            "/search?q=cet",
            "/about",
            "/articles",
            "/articles?tag=Allergy",
            "/articles/hay-fever",
            "/wishlist",
            "/auth/login",
            "/auth/register",
            "/auth/forgot-password",
        ] {
            let response = send(&app, get_request(uri, None)).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_draft_and_unknown_articles_are_not_found() {
        let app = app_with(Arc::new(FakeStore::default()));
        for uri in ["/articles/unfinished", "/articles/no-such-article"] {
            let response = send(&app, get_request(uri, None)).await;
            assert_eq!(response.status(), StatusCode::NOT_FOUND, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_profile_pages_render() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store);

        let cookie = signed_in_cookie(&app, false).await;
        for uri in [
            "/profile/addresses",
            "/profile/saved",
            "/profile/appointments",
            "/profile/orders",
        ] {
            let response = send(&app, get_request(uri, Some(&cookie))).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_admin_pages_render() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, true).await;
        store
            .insert_product(product(3, "Ibuprofen Gel", dec("5.49")))
            .await;
        let app = app_with(store);

        let cookie = signed_in_cookie(&app, true).await;
        for uri in [
            "/admin/products",
            "/admin/products?q=gel",
            "/admin/products/new",
            "/admin/products/3/edit",
            "/admin/categories",
            "/admin/carousel",
        ] {
            let response = send(&app, get_request(uri, Some(&cookie))).await;
            assert_eq!(response.status(), StatusCode::OK, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_signed_in_visitor_skips_login_page() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store);

        let cookie = signed_in_cookie(&app, false).await;
        let response = send(&app, get_request("/auth/login", Some(&cookie))).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile");
    }

    #[tokio::test]
    async fn test_admin_writes_require_admin() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        store
            .insert_product(product(1, "Vitamin C", dec("12.00")))
            .await;
        let app = app_with(store.clone());

        let response = send(
            &app,
            form_request("/admin/carousel/1/toggle", None, ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/auth/login");

        let cookie = signed_in_cookie(&app, false).await;
        for (uri, body) in [
            ("/admin/categories", "name=Cold+%26+Flu"),
            ("/admin/products/1/delete", ""),
            ("/admin/carousel/1/toggle", ""),
        ] {
            let response = send(&app, form_request(uri, Some(&cookie), body)).await;
            assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
        }

        let data = store.data.lock().await;
        assert!(data.categories.is_empty());
        assert_eq!(data.products.len(), 1);
    }

    #[tokio::test]
    async fn test_admin_category_create_shows_in_shop() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, true).await;
        let app = app_with(store.clone());

        let cookie = signed_in_cookie(&app, true).await;
        let response = send(
            &app,
            form_request("/admin/categories", Some(&cookie), "name=Cold+%26+Flu"),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/admin/categories");

        let response = send(&app, get_request("/shop?category=cold-flu", None)).await;
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains(r#"name="category" value="cold-flu""#));
    }

    #[tokio::test]
    async fn test_admin_product_delete() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, true).await;
        store
            .insert_product(product(1, "Vitamin C", dec("12.00")))
            .await;
        let app = app_with(store.clone());

        let cookie = signed_in_cookie(&app, true).await;
        let response = send(
            &app,
            form_request("/admin/products/1/delete", Some(&cookie), ""),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert!(store.data.lock().await.products.is_empty());
    }

    #[tokio::test]
    async fn test_signed_in_wishlist_toggle_saves_item() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        store
            .insert_product(product(4, "Zinc", dec("5.00")))
            .await;
        let app = app_with(store.clone());

        let cookie = signed_in_cookie(&app, false).await;
        let response = send(&app, form_request("/wishlist/4", Some(&cookie), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/products/zinc");

        let saved = store.list_saved_items(user_id()).await.unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].product.id, ProductId::new(4));
    }

    #[tokio::test]
    async fn test_profile_edit() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store.clone());
        let cookie = signed_in_cookie(&app, false).await;

        let response = send(
            &app,
            form_request(
                "/profile",
                Some(&cookie),
                "full_name=Pat+Jones&phone=01234+567890&date_of_birth=1990-04-01",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile");
        let profile = store.get_profile(user_id()).await.unwrap().unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Pat Jones"));
        assert_eq!(profile.phone.as_deref(), Some("01234 567890"));

        // A malformed date leaves the profile untouched
        let response = send(
            &app,
            form_request(
                "/profile",
                Some(&cookie),
                "full_name=Someone&date_of_birth=01%2F04%2F1990",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let profile = store.get_profile(user_id()).await.unwrap().unwrap();
        assert_eq!(profile.full_name.as_deref(), Some("Pat Jones"));
    }

    #[tokio::test]
    async fn test_address_book_forms() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store.clone());
        let cookie = signed_in_cookie(&app, false).await;

        for label in ["Home", "Work"] {
            let body = format!(
                "label={label}&recipient=Pat&line1=1+High+St&city=Leeds\
                 &postal_code=LS1+1AA&country=GB"
            );
            let request = form_request("/profile/addresses", Some(&cookie), &body);
            let response = send(&app, request).await;
            assert_eq!(response.status(), StatusCode::SEE_OTHER);
            assert_eq!(location(&response), "/profile/addresses");
        }
        // Missing required fields are rejected
        let response = send(
            &app,
            form_request(
                "/profile/addresses",
                Some(&cookie),
                "recipient=Pat&line1=&city=&postal_code=&country=",
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);

        let addresses = store.list_addresses(user_id()).await.unwrap();
        assert_eq!(addresses.len(), 2);
        let work = addresses.iter().find(|a| a.label == "Work").unwrap().id;
        let home = addresses.iter().find(|a| a.label == "Home").unwrap().id;

        let uri = format!("/profile/addresses/{work}/default");
        let response = send(&app, form_request(&uri, Some(&cookie), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let addresses = store.list_addresses(user_id()).await.unwrap();
        assert!(addresses.iter().any(|a| a.id == work && a.is_default));
        assert!(addresses.iter().any(|a| a.id == home && !a.is_default));

        let uri = format!("/profile/addresses/{home}/delete");
        let response = send(&app, form_request(&uri, Some(&cookie), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let addresses = store.list_addresses(user_id()).await.unwrap();
        assert_eq!(addresses.len(), 1);
        assert_eq!(addresses[0].id, work);
    }

    #[tokio::test]
    async fn test_book_and_cancel_appointment() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        let app = app_with(store.clone());
        let cookie = signed_in_cookie(&app, false).await;

        let date = (Utc::now() + chrono::TimeDelta::days(7)).date_naive();
        let body = format!("kind=vaccination&date={date}&time=10%3A30&notes=Flu+jab");
        let request = form_request("/profile/appointments", Some(&cookie), &body);
        let response = send(&app, request).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile/appointments");

        // Past slots are refused
        let body = "kind=vaccination&date=2001-01-01&time=10%3A30";
        send(&app, form_request("/profile/appointments", Some(&cookie), body)).await;

        let appointments = store.list_appointments(user_id()).await.unwrap();
        assert_eq!(appointments.len(), 1);
        assert_eq!(appointments[0].kind, AppointmentKind::Vaccination);
        assert_eq!(appointments[0].status, AppointmentStatus::Scheduled);

        let uri = format!("/profile/appointments/{}/cancel", appointments[0].id);
        let response = send(&app, form_request(&uri, Some(&cookie), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let appointments = store.list_appointments(user_id()).await.unwrap();
        assert_eq!(appointments[0].status, AppointmentStatus::Cancelled);
    }

    #[tokio::test]
    async fn test_remove_saved_item() {
        let store = Arc::new(FakeStore::default());
        seed_profile(&store, false).await;
        store
            .insert_product(product(4, "Zinc", dec("5.00")))
            .await;
        store
            .add_saved_item(user_id(), ProductId::new(4))
            .await
            .unwrap();
        let app = app_with(store.clone());
        let cookie = signed_in_cookie(&app, false).await;

        let response = send(&app, form_request("/profile/saved/4/remove", Some(&cookie), "")).await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(location(&response), "/profile/saved");
        assert!(store.list_saved_items(user_id()).await.unwrap().is_empty());
    }
}
