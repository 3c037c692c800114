//! The session context over the hosted-backend client, against a mock server.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use rust_decimal::Decimal;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tutaviendo_admin::messages;
use tutaviendo_admin::screens::{
    AuthMode, Field, LoginForm, LogoutOutcome, PaymentsShippingForm, SaveOutcome,
    SettingsChange, SubmitOutcome, UserMenu,
};
use tutaviendo_admin::services::{MemoryNavigator, MemoryNotifier, Route, ToastKind};
use tutaviendo_admin::{SessionError, StoreContext, SupabaseClient};
use tutaviendo_integration_tests::{
    OWNER_EMAIL, OWNER_PASSWORD, STORE_ID, USER_ID, owner_email, owner_password, session_body,
    store_row, supabase_client,
};

async fn mount_profile(server: &MockServer, plan_id: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/profiles"))
        .and(query_param("id", format!("eq.{USER_ID}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            { "name": "Ana Lucía", "avatar_url": null, "plan_id": plan_id }
        ])))
        .mount(server)
        .await;
}

async fn mount_stores(server: &MockServer, access_token: &str) {
    Mock::given(method("GET"))
        .and(path("/rest/v1/stores"))
        .and(query_param("owner_id", format!("eq.{USER_ID}")))
        .and(header("authorization", format!("Bearer {access_token}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([store_row(false, false, 0)])))
        .mount(server)
        .await;
}

async fn mount_password_grant(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "password"))
        .and(body_partial_json(json!({ "email": OWNER_EMAIL })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_body("access-1", "refresh-1")),
        )
        .mount(server)
        .await;
}

async fn signed_in(server: &MockServer) -> (StoreContext, SupabaseClient) {
    mount_password_grant(server).await;
    mount_profile(server, "pro").await;
    mount_stores(server, "access-1").await;

    let client = supabase_client(server);
    let context = StoreContext::with_backend(Arc::new(client.clone()));
    context.initialize().await;
    context
        .login(&owner_email(), &owner_password())
        .await
        .unwrap();
    (context, client)
}

#[tokio::test]
async fn test_login_form_over_http() {
    let server = MockServer::start().await;
    mount_password_grant(&server).await;
    mount_profile(&server, "pro").await;
    mount_stores(&server, "access-1").await;

    let context = StoreContext::with_backend(Arc::new(supabase_client(&server)));
    context.initialize().await;
    let navigator = MemoryNavigator::new("/login");

    let mut form = LoginForm::new(AuthMode::Login);
    form.set(Field::Email, OWNER_EMAIL);
    form.set(Field::Password, OWNER_PASSWORD);
    let outcome = form.submit(&context, &navigator).await;

    assert_eq!(outcome, SubmitOutcome::SignedIn);
    assert_eq!(navigator.current().route(), Some(Route::Admin));

    let state = context.snapshot();
    let user = state.user().unwrap();
    assert_eq!(user.id.to_string(), USER_ID);
    assert_eq!(user.name, "Ana Lucía");
    assert_eq!(context.current_plan().name, "Pro");

    let card = UserMenu::store_card(&state).unwrap();
    assert_eq!(card.store_id.to_string(), STORE_ID);
    assert_eq!(card.product_label(), "1 productos");
}

#[tokio::test]
async fn test_invalid_credentials_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid login credentials"
        })))
        .mount(&server)
        .await;

    let context = StoreContext::with_backend(Arc::new(supabase_client(&server)));
    context.initialize().await;
    let navigator = MemoryNavigator::new("/login");

    let mut form = LoginForm::new(AuthMode::Login);
    form.set(Field::Email, OWNER_EMAIL);
    form.set(Field::Password, "otra-clave");
    let outcome = form.submit(&context, &navigator).await;

    assert_eq!(outcome, SubmitOutcome::Rejected);
    assert_eq!(form.general_error(), Some(messages::AUTH_INVALID_CREDENTIALS));
    assert!(!context.snapshot().is_authenticated());
}

#[tokio::test]
async fn test_bootstrap_restores_persisted_refresh_token() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .and(query_param("grant_type", "refresh_token"))
        .and(body_partial_json(json!({ "refresh_token": "saved-refresh" })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(session_body("access-2", "refresh-2")),
        )
        .expect(1)
        .mount(&server)
        .await;
    mount_profile(&server, "business").await;
    mount_stores(&server, "access-2").await;

    let client = supabase_client(&server);
    client
        .set_refresh_token(SecretString::from("saved-refresh".to_string()))
        .await;
    let context = StoreContext::with_backend(Arc::new(client.clone()));

    let state = context.initialize().await;

    assert!(state.is_authenticated());
    assert_eq!(state.stores().len(), 1);
    assert_eq!(UserMenu::header(&state).plan_name, "Empresarial");
    let rotated = client.refresh_token().await.unwrap();
    assert_eq!(rotated.expose_secret(), "refresh-2");
}

#[tokio::test]
async fn test_bootstrap_with_revoked_token_ends_signed_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "msg": "Invalid Refresh Token: Revoked"
        })))
        .mount(&server)
        .await;

    let client = supabase_client(&server);
    client
        .set_refresh_token(SecretString::from("revoked".to_string()))
        .await;
    let context = StoreContext::with_backend(Arc::new(client.clone()));

    let state = context.initialize().await;

    assert!(state.is_initialized());
    assert!(!state.is_authenticated());
    assert!(!client.has_session().await);
}

#[tokio::test]
async fn test_payments_save_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/stores"))
        .and(query_param("id", format!("eq.{STORE_ID}")))
        .and(header("prefer", "return=representation"))
        .and(header("authorization", "Bearer access-1"))
        .and(body_partial_json(json!({
            "accept_cash": true,
            "allow_delivery": true
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([store_row(true, true, 5)])))
        .expect(1)
        .mount(&server)
        .await;
    let (context, _client) = signed_in(&server).await;
    let notifier = MemoryNotifier::new();

    let mut form = PaymentsShippingForm::for_session(&context.snapshot());
    form.apply(SettingsChange::AcceptCash(true));
    form.apply(SettingsChange::AllowDelivery(true));
    form.apply(SettingsChange::DeliveryCost("5".to_string()));
    let outcome = form.save(&context, &notifier).await;

    assert!(matches!(outcome, SaveOutcome::Saved(_)));
    let store = context.snapshot().current_store().cloned().unwrap();
    assert!(store.accept_cash);
    assert!(store.allow_delivery);
    assert_eq!(store.delivery_cost, Decimal::from(5));
    assert_eq!(notifier.drain()[0].kind, ToastKind::Success);
}

#[tokio::test]
async fn test_payments_save_rejected_keeps_snapshot() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/rest/v1/stores"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "message": "permission denied for table stores"
        })))
        .mount(&server)
        .await;
    let (context, _client) = signed_in(&server).await;
    let before = context.snapshot();
    let notifier = MemoryNotifier::new();

    let mut form = PaymentsShippingForm::for_session(&before);
    form.apply(SettingsChange::AcceptCash(true));
    let outcome = form.save(&context, &notifier).await;

    assert_eq!(outcome, SaveOutcome::Failed);
    assert_eq!(*context.snapshot(), *before);
    let toasts = notifier.drain();
    assert_eq!(toasts[0].kind, ToastKind::Error);
    assert!(toasts[0].message.contains("permission denied"));
}

#[tokio::test]
async fn test_logout_over_http() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .and(header("authorization", "Bearer access-1"))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;
    let (context, client) = signed_in(&server).await;
    let notifier = MemoryNotifier::new();
    let navigator = MemoryNavigator::new("/admin");

    let outcome = UserMenu::new().logout(&context, &notifier, &navigator).await;

    assert_eq!(outcome, LogoutOutcome::SignedOut);
    assert!(!context.snapshot().is_authenticated());
    assert!(!client.has_session().await);
    assert!(client.refresh_token().await.is_none());
    assert_eq!(navigator.current().route(), Some(Route::Login));
}

#[tokio::test]
async fn test_logout_server_error_still_signs_out() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/auth/v1/logout"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({ "msg": "boom" })))
        .mount(&server)
        .await;
    let (context, _client) = signed_in(&server).await;

    let err = context.logout().await.unwrap_err();

    assert!(matches!(err, SessionError::Auth(_)));
    assert!(!context.snapshot().is_authenticated());
}
