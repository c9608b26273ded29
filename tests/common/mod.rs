//! Helpers shared by the HTTP integration tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use hearth::api::AppState;
use hearth::config::Config;
use http_body_util::BodyExt;
use serde_json::Value;
use std::sync::Arc;
use tower::ServiceExt;

pub const PASSWORD: &str = "Secret1!";

pub struct TestApp {
    pub state: Arc<AppState>,
    pub router: Router,
}

pub struct TestResponse {
    pub status: StatusCode,
    /// `name=value` part of the session cookie, when the response set one.
    pub cookie: Option<String>,
    pub body: Value,
}

pub async fn spawn_app() -> TestApp {
    let db_path =
        std::env::temp_dir().join(format!("hearth-test-{}.db", uuid::Uuid::new_v4()));

    let mut config = Config::default();
    config.general.database_path = format!("sqlite:{}", db_path.display());
    config.server.secure_cookies = false;
    config.security.argon2_memory_cost_kib = 1024;
    config.security.argon2_time_cost = 1;

    let state = hearth::api::create_app_state_from_config(config, None)
        .await
        .expect("failed to create app state");
    let router = hearth::api::router(state.clone());

    TestApp { state, router }
}

impl TestApp {
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
        cookie: Option<&str>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        let status = response.status();
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(ToString::to_string);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            cookie,
            body,
        }
    }

    /// Creates a family and returns its id.
    pub async fn create_family(&self, name: &str, email: &str) -> i64 {
        let response = self
            .request(
                "POST",
                "/families",
                Some(serde_json::json!({
                    "family": {"family_name": name, "email": email, "password": PASSWORD}
                })),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body["id"].as_i64().unwrap()
    }

    /// Signs in with the shared test password and returns the session cookie.
    pub async fn sign_in(&self, email: &str) -> String {
        let response = self
            .request(
                "POST",
                "/users/signin",
                Some(serde_json::json!({"email": email, "password": PASSWORD})),
                None,
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{}", response.body);
        response.cookie.expect("sign-in should set a session cookie")
    }

    pub async fn user_id(&self, email: &str) -> i32 {
        self.state
            .store()
            .get_user_by_email(email)
            .await
            .unwrap()
            .expect("user should exist")
            .id
    }

    /// Creates a user in the family of whoever holds `cookie`; returns the user JSON.
    pub async fn create_member(&self, cookie: &str, email: &str, user: Value) -> Value {
        let mut params = serde_json::json!({"email": email, "password": PASSWORD});
        if let (Some(target), Some(extra)) = (params.as_object_mut(), user.as_object()) {
            target.extend(extra.clone());
        }

        let response = self
            .request(
                "POST",
                "/users",
                Some(serde_json::json!({ "user": params })),
                Some(cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{}", response.body);
        response.body
    }
}
