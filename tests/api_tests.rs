mod common;

use axum::http::StatusCode;
use common::{PASSWORD, spawn_app};
use hearth::entities::prelude::{Families, Users};
use sea_orm::{EntityTrait, PaginatorTrait};
use serde_json::json;

#[tokio::test]
async fn test_health() {
    let app = spawn_app().await;

    let response = app.request("GET", "/health", None, None).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
}

#[tokio::test]
async fn test_create_family_makes_admin() {
    let app = spawn_app().await;

    let response = app
        .request(
            "POST",
            "/families",
            Some(json!({
                "family": {
                    "family_name": "The Smiths",
                    "email": "  Mom@Example.com ",
                    "password": PASSWORD
                }
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["family_name"], "The Smiths");
    assert!(response.body["id"].is_i64());
    assert!(response.body.get("email").is_none());

    let cookie = app.sign_in("mom@example.com").await;
    let me = app.request("GET", "/users/me", None, Some(&cookie)).await;

    assert_eq!(me.status, StatusCode::OK);
    assert_eq!(me.body["email"], "mom@example.com");
    assert_eq!(me.body["is_admin"], true);
    assert_eq!(me.body["can_view_all_accounts"], true);
    assert_eq!(me.body["family_id"], response.body["id"]);
    assert!(me.body.get("password_digest").is_none());
    assert!(me.body.get("mfa_secret").is_none());
}

#[tokio::test]
async fn test_create_family_validation_leaves_nothing_behind() {
    let app = spawn_app().await;
    let conn = &app.state.store().conn;

    let response = app
        .request(
            "POST",
            "/families",
            Some(json!({"family": {"family_name": "  ", "email": "bad", "password": "x"}})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(response.body, json!({"errors": ["Family name can't be blank"]}));

    let response = app
        .request(
            "POST",
            "/families",
            Some(json!({
                "family": {"family_name": "The Joneses", "email": "dad@example.com", "password": "password"}
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"],
        json!([
            "Password must include at least one uppercase letter, one lowercase letter, one digit, and one symbol"
        ])
    );
    assert_eq!(Families::find().count(conn).await.unwrap(), 0);
    assert_eq!(Users::find().count(conn).await.unwrap(), 0);

    app.create_family("The Joneses", "dad@example.com").await;

    let response = app
        .request(
            "POST",
            "/families",
            Some(json!({
                "family": {"family_name": "Copycats", "email": "DAD@example.com", "password": PASSWORD}
            })),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"],
        json!(["Email has already been taken"])
    );
    assert_eq!(Families::find().count(conn).await.unwrap(), 1);
    assert_eq!(Users::find().count(conn).await.unwrap(), 1);
}

#[tokio::test]
async fn test_sign_in_failures_look_the_same() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;

    let wrong_password = app
        .request(
            "POST",
            "/users/signin",
            Some(json!({"email": "mom@example.com", "password": "Wrong1!x"})),
            None,
        )
        .await;
    let unknown_email = app
        .request(
            "POST",
            "/users/signin",
            Some(json!({"email": "nobody@example.com", "password": PASSWORD})),
            None,
        )
        .await;

    assert_eq!(wrong_password.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_email.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong_password.body, unknown_email.body);
    assert_eq!(
        wrong_password.body,
        json!({"error": "Invalid email or password"})
    );
}

#[tokio::test]
async fn test_sign_in_returns_user_id() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;

    let response = app
        .request(
            "POST",
            "/users/signin",
            Some(json!({"user": {"email": "MOM@example.com", "password": PASSWORD}})),
            None,
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "User signed in successfully");
    assert!(response.body["user_id"].is_i64());
    assert!(response.cookie.is_some());
}

#[tokio::test]
async fn test_protected_routes_need_session() {
    let app = spawn_app().await;

    for uri in ["/users/me", "/bank_accounts", "/metrics"] {
        let response = app.request("GET", uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert!(response.body["error"].is_string());
    }
}

#[tokio::test]
async fn test_sign_out_ends_session() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let cookie = app.sign_in("mom@example.com").await;

    let response = app
        .request("POST", "/users/signout", None, Some(&cookie))
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["message"], "User signed out successfully");

    let me = app.request("GET", "/users/me", None, Some(&cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_user_routes_need_session() {
    let app = spawn_app().await;
    let family_id = app.create_family("The Smiths", "mom@example.com").await;
    let mom_id = app.user_id("mom@example.com").await;
    let uri = format!("/users/{mom_id}");

    let attempts = [
        (
            "POST",
            "/users".to_string(),
            Some(json!({"user": {
                "email": "evil@example.com",
                "password": PASSWORD,
                "is_admin": true,
                "can_view_all_accounts": true,
                "family_id": family_id
            }})),
        ),
        ("PATCH", uri.clone(), Some(json!({"user": {"password": "Pwned99!"}}))),
        ("PUT", uri.clone(), Some(json!({"user": {"can_view_all_accounts": false}}))),
        ("DELETE", uri.clone(), None),
        ("DELETE", format!("/families/{family_id}"), None),
    ];

    for (method, uri, body) in attempts {
        let response = app.request(method, &uri, body, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(response.body, json!({"error": "You need to sign in first"}));
    }

    assert!(
        app.state
            .store()
            .get_user_by_email("evil@example.com")
            .await
            .unwrap()
            .is_none()
    );
    // The password was not changed.
    app.sign_in("mom@example.com").await;
}

#[tokio::test]
async fn test_create_user_joins_callers_family() {
    let app = spawn_app().await;
    let family_id = app.create_family("The Smiths", "mom@example.com").await;
    let other_family = app.create_family("The Joneses", "dad@example.com").await;
    let cookie = app.sign_in("mom@example.com").await;

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({
                "user": {
                    "email": "aunt@example.com",
                    "password": PASSWORD,
                    "can_view_all_accounts": true,
                    "family_id": other_family
                }
            })),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.body["family_id"], family_id);
    assert_eq!(response.body["is_admin"], false);
    assert_eq!(response.body["can_view_all_accounts"], true);
    assert_eq!(response.body["mfa_enabled"], false);

    let kid = app.create_member(&cookie, "kid@example.com", json!({})).await;
    assert_eq!(kid["family_id"], family_id);

    app.sign_in("kid@example.com").await;
}

#[tokio::test]
async fn test_members_cannot_grant_privileges() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let mom = app.sign_in("mom@example.com").await;
    let kid = app.create_member(&mom, "kid@example.com", json!({})).await;
    let kid_cookie = app.sign_in("kid@example.com").await;

    for flags in [json!({"is_admin": true}), json!({"can_view_all_accounts": true})] {
        let mut user = json!({"email": "friend@example.com", "password": PASSWORD});
        user.as_object_mut()
            .unwrap()
            .extend(flags.as_object().unwrap().clone());

        let response = app
            .request("POST", "/users", Some(json!({ "user": user })), Some(&kid_cookie))
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{flags}");
        assert_eq!(
            response.body,
            json!({"error": "Not allowed to manage this user"})
        );

        let response = app
            .request(
                "PATCH",
                &format!("/users/{}", kid["id"]),
                Some(json!({ "user": flags.clone() })),
                Some(&kid_cookie),
            )
            .await;
        assert_eq!(response.status, StatusCode::FORBIDDEN, "{flags}");
    }

    // Plain members may still be added by anyone in the family.
    let friend = app
        .create_member(&kid_cookie, "friend@example.com", json!({}))
        .await;
    assert_eq!(friend["is_admin"], false);
}

#[tokio::test]
async fn test_create_user_validation() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let cookie = app.sign_in("mom@example.com").await;

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({"user": {"email": "not-an-email", "password": "abc"}})),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    let errors = response.body["errors"].as_array().unwrap();
    assert!(errors.contains(&json!("Email must be a valid email address")));
    assert!(errors.contains(&json!("Password is too short (minimum is 7 characters)")));
    assert!(errors.contains(&json!(
        "Password must include at least one uppercase letter, one lowercase letter, one digit, and one symbol"
    )));

    let response = app
        .request(
            "POST",
            "/users",
            Some(json!({"user": {"email": "Mom@Example.com", "password": PASSWORD}})),
            Some(&cookie),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"],
        json!(["Email has already been taken"])
    );
}

#[tokio::test]
async fn test_update_user() {
    let app = spawn_app().await;
    let family_id = app.create_family("The Smiths", "mom@example.com").await;
    let mom = app.sign_in("mom@example.com").await;
    let kid = app.create_member(&mom, "kid@example.com", json!({})).await;
    let kid_cookie = app.sign_in("kid@example.com").await;
    let uri = format!("/users/{}", kid["id"]);

    let response = app
        .request(
            "PATCH",
            &uri,
            Some(json!({"user": {"password": "weakpass"}})),
            Some(&kid_cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    // Members may change their own credentials.
    let response = app
        .request(
            "PATCH",
            &uri,
            Some(json!({"user": {"password": "Better2#"}})),
            Some(&kid_cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);

    // Admins may change privileges of members of their family.
    let response = app
        .request(
            "PUT",
            &uri,
            Some(json!({"user": {"email": "Teen@Example.com", "can_view_all_accounts": true}})),
            Some(&mom),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["email"], "teen@example.com");
    assert_eq!(response.body["can_view_all_accounts"], true);
    assert_eq!(response.body["family_id"], family_id);

    let response = app
        .request(
            "PATCH",
            &uri,
            Some(json!({"user": {"email": "mom@example.com"}})),
            Some(&mom),
        )
        .await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        response.body["errors"],
        json!(["Email has already been taken"])
    );

    let response = app
        .request(
            "PATCH",
            "/users/9999",
            Some(json!({"user": {"is_admin": true}})),
            Some(&mom),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "User not found"}));
}

#[tokio::test]
async fn test_members_cannot_manage_others() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let mom = app.sign_in("mom@example.com").await;
    let mom_id = app.user_id("mom@example.com").await;
    let kid = app.create_member(&mom, "kid@example.com", json!({})).await;
    let kid_cookie = app.sign_in("kid@example.com").await;
    app.create_family("The Joneses", "dad@example.com").await;
    let outsider = app.sign_in("dad@example.com").await;

    let mom_uri = format!("/users/{mom_id}");
    let response = app
        .request(
            "PATCH",
            &mom_uri,
            Some(json!({"user": {"password": "Pwned99!"}})),
            Some(&kid_cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("DELETE", &mom_uri, None, Some(&kid_cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    // Users of other families look like they do not exist.
    let kid_uri = format!("/users/{}", kid["id"]);
    let response = app
        .request(
            "PATCH",
            &kid_uri,
            Some(json!({"user": {"password": "Pwned99!"}})),
            Some(&outsider),
        )
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app.request("DELETE", &kid_uri, None, Some(&outsider)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    app.sign_in("mom@example.com").await;
    app.sign_in("kid@example.com").await;
}

#[tokio::test]
async fn test_last_admin_is_kept() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let mom = app.sign_in("mom@example.com").await;
    let mom_uri = format!("/users/{}", app.user_id("mom@example.com").await);

    for flag in ["is_admin", "can_view_all_accounts"] {
        let response = app
            .request(
                "PATCH",
                &mom_uri,
                Some(json!({ "user": { flag: false } })),
                Some(&mom),
            )
            .await;
        assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY, "{flag}");
        assert_eq!(
            response.body,
            json!({"errors": ["Family must keep at least one admin"]})
        );
    }

    let response = app.request("DELETE", &mom_uri, None, Some(&mom)).await;
    assert_eq!(response.status, StatusCode::UNPROCESSABLE_ENTITY);

    let me = app.request("GET", "/users/me", None, Some(&mom)).await;
    assert_eq!(me.body["is_admin"], true);
    assert_eq!(me.body["can_view_all_accounts"], true);

    // With a second admin the first may step down.
    app.create_member(
        &mom,
        "dad@example.com",
        json!({"is_admin": true, "can_view_all_accounts": true}),
    )
    .await;
    let response = app
        .request(
            "PATCH",
            &mom_uri,
            Some(json!({"user": {"is_admin": false}})),
            Some(&mom),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["is_admin"], false);
}

#[tokio::test]
async fn test_delete_user() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let cookie = app.sign_in("mom@example.com").await;
    let kid = app.create_member(&cookie, "kid@example.com", json!({})).await;
    let uri = format!("/users/{}", kid["id"]);

    let response = app.request("DELETE", &uri, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert_eq!(response.body, serde_json::Value::Null);

    let response = app.request("DELETE", &uri, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);

    let response = app
        .request(
            "POST",
            "/users/signin",
            Some(json!({"email": "kid@example.com", "password": PASSWORD})),
            None,
        )
        .await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);

    let response = app.request("DELETE", "/users/0", None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_deleted_user_session_is_rejected() {
    let app = spawn_app().await;
    app.create_family("The Smiths", "mom@example.com").await;
    let mom = app.sign_in("mom@example.com").await;
    let kid = app.create_member(&mom, "kid@example.com", json!({})).await;
    let kid_cookie = app.sign_in("kid@example.com").await;

    let response = app
        .request("DELETE", &format!("/users/{}", kid["id"]), None, Some(&mom))
        .await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    let me = app.request("GET", "/users/me", None, Some(&kid_cookie)).await;
    assert_eq!(me.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_delete_family_cascades() {
    let app = spawn_app().await;
    let conn = &app.state.store().conn;
    let family_id = app.create_family("The Smiths", "mom@example.com").await;
    let cookie = app.sign_in("mom@example.com").await;
    app.create_member(&cookie, "kid@example.com", json!({})).await;
    let kid_cookie = app.sign_in("kid@example.com").await;

    let response = app
        .request(
            "POST",
            "/bank_accounts",
            Some(json!({
                "bank_account": {
                    "account_name": "Household",
                    "account_number": "0001",
                    "account_type": "family"
                }
            })),
            Some(&cookie),
        )
        .await;
    assert_eq!(response.status, StatusCode::CREATED);

    app.create_family("The Joneses", "dad@example.com").await;
    let outsider = app.sign_in("dad@example.com").await;

    let uri = format!("/families/{family_id}");
    let response = app.request("DELETE", &uri, None, Some(&outsider)).await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body, json!({"error": "Family not found"}));

    let response = app.request("DELETE", &uri, None, Some(&kid_cookie)).await;
    assert_eq!(response.status, StatusCode::FORBIDDEN);

    let response = app.request("DELETE", &uri, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::NO_CONTENT);

    assert_eq!(Families::find().count(conn).await.unwrap(), 1);
    assert_eq!(Users::find().count(conn).await.unwrap(), 1);
    assert!(
        app.state
            .store()
            .get_user_by_email("kid@example.com")
            .await
            .unwrap()
            .is_none()
    );

    // The admin went with the family, so the session is gone too.
    let response = app.request("DELETE", &uri, None, Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}
