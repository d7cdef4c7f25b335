mod common;

use axum::http::{Method, StatusCode};
use common::{ADMIN_EMAIL, PASSWORD, USER_EMAIL, spawn_app, spawn_app_with};
use serde_json::json;

#[tokio::test]
async fn test_hello_is_public() {
    let app = spawn_app().await;

    let (status, body) = app.call(Method::GET, "/", None, None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "hello": "world" }));
}

#[tokio::test]
async fn test_login_and_logout() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/sessions",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["email"], ADMIN_EMAIL);
    assert_eq!(body["username"], "root");
    let token = body["token"].as_str().unwrap().to_string();
    assert!(!token.is_empty());

    let (status, _) = app.call(Method::GET, "/player", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app.call(Method::DELETE, "/sessions", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Successfully signed out");

    let (status, body) = app.call(Method::GET, "/player", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E_UNAUTHORIZED_ACCESS");
}

#[tokio::test]
async fn test_login_rejections() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/sessions",
            None,
            Some(json!({ "email": ADMIN_EMAIL, "password": "wrong" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E_INVALID_CREDENTIALS");
    assert_eq!(body["status"], 401);

    let (status, body) = app
        .call(
            Method::POST,
            "/sessions",
            None,
            Some(json!({ "email": "nobody@signdesk.test", "password": PASSWORD })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E_INVALID_CREDENTIALS");

    let (status, body) = app
        .call(Method::POST, "/sessions", None, Some(json!({ "email": ADMIN_EMAIL })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["password"].is_string());
}

#[tokio::test]
async fn test_bootstrap_admin_can_sign_in() {
    let app = spawn_app().await;
    let token = app.login("admin@signdesk.local", "password").await;

    let (status, body) = app.call(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_protected_routes_require_token() {
    let app = spawn_app().await;

    for (method, uri) in [
        (Method::GET, "/player"),
        (Method::GET, "/html"),
        (Method::GET, "/users/1"),
        (Method::DELETE, "/sessions"),
        (Method::POST, "/defaults"),
        (Method::GET, "/users"),
        (Method::GET, "/admin/state"),
    ] {
        let (status, body) = app.call(method.clone(), uri, None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri}");
        assert_eq!(body["code"], "E_UNAUTHORIZED_ACCESS");
    }

    let (status, _) = app
        .call(Method::GET, "/player", Some("not-a-real-token"), None)
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_expired_access_token_is_rejected() {
    let app = spawn_app_with(|c| c.security.access_token_ttl_minutes = -1).await;
    let token = app.admin_token().await;

    let (status, _) = app.call(Method::GET, "/player", Some(&token), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_admin_routes_forbid_regular_users() {
    let app = spawn_app().await;
    let token = app.user_token().await;

    for (method, uri) in [
        (Method::GET, "/users"),
        (Method::DELETE, "/users/1"),
        (Method::GET, "/admin/state"),
        (Method::GET, "/admin/local-ip"),
    ] {
        let (status, body) = app.call(method.clone(), uri, Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN, "{method} {uri}");
        assert_eq!(body["code"], "E_AUTHORIZATION_FAILURE");
    }

    let (status, _) = app
        .call(
            Method::POST,
            "/users",
            Some(&token),
            Some(json!({ "username": "x", "email": "x@x.io", "password": "abcd" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_user_crud() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            Some(&token),
            Some(json!({ "username": "maria", "email": "maria@signdesk.test", "password": "abcd" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["username"], "maria");
    assert_eq!(body["user"]["isAdmin"], false);
    assert!(body["user"].get("password").is_none());
    let id = body["user"]["id"].as_i64().unwrap();

    let (status, body) = app
        .call(Method::GET, &format!("/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["email"], "maria@signdesk.test");

    let (status, body) = app.call(Method::GET, "/users", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 4);

    let (status, _) = app
        .call(Method::DELETE, &format!("/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = app
        .call(Method::GET, &format!("/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["code"], "NOT_FOUND");

    let (status, _) = app
        .call(Method::DELETE, &format!("/users/{id}"), Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_create_user_validation_and_conflicts() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            Some(&token),
            Some(json!({ "username": "short", "email": "not-an-email", "password": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["errors"]["email"].is_string());
    assert!(body["errors"]["password"].is_string());

    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            Some(&token),
            Some(json!({ "username": "other", "email": USER_EMAIL, "password": "abcd" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "email already in use");

    let (status, body) = app
        .call(
            Method::POST,
            "/users",
            Some(&token),
            Some(json!({ "username": "user", "email": "fresh@signdesk.test", "password": "abcd" })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "username already in use");

    let (status, body) = app
        .call(Method::POST, "/users", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
}

#[tokio::test]
async fn test_update_user_is_self_only() {
    let app = spawn_app().await;
    let token = app.user_token().await;
    let user_id = app.user_id(USER_EMAIL).await;
    let admin_id = app.user_id(ADMIN_EMAIL).await;

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/users/{admin_id}"),
            Some(&token),
            Some(json!({ "username": "hijack" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E_AUTHORIZATION_FAILURE");

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/users/{user_id}"),
            Some(&token),
            Some(json!({ "email": ADMIN_EMAIL })),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "email already in use");

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/users/{user_id}"),
            Some(&token),
            Some(json!({ "username": "renamed", "password": "newpass1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["user"]["username"], "renamed");
    assert_eq!(body["user"]["email"], USER_EMAIL);

    app.login(USER_EMAIL, "newpass1").await;

    let (status, _) = app
        .call(
            Method::PUT,
            "/users/9999",
            Some(&token),
            Some(json!({ "username": "ghost" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_change_password_rules() {
    let app = spawn_app().await;
    let token = app.user_token().await;
    let user_id = app.user_id(USER_EMAIL).await;
    let admin_id = app.user_id(ADMIN_EMAIL).await;
    let uri = format!("/change-password/{user_id}");

    let (status, _) = app
        .call(
            Method::POST,
            "/change-password/9999",
            Some(&token),
            Some(json!({ "oldPassword": PASSWORD, "newPassword": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::POST,
            &format!("/change-password/{admin_id}"),
            Some(&token),
            Some(json!({ "oldPassword": PASSWORD, "newPassword": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app
        .call(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "oldPassword": PASSWORD, "newPassword": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({
                "oldPassword": PASSWORD,
                "newPassword": "another1",
                "confirmPassword": "another2"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({ "oldPassword": "wrong-one", "newPassword": "another1" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["code"], "E_INVALID_CREDENTIALS");

    let (status, body) = app
        .call(
            Method::POST,
            &uri,
            Some(&token),
            Some(json!({
                "oldPassword": PASSWORD,
                "newPassword": "another1",
                "confirmPassword": "another1"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password changed successfully");

    app.login(USER_EMAIL, "another1").await;
}

#[tokio::test]
async fn test_admin_change_password() {
    let app = spawn_app().await;
    let token = app.admin_token().await;
    let user_id = app.user_id(USER_EMAIL).await;

    let (status, _) = app
        .call(
            Method::PUT,
            "/change-password/admin/9999",
            Some(&token),
            Some(json!({ "newPassword": "replaced1" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app
        .call(
            Method::PUT,
            &format!("/change-password/admin/{user_id}"),
            Some(&token),
            Some(json!({ "newPassword": "abc" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = app
        .call(
            Method::PUT,
            &format!("/change-password/admin/{user_id}"),
            Some(&token),
            Some(json!({ "newPassword": "replaced1" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User password has been changed by admin");

    app.login(USER_EMAIL, "replaced1").await;
}

#[tokio::test]
async fn test_forgot_and_reset_password() {
    let app = spawn_app().await;

    let (status, body) = app
        .call(
            Method::POST,
            "/forgot-password",
            None,
            Some(json!({ "email": USER_EMAIL, "resetPasswordUrl": "not a url" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["resetPasswordUrl"].is_string());

    let (status, _) = app
        .call(
            Method::POST,
            "/forgot-password",
            None,
            Some(json!({
                "email": "ghost@signdesk.test",
                "resetPasswordUrl": "http://localhost:5173/reset"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            Method::POST,
            "/forgot-password",
            None,
            Some(json!({
                "email": USER_EMAIL,
                "resetPasswordUrl": "http://localhost:5173/reset"
            })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.get("token").is_none());

    let token = app
        .state
        .auth_service()
        .forgot_password(USER_EMAIL, "http://localhost:5173/reset")
        .await
        .unwrap();

    let (status, _) = app
        .call(
            Method::POST,
            "/reset-password",
            None,
            Some(json!({ "token": "unknown", "newPassword": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = app
        .call(
            Method::POST,
            "/reset-password",
            None,
            Some(json!({ "token": token, "newPassword": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Password has been reset");

    app.login(USER_EMAIL, "fresh-pass").await;

    let (status, _) = app
        .call(
            Method::POST,
            "/reset-password",
            None,
            Some(json!({ "token": token, "newPassword": "again-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_stale_reset_token_is_gone() {
    let app = spawn_app_with(|c| c.security.reset_token_ttl_minutes = -1).await;

    let token = app
        .state
        .auth_service()
        .forgot_password(USER_EMAIL, "http://localhost/reset")
        .await
        .unwrap();

    let (status, body) = app
        .call(
            Method::POST,
            "/reset-password",
            None,
            Some(json!({ "token": token, "newPassword": "fresh-pass" })),
        )
        .await;
    assert_eq!(status, StatusCode::GONE);
    assert_eq!(body["code"], "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_manifest_defaults_and_overrides() {
    let app = spawn_app().await;
    let token = app.user_token().await;

    let (status, body) = app.call(Method::GET, "/manifest", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["defaults"]["imageDurationMs"], 10000);
    assert_eq!(body["defaults"]["schedule"]["tz"], "UTC");
    assert_eq!(body["overrides"], json!([]));

    let (status, body) = app
        .call(
            Method::POST,
            "/defaults",
            Some(&token),
            Some(json!({ "imageDurationMs": 5000, "mute": false })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["defaults"]["imageDurationMs"], 5000);
    assert_eq!(body["defaults"]["mute"], false);
    assert_eq!(body["defaults"]["fitMode"], "fit");

    let (status, body) = app
        .call(Method::POST, "/defaults", Some(&token), Some(json!({ "volume": 3.0 })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["volume"].is_string());

    let src = "/media/a.png";
    let (status, _) = app
        .call(
            Method::POST,
            "/overrides",
            Some(&token),
            Some(json!({ "src": src, "imageDurationMs": 2000 })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = app
        .call(
            Method::POST,
            "/overrides",
            Some(&token),
            Some(json!({ "src": src, "fitMode": "cover" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call(Method::GET, "/manifest", None, None).await;
    let overrides = body["overrides"].as_array().unwrap();
    assert_eq!(overrides.len(), 1);
    assert_eq!(overrides[0]["imageDurationMs"], 2000);
    assert_eq!(overrides[0]["fitMode"], "cover");

    let (status, body) = app
        .call(Method::POST, "/overrides", Some(&token), Some(json!({ "fitMode": "fit" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "src is required");

    let (status, _) = app
        .call(Method::DELETE, "/overrides", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app
        .call(
            Method::DELETE,
            "/overrides?src=%2Fmedia%2Fa.png",
            Some(&token),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = app.call(Method::GET, "/manifest", None, None).await;
    assert_eq!(body["overrides"], json!([]));
    assert_eq!(body["defaults"]["imageDurationMs"], 5000);

    assert!(app.media_path("media.json").exists());
}

#[tokio::test]
async fn test_admin_state_and_local_ip() {
    let app = spawn_app().await;
    let token = app.admin_token().await;

    let (status, body) = app.call(Method::GET, "/admin/state", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["counts"]["users"], 3);
    assert_eq!(body["counts"]["players"], 0);
    assert_eq!(body["counts"]["htmlPlayers"], 0);
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
    assert!(body["mediaFiles"].is_array());
    assert!(body["manifest"]["defaults"].is_object());

    let (status, body) = app
        .call(Method::GET, "/admin/local-ip", Some(&token), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["port"], 3333);
    let ip = body["ip"].as_str().unwrap();
    assert!(ip.parse::<std::net::IpAddr>().is_ok());
    assert_eq!(body["url"], format!("http://{ip}:3333"));
}

#[tokio::test]
async fn test_metrics_endpoint_without_recorder() {
    let app = spawn_app().await;

    let (status, _) = app.call(Method::GET, "/metrics", None, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let app = spawn_app().await;

    let request = axum::http::Request::builder()
        .method(Method::POST)
        .uri("/sessions")
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "BAD_REQUEST");
}

#[tokio::test]
async fn test_request_id_is_echoed() {
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    let app = spawn_app().await;

    let response = app
        .router
        .clone()
        .oneshot(
            Request::builder()
                .uri("/manifest")
                .header("x-request-id", "screen-42")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.headers()["x-request-id"], "screen-42");

    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let generated = response.headers()["x-request-id"].to_str().unwrap();
    assert!(uuid::Uuid::parse_str(generated).is_ok(), "{generated}");
}
