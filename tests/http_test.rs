//! Serve loaded configurations through axum and check the HTTP behaviour.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::json;
use tower::ServiceExt;

use config_router::config::ServerConfig;
use config_router::{Dispatcher, HttpServer, Parser, ParserConfig};

mod common;
use common::{body_json, controllers, empty, middlewares};

const API: &str = r#"
api:
  root: /api
  routes:
    teapot:
      path: /teapot
      methods:
        get: { controller: getTeapot, response_code: 418 }
    users:
      path: /users/:id
      params: { id: number }
      methods:
        get: getUser
        delete: "users:remove"
    signup:
      path: /signup
      pre_middlewares: [auth]
      post_middlewares: [stamp]
      methods:
        post:
          controller: createUser
          response_code: 201
          body:
            name: string
            mail: mail
            admin: { type: boolean, default_value: false }
    conflict:
      path: /conflict
      methods:
        put: fail
"#;

async fn app() -> Router {
    let mut parser = Parser::new(Dispatcher::new(), ParserConfig::default())
        .with_controllers(controllers())
        .with_middlewares(middlewares());
    parser.parse_from_string(API).unwrap();
    parser.load().await.unwrap();
    HttpServer::new(parser.into_router(), ServerConfig::default()).router()
}

fn post(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .header("x-user", "jane")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_teapot_returns_418_without_body() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/api/teapot").body(empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::IM_A_TEAPOT);
    assert_eq!(body_json(response).await, serde_json::Value::Null);
}

#[tokio::test]
async fn test_path_params_are_cast() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/api/users/42?fields=name").body(empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "params": { "id": 42 }, "query": { "fields": "name" } })
    );
}

#[tokio::test]
async fn test_invalid_path_param_is_400() {
    let response = app()
        .await
        .oneshot(Request::builder().uri("/api/users/abc").body(empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], 400);
    assert_eq!(body["error"], "ValidationData");
    assert!(body["message"].as_str().unwrap().contains("abc is not a number"));
}

#[tokio::test]
async fn test_controller_sets_status() {
    let response = app()
        .await
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/api/users/3")
                .body(empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_body_validation_and_middlewares() {
    let response = app()
        .await
        .oneshot(post("/api/signup", json!({ "name": "Jane", "mail": "jane@example.com" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("x-stamped").unwrap(), "yes");
    assert_eq!(
        body_json(response).await,
        json!({
            "created": { "name": "Jane", "mail": "jane@example.com", "admin": false },
            "by": "jane",
        })
    );
}

#[tokio::test]
async fn test_bad_mail_rejected() {
    let response = app()
        .await
        .oneshot(post("/api/signup", json!({ "name": "Jane", "mail": "jane" })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"]
        .as_str()
        .unwrap()
        .contains("MAIL pattern"));
}

#[tokio::test]
async fn test_pre_middleware_can_halt() {
    let request = Request::builder()
        .method("POST")
        .uri("/api/signup")
        .body(Body::from(json!({ "name": "Jane", "mail": "jane@example.com" }).to_string()))
        .unwrap();
    let response = app().await.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("x-stamped").is_none());
}

#[tokio::test]
async fn test_controller_error_rendered() {
    let response = app()
        .await
        .oneshot(Request::builder().method("PUT").uri("/api/conflict").body(empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["message"], "already exists");
}

#[tokio::test]
async fn test_unknown_route_and_wrong_verb_are_404() {
    let app = app().await;
    let response = app
        .clone()
        .oneshot(Request::builder().uri("/api/nothing").body(empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let response = app
        .oneshot(Request::builder().method("POST").uri("/api/teapot").body(empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
