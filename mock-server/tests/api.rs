use axum::http::{self, Request, StatusCode};
use http_body_util::BodyExt;
use mock_server::{app, User};
use tower::ServiceExt;

async fn body_json<T: serde::de::DeserializeOwned>(response: axum::response::Response) -> T {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_bytes(response: axum::response::Response) -> bytes::Bytes {
    response.into_body().collect().await.unwrap().to_bytes()
}

fn json_request(method: &str, uri: &str, body: &str) -> Request<String> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(http::header::CONTENT_TYPE, "application/json")
        .body(body.to_string())
        .unwrap()
}

// --- get ---

#[tokio::test]
async fn get_root_returns_empty_user() {
    let resp = app()
        .oneshot(Request::builder().uri("/").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user, User::default());
}

#[tokio::test]
async fn get_by_id_returns_fixed_user() {
    let resp = app()
        .oneshot(Request::builder().uri("/1").body(String::new()).unwrap())
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
    let user: User = body_json(resp).await;
    assert_eq!(user.id, 1);
    assert_eq!(user.lastname, "Loking");
}

// --- post ---

#[tokio::test]
async fn post_json_returns_201_with_user() {
    let resp = app()
        .oneshot(json_request("POST", "/", r#"{"firstname":"Josué","age":30}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    let user: User = body_json(resp).await;
    assert_eq!(user.firstname, "Josué");
    assert_eq!(user.age, 30);
}

#[tokio::test]
async fn post_form_greets() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(http::header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body("firstname=Kim&lastname=Kouka".to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::CREATED);
    assert_eq!(body_bytes(resp).await, "Hello Kim");
}

#[tokio::test]
async fn post_multipart_without_file_returns_400() {
    let body = "--b\r\nContent-Disposition: form-data; name=\"firstname\"\r\n\r\nKim\r\n--b--\r\n";
    let resp = app()
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/")
                .header(http::header::CONTENT_TYPE, "multipart/form-data; boundary=b")
                .body(body.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

// --- put / patch ---

#[tokio::test]
async fn put_returns_204() {
    let resp = app()
        .oneshot(json_request("PUT", "/1", r#"{"firstname":"Josué"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::NO_CONTENT);
    assert!(body_bytes(resp).await.is_empty());
}

#[tokio::test]
async fn patch_malformed_json_returns_400() {
    let resp = app()
        .oneshot(json_request("PATCH", "/1", r#"{"firstname":"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn put_wrong_field_type_returns_422() {
    let resp = app()
        .oneshot(json_request("PUT", "/1", r#"{"age":"thirty"}"#))
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn put_without_content_type_returns_415() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("PUT")
                .uri("/1")
                .body(r#"{"firstname":"Josué"}"#.to_string())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::UNSUPPORTED_MEDIA_TYPE);
}

// --- delete ---

#[tokio::test]
async fn delete_returns_202() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/1")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::ACCEPTED);
}

// --- routing ---

#[tokio::test]
async fn delete_root_is_not_routed() {
    let resp = app()
        .oneshot(
            Request::builder()
                .method("DELETE")
                .uri("/")
                .body(String::new())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::METHOD_NOT_ALLOWED);
}
