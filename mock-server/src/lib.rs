use std::collections::HashMap;
use std::time::Instant;

use axum::{
    extract::{
        multipart::{MultipartError, MultipartRejection},
        rejection::{FormRejection, JsonRejection},
        FromRequest, Multipart, Path, Query, Request,
    },
    http::{header::CONTENT_TYPE, HeaderMap, Method, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{error, info};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct User {
    pub id: u32,
    pub firstname: String,
    pub lastname: String,
    pub age: u32,
}

/// Ways the generic handler refuses a request. Each renders as a 4xx.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Json(#[from] JsonRejection),

    #[error(transparent)]
    Form(#[from] FormRejection),

    #[error(transparent)]
    Multipart(#[from] MultipartRejection),

    #[error(transparent)]
    MultipartField(#[from] MultipartError),

    #[error("missing file field `{0}`")]
    MissingFile(&'static str),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!(error = %self, "request rejected");
        match self {
            ApiError::Json(rejection) => rejection.into_response(),
            ApiError::Form(rejection) => rejection.into_response(),
            ApiError::Multipart(rejection) => rejection.into_response(),
            ApiError::MultipartField(err) => {
                (StatusCode::BAD_REQUEST, err.to_string()).into_response()
            }
            ApiError::MissingFile(field) => {
                (StatusCode::BAD_REQUEST, format!("missing file field `{field}`")).into_response()
            }
        }
    }
}

pub fn app() -> Router {
    Router::new()
        .route("/", get(generic_handler).post(generic_handler))
        .route(
            "/{id}",
            get(generic_handler)
                .put(generic_handler)
                .patch(generic_handler)
                .delete(generic_handler),
        )
        .layer(middleware::from_fn(log_request))
}

/// One `info` event per request with method, URI, status and latency.
async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let started = Instant::now();
    let response = next.run(request).await;
    info!(
        %method,
        %uri,
        status = response.status().as_u16(),
        latency_us = started.elapsed().as_micros() as u64,
        "request"
    );
    response
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

/// One handler for every route, dispatching on the request method.
///
/// - `POST` greets form and multipart submissions, echoes JSON with 201.
/// - `PUT` and `PATCH` bind a JSON `User` and answer 204.
/// - `DELETE` answers 202.
/// - Anything else is a read: 200 with a fixed user when `id` is bound.
pub async fn generic_handler(
    method: Method,
    params: Option<Path<HashMap<String, String>>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    request: Request,
) -> Result<Response, ApiError> {
    let params = params.map(|Path(p)| p).unwrap_or_default();
    info!(?headers, "headers");

    match method {
        Method::POST => {
            info!("POST /");
            let content_type = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .unwrap_or_default();

            if content_type.starts_with("application/x-www-form-urlencoded") {
                let Form(user) = Form::<User>::from_request(request, &()).await?;
                let greeting = format!("Hello {}", user.firstname);
                return Ok((StatusCode::CREATED, greeting).into_response());
            }

            if content_type.starts_with("multipart/form") {
                let mut multipart = Multipart::from_request(request, &()).await?;
                let mut firstname = String::new();
                let mut filename = None;
                while let Some(field) = multipart.next_field().await? {
                    let name = field.name().map(str::to_owned);
                    match name.as_deref() {
                        Some("firstname") => firstname = field.text().await?,
                        Some("bio") => filename = field.file_name().map(str::to_owned),
                        _ => {}
                    }
                }
                let filename = filename.ok_or(ApiError::MissingFile("bio"))?;
                return Ok((
                    StatusCode::CREATED,
                    format!("Hello {firstname} ! Your file {filename} is up."),
                )
                    .into_response());
            }

            let Json(user) = Json::<User>::from_request(request, &()).await?;
            Ok((StatusCode::CREATED, Json(user)).into_response())
        }
        Method::PUT | Method::PATCH => {
            info!("{method} /:id");
            let Json(user) = Json::<User>::from_request(request, &()).await?;
            info!(?user, "bound user");
            Ok(StatusCode::NO_CONTENT.into_response())
        }
        Method::DELETE => {
            info!("DELETE /:id");
            Ok((StatusCode::ACCEPTED, Json(User::default())).into_response())
        }
        _ => {
            info!(?query, ?params, "GET /");
            let user = match params.get("id") {
                Some(id) if !id.is_empty() => User {
                    id: 1,
                    firstname: "Yosuke".to_string(),
                    lastname: "Loking".to_string(),
                    age: 30,
                },
                _ => User::default(),
            };
            Ok(Json(user).into_response())
        }
    }
}
