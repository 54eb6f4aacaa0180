use std::sync::Arc;

use axum::Router;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderName, StatusCode, header};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::get;
use blockgate_core::{Cid, StoreError};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use crate::node::Node;

fn streaming_headers() -> [HeaderName; 3] {
    [
        HeaderName::from_static("x-stream-output"),
        HeaderName::from_static("x-chunked-output"),
        HeaderName::from_static("x-content-length"),
    ]
}

/// CORS is enabled on all routes by default; the streaming headers the API
/// uses are both allowed and exposed for cross-origin callers.
fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(streaming_headers())
        .expose_headers(streaming_headers())
}

/// Route table for the read-write API listener.
pub fn api_router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/api/v0/block/get", get(block_get).post(block_get))
        .route("/api/v0/block/stat", get(block_stat).post(block_stat))
        .route("/api/v0/block/rm", get(block_rm).post(block_rm))
        .route("/api/v0/version", get(version).post(version))
        .layer(cors_layer())
        .with_state(node)
}

/// Route table for the read-only gateway listener.
pub fn gateway_router(node: Arc<Node>) -> Router {
    Router::new()
        .route("/ipfs/:cid", get(gateway_block))
        .layer(cors_layer())
        .with_state(node)
}

#[derive(Debug, Deserialize)]
struct BlockArg {
    arg: String,
}

/// Error formatting policy: every failure renders as the API's JSON error
/// body with a status derived from the store-level error class.
#[derive(Debug)]
enum ApiError {
    BadRequest(String),
    Store(StoreError),
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::Store(err)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct ErrorBody {
    message: String,
    code: u32,
    r#type: &'static str,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            ApiError::Store(err) => {
                let status = match &err {
                    StoreError::NotFound(_) => StatusCode::NOT_FOUND,
                    StoreError::InvalidKey { .. } => StatusCode::BAD_REQUEST,
                    StoreError::ReadOnly { .. } => StatusCode::METHOD_NOT_ALLOWED,
                    StoreError::NoMount(_) => StatusCode::INTERNAL_SERVER_ERROR,
                    StoreError::Fetch(_) => StatusCode::BAD_GATEWAY,
                };
                (status, err.to_string())
            }
        };
        (
            status,
            Json(ErrorBody {
                message,
                code: 0,
                r#type: "error",
            }),
        )
            .into_response()
    }
}

fn required_cid(arg: Option<Query<BlockArg>>) -> Result<Cid, ApiError> {
    let Some(Query(BlockArg { arg })) = arg else {
        return Err(ApiError::BadRequest("argument \"key\" is required".to_owned()));
    };
    parse_cid(&arg)
}

fn parse_cid(arg: &str) -> Result<Cid, ApiError> {
    arg.parse()
        .map_err(|err: cid::Error| ApiError::BadRequest(format!("invalid cid '{arg}': {err}")))
}

/// Raw block bytes with the streaming length header the API advertises.
fn block_response(bytes: Bytes) -> Response {
    (
        [
            (header::CONTENT_TYPE, "application/octet-stream".to_owned()),
            (
                HeaderName::from_static("x-content-length"),
                bytes.len().to_string(),
            ),
        ],
        bytes,
    )
        .into_response()
}

async fn block_get(
    State(node): State<Arc<Node>>,
    arg: Option<Query<BlockArg>>,
) -> Result<Response, ApiError> {
    let cid = required_cid(arg)?;
    let bytes = node.block_get(&cid).await?;
    Ok(block_response(bytes))
}

async fn block_stat(
    State(node): State<Arc<Node>>,
    arg: Option<Query<BlockArg>>,
) -> Result<Response, ApiError> {
    let cid = required_cid(arg)?;
    let stat = node.block_stat(&cid).await?;
    Ok(Json(stat).into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct RemovedBlock {
    hash: String,
}

async fn block_rm(
    State(node): State<Arc<Node>>,
    arg: Option<Query<BlockArg>>,
) -> Result<Response, ApiError> {
    let cid = required_cid(arg)?;
    node.block_delete(&cid).await?;
    Ok(Json(RemovedBlock {
        hash: cid.to_string(),
    })
    .into_response())
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct VersionInfo {
    version: &'static str,
}

async fn version() -> Json<VersionInfo> {
    Json(VersionInfo {
        version: env!("CARGO_PKG_VERSION"),
    })
}

async fn gateway_block(
    State(node): State<Arc<Node>>,
    Path(cid): Path<String>,
) -> Result<Response, ApiError> {
    let cid = parse_cid(&cid)?;
    let bytes = node.block_get(&cid).await?;
    Ok(block_response(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::NodeConfig;
    use crate::repo::{CONFIG_FILE, Repo};
    use axum::body::Body;
    use axum::http::Request;
    use tower::util::ServiceExt;

    const SOME_CID: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    fn test_node(dir: &std::path::Path) -> Arc<Node> {
        let mut config = NodeConfig::default();
        config.remote.host = "127.0.0.1".to_owned();
        config.remote.port = 1;
        std::fs::write(dir.join(CONFIG_FILE), toml::to_string(&config).unwrap()).unwrap();
        Arc::new(Node::create(Repo::open(dir).unwrap()))
    }

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn version_endpoint_reports_the_crate_version() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_router(test_node(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v0/version")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["Version"], env!("CARGO_PKG_VERSION"));
    }

    #[tokio::test]
    async fn missing_arg_is_a_bad_request_with_json_error_body() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_router(test_node(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v0/block/get")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["Type"], "error");
        assert!(body["Message"].as_str().unwrap().contains("required"));
    }

    #[tokio::test]
    async fn malformed_cid_is_a_bad_request() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_router(test_node(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v0/block/get?arg=not-a-cid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn block_rm_reports_method_not_allowed_for_the_read_only_mount() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_router(test_node(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v0/block/rm?arg={SOME_CID}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        let body = body_json(response).await;
        assert!(body["Message"].as_str().unwrap().contains("read-only"));
    }

    #[tokio::test]
    async fn unreachable_source_maps_to_bad_gateway() {
        let dir = tempfile::tempdir().unwrap();
        let app = api_router(test_node(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri(format!("/api/v0/block/get?arg={SOME_CID}"))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[tokio::test]
    async fn gateway_rejects_malformed_cids() {
        let dir = tempfile::tempdir().unwrap();
        let app = gateway_router(test_node(dir.path()));

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/ipfs/not-a-cid")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
