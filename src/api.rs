//! API server for scanlens.

use crate::cart::ProductCatalog;
use crate::classifier::Classifier;
use crate::models::ScanRecord;
use crate::processor::process_scan;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use tokio::sync::Semaphore;
use warp::{Filter, Rejection, Reply, http::StatusCode};

/// Shared state handed to every request handler.
pub(crate) struct ApiState {
    pub classifier: Classifier,
    pub catalog: Option<ProductCatalog>,
    /// Limits concurrently handled requests.
    pub semaphore: Semaphore,
}

/// API response structure
#[derive(Serialize, Deserialize)]
struct ApiResponse {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    result: Option<ScanRecord>,
}

#[derive(Deserialize)]
struct ClassifyRequest {
    text: String,
}

/// Batch API request structure
#[derive(Deserialize)]
struct BatchRequest {
    scans: Vec<String>,
}

/// Batch API response structure
#[derive(Serialize)]
struct BatchResponse {
    success: bool,
    message: String,
    results: Vec<ScanRecord>,
}

/// Builds the API routes with rejection handling applied.
pub(crate) fn routes(
    state: Arc<ApiState>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let state_filter = warp::any().map(move || state.clone());

    // Health check endpoint
    let health = warp::path("health")
        .and(warp::path::end())
        .and(warp::get())
        .map(|| {
            warp::reply::json(&ApiResponse {
                success: true,
                message: "Scanlens API is running".to_string(),
                result: None,
            })
        });

    // Single payload classification endpoint
    let classify = warp::path("classify")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(handle_classify);

    // Batch classification endpoint
    let batch = warp::path("batch")
        .and(warp::path::end())
        .and(warp::post())
        .and(warp::body::json())
        .and(state_filter)
        .and_then(handle_batch);

    health.or(classify).or(batch).recover(handle_rejection)
}

/// Start the API server
pub(crate) async fn start_api_server(state: ApiState, port: u16) {
    let routes = routes(Arc::new(state)).with(warp::cors().allow_any_origin());

    tracing::info!("Starting API server on port {}", port);
    warp::serve(routes).run(([0, 0, 0, 0], port)).await;
}

/// Handle a single payload classification request
async fn handle_classify(
    request: ClassifyRequest,
    state: Arc<ApiState>,
) -> Result<impl Reply, Rejection> {
    let _permit = state
        .semaphore
        .acquire()
        .await
        .map_err(|_| warp::reject::custom(ApiError))?;

    tracing::info!("Processing single classification request");
    let record = process_scan(&request.text, &state.classifier, state.catalog.as_ref());

    let (success, message) = if record.skipped {
        (false, "Payload skipped".to_string())
    } else {
        (true, "Payload classified".to_string())
    };
    Ok(warp::reply::json(&ApiResponse {
        success,
        message,
        result: Some(record),
    }))
}

/// Handle a batch classification request
async fn handle_batch(batch: BatchRequest, state: Arc<ApiState>) -> Result<impl Reply, Rejection> {
    tracing::info!("Processing batch of {} scans", batch.scans.len());

    let _permit = state
        .semaphore
        .acquire()
        .await
        .map_err(|_| warp::reject::custom(ApiError))?;

    let results: Vec<ScanRecord> = batch
        .scans
        .iter()
        .map(|raw| process_scan(raw, &state.classifier, state.catalog.as_ref()))
        .collect();

    Ok(warp::reply::json(&BatchResponse {
        success: true,
        message: format!("Processed {} scans", results.len()),
        results,
    }))
}

/// Custom error type for API rejections
#[derive(Debug)]
struct ApiError;

impl warp::reject::Reject for ApiError {}

fn error_reply(message: &str, status: StatusCode) -> warp::reply::WithStatus<warp::reply::Json> {
    warp::reply::with_status(
        warp::reply::json(&ApiResponse {
            success: false,
            message: message.to_string(),
            result: None,
        }),
        status,
    )
}

/// Handle API rejections
async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    if err.is_not_found() {
        Ok(error_reply("Not Found", StatusCode::NOT_FOUND))
    } else if err.find::<ApiError>().is_some() {
        Ok(error_reply("Server error", StatusCode::INTERNAL_SERVER_ERROR))
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        Ok(error_reply("Method not allowed", StatusCode::METHOD_NOT_ALLOWED))
    } else {
        tracing::debug!("Rejecting request: {:?}", err);
        Ok(error_reply("Bad request", StatusCode::BAD_REQUEST))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    fn state() -> Arc<ApiState> {
        Arc::new(ApiState {
            classifier: Classifier::default(),
            catalog: None,
            semaphore: Semaphore::new(2),
        })
    }

    fn body(bytes: &[u8]) -> Value {
        serde_json::from_slice(bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let response = warp::test::request()
            .method("GET")
            .path("/health")
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body(response.body())["success"], true);
    }

    #[tokio::test]
    async fn test_classify_wifi() {
        let response = warp::test::request()
            .method("POST")
            .path("/classify")
            .json(&json!({ "text": "WIFI:S:MyNetwork;T:WPA;P:secret123;;" }))
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body(response.body());
        assert_eq!(value["result"]["result"]["type"], "wifi");
        assert_eq!(value["result"]["result"]["ssid"], "MyNetwork");
        assert_eq!(value["result"]["action"]["action"], "join_wifi");
    }

    #[tokio::test]
    async fn test_classify_blank_is_skipped() {
        let response = warp::test::request()
            .method("POST")
            .path("/classify")
            .json(&json!({ "text": "  " }))
            .reply(&routes(state()))
            .await;
        let value = body(response.body());
        assert_eq!(value["success"], false);
        assert_eq!(value["result"]["skipped"], true);
    }

    #[tokio::test]
    async fn test_batch() {
        let response = warp::test::request()
            .method("POST")
            .path("/batch")
            .json(&json!({ "scans": ["https://example.com/page", "person@example.com", "hi"] }))
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::OK);
        let value = body(response.body());
        let types: Vec<&str> = value["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["result"]["type"].as_str().unwrap())
            .collect();
        assert_eq!(types, vec!["url", "email", "text"]);
    }

    #[tokio::test]
    async fn test_bad_body_and_unknown_path() {
        let response = warp::test::request()
            .method("POST")
            .path("/classify")
            .body("not json")
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = warp::test::request()
            .method("GET")
            .path("/nope")
            .reply(&routes(state()))
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
