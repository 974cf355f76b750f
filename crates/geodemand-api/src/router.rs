use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))
        // Recompute
        .route("/api/v1/recompute", post(handlers::recompute_range))
        .route("/api/v1/recompute/{date}", post(handlers::recompute_date))
        .route("/api/v1/recompute/{date}/background", post(handlers::recompute_date_background))
        // Forecast reads
        .route("/api/v1/zones", get(handlers::get_zones))
        .route("/api/v1/heatmap", get(handlers::get_heatmap))
        .route("/api/v1/recommendations", get(handlers::get_recommendations))
        // Run history
        .route("/api/v1/runs", get(handlers::list_runs))
        .route("/api/v1/runs/{run_id}", get(handlers::get_run))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use chrono::{FixedOffset, TimeZone, Utc};
    use geodemand_core::config::PipelineSettings;
    use geodemand_core::models::{Coordinate, DeliveryEvent, Earnings, EventId};
    use geodemand_llm::OfflineNarrator;
    use geodemand_pipeline::{BatchOrchestrator, PipelineStores};
    use geodemand_store::MemoryEventStore;
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    fn test_state() -> Arc<AppState> {
        let kst = FixedOffset::east_opt(9 * 3600).unwrap();
        let events = (0..12)
            .map(|i| DeliveryEvent {
                id: EventId::new(),
                pickup: Coordinate::new(37.5, 127.035),
                completed_at: kst
                    .with_ymd_and_hms(2024, 5, 18 + i, 19, 0, 0)
                    .unwrap()
                    .with_timezone(&Utc),
                earnings: Earnings { base_fee: 3500.0, tip: 500.0, bonus: 0.0 },
                duration_minutes: 15.0,
                rating: Some(5.0),
            })
            .collect();

        let now = kst.with_ymd_and_hms(2024, 5, 31, 9, 0, 0).unwrap().with_timezone(&Utc);
        let orchestrator = BatchOrchestrator::new(
            PipelineStores::in_memory_with(MemoryEventStore::with_events(events)),
            Arc::new(OfflineNarrator),
            PipelineSettings::default(),
        )
        .with_clock(Arc::new(move || now));

        Arc::new(AppState::new(orchestrator))
    }

    fn post(uri: &str, body: Body) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(body)
            .unwrap()
    }

    fn get(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    async fn json(resp: axum::response::Response) -> Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = create_router(test_state());
        let resp = app.oneshot(get("/health")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(json(resp).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_recompute_then_read_zones() {
        let app = create_router(test_state());

        let request = post("/api/v1/recompute/2024-05-30", Body::empty());
        let resp = app.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let summary = json(resp).await;
        assert_eq!(summary["zones"], 1);

        let resp = app.clone().oneshot(get("/api/v1/zones?date=2024-05-30")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let zones = json(resp).await;
        assert_eq!(zones["type"], "FeatureCollection");
        let feature = &zones["features"][0];
        assert_eq!(feature["geometry"]["type"], "Polygon");
        assert_eq!(feature["properties"]["name"], "Zone 37.500, 127.035");
        assert_eq!(feature["properties"]["hourly"][0]["hour"], 19);

        let resp = app.clone().oneshot(get("/api/v1/heatmap?date=2024-05-30")).await.unwrap();
        assert_eq!(json(resp).await["features"].as_array().unwrap().len(), 1);

        let resp = app.oneshot(get("/api/v1/runs?limit=5")).await.unwrap();
        let runs = json(resp).await;
        assert_eq!(runs.as_array().unwrap().len(), 1);
        assert_eq!(runs[0]["status"], "completed");
    }

    #[tokio::test]
    async fn test_range_validation_is_bad_request() {
        let app = create_router(test_state());
        let body = serde_json::json!({ "start": "2024-05-30", "end": "2024-05-01" });

        let resp = app
            .oneshot(post("/api/v1/recompute", Body::from(body.to_string())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(resp).await["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_range_recompute() {
        let app = create_router(test_state());
        let body = serde_json::json!({ "start": "2024-05-28", "end": "2024-05-30" });

        let resp = app
            .oneshot(post("/api/v1/recompute", Body::from(body.to_string())))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let report = json(resp).await;
        assert_eq!(report["status"], "completed");
        assert_eq!(report["completed"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_bad_date_and_unknown_run() {
        let app = create_router(test_state());

        let request = post("/api/v1/recompute/30-05-2024", Body::empty());
        let resp = app.clone().oneshot(request).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app.clone().oneshot(get("/api/v1/runs/not-a-uuid")).await.unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(get("/api/v1/runs/6f1c1f5e-8d1a-4c3e-9a43-0d3b2a1f0e11"))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_date_at_calendar_edge_is_bad_request() {
        let state = test_state();
        let app = create_router(state.clone());

        let resp = app
            .clone()
            .oneshot(post("/api/v1/recompute/-262143-01-05", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = app
            .oneshot(post("/api/v1/recompute/-262143-01-05/background", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        assert!(state.stores().runs.recent_runs(10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_background_recompute_is_accepted() {
        let state = test_state();
        let app = create_router(state.clone());

        let resp = app
            .oneshot(post("/api/v1/recompute/2024-05-30/background", Body::empty()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);
        let body = json(resp).await;
        assert_eq!(body["status"], "accepted");
        assert!(body["run_id"].as_str().is_some());
    }
}
