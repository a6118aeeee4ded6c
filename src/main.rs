//! Bazi API - wraps the external calculation engine and parses its report.

mod config;
mod engine;
mod error;
mod report;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use config::ServiceConfig;
use engine::{BirthInput, CalendarType, Gender, ReportEngine, ScriptEngine};
use error::ApiError;
use report::StructuredRecord;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

/// Application state shared across handlers.
#[derive(Clone)]
struct AppState {
    engine: Arc<dyn ReportEngine>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "bazi_api=debug,tower_http=debug".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServiceConfig::from_env()?;
    info!(
        "Engine: {} {} (timeout {}s)",
        config.engine_program, config.engine_script, config.engine_timeout_secs
    );

    let state = AppState {
        engine: Arc::new(ScriptEngine::from_config(&config)),
    };
    let app = router(state, config.body_limit_bytes);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server listening on http://{}", config.bind_addr);
    axum::serve(listener, app).await?;

    Ok(())
}

fn router(state: AppState, body_limit: usize) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/api/health", get(api_health))
        .route("/api/calculate", post(calculate))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ============================================================================
// Handlers
// ============================================================================

async fn index() -> &'static str {
    "Bazi Calculator API\n\
     \n\
     POST /api/calculate\n\
     {\"year\": 1990, \"month\": 5, \"day\": 15, \"hour\": 14, \
     \"gender\": \"male\", \"calendar_type\": \"gregorian\"}\n"
}

/// Health check endpoint.
async fn health() -> &'static str {
    "ok"
}

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
    service: &'static str,
    version: &'static str,
}

async fn api_health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        timestamp: chrono::Utc::now().to_rfc3339(),
        service: "Bazi Calculator API",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// Request body. Required fields are optional here so a missing one can be
/// reported by name instead of as a generic deserialization failure.
#[derive(Debug, Deserialize)]
struct CalculateRequest {
    year: Option<i32>,
    month: Option<u32>,
    day: Option<u32>,
    hour: Option<u32>,
    #[serde(default)]
    gender: Gender,
    #[serde(default)]
    calendar_type: CalendarType,
}

impl CalculateRequest {
    fn into_input(self) -> Result<BirthInput, ApiError> {
        let year = self.year.ok_or(ApiError::MissingField("year"))?;
        let month = self.month.ok_or(ApiError::MissingField("month"))?;
        let day = self.day.ok_or(ApiError::MissingField("day"))?;
        let hour = self.hour.ok_or(ApiError::MissingField("hour"))?;

        if !(1900..=2100).contains(&year) {
            return Err(ApiError::Validation("年份必须在1900到2100之间".to_string()));
        }
        if !(1..=12).contains(&month) {
            return Err(ApiError::Validation("月份必须在1到12之间".to_string()));
        }
        if !(1..=31).contains(&day) {
            return Err(ApiError::Validation("日期必须在1到31之间".to_string()));
        }
        if hour > 23 {
            return Err(ApiError::Validation("时辰必须在0到23之间".to_string()));
        }

        Ok(BirthInput {
            year,
            month,
            day,
            hour,
            gender: self.gender,
            calendar: self.calendar_type,
        })
    }
}

#[derive(Serialize)]
struct CalculateResponse {
    success: bool,
    request_id: Uuid,
    data: StructuredRecord,
    timestamp: String,
}

/// Run the engine for one birth date and parse its report.
async fn calculate(
    State(state): State<AppState>,
    body: Result<Json<CalculateRequest>, JsonRejection>,
) -> Result<Json<CalculateResponse>, ApiError> {
    let Json(request) = body.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let input = request.into_input()?;

    let request_id = Uuid::new_v4();
    info!("[{}] Calculating for {:?} via {}", request_id, input, state.engine.name());

    let output = state.engine.run(&input).await.map_err(|e| {
        error!("[{}] Engine failed: {}", request_id, e);
        ApiError::from(e)
    })?;

    let data = report::parse_report(&output).map_err(|e| {
        error!("[{}] Report parsing failed: {}", request_id, e);
        ApiError::from(e)
    })?;

    info!("[{}] Calculation complete", request_id);
    Ok(Json(CalculateResponse {
        success: true,
        request_id,
        data,
        timestamp: chrono::Utc::now().to_rfc3339(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use engine::EngineError;
    use http_body_util::BodyExt;
    use std::sync::Mutex;
    use tower::ServiceExt;

    const REPORT: &str = "公历: 1990年5月15日 农历: 1990年4月21日\n四柱：庚午 辛巳 庚辰 癸未\n强弱:25 中值30\n";

    /// Engine that returns a canned result and records what it was asked.
    struct FakeEngine {
        result: Result<String, (Option<i32>, String, String)>,
        seen: Mutex<Vec<BirthInput>>,
    }

    impl FakeEngine {
        fn ok(output: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Ok(output.to_string()),
                seen: Mutex::new(Vec::new()),
            })
        }

        fn failing(stderr: &str, stdout: &str) -> Arc<Self> {
            Arc::new(Self {
                result: Err((Some(1), stderr.to_string(), stdout.to_string())),
                seen: Mutex::new(Vec::new()),
            })
        }
    }

    #[async_trait::async_trait]
    impl ReportEngine for FakeEngine {
        fn name(&self) -> &str {
            "fake"
        }

        async fn run(&self, input: &BirthInput) -> Result<String, EngineError> {
            self.seen.lock().unwrap().push(input.clone());
            match &self.result {
                Ok(out) => Ok(out.clone()),
                Err((status, stderr, stdout)) => Err(EngineError::Failed {
                    status: *status,
                    stderr: stderr.clone(),
                    stdout: stdout.clone(),
                }),
            }
        }
    }

    fn app(engine: Arc<dyn ReportEngine>) -> Router {
        router(AppState { engine }, 64 * 1024)
    }

    async fn post_json(app: Router, body: &str) -> (StatusCode, serde_json::Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/calculate")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_calculate_success() {
        let engine = FakeEngine::ok(REPORT);
        let (status, json) = post_json(
            app(engine.clone()),
            r#"{"year": 1990, "month": 5, "day": 15, "hour": 14, "gender": "female"}"#,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["success"], true);
        assert_eq!(json["data"]["four_pillars"]["year"], "庚午");
        assert_eq!(json["data"]["basic_info"]["lunar_date"], "1990年4月21日");
        assert_eq!(json["data"]["five_elements"]["weak"], true);
        assert_eq!(json["data"]["raw_output"], REPORT);

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen[0].gender, Gender::Female);
        assert_eq!(seen[0].calendar, CalendarType::Gregorian);
    }

    #[tokio::test]
    async fn test_missing_field() {
        let engine = FakeEngine::ok(REPORT);
        let (status, json) =
            post_json(app(engine.clone()), r#"{"year": 1990, "month": 5, "day": 15}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"], "缺少必需参数: hour");
        assert_eq!(json["kind"], "validation");
        assert!(engine.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_out_of_range() {
        let (status, json) = post_json(
            app(FakeEngine::ok(REPORT)),
            r#"{"year": 1990, "month": 13, "day": 15, "hour": 14}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["kind"], "validation");
    }

    #[tokio::test]
    async fn test_malformed_json() {
        let (status, json) = post_json(app(FakeEngine::ok(REPORT)), "{not json").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["success"], false);
    }

    #[tokio::test]
    async fn test_engine_failure_never_parsed() {
        let (status, json) = post_json(
            app(FakeEngine::failing("Traceback: boom", "四柱：甲子 乙丑 丙寅 丁卯")),
            r#"{"year": 1990, "month": 5, "day": 15, "hour": 14}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
        assert_eq!(json["kind"], "engine");
        assert_eq!(json["error"], "计算失败: Traceback: boom");
        assert_eq!(json["raw_output"], "四柱：甲子 乙丑 丙寅 丁卯");
        assert!(json.get("data").is_none());
    }

    #[tokio::test]
    async fn test_api_health() {
        let request = Request::builder()
            .uri("/api/health")
            .body(Body::empty())
            .unwrap();
        let response = app(FakeEngine::ok("")).oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(json["status"], "healthy");
    }
}
