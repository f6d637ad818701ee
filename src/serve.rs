use axum::{
    body::Bytes,
    extract::{ConnectInfo, Query, State},
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use fs2::FileExt;
use log::error;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fs::File;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;

use crate::clock;
use crate::config::ServerConfig;
use crate::content::{self, NewContent};
use crate::credentials;
use crate::media::MediaStore;
use crate::playlist;
use crate::presence::{self, PresenceStore};
use crate::purge::spawn_purge_scheduler;

// State shared by all handlers
pub struct AppState {
    pub pool: sqlx::SqlitePool,
    pub presence: Arc<PresenceStore>,
    pub media: MediaStore,
    pub operator_token: String,
    pub online_threshold_ms: i64,
}

/// Check the operator bearer token; auth beyond this opaque comparison is an
/// external concern
fn require_operator(headers: &HeaderMap, state: &AppState) -> Result<(), (StatusCode, String)> {
    let supplied = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    match supplied {
        Some(token) if token == state.operator_token => Ok(()),
        Some(_) => Err((StatusCode::FORBIDDEN, "Invalid operator token".to_string())),
        None => Err((
            StatusCode::UNAUTHORIZED,
            "Missing operator token".to_string(),
        )),
    }
}

/// Build the API router; the caller supplies CORS and serves it
pub fn router(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(state.media.root().to_path_buf());

    Router::new()
        .route("/api/time", get(time_handler))
        .route("/api/player", get(active_playlist_handler))
        .route("/api/player/playlist", post(save_playlist_handler))
        .route("/api/player/statuses", get(statuses_handler))
        .route("/api/player/ping", post(ping_handler))
        .route("/api/content", get(content_list_handler))
        .route("/api/content/upload", post(content_upload_handler))
        .nest_service("/uploads", uploads)
        .with_state(state)
}

#[derive(Serialize)]
struct TimeResponse {
    now: i64,
    iso: String,
}

// Server time in UTC milliseconds plus ISO string; clients use it once per
// session to compute a cosmetic drift offset
async fn time_handler() -> impl IntoResponse {
    let now = clock::now_ms();
    Json(TimeResponse {
        now,
        iso: clock::to_iso(now),
    })
}

#[derive(Deserialize, Default)]
struct PingBody {
    #[serde(rename = "playerId")]
    player_id: Option<String>,
    info: Option<Value>,
}

// Heartbeat ingest; players are pre-trusted by network placement so there is
// no auth here. Identity falls back to the caller's address.
async fn ping_handler(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    body: Option<Json<PingBody>>,
) -> impl IntoResponse {
    let body = body.map(|Json(b)| b).unwrap_or_default();
    let player_id = body
        .player_id
        .filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| addr.ip().to_string());
    let info = body.info.unwrap_or(Value::Null);

    state.presence.record(&player_id, info);

    Json(json!({ "ok": true }))
}

#[derive(Serialize)]
struct PlayerStatus {
    #[serde(rename = "playerId")]
    player_id: String,
    #[serde(rename = "lastSeen")]
    last_seen_ms: i64,
    online: bool,
    info: Value,
}

// Presence listing for operators; online is derived against the clock at
// read time, never stored
async fn statuses_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = require_operator(&headers, &state) {
        return e.into_response();
    }

    let now = clock::now_ms();
    let mut statuses: Vec<PlayerStatus> = state
        .presence
        .snapshot()
        .into_iter()
        .map(|(player_id, record)| PlayerStatus {
            player_id,
            last_seen_ms: record.last_seen_ms,
            online: presence::is_online(record.last_seen_ms, state.online_threshold_ms, now),
            info: record.info,
        })
        .collect();
    statuses.sort_by(|a, b| a.player_id.cmp(&b.player_id));

    Json(statuses).into_response()
}

// Active playlist for players, enriched and filtered; unauthenticated
async fn active_playlist_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let media = state.media.clone();
    match playlist::resolve_active_for_playback(
        &state.pool,
        move |stored| media.public_url(stored),
        clock::now_ms(),
    )
    .await
    {
        Ok(served) => Json(served).into_response(),
        Err(e) => {
            error!("Failed to resolve active playlist: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct SavePlaylistBody {
    playlist: Vec<playlist::PlaylistEntryInput>,
}

// Replace the active playlist; validation is all-or-nothing before any write
async fn save_playlist_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: Option<Json<SavePlaylistBody>>,
) -> impl IntoResponse {
    if let Err(e) = require_operator(&headers, &state) {
        return e.into_response();
    }

    let Some(Json(body)) = body else {
        return (StatusCode::BAD_REQUEST, "Invalid playlist".to_string()).into_response();
    };

    let entries = match playlist::validate_entries(&body.playlist) {
        Ok(entries) => entries,
        Err(message) => return (StatusCode::BAD_REQUEST, message).into_response(),
    };

    match playlist::replace_active(&state.pool, "active", &entries, clock::now_ms()).await {
        Ok(id) => Json(json!({ "ok": true, "id": id })).into_response(),
        Err(e) => {
            error!("Failed to replace active playlist: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            )
                .into_response()
        }
    }
}

// Media library listing for the admin UI, newest first
async fn content_list_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    if let Err(e) = require_operator(&headers, &state) {
        return e.into_response();
    }

    match content::list(&state.pool).await {
        Ok(items) => Json(items).into_response(),
        Err(e) => {
            error!("Failed to list content: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Database error: {}", e),
            )
                .into_response()
        }
    }
}

#[derive(Deserialize)]
struct UploadQuery {
    filename: String,
    #[serde(rename = "expiryAt")]
    expiry_at_ms: Option<i64>,
}

// Minimal ingest: the raw request body is the file payload. Multipart
// framing and the rest of upload transport live outside this core.
async fn content_upload_handler(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<UploadQuery>,
    body: Bytes,
) -> impl IntoResponse {
    if let Err(e) = require_operator(&headers, &state) {
        return e.into_response();
    }

    if body.is_empty() {
        return (StatusCode::BAD_REQUEST, "No file uploaded".to_string()).into_response();
    }

    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let created_at_ms = clock::now_ms();
    let stored_name = state.media.generate_stored_name(&query.filename, created_at_ms);

    if let Err(e) = state.media.save(&stored_name, &body).await {
        error!("Failed to store upload '{}': {}", query.filename, e);
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to save content: {}", e),
        )
            .into_response();
    }

    let new = NewContent {
        original_name: query.filename,
        stored_name,
        mime_type,
        file_size: body.len() as i64,
        uploader: None,
        created_at_ms,
        expiry_at_ms: query.expiry_at_ms,
    };

    match content::insert(&state.pool, new).await {
        Ok(item) => Json(item).into_response(),
        Err(e) => {
            error!("Failed to save content record: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to save content: {}", e),
            )
                .into_response()
        }
    }
}

fn build_cors(config: &ServerConfig) -> CorsLayer {
    match &config.allowed_origins {
        Some(origins) => {
            let parsed: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| HeaderValue::from_str(o).ok())
                .collect();
            CorsLayer::new()
                .allow_origin(parsed)
                .allow_methods(Any)
                .allow_headers(Any)
        }
        None => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
}

/// Run the signage server until interrupted
pub fn serve(config: ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    std::fs::create_dir_all(&config.data_dir).map_err(|e| {
        format!(
            "Failed to create data directory '{}': {}",
            config.data_dir.display(),
            e
        )
    })?;

    // Acquire exclusive lock to prevent multiple instances; two servers on
    // one data dir would run two purge schedulers against the same items
    let lock_path = config.data_dir.join("signage_server.lock");
    let lock_file = File::create(&lock_path)
        .map_err(|e| format!("Failed to create lock file '{}': {}", lock_path.display(), e))?;
    lock_file.try_lock_exclusive().map_err(|_| {
        format!(
            "Another instance is already serving from '{}'. Lock file: {}",
            config.data_dir.display(),
            lock_path.display()
        )
    })?;
    // Lock is held until lock_file is dropped (end of function)

    let creds = credentials::load_credentials()?;
    let operator_token =
        credentials::get_operator_token(&creds, &config.operator_credential_profile)?;

    println!("Listening on: http://[::]:{} (IPv4 + IPv6)", config.port);
    println!("Endpoints:");
    println!("  GET  /api/time  - server clock (ms + ISO)");
    println!("  POST /api/player/ping  - player heartbeat");
    println!("  GET  /api/player/statuses  - player presence (operator)");
    println!("  GET  /api/player  - active playlist for playback");
    println!("  POST /api/player/playlist  - replace active playlist (operator)");
    println!("  GET  /api/content  - media library (operator)");
    println!("  POST /api/content/upload  - media ingest (operator)");
    println!("  GET  /uploads/<file>  - static media");

    // Create tokio runtime and run server
    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let pool = crate::db::open_database_pool(&config.data_dir, &config.db_name)
            .await
            .map_err(|e| format!("Failed to open database: {}", e))?;
        crate::db::init_database_schema(&pool)
            .await
            .map_err(|e| format!("Failed to initialize database schema: {}", e))?;
        crate::db::check_database_version(&pool)
            .await
            .map_err(|e| e.to_string())?;

        let media = MediaStore::open(config.media_dir()).map_err(|e| e.to_string())?;
        let presence = Arc::new(PresenceStore::new());

        let state = Arc::new(AppState {
            pool: pool.clone(),
            presence,
            media: media.clone(),
            operator_token,
            online_threshold_ms: config.online_threshold_ms,
        });

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let scheduler = spawn_purge_scheduler(
            pool,
            media,
            Duration::from_secs(config.purge_interval_secs),
            shutdown_rx,
        );

        let app = router(state).layer(build_cors(&config));

        let listener = tokio::net::TcpListener::bind(format!("[::]:{}", config.port))
            .await
            .map_err(|e| format!("Failed to bind to port {}: {}", config.port, e))?;
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| format!("Server error: {}", e))?;

        // Signal the scheduler and wait; an in-flight purge pass finishes
        // rather than being cut off mid-item
        let _ = shutdown_tx.send(true);
        let _ = scheduler.await;

        Ok::<(), Box<dyn std::error::Error + Send + Sync>>(())
    })
}
