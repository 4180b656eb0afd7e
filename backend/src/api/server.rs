//! HTTP server for the tabcheck API.
//!
//! Provides REST endpoints for validating and uploading delimited files
//! against stored or inline schemas.
//!
//! # API Endpoints
//!
//! | Method | Path                 | Description                            |
//! |--------|----------------------|----------------------------------------|
//! | GET    | `/health`            | Health check                           |
//! | POST   | `/api/upload`        | Validate + store a delimited file      |
//! | POST   | `/api/validate`      | Validate only, nothing persisted       |
//! | GET    | `/api/schemas`       | List stored schemas                    |
//! | POST   | `/api/schemas`       | Store a schema definition              |
//! | GET    | `/api/schemas/{id}`  | Fetch one stored schema                |
//! | DELETE | `/api/schemas/{id}`  | Delete a stored schema                 |
//! | GET    | `/api/logs`          | SSE stream for real-time logs          |
//! | GET    | `/files/{key}`       | Stored clean-row exports               |

use axum::{
    extract::{Multipart, Path, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, IntoResponse, Json, Response, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, path::PathBuf, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

use super::logs::LOG_BROADCASTER;
use super::types::{error_response, UploadResponse};
use crate::error::{RegistryError, ServerError};
use crate::registry::SchemaRegistry;
use crate::schema::{validate_definition, SchemaDefinition};
use crate::storage::{BlobStore, LocalBlobStore};
use crate::upload::{process_upload, UploadStatus};

/// Shared server state.
#[derive(Clone)]
struct AppState {
    store: Arc<dyn BlobStore>,
    schemas_dir: PathBuf,
}

impl ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Registry(RegistryError::NotFound(_)) => StatusCode::NOT_FOUND,
            ServerError::Registry(RegistryError::InvalidDefinition(_)) => StatusCode::BAD_REQUEST,
            ServerError::Registry(_) | ServerError::Upload(_) | ServerError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(error_response(&self.to_string()))).into_response()
    }
}

/// Start the HTTP server, keeping uploads and schemas under `data_dir`.
pub async fn start_server(port: u16, data_dir: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let files_dir = data_dir.join("uploads");
    let schemas_dir = data_dir.join("schemas");

    let state = AppState {
        store: Arc::new(LocalBlobStore::new(files_dir.clone())),
        schemas_dir,
    };

    // permissive CORS for development
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    let app = Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/upload", post(upload_file))
        .route("/api/validate", post(validate_file))
        .route("/api/schemas", get(list_schemas).post(create_schema))
        .route("/api/schemas/{id}", get(show_schema).delete(delete_schema))
        .route("/api/logs", get(sse_logs))
        .nest_service("/files", ServeDir::new(files_dir))
        .layer(cors)
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 Tabcheck server running on http://localhost:{}", port);
    println!("   POST   /api/upload       - Validate + store a file");
    println!("   POST   /api/validate     - Validate only");
    println!("   GET    /api/schemas      - List stored schemas");
    println!("   POST   /api/schemas      - Store a schema definition");
    println!("   GET    /api/logs         - SSE log stream");
    println!("   GET    /health           - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tabcheck",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "upload": "POST /api/upload",
            "validate": "POST /api/validate",
            "schemas": "GET/POST /api/schemas",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Pieces of a multipart upload request.
struct UploadParts {
    bytes: Vec<u8>,
    file_name: Option<String>,
    schema_id: Option<String>,
    inline_definition: Option<String>,
}

async fn read_upload_parts(multipart: &mut Multipart) -> Result<UploadParts, ServerError> {
    let mut bytes: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;
    let mut schema_id: Option<String> = None;
    let mut inline_definition: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                file_name = field.file_name().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;
                bytes = Some(data.to_vec());
            }
            "schema" => {
                schema_id = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?,
                );
            }
            "definition" => {
                inline_definition = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?,
                );
            }
            _ => {}
        }
    }

    let bytes = bytes.ok_or_else(|| ServerError::BadRequest("No file provided".to_string()))?;

    Ok(UploadParts {
        bytes,
        file_name,
        schema_id,
        inline_definition,
    })
}

/// Turn the request's schema parts into a definition.
/// An inline definition wins over a stored schema id.
fn resolve_definition(
    state: &AppState,
    parts: &UploadParts,
) -> Result<(SchemaDefinition, Option<String>), ServerError> {
    if let Some(ref json) = parts.inline_definition {
        let definition = SchemaDefinition::from_json(json)
            .map_err(|errors| ServerError::BadRequest(errors.join("; ")))?;
        return Ok((definition, None));
    }

    if let Some(ref id) = parts.schema_id {
        let registry = SchemaRegistry::with_dir(&state.schemas_dir);
        let definition = registry.definition(id)?;
        return Ok((definition, Some(id.clone())));
    }

    Err(ServerError::BadRequest(
        "No schema provided (send a 'schema' id or a 'definition' part)".to_string(),
    ))
}

/// Upload endpoint: validate and, when acceptable, store the clean rows.
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let parts = read_upload_parts(&mut multipart).await?;
    let (definition, schema_id) = resolve_definition(&state, &parts)?;

    println!("\n{}", "=".repeat(70));
    println!(
        "📄 NEW UPLOAD: {} ({} bytes)",
        parts.file_name.as_deref().unwrap_or("unknown"),
        parts.bytes.len()
    );
    println!("{}\n", "=".repeat(70));

    let outcome = process_upload(&parts.bytes, &definition, Some(state.store.as_ref())).await?;

    if let Some(ref id) = schema_id {
        let mut registry = SchemaRegistry::with_dir(&state.schemas_dir);
        registry.update_stats(id, outcome.status != UploadStatus::Rejected);
    }

    Ok(Json(UploadResponse::from_outcome(
        outcome,
        parts.file_name,
        schema_id,
    )))
}

/// Validation endpoint: same request shape as upload, nothing persisted.
async fn validate_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ServerError> {
    let parts = read_upload_parts(&mut multipart).await?;
    let (definition, schema_id) = resolve_definition(&state, &parts)?;

    let outcome = process_upload(&parts.bytes, &definition, None).await?;

    Ok(Json(UploadResponse::from_outcome(
        outcome,
        parts.file_name,
        schema_id,
    )))
}

/// List stored schemas, newest first.
async fn list_schemas(State(state): State<AppState>) -> Json<Value> {
    let registry = SchemaRegistry::with_dir(&state.schemas_dir);
    let mut schemas: Vec<_> = registry.list().into_iter().cloned().collect();
    schemas.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    Json(json!({ "schemas": schemas }))
}

/// Store a schema definition, returning its registry id.
async fn create_schema(
    State(state): State<AppState>,
    Json(body): Json<Value>,
) -> Result<(StatusCode, Json<Value>), ServerError> {
    validate_definition(&body).map_err(|errors| ServerError::BadRequest(errors.join("; ")))?;
    let definition: SchemaDefinition = serde_json::from_value(body)
        .map_err(|e| ServerError::BadRequest(format!("Invalid definition: {}", e)))?;

    let mut registry = SchemaRegistry::with_dir(&state.schemas_dir);
    let id = registry.save(definition).map_err(ServerError::Registry)?;

    Ok((StatusCode::CREATED, Json(json!({ "id": id }))))
}

/// Fetch one stored schema.
async fn show_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ServerError> {
    let registry = SchemaRegistry::with_dir(&state.schemas_dir);
    match registry.get(&id) {
        Some(schema) => Ok(Json(serde_json::to_value(schema).map_err(|e| {
            ServerError::Internal(format!("Serialization error: {}", e))
        })?)),
        None => Err(ServerError::Registry(RegistryError::NotFound(id))),
    }
}

/// Delete a stored schema.
async fn delete_schema(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ServerError> {
    let mut registry = SchemaRegistry::with_dir(&state.schemas_dir);
    registry.delete(&id)?;
    Ok(StatusCode::NO_CONTENT)
}
