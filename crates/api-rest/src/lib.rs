//! # API REST
//!
//! REST API implementation for the clinic intake form.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, multipart uploads, CORS)
//!
//! Uses `api-shared` for request/response bodies and `intake-core` for all form state.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path as AxumPath, State},
    http::StatusCode,
    response::Json,
    routing::{get, patch, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{
    AddSymptomReq, CommonSymptomsRes, HealthRes, HealthService, ListSessionsRes, PreviewReq,
    UpdateImageReq, UpdatePatientReq, UpdateSymptomReq, UpdateVitalReq,
};
use intake_core::{
    AnalysisStatus, AnalysisTicket, CommonSymptom, CriticalAlert, DiagnosisRecord,
    DiagnosisSeverity, EntryId, FileSelection, Gender, ImageSnapshot, ImageType, IntakeError,
    IntakeService, IntakeUpdate, Likelihood, MedicalImage, PatientRecord, RankedDiagnosis,
    ResultView, SectionSnapshot, SessionSummary, SessionView, SharedSession, StatusBanner,
    SymptomCollector, SymptomEntry, SymptomSeverity, SymptomSnapshot, VitalSigns,
};

/// Application state shared across REST API handlers
#[derive(Clone)]
struct AppState {
    service: IntakeService,
}

type ApiError = (StatusCode, String);

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        common_symptoms,
        create_session,
        list_sessions,
        get_session,
        close_session,
        update_patient,
        update_vitals,
        add_symptom,
        update_symptom,
        remove_symptom,
        add_images,
        update_image,
        remove_image,
        set_preview,
        clear_preview,
        trigger_analysis,
        cancel_analysis,
        results,
        status_banner,
    ),
    components(schemas(
        HealthRes,
        CommonSymptomsRes,
        ListSessionsRes,
        UpdatePatientReq,
        UpdateVitalReq,
        AddSymptomReq,
        UpdateSymptomReq,
        UpdateImageReq,
        PreviewReq,
        SessionView,
        SessionSummary,
        PatientRecord,
        Gender,
        SymptomSnapshot,
        SymptomEntry,
        SymptomSeverity,
        VitalSigns,
        CommonSymptom,
        ImageSnapshot,
        MedicalImage,
        ImageType,
        AnalysisStatus,
        AnalysisTicket,
        DiagnosisRecord,
        DiagnosisSeverity,
        ResultView,
        RankedDiagnosis,
        CriticalAlert,
        Likelihood,
        StatusBanner,
    ))
)]
struct ApiDoc;

/// The generated OpenAPI document.
pub fn openapi() -> utoipa::openapi::OpenApi {
    ApiDoc::openapi()
}

/// Builds the REST router over an intake service.
///
/// Image uploads carry no size cap, so the default body limit is lifted on that route only.
pub fn router(service: IntakeService) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/symptoms/common", get(common_symptoms))
        .route("/sessions", get(list_sessions).post(create_session))
        .route("/sessions/:id", get(get_session).delete(close_session))
        .route("/sessions/:id/patient", put(update_patient))
        .route("/sessions/:id/vitals", put(update_vitals))
        .route("/sessions/:id/symptoms", post(add_symptom))
        .route(
            "/sessions/:id/symptoms/:symptom_id",
            patch(update_symptom).delete(remove_symptom),
        )
        .route(
            "/sessions/:id/images",
            post(add_images).layer(DefaultBodyLimit::disable()),
        )
        .route(
            "/sessions/:id/images/:image_id",
            patch(update_image).delete(remove_image),
        )
        .route("/sessions/:id/preview", put(set_preview).delete(clear_preview))
        .route(
            "/sessions/:id/analysis",
            post(trigger_analysis).delete(cancel_analysis),
        )
        .route("/sessions/:id/results", get(results))
        .route("/sessions/:id/status", get(status_banner))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(AppState { service })
}

fn status_for(err: &IntakeError) -> StatusCode {
    match err {
        IntakeError::MissingRequiredData => StatusCode::UNPROCESSABLE_ENTITY,
        IntakeError::AnalysisInProgress => StatusCode::CONFLICT,
        IntakeError::SessionNotFound(_)
        | IntakeError::SymptomNotFound(_)
        | IntakeError::ImageNotFound(_) => StatusCode::NOT_FOUND,
        IntakeError::InvalidInput(_)
        | IntakeError::Uuid(_)
        | IntakeError::Text(_)
        | IntakeError::Files(_) => StatusCode::BAD_REQUEST,
        IntakeError::RegistryPoisoned => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: IntakeError) -> ApiError {
    let status = status_for(&err);
    if status.is_server_error() {
        tracing::error!("Intake error: {:?}", err);
    } else {
        tracing::warn!("Rejected request: {}", err);
    }
    (status, err.to_string())
}

fn parse_id(raw: &str) -> Result<EntryId, ApiError> {
    EntryId::parse(raw).map_err(|e| api_error(e.into()))
}

fn session_for(state: &AppState, raw_id: &str) -> Result<SharedSession, ApiError> {
    let id = parse_id(raw_id)?;
    state.service.session(id).map_err(api_error)
}

/// Applies updates in order and returns the snapshot produced by the last one.
async fn apply_updates(
    state: &AppState,
    raw_id: &str,
    updates: Vec<IntakeUpdate>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let session = session_for(state, raw_id)?;
    let mut session = session.lock().await;

    let mut last = None;
    for update in updates {
        last = Some(session.apply(update).map_err(api_error)?);
    }
    last.map(Json)
        .ok_or_else(|| api_error(IntakeError::InvalidInput("no update supplied".into())))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/symptoms/common",
    responses(
        (status = 200, description = "Quick-add symptom list", body = CommonSymptomsRes)
    )
)]
#[axum::debug_handler]
async fn common_symptoms(State(_state): State<AppState>) -> Json<CommonSymptomsRes> {
    Json(CommonSymptomsRes {
        symptoms: SymptomCollector::new().common_symptoms(),
    })
}

#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session opened", body = SessionView),
        (status = 500, description = "Internal server error")
    )
)]
/// Open a new, empty intake session.
#[axum::debug_handler]
async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionView>), ApiError> {
    let (_, session) = state.service.create_session().map_err(api_error)?;
    let view = session.lock().await.view();
    Ok((StatusCode::CREATED, Json(view)))
}

#[utoipa::path(
    get,
    path = "/sessions",
    responses(
        (status = 200, description = "Open sessions, oldest first", body = ListSessionsRes),
        (status = 500, description = "Internal server error")
    )
)]
#[axum::debug_handler]
async fn list_sessions(State(state): State<AppState>) -> Result<Json<ListSessionsRes>, ApiError> {
    let sessions = state.service.list_sessions().await.map_err(api_error)?;
    Ok(Json(ListSessionsRes { sessions }))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Full session view", body = SessionView),
        (status = 400, description = "Malformed id"),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn get_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = session_for(&state, &id)?;
    let view = session.lock().await.view();
    Ok(Json(view))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session closed; any pending analysis is cancelled"),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn close_session(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<StatusCode, ApiError> {
    let id = parse_id(&id)?;
    state.service.close_session(id).await.map_err(api_error)?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/patient",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Merged patient record", body = PatientRecord),
        (status = 400, description = "Unknown field or gender value"),
        (status = 404, description = "Unknown session")
    )
)]
/// Replace one patient field.
#[axum::debug_handler]
async fn update_patient(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let update = req.into_update().map_err(api_error)?;
    apply_updates(&state, &id, vec![update]).await
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/vitals",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdateVitalReq,
    responses(
        (status = 200, description = "Symptoms and vitals", body = SymptomSnapshot),
        (status = 400, description = "Unknown vital sign"),
        (status = 404, description = "Unknown session")
    )
)]
/// Replace one vital sign. Values are stored as typed.
#[axum::debug_handler]
async fn update_vitals(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<UpdateVitalReq>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let update = req.into_update().map_err(api_error)?;
    apply_updates(&state, &id, vec![update]).await
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/symptoms",
    params(("id" = String, Path, description = "Session id")),
    request_body = AddSymptomReq,
    responses(
        (status = 200, description = "Symptoms and vitals; unchanged for a duplicate name", body = SymptomSnapshot),
        (status = 400, description = "Blank name"),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn add_symptom(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<AddSymptomReq>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    apply_updates(&state, &id, vec![req.into_update()]).await
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/symptoms/{symptom_id}",
    params(
        ("id" = String, Path, description = "Session id"),
        ("symptom_id" = String, Path, description = "Symptom entry id")
    ),
    request_body = UpdateSymptomReq,
    responses(
        (status = 200, description = "Symptoms and vitals", body = SymptomSnapshot),
        (status = 400, description = "Invalid severity or empty request"),
        (status = 404, description = "Unknown session or symptom")
    )
)]
#[axum::debug_handler]
async fn update_symptom(
    State(state): State<AppState>,
    AxumPath((id, symptom_id)): AxumPath<(String, String)>,
    Json(req): Json<UpdateSymptomReq>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let symptom_id = parse_id(&symptom_id)?;
    let updates = req.into_updates(symptom_id).map_err(api_error)?;
    apply_updates(&state, &id, updates).await
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}/symptoms/{symptom_id}",
    params(
        ("id" = String, Path, description = "Session id"),
        ("symptom_id" = String, Path, description = "Symptom entry id")
    ),
    responses(
        (status = 200, description = "Symptoms and vitals", body = SymptomSnapshot),
        (status = 404, description = "Unknown session or symptom")
    )
)]
#[axum::debug_handler]
async fn remove_symptom(
    State(state): State<AppState>,
    AxumPath((id, symptom_id)): AxumPath<(String, String)>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let symptom_id = parse_id(&symptom_id)?;
    apply_updates(&state, &id, vec![IntakeUpdate::RemoveSymptom(symptom_id)]).await
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/images",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Image list after the batch was decoded", body = ImageSnapshot),
        (status = 400, description = "Malformed multipart body"),
        (status = 404, description = "Unknown session")
    )
)]
/// Upload a batch of files as `multipart/form-data`.
///
/// Every part with a filename is treated as a file. Parts whose declared content type is not
/// `image/*` are skipped.
#[axum::debug_handler]
async fn add_images(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    mut multipart: Multipart,
) -> Result<Json<ImageSnapshot>, ApiError> {
    let id = parse_id(&id)?;
    state.service.session(id).map_err(api_error)?;

    let mut batch = Vec::new();
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Failed to read multipart body: {}", e);
                return Err((StatusCode::BAD_REQUEST, "Malformed multipart body".into()));
            }
        };

        let Some(filename) = field.file_name().map(str::to_string) else {
            continue;
        };
        let media_type = field.content_type().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!("Failed to read upload bytes for '{}': {}", filename, e);
                return Err((StatusCode::BAD_REQUEST, "Failed to read file data".into()));
            }
        };
        batch.push(FileSelection::new(filename, media_type, bytes.to_vec()));
    }

    let snapshot = state
        .service
        .add_images(id, batch)
        .await
        .map_err(api_error)?;
    Ok(Json(snapshot))
}

#[utoipa::path(
    patch,
    path = "/sessions/{id}/images/{image_id}",
    params(
        ("id" = String, Path, description = "Session id"),
        ("image_id" = String, Path, description = "Image id")
    ),
    request_body = UpdateImageReq,
    responses(
        (status = 200, description = "Image list", body = ImageSnapshot),
        (status = 400, description = "Invalid image type or empty request"),
        (status = 404, description = "Unknown session or image")
    )
)]
#[axum::debug_handler]
async fn update_image(
    State(state): State<AppState>,
    AxumPath((id, image_id)): AxumPath<(String, String)>,
    Json(req): Json<UpdateImageReq>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let image_id = parse_id(&image_id)?;
    let updates = req.into_updates(image_id).map_err(api_error)?;
    apply_updates(&state, &id, updates).await
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}/images/{image_id}",
    params(
        ("id" = String, Path, description = "Session id"),
        ("image_id" = String, Path, description = "Image id")
    ),
    responses(
        (status = 200, description = "Image list", body = ImageSnapshot),
        (status = 404, description = "Unknown session or image")
    )
)]
#[axum::debug_handler]
async fn remove_image(
    State(state): State<AppState>,
    AxumPath((id, image_id)): AxumPath<(String, String)>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let image_id = parse_id(&image_id)?;
    apply_updates(&state, &id, vec![IntakeUpdate::RemoveImage(image_id)]).await
}

#[utoipa::path(
    put,
    path = "/sessions/{id}/preview",
    params(("id" = String, Path, description = "Session id")),
    request_body = PreviewReq,
    responses(
        (status = 200, description = "Image list with preview set", body = ImageSnapshot),
        (status = 404, description = "Unknown session or image")
    )
)]
#[axum::debug_handler]
async fn set_preview(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
    Json(req): Json<PreviewReq>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    let update = req.into_update().map_err(api_error)?;
    apply_updates(&state, &id, vec![update]).await
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}/preview",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Image list with preview cleared", body = ImageSnapshot),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn clear_preview(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<SectionSnapshot>, ApiError> {
    apply_updates(&state, &id, vec![IntakeUpdate::ClearPreview]).await
}

#[utoipa::path(
    post,
    path = "/sessions/{id}/analysis",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 202, description = "Analysis started", body = AnalysisTicket),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Analysis already running"),
        (status = 422, description = "Patient identity or symptoms missing")
    )
)]
/// Start an analysis run. Results appear on `/results` once the configured delay elapses.
#[axum::debug_handler]
async fn trigger_analysis(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<(StatusCode, Json<AnalysisTicket>), ApiError> {
    let session = session_for(&state, &id)?;
    let ticket = session.lock().await.trigger_analysis().map_err(api_error)?;
    Ok((StatusCode::ACCEPTED, Json(ticket)))
}

#[utoipa::path(
    delete,
    path = "/sessions/{id}/analysis",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Status after cancelling", body = AnalysisStatus),
        (status = 404, description = "Unknown session")
    )
)]
/// Cancel a running analysis. A completed result is left in place.
#[axum::debug_handler]
async fn cancel_analysis(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<AnalysisStatus>, ApiError> {
    let session = session_for(&state, &id)?;
    let mut session = session.lock().await;
    session.cancel_analysis();
    Ok(Json(session.analysis_status()))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/results",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Results panel", body = ResultView),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn results(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<ResultView>, ApiError> {
    let session = session_for(&state, &id)?;
    let view = session.lock().await.results();
    Ok(Json(view))
}

#[utoipa::path(
    get,
    path = "/sessions/{id}/status",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Header and footer banner", body = StatusBanner),
        (status = 404, description = "Unknown session")
    )
)]
#[axum::debug_handler]
async fn status_banner(
    State(state): State<AppState>,
    AxumPath(id): AxumPath<String>,
) -> Result<Json<StatusBanner>, ApiError> {
    let session = session_for(&state, &id)?;
    let banner = session.lock().await.status_banner();
    Ok(Json(banner))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{header, Request, Response};
    use http_body_util::BodyExt;
    use intake_core::CoreConfig;
    use serde_json::{json, Value};
    use std::sync::Arc;
    use std::time::Duration;
    use tower::ServiceExt;

    const BOUNDARY: &str = "intake-test-boundary";

    fn service() -> IntakeService {
        let cfg = CoreConfig::new(Duration::from_millis(3_000)).unwrap();
        IntakeService::new(Arc::new(cfg))
    }

    fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
        let builder = Request::builder().method(method).uri(uri);
        match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    fn multipart_request(uri: &str, files: &[(&str, &str, &[u8])]) -> Request<Body> {
        let mut body = Vec::new();
        for (filename, content_type, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"files\"; \
                     filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response<Body>) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    async fn open_session(app: &Router) -> String {
        let (status, body) = send(app, request("POST", "/sessions", None)).await;
        assert_eq!(status, StatusCode::CREATED);
        body["id"].as_str().unwrap().to_string()
    }

    async fn fill_required(app: &Router, id: &str) {
        for (field, value) in [("name", "Sunita Devi"), ("age", "41"), ("gender", "female")] {
            let (status, _) = send(
                app,
                request(
                    "PUT",
                    &format!("/sessions/{id}/patient"),
                    Some(json!({ "field": field, "value": value })),
                ),
            )
            .await;
            assert_eq!(status, StatusCode::OK);
        }
        let (status, _) = send(
            app,
            request(
                "POST",
                &format!("/sessions/{id}/symptoms"),
                Some(json!({ "name": "Fever" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = router(service());
        let response = app.oneshot(request("GET", "/health", None)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["ok"], true);
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let app = router(service());
        let (status, body) = send(&app, request("GET", "/api-docs/openapi.json", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/sessions/{id}/analysis"].is_object());
    }

    #[tokio::test]
    async fn common_symptoms_are_listed() {
        let app = router(service());
        let (status, body) = send(&app, request("GET", "/symptoms/common", None)).await;
        assert_eq!(status, StatusCode::OK);
        let symptoms = body["symptoms"].as_array().unwrap();
        assert_eq!(symptoms.len(), 15);
        assert_eq!(symptoms[0], json!({ "name": "Fever", "added": false }));
    }

    #[tokio::test]
    async fn session_lifecycle() {
        let app = router(service());
        let id = open_session(&app).await;

        let (status, body) = send(&app, request("GET", &format!("/sessions/{id}"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["analysis"]["state"], "idle");
        assert_eq!(body["canAnalyze"], false);
        assert_eq!(
            body["analysisHint"],
            "Complete patient information and symptoms to enable analysis"
        );
        assert_eq!(body["banner"]["online"], true);

        let (_, body) = send(&app, request("GET", "/sessions", None)).await;
        assert_eq!(body["sessions"].as_array().unwrap().len(), 1);

        let (status, _) = send(&app, request("DELETE", &format!("/sessions/{id}"), None)).await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(&app, request("GET", &format!("/sessions/{id}"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn malformed_ids_are_bad_requests() {
        let app = router(service());
        let (status, _) = send(&app, request("GET", "/sessions/not-a-uuid", None)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let unknown = EntryId::new();
        let (status, _) = send(&app, request("GET", &format!("/sessions/{unknown}"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn analysis_without_required_data_is_unprocessable() {
        let app = router(service());
        let id = open_session(&app).await;

        let (status, _) = send(
            &app,
            request("POST", &format!("/sessions/{id}/analysis"), None),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

        let (_, body) = send(&app, request("GET", &format!("/sessions/{id}/results"), None)).await;
        assert_eq!(body["view"], "empty");
    }

    #[tokio::test(start_paused = true)]
    async fn analysis_runs_to_completion() {
        let service = service();
        let app = router(service.clone());
        let id = open_session(&app).await;
        fill_required(&app, &id).await;

        let (status, ticket) = send(
            &app,
            request("POST", &format!("/sessions/{id}/analysis"), None),
        )
        .await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(ticket["emergency"], false);

        let (status, _) = send(
            &app,
            request("POST", &format!("/sessions/{id}/analysis"), None),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (_, body) = send(&app, request("GET", &format!("/sessions/{id}/results"), None)).await;
        assert_eq!(body["view"], "analyzing");

        let session = service.session(EntryId::parse(&id).unwrap()).unwrap();
        session.lock().await.wait_for_analysis().await;

        let (_, body) = send(&app, request("GET", &format!("/sessions/{id}/results"), None)).await;
        assert_eq!(body["view"], "populated");
        let diagnoses = body["diagnoses"].as_array().unwrap();
        assert_eq!(diagnoses.len(), 3);
        assert_eq!(diagnoses[0]["condition"], "Acute Respiratory Infection");
        assert_eq!(diagnoses[0]["rank"], 1);
        assert_eq!(diagnoses[2]["referralNeeded"], true);
        assert_eq!(diagnoses[2]["referralLabel"], "Specialist Referral Recommended");
        assert!(body.get("critical").is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn severe_symptom_raises_banner_alert() {
        let app = router(service());
        let id = open_session(&app).await;
        fill_required(&app, &id).await;

        let (_, session) = send(&app, request("GET", &format!("/sessions/{id}"), None)).await;
        let symptom_id = session["symptoms"]["symptoms"][0]["id"]
            .as_str()
            .unwrap()
            .to_string();
        let (status, body) = send(
            &app,
            request(
                "PATCH",
                &format!("/sessions/{id}/symptoms/{symptom_id}"),
                Some(json!({ "severity": "severe", "duration": "1 day" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symptoms"][0]["severity"], "severe");
        assert_eq!(body["symptoms"][0]["duration"], "1 day");

        let (_, ticket) = send(
            &app,
            request("POST", &format!("/sessions/{id}/analysis"), None),
        )
        .await;
        assert_eq!(ticket["emergency"], true);

        let (_, banner) = send(&app, request("GET", &format!("/sessions/{id}/status"), None)).await;
        assert_eq!(banner["emergencyAlerts"], 1);

        let (status, body) = send(
            &app,
            request("DELETE", &format!("/sessions/{id}/analysis"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["state"], "idle");
    }

    #[tokio::test]
    async fn symptom_edits_validate_input() {
        let app = router(service());
        let id = open_session(&app).await;

        let (status, _) = send(
            &app,
            request(
                "POST",
                &format!("/sessions/{id}/symptoms"),
                Some(json!({ "name": "   " })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let missing = EntryId::new();
        let (status, _) = send(
            &app,
            request(
                "PATCH",
                &format!("/sessions/{id}/symptoms/{missing}"),
                Some(json!({ "severity": "extreme" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = send(
            &app,
            request("DELETE", &format!("/sessions/{id}/symptoms/{missing}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = send(
            &app,
            request(
                "PUT",
                &format!("/sessions/{id}/vitals"),
                Some(json!({ "field": "bloodPressure", "value": "120/80" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["vitals"]["bloodPressure"], "120/80");
    }

    #[tokio::test]
    async fn image_upload_edit_preview_and_remove() {
        let app = router(service());
        let id = open_session(&app).await;

        let (status, body) = send(
            &app,
            multipart_request(
                &format!("/sessions/{id}/images"),
                &[
                    ("rash.png", "image/png", &b"\x89PNG\r\n\x1a\n"[..]),
                    ("referral.txt", "text/plain", &b"referral letter"[..]),
                ],
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let images = body["images"].as_array().unwrap();
        assert_eq!(images.len(), 1);
        assert_eq!(images[0]["type"], "photo");
        let image_id = images[0]["id"].as_str().unwrap().to_string();

        let (status, body) = send(
            &app,
            request(
                "PATCH",
                &format!("/sessions/{id}/images/{image_id}"),
                Some(json!({ "type": "scan", "description": "Forearm rash" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["images"][0]["type"], "scan");
        assert_eq!(body["images"][0]["description"], "Forearm rash");

        let (status, body) = send(
            &app,
            request(
                "PUT",
                &format!("/sessions/{id}/preview"),
                Some(json!({ "imageId": image_id })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["preview"], image_id.as_str());

        let (status, body) = send(
            &app,
            request("DELETE", &format!("/sessions/{id}/images/{image_id}"), None),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["images"].as_array().unwrap().is_empty());
        assert!(body["preview"].is_null());
    }
}
