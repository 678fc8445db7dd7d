//! # API REST
//!
//! REST surface for the clinic system.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON serialization, CORS, header credentials)
//!
//! All domain behaviour lives in `klinik-core`; handlers construct the
//! services per request from the shared state and translate between wire
//! DTOs and core types.

#![warn(rust_2018_idioms)]

pub mod auth;
pub mod catalog;
pub mod dto;
pub mod patients;
pub mod records;
pub mod visits;

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::Json,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use klinik_core::{ClinicError, CoreConfig, RecordStoreClient, RequestContext};

use crate::dto::{ErrorBody, HealthDto};

/// Application state shared across REST handlers.
///
/// Holds the validated configuration and the Record Store client; the
/// domain services are cheap to build and get constructed per request.
#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<CoreConfig>,
    pub client: Arc<RecordStoreClient>,
}

pub(crate) type ErrorReply = (StatusCode, Json<ErrorBody>);

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        auth::login,
        patients::list_patients,
        patients::register_patient,
        patients::get_patient,
        patients::update_patient,
        patients::delete_patient,
        patients::patient_visits,
        catalog::polyclinics,
        catalog::doctors,
        catalog::inventories,
        catalog::treatments,
        visits::enqueue_visit,
        visits::list_visits,
        visits::get_visit,
        visits::visit_invoice,
        visits::start_visit,
        visits::cancel_visit,
        visits::visit_to_payment,
        visits::finish_visit,
        records::save_vitals,
        records::save_soap,
        records::save_notes,
        records::add_drug_line,
        records::update_drug_line,
        records::delete_drug_line,
        records::add_treatment_line,
        records::update_treatment_line,
        records::delete_treatment_line,
    ),
    components(schemas(
        dto::HealthDto,
        dto::AckDto,
        dto::ErrorBody,
        dto::LoginReq,
        dto::LoginDto,
        dto::RegisterPatientReq,
        dto::UpdatePatientReq,
        dto::PatientDto,
        dto::PatientListDto,
        dto::DoctorDto,
        dto::PolyclinicDto,
        dto::InventoryDto,
        dto::TreatmentDto,
        dto::EnqueueVisitReq,
        dto::VisitSummaryDto,
        dto::VisitListDto,
        dto::VisitDetailDto,
        dto::RecordDto,
        dto::LineDto,
        dto::VitalsReq,
        dto::SoapReq,
        dto::NotesReq,
        dto::NewDrugLineReq,
        dto::NewTreatmentLineReq,
        dto::LineUpdateReq,
        dto::InvoiceDto,
        dto::InvoiceLineDto,
        klinik_types::Gender,
        klinik_types::InventoryType,
        klinik_types::VisitStatus,
        klinik_types::Account,
        klinik_types::OrganizationRef,
        klinik_types::Pagination,
    ))
)]
pub struct ApiDoc;

/// Builds the complete REST router, Swagger UI included, over the given
/// state. Both the standalone binary and the workspace `klinik-run` binary
/// serve this router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/auth/login", post(auth::login))
        .route("/patients", get(patients::list_patients))
        .route("/patients", post(patients::register_patient))
        .route("/patients/:id", get(patients::get_patient))
        .route("/patients/:id", put(patients::update_patient))
        .route("/patients/:id", delete(patients::delete_patient))
        .route("/patients/:id/visits", get(patients::patient_visits))
        .route("/catalog/polyclinics", get(catalog::polyclinics))
        .route("/catalog/doctors", get(catalog::doctors))
        .route("/catalog/inventories", get(catalog::inventories))
        .route("/catalog/treatments", get(catalog::treatments))
        .route("/visits", post(visits::enqueue_visit))
        .route("/visits", get(visits::list_visits))
        .route("/visits/:id", get(visits::get_visit))
        .route("/visits/:id/invoice", get(visits::visit_invoice))
        .route("/visits/:id/start", post(visits::start_visit))
        .route("/visits/:id/cancel", post(visits::cancel_visit))
        .route("/visits/:id/payment", post(visits::visit_to_payment))
        .route("/visits/:id/done", post(visits::finish_visit))
        .route("/visits/:id/record/vitals", put(records::save_vitals))
        .route("/visits/:id/record/soap", put(records::save_soap))
        .route("/visits/:id/record/notes", put(records::save_notes))
        .route("/drug-lines", post(records::add_drug_line))
        .route("/drug-lines/:id", put(records::update_drug_line))
        .route("/drug-lines/:id", delete(records::delete_drug_line))
        .route("/treatment-lines", post(records::add_treatment_line))
        .route("/treatment-lines/:id", put(records::update_treatment_line))
        .route("/treatment-lines/:id", delete(records::delete_treatment_line))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Pulls the caller's credentials out of the request headers.
///
/// Scoped endpoints require `Authorization: Bearer <jwt>` together with
/// `X-Organization-Id`; both values come from the login response.
pub(crate) fn request_context(headers: &HeaderMap) -> Result<RequestContext, ErrorReply> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty());
    let Some(token) = token else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("missing or malformed Authorization header")),
        ));
    };

    let organization = headers
        .get("x-organization-id")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok());
    let Some(organization) = organization else {
        return Err((
            StatusCode::UNAUTHORIZED,
            Json(ErrorBody::new("missing or invalid X-Organization-Id header")),
        ));
    };

    Ok(RequestContext::new(token, organization))
}

/// Maps a core error onto the REST status space.
///
/// Store rejections keep their original status and details; transport
/// failures surface as 502 and are logged here, as close to the socket as
/// the cause allows.
pub(crate) fn reply_error(operation: &str, err: ClinicError) -> ErrorReply {
    let status = match &err {
        ClinicError::InvalidTransition { .. } => StatusCode::CONFLICT,
        ClinicError::NotFound(_) => StatusCode::NOT_FOUND,
        ClinicError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        ClinicError::RemoteRequest { status, .. } => {
            StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
        }
        ClinicError::Network(_) | ClinicError::Deserialization(_) | ClinicError::Url(_) => {
            StatusCode::BAD_GATEWAY
        }
    };
    if status.is_server_error() {
        tracing::error!("{} error: {:?}", operation, err);
    }
    let details = match &err {
        ClinicError::RemoteRequest { details, .. } if !details.is_null() => Some(details.clone()),
        _ => None,
    };
    (
        status,
        Json(ErrorBody {
            message: err.to_string(),
            details,
        }),
    )
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthDto)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks; does not touch the
/// Record Store.
#[axum::debug_handler]
async fn health(State(_state): State<AppState>) -> Json<HealthDto> {
    Json(HealthDto {
        ok: true,
        message: "Klinik REST API is alive".into(),
    })
}
