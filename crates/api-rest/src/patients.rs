//! Patient roster endpoints: registration, lookup, edits and visit history.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;

use klinik_core::services::patients::{PatientService, RegisterPatient, UpdatePatient};

use crate::dto::{
    AckDto, ErrorBody, PageParams, PatientDto, PatientListDto, PatientListParams,
    RegisterPatientReq, UpdatePatientReq, VisitListDto,
};
use crate::{reply_error, request_context, AppState, ErrorReply};

#[utoipa::path(
    get,
    path = "/patients",
    params(PatientListParams),
    responses(
        (status = 200, description = "One page of the patient roster", body = PatientListDto),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
/// List the organization's patients, with optional name or RM number search.
#[axum::debug_handler]
pub async fn list_patients(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<PatientListParams>,
) -> Result<Json<PatientListDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = PatientService::new(state.client.clone(), state.cfg.clone());
    let page = service
        .list(&ctx, params.search.as_deref(), params.page.unwrap_or(1))
        .await
        .map_err(|err| reply_error("List patients", err))?;
    Ok(Json(PatientListDto::from(page)))
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body = RegisterPatientReq,
    responses(
        (status = 200, description = "Patient registered", body = PatientDto),
        (status = 400, description = "Missing name or date of birth", body = ErrorBody),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
/// Register a patient in the caller's organization.
#[axum::debug_handler]
pub async fn register_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<RegisterPatientReq>,
) -> Result<Json<PatientDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = PatientService::new(state.client.clone(), state.cfg.clone());
    let created = service
        .register(
            &ctx,
            RegisterPatient {
                name: req.name,
                dob: req.dob,
                rm_id: req.rm_id,
                address: req.address,
                phone: req.phone,
                gender: req.gender,
            },
        )
        .await
        .map_err(|err| reply_error("Register patient", err))?;
    Ok(Json(PatientDto::from(created)))
}

#[utoipa::path(
    get,
    path = "/patients/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient detail", body = PatientDto),
        (status = 404, description = "Unknown or out-of-scope patient", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn get_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<PatientDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = PatientService::new(state.client.clone(), state.cfg.clone());
    let patient = service
        .find(&ctx, id)
        .await
        .map_err(|err| reply_error("Get patient", err))?;
    Ok(Json(PatientDto::from(patient)))
}

#[utoipa::path(
    put,
    path = "/patients/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    request_body = UpdatePatientReq,
    responses(
        (status = 200, description = "Patient updated", body = PatientDto),
        (status = 400, description = "Blank name", body = ErrorBody),
        (status = 404, description = "Unknown or out-of-scope patient", body = ErrorBody)
    )
)]
/// Update contact fields; unset fields are left untouched.
#[axum::debug_handler]
pub async fn update_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<UpdatePatientReq>,
) -> Result<Json<PatientDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = PatientService::new(state.client.clone(), state.cfg.clone());
    let updated = service
        .update(
            &ctx,
            id,
            UpdatePatient {
                name: req.name,
                dob: req.dob,
                rm_id: req.rm_id,
                address: req.address,
                phone: req.phone,
                gender: req.gender,
            },
        )
        .await
        .map_err(|err| reply_error("Update patient", err))?;
    Ok(Json(PatientDto::from(updated)))
}

#[utoipa::path(
    delete,
    path = "/patients/{id}",
    params(("id" = u64, Path, description = "Patient id")),
    responses(
        (status = 200, description = "Patient removed", body = AckDto),
        (status = 404, description = "Unknown or out-of-scope patient", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn delete_patient(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<AckDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = PatientService::new(state.client.clone(), state.cfg.clone());
    service
        .remove(&ctx, id)
        .await
        .map_err(|err| reply_error("Delete patient", err))?;
    Ok(Json(AckDto {
        ok: true,
        message: format!("patient {} removed", id),
    }))
}

#[utoipa::path(
    get,
    path = "/patients/{id}/visits",
    params(("id" = u64, Path, description = "Patient id"), PageParams),
    responses(
        (status = 200, description = "Visit history, most recent first", body = VisitListDto),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
/// The patient's outpatient history with doctor and polyclinic names.
#[axum::debug_handler]
pub async fn patient_visits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Query(params): Query<PageParams>,
) -> Result<Json<VisitListDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = PatientService::new(state.client.clone(), state.cfg.clone());
    let page = service
        .visit_history(&ctx, id, params.page.unwrap_or(1))
        .await
        .map_err(|err| reply_error("Patient visit history", err))?;
    Ok(Json(VisitListDto::from(page)))
}
