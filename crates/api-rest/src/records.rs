//! Clinical documentation endpoints: vitals, SOAP, notes and the drug and
//! treatment line items.
//!
//! The record routes hang off the visit, so the first write lazily creates
//! the record; line-item edits address the line directly by id.

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Json;

use klinik_core::services::records::{NewLineInput, RecordService, SoapInput, VitalsInput};
use klinik_core::store::payloads::{LinePatch, NotesPatch};

use crate::dto::{
    AckDto, ErrorBody, LineDto, LineUpdateReq, NewDrugLineReq, NewTreatmentLineReq, NotesReq,
    RecordDto, SoapReq, VitalsReq,
};
use crate::{reply_error, request_context, AppState, ErrorReply};

#[utoipa::path(
    put,
    path = "/visits/{id}/record/vitals",
    params(("id" = u64, Path, description = "Visit id")),
    request_body = VitalsReq,
    responses(
        (status = 200, description = "Record after the vitals write", body = RecordDto),
        (status = 404, description = "Unknown or out-of-scope visit", body = ErrorBody)
    )
)]
/// Save vital signs onto the visit's record, creating the record on first
/// write.
#[axum::debug_handler]
pub async fn save_vitals(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<VitalsReq>,
) -> Result<Json<RecordDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let record = service
        .save_vitals(
            &ctx,
            id,
            VitalsInput {
                blood_pressure: req.blood_pressure,
                pulse: req.pulse,
                temperature: req.temperature,
                respiratory_rate: req.respiratory_rate,
                saturation: req.saturation,
                height: req.height,
                weight: req.weight,
            },
        )
        .await
        .map_err(|err| reply_error("Save vitals", err))?;
    Ok(Json(RecordDto::from(record)))
}

#[utoipa::path(
    put,
    path = "/visits/{id}/record/soap",
    params(("id" = u64, Path, description = "Visit id")),
    request_body = SoapReq,
    responses(
        (status = 200, description = "Record after the SOAP write", body = RecordDto),
        (status = 404, description = "Unknown or out-of-scope visit", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn save_soap(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<SoapReq>,
) -> Result<Json<RecordDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let record = service
        .save_soap(
            &ctx,
            id,
            SoapInput {
                subjective: req.subjective,
                objective: req.objective,
                assessment: req.assessment,
                plan: req.plan,
            },
        )
        .await
        .map_err(|err| reply_error("Save soap", err))?;
    Ok(Json(RecordDto::from(record)))
}

#[utoipa::path(
    put,
    path = "/visits/{id}/record/notes",
    params(("id" = u64, Path, description = "Visit id")),
    request_body = NotesReq,
    responses(
        (status = 200, description = "Record after the notes write", body = RecordDto),
        (status = 400, description = "Neither note provided", body = ErrorBody),
        (status = 404, description = "Unknown or out-of-scope visit", body = ErrorBody)
    )
)]
/// Overwrite the drug-recipe note, the treatment note, or both.
#[axum::debug_handler]
pub async fn save_notes(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<NotesReq>,
) -> Result<Json<RecordDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    if req.drug_recipe_note.is_none() && req.medical_treatment_note.is_none() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::new("neither note field was provided")),
        ));
    }
    let service = RecordService::new(state.client.clone());
    let record = service
        .save_notes(
            &ctx,
            id,
            NotesPatch {
                drug_recipe_note: req.drug_recipe_note,
                medical_treatment_note: req.medical_treatment_note,
            },
        )
        .await
        .map_err(|err| reply_error("Save notes", err))?;
    Ok(Json(RecordDto::from(record)))
}

#[utoipa::path(
    post,
    path = "/drug-lines",
    request_body = NewDrugLineReq,
    responses(
        (status = 200, description = "Drug line added", body = LineDto),
        (status = 400, description = "Negative price", body = ErrorBody),
        (status = 404, description = "Unknown or out-of-scope visit", body = ErrorBody)
    )
)]
/// Add a drug-recipe line to the visit's record.
#[axum::debug_handler]
pub async fn add_drug_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewDrugLineReq>,
) -> Result<Json<LineDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let line = service
        .add_drug_line(
            &ctx,
            req.visit,
            NewLineInput {
                catalog_id: req.inventory,
                qty: req.qty,
                price: req.price,
                description: req.description,
            },
        )
        .await
        .map_err(|err| reply_error("Add drug line", err))?;
    Ok(Json(LineDto::from_drug(&line)))
}

#[utoipa::path(
    put,
    path = "/drug-lines/{id}",
    params(("id" = u64, Path, description = "Line id")),
    request_body = LineUpdateReq,
    responses(
        (status = 200, description = "Drug line updated", body = LineDto),
        (status = 400, description = "Negative price", body = ErrorBody),
        (status = 404, description = "Unknown line", body = ErrorBody)
    )
)]
/// Update a drug line; the price snapshot only changes when sent explicitly.
#[axum::debug_handler]
pub async fn update_drug_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<LineUpdateReq>,
) -> Result<Json<LineDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let line = service
        .update_drug_line(
            &ctx,
            id,
            LinePatch {
                qty: req.qty,
                price: req.price,
                description: req.description,
            },
        )
        .await
        .map_err(|err| reply_error("Update drug line", err))?;
    Ok(Json(LineDto::from_drug(&line)))
}

#[utoipa::path(
    delete,
    path = "/drug-lines/{id}",
    params(("id" = u64, Path, description = "Line id")),
    responses(
        (status = 200, description = "Drug line removed", body = AckDto),
        (status = 404, description = "Unknown line", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn delete_drug_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<AckDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    service
        .remove_drug_line(&ctx, id)
        .await
        .map_err(|err| reply_error("Delete drug line", err))?;
    Ok(Json(AckDto {
        ok: true,
        message: format!("drug line {} removed", id),
    }))
}

#[utoipa::path(
    post,
    path = "/treatment-lines",
    request_body = NewTreatmentLineReq,
    responses(
        (status = 200, description = "Treatment line added", body = LineDto),
        (status = 400, description = "Negative price", body = ErrorBody),
        (status = 404, description = "Unknown or out-of-scope visit", body = ErrorBody)
    )
)]
/// Add a treatment line to the visit's record.
#[axum::debug_handler]
pub async fn add_treatment_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<NewTreatmentLineReq>,
) -> Result<Json<LineDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let line = service
        .add_treatment_line(
            &ctx,
            req.visit,
            NewLineInput {
                catalog_id: req.treatment,
                qty: req.qty,
                price: req.price,
                description: req.description,
            },
        )
        .await
        .map_err(|err| reply_error("Add treatment line", err))?;
    Ok(Json(LineDto::from_treatment(&line)))
}

#[utoipa::path(
    put,
    path = "/treatment-lines/{id}",
    params(("id" = u64, Path, description = "Line id")),
    request_body = LineUpdateReq,
    responses(
        (status = 200, description = "Treatment line updated", body = LineDto),
        (status = 400, description = "Negative price", body = ErrorBody),
        (status = 404, description = "Unknown line", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn update_treatment_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(req): Json<LineUpdateReq>,
) -> Result<Json<LineDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let line = service
        .update_treatment_line(
            &ctx,
            id,
            LinePatch {
                qty: req.qty,
                price: req.price,
                description: req.description,
            },
        )
        .await
        .map_err(|err| reply_error("Update treatment line", err))?;
    Ok(Json(LineDto::from_treatment(&line)))
}

#[utoipa::path(
    delete,
    path = "/treatment-lines/{id}",
    params(("id" = u64, Path, description = "Line id")),
    responses(
        (status = 200, description = "Treatment line removed", body = AckDto),
        (status = 404, description = "Unknown line", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn delete_treatment_line(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<AckDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    service
        .remove_treatment_line(&ctx, id)
        .await
        .map_err(|err| reply_error("Delete treatment line", err))?;
    Ok(Json(AckDto {
        ok: true,
        message: format!("treatment line {} removed", id),
    }))
}
