//! Visit endpoints: queueing, the queue listing, detail, invoice and the
//! four workflow events.

use axum::extract::{Path, Query, State};
use axum::http::HeaderMap;
use axum::response::Json;

use klinik_core::services::records::RecordService;
use klinik_core::services::visits::{EnqueueVisit, VisitFilter, VisitService};

use crate::dto::{
    EnqueueVisitReq, ErrorBody, InvoiceDto, VisitDetailDto, VisitListDto, VisitListParams,
    VisitSummaryDto,
};
use crate::{reply_error, request_context, AppState, ErrorReply};

#[utoipa::path(
    post,
    path = "/visits",
    request_body = EnqueueVisitReq,
    responses(
        (status = 200, description = "Visit queued", body = VisitSummaryDto),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
/// Queue a visit; it enters the workflow as `in_queue` with the appointment
/// timestamp set to now.
#[axum::debug_handler]
pub async fn enqueue_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<EnqueueVisitReq>,
) -> Result<Json<VisitSummaryDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let created = service
        .enqueue(
            &ctx,
            EnqueueVisit {
                patient: req.patient,
                doctor: req.doctor,
                polyclinic: req.polyclinic,
            },
        )
        .await
        .map_err(|err| reply_error("Enqueue visit", err))?;
    Ok(Json(VisitSummaryDto::from(created)))
}

#[utoipa::path(
    get,
    path = "/visits",
    params(VisitListParams),
    responses(
        (status = 200, description = "One page of visits, newest appointment first", body = VisitListDto),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
/// The queue view: optional patient/doctor name search and status filter.
#[axum::debug_handler]
pub async fn list_visits(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<VisitListParams>,
) -> Result<Json<VisitListDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let page = service
        .list(
            &ctx,
            VisitFilter {
                search: params.search,
                status: params.status,
                page: params.page.unwrap_or(1),
            },
        )
        .await
        .map_err(|err| reply_error("List visits", err))?;
    Ok(Json(VisitListDto::from(page)))
}

#[utoipa::path(
    get,
    path = "/visits/{id}",
    params(("id" = u64, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit with participants and clinical record", body = VisitDetailDto),
        (status = 404, description = "Unknown or out-of-scope visit", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn get_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<VisitDetailDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let visit = service
        .find(&ctx, id)
        .await
        .map_err(|err| reply_error("Get visit", err))?;
    Ok(Json(VisitDetailDto::from(visit)))
}

#[utoipa::path(
    get,
    path = "/visits/{id}/invoice",
    params(("id" = u64, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Priced line items and grand total", body = InvoiceDto),
        (status = 404, description = "Visit has no record yet", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn visit_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<InvoiceDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = RecordService::new(state.client.clone());
    let invoice = service
        .invoice(&ctx, id)
        .await
        .map_err(|err| reply_error("Visit invoice", err))?;
    Ok(Json(InvoiceDto::from(invoice)))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/start",
    params(("id" = u64, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit moved to in_progress", body = VisitSummaryDto),
        (status = 409, description = "Not currently in the queue", body = ErrorBody)
    )
)]
/// Start processing: moves `in_queue` to `in_progress`, creating and
/// attaching the clinical record when the visit has none.
#[axum::debug_handler]
pub async fn start_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<VisitSummaryDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let updated = service
        .start_processing(&ctx, id)
        .await
        .map_err(|err| reply_error("Start visit", err))?;
    Ok(Json(VisitSummaryDto::from(updated)))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/cancel",
    params(("id" = u64, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit canceled", body = VisitSummaryDto),
        (status = 409, description = "Only queued visits can be canceled", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn cancel_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<VisitSummaryDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let updated = service
        .cancel(&ctx, id)
        .await
        .map_err(|err| reply_error("Cancel visit", err))?;
    Ok(Json(VisitSummaryDto::from(updated)))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/payment",
    params(("id" = u64, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit moved to waiting_for_payment", body = VisitSummaryDto),
        (status = 409, description = "Examination not in progress", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn visit_to_payment(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<VisitSummaryDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let updated = service
        .advance_to_payment(&ctx, id)
        .await
        .map_err(|err| reply_error("Visit to payment", err))?;
    Ok(Json(VisitSummaryDto::from(updated)))
}

#[utoipa::path(
    post,
    path = "/visits/{id}/done",
    params(("id" = u64, Path, description = "Visit id")),
    responses(
        (status = 200, description = "Visit closed", body = VisitSummaryDto),
        (status = 409, description = "Payment not pending", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn finish_visit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<VisitSummaryDto>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = VisitService::new(state.client.clone(), state.cfg.clone());
    let updated = service
        .mark_done(&ctx, id)
        .await
        .map_err(|err| reply_error("Finish visit", err))?;
    Ok(Json(VisitSummaryDto::from(updated)))
}
