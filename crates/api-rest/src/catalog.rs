//! Read-only catalog endpoints: polyclinics, doctors, drug stock and
//! treatment price lists.

use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::Json;

use klinik_core::services::CatalogService;

use crate::dto::{
    DoctorDto, DoctorParams, ErrorBody, InventoryDto, InventoryParams, PolyclinicDto, SearchParams,
    TreatmentDto,
};
use crate::{reply_error, request_context, AppState, ErrorReply};

#[utoipa::path(
    get,
    path = "/catalog/polyclinics",
    responses(
        (status = 200, description = "All polyclinics", body = [PolyclinicDto]),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn polyclinics(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<PolyclinicDto>>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = CatalogService::new(state.client.clone());
    let entries = service
        .polyclinics(&ctx)
        .await
        .map_err(|err| reply_error("List polyclinics", err))?;
    Ok(Json(entries.into_iter().map(PolyclinicDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/catalog/doctors",
    params(DoctorParams),
    responses(
        (status = 200, description = "Doctors, optionally for one polyclinic", body = [DoctorDto]),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn doctors(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<DoctorParams>,
) -> Result<Json<Vec<DoctorDto>>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = CatalogService::new(state.client.clone());
    let entries = service
        .doctors(&ctx, params.polyclinic)
        .await
        .map_err(|err| reply_error("List doctors", err))?;
    Ok(Json(entries.into_iter().map(DoctorDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/catalog/inventories",
    params(InventoryParams),
    responses(
        (status = 200, description = "Stock items matching kind and search", body = [InventoryDto]),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
/// Inventory list; `kind` narrows at the store, `search` narrows client-side.
#[axum::debug_handler]
pub async fn inventories(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<InventoryParams>,
) -> Result<Json<Vec<InventoryDto>>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = CatalogService::new(state.client.clone());
    let entries = service
        .inventories(&ctx, params.kind, params.search.as_deref().unwrap_or(""))
        .await
        .map_err(|err| reply_error("List inventories", err))?;
    Ok(Json(entries.into_iter().map(InventoryDto::from).collect()))
}

#[utoipa::path(
    get,
    path = "/catalog/treatments",
    params(SearchParams),
    responses(
        (status = 200, description = "Treatments matching the search", body = [TreatmentDto]),
        (status = 401, description = "Missing credentials", body = ErrorBody)
    )
)]
#[axum::debug_handler]
pub async fn treatments(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<SearchParams>,
) -> Result<Json<Vec<TreatmentDto>>, ErrorReply> {
    let ctx = request_context(&headers)?;
    let service = CatalogService::new(state.client.clone());
    let entries = service
        .treatments(&ctx, params.search.as_deref().unwrap_or(""))
        .await
        .map_err(|err| reply_error("List treatments", err))?;
    Ok(Json(entries.into_iter().map(TreatmentDto::from).collect()))
}
