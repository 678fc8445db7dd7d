//! Login against the Record Store's local auth.

use axum::extract::State;
use axum::response::Json;

use crate::dto::{ErrorBody, LoginDto, LoginReq};
use crate::{reply_error, AppState, ErrorReply};

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReq,
    responses(
        (status = 200, description = "Authenticated", body = LoginDto),
        (status = 400, description = "Bad credentials", body = ErrorBody)
    )
)]
/// Exchange credentials for a JWT plus the account and its organization.
///
/// The returned `account.organization.id` is the value scoped endpoints
/// expect in `X-Organization-Id`. The login response alone does not carry
/// the organization, so the account is re-read with it populated.
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginReq>,
) -> Result<Json<LoginDto>, ErrorReply> {
    let auth = state
        .client
        .login(&req.identifier, &req.password)
        .await
        .map_err(|err| reply_error("Login", err))?;
    let account = state
        .client
        .own_account(&auth.jwt)
        .await
        .map_err(|err| reply_error("Login account lookup", err))?;
    Ok(Json(LoginDto {
        jwt: auth.jwt,
        account,
    }))
}
