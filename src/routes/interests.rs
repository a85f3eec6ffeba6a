use actix_web::{web, HttpResponse};
use validator::Validate;

use crate::core::ServiceError;
use crate::models::{InterestId, Principal, ProfileId, RespondInterestRequest, SendInterestRequest};
use crate::routes::AppState;

/// Configure interest workflow routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/interests", web::post().to(send_interest))
        .route("/interests/sent/{profile_id}", web::get().to(list_sent))
        .route("/interests/received/{profile_id}", web::get().to(list_received))
        .route("/interests/{id}/respond", web::put().to(respond_interest));
}

/// Send interest endpoint
///
/// POST /api/v1/interests
///
/// Request body:
/// ```json
/// {
///   "senderProfileId": 1,
///   "receiverProfileId": 2
/// }
/// ```
async fn send_interest(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<SendInterestRequest>,
) -> Result<HttpResponse, ServiceError> {
    let view = state
        .interests
        .send(&principal, body.sender_profile_id, body.receiver_profile_id)
        .await?;
    Ok(HttpResponse::Created().json(view))
}

/// GET /api/v1/interests/sent/{profile_id}
async fn list_sent(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let views = state
        .interests
        .list_sent(&principal, ProfileId(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(views))
}

/// GET /api/v1/interests/received/{profile_id}
async fn list_received(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let views = state
        .interests
        .list_received(&principal, ProfileId(path.into_inner()))
        .await?;
    Ok(HttpResponse::Ok().json(views))
}

/// Respond to interest endpoint
///
/// PUT /api/v1/interests/{id}/respond
///
/// Request body:
/// ```json
/// {
///   "status": "ACCEPTED|REJECTED"
/// }
/// ```
async fn respond_interest(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<RespondInterestRequest>,
) -> Result<HttpResponse, ServiceError> {
    body.validate()?;

    let view = state
        .interests
        .respond(&principal, InterestId(path.into_inner()), &body.status)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}
