use actix_web::{web, HttpResponse, Responder};

use crate::core::ServiceError;
use crate::models::{
    CreateProfileRequest, HealthResponse, Principal, ProfileId, SearchProfilesRequest, UpdateProfileRequest,
};
use crate::routes::AppState;

/// Configure health and profile routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(health_check))
        .route("/profiles", web::post().to(create_profile))
        .route("/profiles", web::get().to(list_profiles))
        // Registered before `{id}` so "search" is never read as an id
        .route("/profiles/search", web::get().to(search_profiles))
        .route("/profiles/{id}", web::get().to(get_profile))
        .route("/profiles/{id}", web::patch().to(update_profile))
        .route("/profiles/{id}", web::delete().to(delete_profile));
}

/// Health check endpoint
async fn health_check(state: web::Data<AppState>) -> impl Responder {
    let store_healthy = state.directory.health_check().await;

    let status = if store_healthy { "healthy" } else { "degraded" };

    HttpResponse::Ok().json(HealthResponse {
        status: status.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

/// Create a client profile
///
/// POST /api/v1/profiles
async fn create_profile(
    state: web::Data<AppState>,
    principal: Principal,
    body: web::Json<CreateProfileRequest>,
) -> Result<HttpResponse, ServiceError> {
    let view = state.directory.create(&principal, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(view))
}

/// Profiles owned by the calling broker
///
/// GET /api/v1/profiles
async fn list_profiles(state: web::Data<AppState>, principal: Principal) -> Result<HttpResponse, ServiceError> {
    let views = state.directory.list_owned_by(&principal).await?;
    Ok(HttpResponse::Ok().json(views))
}

/// Search active profiles across all brokers
///
/// GET /api/v1/profiles/search?religion=Hindu&minAge=25&maxAge=30&page=0&size=10&sortBy=id&direction=asc
///
/// Unknown or malformed filter values are ignored.
async fn search_profiles(
    state: web::Data<AppState>,
    _principal: Principal,
    query: web::Query<SearchProfilesRequest>,
) -> Result<HttpResponse, ServiceError> {
    let (criteria, page) = query.into_inner().into_parts(state.directory.limits());
    let result = state.directory.search(&criteria, page).await?;

    tracing::info!(
        "Search returned {} of {} profiles (page {})",
        result.items.len(),
        result.total_elements,
        result.page
    );

    Ok(HttpResponse::Ok().json(result))
}

/// GET /api/v1/profiles/{id}
async fn get_profile(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    let view = state
        .directory
        .get_by_id_for_owner(ProfileId(path.into_inner()), &principal)
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// Partial update, absent fields are left untouched
///
/// PATCH /api/v1/profiles/{id}
async fn update_profile(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
    body: web::Json<UpdateProfileRequest>,
) -> Result<HttpResponse, ServiceError> {
    let view = state
        .directory
        .update(ProfileId(path.into_inner()), &principal, body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(view))
}

/// DELETE /api/v1/profiles/{id}
async fn delete_profile(
    state: web::Data<AppState>,
    principal: Principal,
    path: web::Path<i64>,
) -> Result<HttpResponse, ServiceError> {
    state
        .directory
        .delete(ProfileId(path.into_inner()), &principal)
        .await?;
    Ok(HttpResponse::NoContent().finish())
}
