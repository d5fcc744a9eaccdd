use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Path, Query, State},
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use super::access::Caller;
use super::domain::{
    Application, ApplicationId, Job, JobId, JobView, JobWithDistance, Rating, User, UserId,
    UserRole,
};
use super::error::MarketplaceError;
use super::jobs::JobDraft;
use super::ratings::RatingSubmission;
use super::repository::MarketplaceStore;
use super::search::NearbyQuery;
use super::users::UserRegistration;
use super::Marketplace;

/// Header carrying the authenticated user id, set by the identity gateway.
pub const USER_ID_HEADER: &str = "x-user-id";
/// Header carrying the authenticated user's role.
pub const USER_ROLE_HEADER: &str = "x-user-role";

/// Router builder exposing the marketplace surface.
pub fn marketplace_router<S>(marketplace: Arc<Marketplace<S>>) -> Router
where
    S: MarketplaceStore + 'static,
{
    Router::new()
        .route("/api/users", post(register_handler::<S>))
        .route("/api/users/me", get(me_handler::<S>))
        .route("/api/users/:user_id", get(user_handler::<S>))
        .route("/api/jobs", post(create_job_handler::<S>))
        .route("/api/jobs/nearby", get(nearby_handler::<S>))
        .route("/api/jobs/my", get(my_jobs_handler::<S>))
        .route("/api/jobs/assignments", get(assignments_handler::<S>))
        .route("/api/jobs/:job_id", get(job_handler::<S>))
        .route("/api/jobs/:job_id/assign", put(assign_handler::<S>))
        .route("/api/jobs/:job_id/complete", put(complete_handler::<S>))
        .route("/api/jobs/:job_id/cancel", put(cancel_handler::<S>))
        .route("/api/jobs/:job_id/apply", post(apply_handler::<S>))
        .route(
            "/api/jobs/:job_id/applications",
            get(job_applications_handler::<S>),
        )
        .route("/api/jobs/:job_id/ratings", get(job_ratings_handler::<S>))
        .route(
            "/api/applications/:application_id/accept",
            put(accept_handler::<S>),
        )
        .route(
            "/api/applications/:application_id/reject",
            put(reject_handler::<S>),
        )
        .route("/api/ratings", post(rating_handler::<S>))
        .with_state(marketplace)
}

/// Transport-level failure: either the caller could not be identified or a
/// marketplace operation failed.
#[derive(Debug)]
pub enum ApiError {
    Unauthenticated(String),
    Marketplace(MarketplaceError),
}

impl From<MarketplaceError> for ApiError {
    fn from(value: MarketplaceError) -> Self {
        Self::Marketplace(value)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match self {
            ApiError::Unauthenticated(message) => {
                (StatusCode::UNAUTHORIZED, "unauthenticated", message)
            }
            ApiError::Marketplace(err) => {
                let status = match &err {
                    MarketplaceError::NotFound(_) => StatusCode::NOT_FOUND,
                    MarketplaceError::Forbidden(_) => StatusCode::FORBIDDEN,
                    MarketplaceError::InvalidState(_) | MarketplaceError::Conflict(_) => {
                        StatusCode::CONFLICT
                    }
                    MarketplaceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                    MarketplaceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
                };
                (status, err.code(), err.to_string())
            }
        };

        (status, Json(json!({ "error": message, "code": code }))).into_response()
    }
}

#[axum::async_trait]
impl<St> FromRequestParts<St> for Caller
where
    St: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &St) -> Result<Self, Self::Rejection> {
        let user_id = header_value(parts, USER_ID_HEADER)?
            .parse::<Uuid>()
            .map_err(|_| ApiError::Unauthenticated(format!("{USER_ID_HEADER} must be a UUID")))?;
        let role = header_value(parts, USER_ROLE_HEADER)?
            .parse::<UserRole>()
            .map_err(|err| ApiError::Unauthenticated(err.to_string()))?;

        Ok(Caller::new(UserId(user_id), role))
    }
}

fn header_value<'a>(parts: &'a Parts, name: &'static str) -> Result<&'a str, ApiError> {
    parts
        .headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ApiError::Unauthenticated(format!("missing {name} header")))
}

#[derive(Debug, Serialize)]
pub struct JobList {
    pub jobs: Vec<JobView>,
}

#[derive(Debug, Serialize)]
pub struct NearbyJobList {
    pub jobs: Vec<JobWithDistance>,
    pub radius_km: f64,
}

#[derive(Debug, Serialize)]
pub struct ApplicationList {
    pub applications: Vec<Application>,
}

#[derive(Debug, Serialize)]
pub struct RatingList {
    pub ratings: Vec<Rating>,
}

#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    pub worker_id: UserId,
}

pub(crate) async fn register_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    Json(registration): Json<UserRegistration>,
) -> Result<(StatusCode, Json<User>), ApiError>
where
    S: MarketplaceStore + 'static,
{
    let user = marketplace.users.register(registration)?;
    Ok((StatusCode::CREATED, Json(user)))
}

pub(crate) async fn me_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
) -> Result<Json<User>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    Ok(Json(marketplace.users.get(&caller.user_id)?))
}

pub(crate) async fn user_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    _caller: Caller,
    Path(user_id): Path<Uuid>,
) -> Result<Json<User>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    Ok(Json(marketplace.users.get(&UserId(user_id))?))
}

pub(crate) async fn create_job_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Json(draft): Json<JobDraft>,
) -> Result<(StatusCode, Json<Job>), ApiError>
where
    S: MarketplaceStore + 'static,
{
    let job = marketplace.jobs.create(&caller, draft)?;
    Ok((StatusCode::CREATED, Json(job)))
}

pub(crate) async fn nearby_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    _caller: Caller,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<NearbyJobList>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let radius_km = marketplace.search.policy().effective_radius(query.radius);
    let jobs = marketplace.search.nearby(query)?;
    Ok(Json(NearbyJobList { jobs, radius_km }))
}

pub(crate) async fn my_jobs_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
) -> Result<Json<JobList>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let jobs = marketplace.jobs.for_employer(&caller.user_id)?;
    Ok(Json(JobList { jobs }))
}

pub(crate) async fn assignments_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
) -> Result<Json<JobList>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let jobs = marketplace.jobs.for_worker(&caller.user_id)?;
    Ok(Json(JobList { jobs }))
}

pub(crate) async fn job_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    _caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<JobView>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    Ok(Json(marketplace.jobs.get(&JobId(job_id))?))
}

pub(crate) async fn assign_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<Job>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let job = marketplace
        .jobs
        .assign(&JobId(job_id), &request.worker_id, &caller)?;
    Ok(Json(job))
}

pub(crate) async fn complete_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    Ok(Json(marketplace.jobs.complete(&JobId(job_id), &caller)?))
}

pub(crate) async fn cancel_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<Job>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    Ok(Json(marketplace.jobs.cancel(&JobId(job_id), &caller)?))
}

pub(crate) async fn apply_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<(StatusCode, Json<Application>), ApiError>
where
    S: MarketplaceStore + 'static,
{
    let application = marketplace.applications.apply(&JobId(job_id), &caller)?;
    Ok((StatusCode::CREATED, Json(application)))
}

pub(crate) async fn job_applications_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<ApplicationList>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let applications = marketplace
        .applications
        .for_job(&JobId(job_id), &caller)?;
    Ok(Json(ApplicationList { applications }))
}

pub(crate) async fn job_ratings_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(job_id): Path<Uuid>,
) -> Result<Json<RatingList>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let ratings = marketplace.ratings.for_job(&JobId(job_id), &caller)?;
    Ok(Json(RatingList { ratings }))
}

pub(crate) async fn accept_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(application_id): Path<Uuid>,
) -> Result<Json<Application>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let application = marketplace
        .applications
        .accept(&ApplicationId(application_id), &caller)?;
    Ok(Json(application))
}

pub(crate) async fn reject_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Path(application_id): Path<Uuid>,
) -> Result<Json<Application>, ApiError>
where
    S: MarketplaceStore + 'static,
{
    let application = marketplace
        .applications
        .reject(&ApplicationId(application_id), &caller)?;
    Ok(Json(application))
}

pub(crate) async fn rating_handler<S>(
    State(marketplace): State<Arc<Marketplace<S>>>,
    caller: Caller,
    Json(submission): Json<RatingSubmission>,
) -> Result<(StatusCode, Json<Rating>), ApiError>
where
    S: MarketplaceStore + 'static,
{
    let rating = marketplace.ratings.submit(&caller, submission)?;
    Ok((StatusCode::CREATED, Json(rating)))
}
