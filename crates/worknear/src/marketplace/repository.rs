use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobWithDistance, Rating,
    RatingSummary, User, UserId,
};
use super::geo::GeoPoint;

/// Storage abstraction for registered users.
pub trait UserRepository: Send + Sync {
    /// Fails with `Conflict` when the phone number is already registered.
    fn insert_user(&self, user: User) -> Result<User, RepositoryError>;
    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError>;
    /// Overwrite the stored aggregate with a freshly computed summary.
    fn update_rating(&self, id: &UserId, summary: RatingSummary) -> Result<(), RepositoryError>;
}

/// Storage abstraction for jobs, including the distance query.
pub trait JobRepository: Send + Sync {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError>;
    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError>;
    /// Full replace of an existing job.
    fn update_job(&self, job: Job) -> Result<(), RepositoryError>;
    /// Newest first.
    fn jobs_for_employer(&self, employer: &UserId) -> Result<Vec<Job>, RepositoryError>;
    /// Newest first.
    fn jobs_for_worker(&self, worker: &UserId) -> Result<Vec<Job>, RepositoryError>;
    /// Open jobs strictly within `radius_km` of `origin`, nearest first.
    fn open_jobs_within(
        &self,
        origin: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<JobWithDistance>, RepositoryError>;
}

/// Storage abstraction for applications.
pub trait ApplicationRepository: Send + Sync {
    /// Fails with `Conflict` when the worker already applied to the job.
    fn insert_application(&self, application: Application)
        -> Result<Application, RepositoryError>;
    fn fetch_application(&self, id: &ApplicationId)
        -> Result<Option<Application>, RepositoryError>;
    fn application_for(
        &self,
        worker: &UserId,
        job: &JobId,
    ) -> Result<Option<Application>, RepositoryError>;
    /// Replace the stored application only while its status is still
    /// `expected`; otherwise fail with `Conflict`.
    fn decide_application(
        &self,
        application: Application,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError>;
    /// Newest first.
    fn applications_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError>;
}

/// Storage abstraction for ratings and the per-user aggregate query.
pub trait RatingRepository: Send + Sync {
    /// Fails with `Conflict` when the rater already rated this job.
    fn insert_rating(&self, rating: Rating) -> Result<Rating, RepositoryError>;
    fn rating_exists(&self, job: &JobId, from: &UserId) -> Result<bool, RepositoryError>;
    fn rating_summary(&self, user: &UserId) -> Result<RatingSummary, RepositoryError>;
    fn ratings_for_job(&self, job: &JobId) -> Result<Vec<Rating>, RepositoryError>;
}

/// Unit of work for accepting an application: the application and the job
/// it assigns are written together or not at all.
pub trait HiringUnitOfWork: Send + Sync {
    /// Implementations must reject the commit with `Conflict` if, at commit
    /// time, the stored application is no longer pending or the stored job
    /// is no longer open.
    fn commit_acceptance(&self, application: Application, job: Job)
        -> Result<(), RepositoryError>;
}

/// Everything the HTTP surface needs from a single backing store.
pub trait MarketplaceStore:
    UserRepository + JobRepository + ApplicationRepository + RatingRepository + HiringUnitOfWork
{
}

impl<T> MarketplaceStore for T where
    T: UserRepository + JobRepository + ApplicationRepository + RatingRepository + HiringUnitOfWork
{
}

/// Error enumeration for repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("{0}")]
    Conflict(String),
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
