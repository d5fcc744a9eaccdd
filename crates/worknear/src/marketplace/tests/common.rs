use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::response::Response;
use serde_json::Value;

use crate::config::SearchConfig;
use crate::marketplace::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobStatus, JobWithDistance, Rating,
    RatingSummary, User, UserId, UserRole,
};
use crate::marketplace::geo::GeoPoint;
use crate::marketplace::repository::{
    ApplicationRepository, HiringUnitOfWork, JobRepository, RatingRepository, RepositoryError,
    UserRepository,
};
use crate::marketplace::{
    Caller, JobDraft, Marketplace, MemoryStore, SearchPolicy, UserRegistration,
};

pub(super) fn search_policy() -> SearchPolicy {
    SearchPolicy::new(SearchConfig {
        default_radius_km: 3.0,
        max_radius_km: 5.0,
    })
}

pub(super) fn build_marketplace() -> (Marketplace<MemoryStore>, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::new());
    let marketplace = Marketplace::new(store.clone(), search_policy());
    (marketplace, store)
}

pub(super) fn registration(name: &str, phone: &str, role: UserRole) -> UserRegistration {
    UserRegistration {
        name: name.to_string(),
        phone: phone.to_string(),
        role,
        latitude: 40.0,
        longitude: -73.0,
    }
}

pub(super) fn register<S>(marketplace: &Marketplace<S>, name: &str, role: UserRole) -> Caller
where
    S: crate::marketplace::MarketplaceStore + 'static,
{
    let phone = format!("555-{}", UserId::new());
    let user = marketplace
        .users
        .register(registration(name, &phone, role))
        .expect("registration succeeds");
    Caller::new(user.id, user.role)
}

pub(super) fn draft_at(title: &str, latitude: f64, longitude: f64) -> JobDraft {
    JobDraft {
        title: title.to_string(),
        description: "Bring your own gloves".to_string(),
        hourly_rate: 20.0,
        total_payment: 80.0,
        latitude,
        longitude,
    }
}

pub(super) fn draft() -> JobDraft {
    draft_at("Move boxes", 40.0, -73.0)
}

/// Employer, worker, and an open job posted by the employer.
pub(super) struct Hiring {
    pub(super) employer: Caller,
    pub(super) worker: Caller,
    pub(super) job: Job,
}

pub(super) fn open_job<S>(marketplace: &Marketplace<S>) -> Hiring
where
    S: crate::marketplace::MarketplaceStore + 'static,
{
    let employer = register(marketplace, "Erin Employer", UserRole::Employer);
    let worker = register(marketplace, "Wes Worker", UserRole::Worker);
    let job = marketplace
        .jobs
        .create(&employer, draft())
        .expect("job posted");
    Hiring {
        employer,
        worker,
        job,
    }
}

/// Drive a job through apply -> accept -> complete.
pub(super) fn finished_job<S>(marketplace: &Marketplace<S>) -> Hiring
where
    S: crate::marketplace::MarketplaceStore + 'static,
{
    let hiring = open_job(marketplace);
    let application = marketplace
        .applications
        .apply(&hiring.job.id, &hiring.worker)
        .expect("apply succeeds");
    marketplace
        .applications
        .accept(&application.id, &hiring.employer)
        .expect("accept succeeds");
    let job = marketplace
        .jobs
        .complete(&hiring.job.id, &hiring.employer)
        .expect("complete succeeds");
    Hiring { job, ..hiring }
}

/// Memory store with switchable failures on the compound and best-effort
/// writes, plus a hook that lands a competing acceptance right after an
/// application is read.
#[derive(Default)]
pub(super) struct FaultyStore {
    pub(super) inner: MemoryStore,
    pub(super) fail_acceptance: AtomicBool,
    pub(super) fail_rating_update: AtomicBool,
    pub(super) accept_after_fetch: AtomicBool,
}

impl FaultyStore {
    pub(super) fn fail_acceptance(&self) {
        self.fail_acceptance.store(true, Ordering::SeqCst);
    }

    pub(super) fn fail_rating_update(&self) {
        self.fail_rating_update.store(true, Ordering::SeqCst);
    }

    /// The next application read is followed by another request accepting
    /// that application, before the reader gets to write.
    pub(super) fn accept_after_next_fetch(&self) {
        self.accept_after_fetch.store(true, Ordering::SeqCst);
    }

    fn accept_behind_reader(&self, application: &Application) -> Result<(), RepositoryError> {
        let mut job = self
            .inner
            .fetch_job(&application.job_id)?
            .ok_or(RepositoryError::NotFound)?;
        job.status = JobStatus::Assigned;
        job.assigned_worker_id = Some(application.worker_id);

        let mut accepted = application.clone();
        accepted.status = ApplicationStatus::Accepted;
        self.inner.commit_acceptance(accepted, job)
    }
}

impl UserRepository for FaultyStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        self.inner.insert_user(user)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        self.inner.fetch_user(id)
    }

    fn update_rating(&self, id: &UserId, summary: RatingSummary) -> Result<(), RepositoryError> {
        if self.fail_rating_update.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable("users table locked".to_string()));
        }
        self.inner.update_rating(id, summary)
    }
}

impl JobRepository for FaultyStore {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        self.inner.insert_job(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        self.inner.fetch_job(id)
    }

    fn update_job(&self, job: Job) -> Result<(), RepositoryError> {
        self.inner.update_job(job)
    }

    fn jobs_for_employer(&self, employer: &UserId) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs_for_employer(employer)
    }

    fn jobs_for_worker(&self, worker: &UserId) -> Result<Vec<Job>, RepositoryError> {
        self.inner.jobs_for_worker(worker)
    }

    fn open_jobs_within(
        &self,
        origin: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<JobWithDistance>, RepositoryError> {
        self.inner.open_jobs_within(origin, radius_km)
    }
}

impl ApplicationRepository for FaultyStore {
    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        self.inner.insert_application(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let found = self.inner.fetch_application(id)?;
        if self.accept_after_fetch.swap(false, Ordering::SeqCst) {
            if let Some(application) = &found {
                self.accept_behind_reader(application)?;
            }
        }
        Ok(found)
    }

    fn application_for(
        &self,
        worker: &UserId,
        job: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        self.inner.application_for(worker, job)
    }

    fn decide_application(
        &self,
        application: Application,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        self.inner.decide_application(application, expected)
    }

    fn applications_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        self.inner.applications_for_job(job)
    }
}

impl RatingRepository for FaultyStore {
    fn insert_rating(&self, rating: Rating) -> Result<Rating, RepositoryError> {
        self.inner.insert_rating(rating)
    }

    fn rating_exists(&self, job: &JobId, from: &UserId) -> Result<bool, RepositoryError> {
        self.inner.rating_exists(job, from)
    }

    fn rating_summary(&self, user: &UserId) -> Result<RatingSummary, RepositoryError> {
        self.inner.rating_summary(user)
    }

    fn ratings_for_job(&self, job: &JobId) -> Result<Vec<Rating>, RepositoryError> {
        self.inner.ratings_for_job(job)
    }
}

impl HiringUnitOfWork for FaultyStore {
    fn commit_acceptance(
        &self,
        application: Application,
        job: Job,
    ) -> Result<(), RepositoryError> {
        if self.fail_acceptance.load(Ordering::SeqCst) {
            return Err(RepositoryError::Unavailable(
                "transaction aborted".to_string(),
            ));
        }
        self.inner.commit_acceptance(application, job)
    }
}

pub(super) fn build_faulty_marketplace() -> (Marketplace<FaultyStore>, Arc<FaultyStore>) {
    let store = Arc::new(FaultyStore::default());
    let marketplace = Marketplace::new(store.clone(), search_policy());
    (marketplace, store)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
