use std::sync::Arc;

use chrono::Utc;
use serde::Deserialize;
use tracing::info;

use super::access::{authorize, Caller, Relationship};
use super::domain::{Job, JobId, JobStatus, JobView, UserId, UserRole};
use super::error::{MarketplaceError, ValidationError};
use super::geo::GeoPoint;
use super::ratings::rating_flags;
use super::repository::{JobRepository, RatingRepository, UserRepository};

/// Fields an employer supplies when posting a job.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDraft {
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub hourly_rate: f64,
    #[serde(default)]
    pub total_payment: f64,
    pub latitude: f64,
    pub longitude: f64,
}

impl JobDraft {
    fn validate(&self) -> Result<GeoPoint, ValidationError> {
        if self.title.trim().is_empty() {
            return Err(ValidationError::Empty("title"));
        }
        if !self.hourly_rate.is_finite() || self.hourly_rate <= 0.0 {
            return Err(ValidationError::NonPositiveRate(self.hourly_rate));
        }
        if !self.total_payment.is_finite() || self.total_payment < 0.0 {
            return Err(ValidationError::NegativePayment(self.total_payment));
        }
        GeoPoint::new(self.latitude, self.longitude)
    }
}

/// Owns job status transitions and who may trigger them.
pub struct JobService<S> {
    store: Arc<S>,
}

impl<S> JobService<S>
where
    S: JobRepository + RatingRepository + UserRepository + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Post a new job in the `open` state.
    pub fn create(&self, caller: &Caller, draft: JobDraft) -> Result<Job, MarketplaceError> {
        authorize(caller, Relationship::HasRole(UserRole::Employer))?;
        let location = draft.validate()?;

        let job = self.store.insert_job(Job {
            id: JobId::new(),
            employer_id: caller.user_id,
            title: draft.title.trim().to_string(),
            description: draft.description,
            hourly_rate: draft.hourly_rate,
            total_payment: draft.total_payment,
            location,
            status: JobStatus::Open,
            assigned_worker_id: None,
            created_at: Utc::now(),
        })?;

        info!(job_id = %job.id, employer_id = %job.employer_id, "job posted");
        Ok(job)
    }

    pub fn get(&self, id: &JobId) -> Result<JobView, MarketplaceError> {
        let job = self.load(id)?;
        self.view(job)
    }

    pub fn for_employer(&self, employer: &UserId) -> Result<Vec<JobView>, MarketplaceError> {
        self.store
            .jobs_for_employer(employer)?
            .into_iter()
            .map(|job| self.view(job))
            .collect()
    }

    pub fn for_worker(&self, worker: &UserId) -> Result<Vec<JobView>, MarketplaceError> {
        self.store
            .jobs_for_worker(worker)?
            .into_iter()
            .map(|job| self.view(job))
            .collect()
    }

    /// Hand an open job to a worker directly, without an application.
    pub fn assign(
        &self,
        job_id: &JobId,
        worker_id: &UserId,
        caller: &Caller,
    ) -> Result<Job, MarketplaceError> {
        let mut job = self.load(job_id)?;
        authorize(caller, Relationship::OwnsJob(&job))?;
        require_transition(&job, JobStatus::Assigned, "job is not open for assignment")?;

        let worker = self
            .store
            .fetch_user(worker_id)?
            .ok_or(MarketplaceError::NotFound("worker"))?;
        if worker.role != UserRole::Worker {
            return Err(ValidationError::NotAWorker(worker.id.to_string()).into());
        }

        job.status = JobStatus::Assigned;
        job.assigned_worker_id = Some(worker.id);
        self.store.update_job(job.clone())?;

        info!(job_id = %job.id, worker_id = %worker.id, "job assigned");
        Ok(job)
    }

    pub fn complete(&self, job_id: &JobId, caller: &Caller) -> Result<Job, MarketplaceError> {
        let mut job = self.load(job_id)?;
        authorize(caller, Relationship::OwnsJob(&job))?;
        require_transition(&job, JobStatus::Done, "job must be assigned before completing")?;

        job.status = JobStatus::Done;
        self.store.update_job(job.clone())?;

        info!(job_id = %job.id, "job completed");
        Ok(job)
    }

    /// Withdraw an open job. Pending applications are left untouched.
    pub fn cancel(&self, job_id: &JobId, caller: &Caller) -> Result<Job, MarketplaceError> {
        let mut job = self.load(job_id)?;
        authorize(caller, Relationship::OwnsJob(&job))?;
        require_transition(&job, JobStatus::Cancelled, "only open jobs can be cancelled")?;

        job.status = JobStatus::Cancelled;
        self.store.update_job(job.clone())?;

        info!(job_id = %job.id, "job cancelled");
        Ok(job)
    }

    fn load(&self, id: &JobId) -> Result<Job, MarketplaceError> {
        self.store
            .fetch_job(id)?
            .ok_or(MarketplaceError::NotFound("job"))
    }

    fn view(&self, job: Job) -> Result<JobView, MarketplaceError> {
        let flags = rating_flags(&job, |job, user| self.store.rating_exists(job, user))?;
        Ok(JobView {
            job,
            employer_rated: flags.employer_rated,
            worker_rated: flags.worker_rated,
        })
    }
}

fn require_transition(job: &Job, next: JobStatus, message: &str) -> Result<(), MarketplaceError> {
    if job.status.can_transition_to(next) {
        Ok(())
    } else {
        Err(MarketplaceError::invalid_state(format!(
            "{message} (job is {})",
            job.status
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft() -> JobDraft {
        JobDraft {
            title: "Assemble furniture".to_string(),
            description: "Two bookshelves".to_string(),
            hourly_rate: 25.0,
            total_payment: 100.0,
            latitude: 40.0,
            longitude: -73.0,
        }
    }

    #[test]
    fn draft_validation_rejects_bad_fields() {
        assert!(draft().validate().is_ok());

        let mut blank = draft();
        blank.title = "   ".to_string();
        assert_eq!(blank.validate(), Err(ValidationError::Empty("title")));

        let mut free = draft();
        free.hourly_rate = 0.0;
        assert_eq!(free.validate(), Err(ValidationError::NonPositiveRate(0.0)));

        let mut negative = draft();
        negative.total_payment = -1.0;
        assert_eq!(
            negative.validate(),
            Err(ValidationError::NegativePayment(-1.0))
        );

        let mut offmap = draft();
        offmap.latitude = 123.0;
        assert_eq!(
            offmap.validate(),
            Err(ValidationError::LatitudeOutOfRange(123.0))
        );
    }
}
