use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use super::access::{authorize, Caller, Relationship};
use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobStatus, UserRole,
};
use super::error::MarketplaceError;
use super::repository::{ApplicationRepository, HiringUnitOfWork, JobRepository};

/// Owns application transitions; acceptance also assigns the job.
pub struct ApplicationService<S> {
    store: Arc<S>,
}

impl<S> ApplicationService<S>
where
    S: ApplicationRepository + JobRepository + HiringUnitOfWork + 'static,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Submit the calling worker's application to an open job.
    pub fn apply(&self, job_id: &JobId, caller: &Caller) -> Result<Application, MarketplaceError> {
        authorize(caller, Relationship::HasRole(UserRole::Worker))?;

        let job = self.load_job(job_id)?;
        if job.status != JobStatus::Open {
            return Err(MarketplaceError::invalid_state(format!(
                "job is not accepting applications (job is {})",
                job.status
            )));
        }

        if self
            .store
            .application_for(&caller.user_id, job_id)?
            .is_some()
        {
            return Err(MarketplaceError::conflict(
                "you have already applied for this job",
            ));
        }

        // The store's (worker, job) uniqueness closes the race left by the lookup above.
        let application = self.store.insert_application(Application {
            id: ApplicationId::new(),
            job_id: *job_id,
            worker_id: caller.user_id,
            status: ApplicationStatus::Pending,
            created_at: Utc::now(),
        })?;

        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            worker_id = %application.worker_id,
            "application submitted"
        );
        Ok(application)
    }

    /// Accept a pending application and assign its worker to the job in one
    /// unit of work.
    pub fn accept(
        &self,
        application_id: &ApplicationId,
        caller: &Caller,
    ) -> Result<Application, MarketplaceError> {
        let (mut application, mut job) = self.load_for_decision(application_id, caller)?;
        if !job.status.can_transition_to(JobStatus::Assigned) {
            return Err(MarketplaceError::invalid_state(format!(
                "job is not open for assignment (job is {})",
                job.status
            )));
        }

        application.status = ApplicationStatus::Accepted;
        job.status = JobStatus::Assigned;
        job.assigned_worker_id = Some(application.worker_id);

        self.store
            .commit_acceptance(application.clone(), job.clone())?;

        info!(
            application_id = %application.id,
            job_id = %job.id,
            worker_id = %application.worker_id,
            "application accepted and job assigned"
        );
        Ok(application)
    }

    /// Reject a pending application. The job and its other applications are
    /// not touched.
    pub fn reject(
        &self,
        application_id: &ApplicationId,
        caller: &Caller,
    ) -> Result<Application, MarketplaceError> {
        let (mut application, _) = self.load_for_decision(application_id, caller)?;

        application.status = ApplicationStatus::Rejected;
        self.store
            .decide_application(application.clone(), ApplicationStatus::Pending)?;

        info!(
            application_id = %application.id,
            job_id = %application.job_id,
            "application rejected"
        );
        Ok(application)
    }

    /// Applications received for a job, newest first. Owner only.
    pub fn for_job(
        &self,
        job_id: &JobId,
        caller: &Caller,
    ) -> Result<Vec<Application>, MarketplaceError> {
        let job = self.load_job(job_id)?;
        authorize(caller, Relationship::OwnsJob(&job))?;
        Ok(self.store.applications_for_job(job_id)?)
    }

    fn load_job(&self, id: &JobId) -> Result<Job, MarketplaceError> {
        self.store
            .fetch_job(id)?
            .ok_or(MarketplaceError::NotFound("job"))
    }

    /// Shared preconditions of accept and reject: the application exists, the
    /// caller owns its job, and it is still pending.
    fn load_for_decision(
        &self,
        application_id: &ApplicationId,
        caller: &Caller,
    ) -> Result<(Application, Job), MarketplaceError> {
        let application = self
            .store
            .fetch_application(application_id)?
            .ok_or(MarketplaceError::NotFound("application"))?;
        let job = self.load_job(&application.job_id)?;

        authorize(caller, Relationship::OwnsJob(&job))?;
        if application.status.is_terminal() {
            return Err(MarketplaceError::invalid_state(format!(
                "application is not pending (application is {})",
                application.status
            )));
        }

        Ok((application, job))
    }
}
