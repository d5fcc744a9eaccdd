//! In-process store backing every repository port with one mutex-guarded set
//! of tables. Uniqueness constraints and the acceptance unit of work are
//! checked inside the lock.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use super::domain::{
    Application, ApplicationId, ApplicationStatus, Job, JobId, JobStatus, JobWithDistance, Rating,
    RatingSummary, User, UserId,
};
use super::geo::{self, GeoPoint};
use super::repository::{
    ApplicationRepository, HiringUnitOfWork, JobRepository, RatingRepository, RepositoryError,
    UserRepository,
};

#[derive(Default)]
struct Tables {
    users: HashMap<UserId, User>,
    // Vectors keep insertion order for stable listing and tie-breaking.
    jobs: Vec<Job>,
    applications: Vec<Application>,
    ratings: Vec<Rating>,
}

impl Tables {
    fn job_mut(&mut self, id: &JobId) -> Option<&mut Job> {
        self.jobs.iter_mut().find(|job| job.id == *id)
    }

    fn application_mut(&mut self, id: &ApplicationId) -> Option<&mut Application> {
        self.applications
            .iter_mut()
            .find(|application| application.id == *id)
    }
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn tables(&self) -> Result<MutexGuard<'_, Tables>, RepositoryError> {
        self.tables
            .lock()
            .map_err(|_| RepositoryError::Unavailable("memory store lock poisoned".to_string()))
    }
}

impl UserRepository for MemoryStore {
    fn insert_user(&self, user: User) -> Result<User, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.users.values().any(|existing| existing.phone == user.phone) {
            return Err(RepositoryError::Conflict(
                "phone number already registered".to_string(),
            ));
        }
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    fn fetch_user(&self, id: &UserId) -> Result<Option<User>, RepositoryError> {
        Ok(self.tables()?.users.get(id).cloned())
    }

    fn update_rating(&self, id: &UserId, summary: RatingSummary) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let user = tables.users.get_mut(id).ok_or(RepositoryError::NotFound)?;
        user.rating_avg = summary.average;
        user.rating_count = summary.count;
        Ok(())
    }
}

impl JobRepository for MemoryStore {
    fn insert_job(&self, job: Job) -> Result<Job, RepositoryError> {
        let mut tables = self.tables()?;
        if tables.jobs.iter().any(|existing| existing.id == job.id) {
            return Err(RepositoryError::Conflict("job already exists".to_string()));
        }
        tables.jobs.push(job.clone());
        Ok(job)
    }

    fn fetch_job(&self, id: &JobId) -> Result<Option<Job>, RepositoryError> {
        Ok(self.tables()?.jobs.iter().find(|job| job.id == *id).cloned())
    }

    fn update_job(&self, job: Job) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let stored = tables.job_mut(&job.id).ok_or(RepositoryError::NotFound)?;
        *stored = job;
        Ok(())
    }

    fn jobs_for_employer(&self, employer: &UserId) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .jobs
            .iter()
            .rev()
            .filter(|job| job.employer_id == *employer)
            .cloned()
            .collect())
    }

    fn jobs_for_worker(&self, worker: &UserId) -> Result<Vec<Job>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .jobs
            .iter()
            .rev()
            .filter(|job| job.assigned_worker_id.as_ref() == Some(worker))
            .cloned()
            .collect())
    }

    fn open_jobs_within(
        &self,
        origin: &GeoPoint,
        radius_km: f64,
    ) -> Result<Vec<JobWithDistance>, RepositoryError> {
        let tables = self.tables()?;
        Ok(geo::open_within(origin, radius_km, &tables.jobs))
    }
}

impl ApplicationRepository for MemoryStore {
    fn insert_application(
        &self,
        application: Application,
    ) -> Result<Application, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.applications.iter().any(|existing| {
            existing.worker_id == application.worker_id && existing.job_id == application.job_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict(
                "you have already applied for this job".to_string(),
            ));
        }
        tables.applications.push(application.clone());
        Ok(application)
    }

    fn fetch_application(
        &self,
        id: &ApplicationId,
    ) -> Result<Option<Application>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .applications
            .iter()
            .find(|application| application.id == *id)
            .cloned())
    }

    fn application_for(
        &self,
        worker: &UserId,
        job: &JobId,
    ) -> Result<Option<Application>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .applications
            .iter()
            .find(|application| application.worker_id == *worker && application.job_id == *job)
            .cloned())
    }

    fn decide_application(
        &self,
        application: Application,
        expected: ApplicationStatus,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;
        let stored = tables
            .application_mut(&application.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.status != expected {
            return Err(RepositoryError::Conflict(format!(
                "application was already {}",
                stored.status
            )));
        }
        *stored = application;
        Ok(())
    }

    fn applications_for_job(&self, job: &JobId) -> Result<Vec<Application>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .applications
            .iter()
            .rev()
            .filter(|application| application.job_id == *job)
            .cloned()
            .collect())
    }
}

impl RatingRepository for MemoryStore {
    fn insert_rating(&self, rating: Rating) -> Result<Rating, RepositoryError> {
        let mut tables = self.tables()?;
        let duplicate = tables.ratings.iter().any(|existing| {
            existing.job_id == rating.job_id && existing.from_user_id == rating.from_user_id
        });
        if duplicate {
            return Err(RepositoryError::Conflict(
                "you have already rated for this job".to_string(),
            ));
        }
        tables.ratings.push(rating.clone());
        Ok(rating)
    }

    fn rating_exists(&self, job: &JobId, from: &UserId) -> Result<bool, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .ratings
            .iter()
            .any(|rating| rating.job_id == *job && rating.from_user_id == *from))
    }

    fn rating_summary(&self, user: &UserId) -> Result<RatingSummary, RepositoryError> {
        let tables = self.tables()?;
        let (total, count) = tables
            .ratings
            .iter()
            .filter(|rating| rating.to_user_id == *user)
            .fold((0u64, 0u32), |(total, count), rating| {
                (total + u64::from(rating.score), count + 1)
            });

        let average = if count == 0 {
            0.0
        } else {
            total as f64 / f64::from(count)
        };
        Ok(RatingSummary { average, count })
    }

    fn ratings_for_job(&self, job: &JobId) -> Result<Vec<Rating>, RepositoryError> {
        let tables = self.tables()?;
        Ok(tables
            .ratings
            .iter()
            .filter(|rating| rating.job_id == *job)
            .cloned()
            .collect())
    }
}

impl HiringUnitOfWork for MemoryStore {
    fn commit_acceptance(
        &self,
        application: Application,
        job: Job,
    ) -> Result<(), RepositoryError> {
        let mut tables = self.tables()?;

        match tables.application_mut(&application.id) {
            Some(stored) if stored.status == ApplicationStatus::Pending => {}
            Some(_) => {
                return Err(RepositoryError::Conflict(
                    "application was already decided".to_string(),
                ))
            }
            None => return Err(RepositoryError::NotFound),
        }
        match tables.job_mut(&job.id) {
            Some(stored) if stored.status == JobStatus::Open => {}
            Some(_) => {
                return Err(RepositoryError::Conflict(
                    "job was already assigned".to_string(),
                ))
            }
            None => return Err(RepositoryError::NotFound),
        }

        // Both rows were located above; write them under the same guard.
        if let Some(stored) = tables.application_mut(&application.id) {
            *stored = application;
        }
        if let Some(stored) = tables.job_mut(&job.id) {
            *stored = job;
        }
        Ok(())
    }
}
