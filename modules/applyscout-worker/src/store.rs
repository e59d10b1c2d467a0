use std::sync::Mutex;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use applyscout_common::TaskStatus;

/// A stored user preference record, one per job-seeking profile.
#[derive(Debug, Clone)]
pub struct PreferenceProfile {
    pub id: Uuid,
    pub email: String,
    pub title: Option<String>,
    pub location: Option<String>,
    pub min_salary: Option<u32>,
    pub remote_ok: bool,
    pub keywords: Vec<String>,
    pub resume_text: Option<String>,
    /// Keywords extracted from the resume, merged into search keywords
    /// at discovery time.
    pub resume_keywords: Vec<String>,
}

/// A persisted job lead, unique per (profile, dedupe hash).
#[derive(Debug, Clone)]
pub struct LeadRecord {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub url: String,
    pub dedupe_hash: String,
    pub title: String,
    pub company: String,
    pub score: f64,
    pub sources: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Lead fields supplied at insert time; id and timestamp are assigned by
/// the store.
#[derive(Debug, Clone)]
pub struct NewLead {
    pub profile_id: Uuid,
    pub url: String,
    pub dedupe_hash: String,
    pub title: String,
    pub company: String,
    pub score: f64,
    pub sources: Vec<String>,
}

/// A queued apply task handed to the runner, joined with its lead and the
/// owning profile.
#[derive(Debug, Clone)]
pub struct ClaimedTask {
    pub id: Uuid,
    pub lead: LeadRecord,
    pub profile: PreferenceProfile,
}

/// Persistence seam for profiles, leads, and the apply-task queue.
/// The worker never touches storage except through this trait.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn load_profiles(&self) -> Result<Vec<PreferenceProfile>>;

    async fn find_lead_by_hash(
        &self,
        profile_id: Uuid,
        dedupe_hash: &str,
    ) -> Result<Option<LeadRecord>>;

    async fn insert_lead(&self, lead: NewLead) -> Result<LeadRecord>;

    /// Whether any apply task (in any status) already exists for this lead.
    async fn lead_has_task(&self, lead_id: Uuid) -> Result<bool>;

    async fn enqueue_task(&self, lead_id: Uuid, profile_id: Uuid) -> Result<Uuid>;

    /// Atomically claim up to `limit` queued tasks. A claimed task is not
    /// returned by subsequent claims; it must be resolved via
    /// [`finish_task`](JobStore::finish_task) or returned with
    /// [`release_task`](JobStore::release_task).
    async fn claim_queued(&self, limit: usize) -> Result<Vec<ClaimedTask>>;

    /// Return a claimed task to the queue untouched, eligible for the
    /// next claim.
    async fn release_task(&self, task_id: Uuid) -> Result<()>;

    async fn finish_task(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        error_note: Option<String>,
    ) -> Result<()>;
}

#[derive(Debug, Clone)]
struct TaskRecord {
    id: Uuid,
    lead_id: Uuid,
    profile_id: Uuid,
    status: TaskStatus,
    error_note: Option<String>,
    claimed: bool,
}

#[derive(Default)]
struct Inner {
    profiles: Vec<PreferenceProfile>,
    leads: Vec<LeadRecord>,
    tasks: Vec<TaskRecord>,
}

/// In-memory store backing tests and offline single-process runs.
/// State does not survive a restart.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_profile(&self, profile: PreferenceProfile) {
        self.inner.lock().unwrap().profiles.push(profile);
    }

    pub fn set_resume_text(&self, profile_id: Uuid, resume_text: Option<String>) {
        if let Some(profile) = self
            .inner
            .lock()
            .unwrap()
            .profiles
            .iter_mut()
            .find(|p| p.id == profile_id)
        {
            profile.resume_text = resume_text;
        }
    }

    pub fn lead_count(&self) -> usize {
        self.inner.lock().unwrap().leads.len()
    }

    pub fn queued_count(&self) -> usize {
        self.inner
            .lock()
            .unwrap()
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Queued && !t.claimed)
            .count()
    }

    /// Snapshot of (task id, status, error note) for assertions.
    pub fn task_statuses(&self) -> Vec<(Uuid, TaskStatus, Option<String>)> {
        self.inner
            .lock()
            .unwrap()
            .tasks
            .iter()
            .map(|t| (t.id, t.status, t.error_note.clone()))
            .collect()
    }
}

#[async_trait]
impl JobStore for MemoryStore {
    async fn load_profiles(&self) -> Result<Vec<PreferenceProfile>> {
        Ok(self.inner.lock().unwrap().profiles.clone())
    }

    async fn find_lead_by_hash(
        &self,
        profile_id: Uuid,
        dedupe_hash: &str,
    ) -> Result<Option<LeadRecord>> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .leads
            .iter()
            .find(|l| l.profile_id == profile_id && l.dedupe_hash == dedupe_hash)
            .cloned())
    }

    async fn insert_lead(&self, lead: NewLead) -> Result<LeadRecord> {
        let record = LeadRecord {
            id: Uuid::new_v4(),
            profile_id: lead.profile_id,
            url: lead.url,
            dedupe_hash: lead.dedupe_hash,
            title: lead.title,
            company: lead.company,
            score: lead.score,
            sources: lead.sources,
            created_at: Utc::now(),
        };
        self.inner.lock().unwrap().leads.push(record.clone());
        Ok(record)
    }

    async fn lead_has_task(&self, lead_id: Uuid) -> Result<bool> {
        Ok(self
            .inner
            .lock()
            .unwrap()
            .tasks
            .iter()
            .any(|t| t.lead_id == lead_id))
    }

    async fn enqueue_task(&self, lead_id: Uuid, profile_id: Uuid) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.inner.lock().unwrap().tasks.push(TaskRecord {
            id,
            lead_id,
            profile_id,
            status: TaskStatus::Queued,
            error_note: None,
            claimed: false,
        });
        Ok(id)
    }

    async fn claim_queued(&self, limit: usize) -> Result<Vec<ClaimedTask>> {
        let mut inner = self.inner.lock().unwrap();
        let Inner {
            profiles,
            leads,
            tasks,
        } = &mut *inner;

        let mut claimed = Vec::new();
        for task in tasks.iter_mut() {
            if claimed.len() >= limit {
                break;
            }
            if task.status != TaskStatus::Queued || task.claimed {
                continue;
            }
            let lead = leads
                .iter()
                .find(|l| l.id == task.lead_id)
                .cloned()
                .ok_or_else(|| anyhow!("task {} references missing lead", task.id))?;
            let profile = profiles
                .iter()
                .find(|p| p.id == task.profile_id)
                .cloned()
                .ok_or_else(|| anyhow!("task {} references missing profile", task.id))?;
            task.claimed = true;
            claimed.push(ClaimedTask {
                id: task.id,
                lead,
                profile,
            });
        }
        Ok(claimed)
    }

    async fn release_task(&self, task_id: Uuid) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| anyhow!("unknown task {task_id}"))?;
        task.claimed = false;
        Ok(())
    }

    async fn finish_task(
        &self,
        task_id: Uuid,
        status: TaskStatus,
        error_note: Option<String>,
    ) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        let task = inner
            .tasks
            .iter_mut()
            .find(|t| t.id == task_id)
            .ok_or_else(|| anyhow!("unknown task {task_id}"))?;
        task.status = status;
        task.error_note = error_note;
        Ok(())
    }
}
