//! Deterministic doubles for the provider seams, plus fixture builders.
//! Compiled for unit tests and, via the `test-support` feature, for
//! integration tests.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use anyhow::{bail, Result};
use async_trait::async_trait;
use uuid::Uuid;

use applyscout_common::{
    ApplyInput, ApplyOutcome, ApplyPreferences, ApplyStatus, RawSearchResult, UserProfile,
};

use crate::adapter::ApplyAdapter;
use crate::search::SearchProvider;
use crate::store::PreferenceProfile;

pub fn make_input(job_url: &str) -> ApplyInput {
    ApplyInput {
        job_url: job_url.to_string(),
        user_profile: UserProfile {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            phone: None,
        },
        resume_text: "Experienced engineer with a decade of Rust and Python.".to_string(),
        preferences: ApplyPreferences {
            title: Some("Engineer".to_string()),
            location: None,
            min_salary: None,
            keywords: Vec::new(),
        },
        submit: None,
    }
}

pub fn make_profile(email: &str) -> PreferenceProfile {
    PreferenceProfile {
        id: Uuid::new_v4(),
        email: email.to_string(),
        title: Some("Software Engineer".to_string()),
        location: Some("Berlin".to_string()),
        min_salary: None,
        remote_ok: true,
        keywords: vec!["rust".to_string()],
        resume_text: Some("Rust engineer, distributed systems.".to_string()),
        resume_keywords: vec!["tokio".to_string()],
    }
}

pub fn make_hit(title: &str, url: &str, score: f64) -> RawSearchResult {
    RawSearchResult {
        title: title.to_string(),
        url: url.to_string(),
        content: format!("{title} description"),
        score: Some(score),
    }
}

enum ScriptedQuery {
    Hits(Vec<RawSearchResult>),
    Fail(String),
}

/// Search double scripted per query string. Unregistered queries return
/// an empty hit list, mirroring a provider that found nothing.
#[derive(Default)]
pub struct MockSearcher {
    queries: HashMap<String, ScriptedQuery>,
}

impl MockSearcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_query(mut self, query: &str, hits: Vec<RawSearchResult>) -> Self {
        self.queries
            .insert(query.to_string(), ScriptedQuery::Hits(hits));
        self
    }

    pub fn fail_query(mut self, query: &str, message: &str) -> Self {
        self.queries
            .insert(query.to_string(), ScriptedQuery::Fail(message.to_string()));
        self
    }
}

#[async_trait]
impl SearchProvider for MockSearcher {
    async fn search(&self, query: &str) -> Result<Vec<RawSearchResult>> {
        match self.queries.get(query) {
            Some(ScriptedQuery::Hits(hits)) => Ok(hits.clone()),
            Some(ScriptedQuery::Fail(message)) => bail!("{message}"),
            None => Ok(Vec::new()),
        }
    }
}

#[derive(Clone)]
enum Step {
    /// Succeed with the given status; `None` mirrors the submit flag
    /// (SUBMITTED when submitting, PREFILLED otherwise).
    Succeed(Option<ApplyStatus>),
    Fail(String),
}

/// Adapter double that plays a scripted sequence of failures and
/// outcomes, then repeats its default step. Records call count and the
/// last submit flag it was handed.
pub struct ScriptedAdapter {
    script: Mutex<VecDeque<Step>>,
    fallback: Step,
    calls: AtomicU32,
    last_submit: Mutex<Option<bool>>,
}

impl ScriptedAdapter {
    fn with_fallback(script: Vec<Step>, fallback: Step) -> Self {
        Self {
            script: Mutex::new(script.into()),
            fallback,
            calls: AtomicU32::new(0),
            last_submit: Mutex::new(None),
        }
    }

    pub fn succeeding(status: ApplyStatus) -> Self {
        Self::with_fallback(Vec::new(), Step::Succeed(Some(status)))
    }

    /// Succeeds, mirroring the submit flag in the outcome status.
    pub fn recording() -> Self {
        Self::with_fallback(Vec::new(), Step::Succeed(None))
    }

    pub fn always_failing(message: &str) -> Self {
        Self::with_fallback(Vec::new(), Step::Fail(message.to_string()))
    }

    pub fn failing_then_succeeding(errors: Vec<&str>, status: ApplyStatus) -> Self {
        let script = errors
            .into_iter()
            .map(|e| Step::Fail(e.to_string()))
            .collect();
        Self::with_fallback(script, Step::Succeed(Some(status)))
    }

    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_submit(&self) -> Option<bool> {
        *self.last_submit.lock().unwrap()
    }
}

#[async_trait]
impl ApplyAdapter for ScriptedAdapter {
    async fn fill_and_submit(&self, input: &ApplyInput, submit: bool) -> Result<ApplyOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_submit.lock().unwrap() = Some(submit);

        let step = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        match step {
            Step::Fail(message) => bail!("{message}"),
            Step::Succeed(status) => {
                let status = status.unwrap_or(if submit {
                    ApplyStatus::Submitted
                } else {
                    ApplyStatus::Prefilled
                });
                Ok(ApplyOutcome {
                    status,
                    notes: format!("scripted outcome for {}", input.job_url),
                    screenshots: Vec::new(),
                })
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
