//! In-memory student sessions
//!
//! Each session owns one [`Questionnaire`]. The registry lock is held only
//! for synchronous engine calls, never across the persistence await.
//!
//! Sessions are collected by [`start_session_sweeper`]: submitted ones after
//! a short retention window, abandoned ones after an idle timeout.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use cpath_common::questionnaire::SubmissionPhase;
use cpath_common::registration::StudentDetails;
use cpath_common::{AnswerMap, Questionnaire};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time;
use tracing::{debug, info};
use uuid::Uuid;

/// One student's questionnaire plus who they are
#[derive(Debug)]
pub struct StudentSession {
    pub student: StudentDetails,
    pub school_id: Option<Uuid>,
    pub questionnaire: Questionnaire,
    pub started_at: DateTime<Utc>,
    /// Updated on every registry access
    pub last_activity: DateTime<Utc>,
    /// Set once the submission has been persisted
    pub submission_id: Option<Uuid>,
    /// Message from the most recent failed submission
    pub last_error: Option<String>,
}

impl StudentSession {
    pub fn new(student: StudentDetails, school_id: Option<Uuid>, questionnaire: Questionnaire) -> Self {
        let now = Utc::now();
        Self {
            student,
            school_id,
            questionnaire,
            started_at: now,
            last_activity: now,
            submission_id: None,
            last_error: None,
        }
    }

    /// Snapshot of what the sink needs, taken when a submission starts
    pub fn pending(&self, answers: AnswerMap) -> PendingSubmission {
        PendingSubmission {
            student: self.student.clone(),
            school_id: self.school_id,
            answers,
        }
    }

    fn is_submitted(&self) -> bool {
        self.questionnaire.phase() == SubmissionPhase::Submitted
    }
}

/// Submission that left the engine and is on its way to the sink
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub student: StudentDetails,
    pub school_id: Option<Uuid>,
    pub answers: AnswerMap,
}

/// When sessions become eligible for collection
#[derive(Debug, Clone, Copy)]
pub struct SessionExpiry {
    /// Editing sessions untouched for this long are dropped
    pub idle_timeout: ChronoDuration,
    /// Submitted sessions are kept this long so the result can be re-read
    pub submitted_retention: ChronoDuration,
}

impl SessionExpiry {
    pub fn from_secs(idle_timeout_secs: u64, submitted_retention_secs: u64) -> Self {
        Self {
            idle_timeout: ChronoDuration::seconds(idle_timeout_secs as i64),
            submitted_retention: ChronoDuration::seconds(submitted_retention_secs as i64),
        }
    }
}

/// Shared map of active sessions
#[derive(Debug, Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<HashMap<Uuid, StudentSession>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a session and return its id
    pub fn insert(&self, session: StudentSession) -> Uuid {
        let id = Uuid::new_v4();
        self.lock().insert(id, session);
        id
    }

    /// Run `f` against one session; `None` if the id is unknown
    pub fn with_session<T>(&self, id: Uuid, f: impl FnOnce(&mut StudentSession) -> T) -> Option<T> {
        self.lock().get_mut(&id).map(|session| {
            session.last_activity = Utc::now();
            f(session)
        })
    }

    /// Sessions held in memory, including submitted ones awaiting collection
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sessions that have not reached the submitted state
    pub fn active_count(&self) -> usize {
        self.lock().values().filter(|s| !s.is_submitted()).count()
    }

    /// Drop expired sessions as of `now`; returns how many were removed
    ///
    /// A session with a submission in flight is never dropped.
    pub fn sweep_at(&self, now: DateTime<Utc>, expiry: &SessionExpiry) -> usize {
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, session| {
            let idle = now - session.last_activity;
            match session.questionnaire.phase() {
                SubmissionPhase::InFlight => true,
                SubmissionPhase::Submitted => idle < expiry.submitted_retention,
                SubmissionPhase::Editing => idle < expiry.idle_timeout,
            }
        });
        before - sessions.len()
    }

    pub fn sweep(&self, expiry: &SessionExpiry) -> usize {
        self.sweep_at(Utc::now(), expiry)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Uuid, StudentSession>> {
        // A panic inside an engine call cannot leave the map half-updated
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Start the background task that collects expired sessions
pub fn start_session_sweeper(
    registry: SessionRegistry,
    expiry: SessionExpiry,
    every: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        info!("Session sweeper started ({}s interval)", every.as_secs());

        loop {
            interval.tick().await;
            let removed = registry.sweep(&expiry);
            if removed > 0 {
                debug!("Collected {} expired session(s), {} remain", removed, registry.len());
            }
        }
    })
}
