use std::collections::{BTreeMap, HashMap};
use std::future::{ready, Future};
use std::sync::{Arc, Mutex, MutexGuard};

use super::domain::{
    ActivityEvent, FeedbackRecord, HealthStatus, MentorId, StudentProfile, TaskSnapshot, UserId,
};
use super::import::LedgerExport;
use super::repository::{EngagementStore, StoreError};
use super::scoring::UserLedger;

/// Process-local store backing the demo, the HTTP service and tests.
#[derive(Debug, Default, Clone)]
pub struct InMemoryEngagementStore {
    state: Arc<Mutex<MemoryState>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    students: BTreeMap<UserId, StudentProfile>,
    activity: Vec<ActivityEvent>,
    tasks: Vec<TaskSnapshot>,
    feedback: Vec<FeedbackRecord>,
    statuses: HashMap<UserId, HealthStatus>,
}

impl InMemoryEngagementStore {
    fn lock(&self) -> Result<MutexGuard<'_, MemoryState>, StoreError> {
        self.state
            .lock()
            .map_err(|_| StoreError::Unavailable("engagement store mutex poisoned".to_string()))
    }

    pub fn add_student(&self, student: StudentProfile) -> Result<(), StoreError> {
        self.lock()?.students.insert(student.user_id.clone(), student);
        Ok(())
    }

    pub fn record_activity(&self, event: ActivityEvent) -> Result<(), StoreError> {
        self.lock()?.activity.push(event);
        Ok(())
    }

    pub fn record_task(&self, task: TaskSnapshot) -> Result<(), StoreError> {
        self.lock()?.tasks.push(task);
        Ok(())
    }

    pub fn record_feedback(&self, feedback: FeedbackRecord) -> Result<(), StoreError> {
        self.lock()?.feedback.push(feedback);
        Ok(())
    }

    /// Append a whole export; students with a known id are replaced.
    pub fn load_export(&self, export: LedgerExport) -> Result<(), StoreError> {
        let mut state = self.lock()?;
        for student in export.students {
            state.students.insert(student.user_id.clone(), student);
        }
        state.activity.extend(export.activity);
        state.tasks.extend(export.tasks);
        state.feedback.extend(export.feedback);
        Ok(())
    }

    /// Number of materialized snapshots, used by callers asserting on writes.
    pub fn status_count(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.statuses.len())
    }

    fn load_ledger(&self, user_id: &UserId) -> Result<UserLedger, StoreError> {
        let state = self.lock()?;

        let mut activity: Vec<ActivityEvent> = state
            .activity
            .iter()
            .filter(|event| &event.user_id == user_id)
            .cloned()
            .collect();
        activity.sort_by_key(|event| event.timestamp);

        let tasks = state
            .tasks
            .iter()
            .filter(|task| &task.user_id == user_id)
            .cloned()
            .collect();

        let feedback = state
            .feedback
            .iter()
            .filter(|record| &record.receiver_id == user_id)
            .cloned()
            .collect();

        Ok(UserLedger {
            activity,
            tasks,
            feedback,
        })
    }

    fn load_students(&self, mentor_id: &MentorId) -> Result<Vec<StudentProfile>, StoreError> {
        let state = self.lock()?;
        Ok(state
            .students
            .values()
            .filter(|student| &student.mentor_id == mentor_id)
            .cloned()
            .collect())
    }

    fn load_statuses(
        &self,
        user_ids: &[UserId],
    ) -> Result<HashMap<UserId, HealthStatus>, StoreError> {
        let state = self.lock()?;
        Ok(user_ids
            .iter()
            .filter_map(|id| state.statuses.get(id).map(|status| (id.clone(), status.clone())))
            .collect())
    }
}

impl EngagementStore for InMemoryEngagementStore {
    fn ledger_for(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<UserLedger, StoreError>> + Send + '_ {
        ready(self.load_ledger(user_id))
    }

    fn students_for_mentor(
        &self,
        mentor_id: &MentorId,
    ) -> impl Future<Output = Result<Vec<StudentProfile>, StoreError>> + Send + '_ {
        ready(self.load_students(mentor_id))
    }

    fn health_status(
        &self,
        user_id: &UserId,
    ) -> impl Future<Output = Result<Option<HealthStatus>, StoreError>> + Send + '_ {
        let result = self
            .lock()
            .map(|state| state.statuses.get(user_id).cloned());
        ready(result)
    }

    fn health_statuses(
        &self,
        user_ids: &[UserId],
    ) -> impl Future<Output = Result<HashMap<UserId, HealthStatus>, StoreError>> + Send + '_ {
        ready(self.load_statuses(user_ids))
    }

    fn upsert_health_status(
        &self,
        status: HealthStatus,
    ) -> impl Future<Output = Result<(), StoreError>> + Send + '_ {
        let result = self.lock().map(|mut state| {
            state.statuses.insert(status.user_id.clone(), status);
        });
        ready(result)
    }
}
