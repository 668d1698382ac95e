// Task board controller with optimistic mutations

use chrono::{Local, NaiveDate, SecondsFormat, TimeZone};

use crate::api::{ApiError, CreateTaskBody, TaskApi, TaskPatch, TaskView};

const INITIAL_STATUS: &str = "NOT_STARTED";

/// Input for a new task. A date-only deadline is normalized to the end of
/// that day in local time before it goes on the wire.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub notes: Option<String>,
    pub due_date: Option<NaiveDate>,
    pub priority: Option<i64>,
}

/// Ordered task list plus the last server-confirmed snapshot. Updates and
/// deletes apply locally first; a failed request restores the snapshot
/// wholesale rather than undoing individual fields. Overlapping mutations
/// are not serialized; the last response wins.
pub struct ProjectBoard<A: TaskApi> {
    api: A,
    project_id: String,
    baseline: Vec<TaskView>,
    tasks: Vec<TaskView>,
}

impl<A: TaskApi> ProjectBoard<A> {
    pub async fn load(api: A, project_id: impl Into<String>) -> Result<Self, ApiError> {
        let project_id = project_id.into();
        let tasks = api.list_tasks(&project_id).await?;
        Ok(Self {
            api,
            project_id,
            baseline: tasks.clone(),
            tasks,
        })
    }

    pub fn tasks(&self) -> &[TaskView] {
        &self.tasks
    }

    /// No optimistic insert: the task only appears once the server
    /// confirms it. The local copy always starts as `NOT_STARTED`, whatever
    /// status the server reported back.
    pub async fn add_task(&mut self, new_task: NewTask) -> Result<(), ApiError> {
        let body = CreateTaskBody {
            title: new_task.title,
            project_id: self.project_id.clone(),
            notes: new_task.notes,
            due_at: new_task.due_date.and_then(end_of_day_local),
            priority: new_task.priority,
        };

        let mut task = self.api.create_task(&body).await?;
        task.status = INITIAL_STATUS.to_owned();
        self.tasks.insert(0, task);
        self.baseline = self.tasks.clone();
        Ok(())
    }

    pub async fn update_task(&mut self, task_id: &str, patch: TaskPatch) -> Result<(), ApiError> {
        if let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) {
            apply_patch(task, &patch);
        }

        match self.api.update_task(task_id, &patch).await {
            Ok(canonical) => {
                if let Some(task) = self.tasks.iter_mut().find(|task| task.id == task_id) {
                    *task = canonical;
                }
                self.baseline = self.tasks.clone();
                Ok(())
            }
            Err(err) => {
                self.tasks = self.baseline.clone();
                Err(err)
            }
        }
    }

    pub async fn delete_task(&mut self, task_id: &str) -> Result<(), ApiError> {
        self.tasks.retain(|task| task.id != task_id);

        match self.api.delete_task(task_id).await {
            Ok(()) => {
                self.baseline = self.tasks.clone();
                Ok(())
            }
            Err(err) => {
                self.tasks = self.baseline.clone();
                Err(err)
            }
        }
    }
}

fn apply_patch(task: &mut TaskView, patch: &TaskPatch) {
    if let Some(title) = &patch.title {
        task.title = title.clone();
    }
    if let Some(notes) = &patch.notes {
        task.notes = notes.clone();
    }
    if let Some(due_at) = &patch.due_at {
        task.due_at = due_at.clone();
    }
    if let Some(priority) = patch.priority {
        task.priority = priority;
    }
    if let Some(status) = &patch.status {
        task.status = status.clone();
    }
}

fn end_of_day_local(date: NaiveDate) -> Option<String> {
    let naive = date.and_hms_milli_opt(23, 59, 59, 999)?;
    let local = Local.from_local_datetime(&naive).earliest()?;
    Some(local.to_rfc3339_opts(SecondsFormat::Millis, true))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::VecDeque;

    fn sample_task(id: &str, title: &str) -> TaskView {
        TaskView {
            id: id.to_owned(),
            project_id: "project-1".to_owned(),
            title: title.to_owned(),
            notes: None,
            due_at: None,
            priority: 0,
            status: "NOT_STARTED".to_owned(),
            created_at: "2026-08-01T00:00:00Z".to_owned(),
            updated_at: "2026-08-01T00:00:00Z".to_owned(),
        }
    }

    fn http_error(status: u16, message: &str) -> ApiError {
        ApiError::Http {
            status,
            message: message.to_owned(),
        }
    }

    #[derive(Default)]
    struct ScriptedApi {
        listed: Vec<TaskView>,
        create_results: Mutex<VecDeque<Result<TaskView, ApiError>>>,
        update_results: Mutex<VecDeque<Result<TaskView, ApiError>>>,
        delete_results: Mutex<VecDeque<Result<(), ApiError>>>,
        seen_creates: Mutex<Vec<CreateTaskBody>>,
    }

    #[async_trait]
    impl TaskApi for &ScriptedApi {
        async fn create_task(&self, body: &CreateTaskBody) -> Result<TaskView, ApiError> {
            self.seen_creates.lock().push(body.clone());
            self.create_results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(http_error(500, "no scripted create result")))
        }

        async fn update_task(
            &self,
            _task_id: &str,
            _patch: &TaskPatch,
        ) -> Result<TaskView, ApiError> {
            self.update_results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(http_error(500, "no scripted update result")))
        }

        async fn delete_task(&self, _task_id: &str) -> Result<(), ApiError> {
            self.delete_results
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(http_error(500, "no scripted delete result")))
        }

        async fn list_tasks(&self, _project_id: &str) -> Result<Vec<TaskView>, ApiError> {
            Ok(self.listed.clone())
        }
    }

    #[tokio::test]
    async fn failed_update_restores_the_baseline_exactly() {
        let api = ScriptedApi {
            listed: vec![sample_task("t1", "First"), sample_task("t2", "Second")],
            ..Default::default()
        };
        api.update_results
            .lock()
            .push_back(Err(http_error(404, "Task not found")));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        let baseline = board.tasks().to_vec();

        let err = board
            .update_task("t1", TaskPatch::default().title("Renamed"))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Task not found");
        assert_eq!(board.tasks(), baseline.as_slice());
    }

    #[tokio::test]
    async fn successful_update_keeps_the_canonical_task() {
        let api = ScriptedApi {
            listed: vec![sample_task("t1", "First")],
            ..Default::default()
        };
        let mut canonical = sample_task("t1", "Renamed by server");
        canonical.status = "IN_PROGRESS".to_owned();
        api.update_results.lock().push_back(Ok(canonical.clone()));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        board
            .update_task("t1", TaskPatch::default().title("Renamed"))
            .await
            .unwrap();

        assert_eq!(board.tasks(), &[canonical]);
    }

    #[tokio::test]
    async fn failed_delete_reinserts_the_task() {
        let api = ScriptedApi {
            listed: vec![sample_task("t1", "First"), sample_task("t2", "Second")],
            ..Default::default()
        };
        api.delete_results
            .lock()
            .push_back(Err(http_error(404, "Task not found")));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        let baseline = board.tasks().to_vec();

        let err = board.delete_task("t2").await.unwrap_err();
        assert_eq!(err.message(), "Task not found");
        assert_eq!(board.tasks(), baseline.as_slice());
    }

    #[tokio::test]
    async fn successful_delete_updates_the_baseline() {
        let api = ScriptedApi {
            listed: vec![sample_task("t1", "First"), sample_task("t2", "Second")],
            ..Default::default()
        };
        api.delete_results.lock().push_back(Ok(()));
        api.update_results
            .lock()
            .push_back(Err(http_error(500, "boom")));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        board.delete_task("t1").await.unwrap();
        assert_eq!(board.tasks().len(), 1);

        // A later failed update rolls back to the post-delete state, not
        // the original two-task list.
        let _ = board
            .update_task("t2", TaskPatch::default().title("Renamed"))
            .await
            .unwrap_err();
        assert_eq!(board.tasks().len(), 1);
        assert_eq!(board.tasks()[0].id, "t2");
    }

    #[tokio::test]
    async fn create_forces_local_status_to_not_started() {
        let api = ScriptedApi::default();
        let mut returned = sample_task("t9", "Brand new");
        returned.status = "DONE".to_owned();
        api.create_results.lock().push_back(Ok(returned));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        board
            .add_task(NewTask {
                title: "Brand new".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(board.tasks()[0].status, "NOT_STARTED");
    }

    #[tokio::test]
    async fn create_prepends_the_new_task() {
        let api = ScriptedApi {
            listed: vec![sample_task("t1", "Existing")],
            ..Default::default()
        };
        api.create_results
            .lock()
            .push_back(Ok(sample_task("t2", "New")));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        board
            .add_task(NewTask {
                title: "New".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(board.tasks()[0].id, "t2");
        assert_eq!(board.tasks()[1].id, "t1");
    }

    #[tokio::test]
    async fn date_only_deadline_is_normalized_to_end_of_day() {
        let api = ScriptedApi::default();
        api.create_results
            .lock()
            .push_back(Ok(sample_task("t1", "Deadline")));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        let due = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        board
            .add_task(NewTask {
                title: "Deadline".to_owned(),
                due_date: Some(due),
                ..Default::default()
            })
            .await
            .unwrap();

        let sent = api.seen_creates.lock();
        let due_at = sent[0].due_at.as_deref().unwrap();
        assert!(
            due_at.contains("23:59:59.999"),
            "expected end-of-day deadline, got {due_at}"
        );
    }

    #[tokio::test]
    async fn failed_create_leaves_the_list_untouched() {
        let api = ScriptedApi {
            listed: vec![sample_task("t1", "Existing")],
            ..Default::default()
        };
        api.create_results
            .lock()
            .push_back(Err(http_error(400, "Title is required")));

        let mut board = ProjectBoard::load(&api, "project-1").await.unwrap();
        let err = board
            .add_task(NewTask {
                title: "  ".to_owned(),
                ..Default::default()
            })
            .await
            .unwrap_err();

        assert_eq!(err.message(), "Title is required");
        assert_eq!(board.tasks().len(), 1);
    }
}
