use chrono::NaiveDate;

use crate::domain::{Planner, Priority, StudySession, Task};
use crate::error::{PlannerError, ValidationError};

pub trait SessionStore {
    fn list_all(&self) -> &[StudySession];

    fn insert(&mut self, session: StudySession) -> Result<(), PlannerError>;

    fn remove(&mut self, id: &str) -> Result<StudySession, PlannerError>;
}

pub trait TaskStore {
    fn list_all(&self) -> &[Task];

    fn insert(&mut self, task: Task) -> Result<(), PlannerError>;

    /// Applies `patch` and returns the updated record, or `TaskNotFound`.
    fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, PlannerError>;
}

/// Fields left as `None` are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub course: Option<String>,
    pub due: Option<NaiveDate>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    fn apply(self, task: &mut Task) {
        if let Some(title) = self.title {
            task.title = title.trim().to_string();
        }
        if let Some(course) = self.course {
            task.course = course.trim().to_string();
        }
        if let Some(due) = self.due {
            task.due = due;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

impl SessionStore for Planner {
    fn list_all(&self) -> &[StudySession] {
        &self.header.sessions
    }

    fn insert(&mut self, session: StudySession) -> Result<(), PlannerError> {
        session.validate()?;
        if self.contains_id(&session.id) {
            return Err(ValidationError::DuplicateId { id: session.id }.into());
        }
        self.header.sessions.push(session);
        Ok(())
    }

    fn remove(&mut self, id: &str) -> Result<StudySession, PlannerError> {
        self.remove_session(id)
    }
}

impl TaskStore for Planner {
    fn list_all(&self) -> &[Task] {
        &self.header.tasks
    }

    fn insert(&mut self, task: Task) -> Result<(), PlannerError> {
        task.validate()?;
        if self.contains_id(&task.id) {
            return Err(ValidationError::DuplicateId { id: task.id }.into());
        }
        self.header.tasks.push(task);
        Ok(())
    }

    fn update(&mut self, id: &str, patch: TaskPatch) -> Result<Task, PlannerError> {
        let task = self
            .task_mut(id)
            .ok_or_else(|| PlannerError::TaskNotFound(id.to_string()))?;

        let mut updated = task.clone();
        patch.apply(&mut updated);
        updated.validate()?;
        *task = updated.clone();
        log::info!("event=task_updated id={id} completed={}", updated.completed);
        Ok(updated)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::{SessionStore, TaskPatch, TaskStore};
    use crate::domain::{Planner, Priority, StudySession, Task};
    use crate::error::{PlannerError, ValidationError};

    #[test]
    fn inserts_keep_order_and_reject_invalid_records() {
        let mut planner = Planner::new();
        let date = NaiveDate::from_ymd_opt(2025, 4, 16).unwrap();
        let first = StudySession::new(
            "Physics Problem Set",
            "Physics 202",
            date,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 30, 0).unwrap(),
            None,
        )
        .expect("valid session");
        let mut broken = first.clone();
        broken.id = "broken".to_string();
        broken.end = broken.start;

        SessionStore::insert(&mut planner, first.clone()).expect("insert should work");
        assert!(SessionStore::insert(&mut planner, broken).is_err());
        assert_eq!(SessionStore::list_all(&planner), &[first.clone()]);

        let removed = SessionStore::remove(&mut planner, &first.id).expect("remove should work");
        assert_eq!(removed, first);
        assert!(SessionStore::list_all(&planner).is_empty());

        let task = Task::new("Essay", "English", date, Priority::Low).expect("valid task");
        TaskStore::insert(&mut planner, task.clone()).expect("insert should work");
        assert_eq!(TaskStore::list_all(&planner), &[task]);
    }

    #[test]
    fn inserts_reject_an_id_already_in_use() {
        let mut planner = Planner::new();
        let date = NaiveDate::from_ymd_opt(2025, 4, 16).unwrap();
        let first = Task::new("Essay", "English", date, Priority::Low).expect("valid task");
        let mut twin = Task::new("Lab report", "Chemistry 202", date, Priority::High).expect("valid task");
        twin.id = first.id.clone();
        TaskStore::insert(&mut planner, first.clone()).expect("insert should work");

        let err = TaskStore::insert(&mut planner, twin).expect_err("duplicate id should be rejected");
        assert!(matches!(
            err,
            PlannerError::Validation(ValidationError::DuplicateId { ref id }) if *id == first.id
        ));
        assert_eq!(TaskStore::list_all(&planner), &[first.clone()]);

        let mut session = StudySession::new(
            "Physics Problem Set",
            "Physics 202",
            date,
            NaiveTime::from_hms_opt(10, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(11, 0, 0).unwrap(),
            None,
        )
        .expect("valid session");
        session.id = first.id.clone();
        assert!(SessionStore::insert(&mut planner, session).is_err());
        assert!(SessionStore::list_all(&planner).is_empty());
    }

    #[test]
    fn update_patches_only_given_fields() {
        let mut planner = Planner::new();
        let due = NaiveDate::from_ymd_opt(2025, 4, 18).unwrap();
        let id = planner
            .add_task("Submit Research Proposal".to_string(), "Biology 301".to_string(), due, Priority::Low)
            .expect("task should be created");

        let updated = planner
            .update(
                &id,
                TaskPatch {
                    priority: Some(Priority::High),
                    ..TaskPatch::default()
                },
            )
            .expect("update should work");
        assert_eq!(updated.priority, Priority::High);
        assert_eq!(updated.due, due);
        assert_eq!(updated.title, "Submit Research Proposal");
        assert_eq!(TaskStore::list_all(&planner)[0], updated);
    }

    #[test]
    fn invalid_patch_leaves_the_task_untouched() {
        let mut planner = Planner::new();
        let due = NaiveDate::from_ymd_opt(2025, 4, 18).unwrap();
        let id = planner
            .add_task("Essay".to_string(), "English".to_string(), due, Priority::Medium)
            .expect("task should be created");

        let err = planner
            .update(
                &id,
                TaskPatch {
                    title: Some("   ".to_string()),
                    completed: Some(true),
                    ..TaskPatch::default()
                },
            )
            .expect_err("blank title should be rejected");
        assert!(matches!(err, PlannerError::Validation(_)));
        let task = planner.task(&id).unwrap();
        assert_eq!(task.title, "Essay");
        assert!(!task.completed);
    }

    #[test]
    fn update_of_unknown_task_is_not_found() {
        let mut planner = Planner::new();
        let err = planner
            .update("nope", TaskPatch::completed(true))
            .expect_err("task should be missing");
        assert!(matches!(err, PlannerError::TaskNotFound(id) if id == "nope"));
    }
}
