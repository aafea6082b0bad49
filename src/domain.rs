use std::collections::HashSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use rand::{Rng, distributions::Alphanumeric, thread_rng};
use serde::{Deserialize, Serialize};

use crate::calendar::start_of_week;
use crate::error::{PlannerError, ValidationError};
use crate::settings::StudyPreferences;

const ID_LEN: usize = 8;
pub const SCHEMA_VERSION: u32 = 1;

pub const SESSION_CATEGORIES: [&str; 6] = ["primary", "secondary", "accent", "green", "purple", "gray"];
pub const DEFAULT_SESSION_CATEGORY: &str = "primary";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StudySession {
    pub id: String,
    pub title: String,
    pub course: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    #[serde(default = "default_category")]
    pub category: String,
}

fn default_category() -> String {
    DEFAULT_SESSION_CATEGORY.to_string()
}

impl StudySession {
    pub fn new(
        title: impl Into<String>,
        course: impl Into<String>,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        category: Option<String>,
    ) -> Result<Self, ValidationError> {
        let session = Self {
            id: generate_id(),
            title: title.into().trim().to_string(),
            course: course.into().trim().to_string(),
            date,
            start,
            end,
            category: category.unwrap_or_else(default_category),
        };
        session.validate()?;
        Ok(session)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, "session title")?;
        require_text(&self.course, "session course")?;
        if self.start >= self.end {
            return Err(ValidationError::SessionTimes {
                id: self.id.clone(),
                start: self.start.format("%H:%M").to_string(),
                end: self.end.format("%H:%M").to_string(),
            });
        }
        Ok(())
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    pub fn time_range(&self) -> String {
        format!("{} - {}", self.start.format("%H:%M"), self.end.format("%H:%M"))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl Display for Priority {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "high" | "h" => Ok(Self::High),
            "medium" | "med" | "m" => Ok(Self::Medium),
            "low" | "l" => Ok(Self::Low),
            other => Err(ValidationError::Priority(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub course: String,
    pub due: NaiveDate,
    pub priority: Priority,
    #[serde(default)]
    pub completed: bool,
}

impl Task {
    pub fn new(
        title: impl Into<String>,
        course: impl Into<String>,
        due: NaiveDate,
        priority: Priority,
    ) -> Result<Self, ValidationError> {
        let task = Self {
            id: generate_id(),
            title: title.into().trim().to_string(),
            course: course.into().trim().to_string(),
            due,
            priority,
            completed: false,
        };
        task.validate()?;
        Ok(task)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        require_text(&self.title, "task title")?;
        reject_control(&self.course, "task course")
    }

    pub fn toggle(&mut self) {
        self.completed = !self.completed;
    }

    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        !self.completed && self.due < today
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Reminder,
    Deadline,
    Insight,
    Break,
    Completion,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reminder => "reminder",
            Self::Deadline => "deadline",
            Self::Insight => "insight",
            Self::Break => "break",
            Self::Completion => "completion",
        }
    }
}

impl Display for NotificationKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "reminder" => Ok(Self::Reminder),
            "deadline" => Ok(Self::Deadline),
            "insight" | "ai" => Ok(Self::Insight),
            "break" => Ok(Self::Break),
            "completion" => Ok(Self::Completion),
            other => Err(ValidationError::NotificationKind(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub id: String,
    pub kind: NotificationKind,
    pub title: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub read: bool,
    /// Identifies what produced the notification, e.g. `session:<id>`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl Notification {
    pub fn new(
        kind: NotificationKind,
        title: impl Into<String>,
        message: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id(),
            kind,
            title: title.into(),
            message: message.into(),
            created_at,
            read: false,
            source: None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.source = Some(source.into());
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlannerHeader {
    pub schema_version: u32,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub preferences: StudyPreferences,
    #[serde(default)]
    pub sessions: Vec<StudySession>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

impl PlannerHeader {
    pub fn new() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            created_at: Utc::now(),
            preferences: StudyPreferences::default(),
            sessions: Vec::new(),
            tasks: Vec::new(),
        }
    }
}

impl Default for PlannerHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Planner {
    pub header: PlannerHeader,
    pub notifications: Vec<Notification>,
}

impl Planner {
    pub fn new() -> Self {
        Self {
            header: PlannerHeader::new(),
            notifications: Vec::new(),
        }
    }

    pub fn preferences(&self) -> &StudyPreferences {
        &self.header.preferences
    }

    pub fn session(&self, id: &str) -> Option<&StudySession> {
        self.header.sessions.iter().find(|session| session.id == id)
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.header.tasks.iter().find(|task| task.id == id)
    }

    pub fn task_mut(&mut self, id: &str) -> Option<&mut Task> {
        self.header.tasks.iter_mut().find(|task| task.id == id)
    }

    pub fn notification(&self, id: &str) -> Option<&Notification> {
        self.notifications
            .iter()
            .find(|notification| notification.id == id)
    }

    pub fn add_session(
        &mut self,
        title: String,
        course: String,
        date: NaiveDate,
        start: NaiveTime,
        end: NaiveTime,
        category: Option<String>,
    ) -> Result<String, PlannerError> {
        let session = StudySession::new(title, course, date, start, end, category)?;
        let id = session.id.clone();
        log::info!("event=session_added id={id} date={date}");
        self.header.sessions.push(session);
        Ok(id)
    }

    pub fn remove_session(&mut self, id: &str) -> Result<StudySession, PlannerError> {
        let index = self
            .header
            .sessions
            .iter()
            .position(|session| session.id == id)
            .ok_or_else(|| PlannerError::SessionNotFound(id.to_string()))?;
        log::info!("event=session_removed id={id}");
        Ok(self.header.sessions.remove(index))
    }

    pub fn add_task(
        &mut self,
        title: String,
        course: String,
        due: NaiveDate,
        priority: Priority,
    ) -> Result<String, PlannerError> {
        let task = Task::new(title, course, due, priority)?;
        let id = task.id.clone();
        log::info!("event=task_added id={id} priority={priority} due={due}");
        self.header.tasks.push(task);
        Ok(id)
    }

    pub fn push_notification(&mut self, notification: Notification) -> String {
        let id = notification.id.clone();
        log::debug!("event=notification_added id={id} kind={}", notification.kind);
        self.notifications.push(notification);
        id
    }

    pub fn has_notification_source(&self, source: &str) -> bool {
        self.notifications
            .iter()
            .any(|notification| notification.source.as_deref() == Some(source))
    }

    /// True when any session, task or notification already uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.session(id).is_some() || self.task(id).is_some() || self.notification(id).is_some()
    }

    pub fn has_records(&self) -> bool {
        !self.header.sessions.is_empty() || !self.header.tasks.is_empty()
    }

    /// Checks every record the way construction does, and that no id is used
    /// twice. Used after loading a file.
    pub fn validate(&self) -> Result<(), ValidationError> {
        for session in &self.header.sessions {
            session.validate()?;
        }
        for task in &self.header.tasks {
            task.validate()?;
        }

        let mut seen = HashSet::new();
        let ids = self
            .header
            .sessions
            .iter()
            .map(|session| &session.id)
            .chain(self.header.tasks.iter().map(|task| &task.id))
            .chain(self.notifications.iter().map(|notification| &notification.id));
        for id in ids {
            if !seen.insert(id.as_str()) {
                return Err(ValidationError::DuplicateId { id: id.clone() });
            }
        }

        self.header.preferences.validate()
    }

    /// Seeds the sample week shown on first launch, anchored on `today`'s week.
    /// A planner that already has sessions or tasks is left alone and `false`
    /// is returned.
    pub fn seed_demo(&mut self, today: NaiveDate) -> Result<bool, PlannerError> {
        if self.has_records() {
            return Ok(false);
        }
        let monday = start_of_week(today);
        let sessions = [
            ("Data Structures Review", "Computer Science 101", 1, (15, 0), (16, 30), "primary"),
            ("Physics Problem Set", "Physics 202", 2, (10, 0), (11, 30), "secondary"),
            ("Essay Outline", "English Literature", 2, (14, 0), (15, 0), "accent"),
            ("Calculus Practice Problems", "Mathematics 201", 3, (9, 0), (10, 30), "green"),
            ("Mid-term Exam Prep", "Biology 301", 4, (16, 0), (18, 0), "purple"),
        ];
        for (title, course, offset, start, end, category) in sessions {
            self.add_session(
                title.to_string(),
                course.to_string(),
                monday + Duration::days(offset),
                clock(start),
                clock(end),
                Some(category.to_string()),
            )?;
        }

        let tasks = [
            ("Complete Calculus Problem Set", "Mathematics 201", 0, Priority::High, false),
            ("Review Chapter 5 Notes", "History 101", 1, Priority::Medium, false),
            ("Submit Research Proposal", "Biology 301", 3, Priority::Low, false),
            ("Practice Lab Experiment", "Chemistry 202", 2, Priority::Medium, true),
            ("Literature Review", "Psychology 101", 4, Priority::High, false),
        ];
        for (title, course, offset, priority, completed) in tasks {
            let id = self.add_task(
                title.to_string(),
                course.to_string(),
                today + Duration::days(offset),
                priority,
            )?;
            if completed {
                if let Some(task) = self.task_mut(&id) {
                    task.completed = true;
                }
            }
        }

        self.header.preferences.courses = distinct_courses(&self.header.sessions);
        Ok(true)
    }
}

/// Course labels in first-seen order.
fn distinct_courses(sessions: &[StudySession]) -> Vec<String> {
    let mut seen = HashSet::new();
    sessions
        .iter()
        .filter(|session| seen.insert(session.course.as_str()))
        .map(|session| session.course.clone())
        .collect()
}

fn require_text(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty { field });
    }
    reject_control(value, field)
}

// Labels are written as single-line TOML strings.
pub(crate) fn reject_control(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.chars().any(char::is_control) {
        return Err(ValidationError::ControlCharacter { field });
    }
    Ok(())
}

fn clock((hour, minute): (u32, u32)) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or(NaiveTime::MIN)
}

pub fn generate_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(ID_LEN)
        .map(char::from)
        .collect()
}

pub fn format_duration(duration: Duration) -> String {
    let total_minutes = duration.num_minutes().max(0);
    let hours = total_minutes / 60;
    let minutes = total_minutes % 60;
    format!("{hours}h{minutes:02}")
}
