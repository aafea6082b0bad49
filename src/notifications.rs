use chrono::{DateTime, Duration, Local, NaiveDateTime, TimeZone, Utc};

use crate::domain::{Notification, NotificationKind, Planner, Task};
use crate::error::PlannerError;

impl Planner {
    pub fn unread_count(&self) -> usize {
        self.notifications
            .iter()
            .filter(|notification| !notification.read)
            .count()
    }

    pub fn notifications_of_kind(&self, kind: NotificationKind) -> impl Iterator<Item = &Notification> {
        self.notifications
            .iter()
            .filter(move |notification| notification.kind == kind)
    }

    /// Newest first, the order the feed is shown in.
    pub fn notification_feed(&self, unread_only: bool) -> Vec<&Notification> {
        let mut feed = self
            .notifications
            .iter()
            .filter(|notification| !unread_only || !notification.read)
            .collect::<Vec<_>>();
        feed.sort_by(|left, right| right.created_at.cmp(&left.created_at));
        feed
    }

    pub fn mark_read(&mut self, id: &str) -> Result<(), PlannerError> {
        let notification = self
            .notifications
            .iter_mut()
            .find(|notification| notification.id == id)
            .ok_or_else(|| PlannerError::NotificationNotFound(id.to_string()))?;
        notification.read = true;
        Ok(())
    }

    pub fn mark_all_read(&mut self) -> usize {
        let mut changed = 0;
        for notification in self.notifications.iter_mut().filter(|notification| !notification.read) {
            notification.read = true;
            changed += 1;
        }
        changed
    }

    pub fn dismiss(&mut self, id: &str) -> Result<Notification, PlannerError> {
        let index = self
            .notifications
            .iter()
            .position(|notification| notification.id == id)
            .ok_or_else(|| PlannerError::NotificationNotFound(id.to_string()))?;
        Ok(self.notifications.remove(index))
    }

    /// Adds reminders that are due at `now` and were not generated before.
    /// Returns how many were added.
    pub fn collect_reminders(&mut self, now: DateTime<Utc>) -> usize {
        let reminders = pending_reminders(self, now);
        let added = reminders.len();
        for reminder in reminders {
            self.push_notification(reminder);
        }
        if added > 0 {
            log::info!("event=reminders_collected count={added}");
        }
        added
    }

    /// Records a completion notification when the preference asks for one.
    pub fn celebrate_completion(&mut self, task: &Task, now: DateTime<Utc>) -> Option<String> {
        if !task.completed || !self.preferences().notifications.completion_celebrations {
            return None;
        }
        let notification = Notification::new(
            NotificationKind::Completion,
            "Task Completed",
            format!("You completed {}. Great job!", task.title),
            now,
        )
        .with_source(format!("completion:{}", task.id));
        Some(self.push_notification(notification))
    }
}

fn pending_reminders(planner: &Planner, now: DateTime<Utc>) -> Vec<Notification> {
    let preferences = planner.preferences();
    let mut reminders = Vec::new();

    if preferences.notifications.session_reminders {
        let lead = Duration::minutes(preferences.notify_before_session_minutes.into());
        for session in &planner.header.sessions {
            let Some(starts_at) = local_to_utc(session.date.and_time(session.start)) else {
                continue;
            };
            if starts_at < now || starts_at - now > lead {
                continue;
            }

            let source = format!("session:{}", session.id);
            if planner.has_notification_source(&source) {
                continue;
            }
            let minutes = (starts_at - now).num_minutes();
            reminders.push(
                Notification::new(
                    NotificationKind::Reminder,
                    "Study Session Reminder",
                    format!("Your {} study session starts in {minutes} minutes.", session.title),
                    now,
                )
                .with_source(source),
            );
        }
    }

    if preferences.notifications.deadline_reminders {
        let tomorrow = now.with_timezone(&Local).date_naive() + Duration::days(1);
        for task in &planner.header.tasks {
            if task.completed || task.due != tomorrow {
                continue;
            }
            let source = format!("deadline:{}:{}", task.id, task.due);
            if planner.has_notification_source(&source) {
                continue;
            }
            reminders.push(
                Notification::new(
                    NotificationKind::Deadline,
                    "Assignment Due Soon",
                    format!("{} for {} is due tomorrow.", task.title, task.course),
                    now,
                )
                .with_source(source),
            );
        }
    }

    reminders
}

fn local_to_utc(naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|local| local.with_timezone(&Utc))
}
