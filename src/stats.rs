use std::collections::HashMap;

use chrono::{Duration, NaiveDate, Timelike};

use crate::calendar::{Granularity, compute_window, sessions_on_date};
use crate::domain::{Planner, StudySession};

pub const DUE_SOON_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseTotal {
    pub course: String,
    pub planned: Duration,
}

/// Figures for the dashboard header and the weekly stats panel.
#[derive(Debug, Clone)]
pub struct DashboardSummary {
    pub today: NaiveDate,
    pub sessions_today: usize,
    pub tasks_due_soon: usize,
    pub overdue_tasks: usize,
    pub completed_tasks: usize,
    pub total_tasks: usize,
    pub week_start: NaiveDate,
    pub daily: Vec<(NaiveDate, Duration)>,
    pub week_total: Duration,
    pub avg_per_day: Duration,
    pub active_days: usize,
    pub overloaded_days: Vec<NaiveDate>,
    pub outside_preferred_time: usize,
    pub top_courses: Vec<CourseTotal>,
}

impl DashboardSummary {
    pub fn build(planner: &Planner, today: NaiveDate) -> Self {
        let sessions = &planner.header.sessions;
        let tasks = &planner.header.tasks;
        let preferences = planner.preferences();
        let max_daily = Duration::hours(preferences.max_daily_hours.into());

        let tasks_due_soon = tasks
            .iter()
            .filter(|task| !task.completed)
            .filter(|task| {
                let days_until = (task.due - today).num_days();
                (0..DUE_SOON_DAYS).contains(&days_until)
            })
            .count();
        let overdue_tasks = tasks.iter().filter(|task| task.is_overdue(today)).count();
        let completed_tasks = tasks.iter().filter(|task| task.completed).count();

        let window = compute_window(today, Granularity::Week);
        let mut daily = Vec::new();
        let mut week_total = Duration::zero();
        let mut active_days = 0usize;
        let mut overloaded_days = Vec::new();
        let mut outside_preferred_time = 0usize;
        let mut course_totals: HashMap<String, Duration> = HashMap::new();

        for day in &window.dates {
            let mut day_total = Duration::zero();
            for session in sessions_on_date(sessions, *day) {
                day_total += session.duration();
                *course_totals
                    .entry(session.course.clone())
                    .or_insert_with(Duration::zero) += session.duration();
                if !within_hours(session, preferences.preferred_study_time.hours()) {
                    outside_preferred_time += 1;
                }
            }

            if day_total > Duration::zero() {
                active_days += 1;
            }
            if day_total > max_daily {
                overloaded_days.push(*day);
            }
            week_total += day_total;
            daily.push((*day, day_total));
        }

        let mut top_courses = course_totals
            .into_iter()
            .map(|(course, planned)| CourseTotal { course, planned })
            .collect::<Vec<_>>();
        top_courses.sort_by(|left, right| {
            right
                .planned
                .cmp(&left.planned)
                .then_with(|| left.course.cmp(&right.course))
        });

        Self {
            today,
            sessions_today: sessions_on_date(sessions, today).count(),
            tasks_due_soon,
            overdue_tasks,
            completed_tasks,
            total_tasks: tasks.len(),
            week_start: window.first(),
            daily,
            week_total,
            avg_per_day: Duration::minutes(week_total.num_minutes() / 7),
            active_days,
            overloaded_days,
            outside_preferred_time,
            top_courses,
        }
    }

    pub fn completion_percent(&self) -> u32 {
        if self.total_tasks == 0 {
            return 0;
        }
        ((self.completed_tasks * 100) / self.total_tasks) as u32
    }

    /// Planned hours rounded to one decimal, e.g. `3.5h`.
    pub fn week_hours_label(&self) -> String {
        format!("{:.1}h", self.week_total.num_minutes() as f64 / 60.0)
    }
}

fn within_hours(session: &StudySession, (start, end): (u32, u32)) -> bool {
    let hour = session.start.hour();
    if start <= end {
        hour >= start && hour < end
    } else {
        hour >= start || hour < end
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::DashboardSummary;
    use crate::domain::{Planner, Priority};

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn summarises_the_current_week() {
        let mut planner = Planner::new();
        let today = date(2025, 4, 15);
        planner.seed_demo(today).expect("seed should succeed");
        planner
            .add_task(
                "Old quiz corrections".to_string(),
                "Physics 202".to_string(),
                date(2025, 4, 10),
                Priority::Low,
            )
            .expect("task should be created");

        let summary = DashboardSummary::build(&planner, today);
        assert_eq!(summary.sessions_today, 1);
        assert_eq!(summary.week_start, date(2025, 4, 14));
        assert_eq!(summary.week_total.num_minutes(), 90 + 90 + 60 + 90 + 120);
        assert_eq!(summary.week_hours_label(), "7.5h");
        assert_eq!(summary.active_days, 4);
        assert_eq!(summary.tasks_due_soon, 4);
        assert_eq!(summary.overdue_tasks, 1);
        assert_eq!(summary.completed_tasks, 1);
        assert_eq!(summary.total_tasks, 6);
        assert_eq!(summary.completion_percent(), 16);
        assert_eq!(summary.top_courses[0].course, "Biology 301");
        // 15:00, 14:00 and 16:00 starts fall outside the default morning slot
        assert_eq!(summary.outside_preferred_time, 3);
    }

    #[test]
    fn flags_days_over_the_daily_limit() {
        let mut planner = Planner::new();
        let day = date(2025, 4, 16);
        planner
            .add_session(
                "Marathon".to_string(),
                "Mathematics 201".to_string(),
                day,
                time(6, 0),
                time(13, 0),
                None,
            )
            .expect("session should be created");

        let summary = DashboardSummary::build(&planner, day);
        assert_eq!(summary.overloaded_days, vec![day]);
        assert_eq!(summary.completion_percent(), 0);
    }
}
