//! Planner view-model: the granularity/anchor/selection state behind the
//! calendar screen, and the snapshot a renderer draws from it.
//!
//! Every transition is synchronous and total. Records stay owned by the
//! stores; the view-model only reads them, except for the completed flag which
//! it flips through [`TaskStore::update`].

use chrono::{Duration, NaiveDate};

use crate::calendar::{
    CalendarWindow, Direction, Granularity, advance, compute_window, sessions_on_date,
};
use crate::domain::{StudySession, Task};
use crate::error::PlannerError;
use crate::priority::order_tasks;
use crate::store::{SessionStore, TaskPatch, TaskStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannerViewModel {
    granularity: Granularity,
    anchor: NaiveDate,
    selected: NaiveDate,
}

impl PlannerViewModel {
    pub fn new(granularity: Granularity, anchor: NaiveDate) -> Self {
        Self {
            granularity,
            anchor,
            selected: anchor,
        }
    }

    /// Builds the view-model from configuration text; an unknown granularity
    /// fails here rather than in a later transition.
    pub fn from_config(granularity: &str, anchor: NaiveDate) -> Result<Self, PlannerError> {
        Ok(Self::new(granularity.parse()?, anchor))
    }

    pub fn granularity(&self) -> Granularity {
        self.granularity
    }

    pub fn anchor(&self) -> NaiveDate {
        self.anchor
    }

    pub fn selected(&self) -> NaiveDate {
        self.selected
    }

    pub fn window(&self) -> CalendarWindow {
        compute_window(self.anchor, self.granularity)
    }

    pub fn set_granularity(&mut self, granularity: Granularity) {
        self.granularity = granularity;
    }

    pub fn go_to_today(&mut self, today: NaiveDate) {
        self.anchor = today;
        self.selected = today;
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.anchor = advance(&self.window(), self.granularity, direction);
    }

    /// Selects `date`, moving the anchor when the date is outside the window
    /// so the selection is always visible.
    pub fn select(&mut self, date: NaiveDate) {
        self.selected = date;
        if !self.window().contains(date) {
            self.anchor = date;
        }
    }

    /// Moves the selection by whole days, following it with the window.
    pub fn shift_selection(&mut self, days: i64) {
        if let Some(date) = self.selected.checked_add_signed(Duration::days(days)) {
            self.select(date);
        }
    }

    /// Flips the completed flag of `task_id`. An unknown id comes back as
    /// `TaskNotFound` and changes nothing.
    pub fn toggle_task<S: TaskStore + ?Sized>(
        &self,
        store: &mut S,
        task_id: &str,
    ) -> Result<Task, PlannerError> {
        let completed = store
            .list_all()
            .iter()
            .find(|task| task.id == task_id)
            .map(|task| task.completed)
            .ok_or_else(|| PlannerError::TaskNotFound(task_id.to_string()))?;
        store.update(task_id, TaskPatch::completed(!completed))
    }

    pub fn snapshot<S, T>(&self, sessions: &S, tasks: &T) -> PlannerSnapshot
    where
        S: SessionStore + ?Sized,
        T: TaskStore + ?Sized,
    {
        let window = self.window();
        let days = window
            .dates
            .iter()
            .map(|date| DaySessions::collect(*date, sessions.list_all()))
            .collect();

        PlannerSnapshot {
            selected: self.selected,
            days,
            tasks: order_tasks(tasks.list_all()),
            window,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DaySessions {
    pub date: NaiveDate,
    pub sessions: Vec<StudySession>,
    pub planned: Duration,
}

impl DaySessions {
    fn collect(date: NaiveDate, sessions: &[StudySession]) -> Self {
        let sessions = sessions_on_date(sessions, date).cloned().collect::<Vec<_>>();
        let planned = sessions
            .iter()
            .fold(Duration::zero(), |total, session| total + session.duration());
        Self {
            date,
            sessions,
            planned,
        }
    }
}

/// What a renderer needs after each transition.
#[derive(Debug, Clone)]
pub struct PlannerSnapshot {
    pub window: CalendarWindow,
    pub selected: NaiveDate,
    pub days: Vec<DaySessions>,
    pub tasks: Vec<Task>,
}

impl PlannerSnapshot {
    pub fn day(&self, date: NaiveDate) -> Option<&DaySessions> {
        self.days.iter().find(|day| day.date == date)
    }

    pub fn selected_day(&self) -> Option<&DaySessions> {
        self.day(self.selected)
    }

    pub fn is_empty(&self) -> bool {
        self.days.iter().all(|day| day.sessions.is_empty())
    }

    pub fn planned_total(&self) -> Duration {
        self.days
            .iter()
            .fold(Duration::zero(), |total, day| total + day.planned)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveTime};

    use super::PlannerViewModel;
    use crate::calendar::{Direction, Granularity};
    use crate::domain::{Planner, Priority};
    use crate::error::PlannerError;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn time(hour: u32, minute: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(hour, minute, 0).unwrap()
    }

    #[test]
    fn granularity_change_keeps_anchor_and_selection() {
        let mut view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
        view.select(date(2025, 4, 17));
        view.set_granularity(Granularity::Day);
        assert_eq!(view.anchor(), date(2025, 4, 15));
        assert_eq!(view.selected(), date(2025, 4, 17));
        assert_eq!(view.window().dates, vec![date(2025, 4, 15)]);
    }

    #[test]
    fn navigate_moves_anchor_only() {
        let mut view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
        view.navigate(Direction::Next);
        assert_eq!(view.anchor(), date(2025, 4, 22));
        assert_eq!(view.selected(), date(2025, 4, 15));
        view.set_granularity(Granularity::Day);
        view.navigate(Direction::Previous);
        assert_eq!(view.anchor(), date(2025, 4, 21));
        assert_eq!(view.selected(), date(2025, 4, 15));
    }

    #[test]
    fn go_to_today_resets_anchor_and_selection() {
        let mut view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
        view.navigate(Direction::Next);
        view.select(date(2025, 5, 2));
        view.go_to_today(date(2026, 1, 7));
        assert_eq!(view.anchor(), date(2026, 1, 7));
        assert_eq!(view.selected(), date(2026, 1, 7));
    }

    #[test]
    fn selecting_outside_the_week_moves_the_window() {
        let mut view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
        view.select(date(2025, 4, 20));
        assert_eq!(view.anchor(), date(2025, 4, 15));

        view.select(date(2025, 4, 23));
        assert_eq!(view.anchor(), date(2025, 4, 23));
        let window = view.window();
        assert_eq!(window.first(), date(2025, 4, 21));
        assert!(window.contains(view.selected()));
    }

    #[test]
    fn shifting_selection_in_day_view_follows_the_day() {
        let mut view = PlannerViewModel::new(Granularity::Day, date(2025, 4, 15));
        view.shift_selection(1);
        assert_eq!(view.selected(), date(2025, 4, 16));
        assert_eq!(view.window().dates, vec![date(2025, 4, 16)]);
    }

    #[test]
    fn rejects_unknown_granularity_at_construction() {
        let err = PlannerViewModel::from_config("fortnight", date(2025, 4, 15))
            .expect_err("fortnight is not a granularity");
        assert!(matches!(err, PlannerError::Config(_)));
        assert!(PlannerViewModel::from_config("day", date(2025, 4, 15)).is_ok());
    }

    #[test]
    fn toggling_twice_restores_the_flag() {
        let mut planner = Planner::new();
        let id = planner
            .add_task(
                "Review Chapter 5 Notes".to_string(),
                "History 101".to_string(),
                date(2025, 4, 16),
                Priority::Medium,
            )
            .expect("task should be created");
        let view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));

        let first = view.toggle_task(&mut planner, &id).expect("toggle should work");
        assert!(first.completed);
        let second = view.toggle_task(&mut planner, &id).expect("toggle should work");
        assert!(!second.completed);
        assert!(!planner.task(&id).unwrap().completed);
    }

    #[test]
    fn toggling_unknown_task_reports_not_found() {
        let mut planner = Planner::new();
        let view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
        let err = view
            .toggle_task(&mut planner, "missing")
            .expect_err("task should be missing");
        assert!(err.is_not_found());
    }

    #[test]
    fn snapshot_buckets_sessions_per_day() {
        let mut planner = Planner::new();
        for (title, day, start, end) in [
            ("Physics Problem Set", 16, time(10, 0), time(11, 30)),
            ("Calculus Practice", 17, time(9, 0), time(10, 30)),
            ("Essay Outline", 16, time(14, 0), time(15, 0)),
            ("Next week", 22, time(9, 0), time(10, 0)),
        ] {
            planner
                .add_session(
                    title.to_string(),
                    "Course".to_string(),
                    date(2025, 4, day),
                    start,
                    end,
                    None,
                )
                .expect("session should be created");
        }

        let view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
        let snapshot = view.snapshot(&planner, &planner);
        assert_eq!(snapshot.days.len(), 7);
        let wednesday = snapshot.day(date(2025, 4, 16)).expect("day in window");
        let titles = wednesday
            .sessions
            .iter()
            .map(|session| session.title.as_str())
            .collect::<Vec<_>>();
        assert_eq!(titles, vec!["Physics Problem Set", "Essay Outline"]);
        assert_eq!(wednesday.planned.num_minutes(), 150);
        assert_eq!(snapshot.planned_total().num_minutes(), 240);
        assert_eq!(snapshot.selected_day().unwrap().date, date(2025, 4, 15));
        assert!(!snapshot.is_empty());
    }
}
