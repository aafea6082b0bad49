use chrono::{NaiveDate, NaiveTime};

use study_planner::calendar::{Direction, Granularity, sessions_on_date};
use study_planner::domain::{Planner, Priority};
use study_planner::storage::{load_planner, save_planner};
use study_planner::store::{SessionStore, TaskStore};
use study_planner::view_model::PlannerViewModel;
use study_planner::{NotificationKind, PlannerError, order_tasks};

fn date(year: i32, month: u32, day: u32) -> NaiveDate {
	NaiveDate::from_ymd_opt(year, month, day).unwrap()
}

fn demo_planner() -> Planner {
	let mut planner = Planner::new();
	planner.seed_demo(date(2025, 4, 15)).expect("seed should succeed");
	planner
}

#[test]
fn week_of_april_fifteenth_shows_monday_through_sunday() {
	let planner = demo_planner();
	let view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
	let snapshot = view.snapshot(&planner, &planner);

	let expected = (14..=20).map(|day| date(2025, 4, day)).collect::<Vec<_>>();
	assert_eq!(snapshot.window.dates, expected);
	assert_eq!(snapshot.selected, date(2025, 4, 15));

	let wednesday = sessions_on_date(SessionStore::list_all(&planner), date(2025, 4, 16))
		.map(|session| session.title.as_str())
		.collect::<Vec<_>>();
	assert_eq!(wednesday, vec!["Physics Problem Set", "Essay Outline"]);

	let bucket = snapshot.day(date(2025, 4, 16)).expect("wednesday bucket");
	assert_eq!(bucket.sessions.len(), 2);
	assert_eq!(bucket.planned.num_minutes(), 150);
	assert_eq!(snapshot.planned_total().num_minutes(), 450);
}

#[test]
fn navigating_forward_then_back_restores_the_window() {
	let planner = demo_planner();
	let mut view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));
	view.navigate(Direction::Next);

	let next_week = view.snapshot(&planner, &planner);
	assert_eq!(next_week.window.first(), date(2025, 4, 21));
	assert!(next_week.is_empty());

	view.navigate(Direction::Previous);
	assert_eq!(view.anchor(), date(2025, 4, 15));
	assert_eq!(view.window().first(), date(2025, 4, 14));
}

#[test]
fn toggled_task_survives_a_save_and_reload() {
	let mut planner = demo_planner();
	let view = PlannerViewModel::new(Granularity::Day, date(2025, 4, 15));
	let first = order_tasks(TaskStore::list_all(&planner))
		.into_iter()
		.next()
		.expect("demo has tasks");
	assert_eq!(first.priority, Priority::High);
	assert!(!first.completed);

	let toggled = view.toggle_task(&mut planner, &first.id).expect("toggle should succeed");
	assert!(toggled.completed);
	let notification_id = planner
		.celebrate_completion(&toggled, chrono::Utc::now())
		.expect("celebrations are on by default");

	let dir = tempfile::tempdir().expect("temp dir");
	let path = dir.path().join("term.planner");
	save_planner(&path, &planner).expect("save should succeed");
	let mut reloaded = load_planner(&path).expect("load should succeed");

	assert!(reloaded.task(&first.id).expect("task kept").completed);
	let celebration = reloaded.notification(&notification_id).expect("notification kept");
	assert_eq!(celebration.kind, NotificationKind::Completion);

	let ordered = order_tasks(TaskStore::list_all(&reloaded));
	assert!(ordered.iter().skip_while(|task| !task.completed).all(|task| task.completed));

	view.toggle_task(&mut reloaded, &first.id).expect("second toggle should succeed");
	assert!(!reloaded.task(&first.id).expect("task kept").completed);
}

#[test]
fn unknown_ids_are_recoverable_and_change_nothing() {
	let mut planner = demo_planner();
	let before = TaskStore::list_all(&planner).to_vec();
	let view = PlannerViewModel::new(Granularity::Week, date(2025, 4, 15));

	let err = view.toggle_task(&mut planner, "missing").expect_err("unknown id should fail");
	assert!(matches!(err, PlannerError::TaskNotFound(_)));
	assert!(err.is_not_found());
	assert_eq!(TaskStore::list_all(&planner), before.as_slice());

	let err = planner.remove_session("missing").expect_err("unknown session should fail");
	assert!(err.is_not_found());
}

#[test]
fn added_session_lands_in_its_day_bucket() {
	let mut planner = demo_planner();
	planner
		.add_session(
			"Flashcards".to_string(),
			"Biology 301".to_string(),
			date(2025, 4, 16),
			NaiveTime::from_hms_opt(19, 0, 0).unwrap(),
			NaiveTime::from_hms_opt(19, 45, 0).unwrap(),
			None,
		)
		.expect("session should be created");

	let mut view = PlannerViewModel::new(Granularity::Day, date(2025, 4, 15));
	view.select(date(2025, 4, 16));
	let snapshot = view.snapshot(&planner, &planner);

	assert_eq!(snapshot.window.dates, vec![date(2025, 4, 16)]);
	let titles = snapshot
		.selected_day()
		.expect("selected day is in the window")
		.sessions
		.iter()
		.map(|session| session.title.clone())
		.collect::<Vec<_>>();
	assert_eq!(titles, vec!["Physics Problem Set", "Essay Outline", "Flashcards"]);
}
