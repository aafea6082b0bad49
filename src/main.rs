mod ui;

use std::error::Error;
use std::path::PathBuf;

use chrono::{Local, NaiveDate, NaiveTime, Utc, Weekday};
use clap::{Parser, Subcommand};

use study_planner::calendar::Granularity;
use study_planner::domain::{NotificationKind, Planner, Priority, format_duration};
use study_planner::logging::{init_logging, resolve_level};
use study_planner::planners::{log_dir, recent_planners, remember_planner, resolve_planner_path};
use study_planner::priority::upcoming_tasks;
use study_planner::settings::{PreferenceChanges, StudyTime};
use study_planner::stats::DashboardSummary;
use study_planner::storage::{load_planner, save_planner};
use study_planner::store::{TaskPatch, TaskStore};
use study_planner::view_model::PlannerViewModel;

use crate::ui::run_dashboard;

#[derive(Debug, Parser)]
#[command(name = "study-planner", about = "Terminal study planner for sessions, tasks and deadlines")]
struct Cli {
	#[arg(long)]
	planner: Option<PathBuf>,
	#[arg(long)]
	log_level: Option<String>,
	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
	Init {
		/// Seed the week around today with sample sessions and tasks.
		#[arg(long)]
		demo: bool,
	},
	Dashboard,
	Onboard {
		#[arg(long)]
		name: String,
		#[arg(long, value_delimiter = ',')]
		courses: Vec<String>,
		#[arg(long)]
		study_time: Option<String>,
		#[arg(long)]
		view: Option<String>,
	},
	AddSession {
		#[arg(long)]
		title: String,
		#[arg(long)]
		course: String,
		#[arg(long)]
		date: String,
		#[arg(long)]
		start: String,
		#[arg(long)]
		end: String,
		#[arg(long)]
		category: Option<String>,
	},
	RemoveSession {
		#[arg(long)]
		id: String,
	},
	AddTask {
		#[arg(long)]
		title: String,
		#[arg(long)]
		course: String,
		#[arg(long)]
		due: String,
		#[arg(long, default_value = "medium")]
		priority: String,
	},
	EditTask {
		#[arg(long)]
		id: String,
		#[arg(long)]
		title: Option<String>,
		#[arg(long)]
		course: Option<String>,
		#[arg(long)]
		due: Option<String>,
		#[arg(long)]
		priority: Option<String>,
	},
	ToggleTask {
		#[arg(long)]
		id: String,
	},
	Tasks {
		/// Only the next N incomplete tasks.
		#[arg(long)]
		upcoming: Option<usize>,
	},
	View {
		#[arg(long)]
		date: Option<String>,
		#[arg(long)]
		granularity: Option<String>,
	},
	Summary {
		#[arg(long)]
		date: Option<String>,
	},
	Notifications {
		#[arg(long)]
		unread: bool,
		#[arg(long)]
		kind: Option<String>,
	},
	Dismiss {
		#[arg(long)]
		id: String,
	},
	MarkRead {
		#[arg(long, conflicts_with = "all", required_unless_present = "all")]
		id: Option<String>,
		#[arg(long)]
		all: bool,
	},
	Remind,
	Settings {
		#[arg(long)]
		name: Option<String>,
		#[arg(long, value_delimiter = ',')]
		courses: Option<Vec<String>>,
		#[arg(long)]
		study_time: Option<String>,
		#[arg(long)]
		max_daily_hours: Option<u32>,
		#[arg(long)]
		break_frequency: Option<u32>,
		#[arg(long)]
		break_duration: Option<u32>,
		#[arg(long, value_delimiter = ',')]
		study_days: Option<Vec<String>>,
		#[arg(long)]
		notify_before: Option<u32>,
		#[arg(long)]
		default_view: Option<String>,
		#[arg(long)]
		session_reminders: Option<bool>,
		#[arg(long)]
		deadline_reminders: Option<bool>,
		#[arg(long)]
		completion_celebrations: Option<bool>,
	},
	Planners {
		#[arg(long, default_value_t = 20)]
		limit: usize,
	},
}

fn main() {
	if let Err(err) = run() {
		log::error!("event=command_failed error={err}");
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn run() -> Result<(), Box<dyn Error>> {
	let cli = Cli::parse();

	let level = resolve_level(cli.log_level.as_deref());
	if let Err(err) = init_logging(&level, &log_dir()) {
		eprintln!("warning: logging disabled: {err}");
	}

	if let Some(Command::Planners { limit }) = &cli.command {
		print_recent_planners(*limit)?;
		return Ok(());
	}

	let mut planner_path = resolve_planner_path(cli.planner)?;
	let mut planner = load_planner(&planner_path)?;
	if let Err(err) = remember_planner(&planner_path) {
		log::warn!("event=remember_planner_failed error={err}");
		eprintln!("warning: failed to store recent planner: {err}");
	}

	match cli.command.unwrap_or(Command::Dashboard) {
		Command::Init { demo } => {
			if demo && !planner.seed_demo(today())? {
				println!("planner already has sessions or tasks; demo data not added");
			}
			save_planner(&planner_path, &planner)?;
			println!("initialized planner at {}", planner_path.display());
		}
		Command::Dashboard => {
			let reminders = planner.collect_reminders(Utc::now());
			if reminders > 0 {
				save_planner(&planner_path, &planner)?;
			}
			run_dashboard(&mut planner, &mut planner_path)?;
		}
		Command::Onboard {
			name,
			courses,
			study_time,
			view,
		} => {
			let changes = PreferenceChanges {
				owner: Some(name),
				courses: Some(courses),
				preferred_study_time: study_time.as_deref().map(str::parse::<StudyTime>).transpose()?,
				default_view: view.as_deref().map(str::parse::<Granularity>).transpose()?,
				..PreferenceChanges::default()
			};
			planner.header.preferences.apply(changes)?;
			save_planner(&planner_path, &planner)?;
			let preferences = planner.preferences();
			println!(
				"welcome, {} | {} course(s) | {} study | {} view",
				preferences.owner.as_deref().unwrap_or("student"),
				preferences.courses.len(),
				preferences.preferred_study_time,
				preferences.default_view
			);
		}
		Command::AddSession {
			title,
			course,
			date,
			start,
			end,
			category,
		} => {
			let date = parse_date(&date)?;
			let start = parse_time(&start)?;
			let end = parse_time(&end)?;
			let session_id = planner.add_session(title, course, date, start, end, category)?;
			save_planner(&planner_path, &planner)?;
			println!("created session {session_id}");
		}
		Command::RemoveSession { id } => {
			let session = planner.remove_session(&id)?;
			save_planner(&planner_path, &planner)?;
			println!("removed session {} ({})", session.id, session.title);
		}
		Command::AddTask {
			title,
			course,
			due,
			priority,
		} => {
			let due = parse_date(&due)?;
			let priority = priority.parse::<Priority>()?;
			let task_id = planner.add_task(title, course, due, priority)?;
			save_planner(&planner_path, &planner)?;
			println!("created task {task_id}");
		}
		Command::EditTask {
			id,
			title,
			course,
			due,
			priority,
		} => {
			let patch = TaskPatch {
				title,
				course,
				due: due.as_deref().map(parse_date).transpose()?,
				priority: priority.as_deref().map(str::parse::<Priority>).transpose()?,
				completed: None,
			};
			if patch.is_empty() {
				println!("nothing to change for {id}");
				return Ok(());
			}
			let task = planner.update(&id, patch)?;
			save_planner(&planner_path, &planner)?;
			println!("updated task {} | {}", task.id, task.title);
		}
		Command::ToggleTask { id } => {
			let view = PlannerViewModel::new(planner.preferences().default_view, today());
			let task = view.toggle_task(&mut planner, &id)?;
			planner.celebrate_completion(&task, Utc::now());
			save_planner(&planner_path, &planner)?;
			let state = if task.completed { "completed" } else { "reopened" };
			println!("{state} {} | {}", task.id, task.title);
		}
		Command::Tasks { upcoming } => {
			print_tasks(&planner, upcoming);
		}
		Command::View { date, granularity } => {
			print_window(&planner, date.as_deref(), granularity.as_deref())?;
		}
		Command::Summary { date } => {
			print_summary(&planner, date.as_deref())?;
		}
		Command::Notifications { unread, kind } => {
			let kind = kind.as_deref().map(str::parse::<NotificationKind>).transpose()?;
			print_notifications(&planner, unread, kind);
		}
		Command::Dismiss { id } => {
			let notification = planner.dismiss(&id)?;
			save_planner(&planner_path, &planner)?;
			println!("dismissed {} ({})", notification.id, notification.title);
		}
		Command::MarkRead { id, all } => {
			if all {
				let changed = planner.mark_all_read();
				save_planner(&planner_path, &planner)?;
				println!("marked {changed} notification(s) read");
			} else if let Some(id) = id {
				planner.mark_read(&id)?;
				save_planner(&planner_path, &planner)?;
				println!("marked {id} read");
			}
		}
		Command::Remind => {
			let added = planner.collect_reminders(Utc::now());
			save_planner(&planner_path, &planner)?;
			println!("{added} new reminder(s)");
		}
		Command::Settings {
			name,
			courses,
			study_time,
			max_daily_hours,
			break_frequency,
			break_duration,
			study_days,
			notify_before,
			default_view,
			session_reminders,
			deadline_reminders,
			completion_celebrations,
		} => {
			let changes = PreferenceChanges {
				owner: name,
				courses,
				preferred_study_time: study_time.as_deref().map(str::parse::<StudyTime>).transpose()?,
				max_daily_hours,
				break_frequency_minutes: break_frequency,
				break_duration_minutes: break_duration,
				preferred_study_days: study_days.map(|days| parse_weekdays(&days)).transpose()?,
				notify_before_session_minutes: notify_before,
				default_view: default_view.as_deref().map(str::parse::<Granularity>).transpose()?,
				session_reminders,
				deadline_reminders,
				completion_celebrations,
			};
			if planner.header.preferences.apply(changes)? {
				save_planner(&planner_path, &planner)?;
				println!("settings saved");
			}
			print_settings(&planner);
		}
		Command::Planners { .. } => {}
	}

	Ok(())
}

fn today() -> NaiveDate {
	Local::now().date_naive()
}

fn print_recent_planners(limit: usize) -> Result<(), Box<dyn Error>> {
	let rows = recent_planners(limit)?;
	if rows.is_empty() {
		println!("no recent planners");
		return Ok(());
	}

	for (index, path) in rows.iter().enumerate() {
		println!("{:>2}. {}", index + 1, path.display());
	}

	Ok(())
}

fn parse_date(input: &str) -> Result<NaiveDate, Box<dyn Error>> {
	Ok(NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")?)
}

fn parse_day(input: Option<&str>) -> Result<NaiveDate, Box<dyn Error>> {
	if let Some(raw) = input {
		parse_date(raw)
	} else {
		Ok(today())
	}
}

fn parse_time(input: &str) -> Result<NaiveTime, Box<dyn Error>> {
	Ok(NaiveTime::parse_from_str(input.trim(), "%H:%M")?)
}

fn parse_weekdays(days: &[String]) -> Result<Vec<Weekday>, Box<dyn Error>> {
	let mut parsed = Vec::new();
	for day in days {
		let weekday = day
			.trim()
			.parse::<Weekday>()
			.map_err(|_| format!("unknown weekday '{day}'"))?;
		if !parsed.contains(&weekday) {
			parsed.push(weekday);
		}
	}
	parsed.sort_by_key(|day: &Weekday| day.num_days_from_monday());
	Ok(parsed)
}

fn print_tasks(planner: &Planner, upcoming: Option<usize>) {
	let tasks = TaskStore::list_all(planner);
	if tasks.is_empty() {
		println!("no tasks yet");
		return;
	}

	let rows = match upcoming {
		Some(limit) => upcoming_tasks(tasks, limit),
		None => study_planner::order_tasks(tasks),
	};
	let today = today();
	for task in rows {
		let checkbox = if task.completed { "[x]" } else { "[ ]" };
		let overdue = if task.is_overdue(today) { " | overdue" } else { "" };
		println!(
			"{} {} | {} | {} | due {} | {}{}",
			checkbox,
			task.id,
			task.title,
			task.course,
			task.due.format("%Y-%m-%d"),
			task.priority,
			overdue
		);
	}
}

fn print_window(planner: &Planner, date: Option<&str>, granularity: Option<&str>) -> Result<(), Box<dyn Error>> {
	let anchor = parse_day(date)?;
	let view = match granularity {
		Some(raw) => PlannerViewModel::from_config(raw, anchor)?,
		None => PlannerViewModel::new(planner.preferences().default_view, anchor),
	};
	let snapshot = view.snapshot(planner, planner);

	println!("{} view {}", view.granularity(), snapshot.window.label());
	if snapshot.is_empty() {
		println!("no study sessions scheduled");
	}

	for day in &snapshot.days {
		if day.sessions.is_empty() {
			continue;
		}
		println!("\n{} | {}", day.date.format("%a %Y-%m-%d"), format_duration(day.planned));
		for session in &day.sessions {
			println!(
				"  {} | {} | {} | {} | {}",
				session.id,
				session.time_range(),
				session.title,
				session.course,
				session.category
			);
		}
	}

	println!("\nplanned total: {}", format_duration(snapshot.planned_total()));
	Ok(())
}

fn print_summary(planner: &Planner, date: Option<&str>) -> Result<(), Box<dyn Error>> {
	let day = parse_day(date)?;
	let summary = DashboardSummary::build(planner, day);

	println!("summary for {}", day.format("%Y-%m-%d"));
	println!("sessions today: {}", summary.sessions_today);
	println!("tasks due soon: {}", summary.tasks_due_soon);
	println!("overdue tasks: {}", summary.overdue_tasks);
	println!(
		"tasks completed: {}/{} ({}%)",
		summary.completed_tasks,
		summary.total_tasks,
		summary.completion_percent()
	);
	println!("planned this week: {}", summary.week_hours_label());

	println!("\nby day:");
	for (date, duration) in &summary.daily {
		let flag = if summary.overloaded_days.contains(date) {
			" | over daily limit"
		} else {
			""
		};
		println!("{} | {}{}", date.format("%a %Y-%m-%d"), format_duration(*duration), flag);
	}

	println!("\nby course:");
	if summary.top_courses.is_empty() {
		println!("no study sessions this week");
	}
	for course in &summary.top_courses {
		println!("{} | {}", format_duration(course.planned), course.course);
	}

	if summary.outside_preferred_time > 0 {
		println!(
			"\n{} session(s) fall outside your preferred {} study time",
			summary.outside_preferred_time,
			planner.preferences().preferred_study_time
		);
	}

	Ok(())
}

fn print_notifications(planner: &Planner, unread_only: bool, kind: Option<NotificationKind>) {
	let feed = match kind {
		Some(kind) => {
			let mut rows = planner
				.notifications_of_kind(kind)
				.filter(|notification| !unread_only || !notification.read)
				.collect::<Vec<_>>();
			rows.sort_by(|left, right| right.created_at.cmp(&left.created_at));
			rows
		}
		None => planner.notification_feed(unread_only),
	};
	if feed.is_empty() {
		println!("no notifications");
		return;
	}

	for notification in feed {
		let marker = if notification.read { " " } else { "*" };
		println!(
			"{} {} | {} | {} | {} | {}",
			marker,
			notification.id,
			notification.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M"),
			notification.kind,
			notification.title,
			notification.message
		);
	}
}

fn print_settings(planner: &Planner) {
	let preferences = planner.preferences();
	let days = preferences
		.preferred_study_days
		.iter()
		.map(|day| day.to_string())
		.collect::<Vec<_>>()
		.join(",");

	println!("owner: {}", preferences.owner.as_deref().unwrap_or("(not set)"));
	println!("courses: {}", preferences.courses.join(", "));
	println!("preferred study time: {}", preferences.preferred_study_time);
	println!("max daily hours: {}", preferences.max_daily_hours);
	println!(
		"breaks: {} min every {} min",
		preferences.break_duration_minutes, preferences.break_frequency_minutes
	);
	println!("study days: {days}");
	println!("remind before session: {} min", preferences.notify_before_session_minutes);
	println!("default view: {}", preferences.default_view);
	println!(
		"notifications: sessions={} deadlines={} completions={}",
		preferences.notifications.session_reminders,
		preferences.notifications.deadline_reminders,
		preferences.notifications.completion_celebrations
	);
}
