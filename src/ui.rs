use std::error::Error;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration as StdDuration;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Utc};
use crossterm::event::{self, Event as CEvent, KeyCode, KeyEventKind};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use crossterm::{ExecutableCommand, execute};
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Constraint, Direction as LayoutDirection, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph};
use ratatui::{Frame, Terminal};

use study_planner::calendar::{Direction, Granularity};
use study_planner::domain::{
	Notification, Planner, Priority, SESSION_CATEGORIES, StudySession, Task, format_duration,
};
use study_planner::planners::{recent_planners, remember_planner};
use study_planner::stats::DashboardSummary;
use study_planner::storage::{load_planner, save_planner};
use study_planner::view_model::{PlannerSnapshot, PlannerViewModel};

const FOCUSED_PANEL_BORDER_COLOR: Color = Color::Yellow;
const INACTIVE_PANEL_BORDER_COLOR: Color = Color::DarkGray;
const HIGHLIGHT_BACKGROUND_COLOR: Color = Color::Rgb(42, 45, 52);

pub fn run_dashboard(planner: &mut Planner, planner_path: &mut PathBuf) -> Result<(), Box<dyn Error>> {
	enable_raw_mode()?;
	let mut stdout = io::stdout();
	stdout.execute(EnterAlternateScreen)?;
	let backend = CrosstermBackend::new(stdout);
	let mut terminal = Terminal::new(backend)?;

	let result = run_event_loop(&mut terminal, planner, planner_path);

	disable_raw_mode()?;
	execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
	terminal.show_cursor()?;

	result
}

fn run_event_loop(
	terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
	planner: &mut Planner,
	planner_path: &mut PathBuf,
) -> Result<(), Box<dyn Error>> {
	let mut app = App::new(planner.preferences().default_view, today());

	loop {
		let view = build_view(&app, planner, today());
		app.clamp_selection(&view);
		terminal.draw(|frame| draw_dashboard(frame, &app, &view))?;

		if event::poll(StdDuration::from_millis(250))? {
			if let CEvent::Key(key) = event::read()? {
				if key.kind != KeyEventKind::Press {
					continue;
				}

				let should_quit = match &app.mode {
					InputMode::Prompt(_) => handle_prompt_key(&mut app, key.code),
					InputMode::Select(_) => handle_select_key(&mut app, key.code, planner, planner_path),
					InputMode::Normal => handle_normal_key(&mut app, key.code, planner, planner_path, &view),
				};

				if should_quit {
					break;
				}
			}
		}
	}

	Ok(())
}

fn today() -> NaiveDate {
	Local::now().date_naive()
}

fn draw_dashboard(frame: &mut Frame, app: &App, view: &ViewModel) {
	let layout = Layout::default()
		.direction(LayoutDirection::Vertical)
		.constraints([Constraint::Length(3), Constraint::Min(12), Constraint::Length(4)])
		.split(frame.area());

	let body = Layout::default()
		.direction(LayoutDirection::Horizontal)
		.constraints([
			Constraint::Percentage(28),
			Constraint::Percentage(40),
			Constraint::Percentage(32),
		])
		.split(layout[1]);

	let left = Layout::default()
		.direction(LayoutDirection::Vertical)
		.constraints([Constraint::Length(6), Constraint::Min(8)])
		.split(body[0]);

	let right = Layout::default()
		.direction(LayoutDirection::Vertical)
		.constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
		.split(body[2]);

	render_header(frame, layout[0], app, view);
	render_calendar_panel(frame, left[0], app, view);
	render_week_stats_panel(frame, left[1], view);
	render_sessions_panel(frame, body[1], app, view);
	render_tasks_panel(frame, right[0], app, view);
	render_notifications_panel(frame, right[1], app, view);
	render_footer(frame, layout[2], app);

	if let InputMode::Select(select) = &app.mode {
		render_select_popup(frame, select);
	}
}

fn render_header(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let summary = &view.summary;
	let greeting = match &view.owner {
		Some(owner) => format!("Welcome back, {owner}"),
		None => "Study Planner".to_string(),
	};
	let line = Line::from(vec![
		Span::styled(greeting, Style::default().add_modifier(Modifier::BOLD)),
		Span::raw(format!(
			" | {} view: {} | today's sessions {} | tasks due {} | overdue {} | planned this week {} | unread {}",
			app.view.granularity(),
			view.snapshot.window.label(),
			summary.sessions_today,
			summary.tasks_due_soon,
			summary.overdue_tasks,
			summary.week_hours_label(),
			view.unread,
		)),
	]);

	let header = Paragraph::new(vec![line]).block(Block::default().borders(Borders::ALL));
	frame.render_widget(header, area);
}

fn render_calendar_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let snapshot = &view.snapshot;
	let mut names = Vec::new();
	let mut numbers = Vec::new();
	let mut totals = Vec::new();

	for day in &snapshot.days {
		let mut style = Style::default();
		if day.date == snapshot.selected {
			style = style.fg(Color::Black).bg(Color::Yellow).add_modifier(Modifier::BOLD);
		} else if day.date == view.today {
			style = style.fg(Color::LightYellow).add_modifier(Modifier::BOLD);
		} else if view.rest_days.contains(&day.date) {
			style = style.fg(Color::DarkGray);
		}

		names.push(Span::raw(format!("{:<4}", day.date.format("%a").to_string())));
		numbers.push(Span::styled(format!("{:<4}", day.date.day()), style));
		let planned = if day.sessions.is_empty() {
			"-".to_string()
		} else {
			format!("{}", day.planned.num_minutes() / 60)
		};
		totals.push(Span::styled(format!("{planned:<4}"), Style::default().fg(Color::Cyan)));
	}

	let lines = vec![
		Line::from(snapshot.window.first().format("%B %Y").to_string()),
		Line::from(names),
		Line::from(numbers),
		Line::from(totals),
	];

	let block = Block::default()
		.borders(Borders::ALL)
		.title(format!("Calendar ({})", app.view.granularity()))
		.border_style(border_style(app.focus == FocusPane::Calendar));
	frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_week_stats_panel(frame: &mut Frame, area: Rect, view: &ViewModel) {
	let summary = &view.summary;
	let mut lines = Vec::new();
	lines.push(Line::from(format!(
		"Week of {}",
		summary.week_start.format("%d %b")
	)));
	lines.push(Line::from(format!("Planned: {}", format_duration(summary.week_total))));
	lines.push(Line::from(format!("Avg/day: {}", format_duration(summary.avg_per_day))));
	lines.push(Line::from(format!("Study days: {}", summary.active_days)));
	lines.push(Line::from(format!(
		"Tasks done: {}/{} ({}%)",
		summary.completed_tasks,
		summary.total_tasks,
		summary.completion_percent()
	)));
	if summary.outside_preferred_time > 0 {
		lines.push(Line::from(Span::styled(
			format!("{} session(s) outside preferred time", summary.outside_preferred_time),
			Style::default().fg(Color::LightYellow),
		)));
	}
	lines.push(Line::from(""));

	let max_minutes = summary
		.daily
		.iter()
		.map(|(_, duration)| duration.num_minutes())
		.max()
		.unwrap_or(0)
		.max(1);
	for (day, duration) in &summary.daily {
		let minutes = duration.num_minutes();
		let width = ((minutes as f64 / max_minutes as f64) * 14.0).round() as usize;
		let style = if summary.overloaded_days.contains(day) {
			Style::default().fg(Color::LightRed)
		} else {
			Style::default()
		};
		lines.push(Line::from(Span::styled(
			format!(
				"{} {:>6} {}",
				day.format("%a"),
				format_duration(*duration),
				if minutes == 0 { String::new() } else { "=".repeat(width.max(1)) }
			),
			style,
		)));
	}

	lines.push(Line::from(""));
	lines.push(Line::from("Top Courses"));
	if summary.top_courses.is_empty() {
		lines.push(Line::from("(none)"));
	} else {
		for course in summary.top_courses.iter().take(5) {
			lines.push(Line::from(format!(
				"{} | {}",
				course.course,
				format_duration(course.planned)
			)));
		}
	}

	let panel = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title("Week Stats"));
	frame.render_widget(panel, area);
}

fn render_sessions_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = if view.session_rows.is_empty() {
		vec![ListItem::new("No study sessions scheduled. Press s to add one.")]
	} else {
		view.session_rows
			.iter()
			.map(|row| ListItem::new(render_session_line(row, view.snapshot.selected)))
			.collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !view.session_rows.is_empty() {
		state.select(Some(app.session_index.min(view.session_rows.len() - 1)));
	}

	let title = format!(
		"Sessions {} | planned {}",
		view.snapshot.window.label(),
		format_duration(view.snapshot.planned_total())
	);
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(title)
				.border_style(border_style(app.focus == FocusPane::Sessions)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_session_line(row: &SessionRow, selected: NaiveDate) -> Line<'static> {
	let day_style = if row.session.date == selected {
		Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(Color::DarkGray)
	};

	Line::from(vec![
		Span::styled(format!("{} ", row.session.date.format("%a %d")), day_style),
		Span::raw(format!("{} | ", row.session.time_range())),
		Span::styled(row.session.title.clone(), category_style(&row.session.category)),
		Span::raw(format!(" | {}", row.session.course)),
	])
}

fn render_tasks_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = if view.snapshot.tasks.is_empty() {
		vec![ListItem::new("(no tasks) press a to add one")]
	} else {
		view.snapshot
			.tasks
			.iter()
			.map(|task| ListItem::new(render_task_line(task, view.today)))
			.collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !view.snapshot.tasks.is_empty() {
		state.select(Some(app.task_index.min(view.snapshot.tasks.len() - 1)));
	}

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title("Tasks")
				.border_style(border_style(app.focus == FocusPane::Tasks)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_task_line(task: &Task, today: NaiveDate) -> Line<'static> {
	let checkbox = if task.completed { "[x]" } else { "[ ]" };
	let title_style = if task.completed {
		Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
	} else {
		Style::default()
	};
	let due_style = if task.is_overdue(today) {
		Style::default().fg(Color::LightRed)
	} else {
		Style::default().fg(Color::DarkGray)
	};

	Line::from(vec![
		Span::styled("● ", priority_style(task.priority)),
		Span::raw(format!("{checkbox} ")),
		Span::styled(task.title.clone(), title_style),
		Span::raw(format!(" | {} ", task.course)),
		Span::styled(format!("due {}", due_label(task.due, today)), due_style),
	])
}

fn render_notifications_panel(frame: &mut Frame, area: Rect, app: &App, view: &ViewModel) {
	let items = if view.notifications.is_empty() {
		vec![ListItem::new("(no notifications)")]
	} else {
		view.notifications
			.iter()
			.map(|notification| ListItem::new(render_notification_line(notification)))
			.collect::<Vec<_>>()
	};

	let mut state = ListState::default();
	if !view.notifications.is_empty() {
		state.select(Some(app.notification_index.min(view.notifications.len() - 1)));
	}

	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("Notifications ({} new)", view.unread))
				.border_style(border_style(app.focus == FocusPane::Notifications)),
		)
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR).add_modifier(Modifier::BOLD));

	frame.render_stateful_widget(list, area, &mut state);
}

fn render_notification_line(notification: &Notification) -> Line<'static> {
	let title_style = if notification.read {
		Style::default().fg(Color::DarkGray)
	} else {
		Style::default().add_modifier(Modifier::BOLD)
	};
	let marker = if notification.read { "  " } else { "● " };

	Line::from(vec![
		Span::styled(marker, Style::default().fg(Color::LightBlue)),
		Span::styled(notification.title.clone(), title_style),
		Span::raw(format!(
			" | {} | {}",
			notification.message,
			notification.created_at.with_timezone(&Local).format("%d %b %H:%M")
		)),
	])
}

fn render_footer(frame: &mut Frame, area: Rect, app: &App) {
	let footer_lines = match &app.mode {
		InputMode::Normal => vec![
			Line::from(
				"Tab pane | h/l day | j/k move (week: up/down in calendar) | [ ] prev/next | T today | v day/week | q quit",
			),
			Line::from(
				"space toggle task / mark read | a add task | s add session | x remove session | d dismiss | r reminders | m mark all read | g switch planner",
			),
			Line::from(app.status.clone()),
		],
		InputMode::Prompt(prompt) => vec![
			Line::from(prompt.title.clone()),
			Line::from(format!("> {}", prompt.input)),
			Line::from("Enter submit | Esc cancel"),
		],
		InputMode::Select(select) => vec![
			Line::from(select.title.clone()),
			Line::from(format!(
				"Selected: {}",
				select
					.selected_option()
					.map(|option| option.label.as_str())
					.unwrap_or("(none)")
			)),
			Line::from("j/k or arrows move | Enter choose | Esc cancel"),
		],
	};

	let footer = Paragraph::new(footer_lines).block(Block::default().borders(Borders::ALL).title("Shortcuts"));
	frame.render_widget(footer, area);
}

fn render_select_popup(frame: &mut Frame, select: &SelectState) {
	let area = centered_rect(62, 55, frame.area());
	frame.render_widget(Clear, area);

	let items = if select.options.is_empty() {
		vec![ListItem::new("(no choices)")]
	} else {
		select
			.options
			.iter()
			.map(|option| ListItem::new(option.label.clone()).style(option.style))
			.collect::<Vec<_>>()
	};

	let current = if select.options.is_empty() {
		0
	} else {
		select.selected.saturating_add(1)
	};
	let total = select.options.len();
	let list = List::new(items)
		.block(
			Block::default()
				.borders(Borders::ALL)
				.title(format!("{} ({current}/{total})", select.title)),
		)
		.highlight_symbol(">> ")
		.highlight_style(Style::default().bg(HIGHLIGHT_BACKGROUND_COLOR));

	let mut state = ListState::default();
	if !select.options.is_empty() {
		state.select(Some(select.selected.min(select.options.len().saturating_sub(1))));
	}
	frame.render_stateful_widget(list, area, &mut state);
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
	let popup_layout = Layout::default()
		.direction(LayoutDirection::Vertical)
		.constraints([
			Constraint::Percentage((100 - percent_y) / 2),
			Constraint::Percentage(percent_y),
			Constraint::Percentage((100 - percent_y) / 2),
		])
		.split(area);
	Layout::default()
		.direction(LayoutDirection::Horizontal)
		.constraints([
			Constraint::Percentage((100 - percent_x) / 2),
			Constraint::Percentage(percent_x),
			Constraint::Percentage((100 - percent_x) / 2),
		])
		.split(popup_layout[1])[1]
}

fn handle_normal_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &mut PathBuf,
	view: &ViewModel,
) -> bool {
	match code {
		KeyCode::Char('q') | KeyCode::Esc => true,
		KeyCode::Tab => {
			app.focus = app.focus.next();
			false
		}
		KeyCode::BackTab => {
			app.focus = app.focus.prev();
			false
		}
		KeyCode::Left | KeyCode::Char('h') => {
			app.shift_selected_day(-1);
			false
		}
		KeyCode::Right | KeyCode::Char('l') => {
			app.shift_selected_day(1);
			false
		}
		KeyCode::Up | KeyCode::Char('k') => {
			match app.focus {
				FocusPane::Calendar => app.shift_selected_day(-(app.view.window().dates.len() as i64)),
				_ => app.move_list_selection(-1, view),
			}
			false
		}
		KeyCode::Down | KeyCode::Char('j') => {
			match app.focus {
				FocusPane::Calendar => app.shift_selected_day(app.view.window().dates.len() as i64),
				_ => app.move_list_selection(1, view),
			}
			false
		}
		KeyCode::Char('[') => {
			app.view.navigate(Direction::Previous);
			app.session_index = 0;
			false
		}
		KeyCode::Char(']') => {
			app.view.navigate(Direction::Next);
			app.session_index = 0;
			false
		}
		KeyCode::Char('T') | KeyCode::Char('t') => {
			app.view.go_to_today(today());
			app.session_index = 0;
			app.status = "Jumped to today".to_string();
			false
		}
		KeyCode::Char('v') => {
			let granularity = app.view.granularity().toggled();
			app.view.set_granularity(granularity);
			app.session_index = 0;
			app.status = format!("Switched to {granularity} view");
			false
		}
		KeyCode::Char('a') => {
			app.mode = InputMode::Prompt(PromptState::new("Task title", PromptKind::AddTaskTitle));
			false
		}
		KeyCode::Char('s') => {
			app.mode = InputMode::Prompt(PromptState::new(
				format!("Session title ({})", app.view.selected().format("%a %d %b")),
				PromptKind::AddSessionTitle {
					date: app.view.selected(),
				},
			));
			false
		}
		KeyCode::Char('x') => {
			if app.focus != FocusPane::Sessions {
				app.status = "Focus the Sessions pane to remove a session".to_string();
				return false;
			}
			match view.session_rows.get(app.session_index) {
				Some(row) => app.mode = InputMode::Select(build_remove_session_select(&row.session)),
				None => app.status = "No selected session to remove".to_string(),
			}
			false
		}
		KeyCode::Char('r') => {
			let added = planner.collect_reminders(Utc::now());
			app.status = match persist(planner_path.as_path(), planner) {
				Ok(()) => format!("{added} new reminder(s)"),
				Err(err) => format!("error: {err}"),
			};
			false
		}
		KeyCode::Char('m') => {
			let changed = planner.mark_all_read();
			app.status = match persist(planner_path.as_path(), planner) {
				Ok(()) => format!("marked {changed} notification(s) read"),
				Err(err) => format!("error: {err}"),
			};
			false
		}
		KeyCode::Char('d') => {
			if app.focus != FocusPane::Notifications {
				return false;
			}
			let result = match view.notifications.get(app.notification_index) {
				Some(notification) => dismiss(planner, planner_path.as_path(), &notification.id),
				None => Err("No notification selected".to_string()),
			};
			app.status = match result {
				Ok(message) => message,
				Err(err) => format!("error: {err}"),
			};
			false
		}
		KeyCode::Char('g') => {
			match build_planner_switch_select(planner_path.as_path()) {
				Ok(select) => app.mode = InputMode::Select(select),
				Err(err) => app.status = err,
			}
			false
		}
		KeyCode::Char(' ') => {
			let result = match app.focus {
				FocusPane::Tasks => match view.snapshot.tasks.get(app.task_index) {
					Some(task) => toggle_task(app, planner, planner_path.as_path(), &task.id),
					None => Err("Select a task first".to_string()),
				},
				FocusPane::Notifications => match view.notifications.get(app.notification_index) {
					Some(notification) => mark_read(planner, planner_path.as_path(), &notification.id),
					None => Err("No notification selected".to_string()),
				},
				FocusPane::Calendar | FocusPane::Sessions => {
					Err("Focus Tasks or Notifications to use space".to_string())
				}
			};
			app.status = match result {
				Ok(message) => message,
				Err(err) => format!("error: {err}"),
			};
			false
		}
		_ => false,
	}
}

fn handle_prompt_key(app: &mut App, code: KeyCode) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Input cancelled".to_string();
		}
		KeyCode::Backspace => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.pop();
			}
		}
		KeyCode::Char(value) => {
			if let InputMode::Prompt(prompt) = &mut app.mode {
				prompt.input.push(value);
			}
		}
		KeyCode::Enter => {
			let prompt = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Prompt(prompt) => prompt,
				InputMode::Normal | InputMode::Select(_) => return false,
			};

			match submit_prompt(prompt.clone()) {
				Ok(PromptOutcome::NextPrompt(next_prompt)) => app.mode = InputMode::Prompt(next_prompt),
				Ok(PromptOutcome::Select(select)) => app.mode = InputMode::Select(select),
				Err(err) => {
					app.mode = InputMode::Prompt(prompt);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

fn handle_select_key(
	app: &mut App,
	code: KeyCode,
	planner: &mut Planner,
	planner_path: &mut PathBuf,
) -> bool {
	match code {
		KeyCode::Esc => {
			app.mode = InputMode::Normal;
			app.status = "Selection cancelled".to_string();
		}
		KeyCode::Up | KeyCode::Char('k') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(-1);
			}
		}
		KeyCode::Down | KeyCode::Char('j') => {
			if let InputMode::Select(select) = &mut app.mode {
				select.move_selection(1);
			}
		}
		KeyCode::Enter => {
			let select = match std::mem::replace(&mut app.mode, InputMode::Normal) {
				InputMode::Select(select) => select,
				_ => return false,
			};

			match submit_select(select.clone(), planner, planner_path) {
				Ok(message) => {
					app.mode = InputMode::Normal;
					app.status = message;
				}
				Err(err) => {
					app.mode = InputMode::Select(select);
					app.status = format!("error: {err}");
				}
			}
		}
		_ => {}
	}

	false
}

/// Prompts only collect input; the final select step writes the planner.
fn submit_prompt(prompt: PromptState) -> Result<PromptOutcome, String> {
	match prompt.kind {
		PromptKind::AddTaskTitle => {
			let title = required_text(&prompt.input, "task title")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Course",
				PromptKind::AddTaskCourse { title },
			)))
		}
		PromptKind::AddTaskCourse { title } => {
			let course = required_text(&prompt.input, "course")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Due date YYYY-MM-DD (empty = today)",
				PromptKind::AddTaskDue { title, course },
			)))
		}
		PromptKind::AddTaskDue { title, course } => {
			let due = match optional_text(&prompt.input) {
				Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d")
					.map_err(|err| format!("invalid date '{raw}': {err}"))?,
				None => today(),
			};
			Ok(PromptOutcome::Select(build_priority_select(title, course, due)))
		}
		PromptKind::AddSessionTitle { date } => {
			let title = required_text(&prompt.input, "session title")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Course",
				PromptKind::AddSessionCourse { date, title },
			)))
		}
		PromptKind::AddSessionCourse { date, title } => {
			let course = required_text(&prompt.input, "course")?;
			Ok(PromptOutcome::NextPrompt(PromptState::new(
				"Time range HH:MM-HH:MM",
				PromptKind::AddSessionTimes { date, title, course },
			)))
		}
		PromptKind::AddSessionTimes { date, title, course } => {
			let (start, end) = parse_time_range(&prompt.input)?;
			if start >= end {
				return Err("session must start before it ends".to_string());
			}
			Ok(PromptOutcome::Select(build_category_select(date, title, course, start, end)))
		}
	}
}

fn submit_select(
	select: SelectState,
	planner: &mut Planner,
	planner_path: &mut PathBuf,
) -> Result<String, String> {
	let selected_value = select
		.selected_option()
		.map(|option| option.value.clone())
		.ok_or_else(|| "no option selected".to_string())?;

	match select.kind {
		SelectKind::TaskPriority { title, course, due } => {
			let priority = selected_value
				.ok_or_else(|| "selected priority is missing".to_string())?
				.parse::<Priority>()
				.map_err(|err| err.to_string())?;
			let created = title.clone();
			planner
				.add_task(title, course, due, priority)
				.map_err(|err| err.to_string())?;
			persist(planner_path.as_path(), planner)?;
			Ok(format!("created task: {created}"))
		}
		SelectKind::SessionCategory {
			date,
			title,
			course,
			start,
			end,
		} => {
			let created = title.clone();
			planner
				.add_session(title, course, date, start, end, selected_value)
				.map_err(|err| err.to_string())?;
			persist(planner_path.as_path(), planner)?;
			Ok(format!("scheduled {created} on {}", date.format("%a %d %b")))
		}
		SelectKind::RemoveSessionConfirm { session_id } => {
			if selected_value.as_deref() != Some("remove") {
				return Ok("Remove cancelled".to_string());
			}
			let removed = planner.remove_session(&session_id).map_err(|err| err.to_string())?;
			persist(planner_path.as_path(), planner)?;
			Ok(format!("removed session: {}", removed.title))
		}
		SelectKind::PlannerSwitch => {
			let selected_path = selected_value
				.map(PathBuf::from)
				.ok_or_else(|| "selected planner path is missing".to_string())?;
			switch_planner(planner, planner_path, selected_path)
		}
	}
}

fn build_priority_select(title: String, course: String, due: NaiveDate) -> SelectState {
	let options = [Priority::High, Priority::Medium, Priority::Low]
		.into_iter()
		.map(|priority| {
			SelectOption::new(
				priority.as_str(),
				Some(priority.as_str().to_string()),
				priority_style(priority),
			)
		})
		.collect::<Vec<_>>();

	let mut select = SelectState::new(
		"Select priority",
		SelectKind::TaskPriority { title, course, due },
		options,
	);
	select.selected = 1;
	select
}

fn build_category_select(
	date: NaiveDate,
	title: String,
	course: String,
	start: NaiveTime,
	end: NaiveTime,
) -> SelectState {
	let options = SESSION_CATEGORIES
		.iter()
		.map(|category| SelectOption::new(*category, Some(category.to_string()), category_style(category)))
		.collect::<Vec<_>>();

	SelectState::new(
		"Select session colour",
		SelectKind::SessionCategory {
			date,
			title,
			course,
			start,
			end,
		},
		options,
	)
}

fn build_remove_session_select(session: &StudySession) -> SelectState {
	let title = format!(
		"Remove session? {} {} {}",
		session.title,
		session.date.format("%a %d %b"),
		session.time_range()
	);
	let options = vec![
		SelectOption::new(
			"Remove",
			Some("remove".to_string()),
			Style::default().fg(Color::LightRed).add_modifier(Modifier::BOLD),
		),
		SelectOption::new("Cancel", Some("cancel".to_string()), Style::default()),
	];

	let mut select = SelectState::new(
		title,
		SelectKind::RemoveSessionConfirm {
			session_id: session.id.clone(),
		},
		options,
	);
	select.selected = 1;
	select
}

fn build_planner_switch_select(current_path: &Path) -> Result<SelectState, String> {
	let mut paths = recent_planners(100).map_err(|err| format!("failed to load recent planners: {err}"))?;
	let current_path = current_path.to_path_buf();
	if !paths.iter().any(|path| path == &current_path) {
		paths.insert(0, current_path.clone());
	}

	let current_value = current_path.display().to_string();
	let options = paths
		.into_iter()
		.map(|path| {
			let value = path.display().to_string();
			let is_current = value == current_value;
			let exists = path.exists();
			let mut label = value.clone();
			if is_current {
				label = format!("* {label}");
			}
			if !exists {
				label = format!("[missing] {label}");
			}

			let style = if is_current {
				Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
			} else if exists {
				Style::default()
			} else {
				Style::default().fg(Color::DarkGray)
			};

			SelectOption::new(label, Some(value), style)
		})
		.collect::<Vec<_>>();

	let mut select = SelectState::new("Switch planner", SelectKind::PlannerSwitch, options);
	select.selected = select
		.options
		.iter()
		.position(|option| option.value.as_deref() == Some(current_value.as_str()))
		.unwrap_or(0);
	Ok(select)
}

fn build_view(app: &App, planner: &Planner, today: NaiveDate) -> ViewModel {
	let snapshot = app.view.snapshot(planner, planner);
	let session_rows = snapshot
		.days
		.iter()
		.flat_map(|day| day.sessions.iter())
		.map(|session| SessionRow {
			session: session.clone(),
		})
		.collect();

	ViewModel {
		today,
		owner: planner.preferences().owner.clone(),
		rest_days: snapshot
			.window
			.dates
			.iter()
			.copied()
			.filter(|date| !planner.preferences().is_study_day(date.weekday()))
			.collect(),
		summary: DashboardSummary::build(planner, today),
		notifications: planner.notification_feed(false).into_iter().cloned().collect(),
		unread: planner.unread_count(),
		session_rows,
		snapshot,
	}
}

fn toggle_task(app: &App, planner: &mut Planner, planner_path: &Path, task_id: &str) -> Result<String, String> {
	let task = app
		.view
		.toggle_task(planner, task_id)
		.map_err(|err| err.to_string())?;
	planner.celebrate_completion(&task, Utc::now());
	persist(planner_path, planner)?;
	Ok(if task.completed {
		format!("completed {}", task.title)
	} else {
		format!("reopened {}", task.title)
	})
}

fn mark_read(planner: &mut Planner, planner_path: &Path, notification_id: &str) -> Result<String, String> {
	planner.mark_read(notification_id).map_err(|err| err.to_string())?;
	persist(planner_path, planner)?;
	Ok("marked read".to_string())
}

fn dismiss(planner: &mut Planner, planner_path: &Path, notification_id: &str) -> Result<String, String> {
	let removed = planner.dismiss(notification_id).map_err(|err| err.to_string())?;
	persist(planner_path, planner)?;
	Ok(format!("dismissed {}", removed.title))
}

fn switch_planner(planner: &mut Planner, planner_path: &mut PathBuf, next_path: PathBuf) -> Result<String, String> {
	if *planner_path == next_path {
		return Ok("planner already active".to_string());
	}

	let next_planner = load_planner(&next_path).map_err(|err| err.to_string())?;
	*planner = next_planner;
	*planner_path = next_path;
	if let Err(err) = remember_planner(planner_path.as_path()) {
		log::warn!("event=remember_planner_failed error={err}");
	}
	Ok(format!("switched to {}", planner_path.display()))
}

fn persist(path: &Path, planner: &Planner) -> Result<(), String> {
	save_planner(path, planner).map_err(|err| err.to_string())
}

fn required_text(input: &str, field_name: &str) -> Result<String, String> {
	let value = input.trim();
	if value.is_empty() {
		return Err(format!("{field_name} cannot be empty"));
	}

	Ok(value.to_string())
}

fn optional_text(input: &str) -> Option<String> {
	let value = input.trim();
	if value.is_empty() {
		None
	} else {
		Some(value.to_string())
	}
}

fn parse_time_range(input: &str) -> Result<(NaiveTime, NaiveTime), String> {
	let (start, end) = input
		.trim()
		.split_once('-')
		.ok_or_else(|| format!("invalid time range '{input}', expected HH:MM-HH:MM"))?;
	let parse = |raw: &str| {
		NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|err| format!("invalid time '{raw}': {err}"))
	};
	Ok((parse(start)?, parse(end)?))
}

fn due_label(due: NaiveDate, today: NaiveDate) -> String {
	match (due - today).num_days() {
		0 => "today".to_string(),
		1 => "tomorrow".to_string(),
		days if days > 1 && days < 7 => format!("in {days} days"),
		_ => due.format("%d %b").to_string(),
	}
}

fn priority_style(priority: Priority) -> Style {
	match priority {
		Priority::High => Style::default().fg(Color::LightRed),
		Priority::Medium => Style::default().fg(Color::Yellow),
		Priority::Low => Style::default().fg(Color::Green),
	}
}

fn category_style(category: &str) -> Style {
	match color_from_category(category) {
		Some(color) => Style::default().fg(color).add_modifier(Modifier::BOLD),
		None => Style::default().add_modifier(Modifier::BOLD),
	}
}

fn color_from_category(category: &str) -> Option<Color> {
	match category {
		"primary" => Some(Color::LightBlue),
		"secondary" => Some(Color::Cyan),
		"accent" => Some(Color::LightMagenta),
		"green" => Some(Color::Green),
		"purple" => Some(Color::Magenta),
		"gray" => Some(Color::Gray),
		_ => None,
	}
}

fn border_style(focused: bool) -> Style {
	if focused {
		Style::default()
			.fg(FOCUSED_PANEL_BORDER_COLOR)
			.add_modifier(Modifier::BOLD)
	} else {
		Style::default().fg(INACTIVE_PANEL_BORDER_COLOR)
	}
}

#[derive(Debug, Clone)]
enum PromptOutcome {
	NextPrompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct PromptState {
	title: String,
	input: String,
	kind: PromptKind,
}

impl PromptState {
	fn new(title: impl Into<String>, kind: PromptKind) -> Self {
		Self {
			title: title.into(),
			input: String::new(),
			kind,
		}
	}
}

#[derive(Debug, Clone)]
struct SelectState {
	title: String,
	options: Vec<SelectOption>,
	selected: usize,
	kind: SelectKind,
}

impl SelectState {
	fn new(title: impl Into<String>, kind: SelectKind, options: Vec<SelectOption>) -> Self {
		Self {
			title: title.into(),
			options,
			selected: 0,
			kind,
		}
	}

	fn move_selection(&mut self, delta: i32) {
		if self.options.is_empty() {
			self.selected = 0;
			return;
		}

		if delta > 0 {
			self.selected = (self.selected + delta as usize).min(self.options.len() - 1);
		} else {
			self.selected = self.selected.saturating_sub(delta.unsigned_abs() as usize);
		}
	}

	fn selected_option(&self) -> Option<&SelectOption> {
		self.options.get(self.selected)
	}
}

#[derive(Debug, Clone)]
struct SelectOption {
	label: String,
	value: Option<String>,
	style: Style,
}

impl SelectOption {
	fn new(label: impl Into<String>, value: Option<String>, style: Style) -> Self {
		Self {
			label: label.into(),
			value,
			style,
		}
	}
}

#[derive(Debug, Clone)]
enum PromptKind {
	AddTaskTitle,
	AddTaskCourse {
		title: String,
	},
	AddTaskDue {
		title: String,
		course: String,
	},
	AddSessionTitle {
		date: NaiveDate,
	},
	AddSessionCourse {
		date: NaiveDate,
		title: String,
	},
	AddSessionTimes {
		date: NaiveDate,
		title: String,
		course: String,
	},
}

#[derive(Debug, Clone)]
enum SelectKind {
	TaskPriority {
		title: String,
		course: String,
		due: NaiveDate,
	},
	SessionCategory {
		date: NaiveDate,
		title: String,
		course: String,
		start: NaiveTime,
		end: NaiveTime,
	},
	RemoveSessionConfirm {
		session_id: String,
	},
	PlannerSwitch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FocusPane {
	Calendar,
	Sessions,
	Tasks,
	Notifications,
}

impl FocusPane {
	fn next(self) -> Self {
		match self {
			FocusPane::Calendar => FocusPane::Sessions,
			FocusPane::Sessions => FocusPane::Tasks,
			FocusPane::Tasks => FocusPane::Notifications,
			FocusPane::Notifications => FocusPane::Calendar,
		}
	}

	fn prev(self) -> Self {
		match self {
			FocusPane::Calendar => FocusPane::Notifications,
			FocusPane::Sessions => FocusPane::Calendar,
			FocusPane::Tasks => FocusPane::Sessions,
			FocusPane::Notifications => FocusPane::Tasks,
		}
	}
}

#[derive(Debug, Clone)]
enum InputMode {
	Normal,
	Prompt(PromptState),
	Select(SelectState),
}

#[derive(Debug, Clone)]
struct App {
	view: PlannerViewModel,
	focus: FocusPane,
	session_index: usize,
	task_index: usize,
	notification_index: usize,
	mode: InputMode,
	status: String,
}

impl App {
	fn new(granularity: Granularity, today: NaiveDate) -> Self {
		Self {
			view: PlannerViewModel::new(granularity, today),
			focus: FocusPane::Calendar,
			session_index: 0,
			task_index: 0,
			notification_index: 0,
			mode: InputMode::Normal,
			status: "Ready".to_string(),
		}
	}

	fn clamp_selection(&mut self, view: &ViewModel) {
		self.session_index = clamp_index(self.session_index, view.session_rows.len());
		self.task_index = clamp_index(self.task_index, view.snapshot.tasks.len());
		self.notification_index = clamp_index(self.notification_index, view.notifications.len());
	}

	fn shift_selected_day(&mut self, delta_days: i64) {
		self.view.shift_selection(delta_days);
		self.session_index = 0;
	}

	fn move_list_selection(&mut self, delta: i32, view: &ViewModel) {
		let (index, len) = match self.focus {
			FocusPane::Calendar => return,
			FocusPane::Sessions => (&mut self.session_index, view.session_rows.len()),
			FocusPane::Tasks => (&mut self.task_index, view.snapshot.tasks.len()),
			FocusPane::Notifications => (&mut self.notification_index, view.notifications.len()),
		};

		if len == 0 {
			*index = 0;
			return;
		}

		if delta > 0 {
			*index = (*index + delta as usize).min(len - 1);
		} else {
			*index = index.saturating_sub(delta.unsigned_abs() as usize);
		}
	}
}

fn clamp_index(index: usize, len: usize) -> usize {
	if len == 0 { 0 } else { index.min(len - 1) }
}

struct ViewModel {
	today: NaiveDate,
	owner: Option<String>,
	rest_days: Vec<NaiveDate>,
	summary: DashboardSummary,
	notifications: Vec<Notification>,
	unread: usize,
	session_rows: Vec<SessionRow>,
	snapshot: PlannerSnapshot,
}

struct SessionRow {
	session: StudySession,
}

#[cfg(test)]
mod tests {
	use chrono::{NaiveDate, NaiveTime};

	use super::{due_label, parse_time_range};

	#[test]
	fn parses_time_ranges() {
		let (start, end) = parse_time_range(" 09:00 - 10:30 ").expect("range should parse");
		assert_eq!(start, NaiveTime::from_hms_opt(9, 0, 0).unwrap());
		assert_eq!(end, NaiveTime::from_hms_opt(10, 30, 0).unwrap());
		assert!(parse_time_range("9am").is_err());
		assert!(parse_time_range("25:00-26:00").is_err());
	}

	#[test]
	fn labels_due_dates_relative_to_today() {
		let today = NaiveDate::from_ymd_opt(2025, 4, 15).unwrap();
		assert_eq!(due_label(today, today), "today");
		assert_eq!(due_label(today.succ_opt().unwrap(), today), "tomorrow");
		assert_eq!(due_label(NaiveDate::from_ymd_opt(2025, 4, 18).unwrap(), today), "in 3 days");
		assert_eq!(due_label(NaiveDate::from_ymd_opt(2025, 4, 10).unwrap(), today), "10 Apr");
	}
}
