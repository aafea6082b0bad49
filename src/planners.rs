use std::env;
use std::fs;
use std::io::{Error, ErrorKind, Write};
use std::path::{Path, PathBuf};

pub const PLANNER_FILE_ENV: &str = "STUDY_PLANNER_FILE";
pub const STATE_DIR_ENV: &str = "STUDY_PLANNER_STATE_DIR";
const APP_DIR_NAME: &str = "study_planner";
const RECENT_PLANNERS_FILE: &str = "recent_planners.txt";
const MAX_RECENT_PLANNERS: usize = 50;

/// Picks the planner file: explicit flag, then `STUDY_PLANNER_FILE`, then the
/// most recently used planner.
pub fn resolve_planner_path(cli_path: Option<PathBuf>) -> Result<PathBuf, Error> {
	if let Some(path) = cli_path {
		return Ok(absolutize(path));
	}

	if let Some(path) = env::var_os(PLANNER_FILE_ENV) {
		let path = PathBuf::from(path);
		if !path.as_os_str().is_empty() {
			return Ok(absolutize(path));
		}
	}

	if let Ok(mut recent) = recent_planners(MAX_RECENT_PLANNERS) {
		if let Some(path) = recent.drain(..).next() {
			return Ok(path);
		}
	}

	Err(Error::new(
		ErrorKind::NotFound,
		"no planner selected: pass --planner <path>, set STUDY_PLANNER_FILE, or pick one from `planners`",
	))
}

pub fn remember_planner(path: &Path) -> Result<(), Error> {
	let path = absolutize(path.to_path_buf());
	let mut entries = recent_planners(MAX_RECENT_PLANNERS)?;
	entries.retain(|entry| entry != &path);
	entries.insert(0, path);
	entries.truncate(MAX_RECENT_PLANNERS);
	save_recent_planners(&entries)
}

pub fn recent_planners(limit: usize) -> Result<Vec<PathBuf>, Error> {
	let raw = match fs::read_to_string(recent_planners_path()) {
		Ok(raw) => raw,
		Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
		Err(err) => return Err(err),
	};

	Ok(raw
		.lines()
		.map(str::trim)
		.filter(|line| !line.is_empty())
		.take(limit)
		.map(PathBuf::from)
		.collect())
}

fn save_recent_planners(entries: &[PathBuf]) -> Result<(), Error> {
	fs::create_dir_all(state_dir())?;

	let mut file = fs::File::create(recent_planners_path())?;
	for path in entries {
		writeln!(file, "{}", path.display())?;
	}

	Ok(())
}

fn recent_planners_path() -> PathBuf {
	state_dir().join(RECENT_PLANNERS_FILE)
}

pub fn log_dir() -> PathBuf {
	state_dir().join("logs")
}

pub fn state_dir() -> PathBuf {
	if let Some(path) = env::var_os(STATE_DIR_ENV) {
		return PathBuf::from(path);
	}

	#[cfg(target_os = "windows")]
	{
		if let Some(path) = env::var_os("LOCALAPPDATA") {
			return PathBuf::from(path).join(APP_DIR_NAME);
		}
	}

	if let Some(path) = env::var_os("XDG_STATE_HOME") {
		return PathBuf::from(path).join(APP_DIR_NAME);
	}

	if let Some(path) = env::var_os("HOME") {
		return PathBuf::from(path)
			.join(".local")
			.join("state")
			.join(APP_DIR_NAME);
	}

	PathBuf::from(".study_planner")
}

fn absolutize(path: PathBuf) -> PathBuf {
	let path = if path.is_absolute() {
		path
	} else if let Ok(cwd) = env::current_dir() {
		cwd.join(path)
	} else {
		path
	};

	if path.exists() {
		fs::canonicalize(&path).unwrap_or(path)
	} else {
		path
	}
}

#[cfg(test)]
mod tests {
	use std::path::PathBuf;

	use super::resolve_planner_path;

	#[test]
	fn explicit_path_wins_and_is_made_absolute() {
		let resolved = resolve_planner_path(Some(PathBuf::from("term.planner"))).expect("path should resolve");
		assert!(resolved.is_absolute());
		assert!(resolved.ends_with("term.planner"));
	}
}
