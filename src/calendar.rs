//! Calendar windowing: which dates a day or week view shows, and which
//! sessions land on each of them.

use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::domain::StudySession;
use crate::error::PlannerError;

pub const WEEK_LEN: usize = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    Day,
    #[default]
    Week,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            Self::Day => Self::Week,
            Self::Week => Self::Day,
        }
    }

    fn step(self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(WEEK_LEN as i64),
        }
    }
}

impl Display for Granularity {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            other => Err(PlannerError::Config(format!(
                "unknown granularity '{other}', expected day|week"
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarWindow {
    pub anchor: NaiveDate,
    pub granularity: Granularity,
    pub dates: Vec<NaiveDate>,
}

impl CalendarWindow {
    pub fn first(&self) -> NaiveDate {
        self.dates.first().copied().unwrap_or(self.anchor)
    }

    pub fn last(&self) -> NaiveDate {
        self.dates.last().copied().unwrap_or(self.anchor)
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.dates.contains(&date)
    }

    pub fn label(&self) -> String {
        match self.granularity {
            Granularity::Day => self.anchor.format("%A, %d %B %Y").to_string(),
            Granularity::Week => format!(
                "{} - {}",
                self.first().format("%d %b"),
                self.last().format("%d %b %Y")
            ),
        }
    }
}

pub fn start_of_week(day: NaiveDate) -> NaiveDate {
    let days_from_monday = day.weekday().num_days_from_monday() as i64;
    day.checked_sub_signed(Duration::days(days_from_monday))
        .unwrap_or(day)
}

pub fn compute_window(anchor: NaiveDate, granularity: Granularity) -> CalendarWindow {
    let dates = match granularity {
        Granularity::Day => vec![anchor],
        Granularity::Week => start_of_week(anchor).iter_days().take(WEEK_LEN).collect(),
    };

    CalendarWindow {
        anchor,
        granularity,
        dates,
    }
}

/// Returns the anchor of the neighbouring window. Past the ends of the
/// supported date range the current anchor comes back unchanged.
pub fn advance(window: &CalendarWindow, granularity: Granularity, direction: Direction) -> NaiveDate {
    let step = granularity.step();
    let shifted = match direction {
        Direction::Previous => window.anchor.checked_sub_signed(step),
        Direction::Next => window.anchor.checked_add_signed(step),
    };
    shifted.unwrap_or(window.anchor)
}

/// Sessions dated exactly `date`, in store order. The iterator is lazy and can
/// be cloned to walk the same day again.
pub fn sessions_on_date(
    sessions: &[StudySession],
    date: NaiveDate,
) -> impl Iterator<Item = &StudySession> + Clone + '_ {
    sessions.iter().filter(move |session| session.date == date)
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};

    use super::{Direction, Granularity, advance, compute_window, sessions_on_date, start_of_week};
    use crate::domain::StudySession;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    fn session(title: &str, day: NaiveDate, hour: u32) -> StudySession {
        StudySession::new(
            title,
            "Physics 202",
            day,
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap(),
            None,
        )
        .expect("session should be valid")
    }

    #[test]
    fn week_windows_start_on_the_monday_before_the_anchor() {
        let mut anchor = date(2024, 12, 20);
        for _ in 0..400 {
            let window = compute_window(anchor, Granularity::Week);
            assert_eq!(window.dates.len(), 7);
            assert_eq!(window.first().weekday(), Weekday::Mon);
            assert!(window.first() <= anchor);
            assert!((anchor - window.first()).num_days() <= 6);
            for pair in window.dates.windows(2) {
                assert_eq!(pair[1] - pair[0], Duration::days(1));
            }
            assert!(window.contains(anchor));
            anchor += Duration::days(1);
        }
    }

    #[test]
    fn day_window_is_the_anchor_alone() {
        let anchor = date(2025, 2, 28);
        assert_eq!(compute_window(anchor, Granularity::Day).dates, vec![anchor]);
    }

    #[test]
    fn tuesday_anchor_shows_monday_through_sunday() {
        let window = compute_window(date(2025, 4, 15), Granularity::Week);
        assert_eq!(window.first(), date(2025, 4, 14));
        assert_eq!(window.last(), date(2025, 4, 20));
        assert_eq!(start_of_week(date(2025, 4, 20)), date(2025, 4, 14));
        assert_eq!(start_of_week(date(2025, 4, 14)), date(2025, 4, 14));
    }

    #[test]
    fn advancing_forward_then_back_returns_to_anchor() {
        let anchor = date(2025, 12, 29);
        for granularity in [Granularity::Week, Granularity::Day] {
            let window = compute_window(anchor, granularity);
            let next = advance(&window, granularity, Direction::Next);
            let expected_step = if granularity == Granularity::Week { 7 } else { 1 };
            assert_eq!((next - anchor).num_days(), expected_step);
            let back = advance(&compute_window(next, granularity), granularity, Direction::Previous);
            assert_eq!(back, anchor);
        }
    }

    #[test]
    fn advancing_past_the_last_date_keeps_the_anchor() {
        let window = compute_window(NaiveDate::MAX, Granularity::Day);
        assert_eq!(advance(&window, Granularity::Day, Direction::Next), NaiveDate::MAX);
    }

    #[test]
    fn sessions_on_date_keeps_store_order() {
        let sessions = vec![
            session("Physics Problem Set", date(2025, 4, 16), 10),
            session("Calculus Practice", date(2025, 4, 17), 9),
            session("Essay Outline", date(2025, 4, 16), 8),
        ];

        let day = sessions_on_date(&sessions, date(2025, 4, 16));
        let titles = day.clone().map(|session| session.title.as_str()).collect::<Vec<_>>();
        assert_eq!(titles, vec!["Physics Problem Set", "Essay Outline"]);
        assert_eq!(day.count(), 2);
        assert_eq!(sessions_on_date(&sessions, date(2025, 4, 18)).count(), 0);
    }

    #[test]
    fn parses_granularity_or_fails_as_configuration() {
        assert_eq!("Week".parse::<Granularity>().unwrap(), Granularity::Week);
        assert_eq!("day".parse::<Granularity>().unwrap(), Granularity::Day);
        assert!("month".parse::<Granularity>().is_err());
    }
}
