use std::fmt::{Display, Formatter};
use std::str::FromStr;

use chrono::Weekday;
use serde::{Deserialize, Serialize};

use crate::calendar::Granularity;
use crate::domain::reject_control;
use crate::error::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StudyTime {
    #[default]
    Morning,
    Afternoon,
    Evening,
    Night,
    Any,
}

impl StudyTime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
            Self::Any => "any",
        }
    }

    /// Wall-clock hours covered, `[start, end)`. Night wraps past midnight.
    pub fn hours(&self) -> (u32, u32) {
        match self {
            Self::Morning => (6, 12),
            Self::Afternoon => (12, 17),
            Self::Evening => (17, 22),
            Self::Night => (22, 6),
            Self::Any => (0, 24),
        }
    }
}

impl Display for StudyTime {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StudyTime {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "morning" => Ok(Self::Morning),
            "afternoon" => Ok(Self::Afternoon),
            "evening" => Ok(Self::Evening),
            "night" => Ok(Self::Night),
            "any" => Ok(Self::Any),
            other => Err(ValidationError::StudyTime(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    pub session_reminders: bool,
    pub deadline_reminders: bool,
    pub completion_celebrations: bool,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            session_reminders: true,
            deadline_reminders: true,
            completion_celebrations: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyPreferences {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub courses: Vec<String>,
    pub preferred_study_time: StudyTime,
    pub max_daily_hours: u32,
    pub break_frequency_minutes: u32,
    pub break_duration_minutes: u32,
    pub preferred_study_days: Vec<Weekday>,
    pub notify_before_session_minutes: u32,
    pub default_view: Granularity,
    pub notifications: NotificationSettings,
}

impl Default for StudyPreferences {
    fn default() -> Self {
        Self {
            owner: None,
            courses: Vec::new(),
            preferred_study_time: StudyTime::Morning,
            max_daily_hours: 6,
            break_frequency_minutes: 60,
            break_duration_minutes: 15,
            preferred_study_days: vec![
                Weekday::Mon,
                Weekday::Tue,
                Weekday::Wed,
                Weekday::Thu,
                Weekday::Fri,
            ],
            notify_before_session_minutes: 15,
            default_view: Granularity::Week,
            notifications: NotificationSettings::default(),
        }
    }
}

impl StudyPreferences {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(1..=24).contains(&self.max_daily_hours) {
            return Err(ValidationError::OutOfRange {
                field: "max_daily_hours",
                value: self.max_daily_hours.into(),
            });
        }
        if self.break_frequency_minutes == 0 {
            return Err(ValidationError::OutOfRange {
                field: "break_frequency_minutes",
                value: 0,
            });
        }
        if self.break_duration_minutes >= self.break_frequency_minutes {
            return Err(ValidationError::OutOfRange {
                field: "break_duration_minutes",
                value: self.break_duration_minutes.into(),
            });
        }
        if self.notify_before_session_minutes > 24 * 60 {
            return Err(ValidationError::OutOfRange {
                field: "notify_before_session_minutes",
                value: self.notify_before_session_minutes.into(),
            });
        }
        if let Some(owner) = &self.owner {
            reject_control(owner, "owner")?;
        }
        for course in &self.courses {
            reject_control(course, "course")?;
        }
        Ok(())
    }

    pub fn is_study_day(&self, weekday: Weekday) -> bool {
        self.preferred_study_days.contains(&weekday)
    }

    /// Applies the changes only when the result still validates.
    pub fn apply(&mut self, changes: PreferenceChanges) -> Result<bool, ValidationError> {
        let mut next = self.clone();
        if let Some(owner) = changes.owner {
            let owner = owner.trim().to_string();
            next.owner = if owner.is_empty() { None } else { Some(owner) };
        }
        if let Some(courses) = changes.courses {
            next.courses = courses
                .into_iter()
                .map(|course| course.trim().to_string())
                .filter(|course| !course.is_empty())
                .collect();
        }
        if let Some(time) = changes.preferred_study_time {
            next.preferred_study_time = time;
        }
        if let Some(hours) = changes.max_daily_hours {
            next.max_daily_hours = hours;
        }
        if let Some(minutes) = changes.break_frequency_minutes {
            next.break_frequency_minutes = minutes;
        }
        if let Some(minutes) = changes.break_duration_minutes {
            next.break_duration_minutes = minutes;
        }
        if let Some(days) = changes.preferred_study_days {
            next.preferred_study_days = days;
        }
        if let Some(minutes) = changes.notify_before_session_minutes {
            next.notify_before_session_minutes = minutes;
        }
        if let Some(view) = changes.default_view {
            next.default_view = view;
        }
        if let Some(enabled) = changes.session_reminders {
            next.notifications.session_reminders = enabled;
        }
        if let Some(enabled) = changes.deadline_reminders {
            next.notifications.deadline_reminders = enabled;
        }
        if let Some(enabled) = changes.completion_celebrations {
            next.notifications.completion_celebrations = enabled;
        }

        next.validate()?;
        let changed = next != *self;
        *self = next;
        Ok(changed)
    }
}

#[derive(Debug, Clone, Default)]
pub struct PreferenceChanges {
    pub owner: Option<String>,
    pub courses: Option<Vec<String>>,
    pub preferred_study_time: Option<StudyTime>,
    pub max_daily_hours: Option<u32>,
    pub break_frequency_minutes: Option<u32>,
    pub break_duration_minutes: Option<u32>,
    pub preferred_study_days: Option<Vec<Weekday>>,
    pub notify_before_session_minutes: Option<u32>,
    pub default_view: Option<Granularity>,
    pub session_reminders: Option<bool>,
    pub deadline_reminders: Option<bool>,
    pub completion_celebrations: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::{PreferenceChanges, StudyPreferences, StudyTime};
    use crate::calendar::Granularity;
    use crate::error::ValidationError;

    #[test]
    fn defaults_validate() {
        let preferences = StudyPreferences::default();
        assert!(preferences.validate().is_ok());
        assert_eq!(preferences.default_view, Granularity::Week);
        assert_eq!(preferences.preferred_study_days.len(), 5);
    }

    #[test]
    fn rejected_changes_keep_previous_values() {
        let mut preferences = StudyPreferences::default();
        let err = preferences
            .apply(PreferenceChanges {
                max_daily_hours: Some(30),
                preferred_study_time: Some(StudyTime::Night),
                ..PreferenceChanges::default()
            })
            .expect_err("30 hours should be rejected");
        assert!(matches!(err, ValidationError::OutOfRange { field: "max_daily_hours", .. }));
        assert_eq!(preferences, StudyPreferences::default());
    }

    #[test]
    fn break_must_be_shorter_than_its_interval() {
        let mut preferences = StudyPreferences::default();
        assert!(
            preferences
                .apply(PreferenceChanges {
                    break_duration_minutes: Some(60),
                    ..PreferenceChanges::default()
                })
                .is_err()
        );
    }

    #[test]
    fn apply_reports_whether_anything_changed() {
        let mut preferences = StudyPreferences::default();
        let changed = preferences
            .apply(PreferenceChanges {
                owner: Some("  Sam ".to_string()),
                courses: Some(vec!["Physics 202".to_string(), " ".to_string()]),
                ..PreferenceChanges::default()
            })
            .expect("valid changes");
        assert!(changed);
        assert_eq!(preferences.owner.as_deref(), Some("Sam"));
        assert_eq!(preferences.courses, vec!["Physics 202".to_string()]);

        let unchanged = preferences
            .apply(PreferenceChanges::default())
            .expect("no-op changes");
        assert!(!unchanged);
    }

    #[test]
    fn owner_and_courses_stay_on_one_line() {
        let mut preferences = StudyPreferences::default();
        let err = preferences
            .apply(PreferenceChanges {
                owner: Some("Sam\n[preferences]".to_string()),
                ..PreferenceChanges::default()
            })
            .expect_err("line break in owner should be rejected");
        assert_eq!(err, ValidationError::ControlCharacter { field: "owner" });
        assert_eq!(preferences, StudyPreferences::default());
    }
}
