pub mod calendar;
pub mod domain;
pub mod error;
pub mod logging;
pub mod notifications;
pub mod planners;
pub mod priority;
pub mod settings;
pub mod stats;
pub mod storage;
pub mod store;
pub mod view_model;

pub use calendar::{CalendarWindow, Direction, Granularity, advance, compute_window, sessions_on_date};
pub use domain::{Notification, NotificationKind, Planner, Priority, StudySession, Task};
pub use error::{PlannerError, ValidationError};
pub use priority::order_tasks;
pub use store::{SessionStore, TaskPatch, TaskStore};
pub use view_model::{PlannerSnapshot, PlannerViewModel};
