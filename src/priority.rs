use std::cmp::Reverse;

use crate::domain::Task;

/// Display order for tasks: open before done, then high before low, then the
/// soonest due date. `sort_by_key` is stable so equal keys keep store order.
pub fn order_tasks(tasks: &[Task]) -> Vec<Task> {
    let mut ordered = tasks.to_vec();
    ordered.sort_by_key(|task| (task.completed, Reverse(task.priority), task.due));
    ordered
}

pub fn upcoming_tasks(tasks: &[Task], limit: usize) -> Vec<Task> {
    order_tasks(tasks)
        .into_iter()
        .filter(|task| !task.completed)
        .take(limit)
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::{order_tasks, upcoming_tasks};
    use crate::domain::{Priority, Task};

    fn task(title: &str, priority: Priority, due: (i32, u32, u32), completed: bool) -> Task {
        let mut task = Task::new(
            title,
            "Mathematics 201",
            NaiveDate::from_ymd_opt(due.0, due.1, due.2).unwrap(),
            priority,
        )
        .expect("task should be valid");
        task.completed = completed;
        task
    }

    fn titles(tasks: &[Task]) -> Vec<&str> {
        tasks.iter().map(|task| task.title.as_str()).collect()
    }

    #[test]
    fn open_high_priority_first_and_done_last() {
        let tasks = vec![
            task("low", Priority::Low, (2025, 4, 15), false),
            task("high", Priority::High, (2025, 4, 16), false),
            task("medium", Priority::Medium, (2025, 4, 14), true),
        ];
        assert_eq!(titles(&order_tasks(&tasks)), vec!["high", "low", "medium"]);
    }

    #[test]
    fn completed_tasks_never_precede_open_ones() {
        let tasks = vec![
            task("done high soon", Priority::High, (2025, 1, 1), true),
            task("open low late", Priority::Low, (2026, 1, 1), false),
            task("done medium", Priority::Medium, (2025, 6, 1), true),
            task("open medium", Priority::Medium, (2025, 6, 1), false),
        ];
        let ordered = order_tasks(&tasks);
        let first_done = ordered.iter().position(|task| task.completed).unwrap();
        assert!(ordered[first_done..].iter().all(|task| task.completed));
        assert_eq!(first_done, 2);
    }

    #[test]
    fn earlier_due_date_breaks_priority_ties_then_store_order() {
        let tasks = vec![
            task("later", Priority::High, (2025, 4, 20), false),
            task("first twin", Priority::High, (2025, 4, 18), false),
            task("second twin", Priority::High, (2025, 4, 18), false),
        ];
        assert_eq!(
            titles(&order_tasks(&tasks)),
            vec!["first twin", "second twin", "later"]
        );
    }

    #[test]
    fn ordering_is_idempotent_and_leaves_input_alone() {
        let tasks = vec![
            task("a", Priority::Low, (2025, 4, 19), false),
            task("b", Priority::High, (2025, 4, 19), true),
            task("c", Priority::Medium, (2025, 4, 17), false),
            task("d", Priority::Medium, (2025, 4, 17), false),
        ];
        let once = order_tasks(&tasks);
        let twice = order_tasks(&once);
        assert_eq!(once, twice);
        assert_eq!(titles(&tasks), vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn upcoming_skips_completed_and_limits() {
        let tasks = vec![
            task("done", Priority::High, (2025, 4, 14), true),
            task("one", Priority::High, (2025, 4, 15), false),
            task("two", Priority::Medium, (2025, 4, 15), false),
            task("three", Priority::Low, (2025, 4, 15), false),
            task("four", Priority::Low, (2025, 4, 16), false),
        ];
        assert_eq!(titles(&upcoming_tasks(&tasks, 3)), vec!["one", "two", "three"]);
    }
}
