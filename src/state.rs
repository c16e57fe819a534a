use std::sync::{Arc, Mutex};

use crate::models::{Settings, SettingsFile, Task, TasksFile, Timestamp};

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone)]
pub struct AppState {
    inner: Arc<Mutex<AppData>>,
}

impl AppState {
    pub fn new(tasks: Vec<Task>, settings: Settings) -> Self {
        Self {
            inner: Arc::new(Mutex::new(AppData { tasks, settings })),
        }
    }

    pub fn tasks_file(&self) -> TasksFile {
        let guard = self.inner.lock().expect("state poisoned");
        TasksFile {
            schema_version: SCHEMA_VERSION,
            tasks: guard.tasks.clone(),
        }
    }

    pub fn settings_file(&self) -> SettingsFile {
        let guard = self.inner.lock().expect("state poisoned");
        SettingsFile {
            schema_version: SCHEMA_VERSION,
            settings: guard.settings.clone(),
        }
    }

    pub fn tasks(&self) -> Vec<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.clone()
    }

    pub fn find_task(&self, task_id: &str) -> Option<Task> {
        let guard = self.inner.lock().expect("state poisoned");
        guard.tasks.iter().find(|t| t.id == task_id).cloned()
    }

    /// Newest first.
    pub fn add_task(&self, task: Task) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks.insert(0, task);
    }

    pub fn replace_tasks(&self, tasks: Vec<Task>) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.tasks = tasks;
    }

    pub fn toggle_task(&self, task_id: &str) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let task = guard.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.completed = !task.completed;
        Some(task.clone())
    }

    pub fn set_snoozed_until(&self, task_id: &str, until: Option<Timestamp>) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let task = guard.tasks.iter_mut().find(|t| t.id == task_id)?;
        task.snoozed_until = until;
        Some(task.clone())
    }

    pub fn remove_task(&self, task_id: &str) -> Option<Task> {
        let mut guard = self.inner.lock().expect("state poisoned");
        let index = guard.tasks.iter().position(|t| t.id == task_id)?;
        Some(guard.tasks.remove(index))
    }

    pub fn settings(&self) -> Settings {
        let guard = self.inner.lock().expect("state poisoned");
        guard.settings.clone()
    }

    pub fn update_settings(&self, settings: Settings) {
        let mut guard = self.inner.lock().expect("state poisoned");
        guard.settings = settings;
    }
}

#[derive(Debug)]
struct AppData {
    tasks: Vec<Task>,
    settings: Settings,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_task(id: &str) -> Task {
        Task {
            id: id.to_string(),
            text: format!("task-{id}"),
            completed: false,
            created_at: 1,
            reminder_time: None,
            snoozed_until: None,
        }
    }

    #[test]
    fn tasks_file_and_settings_file_include_schema_version() {
        let state = AppState::new(Vec::new(), Settings::default());
        let tasks_file = state.tasks_file();
        assert_eq!(tasks_file.schema_version, SCHEMA_VERSION);
        assert!(tasks_file.tasks.is_empty());
        assert_eq!(state.settings_file().schema_version, SCHEMA_VERSION);
    }

    #[test]
    fn add_task_prepends() {
        let state = AppState::new(vec![make_task("old")], Settings::default());
        state.add_task(make_task("new"));
        let ids: Vec<String> = state.tasks().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec!["new", "old"]);
    }

    #[test]
    fn toggle_flips_and_reports_missing() {
        let state = AppState::new(vec![make_task("a")], Settings::default());
        assert!(state.toggle_task("a").unwrap().completed);
        assert!(!state.toggle_task("a").unwrap().completed);
        assert!(state.toggle_task("missing").is_none());
    }

    #[test]
    fn remove_returns_the_removed_task() {
        let state = AppState::new(vec![make_task("a"), make_task("b")], Settings::default());
        assert_eq!(state.remove_task("a").unwrap().id, "a");
        assert!(state.remove_task("a").is_none());
        assert_eq!(state.tasks().len(), 1);
        assert!(state.find_task("b").is_some());
    }

    #[test]
    fn set_snoozed_until_updates_only_the_named_task() {
        let state = AppState::new(vec![make_task("a"), make_task("b")], Settings::default());
        assert_eq!(state.set_snoozed_until("b", Some(42)).unwrap().snoozed_until, Some(42));
        assert_eq!(state.find_task("a").unwrap().snoozed_until, None);
        assert!(state.set_snoozed_until("missing", Some(1)).is_none());
    }

    #[test]
    fn replace_and_update_settings() {
        let state = AppState::new(vec![make_task("a")], Settings::default());
        state.replace_tasks(vec![make_task("x"), make_task("y")]);
        assert_eq!(state.tasks().len(), 2);

        let mut next = Settings::default();
        next.language = "en".to_string();
        state.update_settings(next);
        assert_eq!(state.settings().language, "en");
    }
}
