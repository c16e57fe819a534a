use std::path::PathBuf;

use chrono::{DateTime, TimeZone};
use uuid::Uuid;

use crate::ai::{suggest_reminder_time, TextGenerator};
use crate::events::StatePayload;
#[cfg(all(feature = "app", not(test)))]
use crate::events::EVENT_STATE_UPDATED;
use crate::fire_time::ReminderTime;
use crate::locale::{reminder_title, SUPPORTED_LANGUAGES};
use crate::models::{Settings, Task};
use crate::scheduler::{
    cancel_task_reminder, postpone_task_reminder, schedule_all, schedule_task_reminder,
    NotificationPlatform, ReminderOptions, ScheduleOutcome,
};
use crate::state::AppState;
use crate::storage::{Storage, StorageError};

#[cfg(all(feature = "app", not(test)))]
use crate::platform::TauriNotifications;
#[cfg(all(feature = "app", not(test)))]
use tauri::{AppHandle, Emitter, Manager, State};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

#[derive(Debug, Clone, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub struct NewTask {
    pub text: String,
    #[serde(default)]
    pub reminder_time: Option<String>,
}

/// A task after a mutation, with what happened to its platform notification.
#[derive(Debug, Clone, serde::Serialize)]
pub struct TaskChange {
    pub task: Task,
    pub reminder: ScheduleOutcome,
}

trait CommandCtx {
    type Platform: NotificationPlatform;

    fn app_data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
    fn notifications(&self) -> &Self::Platform;
}

fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn persist(ctx: &impl CommandCtx, state: &AppState) -> Result<(), StorageError> {
    let storage = Storage::new(ctx.app_data_dir()?);
    storage.ensure_dirs()?;
    storage.save_tasks(&state.tasks_file())?;
    storage.save_settings(&state.settings_file())?;
    ctx.emit_state_updated(StatePayload {
        tasks: state.tasks(),
        settings: state.settings(),
    });
    Ok(())
}

fn reminder_options(settings: &Settings) -> ReminderOptions {
    ReminderOptions {
        title: reminder_title(settings),
        strategy: settings.id_strategy,
    }
}

fn normalize_settings(mut settings: Settings) -> Settings {
    let defaults = Settings::default();
    let language = settings.language.trim().to_lowercase();
    settings.language = if SUPPORTED_LANGUAGES.contains(&language.as_str()) {
        language
    } else {
        defaults.language
    };
    settings.notification_title = settings
        .notification_title
        .map(|title| title.trim().to_string())
        .filter(|title| !title.is_empty());
    settings.ai_api_key = settings.ai_api_key.trim().to_string();
    settings.ai_model = match settings.ai_model.trim() {
        "" => defaults.ai_model,
        model => model.to_string(),
    };
    settings
}

fn load_state_impl(ctx: &impl CommandCtx, state: &AppState) -> CommandResult<StatePayload> {
    let root = match ctx.app_data_dir() {
        Ok(path) => path,
        Err(e) => return err(&format!("app_data_dir error: {e}")),
    };
    let storage = Storage::new(root);
    if let Err(error) = storage.ensure_dirs() {
        return err(&format!("storage error: {error:?}"));
    }
    let tasks = storage.load_tasks_or_empty();
    let settings = match storage.load_settings() {
        Ok(data) => data.settings,
        Err(error) => {
            if !error.is_not_found() {
                log::warn!("settings unreadable, using defaults: {error}");
            }
            Settings::default()
        }
    };
    state.replace_tasks(tasks.clone());
    state.update_settings(settings.clone());
    ok(StatePayload { tasks, settings })
}

fn create_task_impl<Tz: TimeZone>(
    ctx: &impl CommandCtx,
    state: &AppState,
    input: NewTask,
    now: &DateTime<Tz>,
) -> CommandResult<TaskChange> {
    let text = input.text.trim();
    if text.is_empty() {
        return err("empty task text");
    }

    let mut invalid_reminder = false;
    let reminder_time = match input.reminder_time.as_deref().map(str::trim) {
        None | Some("") => None,
        Some(raw) => match ReminderTime::parse(raw) {
            Ok(time) => Some(time.to_string()),
            Err(error) => {
                log::warn!("dropping reminder from new task: {error}");
                invalid_reminder = true;
                None
            }
        },
    };

    let task = Task {
        id: Uuid::new_v4().to_string(),
        text: text.to_string(),
        completed: false,
        created_at: now.timestamp_millis(),
        reminder_time,
        snoozed_until: None,
    };

    let reminder = if invalid_reminder {
        ScheduleOutcome::InvalidTime
    } else {
        let options = reminder_options(&state.settings());
        schedule_task_reminder(ctx.notifications(), &task, &options, now)
    };

    state.add_task(task.clone());
    if let Err(error) = persist(ctx, state) {
        state.remove_task(&task.id);
        if reminder.is_scheduled() {
            cancel_task_reminder(ctx.notifications(), &task.id, state.settings().id_strategy);
        }
        return err(&format!("storage error: {error:?}"));
    }
    log::info!("task created id={} reminder={:?}", task.id, reminder);
    ok(TaskChange { task, reminder })
}

fn toggle_task_impl(ctx: &impl CommandCtx, state: &AppState, task_id: String) -> CommandResult<Task> {
    let task = match state.toggle_task(&task_id) {
        Some(task) => task,
        None => return err("task not found"),
    };
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ok(task)
}

fn delete_task_impl(ctx: &impl CommandCtx, state: &AppState, task_id: String) -> CommandResult<bool> {
    if state.find_task(&task_id).is_none() {
        return err("task not found");
    }
    cancel_task_reminder(ctx.notifications(), &task_id, state.settings().id_strategy);
    state.remove_task(&task_id);
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ok(true)
}

fn postpone_task_impl<Tz: TimeZone>(
    ctx: &impl CommandCtx,
    state: &AppState,
    task_id: String,
    now: &DateTime<Tz>,
) -> CommandResult<TaskChange> {
    let task = match state.find_task(&task_id) {
        Some(task) => task,
        None => return err("task not found"),
    };
    let options = reminder_options(&state.settings());
    let reminder = postpone_task_reminder(ctx.notifications(), &task, &options, now);
    let until = match &reminder {
        ScheduleOutcome::Scheduled { fire_at, .. } => fire_at.timestamp_millis(),
        _ => return ok(TaskChange { task, reminder }),
    };

    // Recorded so a later re-arm does not bring the reminder back to today.
    let task = match state.set_snoozed_until(&task_id, Some(until)) {
        Some(task) => task,
        None => return err("task not found"),
    };
    if let Err(error) = persist(ctx, state) {
        return err(&format!("storage error: {error:?}"));
    }
    ok(TaskChange { task, reminder })
}

fn update_settings_impl<Tz: TimeZone>(
    ctx: &impl CommandCtx,
    state: &AppState,
    settings: Settings,
    now: &DateTime<Tz>,
) -> CommandResult<Settings> {
    let previous = state.settings();
    let settings = normalize_settings(settings);

    state.update_settings(settings.clone());
    if let Err(error) = persist(ctx, state) {
        // Roll back in-memory settings to keep the running app consistent.
        state.update_settings(previous);
        return err(&format!("storage error: {error:?}"));
    }

    // Pending notifications are keyed by the old ids; move them over.
    if previous.id_strategy != settings.id_strategy {
        let tasks = state.tasks();
        // Completed tasks keep their notification too, so they move ids as well.
        for task in tasks.iter().filter(|t| t.reminder_time.is_some()) {
            cancel_task_reminder(ctx.notifications(), &task.id, previous.id_strategy);
        }
        let moved = schedule_all(ctx.notifications(), &tasks, &reminder_options(&settings), now);
        log::info!(
            "id strategy changed from={:?} to={:?} rescheduled={moved}",
            previous.id_strategy,
            settings.id_strategy
        );
    }

    ok(settings)
}

async fn suggest_reminder_impl(
    generator: &impl TextGenerator,
    state: &AppState,
    text: &str,
) -> CommandResult<String> {
    let settings = state.settings();
    match suggest_reminder_time(generator, &settings, text).await {
        Ok(time) => ok(time.to_string()),
        Err(error) => err(&error),
    }
}

#[cfg(all(feature = "app", not(test)))]
struct TauriCommandCtx<'a> {
    app: &'a AppHandle,
    notifications: &'a TauriNotifications,
}

#[cfg(all(feature = "app", not(test)))]
impl CommandCtx for TauriCommandCtx<'_> {
    type Platform = TauriNotifications;

    fn app_data_dir(&self) -> Result<PathBuf, StorageError> {
        self.app
            .path()
            .app_data_dir()
            .map_err(|err| StorageError::Io(std::io::Error::other(err.to_string())))
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        let _ = self.app.emit(EVENT_STATE_UPDATED, payload);
    }

    fn notifications(&self) -> &TauriNotifications {
        self.notifications
    }
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn load_state(
    app: AppHandle,
    state: State<AppState>,
    notifications: State<TauriNotifications>,
) -> CommandResult<StatePayload> {
    let ctx = TauriCommandCtx {
        app: &app,
        notifications: notifications.inner(),
    };
    load_state_impl(&ctx, state.inner())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn create_task(
    app: AppHandle,
    state: State<AppState>,
    notifications: State<TauriNotifications>,
    task: NewTask,
) -> CommandResult<TaskChange> {
    let ctx = TauriCommandCtx {
        app: &app,
        notifications: notifications.inner(),
    };
    create_task_impl(&ctx, state.inner(), task, &chrono::Local::now())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn toggle_task(
    app: AppHandle,
    state: State<AppState>,
    notifications: State<TauriNotifications>,
    task_id: String,
) -> CommandResult<Task> {
    let ctx = TauriCommandCtx {
        app: &app,
        notifications: notifications.inner(),
    };
    toggle_task_impl(&ctx, state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn delete_task(
    app: AppHandle,
    state: State<AppState>,
    notifications: State<TauriNotifications>,
    task_id: String,
) -> CommandResult<bool> {
    let ctx = TauriCommandCtx {
        app: &app,
        notifications: notifications.inner(),
    };
    delete_task_impl(&ctx, state.inner(), task_id)
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn postpone_task(
    app: AppHandle,
    state: State<AppState>,
    notifications: State<TauriNotifications>,
    task_id: String,
) -> CommandResult<TaskChange> {
    let ctx = TauriCommandCtx {
        app: &app,
        notifications: notifications.inner(),
    };
    postpone_task_impl(&ctx, state.inner(), task_id, &chrono::Local::now())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub fn update_settings(
    app: AppHandle,
    state: State<AppState>,
    notifications: State<TauriNotifications>,
    settings: Settings,
) -> CommandResult<Settings> {
    let ctx = TauriCommandCtx {
        app: &app,
        notifications: notifications.inner(),
    };
    update_settings_impl(&ctx, state.inner(), settings, &chrono::Local::now())
}

#[cfg(all(feature = "app", not(test)))]
#[tauri::command]
pub async fn suggest_reminder(app: AppHandle, text: String) -> CommandResult<String> {
    let state = app.state::<AppState>().inner().clone();
    let client = match crate::ai::GeminiClient::from_settings(&state.settings()) {
        Ok(client) => client,
        Err(error) => return err(&error),
    };
    suggest_reminder_impl(&client, &state, &text).await
}
