use chrono::{DateTime, TimeZone, Utc};

use crate::fire_time::{next_fire_at, postpone_fire_at, ReminderTime};
use crate::models::{IdStrategy, Task};
use crate::notify_id::derive_notification_id;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    Granted,
    Denied,
    /// Not decided yet; asking is allowed.
    Prompt,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduledReminder {
    pub id: i32,
    pub title: String,
    pub body: String,
    pub at: DateTime<Utc>,
}

/// Local notification facility of the host platform. Every call is best-effort.
pub trait NotificationPlatform {
    fn permission_state(&self) -> Result<PermissionState, String>;
    fn request_permission(&self) -> Result<PermissionState, String>;
    /// Replaces any pending notification with the same id.
    fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), String>;
    /// Unknown ids are not an error.
    fn cancel(&self, id: i32) -> Result<(), String>;
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScheduleOutcome {
    Scheduled {
        notification_id: i32,
        fire_at: DateTime<Utc>,
    },
    NoReminder,
    InvalidTime,
    PermissionDenied,
    PlatformFailed,
}

impl ScheduleOutcome {
    pub fn is_scheduled(&self) -> bool {
        matches!(self, ScheduleOutcome::Scheduled { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ReminderOptions {
    pub title: String,
    pub strategy: IdStrategy,
}

pub fn ensure_permission(platform: &impl NotificationPlatform) -> bool {
    let state = match platform.permission_state() {
        Ok(state) => state,
        Err(err) => {
            log::warn!("notification permission check failed: {err}");
            return false;
        }
    };
    match state {
        PermissionState::Granted => true,
        PermissionState::Denied => false,
        PermissionState::Prompt => match platform.request_permission() {
            Ok(PermissionState::Granted) => true,
            Ok(other) => {
                log::info!("notification permission not granted state={other:?}");
                false
            }
            Err(err) => {
                log::warn!("notification permission request failed: {err}");
                false
            }
        },
    }
}

/// Next occurrence of the task's clock time, unless a postpone still holds it back.
pub fn schedule_task_reminder<Tz: TimeZone>(
    platform: &impl NotificationPlatform,
    task: &Task,
    options: &ReminderOptions,
    now: &DateTime<Tz>,
) -> ScheduleOutcome {
    place_reminder(platform, task, options, |time| {
        pending_snooze(task, now).unwrap_or_else(|| next_fire_at(time, now))
    })
}

/// Pushes the reminder to the same clock time tomorrow, even if today's one is still ahead.
pub fn postpone_task_reminder<Tz: TimeZone>(
    platform: &impl NotificationPlatform,
    task: &Task,
    options: &ReminderOptions,
    now: &DateTime<Tz>,
) -> ScheduleOutcome {
    place_reminder(platform, task, options, |time| postpone_fire_at(time, now))
}

pub fn cancel_task_reminder(platform: &impl NotificationPlatform, task_id: &str, strategy: IdStrategy) {
    let id = derive_notification_id(task_id, strategy);
    if let Err(err) = platform.cancel(id) {
        log::warn!("cancel notification failed task_id={task_id} notification_id={id}: {err}");
    }
}

/// Re-arms every open task that carries a reminder. Returns how many made it to the platform.
pub fn schedule_all<Tz: TimeZone>(
    platform: &impl NotificationPlatform,
    tasks: &[Task],
    options: &ReminderOptions,
    now: &DateTime<Tz>,
) -> usize {
    tasks
        .iter()
        .filter(|task| !task.completed && task.reminder_time.is_some())
        .filter(|task| schedule_task_reminder(platform, task, options, now).is_scheduled())
        .count()
}

fn pending_snooze<Tz: TimeZone>(task: &Task, now: &DateTime<Tz>) -> Option<DateTime<Tz>> {
    let until = task.snoozed_until?;
    if until <= now.timestamp_millis() {
        return None;
    }
    now.timezone().timestamp_millis_opt(until).single()
}

fn place_reminder<Tz: TimeZone>(
    platform: &impl NotificationPlatform,
    task: &Task,
    options: &ReminderOptions,
    fire_at: impl FnOnce(ReminderTime) -> DateTime<Tz>,
) -> ScheduleOutcome {
    let Some(raw) = task.reminder_time.as_deref() else {
        return ScheduleOutcome::NoReminder;
    };
    let time = match ReminderTime::parse(raw) {
        Ok(time) => time,
        Err(err) => {
            log::warn!("skip scheduling task_id={}: {err}", task.id);
            return ScheduleOutcome::InvalidTime;
        }
    };

    if !ensure_permission(platform) {
        log::info!("skip scheduling task_id={}: permission denied", task.id);
        return ScheduleOutcome::PermissionDenied;
    }

    let fire_at = fire_at(time).with_timezone(&Utc);
    cancel_task_reminder(platform, &task.id, options.strategy);

    let reminder = ScheduledReminder {
        id: derive_notification_id(&task.id, options.strategy),
        title: options.title.clone(),
        body: task.text.clone(),
        at: fire_at,
    };
    match platform.schedule(&reminder) {
        Ok(()) => {
            log::info!(
                "scheduled reminder task_id={} notification_id={} at={}",
                task.id,
                reminder.id,
                reminder.at.to_rfc3339()
            );
            ScheduleOutcome::Scheduled {
                notification_id: reminder.id,
                fire_at,
            }
        }
        Err(err) => {
            log::warn!(
                "schedule notification failed task_id={} notification_id={}: {err}",
                task.id,
                reminder.id
            );
            ScheduleOutcome::PlatformFailed
        }
    }
}
