use tauri::AppHandle;
use tauri_plugin_notification::{NotificationExt, PermissionState as PluginPermission};

use crate::scheduler::{NotificationPlatform, PermissionState, ScheduledReminder};
#[cfg(desktop)]
use crate::timer::TimerPlatform;

/// Notification plugin bridge. Mobile hands scheduling to the OS; desktop can
/// only show right away, so it keeps in-process timers instead.
pub struct TauriNotifications {
    app: AppHandle,
    #[cfg(desktop)]
    timers: TimerPlatform,
}

impl TauriNotifications {
    pub fn new(app: AppHandle) -> Self {
        #[cfg(desktop)]
        let timers = {
            let show_app = app.clone();
            TimerPlatform::new(
                tauri::async_runtime::handle().inner().clone(),
                move |reminder| show_now(&show_app, reminder),
            )
        };
        Self {
            app,
            #[cfg(desktop)]
            timers,
        }
    }
}

fn map_permission(state: PluginPermission) -> PermissionState {
    match state {
        PluginPermission::Granted => PermissionState::Granted,
        PluginPermission::Denied => PermissionState::Denied,
        _ => PermissionState::Prompt,
    }
}

#[cfg(desktop)]
fn show_now(app: &AppHandle, reminder: &ScheduledReminder) {
    let shown = app
        .notification()
        .builder()
        .id(reminder.id)
        .title(&reminder.title)
        .body(&reminder.body)
        .show();
    match shown {
        Ok(()) => log::info!("reminder shown notification_id={}", reminder.id),
        Err(err) => log::warn!("show notification failed notification_id={}: {err}", reminder.id),
    }
}

impl NotificationPlatform for TauriNotifications {
    fn permission_state(&self) -> Result<PermissionState, String> {
        self.app
            .notification()
            .permission_state()
            .map(map_permission)
            .map_err(|e| e.to_string())
    }

    fn request_permission(&self) -> Result<PermissionState, String> {
        self.app
            .notification()
            .request_permission()
            .map(map_permission)
            .map_err(|e| e.to_string())
    }

    #[cfg(mobile)]
    fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), String> {
        use tauri_plugin_notification::Schedule;

        let date = time::OffsetDateTime::from_unix_timestamp(reminder.at.timestamp())
            .map_err(|e| e.to_string())?;
        self.app
            .notification()
            .builder()
            .id(reminder.id)
            .title(&reminder.title)
            .body(&reminder.body)
            .schedule(Schedule::At {
                date,
                repeating: false,
                allow_while_idle: true,
            })
            .show()
            .map_err(|e| e.to_string())
    }

    #[cfg(desktop)]
    fn schedule(&self, reminder: &ScheduledReminder) -> Result<(), String> {
        self.timers.arm(reminder);
        Ok(())
    }

    #[cfg(mobile)]
    fn cancel(&self, id: i32) -> Result<(), String> {
        self.app
            .notification()
            .cancel(vec![id])
            .map_err(|e| e.to_string())
    }

    #[cfg(desktop)]
    fn cancel(&self, id: i32) -> Result<(), String> {
        self.timers.disarm(id);
        Ok(())
    }
}
