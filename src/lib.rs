mod ai;
mod commands;
mod events;
pub mod fire_time;
pub mod locale;
mod logging;
pub mod models;
pub mod notify_id;
#[cfg(all(feature = "app", not(test)))]
mod platform;
pub mod scheduler;
mod state;
pub mod storage;
pub mod timer;

#[cfg(all(feature = "app", not(test)))]
use tauri::Manager;

#[cfg(all(feature = "app", not(test)))]
use crate::commands::*;
#[cfg(all(feature = "app", not(test)))]
use crate::logging::init_logging;
#[cfg(all(feature = "app", not(test)))]
use crate::platform::TauriNotifications;
#[cfg(all(feature = "app", not(test)))]
use crate::scheduler::ensure_permission;
#[cfg(all(feature = "app", not(test)))]
use crate::state::AppState;
#[cfg(all(feature = "app", not(test)))]
use crate::storage::Storage;

#[cfg_attr(mobile, tauri::mobile_entry_point)]
#[cfg(all(feature = "app", not(test)))]
pub fn run() {
    tauri::Builder::default()
        .plugin(tauri_plugin_notification::init())
        .setup(|app| {
            let data_dir = app.path().app_data_dir()?;
            if let Err(err) = init_logging(&data_dir) {
                eprintln!("logger init failed: {err}");
            }

            let storage = Storage::new(data_dir);
            storage.ensure_dirs()?;
            let tasks = storage.load_tasks_or_empty();
            let settings = storage
                .load_settings()
                .map(|data| data.settings)
                .unwrap_or_default();
            log::info!("state loaded tasks={}", tasks.len());

            let state = AppState::new(tasks, settings);
            app.manage(state.clone());

            let notifications = TauriNotifications::new(app.handle().clone());
            if !ensure_permission(&notifications) {
                log::info!("notifications not permitted, reminders stay in the list only");
            }
            // Desktop timers die with the process.
            #[cfg(desktop)]
            {
                let settings = state.settings();
                let options = crate::scheduler::ReminderOptions {
                    title: crate::locale::reminder_title(&settings),
                    strategy: settings.id_strategy,
                };
                let armed = crate::scheduler::schedule_all(
                    &notifications,
                    &state.tasks(),
                    &options,
                    &chrono::Local::now(),
                );
                log::info!("re-armed reminders count={armed}");
            }
            app.manage(notifications);

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            load_state,
            create_task,
            toggle_task,
            delete_task,
            postpone_task,
            update_settings,
            suggest_reminder,
        ])
        .run(tauri::generate_context!())
        .expect("error while running tauri application");
}
