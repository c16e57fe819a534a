use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::scheduler::ScheduledReminder;

type ShowFn = dyn Fn(&ScheduledReminder) + Send + Sync;

struct Armed {
    generation: u64,
    handle: JoinHandle<()>,
}

/// One-shot timers keyed by notification id, for platforms whose notification
/// API can only show immediately (desktop). Lives only as long as the process.
#[derive(Clone)]
pub struct TimerPlatform {
    runtime: Handle,
    pending: Arc<Mutex<HashMap<i32, Armed>>>,
    generation: Arc<AtomicU64>,
    show: Arc<ShowFn>,
}

impl TimerPlatform {
    pub fn new(
        runtime: Handle,
        show: impl Fn(&ScheduledReminder) + Send + Sync + 'static,
    ) -> Self {
        Self {
            runtime,
            pending: Arc::new(Mutex::new(HashMap::new())),
            generation: Arc::new(AtomicU64::new(0)),
            show: Arc::new(show),
        }
    }

    /// Replaces whatever was armed under the same id. Past instants fire right away.
    pub fn arm(&self, reminder: &ScheduledReminder) {
        let delay = (reminder.at - Utc::now())
            .to_std()
            .unwrap_or(Duration::ZERO);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let id = reminder.id;
        let reminder = reminder.clone();
        let show = Arc::clone(&self.show);
        let pending = Arc::clone(&self.pending);

        let mut guard = self.pending.lock().expect("timer table poisoned");
        if let Some(previous) = guard.remove(&id) {
            previous.handle.abort();
        }
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut guard = pending.lock().expect("timer table poisoned");
                // A newer arm for this id owns the slot now.
                if guard.get(&id).map(|armed| armed.generation) != Some(generation) {
                    return;
                }
                guard.remove(&id);
            }
            log::debug!("timer fired notification_id={id}");
            show(&reminder);
        });
        guard.insert(id, Armed { generation, handle });
    }

    /// Returns whether anything was pending under `id`.
    pub fn disarm(&self, id: i32) -> bool {
        let mut guard = self.pending.lock().expect("timer table poisoned");
        match guard.remove(&id) {
            Some(armed) => {
                armed.handle.abort();
                true
            }
            None => false,
        }
    }

    pub fn pending_ids(&self) -> Vec<i32> {
        let guard = self.pending.lock().expect("timer table poisoned");
        let mut ids: Vec<i32> = guard.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
