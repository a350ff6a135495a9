use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

use tokio::sync::Mutex;

#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.0.store(false, Ordering::SeqCst);
    }

    pub fn is_set(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

// One flag per guild, so stopping one guild's scan never touches another's.
#[derive(Debug, Default)]
pub struct ScanControl {
    flags: Mutex<HashMap<u64, CancelFlag>>,
}

impl ScanControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn flag(&self, guild_id: u64) -> CancelFlag {
        let mut flags = self.flags.lock().await;
        flags.entry(guild_id).or_default().clone()
    }

    pub async fn request_stop(&self, guild_id: u64) {
        self.flag(guild_id).await.set();
    }
}
