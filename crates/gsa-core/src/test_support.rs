//! Shared in-memory collaborators for unit tests.

use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{GsaError, Result};
use crate::selection::SelectionStore;

/// In-memory selection store that records every save.
#[derive(Default)]
pub(crate) struct MemoryStore {
    pub(crate) initial: Vec<String>,
    pub(crate) saves: Mutex<Vec<Vec<String>>>,
    pub(crate) fail: AtomicBool,
}

impl MemoryStore {
    pub(crate) fn last_save(&self) -> Option<Vec<String>> {
        self.saves.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SelectionStore for MemoryStore {
    async fn get_selected_repos(&self) -> Result<Vec<String>> {
        Ok(self.initial.clone())
    }

    async fn set_selected_repos(&self, full_names: Vec<String>) -> Result<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(GsaError::io("disk full"));
        }
        self.saves.lock().unwrap().push(full_names);
        Ok(())
    }
}
