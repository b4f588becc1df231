use std::{collections::HashMap, sync::Arc};

use tokio::sync::Mutex;

use crate::{
    session::SessionToken,
    upload::machine::{UploadLimits, UploadMachine},
};

/// Upload state machines, one per session token.
#[derive(Clone)]
pub struct UploadBoard {
    machines: Arc<Mutex<HashMap<SessionToken, UploadMachine>>>,
    limits: UploadLimits,
}

impl UploadBoard {
    pub fn new(limits: UploadLimits) -> Self {
        Self {
            machines: Arc::new(Mutex::new(HashMap::new())),
            limits,
        }
    }

    pub fn limits(&self) -> &UploadLimits {
        &self.limits
    }

    /// Runs `f` against the session's machine, creating an idle one first if needed.
    /// The lock is held only for the duration of `f`, never across I/O.
    pub async fn with<R>(&self, token: &str, f: impl FnOnce(&mut UploadMachine) -> R) -> R {
        let mut machines = self.machines.lock().await;
        let machine = machines
            .entry(token.to_string())
            .or_insert_with(|| UploadMachine::new(self.limits));
        f(machine)
    }

    pub async fn discard(&self, token: &str) {
        self.machines.lock().await.remove(token);
    }

    pub async fn len(&self) -> usize {
        self.machines.lock().await.len()
    }
}
