use std::{collections::VecDeque, sync::mpsc};

use crate::config::ConfigChanged;

/// Something that may require the tiles to be recomputed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Activate,
    Deactivate,
    ConfigChanged(ConfigChanged),
    ScriptPostFired { script_id: i32 },
}

/// Handle for posting triggers from any thread. The work runs later on the
/// thread that owns the [`TriggerQueue`].
#[derive(Clone)]
pub struct TriggerSender(mpsc::Sender<Trigger>);

impl TriggerSender {
    /// Returns false if the receiving side is gone.
    pub fn post(&self, trigger: Trigger) -> bool {
        match self.0.send(trigger) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Dropping {:?}, nothing is listening", e.0);
                false
            }
        }
    }
}

pub struct TriggerQueue {
    tx: mpsc::Sender<Trigger>,
    rx: mpsc::Receiver<Trigger>,
}

impl TriggerQueue {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::channel();
        Self { tx, rx }
    }

    pub fn sender(&self) -> TriggerSender {
        TriggerSender(self.tx.clone())
    }

    /// Moves every pending trigger into `dest_buf`, in submission order.
    pub fn retrieve_pending(&self, dest_buf: &mut VecDeque<Trigger>) {
        dest_buf.extend(self.rx.try_iter());
    }
}

impl Default for TriggerQueue {
    fn default() -> Self {
        Self::new()
    }
}
