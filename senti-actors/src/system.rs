//! Task tracking and shutdown signaling shared by every actor.
//!
//! Actors subscribe to the broadcast channel for cooperative shutdown; the
//! `JoinSet` lets teardown wait for each tracked task to finish.
use anyhow::Result;
use tokio::{sync::broadcast, task::JoinSet};

#[derive(Clone)]
pub struct ShutdownHandle {
    tx: broadcast::Sender<()>,
}

impl ShutdownHandle {
    pub fn signal(&self) {
        let _ = self.tx.send(());
    }

    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }
}

pub struct ActorSystem {
    joinset: JoinSet<Result<()>>,
    shutdown_tx: broadcast::Sender<()>,
}

impl Default for ActorSystem {
    fn default() -> Self {
        Self::new()
    }
}

impl ActorSystem {
    pub fn new() -> Self {
        let (shutdown_tx, _) = broadcast::channel(8);
        Self {
            joinset: JoinSet::new(),
            shutdown_tx,
        }
    }

    pub fn shutdown_notifier(&self) -> broadcast::Receiver<()> {
        self.shutdown_tx.subscribe()
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.shutdown_tx.clone(),
        }
    }

    pub fn track(&mut self, fut: impl std::future::Future<Output = Result<()>> + Send + 'static) {
        self.joinset.spawn(fut);
    }

    /// Signal shutdown and wait for every tracked task. The first task error
    /// is returned after all tasks have finished.
    pub async fn graceful_shutdown(mut self) -> Result<()> {
        let _ = self.shutdown_tx.send(());
        let mut first_err = None;
        while let Some(res) = self.joinset.join_next().await {
            let outcome = res.map_err(anyhow::Error::from).and_then(|r| r);
            if let Err(e) = outcome {
                tracing::warn!(target: "senti-actors", error = ?e, "task failed during shutdown");
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}
