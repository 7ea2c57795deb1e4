use crate::actor::{spawn_actor_reserved, Actor, Addr, Reserved};
use crate::registry::Registry;
use crate::system::{ActorSystem, ShutdownHandle};
use anyhow::Result;

/// Two-phase wiring: reserve every mailbox first, then start actors with
/// their dependencies' addresses already in hand.
pub struct Builder {
    sys: ActorSystem,
    reg: Registry,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    pub fn new() -> Self {
        Self {
            sys: ActorSystem::new(),
            reg: Registry::default(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.reg
    }

    pub fn shutdown_handle(&self) -> ShutdownHandle {
        self.sys.shutdown_handle()
    }

    /// Reserve an actor and publish its `Addr` under `name`.
    pub fn reserve<A: Actor>(&mut self, name: &str, mailbox: usize) -> Reserved<A> {
        let r = spawn_actor_reserved::<A>(name, mailbox);
        self.reg.insert_addr::<A>(name, r.addr());
        r
    }

    /// Start a previously reserved actor and track its task.
    pub fn start_reserved<A: Actor>(&mut self, r: Reserved<A>, actor: A) -> &mut Self {
        tracing::debug!(target: "senti-actors", actor = r.name(), "starting actor");
        let h = r.start_with_shutdown(actor, Some(self.sys.shutdown_notifier()));
        self.sys.track(async move { h.task.await? });
        self
    }

    /// Reserve and start in one step.
    pub fn spawn<A: Actor>(&mut self, name: &str, mailbox: usize, actor: A) -> Addr<A> {
        let r = self.reserve::<A>(name, mailbox);
        let addr = r.addr();
        self.start_reserved(r, actor);
        addr
    }

    /// Typed address published under `name`.
    pub fn addr<A: Actor>(&self, name: &str) -> Option<Addr<A>> {
        self.reg.get_addr::<A>(name)
    }

    /// Track an auxiliary task (e.g. an input feeder) so shutdown waits for it.
    pub fn track(&mut self, fut: impl std::future::Future<Output = Result<()>> + Send + 'static) {
        self.sys.track(fut);
    }

    pub async fn graceful_shutdown(self) -> Result<()> {
        self.reg.clear();
        self.sys.graceful_shutdown().await
    }

    /// Wait for CTRL-C or an explicit shutdown signal, then stop everything.
    pub async fn run_until_ctrl_c(self) -> Result<()> {
        let mut shutdown_rx = self.sys.shutdown_notifier();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                tracing::info!(target: "senti-actors", "ctrl-c received");
            }
            _ = shutdown_rx.recv() => {}
        }
        // Drop published addresses so actor mailboxes can close.
        self.graceful_shutdown().await
    }
}
