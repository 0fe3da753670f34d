//! Event loop
//!
//! SDK callbacks and UI calls are funnelled into one ordered channel. Each
//! event runs to completion through [`AppContext::handle`] before the next
//! one is read, then its effects are executed in order.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::config::PreferencesStore;
use crate::error::CoreError;
use crate::sdk::SdkClient;
use crate::session::SessionState;

use super::context::AppContext;
use super::effects::{Effect, Message, MessageLevel, UiEffect};
use super::events::AppEvent;
use super::snapshot::SnapshotHandle;

/// Buffered events before senders wait
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Presentation layer. Calls are fire-and-forget.
pub trait Presenter: Send {
    fn present(&mut self, effect: UiEffect);
}

/// Host integration hooks
pub trait Platform: Send {
    /// Refresh the shell state of a local item
    fn notify_item_changed(&mut self, path: &Path);

    fn start_transfer_bridge(&mut self, port: u16) -> Result<(), CoreError>;

    fn stop_transfer_bridge(&mut self);

    fn start_shell_integration(&mut self);

    fn stop_shell_integration(&mut self);
}

/// Why the loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Exit,
    /// The host should relaunch the process
    Restart,
    /// This build refuses to run
    Expired,
}

pub struct AppRuntime<S: SdkClient> {
    context: AppContext,
    sdk: S,
    presenter: Box<dyn Presenter>,
    platform: Box<dyn Platform>,
    store: Arc<dyn PreferencesStore>,
    snapshot: SnapshotHandle,
    events: mpsc::Receiver<AppEvent>,
    /// Used by timers; does not keep the channel open
    timer_tx: mpsc::WeakSender<AppEvent>,
}

impl<S: SdkClient> AppRuntime<S> {
    /// Create the runtime and the sender that feeds it
    pub fn new(
        context: AppContext,
        sdk: S,
        presenter: Box<dyn Presenter>,
        platform: Box<dyn Platform>,
        store: Arc<dyn PreferencesStore>,
    ) -> (Self, mpsc::Sender<AppEvent>) {
        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let runtime = Self {
            context,
            sdk,
            presenter,
            platform,
            store,
            snapshot: SnapshotHandle::new(),
            events: rx,
            timer_tx: tx.downgrade(),
        };
        (runtime, tx)
    }

    /// Read-only view for the presentation layer
    pub fn snapshot_handle(&self) -> SnapshotHandle {
        self.snapshot.clone()
    }

    pub async fn run(mut self) -> Result<RunOutcome, CoreError> {
        let effects = self.context.start(Utc::now());
        self.publish();
        if let Some(outcome) = self.execute(effects).await {
            return Ok(outcome);
        }
        if self.context.session_state() == SessionState::Expired {
            info!("Build expired, not starting");
            return Ok(RunOutcome::Expired);
        }

        while let Some(event) = self.events.recv().await {
            let effects = self.context.handle(event, &self.sdk);
            // 先发布快照，再执行副作用
            self.publish();
            if let Some(outcome) = self.execute(effects).await {
                info!("Event loop finished: {:?}", outcome);
                return Ok(outcome);
            }
        }

        warn!("All event senders dropped");
        Err(CoreError::ChannelClosed)
    }

    fn publish(&self) {
        self.snapshot.publish(self.context.snapshot());
    }

    /// Run effects in order. Returns early on `Restart` / `Exit`.
    async fn execute(&mut self, effects: Vec<Effect>) -> Option<RunOutcome> {
        for effect in effects {
            match effect {
                Effect::Sdk(command) => {
                    debug!("SDK <- {:?}", command);
                    self.sdk.submit(command);
                }
                Effect::Ui(ui) => self.presenter.present(ui),
                Effect::SavePreferences => {
                    if let Err(e) = self.store.save(self.context.preferences()).await {
                        error!("Failed to save preferences: {}", e);
                    }
                }
                Effect::NotifyItemChanged(path) => self.platform.notify_item_changed(&path),
                Effect::StartTransferBridge(port) => {
                    if let Err(e) = self.platform.start_transfer_bridge(port) {
                        error!("{}", e);
                        self.presenter.present(UiEffect::Message(Message::new(
                            MessageLevel::Error,
                            e.to_string(),
                        )));
                    }
                }
                Effect::StopTransferBridge => self.platform.stop_transfer_bridge(),
                Effect::StartShellIntegration => self.platform.start_shell_integration(),
                Effect::StopShellIntegration => self.platform.stop_shell_integration(),
                Effect::ScheduleReboot(delay) => self.schedule_reboot(delay),
                Effect::Restart => return Some(RunOutcome::Restart),
                Effect::Exit => return Some(RunOutcome::Exit),
            }
        }
        None
    }

    fn schedule_reboot(&self, delay: Duration) {
        info!("Restart scheduled in {:?}", delay);
        let tx = self.timer_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = tx.upgrade() {
                if tx.send(AppEvent::RebootTimerElapsed).await.is_err() {
                    debug!("Event loop gone before the restart timer fired");
                }
            }
        });
    }
}
