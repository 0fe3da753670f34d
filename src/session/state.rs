//! Session State Machine
//!
//! ```text
//! LoggedOut ──credential──▶ AwaitingLogin ──ok──▶ AwaitingFetchNodes ──ok──▶ Ready
//!     ▲                         │ fail                   │ fail                │ logout
//!     └─────────────────────────┴───────── LoggingOut ◀──┴─────────────────────┘
//! ```
//!
//! `Expired` is terminal and only entered from [`SessionStateMachine::start`].
//! Every handler returns the effects it needs; nothing here talks to the SDK
//! or the UI directly.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::app::{Effect, MessageLevel, UiEffect};
use crate::config::{CoreSettings, Credential, Preferences};
use crate::sdk::{ErrorCode, NodeTree, SdkCommand};

use super::syncs::start_syncs;
use super::trial::{check_trial, TrialStatus};

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum SessionState {
    /// No session; setup has to run
    LoggedOut,
    /// Resumed-session login sent
    AwaitingLogin,
    /// Login accepted, remote tree requested
    AwaitingFetchNodes,
    /// Remote tree loaded, syncs and services running
    Ready,
    /// Logout sent, waiting for the reply
    LoggingOut,
    /// Build no longer allowed to run
    Expired,
}

pub const RUNNING_MESSAGE: &str = "TraySync is now running. Click here to open the status window.";

#[derive(Debug)]
pub struct SessionStateMachine {
    state: SessionState,
    /// Confirmed by the SDK, never set optimistically
    paused: bool,
    /// A restart was requested and waits for the transfers to drain
    pending_reboot: bool,
    /// Fetch-nodes re-issued from `Ready` after a reload request
    reloading: bool,
    syncs_active: bool,
    /// Shell integration and transfer bridge
    services_running: bool,
    /// A `Logout` sent after a failed login has not been answered yet
    pending_logout_reply: bool,
}

impl Default for SessionStateMachine {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionStateMachine {
    pub fn new() -> Self {
        Self {
            state: SessionState::LoggedOut,
            paused: false,
            pending_reboot: false,
            reloading: false,
            syncs_active: false,
            services_running: false,
            pending_logout_reply: false,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_ready(&self) -> bool {
        self.state == SessionState::Ready
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn pending_reboot(&self) -> bool {
        self.pending_reboot
    }

    /// Account details are only trusted once the tree is loaded
    pub fn accepts_account_updates(&self) -> bool {
        self.state == SessionState::Ready
    }

    fn transition(&mut self, to: SessionState) {
        if self.state != to {
            info!("Session state {:?} -> {:?}", self.state, to);
            self.state = to;
        }
    }

    /// Process start: trial check, then login or setup.
    pub fn start(
        &mut self,
        now: DateTime<Utc>,
        prefs: &mut Preferences,
        settings: &CoreSettings,
    ) -> Vec<Effect> {
        if self.state != SessionState::LoggedOut {
            warn!("Session already started ({:?})", self.state);
            return Vec::new();
        }

        if check_trial(now, prefs.last_execution_ms, settings.trial_deadline) == TrialStatus::Expired {
            self.transition(SessionState::Expired);
            return vec![Effect::Ui(UiEffect::ShowExpired)];
        }

        prefs.last_execution_ms = Some(now.timestamp_millis());
        let mut effects = vec![Effect::SavePreferences];
        effects.extend(self.begin(prefs));
        effects
    }

    /// Enter the flow from the top: resume the stored session or run setup
    fn begin(&mut self, prefs: &Preferences) -> Vec<Effect> {
        match &prefs.credential {
            Some(credential) => {
                info!("Resuming session for {}", credential.email);
                self.transition(SessionState::AwaitingLogin);
                vec![Effect::Sdk(SdkCommand::ResumeSession(credential.clone()))]
            }
            None => {
                self.transition(SessionState::LoggedOut);
                vec![Effect::Ui(UiEffect::StartSetup)]
            }
        }
    }

    /// The setup flow logged in and loaded the tree on its own
    pub fn on_setup_completed(
        &mut self,
        credential: Credential,
        prefs: &mut Preferences,
        settings: &CoreSettings,
        tree: &dyn NodeTree,
    ) -> Vec<Effect> {
        if self.state != SessionState::LoggedOut {
            warn!("Setup completed in state {:?}, ignoring", self.state);
            return Vec::new();
        }

        info!("Setup completed for {}", credential.email);
        prefs.credential = Some(credential);
        let mut effects = vec![Effect::SavePreferences];
        effects.extend(self.enter_ready(prefs, settings, tree));
        effects
    }

    pub fn on_login_finished(&mut self, error: &ErrorCode, prefs: &mut Preferences) -> Vec<Effect> {
        if self.state != SessionState::AwaitingLogin {
            debug!("Login reply in state {:?}, ignoring", self.state);
            return Vec::new();
        }

        if error.is_ok() {
            self.transition(SessionState::AwaitingFetchNodes);
            return vec![
                Effect::Sdk(SdkCommand::FetchNodes),
                Effect::Sdk(SdkCommand::GetAccountDetails),
            ];
        }

        error!("Login failed: {}", error.message());
        prefs.unlink();
        self.pending_logout_reply = true;
        self.transition(SessionState::LoggedOut);
        vec![
            Effect::message(
                MessageLevel::Error,
                "Your session could not be resumed. Please log in again.",
            ),
            Effect::SavePreferences,
            Effect::Sdk(SdkCommand::Logout),
            Effect::Ui(UiEffect::StartSetup),
        ]
    }

    pub fn on_fetch_nodes_finished(
        &mut self,
        error: &ErrorCode,
        prefs: &mut Preferences,
        settings: &CoreSettings,
        tree: &dyn NodeTree,
    ) -> Vec<Effect> {
        let reload = self.state == SessionState::Ready && self.reloading;
        if self.state != SessionState::AwaitingFetchNodes && !reload {
            debug!("Fetch-nodes reply in state {:?}, ignoring", self.state);
            return Vec::new();
        }
        self.reloading = false;

        if !error.is_ok() {
            error!("Error fetching nodes: {}", error.message());
            let mut effects = vec![Effect::message(
                MessageLevel::Error,
                "Unable to load your files. You have been logged out.",
            )];
            effects.extend(self.logout());
            return effects;
        }

        if reload {
            info!("Remote tree reloaded, restarting syncs");
            let effects = start_syncs(prefs, tree, self.syncs_active);
            self.syncs_active = true;
            return effects;
        }

        self.enter_ready(prefs, settings, tree)
    }

    fn enter_ready(
        &mut self,
        prefs: &mut Preferences,
        settings: &CoreSettings,
        tree: &dyn NodeTree,
    ) -> Vec<Effect> {
        self.transition(SessionState::Ready);

        let mut effects = vec![
            Effect::message(MessageLevel::Notification, RUNNING_MESSAGE),
            Effect::Sdk(SdkCommand::GetAccountDetails),
            Effect::Sdk(SdkCommand::SetUploadLimit(prefs.upload_limit_bytes())),
        ];
        effects.extend(start_syncs(prefs, tree, self.syncs_active));
        self.syncs_active = true;

        effects.push(Effect::StartShellIntegration);
        effects.push(Effect::StartTransferBridge(settings.bridge_port));
        self.services_running = true;
        effects
    }

    /// Stop everything started by `enter_ready`
    fn teardown(&mut self) -> Vec<Effect> {
        let mut effects = Vec::new();
        if self.services_running {
            effects.push(Effect::StopTransferBridge);
        }
        if self.syncs_active {
            effects.push(Effect::Sdk(SdkCommand::StopSyncs));
        }
        if self.services_running {
            effects.push(Effect::StopShellIntegration);
        }
        self.services_running = false;
        self.syncs_active = false;
        self.reloading = false;
        effects
    }

    fn logout(&mut self) -> Vec<Effect> {
        let mut effects = self.teardown();
        effects.push(Effect::Sdk(SdkCommand::Logout));
        self.transition(SessionState::LoggingOut);
        effects
    }

    /// User asked to log out
    pub fn request_logout(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Ready | SessionState::AwaitingFetchNodes | SessionState::AwaitingLogin => {
                info!("Logout requested");
                self.logout()
            }
            SessionState::LoggedOut | SessionState::LoggingOut | SessionState::Expired => {
                debug!("Logout requested in state {:?}, ignoring", self.state);
                Vec::new()
            }
        }
    }

    /// Logout confirmed, or forced by the server
    pub fn on_logout_finished(&mut self, error: &ErrorCode, prefs: &mut Preferences) -> Vec<Effect> {
        // Reply to the logout that followed a failed login; the session was already reset
        if self.pending_logout_reply {
            self.pending_logout_reply = false;
            debug!("Logout reply for the failed login in state {:?}, ignoring", self.state);
            return Vec::new();
        }

        let mut effects = match self.state {
            SessionState::LoggedOut | SessionState::Expired => {
                debug!("Logout reply in state {:?}, ignoring", self.state);
                return Vec::new();
            }
            SessionState::LoggingOut => Vec::new(),
            SessionState::AwaitingLogin
            | SessionState::AwaitingFetchNodes
            | SessionState::Ready => {
                warn!("Session closed by the server in state {:?}", self.state);
                self.teardown()
            }
        };

        if !error.is_ok() {
            warn!("Logout finished with error: {}", error.message());
        }

        prefs.unlink();
        self.paused = false;
        effects.push(Effect::SavePreferences);
        self.transition(SessionState::LoggedOut);
        effects.extend(self.begin(prefs));
        effects
    }

    /// Incremental detail was lost; fetch the tree again
    pub fn on_reload_needed(&mut self) -> Vec<Effect> {
        match self.state {
            SessionState::Ready if !self.reloading => {
                info!("Reload needed, fetching nodes again");
                self.reloading = true;
                let mut effects = Vec::new();
                if self.syncs_active {
                    effects.push(Effect::Sdk(SdkCommand::StopSyncs));
                    self.syncs_active = false;
                }
                effects.push(Effect::Sdk(SdkCommand::FetchNodes));
                effects
            }
            _ => {
                debug!("Reload request in state {:?}, ignoring", self.state);
                Vec::new()
            }
        }
    }

    /// Ask the SDK to pause or resume; the flag changes on the reply
    pub fn request_pause(&self, paused: bool) -> Vec<Effect> {
        if self.state == SessionState::Expired {
            return Vec::new();
        }
        vec![Effect::Sdk(SdkCommand::PauseTransfers(paused))]
    }

    pub fn on_pause_finished(&mut self, error: &ErrorCode, paused: bool) -> Vec<Effect> {
        if !error.is_ok() {
            warn!("Pause request failed: {}", error.message());
            return Vec::new();
        }
        self.paused = paused;
        vec![Effect::Ui(UiEffect::PausedChanged { paused })]
    }

    /// An update was installed; restart once the transfers are done
    pub fn request_reboot(&mut self) {
        info!("Restart pending until transfers drain");
        self.pending_reboot = true;
    }

    /// Stop everything before the process exits
    pub fn shutdown(&mut self) -> Vec<Effect> {
        self.teardown()
    }
}
