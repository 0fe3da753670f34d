//! Application context
//!
//! Owns every piece of process-wide state and dispatches each [`AppEvent`]
//! to exactly one handler. Handlers are pure: they mutate the sub-state they
//! own and return the effects for the runtime to execute.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::{AccountUsage, CoreSettings, Credential, Preferences};
use crate::nodes::{NodeUpdateReconciler, RecentFile, RecentFiles};
use crate::sdk::{
    AccountDetails, ErrorCode, NodeDescriptor, NodeHandle, NodeTree, SdkCommand, SdkEvent,
    TransferDirection, TransferInfo,
};
use crate::session::{SessionState, SessionStateMachine};
use crate::transfer::{FinishOutcome, TagRegistry, TransferStatsAggregator};
use crate::upload::{Dispatch, EnqueueOutcome, FolderProbe, UploadQueueCoordinator, WalkdirProbe};

use super::effects::{Effect, Message, MessageLevel, TransferProgress, TrayStatus, UiEffect};
use super::events::{AppEvent, UiCommand};
use super::snapshot::Snapshot;

pub const EXTERNAL_CHANGES_MESSAGE: &str = "You have new or updated files in your account";
pub const INVALID_DESTINATION_MESSAGE: &str =
    "Error: Invalid destination folder. The upload has been cancelled";
pub const LINK_COPIED_MESSAGE: &str = "The link has been copied to the clipboard";

pub struct AppContext {
    prefs: Preferences,
    settings: CoreSettings,
    session: SessionStateMachine,
    stats: TransferStatsAggregator,
    tags: TagRegistry,
    uploads: UploadQueueCoordinator,
    recent: RecentFiles,
    reconciler: NodeUpdateReconciler,
    /// Last status pushed to the tray
    tray_status: Option<TrayStatus>,
}

impl AppContext {
    pub fn new(prefs: Preferences, settings: CoreSettings) -> Self {
        Self::with_probe(prefs, settings, Box::new(WalkdirProbe))
    }

    /// Use a custom folder probe for upload size checks
    pub fn with_probe(prefs: Preferences, settings: CoreSettings, probe: Box<dyn FolderProbe>) -> Self {
        Self {
            tags: TagRegistry::new(settings.tag_registry_capacity),
            uploads: UploadQueueCoordinator::new(settings.folder_limits, probe),
            recent: RecentFiles::new(settings.recent_files_limit),
            reconciler: NodeUpdateReconciler::new(),
            session: SessionStateMachine::new(),
            stats: TransferStatsAggregator::new(),
            tray_status: None,
            prefs,
            settings,
        }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn settings(&self) -> &CoreSettings {
        &self.settings
    }

    pub fn session_state(&self) -> SessionState {
        self.session.state()
    }

    pub fn recent_files(&self) -> Vec<RecentFile> {
        self.recent.to_vec()
    }

    pub fn tags(&self) -> &TagRegistry {
        &self.tags
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            session: self.session.state(),
            stats: self.stats.snapshot(),
            recent_files: self.recent.to_vec(),
            usage: self.prefs.account,
            paused: self.session.is_paused(),
            tray_status: self.tray_status,
        }
    }

    /// Process start
    pub fn start(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        let effects = self.session.start(now, &mut self.prefs, &self.settings);
        self.finish(effects)
    }

    pub fn handle(&mut self, event: AppEvent, tree: &dyn NodeTree) -> Vec<Effect> {
        let before = self.session.state();
        let effects = match event {
            AppEvent::Sdk(event) => self.on_sdk_event(event, tree),
            AppEvent::Ui(command) => self.on_ui_command(command, tree),
            AppEvent::UpdateInstalled => self.on_update_installed(),
            AppEvent::RebootTimerElapsed => self.on_reboot_timer(),
        };

        if before != SessionState::LoggedOut && self.session.state() == SessionState::LoggedOut {
            self.reset_account_state();
        }
        self.finish(effects)
    }

    fn on_sdk_event(&mut self, event: SdkEvent, tree: &dyn NodeTree) -> Vec<Effect> {
        debug!("SDK event: {}", event.kind());
        match event {
            SdkEvent::LoginFinished { error } => self.session.on_login_finished(&error, &mut self.prefs),
            SdkEvent::FetchNodesFinished { error } => {
                self.session
                    .on_fetch_nodes_finished(&error, &mut self.prefs, &self.settings, tree)
            }
            SdkEvent::LogoutFinished { error } => {
                self.session.on_logout_finished(&error, &mut self.prefs)
            }
            SdkEvent::AccountDetailsFinished { error, details } => {
                self.on_account_details(&error, details)
            }
            SdkEvent::ExportFinished { error, link } => on_export_finished(&error, link),
            SdkEvent::PauseTransfersFinished { error, paused } => {
                self.session.on_pause_finished(&error, paused)
            }
            SdkEvent::TransferStarted(transfer) => {
                self.stats.on_start(&transfer);
                vec![self.stats_changed()]
            }
            SdkEvent::TransferUpdated(transfer) => {
                self.stats.on_update(&transfer);
                vec![progress(&transfer), self.stats_changed()]
            }
            SdkEvent::TransferFinished { transfer, error } => {
                self.on_transfer_finished(transfer, &error)
            }
            SdkEvent::TransferTemporaryError { transfer, error } => {
                warn!(
                    "Temporary error in transfer {} (tag {}): {}",
                    transfer.file_name,
                    transfer.tag,
                    error.message()
                );
                vec![Effect::Ui(UiEffect::Message(
                    Message::new(
                        MessageLevel::Warning,
                        format!("Temporary error in transfer: {}", error.message()),
                    )
                    .with_title(transfer.file_name),
                ))]
            }
            SdkEvent::NodesUpdated(batch) => self.on_nodes_updated(batch.as_deref()),
            SdkEvent::ReloadNeeded => self.session.on_reload_needed(),
        }
    }

    fn on_ui_command(&mut self, command: UiCommand, tree: &dyn NodeTree) -> Vec<Effect> {
        debug!("UI command: {:?}", command);
        match command {
            UiCommand::SetupCompleted(credential) => self.on_setup_completed(credential, tree),
            UiCommand::Upload(paths) => self.on_upload(paths, tree),
            UiCommand::DestinationSelected {
                handle,
                make_default,
            } => self.on_destination_selected(handle, make_default, tree),
            UiCommand::DestinationCancelled => {
                self.uploads.on_selection_cancelled();
                Vec::new()
            }
            UiCommand::SetPaused(paused) => self.session.request_pause(paused),
            UiCommand::Logout => self.session.request_logout(),
            UiCommand::Restart => {
                let mut effects = self.session.shutdown();
                effects.push(Effect::Restart);
                effects
            }
            UiCommand::Exit => {
                info!("Exit requested");
                let mut effects = self.session.shutdown();
                effects.push(Effect::Exit);
                effects
            }
            UiCommand::CopyFileLink(handle) => {
                if !self.session.is_ready() {
                    debug!("Link for {} requested before ready, ignoring", handle);
                    return Vec::new();
                }
                vec![Effect::Sdk(SdkCommand::ExportNode(handle))]
            }
            UiCommand::SetUploadLimit(limit_kb) => {
                info!("Upload limit set to {:?} KB/s", limit_kb);
                self.prefs.upload_limit_kb = limit_kb;
                let mut effects = vec![Effect::SavePreferences];
                if self.session.is_ready() {
                    effects.push(Effect::Sdk(SdkCommand::SetUploadLimit(
                        self.prefs.upload_limit_bytes(),
                    )));
                }
                effects
            }
            UiCommand::SetNotifications(enabled) => {
                self.prefs.show_notifications = enabled;
                vec![Effect::SavePreferences]
            }
        }
    }

    fn on_setup_completed(&mut self, credential: Credential, tree: &dyn NodeTree) -> Vec<Effect> {
        self.session
            .on_setup_completed(credential, &mut self.prefs, &self.settings, tree)
    }

    fn on_update_installed(&mut self) -> Vec<Effect> {
        info!("Update installed, scheduling restart");
        self.session.request_reboot();
        vec![Effect::ScheduleReboot(self.settings.reboot_delay)]
    }

    fn on_reboot_timer(&mut self) -> Vec<Effect> {
        if !self.session.pending_reboot() {
            debug!("Reboot timer fired with no restart pending");
            return Vec::new();
        }
        info!("Restarting after update");
        let mut effects = self.session.shutdown();
        effects.push(Effect::Restart);
        effects
    }

    fn on_account_details(
        &mut self,
        error: &ErrorCode,
        details: Option<AccountDetails>,
    ) -> Vec<Effect> {
        if !self.session.accepts_account_updates() {
            debug!(
                "Account details in state {:?} discarded as stale",
                self.session.state()
            );
            return Vec::new();
        }
        if !error.is_ok() {
            warn!("Account details request failed: {}", error.message());
            return Vec::new();
        }
        let Some(details) = details else {
            return Vec::new();
        };

        let usage = AccountUsage::from(details);
        self.prefs.account = Some(usage);
        vec![
            Effect::SavePreferences,
            Effect::Ui(UiEffect::UsageChanged { usage }),
        ]
    }

    fn on_transfer_finished(&mut self, transfer: TransferInfo, error: &ErrorCode) -> Vec<Effect> {
        let outcome = self.stats.on_finish(&transfer);
        let mut effects = vec![progress(&transfer)];

        if error.is_ok() {
            match transfer.direction {
                // The node shows up later in a node-update batch with the same tag
                TransferDirection::Upload => self.tags.record(transfer.tag, transfer.path.clone()),
                TransferDirection::Download => match transfer.node_handle {
                    Some(handle) => {
                        let file = RecentFile::new(
                            transfer.file_name.clone(),
                            handle,
                            Some(transfer.path.clone()),
                        );
                        self.recent.push(file.clone());
                        effects.push(Effect::Ui(UiEffect::RecentFileAdded { file }));
                    }
                    None => debug!("Download {} finished without a node handle", transfer.tag),
                },
            }
        } else {
            warn!(
                "Transfer {} (tag {}) failed: {}",
                transfer.file_name,
                transfer.tag,
                error.message()
            );
        }

        effects.push(self.stats_changed());

        if outcome == FinishOutcome::Drained && self.session.pending_reboot() {
            info!("Transfers drained with a restart pending");
            effects.push(Effect::ScheduleReboot(self.settings.reboot_delay));
        }
        effects
    }

    fn on_nodes_updated(&mut self, batch: Option<&[NodeDescriptor]>) -> Vec<Effect> {
        if !self.session.is_ready() {
            debug!("Node update in state {:?}, ignoring", self.session.state());
            return Vec::new();
        }

        let report = self.reconciler.reconcile(batch, &mut self.tags);
        let mut effects: Vec<Effect> = report
            .changed_paths
            .into_iter()
            .map(Effect::NotifyItemChanged)
            .collect();

        for file in report.recent {
            self.recent.push(file.clone());
            effects.push(Effect::Ui(UiEffect::RecentFileAdded { file }));
        }

        if report.external_count > 0 {
            info!("{} nodes changed outside this client", report.external_count);
            effects.push(Effect::message(
                MessageLevel::Notification,
                EXTERNAL_CHANGES_MESSAGE,
            ));
        }
        effects
    }

    fn on_upload(&mut self, paths: Vec<PathBuf>, tree: &dyn NodeTree) -> Vec<Effect> {
        if !self.session.is_ready() {
            warn!("Upload of {} paths requested before ready, dropping", paths.len());
            return Vec::new();
        }

        match self
            .uploads
            .enqueue(paths, self.prefs.default_upload_folder, tree)
        {
            Ok(EnqueueOutcome::Ignored) => Vec::new(),
            Ok(EnqueueOutcome::Raised) => vec![Effect::Ui(UiEffect::RaiseFolderSelector)],
            Ok(EnqueueOutcome::Prompted) => vec![Effect::Ui(UiEffect::ShowFolderSelector)],
            Ok(EnqueueOutcome::Dispatched(dispatch)) => self.dispatch_effects(dispatch),
            Err(e) => {
                warn!("Upload cancelled: {}", e);
                vec![Effect::message(MessageLevel::Error, INVALID_DESTINATION_MESSAGE)]
            }
        }
    }

    fn on_destination_selected(
        &mut self,
        handle: NodeHandle,
        make_default: bool,
        tree: &dyn NodeTree,
    ) -> Vec<Effect> {
        match self.uploads.on_destination_selected(handle, tree) {
            Ok(dispatch) => {
                let mut effects = Vec::new();
                if make_default {
                    info!("Default upload folder set to {}", handle);
                    self.prefs.default_upload_folder = Some(handle);
                    effects.push(Effect::SavePreferences);
                }
                effects.extend(self.dispatch_effects(dispatch));
                effects
            }
            Err(e) => {
                warn!("Upload cancelled: {}", e);
                vec![Effect::message(MessageLevel::Error, INVALID_DESTINATION_MESSAGE)]
            }
        }
    }

    fn dispatch_effects(&self, dispatch: Dispatch) -> Vec<Effect> {
        let Dispatch {
            destination,
            submitted,
            excluded,
        } = dispatch;

        let mut effects: Vec<Effect> = submitted
            .into_iter()
            .map(|local_path| {
                Effect::Sdk(SdkCommand::Upload {
                    local_path,
                    parent: destination,
                })
            })
            .collect();

        let limits = self.settings.folder_limits;
        let text = match excluded.as_slice() {
            [] => None,
            [name] => Some(format!(
                "The folder ({}) wasn't uploaded because it's too large (the limit is {} folders or {} files)",
                name, limits.max_folders, limits.max_files
            )),
            names => Some(format!(
                "{} folders weren't uploaded because they are too large (the limit is {} folders or {} files)",
                names.len(),
                limits.max_folders,
                limits.max_files
            )),
        };
        if let Some(text) = text {
            effects.push(Effect::message(MessageLevel::Warning, text));
        }
        effects
    }

    fn stats_changed(&self) -> Effect {
        Effect::Ui(UiEffect::StatsChanged {
            stats: self.stats.snapshot(),
        })
    }

    /// Drop everything tied to the previous account
    fn reset_account_state(&mut self) {
        info!("Session ended, clearing account state");
        self.tags.clear();
        self.uploads.reset();
        self.recent.clear();
        self.stats = TransferStatsAggregator::new();
    }

    fn current_tray_status(&self) -> Option<TrayStatus> {
        match self.session.state() {
            SessionState::Expired => None,
            SessionState::Ready if self.session.is_paused() => Some(TrayStatus::Paused),
            SessionState::Ready if !self.stats.is_idle() => Some(TrayStatus::Syncing),
            SessionState::Ready => Some(TrayStatus::Synced),
            SessionState::LoggedOut
            | SessionState::AwaitingLogin
            | SessionState::AwaitingFetchNodes
            | SessionState::LoggingOut => Some(TrayStatus::LoggingIn),
        }
    }

    /// Apply the notification policy and append a tray update if needed
    fn finish(&mut self, effects: Vec<Effect>) -> Vec<Effect> {
        let show_passive = self.prefs.show_notifications;
        let mut effects: Vec<Effect> = effects
            .into_iter()
            .filter(|effect| match effect {
                Effect::Ui(UiEffect::Message(message)) => {
                    show_passive || !message.level.is_passive()
                }
                _ => true,
            })
            .collect();

        let status = self.current_tray_status();
        if status != self.tray_status {
            self.tray_status = status;
            if let Some(status) = status {
                effects.push(Effect::Ui(UiEffect::TrayStatusChanged { status }));
            }
        }
        effects
    }
}

fn on_export_finished(error: &ErrorCode, link: Option<String>) -> Vec<Effect> {
    match (error.is_ok(), link) {
        (true, Some(link)) => vec![
            Effect::Ui(UiEffect::CopyToClipboard { text: link }),
            Effect::message(MessageLevel::Info, LINK_COPIED_MESSAGE),
        ],
        (true, None) => {
            warn!("Export finished without a link");
            Vec::new()
        }
        (false, _) => {
            warn!("Export failed: {}", error.message());
            vec![Effect::message(
                MessageLevel::Info,
                format!("Unable to create the link: {}", error.message()),
            )]
        }
    }
}

fn progress(transfer: &TransferInfo) -> Effect {
    Effect::Ui(UiEffect::TransferProgress(TransferProgress {
        direction: transfer.direction,
        file_name: transfer.file_name.clone(),
        transferred_bytes: transfer.transferred_bytes,
        total_bytes: transfer.total_bytes,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FolderLimits;
    use crate::sdk::{SnapshotTree, TransferTag};
    use chrono::TimeZone;
    use std::path::Path;
    use std::time::Duration;

    struct NameProbe;

    impl FolderProbe for NameProbe {
        fn exceeds_limits(&self, path: &Path, _limits: &FolderLimits) -> bool {
            path.file_name()
                .map(|n| n.to_string_lossy().starts_with("big"))
                .unwrap_or(false)
        }
    }

    const FOLDER: u64 = 10;
    const FILE: u64 = 11;

    fn tree() -> SnapshotTree {
        let mut tree = SnapshotTree::new();
        tree.add_folder(FOLDER, "Uploads", None);
        tree.add_file(FILE, "notes.txt", Some(FOLDER));
        tree
    }

    fn ready(prefs: Preferences) -> (AppContext, SnapshotTree) {
        let tree = tree();
        let prefs = Preferences {
            credential: Some(Credential::new("user@example.com", "token")),
            ..prefs
        };
        let mut ctx = AppContext::with_probe(prefs, CoreSettings::default(), Box::new(NameProbe));
        ctx.start(Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap());
        ctx.handle(SdkEvent::LoginFinished { error: ErrorCode::Ok }.into(), &tree);
        ctx.handle(SdkEvent::FetchNodesFinished { error: ErrorCode::Ok }.into(), &tree);
        assert_eq!(ctx.session_state(), SessionState::Ready);
        (ctx, tree)
    }

    fn transfer(direction: TransferDirection, tag: i32, path: &str) -> TransferInfo {
        TransferInfo {
            direction,
            tag: TransferTag(tag),
            file_name: Path::new(path)
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            path: PathBuf::from(path),
            node_handle: None,
            total_bytes: 1_000,
            transferred_bytes: 1_000,
            delta_bytes: 1_000,
            speed: 500,
        }
    }

    fn uploads_of(effects: &[Effect]) -> Vec<PathBuf> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Sdk(SdkCommand::Upload { local_path, .. }) => Some(local_path.clone()),
                _ => None,
            })
            .collect()
    }

    fn messages(effects: &[Effect]) -> Vec<Message> {
        effects
            .iter()
            .filter_map(|e| match e {
                Effect::Ui(UiEffect::Message(m)) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    fn count<F: Fn(&Effect) -> bool>(effects: &[Effect], pred: F) -> usize {
        effects.iter().filter(|e| pred(e)).count()
    }

    #[test]
    fn test_enqueue_while_selecting_raises_prompt() {
        let (mut ctx, tree) = ready(Preferences::default());

        let effects = ctx.handle(UiCommand::Upload(vec!["/local/A".into()]).into(), &tree);
        assert!(effects.contains(&Effect::Ui(UiEffect::ShowFolderSelector)));

        let effects = ctx.handle(UiCommand::Upload(vec!["/local/B".into()]).into(), &tree);
        assert!(effects.contains(&Effect::Ui(UiEffect::RaiseFolderSelector)));
        assert!(!effects.contains(&Effect::Ui(UiEffect::ShowFolderSelector)));

        let effects = ctx.handle(
            UiCommand::DestinationSelected {
                handle: NodeHandle(FOLDER),
                make_default: true,
            }
            .into(),
            &tree,
        );
        assert_eq!(
            uploads_of(&effects),
            vec![PathBuf::from("/local/A"), PathBuf::from("/local/B")]
        );
        assert!(effects.contains(&Effect::SavePreferences));
        assert_eq!(ctx.preferences().default_upload_folder, Some(NodeHandle(FOLDER)));

        // The default is used without prompting
        let effects = ctx.handle(UiCommand::Upload(vec!["/local/C".into()]).into(), &tree);
        assert_eq!(uploads_of(&effects), vec![PathBuf::from("/local/C")]);
    }

    #[test]
    fn test_cancelled_selection_drops_pending() {
        let (mut ctx, tree) = ready(Preferences::default());
        ctx.handle(UiCommand::Upload(vec!["/local/A".into()]).into(), &tree);
        ctx.handle(UiCommand::DestinationCancelled.into(), &tree);

        let effects = ctx.handle(UiCommand::Upload(vec!["/local/B".into()]).into(), &tree);
        assert!(effects.contains(&Effect::Ui(UiEffect::ShowFolderSelector)));
        let effects = ctx.handle(
            UiCommand::DestinationSelected {
                handle: NodeHandle(FOLDER),
                make_default: false,
            }
            .into(),
            &tree,
        );
        assert_eq!(uploads_of(&effects), vec![PathBuf::from("/local/B")]);
        assert!(!effects.contains(&Effect::SavePreferences));
    }

    #[test]
    fn test_oversized_folder_single_warning() {
        let prefs = Preferences {
            default_upload_folder: Some(NodeHandle(FOLDER)),
            ..Preferences::default()
        };
        let (mut ctx, tree) = ready(prefs);

        let effects = ctx.handle(
            UiCommand::Upload(vec![
                "/local/photos".into(),
                "/local/big-archive".into(),
                "/local/docs".into(),
            ])
            .into(),
            &tree,
        );
        assert_eq!(
            uploads_of(&effects),
            vec![PathBuf::from("/local/photos"), PathBuf::from("/local/docs")]
        );
        let msgs = messages(&effects);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].level, MessageLevel::Warning);
        assert!(msgs[0].text.starts_with("The folder (big-archive) wasn't uploaded"));
    }

    #[test]
    fn test_oversized_folders_plural_warning() {
        let prefs = Preferences {
            default_upload_folder: Some(NodeHandle(FOLDER)),
            ..Preferences::default()
        };
        let (mut ctx, tree) = ready(prefs);

        let effects = ctx.handle(
            UiCommand::Upload(vec!["/local/big1".into(), "/local/big2".into()]).into(),
            &tree,
        );
        assert!(uploads_of(&effects).is_empty());
        let msgs = messages(&effects);
        assert_eq!(msgs.len(), 1);
        assert!(msgs[0].text.starts_with("2 folders weren't uploaded"));
    }

    #[test]
    fn test_file_destination_aborts_batch() {
        let (mut ctx, tree) = ready(Preferences::default());
        ctx.handle(UiCommand::Upload(vec!["/local/A".into()]).into(), &tree);

        let effects = ctx.handle(
            UiCommand::DestinationSelected {
                handle: NodeHandle(FILE),
                make_default: true,
            }
            .into(),
            &tree,
        );
        assert!(uploads_of(&effects).is_empty());
        let msgs = messages(&effects);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].level, MessageLevel::Error);
        assert_eq!(msgs[0].text, INVALID_DESTINATION_MESSAGE);
        assert_eq!(ctx.preferences().default_upload_folder, None);
    }

    #[test]
    fn test_finished_upload_resolves_node_update() {
        let (mut ctx, tree) = ready(Preferences::default());
        let upload = transfer(TransferDirection::Upload, 7, "/local/x.txt");

        ctx.handle(SdkEvent::TransferStarted(upload.clone()).into(), &tree);
        ctx.handle(
            SdkEvent::TransferFinished {
                transfer: upload,
                error: ErrorCode::Ok,
            }
            .into(),
            &tree,
        );
        assert_eq!(ctx.tags().get(TransferTag(7)), Some(Path::new("/local/x.txt")));

        let batch = vec![NodeDescriptor::file(100, 7, "x.txt")];
        let effects = ctx.handle(SdkEvent::NodesUpdated(Some(batch)).into(), &tree);

        assert_eq!(
            count(&effects, |e| matches!(e, Effect::NotifyItemChanged(_))),
            1
        );
        assert!(effects.contains(&Effect::NotifyItemChanged(PathBuf::from("/local/x.txt"))));

        let recent = ctx.recent_files();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].local_path, Some(PathBuf::from("/local/x.txt")));
        assert!(messages(&effects).is_empty());
    }

    #[test]
    fn test_external_nodes_single_notification() {
        let (mut ctx, tree) = ready(Preferences::default());
        let batch = vec![
            NodeDescriptor::file(1, 0, "a.txt"),
            NodeDescriptor::file(2, 0, "b.txt"),
            NodeDescriptor::folder(3, 0, "c"),
        ];
        let effects = ctx.handle(SdkEvent::NodesUpdated(Some(batch)).into(), &tree);

        assert!(ctx.recent_files().is_empty());
        let msgs = messages(&effects);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].level, MessageLevel::Notification);
        assert_eq!(msgs[0].text, EXTERNAL_CHANGES_MESSAGE);
    }

    #[test]
    fn test_full_reload_batch_is_skipped() {
        let (mut ctx, tree) = ready(Preferences::default());
        let effects = ctx.handle(SdkEvent::NodesUpdated(None).into(), &tree);
        assert!(effects.is_empty());
    }

    #[test]
    fn test_notifications_disabled_hides_passive_messages() {
        let (mut ctx, tree) = ready(Preferences::default());
        ctx.handle(UiCommand::SetNotifications(false).into(), &tree);

        let batch = vec![NodeDescriptor::file(1, 0, "a.txt")];
        let effects = ctx.handle(SdkEvent::NodesUpdated(Some(batch)).into(), &tree);
        assert!(messages(&effects).is_empty());

        // Errors always show
        ctx.handle(UiCommand::Upload(vec!["/local/A".into()]).into(), &tree);
        let effects = ctx.handle(
            UiCommand::DestinationSelected {
                handle: NodeHandle(999),
                make_default: false,
            }
            .into(),
            &tree,
        );
        assert_eq!(messages(&effects).len(), 1);
    }

    #[test]
    fn test_events_before_ready_are_ignored() {
        let tree = tree();
        let prefs = Preferences {
            credential: Some(Credential::new("user@example.com", "token")),
            ..Preferences::default()
        };
        let mut ctx = AppContext::new(prefs, CoreSettings::default());
        ctx.start(Utc::now());

        let batch = vec![NodeDescriptor::file(1, 0, "a.txt")];
        assert!(ctx
            .handle(SdkEvent::NodesUpdated(Some(batch)).into(), &tree)
            .is_empty());

        let details = AccountDetails {
            pro_level: 1,
            storage_max: 100,
            storage_used: 10,
            transfer_max: 100,
            transfer_used: 5,
        };
        ctx.handle(
            SdkEvent::AccountDetailsFinished {
                error: ErrorCode::Ok,
                details: Some(details),
            }
            .into(),
            &tree,
        );
        assert_eq!(ctx.preferences().account, None);
    }

    #[test]
    fn test_account_details_update_usage_when_ready() {
        let (mut ctx, tree) = ready(Preferences::default());
        let details = AccountDetails {
            pro_level: 2,
            storage_max: 1_000,
            storage_used: 250,
            transfer_max: 500,
            transfer_used: 20,
        };
        let effects = ctx.handle(
            SdkEvent::AccountDetailsFinished {
                error: ErrorCode::Ok,
                details: Some(details),
            }
            .into(),
            &tree,
        );
        let usage = AccountUsage::from(details);
        assert_eq!(ctx.preferences().account, Some(usage));
        assert!(effects.contains(&Effect::Ui(UiEffect::UsageChanged { usage })));
        assert_eq!(ctx.snapshot().usage, Some(usage));
    }

    #[test]
    fn test_download_adds_recent_file() {
        let (mut ctx, tree) = ready(Preferences::default());
        let mut download = transfer(TransferDirection::Download, 3, "/local/report.pdf");
        download.node_handle = Some(NodeHandle(55));

        ctx.handle(SdkEvent::TransferStarted(download.clone()).into(), &tree);
        let effects = ctx.handle(
            SdkEvent::TransferFinished {
                transfer: download,
                error: ErrorCode::Ok,
            }
            .into(),
            &tree,
        );
        assert_eq!(
            count(&effects, |e| matches!(e, Effect::Ui(UiEffect::RecentFileAdded { .. }))),
            1
        );
        assert_eq!(ctx.recent_files()[0].handle, NodeHandle(55));
        assert!(ctx.tags().is_empty());
    }

    #[test]
    fn test_failed_upload_is_not_recorded() {
        let (mut ctx, tree) = ready(Preferences::default());
        let upload = transfer(TransferDirection::Upload, 4, "/local/y.txt");
        ctx.handle(SdkEvent::TransferStarted(upload.clone()).into(), &tree);
        ctx.handle(
            SdkEvent::TransferFinished {
                transfer: upload,
                error: ErrorCode::failed(-5, "quota"),
            }
            .into(),
            &tree,
        );
        assert!(ctx.tags().is_empty());
    }

    #[test]
    fn test_tray_status_follows_transfers_and_pause() {
        let (mut ctx, tree) = ready(Preferences::default());
        assert_eq!(ctx.snapshot().tray_status, Some(TrayStatus::Synced));

        let upload = transfer(TransferDirection::Upload, 1, "/local/a");
        let effects = ctx.handle(SdkEvent::TransferStarted(upload.clone()).into(), &tree);
        assert!(effects.contains(&Effect::Ui(UiEffect::TrayStatusChanged {
            status: TrayStatus::Syncing
        })));

        let effects = ctx.handle(
            SdkEvent::PauseTransfersFinished {
                error: ErrorCode::Ok,
                paused: true,
            }
            .into(),
            &tree,
        );
        assert!(effects.contains(&Effect::Ui(UiEffect::TrayStatusChanged {
            status: TrayStatus::Paused
        })));

        ctx.handle(
            SdkEvent::PauseTransfersFinished {
                error: ErrorCode::Ok,
                paused: false,
            }
            .into(),
            &tree,
        );
        let effects = ctx.handle(
            SdkEvent::TransferFinished {
                transfer: upload,
                error: ErrorCode::Ok,
            }
            .into(),
            &tree,
        );
        assert!(effects.contains(&Effect::Ui(UiEffect::TrayStatusChanged {
            status: TrayStatus::Synced
        })));
    }

    #[test]
    fn test_reboot_scheduled_when_transfers_drain() {
        let (mut ctx, tree) = ready(Preferences::default());
        let upload = transfer(TransferDirection::Upload, 1, "/local/a");
        ctx.handle(SdkEvent::TransferStarted(upload.clone()).into(), &tree);

        let effects = ctx.handle(AppEvent::UpdateInstalled, &tree);
        assert_eq!(effects, vec![Effect::ScheduleReboot(Duration::from_secs(10))]);

        let effects = ctx.handle(
            SdkEvent::TransferFinished {
                transfer: upload,
                error: ErrorCode::Ok,
            }
            .into(),
            &tree,
        );
        assert!(effects.contains(&Effect::ScheduleReboot(Duration::from_secs(10))));

        let effects = ctx.handle(AppEvent::RebootTimerElapsed, &tree);
        assert_eq!(effects.last(), Some(&Effect::Restart));
    }

    #[test]
    fn test_reboot_timer_without_request_is_ignored() {
        let (mut ctx, tree) = ready(Preferences::default());
        assert!(ctx.handle(AppEvent::RebootTimerElapsed, &tree).is_empty());
    }

    #[test]
    fn test_logout_clears_account_state() {
        let (mut ctx, tree) = ready(Preferences::default());
        let upload = transfer(TransferDirection::Upload, 9, "/local/z.txt");
        ctx.handle(SdkEvent::TransferStarted(upload.clone()).into(), &tree);
        ctx.handle(
            SdkEvent::TransferFinished {
                transfer: upload,
                error: ErrorCode::Ok,
            }
            .into(),
            &tree,
        );
        assert_eq!(ctx.tags().len(), 1);

        let effects = ctx.handle(UiCommand::Logout.into(), &tree);
        assert!(effects.contains(&Effect::Ui(UiEffect::TrayStatusChanged {
            status: TrayStatus::LoggingIn
        })));

        let effects = ctx.handle(SdkEvent::LogoutFinished { error: ErrorCode::Ok }.into(), &tree);
        assert_eq!(ctx.session_state(), SessionState::LoggedOut);
        assert!(ctx.tags().is_empty());
        assert!(!ctx.preferences().is_logged_in());
        assert!(effects.contains(&Effect::Ui(UiEffect::StartSetup)));
    }

    #[test]
    fn test_export_link_copied() {
        let (mut ctx, tree) = ready(Preferences::default());
        let effects = ctx.handle(UiCommand::CopyFileLink(NodeHandle(FILE)).into(), &tree);
        assert_eq!(effects, vec![Effect::Sdk(SdkCommand::ExportNode(NodeHandle(FILE)))]);

        let effects = ctx.handle(
            SdkEvent::ExportFinished {
                error: ErrorCode::Ok,
                link: Some("https://example.com/#!abc".into()),
            }
            .into(),
            &tree,
        );
        assert_eq!(
            effects,
            vec![
                Effect::Ui(UiEffect::CopyToClipboard {
                    text: "https://example.com/#!abc".into()
                }),
                Effect::message(MessageLevel::Info, LINK_COPIED_MESSAGE),
            ]
        );
    }

    #[test]
    fn test_temporary_error_warning_titled_by_file() {
        let (mut ctx, tree) = ready(Preferences::default());
        let upload = transfer(TransferDirection::Upload, 2, "/local/movie.mkv");
        let effects = ctx.handle(
            SdkEvent::TransferTemporaryError {
                transfer: upload,
                error: ErrorCode::failed(-3, "Try again"),
            }
            .into(),
            &tree,
        );
        let msgs = messages(&effects);
        assert_eq!(msgs.len(), 1);
        assert_eq!(msgs[0].level, MessageLevel::Warning);
        assert_eq!(msgs[0].title.as_deref(), Some("movie.mkv"));
        assert!(msgs[0].text.contains("Try again"));
    }

    #[test]
    fn test_upload_limit_applied_when_ready() {
        let (mut ctx, tree) = ready(Preferences::default());
        let effects = ctx.handle(UiCommand::SetUploadLimit(Some(50)).into(), &tree);
        assert_eq!(
            effects,
            vec![
                Effect::SavePreferences,
                Effect::Sdk(SdkCommand::SetUploadLimit(Some(51_200))),
            ]
        );
    }
}
