//! Sync reconciler
//!
//! The [`Reconciler`] owns the decision logic of *whether* a sync action may
//! proceed (enabled flag, metered-network policy, configured remote slot)
//! and the reconciliation flows that move content and keep the cached remote
//! modification timestamps consistent.
//!
//! ## Flow
//!
//! 1. **Change notification** enters via [`on_local_change`]: the durable
//!    changed flag is set and, when eligible, a delayed upload is armed so
//!    rapid bursts coalesce into a single transfer after a quiet period.
//! 2. **Reconciliation** ([`trigger_synchronization`]) compares the remote
//!    store's modification time against the cached record and the changed
//!    flag, then downloads, uploads, or does nothing.
//! 3. **Commit**: cached timestamps, the changed flag, and the credential
//!    cache are updated only after a transfer fully completes, so any
//!    failure leaves durable state exactly as it was and a retry is safe.
//!
//! [`on_local_change`]: Reconciler::on_local_change
//! [`trigger_synchronization`]: Reconciler::trigger_synchronization

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use dashmap::DashMap;
use tracing::{debug, info, warn};

use ledgersync_core::config::Config;
use ledgersync_core::domain::{file_names_match, RemoteMetadata, RemotePath, SyncError, SyncTarget};
use ledgersync_core::ports::{INetworkProbe, IPreferenceStore, IRemoteStorage, IUploadScheduler};

/// Outcome of a guarded synchronization pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// Sync is disabled; nothing was attempted
    Disabled,
    /// The remote copy was newer (or unknown); it was downloaded
    Downloaded,
    /// Local content had changed; it was uploaded
    Uploaded,
    /// Neither side changed since the last reconciliation
    UpToDate,
}

/// Decides sync eligibility and reconciles local/remote file state
///
/// ## Dependencies
///
/// All collaborators are constructor-injected ports:
/// - `remote`: object-store operations (metadata, download, upload)
/// - `prefs`: durable settings, the changed flag, the modification cache
/// - `probe`: connectivity and meteredness
/// - `scheduler`: cancelable one-shot delayed-upload timers
pub struct Reconciler {
    remote: Arc<dyn IRemoteStorage>,
    prefs: Arc<dyn IPreferenceStore>,
    probe: Arc<dyn INetworkProbe>,
    scheduler: Arc<dyn IUploadScheduler>,
    /// Directory holding local copies of remote files
    sync_dir: PathBuf,
    /// Quiet period before a coalesced delayed upload fires
    upload_delay: Duration,
    /// Suppresses delayed-upload arming during batch operations.
    /// Transient: always false at process start.
    auto_upload_disabled: AtomicBool,
    /// Remote paths with a transfer currently in flight
    in_flight: DashMap<String, ()>,
}

impl Reconciler {
    /// Creates a reconciler from its port dependencies and configuration
    pub fn new(
        remote: Arc<dyn IRemoteStorage>,
        prefs: Arc<dyn IPreferenceStore>,
        probe: Arc<dyn INetworkProbe>,
        scheduler: Arc<dyn IUploadScheduler>,
        config: &Config,
    ) -> Self {
        Self {
            remote,
            prefs,
            probe,
            scheduler,
            sync_dir: config.sync.sync_dir.clone(),
            upload_delay: Duration::from_secs(config.sync.upload_delay_secs),
            auto_upload_disabled: AtomicBool::new(false),
            in_flight: DashMap::new(),
        }
    }

    // ========================================================================
    // Configuration surface
    // ========================================================================

    /// The configured remote file path, if any
    pub fn remote_path(&self) -> Option<RemotePath> {
        self.prefs
            .remote_path()
            .and_then(|p| RemotePath::new(p).ok())
    }

    /// Sets the configured remote file path
    pub fn set_remote_path(&self, path: &str) -> Result<(), SyncError> {
        let validated = RemotePath::new(path)?;
        self.prefs
            .set_remote_path(validated.as_str())
            .map_err(SyncError::TransferFailed)?;
        info!(remote = %validated, "Remote path configured");
        Ok(())
    }

    /// Enables or disables synchronization
    pub fn set_enabled(&self, enabled: bool) -> anyhow::Result<()> {
        self.prefs.set_sync_enabled(enabled)
    }

    /// Persists the periodic sync interval
    pub fn set_sync_interval(&self, minutes: u32) -> anyhow::Result<()> {
        self.prefs.set_sync_interval_minutes(minutes)
    }

    /// Re-enables delayed-upload arming after a batch operation
    pub fn enable_auto_upload(&self) {
        self.auto_upload_disabled.store(false, Ordering::Release);
    }

    /// Suppresses delayed-upload arming for the duration of a batch
    /// operation. Does not touch the durable changed flag.
    pub fn disable_auto_upload(&self) {
        self.auto_upload_disabled.store(true, Ordering::Release);
    }

    /// Clears all synchronization preferences, including the modification
    /// cache, then re-persists current credentials
    pub fn reset_preferences(&self) -> anyhow::Result<()> {
        self.prefs.clear().context("Failed to clear preferences")?;
        self.remote
            .refresh_credential_cache()
            .context("Failed to refresh credential cache")?;
        info!("Synchronization preferences reset");
        Ok(())
    }

    /// The local sync-directory path for the configured remote file
    pub fn local_path_for_remote(&self) -> Option<PathBuf> {
        let remote = self.remote_path()?;
        Some(self.sync_dir.join(remote.file_name()))
    }

    // ========================================================================
    // Eligibility decision logic
    // ========================================================================

    /// Whether opportunistic automatic synchronization may proceed.
    ///
    /// False when sync is disabled, or when transfers are restricted to
    /// unmetered networks and the current one is metered. Side-effect free.
    pub fn can_sync(&self) -> bool {
        if !self.prefs.is_sync_enabled() {
            return false;
        }
        if self.prefs.wifi_only() && !self.probe.is_unmetered() {
            debug!("Restricted to unmetered networks and current network is metered");
            return false;
        }
        true
    }

    /// Whether an explicit, user-triggered sync may proceed.
    ///
    /// Strict superset of [`can_sync`]: additionally requires the network to
    /// be reachable at all and a non-empty configured remote path. This is
    /// the final gate before network operations.
    ///
    /// [`can_sync`]: Reconciler::can_sync
    pub fn is_active(&self) -> bool {
        if !self.prefs.is_sync_enabled() {
            return false;
        }
        if !self.probe.is_online() {
            return false;
        }
        if self.prefs.wifi_only() && !self.probe.is_unmetered() {
            return false;
        }
        self.remote_path().is_some()
    }

    /// Records that the local file has changed and, when eligible, arms the
    /// coalescing delayed upload.
    ///
    /// No-op when sync is disabled or no remote path is configured. The
    /// changed flag is set durably before any scheduling decision. Re-arming
    /// within the delay window replaces the pending timer, so N rapid calls
    /// produce exactly one delayed upload.
    pub fn on_local_change(&self) -> anyhow::Result<()> {
        if !self.prefs.is_sync_enabled() {
            return Ok(());
        }
        let Some(remote) = self.remote_path() else {
            return Ok(());
        };

        self.prefs
            .set_local_file_changed(true)
            .context("Failed to record local change")?;

        if self.auto_upload_disabled.load(Ordering::Acquire) {
            debug!("Auto-upload disabled; local change recorded but not scheduled");
            return Ok(());
        }
        if !self.can_sync() {
            return Ok(());
        }
        if self.prefs.upload_immediately() {
            debug!(remote = %remote, delay = ?self.upload_delay, "Arming delayed upload");
            self.scheduler.arm(remote.as_str(), self.upload_delay);
        }
        Ok(())
    }

    // ========================================================================
    // Reconciliation engine
    // ========================================================================

    /// Whether the remote file differs from the last-observed state.
    ///
    /// Pure comparison against the cached modification record; a missing
    /// record counts as modified. Never mutates the cache.
    pub fn is_remote_file_modified(&self, meta: &RemoteMetadata) -> bool {
        match self.prefs.cached_modified_at(&meta.path) {
            Some(cached) => cached != meta.modified_at,
            None => true,
        }
    }

    /// Downloads the remote file to the target's local path.
    ///
    /// Content is streamed to a temporary file and renamed into place. Only
    /// after the full transfer succeeds is the commit step applied: clear
    /// the changed flag, refresh the credential cache, record the just
    /// downloaded metadata's modification time, and cancel any pending
    /// delayed upload. A failure anywhere before that leaves all durable
    /// state untouched.
    pub async fn download(&self, target: &SyncTarget) -> Result<(), SyncError> {
        let _guard = self.begin_transfer(target.id())?;

        let meta = self
            .remote
            .get_metadata(target.remote())
            .await
            .map_err(SyncError::MetadataFetchFailed)?;

        let data = self
            .remote
            .download(target.remote())
            .await
            .map_err(SyncError::TransferFailed)?;

        self.write_local(target.local(), &data)
            .await
            .map_err(SyncError::TransferFailed)?;

        info!(
            remote = %target.remote(),
            local = %target.local().display(),
            bytes = data.len(),
            "Downloaded remote file"
        );

        self.commit_transfer(target.remote(), &meta)?;
        self.scheduler.cancel(target.id());

        Ok(())
    }

    /// Uploads the local file to the remote path with overwrite semantics.
    ///
    /// Fails fast with [`SyncError::LocalFileMissing`] when the local file
    /// cannot be read. After a successful transfer the credential cache is
    /// always refreshed (tokens may rotate during long transfers); the
    /// modification cache and changed flag are only updated once the
    /// confirming metadata fetch succeeds. When no remote path was
    /// configured yet, the uploaded path is adopted as the configured one.
    pub async fn upload(&self, local: &Path, remote: &RemotePath) -> Result<(), SyncError> {
        let _guard = self.begin_transfer(remote.as_str())?;

        let data = tokio::fs::read(local)
            .await
            .map_err(|_| SyncError::LocalFileMissing(local.to_path_buf()))?;

        self.remote
            .upload(remote, &data, true)
            .await
            .map_err(SyncError::TransferFailed)?;

        info!(remote = %remote, local = %local.display(), bytes = data.len(), "Uploaded local file");

        self.remote
            .refresh_credential_cache()
            .map_err(SyncError::CredentialError)?;

        // Confirm with fresh metadata. Without it the cache must stay
        // untouched: the next sync will re-upload rather than trust state
        // we could not verify.
        let meta = self
            .remote
            .get_metadata(remote)
            .await
            .map_err(SyncError::MetadataFetchFailed)?;

        self.commit_transfer(remote, &meta)?;
        self.scheduler.cancel(remote.as_str());

        // First-upload binding: adopt the uploaded path as the configured
        // remote when none was set.
        if self.prefs.remote_path().is_none() {
            self.prefs
                .set_remote_path(remote.as_str())
                .map_err(SyncError::TransferFailed)?;
            info!(remote = %remote, "Adopted uploaded path as configured remote");
        }

        Ok(())
    }

    /// The full guarded bidirectional synchronization pass.
    ///
    /// Guards, in order, each with its own reason: sync enabled (otherwise
    /// a no-op), network online, metered-network policy, configured remote
    /// path, resolvable local file, and the base-filename safety check.
    /// Only then does it compare remote state with the cache and the
    /// changed flag to pick a direction.
    pub async fn trigger_synchronization(
        &self,
        local_db: &Path,
    ) -> Result<SyncOutcome, SyncError> {
        if !self.prefs.is_sync_enabled() {
            debug!("Sync disabled; synchronization not attempted");
            return Ok(SyncOutcome::Disabled);
        }
        if !self.probe.is_online() {
            return Err(SyncError::Offline);
        }
        if self.prefs.wifi_only() && !self.probe.is_unmetered() {
            return Err(SyncError::WifiRequired);
        }
        let remote = self.remote_path().ok_or(SyncError::NotConfigured)?;
        if !local_db.exists() {
            return Err(SyncError::LocalFileMissing(local_db.to_path_buf()));
        }
        if !file_names_match(local_db, &remote) {
            let local_name = local_db
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            return Err(SyncError::FilenameMismatch {
                local: local_name,
                remote: remote.file_name().to_string(),
            });
        }

        let meta = self
            .remote
            .get_metadata(&remote)
            .await
            .map_err(SyncError::MetadataFetchFailed)?;

        if self.is_remote_file_modified(&meta) {
            info!(remote = %remote, "Remote file modified; downloading");
            let target = SyncTarget::new(local_db, remote);
            self.download(&target).await?;
            return Ok(SyncOutcome::Downloaded);
        }

        if self.prefs.local_file_changed() {
            info!(remote = %remote, "Local file changed; uploading");
            self.upload(local_db, &remote).await?;
            return Ok(SyncOutcome::Uploaded);
        }

        debug!(remote = %remote, "Neither side changed");
        Ok(SyncOutcome::UpToDate)
    }

    /// Explicit, user-directed upload of the local file to the configured
    /// remote path. Skips the filename safety check but is rejected while
    /// another transfer for the target is in flight.
    pub async fn trigger_upload(&self, local_db: &Path) -> Result<SyncOutcome, SyncError> {
        if !self.prefs.is_sync_enabled() {
            return Ok(SyncOutcome::Disabled);
        }
        if !self.probe.is_online() {
            return Err(SyncError::Offline);
        }
        if self.prefs.wifi_only() && !self.probe.is_unmetered() {
            return Err(SyncError::WifiRequired);
        }
        let remote = self.remote_path().ok_or(SyncError::NotConfigured)?;

        self.upload(local_db, &remote).await?;
        Ok(SyncOutcome::Uploaded)
    }

    /// Explicit, user-directed download of the configured remote file into
    /// the local sync directory.
    pub async fn trigger_download(&self) -> Result<SyncOutcome, SyncError> {
        if !self.prefs.is_sync_enabled() {
            return Ok(SyncOutcome::Disabled);
        }
        if !self.probe.is_online() {
            return Err(SyncError::Offline);
        }
        if self.prefs.wifi_only() && !self.probe.is_unmetered() {
            return Err(SyncError::WifiRequired);
        }
        let remote = self.remote_path().ok_or(SyncError::NotConfigured)?;

        let target = SyncTarget::in_sync_dir(&self.sync_dir, remote);
        self.download(&target).await?;
        Ok(SyncOutcome::Downloaded)
    }

    // ========================================================================
    // Session passthrough
    // ========================================================================

    /// Establishes a session with the remote store
    pub async fn login(&self) -> Result<(), SyncError> {
        self.remote.login().await.map_err(SyncError::CredentialError)
    }

    /// Terminates the session and clears cached credentials
    pub async fn logout(&self) -> Result<(), SyncError> {
        self.remote
            .logout()
            .await
            .map_err(SyncError::CredentialError)
    }

    /// Lists the files in a remote folder (for remote-file picking)
    pub async fn list_remote_folder(
        &self,
        folder: &str,
    ) -> Result<Vec<RemoteMetadata>, SyncError> {
        self.remote
            .list_contents(folder)
            .await
            .map_err(SyncError::TransferFailed)
    }

    // ========================================================================
    // Internals
    // ========================================================================

    /// Claims the per-target in-flight slot, or reports `TransferInFlight`
    fn begin_transfer(&self, target_id: &str) -> Result<TransferGuard<'_>, SyncError> {
        use dashmap::mapref::entry::Entry;

        match self.in_flight.entry(target_id.to_string()) {
            Entry::Occupied(_) => {
                warn!(target_id, "Transfer already in flight");
                Err(SyncError::TransferInFlight)
            }
            Entry::Vacant(slot) => {
                slot.insert(());
                Ok(TransferGuard {
                    in_flight: &self.in_flight,
                    target_id: target_id.to_string(),
                })
            }
        }
    }

    /// Writes downloaded content via temp file + atomic rename
    async fn write_local(&self, target: &Path, data: &[u8]) -> anyhow::Result<()> {
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let tmp_path = {
            let mut p = target.as_os_str().to_owned();
            p.push(".part");
            PathBuf::from(p)
        };

        tokio::fs::write(&tmp_path, data)
            .await
            .with_context(|| format!("Failed to write: {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, target)
            .await
            .with_context(|| format!("Failed to rename into: {}", target.display()))?;

        Ok(())
    }

    /// Commit step shared by upload and download: refresh credentials,
    /// record the confirmed modification time, clear the changed flag.
    /// Runs only after a fully confirmed transfer.
    fn commit_transfer(&self, remote: &RemotePath, meta: &RemoteMetadata) -> Result<(), SyncError> {
        self.remote
            .refresh_credential_cache()
            .map_err(SyncError::CredentialError)?;

        self.prefs
            .set_cached_modified_at(remote.as_str(), meta.modified_at)
            .map_err(SyncError::TransferFailed)?;
        self.prefs
            .set_local_file_changed(false)
            .map_err(SyncError::TransferFailed)?;

        debug!(
            remote = %remote,
            modified_at = %meta.modified_at,
            "Cached remote modification time"
        );
        Ok(())
    }
}

/// Releases the per-target in-flight slot when the transfer ends
struct TransferGuard<'a> {
    in_flight: &'a DashMap<String, ()>,
    target_id: String,
}

impl Drop for TransferGuard<'_> {
    fn drop(&mut self) {
        self.in_flight.remove(&self.target_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use ledgersync_core::config::Config;
    use ledgersync_core::ports::IPreferenceStore;
    use tokio::sync::Notify;

    // ------------------------------------------------------------------
    // Test doubles
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MockRemote {
        metadata: Mutex<Option<RemoteMetadata>>,
        content: Mutex<Vec<u8>>,
        fail_metadata: AtomicBool,
        fail_download: AtomicBool,
        fail_upload: AtomicBool,
        block_download: Mutex<Option<Arc<Notify>>>,
        upload_calls: AtomicUsize,
        metadata_calls: AtomicUsize,
        refresh_calls: AtomicUsize,
        uploaded: Mutex<Option<Vec<u8>>>,
    }

    impl MockRemote {
        fn with_metadata(path: &str, modified_at: chrono::DateTime<Utc>) -> Self {
            let remote = Self::default();
            *remote.metadata.lock().unwrap() = Some(RemoteMetadata {
                path: path.to_string(),
                modified_at,
                size: Some(64),
            });
            remote
        }
    }

    #[async_trait::async_trait]
    impl IRemoteStorage for MockRemote {
        async fn login(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn logout(&self) -> anyhow::Result<()> {
            Ok(())
        }

        async fn list_contents(&self, _folder: &str) -> anyhow::Result<Vec<RemoteMetadata>> {
            Ok(self.metadata.lock().unwrap().iter().cloned().collect())
        }

        async fn get_metadata(&self, path: &RemotePath) -> anyhow::Result<RemoteMetadata> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_metadata.load(Ordering::SeqCst) {
                anyhow::bail!("metadata unavailable");
            }
            self.metadata
                .lock()
                .unwrap()
                .clone()
                .filter(|m| m.path == path.as_str())
                .ok_or_else(|| anyhow::anyhow!("not found: {path}"))
        }

        async fn download(&self, _path: &RemotePath) -> anyhow::Result<Vec<u8>> {
            let gate = self.block_download.lock().unwrap().clone();
            if let Some(gate) = gate {
                gate.notified().await;
            }
            if self.fail_download.load(Ordering::SeqCst) {
                anyhow::bail!("connection reset");
            }
            Ok(self.content.lock().unwrap().clone())
        }

        async fn upload(
            &self,
            _path: &RemotePath,
            data: &[u8],
            _overwrite: bool,
        ) -> anyhow::Result<()> {
            self.upload_calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_upload.load(Ordering::SeqCst) {
                anyhow::bail!("connection reset");
            }
            *self.uploaded.lock().unwrap() = Some(data.to_vec());
            Ok(())
        }

        fn refresh_credential_cache(&self) -> anyhow::Result<()> {
            self.refresh_calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[derive(Default)]
    struct MemoryPrefs(Mutex<HashMap<String, String>>);

    impl IPreferenceStore for MemoryPrefs {
        fn get(&self, key: &str) -> Option<String> {
            self.0.lock().unwrap().get(key).cloned()
        }
        fn set(&self, key: &str, value: &str) -> anyhow::Result<()> {
            self.0
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }
        fn remove(&self, key: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().remove(key);
            Ok(())
        }
        fn clear(&self) -> anyhow::Result<()> {
            self.0.lock().unwrap().clear();
            Ok(())
        }
    }

    struct FixedProbe {
        online: bool,
        unmetered: bool,
    }

    impl INetworkProbe for FixedProbe {
        fn is_online(&self) -> bool {
            self.online
        }
        fn is_unmetered(&self) -> bool {
            self.unmetered
        }
    }

    #[derive(Default)]
    struct RecordingScheduler {
        armed: Mutex<HashMap<String, Duration>>,
        arm_calls: AtomicUsize,
        cancel_calls: AtomicUsize,
    }

    impl IUploadScheduler for RecordingScheduler {
        fn arm(&self, target_id: &str, delay: Duration) {
            self.arm_calls.fetch_add(1, Ordering::SeqCst);
            self.armed
                .lock()
                .unwrap()
                .insert(target_id.to_string(), delay);
        }
        fn cancel(&self, target_id: &str) {
            self.cancel_calls.fetch_add(1, Ordering::SeqCst);
            self.armed.lock().unwrap().remove(target_id);
        }
        fn is_armed(&self, target_id: &str) -> bool {
            self.armed.lock().unwrap().contains_key(target_id)
        }
    }

    // ------------------------------------------------------------------
    // Harness
    // ------------------------------------------------------------------

    struct Harness {
        remote: Arc<MockRemote>,
        prefs: Arc<MemoryPrefs>,
        scheduler: Arc<RecordingScheduler>,
        reconciler: Reconciler,
        _dir: tempfile::TempDir,
    }

    fn modified(h: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 1, h, 0, 0).unwrap()
    }

    fn harness(remote: MockRemote, online: bool, unmetered: bool) -> Harness {
        let dir = tempfile::tempdir().unwrap();
        let remote = Arc::new(remote);
        let prefs = Arc::new(MemoryPrefs::default());
        let scheduler = Arc::new(RecordingScheduler::default());
        let mut config = Config::default();
        config.sync.sync_dir = dir.path().join("sync");
        config.sync.upload_delay_secs = 5;

        let reconciler = Reconciler::new(
            remote.clone(),
            prefs.clone(),
            Arc::new(FixedProbe { online, unmetered }),
            scheduler.clone(),
            &config,
        );
        Harness {
            remote,
            prefs,
            scheduler,
            reconciler,
            _dir: dir,
        }
    }

    /// Enabled, online, unmetered, remote slot configured.
    fn active_harness(remote: MockRemote) -> Harness {
        let h = harness(remote, true, true);
        h.prefs.set_sync_enabled(true).unwrap();
        h.prefs.set_remote_path("Sync/budget.mmb").unwrap();
        h
    }

    fn write_local(h: &Harness, name: &str, content: &[u8]) -> PathBuf {
        let path = h._dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    // ------------------------------------------------------------------
    // Eligibility
    // ------------------------------------------------------------------

    #[test]
    fn test_disabled_gates_both_checks() {
        let h = harness(MockRemote::default(), true, true);
        h.prefs.set_remote_path("Sync/budget.mmb").unwrap();
        assert!(!h.reconciler.can_sync());
        assert!(!h.reconciler.is_active());
    }

    #[test]
    fn test_can_sync_ignores_connectivity() {
        let h = harness(MockRemote::default(), false, false);
        h.prefs.set_sync_enabled(true).unwrap();
        assert!(h.reconciler.can_sync());
        assert!(!h.reconciler.is_active());
    }

    #[test]
    fn test_wifi_only_on_metered_blocks_both() {
        let h = harness(MockRemote::default(), true, false);
        h.prefs.set_sync_enabled(true).unwrap();
        h.prefs.set_wifi_only(true).unwrap();
        h.prefs.set_remote_path("Sync/budget.mmb").unwrap();
        assert!(!h.reconciler.can_sync());
        assert!(!h.reconciler.is_active());
    }

    #[test]
    fn test_is_active_requires_remote_path() {
        let h = harness(MockRemote::default(), true, true);
        h.prefs.set_sync_enabled(true).unwrap();
        assert!(h.reconciler.can_sync());
        assert!(!h.reconciler.is_active());

        h.prefs.set_remote_path("Sync/budget.mmb").unwrap();
        assert!(h.reconciler.is_active());
    }

    // ------------------------------------------------------------------
    // Modification detection
    // ------------------------------------------------------------------

    #[test]
    fn test_missing_cache_counts_as_modified() {
        let h = active_harness(MockRemote::default());
        let meta = RemoteMetadata {
            path: "Sync/budget.mmb".to_string(),
            modified_at: modified(9),
            size: None,
        };
        assert!(h.reconciler.is_remote_file_modified(&meta));
    }

    #[test]
    fn test_matching_cache_is_unmodified() {
        let h = active_harness(MockRemote::default());
        h.prefs
            .set_cached_modified_at("Sync/budget.mmb", modified(9))
            .unwrap();
        let meta = RemoteMetadata {
            path: "Sync/budget.mmb".to_string(),
            modified_at: modified(9),
            size: None,
        };
        assert!(!h.reconciler.is_remote_file_modified(&meta));

        let newer = RemoteMetadata {
            modified_at: modified(10),
            ..meta
        };
        assert!(h.reconciler.is_remote_file_modified(&newer));
    }

    // ------------------------------------------------------------------
    // Change notification
    // ------------------------------------------------------------------

    #[test]
    fn test_rapid_changes_coalesce_into_one_armed_timer() {
        let h = active_harness(MockRemote::default());

        h.reconciler.on_local_change().unwrap();
        h.reconciler.on_local_change().unwrap();
        h.reconciler.on_local_change().unwrap();

        assert!(h.prefs.local_file_changed());
        assert!(h.scheduler.is_armed("Sync/budget.mmb"));
        assert_eq!(h.scheduler.armed.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_change_while_disabled_is_noop() {
        let h = harness(MockRemote::default(), true, true);
        h.prefs.set_remote_path("Sync/budget.mmb").unwrap();

        h.reconciler.on_local_change().unwrap();

        assert!(!h.prefs.local_file_changed());
        assert_eq!(h.scheduler.arm_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_change_with_auto_upload_disabled_sets_flag_only() {
        let h = active_harness(MockRemote::default());
        h.reconciler.disable_auto_upload();

        h.reconciler.on_local_change().unwrap();

        assert!(h.prefs.local_file_changed());
        assert_eq!(h.scheduler.arm_calls.load(Ordering::SeqCst), 0);

        h.reconciler.enable_auto_upload();
        h.reconciler.on_local_change().unwrap();
        assert!(h.scheduler.is_armed("Sync/budget.mmb"));
    }

    #[test]
    fn test_change_without_upload_immediately_sets_flag_only() {
        let h = active_harness(MockRemote::default());
        h.prefs.set_upload_immediately(false).unwrap();

        h.reconciler.on_local_change().unwrap();

        assert!(h.prefs.local_file_changed());
        assert_eq!(h.scheduler.arm_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_change_on_metered_with_wifi_only_sets_flag_only() {
        let h = harness(MockRemote::default(), true, false);
        h.prefs.set_sync_enabled(true).unwrap();
        h.prefs.set_wifi_only(true).unwrap();
        h.prefs.set_remote_path("Sync/budget.mmb").unwrap();

        h.reconciler.on_local_change().unwrap();

        assert!(h.prefs.local_file_changed());
        assert_eq!(h.scheduler.arm_calls.load(Ordering::SeqCst), 0);
    }

    // ------------------------------------------------------------------
    // Upload
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_upload_commits_cache_flag_and_timer() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        h.prefs.set_local_file_changed(true).unwrap();
        h.scheduler.arm("Sync/budget.mmb", Duration::from_secs(5));
        let local = write_local(&h, "budget.mmb", b"ledger");

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        h.reconciler.upload(&local, &remote).await.unwrap();

        assert_eq!(
            h.remote.uploaded.lock().unwrap().as_deref(),
            Some(b"ledger".as_slice())
        );
        assert!(!h.prefs.local_file_changed());
        assert_eq!(
            h.prefs.cached_modified_at("Sync/budget.mmb"),
            Some(modified(12))
        );
        assert!(!h.scheduler.is_armed("Sync/budget.mmb"));
        assert!(h.remote.refresh_calls.load(Ordering::SeqCst) >= 1);

        // The just-uploaded state must no longer look modified.
        let meta = h.remote.metadata.lock().unwrap().clone().unwrap();
        assert!(!h.reconciler.is_remote_file_modified(&meta));
    }

    #[tokio::test]
    async fn test_upload_missing_local_file_fails_fast() {
        let h = active_harness(MockRemote::default());
        let remote = RemotePath::new("Sync/budget.mmb").unwrap();

        let err = h
            .reconciler
            .upload(&h._dir.path().join("missing.mmb"), &remote)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::LocalFileMissing(_)));
        assert_eq!(h.remote.upload_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.remote.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_upload_metadata_failure_refreshes_creds_but_keeps_state() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        h.prefs.set_local_file_changed(true).unwrap();
        h.remote.fail_metadata.store(true, Ordering::SeqCst);
        let local = write_local(&h, "budget.mmb", b"ledger");

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let err = h.reconciler.upload(&local, &remote).await.unwrap_err();

        assert!(matches!(err, SyncError::MetadataFetchFailed(_)));
        // The transfer itself happened and credentials may have rotated.
        assert_eq!(h.remote.upload_calls.load(Ordering::SeqCst), 1);
        assert_eq!(h.remote.refresh_calls.load(Ordering::SeqCst), 1);
        // Unverified state stays untouched so the next pass re-uploads.
        assert!(h.prefs.local_file_changed());
        assert_eq!(h.prefs.cached_modified_at("Sync/budget.mmb"), None);
    }

    #[tokio::test]
    async fn test_upload_transfer_failure_leaves_state_untouched() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        h.prefs.set_local_file_changed(true).unwrap();
        h.remote.fail_upload.store(true, Ordering::SeqCst);
        let local = write_local(&h, "budget.mmb", b"ledger");

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let err = h.reconciler.upload(&local, &remote).await.unwrap_err();

        assert!(matches!(err, SyncError::TransferFailed(_)));
        assert!(h.prefs.local_file_changed());
        assert_eq!(h.prefs.cached_modified_at("Sync/budget.mmb"), None);
        assert_eq!(h.remote.refresh_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_first_upload_binds_remote_path() {
        let h = harness(
            MockRemote::with_metadata("Sync/budget.mmb", modified(12)),
            true,
            true,
        );
        h.prefs.set_sync_enabled(true).unwrap();
        assert_eq!(h.prefs.remote_path(), None);
        let local = write_local(&h, "budget.mmb", b"ledger");

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        h.reconciler.upload(&local, &remote).await.unwrap();

        assert_eq!(h.prefs.remote_path().as_deref(), Some("Sync/budget.mmb"));
    }

    // ------------------------------------------------------------------
    // Download
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_download_writes_file_and_commits() {
        let remote_store = MockRemote::with_metadata("Sync/budget.mmb", modified(15));
        *remote_store.content.lock().unwrap() = b"remote ledger".to_vec();
        let h = active_harness(remote_store);
        h.prefs.set_local_file_changed(true).unwrap();
        h.scheduler.arm("Sync/budget.mmb", Duration::from_secs(5));

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let target = SyncTarget::in_sync_dir(&h._dir.path().join("sync"), remote);
        h.reconciler.download(&target).await.unwrap();

        assert_eq!(
            std::fs::read(target.local()).unwrap(),
            b"remote ledger".to_vec()
        );
        assert!(!h.prefs.local_file_changed());
        assert_eq!(
            h.prefs.cached_modified_at("Sync/budget.mmb"),
            Some(modified(15))
        );
        assert!(!h.scheduler.is_armed("Sync/budget.mmb"));
    }

    #[tokio::test]
    async fn test_download_failure_leaves_state_untouched() {
        let remote_store = MockRemote::with_metadata("Sync/budget.mmb", modified(15));
        remote_store.fail_download.store(true, Ordering::SeqCst);
        let h = active_harness(remote_store);
        h.prefs.set_local_file_changed(true).unwrap();
        h.prefs
            .set_cached_modified_at("Sync/budget.mmb", modified(9))
            .unwrap();

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let target = SyncTarget::in_sync_dir(&h._dir.path().join("sync"), remote);
        let err = h.reconciler.download(&target).await.unwrap_err();

        assert!(matches!(err, SyncError::TransferFailed(_)));
        assert!(h.prefs.local_file_changed());
        assert_eq!(
            h.prefs.cached_modified_at("Sync/budget.mmb"),
            Some(modified(9))
        );
        assert!(!target.local().exists());
    }

    // ------------------------------------------------------------------
    // Guarded synchronization
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_sync_disabled_is_noop() {
        let h = harness(MockRemote::default(), true, true);
        let local = write_local(&h, "budget.mmb", b"ledger");

        let outcome = h.reconciler.trigger_synchronization(&local).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Disabled);
        assert_eq!(h.remote.metadata_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_offline_is_error() {
        let h = harness(MockRemote::default(), false, false);
        h.prefs.set_sync_enabled(true).unwrap();
        let local = write_local(&h, "budget.mmb", b"ledger");

        let err = h
            .reconciler
            .trigger_synchronization(&local)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Offline));
    }

    #[tokio::test]
    async fn test_sync_metered_with_wifi_only_is_error() {
        let h = harness(MockRemote::default(), true, false);
        h.prefs.set_sync_enabled(true).unwrap();
        h.prefs.set_wifi_only(true).unwrap();
        let local = write_local(&h, "budget.mmb", b"ledger");

        let err = h
            .reconciler
            .trigger_synchronization(&local)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::WifiRequired));
    }

    #[tokio::test]
    async fn test_sync_without_remote_path_is_error() {
        let h = harness(MockRemote::default(), true, true);
        h.prefs.set_sync_enabled(true).unwrap();
        let local = write_local(&h, "budget.mmb", b"ledger");

        let err = h
            .reconciler
            .trigger_synchronization(&local)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::NotConfigured));
    }

    #[tokio::test]
    async fn test_sync_filename_mismatch_aborts_without_side_effects() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        let local = write_local(&h, "other.mmb", b"ledger");

        let err = h
            .reconciler
            .trigger_synchronization(&local)
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::FilenameMismatch { .. }));
        assert!(!err.is_recoverable());
        assert_eq!(h.remote.metadata_calls.load(Ordering::SeqCst), 0);
        assert_eq!(h.remote.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_filename_match_is_case_insensitive() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        let local = write_local(&h, "BUDGET.MMB", b"ledger");

        let outcome = h.reconciler.trigger_synchronization(&local).await.unwrap();
        assert_eq!(outcome, SyncOutcome::Downloaded);
    }

    #[tokio::test]
    async fn test_sync_downloads_when_remote_modified() {
        let remote_store = MockRemote::with_metadata("Sync/budget.mmb", modified(15));
        *remote_store.content.lock().unwrap() = b"remote ledger".to_vec();
        let h = active_harness(remote_store);
        h.prefs
            .set_cached_modified_at("Sync/budget.mmb", modified(9))
            .unwrap();
        // Local changes are superseded by the newer remote copy.
        h.prefs.set_local_file_changed(true).unwrap();
        let local = write_local(&h, "budget.mmb", b"stale ledger");

        let outcome = h.reconciler.trigger_synchronization(&local).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Downloaded);
        assert_eq!(std::fs::read(&local).unwrap(), b"remote ledger".to_vec());
        assert_eq!(h.remote.upload_calls.load(Ordering::SeqCst), 0);
        assert!(!h.prefs.local_file_changed());
    }

    #[tokio::test]
    async fn test_sync_uploads_when_only_local_changed() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        h.prefs
            .set_cached_modified_at("Sync/budget.mmb", modified(12))
            .unwrap();
        h.prefs.set_local_file_changed(true).unwrap();
        let local = write_local(&h, "budget.mmb", b"edited ledger");

        let outcome = h.reconciler.trigger_synchronization(&local).await.unwrap();

        assert_eq!(outcome, SyncOutcome::Uploaded);
        assert_eq!(
            h.remote.uploaded.lock().unwrap().as_deref(),
            Some(b"edited ledger".as_slice())
        );
    }

    #[tokio::test]
    async fn test_sync_up_to_date_when_neither_changed() {
        let h = active_harness(MockRemote::with_metadata("Sync/budget.mmb", modified(12)));
        h.prefs
            .set_cached_modified_at("Sync/budget.mmb", modified(12))
            .unwrap();
        let local = write_local(&h, "budget.mmb", b"ledger");

        let outcome = h.reconciler.trigger_synchronization(&local).await.unwrap();

        assert_eq!(outcome, SyncOutcome::UpToDate);
        assert_eq!(h.remote.upload_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_sync_missing_local_file_is_error() {
        let h = active_harness(MockRemote::default());

        let err = h
            .reconciler
            .trigger_synchronization(&h._dir.path().join("budget.mmb"))
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::LocalFileMissing(_)));
    }

    // ------------------------------------------------------------------
    // In-flight exclusion
    // ------------------------------------------------------------------

    #[tokio::test]
    async fn test_concurrent_transfer_for_same_target_is_rejected() {
        let remote_store = MockRemote::with_metadata("Sync/budget.mmb", modified(15));
        let gate = Arc::new(Notify::new());
        *remote_store.block_download.lock().unwrap() = Some(gate.clone());
        let h = Arc::new(active_harness(remote_store));

        let remote = RemotePath::new("Sync/budget.mmb").unwrap();
        let target = SyncTarget::in_sync_dir(&h._dir.path().join("sync"), remote);

        let first = {
            let h = h.clone();
            let target = target.clone();
            tokio::spawn(async move { h.reconciler.download(&target).await })
        };
        // Let the first transfer claim the slot and park on the gate.
        tokio::task::yield_now().await;
        tokio::time::sleep(Duration::from_millis(20)).await;

        let err = h.reconciler.download(&target).await.unwrap_err();
        assert!(matches!(err, SyncError::TransferInFlight));

        gate.notify_one();
        first.await.unwrap().unwrap();

        // The slot is released once the transfer completes.
        gate.notify_one();
        h.reconciler.download(&target).await.unwrap();
    }

    // ------------------------------------------------------------------
    // Preferences
    // ------------------------------------------------------------------

    #[test]
    fn test_set_remote_path_validates() {
        let h = harness(MockRemote::default(), true, true);
        assert!(h.reconciler.set_remote_path("Sync/").is_err());
        assert!(h.reconciler.set_remote_path("").is_err());
        h.reconciler.set_remote_path("Sync/budget.mmb").unwrap();
        assert_eq!(h.prefs.remote_path().as_deref(), Some("Sync/budget.mmb"));
    }

    #[test]
    fn test_reset_preferences_clears_modification_cache() {
        let h = active_harness(MockRemote::default());
        h.prefs
            .set_cached_modified_at("Sync/budget.mmb", modified(9))
            .unwrap();
        h.prefs.set_local_file_changed(true).unwrap();

        h.reconciler.reset_preferences().unwrap();

        assert_eq!(h.prefs.cached_modified_at("Sync/budget.mmb"), None);
        assert!(!h.prefs.local_file_changed());
        assert_eq!(h.prefs.remote_path(), None);
        assert_eq!(h.remote.refresh_calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_local_path_for_remote_joins_sync_dir() {
        let h = active_harness(MockRemote::default());
        let expected = h._dir.path().join("sync").join("budget.mmb");
        assert_eq!(h.reconciler.local_path_for_remote(), Some(expected));
    }
}
