//! Enclosing-mount resolution and removal watching.

use crate::MountHandle;
use crate::error::MountError;
use crate::mountinfo::{MountEntry, find_enclosing, parse_mountinfo};
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::watch;

const MOUNTINFO_PATH: &str = "/proc/self/mountinfo";
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Resolves locations to [`MountHandle`]s and watches resolved mounts for
/// removal by polling the mount table.
#[derive(Debug, Clone)]
pub struct MountMonitor {
    mountinfo_path: PathBuf,
    poll_interval: Duration,
}

impl Default for MountMonitor {
    fn default() -> Self {
        Self::new(DEFAULT_POLL_INTERVAL)
    }
}

impl MountMonitor {
    pub fn new(poll_interval: Duration) -> Self {
        Self {
            mountinfo_path: PathBuf::from(MOUNTINFO_PATH),
            poll_interval,
        }
    }

    /// Point the monitor at an alternate mountinfo file.
    pub fn with_mountinfo_path(mut self, path: PathBuf) -> Self {
        self.mountinfo_path = path;
        self
    }

    /// Resolve a location (path or `file://` URI) to its enclosing mount and
    /// start watching that mount for removal.
    pub fn resolve(&self, location: &str) -> Result<MountHandle, MountError> {
        let path = parse_location(location)?;
        let path = std::fs::canonicalize(&path)
            .map_err(|_| MountError::NotFound(location.to_string()))?;

        let entries = self.read_mount_table()?;
        let entry = find_enclosing(&entries, &path)
            .ok_or_else(|| MountError::NotFound(location.to_string()))?
            .clone();

        tracing::info!(
            "Resolved {} to mount {} at {:?}",
            location,
            entry.id,
            entry.mount_point
        );

        let (tx, rx) = watch::channel(false);
        let handle = MountHandle::new(
            entry.mount_point.clone(),
            display_name(&entry),
            Some(icon_name(&entry).to_string()),
            rx,
        );

        tokio::spawn(watch_for_removal(
            self.mountinfo_path.clone(),
            self.poll_interval,
            entry.id,
            tx,
        ));

        Ok(handle)
    }

    fn read_mount_table(&self) -> Result<Vec<MountEntry>, MountError> {
        let content = std::fs::read_to_string(&self.mountinfo_path)?;
        Ok(parse_mountinfo(&content))
    }
}

/// Poll the mount table until the watched id disappears, then fire the
/// removal channel. Stops early when no subscriber is left.
async fn watch_for_removal(
    mountinfo_path: PathBuf,
    poll_interval: Duration,
    mount_id: u32,
    tx: watch::Sender<bool>,
) {
    let mut interval = tokio::time::interval(poll_interval);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = interval.tick() => {}
            _ = tx.closed() => {
                tracing::debug!("No subscribers left for mount {}, stopping watcher", mount_id);
                return;
            }
        }

        let content = match std::fs::read_to_string(&mountinfo_path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read mount table: {}", err);
                continue;
            }
        };

        let still_mounted = parse_mountinfo(&content)
            .iter()
            .any(|entry| entry.id == mount_id);

        if !still_mounted {
            tracing::info!("Mount {} removed", mount_id);
            let _ = tx.send(true);
            return;
        }
    }
}

/// Turn a location argument into a filesystem path. Accepts plain paths and
/// `file://` URIs; any other scheme is rejected.
fn parse_location(location: &str) -> Result<PathBuf, MountError> {
    if let Some(rest) = location.strip_prefix("file://") {
        // Strip an authority component if present; only localhost-style URIs
        // make sense here.
        let path = match rest.find('/') {
            Some(0) => rest,
            Some(idx) => &rest[idx..],
            None => {
                return Err(MountError::InvalidLocation(location.to_string()));
            }
        };
        return Ok(PathBuf::from(percent_decode(path)));
    }

    if location.contains("://") {
        return Err(MountError::InvalidLocation(location.to_string()));
    }
    if location.is_empty() {
        return Err(MountError::InvalidLocation(location.to_string()));
    }

    Ok(PathBuf::from(location))
}

fn percent_decode(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;

    while i < bytes.len() {
        if bytes[i] == b'%' && i + 2 < bytes.len() {
            let hi = (bytes[i + 1] as char).to_digit(16);
            let lo = (bytes[i + 2] as char).to_digit(16);
            if let (Some(hi), Some(lo)) = (hi, lo) {
                out.push((hi * 16 + lo) as u8);
                i += 3;
                continue;
            }
        }
        out.push(bytes[i]);
        i += 1;
    }

    String::from_utf8_lossy(&out).into_owned()
}

fn display_name(entry: &MountEntry) -> String {
    entry
        .mount_point
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| entry.source.clone())
}

fn icon_name(entry: &MountEntry) -> &'static str {
    let removable = entry.mount_point.starts_with("/media")
        || entry.mount_point.starts_with("/run/media");
    if removable {
        "drive-removable-media"
    } else {
        "drive-harddisk"
    }
}
