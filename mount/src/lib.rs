//! Mount identity and lifecycle for removable media.
//!
//! Resolves a user-supplied location (a path or a `file://` URI) to the
//! enclosing mount via `/proc/self/mountinfo`, and watches for that mount
//! disappearing so an in-flight interaction can be torn down.

mod error;
mod monitor;
mod mountinfo;

pub use error::MountError;
pub use monitor::MountMonitor;
pub use mountinfo::{MountEntry, find_enclosing, parse_mountinfo};

use std::path::{Path, PathBuf};
use tokio::sync::watch;

/// A reference to a mounted volume, valid for one prompt interaction.
///
/// The handle itself does not own the mount; it carries the identity needed
/// to present and run an autorun program, plus the removal channel fed by the
/// [`MountMonitor`] watcher task.
#[derive(Debug, Clone)]
pub struct MountHandle {
    root: PathBuf,
    name: String,
    icon_name: Option<String>,
    removed: watch::Receiver<bool>,
}

impl MountHandle {
    pub fn new(
        root: PathBuf,
        name: String,
        icon_name: Option<String>,
        removed: watch::Receiver<bool>,
    ) -> Self {
        Self {
            root,
            name,
            icon_name,
            removed,
        }
    }

    /// Root directory of the mounted volume.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Human-readable name for prompts.
    pub fn display_name(&self) -> &str {
        &self.name
    }

    /// Icon hint for the presentation layer, if one could be derived.
    pub fn icon_name(&self) -> Option<&str> {
        self.icon_name.as_deref()
    }

    /// Subscribe to the mount's removal notification.
    pub fn subscribe_unmount(&self) -> UnmountSubscription {
        UnmountSubscription {
            removed: Some(self.removed.clone()),
        }
    }
}

/// A claim on the mount's removal notification.
///
/// Must be released exactly once per interaction; releasing again is a no-op,
/// and a released subscription never resolves.
#[derive(Debug)]
pub struct UnmountSubscription {
    removed: Option<watch::Receiver<bool>>,
}

impl UnmountSubscription {
    /// Resolves once the mount has been removed. Pends forever after
    /// [`release`](Self::release).
    pub async fn unmounted(&mut self) {
        match self.removed.as_mut() {
            Some(rx) => {
                // An error means the watcher is gone without having fired;
                // treat that the same as "never removed".
                if rx.wait_for(|removed| *removed).await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Drop the claim on removal notifications. Idempotent.
    pub fn release(&mut self) {
        if self.removed.take().is_some() {
            tracing::debug!("Released unmount subscription");
        }
    }

    pub fn is_released(&self) -> bool {
        self.removed.is_none()
    }
}
