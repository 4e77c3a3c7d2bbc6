use anyhow::{Context, Result, anyhow};
use log::debug;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{self, Receiver},
};

/// Watches one profile file. Editors often replace files instead of writing
/// in place, so the parent directory is watched and events are filtered by
/// file name.
pub struct ProfileWatcher {
    _watcher: RecommendedWatcher,
    rx: Receiver<()>,
}

impl ProfileWatcher {
    pub fn start(path: &Path) -> Result<Self> {
        let dir = path
            .parent()
            .ok_or_else(|| anyhow!("profile path has no parent: {}", path.display()))?;
        let name = path
            .file_name()
            .ok_or_else(|| anyhow!("profile path has no file name: {}", path.display()))?
            .to_owned();

        let (tx, rx) = mpsc::channel();
        let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
            let Ok(event) = res else { return };
            if !(event.kind.is_modify() || event.kind.is_create()) {
                return;
            }
            let touches_profile = event
                .paths
                .iter()
                .any(|p: &PathBuf| p.file_name() == Some(name.as_os_str()));
            if touches_profile {
                debug!("profile change: {:?}", event.kind);
                let _ = tx.send(());
            }
        })?;
        watcher
            .watch(dir, RecursiveMode::NonRecursive)
            .with_context(|| format!("failed to watch {}", dir.display()))?;

        Ok(Self {
            _watcher: watcher,
            rx,
        })
    }

    /// True if the file changed since the last call. Coalesces bursts.
    pub fn changed(&self) -> bool {
        let mut any = false;
        while self.rx.try_recv().is_ok() {
            any = true;
        }
        any
    }
}
