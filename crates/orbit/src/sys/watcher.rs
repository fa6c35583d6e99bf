use crate::config::ConfigError;
use crate::events::AppEvent;
use async_channel::Sender;
use notify::{EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Watches the parent directories of `layout_files` (and of `config_file`)
/// and forwards changes to those exact files as events. Returns when the
/// receiving side goes away.
pub async fn run_async_watcher(
    layout_files: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    tx: Sender<AppEvent>,
) -> Result<(), ConfigError> {
    let dirs: BTreeSet<PathBuf> = layout_files
        .iter()
        .chain(config_file.iter())
        .filter_map(|p| p.parent().map(|d| d.to_path_buf()))
        .collect();

    let (bridge_tx, bridge_rx) = async_channel::unbounded();
    let mut watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| {
            let _ = bridge_tx.send_blocking(res);
        },
        notify::Config::default(),
    )?;

    for dir in &dirs {
        if let Err(e) = fs_err::create_dir_all(dir) {
            log::error!("Failed to create {} for watching: {}", dir.display(), e);
            continue;
        }
        watcher.watch(dir, RecursiveMode::NonRecursive)?;
        log::debug!("Watching {}", dir.display());
    }

    while let Ok(res) = bridge_rx.recv().await {
        let event = match res {
            Ok(event) => event,
            Err(e) => {
                log::error!("Watch error: {}", e);
                continue;
            }
        };
        if !matches!(
            event.kind,
            EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
        ) {
            continue;
        }

        for path in &event.paths {
            let app_event = if config_file.as_ref() == Some(path) {
                AppEvent::ConfigReload
            } else if layout_files.contains(path) {
                AppEvent::LayoutChanged(path.clone())
            } else {
                continue;
            };
            if tx.send(app_event).await.is_err() {
                return Ok(());
            }
        }
    }
    Ok(())
}
