use crate::events::AppEvent;
use std::path::PathBuf;
use std::time::Duration;
use tokio::runtime::Runtime;

/// Change notifications often arrive in bursts for a single save.
const SETTLE: Duration = Duration::from_millis(150);

/// Blocks on a file watcher, calling `handle` once per burst of changes.
pub fn watch_blocking(
    layout_files: Vec<PathBuf>,
    config_file: Option<PathBuf>,
    mut handle: impl FnMut(&[AppEvent]),
) -> anyhow::Result<()> {
    let rt = Runtime::new()?;

    rt.block_on(async {
        let (tx, rx) = async_channel::bounded(32);
        let watcher = tokio::spawn(crate::sys::watcher::run_async_watcher(
            layout_files,
            config_file,
            tx,
        ));

        while let Ok(first) = rx.recv().await {
            let mut batch = vec![first];
            tokio::time::sleep(SETTLE).await;
            while let Ok(next) = rx.try_recv() {
                batch.push(next);
            }
            handle(&batch);
        }

        watcher.await??;
        Ok::<(), anyhow::Error>(())
    })
}
