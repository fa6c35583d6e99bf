use std::path::PathBuf;

#[derive(Debug, Clone)]
pub enum AppEvent {
    LayoutChanged(PathBuf),
    ConfigReload,
}
