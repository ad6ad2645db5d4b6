use crate::config;
use anyhow::{Context, Result};
use std::any::Any;
use std::fs::OpenOptions;
use std::panic;
use std::path::{Path, PathBuf};

/// Sends log output to a file under `root`; the terminal belongs to the
/// dashboard. `RUST_LOG` overrides the default `info` filter.
pub fn init(root: &Path) -> Result<PathBuf> {
    config::ensure_config_dir(root)?;
    let path = config::log_path(root);
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("failed to open log file {}", path.display()))?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Pipe(Box::new(file)))
        .try_init()
        .context("logger already initialised")?;
    Ok(path)
}

/// Routes panic reports to the log file. The default hook would print them
/// over the dashboard, even for panics the poll and command workers catch.
pub fn install_panic_hook() {
    panic::set_hook(Box::new(|info| {
        let place = info
            .location()
            .map(|location| format!(" at {}:{}", location.file(), location.line()))
            .unwrap_or_default();
        log::error!("panic{place}: {}", panic_text(info.payload()));
    }));
}

fn panic_text(payload: &(dyn Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        *text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text.as_str()
    } else {
        "non-text panic payload"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn panic_payloads_become_text() {
        let literal = panic::catch_unwind(|| panic!("bridge gone")).expect_err("panics");
        assert_eq!(panic_text(literal.as_ref()), "bridge gone");

        let formatted =
            panic::catch_unwind(|| panic!("volume {} out of range", 120)).expect_err("panics");
        assert_eq!(panic_text(formatted.as_ref()), "volume 120 out of range");

        let other = panic::catch_unwind(|| panic::panic_any(7_u8)).expect_err("panics");
        assert_eq!(panic_text(other.as_ref()), "non-text panic payload");
    }

    #[test]
    fn init_creates_log_file_under_root() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("logs");
        // Another test may already own the global logger; the file is opened first.
        let _ = init(&root);
        assert!(config::log_path(&root).exists());
    }
}
