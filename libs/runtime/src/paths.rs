use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Platform base for per-user data: the roaming data dir on Windows, the
/// home directory elsewhere.
fn platform_base() -> Result<PathBuf> {
    let base = if cfg!(target_os = "windows") {
        dirs::data_dir()
    } else {
        dirs::home_dir()
    };
    base.context("cannot determine the user's home directory")
}

fn expand_tilde(raw: &str) -> Result<PathBuf> {
    if raw == "~" {
        return platform_base();
    }
    if let Some(rest) = raw.strip_prefix("~/").or_else(|| raw.strip_prefix("~\\")) {
        return Ok(platform_base()?.join(rest));
    }
    Ok(PathBuf::from(raw))
}

/// Resolves the application home directory to an absolute path.
///
/// `None` means `<platform base>/<default_subdir>`; `~` is expanded and
/// relative paths are anchored at the current directory. With `create`, the
/// directory is created when missing.
pub fn resolve_home_dir(
    configured: Option<String>,
    default_subdir: &str,
    create: bool,
) -> Result<PathBuf> {
    let path = match configured {
        Some(raw) => expand_tilde(raw.trim())?,
        None => platform_base()?.join(default_subdir),
    };
    let path = if path.is_absolute() {
        path
    } else {
        std::env::current_dir()
            .context("cannot read current directory")?
            .join(path)
    };

    if create {
        std::fs::create_dir_all(&path)
            .with_context(|| format!("cannot create home dir {}", path.display()))?;
    }
    Ok(path)
}

/// Joins a relative path onto `base`; absolute paths are returned unchanged.
pub fn resolve_under(base: &Path, file: &str) -> PathBuf {
    let p = Path::new(file);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base.join(p)
    }
}
