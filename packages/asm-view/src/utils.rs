use std::env;
use std::path::{Path, PathBuf};
use urlencoding::decode;

/// Turn the store location handed over by the UI into a directory path. Accepts plain
/// paths and `file://` URIs.
pub fn resolve_store_dir(source_path: &str) -> PathBuf {
    let mut path_str = source_path.to_string();

    if let Some(rest) = path_str.strip_prefix("file://") {
        let decoded = decode(rest).map(|s| s.into_owned()).unwrap_or_else(|_| rest.to_string());
        path_str = decoded;

        // On Windows, file:///C:/... becomes /C:/... so we need to strip the leading /
        if cfg!(windows) && path_str.starts_with('/') && path_str.chars().nth(2) == Some(':') {
            path_str.remove(0);
        }
    }

    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().unwrap_or_default().join(path)
    };

    // The directory may not exist yet; dunce only helps once it does (removes \\?\).
    dunce::canonicalize(&absolute).unwrap_or(absolute)
}
