//! Optional config file loading. Search order: ./ieltscrape.toml, then
//! $XDG_CONFIG_HOME/ieltscrape/config.toml (or ~/.config/ieltscrape/config.toml).

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Config file contents. All fields optional; only present keys override defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "snake_case", default)]
pub struct Config {
    /// Default output directory when -o is not set. Paths are relative to CWD.
    pub output_dir: Option<PathBuf>,
    /// HTTP User-Agent header.
    pub user_agent: Option<String>,
    /// Site root for listing URLs and detail links (default https://ielts.org).
    pub base_url: Option<String>,
    /// Pause in seconds after each detail-page fetch (default 1).
    pub detail_delay_secs: Option<u64>,
    /// Request timeout in seconds (default 30).
    pub timeout_secs: Option<u64>,
    /// Number of HTTP attempts for transient failures (default 1, no retry).
    pub retry_count: Option<u32>,
    /// Delay in seconds before each retry (e.g. [1, 2, 4]).
    pub retry_backoff_secs: Option<Vec<u64>>,
    /// What to do when a country's listing page cannot be fetched: skip (default) or abort.
    pub listing_errors: Option<String>,
}

const LOCAL_FILE_NAME: &str = "ieltscrape.toml";
const APP_DIR: &str = "ieltscrape";
const USER_FILE_NAME: &str = "config.toml";

/// Search order: (1) ./ieltscrape.toml, (2) $XDG_CONFIG_HOME/ieltscrape/config.toml.
/// Missing file returns Ok(None). Invalid TOML or I/O error reading a present file returns Err.
pub fn load_config() -> Result<Option<Config>, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Cannot determine current directory: {}", e))?;
    let paths = search_paths(&cwd, dirs::config_dir().as_deref());
    load_first(&paths)
}

/// Candidate config files, highest priority first.
fn search_paths(cwd: &Path, config_dir: Option<&Path>) -> Vec<PathBuf> {
    let mut paths = vec![cwd.join(LOCAL_FILE_NAME)];
    if let Some(d) = config_dir {
        paths.push(d.join(APP_DIR).join(USER_FILE_NAME));
    }
    paths
}

/// Parse the first existing file in `paths`. Later files are never read.
fn load_first(paths: &[PathBuf]) -> Result<Option<Config>, String> {
    let Some(path) = paths.iter().find(|p| p.exists()) else {
        return Ok(None);
    };
    let s = std::fs::read_to_string(path)
        .map_err(|e| format!("Cannot read config {}: {}", path.display(), e))?;
    let config: Config =
        toml::from_str(&s).map_err(|e| format!("Invalid config {}: {}", path.display(), e))?;
    tracing::debug!(path = %path.display(), "loaded config");
    Ok(Some(config))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let c: Config = toml::from_str("").unwrap();
        assert!(c.output_dir.is_none());
        assert!(c.user_agent.is_none());
        assert!(c.base_url.is_none());
        assert!(c.detail_delay_secs.is_none());
        assert!(c.timeout_secs.is_none());
        assert!(c.retry_count.is_none());
        assert!(c.retry_backoff_secs.is_none());
        assert!(c.listing_errors.is_none());
    }

    #[test]
    fn parse_full_config() {
        let s = r#"
            output_dir = "out"
            user_agent = "Custom/1.0"
            base_url = "http://localhost:8080"
            detail_delay_secs = 2
            timeout_secs = 60
            retry_count = 3
            retry_backoff_secs = [1, 2]
            listing_errors = "abort"
        "#;
        let c: Config = toml::from_str(s).unwrap();
        assert_eq!(c.output_dir.as_deref(), Some(std::path::Path::new("out")));
        assert_eq!(c.user_agent.as_deref(), Some("Custom/1.0"));
        assert_eq!(c.base_url.as_deref(), Some("http://localhost:8080"));
        assert_eq!(c.detail_delay_secs, Some(2));
        assert_eq!(c.timeout_secs, Some(60));
        assert_eq!(c.retry_count, Some(3));
        assert_eq!(c.retry_backoff_secs.as_deref(), Some([1, 2].as_slice()));
        assert_eq!(c.listing_errors.as_deref(), Some("abort"));
    }

    #[test]
    fn parse_partial_config() {
        let c: Config = toml::from_str("detail_delay_secs = 0").unwrap();
        assert_eq!(c.detail_delay_secs, Some(0));
        assert!(c.output_dir.is_none());
        assert!(c.timeout_secs.is_none());
    }

    #[test]
    fn invalid_toml_errors() {
        assert!(toml::from_str::<Config>("output_dir = [").is_err());
    }

    /// Fresh scratch directory with a local dir and a user config dir inside it.
    fn scratch(name: &str) -> (PathBuf, PathBuf) {
        let root = std::env::temp_dir().join(format!("ieltscrape_config_{}", name));
        let _ = std::fs::remove_dir_all(&root);
        let cwd = root.join("work");
        let user = root.join("user");
        std::fs::create_dir_all(&cwd).unwrap();
        std::fs::create_dir_all(user.join(APP_DIR)).unwrap();
        (cwd, user)
    }

    #[test]
    fn search_paths_local_then_user_dir() {
        let paths = search_paths(Path::new("/work"), Some(Path::new("/home/u/.config")));
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/work/ieltscrape.toml"),
                PathBuf::from("/home/u/.config/ieltscrape/config.toml"),
            ]
        );
        assert_eq!(search_paths(Path::new("/work"), None).len(), 1);
    }

    #[test]
    fn local_file_wins_over_user_file() {
        let (cwd, user) = scratch("local_wins");
        std::fs::write(cwd.join(LOCAL_FILE_NAME), "timeout_secs = 5").unwrap();
        std::fs::write(user.join(APP_DIR).join(USER_FILE_NAME), "timeout_secs = [").unwrap();
        let c = load_first(&search_paths(&cwd, Some(&user))).unwrap().unwrap();
        assert_eq!(c.timeout_secs, Some(5));
    }

    #[test]
    fn user_file_used_when_no_local_file() {
        let (cwd, user) = scratch("user_fallback");
        std::fs::write(
            user.join(APP_DIR).join(USER_FILE_NAME),
            "listing_errors = \"abort\"",
        )
        .unwrap();
        let c = load_first(&search_paths(&cwd, Some(&user))).unwrap().unwrap();
        assert_eq!(c.listing_errors.as_deref(), Some("abort"));
    }

    #[test]
    fn no_config_files_is_none() {
        let (cwd, user) = scratch("none");
        assert!(load_first(&search_paths(&cwd, Some(&user))).unwrap().is_none());
    }

    #[test]
    fn invalid_file_reports_its_path() {
        let (cwd, user) = scratch("invalid");
        std::fs::write(cwd.join(LOCAL_FILE_NAME), "output_dir = [").unwrap();
        let err = load_first(&search_paths(&cwd, Some(&user))).unwrap_err();
        assert!(err.contains("Invalid config"));
        assert!(err.contains(LOCAL_FILE_NAME));
    }
}
