use std::io::ErrorKind;
use std::path::PathBuf;
use std::{env, fs, io};

use serde::Deserialize;

const DEFAULT_URL_PREFIX: &str = "/webpage";
const DEFAULT_HOME_POST_COUNT: u32 = 5;
const DEFAULT_POST_FILE_NAME: &str = "post.html";
const REGISTRY_FILE_NAME: &str = "posts.db";

#[derive(Deserialize)]
pub struct Paths {
    /// Site root. The home page is written here as index.html.
    pub base_dir: PathBuf,
    /// Root of the published posts tree, one subdirectory per category.
    pub posts_dir: PathBuf,
    pub template_dir: PathBuf,
    /// Where the registry database lives.
    pub data_dir: PathBuf,
    /// Search root for media referenced from markdown sources. Defaults
    /// to the directory of the source file.
    pub media_dir: Option<PathBuf>,
}

#[derive(Deserialize)]
pub struct Site {
    pub url_prefix: Option<String>,
    pub home_post_count: Option<u32>,
    pub post_file_name: Option<String>,
}

#[derive(Deserialize)]
pub struct Log {
    pub level: LogLevel,
    pub log_to_console: bool,
    pub location: Option<PathBuf>,
}

#[derive(Deserialize, Copy, Clone)]
pub enum LogLevel {
    Critical = 0,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

#[derive(Deserialize)]
pub struct Config {
    pub paths: Paths,
    pub site: Site,
    pub log: Option<Log>,
}

impl Config {
    pub fn registry_path(&self) -> PathBuf {
        self.paths.data_dir.join(REGISTRY_FILE_NAME)
    }

    pub fn url_prefix(&self) -> &str {
        match self.site.url_prefix.as_deref() {
            Some(prefix) => prefix.trim_end_matches('/'),
            None => DEFAULT_URL_PREFIX,
        }
    }

    pub fn home_post_count(&self) -> u32 {
        self.site.home_post_count.unwrap_or(DEFAULT_HOME_POST_COUNT)
    }

    pub fn post_file_name(&self) -> &str {
        self.site.post_file_name.as_deref().unwrap_or(DEFAULT_POST_FILE_NAME)
    }
}

fn parse_path(path: PathBuf) -> PathBuf {
    if path.starts_with("${exe_dir}") {
        let cur_exe = env::current_exe().unwrap();
        let exe_dir = cur_exe.parent().unwrap().to_str().unwrap();
        let str_path = path.to_str().unwrap();
        PathBuf::from(str_path.replace("${exe_dir}", exe_dir))
    } else {
        path
    }
}

pub fn read_config(cfg_path: &PathBuf) -> io::Result<Config> {
    let cfg_content = match fs::read_to_string(cfg_path) {
        Ok(content) => content,
        Err(e) => return Err(io::Error::new(e.kind(), format!("Error opening configuration file {}: {}", cfg_path.to_str().unwrap(), e))),
    };

    let mut cfg: Config = match toml::from_str::<Config>(cfg_content.as_str()) {
        Ok(cfg) => cfg,
        Err(e) => return Err(io::Error::new(
            ErrorKind::InvalidData, format!("Error parsing configuration file: {}", e))),
    };

    cfg.paths = Paths {
        base_dir: parse_path(cfg.paths.base_dir),
        posts_dir: parse_path(cfg.paths.posts_dir),
        template_dir: parse_path(cfg.paths.template_dir),
        data_dir: parse_path(cfg.paths.data_dir),
        media_dir: cfg.paths.media_dir.map(parse_path),
    };

    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    const FULL_CONFIG: &str = r#"
[paths]
base_dir = "/srv/site"
posts_dir = "/srv/site/webpage"
template_dir = "${exe_dir}/templates"
data_dir = "/srv/site/data"

[site]
url_prefix = "/webpage/"
home_post_count = 3
post_file_name = "index.html"

[log]
level = "Info"
log_to_console = true
"#;

    const MINIMAL_CONFIG: &str = r#"
[paths]
base_dir = "site"
posts_dir = "site/webpage"
template_dir = "site/templates"
data_dir = "site/data"

[site]
"#;

    fn write_config(tmp: &TempDir, content: &str) -> PathBuf {
        let path = tmp.path().join("postsmith.toml");
        fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_read_full_config() {
        let tmp = TempDir::new().unwrap();
        let cfg = read_config(&write_config(&tmp, FULL_CONFIG)).unwrap();

        assert_eq!(cfg.paths.base_dir, PathBuf::from("/srv/site"));
        assert_eq!(cfg.paths.media_dir, None);
        assert_eq!(cfg.home_post_count(), 3);
        assert_eq!(cfg.post_file_name(), "index.html");
        // A trailing slash in the prefix would double up in links.
        assert_eq!(cfg.url_prefix(), "/webpage");
        assert!(cfg.log.is_some());
        assert_eq!(cfg.registry_path(), PathBuf::from("/srv/site/data/posts.db"));
    }

    #[test]
    fn test_exe_dir_substitution() {
        let tmp = TempDir::new().unwrap();
        let cfg = read_config(&write_config(&tmp, FULL_CONFIG)).unwrap();

        let template_dir = cfg.paths.template_dir.to_str().unwrap();
        assert!(!template_dir.contains("${exe_dir}"));
        assert!(template_dir.ends_with("/templates"));
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let cfg = read_config(&write_config(&tmp, MINIMAL_CONFIG)).unwrap();

        assert_eq!(cfg.url_prefix(), "/webpage");
        assert_eq!(cfg.home_post_count(), 5);
        assert_eq!(cfg.post_file_name(), "post.html");
        assert!(cfg.log.is_none());
    }

    #[test]
    fn test_missing_config_file() {
        let tmp = TempDir::new().unwrap();
        let err = read_config(&tmp.path().join("nope.toml")).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_config_file() {
        let tmp = TempDir::new().unwrap();
        let path = write_config(&tmp, "[paths]\nbase_dir = 42");
        let err = read_config(&path).err().unwrap();
        assert_eq!(err.kind(), ErrorKind::InvalidData);
    }
}
