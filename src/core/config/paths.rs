use std::env;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub user_data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub reports_dir: PathBuf,
    pub uploads_dir: PathBuf,
    pub db_path: PathBuf,
    pub secrets_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let user_data_dir = discover_user_data_dir(&project_root);
        let log_dir = user_data_dir.join("logs");
        let reports_dir = user_data_dir.join("reports");
        let uploads_dir = user_data_dir.join("uploads");
        let db_path = user_data_dir.join("directive_index.db");
        let secrets_path = user_data_dir.join("secrets.yaml");

        for dir in [&user_data_dir, &log_dir, &reports_dir, &uploads_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            user_data_dir,
            log_dir,
            reports_dir,
            uploads_dir,
            db_path,
            secrets_path,
        }
    }

    /// Paths rooted in a scratch directory, for tests.
    #[cfg(test)]
    pub fn for_test(root: &Path) -> Self {
        let user_data_dir = root.to_path_buf();
        let log_dir = user_data_dir.join("logs");
        let reports_dir = user_data_dir.join("reports");
        let uploads_dir = user_data_dir.join("uploads");
        for dir in [&user_data_dir, &log_dir, &reports_dir, &uploads_dir] {
            let _ = fs::create_dir_all(dir);
        }
        AppPaths {
            project_root: root.to_path_buf(),
            db_path: user_data_dir.join("directive_index.db"),
            secrets_path: user_data_dir.join("secrets.yaml"),
            user_data_dir,
            log_dir,
            reports_dir,
            uploads_dir,
        }
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("VIGIE_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_user_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("VIGIE_DATA_DIR") {
        return PathBuf::from(dir);
    }

    if cfg!(debug_assertions) {
        return project_root.to_path_buf();
    }

    if cfg!(target_os = "windows") {
        let base = env::var("LOCALAPPDATA")
            .unwrap_or_else(|_| env::var("USERPROFILE").unwrap_or_else(|_| ".".to_string()));
        return PathBuf::from(base).join("Vigie");
    }

    if cfg!(target_os = "macos") {
        return home_dir()
            .join("Library")
            .join("Application Support")
            .join("Vigie");
    }

    let xdg = env::var("XDG_DATA_HOME").unwrap_or_else(|_| {
        home_dir()
            .join(".local/share")
            .to_string_lossy()
            .to_string()
    });
    PathBuf::from(xdg).join("vigie")
}

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
}
