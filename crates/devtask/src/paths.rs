use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use level_index::LEVEL_INDEX_RELATIVE_PATH;
use thiserror::Error;

pub const ROOT_ENV_VAR: &str = "DEVTASK_ROOT";
pub const SAVE_DIR_ENV_VAR: &str = "DEVTASK_SAVE_DIR";
pub const GAME_ENV_VAR: &str = "DEVTASK_GAME";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectPaths {
    pub root: PathBuf,
    pub level_index: PathBuf,
    pub save_dir: PathBuf,
}

impl ProjectPaths {
    /// Lays out the well-known paths under an already validated root.
    pub fn for_root(root: PathBuf, save_dir: PathBuf) -> Self {
        let level_index = root.join(LEVEL_INDEX_RELATIVE_PATH);
        Self {
            root,
            level_index,
            save_dir,
        }
    }
}

#[derive(Debug, Error)]
pub enum PathsError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error(
        "no per-user data directory on this platform to hold the {game} save\n\
Set {env_var} to the save directory."
    )]
    NoDataDir { game: String, env_var: &'static str },
    #[error("failed to resolve current directory: {0}")]
    CurrentDir(#[source] std::io::Error),
    #[error(
        "{path} is not a game project root\n\
A valid root must contain Cargo.toml and an assets/ directory."
    )]
    InvalidRoot { path: PathBuf },
    #[error(
        "Could not detect the game project root by walking upward from {start_dir}\n\
Expected a directory containing Cargo.toml and an assets/ directory.\n\
Pass --root or set {env_var}, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/game\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

/// Resolves the project layout. An explicit root wins over `DEVTASK_ROOT`,
/// which wins over searching upward from the current directory.
///
/// The save directory is `DEVTASK_SAVE_DIR`, else the game's folder in the
/// per-user data directory (`~/.local/share/<game>` on Linux). The game name
/// is `explicit_game`, else `DEVTASK_GAME`, else derived from the root's name.
pub fn resolve_project_paths(
    explicit_root: Option<&Path>,
    explicit_game: Option<&str>,
) -> Result<ProjectPaths, PathsError> {
    let root = match explicit_root {
        Some(path) => validated_root(path)?,
        None => resolve_root_from_env()?,
    };
    let save_dir = match read_env_path(SAVE_DIR_ENV_VAR)? {
        Some(path) => path,
        None => {
            let game = match explicit_game {
                Some(game) => game.to_string(),
                None => match read_env_var(GAME_ENV_VAR)? {
                    Some(game) => game,
                    None => game_name_from_root(&root),
                },
            };
            default_save_dir(dirs::data_dir(), &game)?
        }
    };
    Ok(ProjectPaths::for_root(root, save_dir))
}

/// `Mix-n-Mech` becomes `mixnmech`: lowercase ASCII letters and digits only.
pub(crate) fn game_name_from_root(root: &Path) -> String {
    root.file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default()
        .chars()
        .filter(char::is_ascii_alphanumeric)
        .map(|c| c.to_ascii_lowercase())
        .collect()
}

fn default_save_dir(data_dir: Option<PathBuf>, game: &str) -> Result<PathBuf, PathsError> {
    match data_dir {
        Some(data_dir) if !game.is_empty() => Ok(data_dir.join(game)),
        _ => Err(PathsError::NoDataDir {
            game: game.to_string(),
            env_var: SAVE_DIR_ENV_VAR,
        }),
    }
}

fn resolve_root_from_env() -> Result<PathBuf, PathsError> {
    match read_env_path(ROOT_ENV_VAR)? {
        Some(path) => validated_root(&path),
        None => {
            let cwd = env::current_dir().map_err(PathsError::CurrentDir)?;
            find_root_upward(&cwd)
        }
    }
}

fn read_env_var(var: &'static str) -> Result<Option<String>, PathsError> {
    match env::var(var) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(env::VarError::NotPresent) => Ok(None),
        Err(source) => Err(PathsError::EnvVar { var, source }),
    }
}

fn read_env_path(var: &'static str) -> Result<Option<PathBuf>, PathsError> {
    Ok(read_env_var(var)?.map(PathBuf::from))
}

fn validated_root(path: &Path) -> Result<PathBuf, PathsError> {
    let normalized = normalize_path(path);
    if is_project_root(&normalized) {
        Ok(normalized)
    } else {
        Err(PathsError::InvalidRoot { path: normalized })
    }
}

pub(crate) fn find_root_upward(start_dir: &Path) -> Result<PathBuf, PathsError> {
    for candidate in start_dir.ancestors() {
        if is_project_root(candidate) {
            return Ok(normalize_path(candidate));
        }
    }
    Err(PathsError::RootNotFound {
        start_dir: normalize_path(start_dir),
        env_var: ROOT_ENV_VAR,
    })
}

fn is_project_root(path: &Path) -> bool {
    path.join("Cargo.toml").is_file() && path.join("assets").is_dir()
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
