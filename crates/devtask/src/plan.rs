use std::fs;
use std::path::{Path, PathBuf};

use level_index::{resolve_level_options, LevelIndexError, LevelOption};
use thiserror::Error;

use crate::paths::ProjectPaths;

pub const WASM_TARGET: &str = "wasm32-unknown-unknown";
pub const DEFAULT_GAME_LOG_FILTER: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskKind {
    Check,
    Build { release: bool },
    Run { release: bool },
    Editor,
    Level { name: String },
    Wasm,
    Clean,
    Clippy,
    Fmt { check: bool },
    DeleteSave,
    MoveAssets {
        from: PathBuf,
        to: PathBuf,
        suffix: String,
    },
}

/// The cargo binary and the environment handed to the game when it runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub cargo: String,
    /// `RUST_LOG` for game runs.
    pub game_log_filter: String,
}

impl Default for Toolchain {
    fn default() -> Self {
        Self {
            cargo: "cargo".to_string(),
            game_log_filter: DEFAULT_GAME_LOG_FILTER.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalCommand {
    pub program: String,
    pub args: Vec<String>,
    /// Set on top of the inherited environment.
    pub env: Vec<(String, String)>,
    pub cwd: PathBuf,
}

impl ExternalCommand {
    fn cargo(toolchain: &Toolchain, root: &Path, args: &[&str]) -> Self {
        Self {
            program: toolchain.cargo.clone(),
            args: args.iter().map(ToString::to_string).collect(),
            env: Vec::new(),
            cwd: root.to_path_buf(),
        }
    }

    fn with_env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.to_string(), value.to_string()));
        self
    }

    /// Environment a game run gets: full backtraces and the configured log filter.
    fn for_game_run(self, toolchain: &Toolchain) -> Self {
        self.with_env("RUST_LOG", &toolchain.game_log_filter)
            .with_env("RUST_BACKTRACE", "1")
    }

    pub fn command_line(&self) -> String {
        let mut line = String::new();
        for (key, value) in &self.env {
            line.push_str(&format!("{key}={value} "));
        }
        line.push_str(&self.program);
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStep {
    Spawn(ExternalCommand),
    RemoveDir { path: PathBuf },
    MoveFile { from: PathBuf, to: PathBuf },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskPlan {
    pub steps: Vec<TaskStep>,
}

impl TaskPlan {
    pub fn render_human_readable(&self) -> String {
        if self.steps.is_empty() {
            return "steps=0".to_string();
        }
        let mut output = format!("steps={}", self.steps.len());
        for step in &self.steps {
            output.push('\n');
            match step {
                TaskStep::Spawn(command) => output.push_str(&format!(
                    "spawn cwd={} cmd={}",
                    command.cwd.display(),
                    command.command_line()
                )),
                TaskStep::RemoveDir { path } => {
                    output.push_str(&format!("remove_dir path={}", path.display()))
                }
                TaskStep::MoveFile { from, to } => output.push_str(&format!(
                    "move_file from={} to={}",
                    from.display(),
                    to.display()
                )),
            }
        }
        output
    }
}

#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    LevelIndex(#[from] LevelIndexError),
    #[error("unknown level '{name}' (available: {available})")]
    UnknownLevel { name: String, available: String },
    #[error("asset suffix cannot be empty")]
    EmptySuffix,
    #[error("asset source directory does not exist: {path}")]
    AssetSourceMissing { path: PathBuf },
    #[error("asset source and destination are the same directory: {path}")]
    SameAssetDirectory { path: PathBuf },
    #[error("failed to read directory {path}: {source}")]
    ReadDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to read directory entry in {path}: {source}")]
    ReadDirEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn build_task_plan(
    task: &TaskKind,
    paths: &ProjectPaths,
    toolchain: &Toolchain,
) -> Result<TaskPlan, PlanError> {
    let root = paths.root.as_path();
    let command = match task {
        TaskKind::Check => ExternalCommand::cargo(toolchain, root, &["check", "-q"]),
        TaskKind::Build { release } => {
            ExternalCommand::cargo(toolchain, root, &with_profile("build", *release))
        }
        TaskKind::Run { release } => {
            ExternalCommand::cargo(toolchain, root, &with_profile("run", *release))
                .for_game_run(toolchain)
        }
        TaskKind::Editor => ExternalCommand::cargo(toolchain, root, &["run", "--", "--editor"])
            .for_game_run(toolchain),
        TaskKind::Level { name } => {
            let options = resolve_level_options(&paths.level_index)?;
            let selected = select_level(&options, name)?;
            let args = ["run", "--", "--level", selected.identifier.as_str()];
            ExternalCommand::cargo(toolchain, root, &args).for_game_run(toolchain)
        }
        TaskKind::Wasm => {
            ExternalCommand::cargo(toolchain, root, &["run", "--target", WASM_TARGET])
                .with_env("RUST_BACKTRACE", "1")
        }
        TaskKind::Clean => ExternalCommand::cargo(toolchain, root, &["clean"]),
        TaskKind::Clippy => ExternalCommand::cargo(toolchain, root, &["clippy"]),
        TaskKind::Fmt { check } => {
            let args: &[&str] = if *check {
                &["fmt", "--", "--check"]
            } else {
                &["fmt"]
            };
            ExternalCommand::cargo(toolchain, root, args)
        }
        TaskKind::DeleteSave => {
            return Ok(TaskPlan {
                steps: vec![TaskStep::RemoveDir {
                    path: paths.save_dir.clone(),
                }],
            })
        }
        TaskKind::MoveAssets { from, to, suffix } => {
            return Ok(TaskPlan {
                steps: plan_asset_moves(from, to, suffix)?,
            })
        }
    };
    Ok(TaskPlan {
        steps: vec![TaskStep::Spawn(command)],
    })
}

fn with_profile(subcommand: &str, release: bool) -> Vec<&str> {
    if release {
        vec![subcommand, "--release"]
    } else {
        vec![subcommand]
    }
}

/// Picks the option named by `name`. An identifier match anywhere in the
/// list beats a label match; ties go to the earliest entry.
pub fn select_level<'a>(
    options: &'a [LevelOption],
    name: &str,
) -> Result<&'a LevelOption, PlanError> {
    options
        .iter()
        .find(|option| option.identifier == name)
        .or_else(|| options.iter().find(|option| option.label == name))
        .ok_or_else(|| PlanError::UnknownLevel {
            name: name.to_string(),
            available: if options.is_empty() {
                "none".to_string()
            } else {
                options
                    .iter()
                    .map(|option| option.identifier.as_str())
                    .collect::<Vec<_>>()
                    .join(", ")
            },
        })
}

/// One move per matching file anywhere under `from`, keeping its path
/// relative to `from`. Ordered by that relative path.
fn plan_asset_moves(from: &Path, to: &Path, suffix: &str) -> Result<Vec<TaskStep>, PlanError> {
    if suffix.is_empty() {
        return Err(PlanError::EmptySuffix);
    }
    if !from.is_dir() {
        return Err(PlanError::AssetSourceMissing {
            path: from.to_path_buf(),
        });
    }
    if to.is_dir() && same_dir(from, to) {
        return Err(PlanError::SameAssetDirectory {
            path: from.to_path_buf(),
        });
    }

    let mut matching = Vec::<(PathBuf, PathBuf)>::new();
    collect_recursive(from, from, suffix, &mut matching)?;
    matching.sort_by(|(a, _), (b, _)| a.cmp(b));

    Ok(matching
        .into_iter()
        .map(|(rel, path)| TaskStep::MoveFile {
            from: path,
            to: to.join(rel),
        })
        .collect())
}

fn collect_recursive(
    root: &Path,
    current: &Path,
    suffix: &str,
    files: &mut Vec<(PathBuf, PathBuf)>,
) -> Result<(), PlanError> {
    let entries = fs::read_dir(current).map_err(|source| PlanError::ReadDir {
        path: current.to_path_buf(),
        source,
    })?;

    for entry in entries {
        let entry = entry.map_err(|source| PlanError::ReadDirEntry {
            path: current.to_path_buf(),
            source,
        })?;
        // symlinks are neither followed nor moved
        let file_type = entry.file_type().map_err(|source| PlanError::ReadDirEntry {
            path: current.to_path_buf(),
            source,
        })?;
        let path = entry.path();
        if file_type.is_dir() {
            collect_recursive(root, &path, suffix, files)?;
            continue;
        }
        if !file_type.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.ends_with(suffix));
        if !matches {
            continue;
        }
        let Ok(rel) = path.strip_prefix(root) else {
            continue;
        };
        files.push((rel.to_path_buf(), path));
    }
    Ok(())
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
