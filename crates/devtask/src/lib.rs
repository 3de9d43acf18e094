use std::env;
use std::io::{self, Write};

use level_index::{resolve_level_options, LevelIndexError};
use thiserror::Error;
use tracing::info;

pub mod cli;
pub mod exec;
pub mod paths;
pub mod plan;

pub use cli::{Cli, TaskCommand};
pub use exec::{execute_plan, ExecError};
pub use paths::{
    resolve_project_paths, PathsError, ProjectPaths, GAME_ENV_VAR, ROOT_ENV_VAR,
    SAVE_DIR_ENV_VAR,
};
pub use plan::{
    build_task_plan, select_level, ExternalCommand, PlanError, TaskKind, TaskPlan, TaskStep,
    Toolchain,
};

pub const CARGO_ENV_VAR: &str = "CARGO";
/// `RUST_LOG` handed to the game by `run`, `editor` and `level`.
pub const GAME_LOG_ENV_VAR: &str = "DEVTASK_GAME_LOG";

#[derive(Debug, Error)]
pub enum TaskError {
    #[error(transparent)]
    Paths(#[from] PathsError),
    #[error(transparent)]
    LevelIndex(#[from] LevelIndexError),
    #[error(transparent)]
    Plan(#[from] PlanError),
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

pub fn run<W: Write>(cli: Cli, stdout: &mut W) -> Result<(), TaskError> {
    let paths = resolve_project_paths(cli.root.as_deref(), cli.game.as_deref())?;
    info!(
        root = %paths.root.display(),
        level_index = %paths.level_index.display(),
        save_dir = %paths.save_dir.display(),
        "project_paths_resolved"
    );

    let Some(task) = cli.task.into_task_kind() else {
        return list_levels(&paths, stdout);
    };

    let plan = build_task_plan(&task, &paths, &toolchain_from_env())?;
    if cli.dry_run {
        writeln!(stdout, "{}", plan.render_human_readable()).map_err(TaskError::Output)?;
        return Ok(());
    }
    execute_plan(&plan)?;
    info!(task = ?task, step_count = plan.steps.len(), "task_finished");
    Ok(())
}

fn list_levels<W: Write>(paths: &ProjectPaths, stdout: &mut W) -> Result<(), TaskError> {
    let options = resolve_level_options(&paths.level_index)?;
    for option in &options {
        writeln!(stdout, "{}\t{}", option.identifier, option.label).map_err(TaskError::Output)?;
    }
    Ok(())
}

fn toolchain_from_env() -> Toolchain {
    let defaults = Toolchain::default();
    Toolchain {
        cargo: non_empty_env(CARGO_ENV_VAR).unwrap_or(defaults.cargo),
        game_log_filter: non_empty_env(GAME_LOG_ENV_VAR).unwrap_or(defaults.game_log_filter),
    }
}

fn non_empty_env(var: &str) -> Option<String> {
    env::var(var).ok().filter(|value| !value.trim().is_empty())
}
