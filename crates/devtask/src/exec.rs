use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};

use thiserror::Error;
use tracing::info;

use crate::plan::{ExternalCommand, TaskPlan, TaskStep};

#[derive(Debug, Error)]
pub enum ExecError {
    #[error("failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },
    #[error("`{command_line}` exited with {status}")]
    CommandFailed {
        command_line: String,
        status: ExitStatus,
    },
    #[error("failed to remove directory {path}: {source}")]
    RemoveDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to move {from} to {to}: {source}")]
    MoveFile {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Runs every step in order, stopping at the first one that fails.
pub fn execute_plan(plan: &TaskPlan) -> Result<(), ExecError> {
    let step_count = plan.steps.len();
    for (index, step) in plan.steps.iter().enumerate() {
        match step {
            TaskStep::Spawn(command) => {
                info!(
                    step = index + 1,
                    step_count,
                    cwd = %command.cwd.display(),
                    cmd = %command.command_line(),
                    "task_step_spawn"
                );
                run_external(command)?;
            }
            TaskStep::RemoveDir { path } => {
                info!(step = index + 1, step_count, path = %path.display(), "task_step_remove_dir");
                remove_dir_if_present(path)?;
            }
            TaskStep::MoveFile { from, to } => {
                info!(
                    step = index + 1,
                    step_count,
                    from = %from.display(),
                    to = %to.display(),
                    "task_step_move_file"
                );
                move_file_replacing(from, to)?;
            }
        }
    }
    Ok(())
}

fn run_external(command: &ExternalCommand) -> Result<(), ExecError> {
    let status = Command::new(&command.program)
        .args(&command.args)
        .envs(command.env.iter().map(|(key, value)| (key, value)))
        .current_dir(&command.cwd)
        .status()
        .map_err(|source| ExecError::Spawn {
            program: command.program.clone(),
            source,
        })?;
    if status.success() {
        Ok(())
    } else {
        Err(ExecError::CommandFailed {
            command_line: command.command_line(),
            status,
        })
    }
}

fn remove_dir_if_present(path: &Path) -> Result<(), ExecError> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            info!(path = %path.display(), "remove_dir_already_absent");
            Ok(())
        }
        Err(source) => Err(ExecError::RemoveDir {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Moves `from` onto `to`. An existing `to` is only replaced once the new
/// contents are complete, so a failed move leaves it untouched.
fn move_file_replacing(from: &Path, to: &Path) -> Result<(), ExecError> {
    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent).map_err(|source| ExecError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let move_err = |source| ExecError::MoveFile {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    };
    if fs::rename(from, to).is_ok() {
        return Ok(());
    }

    // rename cannot cross filesystems; stage a copy next to `to` instead
    let tmp_path = temp_path_for(to);
    if let Err(error) = fs::copy(from, &tmp_path).and_then(|_| fs::rename(&tmp_path, to)) {
        let _ = fs::remove_file(&tmp_path);
        return Err(move_err(error));
    }
    fs::remove_file(from).map_err(move_err)
}

fn temp_path_for(path: &Path) -> PathBuf {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("asset");
    let tmp_name = format!("{file_name}.tmp");
    match path.parent() {
        Some(parent) => parent.join(tmp_name),
        None => PathBuf::from(tmp_name),
    }
}
