use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::plan::TaskKind;

/// Development tasks for the game workspace.
#[derive(Debug, Parser)]
#[command(name = "devtask", version)]
pub struct Cli {
    /// Game project root (defaults to $DEVTASK_ROOT, then the nearest
    /// ancestor holding Cargo.toml and assets/).
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,
    /// Print the steps instead of running them.
    #[arg(long, global = true)]
    pub dry_run: bool,
    /// Game name used for the default save directory (defaults to
    /// $DEVTASK_GAME, then the root directory's name).
    #[arg(long, global = true)]
    pub game: Option<String>,
    #[command(subcommand)]
    pub task: TaskCommand,
}

#[derive(Debug, Subcommand)]
pub enum TaskCommand {
    /// cargo check
    Check,
    /// cargo build
    Build {
        #[arg(long)]
        release: bool,
    },
    /// cargo run
    Run {
        #[arg(long)]
        release: bool,
    },
    /// Run the game with the level editor enabled.
    Editor,
    /// Run the game on the wasm32 target.
    Wasm,
    /// Run the game starting at a level from the level index.
    Level {
        /// Print the available levels as `<identifier>\t<label>` and exit.
        #[arg(long, conflicts_with = "name")]
        list: bool,
        /// Level identifier or label.
        #[arg(required_unless_present = "list")]
        name: Option<String>,
    },
    /// cargo clean
    Clean,
    /// cargo clippy
    Clippy,
    /// cargo fmt
    Fmt {
        #[arg(long)]
        check: bool,
    },
    /// Delete the game's save directory.
    DeleteSave,
    /// Move files ending with a suffix from one directory into another.
    MoveAssets {
        from: PathBuf,
        to: PathBuf,
        #[arg(long)]
        suffix: String,
    },
}

impl TaskCommand {
    /// `None` for `level --list`, which prints instead of planning.
    pub fn into_task_kind(self) -> Option<TaskKind> {
        let kind = match self {
            TaskCommand::Check => TaskKind::Check,
            TaskCommand::Build { release } => TaskKind::Build { release },
            TaskCommand::Run { release } => TaskKind::Run { release },
            TaskCommand::Editor => TaskKind::Editor,
            TaskCommand::Wasm => TaskKind::Wasm,
            TaskCommand::Level { name: Some(name), list: false } => TaskKind::Level { name },
            TaskCommand::Level { .. } => return None,
            TaskCommand::Clean => TaskKind::Clean,
            TaskCommand::Clippy => TaskKind::Clippy,
            TaskCommand::Fmt { check } => TaskKind::Fmt { check },
            TaskCommand::DeleteSave => TaskKind::DeleteSave,
            TaskCommand::MoveAssets { from, to, suffix } => {
                TaskKind::MoveAssets { from, to, suffix }
            }
        };
        Some(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("devtask").chain(args.iter().copied()))
            .expect("parse")
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_work_after_subcommand() {
        let cli = parse(&["build", "--release", "--dry-run", "--root", "/game"]);
        assert!(cli.dry_run);
        assert_eq!(cli.root, Some(PathBuf::from("/game")));
        assert_eq!(
            cli.task.into_task_kind(),
            Some(TaskKind::Build { release: true })
        );
    }

    #[test]
    fn game_name_is_global() {
        let cli = parse(&["delete-save", "--game", "mixnmech"]);
        assert_eq!(cli.game.as_deref(), Some("mixnmech"));
        assert_eq!(parse(&["check"]).game, None);
    }

    #[test]
    fn check_and_wasm_tasks() {
        assert_eq!(parse(&["check"]).task.into_task_kind(), Some(TaskKind::Check));
        assert_eq!(parse(&["wasm"]).task.into_task_kind(), Some(TaskKind::Wasm));
    }

    #[test]
    fn level_takes_name_or_list() {
        let cli = parse(&["level", "old mill"]);
        assert_eq!(
            cli.task.into_task_kind(),
            Some(TaskKind::Level {
                name: "old mill".to_string()
            })
        );
        let cli = parse(&["level", "--list"]);
        assert_eq!(cli.task.into_task_kind(), None);

        let argv = ["devtask", "level"];
        assert!(Cli::try_parse_from(argv).is_err());
        let argv = ["devtask", "level", "--list", "old_mill"];
        assert!(Cli::try_parse_from(argv).is_err());
    }

    #[test]
    fn kebab_case_task_names() {
        let cli = parse(&["delete-save"]);
        assert_eq!(cli.task.into_task_kind(), Some(TaskKind::DeleteSave));

        let cli = parse(&["move-assets", "dl", "assets/sprites", "--suffix", ".png"]);
        assert_eq!(
            cli.task.into_task_kind(),
            Some(TaskKind::MoveAssets {
                from: PathBuf::from("dl"),
                to: PathBuf::from("assets/sprites"),
                suffix: ".png".to_string(),
            })
        );

        let argv = ["devtask", "move-assets", "dl", "out"];
        assert!(Cli::try_parse_from(argv).is_err());
    }
}
