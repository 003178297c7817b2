//! Command-line interface for kanban
//!
//! This module defines the CLI structure using clap derive macros.
//! Board commands live in `task`; the interactive session in `shell`.

use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing::debug;

use crate::config::{self, Config, DATA_DIR_ENV};
use crate::error::Result;
use crate::output::OutputOptions;
use crate::persistence::TaskPersistence;
use crate::seed;
use crate::storage::FileStore;
use crate::task::TaskStore;

mod shell;
mod task;

/// kanban - local task board
///
/// Organize tasks into To Do, In Progress, In Review and Done columns,
/// filter and search them, and keep an eye on board statistics.
#[derive(Parser, Debug)]
#[command(name = "kanban")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Directory holding board data (defaults to the platform data dir)
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Do not add sample tasks to an empty board
    #[arg(long, global = true)]
    pub no_seed: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Board(BoardCommand),

    /// Interactive session with periodic auto-save
    Shell,
}

/// Commands that act on the board; shared by the CLI and the shell
#[derive(Subcommand, Debug)]
pub enum BoardCommand {
    /// Create a task
    Add {
        /// Task title
        title: String,

        /// Longer description
        #[arg(short, long)]
        description: Option<String>,

        /// Column: todo, progress, review, done
        #[arg(short, long)]
        status: Option<String>,

        /// Priority: low, medium, high, critical
        #[arg(short, long)]
        priority: Option<String>,

        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<String>,

        /// Person responsible
        #[arg(short, long)]
        assignee: Option<String>,

        /// Comma-separated labels (e.g. "bug, mobile")
        #[arg(short, long)]
        labels: Option<String>,
    },

    /// Change fields of a task
    Edit {
        /// Task ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,

        /// New column
        #[arg(short, long)]
        status: Option<String>,

        /// New priority
        #[arg(short, long)]
        priority: Option<String>,

        /// New due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,

        /// New assignee
        #[arg(short, long, conflicts_with = "clear_assignee")]
        assignee: Option<String>,

        /// Remove the assignee
        #[arg(long)]
        clear_assignee: bool,

        /// Replace labels (comma-separated)
        #[arg(short, long)]
        labels: Option<String>,
    },

    /// Move a task to another column
    Move {
        /// Task ID
        id: String,

        /// Target column: todo, progress, review, done
        status: String,
    },

    /// Delete a task
    Rm {
        /// Task ID
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show one task
    Show {
        /// Task ID
        id: String,
    },

    /// List tasks grouped by column
    List {
        /// Only this column ("all" for every column)
        #[arg(short, long, default_value = "all")]
        status: String,

        /// Only this priority ("all" for every priority)
        #[arg(short, long, default_value = "all")]
        priority: String,

        /// Case-insensitive text in title, description, assignee or labels
        #[arg(long, default_value = "")]
        search: String,
    },

    /// Show board statistics
    Stats,

    /// Write all tasks to a dated JSON file
    Export {
        /// Output directory (defaults to export.dir or the working directory)
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Remove every task and start a new board
    Clear {
        /// Confirm clearing the board
        #[arg(long)]
        yes: bool,
    },
}

impl BoardCommand {
    /// Name used in JSON envelopes
    pub fn name(&self) -> &'static str {
        match self {
            BoardCommand::Add { .. } => "add",
            BoardCommand::Edit { .. } => "edit",
            BoardCommand::Move { .. } => "move",
            BoardCommand::Rm { .. } => "rm",
            BoardCommand::Show { .. } => "show",
            BoardCommand::List { .. } => "list",
            BoardCommand::Stats => "stats",
            BoardCommand::Export { .. } => "export",
            BoardCommand::Clear { .. } => "clear",
        }
    }
}

/// An opened board: configuration plus the task store over the data dir
#[derive(Debug)]
pub struct Board {
    pub store: TaskStore,
    pub config: Config,
    pub data_dir: PathBuf,
    pending_warnings: Vec<String>,
}

impl Board {
    /// Open the board in `data_dir`, seeding it when empty and `seed` allows
    pub fn open(data_dir: PathBuf, seed: bool) -> Result<Self> {
        let files = FileStore::new(&data_dir);
        files.init()?;
        let config = Config::find(files.root())?;
        let persistence = TaskPersistence::with_key(files, config.storage.tasks_key.clone());
        let mut store = TaskStore::open(persistence);
        debug!(dir = %data_dir.display(), tasks = store.len(), "opened board");

        let mut pending_warnings: Vec<String> = store.take_load_warning().into_iter().collect();
        if seed && config.seed.enabled {
            if let Some(seeded) = seed::seed_if_empty(&mut store, Utc::now())? {
                pending_warnings.extend(seeded.save_warning);
            }
        }

        Ok(Self {
            store,
            config,
            data_dir,
            pending_warnings,
        })
    }

    /// Warnings raised while opening, handed to the first command's output
    pub(crate) fn take_warnings(&mut self) -> Vec<String> {
        std::mem::take(&mut self.pending_warnings)
    }
}

/// Run one board command and print its result
pub fn execute(board: &mut Board, command: BoardCommand, output: OutputOptions) -> Result<()> {
    match command {
        BoardCommand::Add {
            title,
            description,
            status,
            priority,
            due,
            assignee,
            labels,
        } => task::run_add(
            board,
            task::AddOptions {
                title,
                description,
                status,
                priority,
                due,
                assignee,
                labels,
            },
            output,
        ),
        BoardCommand::Edit {
            id,
            title,
            description,
            status,
            priority,
            due,
            clear_due,
            assignee,
            clear_assignee,
            labels,
        } => task::run_edit(
            board,
            task::EditOptions {
                id,
                title,
                description,
                status,
                priority,
                due,
                clear_due,
                assignee,
                clear_assignee,
                labels,
            },
            output,
        ),
        BoardCommand::Move { id, status } => {
            task::run_move(board, task::MoveOptions { id, status }, output)
        }
        BoardCommand::Rm { id, yes } => task::run_rm(board, task::RmOptions { id, yes }, output),
        BoardCommand::Show { id } => task::run_show(board, task::ShowOptions { id }, output),
        BoardCommand::List {
            status,
            priority,
            search,
        } => task::run_list(
            board,
            task::ListOptions {
                status,
                priority,
                search,
            },
            output,
        ),
        BoardCommand::Stats => task::run_stats(board, output),
        BoardCommand::Export { out } => {
            task::run_export(board, task::ExportOptions { out }, output)
        }
        BoardCommand::Clear { yes } => task::run_clear(board, task::ClearOptions { yes }, output),
    }
}

impl Cli {
    /// Execute the CLI command
    pub fn run(self) -> Result<()> {
        let output = OutputOptions {
            json: self.json,
            quiet: self.quiet,
        };
        let data_dir = config::resolve_data_dir(self.data_dir.as_deref());
        let mut board = Board::open(data_dir, !self.no_seed)?;

        match self.command {
            Commands::Board(command) => execute(&mut board, command, output),
            Commands::Shell => shell::run(board, output),
        }
    }
}
