//! kanban - Local Task Board Library
//!
//! This library provides the task state engine behind the kanban CLI: the
//! task collection, filtering, statistics and durable local storage.
//!
//! # Core Concepts
//!
//! - **Tasks**: Work items with status, priority, due date, assignee and labels
//! - **Columns**: To Do, In Progress, In Review and Done, derived from status
//! - **Write-through**: Every mutation is persisted immediately
//! - **Soft loading**: Missing or corrupt data opens as an empty board
//!
//! # Module Organization
//!
//! - `task`: Task model and the task store (create, update, move, delete)
//! - `persistence`: Serialization of the collection under the tasks key
//! - `storage`: Key-value stores (directory-backed and in-memory)
//! - `lock`: File locking and atomic writes for concurrency safety
//! - `query`: Status, priority and text filtering
//! - `stats`: Board statistics and completion rate
//! - `seed`: Sample tasks for a first run
//! - `export`: Dated JSON export files
//! - `autosave`: Periodic safety-net saves for long sessions
//! - `config`: Configuration loading from `kanban.toml`
//! - `output`: Human and JSON output for CLI commands
//! - `cli`: Command-line interface using clap
//! - `error`: Error types and result aliases

pub mod autosave;
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod lock;
pub mod output;
pub mod persistence;
pub mod query;
pub mod seed;
pub mod stats;
pub mod storage;
pub mod task;

pub use error::{Error, Result};
