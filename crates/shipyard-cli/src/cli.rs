use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};
use shipyard_core::models::{AppStatus, IdeaStatus, TaskPriority, TaskStatus};
use shipyard_core::EntityKind;

#[derive(Parser)]
#[command(name = "shipyard")]
#[command(about = "Track side projects from the command line, online or off")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Optional path to local database file
    #[arg(long, global = true, value_name = "PATH")]
    pub db_path: Option<PathBuf>,

    /// Behave as if the network were down: writes queue up, sync is refused
    #[arg(long, global = true)]
    pub offline: bool,

    /// Owner id for new records (defaults to SHIPYARD_USER_ID)
    #[arg(long, global = true, value_name = "ID")]
    pub user: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Manage apps
    App {
        #[command(subcommand)]
        command: AppCommand,
    },
    /// Manage the idea backlog
    Idea {
        #[command(subcommand)]
        command: IdeaCommand,
    },
    /// Manage tasks of an app
    Task {
        #[command(subcommand)]
        command: TaskCommand,
    },
    /// Manage notes
    Note {
        #[command(subcommand)]
        command: NoteCommand,
    },
    /// Show changes waiting to be pushed
    Queue {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Push queued changes to the server
    Sync {
        /// Output the sync report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Run the cache worker and replay the queue in the background
    Watch,
    /// Refresh the local copy from the server
    Pull {
        /// Only pull this collection
        #[arg(long, value_enum)]
        kind: Option<KindArg>,
    },
}

#[derive(Subcommand)]
pub enum AppCommand {
    /// Create a new app
    #[command(alias = "new")]
    Add {
        /// App name
        name: Vec<String>,
        #[arg(long)]
        description: Option<String>,
        /// Public URL
        #[arg(long)]
        url: Option<String>,
    },
    /// List apps
    List {
        #[arg(long)]
        status: Option<AppStatus>,
        /// Number of apps to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Move an app to another lifecycle stage
    Status {
        /// App ID or unique ID prefix
        id: String,
        status: AppStatus,
    },
    /// Delete an app
    Delete {
        /// App ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum IdeaCommand {
    /// Capture a new idea
    #[command(alias = "new")]
    Add {
        /// Idea title
        title: Vec<String>,
        #[arg(long)]
        description: Option<String>,
    },
    /// List ideas
    List {
        #[arg(long)]
        status: Option<IdeaStatus>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Delete an idea
    Delete {
        /// Idea ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum TaskCommand {
    /// Add a task to an app
    #[command(alias = "new")]
    Add {
        /// Owning app ID
        #[arg(long)]
        app: String,
        /// Task title
        title: Vec<String>,
        #[arg(long)]
        priority: Option<TaskPriority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
    },
    /// List tasks
    List {
        /// Only tasks of this app
        #[arg(long)]
        app: Option<String>,
        #[arg(long)]
        status: Option<TaskStatus>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Mark a task as done
    Done {
        /// Task ID or unique ID prefix
        id: String,
    },
    /// Delete a task
    Delete {
        /// Task ID or unique ID prefix
        id: String,
    },
}

#[derive(Subcommand)]
pub enum NoteCommand {
    /// Write a new note
    #[command(alias = "new")]
    Add {
        /// Note title
        title: Vec<String>,
        /// Note body
        #[arg(long, default_value = "")]
        content: String,
        /// Attach the note to an app
        #[arg(long)]
        app: Option<String>,
        /// Pin the note
        #[arg(long)]
        pin: bool,
    },
    /// List notes
    List {
        /// Only notes of this app
        #[arg(long)]
        app: Option<String>,
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(long)]
        json: bool,
    },
    /// Delete a note
    Delete {
        /// Note ID or unique ID prefix
        id: String,
    },
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum KindArg {
    Apps,
    Ideas,
    Tasks,
    Notes,
}

impl From<KindArg> for EntityKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Apps => Self::Apps,
            KindArg::Ideas => Self::Ideas,
            KindArg::Tasks => Self::Tasks,
            KindArg::Notes => Self::Notes,
        }
    }
}
