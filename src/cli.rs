use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "taskpad", about = "Personal task list", version)]
pub struct Cli {
    /// Path to the SQLite database [default: ~/.taskpad/taskpad.db]
    #[arg(long, env = "TASKPAD_DB", global = true)]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Add a task
    Add {
        /// What needs doing
        text: String,
        /// Free-form notes
        #[arg(short, long, default_value = "")]
        notes: String,
        /// Due date (YYYY-MM-DD, today, tomorrow)
        #[arg(short, long)]
        date: Option<String>,
        /// Category tag
        #[arg(short, long, default_value = "General")]
        category: String,
        /// Priority (high, medium, low)
        #[arg(short, long, default_value = "medium")]
        priority: String,
        /// Print the created task as JSON
        #[arg(long)]
        json: bool,
    },

    /// List tasks
    List {
        /// Case-insensitive text to look for in text, notes and category
        #[arg(short, long, default_value = "")]
        search: String,
        /// Status filter (all, completed, pending, today, overdue)
        #[arg(short, long, default_value = "all")]
        filter: String,
        /// Only tasks with this priority
        #[arg(short, long)]
        priority: Option<String>,
        /// Sort key (none, priority, date, name)
        #[arg(long, default_value = "none")]
        sort: String,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show task details
    Show {
        /// Task id
        id: i64,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Mark a task completed, or pending again
    Toggle {
        /// Task id
        id: i64,
    },

    /// Remove a task
    Rm {
        /// Task id
        id: i64,
    },

    /// Edit a task (omitted fields keep their values)
    Edit {
        /// Task id
        id: i64,
        /// New text
        #[arg(short, long)]
        text: Option<String>,
        /// New notes
        #[arg(short, long)]
        notes: Option<String>,
        /// New due date (YYYY-MM-DD, today, tomorrow)
        #[arg(short, long, conflicts_with = "no_date")]
        date: Option<String>,
        /// Remove the due date
        #[arg(long)]
        no_date: bool,
        /// New category
        #[arg(short, long)]
        category: Option<String>,
        /// New priority (high, medium, low)
        #[arg(short, long)]
        priority: Option<String>,
    },

    /// Remove all completed tasks
    Clear,

    /// Exchange the positions of two tasks
    Swap {
        /// Task being moved
        source: i64,
        /// Task it is dropped on
        target: i64,
    },

    /// Undo the last change (only inside exec)
    Undo,

    /// Show task counts
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run commands from stdin in one session; all-or-nothing
    Exec,

    /// Launch interactive TUI
    Ui {
        /// Poll interval in milliseconds
        #[arg(long, default_value = "1000")]
        poll_interval: u64,
    },
}
