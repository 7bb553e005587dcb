use std::path::PathBuf;

use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use gridlist_lib::query::SearchMode;
use simplelog::LevelFilter;

#[derive(Parser)]
#[command(name = "gridlist", version, about = "Drive a list widget from JSON fixtures")]
pub struct Cli {
    /// List definition: `{ "id": ..., "model": {...}, "list": {...} }`
    #[arg(short, long)]
    pub definition: PathBuf,

    /// JSON array of records
    #[arg(short, long)]
    pub records: PathBuf,

    /// Preference and session database (defaults to the user data directory)
    #[arg(long)]
    pub db: Option<PathBuf>,

    /// Keep preferences in memory only
    #[arg(long, conflicts_with = "db")]
    pub ephemeral: bool,

    /// User owning the stored preferences
    #[arg(short, long, default_value = "admin")]
    pub user: String,

    /// Session holding the last visited page
    #[arg(long, default_value = "cli")]
    pub session: String,

    /// Search term
    #[arg(short, long)]
    pub search: Option<String>,

    /// How the search term is matched
    #[arg(long, value_enum)]
    pub search_mode: Option<SearchModeArg>,

    /// Named search scope to apply instead of the built-in matcher
    #[arg(long)]
    pub search_scope: Option<String>,

    /// Keys of the checked rows
    #[arg(long, value_delimiter = ',')]
    pub checked: Vec<String>,

    /// Log level
    #[arg(long, default_value = "warn")]
    pub log_level: LevelFilter,

    /// Write the log to a file instead of stderr
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    #[command(subcommand)]
    pub action: Action,
}

#[derive(Subcommand)]
pub enum Action {
    /// Redraw the list
    Refresh,
    /// Show a page
    Paginate { page: usize },
    /// Redraw from the first page
    Filter,
    /// Toggle the sort on a column
    Sort {
        column: String,
        #[arg(long)]
        page: Option<usize>,
    },
    /// Show the setup form
    LoadSetup,
    /// Store the column setup
    ApplySetup {
        /// Visible columns, in order
        #[arg(long, value_delimiter = ',')]
        visible: Vec<String>,
        /// Records per page
        #[arg(long)]
        per_page: Option<usize>,
        /// Column order
        #[arg(long, value_delimiter = ',')]
        order: Vec<String>,
    },
    /// Clear the stored setup
    ResetSetup,
    /// Print the list query as SQL
    Sql {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
}

#[derive(Copy, Clone, ValueEnum)]
pub enum SearchModeArg {
    All,
    Any,
    Exact,
}

impl From<SearchModeArg> for SearchMode {
    fn from(mode: SearchModeArg) -> Self {
        match mode {
            SearchModeArg::All => SearchMode::All,
            SearchModeArg::Any => SearchMode::Any,
            SearchModeArg::Exact => SearchMode::Exact,
        }
    }
}
