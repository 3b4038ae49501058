use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use edoquest::{Config, ProgressPatch};

mod cli;

#[derive(Parser)]
#[command(name = "edoquest")]
#[command(about = "Reading progress, quizzes and achievements for Edo readers")]
#[command(version)]
struct Cli {
    /// Path to the config file (defaults to ~/.edoquest/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default config file and create the database
    Init {
        /// Overwrite existing config file
        #[arg(long)]
        force: bool,
    },

    /// Import chapters and quizzes from a TOML or JSON catalog
    Import {
        file: PathBuf,
        #[arg(long)]
        json: bool,
    },

    /// List imported chapters
    Chapters {
        #[arg(long)]
        json: bool,
    },

    /// Manage reader accounts
    User {
        #[command(subcommand)]
        command: UserCommands,
    },

    /// Show or update reading progress
    Progress {
        #[command(subcommand)]
        command: ProgressCommands,
    },

    /// List, answer and review quizzes
    Quiz {
        #[command(subcommand)]
        command: QuizCommands,
    },

    /// Credit points to a reader
    Credit {
        user: i64,
        points: i64,
        #[arg(long)]
        json: bool,
    },

    /// Show or re-evaluate achievements
    Achievements {
        #[command(subcommand)]
        command: AchievementCommands,
    },

    /// Show reader statistics
    Stats {
        user: i64,
        #[arg(long)]
        json: bool,
    },

    /// Run the JSON API server
    Serve {
        #[arg(long)]
        host: Option<String>,
        #[arg(long)]
        port: Option<u16>,
    },

    /// Delete all reader activity (keeps accounts and content)
    Reset {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum UserCommands {
    /// Create a reader account
    Create {
        name: String,
        #[arg(long)]
        json: bool,
    },
    /// Show a reader and their level
    Show {
        id: i64,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum ProgressCommands {
    /// Show all progress records of a reader
    Show {
        user: i64,
        #[arg(long)]
        json: bool,
    },
    /// Merge fields into a chapter's progress record
    Update {
        user: i64,
        chapter: i64,
        /// Mark the chapter completed (true) or not (false)
        #[arg(long)]
        completed: Option<bool>,
        /// Reading time in seconds
        #[arg(long)]
        reading_time: Option<i64>,
        /// Quiz score (0-100)
        #[arg(long)]
        quiz_score: Option<i64>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum QuizCommands {
    /// List the quizzes of a chapter
    List {
        chapter: i64,
        #[arg(long)]
        json: bool,
    },
    /// Submit an answer (option index, starting at 0)
    Submit {
        user: i64,
        quiz: i64,
        option: usize,
        #[arg(long)]
        json: bool,
    },
    /// Show a reader's attempts
    History {
        user: i64,
        #[arg(long)]
        quiz: Option<i64>,
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
enum AchievementCommands {
    /// Show the catalog with the reader's unlocks
    List {
        user: i64,
        #[arg(long)]
        json: bool,
    },
    /// Evaluate achievements against the stored state
    Refresh {
        user: i64,
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Commands::Init { force } = cli.command {
        return cli::init::init_command(cli.config.as_deref(), force);
    }

    let config = Config::load(cli.config.as_deref())?;

    if let Commands::Serve { host, port } = cli.command {
        return cli::serve::serve_command(&config, host, port).await;
    }

    let engine = cli::open_engine(&config)?;

    match cli.command {
        Commands::Import { file, json } => cli::content::import(&engine, &file, json)?,
        Commands::Chapters { json } => cli::content::chapters(&engine, json)?,
        Commands::User { command } => match command {
            UserCommands::Create { name, json } => cli::user::create(&engine, &name, json)?,
            UserCommands::Show { id, json } => cli::user::show(&engine, id, json)?,
        },
        Commands::Progress { command } => match command {
            ProgressCommands::Show { user, json } => cli::progress::show(&engine, user, json)?,
            ProgressCommands::Update {
                user,
                chapter,
                completed,
                reading_time,
                quiz_score,
                json,
            } => {
                let patch = ProgressPatch {
                    is_completed: completed,
                    reading_time_seconds: reading_time,
                    quiz_score,
                };
                cli::progress::update(&engine, user, chapter, patch, json)?
            }
        },
        Commands::Quiz { command } => match command {
            QuizCommands::List { chapter, json } => cli::quiz::list(&engine, chapter, json)?,
            QuizCommands::Submit {
                user,
                quiz,
                option,
                json,
            } => cli::quiz::submit(&engine, user, quiz, option, json)?,
            QuizCommands::History { user, quiz, json } => {
                cli::quiz::history(&engine, user, quiz, json)?
            }
        },
        Commands::Credit { user, points, json } => cli::points::credit(&engine, user, points, json)?,
        Commands::Achievements { command } => match command {
            AchievementCommands::List { user, json } => cli::achievements::list(&engine, user, json)?,
            AchievementCommands::Refresh { user, json } => {
                cli::achievements::refresh(&engine, user, json)?
            }
        },
        Commands::Stats { user, json } => cli::points::stats(&engine, user, json)?,
        Commands::Reset { yes } => cli::points::reset(&engine, yes)?,
        // Handled before the engine is opened
        Commands::Init { .. } | Commands::Serve { .. } => {}
    }

    Ok(())
}
