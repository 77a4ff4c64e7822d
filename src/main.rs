use anyhow::{Context, Result};
use chrono::Utc;
use clap::{Parser, Subcommand};
use infoquest::config::Config;
use infoquest::export::render_pdf;
use infoquest::generation::Difficulty;
use infoquest::logging;
use infoquest::server;
use infoquest::service::QueryService;
use infoquest::storage::{LocalStore, Theme};

#[derive(Parser)]
#[command(name = "infoquest", version, about = "Study content from web search and LLMs")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the HTTP server (default)
    Serve,
    /// Answer one topic query and print the JSON response
    Ask {
        topic: String,
        /// simple, medium or advanced
        #[arg(long, short, default_value = "medium")]
        difficulty: String,
        /// Also write the answer as a PDF to this path
        #[arg(long)]
        pdf: Option<std::path::PathBuf>,
    },
    /// Show recent queries
    History {
        #[arg(long)]
        clear: bool,
    },
    /// Toggle a bookmark
    Bookmark { query: String },
    /// List bookmarks
    Bookmarks,
    /// Manage collections
    Collection {
        #[command(subcommand)]
        action: CollectionAction,
    },
    /// Study streak and goals
    Study {
        #[command(subcommand)]
        action: StudyAction,
    },
    /// Show or set the theme
    Theme { theme: Option<String> },
}

#[derive(Subcommand)]
enum CollectionAction {
    /// Create a collection and print its id
    New { name: String },
    /// Add a query to a collection
    Add { id: String, query: String },
    /// Remove a query from a collection
    Remove { id: String, query: String },
    /// List collections
    List,
}

#[derive(Subcommand)]
enum StudyAction {
    /// Show streak, goals and badges
    Show,
    /// Record a study session for today
    Record,
    /// Add a study goal
    Goal { topic: String },
    /// Toggle a goal's completion
    Toggle { topic: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Config error (using defaults): {}", e);
        Config::default()
    });

    // Logging goes to stderr; stdout carries command output.
    logging::init_logging(&config);

    let store = LocalStore::open(config.storage_path());

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => {
            server::serve(&config).await?;
        }
        Commands::Ask { topic, difficulty, pdf } => {
            let service = QueryService::from_config(&config)?;
            let response = service
                .answer(Some(topic.as_str()), Difficulty::coerce(Some(difficulty.as_str())))
                .await?;

            let now = Utc::now();
            if let Err(e) = store.add_to_history(&response.query, now) {
                tracing::warn!(error = %e, "Failed to record history");
            }
            if let Err(e) = store.record_study_session(now) {
                tracing::warn!(error = %e, "Failed to record study session");
            }

            println!("{}", serde_json::to_string_pretty(&response)?);

            if let Some(path) = pdf {
                let bytes = render_pdf(&response, now.date_naive());
                std::fs::write(&path, bytes)
                    .with_context(|| format!("Failed to write PDF to {}", path.display()))?;
                eprintln!("PDF written to {}", path.display());
            }
        }
        Commands::History { clear } => {
            if clear {
                store.clear_history()?;
                println!("History cleared.");
            } else {
                for item in store.history() {
                    println!("{}  {}", item.timestamp.format("%Y-%m-%d %H:%M"), item.query);
                }
            }
        }
        Commands::Bookmark { query } => {
            if store.toggle_bookmark(&query, Utc::now())? {
                println!("Bookmarked \"{}\".", query.trim());
            } else {
                println!("Removed bookmark \"{}\".", query.trim());
            }
        }
        Commands::Bookmarks => {
            for item in store.bookmarks() {
                println!("{}", item.query);
            }
        }
        Commands::Collection { action } => match action {
            CollectionAction::New { name } => {
                let collection = store.create_collection(&name, Utc::now())?;
                println!("{}", collection.id);
            }
            CollectionAction::Add { id, query } => {
                if !store.add_to_collection(&id, &query)? {
                    eprintln!("Nothing added (unknown collection, blank or duplicate query).");
                }
            }
            CollectionAction::Remove { id, query } => {
                if !store.remove_from_collection(&id, &query)? {
                    eprintln!("Nothing removed.");
                }
            }
            CollectionAction::List => {
                println!("{}", serde_json::to_string_pretty(&store.collections())?);
            }
        },
        Commands::Study { action } => match action {
            StudyAction::Show => {
                println!("{}", serde_json::to_string_pretty(&store.study_data())?);
            }
            StudyAction::Record => {
                let study = store.record_study_session(Utc::now())?;
                println!("Streak: {} day(s)", study.streak);
            }
            StudyAction::Goal { topic } => {
                if !store.add_study_goal(&topic)? {
                    eprintln!("Goal already exists or is blank.");
                }
            }
            StudyAction::Toggle { topic } => match store.toggle_goal(&topic)? {
                Some(true) => println!("Completed \"{}\".", topic.trim()),
                Some(false) => println!("Reopened \"{}\".", topic.trim()),
                None => anyhow::bail!("No goal named \"{}\"", topic.trim()),
            },
        },
        Commands::Theme { theme } => match theme {
            Some(value) => {
                let theme: Theme = value.parse().map_err(anyhow::Error::msg)?;
                store.set_theme(theme)?;
                println!("Theme set to {}.", theme);
            }
            None => println!("{}", store.theme()),
        },
    }

    Ok(())
}
