use clap::{Parser, Subcommand};
use docs_bot_lib::commands;
use docs_bot_lib::{App, AppConfig, Database};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "docs-bot", version, about = "Ask questions about your uploaded documents")]
struct Cli {
    /// Config file to use instead of the default location.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Backend root URL, e.g. http://localhost:8000.
    #[arg(long, global = true)]
    backend_url: Option<String>,

    /// Directory holding the session database.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log in and remember the session.
    Login {
        username: String,
        /// Read from stdin when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Show the current session.
    Whoami,
    /// List uploaded documents.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Upload a document and wait until it is processed (admin only).
    Upload { file: PathBuf },
    /// Delete a document (admin only).
    Delete { filename: String },
    /// Ask a single question.
    Ask {
        #[arg(required = true)]
        question: Vec<String>,
    },
    /// Interactive question loop.
    Chat,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if let Some(url) = cli.backend_url {
        config.backend.base_url = url;
    }
    if let Some(dir) = cli.data_dir {
        config.data.data_dir = Some(dir);
    }

    let db = Arc::new(Database::new(&config.data_dir())?);
    let mut app = App::new(&config, db)?;
    app.start().await?;
    if let Some(notice) = app.take_notice() {
        eprintln!("{}", notice.message);
    }

    let result = match cli.command {
        Command::Login { username, password } => {
            commands::auth::login(&mut app, &username, password).await
        }
        Command::Logout => commands::auth::logout(&mut app),
        Command::Whoami => {
            commands::auth::whoami(&app);
            Ok(())
        }
        Command::List { json } => commands::documents::list(&mut app, json).await,
        Command::Upload { file } => commands::documents::upload(&mut app, &file).await,
        Command::Delete { filename } => commands::documents::delete(&mut app, &filename).await,
        Command::Ask { question } => commands::chat::ask(&mut app, &question.join(" ")).await,
        Command::Chat => commands::chat::chat(&mut app).await,
    };

    if let Err(e) = result {
        log::debug!("Command failed: {}", e);
        let message = app
            .take_notice()
            .map(|notice| notice.message)
            .unwrap_or_else(|| e.to_string());
        eprintln!("{}", message);
        std::process::exit(1);
    }
    Ok(())
}
