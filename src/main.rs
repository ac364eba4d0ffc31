use anyhow::bail;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use todo_card::client::{TodoClient, DEFAULT_URL, URL_ENV};
use todo_card::form::Draft;
use todo_card::manager::TodoManager;
use todo_card::presentation::{render, CardView};
use todo_card::shell;

#[derive(Parser)]
#[command(name = "todo-card")]
#[command(about = "Todo cards with topic, name, image and detail")]
struct Cli {
    /// Base URL of the todo service
    #[arg(long, global = true, env = URL_ENV, default_value = DEFAULT_URL)]
    url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive form
    Shell {
        /// Sync cards with the todo service instead of keeping them in memory
        #[arg(short, long)]
        remote: bool,
    },
    /// List cards stored by the todo service
    List,
    /// Create a card on the todo service
    Add {
        #[arg(long)]
        topic: String,
        #[arg(long)]
        name: String,
        /// Image URL (.jpeg, .jpg, .png) or http(s) link
        #[arg(long)]
        image: String,
        #[arg(long, default_value = "")]
        detail: String,
    },
    /// Flip a card between done and pending
    Toggle { id: i64 },
    /// Delete a card
    Delete { id: i64 },
}

/// Logs go to stderr so stdout carries only shell and command output.
fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "todo_card=info".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn connect(url: &str) -> anyhow::Result<TodoManager> {
    let manager = TodoManager::remote(TodoClient::new(url));
    manager.load().await?;
    Ok(manager)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Shell { remote: true }) => {
            tracing::info!("Opening form synced with {}", cli.url);
            let manager = connect(&cli.url).await?;
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&manager, stdin).await?;
        }
        Some(Commands::Shell { remote: false }) | None => {
            let manager = TodoManager::local();
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            shell::run(&manager, stdin).await?;
        }
        Some(Commands::List) => {
            let manager = connect(&cli.url).await?;
            for card in manager.cards() {
                println!("{}\n", render(&card));
            }
        }
        Some(Commands::Add {
            topic,
            name,
            image,
            detail,
        }) => {
            let mut draft = Draft::new();
            draft.set_topic(topic);
            draft.set_name(name);
            draft.set_url(image);
            draft.set_detail(detail);
            if !draft.can_submit() {
                if draft.url_error() {
                    bail!("{}", draft.url_helper_text());
                }
                bail!("topic, name and image must not be blank");
            }

            let manager = TodoManager::remote(TodoClient::new(&cli.url));
            let todo = manager.create(draft.to_new_todo()).await?;
            println!("{}", render(&CardView::derive(&todo, false)));
        }
        Some(Commands::Toggle { id }) => {
            let manager = connect(&cli.url).await?;
            match manager.toggle_done(id).await? {
                Some(todo) => println!("{}", render(&CardView::derive(&todo, false))),
                None => println!("No card with id {}", id),
            }
        }
        Some(Commands::Delete { id }) => {
            let manager = connect(&cli.url).await?;
            if manager.delete(id).await? {
                println!("Deleted card {}", id);
            } else {
                println!("No card with id {}", id);
            }
        }
    }

    Ok(())
}
