use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use feature_policies::api::{self, SecurityConfig};
use feature_policies::client::{RecommendationClient, RestStore};
use feature_policies::config::AppConfig;
use feature_policies::db;
use feature_policies::i18n::{Catalog, Localizer};
use feature_policies::modal::forms::{ActorForm, OrganizationForm};
use feature_policies::modal::{ModalContext, ModalServices, PolicyRecommendationModal};
use feature_policies::notify::ConsoleNotifier;

#[derive(Parser)]
#[command(name = "fpol")]
#[command(about = "Attach AI-recommended policies to project features")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve the local REST backend
    Serve {
        /// Port for HTTP API
        #[arg(short, long, default_value = "17020")]
        port: u16,
    },
    /// Fetch and print policy recommendations for a feature
    Recommend(Target),
    /// Fetch recommendations and attach the picked ones to the feature
    Adopt {
        #[command(flatten)]
        target: Target,

        /// Author recorded on the created policies
        #[arg(long)]
        author: Uuid,

        /// 1-based positions of the recommendations to attach (e.g. 1,3)
        #[arg(long, value_delimiter = ',', required = true)]
        pick: Vec<usize>,
    },
    /// Organization commands
    Org {
        #[command(subcommand)]
        command: OrgCommands,
    },
    /// Actor commands
    Actor {
        #[command(subcommand)]
        command: ActorCommands,
    },
    /// Print the effective configuration
    Config {
        /// Write it to the user config file
        #[arg(long)]
        save: bool,
    },
}

#[derive(Args)]
struct Target {
    #[arg(long)]
    project: Uuid,

    #[arg(long)]
    feature: Uuid,

    /// Number of recommendations to request
    #[arg(long)]
    count: Option<u32>,
}

#[derive(Subcommand)]
enum OrgCommands {
    /// Create an organization owned by the given user
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        owner: Uuid,
    },
}

#[derive(Subcommand)]
enum ActorCommands {
    /// Add an actor to a project
    Add {
        #[arg(long)]
        project: Uuid,
        #[arg(long)]
        name: String,
    },
}

/// Initialize tracing. Interactive commands log to stderr so stdout only
/// carries results.
fn init_tracing(use_stderr: bool) {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG")
            .unwrap_or_else(|_| "feature_policies=debug,tower_http=debug".into()),
    );

    if use_stderr {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

fn services(config: &AppConfig) -> ModalServices {
    let client = reqwest::Client::new();
    ModalServices {
        source: Arc::new(RecommendationClient::with_client(
            client.clone(),
            &config.functions_url,
            config.api_key.clone(),
        )),
        store: Arc::new(RestStore::with_client(
            client,
            &config.rest_url,
            config.api_key.clone(),
        )),
        notifier: Arc::new(ConsoleNotifier),
        localizer: Arc::new(Catalog::new(config.locale)),
    }
}

fn open_modal(config: &AppConfig, target: &Target, author: Uuid) -> PolicyRecommendationModal {
    let context = ModalContext::new(target.project, target.feature, author)
        .with_count(target.count.unwrap_or(config.recommendation_count));
    PolicyRecommendationModal::new(context, services(config))
}

/// Close the modal when the user hits Ctrl-C while a request is in flight.
fn close_on_interrupt(modal: &PolicyRecommendationModal) {
    let handle = modal.cancel_handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.cancel();
        }
    });
}

fn print_recommendations(modal: &PolicyRecommendationModal) {
    for (i, rec) in modal.recommendations().iter().enumerate() {
        let mark = if rec.selected { "x" } else { " " };
        println!("[{}] {}. {}", mark, i + 1, rec.contents);
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let use_stderr = !matches!(cli.command, Commands::Serve { .. });
    init_tracing(use_stderr);

    let config = AppConfig::load();

    match cli.command {
        Commands::Serve { port } => {
            tracing::info!("Starting feature-policies backend on port {}", port);

            let db = db::Database::open_default()?;
            db.migrate()?;

            let app = api::create_router_with_config(db, SecurityConfig::from_env());

            let listener = tokio::net::TcpListener::bind(format!("127.0.0.1:{}", port)).await?;
            tracing::info!(
                "feature-policies backend listening on http://127.0.0.1:{}/rest/v1",
                port
            );

            axum::serve(listener, app).await?;
        }
        Commands::Recommend(target) => {
            let mut modal = open_modal(&config, &target, Uuid::nil());
            close_on_interrupt(&modal);

            modal.fetch().await.context("Failed to fetch recommendations")?;
            if modal.recommendations().is_empty() {
                println!("No recommendations returned.");
            }
            print_recommendations(&modal);
        }
        Commands::Adopt {
            target,
            author,
            pick,
        } => {
            let mut modal = open_modal(&config, &target, author);
            close_on_interrupt(&modal);

            modal.fetch().await.context("Failed to fetch recommendations")?;
            for position in pick {
                let index = position
                    .checked_sub(1)
                    .ok_or_else(|| anyhow::anyhow!("Positions start at 1"))?;
                modal.toggle(index)?;
            }
            print_recommendations(&modal);
            println!("{}", modal.selection_summary());

            let outcome = modal.submit().await?;
            for added in &outcome.added {
                println!("{}  {}", added.policy.id, added.policy.contents);
            }
            if !outcome.closed {
                println!("Not attached:");
                print_recommendations(&modal);
            }
        }
        Commands::Org {
            command: OrgCommands::Create { name, owner },
        } => {
            let store = RestStore::new(&config.rest_url, config.api_key.clone());
            let localizer = Catalog::new(config.locale);
            let mut form = OrganizationForm::new(owner);
            form.set_name(name);
            let organization = form.submit(&store, &ConsoleNotifier, &localizer).await?;
            println!("{}", organization.id);
        }
        Commands::Actor {
            command: ActorCommands::Add { project, name },
        } => {
            let store = RestStore::new(&config.rest_url, config.api_key.clone());
            let mut form = ActorForm::new(project);
            form.set_name(name);
            let actor = form.submit(&store).await?;
            let localizer = Catalog::new(config.locale);
            println!("{}: {} ({})", localizer.text("actor.add_modal_title"), actor.name, actor.id);
        }
        Commands::Config { save } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if save {
                config.save()?;
            }
        }
    }

    Ok(())
}
