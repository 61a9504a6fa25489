//! Shopie CLI - terminal front end for the Shopie shop.
//!
//! # Usage
//!
//! ```bash
//! # Browse the catalog
//! shopie catalog list
//! shopie catalog search "tea"
//!
//! # Manage the cart
//! shopie cart add 12
//! shopie cart dec 12
//! shopie cart show
//!
//! # Administration (ADMIN accounts only)
//! shopie admin products create --name "Mug" --price 9.90 --stock 25
//! shopie admin products delete 12 --yes
//! shopie admin orders list --status PENDING
//! shopie admin orders set-status 7 SHIPPED
//! ```
//!
//! # Environment Variables
//!
//! See `shopie_storefront::config` for the full list. A session is opened
//! with `SHOPIE_TOKEN` when set, otherwise with `SHOPIE_EMAIL` and
//! `SHOPIE_PASSWORD`.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;

use clap::{Parser, Subcommand};
use sentry::integrations::tracing as sentry_tracing;
use shopie_core::{OrderId, OrderStatus, ProductId, StatusFilter};
use shopie_storefront::AppState;
use shopie_storefront::config::ClientConfig;
use shopie_storefront::presenter::Presenter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;
mod presenter;

use commands::CommandError;
use commands::products::ProductArgs;

#[derive(Parser)]
#[command(name = "shopie")]
#[command(author, version, about = "Shopie shop client")]
struct Cli {
    /// Answer yes to confirmation prompts
    #[arg(short, long, global = true)]
    yes: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Browse products
    Catalog {
        #[command(subcommand)]
        action: CatalogAction,
    },
    /// Manage the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
    /// Manage products and orders
    Admin {
        #[command(subcommand)]
        target: AdminTarget,
    },
}

#[derive(Subcommand)]
enum CatalogAction {
    /// List every product
    List,
    /// List products whose name matches a query
    Search {
        /// Name filter (three characters or more)
        query: String,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Add one unit of a product
    Add { product_id: ProductId },
    /// One more unit of a product already in the cart
    Inc { product_id: ProductId },
    /// One less unit; the last unit removes the product
    Dec { product_id: ProductId },
    /// Remove a product from the cart
    Remove { product_id: ProductId },
    /// Show the cart
    Show,
}

#[derive(Subcommand)]
enum AdminTarget {
    /// Manage products
    Products {
        #[command(subcommand)]
        action: ProductAction,
    },
    /// Manage orders
    Orders {
        #[command(subcommand)]
        action: OrderAction,
    },
}

#[derive(Subcommand)]
enum ProductAction {
    /// List every product
    List,
    /// Create a product
    Create(ProductArgs),
    /// Change fields of a product
    Edit {
        product_id: ProductId,
        #[command(flatten)]
        fields: ProductArgs,
    },
    /// Delete a product (asks for --yes)
    Delete { product_id: ProductId },
}

#[derive(Subcommand)]
enum OrderAction {
    /// List orders
    List {
        /// `ALL`, `PENDING`, `PAID`, `SHIPPED` or `DELIVERED`
        #[arg(short, long, default_value = "ALL")]
        status: StatusFilter,
    },
    /// Show an order and the statuses it can move to
    Show { order_id: OrderId },
    /// Move an order to a new status
    SetStatus {
        order_id: OrderId,
        status: OrderStatus,
    },
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &ClientConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.sentry_dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    tracing::info!("Sentry initialized");
    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Loaded before tracing so Sentry can be initialized first
    let config = ClientConfig::from_env();
    let _sentry_guard = config.as_ref().ok().and_then(init_sentry);

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopie=info,shopie_storefront=info,shopie_admin=info".into());

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .init();

    let result = match config {
        Ok(config) => run(cli, &config).await,
        Err(e) => Err(e.into()),
    };

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli, config: &ClientConfig) -> Result<(), CommandError> {
    let presenter = presenter::TerminalPresenter::shared(cli.yes);
    let app = commands::sign_in(config).await?;
    run_signed_in(&app, presenter, cli.command).await
}

/// Run one command, then sign out whether or not it succeeded.
async fn run_signed_in(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    command: Commands,
) -> Result<(), CommandError> {
    let result = dispatch(app, presenter, command).await;
    app.logout().await;
    result
}

async fn dispatch(
    app: &AppState,
    presenter: Arc<dyn Presenter>,
    command: Commands,
) -> Result<(), CommandError> {
    match command {
        Commands::Catalog { action } => match action {
            CatalogAction::List => commands::catalog::list(app, presenter).await?,
            CatalogAction::Search { query } => {
                commands::catalog::search(app, presenter, &query).await?;
            }
        },
        Commands::Cart { action } => match action {
            CartAction::Add { product_id } => commands::cart::add(app, presenter, product_id).await?,
            CartAction::Inc { product_id } => {
                commands::cart::increment(app, presenter, product_id).await?;
            }
            CartAction::Dec { product_id } => {
                commands::cart::decrement(app, presenter, product_id).await?;
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(app, presenter, product_id).await?;
            }
            CartAction::Show => commands::cart::show(app).await,
        },
        Commands::Admin { target } => match target {
            AdminTarget::Products { action } => match action {
                ProductAction::List => commands::products::list(app, presenter).await?,
                ProductAction::Create(fields) => {
                    commands::products::create(app, presenter, fields).await?;
                }
                ProductAction::Edit { product_id, fields } => {
                    commands::products::edit(app, presenter, product_id, fields).await?;
                }
                ProductAction::Delete { product_id } => {
                    commands::products::delete(app, presenter, product_id).await?;
                }
            },
            AdminTarget::Orders { action } => match action {
                OrderAction::List { status } => commands::orders::list(app, presenter, status).await?,
                OrderAction::Show { order_id } => {
                    commands::orders::show(app, presenter, order_id).await?;
                }
                OrderAction::SetStatus { order_id, status } => {
                    commands::orders::set_status(app, presenter, order_id, status).await?;
                }
            },
        },
    }

    Ok(())
}
