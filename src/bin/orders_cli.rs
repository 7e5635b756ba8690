use std::{str::FromStr, sync::Arc};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};
use order_records::{
    commands::orders::{CreateOrderCommand, OrderDetailAttributes},
    config::{self, AppConfig},
    db::{self, DbPool},
    entities::OrderStatus,
    queries::order_queries::OrderFilter,
    services::OrderService,
};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let context = CliContext::initialize().await?;

    match cli.command {
        Commands::Create(args) => handle_create(&context, args).await?,
        Commands::Show { id } => {
            let order = context.service().find_order(id).await?;
            print_json(&order)?;
        }
        Commands::Search(args) => handle_search(&context, args).await?,
        Commands::UpdateStatus { id, status } => {
            let order = context
                .service()
                .update_order_status(id, status)
                .await
                .with_context(|| format!("failed to update status of order {id}"))?;
            print_json(&order)?;
        }
        Commands::Delete { id } => {
            let deleted = context.service().delete_order(id).await?;
            print_json(&deleted)?;
        }
        Commands::InitSchema => {
            db::ensure_schema(&context.db)
                .await
                .context("failed to create order tables")?;
            print_json(&serde_json::json!({ "schema": "ready" }))?;
        }
    }

    Ok(())
}

#[derive(Parser)]
#[command(name = "orders-cli", about = "Create, search and maintain order records", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an order, optionally with line items
    Create(CreateArgs),
    /// Print one order with its details
    Show {
        #[arg(value_parser = clap::value_parser!(Uuid))]
        id: Uuid,
    },
    /// Search orders by email, price range and creation date
    Search(SearchArgs),
    /// Set the status of an order
    UpdateStatus {
        #[arg(value_parser = clap::value_parser!(Uuid))]
        id: Uuid,
        #[arg(value_parser = parse_status, help = "NEW, PAID or CANCELED")]
        status: OrderStatus,
    },
    /// Delete an order and its details
    Delete {
        #[arg(value_parser = clap::value_parser!(Uuid))]
        id: Uuid,
    },
    /// Create the order tables if they do not exist
    InitSchema,
}

#[derive(Args)]
struct CreateArgs {
    #[arg(long, help = "Customer name")]
    name: String,
    #[arg(long, help = "Customer email address")]
    email: String,
    #[arg(long, value_parser = parse_decimal, help = "Order total")]
    total_price: Decimal,
    #[arg(long, value_parser = parse_status, help = "Initial status (defaults to NEW)")]
    status: Option<OrderStatus>,
    #[arg(long, help = "Order date as RFC 3339 (defaults to now)")]
    order_date: Option<DateTime<Utc>>,
    #[arg(
        long = "detail",
        value_parser = parse_detail,
        help = "Line item as name:quantity:unit_price; repeat for more"
    )]
    details: Vec<OrderDetailAttributes>,
}

#[derive(Args)]
struct SearchArgs {
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    min_price: Option<String>,
    #[arg(long)]
    max_price: Option<String>,
    #[arg(long)]
    start_date: Option<String>,
    #[arg(long)]
    end_date: Option<String>,
    #[arg(long, help = "Page number, starting at 1")]
    page: Option<u64>,
    #[arg(long)]
    per_page: Option<u64>,
}

struct CliContext {
    config: AppConfig,
    db: Arc<DbPool>,
}

impl CliContext {
    async fn initialize() -> Result<Self> {
        let config = config::load_config().context("failed to load application config")?;
        config::init_tracing(config.log_level(), config.log_json);

        let db_pool = db::establish_connection_from_app_config(&config)
            .await
            .context("failed to connect to database")?;
        debug!(target: "orders_cli", environment = %config.environment, "connected");

        Ok(Self {
            config,
            db: Arc::new(db_pool),
        })
    }

    fn service(&self) -> OrderService {
        OrderService::from_config(self.db.clone(), &self.config)
    }
}

async fn handle_create(context: &CliContext, args: CreateArgs) -> Result<()> {
    let command = CreateOrderCommand {
        status: args.status,
        order_date: args.order_date,
        ..CreateOrderCommand::new(args.name, args.email, args.total_price)
    }
    .with_details(args.details);

    let order = context
        .service()
        .create_order(command)
        .await
        .context("failed to create order")?;
    print_json(&order)
}

async fn handle_search(context: &CliContext, args: SearchArgs) -> Result<()> {
    let filter = OrderFilter {
        email: args.email,
        min_total_price: args.min_price,
        max_total_price: args.max_price,
        start_date: args.start_date,
        end_date: args.end_date,
    };
    let service = context.service();

    if args.page.is_some() || args.per_page.is_some() {
        let page = service
            .search_orders_page(filter, args.page.unwrap_or(1), args.per_page)
            .await?;
        print_json(&page)
    } else {
        let orders = service.search_orders(filter).await?;
        print_json(&orders)
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn parse_decimal(raw: &str) -> Result<Decimal, String> {
    Decimal::from_str(raw).map_err(|_| format!("invalid decimal '{raw}'"))
}

fn parse_status(raw: &str) -> Result<OrderStatus, String> {
    OrderStatus::from_str(raw).map_err(|_| format!("unknown status '{raw}'"))
}

fn parse_detail(raw: &str) -> Result<OrderDetailAttributes, String> {
    let parts: Vec<&str> = raw.rsplitn(3, ':').collect();
    let [price, quantity, name] = parts.as_slice() else {
        return Err(format!("expected name:quantity:unit_price, got '{raw}'"));
    };
    let quantity: i32 = quantity
        .parse()
        .map_err(|_| format!("invalid quantity '{quantity}'"))?;
    let unit_price = parse_decimal(price)?;
    Ok(OrderDetailAttributes::new(*name, quantity, unit_price))
}
