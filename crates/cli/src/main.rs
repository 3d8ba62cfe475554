//! Vitrine CLI - database migrations, catalog seeding and coupon management.
//!
//! # Usage
//!
//! ```bash
//! # Apply database migrations
//! vitrine-cli migrate
//!
//! # Load products from a YAML file
//! vitrine-cli seed products catalog.yaml
//!
//! # Manage coupons
//! vitrine-cli coupon create BEMVINDO10 --kind percent --percent 10
//! vitrine-cli coupon list
//! vitrine-cli coupon deactivate BEMVINDO10
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;
use vitrine_core::CouponKind;

mod commands;

#[derive(Parser)]
#[command(name = "vitrine-cli")]
#[command(author, version, about = "Vitrine CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Seed the database
    Seed {
        #[command(subcommand)]
        target: SeedTarget,
    },
    /// Manage coupons
    Coupon {
        #[command(subcommand)]
        action: CouponAction,
    },
}

#[derive(Subcommand)]
enum SeedTarget {
    /// Insert products from a YAML file (existing names are skipped)
    Products {
        /// Path to the YAML file
        file: PathBuf,
    },
}

#[derive(Subcommand)]
enum CouponAction {
    /// Create a coupon
    Create {
        /// Coupon code (stored upper-case)
        code: String,

        /// Discount type
        #[arg(short, long, value_enum)]
        kind: KindArg,

        /// Percentage off the subtotal (percent coupons)
        #[arg(long)]
        percent: Option<Decimal>,

        /// Amount off the subtotal (fixed amount coupons)
        #[arg(long)]
        amount: Option<Decimal>,

        /// Minimum subtotal for the coupon to apply
        #[arg(long)]
        min_subtotal: Option<Decimal>,

        /// Days until the coupon expires
        #[arg(long)]
        expires_in_days: Option<i64>,
    },
    /// List all coupons
    List,
    /// Deactivate a coupon
    Deactivate {
        /// Coupon code
        code: String,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum KindArg {
    Percent,
    FixedAmount,
    FreeShipping,
}

impl From<KindArg> for CouponKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Percent => Self::Percent,
            KindArg::FixedAmount => Self::FixedAmount,
            KindArg::FreeShipping => Self::FreeShipping,
        }
    }
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Seed { target } => match target {
            SeedTarget::Products { file } => commands::seed::products(&file).await?,
        },
        Commands::Coupon { action } => match action {
            CouponAction::Create {
                code,
                kind,
                percent,
                amount,
                min_subtotal,
                expires_in_days,
            } => {
                commands::coupon::create(commands::coupon::CreateArgs {
                    code,
                    kind: kind.into(),
                    percent,
                    amount,
                    min_subtotal,
                    expires_in_days,
                })
                .await?;
            }
            CouponAction::List => commands::coupon::list().await?,
            CouponAction::Deactivate { code } => commands::coupon::deactivate(&code).await?,
        },
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_coupon_create() {
        let cli = Cli::try_parse_from([
            "vitrine-cli",
            "coupon",
            "create",
            "FRETE",
            "--kind",
            "free-shipping",
            "--min-subtotal",
            "150",
        ])
        .ok();
        assert!(matches!(
            cli.map(|c| c.command),
            Some(Commands::Coupon {
                action: CouponAction::Create {
                    kind: KindArg::FreeShipping,
                    ..
                }
            })
        ));
    }
}
