//! CLI for sealed-bid commit/reveal auctions.
//!
//! This binary provides commands for:
//! - Creating auctions on the mock chain
//! - Placing sealed bids and revealing them after close
//! - Querying the highest bid, bid count and reveal status
//! - Listing the secrets held in the local vault

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;

use auction_client::config::{
    resolve_auction, Deployment, DEFAULT_DEPLOYMENT_PATH, DEFAULT_RPC_URL, DEFAULT_VAULT_PATH,
};
use auction_client::{AuctionController, ControllerError, RpcLedgerClient, SecretVault};
use auction_types::{decode_fixed_hex, Address, AuctionAddress, Commitment, HexError};

#[derive(Parser)]
#[command(name = "auction-cli")]
#[command(about = "CLI for sealed-bid commit/reveal auctions")]
struct Cli {
    /// Mock chain RPC endpoint
    #[arg(long, global = true, env = "AUCTION_RPC", default_value = DEFAULT_RPC_URL)]
    rpc: String,

    /// Secret vault file
    #[arg(long, global = true, env = "AUCTION_VAULT", default_value = DEFAULT_VAULT_PATH)]
    vault: PathBuf,

    /// Auction address (hex); read from the deployment file when absent
    #[arg(long, global = true, env = "AUCTION_ADDRESS")]
    auction: Option<AuctionAddress>,

    /// Deployment file written by create-auction
    #[arg(long, global = true, default_value = DEFAULT_DEPLOYMENT_PATH)]
    deployment: PathBuf,

    /// Submitting account (hex)
    #[arg(
        long,
        global = true,
        env = "AUCTION_SENDER",
        value_parser = parse_account,
        default_value = "0101010101010101010101010101010101010101010101010101010101010101"
    )]
    sender: Address,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Place a sealed bid
    Bid {
        /// Bid amount (kept secret until reveal)
        amount: u64,
    },

    /// Close bidding
    Close,

    /// Reveal a bid placed from this vault
    Reveal {
        /// Commitment printed by `bid` (hex)
        commitment: Commitment,
    },

    /// Highest revealed bid
    #[command(name = "get_highest_bid", alias = "get-highest-bid")]
    GetHighestBid,

    /// Number of bids placed
    #[command(name = "get_bid_count", alias = "get-bid-count")]
    GetBidCount,

    /// Whether any bid has been revealed
    #[command(name = "is_revealed", alias = "is-revealed")]
    IsRevealed,

    /// Create a new auction and record it in the deployment file
    CreateAuction,

    /// Show the public auction record
    State,

    /// List secrets held in the vault
    Secrets,
}

fn parse_account(s: &str) -> Result<Address, HexError> {
    decode_fixed_hex::<32>(s)
}

async fn create_auction_cmd(client: &RpcLedgerClient, cli: &Cli) -> Result<()> {
    let auction_address = client.create_auction().await?;
    let block = client.block_info().await?;

    Deployment {
        auction_address,
        rpc: cli.rpc.clone(),
        created_at_height: block.height,
    }
    .save(&cli.deployment)?;

    info!(auction = %auction_address, "Created auction");
    println!("Auction created");
    println!("  Address: {}", auction_address);
    println!("  Deployment: {}", cli.deployment.display());
    Ok(())
}

async fn state_cmd(controller: &AuctionController<RpcLedgerClient, RpcLedgerClient>) -> Result<()> {
    let state = controller.query_state().await?;

    println!("Auction {}:", state.address);
    println!("  Creator: {}", hex::encode(state.creator));
    println!("  Phase: {}", state.phase);
    println!("  Bid Count: {}", state.bid_count);
    match state.revealed_highest_bid() {
        Some(highest) => println!("  Highest Bid: {}", highest),
        None => println!("  Highest Bid: (not revealed)"),
    }
    for (i, bid) in state.bids.iter().enumerate() {
        match bid.revealed_amount {
            Some(amount) => println!("  [{}] {} revealed {}", i, bid.commitment, amount),
            None => println!("  [{}] {} sealed", i, bid.commitment),
        }
    }
    Ok(())
}

fn secrets_cmd(vault: &SecretVault) -> Result<()> {
    let entries = vault.entries()?;
    if entries.is_empty() {
        println!("No secrets in {}", vault.path().display());
        return Ok(());
    }

    println!("Secrets in {}:", vault.path().display());
    for entry in entries {
        match entry.revealed_tx {
            Some(tx) => println!(
                "  {} amount {} revealed in {}",
                entry.commitment, entry.record.amount, tx
            ),
            None => println!("  {} amount {} sealed", entry.commitment, entry.record.amount),
        }
    }
    Ok(())
}

async fn run(cli: Cli) -> Result<()> {
    let client = RpcLedgerClient::connect(&cli.rpc, cli.sender)
        .with_context(|| format!("Failed to build RPC client for {}", cli.rpc))?;

    match &cli.command {
        Commands::CreateAuction => return create_auction_cmd(&client, &cli).await,
        Commands::Secrets => return secrets_cmd(&SecretVault::open(&cli.vault)?),
        _ => {}
    }

    let auction = resolve_auction(cli.auction, &cli.deployment)?;
    let vault = SecretVault::open(&cli.vault)?;
    let controller = AuctionController::new(client.clone(), client, vault, auction);

    match cli.command {
        Commands::Bid { amount } => match controller.place_bid(amount).await {
            Ok(placed) => {
                println!("Bid placed");
                println!("  Commitment: {}", placed.commitment);
                println!("  Transaction: {}", placed.tx_id);
            }
            Err(err) => {
                if let ControllerError::SecretNotPersisted {
                    commitment, record, ..
                } = &err
                {
                    eprintln!("The bid is on the ledger but the vault write failed.");
                    eprintln!("Record this secret now; it is needed to reveal:");
                    eprintln!("  commitment: {}", commitment);
                    eprintln!("  amount:     {}", record.amount);
                    eprintln!("  blinding:   {}", record.blinding);
                }
                return Err(err.into());
            }
        },

        Commands::Close => {
            let tx_id = controller.close().await?;
            println!("Bidding closed");
            println!("  Transaction: {}", tx_id);
        }

        Commands::Reveal { commitment } => {
            let revealed = controller.reveal_own_bid(&commitment).await?;
            println!("Bid revealed");
            println!("  Commitment: {}", revealed.commitment);
            println!("  Amount: {}", revealed.amount);
            println!("  Transaction: {}", revealed.tx_id);
        }

        Commands::GetHighestBid => {
            println!("{}", controller.highest_bid().await?);
        }

        Commands::GetBidCount => {
            println!("{}", controller.bid_count().await?);
        }

        Commands::IsRevealed => {
            println!("{}", controller.is_revealed().await?);
        }

        Commands::State => state_cmd(&controller).await?,

        Commands::CreateAuction | Commands::Secrets => {}
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("auction_cli=info".parse()?)
                .add_directive("auction_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    run(Cli::parse()).await
}
