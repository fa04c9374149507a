//! Terminal driver for the quote-input flow.
//!
//! Every line typed on stdin is treated as an edit of the amount field. An empty line
//! clears the amount. Lines starting with `:` are commands:
//! `:offline`, `:online` and `:quit`.
//!
//! Run with:
//! ```bash
//! RUST_LOG=debug quote-console --symbol ZRX --decimals 18 --wei-per-base-unit 2 --latency-ms 400
//! ```

use anyhow::Result;
use api::asset::{AssetData, Erc20Asset};
use api::prefs::quote_prefs::QuotePrefs;
use api::quote_providers::fixed_rate::FixedRate;
use api::quote_providers::offline::Offline;
use api::quote_providers::QuoteProvider;
use api::token_amount::TokenAmount;
use clap::Parser;
use num_bigint::BigUint;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use ui::{QuoteState, QuoteStore, SelectedErc20AssetAmountInput};

#[derive(Parser, Debug)]
#[command(name = "quote-console")]
#[command(about = "Type token amounts and watch buy quotes arrive")]
struct Args {
    /// Symbol of the ERC20 token being bought
    #[arg(long, default_value = "ZRX")]
    symbol: String,

    /// Encoded asset data identifying the token
    #[arg(
        long,
        default_value = "0xf47261b0000000000000000000000000e41d2489571d322189246dafa5ebde1f4699f498"
    )]
    asset_data: String,

    /// Decimals of the token
    #[arg(long, default_value_t = 18)]
    decimals: u8,

    /// Price of one base unit, in wei
    #[arg(long, default_value = "1")]
    wei_per_base_unit: BigUint,

    /// Fee in basis points
    #[arg(long, default_value_t = 0)]
    fee_bps: u32,

    /// Worst-case slippage in basis points
    #[arg(long, default_value_t = 100)]
    slippage_bps: u32,

    /// Simulated provider round trip in milliseconds
    #[arg(long, env = "QUOTE_LATENCY_MS", default_value_t = 300)]
    latency_ms: u64,

    /// Largest amount the provider can fill, in whole tokens
    #[arg(long)]
    liquidity: Option<TokenAmount>,

    /// Also print every received quote as a JSON line
    #[arg(long)]
    json: bool,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let prefs = QuotePrefs::from_env();
    info!(?prefs, "starting quote console");

    let asset = Erc20Asset::new(AssetData::new(&args.asset_data), &args.symbol, args.decimals);

    let mut fixed_rate = FixedRate::new(args.wei_per_base_unit.clone())
        .with_fee(args.fee_bps)
        .with_slippage(args.slippage_bps)
        .with_latency(Duration::from_millis(args.latency_ms));
    if let Some(liquidity) = &args.liquidity {
        fixed_rate = fixed_rate.with_liquidity(liquidity.to_base_units(args.decimals)?);
    }
    let provider = api::build_quote_provider(&prefs, fixed_rate);

    let store = QuoteStore::with_provider(Some(provider.clone()));
    let input = SelectedErc20AssetAmountInput::new(store.clone(), &prefs);
    input.on_asset_selected(Some(asset.into()));

    tokio::spawn(render(store.clone(), args.symbol.clone(), args.json));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match line.trim() {
            ":quit" => break,
            ":offline" => {
                let offline: Arc<dyn QuoteProvider> = Arc::new(Offline);
                store.set_quote_provider(Some(offline));
            }
            ":online" => store.set_quote_provider(Some(provider.clone())),
            text => {
                if let Err(e) = input.on_amount_text(text) {
                    eprintln!("{text:?}: {e}");
                }
            }
        }
    }

    Ok(())
}

/// Prints a status line after every state change.
async fn render(store: QuoteStore, symbol: String, json: bool) {
    let mut rx = store.subscribe();
    let mut last_quote = None;
    while rx.changed().await.is_ok() {
        let state = rx.borrow_and_update().clone();
        println!("{}", status_line(&state, &symbol));

        let quote = state.latest_buy_quote();
        if json && quote.is_some() && quote != last_quote.as_ref() {
            match serde_json::to_string(&quote) {
                Ok(encoded) => println!("{encoded}"),
                Err(e) => tracing::warn!("cannot encode quote: {e}"),
            }
        }
        last_quote = quote.cloned();
    }
}

fn status_line(state: &QuoteState, symbol: &str) -> String {
    let status: &'static str = state.quote_request_state().into();
    let amount = state
        .selected_asset_amount()
        .map(|a| format!("{a} {symbol}"))
        .unwrap_or_else(|| "-".to_string());

    let mut line = format!("[{status}] amount: {amount}");
    if let Some(quote) = state.latest_buy_quote() {
        let eth = |wei: &BigUint| TokenAmount::from_base_units(wei.clone(), 18);
        line.push_str(&format!(
            " | total: {} ETH (worst case {} ETH)",
            eth(&quote.best_case_quote_info.total_eth_amount),
            eth(&quote.worst_case_quote_info.total_eth_amount),
        ));
    }
    if let Some(error) = state.latest_error().filter(|e| e.display.is_present()) {
        line.push_str(&format!(" | error: {}", error.message));
    }
    line
}
