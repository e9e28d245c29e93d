use anyhow::Result;
use clap::Args;
use whaleshield::{Amount, AssetId, HttpAggregatorClient, SwapAggregator};

use crate::config::Settings;

#[derive(Args)]
pub struct QuoteSubCommand {
    /// Asset to sell, a mint address or SOL / USDC
    #[arg(short, long, default_value = "SOL")]
    input: AssetId,
    /// Asset to buy, a mint address or SOL / USDC
    #[arg(short, long, default_value = "USDC")]
    output: AssetId,
    /// Amount to sell in base units
    #[arg(short, long)]
    amount: Amount,
    /// Slippage tolerance in basis points
    #[arg(long)]
    slippage_bps: Option<u16>,
}

pub async fn quote(settings: &Settings, sub_command_args: &QuoteSubCommand) -> Result<()> {
    let client = HttpAggregatorClient::new(settings.aggregator.clone())?;

    let quote = client
        .get_quote(
            &sub_command_args.input,
            &sub_command_args.output,
            sub_command_args.amount,
            sub_command_args
                .slippage_bps
                .unwrap_or(settings.trade.slippage_bps),
        )
        .await?;

    println!("{}", serde_json::to_string_pretty(&quote)?);

    Ok(())
}
