use anyhow::{bail, Result};
use clap::Args;
use whaleshield::{Amount, AssetId, TradeConfig, TradeEngine, TradeRequest};
use whaleshield_common::ShieldedPool;
use whaleshield_fake::{FakeAggregator, FakeLedger, FakeShieldedPool};

use crate::config::Settings;

/// Rate denominator, rates are resolved to parts per trillion
const RATE_SCALE: u64 = 1_000_000_000_000;

#[derive(Args)]
pub struct SimulateSubCommand {
    /// Lamports to swap
    #[arg(short, long)]
    amount: Amount,
    /// Asset to buy, a mint address or SOL / USDC
    #[arg(short, long, default_value = "USDC")]
    output: AssetId,
    /// Output units per input unit
    #[arg(short, long, default_value_t = 1.0)]
    rate: f64,
    /// Balance polls before withdrawn funds land
    #[arg(long, default_value_t = 1)]
    arrival_delay: u32,
    /// Reject the reshield deposit, then recover the stranded funds
    #[arg(long)]
    fail_reshield: bool,
}

pub async fn simulate(settings: &Settings, sub_command_args: &SimulateSubCommand) -> Result<()> {
    if !sub_command_args.rate.is_finite() || sub_command_args.rate < 0.0 {
        bail!("Rate must be a non-negative number");
    }

    let ledger = FakeLedger::with_arrival_delay(sub_command_args.arrival_delay);
    let pool = FakeShieldedPool::new(ledger.clone(), sub_command_args.amount);
    let aggregator = FakeAggregator::new(ledger.clone()).with_rate(
        (sub_command_args.rate * RATE_SCALE as f64).round() as u64,
        RATE_SCALE,
    );

    pool.set_reject_deposits(sub_command_args.fail_reshield);

    let engine = TradeEngine::builder()
        .pool(pool.clone())
        .ledger(ledger.clone())
        .aggregator(aggregator)
        .config(TradeConfig {
            poll_interval_secs: 0,
            ..settings.trade.clone()
        })
        .build()?;

    let request = TradeRequest::new(
        AssetId::native(),
        sub_command_args.output.clone(),
        sub_command_args.amount,
    )?;

    let result = engine
        .execute_private_swap(request, |progress| {
            println!(
                "[{:>3}%] {}: {}",
                progress.step.percent(),
                progress.step,
                progress.message
            );
        })
        .await;

    match result {
        Ok(outcome) => {
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Err(err) => {
            let stranded = engine.stranded().await;
            if stranded.is_empty() {
                return Err(err.into());
            }

            println!("Stranded funds:");
            println!("{}", serde_json::to_string_pretty(&stranded)?);

            pool.set_reject_deposits(false);
            for funds in stranded {
                match engine.retry_reshield(funds.operation_id).await? {
                    Some(deposit_ref) => println!(
                        "Recovered {} {} from {}: {}",
                        funds.amount, funds.asset, funds.address, deposit_ref
                    ),
                    None => println!("Nothing to recover at {}", funds.address),
                }
            }
        }
    }

    println!("Shielded balance: {}", pool.private_balance().await?);
    if !sub_command_args.output.is_native() {
        println!(
            "Shielded {}: {}",
            sub_command_args.output,
            pool.shielded_balance(&sub_command_args.output).await
        );
    }

    Ok(())
}
