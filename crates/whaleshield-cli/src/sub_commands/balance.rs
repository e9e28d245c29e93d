use anyhow::Result;
use clap::Args;
use whaleshield::{Address, Amount, LedgerConnector, RpcClient};

use crate::config::Settings;

#[derive(Args)]
pub struct BalanceSubCommand {
    /// Base58 address
    address: Address,
}

pub async fn balance(settings: &Settings, sub_command_args: &BalanceSubCommand) -> Result<()> {
    let client = RpcClient::new(settings.rpc.clone())?;

    let balance = client.get_balance(&sub_command_args.address).await?;

    println!(
        "{}: {} lamports ({} SOL)",
        sub_command_args.address,
        balance,
        balance.to_u64() as f64 / Amount::LAMPORTS_PER_SOL as f64
    );

    Ok(())
}
