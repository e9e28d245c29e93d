use anyhow::Result;
use whaleshield::EphemeralIdentity;

pub fn new_identity() -> Result<()> {
    let identity = EphemeralIdentity::generate()?;

    println!("{}", identity.address());

    Ok(())
}
