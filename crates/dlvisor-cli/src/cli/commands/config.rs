//! `dlvisor config` – show where the config lives and what it resolves to.

use anyhow::Result;
use dlvisor_core::config::{self, SupervisorConfig};

pub fn run_config(cfg: &SupervisorConfig) -> Result<()> {
    let path = config::config_path()?;
    println!("# {}", path.display());
    print!("{}", cfg.to_toml()?);
    Ok(())
}
