//! CLI commands

use lending_core::Address;
use lending_events::{hash::verify_chain, EventReader};
use lending_protocol::{Keypair, PositionSnapshot};
use std::path::Path;

use crate::context::{AppContext, KEY_ENV};

/// Generate a new operator key
pub fn keygen(output: &Path) -> Result<(), anyhow::Error> {
    let keypair = Keypair::generate();
    let seed = keypair.seed_hex();

    std::fs::write(output, &seed)?;
    println!("✅ Generated key");
    println!("   Seed saved to: {}", output.display());
    println!("   Address: {}", keypair.address());
    println!();
    println!("To use: export {}={}", KEY_ENV, seed);
    Ok(())
}

/// Print the identity of the configured operator key
pub fn whoami(ctx: &AppContext) -> Result<(), anyhow::Error> {
    match &ctx.keypair {
        Some(keypair) => println!("{}", keypair.address()),
        None => anyhow::bail!("{} is not set", KEY_ENV),
    }
    Ok(())
}

/// Show one owner's position
pub async fn status(ctx: &AppContext, owner: &str) -> Result<(), anyhow::Error> {
    let owner: Address = owner.parse()?;
    let snapshot = ctx.protocol.position(&owner).await?;

    println!("Position of {}", owner);
    print_snapshot(&snapshot);
    Ok(())
}

/// List every position, optionally only the liquidatable ones
pub async fn positions(ctx: &AppContext, liquidatable_only: bool) -> Result<(), anyhow::Error> {
    let positions = if liquidatable_only {
        ctx.protocol.liquidatable_positions().await?
    } else {
        ctx.protocol.positions().await?
    };

    if positions.is_empty() {
        println!("No positions found");
        return Ok(());
    }

    println!("Positions ({}):", positions.len());
    println!("{:-<100}", "");
    println!(
        "{:<16} {:>18} {:>18} {:>18} {:>12}  {}",
        "OWNER", "COLLATERAL", "PRINCIPAL", "MAX BORROW", "HEALTH", "STATUS"
    );
    println!("{:-<100}", "");
    for p in &positions {
        println!(
            "{:<16} {:>18} {:>18} {:>18} {:>12}  {}",
            p.owner.short(),
            display_opt(p.collateral),
            display_opt(p.principal),
            p.max_borrowable.to_string(),
            display_opt(p.health_factor.map(|h| h.round_dp(4))),
            p.status
        );
    }
    Ok(())
}

/// Verify the journal hash chain
///
/// Runs without replaying, so a corrupted journal can still be inspected.
pub fn audit(journal_path: &Path) -> Result<(), anyhow::Error> {
    let reader = EventReader::from_directory(journal_path)?;
    let records = reader.read_all()?;

    match verify_chain(&records) {
        Ok(()) => {
            println!(
                "✅ Hash chain verified ({} records in {} files)",
                records.len(),
                reader.files().len()
            );
            Ok(())
        }
        Err(e) => {
            println!("❌ Hash chain broken: {}", e);
            Err(e.into())
        }
    }
}

/// Print the effective configuration
pub fn config(ctx: &AppContext) -> Result<(), anyhow::Error> {
    let config = ctx.protocol.config();
    println!("{}", serde_json::to_string_pretty(config)?);
    println!("collateral vault: {}", config.collateral_vault());
    println!("loan vault:       {}", config.loan_vault());
    Ok(())
}

fn print_snapshot(snapshot: &PositionSnapshot) {
    println!("  Status:         {}", snapshot.status);
    println!("  Collateral:     {}", display_opt(snapshot.collateral));
    println!("  Principal:      {}", display_opt(snapshot.principal));
    println!("  Max borrowable: {}", snapshot.max_borrowable);
    println!(
        "  Health factor:  {}",
        display_opt(snapshot.health_factor.map(|h| h.round_dp(4)))
    );
}

fn display_opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}
