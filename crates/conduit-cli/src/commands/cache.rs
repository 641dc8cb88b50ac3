//! Response cache commands

use crate::console::CliConsole;
use colored::*;
use conduit_core::config::ConduitConfig;
use conduit_core::error::ConduitResult;
use conduit_core::{ConduitCache, ResponseCache};

/// Print statistics for the configured cache namespace
pub async fn stats(config: &ConduitConfig) -> ConduitResult<()> {
    let console = CliConsole::new(true);
    let cache = ConduitCache::from_config(&config.cache)?;
    let stats = cache.cache_stats().await?;

    console.print_header(&format!("Cache '{}'", stats.cache_name));
    println!("  Entries:  {}", stats.total_entries.to_string().yellow());
    println!("  Size:     {}", format_bytes(stats.total_size_bytes).yellow());
    if config.cache.enable_disk_cache {
        println!(
            "  Location: {}",
            config.cache.resolved_disk_dir().display().to_string().cyan()
        );
    }
    if !config.cache.enabled {
        console.warn("Caching is disabled in the configuration");
    }
    Ok(())
}

/// Remove every entry in the configured namespace
pub async fn wipe(config: &ConduitConfig) -> ConduitResult<()> {
    let console = CliConsole::new(true);
    let cache = ConduitCache::from_config(&config.cache)?;
    let before = cache.cache_stats().await?.total_entries;
    cache.wipe().await?;
    console.success(&format!(
        "Wiped {} entr{} from cache '{}'",
        before,
        if before == 1 { "y" } else { "ies" },
        cache.name()
    ));
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} B", bytes)
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}
