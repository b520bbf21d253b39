//! `tessera config` — Configuration management commands.

use std::path::Path;

use tessera_config::AppConfig;

pub fn validate(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    println!("🔍 Validating configuration...");

    match super::load_config(config_path) {
        Ok(config) => {
            println!("   ✅ Config parsed successfully");

            let mut warnings = Vec::new();
            let context = &config.context;

            if context.max_tokens() < 100 {
                warnings.push("context.max_tokens below 100 leaves little room after headers");
            }
            if context.min_relevance() >= config.gather.history_relevance {
                warnings.push("context.min_relevance drops all conversation history");
            }
            if !context.enable_compression() {
                warnings.push("Compression disabled; output may exceed max_tokens");
            }

            if warnings.is_empty() {
                println!("   ✅ All checks passed");
            } else {
                println!();
                for w in &warnings {
                    println!("   ⚠️  {w}");
                }
            }

            println!();
            println!(
                "   Budget:    {} tokens ({} reserved for instructions)",
                context.max_tokens(),
                context.pinned_reserve()
            );
            println!(
                "   Weights:   relevance={:.2}, recency={:.2}",
                context.relevance_weight(),
                context.recency_weight()
            );
            println!(
                "   Memory:    {} items, {} min",
                config.working_memory.max_capacity, config.working_memory.max_age_minutes
            );
        }
        Err(e) => {
            println!("   ❌ Config error: {e}");
            return Err(e.into());
        }
    }

    Ok(())
}

pub fn show(config_path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    let config = super::load_config(config_path).map_err(|e| format!("Failed to load config: {e}"))?;
    println!("{}", config.to_toml());
    Ok(())
}

pub fn path() -> Result<(), Box<dyn std::error::Error>> {
    let config_path = AppConfig::config_dir().join("config.toml");
    println!("{}", config_path.display());
    Ok(())
}
