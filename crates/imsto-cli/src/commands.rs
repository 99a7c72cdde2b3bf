use std::io::Write;
use std::path::Path;

use anyhow::Context;
use colored::Colorize;
use imsto_config::StoreConfig;
use imsto_sdk::{EngineRegistry, ListSpec, SniffCodec, Storage};
use serde_json::json;
use tracing::debug;

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let registry = EngineRegistry::with_builtin().context("engine registration failed")?;
    let format = cli.format;
    match cli.command {
        Command::Id(args) => cmd_id(args, format),
        Command::Engines => cmd_engines(&registry, format),
        Command::Roofs => cmd_roofs(&load_config(cli.conf.as_deref())?, format),
        command => {
            let config = load_config(cli.conf.as_deref())?;
            let storage = Storage::new(registry, config, SniffCodec);
            match command {
                Command::Put(args) => cmd_put(&storage, args, format),
                Command::Get(args) => cmd_get(&storage, args),
                Command::Exists(args) => cmd_exists(&storage, args, format),
                Command::Delete(args) => cmd_delete(&storage, args, format),
                Command::Meta(args) => cmd_meta(&storage, args, format),
                Command::List(args) => cmd_list(&storage, args, format),
                Command::Id(_) | Command::Engines | Command::Roofs => Ok(()),
            }
        }
    }
}

fn load_config(conf: Option<&Path>) -> anyhow::Result<StoreConfig> {
    let config = match conf {
        Some(dir) => StoreConfig::load(dir),
        None => StoreConfig::load_from_env(),
    }
    .context("failed to load configuration")?;
    debug!(sections = config.section_names().count(), "configuration ready");
    Ok(config.with_env_overrides(std::env::vars()))
}

fn print_json(value: &serde_json::Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn cmd_put(storage: &Storage, args: PutArgs, format: OutputFormat) -> anyhow::Result<()> {
    let raw = std::fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let stored = storage.store(&args.roof, &raw)?;
    match format {
        OutputFormat::Json => print_json(&json!({
            "id": stored.entry.id().as_str(),
            "key": stored.key(),
            "deduplicated": stored.deduplicated,
            "meta": stored.meta,
        })),
        OutputFormat::Text => {
            let status = if stored.deduplicated { "exists".yellow() } else { "stored".green() };
            println!("{} {} {}", "✓".green().bold(), status, stored.entry.id().to_string().bold());
            println!("  Key: {}", stored.key().cyan());
            println!("  Size: {} bytes", stored.entry.size());
            println!("  Type: {}", stored.entry.mime());
            if stored.entry.lineage().is_normalized() {
                println!("  Raw id: {}", stored.entry.lineage().raw().id.to_string().dimmed());
            }
            Ok(())
        }
    }
}

fn cmd_get(storage: &Storage, args: GetArgs) -> anyhow::Result<()> {
    let data = storage.fetch(&args.roof, &args.id)?;
    match &args.output {
        Some(path) => {
            std::fs::write(path, &data)
                .with_context(|| format!("cannot write {}", path.display()))?;
            eprintln!("{} {} bytes → {}", "✓".green(), data.len(), path.display());
        }
        None => std::io::stdout().lock().write_all(&data)?,
    }
    Ok(())
}

fn cmd_exists(storage: &Storage, args: TargetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let found = storage.exists(&args.roof, &args.id)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": args.id, "exists": found })),
        OutputFormat::Text => {
            if found {
                println!("{} {}", args.id.bold(), "exists".green());
            } else {
                println!("{} {}", args.id.bold(), "not found".red());
            }
            Ok(())
        }
    }
}

fn cmd_delete(storage: &Storage, args: TargetArgs, format: OutputFormat) -> anyhow::Result<()> {
    storage.delete(&args.roof, &args.id)?;
    match format {
        OutputFormat::Json => print_json(&json!({ "id": args.id, "deleted": true })),
        OutputFormat::Text => {
            println!("{} Deleted {}", "✓".green().bold(), args.id.yellow());
            Ok(())
        }
    }
}

fn cmd_meta(storage: &Storage, args: TargetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let meta = storage.meta(&args.roof, &args.id)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&meta)?),
        OutputFormat::Text => {
            for (key, value) in meta.iter() {
                let value = value.as_str().map_or_else(|| value.to_string(), str::to_string);
                println!("{}: {}", key.bold(), value);
            }
            Ok(())
        }
    }
}

fn cmd_list(storage: &Storage, args: ListArgs, format: OutputFormat) -> anyhow::Result<()> {
    let mut spec = ListSpec::new().limit(args.limit);
    if let Some(prefix) = args.prefix {
        spec = spec.prefix(prefix);
    }
    if let Some(marker) = args.marker {
        spec = spec.marker(marker);
    }
    if let Some(delimiter) = args.delimiter {
        spec = spec.delimiter(delimiter);
    }
    let items = storage.list(&args.roof, &spec)?;
    match format {
        OutputFormat::Json => print_json(&serde_json::to_value(&items)?),
        OutputFormat::Text => {
            if items.is_empty() {
                println!("No objects.");
            }
            for item in &items {
                if item.is_prefix {
                    println!("{:>10}  {}", "DIR".blue(), item.key.blue().bold());
                } else {
                    println!(
                        "{:>10}  {}  {}  {}",
                        item.size,
                        item.last_modified.format("%Y-%m-%d %H:%M:%S").to_string().dimmed(),
                        item.etag.dimmed(),
                        item.key
                    );
                }
            }
            Ok(())
        }
    }
}

fn cmd_id(args: IdArgs, format: OutputFormat) -> anyhow::Result<()> {
    let (input, output) = match &args.action {
        IdAction::Encode { hash } => (hash, imsto_types::encode(hash)?),
        IdAction::Decode { id } => (id, imsto_types::decode(id)?),
    };
    match format {
        OutputFormat::Json => print_json(&json!({ "input": input, "output": output })),
        OutputFormat::Text => {
            println!("{output}");
            Ok(())
        }
    }
}

fn cmd_engines(registry: &EngineRegistry, format: OutputFormat) -> anyhow::Result<()> {
    let names = registry.engine_names();
    match format {
        OutputFormat::Json => print_json(&json!(names)),
        OutputFormat::Text => {
            for name in names {
                println!("  {}", name.cyan());
            }
            Ok(())
        }
    }
}

fn cmd_roofs(config: &StoreConfig, format: OutputFormat) -> anyhow::Result<()> {
    let roofs = config.administrable_sections();
    match format {
        OutputFormat::Json => print_json(&json!(roofs)),
        OutputFormat::Text => {
            if roofs.is_empty() {
                println!("No administrable roofs.");
            }
            for (roof, label) in &roofs {
                println!("  {}  {}", roof.yellow().bold(), label);
            }
            Ok(())
        }
    }
}
