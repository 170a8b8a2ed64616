use std::time::Duration;

use anyhow::Context;
use colored::Colorize;
use hdx_sdk::{
    Entity, Filters, Hackdex, InitOutcome, NamingKey, Record, RecordId, ResilientStore,
    ServeMode, Served, StorageConfig,
};
use serde::Serialize;

use crate::cli::*;

/// How long to wait for abandoned primary attempts before exiting.
const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => StorageConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => StorageConfig::from_env()?,
    };
    let hackdex = Hackdex::from_config(&config);
    let out = Output { format: cli.format };

    let result = match cli.command {
        Command::Init => cmd_init(&hackdex, &out).await,
        Command::Create(args) => match args.kind {
            Kind::Hackathon => cmd_create(hackdex.hackathons(), &args.data, &out).await,
            Kind::Project => cmd_create(hackdex.projects(), &args.data, &out).await,
            Kind::Profile => cmd_create(hackdex.profiles(), &args.data, &out).await,
        },
        Command::Get(args) => match args.kind {
            Kind::Hackathon => cmd_get(hackdex.hackathons(), &args.id, &out).await,
            Kind::Project => cmd_get(hackdex.projects(), &args.id, &out).await,
            Kind::Profile => cmd_get(hackdex.profiles(), &args.id, &out).await,
        },
        Command::Update(args) => match args.kind {
            Kind::Hackathon => cmd_update(hackdex.hackathons(), &args.id, &args.patch, &out).await,
            Kind::Project => cmd_update(hackdex.projects(), &args.id, &args.patch, &out).await,
            Kind::Profile => cmd_update(hackdex.profiles(), &args.id, &args.patch, &out).await,
        },
        Command::Delete(args) => match args.kind {
            Kind::Hackathon => cmd_delete(hackdex.hackathons(), &args.id, &out).await,
            Kind::Project => cmd_delete(hackdex.projects(), &args.id, &out).await,
            Kind::Profile => cmd_delete(hackdex.profiles(), &args.id, &out).await,
        },
        Command::List(args) => match args.kind {
            Kind::Hackathon => cmd_list(hackdex.hackathons(), &out).await,
            Kind::Project => cmd_list(hackdex.projects(), &out).await,
            Kind::Profile => cmd_list(hackdex.profiles(), &out).await,
        },
        Command::Search(args) => {
            let filters: Filters = args.filters.into_iter().collect();
            match args.kind {
                Kind::Hackathon => cmd_search(hackdex.hackathons(), &args.query, &filters, &out).await,
                Kind::Project => cmd_search(hackdex.projects(), &args.query, &filters, &out).await,
                Kind::Profile => cmd_search(hackdex.profiles(), &args.query, &filters, &out).await,
            }
        }
        Command::Orphans(args) => match args.kind {
            Kind::Hackathon => cmd_orphans(hackdex.hackathons(), &out).await,
            Kind::Project => cmd_orphans(hackdex.projects(), &out).await,
            Kind::Profile => cmd_orphans(hackdex.profiles(), &out).await,
        },
    };

    let report = hackdex.shutdown(SHUTDOWN_GRACE).await;
    if report.outstanding > 0 {
        eprintln!(
            "{} {} primary write(s) still running at exit were aborted",
            "!".yellow().bold(),
            report.outstanding
        );
    }
    result
}

struct Output {
    format: OutputFormat,
}

impl Output {
    fn json<T: Serialize>(&self, served: &Served<T>) -> anyhow::Result<bool> {
        if self.format == OutputFormat::Json {
            println!("{}", serde_json::to_string_pretty(served)?);
            return Ok(true);
        }
        Ok(false)
    }

    fn mode(&self, mode: &ServeMode) {
        let label = mode.to_string();
        let label = if mode.is_primary() {
            label.green()
        } else {
            label.yellow()
        };
        println!("  served by: {label}");
    }
}

fn parse_id(id: &str) -> anyhow::Result<RecordId> {
    id.parse().with_context(|| format!("invalid record id {id:?}"))
}

fn print_entity<R: Record>(entity: &Entity<R>) {
    let status = entity.payload().status().unwrap_or_default();
    println!(
        "{}  {}  {}  {}",
        entity.id().short_id().cyan(),
        entity.payload().title().bold(),
        status.yellow(),
        entity.updated_at().format("%Y-%m-%d %H:%M").to_string().dimmed()
    );
}

async fn cmd_init(hackdex: &Hackdex, out: &Output) -> anyhow::Result<()> {
    let served = hackdex.initialize().await?;
    if out.json(&served)? {
        return Ok(());
    }
    match &served.value {
        Some(outcome) => {
            let verb = match outcome {
                InitOutcome::Existing(_) => "Found",
                InitOutcome::Adopted(_) => "Adopted",
                InitOutcome::Created(_) => "Created",
            };
            println!(
                "{} {verb} master index {}",
                "✓".green().bold(),
                outcome.key().name.bold()
            );
            println!("  key id: {}", outcome.key().id.cyan());
            if let Some(url) = hackdex.gateway_url().await? {
                println!("  gateway: {url}");
            }
        }
        None => println!("{} Master index not reachable", "!".yellow().bold()),
    }
    out.mode(&served.mode);
    Ok(())
}

async fn cmd_create<R: Record>(
    store: &ResilientStore<R>,
    data: &str,
    out: &Output,
) -> anyhow::Result<()> {
    let payload: R = serde_json::from_str(data)
        .with_context(|| format!("{} payload is not valid", R::KIND))?;
    let served = store.create(payload).await?;
    if out.json(&served)? {
        return Ok(());
    }
    println!("{} Created {} {}", "✓".green().bold(), R::KIND, served.value.to_string().cyan());
    out.mode(&served.mode);
    Ok(())
}

async fn cmd_get<R: Record>(store: &ResilientStore<R>, id: &str, out: &Output) -> anyhow::Result<()> {
    let served = store.get_by_id(&parse_id(id)?).await?;
    if out.json(&served)? {
        return Ok(());
    }
    match &served.value {
        Some(entity) => {
            print_entity(entity);
            println!("  key: {} ({})", entity.name_pointer.name, entity.name_pointer.id);
            println!("  content: {}", entity.content_hash);
            println!("{}", serde_json::to_string_pretty(entity.payload())?);
        }
        None => println!("No {} with id {}", R::KIND, id.cyan()),
    }
    out.mode(&served.mode);
    Ok(())
}

async fn cmd_update<R: Record>(
    store: &ResilientStore<R>,
    id: &str,
    patch: &str,
    out: &Output,
) -> anyhow::Result<()> {
    let patch: serde_json::Value = serde_json::from_str(patch).context("patch is not JSON")?;
    let served = store.update(&parse_id(id)?, patch).await?;
    if out.json(&served)? {
        return Ok(());
    }
    if served.value {
        println!("{} Updated {} {}", "✓".green().bold(), R::KIND, id.cyan());
    } else {
        println!("No {} with id {}", R::KIND, id.cyan());
    }
    out.mode(&served.mode);
    Ok(())
}

async fn cmd_delete<R: Record>(store: &ResilientStore<R>, id: &str, out: &Output) -> anyhow::Result<()> {
    let served = store.delete(&parse_id(id)?).await?;
    if out.json(&served)? {
        return Ok(());
    }
    if served.value {
        println!("{} Deleted {} {}", "✓".green().bold(), R::KIND, id.cyan());
    } else {
        println!("No {} with id {}", R::KIND, id.cyan());
    }
    out.mode(&served.mode);
    Ok(())
}

fn print_entities<R: Record>(served: &Served<Vec<Entity<R>>>, out: &Output) {
    if served.value.is_empty() {
        println!("No {} records.", R::KIND);
    }
    for entity in &served.value {
        print_entity(entity);
    }
    out.mode(&served.mode);
}

async fn cmd_list<R: Record>(store: &ResilientStore<R>, out: &Output) -> anyhow::Result<()> {
    let served = store.list().await?;
    if !out.json(&served)? {
        print_entities(&served, out);
    }
    Ok(())
}

async fn cmd_search<R: Record>(
    store: &ResilientStore<R>,
    query: &str,
    filters: &Filters,
    out: &Output,
) -> anyhow::Result<()> {
    let served = store.search(query, filters).await?;
    if !out.json(&served)? {
        print_entities(&served, out);
    }
    Ok(())
}

async fn cmd_orphans<R: Record>(store: &ResilientStore<R>, out: &Output) -> anyhow::Result<()> {
    let served: Served<Vec<NamingKey>> = store.orphaned_keys().await?;
    if out.json(&served)? {
        return Ok(());
    }
    if served.value.is_empty() {
        println!("No orphaned {} keys.", R::KIND);
    }
    for key in &served.value {
        println!("{}  {}", key.name.bold(), key.id.dimmed());
    }
    out.mode(&served.mode);
    Ok(())
}
