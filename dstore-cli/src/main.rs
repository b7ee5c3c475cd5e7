use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use dstore_client::{ClientConfig, Dataset};
use dstore_core::{Entity, Key, Operator, Query};
use futures::TryStreamExt;
use tracing::debug;
use tracing_subscriber::EnvFilter;

mod json;
mod table;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    /// Table format (default)
    Table,
    /// Pretty JSON
    Json,
    /// JSON Lines (one entity per line)
    Jsonl,
}

#[derive(Parser)]
#[command(name = "dstore")]
#[command(about = "dstore CLI", long_about = None)]
struct Cli {
    /// Project whose dataset is addressed
    #[arg(long, env = "DSTORE_PROJECT")]
    project: String,

    /// API host, e.g. http://localhost:8081 for an emulator
    #[arg(long, env = "DSTORE_API_HOST")]
    api_host: Option<String>,

    /// Bearer token sent with every request
    #[arg(long, env = "DSTORE_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Namespace used when a key or query names none
    #[arg(long, env = "DSTORE_NAMESPACE")]
    namespace: Option<String>,

    /// Output format (table, json, jsonl)
    #[arg(short, long, value_enum, default_value = "table", global = true)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch entities by key
    Get {
        /// Keys such as `Task:#12` or `List:home/Task:chores`
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Save an entity; an incomplete key gets an id assigned
    Put {
        /// Key such as `Task:chores` or `Task` for a new id
        key: String,
        /// Properties as a JSON object
        properties: String,
    },
    /// Delete entities by key
    Delete {
        #[arg(required = true)]
        keys: Vec<String>,
    },
    /// Run a query over a kind
    Query {
        /// Kind to query
        kind: String,
        /// Property filter such as `done=false` or `priority>=3`
        #[arg(short, long)]
        filter: Vec<String>,
        /// Sort order; prefix with `-` for descending
        #[arg(long)]
        order: Vec<String>,
        /// Maximum number of entities to return
        #[arg(short, long)]
        limit: Option<u32>,
        /// Resume from a cursor printed by a previous page
        #[arg(long)]
        start: Option<String>,
        /// Follow cursors and fetch every page
        #[arg(long)]
        all: bool,
    },
    /// Reserve ids for an incomplete key
    AllocateIds {
        /// Incomplete key such as `Task` or `List:home/Task`
        key: String,
        /// Number of ids
        #[arg(short = 'n', long, default_value = "1")]
        count: usize,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Default to warn level, can override with RUST_LOG env var
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let mut config = ClientConfig::new(&cli.project);
    if let Some(host) = &cli.api_host {
        config = config.with_api_host(host);
    }
    if let Some(namespace) = &cli.namespace {
        config = config.with_namespace(namespace);
    }
    let dataset = Dataset::connect(config, cli.token.clone()).context("Failed to configure client")?;

    match cli.command {
        Commands::Get { keys } => {
            let keys = parse_keys(&keys, cli.namespace.as_deref())?;
            let entities = dataset.get_multi(&keys).await.context("Failed to get entities")?;
            if entities.is_empty() {
                println!("No entities found");
            } else {
                print_entities(&entities, cli.output)?;
            }
        }

        Commands::Put { key, properties } => {
            let key = parse_key(&key, cli.namespace.as_deref())?;
            let json: serde_json::Value =
                serde_json::from_str(&properties).context("Invalid JSON")?;
            let mut entity = Entity::new(key, json::json_to_properties(&json)?);

            dataset.save(&mut entity).await.context("Failed to save entity")?;
            println!("Entity stored: {}", entity.key);
        }

        Commands::Delete { keys } => {
            let keys = parse_keys(&keys, cli.namespace.as_deref())?;
            dataset.delete_multi(&keys).await.context("Failed to delete entities")?;
            println!("Deleted {} entities", keys.len());
        }

        Commands::Query {
            kind,
            filter,
            order,
            limit,
            start,
            all,
        } => {
            let query = build_query(kind, &filter, &order, limit, start)?;
            debug!("Running query: {:?}", query);

            if all {
                let entities: Vec<Entity> = dataset
                    .run_query_stream(query)
                    .try_collect()
                    .await
                    .context("Failed to run query")?;
                print_entities(&entities, cli.output)?;
            } else {
                let (entities, cursor) = dataset
                    .run_query(&query)
                    .await
                    .context("Failed to run query")?;
                print_entities(&entities, cli.output)?;
                if !cursor.is_empty() {
                    eprintln!("Next page: --start {}", cursor);
                }
            }
        }

        Commands::AllocateIds { key, count } => {
            let key = parse_key(&key, cli.namespace.as_deref())?;
            let keys = dataset
                .allocate_ids(&key, count)
                .await
                .context("Failed to allocate ids")?;
            match cli.output {
                OutputFormat::Table => println!("{}", table::format_keys_table(&keys)),
                OutputFormat::Json => {
                    let names: Vec<String> = keys.iter().map(Key::to_string).collect();
                    println!("{}", serde_json::to_string_pretty(&names)?);
                }
                OutputFormat::Jsonl => {
                    for key in &keys {
                        println!("{}", serde_json::to_string(&key.to_string())?);
                    }
                }
            }
        }
    }

    Ok(())
}

fn parse_key(text: &str, namespace: Option<&str>) -> Result<Key> {
    let key = Key::parse(text).with_context(|| format!("Invalid key '{}'", text))?;
    Ok(match namespace {
        Some(ns) => key.in_namespace(ns),
        None => key,
    })
}

fn parse_keys(texts: &[String], namespace: Option<&str>) -> Result<Vec<Key>> {
    texts.iter().map(|t| parse_key(t, namespace)).collect()
}

/// Split `property<op>value`, trying two-character operators first
fn parse_filter(text: &str) -> Result<(String, Operator, dstore_core::Value)> {
    for symbol in [">=", "<=", "=", "<", ">"] {
        if let Some((property, operand)) = text.split_once(symbol) {
            let property = property.trim();
            if property.is_empty() {
                bail!("Filter '{}' has no property", text);
            }
            let operator: Operator = symbol.parse()?;
            return Ok((property.to_string(), operator, json::parse_operand(operand.trim())?));
        }
    }
    bail!("Filter '{}' has no operator (expected one of = < <= > >=)", text)
}

fn build_query(
    kind: String,
    filters: &[String],
    orders: &[String],
    limit: Option<u32>,
    start: Option<String>,
) -> Result<Query> {
    let mut query = Query::new(kind);
    for text in filters {
        let (property, operator, value) = parse_filter(text)?;
        query = query.filter(property, operator, value);
    }
    for order in orders {
        query = query.order(order);
    }
    if let Some(limit) = limit {
        query = query.limit(limit);
    }
    if let Some(cursor) = start {
        query = query.start(cursor);
    }
    Ok(query)
}

fn print_entities(entities: &[Entity], output: OutputFormat) -> Result<()> {
    match output {
        OutputFormat::Table => {
            println!("{}", table::format_entities_table(entities));
            println!();
            println!("Count: {}", entities.len());
        }
        OutputFormat::Json => {
            let json: Vec<_> = entities.iter().map(json::entity_to_json).collect();
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Jsonl => {
            for entity in entities {
                println!("{}", serde_json::to_string(&json::entity_to_json(entity))?);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use dstore_core::Value;

    #[test]
    fn test_parse_filter() {
        let (property, operator, value) = parse_filter("priority>=3").unwrap();
        assert_eq!(property, "priority");
        assert_eq!(operator, Operator::GreaterThanOrEqual);
        assert_eq!(value, Value::Integer(3));

        let (property, operator, value) = parse_filter("title = chores").unwrap();
        assert_eq!(property, "title");
        assert_eq!(operator, Operator::Equal);
        assert_eq!(value, Value::from("chores"));

        assert!(parse_filter("title").is_err());
        assert!(parse_filter("=3").is_err());
    }

    #[test]
    fn test_build_query() {
        let query = build_query(
            "Task".to_string(),
            &["done=false".to_string()],
            &["-priority".to_string()],
            Some(10),
            None,
        )
        .unwrap();
        assert_eq!(query.kinds, vec!["Task".to_string()]);
        assert_eq!(query.filters.len(), 1);
        assert_eq!(query.orders.len(), 1);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_parse_key_applies_namespace() {
        let key = parse_key("Task:#4", Some("tenant")).unwrap();
        assert_eq!(key.namespace.as_deref(), Some("tenant"));
        assert!(parse_key("", None).is_err());
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from([
            "dstore",
            "--project",
            "p",
            "query",
            "Task",
            "--filter",
            "done=false",
            "--limit",
            "5",
        ])
        .unwrap();
        match cli.command {
            Commands::Query { kind, limit, .. } => {
                assert_eq!(kind, "Task");
                assert_eq!(limit, Some(5));
            }
            _ => panic!("expected query"),
        }
    }
}
