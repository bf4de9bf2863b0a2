//! confprov CLI - query configuration directories from the command line
//!
//! Usage:
//!   confprov --manifest providers.yaml fetch local database host
//!   confprov -i local=./configs fetch database '*'
//!   confprov -i local=./configs health --format json

use clap::{Parser, Subcommand};
use colored::Colorize;
use confprov_core::{
    FetchResponse, FileStore, Health, HealthStatus, InstanceEntry, Manifest, Provider, VALUE_KEY,
};
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

/// confprov - Multi-instance configuration provider
#[derive(Parser)]
#[command(name = "confprov")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Manifest listing provider instances to initialize
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Declare an instance inline as ALIAS=DIRECTORY (repeatable)
    #[arg(short = 'i', long = "instance", value_name = "ALIAS=DIRECTORY", global = true)]
    instances: Vec<String>,

    /// Document format: yaml, json
    #[arg(long, default_value = "yaml", global = true)]
    documents: String,

    /// Override the recognized file extensions (repeatable)
    #[arg(long = "ext", value_name = "EXTENSION", global = true)]
    extensions: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a value by path: [alias] file [key...], '*' merges all files
    Fetch {
        /// Path segments
        #[arg(required = true)]
        path: Vec<String>,

        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Initialize instances and report health
    Health {
        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Print provider version and type
    Info {
        /// Output format: text, json, yaml
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Initialize instances and list their files
    List,
}

/// Run the CLI with the process arguments
pub fn run() -> ExitCode {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_env("CONFPROV_LOG"))
        .with_writer(std::io::stderr)
        .init();

    let provider = match build_provider(&cli) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("{}", e.red());
            return ExitCode::from(2);
        }
    };

    let code = match cli.command {
        Commands::Fetch { path, format } => cmd_fetch(&provider, &path, &format),
        Commands::Health { format } => cmd_health(&provider, &format),
        Commands::Info { format } => cmd_info(&provider, &format),
        Commands::List => cmd_list(&provider),
    };

    provider.shutdown();
    code
}

fn build_provider(cli: &Cli) -> Result<Provider, String> {
    let store = match cli.documents.as_str() {
        "yaml" | "yml" => FileStore::yaml(),
        "json" => FileStore::json(),
        other => {
            return Err(format!(
                "Unsupported document format: {}. Use yaml or json.",
                other
            ))
        }
    };
    let store = if cli.extensions.is_empty() {
        store
    } else {
        store.with_extensions(cli.extensions.iter().cloned())
    };
    let provider = Provider::new(Arc::new(store));

    // Manifest entries resolve against the manifest file
    if let Some(path) = &cli.manifest {
        let manifest = load_manifest(path)?;
        provider
            .init_manifest(&manifest)
            .map_err(|e| format!("Failed to initialize {}: {}", path.display(), e))?;
    }

    // Inline entries resolve against the working directory
    for decl in &cli.instances {
        let entry = parse_instance(decl)?;
        provider
            .init(&entry.alias, &entry.config, None)
            .map_err(|e| format!("Failed to initialize instance '{}': {}", entry.alias, e))?;
    }

    Ok(provider)
}

fn load_manifest(path: &Path) -> Result<Manifest, String> {
    let manifest = Manifest::from_file(path)
        .map_err(|e| format!("Failed to load manifest {}: {}", path.display(), e))?;
    log::debug!(
        "Loaded manifest {} with {} instance(s)",
        path.display(),
        manifest.instances.len()
    );
    Ok(manifest)
}

fn parse_instance(decl: &str) -> Result<InstanceEntry, String> {
    match decl.split_once('=') {
        Some((alias, directory)) if !alias.is_empty() && !directory.is_empty() => {
            Ok(InstanceEntry::new(alias, directory))
        }
        _ => Err(format!(
            "Invalid instance declaration '{}': expected ALIAS=DIRECTORY",
            decl
        )),
    }
}

fn cmd_fetch(provider: &Provider, path: &[String], format: &str) -> ExitCode {
    let response = match provider.fetch(path) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{} [{}] {}", "Error".red(), e.status(), e);
            return ExitCode::from(1);
        }
    };

    emit(render_fetch(&response, format))
}

fn render_fetch(response: &FetchResponse, format: &str) -> Result<String, String> {
    match format {
        "json" => response
            .to_json()
            .map_err(|e| e.to_string())
            .and_then(|v| serde_json::to_string_pretty(&v).map_err(|e| e.to_string()))
            .map(|s| s + "\n"),
        "yaml" => serde_yaml::to_string(response).map_err(|e| e.to_string()),
        "text" => render_text(&response.value),
        other => Err(unsupported_format(other)),
    }
}

fn cmd_health(provider: &Provider, format: &str) -> ExitCode {
    let health = provider.health();
    if format == "text" {
        println!("{}", health_line(&health));
        return ExitCode::SUCCESS;
    }
    emit(render_structured(&health, format))
}

fn cmd_info(provider: &Provider, format: &str) -> ExitCode {
    let info = provider.info();
    if format == "text" {
        println!("{} {}", info.provider_type, info.version);
        return ExitCode::SUCCESS;
    }
    emit(render_structured(&info, format))
}

fn cmd_list(provider: &Provider) -> ExitCode {
    provider.with_registry(|registry| {
        if registry.is_empty() {
            println!("{}", "No provider instances initialized".yellow());
        }
        for instance in registry.instances() {
            println!(
                "{} {}",
                instance.alias().bold(),
                instance.directory().display()
            );
            for (name, path) in instance.files() {
                let file_name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                println!("  {} ({})", name, file_name);
            }
        }
    });
    ExitCode::SUCCESS
}

fn emit(rendered: Result<String, String>) -> ExitCode {
    match rendered {
        Ok(content) => {
            print!("{}", content);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{}: {}", "Error".red(), e);
            ExitCode::from(1)
        }
    }
}

fn health_line(health: &Health) -> String {
    match health.status {
        HealthStatus::Ok => format!("{} {}", "✓".green(), health.message),
        HealthStatus::Degraded => format!("{} {}", "!".yellow(), health.message),
    }
}

fn render_structured<T: Serialize>(value: &T, format: &str) -> Result<String, String> {
    match format {
        "json" => serde_json::to_string_pretty(value)
            .map(|s| s + "\n")
            .map_err(|e| e.to_string()),
        "yaml" => serde_yaml::to_string(value).map_err(|e| e.to_string()),
        other => Err(unsupported_format(other)),
    }
}

fn unsupported_format(format: &str) -> String {
    format!("Unsupported format: {}. Use text, json, or yaml.", format)
}

/// A lone wrapped scalar prints bare; anything else prints as YAML
fn render_text(value: &confprov_core::Mapping) -> Result<String, String> {
    if value.len() == 1 {
        if let Some(scalar) = value.get(VALUE_KEY).filter(|v| v.is_scalar()) {
            return Ok(format!("{}\n", scalar));
        }
    }
    serde_yaml::to_string(value).map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use confprov_core::{Mapping, Value};

    #[test]
    fn test_parse_instance() {
        let entry = parse_instance("local=./configs").unwrap();
        assert_eq!(entry, InstanceEntry::new("local", "./configs"));

        // Only the first '=' separates alias from directory
        let entry = parse_instance("odd=dir=name").unwrap();
        assert_eq!(entry, InstanceEntry::new("odd", "dir=name"));

        assert!(parse_instance("local").is_err());
        assert!(parse_instance("=./configs").is_err());
        assert!(parse_instance("local=").is_err());
    }

    #[test]
    fn test_render_text_scalar() {
        let mut value = Mapping::new();
        value.insert(VALUE_KEY.into(), Value::from("myapp"));
        assert_eq!(render_text(&value).unwrap(), "myapp\n");
    }

    #[test]
    fn test_render_text_mapping_as_yaml() {
        let mut value = Mapping::new();
        value.insert("host".into(), Value::from("localhost"));
        value.insert("port".into(), Value::Integer(5432));
        assert_eq!(render_text(&value).unwrap(), "host: localhost\nport: 5432\n");
    }

    #[test]
    fn test_render_text_sequence_as_yaml() {
        let mut value = Mapping::new();
        value.insert(VALUE_KEY.into(), Value::from(vec!["a", "b"]));
        assert_eq!(render_text(&value).unwrap(), "value:\n- a\n- b\n");
    }

    #[test]
    fn test_render_structured_rejects_unknown_format() {
        let health = Health {
            status: HealthStatus::Ok,
            message: "healthy".into(),
        };
        assert!(render_structured(&health, "xml").is_err());
        assert_eq!(
            render_structured(&health, "json").unwrap(),
            "{\n  \"status\": \"OK\",\n  \"message\": \"healthy\"\n}\n"
        );
    }

    #[test]
    fn test_render_fetch_formats() {
        let mut value = Mapping::new();
        value.insert(VALUE_KEY.into(), Value::from("myapp"));
        let response = FetchResponse { value };

        assert_eq!(render_fetch(&response, "text").unwrap(), "myapp\n");
        assert_eq!(render_fetch(&response, "yaml").unwrap(), "value: myapp\n");
        assert_eq!(
            render_fetch(&response, "json").unwrap(),
            "{\n  \"value\": \"myapp\"\n}\n"
        );
        assert_eq!(
            render_fetch(&response, "xml").unwrap_err(),
            "Unsupported format: xml. Use text, json, or yaml."
        );
    }

    #[test]
    fn test_cli_parses_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "confprov", "fetch", "-i", "local=./configs", "app", "name", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.instances, vec!["local=./configs".to_string()]);
        match cli.command {
            Commands::Fetch { path, format } => {
                assert_eq!(path, vec!["app".to_string(), "name".to_string()]);
                assert_eq!(format, "json");
            }
            _ => panic!("expected fetch"),
        }
    }
}
