use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use vyos_config_core::{
    diff_definition_trees, diff_schema_trees, format_json, merge_all, parse_dir, DiffEntry,
    DiffOptions, Definitions, SchemaNode, ValidationIssue,
};
use vyos_netgen::config::{resolve_config, GeneratorConfig};
use vyos_netgen::inspect::{render_definitions, render_schema};
use vyos_netgen::loader::load_inventory;
use vyos_netgen::report::{
    render_counters, render_generation_summary, render_issues, render_summary, render_text,
};
use vyos_netgen::transform::{generate, Generation};

mod cli;

use cli::{
    Cli, Command, DiffArgs, GenerateArgs, InspectArgs, MergeArgs, OutputFormat, SchemaDiffArgs,
    SourceArgs,
};

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Inspect(args) => run_inspect(args),
        Command::Generate(args) => run_generate(args),
        Command::Merge(args) => run_merge(args),
        Command::Diff(args) => run_diff(args),
        Command::SchemaDiff(args) => run_schema_diff(args),
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run_inspect(args: InspectArgs) -> Result<()> {
    let schema = load_schema(&args.templates)?;

    let target: &SchemaNode = match &args.path {
        Some(path) => {
            let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
            schema
                .find(&segments)
                .with_context(|| format!("schema path '{path}' not found"))?
                .as_ref()
        }
        None => schema.as_ref(),
    };

    print!("{}", render_schema(target, args.depth, args.constraints));
    Ok(())
}

fn run_generate(args: GenerateArgs) -> Result<()> {
    let (config, schema) = load_sources(&args.source)?;
    let generation = generate_file(&schema, &args.inventory, &config)?;
    let issues = if args.validate {
        generation.definitions.validate()
    } else {
        Vec::new()
    };

    if args.summary {
        println!("{}", render_generation_summary(&generation, issues.len()));
        println!("{}", render_counters(&generation.counters));
    } else {
        print_definitions(&generation.definitions, args.format)?;
    }

    check_issues(&issues)
}

fn run_merge(args: MergeArgs) -> Result<()> {
    let (config, schema) = load_sources(&args.source)?;

    let mut trees = Vec::with_capacity(args.inventories.len());
    for path in &args.inventories {
        trees.push(generate_file(&schema, path, &config)?.definitions);
    }
    let Some(merged) = merge_all(trees).context("failed to merge generated trees")? else {
        bail!("no inventories to merge");
    };
    info!(definitions = merged.len(), "merged definition trees");

    print_definitions(&merged, args.format)
}

fn run_diff(args: DiffArgs) -> Result<()> {
    let (config, schema) = load_sources(&args.source)?;
    let left = generate_file(&schema, &args.left, &config)?;
    let right = generate_file(&schema, &args.right, &config)?;

    let opts = DiffOptions {
        include_identical: args.identical,
        ignore_paths: args.ignore,
        ..DiffOptions::default()
    };
    let entries = diff_definition_trees(&left.definitions, &right.definitions, &opts);
    print_entries(&entries, args.format, args.summary);
    Ok(())
}

fn run_schema_diff(args: SchemaDiffArgs) -> Result<()> {
    let left = load_schema(&args.left)?;
    let right = load_schema(&args.right)?;

    let opts = DiffOptions {
        include_identical: args.identical,
        max_depth: args.max_depth,
        ignore_paths: args.ignore,
    };
    let entries = diff_schema_trees(&left, &right, &opts);
    print_entries(&entries, args.format, args.summary);
    Ok(())
}

fn load_schema(path: &Path) -> Result<Arc<SchemaNode>> {
    let schema = parse_dir(path)
        .with_context(|| format!("failed to parse templates {}", path.display()))?;
    debug!(path = %path.display(), nodes = schema.node_count(), "parsed templates");
    Ok(Arc::new(schema))
}

fn load_sources(source: &SourceArgs) -> Result<(GeneratorConfig, Arc<SchemaNode>)> {
    let (config, config_source) = resolve_config(source.config.as_deref())?;
    debug!(source = %config_source, "loaded generator config");

    let templates: PathBuf = match (&source.templates, &config.templates_dir) {
        (Some(flag), _) => flag.clone(),
        (None, Some(configured)) => configured.clone(),
        (None, None) => bail!("no template directory: pass --templates or set templates_dir"),
    };
    let schema = load_schema(&templates)?;
    Ok((config, schema))
}

fn generate_file(
    schema: &Arc<SchemaNode>,
    path: &Path,
    config: &GeneratorConfig,
) -> Result<Generation> {
    let inventory = load_inventory(path)?;
    generate(schema, &inventory, config)
        .with_context(|| format!("failed to generate {}", path.display()))
}

fn print_definitions(defs: &Definitions, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_definitions(defs)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(defs.roots())?),
    }
    Ok(())
}

fn print_entries(entries: &[DiffEntry], format: OutputFormat, summary: bool) {
    if summary {
        println!("{}", render_summary(entries));
        return;
    }
    match format {
        OutputFormat::Text => println!("{}", render_text(entries)),
        OutputFormat::Json => println!("{}", format_json(entries)),
    }
}

fn check_issues(issues: &[ValidationIssue]) -> Result<()> {
    if issues.is_empty() {
        return Ok(());
    }
    eprintln!("{}", render_issues(issues));
    bail!("validation failed: {} issue(s)", issues.len())
}
