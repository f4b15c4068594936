//! Command handlers.
//!
//! Each handler resolves its provider, calls the note service and prints the
//! rendered result to stdout. Query and patch validation run before any
//! provider is opened.

use crate::args::{
    AddArgs, AttachmentsCommand, Cli, Command, ConfigCommand, ListArgs, OutputFormat, UpdateArgs,
};
use crate::errors::{CliError, CliResult};
use crate::output;
use log::warn;
use notes_core::config::{
    config_dir, config_path, load_config, process_env, read_config_file, save_config,
    ConfigError,
};
use notes_core::{
    default_log_level, init_logging, ListRequest, LogTarget, NewNote, NoteService,
    NoteServiceError, NoteUpdate, NotesProvider, ProviderRegistry, ProviderSettings,
};
use serde_json::json;
use std::path::{Path, PathBuf};

const EXAMPLE_CONFIG: &str = r#"{
  "provider": "appsheet",
  "appsheet": {
    "app_id": "your-app-id-guid",
    "api_key": "your-api-key",
    "note_table": "Note",
    "attachment_table": "Attachment"
  }
}"#;

struct Context {
    config_dir: PathBuf,
    provider: Option<String>,
}

pub fn run(cli: Cli) -> CliResult<()> {
    let ctx = Context {
        config_dir: config_dir(&process_env)?,
        provider: cli.provider,
    };
    start_logging(&ctx.config_dir, cli.log_level.as_deref(), cli.log_stderr);

    match cli.command {
        Command::Config { action } => match action {
            ConfigCommand::Show { format } => config_show(&ctx, format),
            ConfigCommand::Import { file } => config_import(&ctx, &file),
        },
        Command::List(args) => list(&ctx, args),
        Command::Add(args) => add(&ctx, args),
        Command::Read { id, format } => read(&ctx, &id, format),
        Command::Update(args) => update(&ctx, args),
        Command::Attachments { action } => match action {
            AttachmentsCommand::List { note_id, format } => {
                attachments_list(&ctx, &note_id, format)
            }
        },
    }
}

/// Logging problems are reported but never stop a command.
fn start_logging(config_dir: &Path, level: Option<&str>, to_stderr: bool) {
    let level = level.unwrap_or(default_log_level());
    let target = if to_stderr {
        LogTarget::Stderr
    } else {
        LogTarget::Directory(config_dir.join("logs"))
    };
    if let Err(err) = init_logging(level, target) {
        eprintln!("warning: logging disabled: {err}");
    }
}

fn open_service(ctx: &Context) -> CliResult<NoteService<Box<dyn NotesProvider>>> {
    let config = load_config(&config_path(&ctx.config_dir))?;
    let settings = ProviderSettings::resolve(
        config.as_ref(),
        ctx.provider.as_deref(),
        &process_env,
        &ctx.config_dir,
    );
    let provider = ProviderRegistry::with_builtin().build(&settings)?;
    Ok(NoteService::new(provider))
}

fn config_show(ctx: &Context, format: OutputFormat) -> CliResult<()> {
    let path = config_path(&ctx.config_dir);
    let Some(config) = load_config(&path)? else {
        println!("No config found at {}", path.display());
        println!("\nTo configure, create a JSON file and run:");
        println!("  notes config import <file.json>");
        println!("\nExample JSON for AppSheet:");
        println!("{EXAMPLE_CONFIG}");
        return Err(ConfigError::Missing(path).into());
    };

    let validation = ProviderRegistry::with_builtin().validate_config(&config, &ctx.config_dir);
    match format {
        OutputFormat::Json => println!(
            "{}",
            output::to_json(&json!({
                "config": config.summary(),
                "validation": validation,
            }))?
        ),
        OutputFormat::Text => println!(
            "{}",
            output::render_validation(&config.summary().provider, &validation)
        ),
    }

    if validation.ok {
        Ok(())
    } else {
        Err(CliError::ConfigRejected)
    }
}

fn config_import(ctx: &Context, file: &Path) -> CliResult<()> {
    let proposed = read_config_file(file)?;
    println!("Validating config from {}...\n", file.display());

    let validation = ProviderRegistry::with_builtin().validate_config(&proposed, &ctx.config_dir);
    let provider = proposed.provider.as_deref().unwrap_or("(missing)");
    println!("{}", output::render_validation(provider, &validation));

    if !validation.ok {
        warn!(
            "event=config_import module=cli status=rejected file={}",
            file.display()
        );
        eprintln!("\nConfig import rejected - existing config unchanged.");
        return Err(CliError::ConfigRejected);
    }

    let path = config_path(&ctx.config_dir);
    save_config(&path, &proposed)?;
    println!("\nConfig saved to {}", path.display());
    Ok(())
}

fn list(ctx: &Context, args: ListArgs) -> CliResult<()> {
    let has_query = args
        .query
        .as_deref()
        .is_some_and(|query| !query.trim().is_empty());
    let request = ListRequest {
        query: args.query.unwrap_or_default(),
        sort: args.sort,
        limit: args.limit,
    };
    // Reject malformed queries before any provider is contacted.
    request.compile().map_err(NoteServiceError::from)?;

    let result = open_service(ctx)?.list(&request)?;
    match args.format {
        OutputFormat::Json => println!("{}", output::to_json(&result)?),
        OutputFormat::Text => println!("{}", output::render_list(&result, has_query)),
    }
    Ok(())
}

fn add(ctx: &Context, args: AddArgs) -> CliResult<()> {
    let note = NewNote::new(args.title)
        .with_content(args.content)
        .with_labels(args.labels);
    let created = open_service(ctx)?.add(&note)?;
    match args.format {
        OutputFormat::Json => println!("{}", output::to_json(&created)?),
        OutputFormat::Text => println!("{}", output::render_created(&created)),
    }
    Ok(())
}

fn read(ctx: &Context, id: &str, format: OutputFormat) -> CliResult<()> {
    let note = open_service(ctx)?.get(id)?;
    match format {
        OutputFormat::Json => println!("{}", output::to_json(&note)?),
        OutputFormat::Text => println!("{}", output::render_note(&note)),
    }
    Ok(())
}

fn update(ctx: &Context, args: UpdateArgs) -> CliResult<()> {
    let patch = NoteUpdate {
        title: args.title,
        content: args.content,
        labels: args.labels,
    };
    patch.validate().map_err(NoteServiceError::from)?;

    let updated = open_service(ctx)?.update(&args.id, &patch)?;
    match args.format {
        OutputFormat::Json => println!("{}", output::to_json(&updated)?),
        OutputFormat::Text => println!("{}", output::render_updated(&updated)),
    }
    Ok(())
}

fn attachments_list(ctx: &Context, note_id: &str, format: OutputFormat) -> CliResult<()> {
    let rows = open_service(ctx)?.list_attachments(note_id)?;
    match format {
        OutputFormat::Json => println!("{}", output::to_json(&rows)?),
        OutputFormat::Text => println!("{}", output::render_attachments(&rows)),
    }
    Ok(())
}
