//! `wand`: inspect, edit, and batch-correct transcript record files.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{debug, info, warn};
use std::path::{Path, PathBuf};
use wand_rs::config::{LayeredConfigOptions, WandConfig};
use wand_rs::core::editor::LOAD_REJECTED_MESSAGE;
use wand_rs::core::{CorrectionPipeline, Editor, build_provider, render_records};
use wand_rs::edit::{
    EditOp, apply_all, parse_delete, parse_insert, parse_move, parse_set_content, parse_set_role,
};
use wand_rs::report;

/// Command-line options for the wand CLI.
#[derive(Parser)]
#[command(name = "wand", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print one line per record
    Show {
        /// JSON file holding an array of `{role, content}` records
        file: PathBuf,
    },
    /// Apply edits and write the resulting records
    ///
    /// Operations run grouped in this order: set-role, set-content, insert,
    /// delete, move. Indices refer to the collection as it is when each
    /// operation runs.
    Edit {
        file: PathBuf,
        /// Change a role: INDEX=ROLE
        #[arg(long = "set-role", value_parser = parse_set_role)]
        set_role: Vec<EditOp>,
        /// Replace content: INDEX=TEXT
        #[arg(long = "set-content", value_parser = parse_set_content)]
        set_content: Vec<EditOp>,
        /// Insert an empty assistant row before INDEX
        #[arg(long, value_parser = parse_insert)]
        insert: Vec<EditOp>,
        /// Delete the record at INDEX
        #[arg(long, value_parser = parse_delete)]
        delete: Vec<EditOp>,
        /// Move a record: FROM:TO, TO counted after removal
        #[arg(long = "move", value_parser = parse_move)]
        moves: Vec<EditOp>,
        /// Write here instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Ask the model for corrections to every record
    Correct {
        file: PathBuf,
        /// What to fix; falls back to `correction.instruction` from config
        #[arg(long, short)]
        instruction: Option<String>,
        /// Extra wand.json5 applied over the discovered layers
        #[arg(long)]
        config: Option<PathBuf>,
        /// Override the configured model
        #[arg(long)]
        model: Option<String>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    wand_rs::init_logging();
    let cli = Cli::parse();
    match cli.command {
        Command::Show { file } => {
            let editor = open(&file)?;
            print!("{}", report::listing(editor.store()));
        }
        Command::Edit {
            file,
            set_role,
            set_content,
            insert,
            delete,
            moves,
            output,
        } => {
            let mut editor = open(&file)?;
            let ops: Vec<EditOp> = [set_role, set_content, insert, delete, moves]
                .into_iter()
                .flatten()
                .collect();
            let applied = apply_all(&mut editor, &ops).context("failed to apply edits")?;
            info!("applied edits (count={}, records={})", applied, editor.store().len());
            let rendered = render_records(&editor.store().snapshot())?;
            match output {
                Some(path) => std::fs::write(&path, format!("{rendered}\n"))
                    .with_context(|| format!("failed to write {}", path.display()))?,
                None => println!("{rendered}"),
            }
        }
        Command::Correct {
            file,
            instruction,
            config,
            model,
            json,
        } => correct(&file, instruction, config, model, json).await?,
    }
    Ok(())
}

fn open(path: &Path) -> anyhow::Result<Editor> {
    let raw = std::fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let mut editor = Editor::new();
    editor
        .load(&raw)
        .with_context(|| format!("{LOAD_REJECTED_MESSAGE} ({})", path.display()))?;
    debug!(
        "opened record file (path={}, records={})",
        path.display(),
        editor.store().len()
    );
    Ok(editor)
}

fn load_config(
    config: Option<PathBuf>,
    model: Option<String>,
) -> anyhow::Result<WandConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current working directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = config {
        info!("adding runtime config layer: {}", path.display());
        options = options.with_runtime_path(path);
    }
    let layered = WandConfig::load_layered_with_options(options)
        .context("failed to load layered config")?;
    debug!("layered config loaded (layers={})", layered.layers.len());
    let mut config = layered.config;
    if let Some(model) = model {
        config.provider.model = model;
    }
    Ok(config)
}

async fn correct(
    file: &Path,
    instruction: Option<String>,
    config: Option<PathBuf>,
    model: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let mut editor = open(file)?;
    let config = load_config(config, model)?;
    let Some(instruction) = instruction.or_else(|| config.correction.instruction.clone()) else {
        bail!("an instruction is required: pass --instruction or set correction.instruction");
    };

    let provider = build_provider(&config.provider).context("failed to build provider")?;
    let pipeline = CorrectionPipeline::from_config(&config.correction, provider);
    let snapshot = editor.begin_correction()?;
    info!(
        "submitting correction run (records={}, model={})",
        snapshot.len(),
        config.provider.model
    );

    let run = pipeline.spawn(snapshot, instruction);
    let cancel = run.cancellation_token();
    let watcher = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling after the current record");
            cancel.cancel();
        }
    });
    let outcome = run.finish().await;
    watcher.abort();

    let failure = outcome.as_ref().err().map(|err| err.to_string());
    editor.finish_correction(outcome)?;
    if let Some(detail) = failure {
        let notice = editor.notice().unwrap_or("correction failed");
        bail!("{notice} ({detail})");
    }

    if json {
        println!("{}", serde_json::to_string_pretty(editor.summary())?);
    } else {
        print!("{}", report::summary_table(editor.summary()));
    }
    Ok(())
}
