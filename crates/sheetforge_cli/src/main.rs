//! SheetForge command-line front end.
//!
//! # Responsibility
//! - Drive one creation session end-to-end from command-line arguments.
//! - List and export saved characters, and print the profession catalog.
//!
//! # Invariants
//! - All rules live in `sheetforge_core`; this binary only maps arguments
//!   onto wizard actions and prints results.

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use log::info;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use sheetforge_core::db::open_db;
use sheetforge_core::{
    default_log_level, init_logging, AllocationEdit, BasicInfo, Catalog, CharacterId,
    RosterService, SqliteCharacterRepository, WizardSession,
};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Investigator character creator.
#[derive(Parser, Debug)]
#[command(name = "sheetforge", version, about)]
struct Cli {
    /// SQLite database holding saved characters
    #[arg(long, env = "SHEETFORGE_DB", default_value = "sheetforge.sqlite3")]
    db: PathBuf,

    /// Directory for rolling log files; logging is off when unset
    #[arg(long, env = "SHEETFORGE_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error); defaults per build mode
    #[arg(long, env = "SHEETFORGE_LOG_LEVEL")]
    log_level: Option<String>,

    /// JSON profession catalog replacing the built-in one
    #[arg(long, env = "SHEETFORGE_CATALOG")]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the profession catalog
    Professions,
    /// Create and save one character
    Create(CreateArgs),
    /// List saved characters
    List {
        /// Print the full records as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print one saved character as JSON
    Show { id: CharacterId },
}

#[derive(Args, Debug)]
struct CreateArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    age: String,
    #[arg(long)]
    gender: String,
    #[arg(long)]
    residence: String,
    #[arg(long)]
    background: String,
    #[arg(long)]
    profession: String,

    /// Skill allocation as `SKILL=POINTS`; repeat a skill to address its
    /// next catalog slot
    #[arg(long = "alloc", value_parser = parse_allocation)]
    allocations: Vec<(String, u32)>,

    /// Seed for deterministic attribute rolls
    #[arg(long)]
    seed: Option<u64>,
}

fn parse_allocation(value: &str) -> Result<(String, u32), String> {
    let (skill, points) = value
        .rsplit_once('=')
        .ok_or_else(|| format!("expected SKILL=POINTS, got `{value}`"))?;
    let skill = skill.trim();
    if skill.is_empty() {
        return Err(format!("missing skill name in `{value}`"));
    }
    let points = points
        .trim()
        .parse::<u32>()
        .map_err(|err| format!("invalid points in `{value}`: {err}"))?;
    Ok((skill.to_string(), points))
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        start_logging(log_dir, cli.log_level.as_deref())?;
    }

    let catalog = Arc::new(match &cli.catalog {
        Some(path) => Catalog::from_json_file(path)
            .with_context(|| format!("loading catalog {}", path.display()))?,
        None => Catalog::builtin()?,
    });
    for rejected in catalog.rejected() {
        eprintln!(
            "warning: profession `{}` is unavailable: {}",
            rejected.name, rejected.error
        );
    }

    let mut out = io::stdout().lock();
    match cli.command {
        Command::Professions => print_catalog(&catalog, &mut out)?,
        Command::Create(args) => {
            create(&cli.db, catalog, args, &mut out)?;
        }
        Command::List { json } => list(&cli.db, json, &mut out)?,
        Command::Show { id } => {
            let conn = open_db(&cli.db)?;
            let roster = RosterService::new(SqliteCharacterRepository::new(&conn));
            writeln!(out, "{}", roster.export_json(id)?)?;
        }
    }

    Ok(())
}

fn start_logging(log_dir: &Path, level: Option<&str>) -> anyhow::Result<()> {
    let log_dir = std::path::absolute(log_dir)
        .with_context(|| format!("resolving log directory {}", log_dir.display()))?;
    let Some(log_dir) = log_dir.to_str() else {
        bail!("log directory must be valid UTF-8: {}", log_dir.display());
    };
    init_logging(level.unwrap_or(default_log_level()), log_dir)?;
    Ok(())
}

fn print_catalog(catalog: &Catalog, out: &mut impl Write) -> io::Result<()> {
    for profession in catalog.professions() {
        writeln!(out, "{}", profession.name)?;
        writeln!(out, "  skill points: {}", profession.formula)?;
        writeln!(out, "  credit rating: {}", profession.credit_rating)?;
        writeln!(out, "  key skills: {}", profession.key_skills.join(", "))?;
        writeln!(out, "  {}", profession.background)?;
    }
    Ok(())
}

fn create(
    db: &Path,
    catalog: Arc<Catalog>,
    args: CreateArgs,
    out: &mut impl Write,
) -> anyhow::Result<CharacterId> {
    let mut rng: Box<dyn RngCore> = match args.seed {
        Some(seed) => Box::new(StdRng::seed_from_u64(seed)),
        None => Box::new(rand::thread_rng()),
    };

    let mut session = WizardSession::new(catalog);
    session.update_basic_info(BasicInfo {
        name: args.name,
        age: args.age,
        gender: args.gender,
        residence: args.residence,
        background: args.background,
    })?;
    session.proceed_to_profession()?;
    session.select_profession(&args.profession)?;
    let seeded = session.confirm_profession(rng.as_mut())?;

    let mut used = vec![false; seeded.slots.len()];
    let mut edits = Vec::with_capacity(args.allocations.len());
    for (skill, points) in &args.allocations {
        let Some(slot) = seeded
            .slots
            .iter()
            .find(|slot| slot.label.eq_ignore_ascii_case(skill) && !used[slot.index])
        else {
            let labels: Vec<&str> = seeded.slots.iter().map(|slot| slot.label.as_str()).collect();
            bail!(
                "no free `{skill}` slot for this profession; key skills: {}",
                labels.join(", ")
            );
        };
        used[slot.index] = true;
        edits.push(AllocationEdit {
            slot: slot.index,
            points: *points,
        });
    }
    let state = session.apply_edits(&edits)?;

    let conn = open_db(db)?;
    let repo = SqliteCharacterRepository::new(&conn);
    let saved = session.finish(&repo)?;
    info!(
        "event=cli_create module=cli status=ok id={} remaining={}",
        saved.id, state.remaining_budget
    );

    writeln!(out, "saved character #{}", saved.id)?;
    for (attribute, value) in saved.record.attributes.iter() {
        writeln!(out, "  {attribute}: {value}")?;
    }
    writeln!(
        out,
        "  skill points: {} of {} allocated, {} unspent",
        state.allocated(),
        state.total_budget,
        state.remaining_budget
    )?;
    Ok(saved.id)
}

fn list(db: &Path, json: bool, out: &mut impl Write) -> anyhow::Result<()> {
    let conn = open_db(db)?;
    let roster = RosterService::new(SqliteCharacterRepository::new(&conn));
    let characters = roster.list_characters()?;

    if json {
        writeln!(out, "{}", serde_json::to_string_pretty(&characters)?)?;
        return Ok(());
    }
    if characters.is_empty() {
        writeln!(out, "No characters saved yet.")?;
        return Ok(());
    }
    for character in characters {
        writeln!(
            out,
            "#{} {} ({}, {})",
            character.id,
            character.record.info.name,
            character.record.profession,
            character.record.info.residence
        )?;
    }
    Ok(())
}
