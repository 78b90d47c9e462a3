mod logic;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use colored::Colorize;
use dugout_game::{GameEngine, RosterBook, RosterProvider, SimConfig};
use std::fs::File;
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use logic::{BatchPlan, BatchResult, BatchRunner, LeagueView, TesterStore, parse_seed};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Human-readable summary with standings
    Console,
    /// Full batch result as pretty JSON
    Json,
    /// Markdown summary and per-game table
    Markdown,
    /// One row per game
    Csv,
}

#[derive(Debug, Parser)]
#[command(name = "dugout-tester", version)]
#[command(about = "Batch simulator for the Dugout baseball engine")]
struct Args {
    /// Away team id
    #[arg(long, default_value = "NYY")]
    away: String,

    /// Home team id
    #[arg(long, default_value = "LAD")]
    home: String,

    /// Number of games to play back to back
    #[arg(long, default_value_t = 10)]
    games: usize,

    /// Master seed (decimal or 0x hex); per-game seeds derive from it
    #[arg(long, default_value = "1337")]
    seed: String,

    /// JSON file overriding the simulation tuning
    #[arg(long)]
    config: Option<PathBuf>,

    /// JSON file holding team records and career stats (in-memory when omitted)
    #[arg(long)]
    store: Option<PathBuf>,

    /// Clear team records and career stats before playing
    #[arg(long)]
    reset: bool,

    /// Print every at-bat
    #[arg(long)]
    play_by_play: bool,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// List available teams and exit
    #[arg(long)]
    list_teams: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let rosters = RosterBook::builtin();
    let store = TesterStore::from_arg(args.store.as_deref());
    let config = load_config(args.config.as_deref())?;
    let mut engine = GameEngine::new(rosters, store, config);

    if args.reset {
        engine.reset_all().context("failed to reset stored records")?;
        if banner_allowed(&args) {
            println!("{}", "🧹 Records cleared".yellow());
        }
    }

    if maybe_list_teams(&args, &engine)? {
        return Ok(());
    }

    if banner_allowed(&args) {
        announce_banner(&args, &engine.store().describe());
    }

    let plan = BatchPlan {
        away: args.away.to_uppercase(),
        home: args.home.to_uppercase(),
        games: args.games,
        master_seed: parse_seed(&args.seed)?,
    };
    let result = BatchRunner::new(args.verbose, args.play_by_play).run(&mut engine, &plan);

    let records = engine.team_records();
    let career = engine.career_stats();
    let league = LeagueView {
        records: &records,
        career: &career,
    };
    write_reports(&args, &result, &league)?;

    if !result.passed() {
        std::process::exit(1);
    }

    Ok(())
}

fn load_config(path: Option<&Path>) -> Result<SimConfig> {
    let Some(path) = path else {
        return Ok(SimConfig::default_config().clone());
    };
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    SimConfig::from_json(&text).with_context(|| format!("invalid config {}", path.display()))
}

/// Banners go to stdout, so keep them out of machine-readable reports there.
fn banner_allowed(args: &Args) -> bool {
    args.output.is_some() || args.report == ReportFormat::Console
}

fn announce_banner(args: &Args, store: &str) {
    println!("{}", "⚾ Dugout Batch Simulator".bright_cyan().bold());
    println!("{}", "=========================".cyan());
    println!(
        "{} at {} | {} games | seed {} | store {}",
        args.away.to_uppercase().bold(),
        args.home.to_uppercase().bold(),
        args.games,
        args.seed,
        store
    );
}

fn maybe_list_teams<P, S>(args: &Args, engine: &GameEngine<P, S>) -> Result<bool>
where
    P: RosterProvider,
    S: dugout_game::KeyValueStore,
{
    if !args.list_teams {
        return Ok(false);
    }
    let records = engine.team_records();
    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available teams:")?;
    for id in engine.rosters().team_ids() {
        let Some(team) = engine.rosters().team_by_id(&id) else {
            continue;
        };
        let record = records
            .get(&team.id)
            .map_or_else(|| "0-0".to_string(), |r| format!("{}-{}", r.wins, r.losses));
        writeln!(
            output_target.writer(),
            "  {:5} - {:<12} {} batters, {} starters, record {record}",
            team.id,
            team.name,
            team.batters.len(),
            team.pitchers.rotation.len()
        )?;
    }
    output_target.flush_inner()?;
    Ok(true)
}

fn write_reports(args: &Args, result: &BatchResult, league: &LeagueView<'_>) -> Result<()> {
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match args.report {
        ReportFormat::Json => logic::reports::generate_json_report(&mut output_target, result)?,
        ReportFormat::Markdown => {
            logic::reports::generate_markdown_report(&mut output_target, result, league)?;
        }
        ReportFormat::Csv => logic::reports::generate_csv_report(&mut output_target, result)?,
        ReportFormat::Console => {
            logic::reports::generate_console_report(&mut output_target, result, league)?;
            writeln!(&mut output_target)?;
            writeln!(&mut output_target, "🏁 Total time: {:?}", result.total_duration)?;
        }
    }

    output_target.flush_inner()?;
    Ok(())
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            let file = File::create(&path)
                .with_context(|| format!("failed to create {}", path.display()))?;
            Ok(Self::File(BufWriter::new(file)))
        } else {
            Ok(Self::Stdout(BufWriter::new(stdout())))
        }
    }

    fn writer(&mut self) -> &mut dyn Write {
        match self {
            Self::Stdout(w) => w,
            Self::File(w) => w,
        }
    }

    fn flush_inner(&mut self) -> std::io::Result<()> {
        match self {
            Self::Stdout(w) => w.flush(),
            Self::File(w) => w.flush(),
        }
    }
}

impl Write for OutputTarget {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.writer().write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.flush_inner()
    }
}
