mod reports;
mod seeds;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::Colorize;
use log::{debug, info};
use std::fs::{self, File};
use std::io::{BufWriter, Write, stdout};
use std::path::{Path, PathBuf};

use missionsim_core::{
    Advice, DirectoryTemplates, HistoryEntry, HistoryStore, JsonlHistory, Mission, MissionEngine,
    SimulationConfig, SimulationResult, TemplateSource, recommend, run_with_config,
};
use seeds::parse_seed;

const DEFAULT_HISTORY_PATH: &str = "target/missionsim/history.jsonl";
const DEFAULT_TEMPLATES_DIR: &str = "templates";

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportFormat {
    /// Colored summary for terminals
    Console,
    /// Full result as pretty JSON
    Json,
    /// Markdown summary with a waypoint table
    Markdown,
    /// Detailed failure records as CSV
    Csv,
    /// Self-contained HTML failure heatmap
    Html,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum HistoryFormat {
    Console,
    Json,
}

#[derive(Debug, Parser)]
#[command(name = "missionsim", version)]
#[command(about = "Stochastic failure simulation and risk scoring for waypoint missions")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run trials for a mission file or a named template
    Simulate(SimulateArgs),
    /// List available mission templates
    Templates(TemplatesArgs),
    /// Show recently logged simulations
    History(HistoryArgs),
}

#[derive(Debug, Args)]
struct SimulateArgs {
    /// Mission JSON file
    #[arg(long, conflicts_with = "template", required_unless_present = "template")]
    mission: Option<PathBuf>,

    /// Named template from the templates directory
    #[arg(long)]
    template: Option<String>,

    /// Number of trials (1..=max_simulations, default 100)
    #[arg(long)]
    simulations: Option<u32>,

    /// Fixed seed (decimal or 0x hex); random when omitted
    #[arg(long, value_parser = parse_seed)]
    seed: Option<u64>,

    /// Worker chunks; more than one runs trials in parallel
    #[arg(long)]
    workers: Option<usize>,

    /// JSON file with simulation settings; flags override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Output report format
    #[arg(long, value_enum, default_value_t = ReportFormat::Console)]
    report: ReportFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,

    /// Only report headline rates and the top failure types (console and json)
    #[arg(long)]
    quick: bool,

    /// Directory holding mission_<name>.json templates
    #[arg(long, default_value = DEFAULT_TEMPLATES_DIR)]
    templates_dir: PathBuf,

    /// JSON Lines history log
    #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
    history: PathBuf,

    /// Do not append this run to the history log
    #[arg(long)]
    no_history: bool,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Debug, Args)]
struct TemplatesArgs {
    /// Directory holding mission_<name>.json templates
    #[arg(long, default_value = DEFAULT_TEMPLATES_DIR)]
    templates_dir: PathBuf,

    /// Optional path to write the listing instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Debug, Args)]
struct HistoryArgs {
    /// Maximum number of entries, newest first
    #[arg(long, default_value_t = 20)]
    limit: usize,

    /// JSON Lines history log
    #[arg(long, default_value = DEFAULT_HISTORY_PATH)]
    history: PathBuf,

    /// Output format
    #[arg(long, value_enum, default_value_t = HistoryFormat::Console)]
    report: HistoryFormat,

    /// Optional path to write the report output instead of stdout
    #[arg(long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Command::Simulate(args) => run_simulate(&args),
        Command::Templates(args) => run_templates(&args),
        Command::History(args) => run_history(&args),
    }
}

fn announce_banner() {
    println!("{}", "🛩  Mission Failure Simulator".bright_cyan().bold());
    println!("{}", "================================".cyan());
}

fn run_simulate(args: &SimulateArgs) -> Result<()> {
    ensure_quick_supported(args)?;
    if args.output.is_some() {
        colored::control::set_override(false);
    } else if args.report == ReportFormat::Console {
        announce_banner();
    }

    let engine = MissionEngine::new(
        DirectoryTemplates::new(&args.templates_dir),
        JsonlHistory::new(&args.history),
    );
    let mission = load_mission(args, engine.templates())?;
    let config = resolve_config(args)?;
    info!(
        "simulating {} ({} trials, {} workers)",
        mission.name, config.num_simulations, config.workers
    );

    let result = if args.no_history {
        run_with_config(&mission, &config)
    } else {
        let result = engine
            .simulate_and_log(&mission, &config)
            .context("simulation run failed")?;
        debug!("appended run to {}", engine.history().path().display());
        result
    };

    let advice = recommend(&mission, &result.simulation_summary);
    write_reports(args, &result, &advice)
}

fn load_mission(args: &SimulateArgs, templates: &DirectoryTemplates) -> Result<Mission> {
    if let Some(path) = &args.mission {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read mission {}", path.display()))?;
        return Mission::from_json(&raw)
            .with_context(|| format!("failed to load mission {}", path.display()));
    }
    if let Some(name) = &args.template {
        return templates
            .load_template(name)
            .with_context(|| format!("failed to load template {name}"));
    }
    bail!("either --mission or --template is required")
}

fn resolve_config(args: &SimulateArgs) -> Result<SimulationConfig> {
    let mut config = match &args.config {
        Some(path) => {
            let raw = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimulationConfig::from_json(&raw)
                .with_context(|| format!("failed to parse config {}", path.display()))?
        }
        None => SimulationConfig::default(),
    };
    if let Some(simulations) = args.simulations {
        config.num_simulations = simulations;
    }
    if let Some(seed) = args.seed {
        config.seed = Some(seed);
    }
    if let Some(workers) = args.workers {
        config.workers = workers;
    }
    config.validate().context("invalid simulation settings")?;
    Ok(config)
}

/// `--quick` only has console and json renderings.
fn ensure_quick_supported(args: &SimulateArgs) -> Result<()> {
    if args.quick && !matches!(args.report, ReportFormat::Console | ReportFormat::Json) {
        bail!(
            "--quick supports only console and json reports, not {}",
            args.report
                .to_possible_value()
                .map_or_else(|| format!("{:?}", args.report), |v| v.get_name().to_string())
        );
    }
    Ok(())
}

fn write_reports(args: &SimulateArgs, result: &SimulationResult, advice: &[Advice]) -> Result<()> {
    ensure_quick_supported(args)?;
    let mut output_target = OutputTarget::new(args.output.clone())?;

    match (args.report, args.quick) {
        (ReportFormat::Json, true) => {
            reports::generate_quick_json_report(
                &mut output_target,
                &result.simulation_summary.quick(),
            )?;
        }
        (ReportFormat::Console, true) => {
            reports::generate_quick_console_report(
                &mut output_target,
                &result.mission_name,
                &result.simulation_summary.quick(),
            )?;
        }
        (ReportFormat::Json, false) => {
            reports::generate_json_report(&mut output_target, result, advice)?;
        }
        (ReportFormat::Markdown, false) => {
            reports::generate_markdown_report(&mut output_target, result, advice)?;
        }
        (ReportFormat::Csv, false) => {
            reports::generate_csv_report(&mut output_target, result)?;
        }
        (ReportFormat::Html, false) => {
            reports::generate_html_report(&mut output_target, result)?;
        }
        (ReportFormat::Console, false) => {
            reports::generate_console_report(&mut output_target, result, advice, args.verbose)?;
        }
        (ReportFormat::Markdown | ReportFormat::Csv | ReportFormat::Html, true) => {
            ensure_quick_supported(args)?;
        }
    }

    output_target.flush_inner()?;
    if let Some(path) = &args.output {
        eprintln!("📝 Report written to {}", path.display());
    }
    Ok(())
}

fn run_templates(args: &TemplatesArgs) -> Result<()> {
    let source = DirectoryTemplates::new(&args.templates_dir);
    let names = source
        .list_templates()
        .with_context(|| format!("failed to list templates in {}", args.templates_dir.display()))?;

    let mut output_target = OutputTarget::new(args.output.clone())?;
    writeln!(output_target.writer(), "Available templates:")?;
    if names.is_empty() {
        writeln!(output_target.writer(), "  (none)")?;
    }
    for name in names {
        let label = match source.load_template(&name) {
            Ok(mission) => format!(
                "{} ({} waypoints, {} scenarios)",
                mission.name,
                mission.waypoints.len(),
                mission.failure_scenarios.len()
            ),
            Err(err) => format!("invalid: {err}"),
        };
        writeln!(output_target.writer(), "  {name:20} - {label}")?;
    }
    output_target.flush_inner()?;
    Ok(())
}

fn run_history(args: &HistoryArgs) -> Result<()> {
    if args.output.is_some() {
        colored::control::set_override(false);
    }
    let entries = recent_history(&args.history, args.limit)?;
    let mut output_target = OutputTarget::new(args.output.clone())?;
    match args.report {
        HistoryFormat::Json => reports::generate_history_json_report(&mut output_target, &entries)?,
        HistoryFormat::Console => {
            reports::generate_history_console_report(&mut output_target, &entries)?;
        }
    }
    output_target.flush_inner()?;
    Ok(())
}

fn recent_history(path: &Path, limit: usize) -> Result<Vec<HistoryEntry>> {
    JsonlHistory::new(path)
        .recent(limit)
        .with_context(|| format!("failed to read history {}", path.display()))
}

enum OutputTarget {
    Stdout(BufWriter<std::io::Stdout>),
    File(BufWriter<File>),
}

impl OutputTarget {
    fn new(path: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = path {
            if let Some(parent) = path.parent()
                && !parent.as_os_str().is_empty()
            {
                fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create {}", parent.display()))?;
            }
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

#[cfg(test)]
mod tests {
    use super::*;
    use missionsim_core::run_simulation_seeded;

    fn repo_templates() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../templates")
    }

    fn base_args() -> SimulateArgs {
        SimulateArgs {
            mission: None,
            template: Some("delivery".to_string()),
            simulations: None,
            seed: Some(1337),
            workers: None,
            config: None,
            report: ReportFormat::Json,
            output: None,
            quick: false,
            templates_dir: repo_templates(),
            history: PathBuf::from(DEFAULT_HISTORY_PATH),
            no_history: true,
            verbose: false,
        }
    }

    fn sample_result() -> (SimulationResult, Vec<Advice>) {
        let mission = DirectoryTemplates::new(repo_templates())
            .load_template("coastal_patrol")
            .unwrap();
        let result = run_simulation_seeded(&mission, 200, 3);
        let advice = recommend(&mission, &result.simulation_summary);
        (result, advice)
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_simulate_flags() {
        let cli = Cli::try_parse_from([
            "missionsim",
            "simulate",
            "--template",
            "survey",
            "--simulations",
            "250",
            "--seed",
            "0x10",
            "--report",
            "markdown",
            "--quick",
        ])
        .unwrap();
        let Command::Simulate(args) = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(args.template.as_deref(), Some("survey"));
        assert_eq!(args.simulations, Some(250));
        assert_eq!(args.seed, Some(16));
        assert_eq!(args.report, ReportFormat::Markdown);
        assert!(args.quick);
        assert_eq!(args.history, PathBuf::from(DEFAULT_HISTORY_PATH));
    }

    #[test]
    fn mission_and_template_are_exclusive() {
        assert!(
            Cli::try_parse_from([
                "missionsim",
                "simulate",
                "--mission",
                "m.json",
                "--template",
                "delivery"
            ])
            .is_err()
        );
        assert!(Cli::try_parse_from(["missionsim", "simulate"]).is_err());
    }

    #[test]
    fn resolve_config_applies_overrides() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"num_simulations": 300, "workers": 2, "seed": 5}"#).unwrap();
        let args = SimulateArgs {
            config: Some(path),
            workers: Some(4),
            ..base_args()
        };
        let config = resolve_config(&args).unwrap();
        assert_eq!(config.num_simulations, 300);
        assert_eq!(config.workers, 4);
        assert_eq!(config.seed, Some(1337));
    }

    #[test]
    fn resolve_config_enforces_bounds() {
        for simulations in [0, 1001] {
            let args = SimulateArgs {
                simulations: Some(simulations),
                ..base_args()
            };
            let err = resolve_config(&args).unwrap_err();
            assert!(format!("{err:#}").contains("invalid simulation settings"));
        }
    }

    #[test]
    fn load_mission_from_file_and_template() {
        let args = base_args();
        let templates = DirectoryTemplates::new(&args.templates_dir);
        assert_eq!(
            load_mission(&args, &templates).unwrap().name,
            "Urban Parcel Delivery"
        );

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mission.json");
        fs::write(&path, "{\"id\": \"x\"}").unwrap();
        let args = SimulateArgs {
            mission: Some(path),
            template: None,
            ..base_args()
        };
        let err = load_mission(&args, &templates).unwrap_err();
        assert!(format!("{err:#}").contains("failed to load mission"));
    }

    #[test]
    fn write_reports_emits_each_format() {
        let (result, advice) = sample_result();
        let dir = tempfile::tempdir().unwrap();
        let cases = [
            (ReportFormat::Json, false, "\"simulation_summary\""),
            (ReportFormat::Json, true, "\"most_common_failure_types\""),
            (ReportFormat::Markdown, false, "# Mission Simulation: Coastal Patrol"),
            (ReportFormat::Csv, false, "run_number,waypoint_id"),
            (ReportFormat::Html, false, "<!DOCTYPE html>"),
            (ReportFormat::Console, false, "Recommendations"),
            (ReportFormat::Console, true, "Trials: 200"),
        ];
        for (index, (report, quick, needle)) in cases.into_iter().enumerate() {
            let path = dir.path().join(format!("report-{index}"));
            let args = SimulateArgs {
                report,
                quick,
                output: Some(path.clone()),
                ..base_args()
            };
            write_reports(&args, &result, &advice).unwrap();
            let content = fs::read_to_string(path).unwrap();
            assert!(content.contains(needle), "{report:?}/{quick}: {content}");
        }
    }

    #[test]
    fn quick_is_rejected_for_full_only_formats() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("history.jsonl");
        for (report, name) in [
            (ReportFormat::Markdown, "markdown"),
            (ReportFormat::Csv, "csv"),
            (ReportFormat::Html, "html"),
        ] {
            let args = SimulateArgs {
                report,
                quick: true,
                no_history: false,
                history: history.clone(),
                output: Some(dir.path().join(name)),
                ..base_args()
            };
            let err = run_simulate(&args).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("--quick supports only console and json reports, not {name}")
            );
            assert!(!args.output.as_ref().unwrap().exists());
        }
        assert!(!history.exists());

        for report in [ReportFormat::Console, ReportFormat::Json] {
            let args = SimulateArgs {
                report,
                quick: true,
                ..base_args()
            };
            assert!(ensure_quick_supported(&args).is_ok());
        }
    }

    #[test]
    fn run_simulate_logs_history_when_enabled() {
        let dir = tempfile::tempdir().unwrap();
        let history = dir.path().join("logs/history.jsonl");
        let args = SimulateArgs {
            simulations: Some(25),
            history: history.clone(),
            no_history: false,
            output: Some(dir.path().join("out.json")),
            ..base_args()
        };
        run_simulate(&args).unwrap();
        run_simulate(&args).unwrap();
        let entries = recent_history(&history, 20).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].mission_name, "Urban Parcel Delivery");
        assert_eq!(recent_history(&history, 1).unwrap().len(), 1);
    }

    #[test]
    fn run_templates_lists_shipped_missions() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("templates.txt");
        run_templates(&TemplatesArgs {
            templates_dir: repo_templates(),
            output: Some(out.clone()),
        })
        .unwrap();
        let content = fs::read_to_string(out).unwrap();
        assert!(content.contains("Available templates"));
        assert!(content.contains("coastal_patrol"));
        assert!(content.contains("Farmland Crop Survey"));
    }

    #[test]
    fn run_history_handles_missing_log() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("history.json");
        run_history(&HistoryArgs {
            limit: 5,
            history: dir.path().join("absent.jsonl"),
            report: HistoryFormat::Json,
            output: Some(out.clone()),
        })
        .unwrap();
        assert_eq!(fs::read_to_string(out).unwrap().trim(), "[]");
    }

    #[test]
    fn output_target_stdout_writes() {
        let mut target = OutputTarget::new(None).unwrap();
        target.write_all(b"ok").unwrap();
        target.flush().unwrap();
    }
}
