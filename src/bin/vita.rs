//! Vita CLI - Command-line interface for the Vitalog engine
//!
//! Commands:
//! - log: Append or replace a day's entry in an NDJSON journal
//! - report: Run the full analysis and emit a report
//! - stats: Show derived statistics only
//! - insights: Show generated insights and daily alerts
//! - badges: Evaluate gamification state and show unlocks
//! - validate: Validate journal entries
//! - doctor: Diagnose journal and state files

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use chrono::{NaiveDate, Utc};

use vitalog::gamification::GamificationState;
use vitalog::store::{parse_entries_ndjson, FileStore, JournalStore, GAMIFICATION_STATE_KEY};
use vitalog::types::{AnalyticsReport, HealthEntry, SymptomLog};
use vitalog::{JournalAnalytics, KeyValueStore, ENGINE_VERSION, PRODUCER_NAME};

/// Vita - On-device analytics for daily health journaling
#[derive(Parser)]
#[command(name = "vita")]
#[command(author = "Vitalog Labs")]
#[command(version = ENGINE_VERSION)]
#[command(about = "Analyze a daily health journal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Append or replace a day's entry in the journal
    Log {
        /// Journal file path (NDJSON, one entry per line)
        #[arg(short, long)]
        journal: PathBuf,

        /// Entry date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        date: Option<String>,

        /// Bedtime ("HH:MM")
        #[arg(long)]
        sleep_start: String,

        /// Wake time ("HH:MM")
        #[arg(long)]
        sleep_end: String,

        /// Sleep quality (1-10)
        #[arg(long)]
        quality: f64,

        /// Mood score (1-10)
        #[arg(long)]
        mood: f64,

        /// Stress score (1-10)
        #[arg(long)]
        stress: f64,

        /// Free-text journal note
        #[arg(long, default_value = "")]
        note: String,

        /// Voice note reference
        #[arg(long)]
        voice_note: Option<String>,

        /// GI flare severity (0-10)
        #[arg(long, default_value = "0")]
        gi_flare: f64,

        /// Skin flare severity (0-10)
        #[arg(long, default_value = "0")]
        skin_flare: f64,

        /// Migraine severity (0-10)
        #[arg(long, default_value = "0")]
        migraine: f64,
    },

    /// Run the full analysis and emit a report
    Report {
        /// Journal file path (use - for stdin)
        #[arg(short, long)]
        journal: PathBuf,

        /// State file for gamification unlocks (read-modify-write)
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Output file path (use - for stdout)
        #[arg(short, long, default_value = "-")]
        output: PathBuf,

        /// Output format
        #[arg(long, default_value = "json-pretty")]
        format: OutputFormat,

        /// Anchor date for streaks and windows (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<String>,

        /// Trailing window for metric trends, in days
        #[arg(long, default_value = "30")]
        trend_window: u32,
    },

    /// Show derived statistics only
    Stats {
        /// Journal file path (use - for stdin)
        #[arg(short, long)]
        journal: PathBuf,

        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show generated insights and daily alerts
    Insights {
        /// Journal file path (use - for stdin)
        #[arg(short, long)]
        journal: PathBuf,

        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Evaluate gamification state and show unlocks
    Badges {
        /// Journal file path (use - for stdin)
        #[arg(short, long)]
        journal: PathBuf,

        /// State file for unlocks; evaluated fresh when omitted
        #[arg(short, long)]
        state: Option<PathBuf>,

        /// Anchor date (YYYY-MM-DD); defaults to today
        #[arg(long)]
        today: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Validate journal entries
    Validate {
        /// Journal file path (use - for stdin)
        #[arg(short, long)]
        journal: PathBuf,

        /// Output validation report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Diagnose journal and state files
    Doctor {
        /// Journal file to check
        #[arg(long)]
        journal: Option<PathBuf>,

        /// State file to check
        #[arg(long)]
        state: Option<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Compact JSON
    Json,
    /// Pretty-printed JSON
    JsonPretty,
    /// Human-readable summary
    Text,
}

fn main() -> ExitCode {
    if std::env::var_os("VITA_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_env("VITA_LOG"))
            .with_writer(io::stderr)
            .init();
    }

    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!(
                "{}",
                serde_json::to_string(&CliError::from(e))
                    .unwrap_or_else(|_| "Unknown error".to_string())
            );
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), VitaCliError> {
    match cli.command {
        Commands::Log {
            journal,
            date,
            sleep_start,
            sleep_end,
            quality,
            mood,
            stress,
            note,
            voice_note,
            gi_flare,
            skin_flare,
            migraine,
        } => cmd_log(
            &journal,
            date,
            sleep_start,
            sleep_end,
            quality,
            mood,
            stress,
            note,
            voice_note,
            SymptomLog {
                gi_flare,
                skin_flare,
                migraine,
            },
        ),

        Commands::Report {
            journal,
            state,
            output,
            format,
            today,
            trend_window,
        } => cmd_report(
            &journal,
            state.as_deref(),
            &output,
            format,
            today.as_deref(),
            trend_window,
        ),

        Commands::Stats {
            journal,
            today,
            json,
        } => cmd_stats(&journal, today.as_deref(), json),

        Commands::Insights {
            journal,
            today,
            json,
        } => cmd_insights(&journal, today.as_deref(), json),

        Commands::Badges {
            journal,
            state,
            today,
            json,
        } => cmd_badges(&journal, state.as_deref(), today.as_deref(), json),

        Commands::Validate { journal, json } => cmd_validate(&journal, json),

        Commands::Doctor {
            journal,
            state,
            json,
        } => cmd_doctor(journal.as_deref(), state.as_deref(), json),
    }
}

#[allow(clippy::too_many_arguments)]
fn cmd_log(
    journal: &Path,
    date: Option<String>,
    sleep_start: String,
    sleep_end: String,
    quality: f64,
    mood: f64,
    stress: f64,
    note: String,
    voice_note: Option<String>,
    symptoms: SymptomLog,
) -> Result<(), VitaCliError> {
    let date = date.unwrap_or_else(|| Utc::now().date_naive().to_string());

    let entry = HealthEntry::new(
        date,
        sleep_start,
        sleep_end,
        quality,
        mood,
        stress,
        note,
        voice_note,
        symptoms,
    );
    entry
        .validate()
        .map_err(vitalog::AnalyticsError::InvalidEntry)?;

    let store = JournalStore::new(journal);
    store.upsert(&entry)?;

    println!(
        "Logged {} ({:.2}h sleep) to {}",
        entry.date,
        entry.sleep.duration_hours,
        journal.display()
    );
    Ok(())
}

fn cmd_report(
    journal: &Path,
    state: Option<&Path>,
    output: &Path,
    format: OutputFormat,
    today: Option<&str>,
    trend_window: u32,
) -> Result<(), VitaCliError> {
    let entries = read_entries(journal)?;
    let today = resolve_today(today)?;
    let now = Utc::now();

    let mut processor = JournalAnalytics::with_trend_window(trend_window);
    let report = match state {
        Some(state_path) => {
            let mut store = FileStore::open(state_path)?;
            processor.process_with_store(&mut store, &entries, today, now)?
        }
        None => processor.process_at(&entries, today, now),
    };

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string(&report)?,
        OutputFormat::JsonPretty => serde_json::to_string_pretty(&report)?,
        OutputFormat::Text => render_report_text(&report),
    };

    if output.to_string_lossy() == "-" {
        println!("{rendered}");
    } else {
        fs::write(output, rendered)?;
    }
    Ok(())
}

fn cmd_stats(journal: &Path, today: Option<&str>, json: bool) -> Result<(), VitaCliError> {
    let entries = read_entries(journal)?;
    let today = resolve_today(today)?;

    let stats = vitalog::StatisticsAggregator::aggregate(&entries, today);

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("Entries:        {}", stats.total_entries);
        println!("Avg sleep:      {:.2}h", stats.average_sleep_hours);
        println!("Avg quality:    {:.1}/10", stats.average_sleep_quality);
        println!("Avg mood:       {:.1}/10", stats.average_mood);
        println!("Avg stress:     {:.1}/10", stats.average_stress);
        println!("Current streak: {} days", stats.current_streak);
        println!("Longest streak: {} days", stats.longest_streak);
        println!("Trend:          {}", stats.improvement_trend.as_str());
        println!(
            "Level:          {} ({} / {} XP)",
            stats.level, stats.experience, stats.next_level_experience
        );
    }
    Ok(())
}

fn cmd_insights(journal: &Path, today: Option<&str>, json: bool) -> Result<(), VitaCliError> {
    let entries = read_entries(journal)?;
    let today = resolve_today(today)?;

    let mut processor = JournalAnalytics::new();
    let report = processor.process_at(&entries, today, Utc::now());

    if json {
        let payload = serde_json::json!({
            "insights": report.insights,
            "alerts": report.alerts,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        if report.insights.is_empty() {
            println!("No insights yet.");
        }
        for insight in &report.insights {
            println!(
                "[{:?}] {} (confidence {:.2})",
                insight.priority, insight.title, insight.confidence
            );
            println!("    {}", insight.description);
            for rec in &insight.recommendations {
                println!("    - {rec}");
            }
        }
        if !report.alerts.is_empty() {
            println!("\nAlerts:");
            for alert in &report.alerts {
                println!("  ! {}", alert.message);
            }
        }
    }
    Ok(())
}

fn cmd_badges(
    journal: &Path,
    state: Option<&Path>,
    today: Option<&str>,
    json: bool,
) -> Result<(), VitaCliError> {
    let entries = read_entries(journal)?;
    let today = resolve_today(today)?;
    let now = Utc::now();

    let mut processor = JournalAnalytics::new();
    let report = match state {
        Some(state_path) => {
            let mut store = FileStore::open(state_path)?;
            processor.process_with_store(&mut store, &entries, today, now)?
        }
        None => processor.process_at(&entries, today, now),
    };

    if json {
        let payload = serde_json::json!({
            "badges": report.badges,
            "achievements": report.achievements,
            "newly_unlocked": report.newly_unlocked,
        });
        println!("{}", serde_json::to_string_pretty(&payload)?);
    } else {
        for badge in &report.badges {
            let marker = if badge.is_unlocked { "*" } else { " " };
            println!(
                "[{marker}] {:<20} {:>5.1}/{:<5.1} {}",
                badge.title, badge.progress, badge.max_progress, badge.description
            );
        }
        if !report.newly_unlocked.is_empty() {
            println!("\nNewly unlocked:");
            for item in &report.newly_unlocked {
                println!("  + {}", item.title);
            }
        }
    }
    Ok(())
}

fn cmd_validate(journal: &Path, json: bool) -> Result<(), VitaCliError> {
    let content = read_input(journal)?;

    let mut report = ValidationReport {
        total_lines: 0,
        valid_entries: 0,
        invalid_entries: 0,
        errors: Vec::new(),
    };

    for (index, line) in content.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        report.total_lines += 1;

        let result = serde_json::from_str::<HealthEntry>(trimmed)
            .map_err(|e| e.to_string())
            .and_then(|entry| entry.validate().map(|_| entry).map_err(|e| e.to_string()));

        match result {
            Ok(_) => report.valid_entries += 1,
            Err(error) => {
                report.invalid_entries += 1;
                report.errors.push(ValidationErrorDetail {
                    line: index + 1,
                    error,
                });
            }
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Validation Report");
        println!("=================");
        println!("Entries:  {}", report.total_lines);
        println!("Valid:    {}", report.valid_entries);
        println!("Invalid:  {}", report.invalid_entries);

        if !report.errors.is_empty() {
            println!("\nErrors:");
            for err in &report.errors {
                println!("  - line {}: {}", err.line, err.error);
            }
        }
    }

    if report.invalid_entries > 0 {
        Err(VitaCliError::ValidationFailed(report.invalid_entries))
    } else {
        Ok(())
    }
}

fn cmd_doctor(
    journal: Option<&Path>,
    state: Option<&Path>,
    json: bool,
) -> Result<(), VitaCliError> {
    let mut checks: Vec<DoctorCheck> = Vec::new();

    checks.push(DoctorCheck {
        name: "engine_version".to_string(),
        status: CheckStatus::Ok,
        message: format!("Vitalog version {ENGINE_VERSION}"),
    });

    if let Some(journal_path) = journal {
        if journal_path.exists() {
            match fs::read_to_string(journal_path).map_err(vitalog::AnalyticsError::from) {
                Ok(content) => match parse_entries_ndjson(&content) {
                    Ok(entries) => checks.push(DoctorCheck {
                        name: "journal".to_string(),
                        status: CheckStatus::Ok,
                        message: format!("Journal valid ({} entries)", entries.len()),
                    }),
                    Err(e) => checks.push(DoctorCheck {
                        name: "journal".to_string(),
                        status: CheckStatus::Error,
                        message: format!("Invalid journal: {e}"),
                    }),
                },
                Err(e) => checks.push(DoctorCheck {
                    name: "journal".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Cannot read journal: {e}"),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "journal".to_string(),
                status: CheckStatus::Warning,
                message: "Journal file does not exist".to_string(),
            });
        }
    }

    if let Some(state_path) = state {
        if state_path.exists() {
            let loaded = FileStore::open(state_path)
                .and_then(|store| store.get(GAMIFICATION_STATE_KEY))
                .and_then(|blob| match blob {
                    Some(json) => GamificationState::from_json(&json).map(Some),
                    None => Ok(None),
                });
            match loaded {
                Ok(Some(parsed)) => checks.push(DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Ok,
                    message: format!(
                        "State valid (schema {}, {} badges tracked)",
                        parsed.schema_version,
                        parsed.badges.len()
                    ),
                }),
                Ok(None) => checks.push(DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Warning,
                    message: "State file has no gamification blob yet".to_string(),
                }),
                Err(e) => checks.push(DoctorCheck {
                    name: "state".to_string(),
                    status: CheckStatus::Error,
                    message: format!("Invalid state file: {e}"),
                }),
            }
        } else {
            checks.push(DoctorCheck {
                name: "state".to_string(),
                status: CheckStatus::Warning,
                message: "State file does not exist".to_string(),
            });
        }
    }

    let stdin_check = if atty::is(atty::Stream::Stdin) {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a TTY (interactive mode)".to_string(),
        }
    } else {
        DoctorCheck {
            name: "stdin".to_string(),
            status: CheckStatus::Ok,
            message: "stdin is a pipe (journal can be streamed)".to_string(),
        }
    };
    checks.push(stdin_check);

    let report = DoctorReport {
        producer: PRODUCER_NAME.to_string(),
        version: ENGINE_VERSION.to_string(),
        checks,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("Vita Doctor Report");
        println!("==================");
        println!("Producer: {}", report.producer);
        println!("Version:  {}", report.version);
        println!("\nChecks:");

        for check in &report.checks {
            let status_icon = match check.status {
                CheckStatus::Ok => "[OK]",
                CheckStatus::Warning => "[WARN]",
                CheckStatus::Error => "[ERR]",
            };
            println!("  {} {}: {}", status_icon, check.name, check.message);
        }
    }

    let has_errors = report
        .checks
        .iter()
        .any(|c| matches!(c.status, CheckStatus::Error));
    if has_errors {
        Err(VitaCliError::DoctorFailed)
    } else {
        Ok(())
    }
}

// Helper functions

fn read_input(path: &Path) -> Result<String, VitaCliError> {
    if path.to_string_lossy() == "-" {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        Ok(buffer)
    } else {
        Ok(fs::read_to_string(path)?)
    }
}

fn read_entries(path: &Path) -> Result<Vec<HealthEntry>, VitaCliError> {
    if path.to_string_lossy() == "-" {
        let content = read_input(path)?;
        Ok(vitalog::store::dedupe_by_date(parse_entries_ndjson(
            &content,
        )?))
    } else {
        Ok(JournalStore::new(path).load()?)
    }
}

fn resolve_today(today: Option<&str>) -> Result<NaiveDate, VitaCliError> {
    match today {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| VitaCliError::ParseError(format!("Invalid date: {s}"))),
        None => Ok(Utc::now().date_naive()),
    }
}

fn render_report_text(report: &AnalyticsReport) -> String {
    let mut out = String::new();
    let stats = &report.stats;

    out.push_str(&format!(
        "Vitalog report for {} ({} entries)\n\n",
        report.as_of, report.entry_count
    ));
    out.push_str(&format!(
        "Sleep {:.2}h | quality {:.1} | mood {:.1} | stress {:.1}\n",
        stats.average_sleep_hours,
        stats.average_sleep_quality,
        stats.average_mood,
        stats.average_stress
    ));
    out.push_str(&format!(
        "Streak {} (best {}) | trend {} | level {}\n",
        stats.current_streak,
        stats.longest_streak,
        stats.improvement_trend.as_str(),
        stats.level
    ));

    if !report.correlations.is_empty() {
        out.push_str("\nCorrelations:\n");
        for correlation in &report.correlations {
            out.push_str(&format!("  {}\n", correlation.description));
        }
    }

    if !report.insights.is_empty() {
        out.push_str("\nInsights:\n");
        for insight in &report.insights {
            out.push_str(&format!(
                "  [{:?}] {} ({:.2})\n",
                insight.priority, insight.title, insight.confidence
            ));
        }
    }

    if !report.alerts.is_empty() {
        out.push_str("\nAlerts:\n");
        for alert in &report.alerts {
            out.push_str(&format!("  ! {}\n", alert.message));
        }
    }

    if !report.newly_unlocked.is_empty() {
        out.push_str("\nNewly unlocked:\n");
        for item in &report.newly_unlocked {
            out.push_str(&format!("  + {}\n", item.title));
        }
    }

    out
}

// Error types

#[derive(Debug)]
enum VitaCliError {
    Io(io::Error),
    Analytics(vitalog::AnalyticsError),
    Json(serde_json::Error),
    ParseError(String),
    ValidationFailed(usize),
    DoctorFailed,
}

impl From<io::Error> for VitaCliError {
    fn from(e: io::Error) -> Self {
        VitaCliError::Io(e)
    }
}

impl From<vitalog::AnalyticsError> for VitaCliError {
    fn from(e: vitalog::AnalyticsError) -> Self {
        VitaCliError::Analytics(e)
    }
}

impl From<serde_json::Error> for VitaCliError {
    fn from(e: serde_json::Error) -> Self {
        VitaCliError::Json(e)
    }
}

#[derive(serde::Serialize)]
struct CliError {
    code: String,
    message: String,
    hint: Option<String>,
}

impl From<VitaCliError> for CliError {
    fn from(e: VitaCliError) -> Self {
        match e {
            VitaCliError::Io(e) => CliError {
                code: "IO_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check file paths and permissions".to_string()),
            },
            VitaCliError::Analytics(e) => CliError {
                code: "ANALYTICS_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Run 'vita validate' on the journal for details".to_string()),
            },
            VitaCliError::Json(e) => CliError {
                code: "JSON_ERROR".to_string(),
                message: e.to_string(),
                hint: Some("Check JSON syntax".to_string()),
            },
            VitaCliError::ParseError(msg) => CliError {
                code: "PARSE_ERROR".to_string(),
                message: msg,
                hint: Some("Check input format".to_string()),
            },
            VitaCliError::ValidationFailed(count) => CliError {
                code: "VALIDATION_FAILED".to_string(),
                message: format!("{count} entries failed validation"),
                hint: Some("Fix validation errors and retry".to_string()),
            },
            VitaCliError::DoctorFailed => CliError {
                code: "DOCTOR_FAILED".to_string(),
                message: "One or more health checks failed".to_string(),
                hint: Some("Review the doctor report for details".to_string()),
            },
        }
    }
}

// Report types

#[derive(serde::Serialize)]
struct ValidationReport {
    total_lines: usize,
    valid_entries: usize,
    invalid_entries: usize,
    errors: Vec<ValidationErrorDetail>,
}

#[derive(serde::Serialize)]
struct ValidationErrorDetail {
    line: usize,
    error: String,
}

#[derive(serde::Serialize)]
struct DoctorReport {
    producer: String,
    version: String,
    checks: Vec<DoctorCheck>,
}

#[derive(serde::Serialize)]
struct DoctorCheck {
    name: String,
    status: CheckStatus,
    message: String,
}

#[derive(serde::Serialize)]
enum CheckStatus {
    Ok,
    Warning,
    Error,
}
