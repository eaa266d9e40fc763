// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! org-onboard: AI-assisted organization onboarding
//!
//! Command-line driver for the onboarding form: validate and normalize
//! drafts, run website enrichment, and submit new organizations.

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use org_onboard::config::AppConfig;
use org_onboard::controller::{OrganizationForm, SubmitOutcome};
use org_onboard::draft::OrganizationDraft;
use org_onboard::enrichment::{AnalysisContext, EnrichmentService};
use org_onboard::events::{EventBus, FormEvent, NotificationLevel};
use org_onboard::merge::MergeTarget;
use org_onboard::services::{AddressLookup, ApiClient, LogNavigator};
use org_onboard::session::{SessionStore, USER_INFO_KEY};
use org_onboard::submission::{build_payload, SubmissionPipeline};
use org_onboard::validation::validate_draft;
use org_onboard::{OnboardError, Result};

/// org-onboard CLI - AI-assisted organization onboarding
#[derive(Parser, Debug)]
#[command(name = "org-onboard")]
#[command(author = "Jonathan D. A. Jewell <hyperpolymath>")]
#[command(version = "0.1.0")]
#[command(about = "Create organizations with AI-assisted website enrichment", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Path to configuration file (JSON format)
    #[arg(short, long, default_value = "onboard.json", global = true)]
    config: PathBuf,

    /// Enable verbose logging (debug level)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable trace logging (most verbose)
    #[arg(long, global = true)]
    trace: bool,

    /// Output format for results
    #[arg(long, global = true, default_value = "text", value_parser = ["text", "json"])]
    format: String,

    /// Suppress non-essential output (quiet mode)
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Validate a draft file and report field errors
    Validate {
        /// Draft JSON file
        draft: PathBuf,
    },

    /// Show the normalized payload a draft would submit
    Payload {
        /// Draft JSON file
        draft: PathBuf,
    },

    /// Analyze a website and list suggestions
    Analyze {
        /// Website to analyze
        website: String,

        /// Client name sent as context
        #[arg(long)]
        client_name: Option<String>,

        /// Market sector sent as context (overrides config)
        #[arg(long)]
        sector: Option<String>,
    },

    /// Run the full onboarding flow: enrich, review, submit
    Onboard {
        /// Draft JSON file to start from
        #[arg(short, long)]
        draft: Option<PathBuf>,

        /// Website to enter (overrides the draft)
        #[arg(short, long)]
        website: Option<String>,

        /// Stop before submitting and print the payload
        #[arg(long)]
        dry_run: bool,

        /// Apply suggestions held for review as well
        #[arg(long)]
        accept_all: bool,

        /// Skip backend health check on startup
        #[arg(long)]
        skip_health_check: bool,

        /// Seconds to wait for website analysis
        #[arg(long, default_value = "30")]
        analysis_timeout: u64,
    },

    /// Address lookups
    Address {
        #[command(subcommand)]
        action: AddressCommands,
    },

    /// Local session storage
    Session {
        #[command(subcommand)]
        action: SessionCommands,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigCommands,
    },

    /// Show backend and session status
    Status,

    /// Create a configuration file and an example draft
    Init {
        /// Directory to initialize (default: current)
        #[arg(short, long)]
        dir: Option<PathBuf>,

        /// Force overwrite existing files
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum AddressCommands {
    /// Look up city and state for a zip/pin code
    Zip {
        code: String,
    },

    /// List cities of a state
    Cities {
        state_code: String,
    },
}

#[derive(Subcommand, Debug)]
enum SessionCommands {
    /// Show stored session entries
    Show,

    /// Remove all stored session entries
    Clear {
        /// Skip confirmation prompt
        #[arg(long)]
        force: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommands {
    /// Show current configuration
    Show,

    /// Generate default configuration file
    Generate {
        /// Output file path
        #[arg(short, long, default_value = "onboard.json")]
        output: PathBuf,
    },

    /// Validate configuration file
    Validate,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize tracing
    let filter = if cli.trace {
        "trace"
    } else if cli.verbose {
        "debug"
    } else if cli.quiet {
        "warn"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    let config = AppConfig::load(&cli.config)?;
    let json = cli.format == "json";

    match cli.command {
        Commands::Validate { draft } => run_validate(&draft, json),
        Commands::Payload { draft } => run_payload(&draft),
        Commands::Analyze { website, client_name, sector } => {
            run_analyze(config, website, client_name, sector, json).await
        }
        Commands::Onboard { draft, website, dry_run, accept_all, skip_health_check, analysis_timeout } => {
            let options = OnboardOptions {
                draft,
                website,
                dry_run,
                accept_all,
                skip_health_check,
                analysis_timeout: Duration::from_secs(analysis_timeout),
            };
            run_onboard(config, options, json).await
        }
        Commands::Address { action } => run_address_command(config, action, json).await,
        Commands::Session { action } => run_session_command(config, action),
        Commands::Config { action } => run_config_command(config, action, &cli.config),
        Commands::Status => run_status(config).await,
        Commands::Init { dir, force } => run_init(dir, force),
    }
}

/// Validate a draft file
fn run_validate(path: &Path, json: bool) -> Result<()> {
    let draft = OrganizationDraft::load(path)?;
    let errors = validate_draft(&draft);

    if json {
        println!("{}", serde_json::to_string_pretty(&errors)?);
    } else if errors.is_valid() {
        println!("{}: valid", path.display());
    } else {
        println!("{}: {} error(s)", path.display(), errors.len());
        for (field, message) in errors.iter() {
            println!("  {}: {}", field, message);
        }
    }

    Ok(())
}

/// Print the normalized payload
fn run_payload(path: &Path) -> Result<()> {
    let draft = OrganizationDraft::load(path)?;
    let errors = validate_draft(&draft);
    if !errors.is_valid() {
        warn!("Draft has {} validation error(s); payload would be rejected", errors.len());
    }
    println!("{}", serde_json::to_string_pretty(&build_payload(&draft))?);
    Ok(())
}

/// Run one website analysis
async fn run_analyze(
    config: AppConfig,
    website: String,
    client_name: Option<String>,
    sector: Option<String>,
    json: bool,
) -> Result<()> {
    let client = ApiClient::new(&config.api)?;
    let context = AnalysisContext {
        client_name: client_name.unwrap_or_default(),
        market_sector: sector.unwrap_or(config.enrichment.market_sector),
    };

    let suggestions = client.analyze(&website, &context).await?;
    let threshold = config.enrichment.auto_apply_threshold;

    if json {
        println!("{}", serde_json::to_string_pretty(&suggestions)?);
        return Ok(());
    }

    if suggestions.is_empty() {
        println!("No suggestions for {}", website);
    }
    for s in &suggestions {
        let marker = if s.confidence >= threshold { "auto" } else { "review" };
        let known = if MergeTarget::from_field(&s.field).is_some() { "" } else { " (unused)" };
        println!("  [{:>6}] {}: {} ({:.0}%){}", marker, s.field, s.value, s.confidence * 100.0, known);
    }

    Ok(())
}

struct OnboardOptions {
    draft: Option<PathBuf>,
    website: Option<String>,
    dry_run: bool,
    accept_all: bool,
    skip_health_check: bool,
    analysis_timeout: Duration,
}

/// Drive the onboarding form end to end
async fn run_onboard(config: AppConfig, options: OnboardOptions, json: bool) -> Result<()> {
    let client = Arc::new(ApiClient::new(&config.api)?);

    if !options.skip_health_check {
        info!("Checking backend availability...");
        client.health_check().await?;
    } else {
        warn!("Skipping backend health check");
    }

    let store = SessionStore::open(&config.session.path)?;
    let submission = SubmissionPipeline::new(
        client.clone(),
        client.clone(),
        store,
        Arc::new(LogNavigator),
        config.navigation.clone(),
    );
    let form = OrganizationForm::new(
        config.enrichment.clone(),
        client.clone(),
        client.clone(),
        submission,
        EventBus::default(),
    );
    let mut rx = form.subscribe();

    if let Some(path) = &options.draft {
        form.fill(&OrganizationDraft::load(path)?);
    }
    if let Some(website) = options.website {
        form.on_website_change(website);
    }

    wait_for_analysis(&mut rx, options.analysis_timeout).await;

    if options.accept_all {
        for suggestion in form.pending_suggestions() {
            if let Some(target) = form.accept_suggestion(&suggestion.field) {
                info!("Accepted {} from review", target.as_str());
            }
        }
    }

    if form.draft().address.city.is_empty() {
        if let Some(filled) = form.autofill_address().await {
            info!("Address filled from pincode: {}, {}", filled.city, filled.state_code);
        }
    }

    let snapshot = form.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        print_snapshot(&snapshot);
    }

    if options.dry_run {
        println!("{}", serde_json::to_string_pretty(&build_payload(&snapshot.draft))?);
        return Ok(());
    }

    submit_result(form.submit().await)
}

/// Map a submit outcome to the command's exit result
fn submit_result(outcome: SubmitOutcome) -> Result<()> {
    match outcome {
        SubmitOutcome::Redirected { organization, navigation } => {
            println!("Created organization {} ({})", organization.name, organization.id);
            debug!("Navigation: {:?}", navigation);
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => {
            for (field, message) in errors.iter() {
                eprintln!("  {}: {}", field, message);
            }
            Err(OnboardError::Validation(format!("draft has {} error(s)", errors.len())))
        }
        SubmitOutcome::Failed { reason } => Err(OnboardError::ServiceUnavailable(reason)),
        SubmitOutcome::AlreadySubmitting => Ok(()),
    }
}

/// Print notifications until the last scheduled analysis settles
async fn wait_for_analysis(rx: &mut broadcast::Receiver<FormEvent>, timeout: Duration) {
    let mut scheduled = false;
    while let Ok(event) = rx.try_recv() {
        scheduled |= matches!(event, FormEvent::AnalysisScheduled { .. });
    }
    if !scheduled {
        return;
    }

    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        match tokio::time::timeout_at(deadline, rx.recv()).await {
            Ok(Ok(FormEvent::Notification(n))) => match n.level {
                NotificationLevel::Error => eprintln!("error: {}", n.message),
                NotificationLevel::Warning => eprintln!("warning: {}", n.message),
                NotificationLevel::Info => println!("{}", n.message),
            },
            Ok(Ok(FormEvent::AnalysisCompleted { .. }))
            | Ok(Ok(FormEvent::AnalysisFailed { .. }))
            | Ok(Ok(FormEvent::AnalysisSkipped { .. })) => return,
            Ok(Ok(_)) => {}
            Ok(Err(broadcast::error::RecvError::Lagged(n))) => debug!("Missed {} form events", n),
            Ok(Err(broadcast::error::RecvError::Closed)) => return,
            Err(_) => {
                warn!("Website analysis did not finish within {:?}", timeout);
                return;
            }
        }
    }
}

fn print_snapshot(snapshot: &org_onboard::controller::FormSnapshot) {
    let draft = &snapshot.draft;
    let badge = |target: MergeTarget| {
        if snapshot.auto_applied.contains(&target) { " [auto]" } else { "" }
    };

    println!("Organization draft:");
    println!("  Name:    {}{}", draft.name, badge(MergeTarget::Name));
    println!("  Website: {}", draft.website);
    println!(
        "  Address: {} {} {} {} {}{}",
        draft.address.line1,
        draft.address.line2,
        draft.address.city,
        draft.address.state,
        draft.address.pincode,
        badge(MergeTarget::Address)
    );
    println!("  Email:   {}{}", draft.contact.email, badge(MergeTarget::Email));
    println!("  Phone:   {}{}", draft.contact.phone, badge(MergeTarget::Phone));

    if !snapshot.pending.is_empty() {
        println!("\nSuggestions for review:");
        for s in &snapshot.pending {
            println!("  {}: {} ({:.0}%)", s.field, s.value, s.confidence * 100.0);
        }
    }
    if !snapshot.errors.is_valid() {
        println!("\nValidation errors:");
        for (field, message) in snapshot.errors.iter() {
            println!("  {}: {}", field, message);
        }
    }
}

/// Run address lookups
async fn run_address_command(config: AppConfig, action: AddressCommands, json: bool) -> Result<()> {
    let client = ApiClient::new(&config.api)?;

    match action {
        AddressCommands::Zip { code } => match client.lookup_by_zip_code(&code).await? {
            Some(found) if json => println!("{}", serde_json::to_string_pretty(&found)?),
            Some(found) => println!("{}: {}, {}", code, found.city, found.state_code),
            None => println!("No location found for {}", code),
        },
        AddressCommands::Cities { state_code } => {
            let cities = client.get_cities_by_state(&state_code).await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&cities)?);
            } else {
                println!("Cities in {} ({}):", state_code, cities.len());
                for city in cities {
                    println!("  {}", city);
                }
            }
        }
    }

    Ok(())
}

/// Run session storage commands
fn run_session_command(config: AppConfig, action: SessionCommands) -> Result<()> {
    let store = SessionStore::open(&config.session.path)?;

    match action {
        SessionCommands::Show => {
            let entries = store.entries()?;
            println!("Session entries ({}):", entries.len());
            for entry in entries {
                println!("  {} ({}): {}", entry.key, entry.updated_at.format("%Y-%m-%d %H:%M"), entry.value);
            }
        }
        SessionCommands::Clear { force } => {
            if !force {
                eprintln!("Use --force to confirm clearing the session");
                return Ok(());
            }
            store.clear()?;
            println!("Session cleared");
        }
    }

    Ok(())
}

/// Run config commands
fn run_config_command(config: AppConfig, action: ConfigCommands, config_path: &Path) -> Result<()> {
    match action {
        ConfigCommands::Show => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        ConfigCommands::Generate { output } => {
            AppConfig::default().save(&output)?;
            println!("Generated config at {:?}", output);
        }
        ConfigCommands::Validate => {
            config.validate()?;
            println!("Configuration at {:?} is valid", config_path);
            println!("  Backend: {}", config.api.base_url);
            println!("  Debounce: {}ms", config.enrichment.debounce_ms);
            println!("  Auto-apply threshold: {}", config.enrichment.auto_apply_threshold);
        }
    }

    Ok(())
}

/// Run status check
async fn run_status(config: AppConfig) -> Result<()> {
    let client = ApiClient::new(&config.api)?;

    println!("org-onboard v0.1.0 Status");
    println!("=========================");

    match client.health_check().await {
        Ok(()) => println!("Backend ({}): Running", client.base_url()),
        Err(e) => println!("Backend: Error - {}", e),
    }

    match SessionStore::open(&config.session.path) {
        Ok(store) => match store.load_user_info() {
            Ok(Some(user)) => println!("\nSession: signed in as {} ({})", user.id, user.email.unwrap_or_default()),
            Ok(None) => println!("\nSession: no {} stored", USER_INFO_KEY),
            Err(e) => println!("\nSession: Error - {}", e),
        },
        Err(e) => println!("\nSession: Error - {}", e),
    }

    println!("\nConfiguration:");
    println!("  Enrichment: {}", if config.enrichment.enabled { "enabled" } else { "disabled" });
    println!("  Market sector: {}", config.enrichment.market_sector);
    println!("  Home route: {}", config.navigation.home_route);

    Ok(())
}

/// Initialize a new onboarding workspace
fn run_init(dir: Option<PathBuf>, force: bool) -> Result<()> {
    let target = dir.unwrap_or_else(|| PathBuf::from("."));
    let config_path = target.join("onboard.json");
    let draft_path = target.join("draft.json");

    if config_path.exists() && !force {
        return Err(OnboardError::Config(
            "onboard.json already exists. Use --force to overwrite".to_string()
        ));
    }

    std::fs::create_dir_all(&target)?;
    AppConfig::default().save(&config_path)?;

    let example = OrganizationDraft {
        name: "Example Co".to_string(),
        website: "example.com".to_string(),
        ..Default::default()
    };
    std::fs::write(&draft_path, serde_json::to_string_pretty(&example)?)?;

    println!("Initialized in {:?}", target);
    println!("\nCreated:");
    println!("  - onboard.json");
    println!("  - draft.json");
    println!("\nNext steps:");
    println!("  1. Set api.base_url and api.auth_token in onboard.json");
    println!("  2. org-onboard onboard --draft draft.json --dry-run");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_requires_command() {
        assert!(Cli::try_parse_from(["org-onboard"]).is_err());
    }

    #[test]
    fn test_cli_onboard_command() {
        let cli = Cli::try_parse_from([
            "org-onboard", "onboard", "--website", "acme.co", "--dry-run"
        ]).unwrap();

        match cli.command {
            Commands::Onboard { website, dry_run, analysis_timeout, .. } => {
                assert!(dry_run);
                assert_eq!(website.as_deref(), Some("acme.co"));
                assert_eq!(analysis_timeout, 30);
            }
            _ => panic!("Expected Onboard command"),
        }
    }

    #[test]
    fn test_cli_validate_command() {
        let cli = Cli::try_parse_from([
            "org-onboard", "--format", "json", "validate", "draft.json"
        ]).unwrap();

        assert_eq!(cli.format, "json");
        match cli.command {
            Commands::Validate { draft } => assert_eq!(draft, PathBuf::from("draft.json")),
            _ => panic!("Expected Validate command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["org-onboard", "--format", "yaml", "status"]).is_err());
    }

    #[test]
    fn test_invalid_submit_is_a_validation_error() {
        let errors = validate_draft(&OrganizationDraft::default());
        assert!(matches!(
            submit_result(SubmitOutcome::Invalid(errors)),
            Err(OnboardError::Validation(_))
        ));
        assert!(submit_result(SubmitOutcome::AlreadySubmitting).is_ok());
    }

    #[test]
    fn test_init_writes_config_and_draft() {
        let dir = tempfile::tempdir().unwrap();
        run_init(Some(dir.path().to_path_buf()), false).unwrap();

        assert!(AppConfig::load(&dir.path().join("onboard.json")).is_ok());
        let draft = OrganizationDraft::load(&dir.path().join("draft.json")).unwrap();
        assert!(validate_draft(&draft).is_valid());

        assert!(run_init(Some(dir.path().to_path_buf()), false).is_err());
    }
}
