use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use sonar_gate::config::{CheckConfig, Config};
use sonar_gate::{credentials, hook, pipeline};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sonar-gate",
    about = "Quality-gate automation for SonarQube with AI remediation suggestions",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the scanner, wait for the analysis, and evaluate the quality gate
    Check(CheckArgs),
    /// Install the prepare-commit-msg hook into the enclosing repository
    InstallHook,
    /// Store API tokens in the system keychain
    Login(LoginArgs),
    /// Show or persist default settings
    Config(ConfigArgs),
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// SonarQube host URL
    #[arg(long)]
    host: Option<String>,

    /// Project key to analyze
    #[arg(long)]
    project: Option<String>,

    /// Page size for issue/hotspot fetches (first page only)
    #[arg(long)]
    page_size: Option<u32>,

    /// Context lines around a flagged line in suggestion prompts
    #[arg(long)]
    context_lines: Option<usize>,

    /// Initial delay between CE task status polls, in seconds
    #[arg(long)]
    poll_interval_secs: Option<u64>,

    /// Maximum CE task status polls before giving up
    #[arg(long)]
    max_poll_attempts: Option<u32>,

    /// Inference model for remediation suggestions
    #[arg(long)]
    model: Option<String>,

    /// Where to write the JSON report
    #[arg(long)]
    report_path: Option<PathBuf>,

    /// Do not request AI suggestions on a failing gate
    #[arg(long)]
    skip_suggestions: bool,
}

#[derive(Args, Debug)]
struct ConfigArgs {
    /// Default SonarQube host URL
    #[arg(long)]
    host: Option<String>,

    /// Default project key
    #[arg(long)]
    project: Option<String>,

    /// Default inference model
    #[arg(long)]
    model: Option<String>,

    /// Default location of the JSON report
    #[arg(long)]
    report_path: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct LoginArgs {
    /// SonarQube user token to store
    #[arg(long)]
    sonar_token: Option<String>,

    /// Inference API token to store
    #[arg(long)]
    hf_token: Option<String>,
}

impl CheckArgs {
    /// Merge CLI flags over the config file; flags win.
    fn resolve(self, config: Config) -> Result<CheckConfig> {
        let project_key = self
            .project
            .or(config.project_key)
            .ok_or_else(|| anyhow::anyhow!("No project key. Pass --project or set it in config."))?;

        Ok(CheckConfig {
            host: self.host.unwrap_or(config.host),
            project_key,
            page_size: self.page_size.unwrap_or(config.page_size),
            context_lines: self.context_lines.unwrap_or(config.context_lines),
            poll_interval_secs: self.poll_interval_secs.unwrap_or(config.poll_interval_secs),
            max_poll_attempts: self.max_poll_attempts.unwrap_or(config.max_poll_attempts),
            http_timeout_secs: config.http_timeout_secs,
            model: self.model.unwrap_or(config.model),
            report_path: self.report_path.unwrap_or(config.report_path),
            skip_suggestions: self.skip_suggestions,
        })
    }
}

fn run_config(args: ConfigArgs) -> Result<()> {
    let mut config = Config::load();

    let changed = args.host.is_some()
        || args.project.is_some()
        || args.model.is_some()
        || args.report_path.is_some();

    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(project) = args.project {
        config.project_key = Some(project);
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if let Some(report_path) = args.report_path {
        config.report_path = report_path;
    }

    if changed {
        config.save()?;
        println!("Config saved.");
    } else {
        println!("{}", serde_json::to_string_pretty(&config)?);
    }
    Ok(())
}

fn run_login(args: LoginArgs) -> Result<()> {
    let mut stored = false;
    if let Some(token) = args.sonar_token {
        credentials::store_sonar_token(&token)?;
        println!("SonarQube token stored.");
        stored = true;
    }
    if let Some(token) = args.hf_token {
        credentials::store_hf_token(&token)?;
        println!("Inference token stored.");
        stored = true;
    }
    if !stored {
        anyhow::bail!("Nothing to store. Pass --sonar-token and/or --hf-token.");
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let result: Result<i32> = match cli.command {
        Command::Check(args) => match args.resolve(Config::load()) {
            Ok(check_config) => pipeline::run_check(&check_config).await,
            Err(err) => Err(err),
        },
        Command::InstallHook => hook::install(std::path::Path::new(".")).map(|_| 0),
        Command::Login(args) => run_login(args).map(|_| 0),
        Command::Config(args) => run_config(args).map(|_| 0),
    };

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(1);
        }
    }
}
