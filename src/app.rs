use std::io::{IsTerminal, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use clap::{error::ErrorKind, CommandFactory, Parser};
use colored::Colorize;
use env_logger::Builder;
use itertools::Itertools;
use log::LevelFilter;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::api::http::{DEFAULT_SERVER, DEFAULT_TIMEOUT_SECONDS};
use crate::api::{ClientOptions, HttpApiClient};
use crate::cli::args::CliArgs;
use crate::cli::validation;
use crate::config::{self, ConfigFile};
use crate::controller::{ControllerOptions, ExportOutcome, SearchController, SearchOutcome};
use crate::form::{parse_max_results, DEFAULT_MAX_RESULTS, MAX_RESULTS_RANGE};
use crate::output::{self, SearchReport};
use crate::render::ResultStats;
use crate::surface::terminal::TerminalSurface;
use crate::surface::InputField;

fn print_banner() {
    const BANNER: &str = r#"
    __    _                                  __
   / /_  (_)___  ________  ____ ___________/ /_
  / __ \/ /_  / / ___/ _ \/ __ `/ ___/ ___/ __ \
 / /_/ / / / /_(__  )  __/ /_/ / /  / /__/ / / /
/_.___/_/ /___/____/\___/\__,_/_/   \___/_/ /_/
"#;
    print!("{}", BANNER);
    println!("       v{} - company search client", env!("CARGO_PKG_VERSION"));
    println!();
}

fn format_kv_line(label: &str, value: &str) {
    println!(":: {:<10}: {}", label, value);
}

fn flag_column(arg: &clap::Arg) -> String {
    let mut names: Vec<String> = arg.get_short().map(|s| format!("-{s}")).into_iter().collect();
    names.extend(arg.get_long().map(|l| format!("--{l}")));
    names.extend(
        arg.get_visible_aliases()
            .unwrap_or_default()
            .into_iter()
            .map(|a| format!("--{a}")),
    );
    let mut column = names.into_iter().unique().join(", ");
    if arg.get_action().takes_values() {
        let value = arg
            .get_value_names()
            .and_then(|names| names.first())
            .map(|name| name.as_str())
            .unwrap_or("VALUE");
        column.push_str(&format!(" <{value}>"));
    }
    column
}

/// Flags grouped by help heading in one aligned column, followed by the
/// interactive prompt commands.
fn render_custom_help() -> String {
    let cmd = CliArgs::command();
    let mut out = format!(
        "{} {}\n",
        cmd.get_name(),
        cmd.get_version().unwrap_or_default()
    );
    if let Some(about) = cmd.get_long_about().or(cmd.get_about()) {
        out.push_str(&format!("{about}\n"));
    }
    out.push_str(&format!("\nUsage: {} [OPTIONS]\n", cmd.get_name()));

    let rows: Vec<(&str, String, String)> = cmd
        .get_arguments()
        .filter(|arg| !arg.is_hide_set())
        .map(|arg| {
            (
                arg.get_help_heading().unwrap_or("Options"),
                flag_column(arg),
                arg.get_help().map(|h| h.to_string()).unwrap_or_default(),
            )
        })
        .collect();
    let width = rows.iter().map(|(_, flags, _)| flags.len()).max().unwrap_or(0);

    for (heading, group) in &rows.iter().group_by(|(heading, _, _)| *heading) {
        out.push_str(&format!("\n{heading}:\n"));
        for (_, flags, help) in group {
            out.push_str(&format!("  {flags:<width$}  {}\n", help.trim()));
        }
    }
    out.push_str(&format!("\nInteractive mode, {REPL_HELP}\n"));
    out
}

fn level_for_verbosity(verbose: u8) -> LevelFilter {
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}

/// `RUST_LOG` wins over `-v` when it is set.
fn init_logging(verbose: u8) {
    let mut builder = Builder::new();
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] {} - {}",
            Local::now().format("%Y-%m-%d %H:%M:%S"),
            record.level(),
            record.target(),
            record.args()
        )
    });
    match std::env::var("RUST_LOG") {
        Ok(filters) if !filters.trim().is_empty() => {
            builder.parse_filters(&filters);
        }
        _ => {
            builder.filter(None, level_for_verbosity(verbose));
        }
    }
    let _ = builder.try_init();
}

#[derive(Clone, Debug)]
struct RunConfig {
    query: Option<String>,
    max_results: u32,
    interactive: bool,
    export: bool,
    output_dir: PathBuf,
    report: Option<PathBuf>,
    client: ClientOptions,
    no_color: bool,
    notification_ttl: Duration,
    verbose: u8,
}

fn build_run_config(args: CliArgs, cfg: ConfigFile) -> Result<RunConfig, String> {
    validation::validate(&args)?;

    let max_results = args
        .max_results
        .or(cfg.max_results)
        .unwrap_or(DEFAULT_MAX_RESULTS);
    if !MAX_RESULTS_RANGE.contains(&max_results) {
        return Err(format!(
            "invalid max_results {max_results}, expected {}-{}",
            MAX_RESULTS_RANGE.start(),
            MAX_RESULTS_RANGE.end()
        ));
    }

    let timeout_seconds = args
        .timeout
        .or(cfg.timeout)
        .unwrap_or(DEFAULT_TIMEOUT_SECONDS)
        .max(1);
    let server = args
        .server
        .or(cfg.server)
        .unwrap_or_else(|| DEFAULT_SERVER.to_string())
        .trim()
        .to_string();
    let proxy = args
        .proxy
        .or(cfg.proxy)
        .map(|p| p.trim().to_string())
        .filter(|p| !p.is_empty());

    let output_dir = args
        .output_dir
        .or(cfg.output_dir)
        .map(|d| config::expand_tilde(&d))
        .unwrap_or_else(|| PathBuf::from("."));
    let report = args
        .report
        .or(cfg.report)
        .map(|r| config::expand_tilde(&r));

    let notification_seconds = cfg.notification_seconds.unwrap_or(5).max(1);

    let interactive = args.interactive || args.query.is_none();

    Ok(RunConfig {
        query: args.query.map(|q| q.trim().to_string()),
        max_results,
        interactive,
        export: args.export,
        output_dir,
        report,
        client: ClientOptions {
            server,
            timeout_seconds,
            proxy,
        },
        no_color: args.no_color || cfg.no_color.unwrap_or(false),
        notification_ttl: Duration::from_secs(notification_seconds),
        verbose: args.verbose,
    })
}

fn print_summary(stats: &ResultStats) {
    println!();
    for (label, _, value) in stats.counters() {
        format_kv_line(label, &value.to_string().bold().to_string());
    }
    println!();
}

fn print_results(controller: &SearchController) {
    for (idx, result) in controller.current_results().iter().enumerate() {
        let name = result.name.as_deref().unwrap_or("Name not available");
        let mut line = format!("{:>3}. {}", idx + 1, name.bold());
        if result.has_phone() {
            line.push_str(&format!(" :: {}", result.phone.as_deref().unwrap_or_default()));
        }
        if result.has_website() {
            line.push_str(&format!(
                " :: {}",
                result.website.as_deref().unwrap_or_default().blue()
            ));
        }
        println!("{line}");
    }
}

fn write_report(run: &RunConfig, query: &str, controller: &SearchController) {
    let (Some(path), Some(stats)) = (run.report.as_ref(), controller.current_stats()) else {
        return;
    };
    let report = SearchReport::new(query, stats, controller.current_results());
    match output::write_report(path, &report) {
        Ok(format) => {
            log::info!("wrote {:?} report to {}", format, path.display());
            format_kv_line("Report", &path.display().to_string());
        }
        Err(e) => {
            log::error!("{}", e);
            controller.notifier().error(e);
        }
    }
}

async fn search(
    run: &RunConfig,
    surface: &TerminalSurface,
    controller: &SearchController,
    query: &str,
) -> SearchOutcome {
    surface.query_input.set_value(query);
    let outcome = controller.submit().await;
    if let SearchOutcome::Completed { .. } = outcome {
        if let Some(stats) = controller.current_stats() {
            print_summary(&stats);
        }
        print_results(controller);
        write_report(run, query, controller);
    }
    outcome
}

async fn export(controller: &SearchController) -> ExportOutcome {
    let outcome = controller.export().await;
    if let ExportOutcome::Exported { path, .. } = &outcome {
        format_kv_line("CSV", &path.display().to_string());
    }
    outcome
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum ReplCommand {
    Search(String),
    Export,
    New,
    Max(String),
    Health,
    Help,
    Quit,
    Empty,
}

fn parse_command(line: &str) -> Result<ReplCommand, String> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(ReplCommand::Empty);
    }
    let Some(command) = line.strip_prefix('/') else {
        return Ok(ReplCommand::Search(line.to_string()));
    };
    let (name, rest) = command
        .split_once(char::is_whitespace)
        .map(|(n, r)| (n, r.trim()))
        .unwrap_or((command, ""));
    match name.to_lowercase().as_str() {
        "export" | "csv" => Ok(ReplCommand::Export),
        "new" | "reset" => Ok(ReplCommand::New),
        "max" if !rest.is_empty() => Ok(ReplCommand::Max(rest.to_string())),
        "max" => Err("usage: /max N".to_string()),
        "health" => Ok(ReplCommand::Health),
        "help" | "?" => Ok(ReplCommand::Help),
        "quit" | "exit" | "q" => Ok(ReplCommand::Quit),
        other => Err(format!("unknown command '/{other}', try /help")),
    }
}

const REPL_HELP: &str = "type a search term, or one of:
  /export      export the current results to CSV
  /new         clear results and start over
  /max N       maximum results per search
  /health      check the backend
  /quit        leave";

async fn run_interactive(
    run: &RunConfig,
    surface: &TerminalSurface,
    controller: &SearchController,
) -> Result<(), String> {
    println!("{REPL_HELP}");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "bizsearch>".bold().green());
        std::io::stdout()
            .flush()
            .map_err(|e| format!("failed to write prompt: {e}"))?;

        let Some(line) = lines
            .next_line()
            .await
            .map_err(|e| format!("failed to read input: {e}"))?
        else {
            break;
        };

        match parse_command(&line) {
            Ok(ReplCommand::Search(query)) => {
                search(run, surface, controller, &query).await;
            }
            Ok(ReplCommand::Export) => {
                export(controller).await;
            }
            Ok(ReplCommand::New) => controller.new_search(),
            Ok(ReplCommand::Max(raw)) => {
                let max = parse_max_results(&raw, run.max_results);
                surface.max_results_input.set_value(&max.to_string());
                format_kv_line("Max", &max.to_string());
            }
            Ok(ReplCommand::Health) => {
                if let Some(payload) = controller.check_health().await {
                    format_kv_line("Health", &payload.to_string());
                }
            }
            Ok(ReplCommand::Help) => println!("{REPL_HELP}"),
            Ok(ReplCommand::Quit) => break,
            Ok(ReplCommand::Empty) => {}
            Err(e) => {
                controller.notifier().warning(e);
            }
        }
    }
    Ok(())
}

async fn run_async(run: RunConfig) -> Result<(), String> {
    if run.no_color {
        colored::control::set_override(false);
    }
    print_banner();
    format_kv_line("Server", &run.client.server);
    format_kv_line("Max", &run.max_results.to_string());
    format_kv_line("Timeout", &format!("{}s", run.client.timeout_seconds));
    format_kv_line("Output", &run.output_dir.display().to_string());
    if let Some(proxy) = run.client.proxy.as_deref() {
        format_kv_line("Proxy", proxy);
    }
    if let Some(report) = run.report.as_ref() {
        format_kv_line("Report", &report.display().to_string());
    }
    println!();

    let client = HttpApiClient::new(&run.client).map_err(|e| e.to_string())?;
    let downloader = Arc::new(client.downloader(run.output_dir.clone()));
    let hide_progress = !std::io::stderr().is_terminal();
    let surface = TerminalSurface::new(hide_progress, run.max_results)?;
    let controller = SearchController::new(
        Arc::new(client),
        surface.page(downloader),
        ControllerOptions {
            default_max_results: run.max_results,
            notification_ttl: run.notification_ttl,
            ..Default::default()
        },
    );
    log::debug!("verbosity {}", run.verbose);

    controller.initialize().await;

    if run.interactive {
        return run_interactive(&run, &surface, &controller).await;
    }

    let Some(query) = run.query.as_deref() else {
        return Ok(());
    };
    match search(&run, &surface, &controller, query).await {
        SearchOutcome::Completed { .. } => {}
        SearchOutcome::Failed { message } => return Err(format!("search failed: {message}")),
        SearchOutcome::Rejected => return Err("please enter a search term".to_string()),
        SearchOutcome::Busy => return Err("a search is already running".to_string()),
    }
    if run.export {
        if let ExportOutcome::Failed { message } = export(&controller).await {
            return Err(format!("export failed: {message}"));
        }
    }
    Ok(())
}

pub fn run_cli() -> Result<(), String> {
    let args = match CliArgs::try_parse() {
        Ok(args) => args,
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp => {
                print!("{}", render_custom_help());
                return Ok(());
            }
            ErrorKind::DisplayVersion => {
                let cmd = CliArgs::command();
                print!("{}", cmd.render_version());
                return Ok(());
            }
            _ => return Err(e.to_string()),
        },
    };

    init_logging(args.verbose);

    let user_config_path = args.config.clone().map(|p| config::expand_tilde(&p));

    if args.init_config {
        let path = user_config_path
            .or_else(config::default_config_path)
            .ok_or_else(|| "could not determine a config location, pass --config".to_string())?;
        if config::ensure_default_config_file(&path)? {
            println!("wrote default config to {}", path.display());
        } else {
            println!("config already exists at {}", path.display());
        }
        return Ok(());
    }

    let cfg = match user_config_path.as_ref() {
        Some(path) => config::load_config(path, false)?,
        None => match config::default_config_path() {
            Some(path) => config::load_config(&path, true)?,
            None => ConfigFile::default(),
        },
    };

    let run = build_run_config(args, cfg)?;

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| format!("failed to build runtime: {e}"))?;

    rt.block_on(run_async(run))?;
    Ok(())
}
