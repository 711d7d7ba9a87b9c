use clap::{ArgAction, Parser};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "bizsearch",
    version,
    about = "company search client for the scraper backend",
    long_about = "bizsearch drives a company-search scraper backend: it submits searches, renders the stats and results table, and exports the results to CSV.\n\nExamples:\n  bizsearch -q \"bakeries in Lisbon\"\n  bizsearch -q \"dentists in Porto\" -m 100 --export -d ./exports\n  bizsearch -q \"cafes\" -o ./report.html\n  bizsearch -i --server http://10.0.0.5:5000\n\nTip: Use --init-config to write ~/.bizsearch/config.yml and keep CLI invocations short."
)]
pub struct CliArgs {
    #[arg(
        short = 'v',
        long = "vb",
        visible_alias = "verbose",
        action = ArgAction::Count,
        help_heading = "Output",
        help = "Increase log verbosity (-v, -vv)."
    )]
    pub verbose: u8,

    #[arg(
        short = 'n',
        long = "nc",
        visible_alias = "no-color",
        help_heading = "Output",
        help = "Disable colored output."
    )]
    pub no_color: bool,

    #[arg(
        short = 'o',
        long = "rpt",
        visible_alias = "report",
        value_name = "FILE",
        help_heading = "Output",
        help = "Write the rendered stats and results to a report file (.html, .json or .txt)."
    )]
    pub report: Option<String>,

    #[arg(
        short = 'q',
        long = "q",
        visible_alias = "query",
        value_name = "TEXT",
        help_heading = "Search",
        help = "Search term, e.g. \"bakeries in Lisbon\"."
    )]
    pub query: Option<String>,

    #[arg(
        short = 'm',
        long = "mr",
        visible_alias = "max-results",
        value_name = "N",
        help_heading = "Search",
        help = "Maximum number of companies to collect (1-200)."
    )]
    pub max_results: Option<u32>,

    #[arg(
        short = 'i',
        long = "it",
        visible_alias = "interactive",
        help_heading = "Search",
        help = "Interactive prompt: type a search, or /export, /new, /max N, /health, /quit."
    )]
    pub interactive: bool,

    #[arg(
        short = 'e',
        long = "exp",
        visible_alias = "export",
        help_heading = "Export",
        help = "Export the results to CSV after the search."
    )]
    pub export: bool,

    #[arg(
        short = 'd',
        long = "od",
        visible_alias = "output-dir",
        value_name = "DIR",
        help_heading = "Export",
        help = "Directory where exported CSV files are saved."
    )]
    pub output_dir: Option<String>,

    #[arg(
        short = 's',
        long = "srv",
        visible_alias = "server",
        value_name = "URL",
        help_heading = "HTTP",
        help = "Backend base URL (defaults to http://127.0.0.1:5000)."
    )]
    pub server: Option<String>,

    #[arg(
        short = 'T',
        long = "to",
        visible_alias = "timeout",
        value_name = "SECONDS",
        help_heading = "HTTP",
        help = "Per-request timeout in seconds."
    )]
    pub timeout: Option<u64>,

    #[arg(
        short = 'p',
        long = "px",
        visible_alias = "proxy",
        value_name = "URL",
        help_heading = "HTTP",
        help = "HTTP proxy URL (e.g. http://127.0.0.1:8080)."
    )]
    pub proxy: Option<String>,

    #[arg(
        short = 'C',
        long = "cfg",
        visible_alias = "config",
        value_name = "FILE",
        help_heading = "Config",
        help = "Path to config file (defaults to ~/.bizsearch/config.yml)."
    )]
    pub config: Option<String>,

    #[arg(
        long = "ic",
        visible_alias = "init-config",
        help_heading = "Config",
        help = "Write a default config file (at --config or the default location) and exit."
    )]
    pub init_config: bool,
}
