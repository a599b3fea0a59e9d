mod config;

use std::path::{Path, PathBuf};
use std::process;

use apex_core::{tokenize, LexerOptions, ParseResult, SymbolTable};
use apex_lsp::{LanguageManager, ManagerConfig};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::config::ApexConfig;

/// Environment variable holding the log filter, e.g. `APEX_LOG=debug`.
const LOG_ENV: &str = "APEX_LOG";

/// Output format for CLI responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(crate) enum OutputFormat {
    Text,
    Json,
}

/// Apex language front end.
#[derive(Parser)]
#[command(name = "apex", version, about = "Apex language front end")]
struct Cli {
    /// Output format (text or json)
    #[arg(long, global = true, default_value = "text", value_enum)]
    output: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, global = true)]
    quiet: bool,

    /// Path to apex.toml (default: ./apex.toml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Folder mirroring parsed symbol tables; overrides [symbols] folder
    #[arg(long, global = true)]
    symbols_folder: Option<PathBuf>,

    /// Do not load the bundled platform types
    #[arg(long, global = true)]
    no_builtins: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse an Apex file and report diagnostics and symbols
    Parse {
        /// Path to the Apex source file
        file: PathBuf,
    },

    /// Print the token stream of an Apex file
    Tokens {
        /// Path to the Apex source file
        file: PathBuf,
        /// Include whitespace and comments
        #[arg(long)]
        trivia: bool,
    },

    /// Look up a type in the symbol cache (builtins and symbols folder)
    Symbols {
        /// Type name, e.g. `String` or `Outer.Inner`
        name: String,
    },

    /// Start the Language Server Protocol server over stdio
    Lsp,
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let manager_config = match ApexConfig::load(cli.config.as_deref()) {
        Ok(config) => config.manager_config(cli.symbols_folder, cli.no_builtins),
        Err(e) => {
            report_error(&e.to_string(), cli.output, cli.quiet);
            process::exit(1);
        }
    };
    debug!(
        folder = ?manager_config.symbols_folder,
        builtins = manager_config.load_builtins,
        "configuration loaded"
    );

    match cli.command {
        Commands::Parse { file } => {
            cmd_parse(&file, &manager_config, cli.output, cli.quiet);
        }
        Commands::Tokens { file, trivia } => {
            cmd_tokens(&file, trivia, cli.output, cli.quiet);
        }
        Commands::Symbols { name } => {
            cmd_symbols(&name, &manager_config, cli.output, cli.quiet);
        }
        Commands::Lsp => {
            if let Err(e) = apex_lsp::run(&manager_config) {
                eprintln!("LSP server error: {}", e);
                process::exit(1);
            }
        }
    }
}

/// Logs go to stderr so stdout stays clean for command output and the LSP
/// transport.
fn init_tracing() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn read_source(file: &Path, output: OutputFormat, quiet: bool) -> String {
    match std::fs::read_to_string(file) {
        Ok(s) => s,
        Err(e) => {
            let msg = format!("error reading file '{}': {}", file.display(), e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn open_manager(config: &ManagerConfig, output: OutputFormat, quiet: bool) -> LanguageManager {
    match LanguageManager::new(config) {
        Ok(manager) => manager,
        Err(e) => {
            let msg = format!("error opening symbol store: {}", e);
            report_error(&msg, output, quiet);
            process::exit(1);
        }
    }
}

fn cmd_parse(file: &Path, config: &ManagerConfig, output: OutputFormat, quiet: bool) {
    let source = read_source(file, output, quiet);
    let manager = open_manager(config, output, quiet);
    let result = manager.parse_document(&source);

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&result)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for d in &result.diagnostics {
                eprintln!(
                    "{}:{}:{}: {}: {}",
                    file.display(),
                    d.span.start_line,
                    d.span.start_column,
                    d.kind,
                    d.message
                );
            }
            if !quiet {
                print_parse_summary(&result);
            }
        }
    }

    if result.has_errors() {
        process::exit(1);
    }
}

fn print_parse_summary(result: &ParseResult) {
    match &result.symbol_table {
        Some(table) => {
            print_table(table, 0);
            println!("{} type reference(s)", result.type_references.len());
        }
        None => println!("no symbol table"),
    }
}

fn print_table(table: &SymbolTable, depth: usize) {
    let indent = "  ".repeat(depth);
    let mut header = format!(
        "{indent}{} {} {}",
        lower_debug(&table.visibility),
        lower_debug(&table.kind),
        table.name
    );
    if let Some(base) = &table.base_class {
        header.push_str(&format!(" extends {base}"));
    }
    if !table.interfaces.is_empty() {
        header.push_str(&format!(" implements {}", table.interfaces.join(", ")));
    }
    println!("{header}");

    for f in &table.fields {
        println!("{indent}  field {}: {}", f.name, f.type_name);
    }
    for p in &table.properties {
        println!("{indent}  property {}: {}", p.name, p.type_name);
    }
    for c in &table.constructors {
        let params: Vec<&str> = c.parameters.iter().map(|p| p.type_name.as_str()).collect();
        println!("{indent}  constructor {}({})", c.name, params.join(", "));
    }
    for m in &table.methods {
        println!("{indent}  method {}", m.signature());
    }
    for inner in &table.inner_classes {
        print_table(inner, depth + 1);
    }
}

fn lower_debug(value: &impl std::fmt::Debug) -> String {
    format!("{:?}", value).to_lowercase()
}

fn cmd_tokens(file: &Path, trivia: bool, output: OutputFormat, quiet: bool) {
    let source = read_source(file, output, quiet);
    let options = if trivia {
        LexerOptions::with_trivia()
    } else {
        LexerOptions::default()
    };
    let (tokens, diagnostics) = tokenize(&source, options);

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&serde_json::json!({
                "tokens": tokens,
                "diagnostics": diagnostics,
            }))
            .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => {
            for t in &tokens {
                println!(
                    "{}:{}\t{:?}\t{:?}",
                    t.span.start_line,
                    t.span.start_column,
                    t.kind,
                    t.lexeme()
                );
            }
            for d in &diagnostics {
                eprintln!(
                    "{}:{}:{}: {}: {}",
                    file.display(),
                    d.span.start_line,
                    d.span.start_column,
                    d.kind,
                    d.message
                );
            }
        }
    }

    if !diagnostics.is_empty() {
        process::exit(1);
    }
}

fn cmd_symbols(name: &str, config: &ManagerConfig, output: OutputFormat, quiet: bool) {
    let manager = open_manager(config, output, quiet);
    let Some(table) = manager.lookup(name) else {
        report_error(&format!("type '{}' not found", name), output, quiet);
        process::exit(1);
    };

    match output {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&table)
                .unwrap_or_else(|e| format!("{{\"error\": \"serialization: {}\"}}", e));
            println!("{}", json);
        }
        OutputFormat::Text => print_table(&table, 0),
    }
}

pub(crate) fn report_error(msg: &str, output: OutputFormat, quiet: bool) {
    if quiet {
        return;
    }
    match output {
        OutputFormat::Text => eprintln!("{}", msg),
        OutputFormat::Json => {
            eprintln!("{{\"error\": \"{}\"}}", msg.replace('"', "\\\""));
        }
    }
}
