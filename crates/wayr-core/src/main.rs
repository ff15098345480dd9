//! wayr - Why Are You Running?
//!
//! Explains why a process exists: who started it, what supervises it, and
//! what it is doing. Look a process up by name, `--pid`, or `--port`.

use clap::{ArgGroup, CommandFactory, Parser};
use std::io::{self, IsTerminal, Write};
use std::path::PathBuf;
use tracing::debug;
use wayr_common::{format_error_human, Error, MatchKind, OutputMode, ProcessId, Result};
use wayr_core::collect::{
    fetch_link_table, select_source, Backend, BackendChoice, LinkTable, Platform, ProcessInfo,
    SystemRunner,
};
use wayr_core::config::{load_config, ConfigOptions, WayrConfig};
use wayr_core::context::describe;
use wayr_core::exit_codes::ExitCode;
use wayr_core::logging::{init_logging, LogConfig, LogFormat, LogLevel, DESCRIBE_TARGET};
use wayr_core::output::{
    write_json, write_match_list, write_platform_notice, write_report, write_short, write_tree,
    write_warnings, Palette, ReportOptions,
};
use wayr_core::provenance::{
    build_tree, find_by_name, find_by_pid, find_by_port, investigate, narrow_candidates,
    ProcessArena, Probe,
};

/// wayr - Why Are You Running? Explains why processes exist.
#[derive(Parser, Debug)]
#[command(name = "wayr")]
#[command(author, version, about, long_about = None)]
#[command(disable_version_flag = true)]
#[command(group(ArgGroup::new("target").args(["name", "pid", "port"])))]
struct Cli {
    /// Process or service name to look up
    name: Option<String>,

    /// PID to look up
    #[arg(short, long)]
    pid: Option<u32>,

    /// Port to look up
    #[arg(short = 'o', long)]
    port: Option<u16>,

    /// Use exact name matching
    #[arg(long)]
    exact: bool,

    /// Show only ancestry
    #[arg(short, long)]
    short: bool,

    /// Show process tree
    #[arg(short, long)]
    tree: bool,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Show extended information
    #[arg(long)]
    verbose: bool,

    /// Show environment variables
    #[arg(long)]
    env: bool,

    /// Show only warnings
    #[arg(long)]
    warnings: bool,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Log each man page lookup step
    #[arg(long)]
    debug_man: bool,

    /// Snapshot backend
    #[arg(long, value_enum)]
    backend: Option<BackendChoice>,

    /// Config directory (default: $WAYR_CONFIG_DIR, then ~/.config/wayr)
    #[arg(long, value_name = "DIR")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long, value_name = "LEVEL")]
    log_level: Option<LogLevel>,

    /// Log format (human, jsonl)
    #[arg(long, value_name = "FORMAT")]
    log_format: Option<LogFormat>,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Print version
    #[arg(short = 'v', long, action = clap::ArgAction::Version)]
    version: Option<bool>,
}

/// What the user asked about.
enum Target {
    Pid(u32),
    Port(u16),
    Name(String),
}

impl Cli {
    fn target(&self) -> Result<Target> {
        if let Some(pid) = self.pid {
            Ok(Target::Pid(pid))
        } else if let Some(port) = self.port {
            Ok(Target::Port(port))
        } else if let Some(name) = &self.name {
            Ok(Target::Name(name.clone()))
        } else {
            Err(Error::NoTarget)
        }
    }

    fn mode(&self) -> OutputMode {
        OutputMode::from_flags(self.warnings, self.json, self.short, self.tree)
    }

    /// Several matches are rendered only in the compact modes; otherwise
    /// they are listed for the user to pick from.
    fn renders_every_match(&self) -> bool {
        self.short || self.tree
    }

    fn log_config(&self) -> LogConfig {
        let mut config = LogConfig::from_env(self.log_level, self.log_format);
        if self.quiet {
            config = config.with_level(LogLevel::Error);
        }
        if self.debug_man {
            config.with_directive(format!("{DESCRIBE_TARGET}=debug"))
        } else {
            config
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_logging(&cli.log_config());

    let exit_code = match run(&cli) {
        Ok(code) => code,
        Err(Error::NoTarget) => {
            eprintln!("{}", Cli::command().render_help());
            ExitCode::ArgsError
        }
        Err(err) => {
            debug!(error_code = err.code(), "run failed");
            let use_color = !cli.no_color && io::stderr().is_terminal();
            eprintln!("{}", format_error_human(&err, use_color));
            ExitCode::from(&err)
        }
    };

    debug!(exit_code = %exit_code, "done");
    std::process::exit(exit_code.as_i32());
}

fn effective_config(cli: &Cli) -> Result<WayrConfig> {
    let resolved = load_config(&ConfigOptions {
        config_dir: cli.config.clone(),
    })?;
    let mut config = resolved.config;

    if let Some(backend) = cli.backend {
        config.backend = backend;
    }
    if cli.no_color {
        config.color = wayr_common::ColorChoice::Never;
    }
    Ok(config)
}

fn run(cli: &Cli) -> Result<ExitCode> {
    let target = cli.target()?;
    let config = effective_config(cli)?;
    let mode = cli.mode();
    let palette = Palette::new(config.color.resolve(io::stdout().is_terminal()));

    let runner = SystemRunner::new();
    let platform = Platform::detect();
    if platform == Platform::Other {
        let stderr_palette = Palette::new(config.color.resolve(io::stderr().is_terminal()));
        write_platform_notice(&mut io::stderr(), std::env::consts::OS, &stderr_palette)?;
    }
    let source = select_source(
        platform,
        config.backend,
        Some(config.proc_root.clone()),
        &runner,
    );
    let probe = Probe::new(&runner, source.as_ref(), platform);

    let links = if matches!(target, Target::Name(_)) || mode == OutputMode::Tree {
        fetch_link_table(&runner, platform)
    } else {
        LinkTable::new()
    };

    let matches: Vec<ProcessInfo> = match target {
        Target::Pid(pid) => vec![find_by_pid(ProcessId(pid), source.as_ref())?],
        Target::Port(port) => find_by_port(port, &runner, source.as_ref())?,
        Target::Name(name) => {
            let narrowed;
            let candidates = if source.backend() == Backend::Ps {
                narrowed = narrow_candidates(&name, &links, &runner, platform);
                &narrowed
            } else {
                &links
            };
            find_by_name(
                &name,
                MatchKind::from_exact(cli.exact),
                candidates,
                source.as_ref(),
                ProcessId(std::process::id()),
            )?
        }
    };
    debug!(matches = matches.len(), %mode, "lookup finished");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if matches.len() > 1 && !cli.renders_every_match() {
        write_match_list(&mut out, &matches, &palette)?;
        return Ok(ExitCode::Clean);
    }

    let mut arena = ProcessArena::new();
    for (i, info) in matches.into_iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        let pid = investigate(&mut arena, info, &probe);

        match mode {
            OutputMode::Warnings => write_warnings(&mut out, &arena, pid, &palette)?,
            OutputMode::Json => write_json(&mut out, &arena, pid)?,
            OutputMode::Short => write_short(&mut out, &arena, pid)?,
            OutputMode::Tree => {
                let root = arena
                    .get(pid)
                    .and_then(|info| info.ancestry.first().copied())
                    .unwrap_or(pid);
                build_tree(&mut arena, source.as_ref(), &links, root);
                write_tree(&mut out, &arena, root, &palette)?;
            }
            OutputMode::Report => {
                let description = if config.describe {
                    arena.get(pid).and_then(|info| describe(&info.cmd, &runner))
                } else {
                    None
                };
                let options = ReportOptions {
                    description,
                    verbose: cli.verbose,
                    show_env: cli.env,
                    show_warnings: true,
                };
                write_report(&mut out, &arena, pid, &palette, &options)?;
            }
        }
    }

    out.flush()?;
    Ok(ExitCode::Clean)
}
