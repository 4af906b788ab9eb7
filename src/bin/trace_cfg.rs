//! Trace builder driver.
//!
//! Reads a CFG in the textual format (from a file or stdin), partitions it
//! into traces and prints the listing. Errors go to stderr with a non-zero
//! exit status.

use bumpalo::Bump;
use clap::Parser;
use std::error::Error;
use std::fmt::Write as _;
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use tpde_trace::{compute_traces, CfgAdaptor, ControlFlowGraph, TraceBuilderConfig, TraceSession};

#[derive(Parser, Debug)]
#[command(name = "trace-cfg", about = "Partition a control-flow graph into traces")]
struct Args {
    /// CFG file to read; stdin when omitted.
    input: Option<PathBuf>,

    /// Start at this block instead of the graph's entry.
    #[arg(long)]
    entry: Option<String>,

    /// Always run the partition verifier.
    #[arg(long, conflicts_with = "no_verify")]
    verify: bool,

    /// Never run the partition verifier.
    #[arg(long)]
    no_verify: bool,

    /// Skip input validation.
    #[arg(long)]
    no_validate: bool,

    /// Print the parsed CFG before the traces.
    #[arg(long)]
    print_cfg: bool,

    /// Print the block order produced by concatenating the traces.
    #[arg(long)]
    print_order: bool,

    /// Print session statistics.
    #[arg(long)]
    stats: bool,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Args {
    /// Pass configuration selected by the flags; the build profile decides
    /// verification unless `--verify` or `--no-verify` is given.
    fn builder_config(&self) -> TraceBuilderConfig {
        let config = TraceBuilderConfig::default();
        let config = config.with_validate_input(!self.no_validate);
        match (self.verify, self.no_verify) {
            (true, _) => config.with_verify(true),
            (_, true) => config.with_verify(false),
            _ => config,
        }
    }

    fn log_level(&self) -> log::LevelFilter {
        match self.verbose {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Debug,
            _ => log::LevelFilter::Trace,
        }
    }
}

/// Parse `text`, build its traces and render everything the flags ask for.
fn run(args: &Args, text: &str) -> Result<String, Box<dyn Error>> {
    let mut cfg = ControlFlowGraph::parse(text)?;
    if let Some(name) = &args.entry {
        let entry = cfg
            .find_block(name)
            .ok_or_else(|| format!("unknown entry block '{name}'"))?;
        cfg.set_entry(entry);
    }

    let mut out = String::new();
    if args.print_cfg {
        writeln!(out, "{cfg}")?;
    }

    let arena = Bump::new();
    let session = TraceSession::new(&arena);
    if let Some(path) = &args.input {
        session.set_current_unit(&path.display().to_string());
    }

    let result = compute_traces(&cfg, &session, args.builder_config())?;
    log::info!(
        "{} blocks in {} traces",
        cfg.block_count(),
        result.trace_count()
    );
    write!(out, "{}", result.listing(&cfg))?;

    if args.print_order {
        writeln!(out)?;
        for (idx, block) in result.linear_order().enumerate() {
            writeln!(out, "{idx:5}: {}", cfg.block_name(block))?;
        }
    }

    if args.stats {
        writeln!(out)?;
        write!(out, "{}", session.stats())?;
    }

    Ok(out)
}

fn read_input(args: &Args) -> io::Result<String> {
    match &args.input {
        Some(path) => fs::read_to_string(path),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    env_logger::Builder::from_default_env()
        .filter_level(args.log_level())
        .init();

    let output = read_input(&args)
        .map_err(Box::<dyn Error>::from)
        .and_then(|text| run(&args, &text));
    match output {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIAMOND: &str = "entry: ^then ^else\nthen 0.9: ^join\nelse 0.1: ^join\njoin:\n";

    fn args(argv: &[&str]) -> Args {
        let argv = std::iter::once("trace-cfg").chain(argv.iter().copied());
        Args::try_parse_from(argv).unwrap()
    }

    #[test]
    fn test_verify_flags() {
        let profile_default = TraceBuilderConfig::default().verify;
        assert_eq!(args(&[]).builder_config().verify, profile_default);
        assert!(args(&["--verify"]).builder_config().verify);
        assert!(!args(&["--no-verify"]).builder_config().verify);
        let conflicting = Args::try_parse_from(["trace-cfg", "--verify", "--no-verify"]);
        assert!(conflicting.is_err());
    }

    #[test]
    fn test_no_validate_flag() {
        assert!(args(&[]).builder_config().validate_input);
        assert!(!args(&["--no-validate"]).builder_config().validate_input);
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(args(&[]).log_level(), log::LevelFilter::Warn);
        assert_eq!(args(&["-v"]).log_level(), log::LevelFilter::Debug);
        assert_eq!(args(&["-vvv"]).log_level(), log::LevelFilter::Trace);
    }

    #[test]
    fn test_print_cfg_and_order() {
        let flags = args(&["--print-cfg", "--print-order"]);
        let out = run(&flags, DIAMOND).unwrap();
        let expected = "entry 1: ^then ^else\n\
                        then 0.9: ^join\n\
                        else 0.1: ^join\n\
                        join 1:\n\
                        \n\
                        Trace     0: [entry, then, join] {incoming, side}\n\
                        Trace     1: [else] {incoming}\n\
                        \n    \
                        0: entry\n    \
                        1: then\n    \
                        2: join\n    \
                        3: else\n";
        assert_eq!(out, expected);
    }

    #[test]
    fn test_stats_flag() {
        let out = run(&args(&["--stats"]), DIAMOND).unwrap();
        assert!(out.contains("Trace Builder Statistics:"));
        assert!(out.contains("Passes run: 1"));
        assert!(out.contains("Traces built: 2"));
        assert!(!args(&[]).stats);
    }

    #[test]
    fn test_entry_flag() {
        let flags = args(&["--entry", "else"]);
        let err = run(&flags, DIAMOND).unwrap_err().to_string();
        assert!(err.contains("unreachable from the entry"), "{err}");

        let flags = args(&["--entry", "nowhere"]);
        let err = run(&flags, DIAMOND).unwrap_err();
        assert_eq!(err.to_string(), "unknown entry block 'nowhere'");
    }
}
