mod extractor;
mod grouper;
mod html_report;

use std::fs;
use std::io::ErrorKind;

use chrono::Local;
use colored::Colorize;
use flexi_logger::*;
use rustop::opts;

use crate::extractor::Extractor;
use crate::grouper::{GroupStrategy, GroupedReport};

const VERSION: &str = env!("CARGO_PKG_VERSION");

/// What a run ended with; `main` turns this into the console output.
#[derive(Debug)]
enum RunOutcome {
    /// No input path was given.
    Usage,
    /// The input path does not exist.
    NotFound { path: String },
    /// The input exists but could not be read as text.
    ReadError { path: String, message: String },
    /// The report was written.
    Generated { output_path: String },
}

// Log format for the command line
fn log_cmdline_format(
    w: &mut dyn std::io::Write,
    _now: &mut DeferredNow,
    record: &Record,
) -> Result<(), std::io::Error> {
    let level = record.level();
    let msg = record.args().to_string();

    let colored_msg = match level {
        log::Level::Error => format!("[{}] {}", level, msg).red(),
        log::Level::Warn => format!("[{}] {}", level, msg).yellow(),
        log::Level::Info => format!("[{}] {}", level, msg).green(),
        log::Level::Debug => format!("[{}] {}", level, msg).white(),
        log::Level::Trace => format!("[{}] {}", level, msg).white().dimmed(),
    };

    write!(w, "{}", colored_msg)
}

// Welcome message
fn welcome_message() {
    println!("------------------------------------------------------------------------");
    println!("  Crit-Report - Critical Exception Log Triage                           ");
    println!(" ");
    println!("  Version {} (Rust)                                                  ", VERSION);
    println!("------------------------------------------------------------------------");
    println!(" ");
}

fn print_usage() {
    println!("Usage: crit-report <logfile>");
    println!();
    println!("Scans a log file for critical-severity exception entries, groups them");
    println!("and writes a browsable HTML report to {}", html_report::OUTPUT_FILE);
    println!();
    println!("Options:");
    println!("  --group-by <type|root>  - Group by exception type token or root message line");
    println!("  --debug                 - Show debugging information");
    println!("  --trace                 - Show very verbose trace output");
    println!("  --version               - Show version information and exit");
}

/// The pipeline behind the command line: read the input, extract, group and
/// render. Missing or unreadable input is a reported outcome, not an error;
/// only strategy and output-write failures are fatal for the run.
fn run(logfile: Option<String>, group_by: &str, output_path: &str) -> Result<RunOutcome, String> {
    let log_file = match logfile {
        Some(path) => path,
        None => return Ok(RunOutcome::Usage),
    };

    let strategy = GroupStrategy::from_name(group_by)?;

    let log_text = match fs::read_to_string(&log_file) {
        Ok(content) => content,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Ok(RunOutcome::NotFound { path: log_file });
        }
        Err(e) => {
            return Ok(RunOutcome::ReadError {
                path: log_file,
                message: e.to_string(),
            });
        }
    };

    let start_time = Local::now();
    log::info!("Crit-Report run started VERSION: {} FILE: {}", VERSION, log_file);

    // Extract -> group -> render
    let occurrences = Extractor::default().extract(&log_text);
    log::info!("Extraction finished OCCURRENCES: {}", occurrences.len());

    let report = GroupedReport::build(occurrences, &strategy);
    log::info!(
        "Grouping finished GROUPS: {} STRATEGY: {}",
        report.group_count(),
        group_by
    );

    let output_path = html_report::generate_report(&report, &log_file, output_path)?;

    let duration = Local::now().signed_duration_since(start_time);
    log::info!(
        "Report written GROUPS: {} OCCURRENCES: {} DURATION: {}ms",
        report.group_count(),
        report.occurrence_count(),
        duration.num_milliseconds()
    );

    Ok(RunOutcome::Generated { output_path })
}

fn main() {
    // Show welcome message
    welcome_message();

    // Parsing command line flags
    let (args, _rest) = opts! {
        synopsis "Crit-Report critical exception log triage";
        opt group_by:String=String::from("type"), desc:"Grouping strategy: 'type' (exception type token) or 'root' (first message line)";
        opt debug:bool, desc:"Show debugging information";
        opt trace:bool, desc:"Show very verbose trace output";
        opt version:bool, desc:"Show version information and exit";
        param logfile:Option<String>, desc:"Path to the log file to analyze";
    }
    .parse_or_exit();

    // Handle version flag
    if args.version {
        println!("Crit-Report Version {} (Rust)", VERSION);
        std::process::exit(0);
    }

    // Logger
    let mut log_level: String = "info".to_string();
    if args.debug {
        log_level = "debug".to_string();
    }
    if args.trace {
        log_level = "trace".to_string();
    }
    let _logger_handle = Logger::try_with_str(log_level)
        .unwrap()
        .log_to_stdout()
        .format(log_cmdline_format)
        .start()
        .unwrap();

    match run(args.logfile, &args.group_by, html_report::OUTPUT_FILE) {
        Ok(RunOutcome::Usage) => print_usage(),
        Ok(RunOutcome::NotFound { path }) => {
            println!("Error: File '{}' not found.", path);
        }
        Ok(RunOutcome::ReadError { path, message }) => {
            println!("Error: Cannot read file '{}': {}", path, message);
        }
        Ok(RunOutcome::Generated { output_path }) => {
            println!("Grouped HTML report generated: {}", output_path);
        }
        Err(e) => {
            log::error!("{}", e);
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_missing_argument_shows_usage_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("report.html");
        let output_str = output.to_string_lossy().to_string();

        let outcome = run(None, "type", &output_str).unwrap();
        assert!(matches!(outcome, RunOutcome::Usage));
        assert!(!output.exists());
    }

    #[test]
    fn test_nonexistent_input_reports_not_found_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("no-such.log");
        let missing_str = missing.to_string_lossy().to_string();
        let output = dir.path().join("report.html");
        let output_str = output.to_string_lossy().to_string();

        let outcome = run(Some(missing_str.clone()), "type", &output_str).unwrap();
        match outcome {
            RunOutcome::NotFound { path } => assert_eq!(path, missing_str),
            other => panic!("unexpected outcome: {:?}", other),
        }
        assert!(!output.exists());
    }

    #[test]
    fn test_full_run_writes_report() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("app.log");
        fs::write(
            &input,
            "CRIT|app|2024-01-01 10:00:00,000|thread||java.lang.NullPointerException: boom\n at foo.bar(Baz.java:1)\n",
        )
        .unwrap();
        let output = dir.path().join("report.html");
        let output_str = output.to_string_lossy().to_string();

        let outcome = run(
            Some(input.to_string_lossy().to_string()),
            "type",
            &output_str,
        )
        .unwrap();
        match outcome {
            RunOutcome::Generated { output_path } => assert_eq!(output_path, output_str),
            other => panic!("unexpected outcome: {:?}", other),
        }
        let content = fs::read_to_string(&output).unwrap();
        assert!(content.contains("NullPointerException"));
        assert!(content.contains("2024-01-01 10:00:00,000"));
    }

    #[test]
    fn test_unknown_strategy_is_fatal_and_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("app.log");
        fs::write(&input, "CRIT|app|2024-01-01 10:00:00,000|t||boom\n").unwrap();
        let output = dir.path().join("report.html");
        let output_str = output.to_string_lossy().to_string();

        let result = run(
            Some(input.to_string_lossy().to_string()),
            "fancy",
            &output_str,
        );
        assert!(result.is_err());
        assert!(!Path::new(&output_str).exists());
    }
}
