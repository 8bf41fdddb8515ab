//! The `command:memcached` console command

use crate::ui::Console;
use clap::Args;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use mcadmin_common::{AdminError, CacheAdmin, CommandConfig, Outcome};
use std::io::{self, Write};
use std::process::ExitCode;
use std::time::Instant;
use tracing::debug;

/// Arguments for `command:memcached`
#[derive(Args, Debug, Default)]
pub struct MemcachedArgs {
    /// Flush the memcached memory
    #[arg(short, long)]
    pub flush: bool,

    /// Include max size, items, connections, gets and sets
    #[arg(short, long)]
    pub verbose: bool,

    /// Clear the console before running
    #[arg(long)]
    pub clear: bool,
}

/// Run the command and map the outcome to a process exit code
pub fn execute(admin: &CacheAdmin, args: &MemcachedArgs, config: &CommandConfig) -> ExitCode {
    if args.clear || config.clearable {
        if let Err(e) = clear_console() {
            debug!("Failed to clear the console: {}", e);
        }
    }

    let stdout = io::stdout();
    let stderr = io::stderr();
    let out = Output {
        console: Console::detect(&stdout),
        writer: stdout.lock(),
    };
    let err = Output {
        console: Console::detect(&stderr),
        writer: stderr.lock(),
    };
    if run(admin, args, out, err) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

/// A writer and the console settings matching it
struct Output<W> {
    console: Console,
    writer: W,
}

/// Run the command against the given writers; `false` when it failed
fn run<O: Write, E: Write>(
    admin: &CacheAdmin,
    args: &MemcachedArgs,
    mut out: Output<O>,
    mut err: Output<E>,
) -> bool {
    let started = Instant::now();

    let result = if args.flush {
        flush(admin, &out.console, &mut out.writer)
    } else {
        stats(admin, args.verbose, &out.console, &mut out.writer)
    };

    let message = match result {
        Ok(()) => None,
        Err(CommandError::Admin(e)) => Some(e.to_string()),
        Err(CommandError::Io(e)) => Some(format!("cannot write output, {}", e)),
    };

    if let Some(message) = &message {
        if let Err(e) = writeln!(err.writer, "{}", err.console.error_line(message)) {
            debug!("Failed to write the error line: {}", e);
        }
    }

    if let Err(e) = writeln!(out.writer, "\n{}", out.console.footer(started.elapsed())) {
        debug!("Failed to write the footer: {}", e);
    }

    message.is_none()
}

#[derive(Debug)]
enum CommandError {
    Admin(AdminError),
    Io(io::Error),
}

impl From<AdminError> for CommandError {
    fn from(err: AdminError) -> Self {
        CommandError::Admin(err)
    }
}

impl From<io::Error> for CommandError {
    fn from(err: io::Error) -> Self {
        CommandError::Io(err)
    }
}

fn flush<W: Write>(admin: &CacheAdmin, console: &Console, out: &mut W) -> Result<(), CommandError> {
    writeln!(out, "{}", console.section("Flush the cache"))?;
    admin.flush().and_then(Outcome::into_result)?;
    writeln!(out, "{}", console.success_banner("Flush operation succeeded"))?;
    Ok(())
}

fn stats<W: Write>(
    admin: &CacheAdmin,
    verbose: bool,
    console: &Console,
    out: &mut W,
) -> Result<(), CommandError> {
    let report = admin.stats(verbose)?;
    for server in &report {
        writeln!(out, "{}", console.section(&server.name))?;
        write!(out, "{}", console.render_table(server))?;
    }
    Ok(())
}

fn clear_console() -> io::Result<()> {
    execute!(io::stdout(), Clear(ClearType::All), MoveTo(0, 0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mcadmin_common::testing::StaticClient;
    use mcadmin_common::{ClientError, ResultCode};
    use std::sync::Arc;

    fn admin(client: StaticClient) -> CacheAdmin {
        CacheAdmin::new(Arc::new(client))
    }

    const PLAIN: Console = Console::new(false);

    fn output(buffer: Vec<u8>) -> String {
        String::from_utf8(buffer).unwrap()
    }

    fn plain(writer: &mut Vec<u8>) -> Output<&mut Vec<u8>> {
        Output {
            console: PLAIN,
            writer,
        }
    }

    #[test]
    fn test_stats_prints_one_table_per_server() {
        let admin = admin(
            StaticClient::new()
                .with_server("10.0.0.1:11211", &[("bytes", 104_857_600.0), ("limit_max_bytes", 209_715_200.0)])
                .with_server("10.0.0.2:11211", &[]),
        );

        let mut buffer = Vec::new();
        stats(&admin, false, &PLAIN, &mut buffer).unwrap();
        let text = output(buffer);

        let first = text.find("10.0.0.1:11211").unwrap();
        let second = text.find("10.0.0.2:11211").unwrap();
        assert!(first < second);
        assert!(text.contains("100 MB"));
        assert!(text.contains("50 %"));
        assert!(!text.contains("Set operations"));
    }

    #[test]
    fn test_verbose_stats_include_traffic() {
        let admin = admin(StaticClient::new().with_server("a:11211", &[("cmd_set", 42.0)]));

        let mut buffer = Vec::new();
        stats(&admin, true, &PLAIN, &mut buffer).unwrap();
        let text = output(buffer);
        assert!(text.contains("Set operations"));
        assert!(text.contains("42"));
    }

    #[test]
    fn test_flush_success_banner() {
        let mut buffer = Vec::new();
        flush(&admin(StaticClient::new()), &PLAIN, &mut buffer).unwrap();
        assert!(output(buffer).contains("Flush operation succeeded"));
    }

    #[test]
    fn test_flush_failure_carries_client_message() {
        let client = StaticClient::new()
            .failing_flush(ClientError::new(ResultCode::ServerError, "SERVER ERROR"));

        let mut buffer = Vec::new();
        let err = flush(&admin(client), &PLAIN, &mut buffer).unwrap_err();
        match err {
            CommandError::Admin(e) => assert_eq!(e.to_string(), "SERVER ERROR"),
            other => panic!("unexpected error: {:?}", other),
        }
        assert!(!output(buffer).contains("succeeded"));
    }

    #[test]
    fn test_unbound_admin_fails() {
        let mut buffer = Vec::new();
        let err = stats(&CacheAdmin::unbound(), false, &PLAIN, &mut buffer).unwrap_err();
        assert!(matches!(err, CommandError::Admin(AdminError::ClientNotConfigured)));
    }

    #[test]
    fn test_run_success_reports_no_error() {
        let admin = admin(StaticClient::new().with_server("a:11211", &[]));
        let (mut out, mut err) = (Vec::new(), Vec::new());

        assert!(run(&admin, &MemcachedArgs::default(), plain(&mut out), plain(&mut err)));
        assert!(err.is_empty());
        let text = output(out);
        assert!(text.contains("a:11211"));
        assert!(text.contains("Command completed in"));
    }

    #[test]
    fn test_run_failure_prints_single_error_line() {
        let client = StaticClient::new()
            .failing_flush(ClientError::new(ResultCode::ServerError, "SERVER ERROR"));
        let args = MemcachedArgs {
            flush: true,
            ..Default::default()
        };
        let (mut out, mut err) = (Vec::new(), Vec::new());

        assert!(!run(&admin(client), &args, plain(&mut out), plain(&mut err)));
        assert_eq!(output(err), "[!] The command failed, SERVER ERROR\n");
        assert!(!output(out).contains("succeeded"));
    }

    #[test]
    fn test_run_unbound_fails() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        assert!(!run(
            &CacheAdmin::unbound(),
            &MemcachedArgs::default(),
            plain(&mut out),
            plain(&mut err),
        ));
        assert_eq!(
            output(err),
            "[!] The command failed, The memcached client is not configured\n"
        );
    }
}
