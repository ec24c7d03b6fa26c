//! Interactive session reading one command per line

use super::commands::{self, AppCommand};
use super::ui::{self, StyleType};
use crate::engine::CashbackService;
use anyhow::Result;
use clap::Parser;
use std::io::{BufRead, Write};
use tracing::debug;

#[derive(Parser, Debug)]
#[command(no_binary_name = true, name = "", disable_version_flag = true)]
struct ShellLine {
    #[command(subcommand)]
    command: AppCommand,
}

/// Splits a line on whitespace, keeping double or single quoted runs together.
pub fn split_args(line: &str) -> Result<Vec<String>> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_arg = false;
    let mut quote: Option<char> = None;

    for c in line.chars() {
        match quote {
            Some(q) if c == q => quote = None,
            Some(_) => current.push(c),
            None if c == '"' || c == '\'' => {
                quote = Some(c);
                in_arg = true;
            }
            None if c.is_whitespace() => {
                if in_arg {
                    args.push(std::mem::take(&mut current));
                    in_arg = false;
                }
            }
            None => {
                current.push(c);
                in_arg = true;
            }
        }
    }

    if let Some(q) = quote {
        anyhow::bail!("Unterminated {q} quote");
    }
    if in_arg {
        args.push(current);
    }
    Ok(args)
}

/// Runs commands from `input` until it ends or the user types `quit`.
///
/// A failing command prints its error and the session carries on.
pub async fn run<R: BufRead, W: Write>(
    service: &CashbackService,
    currency: Option<&str>,
    input: R,
    mut out: W,
) -> Result<()> {
    writeln!(
        out,
        "Cashback helper. Type a command, 'help' for the list or 'quit' to leave."
    )?;
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") {
            break;
        }
        if !trimmed.is_empty() {
            let response = handle_line(service, currency, trimmed).await;
            writeln!(out, "{response}")?;
        }
        write!(out, "> ")?;
        out.flush()?;
    }

    writeln!(out, "Until next time!")?;
    Ok(())
}

async fn handle_line(service: &CashbackService, currency: Option<&str>, line: &str) -> String {
    let args = match split_args(line) {
        Ok(args) => args,
        Err(e) => return ui::style_text(&e.to_string(), StyleType::Error),
    };
    debug!(?args, "Shell command");

    // Help and usage errors are rendered by clap itself.
    let command = match ShellLine::try_parse_from(&args) {
        Ok(parsed) => parsed.command,
        Err(e) => return e.render().to_string().trim_end().to_string(),
    };

    match commands::execute(command, service, currency).await {
        Ok(output) => output,
        Err(e) => ui::style_text(&e.to_string(), StyleType::Error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;
    use std::io::Cursor;
    use std::sync::Arc;

    fn service() -> CashbackService {
        CashbackService::new(
            Arc::new(MemoryStore::new()),
            Arc::new(FixedClock::new(NaiveDate::from_ymd_opt(2024, 5, 5).unwrap())),
        )
    }

    async fn session(service: &CashbackService, script: &str) -> String {
        let mut out = Vec::new();
        run(service, None, Cursor::new(script.to_string()), &mut out)
            .await
            .unwrap();
        console::strip_ansi_codes(&String::from_utf8(out).unwrap()).to_string()
    }

    #[test]
    fn test_split_args_keeps_quoted_names() {
        assert_eq!(
            split_args(r#"add card Tinkoff "Tinkoff Credit""#).unwrap(),
            vec!["add", "card", "Tinkoff", "Tinkoff Credit"]
        );
        assert_eq!(
            split_args("  choose   'Home goods'  --value 100 ").unwrap(),
            vec!["choose", "Home goods", "--value", "100"]
        );
        assert_eq!(split_args(r#"add bank """#).unwrap(), vec!["add", "bank", ""]);
        assert!(split_args(r#"add bank "Tinkoff"#).is_err());
    }

    #[tokio::test]
    async fn test_session_runs_commands_until_quit() {
        let service = service();
        let output = session(
            &service,
            "add bank Alpha\nadd card Alpha \"Alpha Credit\"\n\nQUIT\nadd bank Ignored\n",
        )
        .await;

        assert!(output.contains("Added bank Alpha"));
        assert!(output.contains("Added card Alpha Credit for bank Alpha"));
        assert!(output.trim_end().ends_with("Until next time!"));
        assert!(!output.contains("Ignored"));
    }

    #[tokio::test]
    async fn test_session_survives_errors() {
        let service = service();
        let output = session(
            &service,
            "add card Nope Black\nadd cashback past Black Food 5\nfrobnicate\nadd bank Alpha\n",
        )
        .await;

        assert!(output.contains("Unknown bank: Nope"));
        assert!(output.contains("current or future"));
        assert!(output.contains("unrecognized subcommand"));
        assert!(output.contains("Added bank Alpha"));
        assert!(output.contains("Until next time!"));
    }
}
