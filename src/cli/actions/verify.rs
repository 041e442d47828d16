use crate::otp::{
    code::{OneTimeCode, RandomCode},
    delivery::{CodeSender, LogCodeSender},
    display::{DisplaySink, JsonSink, TextSink},
    flow::OtpFlow,
    runner::{FlowEvent, Runner},
    FlowConfig, CODE_LENGTH,
};
use anyhow::{Context, Result};
use std::{
    io::{self, Write},
    sync::Arc,
};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

const HELP: &str = "\
Commands:
  <email>            request a code
  <digits>           type up to 6 digits at the focused slot
  set <slot> [digit] set or clear a slot (0-5)
  del <slot>         backspace on a slot
  submit             verify the entered code
  refresh            start over
  quit               exit";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Output {
    Text,
    Json,
}

#[derive(Debug)]
pub struct Args {
    pub config: FlowConfig,
    pub email: Option<String>,
    pub reveal_code: bool,
    pub output: Output,
}

/// Stands in for the mailbox: prints the message on stderr.
#[derive(Clone, Copy, Debug)]
struct ConsoleCodeSender;

impl CodeSender for ConsoleCodeSender {
    fn send(&self, email: &str, code: &OneTimeCode) -> Result<()> {
        let mut stderr = io::stderr().lock();
        writeln!(stderr, "[mail to {email}] your verification code is {}", code.expose())?;
        Ok(())
    }
}

/// Execute the verify action on stdin/stdout.
/// # Errors
/// Returns an error if stdin cannot be read or the runner task fails.
pub async fn execute(args: Args) -> Result<()> {
    info!(ttl = args.config.ttl_seconds(), output = ?args.output, "starting verification");

    let sender: Arc<dyn CodeSender> = if args.reveal_code {
        Arc::new(ConsoleCodeSender)
    } else {
        Arc::new(LogCodeSender)
    };

    let flow = OtpFlow::new(args.config, Box::new(RandomCode), sender);

    let sink: Box<dyn DisplaySink> = match args.output {
        Output::Text => {
            writeln!(io::stderr(), "{HELP}")?;
            Box::new(TextSink::new(io::stdout()))
        }
        Output::Json => Box::new(JsonSink::new(io::stdout())),
    };

    let flow = drive(flow, sink, args.email, BufReader::new(tokio::io::stdin())).await?;

    debug!(stage = %flow.stage(), "verification finished");

    Ok(())
}

/// Feed input lines to a runner until `quit` or end of input.
///
/// # Errors
/// Returns an error if reading fails or the runner task panics.
pub async fn drive<S, R>(flow: OtpFlow, sink: S, email: Option<String>, input: R) -> Result<OtpFlow>
where
    S: DisplaySink + 'static,
    R: AsyncBufRead + Unpin,
{
    let (runner, tx) = Runner::new(flow, sink);
    let task = tokio::spawn(runner.run());

    if let Some(email) = email {
        tx.send(FlowEvent::Email(email))
            .context("runner stopped early")?;
    }

    let mut lines = input.lines();
    while let Some(line) = lines.next_line().await? {
        let Some(event) = parse_command(&line) else {
            continue;
        };
        let quit = event == FlowEvent::Shutdown;
        tx.send(event).context("runner stopped early")?;
        if quit {
            break;
        }
    }

    drop(tx);

    task.await.context("runner task failed")
}

/// Map one input line to an event. Malformed `del`/`set` commands map to `None`.
///
/// Only all-digit lines are typed into the slots; anything else, a blank line
/// included, is submitted as an email address.
#[must_use]
pub fn parse_command(line: &str) -> Option<FlowEvent> {
    let line = line.trim();
    let mut words = line.split_whitespace();
    let Some(command) = words.next() else {
        return Some(FlowEvent::Email(String::new()));
    };

    match command {
        "quit" | "exit" => Some(FlowEvent::Shutdown),
        "submit" | "verify" => Some(FlowEvent::Submit),
        "refresh" | "reset" => Some(FlowEvent::Reset),
        "del" | "backspace" => {
            let index = words.next()?.parse().ok()?;
            Some(FlowEvent::Backspace { index })
        }
        "set" => {
            let index = words.next()?.parse().ok()?;
            let value = words.next().unwrap_or_default().to_string();
            Some(FlowEvent::Digit { index, value })
        }
        _ if line.chars().count() <= CODE_LENGTH && line.chars().all(|c| c.is_ascii_digit()) => {
            Some(FlowEvent::Type(line.to_string()))
        }
        _ => Some(FlowEvent::Email(line.to_string())),
    }
}
