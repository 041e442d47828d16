use crate::cli::actions::{
    verify::{Args, Output},
    Action,
};
use crate::otp::FlowConfig;
use anyhow::{Context, Result};

/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let ttl = matches
        .get_one::<u32>("ttl")
        .copied()
        .context("missing required argument: --ttl")?;

    let output = match matches.get_one::<String>("output").map(String::as_str) {
        Some("json") => Output::Json,
        _ => Output::Text,
    };

    Ok(Action::Verify(Args {
        config: FlowConfig::new().with_ttl_seconds(ttl),
        email: matches.get_one::<String>("email").cloned(),
        reveal_code: matches.get_flag("reveal-code"),
        output,
    }))
}
