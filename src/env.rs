//! Resolves the GitHub token from the environment, falling back to a prompt.

#![cfg(feature = "env")]

use std::io::{self, BufRead as _, Write as _};

use tracing::{debug, info};

use crate::{
    client::Token,
    error::{Error, Result},
};

/// The environment variable holding the GitHub token.
pub const GITHUB_TOKEN: &str = "GITHUB_TOKEN";

/// Resolves the GitHub token in two stages: `lookup` is asked for [`GITHUB_TOKEN`] first, and
/// `prompt` is only invoked if that yields nothing or an empty value.
///
/// The token is never written anywhere.
///
/// # Errors
///
/// Returns [`Error::Credential`] if the prompt fails, or [`Error::MissingCredential`] if it
/// yields an empty value.
pub fn resolve_token<L, P>(lookup: L, prompt: P) -> Result<Token>
where
    L: FnOnce(&str) -> Option<String>,
    P: FnOnce() -> io::Result<String>,
{
    if let Some(token) = lookup(GITHUB_TOKEN).filter(|token| !token.trim().is_empty()) {
        debug!("using GitHub token from {GITHUB_TOKEN}");
        return Ok(Token::new(token.trim()));
    }

    info!("{GITHUB_TOKEN} not set, prompting for a token…");
    let token = prompt().map_err(Error::Credential)?;
    match token.trim() {
        "" => Err(Error::MissingCredential),
        token => Ok(Token::new(token)),
    }
}

/// Resolves the GitHub token from the process environment, prompting on the terminal otherwise.
///
/// # Errors
///
/// See: [`resolve_token`]
pub fn token_from_env_or_prompt() -> Result<Token> {
    resolve_token(|key| std::env::var(key).ok(), prompt_stdin)
}

/// Asks for a token on stderr and reads one line from stdin.
///
/// # Errors
///
/// Returns an [`io::Error`] if the terminal can't be written to or read from.
pub fn prompt_stdin() -> io::Result<String> {
    let mut stderr = io::stderr().lock();
    writeln!(
        stderr,
        "GitHub personal access token not found in {GITHUB_TOKEN}."
    )?;
    writeln!(
        stderr,
        "Set {GITHUB_TOKEN} in your environment to skip this step in the future."
    )?;
    write!(stderr, "*** THIS WILL NOT BE SAVED *** Enter your GitHub token: ")?;
    stderr.flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line)
}
