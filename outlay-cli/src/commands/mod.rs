//! CLI command implementations

pub mod categories;
pub mod expense;
pub mod list;
pub mod summary;
pub mod transfer;
pub mod user;

use std::env;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use dialoguer::Password;
use rust_decimal::Decimal;

use outlay_core::domain::parse_date;
use outlay_core::OutlayContext;

/// Get the outlay directory from environment or default
pub fn get_data_dir() -> Result<PathBuf> {
    if let Ok(dir) = env::var("OUTLAY_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".outlay"))
        .context("Could not find home directory; set OUTLAY_DIR")
}

/// Get or create outlay context
pub fn get_context() -> Result<OutlayContext> {
    let data_dir = get_data_dir()?;

    // Create directory if it doesn't exist
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Failed to create outlay directory: {:?}", data_dir))?;

    OutlayContext::new(&data_dir).context("Failed to initialize outlay context")
}

/// Get or create outlay context, failing unless someone is logged in
pub fn get_user_context() -> Result<OutlayContext> {
    let ctx = get_context()?;
    ctx.require_user()?;
    Ok(ctx)
}

/// Get password from --password flag, OUTLAY_PASSWORD env var, or prompt
pub fn get_password_or_prompt(password_flag: Option<String>, prompt: &str) -> Result<String> {
    if let Some(p) = password_flag {
        return Ok(p);
    }
    if let Ok(p) = env::var("OUTLAY_PASSWORD") {
        return Ok(p);
    }
    let p = Password::new().with_prompt(prompt).interact()?;
    Ok(p)
}

/// Parse a user-entered amount such as `12.50` or `$12.50`
pub fn parse_amount(raw: &str) -> Result<Decimal> {
    let cleaned = raw.trim().trim_start_matches('$').replace(',', "");
    cleaned
        .parse::<Decimal>()
        .map_err(|_| anyhow::anyhow!("Invalid amount: {}", raw))
}

/// Parse a user-entered date, defaulting to today when absent
pub fn parse_date_arg(raw: Option<&str>) -> Result<NaiveDate> {
    match raw {
        Some(d) => parse_date(d).ok_or_else(|| anyhow::anyhow!("Invalid date format. Use YYYY-MM-DD")),
        None => Ok(today()),
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

/// Read all of stdin, failing if it is an interactive terminal
pub fn read_stdin() -> Result<String> {
    if atty::is(atty::Stream::Stdin) {
        anyhow::bail!("No input provided. Pass a file path or pipe data to stdin.");
    }
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_amount_accepts_currency_symbol() {
        assert_eq!(parse_amount("$1,250.75").unwrap(), Decimal::new(125075, 2));
        assert_eq!(parse_amount(" 4.5 ").unwrap(), Decimal::new(45, 1));
        assert!(parse_amount("four").is_err());
    }

    #[test]
    fn test_parse_date_arg() {
        assert_eq!(
            parse_date_arg(Some("2024-01-10")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 10).unwrap()
        );
        assert!(parse_date_arg(Some("10/01/2024")).is_err());
        assert_eq!(parse_date_arg(None).unwrap(), today());
    }
}
