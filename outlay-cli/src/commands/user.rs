//! User commands - register, login, logout, whoami, profile

use anyhow::Result;
use colored::Colorize;
use dialoguer::{Input, Password};

use crate::output;

use super::{get_context, get_password_or_prompt};

pub fn run_register(
    email: Option<String>,
    username: Option<String>,
    password: Option<String>,
    json: bool,
) -> Result<()> {
    let mut ctx = get_context()?;

    let email = match email {
        Some(e) => e,
        None => Input::new().with_prompt("Email").interact_text()?,
    };
    let username = match username {
        Some(u) => u,
        None => Input::new().with_prompt("Username").interact_text()?,
    };
    let password = match password {
        Some(p) => p,
        None => match std::env::var("OUTLAY_PASSWORD") {
            Ok(p) => p,
            Err(_) => Password::new()
                .with_prompt("Password")
                .with_confirmation("Confirm password", "Passwords do not match")
                .interact()?,
        },
    };

    let user = ctx.register(&email, &username, &password)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        output::success(&format!("Registered and logged in as {}", user.username));
    }
    Ok(())
}

pub fn run_login(identifier: Option<String>, password: Option<String>, json: bool) -> Result<()> {
    let mut ctx = get_context()?;

    let identifier = match identifier {
        Some(i) => i,
        None => Input::new().with_prompt("Email or username").interact_text()?,
    };
    let password = get_password_or_prompt(password, "Password")?;

    let user = ctx.login(&identifier, &password)?;
    let count = ctx.store.snapshot().len();

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
    } else {
        output::success(&format!("Logged in as {}", user.username));
        println!("{}", format!("{} expenses on record", count).dimmed());
    }
    Ok(())
}

pub fn run_logout() -> Result<()> {
    let mut ctx = get_context()?;
    ctx.logout()?;
    output::success("Logged out");
    Ok(())
}

pub fn run_whoami(json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.session.current_user()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&user)?);
        return Ok(());
    }

    match user {
        Some(user) => {
            println!("{} ({})", user.username.bold(), user.email);
            if !ctx.store.saves_bound() {
                output::warning("Expenses are kept in memory only and will not be saved");
            }
        }
        None => println!("{}", "Not logged in".dimmed()),
    }
    Ok(())
}

pub fn run_profile(email: Option<String>, username: Option<String>, json: bool) -> Result<()> {
    let ctx = get_context()?;
    let user = ctx.require_user()?;

    if email.is_none() && username.is_none() {
        anyhow::bail!("Nothing to change. Pass --email and/or --username.");
    }

    let updated = ctx.session.update_profile(
        user.id,
        email.as_deref().unwrap_or(&user.email),
        username.as_deref().unwrap_or(&user.username),
    )?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        output::success(&format!("Profile updated: {} ({})", updated.username, updated.email));
    }
    Ok(())
}
