//! User administration: `create-admin` and `users`

use std::io::{self, Write};

use dialoguer::{Confirm, Input, theme::ColorfulTheme};
use miette::{IntoDiagnostic, Result};
use owo_colors::OwoColorize;
use santa_core::{CoreError, Exchange, NewUser};
use santa_server::auth::hash_password;

use crate::output::{Output, flag};

/// Answers collected for a new admin account
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdminInput {
    pub name: String,
    pub username: String,
    pub password: String,
}

impl AdminInput {
    /// Reject blank fields and mismatched password confirmation.
    pub fn validate(self, confirmation: &str) -> std::result::Result<Self, String> {
        let name = self.name.trim().to_string();
        let username = self.username.trim().to_string();

        if name.is_empty() {
            return Err("Name cannot be empty".to_string());
        }
        if username.is_empty() {
            return Err("Username cannot be empty".to_string());
        }
        if self.password.is_empty() {
            return Err("Password cannot be empty".to_string());
        }
        if self.password != confirmation {
            return Err("Passwords do not match".to_string());
        }

        Ok(Self {
            name,
            username,
            password: self.password,
        })
    }
}

fn prompt_text(theme: &ColorfulTheme, prompt: &str, given: Option<String>) -> Result<String> {
    match given {
        Some(value) => Ok(value),
        None => Input::with_theme(theme)
            .with_prompt(prompt)
            .interact_text()
            .into_diagnostic(),
    }
}

fn prompt_password(prompt: &str) -> Result<String> {
    print!("  {} ", prompt.bright_cyan());
    io::stdout().flush().into_diagnostic()?;
    rpassword::read_password().into_diagnostic()
}

/// Interactively create an administrator account
pub async fn create_admin(
    exchange: &Exchange,
    name: Option<String>,
    username: Option<String>,
) -> Result<()> {
    let output = Output::new();
    let theme = ColorfulTheme::default();

    output.section("Create Admin User");

    let admins = exchange.store().count_admins().await?;
    if admins > 0 {
        output.warning(&format!("{} admin user(s) already exist", admins));
        let proceed = Confirm::with_theme(&theme)
            .with_prompt("Create another admin user?")
            .default(false)
            .interact()
            .into_diagnostic()?;
        if !proceed {
            output.status("Cancelled");
            return Ok(());
        }
    }

    let name = prompt_text(&theme, "Admin name", name)?;
    let username = prompt_text(&theme, "Admin username", username)?;
    let password = prompt_password("Admin password:")?;
    let confirmation = prompt_password("Confirm password:")?;

    let input = match (AdminInput {
        name,
        username,
        password,
    })
    .validate(&confirmation)
    {
        Ok(input) => input,
        Err(message) => {
            output.error(&message);
            return Err(miette::miette!("{}", message));
        }
    };

    let password_hash = hash_password(&input.password).into_diagnostic()?;
    match exchange
        .create_user(NewUser {
            name: input.name,
            username: input.username,
            password_hash,
            is_admin: true,
        })
        .await
    {
        Ok(user) => {
            output.success(&format!(
                "Admin user '{}' created",
                user.username.bright_white()
            ));
            output.kv("ID", &user.id.to_string());
            Ok(())
        }
        Err(CoreError::UsernameTaken { username }) => {
            output.error(&format!("Username '{}' already exists", username));
            Err(CoreError::UsernameTaken { username }.into())
        }
        Err(e) => Err(e.into()),
    }
}

/// Table of every user with their assignment status
pub async fn users(exchange: &Exchange) -> Result<()> {
    let output = Output::new();
    let statuses = exchange.user_statuses().await?;

    output.section("Users");
    if statuses.is_empty() {
        output.status("No users yet");
        return Ok(());
    }

    let rows = statuses
        .into_iter()
        .map(|status| {
            vec![
                status.user.name,
                status.user.username,
                flag(status.user.is_admin),
                flag(status.reveal.has_assignment()),
                flag(status.reveal.has_viewed()),
            ]
        })
        .collect();
    output.table(&["Name", "Username", "Admin", "Assigned", "Viewed"], rows);

    Ok(())
}
