//! Command implementations for the CLI shell.

use std::io::{self, Write};

use anyhow::{anyhow, bail, Context, Result};
use serde_json::Value;
use tracing::warn;

use stocksight_core::api::{Period, DEFAULT_WINDOW_DAYS};
use stocksight_core::{Config, Identity, RegisterData, Role, SessionContext, SessionError};

/// Environment variable with a default login username
const USERNAME_ENV: &str = "STOCKSIGHT_USERNAME";

/// Environment variable with a login password (skips the prompt)
const PASSWORD_ENV: &str = "STOCKSIGHT_PASSWORD";

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Status,
    Login(Option<String>),
    Register {
        username: String,
        email: String,
        full_name: String,
    },
    Demo(Role),
    Logout,
    Dashboard,
    Alerts,
    Health,
    Help,
}

impl Command {
    pub fn parse(args: &[String]) -> Result<Self> {
        let Some((name, rest)) = args.split_first() else {
            return Ok(Command::Status);
        };
        let command = match name.as_str() {
            "status" | "whoami" => Command::Status,
            "login" => Command::Login(rest.first().cloned()),
            "register" => {
                if rest.len() < 3 {
                    bail!("register needs <username> <email> <full name>");
                }
                Command::Register {
                    username: rest[0].clone(),
                    email: rest[1].clone(),
                    full_name: rest[2..].join(" "),
                }
            }
            "demo" => {
                let role = rest
                    .first()
                    .ok_or_else(|| anyhow!("demo needs a role"))?
                    .parse::<Role>()
                    .map_err(|e| anyhow!(e))?;
                Command::Demo(role)
            }
            "logout" => Command::Logout,
            "dashboard" => Command::Dashboard,
            "alerts" => Command::Alerts,
            "health" => Command::Health,
            "help" | "--help" | "-h" => Command::Help,
            other => bail!("Unknown command '{}'", other),
        };
        Ok(command)
    }
}

pub async fn run(context: &SessionContext, config: &mut Config, command: Command) -> Result<()> {
    let session = context.session()?;

    match command {
        Command::Status | Command::Help => {
            match session.identity() {
                Some(identity) => print_identity(&identity),
                None => println!("Not logged in"),
            }
            Ok(())
        }
        Command::Login(username) => {
            let username = match username.or_else(|| std::env::var(USERNAME_ENV).ok()) {
                Some(u) => u,
                None => prompt("Username", config.last_username.as_deref())?,
            };
            let password = read_password()?;
            let identity = session.login(&username, &password).await.map_err(display_error)?;

            config.last_username = Some(username);
            if let Err(e) = config.save() {
                warn!(error = %e, "Failed to save config");
            }
            print_identity(&identity);
            Ok(())
        }
        Command::Register {
            username,
            email,
            full_name,
        } => {
            let password = read_password()?;
            let data = RegisterData {
                username,
                email,
                password,
                full_name,
            };
            let identity = session.register(&data).await.map_err(display_error)?;
            print_identity(&identity);
            Ok(())
        }
        Command::Demo(role) => {
            let identity = session.demo_login(role).await.map_err(display_error)?;
            print_identity(&identity);
            Ok(())
        }
        Command::Logout => {
            session.logout().await;
            println!("Logged out");
            Ok(())
        }
        Command::Dashboard => {
            require_identity(context)?;
            let api = session.api();
            let (overview, trends, stock, alerts) = futures::future::join4(
                api.dashboard_overview(),
                api.sales_trends(Period::Daily, DEFAULT_WINDOW_DAYS),
                api.stock_status(),
                api.alerts(),
            )
            .await;
            print_section("Overview", overview?)?;
            print_section("Sales trends", trends?)?;
            print_section("Stock status", stock?)?;
            print_section("Alerts", alerts?)?;
            Ok(())
        }
        Command::Alerts => {
            require_identity(context)?;
            print_section("Alerts", session.api().alerts().await?)
        }
        Command::Health => {
            let api = session.api();
            let (app, odoo) = futures::future::join(api.health_app(), api.health_odoo()).await;
            print_section("API", app?)?;
            print_section("ERP", odoo?)?;
            Ok(())
        }
    }
}

/// Refuse identity-dependent commands for a logged-out session.
fn require_identity(context: &SessionContext) -> Result<Identity> {
    context
        .identity()?
        .ok_or_else(|| anyhow!("Not logged in. Run `stocksight login` or `stocksight demo <role>` first."))
}

/// Keep the user-facing message of rejected auth flows.
fn display_error(e: SessionError) -> anyhow::Error {
    anyhow!("{}", e)
}

fn print_identity(identity: &Identity) {
    println!(
        "Logged in as {} <{}> ({})",
        identity.display_name(),
        identity.email,
        identity.role.display_name()
    );
}

fn print_section(title: &str, value: Value) -> Result<()> {
    println!("== {}", title);
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn prompt(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(d) => print!("{} [{}]: ", label, d),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line).context("Failed to read input")?;
    let line = line.trim();
    if line.is_empty() {
        default
            .map(str::to_string)
            .ok_or_else(|| anyhow!("{} is required", label))
    } else {
        Ok(line.to_string())
    }
}

fn read_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_defaults_to_status() {
        assert_eq!(Command::parse(&[]).unwrap(), Command::Status);
    }

    #[test]
    fn test_parse_login_with_optional_username() {
        assert_eq!(Command::parse(&args(&["login"])).unwrap(), Command::Login(None));
        assert_eq!(
            Command::parse(&args(&["login", "alice"])).unwrap(),
            Command::Login(Some("alice".to_string()))
        );
    }

    #[test]
    fn test_parse_register_joins_full_name() {
        let command = Command::parse(&args(&["register", "bob", "bob@example.com", "Bob", "Builder"])).unwrap();
        assert_eq!(
            command,
            Command::Register {
                username: "bob".to_string(),
                email: "bob@example.com".to_string(),
                full_name: "Bob Builder".to_string(),
            }
        );
        assert!(Command::parse(&args(&["register", "bob"])).is_err());
    }

    #[test]
    fn test_parse_demo_role() {
        assert_eq!(Command::parse(&args(&["demo", "viewer"])).unwrap(), Command::Demo(Role::Viewer));
        assert!(Command::parse(&args(&["demo", "owner"])).is_err());
        assert!(Command::parse(&args(&["demo"])).is_err());
    }

    #[test]
    fn test_parse_unknown_command() {
        assert!(Command::parse(&args(&["frobnicate"])).is_err());
    }

    #[test]
    fn test_require_identity_on_unprovided_context() {
        let context = SessionContext::new();
        let err = require_identity(&context).unwrap_err();
        assert!(err.to_string().contains("session context not initialized"));
    }
}
