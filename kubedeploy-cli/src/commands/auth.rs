///! Authentication commands

use crate::config::Config;
use crate::output::{self, OutputFormat};
use anyhow::Result;
use clap::Subcommand;
use kubedeploy_client::ConsoleContext;
use kubedeploy_common::auth::{SignupRequest, User};

#[derive(Subcommand)]
pub enum AuthCommands {
    /// Login to the kubedeploy server
    Login {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Password (will be prompted if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Create a new account and log in
    Signup {
        /// Email address
        #[arg(short, long)]
        email: String,

        /// Username
        #[arg(short, long)]
        username: String,

        /// Full name
        #[arg(long)]
        full_name: Option<String>,

        /// Password (will be prompted if not provided)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Logout (clear stored credentials)
    Logout,

    /// Show current authentication status
    Status,

    /// Show the account the server associates with the stored token
    Whoami,
}

pub async fn handle_auth_command(
    command: AuthCommands,
    ctx: &ConsoleContext,
    config: &mut Config,
    output_format: &str,
) -> Result<()> {
    match command {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(pwd) => pwd,
                None => {
                    use dialoguer::Password;
                    Password::new().with_prompt("Password").interact()?
                }
            };

            let session = ctx.login(&email, &password).await?;

            config.store_session(&session);
            config.save()?;

            output::print_success("Login successful");
            println!("  Username: {}", session.user.username);
            println!("  Email:    {}", session.user.email);
        }

        AuthCommands::Signup {
            email,
            username,
            full_name,
            password,
        } => {
            let password = match password {
                Some(pwd) => pwd,
                None => {
                    use dialoguer::Password;
                    Password::new()
                        .with_prompt("Password")
                        .with_confirmation("Confirm password", "Passwords do not match")
                        .interact()?
                }
            };

            let request = SignupRequest {
                email,
                username,
                password,
                full_name,
            };
            let session = ctx.signup(&request).await?;

            config.store_session(&session);
            config.save()?;

            output::print_success("Account created");
            println!("  Logged in as: {}", session.user.username);
        }

        AuthCommands::Logout => {
            ctx.logout().await;

            config.clear_session();
            config.save()?;

            output::print_success("Logged out successfully");
        }

        AuthCommands::Status => match (&config.token, &config.username) {
            (Some(token), username) => {
                println!(
                    "Authenticated as: {}",
                    username.as_deref().unwrap_or("<unknown>")
                );
                println!("Server: {}", config.server);
                println!("Token: {}...", token.chars().take(12).collect::<String>());
            }
            (None, _) => {
                println!("Not authenticated");
                println!("Use 'kubedeploy auth login' to authenticate");
            }
        },

        AuthCommands::Whoami => {
            let user = ctx.current_user().await?;
            output::print_single(&user, OutputFormat::from_str(output_format), user_detail)?;
        }
    }

    Ok(())
}

fn user_detail(user: &User) -> String {
    let mut lines = vec![
        format!("Username:  {}", user.username),
        format!("Email:     {}", user.email),
        format!("Role:      {}", user.role),
        format!("Active:    {}", if user.active { "yes" } else { "no" }),
    ];
    if !user.full_name.is_empty() {
        lines.insert(1, format!("Full name: {}", user.full_name));
    }
    lines.join("\n") + "\n"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_detail() {
        let user = User {
            id: 3,
            email: "ada@example.com".to_string(),
            username: "ada".to_string(),
            full_name: "Ada Lovelace".to_string(),
            role: "admin".to_string(),
            active: true,
            created_at: None,
        };
        let text = user_detail(&user);
        assert!(text.starts_with("Username:  ada\nFull name: Ada Lovelace\n"));
        assert!(text.contains("Role:      admin"));
    }
}
