//! Portfolio CLI - Command-line interface for the student-portfolio client
//!
//! Exercises the session and identity layers: account registration, login,
//! session inspection, the public student directory, and logout.

use clap::{Parser, Subcommand};
use portfolio_core::{init_logging, PortfolioConfig};
use portfolio_identity::{IdentityClient, IdentityClientConfig, RegistrationRequest};
use portfolio_session::SessionManager;
use std::io::Write;
use std::path::PathBuf;
use tracing::debug;

#[derive(Parser)]
#[command(name = "portfolio")]
#[command(about = "Client for the student portfolio platform")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Register a new student account
    Register {
        /// Full name
        name: String,

        /// Account email
        email: String,

        /// Course of study
        #[arg(long)]
        course: Option<String>,

        /// Class shift (e.g. morning, evening)
        #[arg(long)]
        shift: Option<String>,
    },

    /// Log in and persist the session
    Login {
        /// Account email
        email: String,

        /// Password (prompted when omitted)
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show the current session
    Whoami,

    /// List registered students (public, no login required)
    Students,

    /// Request a password reset email
    ForgotPassword {
        /// Account email
        email: String,
    },

    /// Clear the persisted session
    Logout,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => PortfolioConfig::from_file(path)?,
        None => PortfolioConfig::default(),
    }
    .apply_env();

    if cli.verbose {
        config.logging.level = "debug".to_string();
    }

    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("Failed to set up logging: {e}"))?;
    config.validate()?;

    debug!("Using identity service at {}", config.service.base_url);

    let manager = SessionManager::from_config(&config)?;
    manager.initialize().await;

    match cli.command {
        Commands::Register {
            name,
            email,
            course,
            shift,
        } => {
            let password = prompt("Password: ")?;
            let client = identity_client(&config)?;
            let profile = client
                .register(&RegistrationRequest {
                    full_name: name,
                    email,
                    password,
                    course,
                    shift,
                })
                .await?;
            println!("Registered {} <{}> (id {})", profile.full_name, profile.email, profile.id);
        }

        Commands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => prompt("Password: ")?,
            };
            let profile = manager.login_with_credentials(&email, &password).await?;
            println!("Logged in as {} <{}>", profile.full_name, profile.email);
            if profile.is_admin() {
                println!("Role: administrator");
            }
        }

        Commands::Whoami => {
            let state = manager.state();
            match state.profile() {
                Some(profile) => {
                    println!("{} <{}>", profile.full_name, profile.email);
                    if let Some(course) = &profile.course {
                        println!("Course: {}", course);
                    }
                    println!("Role: {}", profile.role);
                }
                None => println!("Not logged in."),
            }
        }

        Commands::Students => {
            let client = identity_client(&config)?;
            let students = client.list_students().await?;
            if students.is_empty() {
                println!("No students registered.");
            }
            for student in students {
                println!(
                    "{:>5}  {}  {}",
                    student.id,
                    student.full_name,
                    student.course.unwrap_or_default()
                );
            }
        }

        Commands::ForgotPassword { email } => {
            let client = identity_client(&config)?;
            client.request_password_reset(&email).await?;
            println!("If the email exists, a password reset link has been sent.");
        }

        Commands::Logout => {
            manager.logout();
            println!("Logged out.");
        }
    }

    Ok(())
}

fn identity_client(config: &PortfolioConfig) -> anyhow::Result<IdentityClient> {
    Ok(IdentityClient::new(IdentityClientConfig::from_service(
        &config.service,
    ))?)
}

fn prompt(label: &str) -> std::io::Result<String> {
    print!("{}", label);
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
