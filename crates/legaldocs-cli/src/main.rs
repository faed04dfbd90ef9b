//! LegalDocs CLI - sign in to the legal document assistant from a terminal.
//!
//! Shares the session provider and navigation rules with the web client, so
//! a session created here lands on the same menu the browser would show.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use legaldocs_core::{Config, NavView, RouteGuard, SessionProvider};

// ============================================================================
// Constants
// ============================================================================

/// Set to any value to also write logs to `<cache_dir>/logs`
const LOG_FILE_ENV: &str = "LEGALDOCS_LOG_FILE";

const EMAIL_ENV: &str = "LEGALDOCS_EMAIL";
const PASSWORD_ENV: &str = "LEGALDOCS_PASSWORD";

const USAGE: &str = "\
Usage: legaldocs <command>

Commands:
  login [email]            Sign in (prompts for anything missing)
  register [email] [name]  Create an account and sign in
  logout                   Sign out and forget the stored session
  whoami                   Show the signed-in account
  menu                     Show the navigation menu for the signed-in role";

/// Initialize the tracing subscriber for logging
fn init_tracing(log_dir: Option<PathBuf>) -> Option<WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "legaldocs.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let mut config = match Config::load() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Warning: failed to load config ({}), using defaults", e);
            Config::default()
        }
    };
    let cache_dir = config
        .cache_dir()
        .unwrap_or_else(|_| PathBuf::from("./cache"));

    let log_dir = std::env::var_os(LOG_FILE_ENV).map(|_| cache_dir.join("logs"));
    let _log_guard = init_tracing(log_dir);

    let args: Vec<String> = std::env::args().skip(1).collect();
    let Some(command) = args.first() else {
        println!("{}", USAGE);
        return Ok(());
    };

    let provider = config.session_provider(cache_dir)?;
    let guard = RouteGuard::new(&provider);
    provider.restore().await;
    info!(command = %command, authenticated = provider.is_authenticated(), "legaldocs starting");

    match command.as_str() {
        "login" => {
            let email = resolve_email(args.get(1), config.last_email.as_deref())?;
            let password = resolve_password()?;
            let session = provider
                .login(&email, &password)
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            remember_email(&mut config, &session.email_address);
            println!("Welcome back, {}!", session.display_label());
            print_redirect(&guard);
        }
        "register" => {
            let email = resolve_email(args.get(1), None)?;
            let name = match args.get(2) {
                Some(name) => Some(name.clone()),
                None => prompt_optional("Full name (optional): ")?,
            };
            let password = resolve_password()?;
            let session = provider
                .register(&email, &password, name.as_deref())
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            remember_email(&mut config, &session.email_address);
            println!("Account created for {}.", session.display_label());
            print_redirect(&guard);
        }
        "logout" => {
            provider
                .logout()
                .await
                .map_err(|e| anyhow!(e.user_message()))?;
            println!("Signed out.");
            if let NavView::Anonymous { redirect } = guard.view() {
                println!("Next: {}", redirect);
            }
        }
        "whoami" => whoami(&provider),
        "menu" => print_menu(&guard),
        "help" | "--help" | "-h" => println!("{}", USAGE),
        other => {
            eprintln!("{}", USAGE);
            return Err(anyhow!("Unknown command: {}", other));
        }
    }

    Ok(())
}

fn whoami(provider: &SessionProvider) {
    match provider.current() {
        Some(session) => {
            println!("{} <{}>", session.display_label(), session.email_address);
            println!("Role: {}", session.role);
            println!("Id:   {}", session.id);
        }
        None => println!("Not signed in"),
    }
}

fn print_menu(guard: &RouteGuard) {
    match guard.view() {
        NavView::Authenticated {
            role,
            menu,
            landing,
            display_label,
        } => {
            println!("{} ({})", display_label, role);
            println!("Home: {}", landing);
            for item in menu {
                println!("  {:<14} {}", item.name, item.href);
            }
        }
        NavView::Anonymous { redirect } => println!("Not signed in. Go to {}", redirect),
        NavView::Pending => println!("Session not loaded yet"),
    }
}

fn print_redirect(guard: &RouteGuard) {
    if let Some(landing) = guard.post_auth_redirect() {
        println!("Redirecting to {}", landing);
    }
    print_menu(guard);
}

fn remember_email(config: &mut Config, email: &str) {
    config.last_email = Some(email.to_string());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to save config");
    }
}

/// Email from the command line, the environment, or a prompt (offering the
/// last one used as the default).
fn resolve_email(arg: Option<&String>, last_email: Option<&str>) -> Result<String> {
    if let Some(email) = arg {
        return Ok(email.clone());
    }
    if let Ok(email) = std::env::var(EMAIL_ENV) {
        return Ok(email);
    }

    let prompt = match last_email {
        Some(last) => format!("Email [{}]: ", last),
        None => "Email: ".to_string(),
    };
    let input = prompt_optional(&prompt)?;
    Ok(input
        .or_else(|| last_email.map(str::to_string))
        .unwrap_or_default())
}

fn resolve_password() -> Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }
    rpassword::prompt_password("Password: ").context("Failed to read password")
}

fn prompt_optional(prompt: &str) -> Result<Option<String>> {
    print!("{}", prompt);
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;
    let input = input.trim();
    Ok((!input.is_empty()).then(|| input.to_string()))
}
