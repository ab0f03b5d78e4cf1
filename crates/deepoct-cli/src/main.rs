//! DeepOCT command-line client.
//!
//! A thin front-end over `deepoct-core`: it builds one credential store,
//! one session event channel, and one API client at startup, passes them
//! down to the services, and maps commands onto service calls. It also
//! plays the "navigation reset" role of a full UI by subscribing to
//! session events and telling the user to log in again when the session
//! expires.

use std::io::{self, Write};
use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use deepoct_core::services::{AuthService, Outcome, PredictionService, UserService};
use deepoct_core::{
    ApiClient, ApiConfig, CredentialStore, FileStore, SessionEvent, SessionEvents,
};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the tracing subscriber for logging.
/// Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn usage() -> ! {
    eprintln!("DeepOCT client");
    eprintln!();
    eprintln!("Usage: deepoct <command> [args]");
    eprintln!();
    eprintln!("Commands:");
    eprintln!("  login [email]       Sign in and store the session");
    eprintln!("  register            Create a new account");
    eprintln!("  logout              Clear the stored session");
    eprintln!("  profile             Show the signed-in user's profile");
    eprintln!("  predict <image>     Upload an OCT scan for diagnosis");
    eprintln!("  history [page]      List past predictions");
    eprintln!("  detail <id>         Show one prediction in full");
    eprintln!("  delete <id>         Delete a prediction");
    std::process::exit(2);
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();
    init_tracing();

    let args: Vec<String> = std::env::args().collect();
    let Some(command) = args.get(1) else { usage() };

    let config = ApiConfig::from_env();
    info!(base_url = %config.base_url, "DeepOCT CLI starting");

    let store = CredentialStore::new(Arc::new(
        FileStore::default_location().context("Could not locate a data directory")?,
    ));
    let events = SessionEvents::new();

    // Session-expiry responder: the CLI equivalent of resetting the
    // navigation stack to the login screen.
    events.on(SessionEvent::TokenExpired, || {
        eprintln!("Session expired. Please log in again.");
    });
    events.on(SessionEvent::Logout, || {
        info!("session ended by user");
    });

    let api = Arc::new(
        ApiClient::new(config, store.clone(), events.clone())
            .context("Failed to build API client")?,
    );
    let auth = AuthService::new(Arc::clone(&api));
    let user = UserService::new(Arc::clone(&api));
    let predictions = PredictionService::new(Arc::clone(&api));

    match command.as_str() {
        "login" => {
            let email = match args.get(2) {
                Some(email) => email.clone(),
                None => prompt("Email: ")?,
            };
            let password = rpassword::prompt_password("Password: ")?;
            finish(auth.login(&email, &password).await)
        }
        "register" => {
            let request = deepoct_core::models::RegisterRequest {
                email: prompt("Email: ")?,
                password: rpassword::prompt_password("Password: ")?,
                full_name: prompt("Full name: ")?,
                mobile_number: prompt("Mobile number: ")?,
                date_of_birth: prompt("Date of birth (YYYY-MM-DD): ")?,
            };
            finish(auth.register(request).await)
        }
        "logout" => {
            auth.logout().await;
            println!("Logged out.");
            Ok(())
        }
        "profile" => {
            let outcome = user.get_profile().await;
            match outcome.data {
                Some(profile) => {
                    println!("{} <{}>", profile.full_name, profile.email);
                    if !profile.mobile_number.is_empty() {
                        println!("Mobile:    {}", profile.mobile_number);
                    }
                    if !profile.date_of_birth.is_empty() {
                        println!("Born:      {}", profile.date_of_birth);
                    }
                    println!("Verified:  {}", if profile.is_verified { "yes" } else { "no" });
                    println!("Member since {}", profile.created_at.format("%Y-%m-%d"));
                    Ok(())
                }
                None => {
                    // Fall back to the cached copy when the network is down
                    if let Some(cached) = user.cached_profile().await {
                        println!("{} <{}> (cached)", cached.full_name, cached.email);
                    }
                    bail!("{}", outcome.message)
                }
            }
        }
        "predict" => {
            let Some(image) = args.get(2) else { usage() };
            let outcome = predictions.predict(Path::new(image)).await;
            match outcome.data {
                Some(result) => {
                    println!(
                        "{} ({}) - {:.1}% confidence",
                        result.predicted_class,
                        result.predicted_class.full_name(),
                        result.confidence * 100.0
                    );
                    println!("{}", result.predicted_class.description());
                    if let Some(heatmap) = result.heatmap_url {
                        println!("Heatmap: {}", heatmap);
                    }
                    Ok(())
                }
                None => bail!("{}", outcome.message),
            }
        }
        "history" => {
            let page: u32 = match args.get(2) {
                Some(raw) => raw.parse().context("Page must be a number")?,
                None => 1,
            };
            let outcome = predictions.history(page, 20).await;
            match outcome.data {
                Some(history) => {
                    for item in &history.items {
                        println!(
                            "{}  {}  {:>6}  {:.1}%",
                            item.created_at.format("%Y-%m-%d %H:%M"),
                            item.id,
                            item.predicted_class,
                            item.confidence * 100.0
                        );
                    }
                    println!(
                        "Page {} of {} predictions total",
                        history.page, history.total
                    );
                    Ok(())
                }
                None => bail!("{}", outcome.message),
            }
        }
        "detail" => {
            let Some(id) = args.get(2) else { usage() };
            let outcome = predictions.detail(id).await;
            match outcome.data {
                Some(result) => {
                    println!(
                        "{}  {}  {:.1}%",
                        result.id,
                        result.predicted_class,
                        result.confidence * 100.0
                    );
                    let p = &result.probabilities;
                    println!(
                        "CNV {:.3}  DME {:.3}  DRUSEN {:.3}  NORMAL {:.3}",
                        p.cnv, p.dme, p.drusen, p.normal
                    );
                    println!("Scanned {}", result.created_at.format("%Y-%m-%d %H:%M"));
                    if let Some(analysis) = result.analysis_result {
                        println!(
                            "Hot area: {:.1}% of image ({} px)",
                            analysis.hot_area_percent, analysis.hot_area_pixels
                        );
                    }
                    Ok(())
                }
                None => bail!("{}", outcome.message),
            }
        }
        "delete" => {
            let Some(id) = args.get(2) else { usage() };
            finish(predictions.delete(id).await)
        }
        _ => usage(),
    }
}

/// Print the outcome message; non-success becomes a nonzero exit.
fn finish<T>(outcome: Outcome<T>) -> Result<()> {
    if outcome.success {
        println!("{}", outcome.message);
        Ok(())
    } else {
        bail!("{}", outcome.message)
    }
}

fn prompt(label: &str) -> Result<String> {
    print!("{}", label);
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
