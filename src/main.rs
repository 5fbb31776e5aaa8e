use std::env;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use tracing_subscriber::EnvFilter;

use meritus_client::config::Config;
use meritus_client::models::credentials::{Credentials, OtpPurpose};
use meritus_client::models::user::User;
use meritus_client::roles::{RoleResolution, RoleRoutes};
use meritus_client::services::auth_api::HttpAuthApi;
use meritus_client::store::FileSessionStore;
use meritus_client::SessionManager;

/// Smoke CLI for driving the SDK against a live service.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;

    let client = Client::builder()
        .timeout(Duration::from_secs(config.request_timeout_secs))
        .build()
        .context("failed to build HTTP client")?;
    let api = Arc::new(HttpAuthApi::new(client, config.auth_base_url.clone()));
    let store = Arc::new(
        FileSessionStore::open(&config.session_store_path)
            .await
            .context("failed to open session store")?,
    );
    let session = SessionManager::new(api, store, RoleRoutes::default());
    session.initialize().await?;

    let args: Vec<String> = env::args().skip(1).collect();
    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["login", email, password] => {
            let user = session
                .login(Credentials::EmailPassword {
                    email: email.to_string(),
                    password: password.to_string(),
                })
                .await?;
            report_signed_in(&user, &session.resolve_roles().await?);
        }
        ["send-otp", phone] => {
            session.send_otp(phone, OtpPurpose::Login).await?;
            println!("Code sent to {}", phone);
        }
        ["login-otp", phone, code] => {
            let user = session
                .login(Credentials::PhoneOtp {
                    phone_number: phone.to_string(),
                    code: code.to_string(),
                })
                .await?;
            report_signed_in(&user, &session.resolve_roles().await?);
        }
        ["whoami"] => {
            let snapshot = session.fetch_account().await?;
            println!(
                "{} {} <{}> roles={:?}",
                snapshot.user.first_name,
                snapshot.user.last_name,
                snapshot.user.email,
                snapshot.user.roles
            );
            if let Some(role) = session.active_role().await {
                println!("Active role: {}", role);
            }
        }
        ["roles"] => {
            let resolution = session.resolve_roles().await?;
            for option in &resolution.options {
                println!("{} -> {}", option.label, option.route);
            }
        }
        ["logout"] => {
            session.logout().await;
            println!("Signed out");
        }
        _ => {
            bail!(
                "usage: meritus-client login <email> <password> | send-otp <phone> \
                 | login-otp <phone> <code> | whoami | roles | logout"
            );
        }
    }

    Ok(())
}

fn report_signed_in(user: &User, resolution: &RoleResolution) {
    println!(
        "Signed in as {} {} <{}>",
        user.first_name, user.last_name, user.email
    );
    match resolution.single() {
        Some(only) => println!("Active role: {} -> {}", only.label, only.route),
        None => {
            println!("Pick a role with `roles`:");
            for option in &resolution.options {
                println!("  {} -> {}", option.label, option.route);
            }
        }
    }
}
