//! Sign-in commands.
//!
//! The password is taken from `LAMPSTAND_PASSWORD` when set, otherwise read
//! from the first line of stdin, so it never appears in shell history.

use std::io::BufRead;

use lampstand_client::ApiClient;
use secrecy::SecretString;

use super::{CliError, print_json, print_text};

fn read_password() -> Result<SecretString, CliError> {
    if let Ok(password) = std::env::var("LAMPSTAND_PASSWORD") {
        return Ok(SecretString::from(password));
    }

    tracing::info!("Reading password from stdin");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::MissingInput("password"));
    }
    Ok(SecretString::from(password.to_string()))
}

pub async fn login(client: &ApiClient, email: &str) -> Result<(), CliError> {
    let password = read_password()?;
    let user = client.login(email, &password).await?;
    tracing::info!("Signed in as {}", user.email.as_deref().unwrap_or(user.id.as_str()));
    print_json(&user)
}

pub async fn logout(client: &ApiClient) -> Result<(), CliError> {
    if !client.is_authenticated() {
        print_text("Not signed in");
        return Ok(());
    }
    client.logout().await?;
    print_text("Signed out");
    Ok(())
}

pub async fn whoami(client: &ApiClient) -> Result<(), CliError> {
    if !client.is_authenticated() {
        print_text("Not signed in");
        return Ok(());
    }
    let user = client.me().await?;
    print_json(&user)
}
