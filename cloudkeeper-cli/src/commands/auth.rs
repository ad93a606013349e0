use anyhow::Result;

use cloudkeeper_app::AppState;

use crate::prompt;

pub async fn login(state: &AppState, username: &str, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => prompt::read_secret("Password")?,
    };
    state.auth.login(username, &password).await?;
    println!("Logged in as {username}.");
    Ok(())
}

pub async fn logout(state: &AppState) -> Result<()> {
    state.auth.logout().await?;
    println!("Logged out.");
    Ok(())
}
