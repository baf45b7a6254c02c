use super::{input_lines, prompt_line};
use crate::app::{App, View};
use crate::error::ClientError;

pub async fn login(
    app: &mut App,
    username: &str,
    password: Option<String>,
) -> Result<(), ClientError> {
    let password = match password {
        Some(password) => password,
        None => prompt_line(&mut input_lines(), "Password: ")
            .await?
            .unwrap_or_default(),
    };
    let session = app.login(username, &password).await?;
    println!("Logged in as {} ({})", username, session.role);
    println!("{} documents available", app.documents().len());
    Ok(())
}

pub fn logout(app: &mut App) -> Result<(), ClientError> {
    app.logout()?;
    println!("Logged out");
    Ok(())
}

pub fn whoami(app: &App) {
    match (app.view(), app.session()) {
        (View::Main, Some(session)) => {
            let rights = if app.can_mutate() {
                "can upload and delete documents"
            } else {
                "read-only"
            };
            println!("Logged in with role {} ({})", session.role, rights);
        }
        _ => println!("Not logged in"),
    }
}
