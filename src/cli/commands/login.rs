use crate::state::SharedState;

use super::read_secret;

pub async fn cmd_login(state: &SharedState, username: &str) -> anyhow::Result<()> {
    let password = read_secret("Password: ")?;

    match state.auth.authenticate(username, &password).await {
        Ok(session) => {
            println!("✓ Authenticated as {}", session.username);
            let authorities: Vec<&str> =
                session.authorities.iter().map(|a| a.as_str()).collect();
            println!("  Authorities: {}", authorities.join(", "));
            println!("  Session: {}", session.token);
            Ok(())
        }
        Err(e) if e.is_authentication_failure() => {
            println!("✗ {e}");
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}
