use crate::domain::{Account, AccountFlags, AccountUpdate, Attributes, NewAccount};
use crate::services::Session;
use crate::state::SharedState;

use super::read_secret;

/// Requested flag changes; `None` keeps the current value.
#[derive(Debug, Clone, Copy, Default)]
pub struct FlagChanges {
    pub enabled: Option<bool>,
    pub locked: Option<bool>,
    pub credentials_expired: Option<bool>,
    pub expired: Option<bool>,
}

impl FlagChanges {
    #[must_use]
    pub fn apply(self, mut flags: AccountFlags) -> AccountFlags {
        if let Some(enabled) = self.enabled {
            flags.enabled = enabled;
        }
        if let Some(locked) = self.locked {
            flags.account_non_locked = !locked;
        }
        if let Some(expired) = self.credentials_expired {
            flags.credentials_non_expired = !expired;
        }
        if let Some(expired) = self.expired {
            flags.account_non_expired = !expired;
        }
        flags
    }
}

const fn yes_no(value: bool) -> &'static str {
    if value { "Yes" } else { "No" }
}

fn print_account(account: &Account) {
    let authorities: Vec<&str> = account.authorities.iter().map(|a| a.as_str()).collect();

    println!("Account: {}", account.username);
    println!("{:-<70}", "");
    println!("Enabled: {}", yes_no(account.flags.enabled));
    println!("Locked: {}", yes_no(!account.flags.account_non_locked));
    println!(
        "Credentials Expired: {}",
        yes_no(!account.flags.credentials_non_expired)
    );
    println!("Expired: {}", yes_no(!account.flags.account_non_expired));
    println!("Authorities: {}", authorities.join(", "));
    for (key, value) in &account.attributes {
        println!("  {key} = {value}");
    }
    println!("Created: {} | Updated: {}", account.created_at, account.updated_at);
}

pub async fn cmd_user_add(
    state: &SharedState,
    username: &str,
    authorities: Vec<String>,
    disabled: bool,
    attributes: Vec<(String, String)>,
) -> anyhow::Result<()> {
    let password = read_secret("Password: ")?;

    let account = state
        .accounts
        .create_account(NewAccount {
            username: username.to_string(),
            password: Some(password),
            flags: AccountFlags {
                enabled: !disabled,
                ..AccountFlags::default()
            },
            authorities,
            attributes: attributes.into_iter().collect::<Attributes>(),
        })
        .await?;

    println!("✓ Created account: {}", account.username);
    Ok(())
}

pub async fn cmd_user_list(state: &SharedState) -> anyhow::Result<()> {
    let accounts = state.accounts.list_accounts().await?;

    if accounts.is_empty() {
        println!("No accounts.");
        println!();
        println!("Add one with: gatekeep user add <username>");
        return Ok(());
    }

    println!("Accounts ({} total)", accounts.len());
    println!("{:-<70}", "");

    for account in accounts {
        let status = if !account.flags.enabled {
            "disabled"
        } else if !account.flags.account_non_locked {
            "locked"
        } else if !account.flags.account_non_expired || !account.flags.credentials_non_expired {
            "expired"
        } else {
            "active"
        };
        let authorities: Vec<&str> = account.authorities.iter().map(|a| a.as_str()).collect();
        println!("• {} [{}] {}", account.username, status, authorities.join(", "));
    }

    Ok(())
}

pub async fn cmd_user_show(state: &SharedState, username: &str) -> anyhow::Result<()> {
    let account = state.accounts.get_by_username(username).await?;
    print_account(&account);
    Ok(())
}

pub async fn cmd_user_update(
    state: &SharedState,
    username: &str,
    changes: FlagChanges,
    authorities: Option<Vec<String>>,
    reset_password: bool,
) -> anyhow::Result<()> {
    let current = state.accounts.get_by_username(username).await?;

    let mut update = AccountUpdate::from(&current);
    update.flags = changes.apply(current.flags);
    if let Some(authorities) = authorities {
        update.authorities = authorities;
    }
    if reset_password {
        update.password = Some(read_secret("New password: ")?);
    }

    let account = state.accounts.update_account(username, update).await?;
    print_account(&account);
    Ok(())
}

pub async fn cmd_user_passwd(state: &SharedState, username: &str) -> anyhow::Result<()> {
    let current = read_secret("Current password: ")?;
    let mut session: Session = state.auth.authenticate(username, &current).await?;

    let new_password = read_secret("New password: ")?;
    let confirm = read_secret("Confirm new password: ")?;
    if new_password != confirm {
        anyhow::bail!("Passwords do not match");
    }

    state
        .auth
        .change_password(&mut session, &current, &new_password)
        .await?;

    println!("✓ Password changed for {username}. Log in again with the new password.");
    Ok(())
}

pub async fn cmd_user_remove(state: &SharedState, username: &str) -> anyhow::Result<()> {
    let account = state.accounts.get_by_username(username).await?;

    println!("Delete account '{}'?", account.username);
    println!("Enter 'y' to confirm, anything else to cancel:");

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    if input.trim().eq_ignore_ascii_case("y") {
        state.accounts.delete_account(username).await?;
        println!("✓ Removed: {username}");
    } else {
        println!("Cancelled.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_changes_only_touch_requested_fields() {
        let flags = FlagChanges {
            locked: Some(true),
            ..FlagChanges::default()
        }
        .apply(AccountFlags::default());

        assert!(flags.enabled);
        assert!(!flags.account_non_locked);
        assert!(flags.credentials_non_expired);
        assert!(flags.account_non_expired);
    }

    #[test]
    fn flag_changes_invert_negative_flags() {
        let start = AccountFlags {
            enabled: false,
            account_non_expired: false,
            account_non_locked: false,
            credentials_non_expired: false,
        };

        let flags = FlagChanges {
            enabled: Some(true),
            locked: Some(false),
            credentials_expired: Some(false),
            expired: Some(false),
        }
        .apply(start);

        assert_eq!(flags, AccountFlags::default());
    }
}
