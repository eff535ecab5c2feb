mod authority;
mod init;
mod login;
mod user;

pub use authority::{
    cmd_authority_add, cmd_authority_list, cmd_authority_remove, cmd_authority_rename,
    cmd_authority_show,
};
pub use init::cmd_init;
pub use login::cmd_login;
pub use user::{
    FlagChanges, cmd_user_add, cmd_user_list, cmd_user_passwd, cmd_user_remove, cmd_user_show,
    cmd_user_update,
};

/// Read one line from stdin after printing a prompt. Trailing newline is stripped.
pub(crate) fn read_secret(prompt: &str) -> anyhow::Result<String> {
    use std::io::Write;

    print!("{prompt}");
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim_end_matches(['\r', '\n']).to_string())
}
