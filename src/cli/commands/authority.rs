use crate::domain::Authority;
use crate::state::SharedState;

fn print_authority(authority: &Authority) {
    let holders: Vec<&str> = authority.accounts.iter().map(|u| u.as_str()).collect();
    if holders.is_empty() {
        println!("• {} (unassigned)", authority.name);
    } else {
        println!("• {} ({})", authority.name, holders.join(", "));
    }
}

pub async fn cmd_authority_add(state: &SharedState, name: &str) -> anyhow::Result<()> {
    let authority = state.authorities.create_authority(name).await?;
    println!("✓ Created authority: {}", authority.name);
    Ok(())
}

pub async fn cmd_authority_list(state: &SharedState) -> anyhow::Result<()> {
    let authorities = state.authorities.list_authorities().await?;

    if authorities.is_empty() {
        println!("No authorities defined.");
        println!();
        println!("Add one with: gatekeep authority add <name>");
        return Ok(());
    }

    println!("Authorities ({} total)", authorities.len());
    println!("{:-<70}", "");
    for authority in &authorities {
        print_authority(authority);
    }
    Ok(())
}

pub async fn cmd_authority_show(state: &SharedState, name: &str) -> anyhow::Result<()> {
    let authority = state.authorities.get_by_name(name).await?;
    print_authority(&authority);
    Ok(())
}

pub async fn cmd_authority_rename(
    state: &SharedState,
    name: &str,
    new_name: &str,
) -> anyhow::Result<()> {
    let authority = state.authorities.update_authority(name, new_name).await?;
    println!("✓ Renamed {} -> {}", name, authority.name);
    Ok(())
}

pub async fn cmd_authority_remove(state: &SharedState, name: &str) -> anyhow::Result<()> {
    let authority = state.authorities.get_by_name(name).await?;

    if !authority.accounts.is_empty() {
        println!(
            "Authority '{}' is held by {} account(s); they will lose it.",
            authority.name,
            authority.accounts.len()
        );
        println!("Enter 'y' to confirm, anything else to cancel:");

        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;
        if !input.trim().eq_ignore_ascii_case("y") {
            println!("Cancelled.");
            return Ok(());
        }
    }

    state.authorities.delete_authority(name).await?;
    println!("✓ Removed authority: {name}");
    Ok(())
}
