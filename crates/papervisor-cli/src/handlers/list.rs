//! `papervisor list <whitelist|banned|ops>`

use anyhow::Result;
use papervisor_core::PlayerList;

use crate::bootstrap::CliContext;
use crate::commands::ListKind;
use crate::error::CliError;
use crate::presentation::print_entries;

pub async fn execute(ctx: &CliContext, kind: ListKind) -> Result<()> {
    let list = PlayerList::from(kind);
    let entries = ctx.players.entries(list).await.map_err(CliError::from)?;
    println!("{} ({} entries)\n", list.file_name(), entries.len());
    print_entries(&entries);
    Ok(())
}
