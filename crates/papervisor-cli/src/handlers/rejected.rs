//! `papervisor rejected list|delete`

use anyhow::Result;

use crate::bootstrap::CliContext;
use crate::commands::RejectedCommand;
use crate::error::CliError;
use crate::presentation::print_rejected;

pub async fn execute(ctx: &CliContext, command: RejectedCommand) -> Result<()> {
    match command {
        RejectedCommand::List => {
            let players = ctx.players.rejected().await.map_err(CliError::from)?;
            print_rejected(&players);
        }
        RejectedCommand::Delete { username } => {
            ctx.players
                .forget_rejected(&username)
                .await
                .map_err(CliError::from)?;
            println!("Forgot rejected player {username}");
        }
    }
    Ok(())
}
