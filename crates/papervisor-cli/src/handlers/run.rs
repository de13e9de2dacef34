//! `papervisor run`: foreground supervision.
//!
//! Server output reaches the terminal through the mirrored console. Operator
//! input is read line by line; meta-commands are executed here, everything
//! else is written to the server's stdin. Ctrl-C or `!quit` stop the server
//! and exit.

use anyhow::Result;
use papervisor_core::{PlayerError, PlayerFileEntry, ServerError, UpdateOutcome, Whitelisted};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::bootstrap::CliContext;
use crate::console_commands::{HELP, MetaCommand, OperatorInput, parse_input};
use crate::error::CliError;
use crate::presentation::{format_players, format_vitals, print_entries, print_rejected};

enum Flow {
    Continue,
    Quit,
}

pub async fn execute(ctx: &CliContext, autostart: bool) -> Result<()> {
    println!("papervisor: type !help for supervisor commands");
    if autostart {
        ctx.supervisor.start().await.map_err(CliError::from)?;
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    loop {
        let flow = tokio::select! {
            line = lines.next_line(), if stdin_open => match line? {
                Some(line) => handle_line(ctx, &line).await,
                None => {
                    // Detached from a terminal; keep supervising until interrupted.
                    tracing::info!("stdin closed, press Ctrl-C to stop");
                    stdin_open = false;
                    Flow::Continue
                }
            },
            _ = tokio::signal::ctrl_c() => {
                println!("Interrupted");
                Flow::Quit
            }
        };
        if matches!(flow, Flow::Quit) {
            break;
        }
    }

    shutdown(ctx).await
}

async fn handle_line(ctx: &CliContext, line: &str) -> Flow {
    match parse_input(line) {
        Ok(OperatorInput::Empty) => {}
        Ok(OperatorInput::Console(command)) => {
            if let Err(e) = ctx.supervisor.send_command(&command).await {
                eprintln!("{e}");
            }
        }
        Ok(OperatorInput::Meta(MetaCommand::Quit)) => return Flow::Quit,
        Ok(OperatorInput::Meta(command)) => run_meta(ctx, command).await,
        Err(e) => eprintln!("{e}"),
    }
    Flow::Continue
}

async fn run_meta(ctx: &CliContext, command: MetaCommand) {
    match command {
        MetaCommand::Help => println!("{HELP}"),
        MetaCommand::Start => report(ctx.supervisor.start().await),
        MetaCommand::Stop => report(ctx.supervisor.stop().await),
        MetaCommand::Restart => report(restart(ctx).await),
        MetaCommand::Status => {
            let status = ctx.supervisor.status().await;
            match ctx.supervisor.pid().await {
                Some(pid) => println!("{status} (pid {pid})"),
                None => println!("{status}"),
            }
        }
        MetaCommand::Vitals => println!("{}", format_vitals(&ctx.vitals.vitals().await)),
        MetaCommand::Players => println!("{}", format_players(&ctx.supervisor.sessions().players())),
        MetaCommand::History(count) => {
            let history = ctx.console.history();
            for line in &history[history.len().saturating_sub(count)..] {
                println!("  {line}");
            }
        }
        MetaCommand::Update(version) => spawn_update(ctx, version),
        MetaCommand::Whitelist(name) => match ctx.players.whitelist(&name).await {
            Ok(Whitelisted::Java { uuid }) => println!("Whitelisted Java player {name} ({uuid})"),
            Ok(Whitelisted::Bedrock { name, xuid }) => {
                println!("Whitelisted Bedrock player {name} (xuid {xuid})");
            }
            Err(e) => print_player_error(&e),
        },
        MetaCommand::Unwhitelist(name) => {
            report_player(ctx.players.remove_from_whitelist(&name).await);
        }
        MetaCommand::Ban { name, reason } => {
            report_player(ctx.players.ban(&name, reason.as_deref()).await);
        }
        MetaCommand::Unban(name) => report_player(ctx.players.unban(&name).await),
        MetaCommand::Op(name) => report_player(ctx.players.op(&name).await),
        MetaCommand::Deop(name) => report_player(ctx.players.deop(&name).await),
        MetaCommand::Whitelisted => show_entries(ctx.players.whitelist_entries().await),
        MetaCommand::Banned => show_entries(ctx.players.banned_entries().await),
        MetaCommand::Ops => show_entries(ctx.players.op_entries().await),
        MetaCommand::Rejected => match ctx.players.rejected().await {
            Ok(players) => print_rejected(&players),
            Err(e) => print_player_error(&e),
        },
        MetaCommand::Forget(name) => match ctx.players.forget_rejected(&name).await {
            Ok(()) => println!("Forgot rejected player {name}"),
            Err(e) => print_player_error(&e),
        },
        MetaCommand::Quit => {}
    }
}

async fn restart(ctx: &CliContext) -> Result<(), ServerError> {
    match ctx.supervisor.stop().await {
        Ok(()) | Err(ServerError::AlreadyStopped) => {}
        Err(e) => return Err(e),
    }
    ctx.supervisor.start().await
}

/// Updates run in the background so the console keeps flowing while the
/// server is stopped and restarted.
fn spawn_update(ctx: &CliContext, version: String) {
    let updater = ctx.updater.clone();
    tokio::spawn(async move {
        match updater.update(&version).await {
            Ok(UpdateOutcome::UpToDate { build }) => {
                tracing::info!(%version, build, "Server already up to date");
            }
            Ok(UpdateOutcome::Updated { build, filename }) => {
                tracing::info!(%version, build, %filename, "Server updated");
            }
            Err(e) if e.is_conflict() => eprintln!("{e}"),
            // The pipeline already reported the failure on the console.
            Err(e) => tracing::warn!(%version, error = %e, "Update failed"),
        }
    });
}

async fn shutdown(ctx: &CliContext) -> Result<()> {
    if ctx.updater.is_updating() {
        tracing::warn!("Exiting while an update is in progress");
    }
    match ctx.supervisor.stop().await {
        Ok(()) | Err(ServerError::AlreadyStopped) => Ok(()),
        Err(e) => Err(CliError::from(e).into()),
    }
}

fn report(result: Result<(), ServerError>) {
    if let Err(e) = result {
        eprintln!("{e}");
    }
}

fn report_player(result: Result<(), PlayerError>) {
    match result {
        Ok(()) => println!("Done"),
        Err(e) => print_player_error(&e),
    }
}

fn show_entries(result: Result<Vec<PlayerFileEntry>, PlayerError>) {
    match result {
        Ok(entries) => print_entries(&entries),
        Err(e) => print_player_error(&e),
    }
}

fn print_player_error(err: &PlayerError) {
    eprintln!("{err}");
}
