//! tutorgate - terminal tutor chat
//!
//! Chats with the configured backends through the tutor router. Type
//! `/tutor` or `/buddy` to switch persona and `/quit` to leave.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Config: $XDG_CONFIG_HOME/tutorgate/config.toml (~/.config/tutorgate/config.toml)
//! - Logs: $XDG_STATE_HOME/tutorgate/tutorgate.YYYY-MM-DD.log (~/.local/state/tutorgate/)

use std::io::Write;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};
use tutorgate_core::session::TurnReply;
use tutorgate_core::{Config, Mode, TutorRouter, TutorSession};

#[derive(Parser)]
#[command(name = "tutorgate")]
#[command(about = "Chat with the Socratic tutor or the direct-answer buddy")]
#[command(version)]
struct Args {
    /// Starting persona: tutor (socratic) or buddy (direct)
    #[arg(short, long, default_value = "tutor")]
    mode: Mode,

    /// Send a single message, print the reply and exit
    #[arg(long, value_name = "TEXT")]
    once: Option<String>,

    /// Show which backend produced each reply
    #[arg(short, long)]
    verbose: bool,
}

enum Command {
    Quit,
    Switch(Mode),
    Unknown(String),
    Say(String),
}

fn parse_line(line: &str) -> Option<Command> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    let command = match line {
        "/quit" | "/exit" => Command::Quit,
        "/tutor" => Command::Switch(Mode::Socratic),
        "/buddy" => Command::Switch(Mode::Direct),
        cmd if cmd.starts_with('/') => Command::Unknown(cmd.to_string()),
        text => Command::Say(text.to_string()),
    };
    Some(command)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    let config = Config::load().context("failed to load configuration")?;

    let _log_guard =
        tutorgate_core::logging::init(&config.logging).context("failed to initialize logging")?;

    let router = TutorRouter::from_config(&config).context("failed to build backends")?;
    tracing::info!(
        socratic = ?router.backend_names(Mode::Socratic),
        direct = ?router.backend_names(Mode::Direct),
        "tutorgate starting"
    );

    let mut session = TutorSession::new(args.mode, router.escalation());

    if let Some(text) = args.once {
        let reply = session.submit(&router, &text).await?;
        print_reply(session.mode(), &reply, args.verbose);
        return Ok(());
    }

    println!("{}: {}", session.mode().display_name(), session.messages()[0].content);
    println!("(commands: /tutor, /buddy, /quit)");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("> ");
        std::io::stdout().flush().ok();

        let Some(line) = lines.next_line().await.context("failed to read input")? else {
            break;
        };

        match parse_line(&line) {
            None => continue,
            Some(Command::Quit) => break,
            Some(Command::Switch(mode)) => match session.switch_mode(mode) {
                Some(greeting) => println!("{}: {}", mode.display_name(), greeting.content),
                None => println!("Already talking to {}.", mode.display_name()),
            },
            Some(Command::Unknown(cmd)) => {
                println!("Unknown command {}. Try /tutor, /buddy or /quit.", cmd)
            }
            Some(Command::Say(text)) => match session.submit(&router, &text).await {
                Ok(reply) => print_reply(session.mode(), &reply, args.verbose),
                Err(e) => eprintln!("error: {}", e),
            },
        }
    }

    tracing::info!(session = %session.id(), "tutorgate shutting down");
    Ok(())
}

fn print_reply(mode: Mode, reply: &TurnReply, verbose: bool) {
    if verbose {
        println!(
            "{} [{}]: {}",
            mode.display_name(),
            reply.backend,
            reply.message.content
        );
    } else {
        println!("{}: {}", mode.display_name(), reply.message.content);
    }
}
