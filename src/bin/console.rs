use clap::Parser;
use env_logger::Env;
use maze_chase_core::driver::{spawn_tick_loop, DriverHandle};
use maze_chase_core::engine::{EngineOptions, GameEngine};
use maze_chase_core::protocol::{
    game_over_message, parse_command, state_message, welcome_message, Command,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Plays the classic maze over stdio: commands in, one JSON snapshot per tick out.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[arg(long, env = "MAZE_TICK_MS")]
    tick_ms: Option<u64>,
    #[arg(long, env = "MAZE_SEED")]
    seed: Option<u32>,
    /// Start a session right away instead of waiting for a start command.
    #[arg(long)]
    autostart: bool,
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();

    let engine = match GameEngine::classic(EngineOptions {
        tick_ms: cli.tick_ms,
        seed: cli.seed,
        ..EngineOptions::default()
    }) {
        Ok(engine) => engine,
        Err(error) => {
            eprintln!("[console] failed to build engine: {error}");
            std::process::exit(2);
        }
    };
    println!("{}", welcome_message(&engine.world_init()));
    eprintln!(
        "[console] tick {}ms, seed {:?}; type up/down/left/right, start, restart or quit",
        engine.config.tick_ms, engine.config.seed
    );

    let DriverHandle {
        commands,
        mut snapshots,
        task,
    } = spawn_tick_loop(engine);

    if cli.autostart && commands.send(Command::Start).await.is_err() {
        eprintln!("[console] tick loop exited before start");
        std::process::exit(1);
    }

    let input = commands.clone();
    tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            let Some(command) = parse_command(&line) else {
                eprintln!("[console] ignoring input: {}", line.trim());
                continue;
            };
            if input.send(command).await.is_err() || command == Command::Shutdown {
                return;
            }
        }
        let _ = input.send(Command::Shutdown).await;
    });
    drop(commands);

    let mut was_terminal = false;
    while snapshots.changed().await.is_ok() {
        let snapshot = snapshots.borrow_and_update().clone();
        println!("{}", state_message(&snapshot));
        let terminal = snapshot.phase.is_terminal();
        if terminal && !was_terminal {
            println!("{}", game_over_message(&snapshot));
        }
        was_terminal = terminal;
    }

    match task.await {
        Ok(summary) => eprintln!(
            "[console] stopped: {:?} with score {} after {} ticks",
            summary.outcome, summary.score, summary.stats.ticks
        ),
        Err(error) => {
            eprintln!("[console] tick loop failed: {error}");
            std::process::exit(1);
        }
    }
}
