use std::env;
use std::process::ExitCode;

use tracing::{error, Level};

use mobility::{CacheKind, Engine, EngineConfig, EngineError, Game, GamePosition, MoveTimer};

const USAGE: &str = "usage: mobility (startpos | fen <FEN>) [moves <uci>...] \
[time <ms>] [inc <ms>] [start <ms>] [lru] [verbose]";

/// Parsed command line.
#[derive(Debug, PartialEq)]
struct Request {
    fen: Option<String>,
    moves: Vec<String>,
    remaining_ms: u64,
    increment_ms: u64,
    starting_ms: Option<u64>,
    lru: bool,
    verbose: bool,
}

impl Request {
    fn new() -> Self {
        Self {
            fen: None,
            moves: Vec::new(),
            remaining_ms: 60_000,
            increment_ms: 0,
            starting_ms: None,
            lru: false,
            verbose: false,
        }
    }
}

fn parse_args(tokens: &[&str]) -> Option<Request> {
    let mut req = Request::new();
    let mut i = 0;

    match tokens.first() {
        Some(&"startpos") => i += 1,
        Some(&"fen") => {
            i += 1;
            let mut fen_parts: Vec<&str> = Vec::new();
            while i < tokens.len() && fen_parts.len() < 6 && !is_keyword(tokens[i]) {
                fen_parts.push(tokens[i]);
                i += 1;
            }
            if fen_parts.len() < 4 {
                return None;
            }
            req.fen = Some(fen_parts.join(" "));
        }
        _ => return None,
    }

    while i < tokens.len() {
        match tokens[i] {
            "moves" => {
                while i + 1 < tokens.len() && !is_keyword(tokens[i + 1]) {
                    i += 1;
                    req.moves.push(tokens[i].to_string());
                }
            }
            "time" => {
                i += 1;
                req.remaining_ms = tokens.get(i)?.parse().ok()?;
            }
            "inc" => {
                i += 1;
                req.increment_ms = tokens.get(i)?.parse().ok()?;
            }
            "start" => {
                i += 1;
                req.starting_ms = Some(tokens.get(i)?.parse().ok()?);
            }
            "lru" => req.lru = true,
            "verbose" => req.verbose = true,
            _ => return None,
        }
        i += 1;
    }

    Some(req)
}

fn is_keyword(token: &str) -> bool {
    matches!(token, "moves" | "time" | "inc" | "start" | "lru" | "verbose")
}

fn run(req: &Request) -> Result<String, EngineError> {
    let mut game = match &req.fen {
        Some(fen) => Game::from_fen(fen)?,
        None => Game::startpos(),
    };
    for uci in &req.moves {
        game.play(uci)?;
    }

    let cache = if req.lru {
        CacheKind::Lru {
            capacity: mobility::types::DEFAULT_LRU_CAPACITY,
        }
    } else {
        CacheKind::default()
    };
    let mut engine = Engine::new(EngineConfig {
        diagnostics: req.verbose,
        ..EngineConfig::with_cache(cache)
    });

    let timer = MoveTimer::start(
        req.remaining_ms,
        req.increment_ms,
        req.starting_ms.unwrap_or(req.remaining_ms),
    );
    let mv = engine.decide(&mut game, &timer)?;
    Ok(game.move_name(&mv))
}

fn main() -> ExitCode {
    let args: Vec<String> = env::args().skip(1).collect();
    let tokens: Vec<&str> = args.iter().map(String::as_str).collect();

    let Some(req) = parse_args(&tokens) else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };

    tracing_subscriber::fmt()
        .with_max_level(if req.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    match run(&req) {
        Ok(name) => {
            println!("bestmove {}", name);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}
