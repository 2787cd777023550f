use clap::Parser;
use kogoma::controller::{GameController, MoveResultType};
use kogoma::engine::search::EngineKind;
use kogoma::engine::search::limits::SearchLimits;
use kogoma::game::BoardMoveExt;
use kogoma::utils::{BotCommand, GUICommand, respond};

#[derive(Parser)]
#[command(name = "kogoma")]
#[command(about = "Minishogi engine speaking USI", long_about = None)]
struct Cli {
    /// Search algorithm to play with
    #[arg(long, value_enum, default_value_t = EngineKind::AlphaBeta)]
    engine: EngineKind,
    /// Alpha-beta depth in plies
    #[arg(long)]
    depth: Option<usize>,
    /// MCTS iterations per root board move
    #[arg(long)]
    playouts: Option<usize>,
    /// Seed for reproducible tie-breaking and playouts
    #[arg(long)]
    seed: Option<u64>,
    /// Network weights used by the hybrid engine and MCTS leaves
    #[arg(long, value_name = "FILE")]
    eval_file: Option<String>,
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let mut limits = SearchLimits {
        seed: cli.seed,
        ..SearchLimits::default()
    };
    if let Some(depth) = cli.depth {
        limits.depth = depth;
    }
    if let Some(playouts) = cli.playouts {
        limits.playouts_per_move = playouts;
    }

    let mut controller = GameController::new(cli.engine, limits);

    if let Some(path) = cli.eval_file {
        controller.set_option("EvalFile", &path);
    }

    while let Some(input) = GUICommand::receive() {
        match input {
            GUICommand::Quit => break,
            GUICommand::Usi => {
                let name = format!("kogoma {}", env!("GIT_HASH"));
                let author = "the kogoma developers";

                respond(BotCommand::Identify(name, author.to_string()));
                controller.print_usi_options();
                respond(BotCommand::UsiOk);
            }
            GUICommand::IsReady => respond(BotCommand::ReadyOk),
            GUICommand::NewGame => controller.new_game(),
            GUICommand::Position(sfen, moves) => {
                if let Err(error) = controller.set_position(sfen.as_deref(), &moves) {
                    log::warn!("Invalid position: {}", error);
                    println!("info string {}", error);
                }
            }
            GUICommand::SetOption(name, value) => controller.set_option(&name, &value),
            GUICommand::Perft(depth) => match depth.parse::<usize>() {
                Ok(depth) => {
                    let breakdown = controller.perft(depth);

                    for (board_move, count) in &breakdown {
                        println!("{}: {}", board_move.unparse(), count);
                    }

                    let nodes: usize = breakdown.iter().map(|(_, count)| count).sum();
                    println!("\nNodes searched: {}", nodes);
                }
                Err(_) => log::warn!("Invalid perft depth: {}", depth),
            },
            GUICommand::Search(params) => {
                controller.best_move(params);
            }
            GUICommand::Display => controller.print(),
            GUICommand::Eval => controller.print_evaluation(),
            GUICommand::Invalid(line) if line.is_empty() => {}
            GUICommand::Invalid(line) => {
                // a bare move is applied directly, for playing by hand
                match controller.try_move_piece(&line) {
                    MoveResultType::Success => controller.print(),
                    MoveResultType::InvalidMove => println!("info string illegal move {}", line),
                    MoveResultType::InvalidNotation => {
                        log::warn!("Unknown command: {}", line);
                        println!("info string unknown command {}", line);
                    }
                }
            }
        }
    }
}
