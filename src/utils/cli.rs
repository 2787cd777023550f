use std::fmt::{Display, Formatter, Result};
use std::io;

#[derive(Debug, Clone, PartialEq)]
pub enum GUICommand {
    Usi,
    IsReady,
    NewGame,                                            // usinewgame
    Position(Option<String>, Vec<String>),              // position startpos|sfen <sfen> [moves ...]
    SetOption(String, String),                          // setoption name <name> value <value>
    Perft(String),                                      // go perft <depth>
    Search(Vec<String>),                                // go (with params)
    Display,                                            // display - print the board
    Eval,                                               // eval - print the static evaluation
    Quit,                                               // quit the program

    Invalid(String), // placeholder for invalid commands so we can pattern match
}

impl GUICommand {
    /// Reads one line from stdin; `None` once the input is closed.
    pub fn receive() -> Option<GUICommand> {
        let mut input = String::new();

        match io::stdin().read_line(&mut input) {
            Ok(0) => None,
            Ok(_) => Some(Self::parse(&input)),
            Err(error) => {
                log::warn!("Failed to read from stdin: {}", error);
                None
            }
        }
    }

    pub fn parse(input: &str) -> GUICommand {
        let parts = input.split_whitespace().collect::<Vec<_>>();

        match parts.as_slice() {
            ["usi"] => GUICommand::Usi,
            ["isready"] => GUICommand::IsReady,
            ["usinewgame"] => GUICommand::NewGame,
            ["position", "startpos"] => GUICommand::Position(None, Vec::new()),
            ["position", "startpos", "moves", moves @ ..] => {
                GUICommand::Position(None, moves.iter().map(|m| m.to_string()).collect())
            }
            ["position", "sfen", rest @ ..] if !rest.is_empty() => {
                let split = rest.iter().position(|&part| part == "moves");
                let (sfen, moves) = match split {
                    Some(index) => (&rest[..index], &rest[index + 1..]),
                    None => (rest, &[][..]),
                };

                GUICommand::Position(
                    Some(sfen.join(" ")),
                    moves.iter().map(|m| m.to_string()).collect(),
                )
            }
            ["setoption", "name", name_and_rest @ ..] if !name_and_rest.is_empty() => {
                Self::parse_setoption(name_and_rest)
            }
            ["go", "perft", depth] => GUICommand::Perft(depth.to_string()),
            ["go", params @ ..] => {
                GUICommand::Search(params.iter().map(|p| p.to_string()).collect())
            }
            ["display"] | ["d"] => GUICommand::Display,
            ["eval"] => GUICommand::Eval,
            ["quit"] => GUICommand::Quit,
            _ => GUICommand::Invalid(input.trim().to_string()),
        }
    }

    fn parse_setoption(parts: &[&str]) -> GUICommand {
        // Everything before "value" is the option name
        match parts.iter().position(|&part| part == "value") {
            Some(value_pos) => {
                let name = parts[..value_pos].join(" ");
                let value = parts[value_pos + 1..].join(" ");

                if !name.is_empty() && !value.is_empty() {
                    GUICommand::SetOption(name, value)
                } else {
                    GUICommand::Invalid(format!("setoption name {} value {}", name, value))
                }
            }
            None => GUICommand::Invalid(format!("setoption name {}", parts.join(" "))),
        }
    }
}

/// Replies sent back to the GUI.
pub enum BotCommand {
    Identify(String, String), // name, author
    UsiOk,
    ReadyOk,
    Info(String),
    BestMove(String),
}

impl Display for BotCommand {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result {
        match self {
            BotCommand::Identify(name, author) => {
                write!(f, "id name {}\nid author {}", name, author)
            }
            BotCommand::UsiOk => write!(f, "usiok"),
            BotCommand::ReadyOk => write!(f, "readyok"),
            BotCommand::Info(info) => write!(f, "info {}", info),
            BotCommand::BestMove(board_move) => write!(f, "bestmove {}", board_move),
        }
    }
}

pub fn respond(command: BotCommand) {
    println!("{}", command);
}
