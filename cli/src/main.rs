use std::fmt;
use std::io::{self, BufRead, Write};
use std::str::FromStr;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::Parser;
use connect4::{parse_history, Game, GameError, GameStatus, Player, Strategy, WIDTH};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Play Connect 4 in the terminal against MinMax, AlphaBeta or MCTS.
#[derive(Debug, Parser)]
#[command(name = "connect4", version)]
struct Args {
    /// Controller for red: `human`, or a strategy such as `minmax:5`,
    /// `alphabeta:8` or `mcts:100000`
    #[arg(long, env = "CONNECT4_RED", default_value = "human")]
    red: Controller,

    /// Controller for yellow
    #[arg(long, env = "CONNECT4_YELLOW", default_value = "alphabeta")]
    yellow: Controller,

    /// Side that moves first on an empty board
    #[arg(long, env = "CONNECT4_FIRST", default_value = "red")]
    first: Player,

    /// Start from a move history such as `R3Y3R4`
    #[arg(long, env = "CONNECT4_POSITION")]
    position: Option<String>,

    /// Number of games to play when neither side is human
    #[arg(long, env = "CONNECT4_GAMES", default_value_t = 1)]
    games: u32,

    /// Seed for the MCTS random source
    #[arg(long, env = "CONNECT4_SEED")]
    seed: Option<u64>,
}

impl Args {
    fn controller(&self, player: Player) -> &Controller {
        match player {
            Player::Red => &self.red,
            Player::Yellow => &self.yellow,
        }
    }

    fn is_interactive(&self) -> bool {
        self.red == Controller::Human || self.yellow == Controller::Human
    }

    fn new_game(&self) -> anyhow::Result<Game> {
        let moves = match &self.position {
            Some(position) => parse_history(position)?,
            None => Vec::new(),
        };
        if moves.is_empty() {
            return Ok(Game::new(self.first));
        }
        let game = Game::from_history(&moves)?;
        if game.is_over() {
            bail!("position {} is already finished", game.history_string());
        }
        Ok(game)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Controller {
    Human,
    Engine(Strategy),
}

impl FromStr for Controller {
    type Err = GameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("human") {
            Ok(Controller::Human)
        } else {
            s.parse().map(Controller::Engine)
        }
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct Tally {
    red: u32,
    yellow: u32,
    draws: u32,
}

impl Tally {
    fn record(&mut self, status: GameStatus) {
        match status {
            GameStatus::Won(Player::Red) => self.red += 1,
            GameStatus::Won(Player::Yellow) => self.yellow += 1,
            GameStatus::Draw => self.draws += 1,
            GameStatus::InProgress => {}
        }
    }
}

impl fmt::Display for Tally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "red wins: {}, yellow wins: {}, draws: {}", self.red, self.yellow, self.draws)
    }
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    let games = if args.is_interactive() { 1 } else { args.games.max(1) };
    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut output = io::stdout();
    let mut tally = Tally::default();

    for number in 1..=games {
        let game = args.new_game()?;
        let status = play_game(game, &args, &mut rng, &mut input, &mut output)?;
        info!(game = number, ?status, "game finished");
        tally.record(status);
    }
    if games > 1 {
        writeln!(output, "{tally}")?;
    }
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .try_init();
}

fn play_game<R: Rng, I: BufRead, O: Write>(
    mut game: Game,
    args: &Args,
    rng: &mut R,
    input: &mut I,
    output: &mut O,
) -> anyhow::Result<GameStatus> {
    let interactive = args.is_interactive();
    while !game.is_over() {
        let player = game.to_move();
        if interactive {
            print_board(&game, output)?;
        }
        let column = match args.controller(player) {
            Controller::Human => read_human_move(&game, input, output)?,
            Controller::Engine(strategy) => {
                let started = Instant::now();
                let column = strategy
                    .choose_move(game.board(), player, rng)
                    .with_context(|| format!("{strategy} found no move for {player}"))?;
                info!(
                    %player,
                    %strategy,
                    column,
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "engine move"
                );
                column
            }
        };
        game.play(column)?;
    }

    print_board(&game, output)?;
    match game.status() {
        GameStatus::Won(player) => writeln!(output, "{player} wins!")?,
        GameStatus::Draw => writeln!(output, "Draw!")?,
        GameStatus::InProgress => {}
    }
    writeln!(output, "moves: {}", game.history_string())?;
    Ok(game.status())
}

fn print_board<O: Write>(game: &Game, output: &mut O) -> io::Result<()> {
    let header: String = (1..=WIDTH).map(|c| char::from_digit(c as u32, 10).unwrap_or('?')).collect();
    writeln!(output)?;
    writeln!(output, "{header}")?;
    write!(output, "{}", game.board())
}

/// Prompts until the human enters a playable column (1-7).
fn read_human_move<I: BufRead, O: Write>(game: &Game, input: &mut I, output: &mut O) -> anyhow::Result<usize> {
    loop {
        write!(output, "{}, choose a column (1-{WIDTH}): ", game.to_move())?;
        output.flush()?;
        let mut line = String::new();
        if input.read_line(&mut line)? == 0 {
            bail!("input closed before {} moved", game.to_move());
        }
        match line.trim().parse::<usize>() {
            Ok(choice) if (1..=WIDTH).contains(&choice) && game.board().is_column_not_full(choice - 1) => {
                return Ok(choice - 1);
            }
            Ok(choice) if (1..=WIDTH).contains(&choice) => writeln!(output, "column {choice} is full")?,
            _ => writeln!(output, "please enter a number between 1 and {WIDTH}")?,
        }
    }
}
