use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use freecell_solver::{
    board::Board,
    moves::{MoveRules, format_moves},
    solver::{
        DEFAULT_DEPTH_LIMIT, RevisitPolicy, SolveResult, Solver, SolverConfig, WalkConfig,
        WalkResult, random_walk,
    },
};
use rand::{SeedableRng, rngs::StdRng};
use std::io::{IsTerminal, Read, Write, stderr, stdin};
use std::path::PathBuf;
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};
use std::thread::JoinHandle;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve a deal with the backtracking search
    Solve {
        #[command(flatten)]
        source: DealSource,
        /// Maximum number of moves in a solution
        #[arg(short, long, default_value_t = DEFAULT_DEPTH_LIMIT, value_name = "NUM")]
        depth: i32,
        /// Expand a seen board again when it is reached with more depth left
        #[arg(long)]
        revisit_deeper: bool,
        /// Allow cards to be played back from the foundations
        #[arg(long)]
        from_foundations: bool,
        /// Allow cards to move between holding cells
        #[arg(long)]
        cell_to_cell: bool,
        /// Give up after visiting this many distinct boards
        #[arg(long, value_name = "NUM")]
        max_states: Option<usize>,
        /// Seconds between progress reports (shown with RUST_LOG=debug)
        #[arg(
            long,
            default_value_t = 1,
            value_name = "SECS",
            value_parser = clap::value_parser!(u64).range(1..)
        )]
        progress_secs: u64,
    },
    /// Try random moves until the deal is solved or attempts run out
    Walk {
        #[command(flatten)]
        source: DealSource,
        /// Number of attempts
        #[arg(short, long, default_value_t = 100, value_name = "NUM")]
        attempts: usize,
        /// Moves per attempt
        #[arg(short, long, default_value_t = 100, value_name = "NUM")]
        max_moves: usize,
        /// Seed for the move choices
        #[arg(long, value_name = "SEED")]
        walk_seed: Option<u64>,
    },
    /// Print a random deal in the loadable format
    Deal {
        /// Seed for a reproducible deal
        #[arg(short, long, value_name = "SEED")]
        seed: Option<u64>,
    },
    /// Print the board without solving
    Show {
        #[command(flatten)]
        source: DealSource,
    },
}

#[derive(Args)]
struct DealSource {
    /// Deal a random game from this seed instead of reading one
    #[arg(short, long, value_name = "SEED")]
    seed: Option<u64>,
    /// Path to a deal file; stdin is read when omitted
    file: Option<PathBuf>,
}

impl DealSource {
    fn load(&self) -> Result<Board> {
        let board = if let Some(file) = &self.file {
            let content = std::fs::read_to_string(file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            Board::parse(&content).context("Failed to parse board")?
        } else if let Some(seed) = self.seed {
            Board::new_from_seed(seed)
        } else if !stdin().is_terminal() {
            let mut content = String::new();
            stdin()
                .read_to_string(&mut content)
                .context("Failed to read from stdin")?;
            Board::parse(&content).context("Failed to parse board")?
        } else {
            bail!("No deal `file` or `--seed` provided.");
        };
        board.validate().context("Invalid deal")?;
        Ok(board)
    }
}

fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            source,
            depth,
            revisit_deeper,
            from_foundations,
            cell_to_cell,
            max_states,
            progress_secs,
        } => {
            let board = source.load()?;
            let config = SolverConfig {
                depth_limit: depth,
                rules: MoveRules {
                    from_foundations,
                    cell_to_cell,
                },
                revisit: if revisit_deeper {
                    RevisitPolicy::DeeperBudget
                } else {
                    RevisitPolicy::FirstVisit
                },
                progress_interval: Duration::from_secs(progress_secs),
                max_states,
            };
            do_solve(board, config)?;
        }
        Commands::Walk {
            source,
            attempts,
            max_moves,
            walk_seed,
        } => {
            let mut board = source.load()?;
            print!("{}", board.to_layout_string());
            let config = WalkConfig {
                attempts,
                max_moves,
                ..Default::default()
            };
            let mut rng = match walk_seed {
                Some(seed) => StdRng::seed_from_u64(seed),
                None => StdRng::from_os_rng(),
            };
            let WalkResult { solved, attempts } = random_walk(&mut board, &config, &mut rng);
            if !solved {
                bail!("No solution found after {attempts} attempts.");
            }
            println!("\n✓ Solved after {attempts} attempts\n");
            print!("{}", format_moves(board.history()));
        }
        Commands::Deal { seed } => {
            let board = match seed {
                Some(seed) => Board::new_from_seed(seed),
                None => Board::new_random(&mut rand::rng()),
            };
            print!("{}", board.to_deal_string());
        }
        Commands::Show { source } => {
            let board = source.load()?;
            print!("{}", board.to_layout_string());
        }
    }

    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::builder()
        .with_default_directive("freecell_solver=info".parse().expect("valid directive"))
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(stderr)
        .try_init();
}

fn do_solve(mut board: Board, config: SolverConfig) -> Result<()> {
    print!("{}", board.to_layout_string());
    let result = {
        let _spinner = Spinner::start("Solving the game...");
        Solver::new(config).search(&mut board)
    };
    let SolveResult {
        solved,
        exhausted,
        states,
        pruned,
        elapsed,
        ..
    } = result;
    let elapsed = format_elapsed(elapsed);
    if exhausted {
        bail!("Unable to solve the game; reached max states {states} (Elapsed: {elapsed}).");
    }
    if !solved {
        bail!(
            "No solution found within {} moves (Elapsed: {elapsed}, States: {states}, Pruned: {pruned}).",
            config.depth_limit
        );
    }
    println!(
        "\n✓ Solved! Moves: {}, Elapsed: {elapsed}, States: {states}, Pruned: {pruned}\n",
        board.move_count()
    );
    print!("{}", format_moves(board.history()));
    Ok(())
}

/// Animates a progress line on stderr until dropped. Does nothing when stderr
/// is not a terminal.
struct Spinner {
    running: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl Spinner {
    const FRAMES: [char; 4] = ['|', '/', '-', '\\'];
    const TICK: Duration = Duration::from_millis(100);

    fn start(message: &str) -> Self {
        let running = Arc::new(AtomicBool::new(true));
        let thread = stderr().is_terminal().then(|| {
            let running = Arc::clone(&running);
            let message = message.to_owned();
            std::thread::spawn(move || {
                // Lock per write so log lines can interleave.
                let emit = |text: &str| {
                    let mut err = stderr().lock();
                    let _ = err.write_all(text.as_bytes());
                    let _ = err.flush();
                };
                emit("\x1b[?25l");
                for frame in Self::FRAMES.into_iter().cycle() {
                    if !running.load(Ordering::Relaxed) {
                        break;
                    }
                    emit(&format!("\r{frame} {message}"));
                    std::thread::sleep(Self::TICK);
                }
                emit("\r\x1b[2K\r\x1b[?25h");
            })
        });
        Self { running, thread }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

/// Seconds with millisecond precision below a minute and a half, minutes after.
fn format_elapsed(elapsed: Duration) -> String {
    match elapsed.as_secs() {
        0..90 => format!("{:.3}s", elapsed.as_secs_f64()),
        secs => format!("{}m {}s", secs / 60, secs % 60),
    }
}
