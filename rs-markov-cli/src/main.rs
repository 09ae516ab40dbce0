use std::error::Error;
use std::fmt::Display;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use log::debug;
use rs_markov_core::{GenerationInput, Generator, ModelResult, Policy};

const BANNER: &str = r"
,---.    ,---.    _______   .--.      .--.  .-_'''-.
|    \  /    |   /   __  \  |  |_     |  | '_( )_   \
|  ,  \/  ,  |  | ,_/  \__) | _( )_   |  ||(_ o _)|  '
|  |\_   /|  |,-./  )       |(_ o _)  |  |. (_,_)/___|
|  _( )_/ |  |\  '_ '`)     | (_,_) \ |  ||  |  .-----.
| (_ o _) |  | > (_)  )  __ |  |/    \|  |'  \  '-   .'
|  (_,_)  |  |(  .  .-'_/  )|  '  /\  `  | \  `-'`   |
|  |      |  | `-'`-'     / |    /  \    |  \        /
'--'      '--'   `._____.'  `---'    `---`   `'-...-'
";

const GENERIC_ERROR: &str =
    "Error: The start sequence is unknown, the training text is too short, or the context length is too large.";

/// Generation loop selectable from the command line.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    /// Run exactly `length` iterations, spaces allowed
    Unrestricted,
    /// Grow the word up to `length` characters, never appending a space
    NoSpace,
}

impl From<PolicyArg> for Policy {
    fn from(policy: PolicyArg) -> Self {
        match policy {
            PolicyArg::Unrestricted => Policy::Unrestricted,
            PolicyArg::NoSpace => Policy::NoSpace,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "rs-markov")]
#[command(about = "Character-level Markov chain word generator", long_about = None)]
struct Cli {
    /// Source text file for training (prompted if missing)
    #[arg(short, long, env = "MARKOV_SOURCE")]
    source: Option<PathBuf>,

    /// Context length for training, >= 1 (prompted if missing)
    #[arg(short, long, env = "MARKOV_CONTEXT_LENGTH")]
    context_length: Option<usize>,

    /// Probability threshold for character selection, 0 < P <= 1 (prompted if missing)
    #[arg(short, long, env = "MARKOV_PROBABILITY")]
    probability: Option<f64>,

    /// Generation loop
    #[arg(long, value_enum, default_value_t = PolicyArg::NoSpace, env = "MARKOV_POLICY")]
    policy: PolicyArg,

    /// Seed for reproducible words
    #[arg(long, env = "MARKOV_SEED")]
    seed: Option<u64>,

    /// Stop a stalled no-space generation after this many empty iterations (0 = never)
    #[arg(long, default_value_t = 10_000, env = "MARKOV_STALL_LIMIT")]
    stall_limit: usize,

    /// Start sequence for a single generation (requires --length)
    #[arg(long, requires = "length")]
    start: Option<String>,

    /// Desired word length for a single generation (requires --start)
    #[arg(long, requires = "start")]
    length: Option<usize>,

    /// Do not print the banner
    #[arg(long)]
    no_banner: bool,

    /// Verbose mode
    #[arg(short, long)]
    verbose: bool,
}

/// Writes `message` to `out` and reads one line, without its line terminator.
///
/// Returns `None` on end of input.
fn read_line<R: BufRead, W: Write>(reader: &mut R, out: &mut W, message: &str) -> io::Result<Option<String>> {
    write!(out, "{message}")?;
    out.flush()?;

    let mut line = String::new();
    if reader.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim_end_matches(['\n', '\r']).to_owned()))
}

/// Prompts for a value and parses it.
fn ask<R, W, T>(reader: &mut R, out: &mut W, message: &str) -> Result<T, Box<dyn Error>>
where
    R: BufRead,
    W: Write,
    T: FromStr,
    T::Err: Display,
{
    let line = read_line(reader, out, message)?.ok_or("unexpected end of input")?;
    line.trim()
        .parse::<T>()
        .map_err(|e| format!("invalid value {line:?}: {e}").into())
}

fn generate_word(
    generator: &Generator,
    input: &mut GenerationInput,
    start: &str,
    length: usize,
) -> ModelResult<String> {
    input.set_start(start)?;
    input.target_length = length;
    generator.generate(input)
}

/// Start / length loop until end of input, the transcript goes to `out`.
fn run_interactive<R: BufRead, W: Write>(
    reader: &mut R,
    out: &mut W,
    generator: &Generator,
    input: &mut GenerationInput,
) -> io::Result<()> {
    let context_length = generator.context_length();

    loop {
        let Some(start) = read_line(reader, out, &format!("Start sequence (length >= {context_length}): "))? else {
            break;
        };
        if start.chars().count() < context_length {
            writeln!(out, "Error: The start sequence must be at least {context_length} characters long.")?;
            continue;
        }

        let Some(length) = read_line(reader, out, "Desired word length to generate: ")? else {
            break;
        };
        let word = match length.trim().parse::<usize>() {
            Ok(length) => generate_word(generator, input, &start, length).map_err(|e| e.to_string()),
            Err(e) => Err(e.to_string()),
        };

        match word {
            Ok(word) => writeln!(out, "Generated: {word}\n")?,
            Err(e) => {
                debug!("generation failed: {e}");
                writeln!(out, "{GENERIC_ERROR}\n")?;
            }
        }
    }

    writeln!(out, "\nExiting the program.")?;
    Ok(())
}

fn init_logger(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level)).init();
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    if !cli.no_banner {
        println!("{BANNER}");
    }

    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut out = io::stdout();

    println!("Configuration:");
    let source = match cli.source {
        Some(source) => source,
        None => ask::<_, _, PathBuf>(&mut reader, &mut out, "Source text file for training: ")?,
    };
    let context_length = match cli.context_length {
        Some(context_length) => context_length,
        None => ask(&mut reader, &mut out, "Context length for training (E >= 1): ")?,
    };
    let probability = match cli.probability {
        Some(probability) => probability,
        None => ask(&mut reader, &mut out, "Probability threshold for character selection (0 < P <= 1): ")?,
    };
    println!("\nWord Generation:\n");

    let generator = match Generator::from_file(&source, context_length) {
        Ok(generator) => generator,
        Err(e) if e.is_not_found() => {
            println!("Error: The specified file was not found.");
            return Ok(());
        }
        Err(e) => {
            println!("An error occurred during analysis: {e}");
            return Ok(());
        }
    };
    debug!("table trained: {:?}", generator.table().stats());

    // Input settings shared by every generated word
    let mut input = generator.make_generation_input();
    input.set_probability(probability)?;
    input.policy = cli.policy.into();
    input.seed = cli.seed;
    input.stall_limit = (cli.stall_limit > 0).then_some(cli.stall_limit);

    if let (Some(start), Some(length)) = (&cli.start, cli.length) {
        let word = generate_word(&generator, &mut input, start, length)?;
        println!("Generated: {word}");
        return Ok(());
    }

    run_interactive(&mut reader, &mut out, &generator, &mut input)?;
    Ok(())
}
