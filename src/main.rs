use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use diff_annotate::{
    AnalysisHistory, Annotator, Config, Diff, GitRepo, Mode, RenderOptions, Revision,
    annotate_text,
};
use std::io::Write;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "diff-annotate", version)]
#[command(about = "Render git changes as annotated text for review")]
struct Cli {
    /// More log output on stderr (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct Source {
    /// Commits to inspect, in order (defaults to HEAD)
    revisions: Vec<String>,

    /// Inspect staged changes
    #[arg(long, conflicts_with = "stdin")]
    staged: bool,

    /// Read a raw unified diff from stdin instead of a repository
    #[arg(long, conflicts_with = "revisions")]
    stdin: bool,

    /// Repository path
    #[arg(short = 'C', long = "repo", default_value = ".")]
    repo: PathBuf,
}

impl Source {
    fn revisions(&self) -> Vec<Revision> {
        let mut revisions: Vec<Revision> = self
            .revisions
            .iter()
            .map(|rev| Revision::Commit(rev.clone()))
            .collect();
        if self.staged {
            revisions.push(Revision::Staged);
        }
        if revisions.is_empty() {
            revisions.push(Revision::Commit("HEAD".to_string()));
        }
        revisions
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Render changes in full, hunks or supervisor mode
    Render {
        #[command(flatten)]
        source: Source,

        /// Output mode
        #[arg(short, long, value_enum)]
        mode: Option<Mode>,

        /// Byte budget per file in full mode
        #[arg(long)]
        max_file_bytes: Option<u64>,

        /// Only trust the diff's own binary markers
        #[arg(long)]
        no_detect_binary: bool,

        /// Emit files largest change first
        #[arg(long)]
        largest_first: bool,

        /// TOML configuration file
        #[arg(long)]
        config: Option<PathBuf>,
    },
    /// Change totals, per-extension counts and largest files
    Stats {
        #[command(flatten)]
        source: Source,
    },
    /// Print shell completions
    Completions { shell: Shell },
    /// Print the man page
    Man,
}

fn init_tracing(verbose: u8) {
    let filter = match verbose {
        0 => EnvFilter::try_from_env("DIFF_ANNOTATE_LOG")
            .unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        _ => EnvFilter::new("debug"),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut stdout = std::io::stdout().lock();
    match cli.command {
        Commands::Render {
            source,
            mode,
            max_file_bytes,
            no_detect_binary,
            largest_first,
            config,
        } => {
            let config = match &config {
                Some(path) => Config::load(path)?,
                None => Config::default(),
            };
            let options = RenderOptions {
                mode: mode.unwrap_or(config.render.mode),
                max_file_bytes: max_file_bytes.unwrap_or(config.render.max_file_bytes),
                detect_binary: config.render.detect_binary && !no_detect_binary,
            };
            options.validate()?;

            let mut history = AnalysisHistory::new(config.history_capacity);
            if source.stdin {
                let raw = std::io::read_to_string(std::io::stdin())?;
                write!(stdout, "{}", annotate_text(&raw, &options, largest_first, &mut history)?)?;
            } else {
                let annotator = Annotator::new(&source.repo, options)?.largest_first(largest_first);
                for (i, revision) in source.revisions().iter().enumerate() {
                    if i > 0 {
                        writeln!(stdout)?;
                    }
                    write!(stdout, "{}", annotator.annotate(revision, &mut history)?)?;
                }
            }

            info!(
                renders = history.len(),
                totals = %history.totals(),
                truncated = history.records().map(|r| r.truncated.len()).sum::<usize>(),
                "done"
            );
        }
        Commands::Stats { source } => {
            if source.stdin {
                let raw = std::io::read_to_string(std::io::stdin())?;
                write!(stdout, "{}", Diff::parse(&raw).stats())?;
            } else {
                let repo = GitRepo::new(&source.repo);
                for (i, revision) in source.revisions().iter().enumerate() {
                    if i > 0 {
                        writeln!(stdout)?;
                    }
                    let diff = Diff::parse(&repo.raw_diff(revision)?);
                    write!(stdout, "{}", diff.stats())?;
                }
            }
        }
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "diff-annotate", &mut stdout);
        }
        Commands::Man => {
            clap_mangen::Man::new(Cli::command()).render(&mut stdout)?;
        }
    }

    Ok(())
}
