use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::builder::BoolishValueParser;
use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;

use ldx::{ListBuilder, Options, SortBy};

/// Command-line arguments accepted by the `ldx` binary.
#[derive(Parser, Debug)]
#[command(
    name = "ldx",
    version,
    about = "List files breadth-first with kind filters, fuzzy ranking and slicing"
)]
struct Cli {
    #[arg(
        value_name = "PATH|[SLICE]",
        help = "Roots to list (default: .). Bracketed arguments such as [:10] are slice selectors"
    )]
    args: Vec<String>,

    #[arg(long = "from", value_name = "N", default_value_t = 0, help = "First depth to list")]
    from_depth: usize,
    #[arg(long = "to", value_name = "N", help = "Last depth to traverse (default: 0)")]
    to_depth: Option<usize>,
    #[arg(
        short = 'L',
        long = "depth",
        value_name = "SLICE",
        help = "Depth window as a slice expression, e.g. [1:3]"
    )]
    depth: Option<String>,
    #[arg(short, long, help = "Recurse without a depth bound")]
    recurse: bool,
    #[arg(short = 'z', long, help = "Expand .zip and .cbz files as directories")]
    archive: bool,
    #[arg(
        short = 'H',
        long,
        env = "LDX_NO_HIDE",
        action = ArgAction::SetTrue,
        value_parser = BoolishValueParser::new(),
        help = "Show dotfiles and other hidden names"
    )]
    no_hide: bool,
    #[arg(short = 'm', long, value_name = "N", help = "Read at most N entries per directory")]
    max_per_dir: Option<usize>,

    #[arg(short = 'f', long = "files", help = "Only files")]
    only_files: bool,
    #[arg(short = 'd', long = "dirs", help = "Only directories (wins over --files)")]
    only_dirs: bool,
    #[arg(
        short = 'i',
        long,
        value_name = "KIND",
        value_delimiter = ',',
        action = ArgAction::Append,
        help = "Keep kinds: image, video, audio, media, archive, zip, code, conf, docs, odev"
    )]
    include: Vec<String>,
    #[arg(
        short = 'x',
        long,
        value_name = "KIND",
        value_delimiter = ',',
        action = ArgAction::Append,
        help = "Drop kinds"
    )]
    exclude: Vec<String>,
    #[arg(
        short = 's',
        long,
        value_name = "TERM",
        action = ArgAction::Append,
        help = "Name search; prefix with = (exact), ~ (fuzzy), + (kind), - (negate)"
    )]
    search: Vec<String>,
    #[arg(long = "all", help = "Require every search term to match")]
    search_all: bool,
    #[arg(
        short = 'I',
        long,
        value_name = "SUBSTR",
        action = ArgAction::Append,
        help = "Drop paths containing SUBSTR"
    )]
    ignore: Vec<String>,

    #[arg(
        short = 'S',
        long,
        value_name = "KEY",
        help = "Sort by name, mod, size or creation (largest/newest first)"
    )]
    sort: Option<String>,
    #[arg(short, long, help = "Reverse the sort or ranking order")]
    ascending: bool,
    #[arg(long, help = "Shuffle the result")]
    shuffle: bool,
    #[arg(long, value_name = "N", requires = "shuffle", help = "Seed for --shuffle")]
    seed: Option<u64>,
    #[arg(long, value_name = "SLICE", action = ArgAction::Append, help = "Slice selector")]
    select: Vec<String>,
    #[arg(
        short = 'q',
        long,
        value_name = "TERM",
        action = ArgAction::Append,
        help = "Rank by fuzzy similarity, dropping non-matches"
    )]
    query: Vec<String>,

    #[arg(short = 'A', long, help = "Print absolute paths")]
    absolute: bool,
    #[arg(short = 'c', long, help = "Print only the number of results")]
    count: bool,
    #[arg(long, conflicts_with = "debug", help = "Only log errors")]
    quiet: bool,
    #[arg(short = 'D', long, help = "Log debug diagnostics to stderr")]
    debug: bool,
}

impl Cli {
    fn into_options(self) -> anyhow::Result<Options> {
        let (selectors, roots): (Vec<String>, Vec<String>) = self
            .args
            .into_iter()
            .partition(|arg| arg.starts_with('[') && arg.ends_with(']'));

        let sort = match self.sort.as_deref() {
            Some(word) => word.parse::<SortBy>()?,
            None => SortBy::None,
        };

        let to_depth = match (self.recurse, self.to_depth) {
            (true, _) => None,
            (false, Some(d)) => Some(d),
            (false, None) => Options::default().to_depth,
        };

        Ok(Options {
            roots: roots.into_iter().map(PathBuf::from).collect(),
            from_depth: self.from_depth,
            to_depth,
            depth_pattern: self.depth,
            archive: self.archive,
            no_hide: self.no_hide,
            max_per_dir: self.max_per_dir,
            only_files: self.only_files,
            only_dirs: self.only_dirs,
            include: self.include,
            exclude: self.exclude,
            search: self.search,
            search_all: self.search_all,
            ignore: self.ignore,
            sort,
            ascending: self.ascending,
            shuffle: self.shuffle,
            seed: self.seed,
            select: self.select.into_iter().chain(selectors).collect(),
            query: self.query,
            absolute: self.absolute,
        })
    }
}

fn init_tracing(debug: bool, quiet: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if quiet {
        EnvFilter::new("error")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.debug, cli.quiet);

    let count = cli.count;
    let opts = cli.into_options()?;
    let results = ListBuilder::from_options(opts)
        .run()
        .context("listing failed")?;

    tracing::debug!(
        files = results.stats.files,
        dirs = results.stats.dirs,
        elapsed_ms = results.stats.duration.as_millis() as u64,
        "done"
    );

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    if count {
        writeln!(out, "{}", results.len())?;
    } else {
        for element in &results.elements {
            writeln!(out, "{}", element.path.display())?;
        }
    }
    out.flush()?;
    Ok(())
}
