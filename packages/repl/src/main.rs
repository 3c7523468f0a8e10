use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use recordfs_core::SplitPolicy;
use recordfs_repl::{EditModeChoice, Options};

/// recordfs - interactive shell over a path-addressed record store
#[derive(Parser, Debug)]
#[command(name = "recordfs")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Force vi editing mode
    #[arg(long)]
    vi: bool,

    /// Force emacs editing mode
    #[arg(long)]
    emacs: bool,

    /// How delimited record paths are split
    #[arg(long, value_enum, default_value_t = Split::Slash)]
    split: Split,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "warn")]
    log: String,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum Split {
    Slash,
    Dot,
    SlashOrDot,
    Whole,
}

impl From<Split> for SplitPolicy {
    fn from(split: Split) -> Self {
        match split {
            Split::Slash => SplitPolicy::Slash,
            Split::Dot => SplitPolicy::Dot,
            Split::SlashOrDot => SplitPolicy::SlashOrDot,
            Split::Whole => SplitPolicy::Whole,
        }
    }
}

fn main() {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let edit_mode = if args.vi {
        Some(EditModeChoice::Vi)
    } else if args.emacs {
        Some(EditModeChoice::Emacs)
    } else {
        None
    };

    let options = Options {
        edit_mode,
        split: args.split.into(),
    };

    if let Err(e) = recordfs_repl::run(options) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
