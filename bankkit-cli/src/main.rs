use std::path::PathBuf;

use clap::{ArgGroup, Parser};

mod commands;

#[derive(Parser)]
#[command(name = "bankkit")]
#[command(about = "Unpack and rebuild Wwise SoundBank and File Package containers", long_about = None)]
#[command(group(ArgGroup::new("mode").required(true).args(["unpack", "replace"])))]
struct Cli {
    /// Unpack a .bnk or .pck into separate .wem files
    #[arg(short, long)]
    unpack: bool,

    /// Replace a set of .wem files in a source .bnk or .pck, writing a fully
    /// usable container with wems, offsets and lengths updated
    #[arg(short, long)]
    replace: bool,

    /// The source .bnk or .pck file
    #[arg(short, long)]
    filepath: PathBuf,

    /// The directory to write unpacked .wem files to, or the file to write
    /// the updated container to
    #[arg(short, long)]
    output: PathBuf,

    /// The directory holding numbered replacement .wem files; "1.wem"
    /// replaces the first wem. Replacements need no padding of their own
    #[arg(short, long, required_if_eq("replace", "true"))]
    target: Option<PathBuf>,

    /// Show the structure of the parsed SoundBank or File Package
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> anyhow::Result<()> {
    // Setup logging
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut container = commands::open_container(&cli.filepath)?;
    if cli.verbose {
        println!("{}", container.describe());
    }

    if cli.unpack {
        commands::unpack::execute(container.as_mut(), &cli.output)
    } else {
        let target = cli
            .target
            .as_deref()
            .expect("clap requires --target with --replace");
        commands::replace::execute(container.as_mut(), target, &cli.output)
    }
}
