//! Replace wems from a directory of numbered files and write the rebuilt
//! container.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::rc::Rc;

use anyhow::{bail, Context};
use bankkit::prelude::*;
use tracing::warn;
use walkdir::WalkDir;

pub fn execute(container: &mut dyn Container, target: &Path, output: &Path) -> anyhow::Result<()> {
    let replacements = collect_replacements(container, target)?;
    container.replace_wems(replacements)?;

    let file = File::create(output)
        .with_context(|| format!("could not create output file {}", output.display()))?;
    let mut sink = BufWriter::new(file);
    let total = container
        .write_to(&mut sink)
        .context("could not write output to file")?;
    sink.flush()?;

    println!("Successfully replaced! Output file written to: {}", output.display());
    println!("Wrote {total} bytes in total");
    Ok(())
}

/// Build replacement requests from the numbered wem files in `target`. A
/// file's stem names the 1-based index of the wem it replaces; anything that
/// is not a numbered in-range `.wem` is skipped with a warning.
fn collect_replacements(
    container: &dyn Container,
    target: &Path,
) -> anyhow::Result<Vec<ReplacementWem>> {
    let wem_count = container.wems().len();
    let mut replacements = Vec::new();
    let mut names = Vec::new();

    for entry in WalkDir::new(target).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry =
            entry.with_context(|| format!("could not open target directory {}", target.display()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        let path = entry.path();

        if path.extension().and_then(|e| e.to_str()) != Some("wem") {
            warn!("ignoring {name}: it does not have a .wem file extension");
            continue;
        }
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let Ok(index) = stem.parse::<usize>() else {
            warn!("ignoring {name}: it does not have a valid integer name");
            continue;
        };
        // Wems are indexed internally from 0, but the file names start at 1.
        if index == 0 || index > wem_count {
            warn!("ignoring {name}: valid file names range from 1 to {wem_count}");
            continue;
        }

        let file = match File::open(path) {
            Ok(file) => file,
            Err(err) => {
                warn!("ignoring {name}: could not open file: {err}");
                continue;
            }
        };
        let length = file.metadata()?.len();
        replacements.push(ReplacementWem {
            source: Rc::new(file),
            wem_index: index - 1,
            length,
        });
        names.push(name);
    }

    if replacements.is_empty() {
        bail!("there are no replacement wems in {}", target.display());
    }
    println!(
        "Using {} replacement wem(s): {}",
        names.len(),
        names.join(", ")
    );
    Ok(replacements)
}
