//! Unpack every wem in a container to its own numbered file.

use std::fs::{self, File};
use std::io;
use std::path::Path;

use anyhow::Context;
use bankkit::prelude::*;
use bankkit::wwise::canonical_wem_name;

pub fn execute(container: &mut dyn Container, output: &Path) -> anyhow::Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("could not create output directory {}", output.display()))?;

    let count = container.wems().len();
    let mut total = 0u64;
    for i in 0..count {
        let name = canonical_wem_name(i, count);
        let mut file = File::create(output.join(&name))
            .with_context(|| format!("could not create wem file \"{name}\""))?;
        // Reading a wem yields its payload without trailing padding.
        let wem = &mut container.wems_mut()[i];
        total += io::copy(wem, &mut file)
            .with_context(|| format!("could not write wem file \"{name}\""))?;
    }

    println!("Successfully wrote {count} wem(s) to {}", output.display());
    println!("Wrote {total} bytes in total");
    Ok(())
}
