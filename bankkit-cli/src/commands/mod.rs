pub mod replace;
pub mod unpack;

use std::path::Path;

use anyhow::{bail, Context};
use bankkit::prelude::*;

const SOUND_BANK_EXTENSIONS: [&str; 2] = ["bnk", "nbnk"];
const FILE_PACKAGE_EXTENSIONS: [&str; 2] = ["pck", "npck"];

/// Open the container at `path`, dispatching on its file extension.
pub fn open_container(path: &Path) -> anyhow::Result<Box<dyn Container>> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();

    if SOUND_BANK_EXTENSIONS.contains(&extension.as_str()) {
        let bank = SoundBank::open(path)
            .with_context(|| format!("could not parse SoundBank {}", path.display()))?;
        Ok(Box::new(bank))
    } else if FILE_PACKAGE_EXTENSIONS.contains(&extension.as_str()) {
        let package = FilePackage::open(path)
            .with_context(|| format!("could not parse File Package {}", path.display()))?;
        Ok(Box::new(package))
    } else {
        bail!(".{extension} is not a supported input file type");
    }
}
