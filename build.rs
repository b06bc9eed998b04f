//! Build script rendering the `oci-teardown` man pages.
//!
//! One page is written for the top-level command and one per subcommand
//! (`oci-teardown-plan.1`, `oci-teardown-teardown.1`) into `OUT_DIR`.

use std::env;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli/mod.rs"]
mod cli;

use cli::Cli;

fn render(command: clap::Command, out_dir: &Path, file_name: &str) -> io::Result<()> {
    let mut buffer = Vec::new();
    Man::new(command).render(&mut buffer)?;
    fs::write(out_dir.join(file_name), buffer)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut stdout = io::stdout();
    writeln!(stdout, "cargo:rerun-if-changed=build.rs")?;
    writeln!(stdout, "cargo:rerun-if-changed=src/cli/mod.rs")?;

    let out_dir = env::var_os("OUT_DIR")
        .map(PathBuf::from)
        .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, "OUT_DIR was not set"))?;

    let command = Cli::command();
    let name = command.get_name().to_owned();
    for subcommand in command.get_subcommands() {
        let file_name = format!("{name}-{}.1", subcommand.get_name());
        render(subcommand.clone(), &out_dir, &file_name)?;
    }
    render(command, &out_dir, &format!("{name}.1"))?;

    Ok(())
}
