//! Build script rendering the `bleframe(1)` manual page from the CLI
//! definition.
//!
//! The page lands in `$OUT_DIR/man/bleframe.1`. Packagers can set
//! `BLEFRAME_MAN_DIR` to have a copy written somewhere stable as well.

use std::{env, fs, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

const PAGE: &str = "bleframe.1";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-env-changed=BLEFRAME_MAN_DIR");

    let out_dir = PathBuf::from(env::var_os("OUT_DIR").ok_or("OUT_DIR is not set")?).join("man");
    fs::create_dir_all(&out_dir)?;

    let cmd = cli::Cli::command().after_help(
        "The demo connects an initiator and an acceptor over an in-memory link. \
         Messages are split into MTU-sized packets, each prefixed with a marker \
         byte: 0x00 when more packets follow, 0x01 on the last one.",
    );
    let mut page: Vec<u8> = Vec::new();
    Man::new(cmd).render(&mut page)?;
    fs::write(out_dir.join(PAGE), &page)?;

    if let Some(dir) = env::var_os("BLEFRAME_MAN_DIR") {
        let dir = PathBuf::from(dir);
        fs::create_dir_all(&dir)?;
        fs::write(dir.join(PAGE), &page)?;
    }

    Ok(())
}
