//! Build script rendering the `chatframe(1)` man page from the CLI
//! definition.

use std::{fs, path::PathBuf};

use clap::CommandFactory;
use clap_mangen::Man;

#[path = "src/cli.rs"]
mod cli;

const MAN_DIR: &str = "target/generated-man";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("cargo:rerun-if-changed=src/cli.rs");
    println!("cargo:rerun-if-changed=build.rs");

    let out_dir = PathBuf::from(MAN_DIR);
    fs::create_dir_all(&out_dir)?;

    let page = Man::new(cli::Cli::command())
        .title("CHATFRAME")
        .section("1")
        .manual("chatframe manual");
    let mut rendered = Vec::new();
    page.render(&mut rendered)?;
    fs::write(out_dir.join("chatframe.1"), rendered)?;

    Ok(())
}
