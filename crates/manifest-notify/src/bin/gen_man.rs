use clap::CommandFactory;
use clap_mangen::Man;
use std::fs::File;
use std::path::Path;

use manifest_notify::cli::Cli;
use manifest_notify::message::Variant;

fn main() -> anyhow::Result<()> {
    let out_dir = std::env::args().nth(1).unwrap_or_else(|| ".".to_string());
    for name in [Variant::DevChannel, Variant::Plain].map(Variant::program_name) {
        let cmd = Cli::command().name(name);
        let path = Path::new(&out_dir).join(format!("{name}.1"));
        let mut file = File::create(&path)?;
        Man::new(cmd).render(&mut file)?;
        eprintln!("Generated man page at {}", path.display());
    }
    Ok(())
}
