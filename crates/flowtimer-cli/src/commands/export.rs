use std::path::PathBuf;

use chrono::Local;
use clap::Args;
use flowtimer_core::{export_document, Config, SessionStore};
use tracing::info;

#[derive(Args)]
pub struct ExportArgs {
    /// File or directory to write to. Prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

pub fn run(args: ExportArgs, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let db = super::open_database(config)?;
    let sessions = SessionStore::load(&db);
    let doc = export_document(&sessions, &Local::now())?;

    match args.out {
        None => println!("{}", doc.contents),
        Some(out) => {
            let path = if out.is_dir() {
                out.join(&doc.file_name)
            } else {
                out
            };
            std::fs::write(&path, &doc.contents)?;
            info!(path = %path.display(), sessions = sessions.len(), "exported session data");
            println!("{}", path.display());
        }
    }
    Ok(())
}
