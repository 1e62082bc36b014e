use anyhow::Result;
use clap::Parser;
use tabgroups::cli::{self, Cli};
use tabgroups::{AppContext, diagnostics};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let settings = cli::load_settings(&cli)?;
    diagnostics::set_storage_root(&settings.storage_root());
    diagnostics::set_enabled(settings.diagnostics);

    log::debug!(
        "opening profile {} under {}",
        settings.profile,
        settings.storage_root().display()
    );
    let ctx = AppContext::open(settings);

    let result = cli::run(&ctx, cli.command);
    // Pending debounced writes are flushed on drop.
    drop(ctx);

    match result {
        Ok(report) => {
            print!("{report}");
            Ok(())
        }
        Err(e) => {
            eprintln!("tab-groups: error: {e:#}");
            std::process::exit(1);
        }
    }
}
