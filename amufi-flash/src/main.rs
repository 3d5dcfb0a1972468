use clap::Parser;
use log::info;

use amufi_flash::errors::FlashError;
use amufi_flash::{cli, config, logging, pipeline, probe, ui};

fn main() -> anyhow::Result<()> {
    let cli = cli::Cli::parse();
    logging::init(cli.verbose);

    info!("🐚 amufi-flash");

    let config = config::load(cli.config.as_deref())?;

    // Query-only mode: report the raw device size and exit. This never runs
    // the safety gate and never mutates the device.
    if cli.size {
        let size = probe::raw_size(&cli.dev)?;
        println!("{}", size);
        info!("Device {} size: {} bytes", cli.dev.display(), size);
        return Ok(());
    }

    let hal = amufi_hal::LinuxHal::new();
    let mut confirm = ui::confirm;
    match pipeline::run(&hal, &cli, &config, &mut confirm) {
        Ok(()) => Ok(()),
        Err(FlashError::ConfirmationDeclined) => {
            info!("Aborted by operator; no changes made.");
            Ok(())
        }
        Err(err) => Err(err.into()),
    }
}
