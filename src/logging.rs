use fern::colors::{Color, ColoredLevelConfig};
use log::Level;

/// Install the process-wide logger: colored level, local timestamp and target
/// on stderr. Fails if a logger is already installed.
pub fn init_logging(level: Level) -> anyhow::Result<()> {
	let colors = ColoredLevelConfig::new()
		.error(Color::Red)
		.warn(Color::Yellow)
		.info(Color::Green)
		.debug(Color::Cyan)
		.trace(Color::BrightBlack);

	fern::Dispatch::new()
		.format(move |out, message, record| {
			out.finish(format_args!(
				"{} {:5} [{}] {}",
				chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
				colors.color(record.level()),
				record.target(),
				message
			))
		})
		.level(level.to_level_filter())
		// Dependency chatter stays at warn unless we are tracing.
		.level_for("hyper", log::LevelFilter::Warn)
		.level_for("hyper_util", log::LevelFilter::Warn)
		.level_for("reqwest", log::LevelFilter::Warn)
		.chain(std::io::stderr())
		.apply()
		.map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

	Ok(())
}
