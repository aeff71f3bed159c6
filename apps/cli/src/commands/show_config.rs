//! `beacon config`: print what `beacon run` would use.

use crate::cli::ShowConfigArgs;
use crate::config::AppConfig;

pub fn execute(args: &ShowConfigArgs) -> anyhow::Result<()> {
    let config = AppConfig::load(&args.source)?;
    config.validate()?;
    print!("{}", toml::to_string_pretty(&config)?);
    Ok(())
}
