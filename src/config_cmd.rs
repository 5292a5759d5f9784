use anyhow::{Result, bail};
use log::info;

use crate::{
    cli::{ConfigArgs, ConfigCommands},
    config::PipelineConfig,
    settings,
};

pub fn execute(args: &ConfigArgs) -> Result<()> {
    match &args.command {
        ConfigCommands::Init(init) => {
            if init.output.exists() && !init.force {
                bail!(
                    "Refusing to overwrite existing file {:?} (pass --force to replace it)",
                    init.output
                );
            }
            PipelineConfig::default().save(&init.output)?;
            info!("Wrote default configuration to {:?}", init.output);
            Ok(())
        }
        ConfigCommands::Show(show) => {
            let config = settings::resolve_config(&show.source)?;
            config.validate()?;
            print!("{}", config.to_yaml_string()?);
            Ok(())
        }
    }
}
