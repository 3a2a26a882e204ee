//! Local CLI configuration commands

use anyhow::Result;

use crate::config::Config;
use crate::output::{print_info, print_json, print_success, OutputFormat};

pub fn show(config: &Config, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => print_json(config)?,
        OutputFormat::Table => {
            print_info(&format!("Config file: {}", Config::config_path()?.display()));
            println!(
                "api_url:                {}",
                config.api_url.as_deref().unwrap_or("(default)")
            );
            println!(
                "default_format:         {}",
                config
                    .default_format
                    .map(|f| format!("{:?}", f).to_lowercase())
                    .unwrap_or_else(|| "(default)".to_string())
            );
        }
    }
    Ok(())
}

/// Update the saved defaults; unset arguments keep their current value
pub fn set(
    mut config: Config,
    api_url: Option<String>,
    default_format: Option<OutputFormat>,
) -> Result<()> {
    if let Some(url) = api_url {
        url::Url::parse(&url).map_err(|e| anyhow::anyhow!("Invalid API URL '{}': {}", url, e))?;
        config.api_url = Some(url);
    }
    if default_format.is_some() {
        config.default_format = default_format;
    }

    let path = config.save()?;
    print_success(&format!("Saved {}", path.display()));
    Ok(())
}
