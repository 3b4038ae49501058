//! Init command implementation

use std::path::Path;

use anyhow::Result;

use edoquest::Config;

/// Write the default config file and create the database next to it
pub fn init_command(config_path: Option<&Path>, force: bool) -> Result<()> {
    let path = config_path
        .map(Path::to_path_buf)
        .unwrap_or_else(Config::global_config_path);

    Config::init_file(&path, force)?;
    println!("Created {}", path.display());

    let config = Config::from_file(&path)?;
    super::open_engine(&config)?;
    println!("Database ready at {}", config.db_path().display());
    Ok(())
}
