use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::settings::{load_settings, save_settings, settings_path, shellexpand_path};

/// Write settings.json (keeping existing values) and create the data and report directories.
pub fn run(data_dir: Option<String>) -> Result<()> {
    let mut settings = load_settings()?;
    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    let data = PathBuf::from(shellexpand_path(&settings.data_dir));
    std::fs::create_dir_all(&data)?;
    std::fs::create_dir_all(settings.output_path())?;
    save_settings(&settings)?;

    println!("{}", "giro eingerichtet".green().bold());
    println!("Einstellungen: {}", settings_path().display());
    println!("Eingabe:       {}", data.display());
    println!("Berichte:      {}", settings.output_path().display());
    println!();
    println!("Kontoauszuege als giro-<konto>-<von>-<bis>.camtv2.csv in das Eingabeverzeichnis legen.");
    Ok(())
}
