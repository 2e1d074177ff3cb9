use std::path::PathBuf;

use colored::Colorize;

use crate::error::Result;
use crate::legacy::{convert_file, default_output};
use crate::settings::shellexpand_path;

pub fn run(file: &str, output: Option<&str>) -> Result<()> {
    let input = PathBuf::from(shellexpand_path(file));
    let output = match output {
        Some(o) => PathBuf::from(shellexpand_path(o)),
        None => default_output(&input),
    };
    let lines = convert_file(&input, &output)?;
    println!(
        "{} {} ({lines} Zeilen)",
        "Konvertiert:".green().bold(),
        output.display()
    );
    Ok(())
}
