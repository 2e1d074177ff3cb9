use colored::Colorize;

use crate::aggregator::{aggregate, discover};
use crate::cli::report::resolve_base;
use crate::cli::BaseArgs;
use crate::error::Result;
use crate::fmt::amount;
use crate::settings::load_settings;

/// Input files in ingestion order, then the base set they produce.
pub fn run(args: BaseArgs) -> Result<()> {
    let settings = load_settings()?;
    let (account, input_dir, year, sign) = resolve_base(&args, &settings)?;

    println!("Konto:      {account}");
    println!("Verzeichnis: {}", input_dir.display());
    println!("Jahr:       {}", year.year());
    println!("Vorzeichen: {sign}");

    let files = discover(&input_dir, &account)?;
    println!();
    println!("{}", "Dateien (neueste zuerst)".bold());
    for file in &files {
        println!("  {}  {} - {}", file.name(), file.from, file.to);
    }

    let base = aggregate(&files, &account, year, sign)?;
    println!();
    println!("Basisdatei:  {}", base.file_name());
    println!("Buchungen:   {}", base.len());
    println!("Summe:       {}", amount(base.sum()));
    if let Some(oldest) = base.oldest() {
        println!("Erste Zeile: {}", oldest.fingerprint());
    }
    if let Some(newest) = base.newest() {
        println!("Letzte Zeile: {}", newest.fingerprint());
    }
    Ok(())
}
