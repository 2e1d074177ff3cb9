use comfy_table::{Cell, Table};

use crate::error::Result;
use crate::settings::load_settings;
use crate::taxonomy::{CategoryKind, Taxonomy};

pub fn run() -> Result<()> {
    let taxonomy = load_settings()?.taxonomy();
    println!("Kategorien\n{}", category_table(&taxonomy));
    Ok(())
}

fn kind_label(kind: CategoryKind) -> &'static str {
    match kind {
        CategoryKind::Match => "Muster",
        CategoryKind::Threshold => "Schwelle",
        CategoryKind::Search => "Suche",
        CategoryKind::Composite => "Alle",
    }
}

pub fn category_table(taxonomy: &Taxonomy) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["ID", "Art", "Beschreibung", "Titel", "Muster"]);
    for entry in taxonomy.entries() {
        let titles: Vec<&str> = entry.specs.iter().map(|s| s.title.as_str()).collect();
        let patterns: Vec<&str> = entry.specs.iter().map(|s| s.pattern.as_str()).collect();
        table.add_row(vec![
            Cell::new(&entry.id),
            Cell::new(kind_label(entry.kind)),
            Cell::new(&entry.description),
            Cell::new(titles.join("\n")),
            Cell::new(patterns.join("\n")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_lists_every_entry() {
        let taxonomy = Taxonomy::build(&["Moosach".to_string()], &[]);
        let rendered = category_table(&taxonomy).to_string();
        for entry in taxonomy.entries() {
            assert!(rendered.contains(&entry.id), "missing {}", entry.id);
        }
        assert!(rendered.contains("Grundsteuer-Moosach"));
    }
}
