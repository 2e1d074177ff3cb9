//! The category table: identifiers mapped to one or more (title, pattern, header) triples.

use crate::error::{GiroError, Result};
use crate::models::{CategorySpec, SignFilter, SENTINEL_ALL, SENTINEL_INCOMING, SENTINEL_OUTGOING};
use crate::settings::CustomCategory;

pub const THRESHOLD_ID: &str = "schwelle";
pub const SEARCH_ID: &str = "suche";
pub const COMPOSITE_ID: &str = "alles";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Match,
    Threshold,
    Search,
    Composite,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SpecTemplate {
    pub title: String,
    pub pattern: String,
    pub header: Option<String>,
}

impl SpecTemplate {
    fn new(title: &str, pattern: &str, header: Option<&str>) -> Self {
        Self {
            title: title.to_string(),
            pattern: pattern.to_string(),
            header: header.map(str::to_string),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TaxonomyEntry {
    pub id: String,
    pub kind: CategoryKind,
    pub description: String,
    pub specs: Vec<SpecTemplate>,
    /// Overrides the requested sign (incoming/outgoing presets).
    pub sign: Option<SignFilter>,
}

impl TaxonomyEntry {
    fn matching(id: &str, description: &str, specs: Vec<SpecTemplate>) -> Self {
        Self {
            id: id.to_string(),
            kind: CategoryKind::Match,
            description: description.to_string(),
            specs,
            sign: None,
        }
    }

    fn special(id: &str, kind: CategoryKind, description: &str) -> Self {
        Self {
            id: id.to_string(),
            kind,
            description: description.to_string(),
            specs: Vec::new(),
            sign: None,
        }
    }

    pub fn compile(&self) -> Result<Vec<CategorySpec>> {
        self.specs
            .iter()
            .map(|t| CategorySpec::new(&t.title, &t.pattern, t.header.as_deref()))
            .collect()
    }
}

/// Ordered lookup table from category identifier to its rules.
#[derive(Debug, Clone)]
pub struct Taxonomy {
    entries: Vec<TaxonomyEntry>,
}

impl Taxonomy {
    pub fn build(properties: &[String], custom: &[CustomCategory]) -> Self {
        let mut entries = Vec::new();

        for place in properties {
            let title = slug(place);
            let re = regex::escape(&place.to_lowercase());
            entries.push(TaxonomyEntry::matching(
                &format!("immobilie-{}", title.to_lowercase()),
                &format!("Miete, Grundsteuer und Hausgeld {place}"),
                vec![
                    SpecTemplate::new(
                        &format!("Miete-{title}"),
                        &format!("miete.*{re}"),
                        Some(&format!("Mieteinnahmen {place}")),
                    ),
                    SpecTemplate::new(&format!("Grundsteuer-{title}"), &format!("grundsteuer.*{re}"), None),
                    SpecTemplate::new(
                        &format!("Hausgeld-{title}"),
                        &format!("(hausgeld|wohngeld).*{re}"),
                        None,
                    ),
                ],
            ));
        }

        let fixed: [(&str, &str, &str, &str, Option<&str>); 8] = [
            ("gehalt", "Gehalt und Lohn", "Gehalt", "gehalt|lohn|bezuege|bezüge", Some("Gehaltseingaenge")),
            ("pension", "Pension und Versorgungsbezuege", "Pension", "pension|versorgungsbezug|ruhegehalt", None),
            ("rente", "Gesetzliche Rente", "Rente", "rentenversicherung|rentenzahlung|drv bund|rente", Some("Gesetzliche Rente")),
            ("steuer", "Finanzamt und Steuern", "Steuer", "finanzamt|steuer", None),
            ("versicherung", "Versicherungen", "Versicherung", "versicherung|allianz|huk-coburg|debeka", None),
            ("depot", "Wertpapiere und Depot", "Depot", "depot|wertpapier|dividende|ertragsgutschrift|kapitalertrag", Some("Wertpapiere und Depot")),
            ("erbschaft", "Erbschaft und Schenkung", "Erbschaft-Schenkung", "erbschaft|erbe|nachlass|schenkung", None),
            ("arzt", "Arzt, Apotheke, Krankheit", "Arzt-Krankheit", "arzt|apotheke|klinik|krankenhaus|praxis|beihilfe|krankenkasse", None),
        ];
        for (id, description, title, pattern, header) in fixed {
            entries.push(TaxonomyEntry::matching(
                id,
                description,
                vec![SpecTemplate::new(title, pattern, header)],
            ));
        }

        let mut incoming = TaxonomyEntry::matching(
            "eingaenge",
            "Alle Eingaenge",
            vec![SpecTemplate::new("Alle-Eingaenge", SENTINEL_INCOMING, None)],
        );
        incoming.sign = Some(SignFilter::Positive);
        entries.push(incoming);

        let mut outgoing = TaxonomyEntry::matching(
            "ausgaenge",
            "Alle Ausgaenge",
            vec![SpecTemplate::new("Alle-Ausgaenge", SENTINEL_OUTGOING, None)],
        );
        outgoing.sign = Some(SignFilter::Negative);
        entries.push(outgoing);

        entries.push(TaxonomyEntry::matching(
            "summe",
            "Alle Buchungen mit Gesamtsumme",
            vec![SpecTemplate::new("Summe", SENTINEL_ALL, None)],
        ));

        for c in custom {
            entries.push(TaxonomyEntry::matching(
                &c.id.to_lowercase(),
                &c.title,
                vec![SpecTemplate::new(&c.title, &c.pattern, c.header.as_deref())],
            ));
        }

        entries.push(TaxonomyEntry::special(
            THRESHOLD_ID,
            CategoryKind::Threshold,
            "Buchungen ab Schwellwert (--threshold)",
        ));
        entries.push(TaxonomyEntry::special(
            SEARCH_ID,
            CategoryKind::Search,
            "Freitextsuche (--search)",
        ));
        entries.push(TaxonomyEntry::special(
            COMPOSITE_ID,
            CategoryKind::Composite,
            "Alle Kategorien nacheinander",
        ));

        Self { entries }
    }

    pub fn entries(&self) -> &[TaxonomyEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Result<&TaxonomyEntry> {
        self.entries
            .iter()
            .find(|e| e.id.eq_ignore_ascii_case(id))
            .ok_or_else(|| GiroError::UnknownCategory(id.to_string()))
    }

    /// Identifiers run by the composite category, in table order.
    pub fn composite_ids(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|e| matches!(e.kind, CategoryKind::Match | CategoryKind::Threshold))
            .map(|e| e.id.clone())
            .collect()
    }
}

/// Spec for a free-text search term.
pub fn search_spec(term: &str) -> Result<CategorySpec> {
    if term.trim().is_empty() {
        return Err(GiroError::MissingSearch);
    }
    CategorySpec::new(&format!("Suche-{}", slug(term)), term, None)
}

/// File-name safe title fragment: runs of anything but letters and digits become `-`.
pub fn slug(s: &str) -> String {
    let mut out = String::new();
    for c in s.trim().chars() {
        if c.is_alphanumeric() {
            out.push(c);
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}
