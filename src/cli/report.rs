use std::path::PathBuf;

use chrono::Datelike;
use colored::Colorize;
use tracing::debug;

use crate::aggregator::{load_base, BaseStore};
use crate::cli::{BaseArgs, ReportArgs};
use crate::error::{GiroError, Result};
use crate::models::{CategorySpec, SignFilter, YearFilter};
use crate::output::{print_artifacts, StagedWrites};
use crate::ranker::{build_ranking, render_ranking_table, title as ranking_title};
use crate::reports::{
    build_report, compose_title, document_header, render_csv, render_report_table, resolve_header,
};
use crate::settings::{load_settings, shellexpand_path, Settings};
use crate::taxonomy::{search_spec, CategoryKind, Taxonomy};

/// Everything one run needs, resolved from the command line and settings.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    pub account: String,
    pub year: YearFilter,
    pub sign: SignFilter,
    pub emit_files: bool,
    pub header: Option<String>,
    pub threshold: i64,
    pub search: Option<String>,
}

/// Account, input directory, year and sign; validated before any file is read.
pub(crate) fn resolve_base(
    args: &BaseArgs,
    settings: &Settings,
) -> Result<(String, PathBuf, YearFilter, SignFilter)> {
    let account = args
        .account
        .clone()
        .filter(|a| !a.is_empty())
        .or_else(|| Some(settings.account.clone()).filter(|a| !a.is_empty()))
        .ok_or(GiroError::MissingAccount)?;
    let input_dir = PathBuf::from(shellexpand_path(
        args.input_dir.as_deref().unwrap_or(&settings.data_dir),
    ));
    let year = YearFilter::new(args.year.unwrap_or_else(|| chrono::Local::now().year()))?;
    let sign: SignFilter = args.sign.parse()?;
    Ok((account, input_dir, year, sign))
}

impl RunContext {
    pub fn resolve(args: &ReportArgs, settings: &Settings) -> Result<Self> {
        let (account, input_dir, year, sign) = resolve_base(&args.base, settings)?;
        let output_dir = match &args.output_dir {
            Some(dir) => PathBuf::from(shellexpand_path(dir)),
            None => settings.output_path(),
        };
        let header = args
            .header
            .clone()
            .or_else(|| Some(settings.header.clone()))
            .filter(|h| !h.trim().is_empty());
        Ok(Self {
            input_dir,
            output_dir,
            account,
            year,
            sign,
            emit_files: args.emit_files,
            header,
            threshold: args.threshold.unwrap_or(settings.threshold),
            search: args.search.clone(),
        })
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RunOutcome {
    /// Printed, and written to `artifacts` in emit-files mode.
    Reported { title: String, artifacts: Vec<PathBuf> },
    /// Nothing matched; no output for this title.
    Empty { title: String },
}

pub fn run(args: ReportArgs) -> Result<()> {
    let settings = load_settings()?;
    let taxonomy = settings.taxonomy();
    let entry = taxonomy.get(&args.category)?;
    let ctx = RunContext::resolve(&args, &settings)?;

    if entry.kind == CategoryKind::Composite {
        return run_composite(&ctx, &taxonomy, &taxonomy.composite_ids());
    }
    let outcomes = run_category(&ctx, &taxonomy, &entry.id)?;
    print_outcomes(&outcomes);
    Ok(())
}

/// Run each category in turn. A failing category is reported and the rest still run.
pub fn run_composite(ctx: &RunContext, taxonomy: &Taxonomy, ids: &[String]) -> Result<()> {
    let mut failed = Vec::new();
    for id in ids {
        println!("{}", format!("== {id}").bold());
        match run_category(ctx, taxonomy, id) {
            Ok(outcomes) => print_outcomes(&outcomes),
            Err(e) => {
                eprintln!("{} {id} [{}]: {e}", "Fehler".red().bold(), e.stage());
                failed.push(id.clone());
            }
        }
    }
    if failed.is_empty() {
        Ok(())
    } else {
        Err(GiroError::CompositeFailed(failed))
    }
}

fn print_outcomes(outcomes: &[RunOutcome]) {
    for outcome in outcomes {
        if let RunOutcome::Empty { title } = outcome {
            println!("{} {title}: keine passenden Buchungen", "Info".yellow().bold());
        }
    }
}

/// The single-category pipeline: aggregate, match or rank, render, emit.
///
/// In emit-files mode the base file and every artifact of the category are committed together
/// at the end, so a failing category leaves no output behind.
pub fn run_category(ctx: &RunContext, taxonomy: &Taxonomy, id: &str) -> Result<Vec<RunOutcome>> {
    let entry = taxonomy.get(id)?;
    let (specs, sign): (Vec<CategorySpec>, SignFilter) = match entry.kind {
        CategoryKind::Match => (entry.compile()?, entry.sign.unwrap_or(ctx.sign)),
        CategoryKind::Search => (
            vec![search_spec(ctx.search.as_deref().unwrap_or(""))?],
            ctx.sign,
        ),
        CategoryKind::Threshold => return run_threshold(ctx).map(|o| vec![o]),
        CategoryKind::Composite => {
            return Err(GiroError::Other("`alles` cannot be nested".to_string()))
        }
    };

    let base = aggregate(ctx, sign)?;
    let mut staged = stage_base(ctx, &base)?;
    let mut outcomes = Vec::new();
    for spec in &specs {
        let outcome = match build_report(spec, &base, ctx.header.as_deref()) {
            None => RunOutcome::Empty {
                title: compose_title(&spec.title, ctx.year.year(), sign),
            },
            Some(report) => {
                let table = render_report_table(&report);
                let mut artifacts = Vec::new();
                if let Some(staged) = staged.as_mut() {
                    let csv = render_csv(&report)?;
                    let mut files = vec![("csv", csv.into_bytes()), ("txt", table.clone().into_bytes())];
                    #[cfg(feature = "pdf")]
                    files.push((
                        "pdf",
                        crate::pdf::render_table_document(&document_header(&report.header), &table)?,
                    ));
                    artifacts = staged.stage_artifacts(&report.title, &files)?;
                }
                println!("{table}");
                RunOutcome::Reported {
                    title: report.title,
                    artifacts,
                }
            }
        };
        outcomes.push(outcome);
    }
    commit(staged)?;
    Ok(outcomes)
}

fn run_threshold(ctx: &RunContext) -> Result<RunOutcome> {
    if ctx.threshold == 0 {
        return Err(GiroError::ZeroThreshold);
    }
    let base = aggregate(ctx, SignFilter::All)?;
    let Some(ranked) = build_ranking(&base, ctx.threshold)? else {
        return Ok(RunOutcome::Empty {
            title: ranking_title(ctx.threshold, ctx.year.year()),
        });
    };
    debug!("{} records beyond {}", ranked.records.len(), ranked.threshold);
    let table = render_ranking_table(&ranked);
    let mut staged = stage_base(ctx, &base)?;
    let mut artifacts = Vec::new();
    if let Some(staged) = staged.as_mut() {
        let mut files = vec![("txt", table.clone().into_bytes())];
        #[cfg(feature = "pdf")]
        {
            let header = resolve_header(&ranked.title, None, ctx.header.as_deref());
            files.push((
                "pdf",
                crate::pdf::render_table_document(&document_header(&header), &table)?,
            ));
        }
        artifacts = staged.stage_artifacts(&ranked.title, &files)?;
    }
    println!("{table}");
    commit(staged)?;
    Ok(RunOutcome::Reported {
        title: ranked.title,
        artifacts,
    })
}

/// Build the base set and announce its first and last line.
fn aggregate(ctx: &RunContext, sign: SignFilter) -> Result<BaseStore> {
    let base = load_base(&ctx.input_dir, &ctx.account, ctx.year.clone(), sign)?;
    debug!("Base {} built for {} records", base.file_name(), base.len());
    if let (Some(oldest), Some(newest)) = (base.oldest(), base.newest()) {
        println!("{} {}", "Aelteste:".dimmed(), oldest.fingerprint());
        println!("{} {}", "Neueste: ".dimmed(), newest.fingerprint());
    }
    Ok(base)
}

/// In emit-files mode, start a write set holding the base file.
fn stage_base(ctx: &RunContext, base: &BaseStore) -> Result<Option<StagedWrites>> {
    if !ctx.emit_files {
        return Ok(None);
    }
    let mut staged = StagedWrites::new(&ctx.output_dir)?;
    staged.stage(&base.file_name(), base.to_base_file().as_bytes())?;
    Ok(Some(staged))
}

fn commit(staged: Option<StagedWrites>) -> Result<()> {
    if let Some(staged) = staged {
        let written = staged.commit()?;
        print_artifacts(&written);
    }
    Ok(())
}
