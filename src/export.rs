use crate::enricher::EnrichmentOutcome;
use anyhow::{Context, Result};
use csv::Writer;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

const CSV_HEADERS: &[&str] = &[
    "email",
    "email_domain",
    "domain_type",
    "likely_person",
    "related_university",
    "university_domain",
    "related_company",
    "company_domain",
    "sector",
    "confidence_domain",
    "confidence_university",
    "confidence_company",
    "error",
];

/// One flat CSV row; failure rows leave everything but `email` and `error` blank
fn csv_row(outcome: &EnrichmentOutcome) -> Vec<String> {
    match outcome {
        EnrichmentOutcome::Record(r) => vec![
            r.email.clone(),
            r.email_domain.clone(),
            r.domain_type.clone(),
            r.likely_person.clone(),
            r.related_university.clone(),
            r.university_domain.clone(),
            r.related_company.clone(),
            r.company_domain.clone(),
            r.sector.to_string(),
            r.confidence.domain.to_string(),
            r.confidence.university.to_string(),
            r.confidence.company.to_string(),
            String::new(),
        ],
        EnrichmentOutcome::Failure(f) => {
            let mut row = vec![String::new(); CSV_HEADERS.len()];
            row[0] = f.email.clone();
            row[CSV_HEADERS.len() - 1] = f.error.clone();
            row
        }
    }
}

/// Header plus one row per outcome, to any writer (stdout included)
pub fn write_csv<W: Write>(outcomes: &[EnrichmentOutcome], writer: W) -> Result<()> {
    let mut wtr = Writer::from_writer(writer);

    wtr.write_record(CSV_HEADERS)?;
    for outcome in outcomes {
        wtr.write_record(csv_row(outcome))?;
    }

    wtr.flush()?;
    Ok(())
}

pub fn export_csv(outcomes: &[EnrichmentOutcome], output_path: &Path) -> Result<()> {
    debug!("Exporting {} records to CSV: {}", outcomes.len(), output_path.display());

    let file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    write_csv(outcomes, file)?;

    info!("Exported {} records to CSV: {}", outcomes.len(), output_path.display());
    Ok(())
}

pub fn export_json(outcomes: &[EnrichmentOutcome], output_path: &Path) -> Result<()> {
    debug!("Exporting {} records to JSON: {}", outcomes.len(), output_path.display());

    let failed = outcomes.iter().filter(|o| o.is_failure()).count();
    let json_output = JsonExport {
        summary: ExportSummary {
            total: outcomes.len(),
            enriched: outcomes.len() - failed,
            failed,
        },
        results: outcomes,
    };

    let json_string = serde_json::to_string_pretty(&json_output)?;
    let mut file = File::create(output_path)
        .with_context(|| format!("Failed to create {}", output_path.display()))?;
    file.write_all(json_string.as_bytes())?;

    info!("Exported {} records to JSON: {}", outcomes.len(), output_path.display());
    Ok(())
}

#[derive(serde::Serialize)]
struct JsonExport<'a> {
    summary: ExportSummary,
    results: &'a [EnrichmentOutcome],
}

#[derive(serde::Serialize)]
struct ExportSummary {
    total: usize,
    enriched: usize,
    failed: usize,
}

pub fn print_enrichment_summary(outcomes: &[EnrichmentOutcome]) {
    if outcomes.is_empty() {
        println!("No addresses processed.");
        return;
    }

    let mut by_sector: BTreeMap<String, usize> = BTreeMap::new();
    let mut failed = 0;
    for outcome in outcomes {
        match outcome {
            EnrichmentOutcome::Record(r) => *by_sector.entry(r.sector.to_string()).or_insert(0) += 1,
            EnrichmentOutcome::Failure(_) => failed += 1,
        }
    }

    println!("\n=== Enrichment Summary ===");
    println!("Addresses processed: {}", outcomes.len());
    println!("Enriched: {}", outcomes.len() - failed);
    println!("Invalid: {}", failed);
    for (sector, count) in &by_sector {
        println!("  {}: {}", sector, count);
    }
    println!("==========================\n");
}
