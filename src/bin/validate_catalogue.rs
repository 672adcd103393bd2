//! Validate a catalogue CSV: every row's path exists and its filename re-parses to the same fields.
//! Run: cargo run --bin validate_catalogue -- [catalogue.csv]

use std::path::{Path, PathBuf};

use cordex_prep::catalogue::{Catalogue, CatalogueRow};
use cordex_prep::config::PipelineConfig;
use cordex_prep::filename::FilenameRecord;

fn row_mismatches(row: &CatalogueRow, record: &FilenameRecord) -> Vec<&'static str> {
    let checks = [
        ("variable", row.variable == record.variable),
        ("domain", row.domain == record.domain),
        ("driving_model", row.driving_model == record.driving_model),
        ("experiment", row.experiment == record.experiment),
        ("ensemble", row.ensemble == record.ensemble),
        ("institute", row.institute == record.institute),
        ("rcm_name", row.rcm_name == record.rcm_name),
        ("rcm_name_id", row.rcm_name_id == record.rcm_name_id()),
        ("rcm_version", row.rcm_version == record.rcm_version),
        ("time_frequency", row.time_frequency == record.frequency),
        ("date_range", row.date_range == record.date_range.to_string()),
    ];
    checks
        .into_iter()
        .filter(|(_, same)| !same)
        .map(|(column, _)| column)
        .collect()
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = PipelineConfig::load(None)?;
    let catalogue_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| config.catalogue.output.clone());

    if !catalogue_path.exists() {
        eprintln!("Catalogue not found: {}", catalogue_path.display());
        eprintln!("Build it first: cordex-prep catalogue --execute");
        std::process::exit(1);
    }

    let catalogue = Catalogue::read_csv(&catalogue_path)?;

    let mut ok = 0;
    let mut err = 0;
    for (line, row) in catalogue.rows().iter().enumerate() {
        let line = line + 2;
        let path = Path::new(&row.path);
        if !path.exists() {
            eprintln!("[line {}] path missing: {}", line, path.display());
            err += 1;
            continue;
        }
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(row.path.as_str());
        let record = match FilenameRecord::parse_with_institutes(name, &config.extra_institutes) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("[line {}] unparsable filename: {} - {}", line, name, e);
                err += 1;
                continue;
            }
        };
        let mismatches = row_mismatches(row, &record);
        if !mismatches.is_empty() {
            eprintln!("[line {}] {} disagrees on: {}", line, name, mismatches.join(", "));
            err += 1;
            continue;
        }
        ok += 1;
    }

    println!("Validated {} rows, {} ok, {} errors", catalogue.len(), ok, err);
    if err > 0 {
        std::process::exit(1);
    }
    Ok(())
}
