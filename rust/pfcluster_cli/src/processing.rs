use super::config::{
    InputConfig,
    OutputConfig,
};
use super::errors::CliError;
use indicatif::{
    ProgressBar,
    ProgressStyle,
};
use pfcluster::models::Component;
use pfcluster::{
    AnalysisSession,
    CatalogInput,
    Correction,
    CorrectionTable,
    EngineConfig,
    PtmCatalog,
    RecordStore,
    TheoreticalEntry,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fs::File;
use std::io::{
    BufReader,
    BufWriter,
};
use std::path::Path;
use std::time::{
    Duration,
    Instant,
};
use tracing::info;

fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T, CliError> {
    let file = File::open(path).map_err(|e| CliError::Io {
        source: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|e| CliError::ParseError {
        msg: e.to_string(),
        path: Some(path.to_string_lossy().to_string()),
    })
}

fn write_json<T: Serialize + ?Sized>(data: &T, output: &OutputConfig, name: &str) -> Result<(), CliError> {
    let path = output.directory.join(name);
    let io_err = |e: String| CliError::Io {
        source: e,
        path: Some(path.to_string_lossy().to_string()),
    };
    let file = File::create(&path).map_err(|e| io_err(e.to_string()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), data).map_err(|e| io_err(e.to_string()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

fn spinner() -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.green} [{elapsed_precise}] {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(120));
    bar
}

pub fn load_store(input: &InputConfig) -> Result<RecordStore, CliError> {
    let st = Instant::now();
    let components: Vec<Component> = read_json(&input.components)?;
    let mut store = RecordStore::new(components);
    info!(
        "Loading {} components from {} took: {:?}",
        store.len(),
        input.components.display(),
        st.elapsed()
    );
    if let Some(path) = input.corrections.as_ref() {
        let corrections: Vec<Correction> = read_json(path)?;
        info!("Applying {} correction factors", corrections.len());
        store.apply_corrections(&CorrectionTable::new(corrections));
    }
    Ok(store)
}

pub fn process(
    store: RecordStore,
    analysis: EngineConfig,
    input: &InputConfig,
    output: &OutputConfig,
) -> Result<(), CliError> {
    let start = Instant::now();
    let mut session = AnalysisSession::new(analysis, store)?;
    let bar = spinner();

    bar.set_message("Finding isotope pairs");
    let npairs = session.find_isotope_pairs().len();
    bar.set_message("Aggregating");
    let naggregated = session.aggregate().len();
    bar.set_message("Vetting candidates");
    let nvetted = session.vet().len();
    bar.set_message("Assigning quantification components");
    let nquant = session.assign_quantification();
    bar.finish_with_message(format!(
        "{} pairs, {} candidates, {} vetted, {} quantification components assigned",
        npairs, naggregated, nvetted, nquant
    ));

    write_json(session.pairs(), output, "isotope_pairs.json")?;
    write_json(session.candidates(), output, "candidates.json")?;
    write_json(session.remaining(), output, "remaining.json")?;

    match (input.catalog.as_ref(), input.theoreticals.as_ref()) {
        (Some(catalog_path), Some(theoreticals_path)) => {
            let catalog_input: CatalogInput = read_json(catalog_path)?;
            let theoreticals: Vec<TheoreticalEntry> = read_json(theoreticals_path)?;
            let catalog = PtmCatalog::build(&catalog_input, &theoreticals)?;

            let bar = spinner();
            bar.set_message("Resolving identities");
            let resolution = session.resolve_identities(&catalog, &theoreticals)?;
            bar.finish_with_message(format!(
                "{} of {} experimentals identified",
                resolution.report.identified_experimentals,
                session.candidates().len()
            ));
            write_json(&resolution.identities, output, "identities.json")?;
            write_json(&resolution.relations, output, "relations.json")?;
            write_json(&resolution.report, output, "resolution_report.json")?;
        }
        (None, None) => info!("No catalog given, skipping identity resolution"),
        _ => {
            return Err(CliError::Config {
                source: "Identity resolution needs both a catalog and theoreticals".to_string(),
            });
        }
    }

    println!("Finished processing in {:?}", start.elapsed());
    Ok(())
}
