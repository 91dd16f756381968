use dentascan::{
    AnalysisError, AnalysisRequest, AnalyzerServiceBuilder, ImageLoader, PatientContext, Settings,
};
use std::path::{Path, PathBuf};
use tracing::{Level, error, info};

const USAGE: &str = "usage: dentascan <image>... [--patient <patient.json>] [--config <settings>]";

struct Args {
    images: Vec<PathBuf>,
    patient: Option<PathBuf>,
    config: Option<String>,
}

fn parse_args() -> Result<Args, String> {
    let mut args = std::env::args().skip(1);
    let mut parsed = Args {
        images: Vec::new(),
        patient: None,
        config: None,
    };

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--patient" => {
                parsed.patient = Some(args.next().ok_or("--patient needs a file")?.into())
            }
            "--config" => parsed.config = Some(args.next().ok_or("--config needs a file")?),
            "-h" | "--help" => return Err(USAGE.to_string()),
            _ => parsed.images.push(arg.into()),
        }
    }

    if parsed.images.is_empty() {
        return Err(USAGE.to_string());
    }
    Ok(parsed)
}

fn init_logging(level: Level) {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();
}

fn load_patient(path: &Path) -> Result<PatientContext, AnalysisError> {
    let json = std::fs::read_to_string(path)?;
    Ok(PatientContext::from_json(&json)?)
}

#[tokio::main]
async fn main() -> Result<(), AnalysisError> {
    let args = match parse_args() {
        Ok(args) => args,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(2);
        }
    };

    let settings = Settings::load(args.config.as_deref())?;
    init_logging(settings.log_level());

    let patient = args.patient.as_deref().map(load_patient).transpose()?;
    let loader = ImageLoader::new(&settings.loader);

    let mut requests = Vec::with_capacity(args.images.len());
    for path in &args.images {
        match loader.load_path(path) {
            Ok(loaded) => {
                let request = AnalysisRequest::new(loaded);
                requests.push(match &patient {
                    Some(patient) => request.with_patient(patient.clone()),
                    None => request,
                });
            }
            Err(e) => error!("Skipping {}: {}", path.display(), e),
        }
    }

    let analyzer = AnalyzerServiceBuilder::from_settings(&settings)?.build();
    info!("Analyzing {} image(s)", requests.len());
    let entries = analyzer.analyze_batch(requests).await;

    println!("{}", serde_json::to_string_pretty(&entries)?);
    Ok(())
}
