//! Loader converter
//!
//! Rewrites a generator-produced model loader into one that uses interop
//! array types and derives from the byte loader base class.
//!
//! Run with: void_loader_convert --config convert.toml
//!       or: void_loader_convert <input> <output> --type <payload> --class <name> --bytes <file>
//!           [--namespace <ns>] [--report <report.json>]

use std::path::PathBuf;
use std::process::ExitCode;

use void_loader_convert::{convert_file, ConvertConfig, ConvertError, LoaderTarget, TypeTables};

const USAGE: &str = "usage: void_loader_convert --config <file.toml> [--report <file.json>]\n\
       void_loader_convert <input> <output> --type <payload> --class <name> --bytes <file> \
[--namespace <ns>] [--report <file.json>]";

/// Parsed command line
#[derive(Debug, Default, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    positional: Vec<PathBuf>,
    payload_type: Option<String>,
    class_name: Option<String>,
    bytes_file: Option<String>,
    namespace: Option<String>,
    report: Option<PathBuf>,
    help: bool,
}

impl Args {
    fn parse(args: impl IntoIterator<Item = String>) -> Result<Self, String> {
        let mut parsed = Self::default();
        let mut args = args.into_iter();

        while let Some(arg) = args.next() {
            let mut value = |flag: &str| {
                args.next()
                    .ok_or_else(|| format!("{} requires a value", flag))
            };

            match arg.as_str() {
                "--config" => parsed.config = Some(value(&arg)?.into()),
                "--type" => parsed.payload_type = Some(value(&arg)?),
                "--class" => parsed.class_name = Some(value(&arg)?),
                "--bytes" => parsed.bytes_file = Some(value(&arg)?),
                "--namespace" => parsed.namespace = Some(value(&arg)?),
                "--report" => parsed.report = Some(value(&arg)?.into()),
                "-h" | "--help" => parsed.help = true,
                flag if flag.starts_with("--") => return Err(format!("unknown flag {}", flag)),
                path => parsed.positional.push(path.into()),
            }
        }

        Ok(parsed)
    }

    /// Resolve into a conversion job
    fn into_config(self) -> Result<ConvertConfig, ConvertError> {
        if let Some(path) = self.config {
            return ConvertConfig::load(path);
        }

        let mut positional = self.positional.into_iter();
        let input = positional
            .next()
            .ok_or_else(|| ConvertError::MissingField("input".to_string()))?;
        let output = positional
            .next()
            .ok_or_else(|| ConvertError::MissingField("output".to_string()))?;

        let required = |value: Option<String>, flag: &str| {
            value.ok_or_else(|| ConvertError::MissingField(flag.to_string()))
        };
        let mut target = LoaderTarget::new(
            required(self.payload_type, "--type")?,
            required(self.class_name, "--class")?,
            required(self.bytes_file, "--bytes")?,
        );
        if let Some(namespace) = self.namespace {
            target = target.with_namespace(namespace);
        }

        Ok(ConvertConfig {
            target,
            tables: TypeTables::default(),
            input,
            output,
        })
    }
}

fn run(args: Args) -> Result<(), ConvertError> {
    let report_path = args.report.clone();
    let config = args.into_config()?;

    let report = convert_file(&config.input, &config.output, &config.target, &config.tables)?;

    let misses = report.misses().count();
    if misses > 0 {
        log::debug!("{} of {} rules matched nothing", misses, report.rules.len());
    }

    if let Some(path) = report_path {
        let json = serde_json::to_string_pretty(&report)?;
        std::fs::write(&path, json).map_err(|e| ConvertError::io(&path, e))?;
        log::info!("Wrote rule report to {}", path.display());
    }

    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("info")
    ).init();

    let args = match Args::parse(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(message) => {
            log::error!("{}", message);
            eprintln!("{}", USAGE);
            return ExitCode::FAILURE;
        }
    };

    if args.help {
        println!("{}", USAGE);
        return ExitCode::SUCCESS;
    }

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("Conversion failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
