//! SDRplay probe
//!
//! Reports which backend the bindings selected and, when the vendor service
//! answers, its API version and the attached receivers. Safe to run with no
//! hardware or vendor library installed: it then reports the stub backend
//! and why the library was not used.
//!
//! ```bash
//! sdrplay-probe
//! sdrplay-probe --config config/sdrplay.toml --json
//! SDRPLAY_API_PATH=/opt/sdrplay/lib/libsdrplay_api.so.3 sdrplay-probe
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sdrplay_binding::{
    config::{BindingConfig, DEFAULT_CONFIG_PATH},
    logging, Backend, BackendKind, BackendMode, DeviceDescriptor, ErrorCode, SdrplayApi,
};
use serde::Serialize;
use tracing::{debug, warn};

#[derive(Parser)]
#[command(name = "sdrplay-probe")]
#[command(about = "Report SDRplay API availability and attached receivers", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Load exactly this library instead of searching
    #[arg(long)]
    library: Option<PathBuf>,

    /// Skip the vendor library entirely
    #[arg(long)]
    stub: bool,

    /// Maximum number of devices to enumerate
    #[arg(long, default_value_t = 16)]
    max_devices: u32,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    show_config: bool,
}

/// Everything the probe found out.
#[derive(Debug, Serialize)]
struct ProbeReport {
    backend: BackendKind,
    library: Option<String>,
    fallback_reason: Option<String>,
    open: Outcome,
    api_version: Option<f32>,
    devices: Vec<DeviceDescriptor>,
}

/// Result of one API call, as shown to the user.
#[derive(Debug, Serialize)]
struct Outcome {
    ok: bool,
    code: String,
    message: String,
}

impl Outcome {
    fn from_result<T>(api: &SdrplayApi, result: &Result<T, ErrorCode>) -> Self {
        match result {
            Ok(_) => Self {
                ok: true,
                code: ErrorCode::Success.to_string(),
                message: api.error_string(ErrorCode::Success).into_owned(),
            },
            Err(code) => Self {
                ok: false,
                code: code.to_string(),
                message: api.error_string(*code).into_owned(),
            },
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = BindingConfig::load_from(&cli.config)
        .with_context(|| format!("Failed to load configuration from {}", cli.config.display()))?;
    if let Some(library) = cli.library {
        config.loader.library_path = Some(library);
    }
    if cli.stub {
        config.loader.backend = BackendMode::Stub;
    }

    if cli.show_config {
        let rendered =
            toml::to_string_pretty(&config).context("Failed to render configuration")?;
        print!("{rendered}");
        return Ok(());
    }

    logging::init_from_config(&config).map_err(anyhow::Error::msg)?;
    debug!(?config, "Effective configuration");

    let api = SdrplayApi::from_config(&config);
    let report = probe(&api, cli.max_devices);

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&report).context("Failed to encode report")?
        );
    } else {
        print_report(&report);
    }

    api.shutdown();
    Ok(())
}

fn probe(api: &SdrplayApi, max_devices: u32) -> ProbeReport {
    let backend = api.backend();
    let library = match backend.as_ref() {
        Backend::VendorLoaded(vendor) => Some(vendor.library_path().to_string()),
        Backend::StubOnly { .. } => None,
    };
    let fallback_reason = backend.fallback_reason().map(ToString::to_string);

    let opened = api.open();
    let open = Outcome::from_result(api, &opened);

    let mut api_version = None;
    let mut devices = Vec::new();
    if opened.is_ok() {
        api_version = api.api_version().ok();

        match api.lock_device_api() {
            Ok(()) => {
                match api.get_devices(max_devices) {
                    Ok(found) => devices = found,
                    Err(code) => warn!(error = %code, "Device enumeration failed"),
                }
                let _ = api.unlock_device_api();
            }
            Err(code) => warn!(error = %code, "Could not take the device API lock"),
        }
    }

    ProbeReport {
        backend: api.backend_kind(),
        library,
        fallback_reason,
        open,
        api_version,
        devices,
    }
}

fn print_report(report: &ProbeReport) {
    println!("Backend:     {}", report.backend);
    if let Some(library) = &report.library {
        println!("Library:     {library}");
    }
    if let Some(reason) = &report.fallback_reason {
        println!("Fallback:    {reason}");
    }
    if report.open.ok {
        println!("Open:        ok");
    } else {
        println!("Open:        {} ({})", report.open.code, report.open.message);
    }
    if let Some(version) = report.api_version {
        println!("API version: {version:.2}");
    }

    if report.devices.is_empty() {
        println!("Devices:     none");
        return;
    }
    println!("Devices:");
    for (i, dev) in report.devices.iter().enumerate() {
        let tuner = dev
            .tuner
            .map(|t| format!("{t:?}"))
            .unwrap_or_else(|| "-".to_string());
        println!(
            "  [{i}] {:<10} serial={} tuner={} valid={}",
            dev.model.to_string(),
            dev.serial,
            tuner,
            dev.valid
        );
    }
}
