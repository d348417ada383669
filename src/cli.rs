//! clap-based command line interface.

use clap::{Parser, ValueEnum};
use log::LevelFilter;

/// Custom enum for log levels that can be used with clap's ValueEnum
#[derive(Debug, Clone, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Errors and warnings.
    Warn,
    /// Normal progress output.
    Info,
    /// Verbose diagnostics.
    Debug,
    /// Everything, including per-stage timings.
    Trace,
}

/// Convert our custom LogLevel enum to log crate's LevelFilter
impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Trace => LevelFilter::Trace,
        }
    }
}

/// Which integrator evaluates pixel radiance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IntegratorKind {
    /// Pure Monte Carlo path tracing.
    MonteCarlo,
    /// Photon-map-assisted rendering with caustics.
    PhotonMap,
}

/// Command line arguments structure using clap derive macros
#[derive(Parser)]
#[command(name = "photonpath")]
#[command(about = "An offline photon-mapped global illumination renderer")]
pub struct Args {
    /// Set the logging level (defaults to "info")
    #[arg(long, default_value = "info", help = "Set the logging level")]
    pub debug_level: LogLevel,

    /// Integrator used for pixel evaluation
    #[arg(
        long,
        short = 'i',
        value_enum,
        default_value = "photon-map",
        help = "Integrator used for pixel evaluation"
    )]
    pub integrator: IntegratorKind,

    /// Image width in pixels
    #[arg(long, default_value = "800", help = "Image width in pixels")]
    pub width: u32,

    /// Image height in pixels
    #[arg(long, default_value = "600", help = "Image height in pixels")]
    pub height: u32,

    /// Number of samples per pixel
    #[arg(long, short = 's', default_value = "100", help = "Number of samples per pixel")]
    pub samples_per_pixel: u32,

    /// Maximum recursion depth of both integrators
    #[arg(long, default_value = "5", help = "Maximum recursion depth")]
    pub max_depth: u32,

    /// Photons shot per light source when building the photon map
    #[arg(long, default_value = "100000", help = "Photons shot per light source")]
    pub photons: u32,

    /// Maximum bounces along one photon path
    #[arg(long, default_value = "5", help = "Maximum bounces along one photon path")]
    pub photon_depth: u32,

    /// Base random seed; identical seeds reproduce identical images
    #[arg(long, default_value = "0", help = "Base random seed")]
    pub seed: u64,

    /// Send image to TEV for real-time visualization
    #[arg(long, help = "Send image to TEV for real-time visualization")]
    pub tev: bool,

    /// TEV client IP address and port (automatically enables --tev)
    #[arg(long, help = "TEV client IP address and port (automatically enables --tev)")]
    pub tev_address: Option<String>,

    /// Output file path (.png for 8-bit with gamma correction, .exr for HDR linear)
    #[arg(
        short,
        long,
        default_value = "output.png",
        help = "Output file path (.png for 8-bit with gamma correction, .exr for HDR linear)"
    )]
    pub output: String,
}
