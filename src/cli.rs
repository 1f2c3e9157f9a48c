use clap::{Parser, Subcommand};

use crate::alerts::AlertFrequency;
use crate::constants::{
    DEFAULT_API_BASE_URL, DEFAULT_CASES_URL, DEFAULT_HOSPITAL_LIMIT, DEFAULT_OVERPASS_URL,
    DEFAULT_SEARCH_RADIUS_M,
};
use crate::heatmap::DEFAULT_YEAR;
use crate::prediction::Month;

const DEFAULT_DATA_DIR: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data");

#[derive(Parser, Debug)]
#[command(name = "denguewatch")]
#[command(about = "DengueWatch: case heatmap, nearby hospitals, outbreak alerts", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Serve the JSON API used by the web front-end.
    Serve(ServeArgs),
    /// List hospitals near a position, nearest first.
    Hospitals(HospitalsArgs),
    /// Print the heatmap markers for one year.
    Heatmap(HeatmapArgs),
    /// List locations the prediction service knows about.
    Locations(ApiArgs),
    /// Ask the prediction service for a monthly case estimate.
    Predict(PredictArgs),
    /// Subscribe to outbreak alerts.
    Subscribe(SubscribeArgs),
    /// Stop outbreak alerts for an email address.
    Unsubscribe(UnsubscribeArgs),
}

#[derive(clap::Args, Debug, Clone)]
pub struct DatasetArgs {
    /// Directory holding the downloaded case CSV.
    #[arg(long, default_value = DEFAULT_DATA_DIR)]
    pub data_dir: String,

    /// Use this case CSV instead of the one in the data directory.
    #[arg(long)]
    pub cases_file: Option<String>,

    /// Where to fetch the case CSV from when it is not on disk.
    #[arg(long, default_value = DEFAULT_CASES_URL)]
    pub cases_url: String,

    /// Do not download a missing case CSV; error instead.
    #[arg(long)]
    pub offline: bool,

    /// Re-download the case CSV even if it already exists.
    #[arg(long)]
    pub force_download: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ApiArgs {
    /// Base URL of the prediction and alert service.
    #[arg(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base: String,
}

#[derive(clap::Args, Debug, Clone)]
pub struct OverpassArgs {
    /// Overpass interpreter endpoint.
    #[arg(long, default_value = DEFAULT_OVERPASS_URL)]
    pub overpass_url: String,

    /// Search radius in metres.
    #[arg(long, default_value_t = DEFAULT_SEARCH_RADIUS_M)]
    pub radius_m: u32,
}

#[derive(clap::Args, Debug, Clone)]
pub struct ServeArgs {
    #[command(flatten)]
    pub dataset: DatasetArgs,

    #[command(flatten)]
    pub api: ApiArgs,

    #[command(flatten)]
    pub overpass: OverpassArgs,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HospitalsArgs {
    #[arg(long, allow_hyphen_values = true)]
    pub lat: f64,

    #[arg(long, allow_hyphen_values = true)]
    pub lon: f64,

    /// How many to print.
    #[arg(long, default_value_t = DEFAULT_HOSPITAL_LIMIT)]
    pub limit: usize,

    #[command(flatten)]
    pub overpass: OverpassArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct HeatmapArgs {
    #[arg(long, default_value_t = DEFAULT_YEAR)]
    pub year: i32,

    #[command(flatten)]
    pub dataset: DatasetArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct PredictArgs {
    #[arg(long)]
    pub location: String,

    /// Full month name, e.g. "July".
    #[arg(long)]
    pub month: Month,

    #[arg(long)]
    pub year: i32,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct SubscribeArgs {
    #[arg(long)]
    pub name: String,

    #[arg(long)]
    pub email: String,

    #[arg(long)]
    pub mobile: String,

    #[arg(long)]
    pub location: String,

    /// daily, weekly or monthly.
    #[arg(long, default_value_t = AlertFrequency::Weekly)]
    pub frequency: AlertFrequency,

    #[command(flatten)]
    pub api: ApiArgs,
}

#[derive(clap::Args, Debug, Clone)]
pub struct UnsubscribeArgs {
    #[arg(long)]
    pub email: String,

    #[command(flatten)]
    pub api: ApiArgs,
}
