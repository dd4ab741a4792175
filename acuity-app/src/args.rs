use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser, Clone)]
#[clap(version, about = "RSVP visual-acuity session runner")]
pub struct AcuityArgs {
    /// Participant identifier recorded with every trial
    #[arg(short, long)]
    pub participant: String,

    /// JSON configuration file; defaults match the lab protocol when omitted
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output path for the JSON-Lines session record
    #[arg(short, long, default_value = "session.jsonl")]
    pub out: PathBuf,

    /// Serial device for hardware triggers, e.g. /dev/ttyUSB0
    #[arg(long)]
    pub trigger_port: Option<String>,

    #[arg(long, default_value_t = 115_200)]
    pub baud_rate: u32,

    /// RNG seed for reproducible streams; entropy-seeded when omitted
    #[arg(long)]
    pub seed: Option<u64>,
}
