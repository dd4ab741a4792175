mod args;
mod term;

use crate::args::AcuityArgs;
use crate::term::{TermGuard, TermInput, TermRenderer};
use acuity_experiment::{BlockScheduler, ExperimentConfig, SessionRecord};
use acuity_timing::HighPrecisionTimer;
use acuity_trigger::{NullTrigger, SerialTrigger, TriggerPort};
use anyhow::Result;
use clap::Parser;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::time::Duration;

const TRIGGER_WRITE_TIMEOUT: Duration = Duration::from_millis(5);

fn main() -> Result<()> {
    env_logger::init();
    let args = AcuityArgs::parse();

    let mut config = match &args.config {
        Some(path) => ExperimentConfig::from_json_file(path)?,
        None => ExperimentConfig::default(),
    };
    config.participant = args.participant.clone();
    config.validate()?;

    let record = SessionRecord::create(&args.out)?;
    let timer = HighPrecisionTimer::new();
    let rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    let mut trigger: Box<dyn TriggerPort> = match &args.trigger_port {
        Some(path) => match SerialTrigger::open(path, args.baud_rate, TRIGGER_WRITE_TIMEOUT) {
            Ok(port) => {
                info!("trigger port {path} opened at {} baud", args.baud_rate);
                Box::new(port)
            }
            Err(err) => {
                warn!("trigger port unavailable ({err}); codes will be simulated");
                Box::new(NullTrigger)
            }
        },
        None => Box::new(NullTrigger),
    };

    let mut scheduler = BlockScheduler::new(config, record, timer.clone(), rng)?;
    let cancel = scheduler.cancel_token();
    let mut renderer = TermRenderer::new(timer.clone());
    let mut input = TermInput::new(timer, cancel);

    let guard = TermGuard::new()?;
    let outcome = scheduler.run(&mut renderer, &mut input, trigger.as_mut());
    drop(guard);

    let summary = outcome?;
    println!("{}", serde_json::to_string_pretty(&summary)?);
    info!("session record written to {}", args.out.display());
    Ok(())
}
