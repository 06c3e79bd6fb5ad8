//! Drive a complete simulated mission from dispatch to delivery.

use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use ems_cli::sim::{run_responder, SimPlanner};
use ems_core::models::{GeoPoint, MissionPhase};
use ems_engine::{Config, MissionEngine, MissionSnapshot};
use ems_planner::{PlannerClient, RoutePlanner};

#[derive(Parser, Debug)]
#[command(name = "run_mission", about = "Run one emergency dispatch mission")]
struct Args {
    /// Patient latitude (default lands inside the Central Zone)
    #[arg(long, default_value_t = 12.9724)]
    patient_lat: f64,

    /// Patient longitude
    #[arg(long, default_value_t = 77.5940)]
    patient_lng: f64,

    /// Use the HTTP route-planning backend at this URL instead of the
    /// built-in fleet simulation
    #[arg(long)]
    planner_url: Option<String>,

    /// Disable the simulated clearance authority; every request runs into
    /// the SLA timeout
    #[arg(long)]
    no_responder: bool,

    /// Give up after this many seconds
    #[arg(long, default_value_t = 1800)]
    timeout_secs: u64,

    /// Print the final snapshot as JSON on stdout
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("run_mission=info".parse()?)
                .add_directive("ems_engine=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config = Config::from_env();
    let zones = ems_core::zones::ZoneMap::bengaluru();

    match args.planner_url.clone() {
        Some(url) => {
            let engine = MissionEngine::new(PlannerClient::new(url)?, zones, config);
            drive(engine, &args).await
        }
        None => {
            let engine = MissionEngine::new(SimPlanner::default(), zones, config);
            drive(engine, &args).await
        }
    }
}

async fn drive<P: RoutePlanner + 'static>(engine: MissionEngine<P>, args: &Args) -> Result<()> {
    let patient = GeoPoint::new(args.patient_lat, args.patient_lng);
    tracing::info!(lat = patient.lat, lng = patient.lng, "Dispatching for patient");

    engine.dispatch(patient).await?;

    if !args.no_responder {
        tokio::spawn(run_responder(engine.state()));
    }

    let mut rx = engine.subscribe();
    let deadline = tokio::time::Instant::now() + Duration::from_secs(args.timeout_secs);
    let mut last_phase = MissionPhase::Idle;

    loop {
        match tokio::time::timeout_at(deadline, rx.changed()).await {
            Err(_) => {
                tracing::warn!("Timed out waiting for mission completion");
                break;
            }
            Ok(Err(_)) => break,
            Ok(Ok(())) => {}
        }

        let snapshot = rx.borrow_and_update().clone();
        if snapshot.phase != last_phase {
            tracing::info!(
                phase = ?snapshot.phase,
                eta_min = ?snapshot.eta_minutes,
                zone = ?snapshot.active_zone,
                "Phase changed"
            );
            last_phase = snapshot.phase;
        }

        if snapshot.phase == MissionPhase::Done {
            summary(&snapshot);
            if args.json {
                println!("{}", serde_json::to_string_pretty(&snapshot)?);
            }
            break;
        }
    }

    Ok(())
}

fn summary(snapshot: &MissionSnapshot) {
    tracing::info!(
        zones_crossed = snapshot.zone_timeline.len(),
        clearance_requests = snapshot.clearance_history.len(),
        "Mission complete"
    );
    for entry in &snapshot.zone_timeline {
        tracing::info!(zone = %entry.zone, at = %entry.at, "Zone entered");
    }
    for request in &snapshot.clearance_history {
        tracing::info!(
            zone = %request.zone,
            status = ?request.status,
            response_secs = ?request.response_secs,
            "Clearance request"
        );
    }
}
