//! Main car-side executable entry point.
//!
//! # Architecture
//!
//! The general execution methodology consists of:
//!
//!     - Initialise the session, logging and parameters
//!     - Initialise all modules
//!     - Start the object detector on its own thread
//!     - Main loop, at a fixed rate:
//!         - Override check from the latest detections
//!         - Frame acquisition
//!         - Line detection
//!         - Lateral control
//!         - Actuation
//!     - On interrupt, zero and stop the mechanisms
//!
//! # Modules
//!
//! All modules (e.g. `line_det`) shall meet the following requirements:
//!     1. Provide a public struct implementing the `util::module::State` trait.
//!

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc
};
use std::thread;
use std::time::Duration;
use color_eyre::{Report, eyre::{WrapErr, eyre}};
use log::{info, warn};
use structopt::StructOpt;

// Internal
use car_lib::{
    ctrl_loop::{CtrlLoop, RateScheduler},
    lat_ctrl::LatCtrl,
    line_det::LineDet,
    params::CarExecParams,
    sim::{SimCam, SimDetector, SimMech}
};
use comms_if::eqpt::det::DetHandoff;
use util::{
    archive::Archiver,
    host,
    module::State,
    logger::{logger_init, LevelFilter},
    session::Session
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, StructOpt)]
#[structopt(name = "car_exec", about = "Line following car executable")]
struct Opt {
    /// Stop after running for this many seconds
    #[structopt(long = "duration-s")]
    duration_s: Option<f64>,

    /// Log at debug level
    #[structopt(short, long)]
    verbose: bool
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Executable main function, entry point.
fn main() -> Result<(), Report> {
    color_eyre::install()?;

    let opt = Opt::from_args();

    // ---- EARLY INITIALISATION ----

    // Initialise session
    let session = Session::new(
        "car_exec",
        "sessions"
    ).wrap_err("Failed to create the session")?;

    // Initialise logger
    let min_level = if opt.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    logger_init(min_level, &session)
        .wrap_err("Failed to initialise logging")?;

    // Log information on this execution.
    info!("Picar Executable\n");
    info!(
        "Running on: {}",
        host::get_hostname().unwrap_or_else(|| String::from("unknown host"))
    );
    info!("Session directory: {:?}\n", session.session_root);

    // ---- LOAD PARAMETERS ----

    let exec_params: CarExecParams = util::params::load(
        "car_exec.toml"
    ).wrap_err("Could not load exec params")?;

    info!("Exec parameters loaded");

    // ---- INITIALISE MODULES ----

    info!("Initialising modules...");

    let mut line_det = LineDet::default();
    line_det.init("line_det.toml", &session)
        .wrap_err("Failed to initialise LineDet")?;
    info!("LineDet init complete");

    let mut lat_ctrl = LatCtrl::default();
    lat_ctrl.init("lat_ctrl.toml", &session)
        .wrap_err("Failed to initialise LatCtrl")?;
    info!("LatCtrl init complete");

    info!("Module initialisation complete\n");

    // ---- INITIALISE STOP HANDLING ----

    let stop = Arc::new(AtomicBool::new(false));

    {
        let stop = stop.clone();
        ctrlc::set_handler(move || {
            warn!("Interrupt received, stopping");
            stop.store(true, Ordering::SeqCst);
        }).wrap_err("Failed to set the interrupt handler")?;
    }

    let duration_handle = match opt.duration_s {
        Some(d) if d > 0.0 => {
            let end = Duration::try_from_secs_f64(d)
                .wrap_err_with(|| format!("Cannot limit execution to {} s", d))?;

            info!("Execution limited to {:.02} s", d);
            let stop = stop.clone();
            Some(thread::spawn(move || {
                let step = Duration::from_millis(50);
                let mut elapsed = Duration::from_secs(0);

                while elapsed < end && !stop.load(Ordering::SeqCst) {
                    thread::sleep(step);
                    elapsed += step;
                }

                stop.store(true, Ordering::SeqCst);
            }))
        },
        Some(d) => return Err(eyre!("Expected a positive duration, found {}", d)),
        None => None
    };

    // ---- INITIALISE EQUIPMENT ----

    let handoff = DetHandoff::new(exec_params.det_class_map);

    let sim_det = SimDetector::new(
        handoff.clone(),
        exec_params.sim.det_windows.clone(),
        exec_params.sim.det_period_s
    ).wrap_err("Failed to initialise the SimDetector")?;
    let det_handle = sim_det.spawn(stop.clone());
    info!("SimDetector started");

    let cam = SimCam::new(exec_params.sim.cam.clone());
    let mech = SimMech::new();

    let mut ctrl_loop = CtrlLoop::new(
        exec_params.ctrl_loop.clone(),
        cam,
        mech,
        handoff,
        line_det,
        lat_ctrl
    ).wrap_err("Failed to initialise the control loop")?;

    if exec_params.archive_enabled {
        ctrl_loop = ctrl_loop.with_archiver(
            Archiver::from_path(&session, "ctrl_loop/cycles.csv")
                .wrap_err("Failed to create the cycle archive")?
        );
        info!("Cycle archiving enabled");
    }

    let mut scheduler = RateScheduler::new(exec_params.cycle_frequency_hz)
        .wrap_err("Failed to initialise the cycle scheduler")?;

    // ---- MAIN LOOP ----

    info!("Begining main loop\n");

    let result = ctrl_loop.run(&mut scheduler, &stop);

    // ---- SHUTDOWN ----

    stop.store(true, Ordering::SeqCst);

    if det_handle.join().is_err() {
        warn!("SimDetector thread panicked");
    }
    if let Some(h) = duration_handle {
        if h.join().is_err() {
            warn!("Duration thread panicked");
        }
    }

    result.wrap_err("Control loop failed")?;

    info!(
        "{} cycles executed, {} commands sent",
        ctrl_loop.num_cycles(),
        ctrl_loop.mech().history().len()
    );
    info!("End of execution");

    Ok(())
}
