//! Implementations for the CtrlLoop state structure

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use std::sync::atomic::{AtomicBool, Ordering};
use log::{debug, error, info, trace, warn};

// Internal
use super::{CtrlLoopError, CycleRecord, CycleScheduler, Params};
use crate::{
    lat_ctrl::{self, LatCtrl},
    line_det::{LineDet, LineDetOutput},
    ovr_mgr::{OvrMgr, OvrMode, OvrState}
};
use comms_if::eqpt::{
    cam::FrameSource,
    det::DetSource,
    mech::{DrvDir, MechSink}
};
use util::{
    archive::{ArchiveError, Archived, Archiver},
    module::State
};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// The control loop, owning the processing modules and the equipment it
/// commands.
pub struct CtrlLoop<C, M, D> {
    params: Params,

    cam: C,
    mech: M,
    det: D,

    line_det: LineDet,
    lat_ctrl: LatCtrl,
    ovr_mgr: OvrMgr,

    num_cycles: u64,
    loop_time_s: f64,

    num_consec_no_frame_cycles: u64,
    no_frame_limit_exceeded: bool,

    /// True while the line was found on the last cycle it was looked for
    line_visible: bool,

    record: CycleRecord,
    archiver: Option<Archiver>
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl<C, M, D> CtrlLoop<C, M, D>
where
    C: FrameSource,
    M: MechSink,
    D: DetSource
{
    /// Create a new control loop from initialised processing modules.
    pub fn new(
        params: Params,
        cam: C,
        mech: M,
        det: D,
        line_det: LineDet,
        lat_ctrl: LatCtrl
    ) -> Result<Self, CtrlLoopError> {
        params.validate()?;

        Ok(Self {
            params,
            cam,
            mech,
            det,
            line_det,
            lat_ctrl,
            ovr_mgr: OvrMgr::new(),
            num_cycles: 0,
            loop_time_s: 0.0,
            num_consec_no_frame_cycles: 0,
            no_frame_limit_exceeded: false,
            line_visible: true,
            record: CycleRecord::default(),
            archiver: None
        })
    }

    /// Archive a record of every cycle with the given archiver.
    pub fn with_archiver(mut self, archiver: Archiver) -> Self {
        self.archiver = Some(archiver);
        self
    }

    /// Run cycles until the stop flag is raised, then make the mechanisms
    /// safe.
    ///
    /// If a cycle fails the mechanisms are stopped and the error returned.
    pub fn run<S: CycleScheduler>(
        &mut self,
        scheduler: &mut S,
        stop: &AtomicBool
    ) -> Result<(), CtrlLoopError> {
        info!("Starting control loop");

        loop {
            if stop.load(Ordering::SeqCst) {
                break;
            }

            let dt_s = scheduler.wait_next_cycle();

            if stop.load(Ordering::SeqCst) {
                break;
            }

            if let Err(e) = self.step(dt_s) {
                error!("Control cycle {} failed: {}", self.num_cycles, e);
                if let Err(se) = self.mech.stop() {
                    error!("Could not stop the mechanisms: {}", se);
                }
                return Err(e);
            }
        }

        info!("Stop requested after {} cycles, making safe", self.num_cycles);

        self.make_safe()
    }

    /// Execute a single cycle given the time since the previous one.
    pub fn step(&mut self, dt_s: f64) -> Result<CycleRecord, CtrlLoopError> {
        if dt_s.is_finite() && dt_s > 0.0 {
            self.loop_time_s += dt_s;
        }

        let mut rec = CycleRecord {
            cycle: self.num_cycles,
            loop_time_s: self.loop_time_s,
            dt_s,
            ..CycleRecord::default()
        };

        if self.num_cycles < self.params.warmup_cycles {
            trace!("Warm-up cycle {}", self.num_cycles);
            rec.warmup = true;
        }
        else {
            self.proc_cycle(dt_s, &mut rec)?;
        }

        self.num_cycles += 1;
        self.record = rec.clone();

        if let Err(e) = self.write() {
            warn!("Could not archive cycle {}: {}", rec.cycle, e);
        }

        Ok(rec)
    }

    /// Zero the steering and drive then stop the mechanisms.
    ///
    /// The stop is always sent, even if zeroing fails.
    pub fn make_safe(&mut self) -> Result<(), CtrlLoopError> {
        let steer = self.mech.set_steer_deg(0.0);
        let drive = self.mech.set_drive(0.0, DrvDir::Forward);

        self.mech.stop()?;
        steer?;
        drive?;

        info!("Mechanisms made safe");

        Ok(())
    }

    pub fn num_cycles(&self) -> u64 {
        self.num_cycles
    }

    pub fn ovr_state(&self) -> OvrState {
        self.ovr_mgr.state()
    }

    pub fn cam(&self) -> &C {
        &self.cam
    }

    pub fn cam_mut(&mut self) -> &mut C {
        &mut self.cam
    }

    pub fn mech(&self) -> &M {
        &self.mech
    }

    pub fn lat_ctrl(&self) -> &LatCtrl {
        &self.lat_ctrl
    }

    /// Process a cycle after the warm-up.
    fn proc_cycle(&mut self, dt_s: f64, rec: &mut CycleRecord) -> Result<(), CtrlLoopError> {

        // ---- OVERRIDES ----

        let dets = self.det.latest();
        rec.mode = self.ovr_mgr.update(&dets);

        if rec.mode != OvrMode::Driving {
            self.mech.set_drive(0.0, DrvDir::Forward)?;
            rec.drive_power = Some(0.0);
            return Ok(());
        }

        // ---- LINE DETECTION ----

        let frame = self.cam.get_frame();
        rec.frame_acquired = frame.is_some();

        if rec.frame_acquired {
            if self.no_frame_limit_exceeded {
                info!("Camera frames received again");
            }
            self.num_consec_no_frame_cycles = 0;
            self.no_frame_limit_exceeded = false;
        }

        let (line, _) = self.line_det.proc(&frame)?;

        // ---- ACTUATION ----

        match line {
            LineDetOutput::NoFrame => {
                self.num_consec_no_frame_cycles += 1;

                if self.num_consec_no_frame_cycles > self.params.max_consec_no_frame_cycles {
                    if !self.no_frame_limit_exceeded {
                        warn!(
                            "No camera frame for {} consecutive cycles, stopping",
                            self.num_consec_no_frame_cycles
                        );
                        self.no_frame_limit_exceeded = true;
                    }
                    self.zero_demands(rec)?;
                }
                else {
                    debug!("No camera frame, holding previous demands");
                }
            },
            LineDetOutput::NoLine => {
                if self.line_visible {
                    info!("Line not detected");
                    self.line_visible = false;
                }

                self.lat_ctrl.line_lost();
                self.zero_demands(rec)?;
            },
            LineDetOutput::Line(l) => {
                if !self.line_visible {
                    info!("Line detected");
                    self.line_visible = true;
                }

                rec.line_centre_px = Some(l.line_centre_px);
                rec.error_px = Some(l.error_px);

                self.mech.set_drive(self.params.drive_power, DrvDir::Forward)?;
                rec.drive_power = Some(self.params.drive_power);

                let (dem, report) = self.lat_ctrl.proc(&lat_ctrl::InputData {
                    error_px: l.error_px as f64,
                    dt_s
                })?;

                self.mech.set_steer_deg(dem.cmd_deg)?;
                rec.raw_ctrl = Some(report.raw_ctrl);
                rec.steer_cmd_deg = Some(dem.cmd_deg);
            }
        }

        Ok(())
    }

    /// Command zero steering and drive.
    fn zero_demands(&mut self, rec: &mut CycleRecord) -> Result<(), CtrlLoopError> {
        self.mech.set_steer_deg(0.0)?;
        self.mech.set_drive(0.0, DrvDir::Forward)?;
        rec.steer_cmd_deg = Some(0.0);
        rec.drive_power = Some(0.0);

        Ok(())
    }
}

impl<C, M, D> Archived for CtrlLoop<C, M, D> {
    fn write(&mut self) -> Result<(), ArchiveError> {
        match self.archiver {
            Some(ref mut a) => a.serialise(&self.record),
            None => Ok(())
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::Arc;
    use comms_if::eqpt::{
        cam::CamImage,
        det::{DetClass, DetHandoff, DetClassMap, DetSet},
        mech::MechCmd
    };
    use crate::{
        lat_ctrl,
        line_det,
        sim::{LineProfile, SimCam, SimCamParams, SimMech, SimScheduler}
    };

    const DT: f64 = 1.0 / 30.0;

    /// Small frames with the detection band in the middle
    fn cam_params(line_profile: LineProfile) -> SimCamParams {
        SimCamParams {
            width: 640,
            height: 20,
            frame_rate_hz: 30.0,
            stripe_width_px: 20,
            drop_every_n_frames: 0,
            line_profile
        }
    }

    fn make_line_det() -> LineDet {
        LineDet::new(line_det::Params {
            band_y_offset_px: 5,
            band_height_px: 10,
            ..line_det::Params::default()
        }).unwrap()
    }

    fn ctrl_loop_with<C: FrameSource>(
        cam: C,
        mech: SimMech,
        lat_params: lat_ctrl::Params,
        warmup_cycles: u64
    ) -> (CtrlLoop<C, SimMech, DetHandoff>, DetHandoff) {
        let handoff = DetHandoff::new(DetClassMap::default());
        let params = Params {
            warmup_cycles,
            ..Params::default()
        };

        let ctrl_loop = CtrlLoop::new(
            params,
            cam,
            mech,
            handoff.clone(),
            make_line_det(),
            LatCtrl::new(lat_params).unwrap()
        ).unwrap();

        (ctrl_loop, handoff)
    }

    fn fixed_loop(centre_px: f64) -> (CtrlLoop<SimCam, SimMech, DetHandoff>, DetHandoff) {
        ctrl_loop_with(
            SimCam::new(cam_params(LineProfile::Fixed { centre_px })),
            SimMech::new(),
            lat_ctrl::Params::default(),
            0
        )
    }

    /// Camera which never produces a frame
    struct NoCam;

    impl FrameSource for NoCam {
        fn get_frame(&mut self) -> Option<CamImage> {
            None
        }
    }

    #[test]
    fn test_warmup() {
        let (mut ctrl_loop, _) = ctrl_loop_with(
            SimCam::new(cam_params(LineProfile::Fixed { centre_px: 320.0 })),
            SimMech::new(),
            lat_ctrl::Params::default(),
            11
        );

        for _ in 0..11 {
            let rec = ctrl_loop.step(DT).unwrap();
            assert!(rec.warmup);
        }
        assert!(ctrl_loop.mech().history().is_empty());
        assert_eq!(ctrl_loop.cam().num_requests(), 0);

        let rec = ctrl_loop.step(DT).unwrap();
        assert!(!rec.warmup);
        assert_eq!(rec.cycle, 11);
        assert!(!ctrl_loop.mech().history().is_empty());
    }

    #[test]
    fn test_line_following() {
        // Line left of centre
        let (mut ctrl_loop, _) = fixed_loop(200.0);
        let rec = ctrl_loop.step(DT).unwrap();

        assert_eq!(rec.mode, OvrMode::Driving);
        assert_eq!(rec.drive_power, Some(0.1));

        let error = rec.error_px.unwrap();
        assert!((119..=122).contains(&error), "error {}", error);

        // Steer left, which is a negative servo angle
        let steer = rec.steer_cmd_deg.unwrap();
        let expected = -(0.9 * error as f64 / 320.0 * 40.0);
        assert!((steer - expected).abs() < 1e-9);
        assert!(steer < 0.0);

        assert_eq!(ctrl_loop.mech().history(), &[
            MechCmd::Drive { power: 0.1, dir: DrvDir::Forward },
            MechCmd::SteerDeg(steer)
        ]);

        // Line right of centre
        let (mut ctrl_loop, _) = fixed_loop(450.0);
        let rec = ctrl_loop.step(DT).unwrap();
        assert!(rec.error_px.unwrap() < 0);
        assert!(rec.steer_cmd_deg.unwrap() > 0.0);
    }

    #[test]
    fn test_stop_sign() {
        let (mut ctrl_loop, handoff) = fixed_loop(200.0);

        handoff.publish_set(std::iter::once(DetClass::Stop).collect());

        for _ in 0..10 {
            let rec = ctrl_loop.step(DT).unwrap();
            assert_eq!(rec.mode, OvrMode::Stopped);
            assert_eq!(rec.drive_power, Some(0.0));
            assert_eq!(rec.error_px, None);
        }

        // Line detection never ran
        assert_eq!(ctrl_loop.cam().num_requests(), 0);
        assert!(ctrl_loop.mech().history().iter().all(|c| {
            *c == MechCmd::Drive { power: 0.0, dir: DrvDir::Forward }
        }));
        assert_eq!(ctrl_loop.mech().history().len(), 10);
    }

    #[test]
    fn test_park_sign() {
        let (mut ctrl_loop, handoff) = fixed_loop(200.0);

        handoff.publish_set(std::iter::once(DetClass::Park).collect());

        for i in 0..10 {
            let rec = ctrl_loop.step(DT).unwrap();
            assert_eq!(rec.mode, OvrMode::Parked);
            assert_eq!(rec.drive_power, Some(0.0));
            assert_eq!(rec.steer_cmd_deg, None);
            assert_eq!(ctrl_loop.cam().num_requests(), 0);
            assert_eq!(ctrl_loop.mech().history().len(), i + 1);
        }

        assert_eq!(ctrl_loop.ovr_state(), OvrState { stopped: false, parked: true });
        assert!(ctrl_loop.mech().history().iter().all(|c| {
            *c == MechCmd::Drive { power: 0.0, dir: DrvDir::Forward }
        }));
    }

    #[test]
    fn test_override_sequence() {
        let (mut ctrl_loop, handoff) = fixed_loop(320.0);

        handoff.publish_set(std::iter::once(DetClass::Stop).collect());
        ctrl_loop.step(DT).unwrap();
        assert_eq!(ctrl_loop.ovr_state(), OvrState { stopped: true, parked: false });

        handoff.publish_set(vec![DetClass::Park, DetClass::Stop].into_iter().collect());
        assert_eq!(ctrl_loop.step(DT).unwrap().mode, OvrMode::Parked);
        assert_eq!(ctrl_loop.ovr_state(), OvrState { stopped: true, parked: true });

        // Unrelated objects do not hold the car
        handoff.publish_set(std::iter::once(DetClass::Other).collect());
        let rec = ctrl_loop.step(DT).unwrap();
        assert_eq!(rec.mode, OvrMode::Driving);
        assert_eq!(rec.drive_power, Some(0.1));
        assert_eq!(ctrl_loop.ovr_state(), OvrState::default());
        assert_eq!(ctrl_loop.cam().num_requests(), 1);

        handoff.publish_set(DetSet::new());
        assert_eq!(ctrl_loop.step(DT).unwrap().mode, OvrMode::Driving);
    }

    #[test]
    fn test_no_line_freezes_pid() {
        let params = lat_ctrl::Params { k_i: 1.0, ..lat_ctrl::Params::default() };
        let (mut ctrl_loop, _) = ctrl_loop_with(
            SimCam::new(cam_params(LineProfile::Fixed { centre_px: 200.0 })),
            SimMech::new(),
            params,
            0
        );
        ctrl_loop.step(DT).unwrap();
        let before = ctrl_loop.lat_ctrl().pid_state().unwrap();
        assert!(before.integral > 0.0);

        // Line moved out of the frame
        ctrl_loop.cam_mut().set_line_profile(LineProfile::Fixed { centre_px: -1000.0 });

        for _ in 0..5 {
            let rec = ctrl_loop.step(DT).unwrap();
            assert!(rec.frame_acquired);
            assert_eq!(rec.error_px, None);
            assert_eq!(rec.steer_cmd_deg, Some(0.0));
            assert_eq!(rec.drive_power, Some(0.0));
        }
        assert_eq!(ctrl_loop.lat_ctrl().pid_state().unwrap(), before);
        assert_eq!(ctrl_loop.mech().history()[2..], [
            MechCmd::SteerDeg(0.0),
            MechCmd::Drive { power: 0.0, dir: DrvDir::Forward },
        ].repeat(5)[..]);

        // Integration resumes from the frozen state
        ctrl_loop.cam_mut().set_line_profile(LineProfile::Fixed { centre_px: 200.0 });
        ctrl_loop.step(DT).unwrap();
        let after = ctrl_loop.lat_ctrl().pid_state().unwrap();
        assert!((after.integral - 2.0 * before.integral).abs() < 1e-9);
    }

    #[test]
    fn test_no_frame_limit() {
        let (mut ctrl_loop, _) = ctrl_loop_with(
            NoCam,
            SimMech::new(),
            lat_ctrl::Params::default(),
            0
        );

        // Up to the limit the previous demands are held
        for _ in 0..5 {
            let rec = ctrl_loop.step(DT).unwrap();
            assert!(!rec.frame_acquired);
            assert_eq!(rec.drive_power, None);
        }
        assert!(ctrl_loop.mech().history().is_empty());

        // Then the car is stopped on every cycle
        for _ in 0..3 {
            let rec = ctrl_loop.step(DT).unwrap();
            assert_eq!(rec.drive_power, Some(0.0));
            assert_eq!(rec.steer_cmd_deg, Some(0.0));
        }
        assert_eq!(ctrl_loop.mech().history().len(), 6);
    }

    #[test]
    fn test_dropped_frames() {
        let mut cam = cam_params(LineProfile::Fixed { centre_px: 320.0 });
        cam.drop_every_n_frames = 2;

        let (mut ctrl_loop, _) = ctrl_loop_with(
            SimCam::new(cam),
            SimMech::new(),
            lat_ctrl::Params::default(),
            0
        );

        let recs: Vec<CycleRecord> = (0..6).map(|_| ctrl_loop.step(DT).unwrap()).collect();
        let acquired: Vec<bool> = recs.iter().map(|r| r.frame_acquired).collect();
        assert_eq!(acquired, vec![true, false, true, false, true, false]);

        // Demands held over the dropped frames
        assert!(recs.iter().filter(|r| !r.frame_acquired).all(|r| r.drive_power.is_none()));
        assert_eq!(ctrl_loop.mech().history().len(), 6);
    }

    #[test]
    fn test_termination_makes_safe() {
        let (mut ctrl_loop, _) = fixed_loop(250.0);
        let stop = Arc::new(AtomicBool::new(false));
        let mut sched = SimScheduler::new(DT).stop_after(10, stop.clone());

        ctrl_loop.run(&mut sched, &stop).unwrap();
        assert_eq!(ctrl_loop.num_cycles(), 10);

        let history = ctrl_loop.mech().history();
        let n = history.len();
        assert_eq!(history[n - 1], MechCmd::Stop);
        assert_eq!(history[n - 2], MechCmd::Drive { power: 0.0, dir: DrvDir::Forward });
        assert_eq!(history[n - 3], MechCmd::SteerDeg(0.0));
        assert_eq!(history.iter().filter(|c| **c == MechCmd::Stop).count(), 1);
    }

    #[test]
    fn test_actuator_failure() {
        let (mut ctrl_loop, _) = ctrl_loop_with(
            SimCam::new(cam_params(LineProfile::Fixed { centre_px: 250.0 })),
            SimMech::new().failing_on(5),
            lat_ctrl::Params::default(),
            0
        );
        let stop = Arc::new(AtomicBool::new(false));
        let mut sched = SimScheduler::new(DT).stop_after(100, stop.clone());

        let res = ctrl_loop.run(&mut sched, &stop);
        assert!(matches!(res, Err(CtrlLoopError::Mech(_))));

        // Two commands per cycle, the sixth command fails on the third cycle
        assert_eq!(ctrl_loop.num_cycles(), 2);
        assert_eq!(ctrl_loop.mech().history().last(), Some(&MechCmd::Stop));
        assert_eq!(ctrl_loop.mech().history().len(), 6);
    }

    /// Lag in samples maximising the cross-correlation of two signals.
    fn best_lag(x: &[f64], y: &[f64], max_lag: usize) -> usize {
        let mx = util::maths::mean(x).unwrap();
        let my = util::maths::mean(y).unwrap();

        (0..=max_lag)
            .map(|k| {
                let c: f64 = (0..x.len() - k).map(|i| (x[i] - mx) * (y[i + k] - my)).sum();
                (k, c)
            })
            .fold((0, f64::MIN), |best, (k, c)| if c > best.1 { (k, c) } else { best })
            .0
    }

    fn run_sine(lat_params: lat_ctrl::Params) -> Vec<CycleRecord> {
        let (mut ctrl_loop, _) = ctrl_loop_with(
            SimCam::new(cam_params(LineProfile::Sine {
                centre_px: 320.0,
                amplitude_px: 100.0,
                period_s: 2.0
            })),
            SimMech::new(),
            lat_params,
            0
        );

        let recs: Vec<CycleRecord> = (0..180)
            .map(|i| ctrl_loop.step(if i == 0 { 0.0 } else { DT }).unwrap())
            .collect();

        assert!(recs.iter().all(|r| r.error_px.is_some()));
        recs
    }

    fn errors_and_corrections(recs: &[CycleRecord]) -> (Vec<f64>, Vec<f64>) {
        let errors = recs.iter().map(|r| r.error_px.unwrap() as f64).collect();

        // Undo the servo sign inversion
        let corrections = recs.iter().map(|r| -r.steer_cmd_deg.unwrap()).collect();

        (errors, corrections)
    }

    #[test]
    fn test_sine_proportional_no_lag() {
        let recs = run_sine(lat_ctrl::Params::default());
        let (errors, corrections) = errors_and_corrections(&recs);

        assert!(corrections.iter().all(|c| c.abs() <= 35.0));
        assert_eq!(best_lag(&errors, &corrections, 20), 0);
    }

    #[test]
    fn test_sine_integral_lags() {
        let recs = run_sine(lat_ctrl::Params { k_i: 2.0, ..lat_ctrl::Params::default() });
        let (errors, corrections) = errors_and_corrections(&recs);

        assert!(corrections.iter().all(|c| c.abs() <= 35.0));

        let lag = best_lag(&errors, &corrections, 20);
        assert!(lag >= 2 && lag <= 12, "lag {} samples", lag);
    }

    #[test]
    fn test_sine_high_gain_saturates() {
        let recs = run_sine(lat_ctrl::Params { k_p: 10.0, ..lat_ctrl::Params::default() });
        let (_, corrections) = errors_and_corrections(&recs);

        assert!(corrections.iter().all(|c| c.abs() <= 35.0));
        assert!(corrections.iter().any(|c| *c == 35.0));
        assert!(corrections.iter().any(|c| *c == -35.0));
    }

    #[test]
    fn test_archive_records() {
        let path = std::env::temp_dir()
            .join(format!("picar_ctrl_loop_test_{}", std::process::id()))
            .join("cycles.csv");

        let (ctrl_loop, _) = fixed_loop(320.0);
        let mut ctrl_loop = ctrl_loop.with_archiver(Archiver::from_file_path(&path).unwrap());

        for _ in 0..3 {
            ctrl_loop.step(DT).unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].starts_with("cycle,loop_time_s,dt_s,warmup,mode"));
        assert!(lines[3].starts_with("2,"));
        assert!(lines[3].contains("Driving"));
    }
}
