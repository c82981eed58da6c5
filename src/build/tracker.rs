//! Active build registry
//!
//! Each `(label, build type)` key moves through absent, running, then
//! finished and absent again. A second request for a running key is rejected
//! at once. The registry is shared between threads behind a mutex; cloning a
//! [`BuildTracker`] yields another handle to the same registry.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Read};
use std::os::unix::process::CommandExt;
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::output::OutputBuffer;
use super::progress::ProgressEstimator;
use super::types::{
    ActiveBuildInfo, BuildCommand, BuildKey, BuildProgress, BuildType, RunOutput,
};
use crate::error::{EtzError, Result};
use crate::process::{is_process_alive, kill_process_tree};
use crate::validation::validate_label;

/// Error reported by a run that was killed
pub const BUILD_CANCELLED: &str = "Build cancelled";

struct ActiveBuild {
    run_id: Uuid,
    pid: Option<u32>,
    started_at: DateTime<Utc>,
    started: Instant,
    output: Arc<Mutex<OutputBuffer>>,
    cancelled: Arc<AtomicBool>,
}

impl ActiveBuild {
    fn info(&self, build_type: BuildType) -> ActiveBuildInfo {
        ActiveBuildInfo {
            build_type,
            run_id: self.run_id,
            started_at: self.started_at,
            duration_ms: u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
        }
    }

    fn kill(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
        // Between phases there is no child to signal
        if let Some(pid) = self.pid.filter(|pid| is_process_alive(*pid)) {
            kill_process_tree(pid);
        }
    }
}

type Registry = HashMap<BuildKey, ActiveBuild>;

/// Handle to the shared active build registry
#[derive(Clone, Default)]
pub struct BuildTracker {
    builds: Arc<Mutex<Registry>>,
}

impl BuildTracker {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Registry> {
        self.builds.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Run `phases` in order under one registry slot.
    ///
    /// Returns `Err` if the label is invalid or the key is already running.
    /// Subprocess failures, spawn errors and cancellation come back as an
    /// unsuccessful [`RunOutput`] with the buffered output attached.
    pub fn run<F>(
        &self,
        label: &str,
        build_type: BuildType,
        phases: Vec<BuildCommand>,
        mut on_progress: F,
    ) -> Result<RunOutput>
    where
        F: FnMut(BuildProgress),
    {
        validate_label(label)?;
        let key = BuildKey::new(label, build_type);
        let run_id = Uuid::new_v4();
        let output = Arc::new(Mutex::new(OutputBuffer::new()));
        let cancelled = Arc::new(AtomicBool::new(false));

        {
            let mut builds = self.lock();
            if builds.contains_key(&key) {
                return Err(EtzError::Build(format!(
                    "{build_type} already in progress for '{label}'"
                )));
            }
            builds.insert(
                key.clone(),
                ActiveBuild {
                    run_id,
                    pid: None,
                    started_at: Utc::now(),
                    started: Instant::now(),
                    output: Arc::clone(&output),
                    cancelled: Arc::clone(&cancelled),
                },
            );
        }

        info!("Starting {build_type} for '{label}' ({run_id})");
        let started = Instant::now();
        let mut estimator = ProgressEstimator::for_build_type(build_type);
        let mut error = None;

        for phase in &phases {
            if cancelled.load(Ordering::SeqCst) {
                break;
            }
            let mut sink = |line: String| {
                lock_output(&output).push(line.clone());
                let percent = estimator.observe(&line);
                on_progress(BuildProgress {
                    build_type,
                    line,
                    percent,
                });
            };
            match self.run_phase(&key, run_id, phase, &mut sink) {
                Ok(status) if status.success() => {}
                Ok(status) => {
                    error = Some(format!("{} failed ({status})", phase.display()));
                    break;
                }
                Err(e) => {
                    error = Some(e.to_string());
                    break;
                }
            }
        }

        if cancelled.load(Ordering::SeqCst) {
            error = Some(BUILD_CANCELLED.to_string());
        }

        self.release(&key, run_id);

        let duration = started.elapsed();
        match &error {
            None => info!("{build_type} for '{label}' succeeded in {duration:?}"),
            Some(e) => warn!("{build_type} for '{label}' failed: {e}"),
        }

        let lines = lock_output(&output).lines();
        Ok(RunOutput {
            success: error.is_none(),
            output: lines,
            error,
            duration,
        })
    }

    fn run_phase(
        &self,
        key: &BuildKey,
        run_id: Uuid,
        phase: &BuildCommand,
        sink: &mut dyn FnMut(String),
    ) -> Result<ExitStatus> {
        debug!("Spawning {} in {}", phase.display(), phase.cwd.display());

        let mut child = Command::new(&phase.program)
            .args(&phase.args)
            .envs(phase.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .current_dir(&phase.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .process_group(0)
            .spawn()
            .map_err(|e| EtzError::Build(format!("Failed to start {}: {e}", phase.program)))?;

        if !self.set_pid(key, run_id, Some(child.id())) {
            // Killed between spawn and registration
            kill_process_tree(child.id());
        }

        // Drain both pipes before waiting so a chatty tool can't block on a
        // full pipe buffer
        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_line_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_line_reader(stderr, tx.clone()));
        }
        drop(tx);

        for line in rx {
            sink(line);
        }
        for reader in readers {
            let _ = reader.join();
        }

        let status = child.wait();
        // The pid is reaped and may be reused from here on
        self.set_pid(key, run_id, None);
        Ok(status?)
    }

    /// Record the running phase's pid. Returns false if the slot no longer
    /// belongs to this run.
    fn set_pid(&self, key: &BuildKey, run_id: Uuid, pid: Option<u32>) -> bool {
        match self.lock().get_mut(key) {
            Some(entry) if entry.run_id == run_id => {
                entry.pid = pid;
                true
            }
            _ => false,
        }
    }

    /// Remove the slot if it still belongs to this run
    fn release(&self, key: &BuildKey, run_id: Uuid) {
        let mut builds = self.lock();
        if builds.get(key).is_some_and(|b| b.run_id == run_id) {
            builds.remove(key);
        }
    }

    /// Whether a build is running for `label` (of `build_type`, if given)
    pub fn is_build_in_progress(&self, label: &str, build_type: Option<BuildType>) -> bool {
        if validate_label(label).is_err() {
            return false;
        }
        self.lock()
            .keys()
            .any(|k| k.label == label && build_type.map_or(true, |bt| k.build_type == bt))
    }

    /// The longest-running active build for `label`
    pub fn get_active_build_info(&self, label: &str) -> Option<ActiveBuildInfo> {
        if validate_label(label).is_err() {
            return None;
        }
        self.lock()
            .iter()
            .filter(|(k, _)| k.label == label)
            .min_by_key(|(_, b)| b.started)
            .map(|(k, b)| b.info(k.build_type))
    }

    /// Buffered output of an active build; empty when nothing is running
    pub fn get_build_output(&self, label: &str, build_type: Option<BuildType>) -> Vec<String> {
        if validate_label(label).is_err() {
            return Vec::new();
        }
        let output = self
            .lock()
            .iter()
            .filter(|(k, _)| k.label == label && build_type.map_or(true, |bt| k.build_type == bt))
            .min_by_key(|(_, b)| b.started)
            .map(|(_, b)| Arc::clone(&b.output));
        output.map(|o| lock_output(&o).lines()).unwrap_or_default()
    }

    /// Kill one build. Returns false if it was not running.
    pub fn kill_build(&self, label: &str, build_type: BuildType) -> bool {
        if validate_label(label).is_err() {
            return false;
        }
        let removed = self.lock().remove(&BuildKey::new(label, build_type));
        match removed {
            Some(build) => {
                info!("Killing {build_type} for '{label}'");
                build.kill();
                true
            }
            None => false,
        }
    }

    /// Kill every build of `label`, returning how many were killed
    pub fn kill_all_builds_for_label(&self, label: &str) -> usize {
        if validate_label(label).is_err() {
            return 0;
        }
        self.kill_matching(|k| k.label == label)
    }

    /// Kill every active build
    pub fn kill_all(&self) -> usize {
        self.kill_matching(|_| true)
    }

    fn kill_matching(&self, pred: impl Fn(&BuildKey) -> bool) -> usize {
        let victims: Vec<(BuildKey, ActiveBuild)> = {
            let mut builds = self.lock();
            let keys: Vec<BuildKey> = builds.keys().filter(|k| pred(k)).cloned().collect();
            keys.into_iter()
                .filter_map(|k| builds.remove(&k).map(|b| (k, b)))
                .collect()
        };
        for (key, build) in &victims {
            info!("Killing {} for '{}'", key.build_type, key.label);
            build.kill();
        }
        victims.len()
    }

    /// Snapshot of every active build, keyed by label
    pub fn active_builds(&self) -> Vec<(String, ActiveBuildInfo)> {
        let mut builds: Vec<(String, ActiveBuildInfo)> = self
            .lock()
            .iter()
            .map(|(k, b)| (k.label.clone(), b.info(k.build_type)))
            .collect();
        builds.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.started_at.cmp(&b.1.started_at)));
        builds
    }
}

fn lock_output(output: &Mutex<OutputBuffer>) -> MutexGuard<'_, OutputBuffer> {
    output.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Forward each line of `stream` to `tx`, decoding lossily
fn spawn_line_reader<R: Read + Send + 'static>(
    stream: R,
    tx: Sender<String>,
) -> thread::JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(stream);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    })
}
