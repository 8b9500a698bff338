// ============================================================================
// discprep-core/src/external/makemkv.rs
// ============================================================================
//
// MAKEMKV PROCESS: Real ScanSpawner/ScanProcess Implementation
//
// stdout and stderr are drained by two reader threads onto one channel, so the
// runner sees a single combined line stream and neither pipe can fill up and
// block the child. The channel closes once both pipes reach EOF.
//
// Termination sends SIGTERM on unix and escalates to SIGKILL after the grace
// period; elsewhere the child is killed directly.

use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{CoreResult, command_start_error, command_wait_error};
use crate::runner::{ExitOutcome, ScanProcess, ScanSpawner};

const EXIT_POLL: Duration = Duration::from_millis(100);

/// Spawns `makemkvcon` processes.
#[derive(Debug, Clone)]
pub struct MakemkvSpawner {
    binary: PathBuf,
    tool: String,
}

impl MakemkvSpawner {
    pub fn new(binary: &Path) -> Self {
        let tool = binary
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "makemkvcon".to_string());
        Self {
            binary: binary.to_path_buf(),
            tool,
        }
    }
}

impl ScanSpawner for MakemkvSpawner {
    type Process = MakemkvProcess;

    fn spawn(&self, args: &[String]) -> CoreResult<Self::Process> {
        let mut child = Command::new(&self.binary)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| command_start_error(&self.tool, e))?;

        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, tx.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, tx));
        }

        Ok(MakemkvProcess {
            child,
            lines: rx,
            readers,
            tool: self.tool.clone(),
            finished: None,
        })
    }

    fn tool_name(&self) -> &str {
        &self.tool
    }
}

fn spawn_reader<R: Read + Send + 'static>(pipe: R, tx: Sender<String>) -> JoinHandle<()> {
    thread::spawn(move || {
        let mut reader = BufReader::new(pipe);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) | Err(_) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\r', '\n'])
                        .to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            }
        }
    })
}

/// A running `makemkvcon` child.
pub struct MakemkvProcess {
    child: Child,
    lines: Receiver<String>,
    readers: Vec<JoinHandle<()>>,
    tool: String,
    finished: Option<ExitStatus>,
}

fn outcome(status: ExitStatus) -> ExitOutcome {
    match status.code() {
        Some(code) => ExitOutcome::Exited(code),
        None => ExitOutcome::Signaled,
    }
}

impl MakemkvProcess {
    fn poll_exit(&mut self) -> CoreResult<Option<ExitStatus>> {
        if self.finished.is_none() {
            self.finished = self
                .child
                .try_wait()
                .map_err(|e| command_wait_error(&self.tool, e))?;
        }
        Ok(self.finished)
    }

    #[cfg(unix)]
    fn request_stop(&mut self) {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let Ok(pid) = i32::try_from(self.child.id()) else {
            let _ = self.child.kill();
            return;
        };
        if let Err(e) = kill(Pid::from_raw(pid), Signal::SIGTERM) {
            log::debug!("SIGTERM to {} failed: {}", self.tool, e);
        }
    }

    #[cfg(not(unix))]
    fn request_stop(&mut self) {
        let _ = self.child.kill();
    }

    fn join_readers(&mut self) {
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
    }
}

impl ScanProcess for MakemkvProcess {
    fn next_line(&mut self) -> Option<String> {
        self.lines.recv().ok()
    }

    // Reader threads are not joined here; a grandchild may still hold the pipes.
    fn terminate(&mut self, grace: Duration) {
        if matches!(self.poll_exit(), Ok(Some(_))) {
            return;
        }
        self.request_stop();

        let deadline = Instant::now() + grace;
        while Instant::now() < deadline {
            if matches!(self.poll_exit(), Ok(Some(_))) {
                return;
            }
            thread::sleep(EXIT_POLL);
        }

        log::debug!("{} did not stop within {:?}; killing", self.tool, grace);
        let _ = self.child.kill();
        if let Ok(status) = self.child.wait() {
            self.finished = Some(status);
        }
    }

    fn wait(&mut self, timeout: Option<Duration>) -> CoreResult<ExitOutcome> {
        if let Some(status) = self.finished {
            return Ok(outcome(status));
        }

        let Some(timeout) = timeout else {
            let status = self
                .child
                .wait()
                .map_err(|e| command_wait_error(&self.tool, e))?;
            self.finished = Some(status);
            self.join_readers();
            return Ok(outcome(status));
        };

        let deadline = Instant::now() + timeout;
        loop {
            if let Some(status) = self.poll_exit()? {
                self.join_readers();
                return Ok(outcome(status));
            }
            if Instant::now() >= deadline {
                return Ok(ExitOutcome::TimedOut);
            }
            thread::sleep(EXIT_POLL);
        }
    }
}

impl Drop for MakemkvProcess {
    fn drop(&mut self) {
        if matches!(self.poll_exit(), Ok(None)) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn combined_output_and_exit_code() {
        let spawner = MakemkvSpawner::new(Path::new("sh"));
        let args = vec![
            "-c".to_string(),
            "echo out; echo err 1>&2; exit 3".to_string(),
        ];
        let mut process = spawner.spawn(&args).unwrap();

        let mut lines = Vec::new();
        while let Some(line) = process.next_line() {
            lines.push(line);
        }
        lines.sort();
        assert_eq!(lines, vec!["err", "out"]);
        assert_eq!(
            process.wait(Some(Duration::from_secs(5))).unwrap(),
            ExitOutcome::Exited(3)
        );
    }

    #[test]
    fn missing_binary_is_a_dependency_error() {
        let spawner = MakemkvSpawner::new(Path::new("/nonexistent/makemkvcon"));
        assert!(matches!(
            spawner.spawn(&[]),
            Err(crate::error::CoreError::DependencyNotFound(_))
        ));
    }

    #[test]
    fn terminate_stops_a_sleeping_child() {
        let spawner = MakemkvSpawner::new(Path::new("sh"));
        let mut process = spawner
            .spawn(&["-c".to_string(), "exec sleep 30".to_string()])
            .unwrap();
        let start = Instant::now();
        process.terminate(Duration::from_secs(2));
        assert!(start.elapsed() < Duration::from_secs(10));
        assert!(matches!(
            process.wait(None).unwrap(),
            ExitOutcome::Signaled | ExitOutcome::Exited(_)
        ));
    }
}
