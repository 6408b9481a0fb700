//! Session gate commands: status, unlock, lock, remaining, watch.

use std::io::{self, BufRead, Write};
use std::thread;
use std::time::Duration;

use gate_core::session::{Clock, FileKvStore, KvStore, SessionGate, SystemClock, TimerQueue};
use gate_core::{GateConfig, GateError, LockPuzzle, Result, StorageConfig, SubmitOutcome};

type CliGate = SessionGate<FileKvStore, SystemClock, TimerQueue>;

const ERASE_KEY: char = '-';
const MAX_WATCH_SLEEP: Duration = Duration::from_secs(30);

fn open_gate(storage: &StorageConfig) -> (CliGate, TimerQueue) {
    let queue = TimerQueue::new();
    let mut gate = SessionGate::new(
        FileKvStore::new(storage.session_store_file()),
        SystemClock,
        queue.clone(),
    );
    gate.check_session_on_init();
    (gate, queue)
}

pub fn format_remaining(remaining: Duration) -> String {
    let secs = remaining.as_secs();
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn status(storage: &StorageConfig) {
    let (gate, _) = open_gate(storage);
    if gate.is_unlocked() {
        println!("unlocked ({} left)", format_remaining(gate.remaining_time()));
    } else {
        println!("locked");
    }
}

pub fn remaining(storage: &StorageConfig) {
    let (gate, _) = open_gate(storage);
    println!("{}", format_remaining(gate.remaining_time()));
}

pub fn lock(storage: &StorageConfig) -> Result<()> {
    let (mut gate, _) = open_gate(storage);
    gate.end_session()?;
    println!("locked");
    Ok(())
}

pub fn unlock(storage: &StorageConfig, config: &GateConfig, force: bool) -> Result<()> {
    let (mut gate, _) = open_gate(storage);
    if gate.is_unlocked() {
        println!(
            "already unlocked ({} left)",
            format_remaining(gate.remaining_time())
        );
        return Ok(());
    }

    if !force {
        let stdin = io::stdin();
        solve_puzzle(config, &mut stdin.lock())?;
    }

    gate.start_session()?;
    println!("unlocked for {}", format_remaining(gate.remaining_time()));
    Ok(())
}

/// Reads guesses line by line until the puzzle is solved.
///
/// Letters fill blanks in order and `-` erases the last one. Once every
/// blank is filled the answer is checked automatically.
fn solve_puzzle(config: &GateConfig, input: &mut impl BufRead) -> Result<()> {
    let mut rng = rand_rng();
    let mut puzzle = LockPuzzle::new(&config.puzzle, &mut rng)?;
    let mut line = String::new();

    loop {
        print!("App locked. Enter the name to unlock: {} > ", puzzle.display());
        io::stdout().flush().map_err(|err| GateError::Io {
            context: "flushing prompt".to_string(),
            source: err,
        })?;

        line.clear();
        let read = input.read_line(&mut line).map_err(|err| GateError::Io {
            context: "reading puzzle input".to_string(),
            source: err,
        })?;
        if read == 0 {
            return Err(GateError::Validation {
                field: "unlock",
                reason: "input closed before the puzzle was solved".to_string(),
            });
        }

        for key in line.trim().chars() {
            if key == ERASE_KEY {
                puzzle.erase();
            } else {
                puzzle.press(key);
            }
        }

        match puzzle.submit(&mut rng) {
            SubmitOutcome::Solved => {
                println!("{} - correct!", puzzle.display());
                return Ok(());
            }
            SubmitOutcome::Incomplete => {}
            SubmitOutcome::Wrong => {
                tracing::info!(attempts = puzzle.attempts(), "Wrong unlock answer");
                println!("Not quite, try again.");
            }
        }
    }
}

fn rand_rng() -> rand::rngs::StdRng {
    use rand::SeedableRng;
    rand::rngs::StdRng::from_entropy()
}

/// Blocks until the current session expires, then locks.
pub fn watch(storage: &StorageConfig) -> Result<()> {
    let (mut gate, queue) = open_gate(storage);
    if !gate.is_unlocked() {
        println!("locked");
        return Ok(());
    }
    println!(
        "unlocked; locking in {}",
        format_remaining(gate.remaining_time())
    );

    run_timers(&mut gate, &queue, thread::sleep);

    println!("{}", gate.state());
    Ok(())
}

/// Delivers fired timers until none are queued. Waits longer than
/// `MAX_WATCH_SLEEP` are split so clock changes are noticed.
fn run_timers<K: KvStore, C: Clock>(
    gate: &mut SessionGate<K, C, TimerQueue>,
    queue: &TimerQueue,
    mut sleep: impl FnMut(Duration),
) {
    while let Some(next) = queue.next() {
        let now = gate.clock().now_ms();
        if next.due_at_ms > now {
            let wait = Duration::from_millis((next.due_at_ms - now) as u64);
            sleep(wait.min(MAX_WATCH_SLEEP));
            continue;
        }
        for timer in queue.take_due(now) {
            gate.handle_expiry(timer);
        }
    }
}
