use std::io::{self, Write};
use std::sync::OnceLock;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

use colored::*;
use indicatif::{ProgressBar, ProgressStyle};

const TIP_DURATION: Duration = Duration::from_secs(2);
const TIPS: &[&str] = &["Press Ctrl-C to stop early, in-flight targets will drain"];

pub struct SpinnerHandle {
    pub bar: ProgressBar,
    tx: Sender<String>,
}

impl SpinnerHandle {
    pub fn send_to_queue(&self, message: String) {
        let _ = self.tx.send(message);
    }

    pub fn advance(&self) {
        self.bar.inc(1);
    }

    pub fn finish_and_clear(&self) {
        self.bar.finish_and_clear();
    }
}

static SPINNER: OnceLock<SpinnerHandle> = OnceLock::new();

/// Starts the progress spinner for `total` targets. Does nothing when quiet.
pub fn start(total: usize, q_level: u8) {
    if q_level > 0 {
        return;
    }
    let _ = SPINNER.get_or_init(|| init_spinner(total as u64));
}

pub fn get_spinner() -> Option<&'static SpinnerHandle> {
    SPINNER.get()
}

pub fn finish() {
    if let Some(spinner) = get_spinner() {
        spinner.finish_and_clear();
    }
}

/// Advances the bar by one finished target.
pub fn report_progress(target: &str) {
    if let Some(spinner) = get_spinner() {
        spinner.advance();
        spinner.send_to_queue(format!("last finished {}", target.green().bold()));
    }
}

/// Replaces the spinner message without moving the bar.
pub fn set_status(msg: &str) {
    if let Some(spinner) = get_spinner() {
        spinner.send_to_queue(msg.to_string());
    }
}

fn init_spinner(total: u64) -> SpinnerHandle {
    let bar = ProgressBar::new(total);
    let style = ProgressStyle::with_template("{spinner:.blue} {pos}/{len} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(&[
            "▁▁▁▁▁",
            "▁▂▂▂▁",
            "▁▄▂▄▁",
            "▂▄▆▄▂",
            "▄▆█▆▄",
            "▂▄▆▄▂",
            "▁▄▂▄▁",
            "▁▂▂▂▁",
        ]);

    bar.set_style(style);
    bar.enable_steady_tick(Duration::from_millis(100));

    let (tx, rx) = mpsc::channel::<String>();
    let bar_clone = bar.clone();

    thread::spawn(move || {
        let mut tip_index = 0;
        let mut next_tip_time = Instant::now() + TIP_DURATION;

        loop {
            if bar_clone.is_finished() {
                break;
            }

            let wait_time = next_tip_time.saturating_duration_since(Instant::now());

            match rx.recv_timeout(wait_time) {
                Ok(mut msg) => {
                    // Only the newest message matters.
                    while let Ok(newer_msg) = rx.try_recv() {
                        msg = newer_msg;
                    }
                    bar_clone.set_message(msg);
                    next_tip_time = Instant::now() + TIP_DURATION;
                }
                Err(RecvTimeoutError::Timeout) => {
                    let tip = TIPS[tip_index % TIPS.len()];
                    bar_clone.set_message(format!("{}", tip.italic().white()));
                    tip_index += 1;
                    next_tip_time = Instant::now() + TIP_DURATION;
                }
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    });

    SpinnerHandle { bar, tx }
}

/// Log writer that hides the spinner while a line is printed.
pub struct SpinnerWriter;

impl Write for SpinnerWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match get_spinner() {
            Some(spinner) if !spinner.bar.is_finished() => {
                spinner.bar.suspend(|| io::stdout().write_all(buf))?;
            }
            _ => io::stdout().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stdout().flush()
    }
}
