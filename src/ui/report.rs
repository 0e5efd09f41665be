//! Human-facing reports for worker, cache and config commands
//!
//! Every report renders as a cliclack step on a terminal and as one tagged
//! line (`[OK]`, `[INFO]`, `[WARN]`) otherwise.

use super::terminal::Terminal;
use crate::worker::{WorkerRecord, WorkerState};
use console::style;
use std::path::Path;

#[derive(Clone, Copy)]
enum Tone {
    Ok,
    Info,
    Warn,
}

fn emit(term: &Terminal, tone: Tone, text: &str) {
    if term.is_fancy() {
        let _ = match tone {
            Tone::Ok => cliclack::log::success(text),
            Tone::Info => cliclack::log::info(text),
            Tone::Warn => cliclack::log::warning(text),
        };
        return;
    }

    let tag = match tone {
        Tone::Ok => style("[OK]").green(),
        Tone::Info => style("[INFO]").cyan(),
        Tone::Warn => style("[WARN]").yellow(),
    };
    println!("  {} {}", tag, text);
}

/// Opening line of `newsw register`
pub fn registration_started(term: &Terminal, cache_name: &str) {
    let title = format!("Registering worker into {}", cache_name);
    if term.is_fancy() {
        let _ = cliclack::intro(style(title).blue().bold());
    } else {
        println!("{}", style(title).bold());
    }
}

/// Outcome of `newsw register`: what was installed and who is in control now
pub fn registration_finished(
    term: &Terminal,
    record: &WorkerRecord,
    state: WorkerState,
    installed_assets: Option<usize>,
) {
    match installed_assets {
        Some(count) => emit(
            term,
            Tone::Ok,
            &format!("Precached {} asset(s) into {}", count, record.cache_name),
        ),
        None => emit(term, Tone::Info, "Worker already registered, nothing to install"),
    }

    let rows = [
        ("Worker", record.id.to_string()),
        ("State", state.to_string()),
        ("Script", record.script.clone()),
        ("Origin", record.origin.clone()),
        ("Cache", record.cache_name.clone()),
    ];
    for (key, value) in rows {
        let key = if term.is_fancy() {
            style(key).dim().to_string()
        } else {
            key.to_string()
        };
        println!("  {}: {}", key, value);
    }

    let closing = format!("Worker is {}", state);
    if term.is_fancy() {
        let _ = cliclack::outro(style(closing).green().bold());
    } else {
        println!("{} {}", style("[OK]").green(), closing);
    }
}

/// The feed loaded but the worker did not register alongside it
pub fn registration_skipped(term: &Terminal) {
    emit(
        term,
        Tone::Warn,
        "Worker registration failed; articles were fetched without offline support \
         (run with -v for details, or: newsw register)",
    );
}

pub fn feed_empty(term: &Terminal) {
    emit(term, Tone::Info, "The feed has no articles");
}

pub fn worker_unregistered(term: &Terminal, was_registered: bool) {
    if was_registered {
        emit(term, Tone::Ok, "Worker unregistered; pages fall back to the network");
    } else {
        emit(term, Tone::Info, "No worker was registered");
    }
}

pub fn stores_cleared(term: &Terminal, count: usize) {
    emit(term, Tone::Ok, &format!("cleared {} store(s)", count));
}

pub fn removal_aborted(term: &Terminal) {
    emit(term, Tone::Info, "Aborted, no cache store was touched");
}

pub fn config_written(term: &Terminal, path: &Path) {
    emit(
        term,
        Tone::Ok,
        &format!("Configuration initialized at {}", path.display()),
    );
}

pub fn config_exists(term: &Terminal, path: &Path) {
    emit(
        term,
        Tone::Warn,
        &format!("Config already exists at {} (use --force to overwrite)", path.display()),
    );
}

/// `file` is set when the key went into a local `.newsw.toml`
pub fn config_key_set(term: &Terminal, key: &str, value: &str, file: Option<&Path>) {
    let text = match file {
        Some(path) => format!("Set {} = {} in {}", key, value, path.display()),
        None => format!("Set {} = {}", key, value),
    };
    emit(term, Tone::Ok, &text);

    if key.starts_with("worker.") && key != "worker.purge_stale_caches" {
        emit(
            term,
            Tone::Info,
            "This defines a new worker version; run `newsw register` to install it",
        );
    }
}
