//! Thin CLI layer: parse args, styled output, and call into npmu-core.
//! The `cache` subcommand speaks the parent-process message protocol:
//! `{"result": ...}` / `{"err": ...}` on stdout, exit 0 / 1.

use clap::{Arg, ArgAction, Command};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;
use std::env;
use std::io::IsTerminal;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use npmu_core::{CliNpm, Generation};

// ---- UI helpers (no-op when the stream isn't a TTY) ----

fn use_color() -> bool {
    std::io::stdout().is_terminal() && env::var("NO_COLOR").unwrap_or_default().is_empty()
}

fn error(msg: &str) {
    if use_color() {
        eprintln!("{}", msg.red());
    } else {
        eprintln!("{}", msg);
    }
}

fn info(msg: &str) {
    if use_color() {
        println!("{}", msg.cyan());
    } else {
        println!("{}", msg);
    }
}

fn dim(msg: &str) {
    if use_color() {
        println!("{}", msg.dimmed());
    } else {
        println!("{}", msg);
    }
}

/// Run a long-running task with a spinner on stderr until done.
fn run_with_spinner<T, F>(message: &str, show: bool, f: F) -> Result<T, String>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, String> + Send + 'static,
{
    if !show {
        return f();
    }
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let result = f();
        let _ = tx.send(result);
    });
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .tick_chars("⠁⠂⠄⠈⠐⠠⠰⠸⠹")
            .template("{spinner:.dim} {msg}")
            .unwrap(),
    );
    spinner.set_message(message.to_string());
    let mut elapsed = Duration::ZERO;
    let timeout = Duration::from_secs(600);
    let tick = Duration::from_millis(80);
    loop {
        match rx.try_recv() {
            Ok(res) => {
                spinner.finish_and_clear();
                return res;
            }
            Err(mpsc::TryRecvError::Disconnected) => {
                spinner.finish_and_clear();
                return Err("Operation failed.".to_string());
            }
            Err(mpsc::TryRecvError::Empty) => {}
        }
        if elapsed >= timeout {
            spinner.finish_and_clear();
            return Err("Operation timed out.".to_string());
        }
        spinner.tick();
        thread::sleep(tick);
        elapsed += tick;
    }
}

/// Cache subcommand: always emits a JSON message on stdout and sets the exit
/// code itself, so a parent process gets a well-formed response either way.
fn cmd_cache(spec: &str, quiet: bool) -> ! {
    let spec_owned = spec.to_string();
    let show_spinner = !quiet && std::io::stderr().is_terminal();
    let outcome = run_with_spinner(&format!("Downloading {} …", spec), show_spinner, move || {
        let cache = npmu_core::get_cache()?;
        cache.add(&spec_owned)
    });
    match outcome {
        Ok(result) => {
            println!("{}", json!({ "result": result }));
            std::process::exit(0);
        }
        Err(err) => {
            println!("{}", json!({ "err": err }));
            std::process::exit(1);
        }
    }
}

fn cmd_which() -> Result<(), String> {
    let generation = npmu_core::resolve_generation(&CliNpm)?;
    println!("{}", generation.as_str());
    match generation {
        Generation::Legacy => dim("installed npm is < 8.0.0"),
        Generation::Modern => dim("installed npm is >= 8.0.0"),
    }
    Ok(())
}

fn cmd_load() -> Result<(), String> {
    let meta = npmu_core::get_load()?.load()?;
    let doc = json!({
        "version": meta.version.to_string(),
        "cache": meta.cache_dir,
        "registry": meta.registry,
        "config": meta.config,
    });
    println!("{}", serde_json::to_string_pretty(&doc).map_err(|e| e.to_string())?);
    Ok(())
}

fn cmd_config(key: Option<&str>) -> Result<(), String> {
    let config = npmu_core::get_config()?;
    match key {
        Some(key) => match config.get(key)? {
            Some(value) => println!("{}", value),
            None => println!("undefined"),
        },
        None => {
            let list = config.list()?;
            println!(
                "{}",
                serde_json::to_string_pretty(&list).map_err(|e| e.to_string())?
            );
        }
    }
    Ok(())
}

fn cmd_versions(package: &str) -> Result<(), String> {
    let versions = npmu_core::get_versions()?;
    let latest = versions.latest(package).ok();
    for v in versions.versions(package)? {
        if latest.as_deref() == Some(v.as_str()) {
            info(&format!("{} (latest)", v));
        } else {
            println!("{}", v);
        }
    }
    Ok(())
}

fn run() -> Result<(), String> {
    let matches = Command::new("npmu")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Version-aware npm helper shim: cache, config, load and versions against the installed npm")
        .subcommand_required(true)
        .arg_required_else_help(true)
        .subcommand(
            Command::new("cache")
                .about("Download a package into npm's cache; prints {\"result\": ...} or {\"err\": ...}")
                .arg(Arg::new("spec").required(true).help("Package spec, e.g. left-pad@1.3.0"))
                .arg(
                    Arg::new("quiet")
                        .long("quiet")
                        .short('q')
                        .action(ArgAction::SetTrue)
                        .help("No spinner, message output only"),
                ),
        )
        .subcommand(Command::new("which").about("Print which adapter set serves the installed npm"))
        .subcommand(Command::new("load").about("Print the installed npm's runtime metadata as JSON"))
        .subcommand(
            Command::new("config")
                .about("Print npm's resolved config, or a single key")
                .arg(Arg::new("key").help("Config key, e.g. registry")),
        )
        .subcommand(
            Command::new("versions")
                .about("List published versions of a package")
                .arg(Arg::new("package").required(true).help("Package name, e.g. left-pad")),
        )
        .get_matches();

    match matches.subcommand() {
        Some(("cache", sub)) => {
            let spec = sub.get_one::<String>("spec").expect("required");
            cmd_cache(spec, sub.get_flag("quiet"))
        }
        Some(("which", _)) => cmd_which(),
        Some(("load", _)) => cmd_load(),
        Some(("config", sub)) => cmd_config(sub.get_one::<String>("key").map(String::as_str)),
        Some(("versions", sub)) => {
            cmd_versions(sub.get_one::<String>("package").expect("required"))
        }
        _ => unreachable!("subcommand required"),
    }
}

fn main() {
    match std::panic::catch_unwind(run) {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            error(&e);
            std::process::exit(1);
        }
        Err(_) => {
            error("npmu crashed unexpectedly.");
            std::process::exit(2);
        }
    }
}
