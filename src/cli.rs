use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::{env, path::PathBuf};

use crate::config::ConfigState;
use crate::pipeline::{self, RunOptions};

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    if pargs.contains(["-h", "--help"]) {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            match topic {
                Some(t) => print_subcmd_help(&t),
                None => print_help(),
            }
            Ok(())
        }

        Some("run") => {
            let opts = RunOptions {
                input: pargs.opt_value_from_os_str("--input", |s| {
                    Ok::<_, std::convert::Infallible>(PathBuf::from(s))
                })?,
                profile: pargs.opt_value_from_str("--profile")?,
                dry_run: pargs.contains("--dry-run"),
                report: pargs.contains("--report"),
            };
            reject_leftovers(pargs)?;
            pipeline::run(opts)
        }

        Some("list") => {
            let cfg = ConfigState::load_or_install_default(None)?;
            for name in cfg.list_profiles() {
                let mark = if name == cfg.active_name { '*' } else { ' ' };
                println!("{mark} {name}");
            }
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: handctl use <profile_name>"))?;
            let mut cfg = ConfigState::load_or_install_default(None)?;
            cfg.set_active(&name)?;
            println!("active profile: {}", cfg.active_name);
            Ok(())
        }

        Some("show") => {
            let profile: Option<String> = pargs.opt_value_from_str("--profile")?;
            let cfg = ConfigState::load_or_install_default(profile.as_deref())?;
            let v = serde_json::json!({
                "profile": cfg.active_name,
                "path": cfg.active_path(),
                "settings": cfg.profile,
            });
            print_json(&v);
            Ok(())
        }

        Some("doctor") => {
            let cfg = ConfigState::load_or_install_default(None)?;
            print_json(&cfg.doctor_report());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn reject_leftovers(pargs: Arguments) -> Result<()> {
    let rest = pargs.finish();
    if !rest.is_empty() {
        return Err(anyhow!("unexpected arguments: {rest:?}"));
    }
    Ok(())
}

fn print_help() {
    println!(
        r#"handctl - hand-gesture volume and media control

USAGE:
  handctl help [command]          Show general or command-specific help
  handctl run [OPTIONS]           Read landmark frames and drive volume/media
  handctl list                    List profiles
  handctl use <name>              Switch active profile
  handctl show [--profile NAME]   Print the effective profile
  handctl doctor                  Diagnose permissions and backends

RUN OPTIONS:
  --input FILE      JSON-lines landmark frames (default: stdin, '-' for stdin)
  --profile NAME    Use NAME instead of the active profile
  --dry-run         Simulated mixer, no media keys
  --report          Print a JSON status line per frame

GESTURES:
  primary (left) hand    pinch thumb and index to set volume
  secondary hand         draw a small fast loop to lock the volume
                         hold an open palm for a second to unlock
                         swipe right to skip to the next track

TIPS:
  - Profiles: ~/.config/handctl/profiles
  - Active profile pointer: ~/.config/handctl/active
  - Edits to the active profile apply while 'run' is going
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "run" => println!(
            "usage: handctl run [--input FILE] [--profile NAME] [--dry-run] [--report]\nReads one JSON frame per line: {{\"t_ms\": 0, \"hands\": [[[x,y], ...21 points], ...]}}."
        ),
        "list" => {
            println!("usage: handctl list\nLists available profiles; marks active with '*'.")
        }
        "use" => println!("usage: handctl use <name>\nSwitches the active profile to <name>."),
        "show" => println!(
            "usage: handctl show [--profile NAME]\nPrints thresholds and backend settings as JSON."
        ),
        "doctor" => println!(
            "usage: handctl doctor\nChecks uinput access, the input group and pactl."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_json(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
