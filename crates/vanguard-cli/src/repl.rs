//! Interactive fleet REPL.
//!
//! Parses typed operator commands into [`Command`]s and submits them to the
//! orchestrator. Parsing is a pure function so it can be tested without a
//! terminal.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use uuid::Uuid;

use vanguard_orchestrator::{Orchestrator, StatusSnapshot};
use vanguard_types::{
    Command, CommandKind, CommandTarget, FormationShape, TaskStatus, TimelineEvent, Waypoint,
};

/// One parsed operator input.
#[derive(Debug, PartialEq)]
pub enum ReplCommand {
    Help,
    Quit,
    Status,
    Report,
    Timeline(usize),
    Cancel(Uuid),
    Submit(CommandKind, CommandTarget),
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_line(line: &str) -> Result<Option<ReplCommand>, String> {
    let tokens: Vec<&str> = line.split_whitespace().collect();
    let Some((&head, args)) = tokens.split_first() else {
        return Ok(None);
    };

    let cmd = match head {
        "help" | "?" => ReplCommand::Help,
        "quit" | "exit" => ReplCommand::Quit,
        "status" => ReplCommand::Status,
        "report" => ReplCommand::Report,
        "timeline" => {
            let limit = match args.first() {
                Some(tok) => parse_usize(tok, "limit")?,
                None => 20,
            };
            ReplCommand::Timeline(limit)
        }
        "cancel" => {
            let tok = args.first().ok_or("usage: cancel <task-id>")?;
            let id = Uuid::parse_str(tok).map_err(|e| format!("bad task id: {e}"))?;
            ReplCommand::Cancel(id)
        }
        "goto" => {
            if args.len() < 3 {
                return Err("usage: goto <target> <x> <y> [z] [speed]".to_string());
            }
            let x = parse_f64(args[1], "x")?;
            let y = parse_f64(args[2], "y")?;
            let z = args.get(3).map(|t| parse_f64(t, "z")).transpose()?;
            let speed = args.get(4).map(|t| parse_f64(t, "speed")).transpose()?;
            ReplCommand::Submit(
                CommandKind::GoTo { x, y, z, speed },
                CommandTarget::parse(args[0]),
            )
        }
        "hold" => {
            let target = args.first().ok_or("usage: hold <target> [duration]")?;
            let duration_s = args.get(1).map(|t| parse_f64(t, "duration")).transpose()?;
            ReplCommand::Submit(
                CommandKind::HoldPosition { duration_s },
                CommandTarget::parse(target),
            )
        }
        "stop" => {
            let target = args.first().ok_or("usage: stop <target>")?;
            ReplCommand::Submit(CommandKind::Stop, CommandTarget::parse(target))
        }
        "orbit" => {
            if args.len() < 3 {
                return Err("usage: orbit <id> <cx> <cy> [radius] [altitude]".to_string());
            }
            let center_x = parse_f64(args[1], "cx")?;
            let center_y = parse_f64(args[2], "cy")?;
            let radius_m = args
                .get(3)
                .map(|t| parse_f64(t, "radius"))
                .transpose()?
                .unwrap_or(10.0);
            let altitude_m = args
                .get(4)
                .map(|t| parse_f64(t, "altitude"))
                .transpose()?
                .unwrap_or(20.0);
            ReplCommand::Submit(
                CommandKind::Orbit {
                    center_x,
                    center_y,
                    radius_m,
                    altitude_m,
                    angular_speed: None,
                },
                CommandTarget::parse(args[0]),
            )
        }
        "formation" => {
            if args.len() < 2 {
                return Err("usage: formation <line|wedge|column> <target> [leader]".to_string());
            }
            let formation = match args[0] {
                "line" => FormationShape::Line,
                "wedge" => FormationShape::Wedge,
                "column" => FormationShape::Column,
                other => return Err(format!("unknown formation: {other}")),
            };
            ReplCommand::Submit(
                CommandKind::FormFormation {
                    formation,
                    spacing_m: 3.0,
                    leader: args.get(2).map(|s| s.to_string()),
                },
                CommandTarget::parse(args[1]),
            )
        }
        "follow" => {
            if args.len() < 2 {
                return Err("usage: follow <leader> <target> [gap]".to_string());
            }
            let gap_m = args
                .get(2)
                .map(|t| parse_f64(t, "gap"))
                .transpose()?
                .unwrap_or(3.0);
            ReplCommand::Submit(
                CommandKind::FollowLeader {
                    leader: args[0].to_string(),
                    gap_m,
                },
                CommandTarget::parse(args[1]),
            )
        }
        "home" => {
            let target = args.first().ok_or("usage: home <target>")?;
            ReplCommand::Submit(CommandKind::ReturnHome, CommandTarget::parse(target))
        }
        "patrol" => {
            if args.len() < 2 {
                return Err("usage: patrol <id> <x,y> [<x,y> ...]".to_string());
            }
            let mut waypoints = Vec::new();
            for tok in &args[1..] {
                let (x, y) = tok
                    .split_once(',')
                    .ok_or_else(|| format!("bad waypoint '{tok}', expected x,y"))?;
                waypoints.push(Waypoint {
                    x: parse_f64(x, "waypoint x")?,
                    y: parse_f64(y, "waypoint y")?,
                    z: None,
                });
            }
            ReplCommand::Submit(
                CommandKind::Patrol {
                    waypoints,
                    loop_route: false,
                },
                CommandTarget::parse(args[0]),
            )
        }
        "spotlight" | "laser" => {
            if args.len() < 3 {
                return Err(format!("usage: {head} <id> <x> <y> [duration]"));
            }
            let target_x = parse_f64(args[1], "x")?;
            let target_y = parse_f64(args[2], "y")?;
            let duration_s = args
                .get(3)
                .map(|t| parse_f64(t, "duration"))
                .transpose()?
                .unwrap_or(5.0);
            let kind = if head == "spotlight" {
                CommandKind::Spotlight {
                    target_x,
                    target_y,
                    duration_s,
                }
            } else {
                CommandKind::PointLaser {
                    target_x,
                    target_y,
                    duration_s,
                }
            };
            ReplCommand::Submit(kind, CommandTarget::parse(args[0]))
        }
        other => return Err(format!("unknown command: {other} (try 'help')")),
    };
    Ok(Some(cmd))
}

fn parse_f64(token: &str, name: &str) -> Result<f64, String> {
    token
        .parse::<f64>()
        .map_err(|_| format!("bad {name}: '{token}'"))
}

fn parse_usize(token: &str, name: &str) -> Result<usize, String> {
    token
        .parse::<usize>()
        .map_err(|_| format!("bad {name}: '{token}'"))
}

/// Run the REPL until quit, EOF, or the shutdown flag is raised.
pub fn run(orch: Orchestrator, handle: tokio::runtime::Handle, shutdown: Arc<AtomicBool>) {
    let mut editor = match DefaultEditor::new() {
        Ok(editor) => editor,
        Err(e) => {
            eprintln!("failed to initialise line editor: {e}");
            return;
        }
    };

    loop {
        if shutdown.load(Ordering::SeqCst) {
            break;
        }
        match editor.readline("vanguard> ") {
            Ok(line) => {
                let _ = editor.add_history_entry(line.as_str());
                match parse_line(&line) {
                    Ok(None) => {}
                    Ok(Some(ReplCommand::Quit)) => break,
                    Ok(Some(cmd)) => dispatch(&orch, &handle, cmd),
                    Err(message) => println!("{}", message.red()),
                }
            }
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("read error: {e}");
                break;
            }
        }
    }
}

fn dispatch(orch: &Orchestrator, handle: &tokio::runtime::Handle, cmd: ReplCommand) {
    match cmd {
        ReplCommand::Help => print_help(),
        ReplCommand::Status => {
            let status = handle.block_on(orch.get_status());
            print_status(&status);
        }
        ReplCommand::Report => {
            let command = Command::new(CommandKind::ReportStatus, CommandTarget::All);
            let task = handle.block_on(orch.execute_command(command));
            match wait_for_task(orch, handle, task.id) {
                Some(done) if done.status == TaskStatus::Succeeded => {
                    let output = done.output.unwrap_or_default();
                    match serde_json::to_string_pretty(&output) {
                        Ok(pretty) => println!("{pretty}"),
                        Err(e) => println!("{}", format!("report error: {e}").red()),
                    }
                }
                Some(done) => {
                    println!(
                        "{}",
                        format!("report failed: {}", done.error.unwrap_or_default()).red()
                    );
                }
                None => println!("{}", "report timed out".red()),
            }
        }
        ReplCommand::Timeline(limit) => {
            let events = handle.block_on(orch.get_timeline(limit));
            print_timeline(&events);
        }
        ReplCommand::Cancel(task_id) => {
            if handle.block_on(orch.cancel_task(task_id)) {
                println!("task {} {}", task_id, "cancellation requested".yellow());
            } else {
                println!("{}", "task not found or already terminal".red());
            }
        }
        ReplCommand::Submit(kind, target) => {
            let command = Command::new(kind, target);
            let task = handle.block_on(orch.execute_command(command));
            match task.status {
                TaskStatus::Failed => println!(
                    "{} {}",
                    "rejected:".red().bold(),
                    task.error.unwrap_or_default()
                ),
                _ => println!(
                    "task {} {} ({})",
                    task.id.to_string().bold(),
                    "queued".green(),
                    task.kind.name()
                ),
            }
        }
        ReplCommand::Quit => {}
    }
}

/// Poll a task until it reaches a terminal state (bounded wait).
fn wait_for_task(
    orch: &Orchestrator,
    handle: &tokio::runtime::Handle,
    task_id: Uuid,
) -> Option<vanguard_types::Task> {
    for _ in 0..200 {
        if let Some(task) = handle.block_on(orch.get_task(task_id)) {
            if task.status.is_terminal() {
                return Some(task);
            }
        }
        std::thread::sleep(Duration::from_millis(25));
    }
    None
}

fn print_help() {
    println!(
        "\n  {}\n\
         \n  goto <target> <x> <y> [z] [speed]      move platform(s)\n\
         \x20 hold <target> [duration]               hold position\n\
         \x20 stop <target>                          emergency stop\n\
         \x20 orbit <id> <cx> <cy> [r] [alt]         orbit a point (aerial)\n\
         \x20 formation <shape> <target> [leader]    line | wedge | column\n\
         \x20 follow <leader> <target> [gap]         convoy behind a leader\n\
         \x20 patrol <id> <x,y> [<x,y> ...]          visit waypoints\n\
         \x20 spotlight <id> <x> <y> [duration]      illuminate (aerial)\n\
         \x20 laser <id> <x> <y> [duration]          designate (aerial)\n\
         \x20 home <target>                          return to origin\n\
         \x20 report                                 fleet status report\n\
         \x20 status | timeline [n] | cancel <id>    introspection\n\
         \x20 quit                                   exit\n\
         \n  targets: a platform id, or {}\n",
        "Commands".bold(),
        "all / ground-class / aerial-class".italic()
    );
}

fn print_status(status: &StatusSnapshot) {
    println!("\n  {}", "Platforms".bold());
    let mut ids: Vec<&String> = status.platforms.keys().collect();
    ids.sort();
    for id in ids {
        let p = &status.platforms[id];
        println!(
            "    {:<6} {:<12} {:<9} ({:>6.1}, {:>6.1}, {:>5.1})  battery {:>5.1}%",
            p.id,
            p.name,
            format!("{:?}", p.status).to_lowercase(),
            p.position.x,
            p.position.y,
            p.position.z,
            p.battery_pct,
        );
    }
    let t = &status.tasks;
    println!(
        "\n  {} total={} queued={} running={} succeeded={} failed={} cancelled={}",
        "Tasks".bold(),
        t.total,
        t.queued,
        t.running,
        t.succeeded,
        t.failed,
        t.cancelled,
    );
    println!("  {} {} events\n", "Timeline".bold(), status.timeline_len);
}

fn print_timeline(events: &[TimelineEvent]) {
    if events.is_empty() {
        println!("  (timeline empty)");
        return;
    }
    for event in events {
        println!(
            "  {}  {:<22} {}",
            event.timestamp.format("%H:%M:%S%.3f"),
            format!("{:?}", event.kind),
            event.data
        );
    }
}
