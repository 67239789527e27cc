//! `vanguard-cli` – fleet command console.
//!
//! The process entry point for the Vanguard stack. It:
//!
//! 1. Initialises structured logging (`RUST_LOG`, optional JSON output).
//! 2. Loads `vanguard.toml` (or the demo defaults) and builds the
//!    constraints engine, the motion backend, and one orchestrator context
//!    that every consumer shares – there are no global instances.
//! 3. Registers the configured fleet and starts the scheduler loops.
//! 4. Intercepts **Ctrl-C** to broadcast an emergency stop before exiting.
//! 5. Drops the operator into an interactive REPL (`help` for commands).

mod config;
mod repl;

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use colored::Colorize;
use tracing::warn;

use vanguard_constraints::ConstraintsEngine;
use vanguard_orchestrator::{Orchestrator, OrchestratorConfig};
use vanguard_types::{Command, CommandKind, CommandTarget, EventKind, Platform};

fn main() {
    // ── Structured logging ────────────────────────────────────────────────
    // RUST_LOG controls the filter (default "info"); set
    // VANGUARD_LOG_FORMAT=json for newline-delimited JSON suitable for log
    // aggregators. Operator-facing output still uses println! for UX.
    let log_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    if std::env::var("VANGUARD_LOG_FORMAT").as_deref() == Ok("json") {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .compact()
            .init();
    }

    print_banner();

    // ── Configuration ─────────────────────────────────────────────────────
    let cfg = match config::load() {
        Ok(Some(cfg)) => {
            println!(
                "  Config loaded from {}",
                config::config_path().display().to_string().bold()
            );
            cfg
        }
        Ok(None) => {
            println!(
                "  No {} found – using the demo fleet.",
                config::config_path().display()
            );
            config::FleetConfig::default()
        }
        Err(e) => {
            println!("{}: {}", "Config error".red(), e);
            println!("  Using the demo fleet.");
            config::FleetConfig::default()
        }
    };

    // ── Runtime & orchestrator ────────────────────────────────────────────
    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("{}: {e}", "Failed to start the async runtime".red());
            return;
        }
    };

    let engine = ConstraintsEngine::new(cfg.constraints.clone());
    let orch = Orchestrator::new(
        engine,
        cfg.backend.build(),
        OrchestratorConfig {
            avoid_policy: cfg.avoid_policy,
            tick: cfg.tick,
            ..OrchestratorConfig::default()
        },
    );

    runtime.block_on(async {
        for spec in &cfg.platforms {
            orch.register_platform(Platform::new(
                spec.id.clone(),
                spec.name.clone(),
                spec.class,
                spec.position(),
            ))
            .await;
        }

        // Console feed: surface terminal task states and violations without
        // touching the scheduling path.
        orch.on_event(|event| match event.kind {
            EventKind::TaskFailed | EventKind::ConstraintViolation => {
                println!("  {} {}", "✗".red(), event.data);
            }
            EventKind::TaskSucceeded => {
                println!("  {} task complete", "✓".green());
            }
            _ => {}
        })
        .await;

        orch.start().await;
    });

    println!(
        "  {} platform(s) registered, backend: {:?}, policy: {:?}\n",
        cfg.platforms.len(),
        cfg.backend,
        cfg.avoid_policy
    );
    println!("  Type {} for a list of commands.\n", "help".bold().cyan());

    // ── Ctrl-C: emergency stop ────────────────────────────────────────────
    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        let orch = orch.clone();
        let handle = runtime.handle().clone();
        if let Err(e) = ctrlc::set_handler(move || {
            println!();
            println!("{}", "⚠  Ctrl-C received – stopping all platforms …".yellow().bold());
            let stop = Command::new(CommandKind::Stop, CommandTarget::All);
            let _ = handle.block_on(orch.execute_command(stop));
            shutdown.store(true, Ordering::SeqCst);
        }) {
            warn!(error = %e, "failed to install Ctrl-C handler");
        }
    }

    // ── Interactive REPL ──────────────────────────────────────────────────
    repl::run(orch.clone(), runtime.handle().clone(), shutdown);

    runtime.block_on(orch.stop());
    println!("{}", "  ✓ Vanguard stopped.".green());
}

fn print_banner() {
    println!();
    println!("{}", "  ╔══════════════════════════════════════╗".bold().cyan());
    println!("{}", "  ║      VANGUARD  ·  fleet console      ║".bold().cyan());
    println!("{}", "  ╚══════════════════════════════════════╝".bold().cyan());
    println!();
}
