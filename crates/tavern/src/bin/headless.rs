//! # TAVERN Headless Runner
//!
//! Runs the simulation without any engine attached, using the built-in clip
//! player, and prints what happened.
//!
//! ```bash
//! tavern_headless                 # default configuration
//! tavern_headless tavern.toml 60  # config file, seconds to simulate
//! ```

#![allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]

use std::cell::Cell;
use std::path::Path;
use std::rc::Rc;

use tavern::{CharacterRole, GameConfig, Session};
use tavern_core::{Listener, Priority};
use tavern_shared::events::{ORDER_CANCELLED, ORDER_COMPLETED, ORDER_PLACED};
use tavern_shared::{GameEvent, Vec3};

/// Simulation step (60 Hz).
const FRAME: f32 = 1.0 / 60.0;

fn counter(session: &Session, event: &str) -> Rc<Cell<u32>> {
    let count = Rc::new(Cell::new(0));
    let sink = Rc::clone(&count);
    session.events().on(event, Listener::new(move |_: &GameEvent| sink.set(sink.get() + 1)), None, Priority::Low);
    count
}

fn main() {
    let mut args = std::env::args().skip(1);
    let config = match args.next() {
        Some(path) => match GameConfig::load(Path::new(&path)) {
            Ok(config) => config,
            Err(e) => {
                eprintln!("✗ {}", e);
                std::process::exit(1);
            }
        },
        None => GameConfig::default(),
    };
    let seconds: f32 = args.next().and_then(|s| s.parse().ok()).unwrap_or(60.0);

    let mut session = Session::new(config);
    if let Err(e) = session.init() {
        eprintln!("✗ init failed: {}", e);
        std::process::exit(1);
    }

    let placed = counter(&session, ORDER_PLACED);
    let completed = counter(&session, ORDER_COMPLETED);
    let cancelled = counter(&session, ORDER_CANCELLED);

    println!("═══════════════════════════════════════════════════════════════");
    println!("                    TAVERN HEADLESS RUN");
    println!("═══════════════════════════════════════════════════════════════");

    for role in [CharacterRole::Staff, CharacterRole::Staff, CharacterRole::Bouncer] {
        if let Err(e) = session.spawn(role, Vec3::ZERO) {
            eprintln!("✗ spawn {}: {}", role, e);
        }
    }

    let frames = (seconds / FRAME) as u32;
    let mut next_customer = 0.0_f32;
    for frame in 0..frames {
        let now = frame as f32 * FRAME;
        if now >= next_customer {
            next_customer += 3.0;
            if let Err(e) = session.spawn(CharacterRole::Customer, Vec3::new(0.0, 0.0, 5.0)) {
                eprintln!("✗ spawn customer: {}", e);
            }
        }
        session.tick(FRAME);
    }

    println!("  simulated:  {:.1}s", seconds);
    println!("  placed:     {}", placed.get());
    println!("  completed:  {}", completed.get());
    println!("  cancelled:  {}", cancelled.get());
    println!("  live:       {}", session.live_count());
    for role in CharacterRole::ALL {
        if let Some(stats) = session.pool_stats(role) {
            println!("  pool {:<9} {:?}", role.key(), stats);
        }
    }

    session.shutdown();
}
