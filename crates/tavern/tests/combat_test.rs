//! Integration tests for attacks delivered over the event bus.

use std::cell::RefCell;
use std::rc::Rc;

use tavern::config::{MenuItem, TimingConfig};
use tavern::{CharacterRole, GameConfig, GameError, Session};
use tavern_core::{Listener, Priority};
use tavern_shared::events::CHARACTER_HIT;
use tavern_shared::{CharacterId, GameEvent, Vec3};

const DT: f32 = 0.05;

fn session(attack_damage: u32) -> Session {
    let config = GameConfig {
        timing: TimingConfig { attack_damage, hit_points: 30, ..TimingConfig::default() },
        ..GameConfig::default()
    };
    let mut session = Session::new(config);
    session.init().unwrap();
    session
}

fn state_of(session: &Session, id: CharacterId) -> Option<&str> {
    session.character(id).and_then(|c| c.current_state())
}

fn hit_points(session: &Session, id: CharacterId) -> u32 {
    session.character(id).unwrap().body().unwrap().hit_points
}

fn pending_damage(session: &Session, id: CharacterId) -> u32 {
    session.character(id).unwrap().body().unwrap().pending_damage()
}

/// A session where everyone acts quickly and hits take 10 of 30 points.
fn busy_session(configure: impl FnOnce(&mut GameConfig)) -> Session {
    let mut config = GameConfig {
        timing: TimingConfig {
            idle_min: 0.1,
            idle_max: 0.1,
            move_speed: 50.0,
            attack_damage: 10,
            hit_points: 30,
            ..TimingConfig::default()
        },
        areas: vec![Vec3::new(1.0, 0.0, 0.0)],
        ..GameConfig::default()
    };
    configure(&mut config);
    let mut session = Session::new(config);
    session.init().unwrap();
    session
}

fn record_hits(session: &Session) -> Rc<RefCell<Vec<GameEvent>>> {
    let log = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&log);
    session.events().on(
        CHARACTER_HIT,
        Listener::new(move |event: &GameEvent| sink.borrow_mut().push(event.clone())),
        None,
        Priority::Low,
    );
    log
}

fn run_until(session: &mut Session, max_ticks: usize, mut done: impl FnMut(&Session) -> bool) -> bool {
    for _ in 0..max_ticks {
        session.tick(DT);
        if done(session) {
            return true;
        }
    }
    false
}

fn settle(session: &mut Session, ticks: usize) {
    for _ in 0..ticks {
        session.tick(DT);
    }
}

#[test]
fn test_attack_lands_hit_on_target() {
    let mut session = session(10);
    let attacker = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let victim = session.spawn(CharacterRole::Bouncer, Vec3::new(1.0, 0.0, 0.0)).unwrap();
    settle(&mut session, 20);
    assert_eq!(state_of(&session, attacker), Some("idle"));
    assert_eq!(state_of(&session, victim), Some("idle"));

    assert!(session.command_attack(attacker, victim).unwrap());
    session.tick(DT);
    assert_eq!(state_of(&session, attacker), Some("attack"));

    let mut saw_hit = false;
    for _ in 0..40 {
        session.tick(DT);
        saw_hit |= state_of(&session, victim) == Some("be_hit");
    }
    assert!(saw_hit);
    assert_eq!(state_of(&session, attacker), Some("idle"));
    assert_eq!(state_of(&session, victim), Some("idle"));
    assert_eq!(session.character(victim).unwrap().body().unwrap().hit_points, 20);
}

#[test]
fn test_downed_character_is_despawned() {
    let mut session = session(30);
    let attacker = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let victim = session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap();
    settle(&mut session, 12);

    session.command_attack(attacker, victim).unwrap();
    settle(&mut session, 60);
    assert!(session.character(victim).is_none());
    assert!(session.character(attacker).is_some());
}

#[test]
fn test_attack_on_despawned_target_is_rejected() {
    let mut session = session(10);
    let attacker = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let victim = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    session.despawn(victim).unwrap();

    let err = session.command_attack(attacker, victim).unwrap_err();
    assert!(matches!(err, GameError::UnknownCharacter(id) if id == victim));
}

#[test]
fn test_hit_during_staff_waits_for_order_then_lands() {
    let mut session = busy_session(|config| config.menu = vec![MenuItem::new("stew", 3.0)]);
    let bouncer = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let staff = session.spawn(CharacterRole::Staff, Vec3::ZERO).unwrap();
    session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap();
    assert!(run_until(&mut session, 400, |s| state_of(s, staff) == Some("staff")));

    let hits = record_hits(&session);
    session.command_attack(bouncer, staff).unwrap();
    assert!(run_until(&mut session, 100, |_| !hits.borrow().is_empty()));
    assert_eq!(state_of(&session, staff), Some("staff"));
    assert_eq!(hit_points(&session, staff), 30);
    assert_eq!(pending_damage(&session, staff), 10);

    assert!(run_until(&mut session, 200, |s| state_of(s, staff) == Some("be_hit")));
    assert_eq!(hit_points(&session, staff), 20);
    assert_eq!(pending_damage(&session, staff), 0);
    assert!(run_until(&mut session, 100, |s| state_of(s, staff) == Some("idle")));
}

#[test]
fn test_lethal_hit_on_busy_staff_downs_them() {
    let mut session = busy_session(|config| {
        config.menu = vec![MenuItem::new("stew", 3.0)];
        config.timing.attack_damage = 30;
    });
    let bouncer = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let staff = session.spawn(CharacterRole::Staff, Vec3::ZERO).unwrap();
    session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap();
    assert!(run_until(&mut session, 400, |s| state_of(s, staff) == Some("staff")));

    session.command_attack(bouncer, staff).unwrap();
    assert!(run_until(&mut session, 400, |s| s.character(staff).is_none()));
    assert!(session.character(bouncer).is_some());
}

#[test]
fn test_hit_during_walk_lands_on_arrival_and_resumes_order() {
    let mut session = busy_session(|config| {
        config.timing.move_speed = 0.5;
        config.areas = vec![Vec3::new(10.0, 0.0, 0.0)];
    });
    let bouncer = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let customer = session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap();
    assert!(run_until(&mut session, 400, |s| state_of(s, customer) == Some("move")));

    let hits = record_hits(&session);
    session.command_attack(bouncer, customer).unwrap();
    assert!(run_until(&mut session, 100, |_| !hits.borrow().is_empty()));
    assert_eq!(state_of(&session, customer), Some("move"));
    assert_eq!(hit_points(&session, customer), 30);

    assert!(run_until(&mut session, 600, |s| state_of(s, customer) == Some("be_hit")));
    assert_eq!(hit_points(&session, customer), 20);
    let body = session.character(customer).unwrap().body().unwrap();
    assert_eq!(body.position, Vec3::new(10.0, 0.0, 0.0));

    assert!(run_until(&mut session, 100, |s| state_of(s, customer) == Some("order")));
    assert_eq!(session.orders().waiting_len(), 1);
}

#[test]
fn test_hit_during_order_lands_after_customer_gives_up() {
    let mut session = busy_session(|config| config.timing.customer_patience = 3.0);
    let bouncer = session.spawn(CharacterRole::Bouncer, Vec3::ZERO).unwrap();
    let customer = session.spawn(CharacterRole::Customer, Vec3::ZERO).unwrap();
    assert!(run_until(&mut session, 400, |s| state_of(s, customer) == Some("order")));

    let hits = record_hits(&session);
    session.command_attack(bouncer, customer).unwrap();
    assert!(run_until(&mut session, 40, |_| !hits.borrow().is_empty()));
    assert_eq!(state_of(&session, customer), Some("order"));
    assert_eq!(hit_points(&session, customer), 30);

    assert!(run_until(&mut session, 200, |s| state_of(s, customer) == Some("be_hit")));
    assert_eq!(hit_points(&session, customer), 20);
    assert_eq!(session.orders().waiting_len(), 0);

    assert!(run_until(&mut session, 200, |s| s.character(customer).is_none()));
    assert_eq!(session.areas().free_count(), 1);
}
