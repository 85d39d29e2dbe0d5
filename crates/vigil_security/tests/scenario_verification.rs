//! # Scenario Verification Tests
//!
//! End-to-end checks through the public API:
//!
//! 1. **Flight**: a constant climb after leaving creative mode
//! 2. **Aimbot**: melee hits with a bitwise-repeating aim error
//! 3. **Configuration**: TOML files on disk
//! 4. **Shared Detector**: events delivered from several threads
//!
//! Run with: cargo test --package vigil_security --test scenario_verification

use std::thread;

use vigil_core::{GameMode, Location, PlayerSnapshot, SubjectId};
use vigil_security::scenario::Step;
use vigil_security::{
    DamageCause, Heuristics, HeuristicsConfig, HostEvent, ReadyGate, Scenario, SharedHeuristics,
    SimServer, VigilError,
};

const CHEATER: SubjectId = SubjectId::from_u128(0xC0FFEE);
const VICTIM: SubjectId = SubjectId::from_u128(0xBEEF);

fn airborne(id: SubjectId, name: &str, location: Location, game_mode: GameMode) -> PlayerSnapshot {
    PlayerSnapshot {
        game_mode,
        on_ground: false,
        ..PlayerSnapshot::new(id, name, location)
    }
}

// ============================================================================
// FLIGHT
// ============================================================================

#[test]
fn verify_constant_climb_flight_verdict() {
    let start = Location::new(0.5, 70.0, 0.5);
    let mut steps = Vec::new();

    // Creative flight is not analyzed
    for at in [0, 50] {
        steps.push(Step {
            at,
            event: Some(HostEvent::Moved {
                player: CHEATER,
                from: start,
                to: start,
                cancelled: false,
            }),
            ..Step::default()
        });
    }

    // Back to survival, still in the air
    steps.push(Step {
        at: 900,
        players: vec![airborne(CHEATER, "Flyer", start, GameMode::Survival)],
        ..Step::default()
    });

    for i in 0..20u32 {
        steps.push(Step {
            at: 1_000 + 50 * u64::from(i),
            event: Some(HostEvent::Moved {
                player: CHEATER,
                from: Location::new(0.5, 70.0 + 0.1 * f64::from(i), 0.5),
                to: Location::new(0.5, 70.0 + 0.1 * f64::from(i + 1), 0.5),
                cancelled: false,
            }),
            ..Step::default()
        });
    }

    let scenario = Scenario {
        players: vec![airborne(CHEATER, "Flyer", start, GameMode::Creative)],
        steps,
        ..Scenario::default()
    };
    let outcome = scenario.run();

    assert_eq!(outcome.events, 22);
    assert_eq!(outcome.verdicts.len(), 1, "verdicts: {:?}", outcome.verdicts);
    let verdict = &outcome.verdicts[0];
    assert_eq!(verdict.subject, CHEATER);
    assert_eq!(verdict.reason, "flight");
    assert!(!verdict.certain);
    assert_eq!(outcome.commands, ["kick Flyer [Vigil] Cheating: flight"]);
    assert!(outcome.alerts[0].contains(&CHEATER.to_string()));
}

// ============================================================================
// AIMBOT
// ============================================================================

#[test]
fn verify_repeated_aim_error_aimbot_verdict() {
    let mut server = SimServer::new();
    server.join(PlayerSnapshot::new(
        CHEATER,
        "Aimer",
        Location::new(0.5, 64.0, 0.5).facing(5.0, 0.0),
    ));
    server.join(PlayerSnapshot::new(VICTIM, "Target", Location::new(0.5, 64.0, 3.5)));
    let mut heuristics =
        Heuristics::with_gate(HeuristicsConfig::default(), server, ReadyGate::open());

    for i in 0..10u64 {
        heuristics.set_time(i * 500);
        heuristics.handle(HostEvent::DamagedByEntity {
            victim: VICTIM,
            attacker: Some(CHEATER),
            final_damage: 4.0,
            cause: DamageCause::EntityAttack,
        });
    }

    let verdicts = heuristics.take_verdicts();
    assert_eq!(verdicts.len(), 1, "verdicts: {verdicts:?}");
    assert_eq!(verdicts[0].subject, CHEATER);
    assert_eq!(verdicts[0].reason, "aimbot (hit)");
    assert!(verdicts[0].certain);
    assert_eq!(verdicts[0].at, 3_000);
    assert_eq!(
        heuristics.host().commands(),
        ["tempban Aimer 3d [Vigil] Cheating: aimbot (hit)"]
    );
}

// ============================================================================
// CONFIGURATION
// ============================================================================

fn temp_path(name: &str) -> std::path::PathBuf {
    let id = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("vigil_{name}_{id}.toml"))
}

#[test]
fn verify_config_file_round_trip() {
    let path = temp_path("config");
    std::fs::write(
        &path,
        r#"
strike_limit = 500
miss_threshold = 6
enforce_anti_knockback = true
exempt_subjects = ["00000000-0000-0000-0000-000000c0ffee"]
certain_commands = ["ban {player} {reason}", "say {{caught}}"]
"#,
    )
    .unwrap();

    let config = HeuristicsConfig::from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.strike_limit, 500);
    assert_eq!(config.miss_threshold, 6);
    assert!(config.enforce_anti_knockback);
    assert!(config.is_exempt(CHEATER));
    assert!(!config.is_exempt(VICTIM));
    // Untouched keys keep their defaults
    assert_eq!(config.max_blackmarks, 4);
    assert_eq!(config.warmup_ticks, 70);
    assert_eq!(config.uncertain_commands.len(), 1);
    assert_eq!(config.commands_for(true).len(), 2);
}

#[test]
fn verify_config_errors() {
    assert!(matches!(
        HeuristicsConfig::from_toml_str("strike_limit = \"lots\""),
        Err(VigilError::Toml(_))
    ));
    assert!(matches!(
        HeuristicsConfig::from_toml_str("max_blackmarks = 0"),
        Err(VigilError::InvalidConfig(_))
    ));
    assert!(matches!(
        HeuristicsConfig::from_path(temp_path("missing")),
        Err(VigilError::Io { .. })
    ));
}

#[test]
fn verify_scenario_file() {
    let path = temp_path("scenario");
    std::fs::write(
        &path,
        r#"
[[players]]
id = "00000000-0000-0000-0000-000000c0ffee"
name = "Digger"
location = { x = 0.5, y = 64.0, z = 0.5 }

[[blocks]]
x = 0
y = 66
z = 0
material = "obsidian"

[[steps]]
at = 0
event = { type = "moved", player = "00000000-0000-0000-0000-000000c0ffee", from = { x = 0.5, y = 64.0, z = 0.5 }, to = { x = 0.5, y = 68.0, z = 0.5 } }

[[steps]]
at = 50
ticks = 5
event = { type = "disconnected", player = "00000000-0000-0000-0000-000000c0ffee" }
"#,
    )
    .unwrap();

    let scenario = Scenario::from_path(&path).unwrap();
    std::fs::remove_file(&path).ok();

    let outcome = scenario.run();
    assert_eq!(outcome.events, 2);
    assert_eq!(outcome.ticks, 5);
    assert_eq!(outcome.verdicts.len(), 1);
    assert_eq!(outcome.verdicts[0].reason, "no-clip through obsidian");
    assert!(outcome.verdicts[0].certain);
}

// ============================================================================
// SHARED DETECTOR
// ============================================================================

#[test]
fn verify_shared_detector_across_threads() {
    let gliders: Vec<SubjectId> = (1..=4u128).map(SubjectId::from_u128).collect();

    let mut server = SimServer::new();
    for (n, id) in gliders.iter().enumerate() {
        let start = Location::new(0.5 + 10.0 * n as f64, 80.0, 0.5);
        server.join(airborne(*id, &format!("Glider{n}"), start, GameMode::Survival));
    }
    let shared = SharedHeuristics::new(Heuristics::with_gate(
        HeuristicsConfig::default(),
        server,
        ReadyGate::open(),
    ));

    let handles: Vec<_> = gliders
        .iter()
        .enumerate()
        .map(|(n, &player)| {
            let shared = shared.clone();
            thread::spawn(move || {
                let mut at = Location::new(0.5 + 10.0 * n as f64, 80.0, 0.5);
                for k in 0..6u64 {
                    let to = at.lowered(0.125);
                    shared.handle_at(
                        k * 50,
                        HostEvent::Moved {
                            player,
                            from: at,
                            to,
                            cancelled: false,
                        },
                    );
                    at = to;
                }
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    let verdicts = shared.take_verdicts();
    assert_eq!(verdicts.len(), gliders.len(), "verdicts: {verdicts:?}");
    for id in &gliders {
        let verdict = verdicts.iter().find(|v| v.subject == *id).unwrap();
        assert!(verdict.reason.starts_with("hack client: "));
        assert!(verdict.reason.contains("glide"));
    }
}
