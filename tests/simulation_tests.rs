//! End-to-end behaviour of the simulation through the public API.

use nebula::force::FrameForces;
use nebula::{
    builtin_templates, compile, shapes, Config, HandForceModel, HandInfo, HandState, ParticleField,
    ResponseFile, ShapeExpressions, ShapeService, Simulation, Vec3,
};
use rand::rngs::SmallRng;
use rand::SeedableRng;

fn config(count: usize) -> Config {
    Config {
        particle_count: count,
        ..Config::default()
    }
}

fn max_error(sim: &Simulation) -> f32 {
    sim.positions()
        .iter()
        .zip(sim.field().targets())
        .map(|(p, t)| p.distance(*t))
        .fold(0.0, f32::max)
}

// ============================================================================
// Templates
// ============================================================================

#[test]
fn test_every_builtin_is_finite() {
    for template in builtin_templates() {
        for total in [1u32, 7, 1000] {
            for i in 0..total {
                let p = template.generate(i, total);
                assert!(p.is_finite(), "{} slot {i}/{total} gave {p:?}", template.id());
            }
        }
    }
}

#[test]
fn test_fireworks_inside_ball() {
    let t = shapes::builtin("fireworks").unwrap();
    for i in 0..2000 {
        assert!(t.generate(i, 2000).length() <= shapes::FIREWORKS_RADIUS + 1e-3);
    }
}

#[test]
fn test_saturn_split() {
    let t = shapes::builtin("saturn").unwrap();
    let total = 1000;
    for i in 0..total {
        let p = t.generate(i, total);
        if shapes::is_saturn_core(i, total) {
            assert!((p.length() - shapes::SATURN_CORE_RADIUS).abs() < 1e-3);
        } else {
            let r = Vec3::new(p.x, 0.0, p.z).length();
            assert!(r >= 8.0 - 1e-3 && r <= 14.0 + 1e-3);
            assert!(p.y.abs() <= 0.2 + 1e-6);
        }
    }
}

// ============================================================================
// Forces
// ============================================================================

#[test]
fn test_undetected_hands_change_nothing() {
    let ghost = HandInfo {
        detected: false,
        ..HandInfo::new(0.5, 0.5, 1.0)
    };
    let mut with_ghosts = Simulation::with_seed(&config(400), 9).unwrap();
    let mut without = Simulation::with_seed(&config(400), 9).unwrap();

    for _ in 0..30 {
        with_ghosts.step(
            1.0 / 60.0,
            &HandState {
                left: Some(ghost),
                right: Some(ghost),
            },
        );
        without.step(1.0 / 60.0, &HandState::NONE);
    }
    assert_eq!(with_ghosts.positions(), without.positions());
}

#[test]
fn test_pinch_pulls_closer_than_open_hand() {
    let model = HandForceModel::default();
    let position = Vec3::new(1.0, 0.0, 0.0);
    let target = Vec3::new(5.0, 0.0, 0.0);
    let hand_at_origin = |pinch| {
        model.prepare(&HandState {
            left: None,
            right: Some(HandInfo::new(0.5, 0.5, pinch)),
        })
    };
    let pinched: FrameForces = hand_at_origin(1.0);
    let open: FrameForces = hand_at_origin(0.0);

    for seed in 0..16 {
        let mut rng = SmallRng::seed_from_u64(seed);
        let a = model.effective_target(&pinched, target, position, &mut rng);
        let b = model.effective_target(&open, target, position, &mut rng);
        assert!(a.length() < b.length());
    }
}

#[test]
fn test_two_hand_scale() {
    let model = HandForceModel::default();
    let at = |l: f32, r: f32| HandState {
        left: Some(HandInfo::new(l, 0.5, 0.0)),
        right: Some(HandInfo::new(r, 0.5, 0.0)),
    };
    assert!((model.system_scale(&at(0.375, 0.625)) - 1.0).abs() < 1e-5);
    assert_eq!(model.system_scale(&at(0.45, 0.5)), 0.5);
    assert_eq!(model.system_scale(&at(0.125, 0.875)), 2.5);
}

// ============================================================================
// Integration
// ============================================================================

#[test]
fn test_monotone_convergence() {
    let mut sim = Simulation::with_seed(&config(1000), 3).unwrap();
    let mut prev = max_error(&sim);
    for _ in 0..300 {
        sim.step(1.0 / 30.0, &HandState::NONE);
        let err = max_error(&sim);
        assert!(err <= prev + 1e-4);
        prev = err;
    }
    assert!(prev < 1e-2);
}

#[test]
fn test_template_switch_converges_to_new_shape() {
    let mut sim = Simulation::with_seed(&config(500), 4).unwrap();
    sim.select_builtin("sphere").unwrap();
    for _ in 0..200 {
        sim.step(0.1, &HandState::NONE);
    }
    for p in sim.positions() {
        assert!((p.length() - shapes::SPHERE_RADIUS).abs() < 1e-2);
    }
}

#[test]
fn test_retarget_is_idempotent() {
    let mut field = ParticleField::with_seed(800, 5).unwrap();
    for template in builtin_templates() {
        field.retarget(&template);
        let first = field.targets().to_vec();
        field.retarget(&template);
        assert_eq!(field.targets(), first.as_slice(), "{}", template.id());
    }
}

// ============================================================================
// Runtime shapes
// ============================================================================

#[test]
fn test_compiled_constant_shape() {
    let t = compile("Dot", &ShapeExpressions::new("1", "2", "3"));
    for i in 0..50 {
        assert_eq!(t.generate(i, 50), Vec3::new(1.0, 2.0, 3.0));
    }
}

#[test]
fn test_compiled_bad_shape_sits_at_origin() {
    let mut sim = Simulation::with_seed(&config(100), 6).unwrap();
    sim.set_template(compile("Broken", &ShapeExpressions::new("q + 1", "0", "0")));
    assert!(sim.field().targets().iter().all(|t| *t == Vec3::ZERO));
}

#[test]
fn test_shape_from_saved_response() {
    let path = std::env::temp_dir().join(format!("nebula-shape-{}.json", std::process::id()));
    std::fs::write(
        &path,
        r#"{"x":"12 * cos(TAU * u)","y":"0","z":"12 * sin(TAU * u)","name":"Halo"}"#,
    )
    .unwrap();

    let service = ResponseFile::new(&path);
    assert_eq!(service.generate("a ring").unwrap().display_name(), "Halo");

    let mut sim = Simulation::with_seed(&config(360), 7).unwrap();
    assert!(sim.request_shape(&service, "a ring"));
    let _ = std::fs::remove_file(&path);

    assert_eq!(sim.template().name(), "Halo");
    for t in sim.field().targets() {
        assert!((t.length() - 12.0).abs() < 1e-3);
    }
}

#[test]
fn test_missing_service_keeps_template() {
    let mut sim = Simulation::with_seed(&config(50), 8).unwrap();
    let service = ResponseFile::new("/nonexistent/nebula/response.json");
    assert!(!sim.request_shape(&service, "anything"));
    assert_eq!(sim.template().id(), "heart");
}
