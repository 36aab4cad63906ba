//! End-to-end scenarios through the public API.

use evergreen::distribution::{cone_point, ornament_points, seeded_rng, tree_points};
use evergreen::prelude::*;
use evergreen::{ConfigError, PresetError};

const DT: f32 = 1.0 / 60.0;

/// A seeded, smaller rendition of a preset so tests stay fast.
fn test_preset(preset: VisualPreset) -> VisualPreset {
    VisualPreset {
        foliage_count: 2_000,
        seed: Some(99),
        ..preset
    }
}

fn run(scene: &mut TreeScene, clock: &mut FrameClock, seconds: f32) {
    let frames = (seconds / DT).round() as usize;
    for _ in 0..frames {
        let (elapsed, delta) = clock.update();
        scene.step(elapsed, delta);
    }
}

// ============================================================================
// Distribution
// ============================================================================

#[test]
fn test_cone_extremes() {
    let mut rng = seeded_rng(Some(1));

    let top = cone_point(&mut rng, 99, 100, 6.0, 14.0);
    assert!((top.y - 6.86).abs() < 0.2);
    assert!(Vec3::new(top.x, 0.0, top.z).length() < 0.1);

    let bottom = cone_point(&mut rng, 0, 100, 6.0, 14.0);
    assert!((bottom.y + 7.0).abs() < 0.1);
    let r = Vec3::new(bottom.x, 0.0, bottom.z).length();
    assert!(r > 6.0 * 0.85 && r < 6.0 * 1.15);
}

#[test]
fn test_empty_distributions() {
    let mut rng = seeded_rng(Some(1));
    assert!(tree_points(&mut rng, 0, 6.0, 14.0).is_empty());
    assert!(ornament_points(&mut rng, 0, 5.5, 13.0).is_empty());
}

#[test]
fn test_ornaments_bottom_heavy() {
    let points = ornament_points(&mut seeded_rng(Some(2)), 1_000, 5.5, 13.0);
    let lower = points.iter().filter(|p| p.y < 0.0).count();
    assert!(lower > 850, "only {} of 1000 in the lower half", lower);
}

#[test]
fn test_same_seed_same_tree() {
    let a = tree_points(&mut seeded_rng(Some(8)), 500, 6.0, 14.0);
    let b = tree_points(&mut seeded_rng(Some(8)), 500, 6.0, 14.0);
    assert_eq!(a, b);
}

// ============================================================================
// Assembly
// ============================================================================

#[test]
fn test_assemble_and_scatter() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    let mut clock = FrameClock::fixed(DT);

    run(&mut scene, &mut clock, 1.0);
    assert_eq!(scene.foliage().assembly().progress(), 0.0);
    assert!(!scene.star().is_visible());

    assert!(scene.set_assembled(true));
    run(&mut scene, &mut clock, 8.0);
    assert_eq!(scene.foliage().assembly().progress(), 1.0);
    assert!(scene.star().is_visible());

    let foliage = scene.foliage();
    for i in (0..foliage.len()).step_by(97) {
        let gap = foliage.position(i).distance(foliage.tree_position(i));
        assert!(gap < 0.05, "needle {} is {} from its slot", i, gap);
    }
    for layer in scene.ornaments() {
        for i in 0..layer.len() {
            assert!(layer.position(i).distance(layer.tree_position(i)) < 0.05);
        }
    }

    scene.toggle();
    run(&mut scene, &mut clock, 8.0);
    assert_eq!(scene.foliage().assembly().progress(), 0.0);
    let foliage = scene.foliage();
    for i in (0..foliage.len()).step_by(97) {
        assert!(foliage.position(i).distance(foliage.chaos_position(i)) < 0.05);
    }
}

#[test]
fn test_repeated_assemble_is_noop() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    let mut clock = FrameClock::fixed(DT);
    scene.set_assembled(true);
    run(&mut scene, &mut clock, 0.5);
    let progress = scene.foliage().assembly().progress();

    assert!(!scene.set_assembled(true));
    assert_eq!(scene.foliage().assembly().progress(), progress);
}

#[test]
fn test_zero_delta_holds_still() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    scene.set_assembled(true);
    scene.step(0.0, 0.0);
    assert_eq!(scene.foliage().assembly().progress(), 0.0);
    scene.step(0.0, f32::NAN);
    assert_eq!(scene.foliage().assembly().progress(), 0.0);
}

// ============================================================================
// Dispersal
// ============================================================================

#[test]
fn test_pointer_scatters_only_assembled_tree() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    let mut clock = FrameClock::fixed(DT);

    let target = scene.foliage().tree_position(0);
    scene.set_interaction_point(Some(target));
    run(&mut scene, &mut clock, 0.5);
    assert_eq!(scene.stats().needles_in_flight, 0);
    assert_eq!(scene.foliage().dispersal().in_flight(), 0);
}

#[test]
fn test_dispersal_lifecycle() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    let mut clock = FrameClock::fixed(DT);
    scene.set_assembled(true);
    run(&mut scene, &mut clock, 8.0);

    let target = scene.foliage().tree_position(0);
    scene.set_interaction_point(Some(target));
    let (elapsed, delta) = clock.update();
    let stats = scene.step(elapsed, delta).stats;
    assert!(stats.activated > 0);
    assert!(stats.needles_in_flight > 0);
    assert!(scene.foliage().slots()[0] != target);

    // the pointer leaves, needles keep flying and then come home
    scene.set_interaction_point(None);
    run(&mut scene, &mut clock, 1.0);
    assert!(scene.stats().needles_in_flight > 0);

    let flight = scene.foliage().dispersal().config().flight_time();
    run(&mut scene, &mut clock, flight);
    assert_eq!(scene.stats().needles_in_flight, 0);
    let foliage = scene.foliage();
    for i in 0..foliage.len() {
        assert_eq!(foliage.slots()[i], foliage.tree_position(i));
    }
}

#[test]
fn test_tap_preset_ornaments_scatter() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::tap())).unwrap();
    let mut clock = FrameClock::fixed(DT);
    scene.set_assembled(true);
    run(&mut scene, &mut clock, 8.0);

    // aim at a light ornament, which both scatters and sits on the cone
    let light = scene
        .ornaments()
        .iter()
        .find(|l| l.tier() == WeightTier::Light)
        .unwrap();
    let target = light.tree_position(0);
    scene.set_interaction_point(Some(target));
    let (elapsed, delta) = clock.update();
    let stats = scene.step(elapsed, delta).stats;
    assert!(stats.ornaments_in_flight > 0);

    scene.set_interaction_point(None);
    run(&mut scene, &mut clock, 2.0);
    assert_eq!(scene.stats().ornaments_in_flight, 0);
}

// ============================================================================
// Input
// ============================================================================

#[test]
fn test_button_click_toggles() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    let mut input = Input::new();
    input.set_window_size(1280, 720);

    let (min, max) = ToggleTrigger::button().button_rect(Vec2::new(1280.0, 720.0)).unwrap();
    let center = (min + max) * 0.5;
    input.press(MouseButton::Left, center);
    input.release(MouseButton::Left, center);

    assert!(scene.handle_input(&input));
    assert!(scene.is_assembled());
    assert!(scene.pointer().is_none());
    input.begin_frame();

    // a click on the tree itself is not the button
    let tree = Vec2::new(640.0, 360.0);
    input.press(MouseButton::Left, tree);
    input.release(MouseButton::Left, tree);
    assert!(!scene.handle_input(&input));
    assert!(scene.is_assembled());
    assert!(scene.pointer().is_some());
}

#[test]
fn test_drag_does_not_toggle() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::tap())).unwrap();
    let mut input = Input::new();
    input.set_window_size(1280, 720);

    input.press(MouseButton::Left, Vec2::new(300.0, 300.0));
    input.release(MouseButton::Left, Vec2::new(420.0, 310.0));
    assert!(!scene.handle_input(&input));
    assert!(!scene.is_assembled());
    input.begin_frame();

    input.press(MouseButton::Left, Vec2::new(300.0, 300.0));
    input.release(MouseButton::Left, Vec2::new(302.0, 301.0));
    assert!(scene.handle_input(&input));
    assert!(scene.is_assembled());
}

#[test]
fn test_pointer_tracks_rotating_camera() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::tap())).unwrap();
    let viewport = Vec2::new(1280.0, 720.0);
    let cursor = viewport * 0.5 + Vec2::new(50.0, 0.0);

    for degrees in [0.0f32, 45.0, 80.0, 90.0, 100.0, 135.0, 225.0, 315.0] {
        scene.camera_mut().yaw = degrees.to_radians();
        let eye = scene.camera().position();
        let toward_eye = Vec3::new(eye.x, 0.0, eye.z).normalize();

        let point = scene
            .pointer_at(cursor, viewport)
            .unwrap_or_else(|| panic!("cursor over the tree missed at yaw {}", degrees));
        let flat = Vec3::new(point.x, 0.0, point.z);
        assert!(
            flat.normalize().dot(toward_eye) > 0.5,
            "yaw {}: {:?} is not on the visible side",
            degrees,
            point
        );
    }
}

// ============================================================================
// Presets
// ============================================================================

#[test]
fn test_preset_json_roundtrip() {
    let preset = VisualPreset::tap().with_seed(Some(4));
    let json = preset.to_json_string().unwrap();
    assert_eq!(VisualPreset::from_json_str(&json).unwrap(), preset);
}

#[test]
fn test_partial_preset_uses_defaults() {
    let preset = VisualPreset::from_json_str(r#"{ "name": "sparse", "foliage_count": 100 }"#).unwrap();
    assert_eq!(preset.name, "sparse");
    assert_eq!(preset.foliage_count, 100);
    assert_eq!(preset.ornament_count(), VisualPreset::grand().ornament_count());
}

#[test]
fn test_invalid_preset_file() {
    let err = VisualPreset::from_json_str(r#"{ "tap_slop": -2.0 }"#).unwrap_err();
    assert!(matches!(err, PresetError::Invalid(ConfigError::Negative { .. })));

    let err = VisualPreset::from_json_str("{ not json").unwrap_err();
    assert!(matches!(err, PresetError::Json(_)));

    let err = VisualPreset::load("/definitely/not/here.json").unwrap_err();
    assert!(matches!(err, PresetError::Io(_)));
}

#[test]
fn test_snapshot_buffers() {
    let mut scene = TreeScene::new(&test_preset(VisualPreset::grand())).unwrap();
    let snapshot = scene.step(DT, DT);
    assert_eq!(snapshot.foliage.vertices.len(), 2_000);
    assert_eq!(snapshot.foliage.slots.len(), 2_000);
    assert_eq!(snapshot.ornament_count(), 1_220);
    assert_eq!(snapshot.star_lights.len(), 60);
    assert_eq!(bytemuck_len(snapshot.foliage.vertices), 2_000 * 16);
}

fn bytemuck_len(vertices: &[evergreen::FoliageVertex]) -> usize {
    evergreen::bytemuck::cast_slice::<_, u8>(vertices).len()
}
