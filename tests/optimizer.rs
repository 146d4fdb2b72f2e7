//! end-to-end optimizer runs against the real CPU rasterizer

use polyvolve::engine::Engine;
use polyvolve::render::CpuRenderer;
use polyvolve::settings::{Settings, StopSettings};

fn flat_target(width: u32, height: u32, rgba: [u8; 4]) -> Vec<u8> {
    (0..width * height).flat_map(|_| rgba).collect()
}

fn engine_for(target: Vec<u8>, width: u32, height: u32, settings: Settings) -> Engine {
    Engine::new(
        target,
        width,
        height,
        settings,
        Box::new(CpuRenderer::default()),
    )
    .unwrap()
}

#[test]
fn monotone_convergence_on_flat_target() {
    // three triangles chasing a flat-color 10x10 target; the match must never
    // regress across 1000 rounds and climbs toward (without needing to reach) 100
    let settings = Settings {
        polygon_count: 3,
        vertex_count: 3,
        seed: 42,
        ..Default::default()
    };
    let mut engine = engine_for(flat_target(10, 10, [40, 90, 200, 255]), 10, 10, settings);

    let initial = engine.last_match;
    let mut prev = initial;
    for _ in 0..1000 {
        let out = engine.step().unwrap();
        assert!(
            out.match_percent >= prev,
            "match regressed: {} -> {}",
            prev,
            out.match_percent
        );
        prev = out.match_percent;
    }

    assert!(engine.breakthroughs > 0, "1000 rounds found no improvement");
    assert!(engine.last_match > initial);
    assert!(engine.last_match <= 100.0);
    assert_eq!(engine.mutations, 1000);
}

#[test]
fn seeded_runs_are_reproducible() {
    let settings = Settings {
        polygon_count: 4,
        vertex_count: 3,
        seed: 7,
        stop: StopSettings {
            max_rounds: Some(300),
            ..Default::default()
        },
        ..Default::default()
    };

    let mut a = engine_for(flat_target(8, 8, [200, 30, 30, 255]), 8, 8, settings.clone());
    let mut b = engine_for(flat_target(8, 8, [200, 30, 30, 255]), 8, 8, settings);
    a.run().unwrap();
    b.run().unwrap();

    assert_eq!(a.last_match, b.last_match);
    assert_eq!(a.breakthroughs, b.breakthroughs);
    assert_eq!(
        serde_json::to_string(&a.genome).unwrap(),
        serde_json::to_string(&b.genome).unwrap()
    );
}

#[test]
fn target_match_stop_halts_early() {
    // a plain white target is trivially matchable: the white canvas alone scores
    // 100, so random translucent polygons start high and climb fast
    let settings = Settings {
        polygon_count: 3,
        vertex_count: 3,
        seed: 9,
        stop: StopSettings {
            target_match: Some(90.0),
            max_rounds: Some(200_000),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut engine = engine_for(flat_target(10, 10, [255, 255, 255, 255]), 10, 10, settings);

    engine.run().unwrap();
    assert!(engine.last_match >= 90.0);
    assert!(engine.mutations < 200_000);
}

#[test]
fn composite_tracks_accepted_state() {
    let settings = Settings {
        polygon_count: 3,
        vertex_count: 3,
        seed: 3,
        stop: StopSettings {
            max_rounds: Some(500),
            ..Default::default()
        },
        ..Default::default()
    };
    let mut engine = engine_for(flat_target(10, 10, [0, 128, 64, 255]), 10, 10, settings);
    engine.run().unwrap();

    // re-rendering the final genome reproduces the engine's current composite
    let mut renderer = CpuRenderer::default();
    use polyvolve::render::Renderer;
    assert_eq!(renderer.render(&engine.genome), engine.current_rgba);

    // no polygon is left holding a snapshot between rounds
    assert!(engine.genome.polys.iter().all(|p| !p.is_pending()));
}
