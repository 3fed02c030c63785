use std::time::Duration;

use mission_presenter::engine::particles::{FieldConfig, ParticleField, generate};
use rstest::rstest;

#[test]
fn dust_ranges_hold_for_every_descriptor() {
    let config = FieldConfig::timed(4.0, 10.0, 12.0);
    let descriptors = generate(32, &config);
    assert_eq!(descriptors.len(), 32);
    for d in &descriptors {
        assert!((0.0..4.0).contains(&d.start_delay), "delay {}", d.start_delay);
        assert!((10.0..22.0).contains(&d.cycle_duration), "duration {}", d.cycle_duration);
    }
}

#[rstest]
#[case::streaks(FieldConfig::streaks(), 220)]
#[case::dust(FieldConfig::dust(), 32)]
#[case::glyphs(FieldConfig::glyphs(), 14)]
fn presets_draw_inside_their_ranges(#[case] config: FieldConfig, #[case] count: usize) {
    for d in generate(count, &config) {
        assert!(config.position.contains(d.horizontal_position));
        assert!(config.delay.contains(d.start_delay));
        assert!(config.duration.contains(d.cycle_duration));
        assert!(config.size.contains(d.size));
        assert!(config.opacity.contains(d.opacity));
        match (config.accent, d.accent) {
            (Some(span), Some(accent)) => assert!(span.contains(accent)),
            (None, None) => {}
            other => panic!("accent mismatch: {other:?}"),
        }
    }
}

#[test]
fn zero_count_is_empty() {
    assert!(generate(0, &FieldConfig::dust()).is_empty());
}

#[test]
fn mounted_field_is_drawn_once() {
    let field = ParticleField::mount(14, FieldConfig::glyphs(), Duration::ZERO);
    let first = field.descriptors().to_vec();
    let _ = field.samples(Duration::from_secs(3));
    let _ = field.samples(Duration::from_secs(30));
    assert_eq!(field.descriptors(), first.as_slice());
}

#[test]
fn hyperdrive_streaks_run_once() {
    let field = ParticleField::mount(220, FieldConfig::streaks(), Duration::ZERO);
    assert!(!field.samples(Duration::from_millis(100)).is_empty());
    assert!(field.samples(Duration::from_millis(1_900)).is_empty());
}

#[test]
fn looping_fields_never_run_out() {
    let field = ParticleField::mount(32, FieldConfig::dust(), Duration::ZERO);
    let late = Duration::from_secs(600);
    assert_eq!(field.samples(late).len(), 32);
    for sample in field.samples(late) {
        assert!((0.0..=1.0).contains(&sample.travel));
        assert!(sample.rising);
    }
}
