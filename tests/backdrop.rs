use mission_presenter::engine::pointer::{
    Backdrop, BackdropTuning, Orientation, PointerCell, PointerVector, normalize, orient,
};

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() < 1e-3
}

#[test]
fn tilt_converges_to_the_pointer() {
    let tuning = BackdropTuning::default();
    let pointer = PointerVector { x: 1.0, y: -0.5 };
    let mut o = Orientation::default();
    for _ in 0..200 {
        o = orient(o, pointer, 0.016, &tuning);
    }
    assert!(close(o.tilt_y, 0.25), "tilt_y {}", o.tilt_y);
    assert!(close(o.tilt_x, -0.125), "tilt_x {}", o.tilt_x);
}

#[test]
fn spin_accumulates_with_time_only() {
    let tuning = BackdropTuning::default();
    let mut o = Orientation::default();
    for _ in 0..100 {
        o = orient(o, PointerVector::default(), 0.5, &tuning);
    }
    assert!(close(o.spin, 2.0), "spin {}", o.spin);
    assert!(close(o.yaw(), 2.0));
}

#[test]
fn normalize_maps_corners_and_clamps() {
    let top_left = normalize(0.0, 0.0, 80.0, 24.0);
    assert_eq!((top_left.x, top_left.y), (-1.0, 1.0));
    let bottom_right = normalize(80.0, 24.0, 80.0, 24.0);
    assert_eq!((bottom_right.x, bottom_right.y), (1.0, -1.0));
    let outside = normalize(500.0, -10.0, 80.0, 24.0);
    assert_eq!((outside.x, outside.y), (1.0, 1.0));
    assert_eq!(normalize(5.0, 5.0, 0.0, 0.0), PointerVector::default());
}

#[test]
fn unmounted_backdrop_stops_reading_the_pointer() {
    let cell = PointerCell::new();
    let mut backdrop = Backdrop::mount(cell.clone(), BackdropTuning::default(), true);
    cell.write(PointerVector { x: 1.0, y: 1.0 });
    assert!(backdrop.tick(0.016).is_some());
    let frozen = backdrop.orientation();

    backdrop.unmount();
    cell.write(PointerVector { x: -1.0, y: -1.0 });
    assert_eq!(backdrop.tick(0.016), None);
    assert_eq!(backdrop.orientation(), frozen);
    assert!(!backdrop.is_mounted());
}
