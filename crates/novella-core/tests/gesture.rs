//! Gesture detector behaviour over realistic pointer sequences.

use novella_core::gesture::{classify, Direction, GestureDetector, SwipeConfig};
use novella_core::input::PointerEvent;
use novella_core::types::Point;
use std::time::Duration;

/// A quick drag of (+150, +10) in 300 ms is a right swipe and nothing else.
#[test]
fn short_right_drag_matches_right_only() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    let events = [
        PointerEvent::down((100.0, 100.0), 1_000),
        PointerEvent::moved((170.0, 104.0), 1_150),
        PointerEvent::up((250.0, 110.0), 1_300),
    ];

    let mut result = None;
    for event in &events {
        result = detector.on_pointer_event(event, &Direction::Right);
    }
    assert_eq!(result, Some(true));

    let stroke_matches = |direction: Direction| {
        classify(
            &direction,
            Point::new(100.0, 100.0),
            Point::new(250.0, 110.0),
            Duration::from_millis(300),
            &SwipeConfig::default(),
        )
    };
    assert!(!stroke_matches(Direction::RightUp));
    assert!(!stroke_matches(Direction::Up));
    assert!(!stroke_matches(Direction::Left));
}

/// Moves and releases before any press produce nothing.
#[test]
fn release_without_press_is_ignored() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    assert_eq!(
        detector.on_pointer_event(&PointerEvent::moved((10.0, 10.0), 5), &Direction::Right),
        None
    );
    assert_eq!(
        detector.on_pointer_event(&PointerEvent::up((300.0, 10.0), 10), &Direction::Right),
        None
    );
    assert!(detector.trail().is_empty());
}

/// The trail grows while pressed and is cleared on release and on reset.
#[test]
fn trail_follows_the_stroke() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    detector.track(&PointerEvent::down((0.0, 0.0), 0));
    detector.track(&PointerEvent::moved((10.0, 0.0), 10));
    detector.track(&PointerEvent::moved((20.0, 0.0), 20));
    assert_eq!(detector.trail().len(), 3);
    assert!(detector.is_pressed());

    detector.reset();
    assert!(detector.trail().is_empty());
    assert!(!detector.is_pressed());
    assert!(detector.track(&PointerEvent::up((200.0, 0.0), 30)).is_none());
}

/// Only the endpoints count; a wandering path still classifies by its net motion.
#[test]
fn intermediate_points_do_not_change_the_verdict() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    detector.track(&PointerEvent::down((400.0, 400.0), 0));
    for (i, (x, y)) in [(600.0, 100.0), (100.0, 700.0), (380.0, 300.0)].iter().enumerate() {
        detector.track(&PointerEvent::moved((*x, *y), 50 * (i as u64 + 1)));
    }
    let verdict = detector.on_pointer_event(&PointerEvent::up((410.0, 250.0), 400), &Direction::Up);
    assert_eq!(verdict, Some(true));
}

/// A press-release after the time limit fails every direction.
#[test]
fn slow_swipe_fails() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    detector.track(&PointerEvent::down((0.0, 300.0), 0));
    let verdict =
        detector.on_pointer_event(&PointerEvent::up((400.0, 300.0), 1_500), &Direction::Right);
    assert_eq!(verdict, Some(false));
}

/// Direction tags round-trip through their string form, unknown ones included.
#[test]
fn direction_tags_round_trip_through_json() {
    let parsed: Vec<Direction> =
        serde_json::from_str(r#"["right_up", "left_down", "sideways"]"#).unwrap();
    assert_eq!(parsed[0], Direction::RightUp);
    assert_eq!(parsed[1], Direction::LeftDown);
    assert_eq!(parsed[2], Direction::Unrecognized("sideways".into()));
    assert!(parsed[2].rule().is_none());
    assert_eq!(
        serde_json::to_string(&parsed).unwrap(),
        r#"["right_up","left_down","sideways"]"#
    );
}

/// A rejected release leaves no stroke behind: later moves are not recorded
/// and a stray release yields nothing.
#[test]
fn rejected_release_clears_the_stroke() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    detector.track(&PointerEvent::down((0.0, 300.0), 0));
    detector.track(&PointerEvent::moved((200.0, 300.0), 700));
    assert_eq!(detector.trail().len(), 2);

    let verdict =
        detector.on_pointer_event(&PointerEvent::up((400.0, 300.0), 1_500), &Direction::Right);
    assert_eq!(verdict, Some(false));
    assert!(!detector.is_pressed());
    assert!(detector.trail().is_empty());

    detector.track(&PointerEvent::moved((420.0, 300.0), 1_600));
    assert!(detector.trail().is_empty());
    assert_eq!(
        detector.on_pointer_event(&PointerEvent::up((430.0, 300.0), 1_700), &Direction::Right),
        None
    );
}

/// Replaying the same stroke on one detector gives the same verdict each time.
#[test]
fn repeated_strokes_classify_identically() {
    let mut detector = GestureDetector::new(SwipeConfig::default());
    let strokes: [((f32, f32), (f32, f32), u64, Option<bool>); 3] = [
        ((100.0, 100.0), (250.0, 110.0), 300, Some(true)),
        ((100.0, 100.0), (110.0, 250.0), 300, Some(false)),
        ((0.0, 0.0), (400.0, 0.0), 1_500, Some(false)),
    ];

    for (from, to, ms, expected) in strokes {
        for round in 0..3u64 {
            let base = round * 10_000;
            detector.track(&PointerEvent::down(from, base));
            let verdict =
                detector.on_pointer_event(&PointerEvent::up(to, base + ms), &Direction::Right);
            assert_eq!(verdict, expected, "{from:?} -> {to:?} in {ms} ms, round {round}");
            assert!(!detector.is_pressed());
        }
    }
}
