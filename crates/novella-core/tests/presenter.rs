//! Frame placement and orientation.

use novella_core::presenter::{Orientation, Placement, Presenter};
use novella_core::types::Viewport;
use novella_core::video_wrapper::RawFrame;

/// Fitted frames keep their aspect, stay inside the viewport and touch two opposite edges.
#[test]
fn fit_is_aspect_preserving_and_centered() {
    let viewport = Viewport::new(1280, 720);
    for (w, h) in [(1920, 1080), (720, 1280), (640, 480), (3000, 1000), (1280, 720)] {
        let p = Placement::fit(w, h, viewport);
        assert!(p.width <= viewport.width && p.height <= viewport.height, "{w}x{h}");
        assert!(
            p.width == viewport.width || p.height == viewport.height,
            "{w}x{h} touches no edge"
        );
        let expected = w as f64 / h as f64;
        let actual = p.width as f64 / p.height as f64;
        assert!((expected - actual).abs() / expected < 0.01, "{w}x{h}");
        assert_eq!(p.x, (viewport.width as i32 - p.width as i32).div_euclid(2));
        assert_eq!(p.y, (viewport.height as i32 - p.height as i32).div_euclid(2));
    }
}

/// A portrait frame is letterboxed left and right.
#[test]
fn portrait_frame_is_pillarboxed() {
    let p = Placement::fit(720, 1280, Viewport::new(1280, 720));
    assert_eq!(p.height, 720);
    assert_eq!(p.width, 405);
    assert_eq!(p.x, 437);
    assert_eq!(p.y, 0);
}

/// The capture correction composes to the identity, so pixels keep their place.
#[test]
fn presented_pixels_are_not_moved() {
    let mut data = vec![0u8; 3 * 2 * 3];
    data[0..3].copy_from_slice(&[255, 0, 0]);
    data[15..18].copy_from_slice(&[0, 0, 255]);
    let raw = RawFrame::new(3, 2, data).unwrap();

    let mut presenter = Presenter::new(Viewport::new(1280, 720));
    assert!(presenter.orientation().is_identity());
    let frame = presenter.present(&raw, 7);
    assert_eq!((frame.width, frame.height), (3, 2));
    assert_eq!(&frame.pixels[0..4], &[255, 0, 0, 255]);
    assert_eq!(&frame.pixels[20..24], &[0, 0, 255, 255]);
    assert_eq!(frame.frame_index, 7);
}

/// A lone rotation does move pixels, and the cache keeps the latest frame.
#[test]
fn rotation_moves_pixels_and_cache_tracks_latest() {
    let mut data = vec![0u8; 3 * 2 * 3];
    data[0..3].copy_from_slice(&[255, 0, 0]);
    let raw = RawFrame::new(3, 2, data).unwrap();

    let mut presenter =
        Presenter::with_orientation(Viewport::new(1280, 720), Orientation::ROTATE_CW);
    let first_serial = {
        let frame = presenter.present(&raw, 0);
        assert_eq!((frame.width, frame.height), (2, 3));
        // Top-left goes to top-right under a clockwise quarter turn.
        let top_right = 4;
        assert_eq!(&frame.pixels[top_right..top_right + 4], &[255, 0, 0, 255]);
        frame.serial
    };
    presenter.present(&RawFrame::solid(3, 2, [9, 9, 9]), 1);
    let last = presenter.last_frame().unwrap();
    assert_eq!(last.frame_index, 1);
    assert!(last.serial > first_serial);

    presenter.clear();
    assert!(presenter.last_frame().is_none());
}
