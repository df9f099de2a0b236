use framecheck::{
    FrameCheckError, GrayImage, MotionDetect, MotionEvent, MotionState, PixelLayout, PixelView,
};

const W: usize = 10;
const H: usize = 8;

fn flat_frame(value: u8) -> Vec<u8> {
    vec![value; W * H]
}

/// Flat frame with a 3x3 block of `value` at `(x, y)`; big enough to survive
/// one erosion pass.
fn frame_with_block(background: u8, value: u8, x: usize, y: usize) -> Vec<u8> {
    let mut data = flat_frame(background);
    for dy in 0..3 {
        for dx in 0..3 {
            data[(y + dy) * W + (x + dx)] = value;
        }
    }
    data
}

fn gray_view(data: &[u8]) -> PixelView<'_> {
    PixelView::from_slice(data, W, H, PixelLayout::Gray8).unwrap()
}

#[test]
fn disabled_detector_stays_silent() {
    let detector = MotionDetect::new();
    assert_eq!(detector.state(), MotionState::Initialising);

    let frame = flat_frame(50);
    assert_eq!(detector.process(gray_view(&frame), 1), Ok(None));
    assert_eq!(detector.state(), MotionState::Initialising);
}

#[test]
fn first_frame_after_enabling_is_the_silent_reference() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);
    assert_eq!(detector.state(), MotionState::AcquiringReference);

    let frame = flat_frame(50);
    assert_eq!(detector.process(gray_view(&frame), 1), Ok(None));
    assert_eq!(detector.state(), MotionState::ReferenceAcquired);

    let verdict = detector.process(gray_view(&frame), 2).unwrap().unwrap();
    assert_eq!(
        verdict,
        MotionEvent {
            has_motion: false,
            timestamp: 2,
            masked: false,
            mask_path: None,
        }
    );
}

#[test]
fn a_changed_block_is_motion_and_a_speck_is_not() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);

    let base = flat_frame(50);
    assert_eq!(detector.process(gray_view(&base), 1), Ok(None));

    // single changed pixel: eroded away
    let mut speck = base.clone();
    speck[3 * W + 4] = 255;
    let verdict = detector.process(gray_view(&speck), 2).unwrap().unwrap();
    assert!(!verdict.has_motion);

    // 3x3 changed block against the new reference (the speck frame)
    let block = frame_with_block(50, 255, 4, 3);
    let verdict = detector.process(gray_view(&block), 3).unwrap().unwrap();
    assert!(verdict.has_motion);
}

#[test]
fn each_frame_becomes_the_next_reference() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);

    let a = flat_frame(50);
    let b = frame_with_block(50, 255, 2, 2);
    assert_eq!(detector.process(gray_view(&a), 1), Ok(None));

    let verdict = detector.process(gray_view(&b), 2).unwrap().unwrap();
    assert!(verdict.has_motion);

    // b against b: the reference moved forward regardless of the verdict
    let verdict = detector.process(gray_view(&b), 3).unwrap().unwrap();
    assert!(!verdict.has_motion);
}

#[test]
fn noise_threshold_bounds_the_detectable_change() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);
    // binarization threshold round((1 - 0.9) * 255) = 26
    detector.set_noise_threshold(0.9);

    let base = flat_frame(100);
    assert_eq!(detector.process(gray_view(&base), 1), Ok(None));

    let block_small = frame_with_block(100, 120, 2, 2); // difference 20 < 26
    let verdict = detector.process(gray_view(&block_small), 2).unwrap().unwrap();
    assert!(!verdict.has_motion);

    // fresh position: the previous frame is now the reference
    let block_big = frame_with_block(100, 130, 6, 2); // difference 30 >= 26
    let verdict = detector.process(gray_view(&block_big), 3).unwrap().unwrap();
    assert!(verdict.has_motion);
}

#[test]
fn identical_frames_are_never_motion_even_at_full_tolerance() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);
    detector.set_noise_threshold(1.0);

    let frame = flat_frame(77);
    assert_eq!(detector.process(gray_view(&frame), 1), Ok(None));
    let verdict = detector.process(gray_view(&frame), 2).unwrap().unwrap();
    assert!(!verdict.has_motion);
}

#[test]
fn mask_excludes_regions_from_the_check() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);

    // mask out the left half of the frame
    let mut mask_data = vec![255u8; W * H];
    for row in mask_data.chunks_exact_mut(W) {
        for px in &mut row[..W / 2] {
            *px = 0;
        }
    }
    let mask = GrayImage::new(mask_data, W, H).unwrap();
    detector.set_mask(mask, Some("ticker-mask.png".to_owned()));

    let base = flat_frame(50);
    assert_eq!(detector.process(gray_view(&base), 1), Ok(None));

    // change inside the masked-out half
    let hidden = frame_with_block(50, 255, 1, 2);
    let verdict = detector.process(gray_view(&hidden), 2).unwrap().unwrap();
    assert_eq!(
        verdict,
        MotionEvent {
            has_motion: false,
            timestamp: 2,
            masked: true,
            mask_path: Some("ticker-mask.png".to_owned()),
        }
    );

    // the same change in the unmasked half is reported
    let visible = frame_with_block(50, 255, 6, 2);
    let verdict = detector.process(gray_view(&visible), 3).unwrap().unwrap();
    assert!(verdict.has_motion);
}

#[test]
fn mismatched_mask_fails_at_comparison_time() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);
    detector.set_mask(GrayImage::new(vec![255u8; 4], 2, 2).unwrap(), None);

    let frame = flat_frame(50);
    assert_eq!(detector.process(gray_view(&frame), 1), Ok(None));
    assert_eq!(
        detector.process(gray_view(&frame), 2),
        Err(FrameCheckError::SizeMismatch {
            expected_width: W,
            expected_height: H,
            got_width: 2,
            got_height: 2,
            context: "mask does not match frame",
        })
    );

    // clearing the mask recovers the detector
    detector.clear_mask();
    let verdict = detector.process(gray_view(&frame), 3).unwrap().unwrap();
    assert!(!verdict.has_motion);
}

#[test]
fn re_enabling_reacquires_the_reference() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);

    let a = flat_frame(50);
    let b = frame_with_block(50, 255, 2, 2);
    assert_eq!(detector.process(gray_view(&a), 1), Ok(None));
    assert!(detector.process(gray_view(&a), 2).unwrap().is_some());

    detector.set_enabled(false);
    assert_eq!(detector.process(gray_view(&b), 3), Ok(None));

    // no verdict for the first frame after re-enabling, however different
    detector.set_enabled(true);
    assert_eq!(detector.process(gray_view(&b), 4), Ok(None));
    assert!(detector.process(gray_view(&b), 5).unwrap().is_some());
}

#[test]
fn frame_geometry_change_restarts_acquisition() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);

    let frame = flat_frame(50);
    assert_eq!(detector.process(gray_view(&frame), 1), Ok(None));
    assert!(detector.process(gray_view(&frame), 2).unwrap().is_some());

    // a differently sized frame is stored silently as the new reference
    let small = vec![50u8; 4 * 3];
    let small_view = PixelView::from_slice(&small, 4, 3, PixelLayout::Gray8).unwrap();
    assert_eq!(detector.process(small_view, 3), Ok(None));
    assert!(detector.process(small_view, 4).unwrap().is_some());
}

#[test]
fn color_frames_are_converted_before_comparison() {
    let detector = MotionDetect::new();
    detector.set_enabled(true);

    let base: Vec<u8> = flat_frame(50).iter().flat_map(|&v| [v, v, v]).collect();
    let base_view = PixelView::from_slice(&base, W, H, PixelLayout::Packed24).unwrap();
    assert_eq!(detector.process(base_view, 1), Ok(None));

    let block: Vec<u8> = frame_with_block(50, 255, 4, 3)
        .iter()
        .flat_map(|&v| [v, v, v])
        .collect();
    let block_view = PixelView::from_slice(&block, W, H, PixelLayout::Packed24).unwrap();
    let verdict = detector.process(block_view, 2).unwrap().unwrap();
    assert!(verdict.has_motion);
}
