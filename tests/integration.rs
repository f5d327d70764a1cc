use content_aware_resize::{
    process_directory, process_file, resize, CancelToken, CarveOrder, Error, PixelBuffer,
    ProcessOptions, ProtectionMask, Rect, ResizeRequest, ResizeSession,
};
use image::{Rgb, RgbImage};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn solid(width: u32, height: u32) -> PixelBuffer {
    PixelBuffer::from_rgb(RgbImage::from_pixel(width, height, Rgb([40, 120, 200])))
}

/// Deterministic pseudo-random image whose blue channel stays below 200.
fn noise(width: u32, height: u32, seed: u32) -> PixelBuffer {
    let mut state = seed;
    let mut next = move || {
        state = state.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        (state >> 16) as u8
    };
    let img = RgbImage::from_fn(width, height, |_, _| {
        let (r, g, b) = (next(), next(), next());
        Rgb([r, g, b % 200])
    });
    PixelBuffer::from_rgb(img)
}

/// Paint a full-height band of marker pixels (blue = 255) over `x0..x1`.
fn with_marker_band(buf: &PixelBuffer, x0: u32, x1: u32) -> PixelBuffer {
    let mut img = buf.clone().into_dynamic().to_rgb8();
    for y in 0..img.height() {
        for x in x0..x1 {
            #[allow(clippy::cast_possible_truncation)]
            img.put_pixel(x, y, Rgb([x as u8, y as u8, 255]));
        }
    }
    PixelBuffer::from_rgb(img)
}

#[test]
fn flat_image_loses_exactly_twenty_columns() {
    init_logging();
    let src = solid(100, 100);
    let mut seen = Vec::new();
    let mut on_progress = |p: f32| seen.push(p);

    let out = resize(ResizeRequest::new(&src, 80, 100).with_progress(&mut on_progress)).unwrap();

    assert_eq!((out.width(), out.height()), (80, 100));
    assert_eq!(out.data().len(), 80 * 100 * 3);
    assert!(out.data().chunks_exact(3).all(|px| px == [40, 120, 200]));
    // One progress report per seam.
    assert_eq!(seen.len(), 20);
}

#[test]
fn protection_wider_than_target_is_rejected() {
    let src = noise(100, 100, 1);
    let mask = ProtectionMask::from_regions(100, 100, &[Rect::new(10, 0, 81, 100)]);
    let err = resize(ResizeRequest::new(&src, 50, 100).with_mask(&mask)).unwrap_err();
    assert!(matches!(
        err,
        Error::ProtectionUnsatisfiable {
            protected_width: 81,
            target_width: 50,
            ..
        }
    ));
}

#[test]
fn protected_band_survives_intact() {
    init_logging();
    let src = with_marker_band(&noise(100, 100, 2), 40, 61);
    let mask = ProtectionMask::from_regions(100, 100, &[Rect::new(40, 0, 21, 100)]);

    let out = resize(ResizeRequest::new(&src, 50, 100).with_mask(&mask)).unwrap();

    assert_eq!((out.width(), out.height()), (50, 100));
    for y in 0..out.height() {
        let band: Vec<&[u8]> = (0..out.width())
            .map(|x| out.pixel(x, y))
            .filter(|px| px[2] == 255)
            .collect();
        assert_eq!(band.len(), 21, "row {y} lost protected pixels");
        for (i, px) in band.iter().enumerate() {
            assert_eq!(usize::from(px[0]), 40 + i, "row {y} reordered");
            assert_eq!(u32::from(px[1]), y);
        }
    }
}

#[test]
fn protected_block_survives_two_axis_shrink() {
    let src = noise(60, 48, 3);
    let logo = Rect::new(20, 15, 12, 10);
    let mask = ProtectionMask::from_regions(60, 48, &[logo]);
    let expected: Vec<Vec<u8>> = (logo.y..logo.bottom())
        .flat_map(|y| (logo.x..logo.right()).map(move |x| (x, y)))
        .map(|(x, y)| src.pixel(x, y).to_vec())
        .collect();

    for order in [CarveOrder::WidthFirst, CarveOrder::HeightFirst] {
        let out = resize(
            ResizeRequest::new(&src, 40, 30)
                .with_mask(&mask)
                .with_order(order),
        )
        .unwrap();
        assert_eq!((out.width(), out.height()), (40, 30));

        // The logo is a rectangle, so seams only ever pass fully around it
        // and it stays a contiguous block somewhere in the output.
        let found = (0..=out.height() - logo.height).any(|oy| {
            (0..=out.width() - logo.width).any(|ox| {
                let mut i = 0;
                (0..logo.height).all(|dy| {
                    (0..logo.width).all(|dx| {
                        let ok = out.pixel(ox + dx, oy + dy) == expected[i].as_slice();
                        i += 1;
                        ok
                    })
                })
            })
        });
        assert!(found, "logo block not preserved with {order:?}");
    }
}

#[test]
fn resizing_is_deterministic() {
    let src = noise(64, 40, 4);
    let mask = ProtectionMask::from_regions(64, 40, &[Rect::new(5, 5, 10, 10)]);
    let run = || resize(ResizeRequest::new(&src, 45, 31).with_mask(&mask)).unwrap();
    assert_eq!(run(), run());
}

#[test]
fn resizing_a_result_to_its_own_size_is_a_no_op() {
    let src = noise(30, 30, 5);
    let once = resize(ResizeRequest::new(&src, 21, 24)).unwrap();
    let twice = resize(ResizeRequest::new(&once, 21, 24)).unwrap();
    assert_eq!(once, twice);
    assert_eq!(resize(ResizeRequest::new(&src, 30, 30)).unwrap(), src);
}

#[test]
fn enlargement_is_rejected() {
    let src = solid(10, 10);
    let err = resize(ResizeRequest::new(&src, 12, 10)).unwrap_err();
    assert!(matches!(err, Error::InvalidRequest(_)));
}

#[test]
fn progress_is_monotonic_and_ends_at_100() {
    let src = noise(30, 20, 6);
    let mut seen = Vec::new();
    let mut on_progress = |p: f32| seen.push(p);
    resize(ResizeRequest::new(&src, 22, 15).with_progress(&mut on_progress)).unwrap();

    assert_eq!(seen.len(), 13);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
    assert!(seen.iter().all(|p| (0.0..=100.0).contains(p)));
    assert_eq!(seen.last().copied(), Some(100.0));
}

#[test]
fn cancellation_after_five_seams_returns_nothing() {
    let src = solid(100, 100);
    let token = CancelToken::new();
    let trigger = token.clone();
    let mut calls = 0;
    let mut on_progress = |p: f32| {
        calls += 1;
        if p >= 25.0 {
            trigger.cancel();
        }
    };

    let result = resize(
        ResizeRequest::new(&src, 80, 100)
            .with_progress(&mut on_progress)
            .with_cancel(&token),
    );

    assert!(matches!(result, Err(Error::Cancelled)));
    assert_eq!(calls, 5);
    // The caller's buffer is untouched.
    assert_eq!(src, solid(100, 100));
}

#[test]
fn new_session_job_supersedes_the_running_one() {
    let session = ResizeSession::new();
    let src = noise(40, 40, 7);

    let stale = session.begin();
    let fresh = session.begin();

    let err = resize(ResizeRequest::new(&src, 30, 30).with_cancel(&stale)).unwrap_err();
    assert!(err.is_cancelled());
    let out = resize(ResizeRequest::new(&src, 30, 30).with_cancel(&fresh)).unwrap();
    assert_eq!((out.width(), out.height()), (30, 30));
}

#[test]
fn rgba_images_keep_their_alpha() {
    let img = image::RgbaImage::from_fn(20, 10, |x, _| image::Rgba([0, 0, 0, (x * 10) as u8]));
    let src = PixelBuffer::from_rgba(img);
    let out = resize(ResizeRequest::new(&src, 15, 8)).unwrap();
    assert_eq!(out.channels(), 4);
    assert_eq!(out.data().len(), 15 * 8 * 4);
}

#[test]
fn process_file_writes_resized_png() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("banner.png");
    let output = dir.path().join("out").join("banner.png");
    noise(50, 40, 8).into_dynamic().save(&input).unwrap();

    let opts = ProcessOptions {
        width_percent: 80.0,
        height_percent: 50.0,
        protect: vec![Rect::new(5, 5, 10, 10)],
        ..ProcessOptions::default()
    };
    let result = process_file(&input, &output, &opts);

    assert!(result.success, "{}", result.message);
    assert!(!result.skipped);
    assert_eq!(result.output_size, Some((40, 20)));
    let written = image::open(&output).unwrap();
    assert_eq!((written.width(), written.height()), (40, 20));
}

#[test]
fn process_file_skips_full_size_and_reports_failures() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("logo.png");
    solid(20, 20).into_dynamic().save(&input).unwrap();

    let skipped = process_file(&input, &dir.path().join("x.png"), &ProcessOptions::default());
    assert!(skipped.success && skipped.skipped);

    let opts = ProcessOptions {
        width_percent: 50.0,
        protect: vec![Rect::new(0, 0, 15, 5)],
        ..ProcessOptions::default()
    };
    let failed = process_file(&input, &dir.path().join("y.png"), &opts);
    assert!(!failed.success);
    assert!(failed.message.contains("does not fit"), "{}", failed.message);

    let missing = process_file(
        &dir.path().join("nope.png"),
        &dir.path().join("z.png"),
        &ProcessOptions::default(),
    );
    assert!(!missing.success);
}

#[test]
fn process_file_reports_cancellation_without_writing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("photo.png");
    let output = dir.path().join("photo_resized.png");
    noise(30, 20, 9).into_dynamic().save(&input).unwrap();

    let token = CancelToken::new();
    token.cancel();
    let opts = ProcessOptions {
        width_percent: 50.0,
        cancel: Some(token),
        ..ProcessOptions::default()
    };
    let result = process_file(&input, &output, &opts);

    assert!(result.cancelled);
    assert!(!result.success && !result.skipped);
    assert_eq!(result.output_size, None);
    assert!(!output.exists());
}

#[test]
fn process_directory_resizes_every_supported_image() {
    let dir = tempfile::tempdir().unwrap();
    let input_dir = dir.path().join("in");
    let output_dir = dir.path().join("out");
    std::fs::create_dir_all(&input_dir).unwrap();
    for (i, name) in ["a.png", "b.bmp"].iter().enumerate() {
        #[allow(clippy::cast_possible_truncation)]
        noise(24, 24, i as u32)
            .into_dynamic()
            .save(input_dir.join(name))
            .unwrap();
    }
    std::fs::write(input_dir.join("notes.txt"), "not an image").unwrap();

    let opts = ProcessOptions {
        width_percent: 50.0,
        ..ProcessOptions::default()
    };
    let results = process_directory(&input_dir, &output_dir, &opts);

    assert_eq!(results.len(), 2);
    assert!(results.iter().all(|r| r.success && r.output_size == Some((12, 24))));
    assert!(output_dir.join("a.png").exists());
    assert!(output_dir.join("b.bmp").exists());
}
