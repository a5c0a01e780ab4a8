use approx::assert_relative_eq;
use facewarp_image::Image;
use facewarp_imgwarp::{
    AffineDeformation, ExecutionStrategy, Point, SamplingMode, WarpConfig, WarpError, Warper,
};
use rand::{rngs::StdRng, Rng, SeedableRng};

const RED: [u8; 4] = [255, 0, 0, 255];

fn random_image(width: usize, height: usize, seed: u64) -> Image<u8, 4> {
    let mut rng = StdRng::seed_from_u64(seed);
    let data = (0..width * height * 4).map(|_| rng.random::<u8>()).collect();
    Image::new([width, height].into(), data).unwrap()
}

fn face_landmarks() -> (Vec<Point>, Vec<Point>) {
    let from = vec![
        Point::new(30.0, 35.0),
        Point::new(70.0, 35.0),
        Point::new(50.0, 55.0),
        Point::new(35.0, 75.0),
        Point::new(65.0, 75.0),
    ];
    let to = vec![
        Point::new(28.0, 33.0),
        Point::new(73.0, 36.0),
        Point::new(50.0, 50.0),
        Point::new(32.0, 80.0),
        Point::new(68.0, 78.0),
    ];
    (from, to)
}

// each landmark is less than a pixel away from a vertex of a 10 px grid
fn landmarks_near_vertices() -> Vec<Point> {
    vec![
        Point::new(40.5, 40.0),
        Point::new(70.0, 39.7),
        Point::new(50.2, 70.9),
        Point::new(29.6, 60.3),
        Point::new(60.25, 59.8),
    ]
}

#[test]
fn test_warp_identity() {
    let src = random_image(67, 45, 42);
    let points = vec![
        Point::new(10.0, 10.0),
        Point::new(50.0, 12.0),
        Point::new(30.0, 40.0),
        Point::new(60.0, 30.0),
    ];

    let warper = Warper::new(src.size(), WarpConfig::default()).unwrap();
    let dst = warper.warp(&src, &points, &points).unwrap();

    assert_eq!(dst, src);
}

#[test]
fn test_warp_translation() {
    let src = Image::<u8, 4>::from_size_pixel([100, 100].into(), RED).unwrap();
    let warper = Warper::new(src.size(), WarpConfig::default()).unwrap();

    let dst = warper
        .warp(&src, &[Point::new(50.0, 50.0)], &[Point::new(60.0, 45.0)])
        .unwrap();

    for y in 0..100 {
        for x in 0..100 {
            let expected = if x >= 10 && y < 95 { RED } else { [0; 4] };
            assert_eq!(dst.get_pixel(x, y).unwrap(), &expected, "pixel ({x}, {y})");
        }
    }
}

#[test]
fn test_warp_fill_color() {
    let src = Image::<u8, 4>::from_size_pixel([40, 40].into(), RED).unwrap();
    let fill = [0, 0, 255, 128];
    let warper = Warper::new(src.size(), WarpConfig::default().with_fill_color(fill)).unwrap();

    let dst = warper
        .warp(&src, &[Point::new(20.0, 20.0)], &[Point::new(10.0, 20.0)])
        .unwrap();

    assert_eq!(dst.get_pixel(0, 20).unwrap(), &RED);
    assert_eq!(dst.get_pixel(29, 20).unwrap(), &RED);
    assert_eq!(dst.get_pixel(30, 20).unwrap(), &fill);
    assert_eq!(dst.get_pixel(39, 0).unwrap(), &fill);
}

#[test]
fn test_warp_is_deterministic() {
    let src = random_image(100, 100, 3);
    let (from, to) = face_landmarks();

    let serial = Warper::new(
        src.size(),
        WarpConfig::default().with_strategy(ExecutionStrategy::Serial),
    )
    .unwrap()
    .warp(&src, &from, &to)
    .unwrap();

    for strategy in [ExecutionStrategy::ParallelCells, ExecutionStrategy::Fixed(2)] {
        let warper = Warper::new(src.size(), WarpConfig::default().with_strategy(strategy)).unwrap();
        let first = warper.warp(&src, &from, &to).unwrap();
        let second = warper.warp(&src, &from, &to).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, serial);
    }
}

#[test]
fn test_warp_output_within_source() {
    let src = random_image(100, 80, 9);
    let (from, to) = face_landmarks();
    let fill = [1, 2, 3, 4];

    let warper = Warper::new(
        src.size(),
        WarpConfig::default().with_grid_size(7).with_fill_color(fill),
    )
    .unwrap();
    let dst = warper.warp(&src, &from, &to).unwrap();

    assert_eq!(dst.size(), src.size());

    let source_pixels = src.as_slice().chunks_exact(4).collect::<Vec<_>>();
    assert!(dst
        .as_slice()
        .chunks_exact(4)
        .all(|pixel| pixel == fill || source_pixels.contains(&pixel)));
}

#[test]
fn test_warp_moves_landmarks() {
    let (width, height) = (100, 100);
    let data = (0..height)
        .flat_map(|y| (0..width).flat_map(move |x| [x as u8, y as u8, 0, 255]))
        .collect();
    let src = Image::<u8, 4>::new([width, height].into(), data).unwrap();
    let (from, to) = face_landmarks();

    let warper = Warper::new(src.size(), WarpConfig::default().with_grid_size(1)).unwrap();
    let dst = warper.warp(&src, &from, &to).unwrap();

    // with one pixel cells every landmark is a grid vertex and samples its source exactly
    for (p, q) in from.iter().zip(to.iter()) {
        let pixel = dst.get_pixel(q.x as usize, q.y as usize).unwrap();
        assert_eq!(pixel, &[p.x as u8, p.y as u8, 0, 255]);
    }
}

#[test]
fn test_warp_bilinear_constant_image() {
    let src = Image::<u8, 4>::from_size_pixel([64, 48].into(), [200, 100, 50, 255]).unwrap();
    let (from, to) = face_landmarks();

    let warper = Warper::new(
        src.size(),
        WarpConfig::default().with_sampling(SamplingMode::Bilinear),
    )
    .unwrap();
    let dst = warper.warp(&src, &from, &to).unwrap();

    assert!(dst
        .as_slice()
        .chunks_exact(4)
        .all(|pixel| pixel == [200, 100, 50, 255] || pixel == [0, 0, 0, 0]));
}

#[test]
fn test_warp_duplicate_landmarks() {
    let src = Image::<u8, 4>::from_size_pixel([30, 30].into(), RED).unwrap();
    let warper = Warper::new(src.size(), WarpConfig::default().with_grid_size(7)).unwrap();

    let from = [Point::new(10.0, 10.0), Point::new(20.0, 20.0)];
    let to = [Point::new(15.0, 15.0), Point::new(15.0, 15.0)];

    let res = warper.warp(&src, &from, &to);
    assert!(matches!(res, Err(WarpError::SingularScatter(_, _))));
}

#[test]
fn test_two_point_scale() {
    let deformation = AffineDeformation::new(
        vec![Point::new(40.0, 50.0), Point::new(60.0, 50.0)],
        vec![Point::new(30.0, 50.0), Point::new(70.0, 50.0)],
        1.0,
    )
    .unwrap();

    let mid = deformation.map_point(Point::new(50.0, 50.0)).unwrap();
    assert_relative_eq!(mid.x, 50.0, epsilon = 1e-9);
    assert_relative_eq!(mid.y, 50.0, epsilon = 1e-9);

    // distances along the line to the midpoint double
    let left = deformation.map_point(Point::new(45.0, 50.0)).unwrap();
    assert_relative_eq!(left.x, 40.0, epsilon = 1e-9);
    assert_relative_eq!(left.y, 50.0, epsilon = 1e-9);

    // offsets perpendicular to the control points are kept
    let above = deformation.map_point(Point::new(50.0, 40.0)).unwrap();
    assert_relative_eq!(above.x, 50.0, epsilon = 1e-9);
    assert_relative_eq!(above.y, 40.0, epsilon = 1e-9);

    let control = deformation.map_point(Point::new(60.0, 50.0)).unwrap();
    assert_eq!(control, Point::new(70.0, 50.0));
}

#[test]
fn test_warp_identity_landmarks_near_vertices() {
    let src = random_image(100, 100, 21);
    let points = landmarks_near_vertices();

    for alpha in [1.0, 2.0, 4.0, 8.0] {
        let config = WarpConfig::default().with_grid_size(10).with_alpha(alpha);
        let warper = Warper::new(src.size(), config).unwrap();
        let dst = warper.warp(&src, &points, &points).unwrap();
        assert_eq!(dst, src, "alpha {alpha}");
    }
}

#[test]
fn test_warp_landmarks_near_vertices() {
    let src = random_image(100, 100, 17);
    let to = landmarks_near_vertices();
    let from = vec![
        Point::new(38.3, 41.6),
        Point::new(72.4, 37.1),
        Point::new(49.5, 73.2),
        Point::new(27.9, 61.7),
        Point::new(61.1, 58.4),
    ];
    let fill = [1, 2, 3, 4];
    let source_pixels = src.as_slice().chunks_exact(4).collect::<Vec<_>>();

    for alpha in [1.0, 2.0, 4.0, 8.0] {
        let config = WarpConfig::default()
            .with_grid_size(10)
            .with_alpha(alpha)
            .with_fill_color(fill);
        let warper = Warper::new(src.size(), config).unwrap();

        // every destination landmark pulls from its source landmark
        let deformation = warper.inverse_deformation(&from, &to).unwrap();
        for (p, q) in from.iter().zip(to.iter()) {
            assert_eq!(deformation.map_point(*q).unwrap(), *p);
        }

        let deformed = warper.deform_grid(&from, &to).unwrap();
        assert!(deformed.vertices().iter().all(|v| v.is_finite()));

        let dst = warper.warp(&src, &from, &to).unwrap();
        assert!(dst
            .as_slice()
            .chunks_exact(4)
            .all(|pixel| pixel == fill || source_pixels.contains(&pixel)));
    }
}
