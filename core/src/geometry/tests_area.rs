use crate::geometry::{
    circle_area, format_area, format_coordinate, polygon_area, polygon_area_strict, GeometryError,
    LatLng, EARTH_RADIUS_M,
};

fn square(lat0: f64, lng0: f64, side_deg: f64) -> Vec<LatLng> {
    vec![
        LatLng::new(lat0, lng0),
        LatLng::new(lat0, lng0 + side_deg),
        LatLng::new(lat0 + side_deg, lng0 + side_deg),
        LatLng::new(lat0 + side_deg, lng0),
    ]
}

#[test]
fn test_one_degree_square_matches_planar() {
    let area = polygon_area(&square(0.0, 0.0, 1.0)).unwrap();

    // Near the equator one degree spans R·π/180 meters in both directions
    let side = EARTH_RADIUS_M * std::f64::consts::PI / 180.0;
    let planar = side * side;
    assert!(
        ((area - planar) / planar).abs() < 1e-3,
        "area {} should be within 0.1% of planar {}",
        area,
        planar
    );
}

#[test]
fn test_winding_does_not_change_area() {
    let ring = square(10.0, 20.0, 0.5);
    let mut reversed = ring.clone();
    reversed.reverse();

    let a = polygon_area(&ring).unwrap();
    let b = polygon_area(&reversed).unwrap();
    assert!(a > 0.0);
    assert!((a - b).abs() < 1e-6);
}

#[test]
fn test_area_shrinks_with_latitude() {
    let equator = polygon_area(&square(0.0, 0.0, 1.0)).unwrap();
    let north = polygon_area(&square(60.0, 0.0, 1.0)).unwrap();
    assert!(north < equator * 0.55, "1° cell at 60°N should be about half the equatorial one");
}

#[test]
fn test_one_km_rectangle() {
    // 0.009° ≈ 1002 m on each side at the equator
    let area = polygon_area(&square(0.0, 0.0, 0.009)).unwrap();
    assert!((area - 1_000_000.0).abs() < 10_000.0, "area was {}", area);
    assert_eq!(format_area(area), "1.00 km²");
}

#[test]
fn test_degenerate_polygon_is_zero() {
    assert_eq!(polygon_area(&[]).unwrap(), 0.0);
    let two = [LatLng::new(0.0, 0.0), LatLng::new(1.0, 1.0)];
    assert_eq!(polygon_area(&two).unwrap(), 0.0);
    assert_eq!(polygon_area_strict(&two), Err(GeometryError::TooFewVertices(2)));
}

#[test]
fn test_non_finite_vertex_rejected() {
    let ring = [LatLng::new(0.0, 0.0), LatLng::new(f64::NAN, 1.0), LatLng::new(1.0, 0.0)];
    assert!(matches!(
        polygon_area(&ring),
        Err(GeometryError::NonFiniteCoordinate { .. })
    ));
}

#[test]
fn test_circle_area() {
    assert_eq!(circle_area(0.0).unwrap(), 0.0);
    assert!((circle_area(1.0).unwrap() - std::f64::consts::PI).abs() < 1e-12);

    let mut previous = 0.0;
    for r in [0.5, 1.0, 10.0, 250.0, 5_000.0] {
        let a = circle_area(r).unwrap();
        assert!(a > previous);
        previous = a;
    }

    assert_eq!(circle_area(-1.0), Err(GeometryError::InvalidRadius(-1.0)));
    assert!(circle_area(f64::INFINITY).is_err());
}

#[test]
fn test_format_area_thresholds() {
    assert!(format_area(9_999.0).ends_with(" m²"));
    assert_eq!(format_area(9_999.0), "9999 m²");
    assert!(format_area(10_000.0).ends_with(" ha"));
    assert_eq!(format_area(10_000.0), "1.00 ha");
    assert!(format_area(999_999.0).ends_with(" ha"));
    assert!(format_area(1_000_000.0).ends_with(" km²"));
    assert_eq!(format_area(1_000_000.0), "1.00 km²");
    assert_eq!(format_area(0.0), "0 m²");
}

#[test]
fn test_format_coordinate_hemispheres() {
    assert_eq!(format_coordinate(12.9, 77.6), "12.9000° N, 77.6000° E");
    assert_eq!(format_coordinate(-33.86882, -151.20929), "33.8688° S, 151.2093° W");
    assert_eq!(format_coordinate(0.0, 0.0), "0.0000° N, 0.0000° E");
}
