use placedb_core::{GeoPoint, Region};

fn approx(a: f64, b: f64) -> bool { (a - b).abs() < 1e-9 }

#[test]
fn grid_tiles_region_exactly() {
    let root = Region::seoul();
    let cells = root.grid(10, 10).expect("grid");
    assert_eq!(cells.len(), 100);

    let total: f64 = cells.iter().map(Region::area).sum();
    assert!(approx(total, root.area()), "cell areas sum to the parent area");

    // first cell anchored at the south-west corner, last cell snapped to the north-east corner
    assert_eq!(cells[0].west(), root.west());
    assert_eq!(cells[0].south(), root.south());
    assert_eq!(cells[99].east(), root.east());
    assert_eq!(cells[99].north(), root.north());

    // row-major: neighbours share edges exactly
    for row in cells.chunks(10) {
        for pair in row.windows(2) { assert_eq!(pair[0].east(), pair[1].west()); }
    }
    assert_eq!(cells[0].north(), cells[10].south());
}

#[test]
fn grid_rejects_zero_dimensions() {
    let root = Region::seoul();
    assert!(root.grid(0, 3).is_err());
    assert!(root.grid(3, 0).is_err());
}

#[test]
fn quad_split_reconstructs_parent() {
    let r = Region::new(126.9, 37.5, 127.1, 37.6).expect("region");
    let [sw, se, nw, ne] = r.quad_split();

    assert_eq!((sw.west(), sw.south()), (r.west(), r.south()));
    assert_eq!((se.east(), se.south()), (r.east(), r.south()));
    assert_eq!((nw.west(), nw.north()), (r.west(), r.north()));
    assert_eq!((ne.east(), ne.north()), (r.east(), r.north()));
    assert_eq!(sw.east(), se.west());
    assert_eq!(sw.north(), nw.south());

    let total = sw.area() + se.area() + nw.area() + ne.area();
    assert!(approx(total, r.area()));
    assert!(r.is_splittable());
}

#[test]
fn invalid_bounds_are_rejected() {
    assert!(Region::new(127.0, 37.5, 126.0, 37.6).is_err(), "west must be below east");
    assert!(Region::new(126.0, 37.6, 127.0, 37.6).is_err(), "empty height");
    assert!(Region::new(f64::NAN, 37.5, 127.0, 37.6).is_err());
}

#[test]
fn display_and_parse_use_upstream_rect_format() {
    let r = Region::new(126.5, 37.25, 127.0, 37.75).expect("region");
    assert_eq!(r.to_string(), "126.5,37.25,127,37.75");
    let back: Region = "126.5, 37.25, 127, 37.75".parse().expect("parse");
    assert_eq!(back, r);
    assert!("1,2,3".parse::<Region>().is_err());
}

#[test]
fn containment_is_closed_on_every_edge() {
    let r = Region::new(0.0, 0.0, 1.0, 1.0).expect("region");
    assert!(r.contains(&GeoPoint { lat: 1.0, lon: 1.0 }));
    assert!(r.contains(&GeoPoint { lat: 0.5, lon: 0.0 }));
    assert!(!r.contains(&GeoPoint { lat: 1.0001, lon: 0.5 }));
}

#[test]
fn tiny_regions_stop_being_splittable() {
    let r = Region::new(1.0, 1.0, 1.0 + f64::EPSILON, 2.0).expect("region");
    assert!(!r.is_splittable());
}
