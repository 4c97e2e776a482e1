//! Axis-aligned longitude/latitude rectangles and the two ways they are cut up:
//! a uniform `rows × cols` grid for seeding and a quadrant split for refinement.
//!
//! The `Display` form `west,south,east,north` doubles as the upstream `rect`
//! query parameter and as the key of processed-region markers.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};
use crate::geo::GeoPoint;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RegionBounds")]
pub struct Region {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

#[derive(Debug, Clone, Copy, Deserialize)]
struct RegionBounds {
    west: f64,
    south: f64,
    east: f64,
    north: f64,
}

impl TryFrom<RegionBounds> for Region {
    type Error = Error;
    fn try_from(b: RegionBounds) -> Result<Self> { Region::new(b.west, b.south, b.east, b.north) }
}

impl Region {
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self> {
        let region = Self { west, south, east, north };
        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(Error::InvalidRegion(format!("non-finite bounds {region}")));
        }
        if west >= east || south >= north {
            return Err(Error::InvalidRegion(format!("inverted or empty bounds {region}")));
        }
        Ok(region)
    }

    /// Bounding box of Seoul, the default discovery root.
    pub fn seoul() -> Self {
        Self { west: 126.734_086, south: 37.413_294, east: 127.269_311, north: 37.715_133 }
    }

    pub fn west(&self) -> f64 { self.west }
    pub fn south(&self) -> f64 { self.south }
    pub fn east(&self) -> f64 { self.east }
    pub fn north(&self) -> f64 { self.north }

    pub fn width(&self) -> f64 { self.east - self.west }
    pub fn height(&self) -> f64 { self.north - self.south }
    pub fn area(&self) -> f64 { self.width() * self.height() }

    pub fn center(&self) -> GeoPoint {
        GeoPoint { lat: self.south + self.height() / 2.0, lon: self.west + self.width() / 2.0 }
    }

    /// Closed containment; points on a shared edge belong to both neighbours.
    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lon >= self.west && p.lon <= self.east && p.lat >= self.south && p.lat <= self.north
    }

    /// Tiles the region into `rows × cols` cells, row-major from the south-west corner.
    /// The last row and column snap to the parent's north and east edges so the union
    /// is exact regardless of floating-point step error.
    pub fn grid(&self, rows: u32, cols: u32) -> Result<Vec<Region>> {
        if rows == 0 || cols == 0 {
            return Err(Error::InvalidArgument(format!("grid needs positive rows and cols, got {rows}x{cols}")));
        }
        let lat_step = self.height() / f64::from(rows);
        let lon_step = self.width() / f64::from(cols);
        let mut cells = Vec::with_capacity((rows as usize) * (cols as usize));
        for i in 0..rows {
            let south = self.south + lat_step * f64::from(i);
            let north = if i == rows - 1 { self.north } else { self.south + lat_step * f64::from(i + 1) };
            for j in 0..cols {
                let west = self.west + lon_step * f64::from(j);
                let east = if j == cols - 1 { self.east } else { self.west + lon_step * f64::from(j + 1) };
                let cell = Region::new(west, south, east, north)
                    .map_err(|_| Error::InvalidArgument(format!("{rows}x{cols} grid is finer than {self} can resolve")))?;
                cells.push(cell);
            }
        }
        Ok(cells)
    }

    /// Splits around the midpoint into `[SW, SE, NW, NE]`.
    pub fn quad_split(&self) -> [Region; 4] {
        let mid_lon = self.west + self.width() / 2.0;
        let mid_lat = self.south + self.height() / 2.0;
        [
            Region { west: self.west, south: self.south, east: mid_lon, north: mid_lat },
            Region { west: mid_lon, south: self.south, east: self.east, north: mid_lat },
            Region { west: self.west, south: mid_lat, east: mid_lon, north: self.north },
            Region { west: mid_lon, south: mid_lat, east: self.east, north: self.north },
        ]
    }

    /// False once floating-point resolution no longer yields four non-empty quadrants.
    pub fn is_splittable(&self) -> bool {
        let mid_lon = self.west + self.width() / 2.0;
        let mid_lat = self.south + self.height() / 2.0;
        mid_lon > self.west && mid_lon < self.east && mid_lat > self.south && mid_lat < self.north
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}

impl FromStr for Region {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(Error::InvalidRegion(format!("expected west,south,east,north, got '{s}'")));
        }
        let mut v = [0f64; 4];
        for (slot, part) in v.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| Error::InvalidRegion(format!("bad coordinate '{part}' in '{s}'")))?;
        }
        Region::new(v[0], v[1], v[2], v[3])
    }
}
