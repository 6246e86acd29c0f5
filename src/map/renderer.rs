use crate::aggregate::{normalize_key, CategoryCountMap};
use crate::braille::BrailleCanvas;
use crate::data::{CountryFeature, Polygon};
use crate::map::geometry::{draw_line, scanline_crossings};
use crate::map::projection::Viewport;
use crate::map::transition::FillTransition;
use crate::scale::{ColorScale, Rgb, NO_DATA};
use glam::DVec2;
use rayon::prelude::*;
use std::time::Instant;

/// Fill color for a country key under the current counts and scale.
///
/// A key with no entry, or an entry that is not positive, gets `NO_DATA`.
/// Countries whose own key is absent never reach the lookup and fall back
/// the same way.
pub fn fill_for(key: Option<&str>, counts: &CategoryCountMap, scale: &ColorScale) -> Rgb {
    match key.and_then(|k| counts.get(k)) {
        Some(count) if count > 0 => scale.color_for(count as f64),
        _ => NO_DATA,
    }
}

/// One drawn country. Created once per feature; only the fill ever changes.
pub struct CountryShape {
    pub name: String,
    /// Normalized ISO key
    pub key: Option<String>,
    polygons: Vec<Polygon>,
    fill: FillTransition,
}

impl CountryShape {
    /// Project count for this country, 0 when it has none
    pub fn count_in(&self, counts: &CategoryCountMap) -> u32 {
        self.key
            .as_deref()
            .and_then(|k| counts.get(k))
            .unwrap_or(0)
    }
}

/// A polygon in screen space with its vertical extent, tagged by shape
struct ScreenPolygon {
    shape: usize,
    rings: Vec<Vec<DVec2>>,
    min_y: f64,
    max_y: f64,
}

/// Rasterized map for one viewport: which shape covers each character cell,
/// plus the outline layer
pub struct MapRaster {
    cols: usize,
    rows: usize,
    owners: Vec<Option<usize>>,
    borders: BrailleCanvas,
}

impl MapRaster {
    pub fn empty() -> Self {
        Self {
            cols: 0,
            rows: 0,
            owners: Vec::new(),
            borders: BrailleCanvas::new(0, 0),
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Shape under a character cell
    pub fn shape_at(&self, col: usize, row: usize) -> Option<usize> {
        if col >= self.cols || row >= self.rows {
            return None;
        }
        self.owners[row * self.cols + col]
    }

    pub fn borders(&self) -> &BrailleCanvas {
        &self.borders
    }
}

/// Choropleth renderer over a fixed set of country shapes
pub struct MapRenderer {
    shapes: Vec<CountryShape>,
}

impl MapRenderer {
    /// Build one shape per feature; fills start as no-data
    pub fn new(features: Vec<CountryFeature>, now: Instant) -> Self {
        let shapes = features
            .into_iter()
            .map(|f| CountryShape {
                key: normalize_key(f.iso_key.as_deref()),
                name: f.name,
                polygons: f.polygons,
                fill: FillTransition::settled(NO_DATA, now),
            })
            .collect();
        Self { shapes }
    }

    pub fn shapes(&self) -> &[CountryShape] {
        &self.shapes
    }

    pub fn shape(&self, idx: usize) -> Option<&CountryShape> {
        self.shapes.get(idx)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Set every fill immediately (initial draw)
    pub fn apply_fills(&mut self, counts: &CategoryCountMap, scale: &ColorScale, now: Instant) {
        for shape in &mut self.shapes {
            let color = fill_for(shape.key.as_deref(), counts, scale);
            shape.fill = FillTransition::settled(color, now);
        }
    }

    /// Start animated fill transitions towards the new counts and scale
    pub fn transition_fills(&mut self, counts: &CategoryCountMap, scale: &ColorScale, now: Instant) {
        for shape in &mut self.shapes {
            let color = fill_for(shape.key.as_deref(), counts, scale);
            shape.fill.retarget(color, now);
        }
    }

    /// Fill currently on screen for a shape
    pub fn fill_at(&self, idx: usize, now: Instant) -> Rgb {
        self.shapes
            .get(idx)
            .map_or(NO_DATA, |s| s.fill.color_at(now))
    }

    /// True while any fill is still transitioning
    pub fn is_animating(&self, now: Instant) -> bool {
        self.shapes.iter().any(|s| s.fill.is_running(now))
    }

    /// Rasterize all shapes into `cols` x `rows` character cells.
    /// The viewport is expected in Braille pixel units (2x4 per cell).
    pub fn rasterize(&self, viewport: &Viewport, cols: usize, rows: usize) -> MapRaster {
        let polygons: Vec<ScreenPolygon> = self
            .shapes
            .par_iter()
            .enumerate()
            .flat_map_iter(|(idx, shape)| {
                shape
                    .polygons
                    .iter()
                    .filter_map(move |poly| project_polygon(idx, poly, viewport))
            })
            .collect();

        let mut owners = vec![None; cols * rows];
        if cols > 0 {
            owners
                .par_chunks_mut(cols)
                .enumerate()
                .for_each(|(row, cells)| fill_row(&polygons, row, cells));
        }

        let mut borders = BrailleCanvas::new(cols, rows);
        for poly in &polygons {
            for ring in &poly.rings {
                draw_ring(&mut borders, ring, viewport);
            }
        }

        MapRaster {
            cols,
            rows,
            owners,
            borders,
        }
    }
}

fn project_polygon(shape: usize, polygon: &Polygon, viewport: &Viewport) -> Option<ScreenPolygon> {
    let rings: Vec<Vec<DVec2>> = polygon
        .iter()
        .map(|ring| ring.iter().map(|&(lon, lat)| viewport.project_f(lon, lat)).collect())
        .collect();

    let exterior = rings.first()?;
    let (mut min, mut max) = (DVec2::splat(f64::INFINITY), DVec2::splat(f64::NEG_INFINITY));
    for p in exterior {
        min = min.min(*p);
        max = max.max(*p);
    }

    // Cull polygons entirely off screen
    if max.x < 0.0 || max.y < 0.0 || min.x > viewport.width as f64 || min.y > viewport.height as f64 {
        return None;
    }

    Some(ScreenPolygon {
        shape,
        rings,
        min_y: min.y,
        max_y: max.y,
    })
}

/// Even-odd scanline fill through the vertical center of one cell row
fn fill_row(polygons: &[ScreenPolygon], row: usize, cells: &mut [Option<usize>]) {
    let y = (row * 4 + 2) as f64;
    let mut xs = Vec::new();

    for poly in polygons.iter().filter(|p| p.min_y <= y && y <= p.max_y) {
        xs.clear();
        scanline_crossings(&poly.rings, y, &mut xs);
        xs.sort_by(|a, b| a.total_cmp(b));

        for span in xs.chunks_exact(2) {
            // Cell centers sit at x = col * 2 + 1
            let first = ((span[0] - 1.0) / 2.0).ceil().max(0.0) as usize;
            let last = ((span[1] - 1.0) / 2.0).floor();
            if last < 0.0 {
                continue;
            }
            let last = (last as usize).min(cells.len().saturating_sub(1));
            for cell in cells.iter_mut().take(last + 1).skip(first) {
                *cell = Some(poly.shape);
            }
        }
    }
}

/// Draw a ring outline with viewport culling
fn draw_ring(canvas: &mut BrailleCanvas, ring: &[DVec2], viewport: &Viewport) {
    if ring.len() < 2 {
        return;
    }

    let mut prev: Option<(i32, i32)> = None;

    for p in ring {
        let (px, py) = (p.x.round() as i32, p.y.round() as i32);

        if let Some((prev_x, prev_y)) = prev {
            if line_might_be_visible(viewport, (prev_x, prev_y), (px, py)) {
                draw_line(canvas, prev_x, prev_y, px, py);
            }
        }

        prev = Some((px, py));
    }
}

fn line_might_be_visible(viewport: &Viewport, p1: (i32, i32), p2: (i32, i32)) -> bool {
    let min_x = p1.0.min(p2.0);
    let max_x = p1.0.max(p2.0);
    let min_y = p1.1.min(p2.1);
    let max_y = p1.1.max(p2.1);

    max_x >= 0 && min_x < viewport.width as i32 && max_y >= 0 && min_y < viewport.height as i32
}
