use crate::aggregate::{aggregate, CategoryCountMap, FlowCategory};
use crate::data::{CountryFeature, ProjectRecord};
use crate::legend::Legend;
use crate::map::{MapRaster, MapRenderer, Viewport};
use crate::scale::{ColorDomain, ColorScale};
use std::time::Instant;
use tracing::{debug, info};

/// Category, counts and scale. Always built together, so the counts on
/// screen and the domain of the scale can never come from different categories.
#[derive(Clone, Debug, PartialEq)]
pub struct AppState {
    pub category: FlowCategory,
    pub counts: CategoryCountMap,
    pub scale: ColorScale,
}

impl AppState {
    pub fn new(records: &[ProjectRecord], category: FlowCategory) -> Self {
        let counts = aggregate(records, category);
        let mut scale = ColorScale::default();
        scale.set_domain(ColorDomain::from_counts(&counts));
        Self {
            category,
            counts,
            scale,
        }
    }

    pub fn domain(&self) -> ColorDomain {
        self.scale.domain()
    }
}

/// User commands understood by the controller
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command {
    SelectCategory(FlowCategory),
    /// Pointer entered a country (terminal cell coordinates)
    HoverStart { col: u16, row: u16 },
    /// Pointer moved within the hovered country
    HoverMove { col: u16, row: u16 },
    /// Pointer left the hovered country
    HoverEnd,
    Pan { dx: i32, dy: i32 },
    ZoomIn,
    ZoomOut,
    ZoomInAt { col: u16, row: u16 },
    ZoomOutAt { col: u16, row: u16 },
    ResetView,
    Resize { width: u16, height: u16 },
    Quit,
}

/// Tooltip content and anchor (terminal cell of the pointer)
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Tooltip {
    pub title: String,
    pub body: String,
    pub col: u16,
    pub row: u16,
}

/// Tooltip for a hovered shape, read from the state at the time of the event
pub fn tooltip_for(map: &MapRenderer, state: &AppState, shape: usize, col: u16, row: u16) -> Option<Tooltip> {
    let shape = map.shape(shape)?;
    Some(Tooltip {
        title: shape.name.clone(),
        body: format!("{} projects: {}", state.category.tag(), shape.count_in(&state.counts)),
        col,
        row,
    })
}

/// Convert a terminal position to a map cell (map area has a 1-cell border)
fn map_cell(col: u16, row: u16) -> Option<(usize, usize)> {
    if col == 0 || row == 0 {
        return None;
    }
    Some((col as usize - 1, row as usize - 1))
}

/// Application state and command dispatch
pub struct App {
    records: Vec<ProjectRecord>,
    pub state: AppState,
    pub legend: Legend,
    pub map: MapRenderer,
    pub raster: MapRaster,
    pub viewport: Viewport,
    pub tooltip: Option<Tooltip>,
    /// Shape under the pointer
    hovered: Option<usize>,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    /// Map area in character cells
    cols: usize,
    rows: usize,
    pub should_quit: bool,
}

impl App {
    pub fn new(
        features: Vec<CountryFeature>,
        records: Vec<ProjectRecord>,
        width: usize,
        height: usize,
        now: Instant,
    ) -> Self {
        let (cols, rows) = map_area(width, height);
        let state = AppState::new(&records, FlowCategory::default());
        let mut map = MapRenderer::new(features, now);
        map.apply_fills(&state.counts, &state.scale, now);
        let legend = Legend::build(&state.scale, state.category);

        info!(
            category = %state.category,
            countries = state.counts.len(),
            max = state.domain().max(),
            unkeyed = state.counts.unkeyed(),
            "initial aggregation"
        );

        let mut app = Self {
            records,
            state,
            legend,
            map,
            raster: MapRaster::empty(),
            viewport: Viewport::world(cols * 2, rows * 4),
            tooltip: None,
            hovered: None,
            last_mouse: None,
            cols,
            rows,
            should_quit: false,
        };
        app.refresh_raster();
        app
    }

    pub fn dispatch(&mut self, command: Command, now: Instant) {
        match command {
            Command::SelectCategory(category) => self.select_category(category, now),
            Command::HoverStart { col, row } | Command::HoverMove { col, row } => self.hover(col, row),
            Command::HoverEnd => {
                self.hovered = None;
                self.tooltip = None;
            }
            Command::Pan { dx, dy } => {
                self.viewport.pan(dx, dy);
                self.refresh_raster();
            }
            Command::ZoomIn => {
                self.viewport.zoom_in();
                self.refresh_raster();
            }
            Command::ZoomOut => {
                self.viewport.zoom_out();
                self.refresh_raster();
            }
            Command::ZoomInAt { col, row } => {
                let (px, py) = pixel_pos(col, row);
                self.viewport.zoom_in_at(px, py);
                self.refresh_raster();
            }
            Command::ZoomOutAt { col, row } => {
                let (px, py) = pixel_pos(col, row);
                self.viewport.zoom_out_at(px, py);
                self.refresh_raster();
            }
            Command::ResetView => {
                self.viewport = Viewport::world(self.cols * 2, self.rows * 4);
                self.refresh_raster();
            }
            Command::Resize { width, height } => {
                let (cols, rows) = map_area(width as usize, height as usize);
                self.cols = cols;
                self.rows = rows;
                self.viewport.width = cols * 2;
                self.viewport.height = rows * 4;
                self.refresh_raster();
            }
            Command::Quit => self.should_quit = true,
        }
    }

    /// Switch category: aggregate, rescale, rebuild legend, retarget fills.
    /// Everything is computed before any of it is stored.
    fn select_category(&mut self, category: FlowCategory, now: Instant) {
        let state = AppState::new(&self.records, category);
        let legend = Legend::build(&state.scale, category);
        self.map.transition_fills(&state.counts, &state.scale, now);
        self.state = state;
        self.legend = legend;

        // Keep an open tooltip in step with the new counts
        let anchor = self.tooltip.as_ref().map(|t| (t.col, t.row));
        if let (Some(shape), Some((col, row))) = (self.hovered, anchor) {
            self.tooltip = tooltip_for(&self.map, &self.state, shape, col, row);
        }

        info!(
            category = %category,
            countries = self.state.counts.len(),
            max = self.state.domain().max(),
            unkeyed = self.state.counts.unkeyed(),
            "switched category"
        );
    }

    fn hover(&mut self, col: u16, row: u16) {
        let shape = map_cell(col, row).and_then(|(c, r)| self.raster.shape_at(c, r));
        self.hovered = shape;
        self.tooltip = shape.and_then(|s| tooltip_for(&self.map, &self.state, s, col, row));
    }

    /// Turn raw pointer motion into hover start / move / end
    pub fn pointer_moved(&mut self, col: u16, row: u16, now: Instant) {
        let shape = map_cell(col, row).and_then(|(c, r)| self.raster.shape_at(c, r));
        let command = match (self.hovered, shape) {
            (Some(prev), Some(cur)) if prev == cur => Command::HoverMove { col, row },
            (_, Some(_)) => Command::HoverStart { col, row },
            (Some(_), None) => Command::HoverEnd,
            (None, None) => return,
        };
        self.dispatch(command, now);
    }

    /// Pan by the drag delta since the last mouse position
    pub fn handle_drag(&mut self, col: u16, row: u16, now: Instant) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - col as i32;
            let dy = last_y as i32 - row as i32;
            // Less sensitive when zoomed out
            let scale = if self.viewport.zoom < 2.0 {
                2
            } else if self.viewport.zoom < 4.0 {
                3
            } else {
                4
            };
            self.dispatch(Command::Pan { dx: dx * scale, dy: dy * scale }, now);
        }
        self.last_mouse = Some((col, row));
    }

    /// Reset drag state when mouse button released
    pub fn end_drag(&mut self) {
        self.last_mouse = None;
    }

    fn refresh_raster(&mut self) {
        self.raster = self.map.rasterize(&self.viewport, self.cols, self.rows);
        // Geometry moved under the pointer; the old hover target is stale
        if self.hovered.is_some() {
            self.hovered = None;
            self.tooltip = None;
        }
        debug!(cols = self.cols, rows = self.rows, zoom = self.viewport.zoom, "rasterized map");
    }

    /// Both category controls with their active flag; exactly one is active
    pub fn controls(&self) -> [(FlowCategory, bool); 2] {
        FlowCategory::ALL.map(|c| (c, c == self.state.category))
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("{:.1}x", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}

/// Map area inside the border and above the status bar
fn map_area(width: usize, height: usize) -> (usize, usize) {
    (width.saturating_sub(2), height.saturating_sub(3))
}

/// Terminal cell to Braille pixel coordinates inside the map border
fn pixel_pos(col: u16, row: u16) -> (i32, i32) {
    let px = (col.saturating_sub(1) as i32) * 2;
    let py = (row.saturating_sub(1) as i32) * 4;
    (px, py)
}
