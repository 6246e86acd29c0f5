use glam::DVec2;
use std::f64::consts::{FRAC_PI_2, PI};

const MIN_ZOOM: f64 = 0.5;
const MAX_ZOOM: f64 = 100.0;

/// Natural Earth I forward projection, radians in, unit-sphere plane coords out
#[inline(always)]
pub fn natural_earth(lambda: f64, phi: f64) -> DVec2 {
    let phi2 = phi * phi;
    let phi4 = phi2 * phi2;
    DVec2::new(
        lambda * (0.8707 - 0.131979 * phi2 + phi4 * (-0.013791 + phi4 * (0.003971 * phi2 - 0.001529 * phi4))),
        phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4))),
    )
}

/// Inverse of `natural_earth` (Newton iteration on latitude)
pub fn natural_earth_inverse(p: DVec2) -> (f64, f64) {
    let mut phi = p.y;
    for _ in 0..25 {
        let phi2 = phi * phi;
        let phi4 = phi2 * phi2;
        let delta = (phi * (1.007226 + phi2 * (0.015085 + phi4 * (-0.044475 + 0.028874 * phi2 - 0.005916 * phi4)))
            - p.y)
            / (1.007226
                + phi2 * (0.015085 * 3.0 + phi4 * (-0.044475 * 7.0 + 0.028874 * 9.0 * phi2 - 0.005916 * 11.0 * phi4)));
        phi -= delta;
        if delta.abs() < 1e-9 {
            break;
        }
    }
    let phi2 = phi * phi;
    let lambda = p.x / (0.8707 + phi2 * (-0.131979 + phi2 * (-0.013791 + phi2 * phi2 * phi2 * (0.003971 - 0.001529 * phi2))));
    (lambda, phi)
}

/// Visible map area and zoom level, in Braille pixel units
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (1.0 = whole world fits)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// Create a world view (shows entire world)
    pub fn world(width: usize, height: usize) -> Self {
        Self::new(0.0, 0.0, 1.0, width, height)
    }

    /// Pixels per projected unit
    fn scale(&self) -> f64 {
        let world = natural_earth(PI, FRAC_PI_2);
        let fit_x = self.width as f64 / (2.0 * world.x);
        let fit_y = self.height as f64 / (2.0 * world.y);
        self.zoom * fit_x.min(fit_y).max(f64::EPSILON)
    }

    fn half(&self) -> DVec2 {
        DVec2::new(self.width as f64 / 2.0, self.height as f64 / 2.0)
    }

    fn center(&self) -> DVec2 {
        natural_earth(self.center_lon.to_radians(), self.center_lat.to_radians())
    }

    /// Screen pixel to projected plane coordinates
    fn to_plane(&self, px: f64, py: f64) -> DVec2 {
        let offset = (DVec2::new(px, py) - self.half()) / self.scale();
        self.center() + DVec2::new(offset.x, -offset.y)
    }

    fn set_center_plane(&mut self, plane: DVec2) {
        let (lambda, phi) = natural_earth_inverse(plane);
        let mut lon = lambda.to_degrees();
        if lon > 180.0 {
            lon -= 360.0;
        } else if lon < -180.0 {
            lon += 360.0;
        }
        self.center_lon = lon.clamp(-180.0, 180.0);
        self.center_lat = phi.to_degrees().clamp(-85.0, 85.0);
    }

    /// Project a geographic coordinate to sub-pixel screen coordinates
    #[inline]
    pub fn project_f(&self, lon: f64, lat: f64) -> DVec2 {
        let p = natural_earth(lon.to_radians(), lat.to_radians()) - self.center();
        self.half() + DVec2::new(p.x, -p.y) * self.scale()
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let half = self.half();
        let target = self.to_plane(half.x + dx as f64, half.y + dy as f64);
        self.set_center_plane(target);
    }

    /// Zoom in by a factor
    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(MAX_ZOOM);
    }

    /// Zoom out by a factor
    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor keeping the point under (px, py) fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let anchor = self.to_plane(px as f64, py as f64);
        self.zoom = (self.zoom * factor).clamp(MIN_ZOOM, MAX_ZOOM);

        let offset = (DVec2::new(px as f64, py as f64) - self.half()) / self.scale();
        self.set_center_plane(anchor - DVec2::new(offset.x, -offset.y));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project_f(0.0, 0.0), DVec2::new(50.0, 50.0));
    }

    #[test]
    fn test_north_is_up() {
        let vp = Viewport::world(200, 100);
        let north = vp.project_f(0.0, 45.0);
        let south = vp.project_f(0.0, -45.0);
        assert!(north.y < south.y);
    }

    #[test]
    fn test_world_fits() {
        let vp = Viewport::world(200, 100);
        let west = vp.project_f(-180.0, 0.0);
        let east = vp.project_f(180.0, 0.0);
        let top = vp.project_f(0.0, 90.0);
        let bottom = vp.project_f(0.0, -90.0);
        assert!(west.x >= -1e-9 && east.x <= 200.0 + 1e-9);
        assert!(top.y >= -1e-9 && bottom.y <= 100.0 + 1e-9);
    }

    #[test]
    fn test_inverse_round_trip() {
        for &(lon, lat) in &[(0.0, 0.0), (36.8, -1.3), (-74.0, 40.7), (139.7, 35.7), (-58.4, -34.6)] {
            let p = natural_earth(f64::to_radians(lon), f64::to_radians(lat));
            let (lambda, phi) = natural_earth_inverse(p);
            assert!((lambda.to_degrees() - lon).abs() < 1e-6);
            assert!((phi.to_degrees() - lat).abs() < 1e-6);
        }
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
        vp.pan(0, -10);
        assert!(vp.center_lat > 0.0);
    }

    #[test]
    fn test_zoom_at_keeps_anchor() {
        let mut vp = Viewport::world(400, 200);
        let p = vp.project_f(36.8, -1.3);
        vp.zoom_in_at(p.x.round() as i32, p.y.round() as i32);
        let q = vp.project_f(36.8, -1.3);
        assert!((q - p).abs().max_element() <= 1.0);
        assert!(vp.zoom > 1.0);
    }
}
