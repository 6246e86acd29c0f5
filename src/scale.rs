use crate::aggregate::CategoryCountMap;
use ratatui::style::Color;
use std::fmt;

/// 24-bit color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parse `#rrggbb` at compile time
    pub const fn hex(value: u32) -> Self {
        Self((value >> 16) as u8, (value >> 8) as u8, value as u8)
    }

    /// Linear interpolation in RGB space, `t` in [0, 1]
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb(mix(self.0, other.0), mix(self.1, other.1), mix(self.2, other.2))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02x}{:02x}{:02x}", self.0, self.1, self.2)
    }
}

impl From<Rgb> for Color {
    fn from(c: Rgb) -> Self {
        Color::Rgb(c.0, c.1, c.2)
    }
}

/// Fill for countries without any matching project
pub const NO_DATA: Rgb = Rgb::hex(0xeeeeee);

/// ColorBrewer YlGnBu, light to dark
pub const YL_GN_BU: [Rgb; 9] = [
    Rgb::hex(0xffffd9),
    Rgb::hex(0xedf8b1),
    Rgb::hex(0xc7e9b4),
    Rgb::hex(0x7fcdbb),
    Rgb::hex(0x41b6c4),
    Rgb::hex(0x1d91c0),
    Rgb::hex(0x225ea8),
    Rgb::hex(0x253494),
    Rgb::hex(0x081d58),
];

/// Value domain of the color scale: always `[0, max]` with `max >= 1`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ColorDomain {
    max: u32,
}

impl ColorDomain {
    pub fn new(max: u32) -> Self {
        Self { max: max.max(1) }
    }

    /// Domain for a freshly aggregated map; an empty map yields `[0, 1]`
    pub fn from_counts(counts: &CategoryCountMap) -> Self {
        Self::new(counts.max_count().unwrap_or(1))
    }

    pub fn min(&self) -> u32 {
        0
    }

    pub fn max(&self) -> u32 {
        self.max
    }
}

impl Default for ColorDomain {
    fn default() -> Self {
        Self::new(1)
    }
}

/// Sequential color scale over a `ColorDomain`.
///
/// Colors are computed on every call, nothing is cached, so a new domain
/// applies immediately to every later lookup.
#[derive(Clone, Debug, PartialEq)]
pub struct ColorScale {
    domain: ColorDomain,
    palette: &'static [Rgb],
}

impl ColorScale {
    pub fn new(domain: ColorDomain) -> Self {
        Self {
            domain,
            palette: &YL_GN_BU,
        }
    }

    pub fn domain(&self) -> ColorDomain {
        self.domain
    }

    pub fn set_domain(&mut self, domain: ColorDomain) {
        self.domain = domain;
    }

    /// Color for `value`, clamped to the domain
    pub fn color_for(&self, value: f64) -> Rgb {
        let t = if value.is_nan() {
            0.0
        } else {
            (value / self.domain.max as f64).clamp(0.0, 1.0)
        };

        let last = self.palette.len() - 1;
        let pos = t * last as f64;
        let i = pos.floor() as usize;
        if i >= last {
            return self.palette[last];
        }
        self.palette[i].lerp(self.palette[i + 1], pos - i as f64)
    }

    /// Lowest color of the palette
    pub fn low(&self) -> Rgb {
        self.palette[0]
    }

    /// Highest color of the palette
    pub fn high(&self) -> Rgb {
        self.palette[self.palette.len() - 1]
    }
}

impl Default for ColorScale {
    fn default() -> Self {
        Self::new(ColorDomain::default())
    }
}
