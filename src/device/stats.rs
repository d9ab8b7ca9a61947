//! Per-device rasterization counters

use std::fmt;

/// Counters updated while drawing; reset with `Device::reset_statistics`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Statistics {
    pub num_draw_calls: u64,
    pub num_rasterized_triangles: u64,
    pub num_quads: u64,
    pub num_pixels: u64,
    pub num_pixels_shaded: u64,
    pub num_pixels_blended: u64,
    pub num_stencil_writes: u64,
}

impl Statistics {
    /// Share of quad lanes that were covered, in percent
    pub fn quad_efficiency(&self) -> f32 {
        if self.num_quads == 0 {
            return 0.0;
        }
        self.num_pixels as f32 * 100.0 / (self.num_quads * 4) as f32
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Draw calls:  {}", self.num_draw_calls)?;
        writeln!(f, "Triangles:   {}", self.num_rasterized_triangles)?;
        writeln!(f, "Quads:       {} ({:.1}% lanes covered)", self.num_quads, self.quad_efficiency())?;
        writeln!(f, "Pixels:      {}", self.num_pixels)?;
        writeln!(f, "Shaded:      {}", self.num_pixels_shaded)?;
        writeln!(f, "Blended:     {}", self.num_pixels_blended)?;
        write!(f, "Stencil ops: {}", self.num_stencil_writes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quad_efficiency() {
        let stats = Statistics { num_quads: 2, num_pixels: 6, ..Default::default() };
        assert_eq!(stats.quad_efficiency(), 75.0);
        assert_eq!(Statistics::default().quad_efficiency(), 0.0);
    }
}
