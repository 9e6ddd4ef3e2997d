//! Block, paddle and background colors (linear RGBA)

/// RGBA color, components in [0, 1]
pub type Rgba = [f32; 4];

/// Block colors, indexed by `(row + col + 1) % columns`
pub const BLOCK_COLORS: [Rgba; 8] = [
    [0.077, 0.242, 0.516, 1.0],
    [0.831, 0.831, 0.844, 1.0],
    [0.062, 0.307, 0.359, 1.0],
    [0.434, 0.0, 0.108, 1.0],
    [0.589, 0.794, 0.952, 1.0],
    [0.345, 0.114, 0.231, 1.0],
    [0.090, 0.879, 0.945, 1.0],
    [0.188, 0.408, 0.716, 1.0],
];

pub const PADDLE: Rgba = [0.527, 0.056, 0.234, 1.0];
pub const BACKGROUND: Rgba = [0.069, 0.099, 0.191, 1.0];

/// Palette slot for a grid cell.
///
/// The index wraps into the palette as well, so grids wider than the
/// palette still get a color.
pub fn block_color_index(row: usize, col: usize, columns: usize) -> usize {
    ((row + col + 1) % columns.max(1)) % BLOCK_COLORS.len()
}

pub fn block_color(row: usize, col: usize, columns: usize) -> Rgba {
    BLOCK_COLORS[block_color_index(row, col, columns)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_color_index_diagonal_pattern() {
        assert_eq!(block_color_index(0, 0, 8), 1);
        assert_eq!(block_color_index(0, 7, 8), 0);
        assert_eq!(block_color_index(2, 3, 8), 6);
        // Same anti-diagonal, same color
        assert_eq!(block_color_index(1, 2, 8), block_color_index(2, 1, 8));
    }

    #[test]
    fn test_color_index_wraps_wide_grids() {
        for col in 0..20 {
            assert!(block_color_index(3, col, 12) < BLOCK_COLORS.len());
        }
    }
}
