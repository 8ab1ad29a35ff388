//! Integer box model primitives.

/// Per-side integer measurements in top/right/bottom/left order.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Sides {
    pub top: u32,
    pub right: u32,
    pub bottom: u32,
    pub left: u32,
}

impl Sides {
    pub const ZERO: Sides = Sides::uniform(0);

    pub const fn new(top: u32, right: u32, bottom: u32, left: u32) -> Self {
        Self {
            top,
            right,
            bottom,
            left,
        }
    }

    pub const fn uniform(value: u32) -> Self {
        Self::new(value, value, value, value)
    }

    /// Horizontal total (left + right).
    pub fn width(&self) -> u32 {
        self.left.saturating_add(self.right)
    }

    /// Vertical total (top + bottom).
    pub fn height(&self) -> u32 {
        self.top.saturating_add(self.bottom)
    }

    /// Largest of the four sides.
    pub fn max(&self) -> u32 {
        self.top.max(self.right).max(self.bottom).max(self.left)
    }

    /// Swaps the left and right sides.
    pub fn mirrored(&self) -> Self {
        Self::new(self.top, self.left, self.bottom, self.right)
    }

    pub fn to_array(&self) -> [u32; 4] {
        [self.top, self.right, self.bottom, self.left]
    }
}

/// Corner radii, clockwise from the top-left corner.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct CornerRadii {
    pub top_left: u32,
    pub top_right: u32,
    pub bottom_right: u32,
    pub bottom_left: u32,
}

impl CornerRadii {
    pub const fn new(top_left: u32, top_right: u32, bottom_right: u32, bottom_left: u32) -> Self {
        Self {
            top_left,
            top_right,
            bottom_right,
            bottom_left,
        }
    }

    pub const fn uniform(radius: u32) -> Self {
        Self::new(radius, radius, radius, radius)
    }

    /// Largest radius touching each side, in top/right/bottom/left order.
    pub fn adjoining(&self) -> Sides {
        Sides::new(
            self.top_left.max(self.top_right),
            self.top_right.max(self.bottom_right),
            self.bottom_left.max(self.bottom_right),
            self.top_left.max(self.bottom_left),
        )
    }

    /// Swaps left and right corners.
    pub fn mirrored(&self) -> Self {
        Self::new(
            self.top_right,
            self.top_left,
            self.bottom_left,
            self.bottom_right,
        )
    }

    pub fn to_array(&self) -> [u32; 4] {
        [
            self.top_left,
            self.top_right,
            self.bottom_right,
            self.bottom_left,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adjoining_radii_pick_the_larger_corner() {
        let radii = CornerRadii::new(1, 4, 2, 3);
        assert_eq!(radii.adjoining(), Sides::new(4, 4, 3, 3));
    }

    #[test]
    fn mirrored_sides_swap_horizontal_edges() {
        let sides = Sides::new(1, 2, 3, 4);
        assert_eq!(sides.mirrored(), Sides::new(1, 4, 3, 2));
        assert_eq!(sides.width(), 6);
        assert_eq!(sides.height(), 4);
    }

    #[test]
    fn totals_saturate_instead_of_overflowing() {
        let sides = Sides::uniform(u32::MAX);
        assert_eq!(sides.width(), u32::MAX);
        assert_eq!(sides.height(), u32::MAX);
    }
}
