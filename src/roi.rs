use opencv::core::Rect;

/// A rectangle on screen, in pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Region {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

pub fn new_region(x: i32, y: i32, width: i32, height: i32) -> Region {
    Region {
        x,
        y,
        width,
        height,
    }
}

impl Region {
    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }

    pub fn translate(&self, dx: i32, dy: i32) -> Region {
        new_region(self.x + dx, self.y + dy, self.width, self.height)
    }

    pub fn contains(&self, other: &Region) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.x + other.width <= self.x + self.width
            && other.y + other.height <= self.y + self.height
    }

    /// The overlap of both regions, empty when they are disjoint.
    pub fn intersect(&self, other: &Region) -> Region {
        let x = self.x.max(other.x);
        let y = self.y.max(other.y);
        let right = (self.x + self.width).min(other.x + other.width);
        let bottom = (self.y + self.height).min(other.y + other.height);

        new_region(x, y, (right - x).max(0), (bottom - y).max(0))
    }

    pub fn to_rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

/// Where the game renders on screen. Search areas and pointer targets are
/// expressed relative to its origin.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GameWindow {
    region: Region,
}

impl GameWindow {
    pub fn new(width: i32, height: i32) -> Self {
        GameWindow {
            region: new_region(0, 0, width, height),
        }
    }

    pub fn set_position(&mut self, x: i32, y: i32) {
        self.region.x = x;
        self.region.y = y;
    }

    pub fn origin(&self) -> (i32, i32) {
        (self.region.x, self.region.y)
    }

    pub fn region(&self) -> Region {
        self.region
    }

    /// The whole window in window-relative coordinates.
    pub fn bounds(&self) -> Region {
        new_region(0, 0, self.region.width, self.region.height)
    }

    pub fn to_screen(&self, area: Region) -> Region {
        area.translate(self.region.x, self.region.y)
    }

    pub fn to_window(&self, area: Region) -> Region {
        area.translate(-self.region.x, -self.region.y)
    }

    pub fn point_to_screen(&self, x: i32, y: i32) -> (i32, i32) {
        (x + self.region.x, y + self.region.y)
    }
}
