use std::ops::{Add, Div, Mul, Neg, Sub};

/// Single 2D point in pixel space.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Point {
        Point { x, y }
    }

    pub fn mul_add(self, a: f32, b: Point) -> Point {
        Point {
            x: self.x.mul_add(a, b.x),
            y: self.y.mul_add(a, b.y),
        }
    }

    pub fn hypot(self) -> f32 {
        self.x.hypot(self.y)
    }

    /// Euclidean distance to another point.
    pub fn distance(self, other: Point) -> f32 {
        (other - self).hypot()
    }

    /// Midpoint of the segment between `self` and `other`.
    pub fn midpoint(self, other: Point) -> Point {
        Point {
            x: (self.x + other.x) * 0.5,
            y: (self.y + other.y) * 0.5,
        }
    }

    /// Unit direction vector from `self` towards `other`.
    ///
    /// Returns `None` when the two points coincide (no direction exists).
    pub fn direction_to(self, other: Point) -> Option<Point> {
        let delta = other - self;
        let magnitude = delta.hypot();
        if magnitude > f32::EPSILON {
            Some(delta / magnitude)
        } else {
            None
        }
    }

    /// Angle of the segment from `self` to `other`, in degrees.
    ///
    /// Measured as `atan2(dy, dx)`, so a segment pointing straight right is 0
    /// and straight down is 90.
    pub fn angle_to(self, other: Point) -> f32 {
        let delta = other - self;
        delta.y.atan2(delta.x).to_degrees()
    }
}

impl Add for Point {
    type Output = Point;

    fn add(self, other: Point) -> Point {
        Point {
            x: self.x + other.x,
            y: self.y + other.y,
        }
    }
}

impl Sub for Point {
    type Output = Point;

    fn sub(self, other: Point) -> Point {
        Point {
            x: self.x - other.x,
            y: self.y - other.y,
        }
    }
}

impl Mul<f32> for Point {
    type Output = Point;

    fn mul(self, other: f32) -> Point {
        Point {
            x: self.x * other,
            y: self.y * other,
        }
    }
}

impl Mul<Point> for Point {
    type Output = f32;

    fn mul(self, other: Point) -> f32 {
        self.x * other.x + self.y * other.y
    }
}

impl Div<f32> for Point {
    type Output = Point;

    fn div(self, other: f32) -> Point {
        Point {
            x: self.x / other,
            y: self.y / other,
        }
    }
}

impl Neg for Point {
    type Output = Point;

    fn neg(self) -> Point {
        Point {
            x: -self.x,
            y: -self.y,
        }
    }
}
