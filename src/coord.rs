// Copyright 2017-2019 Sean Gillespie.
//
// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// http://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.
use std::fmt;
use std::ops::{Add, Mul, Neg, Sub};

/// An unconstrained point on the integer plane. Coordinates double as move
/// offsets; use `Cell` for a point known to lie on the board.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    pub const fn new(x: i32, y: i32) -> Coordinate {
        Coordinate { x, y }
    }
}

impl Add for Coordinate {
    type Output = Coordinate;

    fn add(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl Sub for Coordinate {
    type Output = Coordinate;

    fn sub(self, rhs: Coordinate) -> Coordinate {
        Coordinate::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Neg for Coordinate {
    type Output = Coordinate;

    fn neg(self) -> Coordinate {
        Coordinate::new(-self.x, -self.y)
    }
}

impl Mul<i32> for Coordinate {
    type Output = Coordinate;

    fn mul(self, rhs: i32) -> Coordinate {
        Coordinate::new(self.x * rhs, self.y * rhs)
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Coordinate {
        Coordinate::new(x, y)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic() {
        let a = Coordinate::new(3, 4);
        let b = Coordinate::new(1, -2);
        assert_eq!(Coordinate::new(4, 2), a + b);
        assert_eq!(Coordinate::new(2, 6), a - b);
        assert_eq!(Coordinate::new(-3, -4), -a);
        assert_eq!(Coordinate::new(6, 8), a * 2);
    }

    #[test]
    fn equality_is_componentwise() {
        assert_eq!(Coordinate::new(1, 2), Coordinate::from((1, 2)));
        assert_ne!(Coordinate::new(1, 2), Coordinate::new(2, 1));
    }
}
