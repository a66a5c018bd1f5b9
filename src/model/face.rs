//! Named faces of a rectangular body and a per-face value map.
//!
//! Faces are addressed by name rather than position so a configuration can
//! never silently shift a flag onto the wrong face.

use std::fmt;
use std::ops::{AddAssign, Index, IndexMut};

use serde::{Deserialize, Serialize};

/// One of the six faces of an axis-aligned cuboid.
///
/// `Top`/`Bottom` span length × width, `North`/`South` span
/// length × height, and `East`/`West` span width × height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Face {
    Top,
    Bottom,
    North,
    South,
    East,
    West,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::Top,
        Face::Bottom,
        Face::North,
        Face::South,
        Face::East,
        Face::West,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Face::Top => "top",
            Face::Bottom => "bottom",
            Face::North => "north",
            Face::South => "south",
            Face::East => "east",
            Face::West => "west",
        }
    }
}

impl fmt::Display for Face {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value for each of the six faces.
///
/// Deserialises from a TOML table with one key per face; omitted faces take
/// `T::default()`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaceMap<T> {
    pub top: T,
    pub bottom: T,
    pub north: T,
    pub south: T,
    pub east: T,
    pub west: T,
}

impl<T: Copy> FaceMap<T> {
    /// Same value on every face.
    pub fn uniform(value: T) -> Self {
        Self {
            top: value,
            bottom: value,
            north: value,
            south: value,
            east: value,
            west: value,
        }
    }

    /// Builds a map by evaluating `f` for each face.
    pub fn from_fn(mut f: impl FnMut(Face) -> T) -> Self {
        Self {
            top: f(Face::Top),
            bottom: f(Face::Bottom),
            north: f(Face::North),
            south: f(Face::South),
            east: f(Face::East),
            west: f(Face::West),
        }
    }

    /// Iterates `(face, value)` pairs in [`Face::ALL`] order.
    pub fn iter(&self) -> impl Iterator<Item = (Face, T)> + '_ {
        Face::ALL.into_iter().map(move |face| (face, self[face]))
    }

    pub fn map<U: Copy>(&self, mut f: impl FnMut(Face, T) -> U) -> FaceMap<U> {
        FaceMap::from_fn(|face| f(face, self[face]))
    }
}

impl FaceMap<bool> {
    /// All faces set.
    pub fn all() -> Self {
        Self::uniform(true)
    }

    /// Only the given faces set.
    pub fn only(faces: &[Face]) -> Self {
        Self::from_fn(|face| faces.contains(&face))
    }

    /// Number of faces set.
    pub fn count(&self) -> usize {
        self.iter().filter(|(_, on)| *on).count()
    }
}

impl FaceMap<f64> {
    pub fn sum(&self) -> f64 {
        self.iter().map(|(_, v)| v).sum()
    }
}

impl<T: Copy + AddAssign> AddAssign for FaceMap<T> {
    fn add_assign(&mut self, rhs: Self) {
        for face in Face::ALL {
            self[face] += rhs[face];
        }
    }
}

impl<T> Index<Face> for FaceMap<T> {
    type Output = T;

    fn index(&self, face: Face) -> &T {
        match face {
            Face::Top => &self.top,
            Face::Bottom => &self.bottom,
            Face::North => &self.north,
            Face::South => &self.south,
            Face::East => &self.east,
            Face::West => &self.west,
        }
    }
}

impl<T> IndexMut<Face> for FaceMap<T> {
    fn index_mut(&mut self, face: Face) -> &mut T {
        match face {
            Face::Top => &mut self.top,
            Face::Bottom => &mut self.bottom,
            Face::North => &mut self.north,
            Face::South => &mut self.south,
            Face::East => &mut self.east,
            Face::West => &mut self.west,
        }
    }
}
