//! Residue-level point sets consumed by the matcher.
//!
//! A [`PointSet`] is the ordered list of representative coordinates for one structure, one
//! entry per residue. Construction enforces the integrity rules the matcher relies on:
//! residue identifiers are unique and every coordinate is a finite number. Anything that
//! violates them is rejected here and never reaches the matching stage.

use crate::model::types::Point;
use crate::ops::error::Error;
use serde::{Serialize, Serializer};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Identifies a residue within one structure by chain, sequence number and insertion code.
///
/// Ordering is chain first, then number, then insertion code, which keeps partition sets in
/// natural sequence order. An empty chain identifier is allowed for chain-less inputs.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResidueId {
    pub chain: String,
    pub number: i32,
    pub insertion_code: Option<char>,
}

impl ResidueId {
    pub fn new(chain: &str, number: i32, insertion_code: Option<char>) -> Self {
        Self {
            chain: chain.to_string(),
            number,
            insertion_code,
        }
    }

    /// Residue selector in PyMOL `resi` form, e.g. `42` or `42A`.
    pub fn resi(&self) -> String {
        match self.insertion_code {
            Some(code) => format!("{}{}", self.number, code),
            None => self.number.to_string(),
        }
    }
}

impl fmt::Display for ResidueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.chain.is_empty() {
            write!(f, "{}", self.resi())
        } else {
            write!(f, "{}/{}", self.chain, self.resi())
        }
    }
}

impl FromStr for ResidueId {
    type Err = String;

    /// Parses `42`, `42A`, `B/42` or `B/-3A`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (chain, resi) = match s.trim().split_once('/') {
            Some((chain, resi)) => (chain.trim(), resi.trim()),
            None => ("", s.trim()),
        };

        let digits_end = resi
            .char_indices()
            .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && c == '-')))
            .map(|(i, _)| i)
            .unwrap_or(resi.len());
        let (number, suffix) = resi.split_at(digits_end);

        let number = number
            .parse::<i32>()
            .map_err(|_| format!("Invalid residue identifier: {}", s))?;

        let mut suffix_chars = suffix.chars();
        let insertion_code = match (suffix_chars.next(), suffix_chars.next()) {
            (None, _) => None,
            (Some(c), None) if c.is_ascii_alphabetic() => Some(c),
            _ => return Err(format!("Invalid residue identifier: {}", s)),
        };

        Ok(Self::new(chain, number, insertion_code))
    }
}

impl Serialize for ResidueId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// One residue reduced to a labeled 3D coordinate.
#[derive(Debug, Clone, PartialEq)]
pub struct ResiduePoint {
    /// Residue identifier, unique within the owning point set.
    pub id: ResidueId,
    /// Residue type label such as `ALA`.
    pub name: String,
    /// Representative atom position in ångströms.
    pub pos: Point,
}

impl ResiduePoint {
    pub fn new(id: ResidueId, name: &str, pos: Point) -> Self {
        Self {
            id,
            name: name.to_string(),
            pos,
        }
    }

    /// Label used in reports, residue name followed by the `resi` selector (`ALA42`).
    pub fn label(&self) -> String {
        format!("{}{}", self.name, self.id.resi())
    }
}

/// Ordered, integrity-checked sequence of residue points for one structure.
#[derive(Debug, Clone, Default)]
pub struct PointSet {
    points: Vec<ResiduePoint>,
    seen: HashSet<ResidueId>,
}

impl PointSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a point set from an iterator, failing on the first invalid point.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPoint`] for non-finite coordinates and
    /// [`Error::DuplicateResidue`] for repeated identifiers.
    pub fn from_points<I>(points: I) -> Result<Self, Error>
    where
        I: IntoIterator<Item = ResiduePoint>,
    {
        let mut set = Self::new();
        for point in points {
            set.push(point)?;
        }
        Ok(set)
    }

    /// Appends a point after validating its coordinate and identifier.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MalformedPoint`] when any coordinate is NaN or infinite, and
    /// [`Error::DuplicateResidue`] when the identifier is already present.
    pub fn push(&mut self, point: ResiduePoint) -> Result<(), Error> {
        if let Some(axis) = ["x", "y", "z"]
            .iter()
            .zip(point.pos.coords.iter())
            .find(|(_, value)| !value.is_finite())
            .map(|(axis, _)| *axis)
        {
            return Err(Error::malformed_point(
                point.id.to_string(),
                format!("{axis} coordinate is not a finite number"),
            ));
        }

        if !self.seen.insert(point.id.clone()) {
            return Err(Error::DuplicateResidue {
                id: point.id.to_string(),
            });
        }

        self.points.push(point);
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn as_slice(&self) -> &[ResiduePoint] {
        &self.points
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResiduePoint> {
        self.points.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ResidueId> {
        self.points.iter().map(|p| &p.id)
    }
}

impl<'a> IntoIterator for &'a PointSet {
    type Item = &'a ResiduePoint;
    type IntoIter = std::slice::Iter<'a, ResiduePoint>;

    fn into_iter(self) -> Self::IntoIter {
        self.points.iter()
    }
}
