//! Time-index policies for boundary lookups into a value history.
//!
//! A history is a sequence of `(time, value)` samples ordered by time, where
//! several samples may share a timestamp (a *duplicate group*). Range and
//! boundary lookups take a [`TimeIndexPolicy`] per edge that decides how a
//! sample exactly at the boundary is treated and what happens when no sample
//! lands there.
//!
//! All resolution goes through [`resolve_boundary`]. History implementations
//! must not re-derive these rules at their call sites.

use std::fmt;
use std::ops::Range;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// How a query boundary treats samples at exactly the boundary time.
///
/// Discriminants are part of the mirrored layout and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum TimeIndexPolicy {
    /// A sample exactly at the boundary is included.
    Inclusive = 1,

    /// A sample exactly at the boundary is excluded.
    Exclusive = 2,

    /// Like `Inclusive` for exact matches. Otherwise the nearest sample
    /// stands in for the boundary: at-or-before for an end boundary,
    /// at-or-after for a start boundary. Ties on the stand-in timestamp are
    /// always broken with [`DuplicatePolicy::LastValue`].
    Extrapolate = 3,
}

impl TimeIndexPolicy {
    /// Every policy, in discriminant order.
    pub const ALL: [Self; 3] = [Self::Inclusive, Self::Exclusive, Self::Extrapolate];

    /// Mirrored discriminant.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Mirrored member name, e.g. `"EXTRAPOLATE"`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Inclusive => "INCLUSIVE",
            Self::Exclusive => "EXCLUSIVE",
            Self::Extrapolate => "EXTRAPOLATE",
        }
    }

    /// Whether a sample exactly at the boundary qualifies.
    pub const fn includes_exact(self) -> bool {
        matches!(self, Self::Inclusive | Self::Extrapolate)
    }

    /// Whether a missing boundary sample is substituted by a neighbour.
    pub const fn extrapolates(self) -> bool {
        matches!(self, Self::Extrapolate)
    }

    /// The duplicate policy that actually applies when picking one sample.
    ///
    /// `Extrapolate` forces [`DuplicatePolicy::LastValue`] regardless of what
    /// the caller asked for.
    #[must_use]
    pub const fn effective_duplicates(self, requested: DuplicatePolicy) -> DuplicatePolicy {
        match self {
            Self::Extrapolate => DuplicatePolicy::LastValue,
            Self::Inclusive | Self::Exclusive => requested,
        }
    }
}

impl Default for TimeIndexPolicy {
    fn default() -> Self {
        Self::Inclusive
    }
}

impl TryFrom<u8> for TimeIndexPolicy {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::Inclusive),
            2 => Ok(Self::Exclusive),
            3 => Ok(Self::Extrapolate),
            _ => Err(ValidationError::UnknownDiscriminant {
                enum_name: "TimeIndexPolicy",
                value,
            }),
        }
    }
}

impl FromStr for TimeIndexPolicy {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ValidationError::UnknownPolicyName {
                name: s.to_string(),
            })
    }
}

impl fmt::Display for TimeIndexPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which sample of a duplicate group a point lookup returns.
///
/// Discriminants are part of the mirrored layout and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[repr(u8)]
pub enum DuplicatePolicy {
    /// The most recently inserted sample.
    LastValue = 1,

    /// The earliest inserted sample.
    FirstValue = 2,
}

impl DuplicatePolicy {
    /// Every policy, in discriminant order.
    pub const ALL: [Self; 2] = [Self::LastValue, Self::FirstValue];

    /// Mirrored discriminant.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Mirrored member name.
    pub const fn name(self) -> &'static str {
        match self {
            Self::LastValue => "LAST_VALUE",
            Self::FirstValue => "FIRST_VALUE",
        }
    }

    /// Picks one index out of a non-empty duplicate group.
    pub fn select(self, group: Range<usize>) -> Option<usize> {
        if group.is_empty() {
            return None;
        }
        match self {
            Self::LastValue => Some(group.end - 1),
            Self::FirstValue => Some(group.start),
        }
    }
}

impl Default for DuplicatePolicy {
    fn default() -> Self {
        Self::LastValue
    }
}

impl TryFrom<u8> for DuplicatePolicy {
    type Error = ValidationError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Self::LastValue),
            2 => Ok(Self::FirstValue),
            _ => Err(ValidationError::UnknownDiscriminant {
                enum_name: "DuplicatePolicy",
                value,
            }),
        }
    }
}

impl fmt::Display for DuplicatePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Which edge of a range a policy is applied to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Boundary {
    /// The lower edge of a range.
    Start,
    /// The upper edge of a range.
    End,
}

/// Outcome of resolving one boundary against a sorted timeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundaryResolution {
    /// The duplicate group exactly at the boundary qualifies.
    Exact(Range<usize>),

    /// No exact match; the nearest duplicate group stands in for the
    /// boundary. Its last member is the stand-in sample.
    Extrapolated(Range<usize>),

    /// The edge yields no sample. `partition` is the range bound this edge
    /// contributes: the first index after the boundary for a start edge, the
    /// number of samples before the boundary for an end edge.
    NoSample {
        /// Half-open range bound for this edge.
        partition: usize,
    },
}

impl BoundaryResolution {
    /// The single sample this boundary resolves to, if any.
    ///
    /// Exact groups are reduced with `policy.effective_duplicates(requested)`;
    /// an extrapolated group always yields its last member.
    #[must_use]
    pub fn sample_index(&self, policy: TimeIndexPolicy, requested: DuplicatePolicy) -> Option<usize> {
        match self {
            Self::Exact(group) => policy.effective_duplicates(requested).select(group.clone()),
            Self::Extrapolated(group) => DuplicatePolicy::LastValue.select(group.clone()),
            Self::NoSample { .. } => None,
        }
    }

    /// The bound this edge contributes to a half-open index range.
    ///
    /// For a start edge this is the first included index; for an end edge
    /// it is one past the last included index. Whole duplicate groups are
    /// kept: the forced last-value rule only picks a single stand-in and
    /// never narrows a range.
    #[must_use]
    pub fn range_bound(&self, boundary: Boundary) -> usize {
        match (self, boundary) {
            (Self::Exact(group) | Self::Extrapolated(group), Boundary::Start) => group.start,
            (Self::Exact(group) | Self::Extrapolated(group), Boundary::End) => group.end,
            (Self::NoSample { partition }, _) => *partition,
        }
    }

    /// Whether a neighbouring group stands in for the boundary.
    pub const fn is_extrapolated(&self) -> bool {
        matches!(self, Self::Extrapolated(_))
    }
}

/// Resolves `at` against `times` for one edge of a query.
///
/// `times` must be sorted ascending; equal neighbours form a duplicate group
/// in insertion order.
///
/// # Examples
///
/// ```
/// use tickflow::{resolve_boundary, Boundary, BoundaryResolution, TimeIndexPolicy};
///
/// let times = [1, 5, 5];
///
/// let exact = resolve_boundary(&times, &5, Boundary::End, TimeIndexPolicy::Inclusive);
/// assert_eq!(exact, BoundaryResolution::Exact(1..3));
///
/// let gone = resolve_boundary(&times, &5, Boundary::End, TimeIndexPolicy::Exclusive);
/// assert_eq!(gone, BoundaryResolution::NoSample { partition: 1 });
///
/// let stand_in = resolve_boundary(&times, &7, Boundary::End, TimeIndexPolicy::Extrapolate);
/// assert_eq!(stand_in, BoundaryResolution::Extrapolated(1..3));
/// ```
pub fn resolve_boundary<T: Ord>(
    times: &[T],
    at: &T,
    boundary: Boundary,
    policy: TimeIndexPolicy,
) -> BoundaryResolution {
    let before = times.partition_point(|t| t < at);
    let through = times.partition_point(|t| t <= at);

    if before < through {
        if policy.includes_exact() {
            return BoundaryResolution::Exact(before..through);
        }
        return BoundaryResolution::NoSample {
            partition: match boundary {
                Boundary::Start => through,
                Boundary::End => before,
            },
        };
    }

    // No sample at `at`: before == through.
    if policy.extrapolates() {
        match boundary {
            Boundary::End if before > 0 => {
                let group = group_start(times, before - 1)..before;
                return BoundaryResolution::Extrapolated(group);
            }
            Boundary::Start if through < times.len() => {
                let stamp = &times[through];
                let group_end = through + times[through..].partition_point(|t| t <= stamp);
                return BoundaryResolution::Extrapolated(through..group_end);
            }
            _ => {}
        }
    }

    BoundaryResolution::NoSample { partition: before }
}

/// Start of the duplicate group containing `index`.
pub(crate) fn group_start<T: Ord>(times: &[T], index: usize) -> usize {
    let stamp = &times[index];
    times[..index].partition_point(|t| t < stamp)
}
