use crate::core::rotations::EulerAngles;
use std::cmp::Ordering;

/// Upper bound on the number of entries in a ranked result.
pub const MAX_RANKED_ENTRIES: usize = 10_000;

// Extra capacity so that inserting before truncating never reallocates.
const GUARD_SLOTS: usize = 2;

/// A translation in signed grid units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Displacement {
    pub x: i32,
    pub y: i32,
    pub z: i32,
}

impl Displacement {
    pub const fn new(x: i32, y: i32, z: i32) -> Self {
        Self { x, y, z }
    }

    /// Maps grid indices to a displacement; indices past `size / 2` wrap to
    /// negative values.
    pub fn from_wrapped(x: usize, y: usize, z: usize, size: usize) -> Self {
        let wrap = |i: usize| {
            let i = i as i32;
            if i > (size / 2) as i32 { i - size as i32 } else { i }
        };
        Self::new(wrap(x), wrap(y), wrap(z))
    }

    pub fn squared_distance(&self, other: &Displacement) -> i64 {
        let dx = i64::from(self.x - other.x);
        let dy = i64::from(self.y - other.y);
        let dz = i64::from(self.z - other.z);
        dx * dx + dy * dy + dz * dz
    }
}

/// One scored translation of a single rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candidate {
    pub score: i32,
    pub elec: f64,
    pub displacement: Displacement,
}

impl Candidate {
    const PLACEHOLDER: Candidate = Candidate {
        score: 0,
        elec: 0.0,
        displacement: Displacement::new(0, 0, 0),
    };
}

/// The K best candidates of one rotation, best first.
///
/// Starts out holding K zero-score placeholders at displacement (0, 0, 0), so
/// only strictly positive scores ever displace them. A candidate is accepted
/// only if it beats the current last entry; among equal scores the earlier
/// offer stays ahead.
#[derive(Debug, Clone, PartialEq)]
pub struct TopScores {
    keep: usize,
    entries: Vec<Candidate>,
}

impl TopScores {
    pub fn new(keep: usize) -> Self {
        let mut entries = Vec::with_capacity(keep + GUARD_SLOTS);
        entries.resize(keep, Candidate::PLACEHOLDER);
        Self { keep, entries }
    }

    /// Lowest score a candidate has to beat, or `None` when keeping nothing.
    #[inline]
    pub fn threshold(&self) -> Option<i32> {
        self.entries.last().map(|c| c.score)
    }

    /// Offers a candidate; returns whether it was kept.
    pub fn offer(&mut self, candidate: Candidate) -> bool {
        match self.threshold() {
            Some(lowest) if candidate.score > lowest => {
                let at = self
                    .entries
                    .partition_point(|e| e.score >= candidate.score);
                self.entries.insert(at, candidate);
                self.entries.truncate(self.keep);
                true
            }
            _ => false,
        }
    }

    pub fn as_slice(&self) -> &[Candidate] {
        &self.entries
    }

    pub fn into_vec(self) -> Vec<Candidate> {
        self.entries
    }
}

/// Drops candidates that sit too close to a better one of the same rotation.
///
/// Entry `i` is dropped when its squared displacement distance to any entry
/// `j < i` is below `min_distance_sq`, whether or not `j` itself survived.
/// A threshold of 0 keeps every entry.
pub fn deduplicate(candidates: &[Candidate], min_distance_sq: u32) -> Vec<Candidate> {
    if min_distance_sq == 0 {
        return candidates.to_vec();
    }
    let limit = i64::from(min_distance_sq);
    candidates
        .iter()
        .enumerate()
        .filter(|(i, c)| {
            !candidates[..*i]
                .iter()
                .any(|better| better.displacement.squared_distance(&c.displacement) < limit)
        })
        .map(|(_, c)| *c)
        .collect()
}

/// A retained candidate tagged with the rotation that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScoreEntry {
    pub rotation: usize,
    /// Reserved for downstream refinement tools; always 0 here.
    pub previous_id: usize,
    pub score: i32,
    pub elec: f64,
    pub displacement: Displacement,
    pub angles: EulerAngles,
}

impl ScoreEntry {
    pub fn new(rotation: usize, angles: EulerAngles, candidate: &Candidate) -> Self {
        Self {
            rotation,
            previous_id: 0,
            score: candidate.score,
            elec: candidate.elec,
            displacement: candidate.displacement,
            angles,
        }
    }
}

/// Total order used for the final ranking: score descending, then
/// electrostatics ascending, displacement, angles and rotation id ascending.
pub fn ranking_order(a: &ScoreEntry, b: &ScoreEntry) -> Ordering {
    b.score
        .cmp(&a.score)
        .then_with(|| a.elec.total_cmp(&b.elec))
        .then_with(|| a.displacement.cmp(&b.displacement))
        .then_with(|| a.angles.cmp(&b.angles))
        .then_with(|| a.rotation.cmp(&b.rotation))
}

/// Sorts `entries` into ranking order and keeps the best [`MAX_RANKED_ENTRIES`].
pub fn rank_entries(entries: &mut Vec<ScoreEntry>) {
    entries.sort_by(ranking_order);
    entries.truncate(MAX_RANKED_ENTRIES);
}

/// The most favourable (lowest) electrostatics ratio, or 0 when none is negative.
pub fn most_favourable_elec(entries: &[ScoreEntry]) -> f64 {
    entries.iter().map(|e| e.elec).fold(0.0, f64::min)
}

/// Expresses `elec` as a percentage of `most_favourable`; 0 when that is 0.
pub fn elec_percentage(elec: f64, most_favourable: f64) -> f64 {
    if most_favourable == 0.0 {
        0.0
    } else {
        100.0 * elec / most_favourable
    }
}
