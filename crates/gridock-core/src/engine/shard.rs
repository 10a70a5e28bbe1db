use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ShardError {
    #[error("The number of parallel parts must be at least 1, got {0}")]
    InvalidPartCount(usize),
    #[error("Shard id {id} is outside 1..={parts}")]
    InvalidShardId { id: usize, parts: usize },
}

/// One slice of the rotation space: shard `id` of `parts` cooperating runs.
///
/// Shard `id` owns rotations `id, id + parts, id + 2 * parts, ...`. Rotation
/// ids are 1-based, so the shards of one plan cover `1..=N` exactly once.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardPlan {
    parts: usize,
    id: usize,
}

impl Default for ShardPlan {
    fn default() -> Self {
        Self { parts: 1, id: 1 }
    }
}

impl ShardPlan {
    /// # Errors
    ///
    /// Returns a [`ShardError`] when `parts < 1` or `id` lies outside `1..=parts`.
    pub fn new(parts: usize, id: usize) -> Result<Self, ShardError> {
        if parts < 1 {
            return Err(ShardError::InvalidPartCount(parts));
        }
        if id < 1 || id > parts {
            return Err(ShardError::InvalidShardId { id, parts });
        }
        Ok(Self { parts, id })
    }

    pub fn parts(&self) -> usize {
        self.parts
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn owns(&self, rotation: usize) -> bool {
        rotation >= self.id && (rotation - self.id) % self.parts == 0
    }

    /// Every rotation of `1..=total` owned by this shard, in increasing order.
    pub fn rotations(&self, total: usize) -> impl Iterator<Item = usize> {
        (self.id..=total).step_by(self.parts)
    }

    /// The owned rotations of `1..=total` strictly after `last_completed`.
    pub fn rotations_after(
        &self,
        last_completed: usize,
        total: usize,
    ) -> impl Iterator<Item = usize> {
        let start = if last_completed < self.id {
            self.id
        } else {
            self.id + ((last_completed - self.id) / self.parts + 1) * self.parts
        };
        (start..=total).step_by(self.parts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_plans_are_rejected() {
        assert_eq!(ShardPlan::new(0, 1), Err(ShardError::InvalidPartCount(0)));
        assert_eq!(
            ShardPlan::new(4, 0),
            Err(ShardError::InvalidShardId { id: 0, parts: 4 })
        );
        assert_eq!(
            ShardPlan::new(4, 5),
            Err(ShardError::InvalidShardId { id: 5, parts: 4 })
        );
    }

    #[test]
    fn single_shard_owns_everything() {
        let plan = ShardPlan::default();
        assert_eq!(plan.rotations(5).collect::<Vec<_>>(), vec![1, 2, 3, 4, 5]);
    }

    #[test]
    fn shards_cover_every_rotation_exactly_once() {
        for total in [1, 7, 24, 100] {
            for parts in 1..=9 {
                let mut seen = vec![0usize; total + 1];
                for id in 1..=parts {
                    let plan = ShardPlan::new(parts, id).unwrap();
                    for r in plan.rotations(total) {
                        assert!(plan.owns(r));
                        seen[r] += 1;
                    }
                }
                assert_eq!(seen[0], 0);
                assert!(seen[1..].iter().all(|&c| c == 1), "total {total}, parts {parts}");
            }
        }
    }

    #[test]
    fn shard_with_id_beyond_total_has_no_work() {
        let plan = ShardPlan::new(8, 6).unwrap();
        assert_eq!(plan.rotations(5).count(), 0);
    }

    #[test]
    fn resuming_skips_to_the_next_owned_rotation() {
        let plan = ShardPlan::new(3, 2).unwrap();
        assert_eq!(plan.rotations_after(0, 12).collect::<Vec<_>>(), vec![2, 5, 8, 11]);
        assert_eq!(plan.rotations_after(5, 12).collect::<Vec<_>>(), vec![8, 11]);
        // A log that stops on a rotation of another shard
        assert_eq!(plan.rotations_after(6, 12).collect::<Vec<_>>(), vec![8, 11]);
        assert_eq!(plan.rotations_after(11, 12).count(), 0);
    }
}
