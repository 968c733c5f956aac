//! Fixed-capacity particle storage with free-slot recycling

use cinder_core::{CinderError, Result, Vec3};

use crate::active::ActiveIndexList;
use crate::force::{ForceRange, ForceSampler};
use crate::spawner::CreationRequest;

/// Hard cap on pool capacity
pub const MAX_PARTICLES: usize = 65_000;

/// Struct-of-arrays particle storage indexed by slot.
///
/// A slot is in use iff it appears exactly once in the active list. Free
/// slots sit on a stack, so allocation and release are O(1); the backing
/// arrays never grow after construction.
pub struct ParticlePool {
    pub(crate) positions: Vec<Vec3>,
    pub(crate) prior_positions: Vec<Vec3>,
    pub(crate) forces: Vec<Vec3>,
    pub(crate) time_to_live: Vec<f32>,
    in_use: Vec<bool>,
    /// Free slots, next to hand out on top
    free: Vec<u32>,
    active: ActiveIndexList,
}

impl ParticlePool {
    /// Allocate storage for `capacity` slots, all free.
    /// Fails for 0 or more than [`MAX_PARTICLES`].
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 || capacity > MAX_PARTICLES {
            return Err(CinderError::InvalidCapacity {
                requested: capacity,
                max: MAX_PARTICLES,
            });
        }
        Ok(Self::with_storage(capacity))
    }

    /// Pool at the hard cap
    pub fn with_max_capacity() -> Self {
        Self::with_storage(MAX_PARTICLES)
    }

    fn with_storage(capacity: usize) -> Self {
        Self {
            positions: vec![Vec3::ZERO; capacity],
            prior_positions: vec![Vec3::ZERO; capacity],
            forces: vec![Vec3::ZERO; capacity],
            time_to_live: vec![0.0; capacity],
            in_use: vec![false; capacity],
            // Reversed so the lowest slots are handed out first
            free: (0..capacity as u32).rev().collect(),
            active: ActiveIndexList::with_capacity(capacity),
        }
    }

    pub fn capacity(&self) -> usize {
        self.in_use.len()
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Slots still available; `active_count() + remaining() == capacity()`
    pub fn remaining(&self) -> usize {
        self.capacity() - self.active.len()
    }

    pub fn active(&self) -> &ActiveIndexList {
        &self.active
    }

    pub(crate) fn active_mut(&mut self) -> &mut ActiveIndexList {
        &mut self.active
    }

    pub fn is_in_use(&self, slot: u32) -> bool {
        self.in_use.get(slot as usize).copied().unwrap_or(false)
    }

    /// Dense position buffer, indexed by slot. Entries of free slots are stale.
    pub fn positions(&self) -> &[Vec3] {
        &self.positions
    }

    pub fn position(&self, slot: u32) -> Vec3 {
        self.positions[slot as usize]
    }

    pub fn prior_position(&self, slot: u32) -> Vec3 {
        self.prior_positions[slot as usize]
    }

    pub fn force(&self, slot: u32) -> Vec3 {
        self.forces[slot as usize]
    }

    pub fn time_to_live(&self, slot: u32) -> f32 {
        self.time_to_live[slot as usize]
    }

    /// Take a free slot and populate it from `request`.
    ///
    /// The prior position is set one step of `dt` back along the requested
    /// velocity, so the first Verlet step reproduces that velocity. Returns
    /// `None` when the pool is full.
    pub fn allocate(
        &mut self,
        request: &CreationRequest,
        dt: f32,
        force_range: &ForceRange,
        sampler: &mut ForceSampler,
    ) -> Option<u32> {
        let slot = self.free.pop()?;
        let j = slot as usize;
        debug_assert!(!self.in_use[j], "free stack handed out live slot {slot}");

        self.positions[j] = request.position;
        self.prior_positions[j] = request.position - request.velocity * dt;
        self.forces[j] = sampler.sample(force_range);
        // A lifetime that never counts down expires on the next sweep instead
        self.time_to_live[j] = if request.time_to_live.is_finite() {
            request.time_to_live
        } else {
            0.0
        };
        self.in_use[j] = true;
        self.active.push(slot);

        Some(slot)
    }

    /// Allocate as many of `requests` as fit, in order. The tail beyond the
    /// remaining capacity is dropped. Returns the number accepted.
    pub fn allocate_batch(
        &mut self,
        requests: &[CreationRequest],
        dt: f32,
        force_range: &ForceRange,
        sampler: &mut ForceSampler,
    ) -> usize {
        let accepted = requests.len().min(self.remaining());
        requests[..accepted]
            .iter()
            .filter_map(|request| self.allocate(request, dt, force_range, sampler))
            .count()
    }

    /// Release `slot`, found at active list position `position`.
    ///
    /// If `slot` is already free the stale active entry is still dropped, so
    /// the list resynchronizes, and a consistency error is returned.
    pub fn release(&mut self, position: usize, slot: u32) -> Result<()> {
        if self.active.get(position) != Some(slot) {
            return Err(CinderError::Consistency { slot, position });
        }
        self.active.remove_at(position);

        let j = slot as usize;
        if !self.in_use[j] {
            // Reclaim the slot so remaining() and the free stack agree again
            if !self.free.contains(&slot) {
                self.free.push(slot);
            }
            return Err(CinderError::Consistency { slot, position });
        }
        self.in_use[j] = false;
        self.free.push(slot);
        Ok(())
    }

    #[cfg(test)]
    pub(crate) fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Break the active/in-use pairing for one slot (tests only)
    #[cfg(test)]
    pub(crate) fn corrupt_in_use(&mut self, slot: u32) {
        self.in_use[slot as usize] = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(x: f32, ttl: f32) -> CreationRequest {
        CreationRequest::new(Vec3::new(x, 0.0, 0.0), Vec3::ZERO, ttl)
    }

    fn assert_invariants(pool: &ParticlePool) {
        assert_eq!(pool.active_count() + pool.remaining(), pool.capacity());
        assert_eq!(pool.free_count(), pool.remaining());

        let mut seen = vec![false; pool.capacity()];
        for &slot in pool.active().as_slice() {
            assert!(!seen[slot as usize], "slot {slot} listed twice");
            seen[slot as usize] = true;
            assert!(pool.is_in_use(slot));
        }
        for slot in 0..pool.capacity() as u32 {
            assert_eq!(pool.is_in_use(slot), seen[slot as usize]);
        }
    }

    #[test]
    fn capacity_bounds_are_enforced() {
        assert!(matches!(
            ParticlePool::new(0),
            Err(CinderError::InvalidCapacity { requested: 0, .. })
        ));
        assert!(ParticlePool::new(MAX_PARTICLES + 1).is_err());
        assert_eq!(ParticlePool::new(MAX_PARTICLES).unwrap().capacity(), MAX_PARTICLES);
        assert_eq!(ParticlePool::with_max_capacity().remaining(), MAX_PARTICLES);
    }

    #[test]
    fn allocate_populates_slot() {
        let mut pool = ParticlePool::new(4).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange {
            x: [1.0, 1.0],
            y: [2.0, 2.0],
            z: [3.0, 3.0],
        };
        let req = CreationRequest::new(Vec3::new(1.0, 2.0, 3.0), Vec3::new(10.0, 0.0, 0.0), 5.0);

        let slot = pool.allocate(&req, 0.1, &range, &mut sampler).unwrap();
        assert_eq!(slot, 0);
        assert!(pool.is_in_use(slot));
        assert_eq!(pool.position(slot), Vec3::new(1.0, 2.0, 3.0));
        assert!((pool.prior_position(slot).x - 0.0).abs() < 1e-6);
        assert_eq!(pool.force(slot), Vec3::new(1.0, 2.0, 3.0));
        assert_eq!(pool.time_to_live(slot), 5.0);
        assert_eq!(pool.active().as_slice(), &[0]);
        assert_eq!(pool.remaining(), 3);
    }

    #[test]
    fn non_finite_lifetime_is_zeroed() {
        let mut pool = ParticlePool::new(3).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange::default();
        for ttl in [f32::NAN, f32::INFINITY] {
            let slot = pool.allocate(&request(0.0, ttl), 0.1, &range, &mut sampler).unwrap();
            assert_eq!(pool.time_to_live(slot), 0.0);
        }
    }

    #[test]
    fn full_pool_refuses_allocation() {
        let mut pool = ParticlePool::new(2).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange::default();
        assert!(pool.allocate(&request(0.0, 1.0), 0.1, &range, &mut sampler).is_some());
        assert!(pool.allocate(&request(1.0, 1.0), 0.1, &range, &mut sampler).is_some());
        assert!(pool.allocate(&request(2.0, 1.0), 0.1, &range, &mut sampler).is_none());
        assert_eq!(pool.remaining(), 0);
    }

    #[test]
    fn batch_is_truncated_to_remaining() {
        let mut pool = ParticlePool::new(5).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange::default();
        pool.allocate(&request(-1.0, 1.0), 0.1, &range, &mut sampler);

        let batch: Vec<_> = (0..10).map(|i| request(i as f32, 1.0)).collect();
        let accepted = pool.allocate_batch(&batch, 0.1, &range, &mut sampler);
        assert_eq!(accepted, 4);
        assert_eq!(pool.remaining(), 0);

        // The first four, in order
        let xs: Vec<f32> = pool.active().as_slice()[1..]
            .iter()
            .map(|&s| pool.position(s).x)
            .collect();
        assert_eq!(xs, vec![0.0, 1.0, 2.0, 3.0]);
        assert_invariants(&pool);
    }

    #[test]
    fn released_slots_are_reused() {
        let mut pool = ParticlePool::new(3).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange::default();
        for i in 0..3 {
            pool.allocate(&request(i as f32, 1.0), 0.1, &range, &mut sampler);
        }
        pool.release(1, 1).unwrap();
        assert!(!pool.is_in_use(1));
        assert_eq!(pool.active().as_slice(), &[0, 2]);

        let slot = pool.allocate(&request(9.0, 1.0), 0.1, &range, &mut sampler).unwrap();
        assert_eq!(slot, 1);
        assert_eq!(pool.active().as_slice(), &[0, 2, 1]);
        assert_invariants(&pool);
    }

    #[test]
    fn release_of_free_slot_is_a_consistency_error() {
        let mut pool = ParticlePool::new(3).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange::default();
        pool.allocate(&request(0.0, 1.0), 0.1, &range, &mut sampler);
        pool.allocate(&request(1.0, 1.0), 0.1, &range, &mut sampler);

        pool.corrupt_in_use(0);
        let err = pool.release(0, 0).unwrap_err();
        assert!(matches!(err, CinderError::Consistency { slot: 0, position: 0 }));
        // The stale entry is gone and the pool is usable again
        assert_eq!(pool.active().as_slice(), &[1]);
        assert_eq!(pool.free_count(), pool.remaining());
        assert_eq!(pool.allocate_batch(&[request(5.0, 1.0); 2], 0.1, &range, &mut sampler), 2);
    }

    #[test]
    fn release_with_wrong_position_changes_nothing() {
        let mut pool = ParticlePool::new(3).unwrap();
        let mut sampler = ForceSampler::from_seed(1);
        let range = ForceRange::default();
        pool.allocate(&request(0.0, 1.0), 0.1, &range, &mut sampler);
        pool.allocate(&request(1.0, 1.0), 0.1, &range, &mut sampler);

        assert!(pool.release(0, 1).is_err());
        assert!(pool.release(5, 0).is_err());
        assert_eq!(pool.active().as_slice(), &[0, 1]);
        assert_invariants(&pool);
    }

    #[test]
    fn interleaved_allocate_release_keeps_invariants() {
        let mut pool = ParticlePool::new(16).unwrap();
        let mut sampler = ForceSampler::from_seed(3);
        let range = ForceRange::default();

        for round in 0..50u32 {
            let batch: Vec<_> = (0..(round % 7)).map(|i| request(i as f32, 1.0)).collect();
            pool.allocate_batch(&batch, 0.1, &range, &mut sampler);

            // Release every third active entry, back to front
            for position in (0..pool.active_count()).rev() {
                if (position as u32 + round) % 3 == 0 {
                    let slot = pool.active().get(position).unwrap();
                    pool.release(position, slot).unwrap();
                }
            }
            assert_invariants(&pool);
        }
    }
}
