//! Read/write phase barrier between solver evaluation and window mutation.
//!
//! Residual evaluation is read-only over the preintegration and feature
//! state, so a solver may evaluate blocks concurrently. Mutation — bias
//! repropagation, triangulation, track eviction — must be serialized against
//! those passes. `SharedWindow` packages that contract as a pair of
//! `parking_lot` read-write locks.

use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::feature::FeatureManager;

use super::KeyframeArena;

/// Window state shared between the solver side and the estimator side.
pub struct SharedWindow {
    /// Keyframe-state slots. Solver passes read; window sliding writes.
    arena: RwLock<KeyframeArena>,
    /// Feature tracks. Residual construction reads; triangulation and
    /// eviction write.
    features: RwLock<FeatureManager>,
}

impl SharedWindow {
    pub fn new(arena: KeyframeArena, features: FeatureManager) -> Self {
        Self {
            arena: RwLock::new(arena),
            features: RwLock::new(features),
        }
    }

    /// Read access for an evaluation pass.
    pub fn read_arena(&self) -> RwLockReadGuard<'_, KeyframeArena> {
        self.arena.read()
    }

    /// Exclusive access for window mutation; blocks until every evaluation
    /// pass has released its guard.
    pub fn write_arena(&self) -> RwLockWriteGuard<'_, KeyframeArena> {
        self.arena.write()
    }

    pub fn read_features(&self) -> RwLockReadGuard<'_, FeatureManager> {
        self.features.read()
    }

    pub fn write_features(&self) -> RwLockWriteGuard<'_, FeatureManager> {
        self.features.write()
    }
}
