//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only
//! - Seeded RNG only
//! - Stable iteration order (by entity ID)
//! - No rendering or platform dependencies

pub mod body;
pub mod collision;
pub mod merge;
pub mod palette;
pub mod physics;
pub mod state;
pub mod tick;

pub use body::{Ball, CollisionFilter, Wall, build_box, category};
pub use collision::{Contact, box_circle, circle_circle};
pub use merge::{MergeRequest, MergeResolved, Merger, PendingMerge, is_merge_candidate, merged_radius};
pub use palette::BallColor;
pub use physics::{BodyRef, CollisionStart, World};
pub use state::{GameEvent, GamePhase, GameState, IdGen, Preview};
pub use tick::{TickInput, restart, tick};
