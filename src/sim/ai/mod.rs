//! AI Decision Engine
//!
//! Two independent state machines sharing the AI phase:
//! - `hostile`: monsters (Idle/Patrol/Chase/Attack/Return/Flee)
//! - `ally`: AI-driven party members (Follow/Engage plus auto-casting)
//!
//! Both only write intents (`MoveIntent`, `AttackIntent`, `CastIntent`); the
//! combat and magic phases later in the same tick consume them.

pub mod ally;
pub mod hostile;

pub use ally::update_ally_ai;
pub use hostile::update_hostile_ai;
