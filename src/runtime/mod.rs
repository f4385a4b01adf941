//! Runtime adapters: how admitted tasks get spawned.

pub mod spawn;
pub mod tokio_spawner;

pub use spawn::Spawn;
pub use tokio_spawner::TokioSpawner;
