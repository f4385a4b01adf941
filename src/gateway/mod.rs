//! HTTP front end: turns requests into scheduler calls and scheduler state
//! into responses.
//!
//! | Method | Path            | Body / response                                   |
//! |--------|-----------------|---------------------------------------------------|
//! | POST   | `/queue/tasks`  | `{"key": ms, ...}` or `[{"key", "duration"}]` → `ok` |
//! | GET    | `/queue/status` | `{"pending": [...], "running": [...]}`            |
//! | GET    | `/health`       | `{"ok": true}`                                    |

pub mod request;
pub mod routes;
pub mod server;

pub use request::{TaskBatch, TaskRequest};
pub use routes::{router, Health};
pub use server::{serve, wait_for_shutdown_signal};
