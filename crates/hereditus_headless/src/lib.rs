//! Headless game runner for bots, balance testing and CI verification.
//!
//! This crate provides a headless game runner that can be controlled via
//! JSON commands on stdin, with game state output on stdout. This enables:
//!
//! - **Bot play**: human seats can be driven by any program that speaks JSON
//! - **Balance testing**: thousands of AI-vs-AI games in parallel
//! - **Replay verification**: check that recorded sessions reproduce exactly
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from controller (join, breed, end_turn, etc.)
//! - **stdout**: Responses and round reports (JSON)
//! - **stderr**: Debug logs (human-readable)
//!
//! [`protocol`] lists every command and response.
//!
//! # Example
//!
//! ```bash
//! # Run interactively
//! echo '{"cmd":"join_ai","profile":"breeder"}' | cargo run -p hereditus_headless
//!
//! # Run a scenario
//! cargo run -p hereditus_headless -- run --scenario scenarios/duel.ron
//!
//! # Verify a recorded session
//! cargo run -p hereditus_headless -- verify --replay session.replay
//! ```

pub mod batch;
pub mod metrics;
pub mod protocol;
pub mod runner;
pub mod scenario;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, GameMetrics, MetricsCollector};
pub use protocol::{Command, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
pub use scenario::{Scenario, ScenarioError};
