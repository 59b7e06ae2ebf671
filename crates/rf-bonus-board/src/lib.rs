//! # rf-bonus-board - Cascading Bonus Board Engine
//!
//! Hold-and-spin style bonus round on a growable grid. Every step fills
//! the empty cells from a weighted table; special symbols multiply,
//! spawn, replace and upgrade coins in chain; full rows unlock more rows.
//!
//! ## Features
//!
//! - **Weighted Spawning**: Phase-keyed weight tables (`base`, `deep`)
//! - **Symbol Effects**: Collector, Payer, Combo, Sniper, Necromancer,
//!   Unlock, Arms Dealer, Upgrader, Reset Plus
//! - **Growable Window**: 4 visible rows growing to 8 as rows complete
//! - **Effect Queue**: Ordered, timestamped record of every mutation
//! - **Timing Profiles**: Normal, Turbo, Studio (instant) timing modes
//!
//! ## Architecture
//!
//! ```text
//! BonusSession (Arc<Mutex<..>>, autoplay thread)
//!     │
//!     v
//! SpinOrchestrator
//!     │
//!     ├── WeightTables (phase → symbol weights)
//!     ├── Board (cells, active window)
//!     ├── RowUnlockController (full row → window growth)
//!     └── WinAccumulator (capped coin total)
//!           │
//!           v
//!     StepReport → Vec<EffectRecord> → Presenter
//! ```

pub mod accumulator;
pub mod board;
pub mod config;
pub mod effects;
pub mod error;
pub mod orchestrator;
mod resolve;
pub mod session;
pub mod symbols;
pub mod timing;
pub mod unlock;
pub mod weights;

pub use accumulator::*;
pub use board::*;
pub use config::*;
pub use effects::*;
pub use error::*;
pub use orchestrator::*;
pub use resolve::RESET_PLUS_RESPINS;
pub use session::*;
pub use symbols::*;
pub use timing::*;
pub use unlock::*;
pub use weights::*;
