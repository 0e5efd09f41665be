//! Terminal output for the CLI
//!
//! `Terminal` decides between cliclack/indicatif rendering and plain tagged
//! lines. `report` holds the messages commands print about workers, cache
//! stores and config; `progress` draws the feed spinner and the precache bar.
//!
//! ```rust,ignore
//! use newsw::ui::{report, Terminal};
//!
//! let term = Terminal::detect().assume_yes(args.yes);
//! if term.confirm_removal("Clearing caches", &stores).await? {
//!     report::stores_cleared(&term, stores.len());
//! }
//! ```

mod progress;
pub mod report;
mod terminal;

pub use progress::{PrecacheProgress, TaskSpinner};
pub use terminal::Terminal;
