//! Trailing-edge throttling for bursty inputs.
//!
//! A [`Throttle`] coalesces a rapid burst of submissions into exactly one
//! delayed execution of the most recent one, once no new submission has
//! arrived for a full window. Useful wherever an expensive operation (a
//! remote call, a UI refresh) should run with the freshest arguments after
//! input settles, instead of on every input event.
//!
//! ```
//! use std::time::Duration;
//! use lull::Throttle;
//!
//! let throttle = Throttle::new(Duration::from_millis(500))?;
//!
//! for query in ["a", "ap", "app"] {
//!     let query = query.to_string();
//!
//!     throttle.handle(move || {
//!         println!("searching for {query}");
//!         Ok(())
//!     })?;
//! }
//!
//! // only the "app" search runs, roughly half a second after it was submitted
//! # Ok::<(), lull::Error>(())
//! ```

pub mod dispatch;
pub mod errors;
pub mod lock;
pub mod throttle;

pub use dispatch::{Dispatch, WorkItem};
pub use errors::Error;
pub use throttle::{Action, Config, Throttle};
