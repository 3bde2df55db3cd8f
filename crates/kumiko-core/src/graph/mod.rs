//! Box / port / connection graph.
//!
//! A [`Patcher`] holds boxes built by the [`Factory`](crate::Factory) and the
//! directed [`Connection`]s between their ports. Two execution models share
//! this one topology:
//!
//! - **Messages** travel over control connections, synchronously and depth
//!   first: a box that emits during `receive` runs every downstream `receive`
//!   before its own call returns.
//! - **Signals** travel over signal connections once per block, in the order
//!   computed by the [signal chain](crate::chain).
//!
//! # Example
//!
//! ```rust,ignore
//! let patcher = Patcher::new(factory);
//! let a = patcher.create_from_text("+ 1")?;
//! let b = patcher.create_from_text("print")?;
//! patcher.connect(a, 0, b, 0)?;
//! patcher.send(a, 0, &[Atom::Long(41)])?; // prints 42
//! ```

mod connection;
mod node;
mod object;
mod patcher;
mod port;

pub use connection::Connection;
pub use node::{BoxHandle, BoxId, BoxInfo};
pub use object::{Construction, Context, Object};
pub use patcher::{DEFAULT_MAX_DEPTH, Patcher};
pub use port::{Inlet, Outlet, Polarity, PortKind};
