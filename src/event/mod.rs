//! Event system: DOM events, delegation, pooled global listeners, timers
//! and terminal input.

pub mod delegate;
pub mod dom_event;
pub mod input;
pub mod pool;
pub mod timer;

pub use delegate::{DomHandler, HandlerId};
pub use dom_event::{DomEvent, EventDetail};
pub use input::{Key, Modifiers, MouseBtn, Route};
pub use timer::TimerId;
