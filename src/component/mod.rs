//! Components: lifecycle, properties, repaint pipelines and notifications.

pub mod instance;
pub mod notify;
pub mod options;
pub mod pipeline;
pub mod properties;
pub mod stage;
pub mod widget;

pub use instance::{Component, RenderHook, RenderPhase, WeakComponent};
pub use notify::{Notification, NotifyHandler, SubscriptionId};
pub use options::Options;
pub use pipeline::{PaintFn, Painter, Pipeline};
pub use properties::{is_reserved, Accessor, ChangeRecord, ChangeSet, Properties, RESERVED_KEYS};
pub use stage::Stage;
pub use widget::Widget;
