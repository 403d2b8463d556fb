pub mod error;
pub mod event;
pub mod sink;
pub mod state;

pub use error::{EmgError, Result};
pub use event::{LinkEvent, LinkSignal};
pub use sink::{RenderSink, StatusSink};
pub use state::{Frame, Reading, Summary, WindowSnapshot};
