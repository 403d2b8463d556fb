use crate::state::Frame;

/// A chart surface that redraws from a full window snapshot.
///
/// Sinks are purely reactive: they receive read-only frames and can never
/// reach back into the buffer or statistics that produced them.
pub trait RenderSink {
    /// Redraw without animation.  Called once per accepted reading.
    fn render(&mut self, frame: &Frame);
}

/// Connected/disconnected indicator.
pub trait StatusSink {
    fn set_connected(&mut self, connected: bool);
}

impl<T: RenderSink + ?Sized> RenderSink for Box<T> {
    fn render(&mut self, frame: &Frame) {
        (**self).render(frame);
    }
}

impl<T: StatusSink + ?Sized> StatusSink for Box<T> {
    fn set_connected(&mut self, connected: bool) {
        (**self).set_connected(connected);
    }
}
