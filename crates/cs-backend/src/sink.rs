//! Receivers for reply-stream callbacks.

/// Receives the callbacks of one reply stream, in stream order.
///
/// `on_chunk` fires zero or more times, then at most one of `on_complete` or
/// `on_error`.
pub trait StreamSink {
    /// An incremental fragment, never the full accumulation.
    fn on_chunk(&mut self, text: &str);

    /// The final reply text.
    fn on_complete(&mut self, text: &str);

    /// An in-band server error or a transport failure.
    fn on_error(&mut self, message: &str);
}

impl<K: StreamSink + ?Sized> StreamSink for &mut K {
    fn on_chunk(&mut self, text: &str) {
        (**self).on_chunk(text)
    }

    fn on_complete(&mut self, text: &str) {
        (**self).on_complete(text)
    }

    fn on_error(&mut self, message: &str) {
        (**self).on_error(message)
    }
}

/// Sink built from three closures.
pub struct CallbackSink<C, D, E> {
    on_chunk: C,
    on_complete: D,
    on_error: E,
}

impl<C, D, E> CallbackSink<C, D, E>
where
    C: FnMut(&str),
    D: FnMut(&str),
    E: FnMut(&str),
{
    pub fn new(on_chunk: C, on_complete: D, on_error: E) -> Self {
        Self {
            on_chunk,
            on_complete,
            on_error,
        }
    }
}

impl<C, D, E> StreamSink for CallbackSink<C, D, E>
where
    C: FnMut(&str),
    D: FnMut(&str),
    E: FnMut(&str),
{
    fn on_chunk(&mut self, text: &str) {
        (self.on_chunk)(text)
    }

    fn on_complete(&mut self, text: &str) {
        (self.on_complete)(text)
    }

    fn on_error(&mut self, message: &str) {
        (self.on_error)(message)
    }
}
