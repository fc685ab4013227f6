pub mod cancel;
pub mod channels;

pub use cancel::CancellationToken;
pub use channels::{event_channel, EventSink, EventStream, Waker};
