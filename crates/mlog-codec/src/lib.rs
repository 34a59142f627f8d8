//! Protected-payload codecs.

mod placeholder;

pub use mlog_types::{CodecError, PayloadCodec, PayloadEnvelope};
pub use placeholder::PlaceholderCodec;
