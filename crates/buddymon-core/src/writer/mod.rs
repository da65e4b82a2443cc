//! Destinations for assembled batches.

mod influx;
mod memory;

pub use influx::InfluxWriter;
pub use memory::MemoryWriter;

use crate::point::Batch;

/// Error type for failed writes. The batch is dropped either way.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The request could not be built or sent, or no response arrived.
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// The destination answered with a non-success status.
    #[error("write rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    /// The destination is not accepting writes.
    #[error("destination unavailable: {0}")]
    Unavailable(String),
}

/// Something that accepts a batch of points.
pub trait PointWriter {
    /// Writes the whole batch. No retry happens on failure.
    fn write(&mut self, batch: &Batch) -> Result<(), TransportError>;
}

impl<W: PointWriter + ?Sized> PointWriter for Box<W> {
    fn write(&mut self, batch: &Batch) -> Result<(), TransportError> {
        (**self).write(batch)
    }
}
