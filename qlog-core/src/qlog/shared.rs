//! Lock-protected tracer handle
//!
//! [`Tracer`] has no internal locking. Engines that record on one thread and
//! export from another can wrap it in a `SharedTracer`, paying one mutex
//! acquisition per intake call. Export copies the buffer under the lock and
//! encodes outside it, so a slow sink never stalls packet processing.

use std::io::Write;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use crate::error::Result;
use crate::wire::{Frame, Header};

use super::document::TraceDocument;
use super::tracer::{ConnectionTracer, Tracer};

/// Cloneable, thread-safe handle to a [`Tracer`]
#[derive(Debug, Clone)]
pub struct SharedTracer {
    inner: Arc<Mutex<Tracer>>,
}

impl SharedTracer {
    pub fn new(tracer: Tracer) -> Self {
        Self {
            inner: Arc::new(Mutex::new(tracer)),
        }
    }

    pub fn record_sent(&self, time: DateTime<Utc>, header: &Header, frames: &[Frame]) -> Result<()> {
        self.inner.lock().record_sent(time, header, frames)
    }

    pub fn record_received(
        &self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        self.inner.lock().record_received(time, header, frames)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn snapshot(&self) -> TraceDocument<'static> {
        self.inner.lock().snapshot()
    }

    /// Export a snapshot of the current buffer
    pub fn export<W: Write>(&self, sink: W) -> Result<()> {
        let (document, pretty) = {
            let tracer = self.inner.lock();
            (tracer.snapshot(), tracer.config().pretty)
        };
        tracing::debug!("Exporting shared qlog trace ({} events)", document.event_count());
        document.write_to(sink, pretty)
    }

    /// Run `f` with exclusive access to the underlying tracer
    pub fn with_tracer<R>(&self, f: impl FnOnce(&mut Tracer) -> R) -> R {
        let mut tracer = self.inner.lock();
        f(&mut *tracer)
    }
}

impl From<Tracer> for SharedTracer {
    fn from(tracer: Tracer) -> Self {
        Self::new(tracer)
    }
}

impl ConnectionTracer for SharedTracer {
    fn sent_packet(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        self.record_sent(time, header, frames)
    }

    fn received_packet(
        &mut self,
        time: DateTime<Utc>,
        header: &Header,
        frames: &[Frame],
    ) -> Result<()> {
        self.record_received(time, header, frames)
    }

    fn export(&self, sink: &mut dyn Write) -> Result<()> {
        SharedTracer::export(self, sink)
    }

    fn name(&self) -> &'static str {
        "qlog-shared"
    }
}
