use std::sync::mpsc::{self, Sender};
use std::thread;

use log::{debug, warn};
use tokio::sync::oneshot;

use crate::convert::{Converter, OutputFormat};
use crate::error::{Error, Result};
use crate::render::RenderedCalendar;

enum Command {
    Convert(RenderedCalendar, OutputFormat, oneshot::Sender<Result<Vec<u8>>>),
    Close(oneshot::Sender<()>),
}

/// A converter handle backed by a dedicated worker thread.
///
/// The worker thread owns the backend (which need not be `Send`, a browser
/// session for instance) and runs conversions one at a time. Handles are cheap
/// to clone and can be used from async tasks or from plain threads.
#[derive(Clone)]
pub struct AsyncConverter {
    cmd_tx: Sender<Command>,
}

impl AsyncConverter {
    /// Spawn the worker and build the backend on it.
    pub async fn new<F, C>(factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<C> + Send + 'static,
        C: Converter + 'static,
    {
        let (handle, init_rx) = Self::spawn(factory)?;
        init_rx
            .await
            .map_err(|e| Error::InitializationError(format!("Worker init canceled: {}", e)))??;
        Ok(handle)
    }

    /// Like [`AsyncConverter::new`] but waits for the worker on the current
    /// thread. Must not be called from inside an async runtime.
    pub fn start<F, C>(factory: F) -> Result<Self>
    where
        F: FnOnce() -> Result<C> + Send + 'static,
        C: Converter + 'static,
    {
        let (handle, init_rx) = Self::spawn(factory)?;
        init_rx
            .blocking_recv()
            .map_err(|e| Error::InitializationError(format!("Worker init canceled: {}", e)))??;
        Ok(handle)
    }

    fn spawn<F, C>(factory: F) -> Result<(Self, oneshot::Receiver<Result<()>>)>
    where
        F: FnOnce() -> Result<C> + Send + 'static,
        C: Converter + 'static,
    {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command>();
        let (init_tx, init_rx) = oneshot::channel::<Result<()>>();

        thread::Builder::new()
            .name("wallcal-converter".into())
            .spawn(move || {
                let backend = match factory() {
                    Ok(b) => b,
                    Err(err) => {
                        let _ = init_tx.send(Err(err));
                        return;
                    }
                };
                let _ = init_tx.send(Ok(()));

                while let Ok(cmd) = cmd_rx.recv() {
                    match cmd {
                        Command::Convert(calendar, format, resp) => {
                            let res = backend.convert(&calendar, format);
                            if let Err(e) = &res {
                                warn!("Conversion to {} failed: {}", format, e);
                            }
                            let _ = resp.send(res);
                        }
                        Command::Close(resp) => {
                            drop(backend);
                            let _ = resp.send(());
                            break;
                        }
                    }
                }
                debug!("Converter worker exiting");
            })?;

        Ok((Self { cmd_tx }, init_rx))
    }

    fn submit(
        &self,
        calendar: RenderedCalendar,
        format: OutputFormat,
    ) -> Result<oneshot::Receiver<Result<Vec<u8>>>> {
        let (tx, rx) = oneshot::channel();
        self.cmd_tx
            .send(Command::Convert(calendar, format, tx))
            .map_err(|_| Error::ConversionError("Converter worker has stopped".into()))?;
        Ok(rx)
    }

    /// Convert on the worker and await the result.
    pub async fn convert(&self, calendar: RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        self.submit(calendar, format)?
            .await
            .map_err(|e| Error::ConversionError(format!("Worker response canceled: {}", e)))?
    }

    /// Blocking flavor of [`AsyncConverter::convert`] for non-async callers.
    pub fn convert_blocking(&self, calendar: RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        self.submit(calendar, format)?
            .blocking_recv()
            .map_err(|e| Error::ConversionError(format!("Worker response canceled: {}", e)))?
    }

    /// Stop the worker and drop the backend. Other clones of this handle
    /// get an error on their next call.
    pub async fn close(self) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        if self.cmd_tx.send(Command::Close(tx)).is_err() {
            // already gone
            return Ok(());
        }
        rx.await
            .map_err(|e| Error::ConversionError(format!("Worker close canceled: {}", e)))
    }
}

impl Converter for AsyncConverter {
    fn rasterize(&self, calendar: &RenderedCalendar, format: OutputFormat) -> Result<Vec<u8>> {
        self.convert_blocking(calendar.clone(), format)
    }
}
