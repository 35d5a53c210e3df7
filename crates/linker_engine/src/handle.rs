use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use linker_core::LinkRequest;
use linker_logging::{linker_info, linker_warn};
use tokio_util::sync::CancellationToken;

use crate::linker::ChannelProgressSink;
use crate::{LinkEvent, Linker};

enum LinkerCommand {
    Link {
        request: LinkRequest,
        cancel: CancellationToken,
    },
}

/// Cancels whichever run the owning handle started last.
#[derive(Clone, Default)]
pub struct Canceller {
    current: Arc<Mutex<CancellationToken>>,
}

impl Canceller {
    pub fn cancel(&self) {
        if let Ok(token) = self.current.lock() {
            token.cancel();
        }
    }

    fn replace(&self) -> CancellationToken {
        let token = CancellationToken::new();
        if let Ok(mut current) = self.current.lock() {
            *current = token.clone();
        }
        token
    }
}

/// Runs links on a background thread and reports progress over a channel.
///
/// Runs are executed one after another on a current-thread runtime.
pub struct LinkerHandle {
    cmd_tx: mpsc::Sender<LinkerCommand>,
    event_rx: mpsc::Receiver<LinkEvent>,
    canceller: Canceller,
}

impl LinkerHandle {
    pub fn new(linker: Linker) -> io::Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (event_tx, event_rx) = mpsc::channel();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;

        thread::Builder::new()
            .name("repo-linker".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    match command {
                        LinkerCommand::Link { request, cancel } => {
                            let sink = ChannelProgressSink::new(event_tx.clone());
                            runtime.block_on(linker.run(request, &sink, &cancel));
                        }
                    }
                }
            })?;

        Ok(Self {
            cmd_tx,
            event_rx,
            canceller: Canceller::default(),
        })
    }

    pub fn start(&self, request: LinkRequest) {
        let cancel = self.canceller.replace();
        let _ = self.cmd_tx.send(LinkerCommand::Link { request, cancel });
    }

    pub fn cancel(&self) {
        self.canceller.cancel();
    }

    pub fn canceller(&self) -> Canceller {
        self.canceller.clone()
    }

    /// Cancels the current run on Ctrl-C. Cancellation takes effect before the next step.
    pub fn cancel_on_interrupt(&self) -> io::Result<()> {
        let canceller = self.canceller();
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        thread::Builder::new()
            .name("repo-linker-interrupt".to_string())
            .spawn(move || {
                runtime.block_on(async move {
                    loop {
                        if let Err(err) = tokio::signal::ctrl_c().await {
                            linker_warn!("cannot listen for Ctrl-C: {}", err);
                            return;
                        }
                        linker_info!("interrupt received; cancelling after the current step");
                        canceller.cancel();
                    }
                });
            })?;
        Ok(())
    }

    pub fn try_recv(&self) -> Option<LinkEvent> {
        self.event_rx.try_recv().ok()
    }

    /// Blocks for the next event; `None` once the background thread is gone.
    pub fn recv(&self) -> Option<LinkEvent> {
        self.event_rx.recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<LinkEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }
}
