use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::RecvTimeoutError;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use super::Screen;
use crate::status::{StatusMessage, StatusReceiver};

/// The single writer: owns the `Screen` on a dedicated thread and applies
/// status messages to it in arrival order.
pub struct Renderer<W: Write + Send + 'static> {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<io::Result<Screen<W>>>,
}

impl<W: Write + Send + 'static> Renderer<W> {
    /// Start draining `rx` onto `screen`. The loop blocks at most `poll`
    /// between checks of the stop flag.
    pub fn spawn(screen: Screen<W>, rx: StatusReceiver, poll: Duration) -> Self {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::spawn(move || render_loop(screen, rx, poll, &flag));
        Self { stop, handle }
    }

    /// Ask the renderer to exit once the channel is empty, then wait for it.
    /// Every message sent before this call is applied.
    pub fn stop(self) -> io::Result<Screen<W>> {
        self.stop.store(true, Ordering::SeqCst);
        self.handle
            .join()
            .map_err(|_| io::Error::other("renderer thread panicked"))?
    }
}

fn render_loop<W: Write>(
    mut screen: Screen<W>,
    rx: StatusReceiver,
    poll: Duration,
    stop: &AtomicBool,
) -> io::Result<Screen<W>> {
    loop {
        match rx.recv_timeout(poll) {
            Ok(message) => {
                apply(&mut screen, message);
                screen.redraw()?;
            }
            Err(RecvTimeoutError::Timeout) => {
                if stop.load(Ordering::SeqCst) {
                    break;
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    screen.finish()?;
    Ok(screen)
}

/// Route one message to the screen. A replace aimed past the last line is
/// appended instead of being lost.
pub fn apply<W: Write>(screen: &mut Screen<W>, message: StatusMessage) {
    match message.line {
        None => {
            screen.append(message.text);
        }
        Some(index) => {
            if index >= screen.lines().len() {
                tracing::debug!(index, "replace past end of screen; appending");
                screen.append(message.text);
            } else {
                screen.replace(index, message.text);
            }
        }
    }
}
