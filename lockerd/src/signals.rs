//! Termination signal handling.

use std::sync::atomic::{AtomicBool, Ordering};

use nix::libc;
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};

static TERMINATED: AtomicBool = AtomicBool::new(false);

extern "C" fn terminate_handler(_: libc::c_int) {
    TERMINATED.store(true, Ordering::SeqCst);
}

/// Installs handlers for `SIGINT` and `SIGTERM` that only set a flag, polled by the event loop.
pub fn install() -> nix::Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(terminate_handler),
        SaFlags::empty(),
        SigSet::empty(),
    );
    for &signal in &[Signal::SIGINT, Signal::SIGTERM] {
        // Safety: the handler only touches an atomic
        unsafe {
            signal::sigaction(signal, &action)?;
        }
    }
    Ok(())
}

pub fn terminated() -> bool {
    TERMINATED.load(Ordering::SeqCst)
}
