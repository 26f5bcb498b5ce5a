//! Ctrl-C handling
//!
//! The handler only raises a flag. The file being moved or copied when the
//! signal arrives finishes normally and the run stops before the next one.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

/// Install a Ctrl-C handler and return the flag it raises
pub fn setup_shutdown_signal() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let shutdown_signal = Arc::new(AtomicBool::new(false));
    let signal_clone = Arc::clone(&shutdown_signal);

    ctrlc::set_handler(move || {
        signal_clone.store(true, Ordering::SeqCst);
        eprintln!("\nKeyboardInterrupt: stopping sort...");
    })?;

    Ok(shutdown_signal)
}
