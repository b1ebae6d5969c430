// SPDX-License-Identifier: MIT OR Apache-2.0
//! Active/inactive state of the object a driver is attached to.

use std::cell::Cell;
use std::rc::Rc;

/// An object that can be switched on and off
///
/// A driver forces its owner active before playing and may switch it off
/// when stopping. Implementations only flip state; the host is responsible
/// for calling the driver's enable/disable hooks when it changes activity
/// on its own.
pub trait Activation {
    /// Set the active state
    fn set_active(&self, active: bool);

    /// Get the active state
    fn is_active(&self) -> bool;
}

/// A shared boolean activity flag
#[derive(Debug, Clone)]
pub struct ActiveFlag(Rc<Cell<bool>>);

impl ActiveFlag {
    /// Create a flag with an initial state
    pub fn new(active: bool) -> Self {
        Self(Rc::new(Cell::new(active)))
    }
}

impl Default for ActiveFlag {
    fn default() -> Self {
        Self::new(true)
    }
}

impl Activation for ActiveFlag {
    fn set_active(&self, active: bool) {
        self.0.set(active);
    }

    fn is_active(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clones_share_state() {
        let flag = ActiveFlag::new(false);
        let view = flag.clone();
        flag.set_active(true);
        assert!(view.is_active());
    }
}
