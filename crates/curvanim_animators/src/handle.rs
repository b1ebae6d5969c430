// SPDX-License-Identifier: MIT OR Apache-2.0
//! Ownership of an animator attached to a driver.

use curvanim_core::{CurvedProgressAnimator, ListenerId, ProgressListener};
use std::cell::{Ref, RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

/// An animator attached to a driver
///
/// The handle owns the animator and keeps the driver alive. Dropping it
/// detaches the animator. Borrowing the animator from inside one of its
/// own callbacks panics; use the values passed to the callback instead.
pub struct AnimatorHandle<L: ProgressListener + 'static> {
    driver: CurvedProgressAnimator,
    animator: Rc<RefCell<L>>,
    id: ListenerId,
}

impl<L: ProgressListener + 'static> AnimatorHandle<L> {
    /// Attach an animator to a driver
    pub fn attach(driver: &CurvedProgressAnimator, animator: L) -> Self {
        let animator = Rc::new(RefCell::new(animator));
        let id = driver.attach(&animator);
        Self {
            driver: driver.clone(),
            animator,
            id,
        }
    }

    /// The driver this animator follows
    pub fn driver(&self) -> &CurvedProgressAnimator {
        &self.driver
    }

    /// Borrow the animator
    pub fn animator(&self) -> Ref<'_, L> {
        self.animator.borrow()
    }

    /// Mutably borrow the animator
    pub fn animator_mut(&self) -> RefMut<'_, L> {
        self.animator.borrow_mut()
    }

    /// Listener ID on the driver
    pub fn id(&self) -> ListenerId {
        self.id
    }
}

impl<L: ProgressListener + 'static> Drop for AnimatorHandle<L> {
    fn drop(&mut self) {
        self.driver.detach(self.id);
    }
}

impl<L: ProgressListener + fmt::Debug + 'static> fmt::Debug for AnimatorHandle<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnimatorHandle")
            .field("driver", &self.driver)
            .field("animator", &self.animator)
            .finish()
    }
}
