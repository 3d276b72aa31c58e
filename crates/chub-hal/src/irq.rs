// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 Qbitel Inc.

//! Scoped interrupt masking

use crate::traits::{InterruptControl, IrqState};

/// Interrupts stay masked for the lifetime of the guard
///
/// The state saved on entry is restored on drop, so guards nest correctly
/// and an early return cannot leave interrupts disabled.
pub struct InterruptGuard<'a, I: InterruptControl + ?Sized> {
    irq: &'a I,
    saved: IrqState,
}

impl<'a, I: InterruptControl + ?Sized> InterruptGuard<'a, I> {
    /// Mask interrupts
    pub fn new(irq: &'a I) -> Self {
        let saved = irq.mask();
        Self { irq, saved }
    }

    /// State that will be restored on drop
    #[must_use]
    pub const fn saved(&self) -> IrqState {
        self.saved
    }
}

impl<I: InterruptControl + ?Sized> Drop for InterruptGuard<'_, I> {
    fn drop(&mut self) {
        self.irq.restore(self.saved);
    }
}
