// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Disview-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of disview and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Scoped suppression of the scroll and cursor notification channels.
//!
//! While a [`SuppressionGuard`] is alive the channels it names are detached: notifications
//! raised on them are dropped instead of reaching pagination or focus tracking. Dropping the
//! guard reattaches them, on every exit path. Guards nest; a channel is attached again only
//! when its last guard is gone.

use std::cell::Cell;
use std::rc::Rc;

use smallvec::SmallVec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    Scroll,
    Cursor,
}

impl Channel {
    pub const ALL: [Channel; 2] = [Channel::Scroll, Channel::Cursor];
}

#[derive(Debug, Default)]
struct ChannelState {
    scroll_depth: Cell<u32>,
    cursor_depth: Cell<u32>,
    detaches: Cell<u64>,
    reattaches: Cell<u64>,
}

impl ChannelState {
    fn depth(&self, channel: Channel) -> &Cell<u32> {
        match channel {
            Channel::Scroll => &self.scroll_depth,
            Channel::Cursor => &self.cursor_depth,
        }
    }

    fn detach(&self, channel: Channel) {
        let depth = self.depth(channel);
        if depth.get() == 0 {
            self.detaches.set(self.detaches.get() + 1);
        }
        depth.set(depth.get().saturating_add(1));
    }

    fn reattach(&self, channel: Channel) {
        let depth = self.depth(channel);
        debug_assert!(depth.get() > 0, "{channel:?} channel reattached while attached");
        match depth.get() {
            0 => {}
            1 => {
                depth.set(0);
                self.reattaches.set(self.reattaches.get() + 1);
            }
            n => depth.set(n - 1),
        }
    }
}

/// Handle to the notification channels of one viewport. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct NotificationChannels {
    state: Rc<ChannelState>,
}

impl NotificationChannels {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detaches `channels` until the returned guard is dropped.
    #[must_use = "channels reattach as soon as the guard is dropped"]
    pub fn suppress(&self, channels: &[Channel]) -> SuppressionGuard {
        let mut held: SmallVec<[Channel; 2]> = SmallVec::new();
        for &channel in channels {
            if !held.contains(&channel) {
                self.state.detach(channel);
                held.push(channel);
            }
        }
        SuppressionGuard {
            state: Rc::clone(&self.state),
            channels: held,
        }
    }

    pub fn is_attached(&self, channel: Channel) -> bool {
        self.state.depth(channel).get() == 0
    }

    pub fn is_idle(&self) -> bool {
        Channel::ALL
            .iter()
            .all(|&channel| self.is_attached(channel))
    }

    /// Number of attached-to-detached transitions so far.
    pub fn detach_count(&self) -> u64 {
        self.state.detaches.get()
    }

    /// Number of detached-to-attached transitions so far.
    pub fn reattach_count(&self) -> u64 {
        self.state.reattaches.get()
    }

    /// Reattaches any channel still detached. Returns whether anything had to be fixed, which
    /// means a guard outlived the operation that created it.
    pub(crate) fn force_reattach(&self) -> bool {
        let mut repaired = false;
        for channel in Channel::ALL {
            let depth = self.state.depth(channel);
            if depth.get() > 0 {
                log::error!("{channel:?} channel still detached after rewrite; reattaching");
                depth.set(0);
                self.state.reattaches.set(self.state.reattaches.get() + 1);
                repaired = true;
            }
        }
        repaired
    }
}

/// Keeps its channels detached for as long as it lives.
#[derive(Debug)]
pub struct SuppressionGuard {
    state: Rc<ChannelState>,
    channels: SmallVec<[Channel; 2]>,
}

impl SuppressionGuard {
    pub fn channels(&self) -> &[Channel] {
        &self.channels
    }
}

impl Drop for SuppressionGuard {
    fn drop(&mut self) {
        for &channel in self.channels.iter().rev() {
            self.state.reattach(channel);
        }
    }
}
