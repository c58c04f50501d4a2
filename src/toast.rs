//! Transient, auto-expiring user notifications.
//!
//! [`NotificationQueue`] holds toasts in insertion order. Each toast with
//! a non-zero duration gets an expiry timer; timers are deadlines kept in
//! the queue and fired by [`NotificationQueue::run_due_timers`], so a
//! host event loop decides when to poll (see
//! [`NotificationQueue::next_deadline`]). A timer whose toast is already
//! gone is a no-op.

use core::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::{Clock, SystemClock, to_time_delta};
use crate::models::{TimerHandle, ToastId, ToastKind};

/// How long a toast stays up unless told otherwise.
pub const DEFAULT_DURATION: Duration = Duration::from_millis(5000);

/// How long a loading toast stays up after it turns into a result.
pub const RESULT_DURATION: Duration = Duration::from_millis(3000);

/// A user-facing notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toast {
    /// Identifier, unique within its queue.
    pub id: ToastId,
    /// Text shown to the user.
    pub message: String,
    /// Visual kind.
    pub kind: ToastKind,
    /// Lifetime requested at creation; zero means sticky.
    pub duration: Duration,
}

/// Produces toast identifiers.
pub trait IdSource: core::fmt::Debug {
    /// Returns an id never returned before by this source.
    fn next_id(&mut self) -> ToastId;
}

/// Monotonic counter starting at 1.
#[derive(Debug, Clone, Default)]
pub struct SequentialIds {
    /// Last id handed out.
    last: u64,
}

impl IdSource for SequentialIds {
    #[inline]
    fn next_id(&mut self) -> ToastId {
        self.last = self.last.saturating_add(1);
        ToastId::new(self.last)
    }
}

/// Anything that can surface a message to the user.
///
/// Stores emit their results through this trait so they never depend on
/// a concrete queue.
pub trait Notify {
    /// Shows `message` with the default lifetime for `kind` and returns
    /// its id.
    fn notify(&mut self, message: &str, kind: ToastKind) -> ToastId;
}

/// A pending expiry.
#[derive(Debug, Clone, Copy)]
struct Timer {
    /// Handle returned to the scheduler's caller.
    handle: TimerHandle,
    /// Toast removed when the timer fires.
    toast: ToastId,
    /// When the timer fires.
    due: DateTime<Utc>,
}

/// Ordered queue of active toasts plus their expiry timers.
#[derive(Debug)]
pub struct NotificationQueue<C: Clock = SystemClock, I: IdSource = SequentialIds> {
    /// Time source for scheduling.
    clock: C,
    /// Toast id generator.
    ids: I,
    /// Active toasts in display order.
    toasts: Vec<Toast>,
    /// Pending timers, unordered.
    timers: Vec<Timer>,
    /// Last timer handle handed out.
    last_timer: u64,
}

impl NotificationQueue {
    /// Creates an empty queue on the system clock.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for NotificationQueue {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> NotificationQueue<C> {
    /// Creates an empty queue on the given clock with sequential ids.
    #[inline]
    #[must_use]
    pub fn with_clock(clock: C) -> Self {
        Self::with_parts(clock, SequentialIds::default())
    }
}

impl<C: Clock, I: IdSource> NotificationQueue<C, I> {
    /// Creates an empty queue from an explicit clock and id source.
    #[inline]
    #[must_use]
    pub const fn with_parts(clock: C, ids: I) -> Self {
        Self {
            clock,
            ids,
            toasts: Vec::new(),
            timers: Vec::new(),
            last_timer: 0,
        }
    }

    /// Appends a toast and, for a non-zero `duration`, schedules its
    /// removal. Returns the new toast's id.
    #[inline]
    pub fn add_toast<T: Into<String>>(
        &mut self,
        message: T,
        kind: ToastKind,
        duration: Duration,
    ) -> ToastId {
        let id = self.ids.next_id();
        self.toasts.push(Toast {
            id,
            message: message.into(),
            kind,
            duration,
        });
        if !duration.is_zero() {
            let _handle = self.schedule_removal(id, duration);
        }
        tracing::debug!(toast = %id, ?kind, "toast added");
        id
    }

    /// Shows a success toast for [`DEFAULT_DURATION`].
    #[inline]
    pub fn show_success<T: Into<String>>(&mut self, message: T) -> ToastId {
        self.add_toast(message, ToastKind::Success, DEFAULT_DURATION)
    }

    /// Shows an error toast for [`DEFAULT_DURATION`].
    #[inline]
    pub fn show_error<T: Into<String>>(&mut self, message: T) -> ToastId {
        self.add_toast(message, ToastKind::Error, DEFAULT_DURATION)
    }

    /// Shows a warning toast for [`DEFAULT_DURATION`].
    #[inline]
    pub fn show_warning<T: Into<String>>(&mut self, message: T) -> ToastId {
        self.add_toast(message, ToastKind::Warning, DEFAULT_DURATION)
    }

    /// Shows an info toast for [`DEFAULT_DURATION`].
    #[inline]
    pub fn show_info<T: Into<String>>(&mut self, message: T) -> ToastId {
        self.add_toast(message, ToastKind::Info, DEFAULT_DURATION)
    }

    /// Shows a sticky loading toast, to be resolved with
    /// [`Self::update_loading_toast`].
    #[inline]
    pub fn show_loading<T: Into<String>>(&mut self, message: T) -> ToastId {
        self.add_toast(message, ToastKind::Loading, Duration::ZERO)
    }

    /// Removes a toast. Returns `false` if it was already gone.
    #[inline]
    pub fn remove_toast(&mut self, id: ToastId) -> bool {
        let before = self.toasts.len();
        self.toasts.retain(|toast| toast.id != id);
        let removed = self.toasts.len() != before;
        if removed {
            tracing::debug!(toast = %id, "toast removed");
        }
        removed
    }

    /// Replaces the message and kind of an existing toast in place and
    /// schedules its removal after [`RESULT_DURATION`], superseding any
    /// earlier timer for it. Returns `false` for unknown ids.
    #[inline]
    pub fn update_loading_toast<T: Into<String>>(
        &mut self,
        id: ToastId,
        message: T,
        kind: ToastKind,
    ) -> bool {
        let Some(toast) = self.toasts.iter_mut().find(|toast| toast.id == id) else {
            tracing::debug!(toast = %id, "update for unknown toast ignored");
            return false;
        };
        toast.message = message.into();
        toast.kind = kind;
        self.timers.retain(|timer| timer.toast != id);
        let _handle = self.schedule_removal(id, RESULT_DURATION);
        true
    }

    /// Removes every toast and pending timer.
    #[inline]
    pub fn clear_toasts(&mut self) {
        self.toasts.clear();
        self.timers.clear();
    }

    /// Removes and returns every toast, dropping pending timers.
    #[inline]
    pub fn take_toasts(&mut self) -> Vec<Toast> {
        self.timers.clear();
        core::mem::take(&mut self.toasts)
    }

    /// Schedules removal of `id` after `delay`.
    #[inline]
    pub fn schedule_removal(&mut self, id: ToastId, delay: Duration) -> TimerHandle {
        self.last_timer = self.last_timer.saturating_add(1);
        let handle = TimerHandle::new(self.last_timer);
        let due = self
            .clock
            .now()
            .checked_add_signed(to_time_delta(delay))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        self.timers.push(Timer {
            handle,
            toast: id,
            due,
        });
        handle
    }

    /// Cancels a pending timer. Returns `false` if it already fired or
    /// was cancelled.
    #[inline]
    pub fn cancel_timer(&mut self, handle: TimerHandle) -> bool {
        let before = self.timers.len();
        self.timers.retain(|timer| timer.handle != handle);
        self.timers.len() != before
    }

    /// Fires every timer due at the current time, earliest first.
    ///
    /// Returns the ids of toasts actually removed; timers for toasts that
    /// are already gone fire silently.
    #[inline]
    pub fn run_due_timers(&mut self) -> Vec<ToastId> {
        let now = self.clock.now();
        let (mut due, pending): (Vec<Timer>, Vec<Timer>) =
            self.timers.drain(..).partition(|timer| timer.due <= now);
        self.timers = pending;
        due.sort_by_key(|timer| (timer.due, timer.handle));

        let mut removed = Vec::new();
        for timer in due {
            if self.remove_toast(timer.toast) {
                removed.push(timer.toast);
            }
        }
        removed
    }

    /// Returns when the next timer fires, if any is pending.
    #[inline]
    #[must_use]
    pub fn next_deadline(&self) -> Option<DateTime<Utc>> {
        self.timers.iter().map(|timer| timer.due).min()
    }

    /// Returns the active toasts in display order.
    #[inline]
    #[must_use]
    pub fn toasts(&self) -> &[Toast] {
        &self.toasts
    }

    /// Looks up an active toast.
    #[inline]
    #[must_use]
    pub fn get(&self, id: ToastId) -> Option<&Toast> {
        self.toasts.iter().find(|toast| toast.id == id)
    }

    /// Number of active toasts.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.toasts.len()
    }

    /// Returns `true` if no toast is active.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }

    /// Number of pending timers.
    #[inline]
    #[must_use]
    pub fn pending_timers(&self) -> usize {
        self.timers.len()
    }
}

impl<C: Clock, I: IdSource> Notify for NotificationQueue<C, I> {
    #[inline]
    fn notify(&mut self, message: &str, kind: ToastKind) -> ToastId {
        match kind {
            ToastKind::Loading => self.show_loading(message),
            ToastKind::Success | ToastKind::Error | ToastKind::Warning | ToastKind::Info => {
                self.add_toast(message, kind, DEFAULT_DURATION)
            }
        }
    }
}
