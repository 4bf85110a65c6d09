//! Transport collaborators.
//!
//! A [`Transport`] receives every exchange that reaches the end of `send` and
//! decides how it completes: respond right away, abort, or hold on to the
//! handle and respond later. [`PendingExchanges`] is the "hold on" variant,
//! a queue test code drains at its own pace.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use log::debug;

use crate::error_handling::XhrError;
use crate::xhr::{FakeResponse, FakeXhr, ReadyState};

/// Receives an exchange after `send` has dispatched `loadstart`.
///
/// Implemented for closures taking `&FakeXhr`. Errors are returned from
/// `send` wrapped in [`XhrError::Transport`].
pub trait Transport {
    /// Handles one sent exchange.
    ///
    /// # Errors
    ///
    /// Any failure the transport wants `send` to report.
    fn handle(&self, xhr: &FakeXhr) -> anyhow::Result<()>;
}

impl<F> Transport for F
where
    F: Fn(&FakeXhr) -> anyhow::Result<()>,
{
    fn handle(&self, xhr: &FakeXhr) -> anyhow::Result<()> {
        self(xhr)
    }
}

/// Queues sent exchanges for manual completion.
///
/// Clones share the same queue, so one clone can be installed as the
/// transport while another is kept for responding.
///
/// A queued exchange holds the queue through its transport and the queue
/// holds the exchange, so both stay alive until the exchange is taken out
/// with [`PendingExchanges::next`], answered, or dropped by
/// [`PendingExchanges::clear`]. Aborted exchanges are discarded whenever the
/// queue is read.
///
/// # Examples
///
/// ```
/// use fake_xhr::{FakeResponse, FakeXhr, PendingExchanges};
///
/// let pending = PendingExchanges::new();
/// let xhr = FakeXhr::with_transport(pending.clone());
/// xhr.open("GET", "/later");
/// xhr.send(None)?;
/// assert_eq!(pending.len(), 1);
///
/// pending.respond_next(FakeResponse::new().body("done"))?;
/// assert_eq!(xhr.response_text().as_deref(), Some("done"));
/// # Ok::<(), fake_xhr::XhrError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct PendingExchanges {
    queue: Rc<RefCell<VecDeque<FakeXhr>>>,
}

impl PendingExchanges {
    /// Creates an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of queued exchanges that were not aborted.
    pub fn len(&self) -> usize {
        self.prune_aborted();
        self.queue.borrow().len()
    }

    /// Whether nothing answerable is queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes and returns the oldest exchange that was not aborted.
    pub fn next(&self) -> Option<FakeXhr> {
        self.prune_aborted();
        self.queue.borrow_mut().pop_front()
    }

    /// Drops every queued exchange without answering it.
    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }

    /// Responds to the oldest queued exchange.
    ///
    /// Returns `Ok(false)` if the queue was empty.
    ///
    /// # Errors
    ///
    /// Whatever [`FakeXhr::respond_with`] returns. An exchange the failed
    /// call left unfinished goes back to the front of the queue.
    pub fn respond_next(&self, response: FakeResponse) -> Result<bool, XhrError> {
        let Some(xhr) = self.next() else {
            return Ok(false);
        };
        if let Err(e) = xhr.respond_with(response) {
            self.requeue_front(std::iter::once(xhr));
            return Err(e);
        }
        Ok(true)
    }

    /// Responds to every queued exchange that was not aborted, returning how
    /// many were answered.
    ///
    /// The queue is drained before the first response, so exchanges sent by
    /// completion callbacks stay queued for the next call.
    ///
    /// # Errors
    ///
    /// Stops at the first failing [`FakeXhr::respond_with`]. That exchange
    /// (if still unfinished) and every one after it are put back at the front
    /// of the queue in their original order.
    pub fn respond_all(&self, response: &FakeResponse) -> Result<usize, XhrError> {
        let mut drained: VecDeque<FakeXhr> = self.queue.borrow_mut().drain(..).collect();
        let mut answered = 0;
        while let Some(xhr) = drained.pop_front() {
            if xhr.aborted() {
                debug!("Skipping aborted exchange {:?}", xhr.url());
                continue;
            }
            if let Err(e) = xhr.respond_with(response.clone()) {
                debug!(
                    "Response to {:?} failed, requeueing {} exchange(s)",
                    xhr.url(),
                    drained.len() + 1
                );
                drained.push_front(xhr);
                self.requeue_front(drained);
                return Err(e);
            }
            answered += 1;
        }
        Ok(answered)
    }

    /// Puts `exchanges` ahead of anything queued meanwhile, keeping their order.
    fn requeue_front(&self, exchanges: impl IntoIterator<Item = FakeXhr>) {
        let unfinished: Vec<FakeXhr> = exchanges
            .into_iter()
            .filter(|xhr| !xhr.aborted() && xhr.ready_state() != ReadyState::Done)
            .collect();
        let mut queue = self.queue.borrow_mut();
        for xhr in unfinished.into_iter().rev() {
            queue.push_front(xhr);
        }
    }

    fn prune_aborted(&self) {
        self.queue.borrow_mut().retain(|xhr| !xhr.aborted());
    }
}

impl Transport for PendingExchanges {
    fn handle(&self, xhr: &FakeXhr) -> anyhow::Result<()> {
        debug!(
            "Queueing {} {} for later response",
            xhr.method().unwrap_or_default(),
            xhr.url().unwrap_or_default()
        );
        self.queue.borrow_mut().push_back(xhr.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_closure_transport_responds_inside_send() {
        let xhr = FakeXhr::with_transport(|xhr: &FakeXhr| -> anyhow::Result<()> {
            xhr.respond(201, [("Location", "/items/9")], "")?;
            Ok(())
        });
        xhr.open("POST", "/items");
        xhr.send(Some("name=x")).unwrap();
        assert_eq!(xhr.ready_state(), ReadyState::Done);
        assert_eq!(xhr.status(), 201);
        assert_eq!(xhr.get_response_header("location").as_deref(), Some("/items/9"));
    }

    #[test]
    fn test_transport_error_surfaces_from_send() {
        let xhr = FakeXhr::with_transport(|_: &FakeXhr| -> anyhow::Result<()> {
            Err(anyhow!("connection refused"))
        });
        xhr.open("GET", "/");
        let err = xhr.send(None).unwrap_err();
        assert!(matches!(err, XhrError::Transport(_)));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_respond_next_on_empty_queue() {
        let pending = PendingExchanges::new();
        assert!(pending.is_empty());
        assert!(!pending.respond_next(FakeResponse::new()).unwrap());
    }

    #[test]
    fn test_queue_is_fifo() {
        let pending = PendingExchanges::new();
        let first = FakeXhr::with_transport(pending.clone());
        let second = FakeXhr::with_transport(pending.clone());
        first.open("GET", "/1");
        second.open("GET", "/2");
        second.send(None).unwrap();
        first.send(None).unwrap();

        let head = pending.next().unwrap();
        assert!(head.same_instance(&second));
        assert_eq!(pending.len(), 1);
    }

    #[test]
    fn test_respond_all_skips_aborted() {
        let pending = PendingExchanges::new();
        let kept = FakeXhr::with_transport(pending.clone());
        let dropped = FakeXhr::with_transport(pending.clone());
        for xhr in [&kept, &dropped] {
            xhr.open("GET", "/poll");
            xhr.send(None).unwrap();
        }
        dropped.abort();

        let answered = pending
            .respond_all(&FakeResponse::new().status(304))
            .unwrap();
        assert_eq!(answered, 1);
        assert!(pending.is_empty());
        assert_eq!(kept.status(), 304);
        assert_eq!(dropped.status(), 0);
    }

    #[test]
    fn test_respond_all_failure_keeps_unanswered_exchanges() {
        let pending = PendingExchanges::new();
        let first = FakeXhr::with_transport(pending.clone());
        let second = FakeXhr::with_transport(pending.clone());
        for xhr in [&first, &second] {
            xhr.open("GET", "/retry");
            xhr.send(None).unwrap();
        }

        let err = pending
            .respond_all(&FakeResponse::new().body(vec![0xff_u8, 0xfe]))
            .unwrap_err();
        assert_eq!(err.name(), "InvalidBodyException");
        assert_eq!(pending.len(), 2);
        assert_eq!(second.ready_state(), ReadyState::Opened);

        assert_eq!(pending.respond_all(&FakeResponse::new().body("ok")).unwrap(), 2);
        assert!(pending.next().is_none());
        assert_eq!(first.response_text().as_deref(), Some("ok"));
        assert_eq!(second.response_text().as_deref(), Some("ok"));
    }

    #[test]
    fn test_respond_next_failure_requeues_exchange() {
        let pending = PendingExchanges::new();
        let xhr = FakeXhr::with_transport(pending.clone());
        xhr.open("GET", "/binary");
        xhr.send(None).unwrap();

        assert!(pending
            .respond_next(FakeResponse::new().body(vec![0xc3_u8, 0x28]))
            .is_err());
        assert_eq!(pending.len(), 1);
        assert!(pending.respond_next(FakeResponse::new()).unwrap());
        assert!(pending.is_empty());
    }

    #[test]
    fn test_aborted_exchanges_are_released() {
        let pending = PendingExchanges::new();
        let xhr = FakeXhr::with_transport(pending.clone());
        xhr.open("GET", "/gone");
        xhr.send(None).unwrap();
        xhr.abort();

        assert_eq!(pending.len(), 0);
        assert!(pending.next().is_none());
        assert!(pending.queue.borrow().is_empty());
    }

    #[test]
    fn test_clear_drops_queued_exchanges() {
        let pending = PendingExchanges::new();
        let xhr = FakeXhr::with_transport(pending.clone());
        xhr.open("GET", "/never");
        xhr.send(None).unwrap();
        pending.clear();
        assert!(pending.is_empty());
        assert!(!pending.respond_next(FakeResponse::new()).unwrap());
        assert_eq!(xhr.ready_state(), ReadyState::Opened);
    }
}
