//! Ordered broadcast of navigation events
//!
//! Subscribers are held weakly: keep the [`Subscription`] (or your own `Arc`)
//! alive for as long as you want to hear about events. Nothing is replayed,
//! so a new subscriber only sees what is published after it joined.

use std::collections::VecDeque;
use std::sync::{Arc, Weak};

use parking_lot::{Mutex, RwLock};

/// Something that reacts to published events
pub trait Subscriber<T>: Send + Sync {
    fn on_event(&self, event: &T);
}

impl<T, F> Subscriber<T> for F
where
    F: Fn(&T) + Send + Sync,
{
    fn on_event(&self, event: &T) {
        self(event)
    }
}

/// Keeps a closure subscriber alive; dropping it unsubscribes
#[must_use = "dropping the subscription unsubscribes immediately"]
pub struct Subscription<T> {
    _subscriber: Arc<dyn Subscriber<T>>,
}

struct Shared<T> {
    subscribers: RwLock<Vec<Weak<dyn Subscriber<T>>>>,
    pending: Mutex<VecDeque<T>>,
    delivering: Mutex<bool>,
}

/// Single producer, many subscribers, synchronous delivery
pub struct EventStream<T> {
    shared: Arc<Shared<T>>,
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self { shared: self.shared.clone() }
    }
}

impl<T: Send + Sync + 'static> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> EventStream<T> {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                subscribers: RwLock::new(Vec::new()),
                pending: Mutex::new(VecDeque::new()),
                delivering: Mutex::new(false),
            }),
        }
    }

    /// Add a subscriber. Only a weak reference is kept.
    pub fn add_subscriber(&self, subscriber: &Arc<dyn Subscriber<T>>) {
        self.shared.subscribers.write().push(Arc::downgrade(subscriber));
    }

    /// Subscribe a closure for as long as the returned handle lives
    pub fn subscribe<F>(&self, f: F) -> Subscription<T>
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let subscriber: Arc<dyn Subscriber<T>> = Arc::new(f);
        self.add_subscriber(&subscriber);
        Subscription { _subscriber: subscriber }
    }

    /// Number of live subscribers
    pub fn subscriber_count(&self) -> usize {
        let mut subscribers = self.shared.subscribers.write();
        subscribers.retain(|weak| weak.strong_count() > 0);
        subscribers.len()
    }

    /// Forget every subscriber
    pub fn clear(&self) {
        self.shared.subscribers.write().clear();
    }

    /// Deliver an event to every live subscriber.
    ///
    /// Publishing from inside a subscriber queues the event; it is delivered
    /// once the current event has reached everyone.
    pub fn publish(&self, event: T) {
        self.shared.pending.lock().push_back(event);
        drop(self.hold());
    }

    /// Queue everything published until the returned guard drops, then
    /// deliver it in order. Nested holds defer to the outermost one.
    pub fn hold(&self) -> Hold<'_, T> {
        let mut delivering = self.shared.delivering.lock();
        let owner = !*delivering;
        *delivering = true;
        Hold { stream: self, owner }
    }

    fn drain(&self) {
        loop {
            let Some(event) = self.shared.pending.lock().pop_front() else {
                break;
            };

            // Snapshot so subscribers may subscribe or publish re-entrantly
            let live: Vec<Arc<dyn Subscriber<T>>> = {
                let mut subscribers = self.shared.subscribers.write();
                subscribers.retain(|weak| weak.strong_count() > 0);
                subscribers.iter().filter_map(Weak::upgrade).collect()
            };

            for subscriber in live {
                subscriber.on_event(&event);
            }
        }
    }
}

/// Delivery guard returned by [`EventStream::hold`]
pub struct Hold<'a, T: Send + Sync + 'static> {
    stream: &'a EventStream<T>,
    owner: bool,
}

impl<T: Send + Sync + 'static> Drop for Hold<'_, T> {
    fn drop(&mut self) {
        if !self.owner {
            return;
        }
        loop {
            self.stream.drain();

            // Another thread may have queued after the drain but before we
            // give up ownership
            let mut delivering = self.stream.shared.delivering.lock();
            if self.stream.shared.pending.lock().is_empty() {
                *delivering = false;
                return;
            }
        }
    }
}

/// Collects every event it sees; handy for assertions
pub struct EventRecorder<T> {
    events: Mutex<Vec<T>>,
}

impl<T: Clone + Send + Sync + 'static> EventRecorder<T> {
    /// Create a recorder already subscribed to `stream`
    pub fn attach(stream: &EventStream<T>) -> Arc<Self> {
        let recorder = Arc::new(Self { events: Mutex::new(Vec::new()) });
        let subscriber: Arc<dyn Subscriber<T>> = recorder.clone();
        stream.add_subscriber(&subscriber);
        recorder
    }

    pub fn events(&self) -> Vec<T> {
        self.events.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }

    pub fn last(&self) -> Option<T> {
        self.events.lock().last().cloned()
    }

    /// The `n`th event counting back from the latest (0 is the latest)
    pub fn nth_from_last(&self, n: usize) -> Option<T> {
        let events = self.events.lock();
        events.len().checked_sub(n + 1).map(|index| events[index].clone())
    }

    pub fn take(&self) -> Vec<T> {
        std::mem::take(&mut *self.events.lock())
    }
}

impl<T: Clone + Send + Sync> Subscriber<T> for EventRecorder<T> {
    fn on_event(&self, event: &T) {
        self.events.lock().push(event.clone());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[test]
    fn test_publish_reaches_every_subscriber() {
        let stream = EventStream::new();
        let first = EventRecorder::attach(&stream);
        let second = EventRecorder::attach(&stream);

        stream.publish(1);
        stream.publish(2);

        assert_eq!(first.events(), vec![1, 2]);
        assert_eq!(second.events(), vec![1, 2]);
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let stream = EventStream::new();
        stream.publish("early");

        let recorder = EventRecorder::attach(&stream);
        stream.publish("late");

        assert_eq!(recorder.events(), vec!["late"]);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let stream = EventStream::new();
        let count = Arc::new(AtomicUsize::new(0));

        let subscription = {
            let count = count.clone();
            stream.subscribe(move |_: &u8| {
                count.fetch_add(1, Ordering::SeqCst);
            })
        };
        stream.publish(1);
        assert_eq!(stream.subscriber_count(), 1);

        drop(subscription);
        stream.publish(2);
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(stream.subscriber_count(), 0);
    }

    #[test]
    fn test_reentrant_publish_keeps_global_order() {
        let stream: EventStream<u32> = EventStream::new();

        // The first subscriber answers every 1 with a 2
        let echo = {
            let stream = stream.clone();
            stream.clone().subscribe(move |event: &u32| {
                if *event == 1 {
                    stream.publish(2);
                }
            })
        };
        let recorder = EventRecorder::attach(&stream);

        stream.publish(1);
        stream.publish(3);

        // The recorder sees 1 before 2 even though 2 was published mid-delivery
        assert_eq!(recorder.events(), vec![1, 2, 3]);
        drop(echo);
    }

    #[test]
    fn test_hold_defers_delivery() {
        let stream = EventStream::new();
        let recorder = EventRecorder::attach(&stream);

        {
            let _hold = stream.hold();
            stream.publish('a');
            stream.publish('b');
            assert!(recorder.is_empty());
        }

        assert_eq!(recorder.events(), vec!['a', 'b']);
    }

    #[test]
    fn test_clear_drops_subscribers() {
        let stream = EventStream::new();
        let recorder = EventRecorder::attach(&stream);
        stream.clear();
        stream.publish(1);

        assert!(recorder.is_empty());
    }
}
