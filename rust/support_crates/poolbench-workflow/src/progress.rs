//! Progress observation for result streams.
//!
//! A [`ProgressObserver`] receives arrival events while the consumer iterates over
//! results. The [`Observe`] adapter forwards every item unchanged, so what is done
//! with the results and how progress is displayed stay independent.

/// Receives progress events from an observed iterator.
pub trait ProgressObserver {
    /// Called once, before the first item is pulled. `total` is the exact number
    /// of items when the iterator knows it.
    fn on_start(&mut self, _total: Option<u64>) {}

    /// Called after each item arrives.
    fn on_item(&mut self);

    /// Called once, when the iterator is exhausted.
    fn on_finish(&mut self) {}
}

impl<O: ProgressObserver + ?Sized> ProgressObserver for &mut O {
    fn on_start(&mut self, total: Option<u64>) {
        (**self).on_start(total)
    }

    fn on_item(&mut self) {
        (**self).on_item()
    }

    fn on_finish(&mut self) {
        (**self).on_finish()
    }
}

/// Iterator adapter that reports arrivals to a [`ProgressObserver`].
pub struct Observe<I, O> {
    inner: I,
    observer: O,
    started: bool,
    finished: bool,
}

impl<I: Iterator, O: ProgressObserver> Iterator for Observe<I, O> {
    type Item = I::Item;

    fn next(&mut self) -> Option<I::Item> {
        if !self.started {
            self.started = true;
            let total = match self.inner.size_hint() {
                (lower, Some(upper)) if lower == upper => Some(lower as u64),
                _ => None,
            };
            self.observer.on_start(total);
        }
        match self.inner.next() {
            Some(item) => {
                self.observer.on_item();
                Some(item)
            }
            None => {
                if !self.finished {
                    self.finished = true;
                    self.observer.on_finish();
                }
                None
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

/// Extension trait adding [`observe`](ObserveExt::observe) to every iterator.
pub trait ObserveExt: Iterator + Sized {
    /// Wraps the iterator so that `observer` is notified of each arrival.
    fn observe<O: ProgressObserver>(self, observer: O) -> Observe<Self, O> {
        Observe {
            inner: self,
            observer,
            started: false,
            finished: false,
        }
    }
}

impl<I: Iterator> ObserveExt for I {}

/// Observer that only counts events. Useful for logging totals and in tests.
#[derive(Debug, Default, Clone)]
pub struct CountingObserver {
    pub total: Option<u64>,
    pub arrived: u64,
    pub finished: bool,
}

impl ProgressObserver for CountingObserver {
    fn on_start(&mut self, total: Option<u64>) {
        self.total = total;
    }

    fn on_item(&mut self) {
        self.arrived += 1;
    }

    fn on_finish(&mut self) {
        self.finished = true;
    }
}
