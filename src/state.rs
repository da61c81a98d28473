//! Miroir local des collections distantes.
//!
//! Chaque snapshot remplace entièrement la valeur courante (jamais de fusion
//! incrémentale). Les abonnés reçoivent la valeur courante dès l'abonnement,
//! puis chaque nouveau snapshot ; se désabonner = lâcher le `Receiver`.

use crate::error::CustodyError;
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug)]
struct Inner<T> {
    current: Arc<T>,
    subscribers: Vec<Sender<Arc<T>>>,
}

#[derive(Debug)]
pub struct LiveState<T> {
    inner: Mutex<Inner<T>>,
}

impl<T: Default> Default for LiveState<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T> LiveState<T> {
    pub fn new(initial: T) -> Self {
        Self {
            inner: Mutex::new(Inner {
                current: Arc::new(initial),
                subscribers: Vec::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner<T>> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Snapshot courant (partagé, immuable).
    pub fn snapshot(&self) -> Arc<T> {
        Arc::clone(&self.lock().current)
    }

    pub fn subscribe(&self) -> Receiver<Arc<T>> {
        let (tx, rx) = channel();
        let mut inner = self.lock();
        // le récepteur vient d'être créé : l'envoi ne peut pas échouer
        let _ = tx.send(Arc::clone(&inner.current));
        inner.subscribers.push(tx);
        rx
    }

    /// Remplace la valeur et notifie ; les abonnés disparus sont retirés.
    pub fn publish(&self, value: T) {
        self.restore(Arc::new(value));
    }

    /// Republie un snapshot existant (retour arrière).
    pub fn restore(&self, snapshot: Arc<T>) {
        let mut inner = self.lock();
        inner.current = snapshot;
        let current = Arc::clone(&inner.current);
        inner
            .subscribers
            .retain(|tx| tx.send(Arc::clone(&current)).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.lock().subscribers.len()
    }
}

/// Mutation optimiste : `apply` sur une copie publiée immédiatement, puis
/// `write` distant ; en cas d'échec, le snapshot précédent est republié.
pub fn apply_optimistic<T, R, A, W>(state: &LiveState<T>, apply: A, write: W) -> Result<R, CustodyError>
where
    T: Clone,
    A: FnOnce(&mut T),
    W: FnOnce(&T) -> anyhow::Result<R>,
{
    let previous = state.snapshot();
    let mut next = T::clone(&previous);
    apply(&mut next);
    state.publish(next);

    let applied = state.snapshot();
    match write(&applied) {
        Ok(out) => Ok(out),
        Err(err) => {
            tracing::warn!(error = %err, "remote write failed, rolling back local state");
            state.restore(previous);
            Err(CustodyError::Storage(err))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn subscribers_get_current_then_replacements() {
        let state = LiveState::new(vec![1]);
        let rx = state.subscribe();
        state.publish(vec![2, 3]);
        assert_eq!(*rx.recv().unwrap(), vec![1]);
        assert_eq!(*rx.recv().unwrap(), vec![2, 3]);
    }

    #[test]
    fn dropped_receivers_are_pruned() {
        let state = LiveState::new(0u32);
        let rx = state.subscribe();
        assert_eq!(state.subscriber_count(), 1);
        drop(rx);
        state.publish(1);
        assert_eq!(state.subscriber_count(), 0);
    }

    #[test]
    fn failed_write_restores_previous_snapshot() {
        let state = LiveState::new(vec!["a".to_string()]);
        let res: Result<(), _> = apply_optimistic(
            &state,
            |v| v.push("b".into()),
            |v| {
                assert_eq!(v.len(), 2);
                anyhow::bail!("offline")
            },
        );
        assert_eq!(res.unwrap_err().code(), "storage-failure");
        assert_eq!(*state.snapshot(), vec!["a".to_string()]);
    }
}
