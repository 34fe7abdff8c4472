use std::{
    collections::HashMap,
    sync::{Mutex, PoisonError},
};

use futures_channel::oneshot;

use crate::{errors::ResolveError, types::{Instance, Token}};

pub(crate) type ResolveResult = Result<Instance, ResolveError>;
pub(crate) type ResolveResponseSender = oneshot::Sender<ResolveResult>;
pub(crate) type ResolveResponseReceiver = oneshot::Receiver<ResolveResult>;

enum Slot {
    Ready(Instance),
    /// Someone is constructing the instance, these are waiting for it
    Pending(Vec<ResolveResponseSender>),
}

/// Outcome of [InstanceCache::claim]
pub(crate) enum Claim<'a> {
    Ready(Instance),
    Wait(ResolveResponseReceiver),
    /// The caller has to construct the instance and publish it through the guard
    Build(BuildGuard<'a>),
}

/// Token to instance map with an in-flight marker per token
///
/// Concurrent resolutions of the same token collapse into one construction,
/// the others wait on a channel for its result.
#[derive(Default)]
pub(crate) struct InstanceCache {
    slots: Mutex<HashMap<Token, Slot>>,
}

impl InstanceCache {
    pub(crate) fn claim(&self, token: &Token) -> Claim<'_> {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get_mut(token) {
            Some(Slot::Ready(instance)) => Claim::Ready(instance.clone()),
            Some(Slot::Pending(waiters)) => {
                let (tx, rx) = oneshot::channel();
                waiters.push(tx);
                Claim::Wait(rx)
            }
            None => {
                slots.insert(token.clone(), Slot::Pending(Vec::new()));
                Claim::Build(BuildGuard {
                    cache: self,
                    token: token.clone(),
                    published: false,
                })
            }
        }
    }

    pub(crate) fn get(&self, token: &Token) -> Option<Instance> {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        match slots.get(token) {
            Some(Slot::Ready(instance)) => Some(instance.clone()),
            _ => None,
        }
    }

    /// (ready, pending) counts
    pub(crate) fn stats(&self) -> (usize, usize) {
        let slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let ready = slots.values().filter(|slot| matches!(slot, Slot::Ready(_))).count();
        (ready, slots.len() - ready)
    }

    fn publish(&self, token: &Token, result: &ResolveResult) {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        let waiters = match slots.remove(token) {
            Some(Slot::Pending(waiters)) => waiters,
            _ => Vec::new(),
        };
        if let Ok(instance) = result {
            slots.insert(token.clone(), Slot::Ready(instance.clone()));
        }
        drop(slots);

        // Error can be ignored, it just means the receiver was dropped
        for waiter in waiters {
            let _ = waiter.send(result.clone());
        }
    }
}

/// Held by the single caller constructing an instance
///
/// Dropping it without publishing (the construction future was dropped)
/// clears the in-flight marker, waiters then receive [ResolveError::Aborted].
pub(crate) struct BuildGuard<'a> {
    cache: &'a InstanceCache,
    token: Token,
    published: bool,
}

impl BuildGuard<'_> {
    pub(crate) fn publish(mut self, result: ResolveResult) -> ResolveResult {
        self.cache.publish(&self.token, &result);
        self.published = true;
        result
    }
}

impl Drop for BuildGuard<'_> {
    fn drop(&mut self) {
        if self.published {
            return;
        }
        let mut slots = self.cache.slots.lock().unwrap_or_else(PoisonError::into_inner);
        if matches!(slots.get(&self.token), Some(Slot::Pending(_))) {
            // Dropping the senders cancels every waiter
            slots.remove(&self.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_waits_for_the_first() {
        let cache = InstanceCache::default();
        let token = Token::named("db");

        let Claim::Build(guard) = cache.claim(&token) else {
            panic!("first claim must build");
        };
        let Claim::Wait(mut rx) = cache.claim(&token) else {
            panic!("second claim must wait");
        };
        assert_eq!(cache.stats(), (0, 1));

        let published = guard.publish(Ok(Instance::new(1u8))).unwrap();
        let received = rx.try_recv().unwrap().unwrap().unwrap();
        assert!(received.ptr_eq(&published));
        assert!(matches!(cache.claim(&token), Claim::Ready(_)));
        assert_eq!(cache.stats(), (1, 0));
    }

    #[test]
    fn dropped_build_cancels_waiters() {
        let cache = InstanceCache::default();
        let token = Token::named("db");

        let guard = cache.claim(&token);
        let Claim::Wait(mut rx) = cache.claim(&token) else {
            panic!("second claim must wait");
        };
        drop(guard);

        assert!(rx.try_recv().is_err());
        assert!(matches!(cache.claim(&token), Claim::Build(_)));
    }

    #[test]
    fn failures_are_not_cached() {
        let cache = InstanceCache::default();
        let token = Token::named("db");

        let Claim::Build(guard) = cache.claim(&token) else {
            panic!("first claim must build");
        };
        let _ = guard.publish(Err(ResolveError::ProviderNotFound(token.clone())));

        assert!(cache.get(&token).is_none());
        assert!(matches!(cache.claim(&token), Claim::Build(_)));
    }
}
