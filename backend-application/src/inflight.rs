use std::collections::HashSet;
use std::sync::Mutex;

/// Process-local claims on entity ids, used where the state machine has no
/// intermediate state to compare-and-swap on.
#[derive(Debug, Default)]
pub struct InFlight {
    ids: Mutex<HashSet<String>>,
}

impl InFlight {
    pub fn try_claim(&self, id: &str) -> Option<Claim<'_>> {
        let mut ids = self.ids.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if !ids.insert(id.to_string()) {
            return None;
        }
        Some(Claim {
            owner: self,
            id: id.to_string(),
        })
    }
}

pub struct Claim<'a> {
    owner: &'a InFlight,
    id: String,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        let mut ids = self
            .owner
            .ids
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        ids.remove(&self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_claim_waits_for_release() {
        let inflight = InFlight::default();
        let first = inflight.try_claim("order-1").expect("first claim");
        assert!(inflight.try_claim("order-1").is_none());
        assert!(inflight.try_claim("order-2").is_some());
        drop(first);
        assert!(inflight.try_claim("order-1").is_some());
    }
}
