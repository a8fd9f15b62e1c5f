//! Versioned snapshots of engine state.
//!
//! Every persistent engine is written as a JSON envelope:
//!
//! ```json
//! {"kind": "classifier", "digest": "<sha256 hex of body>", "body": {...}}
//! ```
//!
//! The body is the engine's own serde representation, kept as raw JSON text
//! so the digest covers exactly the bytes written. On load the kind and
//! digest are checked, then the engine's [`Persistent::verify`] runs, so a
//! blob that was truncated, hand-edited or written by a different engine is
//! rejected instead of silently restored.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use sha2::{Digest, Sha256};
use std::fmt::Debug;

use super::store::BlobStore;
use crate::error::{MnemoError, Result};
use crate::kernel::{ClassifierNetwork, RelationStore, SequenceAutomaton};

/// Engine state that can round-trip through a [`BlobStore`].
pub trait Persistent: Serialize + DeserializeOwned {
    /// Tag written into the envelope.
    const KIND: &'static str;

    /// Invariant check run after decoding.
    fn verify(&self) -> Result<()> {
        Ok(())
    }

    fn to_blob(&self) -> Result<Vec<u8>> {
        let body = serde_json::value::to_raw_value(self)?;
        let envelope = Envelope {
            kind: Self::KIND.to_string(),
            digest: digest_of(&body),
            body,
        };
        Ok(serde_json::to_vec(&envelope)?)
    }

    fn from_blob(blob: &[u8]) -> Result<Self> {
        let envelope: Envelope = serde_json::from_slice(blob)?;
        if envelope.kind != Self::KIND {
            return Err(MnemoError::InconsistentState(format!(
                "snapshot holds a {:?}, expected {:?}",
                envelope.kind,
                Self::KIND
            )));
        }
        if digest_of(&envelope.body) != envelope.digest {
            return Err(MnemoError::InconsistentState(format!(
                "{} snapshot digest mismatch",
                Self::KIND
            )));
        }
        let value: Self = serde_json::from_str(envelope.body.get())?;
        value.verify()?;
        Ok(value)
    }
}

#[derive(Serialize, Deserialize)]
struct Envelope {
    kind: String,
    digest: String,
    body: Box<RawValue>,
}

/// Hex SHA-256 of the body text as stored.
fn digest_of(body: &RawValue) -> String {
    let hash = Sha256::digest(body.get().as_bytes());
    hash.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Write `value` under `name`. Failures propagate.
pub fn save<T, S>(store: &mut S, name: &str, value: &T) -> Result<()>
where
    T: Persistent,
    S: BlobStore + ?Sized,
{
    let blob = value.to_blob()?;
    store.save(name, &blob)?;
    tracing::debug!(name, kind = T::KIND, bytes = blob.len(), "snapshot saved");
    Ok(())
}

/// Read `name`; `Ok(None)` when nothing is stored.
pub fn load<T, S>(store: &S, name: &str) -> Result<Option<T>>
where
    T: Persistent,
    S: BlobStore + ?Sized,
{
    match store.load(name)? {
        Some(blob) => T::from_blob(&blob).map(Some),
        None => Ok(None),
    }
}

/// Restore `name`, or build a fresh value with `fallback` if the blob is
/// missing or unreadable. Unreadable blobs are logged, never fatal.
pub fn load_or_else<T, S, F>(store: &S, name: &str, fallback: F) -> T
where
    T: Persistent,
    S: BlobStore + ?Sized,
    F: FnOnce() -> T,
{
    match load::<T, S>(store, name) {
        Ok(Some(value)) => {
            tracing::debug!(name, kind = T::KIND, "snapshot restored");
            value
        }
        Ok(None) => fallback(),
        Err(e) => {
            tracing::warn!(name, kind = T::KIND, error = %e, "discarding unreadable snapshot");
            fallback()
        }
    }
}

// =============================================================================
// Kernel engines
// =============================================================================

impl Persistent for ClassifierNetwork {
    const KIND: &'static str = "classifier";

    fn verify(&self) -> Result<()> {
        ClassifierNetwork::verify(self)
    }
}

impl Persistent for RelationStore {
    const KIND: &'static str = "relations";

    fn verify(&self) -> Result<()> {
        RelationStore::verify(self)
    }
}

impl<K, V> Persistent for SequenceAutomaton<K, V>
where
    K: Clone + PartialEq + Debug + Serialize + DeserializeOwned,
    V: Serialize + DeserializeOwned,
{
    const KIND: &'static str = "sequences";

    fn verify(&self) -> Result<()> {
        SequenceAutomaton::verify(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::{Exemplar, Pattern};
    use crate::memory::store::MemoryStore;

    fn trained() -> ClassifierNetwork {
        let mut net = ClassifierNetwork::new(2, 4, 10.0).unwrap();
        net.learn(Exemplar::new(Pattern::from_data(vec![0, 0]), "a")).unwrap();
        net.learn(Exemplar::new(Pattern::from_data(vec![30, 30]), "b")).unwrap();
        net
    }

    #[test]
    fn test_save_and_restore_classifier() {
        let mut store = MemoryStore::new();
        let net = trained();
        save(&mut store, "sight", &net).unwrap();

        let mut restored: ClassifierNetwork = load(&store, "sight").unwrap().unwrap();
        assert_eq!(restored.len(), 2);
        assert_eq!(restored.capacity(), net.capacity());
        restored.recognize(&Pattern::from_data(vec![1, 1])).unwrap();
        assert_eq!(restored.hit_knowledge().unwrap().class_label(), "a");
    }

    #[test]
    fn test_missing_blob_falls_back() {
        let store = MemoryStore::new();
        assert!(load::<RelationStore, _>(&store, "relations").unwrap().is_none());
        let relations = load_or_else(&store, "relations", || RelationStore::new(3));
        assert_eq!(relations.capacity(), 3);
    }

    #[test]
    fn test_tampered_body_is_rejected() {
        let mut store = MemoryStore::new();
        save(&mut store, "sight", &trained()).unwrap();
        let blob = store.load("sight").unwrap().unwrap();
        let text = String::from_utf8(blob).unwrap().replace("\"a\"", "\"z\"");
        store.save("sight", text.as_bytes()).unwrap();

        assert!(matches!(
            load::<ClassifierNetwork, _>(&store, "sight"),
            Err(MnemoError::InconsistentState(_))
        ));
        let fresh = load_or_else(&store, "sight", || ClassifierNetwork::new(2, 4, 10.0).unwrap());
        assert!(fresh.is_empty());
    }

    #[test]
    fn test_fractional_radii_survive_round_trip() {
        use rand::{Rng, SeedableRng};
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(5);
        for _ in 0..500 {
            let mut net = ClassifierNetwork::new(2, 2, 1.5 + rng.gen_range(0.0..40.0)).unwrap();
            net.learn(Exemplar::new(Pattern::from_data(vec![0, 0]), "a")).unwrap();
            net.grow_radius(0, rng.gen_range(0.0..9.0)).unwrap();

            let restored = ClassifierNetwork::from_blob(&net.to_blob().unwrap()).unwrap();
            let (before, after) = (net.cell(0).unwrap(), restored.cell(0).unwrap());
            assert_eq!(before.radius().to_bits(), after.radius().to_bits());
            assert_eq!(restored.default_radius().to_bits(), net.default_radius().to_bits());
        }
    }

    #[test]
    fn test_non_integer_default_radius_reloads() {
        let mut store = MemoryStore::new();
        let mut net = ClassifierNetwork::new(1, 2, 1.977).unwrap();
        net.learn(Exemplar::new(Pattern::from_data(vec![3]), "a")).unwrap();
        save(&mut store, "sight", &net).unwrap();

        let restored = load_or_else(&store, "sight", || ClassifierNetwork::new(1, 2, 1.977).unwrap());
        assert_eq!(restored.len(), 1);
        assert_eq!(restored.cell(0).unwrap().radius(), 1.977);
    }

    #[test]
    fn test_kind_mismatch_is_rejected() {
        let mut store = MemoryStore::new();
        save(&mut store, "blob", &RelationStore::new(2)).unwrap();
        assert!(load::<ClassifierNetwork, _>(&store, "blob").is_err());
    }

    #[test]
    fn test_garbage_is_a_serialization_error() {
        let mut store = MemoryStore::new();
        store.save("relations", b"not json").unwrap();
        assert!(matches!(
            load::<RelationStore, _>(&store, "relations"),
            Err(MnemoError::Serialization(_))
        ));
    }

    #[test]
    fn test_sequence_round_trip_preserves_tails() {
        let mut net: SequenceAutomaton = SequenceAutomaton::new(2);
        net.begin().unwrap();
        net.step(1).unwrap();
        net.confirm(2).unwrap();
        net.commit(77).unwrap();

        let blob = net.to_blob().unwrap();
        let mut restored = SequenceAutomaton::<usize, usize>::from_blob(&blob).unwrap();
        restored.begin().unwrap();
        restored.step(1).unwrap();
        let id = restored.confirm(2).unwrap().recognized().unwrap();
        assert_eq!(restored.tail(id), Some(&77));
    }
}
