//! Content-addressed record store
//!
//! Every record lives in its own file named after its key, holding the
//! bincode-serialized `Record` compressed with zlib. The same store backs the
//! permanent `objects/` area and the `stage/` area, which only differ in the
//! keys they hold.
//!
//! ## Resolution
//!
//! Delta records form chains through their previous hash. `resolve` walks a
//! chain down to its full snapshot, then replays the deltas on the way back
//! up. The walk is iterative, so the depth of a chain is bounded by memory,
//! not by the call stack.

use crate::artifacts::objects::commit::Commit;
use crate::artifacts::objects::delta::Delta;
use crate::artifacts::objects::object_id::ObjectId;
use crate::artifacts::objects::record::Record;
use crate::errors::{IoResultExt, RepositoryError, Result};
use bytes::Bytes;
use fake::rand;
use std::collections::{BTreeMap, HashSet};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

const TEMP_PREFIX: &str = "tmp-obj-";

#[derive(Debug)]
pub struct Database {
    path: Box<Path>,
}

impl Database {
    pub fn new(path: Box<Path>) -> Self {
        Database { path }
    }

    pub fn objects_path(&self) -> &Path {
        &self.path
    }

    fn record_path(&self, key: &str) -> PathBuf {
        self.path.join(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.record_path(key).is_file()
    }

    /// Keys of every stored record, sorted
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();

        for entry in std::fs::read_dir(&self.path).with_path("list", &self.path)? {
            let entry = entry.with_path("list", &self.path)?;
            let name = entry.file_name().to_string_lossy().into_owned();

            if entry.path().is_file() && !name.starts_with(TEMP_PREFIX) {
                keys.push(name);
            }
        }
        keys.sort();

        Ok(keys)
    }

    /// Persist `record` under `key` unless the key is already taken.
    ///
    /// Returns whether anything was written.
    pub fn store(&self, key: &str, record: &Record) -> Result<bool> {
        if self.contains(key) {
            debug!(key, "record already stored");
            return Ok(false);
        }

        self.overwrite(key, record)?;
        Ok(true)
    }

    /// Persist `record` under `key`, replacing whatever was there.
    pub fn overwrite(&self, key: &str, record: &Record) -> Result<()> {
        let content = record.serialize().map_err(|e| RepositoryError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        self.write_object(self.record_path(key), content)?;
        debug!(key, kind = %record.kind(), "record written");

        Ok(())
    }

    pub fn load(&self, key: &str) -> Result<Record> {
        let content = self.read_object(self.record_path(key))?;

        Record::deserialize(&content).map_err(|e| RepositoryError::Codec {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    pub fn load_delta(&self, oid: &ObjectId) -> Result<Delta> {
        match self.load(oid.as_ref()) {
            Ok(Record::Delta(delta)) => Ok(delta),
            Ok(record) => Err(RepositoryError::corrupt_delta(
                oid,
                format!("expected a delta, found a {}", record.kind()),
            )),
            Err(RepositoryError::Codec { reason, .. }) => {
                Err(RepositoryError::corrupt_delta(oid, reason))
            }
            Err(e) => Err(e),
        }
    }

    pub fn load_commit(&self, oid: &ObjectId) -> Result<Commit> {
        match self.load(oid.as_ref()) {
            Ok(Record::Commit(commit)) => Ok(commit),
            Ok(record) => Err(RepositoryError::corrupt_commit(
                oid,
                format!("expected a commit, found a {}", record.kind()),
            )),
            Err(RepositoryError::Codec { reason, .. }) => {
                Err(RepositoryError::corrupt_commit(oid, reason))
            }
            Err(e) => Err(e),
        }
    }

    /// Whether `oid` names a readable content record
    pub fn holds_delta(&self, oid: &ObjectId) -> bool {
        matches!(self.load(oid.as_ref()), Ok(Record::Delta(_)))
    }

    /// Store `lines` as a full snapshot keyed by their content hash.
    pub fn put_snapshot(&self, lines: &[String]) -> Result<ObjectId> {
        let oid = ObjectId::from_lines(lines);
        self.store(oid.as_ref(), &Delta::snapshot(lines.to_vec()).into())?;

        Ok(oid)
    }

    /// Store `lines` as a delta against `base` keyed by their content hash.
    pub fn put_delta(
        &self,
        base: &ObjectId,
        base_lines: &[String],
        lines: &[String],
    ) -> Result<ObjectId> {
        let oid = ObjectId::from_lines(lines);
        let delta = Delta::between(base.clone(), base_lines, lines);
        self.store(oid.as_ref(), &delta.into())?;

        Ok(oid)
    }

    pub fn put_commit(&self, commit: &Commit) -> Result<ObjectId> {
        let oid = commit.object_id();
        self.store(oid.as_ref(), &commit.clone().into())?;

        Ok(oid)
    }

    /// Rebuild the content stored under `oid`.
    ///
    /// Fails with `NotFound` when a record of the chain is missing and with
    /// `CorruptDelta` when a record cannot be decoded, its commands do not fit
    /// its base, the chain loops back on itself or the result does not hash
    /// to `oid`.
    pub fn resolve(&self, oid: &ObjectId) -> Result<Vec<String>> {
        let mut pending = Vec::new();
        let mut visited = HashSet::new();
        let mut current = oid.clone();

        let snapshot = loop {
            visited.insert(current.clone());
            let delta = self.load_delta(&current)?;

            match delta.previous().cloned() {
                None => break delta,
                Some(previous) => {
                    if visited.contains(&previous) {
                        return Err(RepositoryError::corrupt_delta(
                            &current,
                            format!("delta chain loops back to {previous}"),
                        ));
                    }
                    pending.push((current, delta));
                    current = previous;
                }
            }
        };
        debug!(%oid, depth = pending.len(), "resolving delta chain");

        let mut lines = snapshot.into_data();
        while let Some((delta_oid, delta)) = pending.pop() {
            lines = delta
                .apply(lines)
                .map_err(|e| RepositoryError::corrupt_delta(&delta_oid, e))?;
        }

        if &ObjectId::from_lines(&lines) != oid {
            return Err(RepositoryError::corrupt_delta(
                oid,
                "rebuilt content does not match its hash",
            ));
        }

        Ok(lines)
    }

    /// Follow parent links `n` times; `None` once the root has been passed.
    pub fn ancestor(&self, oid: &ObjectId, n: usize) -> Result<Option<ObjectId>> {
        let mut current = oid.clone();

        for _ in 0..n {
            match self.load_commit(&current)?.parent() {
                Some(parent) => current = parent.clone(),
                None => return Ok(None),
            }
        }

        Ok(Some(current))
    }

    /// Every tracked path at `oid` with the hash of its version there.
    ///
    /// A commit's manifest only lists the paths it changed, so the tree is the
    /// union of the manifests along its ancestry, the nearest commit winning.
    pub fn tree(&self, oid: Option<&ObjectId>) -> Result<BTreeMap<String, ObjectId>> {
        let mut tree = BTreeMap::new();
        let mut visited = HashSet::new();
        let mut current = oid.cloned();

        while let Some(commit_oid) = current {
            if !visited.insert(commit_oid.clone()) {
                return Err(RepositoryError::corrupt_commit(
                    &commit_oid,
                    "parent chain loops back on itself",
                ));
            }

            let commit = self.load_commit(&commit_oid)?;
            for entry in commit.files() {
                tree.entry(entry.path().to_string())
                    .or_insert_with(|| entry.oid().clone());
            }
            current = commit.parent().cloned();
        }

        Ok(tree)
    }

    /// Move every record of `other` into this store.
    ///
    /// Records already present here are kept and the incoming copy dropped.
    /// Returns how many records were moved.
    pub fn absorb(&self, other: &Database) -> Result<usize> {
        let mut moved = 0;

        for key in other.keys()? {
            let source = other.record_path(&key);

            if self.contains(&key) {
                std::fs::remove_file(&source).with_path("remove", &source)?;
            } else {
                let target = self.record_path(&key);
                std::fs::rename(&source, &target).with_path("move", &source)?;
                moved += 1;
            }
        }
        debug!(moved, "absorbed staged records");

        Ok(moved)
    }

    pub fn rename(&self, from: &str, to: &str) -> Result<()> {
        let source = self.record_path(from);
        std::fs::rename(&source, self.record_path(to)).with_path("rename", &source)
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        let path = self.record_path(key);
        std::fs::remove_file(&path).with_path("remove", &path)
    }

    fn read_object(&self, object_path: PathBuf) -> Result<Bytes> {
        let object_content = std::fs::read(&object_path).with_path("read", &object_path)?;

        Self::decompress(object_content.into()).map_err(|e| RepositoryError::Codec {
            key: object_path.display().to_string(),
            reason: e.to_string(),
        })
    }

    fn write_object(&self, object_path: PathBuf, object_content: Bytes) -> Result<()> {
        let object_dir = object_path
            .parent()
            .ok_or_else(|| RepositoryError::NotFound(object_path.display().to_string()))?;
        std::fs::create_dir_all(object_dir).with_path("create directory", object_dir)?;
        let temp_object_path = object_dir.join(Self::generate_temp_name());

        let object_content =
            Self::compress(object_content).with_path("compress", &object_path)?;

        let mut file = std::fs::OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(&temp_object_path)
            .with_path("open", &temp_object_path)?;

        file.write_all(&object_content)
            .with_path("write", &temp_object_path)?;

        // rename the temp file to the object file to make it atomic
        std::fs::rename(&temp_object_path, &object_path).with_path("rename", &temp_object_path)
    }

    fn compress(data: Bytes) -> std::io::Result<Bytes> {
        let mut encoder =
            flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
        encoder.write_all(&data)?;

        encoder
            .finish()
            .map(|compressed_content| compressed_content.into())
    }

    fn decompress(data: Bytes) -> std::io::Result<Bytes> {
        let mut decoder = flate2::read::ZlibDecoder::new(&*data);
        let mut decompressed_content = Vec::new();
        decoder.read_to_end(&mut decompressed_content)?;

        Ok(decompressed_content.into())
    }

    fn generate_temp_name() -> String {
        format!("{TEMP_PREFIX}{}", rand::random::<u32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifacts::objects::command::CommandScript;
    use assert_fs::TempDir;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;
    use rstest::{fixture, rstest};

    struct Store {
        // keeps the directory alive for the test
        _dir: TempDir,
        database: Database,
    }

    #[fixture]
    fn store() -> Store {
        empty_store()
    }

    fn empty_store() -> Store {
        let dir = TempDir::new().unwrap();
        let database = Database::new(dir.path().join("objects").into_boxed_path());
        std::fs::create_dir_all(database.objects_path()).unwrap();

        Store {
            _dir: dir,
            database,
        }
    }

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn commit(parent: Option<ObjectId>, files: &[(&str, &ObjectId)]) -> Commit {
        let mut draft = Commit::draft(parent);
        for (path, oid) in files {
            draft.stage_file(path.to_string(), (*oid).clone());
        }
        draft
    }

    #[rstest]
    fn snapshot_resolves_to_its_lines(store: Store) {
        let oid = store.database.put_snapshot(&lines(&["x", "y"])).unwrap();

        assert_eq!(oid, ObjectId::from_lines(&["x", "y"]));
        assert_eq!(store.database.resolve(&oid).unwrap(), lines(&["x", "y"]));
    }

    #[rstest]
    fn storing_the_same_content_twice_keeps_one_record(store: Store) {
        let first = store.database.put_snapshot(&lines(&["x"])).unwrap();
        let second = store.database.put_snapshot(&lines(&["x"])).unwrap();

        assert_eq!(first, second);
        assert_eq!(store.database.keys().unwrap(), vec![first.to_string()]);
    }

    #[rstest]
    fn delta_chain_resolves_oldest_first(store: Store) {
        let v1 = lines(&["a", "b", "c"]);
        let v2 = lines(&["a", "c", "d"]);
        let v3 = lines(&["z", "a", "d"]);

        let oid1 = store.database.put_snapshot(&v1).unwrap();
        let oid2 = store.database.put_delta(&oid1, &v1, &v2).unwrap();
        let oid3 = store.database.put_delta(&oid2, &v2, &v3).unwrap();

        assert_eq!(store.database.resolve(&oid3).unwrap(), v3);
        assert_eq!(store.database.resolve(&oid2).unwrap(), v2);
        assert!(store.database.load_delta(&oid3).unwrap().previous() == Some(&oid2));
    }

    #[rstest]
    fn long_chains_do_not_grow_the_stack(store: Store) {
        let mut previous = lines(&["0"]);
        let mut oid = store.database.put_snapshot(&previous).unwrap();

        for i in 1..2_000 {
            let mut next = previous.clone();
            next.push(i.to_string());
            oid = store.database.put_delta(&oid, &previous, &next).unwrap();
            previous = next;
        }

        assert_eq!(store.database.resolve(&oid).unwrap(), previous);
    }

    #[rstest]
    fn missing_records_are_not_found(store: Store) {
        let error = store
            .database
            .resolve(&ObjectId::from_lines(&["nowhere"]))
            .unwrap_err();

        assert!(error.is_not_found());
    }

    #[rstest]
    fn commands_that_do_not_fit_their_base_are_corrupt(store: Store) {
        let base = store.database.put_snapshot(&lines(&["a"])).unwrap();
        let target = ObjectId::from_lines(&["b"]);
        let delta = Delta::new(
            Some(base),
            "d3".parse::<CommandScript>().unwrap(),
            Vec::new(),
        );
        store.database.store(target.as_ref(), &delta.into()).unwrap();

        assert!(matches!(
            store.database.resolve(&target),
            Err(RepositoryError::CorruptDelta { .. })
        ));
    }

    #[rstest]
    fn looping_chains_are_corrupt(store: Store) {
        let first = ObjectId::from_lines(&["1"]);
        let second = ObjectId::from_lines(&["2"]);
        let empty = CommandScript::default();
        store
            .database
            .store(first.as_ref(), &Delta::new(Some(second.clone()), empty.clone(), vec![]).into())
            .unwrap();
        store
            .database
            .store(second.as_ref(), &Delta::new(Some(first.clone()), empty, vec![]).into())
            .unwrap();

        assert!(matches!(
            store.database.resolve(&first),
            Err(RepositoryError::CorruptDelta { .. })
        ));
    }

    #[rstest]
    fn garbage_records_are_corrupt(store: Store) {
        let oid = ObjectId::from_lines(&["x"]);
        std::fs::write(store.database.objects_path().join(oid.as_ref()), b"garbage").unwrap();

        assert!(matches!(
            store.database.load_delta(&oid),
            Err(RepositoryError::CorruptDelta { .. })
        ));
        assert!(matches!(
            store.database.load_commit(&oid),
            Err(RepositoryError::CorruptCommit { .. })
        ));
    }

    #[rstest]
    fn only_readable_content_records_hold_a_delta(store: Store) {
        let content = store.database.put_snapshot(&lines(&["x"])).unwrap();
        let garbage = ObjectId::from_lines(&["y"]);
        std::fs::write(store.database.objects_path().join(garbage.as_ref()), b"garbage").unwrap();

        assert!(store.database.holds_delta(&content));
        assert!(!store.database.holds_delta(&garbage));
        assert!(!store.database.holds_delta(&ObjectId::from_lines(&["z"])));
    }

    #[rstest]
    fn commit_records_round_trip(store: Store) {
        let file = ObjectId::from_lines(&["x"]);
        let commit = commit(None, &[("a.txt", &file)]);

        let oid = store.database.put_commit(&commit).unwrap();

        assert_eq!(store.database.load_commit(&oid).unwrap(), commit);
        assert!(matches!(
            store.database.load_delta(&oid),
            Err(RepositoryError::CorruptDelta { .. })
        ));
    }

    #[rstest]
    fn ancestors_stop_past_the_root(store: Store) {
        let (a, b, c) = (
            ObjectId::from_lines(&["a"]),
            ObjectId::from_lines(&["b"]),
            ObjectId::from_lines(&["c"]),
        );
        let root = store.database.put_commit(&commit(None, &[("f", &a)])).unwrap();
        let middle = store
            .database
            .put_commit(&commit(Some(root.clone()), &[("f", &b)]))
            .unwrap();
        let tip = store
            .database
            .put_commit(&commit(Some(middle.clone()), &[("f", &c)]))
            .unwrap();

        assert_eq!(store.database.ancestor(&tip, 0).unwrap(), Some(tip.clone()));
        assert_eq!(store.database.ancestor(&tip, 1).unwrap(), Some(middle));
        assert_eq!(store.database.ancestor(&tip, 2).unwrap(), Some(root));
        assert_eq!(store.database.ancestor(&tip, 3).unwrap(), None);
        assert_eq!(store.database.ancestor(&tip, 10).unwrap(), None);
    }

    #[rstest]
    fn tree_merges_manifests_nearest_first(store: Store) {
        let (a1, a2, b1) = (
            ObjectId::from_lines(&["a1"]),
            ObjectId::from_lines(&["a2"]),
            ObjectId::from_lines(&["b1"]),
        );
        let root = store
            .database
            .put_commit(&commit(None, &[("a", &a1), ("b", &b1)]))
            .unwrap();
        let tip = store
            .database
            .put_commit(&commit(Some(root.clone()), &[("a", &a2)]))
            .unwrap();

        let tree = store.database.tree(Some(&tip)).unwrap();

        assert_eq!(
            tree,
            BTreeMap::from([("a".to_string(), a2), ("b".to_string(), b1.clone())])
        );
        assert!(store.database.tree(None).unwrap().is_empty());
    }

    #[rstest]
    fn absorb_moves_records_without_overwriting(store: Store) {
        let staged = Database::new(store.database.objects_path().with_file_name("stage").into());
        std::fs::create_dir_all(staged.objects_path()).unwrap();

        let kept = store.database.put_snapshot(&lines(&["kept"])).unwrap();
        // same key, different record: the store keeps its own
        staged
            .store(kept.as_ref(), &Delta::snapshot(lines(&["other"])).into())
            .unwrap();
        let fresh = staged.put_snapshot(&lines(&["fresh"])).unwrap();

        let moved = store.database.absorb(&staged).unwrap();

        assert_eq!(moved, 1);
        assert!(staged.keys().unwrap().is_empty());
        assert_eq!(store.database.resolve(&kept).unwrap(), lines(&["kept"]));
        assert_eq!(store.database.resolve(&fresh).unwrap(), lines(&["fresh"]));
    }

    proptest! {
        #[test]
        fn stored_deltas_resolve_to_their_target(
            // single-character lines keep distinct sequences from sharing a hash
            base in prop::collection::vec("[a-d]", 0..20),
            target in prop::collection::vec("[a-d]", 0..20),
        ) {
            let store = empty_store();
            let base_oid = store.database.put_snapshot(&base).unwrap();
            let oid = store.database.put_delta(&base_oid, &base, &target).unwrap();

            prop_assert_eq!(store.database.resolve(&base_oid).unwrap(), base);
            prop_assert_eq!(store.database.resolve(&oid).unwrap(), target);
        }
    }
}
