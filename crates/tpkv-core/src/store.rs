use crate::error::{Result, TpkvError};
use crate::wal::{Command, Wal};
use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};

/// Field map held by a hash key.
pub type Record = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    Hash,
    Set,
    SortedSet,
}

/// The primitives a Redis-like backend offers. Nothing here joins, groups or
/// plans; executors compose these calls by hand.
///
/// Every call is a blocking round trip with no timeout. Backend failures come
/// back as `Err` and are never retried by callers in this crate.
pub trait KvStore {
    /// Merge `fields` into the hash at `key`, creating it when absent.
    fn hset(&self, key: &str, fields: Record) -> Result<()>;
    fn hgetall(&self, key: &str) -> Result<Option<Record>>;

    /// Returns true when the member was not already present.
    fn sadd(&self, key: &str, member: &str) -> Result<bool>;
    fn smembers(&self, key: &str) -> Result<BTreeSet<String>>;
    fn sismember(&self, key: &str, member: &str) -> Result<bool>;
    /// Exact intersection of all sets; a missing key is an empty set.
    fn sinter(&self, keys: &[&str]) -> Result<BTreeSet<String>>;
    fn scard(&self, key: &str) -> Result<usize>;

    /// Insert or re-score a member.
    fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()>;
    /// Members with `min <= score <= max`, ascending by score then member.
    fn zrangebyscore(&self, key: &str, min: i64, max: i64) -> Result<Vec<String>>;
    fn zcard(&self, key: &str) -> Result<usize>;

    /// Keys matching a glob pattern (`*`, `?`), optionally of one kind only.
    /// This walks the keyspace and is much slower than an index lookup.
    fn scan(&self, pattern: &str, kind: Option<KeyKind>) -> Result<Vec<String>>;

    fn del(&self, key: &str) -> Result<bool>;
}

#[derive(Debug, Clone, Default)]
struct SortedSet {
    scores: HashMap<String, i64>,
    ordered: BTreeSet<(i64, String)>,
}

impl SortedSet {
    fn insert(&mut self, member: &str, score: i64) {
        if let Some(old) = self.scores.insert(member.to_string(), score) {
            self.ordered.remove(&(old, member.to_string()));
        }
        self.ordered.insert((score, member.to_string()));
    }

    fn range(&self, min: i64, max: i64) -> Vec<String> {
        if min > max {
            return Vec::new();
        }
        self.ordered
            .range((min, String::new())..)
            .take_while(|(score, _)| *score <= max)
            .map(|(_, member)| member.clone())
            .collect()
    }
}

#[derive(Debug, Clone)]
enum Value {
    Hash(Record),
    Set(BTreeSet<String>),
    SortedSet(SortedSet),
}

impl Value {
    fn kind(&self) -> KeyKind {
        match self {
            Value::Hash(_) => KeyKind::Hash,
            Value::Set(_) => KeyKind::Set,
            Value::SortedSet(_) => KeyKind::SortedSet,
        }
    }
}

type Keyspace = BTreeMap<String, Value>;

/// In-memory keyspace with an optional append-only log.
pub struct MemoryStore {
    keyspace: RwLock<Keyspace>,
    wal: Option<RwLock<Wal>>,
    sync: bool,
}

#[derive(Debug, Clone, Default)]
pub struct StoreStats {
    pub keys: usize,
    pub hashes: usize,
    pub sets: usize,
    pub sorted_sets: usize,
    pub wal_path: Option<PathBuf>,
    pub wal_bytes: u64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            keyspace: RwLock::new(Keyspace::new()),
            wal: None,
            sync: false,
        }
    }

    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_sync(path, false)
    }

    /// Open a persistent store, replaying `wal.log` under `path`.
    pub fn open_with_sync(path: impl AsRef<Path>, sync: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut wal = Wal::open(&path)?;
        let mut keyspace = Keyspace::new();
        let commands = wal.replay()?;
        let replayed = commands.len();
        for command in commands {
            apply(&mut keyspace, command)?;
        }
        tracing::debug!(path = %path.display(), replayed, "store opened");
        Ok(Self {
            keyspace: RwLock::new(keyspace),
            wal: Some(RwLock::new(wal)),
            sync,
        })
    }

    pub fn flush(&self) -> Result<()> {
        if let Some(wal) = &self.wal {
            wal.write().flush(self.sync)?;
        }
        Ok(())
    }

    /// Rewrite the log so it holds one command per live value. The old log
    /// stays in place until the new one is complete on disk.
    pub fn compact(&self) -> Result<()> {
        let Some(wal) = &self.wal else {
            return Ok(());
        };
        let keyspace = self.keyspace.read();
        let commands = keyspace.iter().flat_map(|(key, value)| snapshot(key, value));
        let before = wal.read().len()?;
        let mut wal = wal.write();
        wal.rewrite(commands)?;
        tracing::info!(before, after = wal.len()?, "log compacted");
        Ok(())
    }

    pub fn stats(&self) -> Result<StoreStats> {
        let keyspace = self.keyspace.read();
        let mut stats = StoreStats {
            keys: keyspace.len(),
            wal_path: self.wal.as_ref().map(|wal| wal.read().path()),
            ..Default::default()
        };
        for value in keyspace.values() {
            match value.kind() {
                KeyKind::Hash => stats.hashes += 1,
                KeyKind::Set => stats.sets += 1,
                KeyKind::SortedSet => stats.sorted_sets += 1,
            }
        }
        if let Some(wal) = &self.wal {
            stats.wal_bytes = wal.read().len()?;
        }
        Ok(stats)
    }

    fn execute(&self, command: Command) -> Result<bool> {
        let mut keyspace = self.keyspace.write();
        check_kind(&keyspace, &command)?;
        if let Some(wal) = &self.wal {
            wal.write().append(&command)?;
        }
        apply(&mut keyspace, command)
    }

    fn with_value<T>(
        &self,
        key: &str,
        kind: KeyKind,
        f: impl FnOnce(Option<&Value>) -> T,
    ) -> Result<T> {
        let keyspace = self.keyspace.read();
        match keyspace.get(key) {
            Some(v) if v.kind() != kind => Err(TpkvError::WrongType {
                key: key.to_string(),
            }),
            other => Ok(f(other)),
        }
    }
}

impl Drop for MemoryStore {
    fn drop(&mut self) {
        let _ = self.flush();
    }
}

impl KvStore for MemoryStore {
    fn hset(&self, key: &str, fields: Record) -> Result<()> {
        self.execute(Command::HSet {
            key: key.to_string(),
            fields: fields.into_iter().collect(),
        })?;
        Ok(())
    }

    fn hgetall(&self, key: &str) -> Result<Option<Record>> {
        self.with_value(key, KeyKind::Hash, |v| match v {
            Some(Value::Hash(fields)) => Some(fields.clone()),
            _ => None,
        })
    }

    fn sadd(&self, key: &str, member: &str) -> Result<bool> {
        self.execute(Command::SAdd {
            key: key.to_string(),
            member: member.to_string(),
        })
    }

    fn smembers(&self, key: &str) -> Result<BTreeSet<String>> {
        self.with_value(key, KeyKind::Set, |v| match v {
            Some(Value::Set(members)) => members.clone(),
            _ => BTreeSet::new(),
        })
    }

    fn sismember(&self, key: &str, member: &str) -> Result<bool> {
        self.with_value(key, KeyKind::Set, |v| match v {
            Some(Value::Set(members)) => members.contains(member),
            _ => false,
        })
    }

    fn sinter(&self, keys: &[&str]) -> Result<BTreeSet<String>> {
        let Some((first, rest)) = keys.split_first() else {
            return Ok(BTreeSet::new());
        };
        let mut acc = self.smembers(first)?;
        for key in rest {
            if acc.is_empty() {
                break;
            }
            let other = self.smembers(key)?;
            acc.retain(|m| other.contains(m));
        }
        Ok(acc)
    }

    fn scard(&self, key: &str) -> Result<usize> {
        self.with_value(key, KeyKind::Set, |v| match v {
            Some(Value::Set(members)) => members.len(),
            _ => 0,
        })
    }

    fn zadd(&self, key: &str, member: &str, score: i64) -> Result<()> {
        self.execute(Command::ZAdd {
            key: key.to_string(),
            member: member.to_string(),
            score,
        })?;
        Ok(())
    }

    fn zrangebyscore(&self, key: &str, min: i64, max: i64) -> Result<Vec<String>> {
        self.with_value(key, KeyKind::SortedSet, |v| match v {
            Some(Value::SortedSet(zset)) => zset.range(min, max),
            _ => Vec::new(),
        })
    }

    fn zcard(&self, key: &str) -> Result<usize> {
        self.with_value(key, KeyKind::SortedSet, |v| match v {
            Some(Value::SortedSet(zset)) => zset.scores.len(),
            _ => 0,
        })
    }

    fn scan(&self, pattern: &str, kind: Option<KeyKind>) -> Result<Vec<String>> {
        let keyspace = self.keyspace.read();
        let prefix = literal_prefix(pattern);
        Ok(keyspace
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .filter(|(k, v)| kind.map_or(true, |want| v.kind() == want) && glob_match(pattern, k))
            .map(|(k, _)| k.clone())
            .collect())
    }

    fn del(&self, key: &str) -> Result<bool> {
        self.execute(Command::Del {
            key: key.to_string(),
        })
    }
}

/// Commands that rebuild `value` under `key` from nothing.
fn snapshot(key: &str, value: &Value) -> Vec<Command> {
    match value {
        Value::Hash(fields) => vec![Command::HSet {
            key: key.to_string(),
            fields: fields.clone().into_iter().collect(),
        }],
        Value::Set(members) => members
            .iter()
            .map(|member| Command::SAdd {
                key: key.to_string(),
                member: member.clone(),
            })
            .collect(),
        Value::SortedSet(zset) => zset
            .ordered
            .iter()
            .map(|(score, member)| Command::ZAdd {
                key: key.to_string(),
                member: member.clone(),
                score: *score,
            })
            .collect(),
    }
}

fn check_kind(keyspace: &Keyspace, command: &Command) -> Result<()> {
    let (key, want) = match command {
        Command::HSet { key, .. } => (key, KeyKind::Hash),
        Command::SAdd { key, .. } => (key, KeyKind::Set),
        Command::ZAdd { key, .. } => (key, KeyKind::SortedSet),
        Command::Del { .. } => return Ok(()),
    };
    match keyspace.get(key) {
        Some(v) if v.kind() != want => Err(TpkvError::WrongType { key: key.clone() }),
        _ => Ok(()),
    }
}

fn apply(keyspace: &mut Keyspace, command: Command) -> Result<bool> {
    check_kind(keyspace, &command)?;
    let changed = match command {
        Command::HSet { key, fields } => {
            let entry = keyspace
                .entry(key)
                .or_insert_with(|| Value::Hash(Record::new()));
            if let Value::Hash(existing) = entry {
                existing.extend(fields);
            }
            true
        }
        Command::SAdd { key, member } => {
            match keyspace
                .entry(key)
                .or_insert_with(|| Value::Set(BTreeSet::new()))
            {
                Value::Set(members) => members.insert(member),
                _ => false,
            }
        }
        Command::ZAdd { key, member, score } => {
            if let Value::SortedSet(zset) = keyspace
                .entry(key)
                .or_insert_with(|| Value::SortedSet(SortedSet::default()))
            {
                zset.insert(&member, score);
            }
            true
        }
        Command::Del { key } => keyspace.remove(&key).is_some(),
    };
    Ok(changed)
}

fn literal_prefix(pattern: &str) -> &str {
    let end = pattern.find(['*', '?']).unwrap_or(pattern.len());
    &pattern[..end]
}

/// Glob match supporting `*` (any run) and `?` (any single char).
pub fn glob_match(pattern: &str, key: &str) -> bool {
    let p: Vec<char> = pattern.chars().collect();
    let k: Vec<char> = key.chars().collect();
    let (mut pi, mut ki) = (0usize, 0usize);
    let mut star: Option<(usize, usize)> = None;
    while ki < k.len() {
        if pi < p.len() && (p[pi] == '?' || p[pi] == k[ki]) {
            pi += 1;
            ki += 1;
        } else if pi < p.len() && p[pi] == '*' {
            star = Some((pi, ki));
            pi += 1;
        } else if let Some((sp, sk)) = star {
            pi = sp + 1;
            ki = sk + 1;
            star = Some((sp, sk + 1));
        } else {
            return false;
        }
    }
    while pi < p.len() && p[pi] == '*' {
        pi += 1;
    }
    pi == p.len()
}
