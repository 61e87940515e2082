//! SQLite implementations of the store traits.
//!
//! Uses rusqlite with bundled SQLite, wrapped in async via
//! `tokio::task::spawn_blocking`. The mutable and immutable stores can share
//! one connection (see [`SqliteMutableStore::immutable_store`]) or open
//! separate files.

use std::collections::HashSet;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension, Transaction};

use trellis_core::{
    now_millis, BinaryMetadata, Dataset, InteractionModel, Iri, Metadata, Quad, Resource,
    StoredResource,
};

use crate::error::{Result, StoreError};
use crate::migration;
use crate::traits::{has_acl, ImmutableDataService, MutableDataService, RetrievalService};

/// A migrated connection shared between store handles.
#[derive(Clone)]
struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    fn open(path: impl AsRef<Path>) -> Result<Self> {
        let mut conn = Connection::open(path)?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    fn open_memory() -> Result<Self> {
        let mut conn = Connection::open_in_memory()?;
        migration::migrate(&mut conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// Run a blocking closure against the connection off the async runtime.
    async fn run<F, T>(&self, f: F) -> Result<T>
    where
        F: FnOnce(&mut Connection) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let conn = self.conn.clone();
        tokio::task::spawn_blocking(move || {
            let mut conn = conn
                .lock()
                .map_err(|e| StoreError::Poisoned(e.to_string()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StoreError::Task(e.to_string()))?
    }
}

// CBOR helpers for BLOB columns

fn encode_quad(quad: &Quad) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(quad, &mut buf).map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_quad(bytes: &[u8]) -> Result<Quad> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn encode_binary(binary: &BinaryMetadata) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    ciborium::into_writer(binary, &mut buf)
        .map_err(|e| StoreError::Serialization(e.to_string()))?;
    Ok(buf)
}

fn decode_binary(bytes: &[u8]) -> Result<BinaryMetadata> {
    ciborium::from_reader(bytes).map_err(|e| StoreError::Serialization(e.to_string()))
}

fn load_quads(conn: &Connection, sql: &str, identifier: &str) -> Result<Dataset> {
    let mut stmt = conn.prepare(sql)?;
    let blobs = stmt
        .query_map(params![identifier], |row| row.get::<_, Vec<u8>>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;

    blobs.iter().map(|blob| decode_quad(blob)).collect()
}

fn check_reserved(reserved: &HashSet<Iri>, identifier: &Iri) -> Result<()> {
    if reserved.contains(identifier) {
        tracing::warn!(%identifier, "rejecting write to reserved identifier");
        return Err(StoreError::rejected(identifier, "identifier is reserved"));
    }
    Ok(())
}

/// Row of the `resources` table, before decoding.
struct ResourceRow {
    interaction_model: String,
    container: Option<String>,
    has_acl: bool,
    binary: Option<Vec<u8>>,
    modified: i64,
}

/// Encoded write, prepared on the async side so encoding errors surface
/// before touching the database.
struct PendingRecord {
    identifier: String,
    interaction_model: String,
    container: Option<String>,
    has_acl: bool,
    binary: Option<Vec<u8>>,
    quads: Vec<Vec<u8>>,
}

impl PendingRecord {
    fn new(metadata: &Metadata, dataset: &Dataset) -> Result<Self> {
        Ok(Self {
            identifier: metadata.identifier().as_str().to_string(),
            interaction_model: metadata.interaction_model().iri().into_string(),
            container: metadata.container().map(|c| c.as_str().to_string()),
            has_acl: has_acl(dataset),
            binary: metadata.binary().map(encode_binary).transpose()?,
            quads: dataset.iter().map(encode_quad).collect::<Result<_>>()?,
        })
    }

    fn write(&self, tx: &Transaction<'_>) -> Result<()> {
        tx.execute(
            "INSERT OR REPLACE INTO resources
                (identifier, interaction_model, container, has_acl, binary, modified)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                self.identifier,
                self.interaction_model,
                self.container,
                self.has_acl,
                self.binary,
                now_millis(),
            ],
        )?;

        tx.execute(
            "DELETE FROM resource_quads WHERE identifier = ?1",
            params![self.identifier],
        )?;

        let mut stmt = tx.prepare(
            "INSERT OR IGNORE INTO resource_quads (identifier, quad) VALUES (?1, ?2)",
        )?;
        for quad in &self.quads {
            stmt.execute(params![self.identifier, quad])?;
        }
        Ok(())
    }
}

fn exists(conn: &Connection, identifier: &str) -> Result<bool> {
    Ok(conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM resources WHERE identifier = ?1)",
        params![identifier],
        |row| row.get(0),
    )?)
}

/// SQLite-backed mutable store.
///
/// Holds one current record per identifier. Thread-safe via an internal
/// Mutex; all operations use spawn_blocking.
pub struct SqliteMutableStore {
    db: Database,
    reserved: HashSet<Iri>,
}

impl SqliteMutableStore {
    /// Open a SQLite database at the given path, creating and migrating it
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            db: Database::open(path)?,
            reserved: HashSet::new(),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_memory()?,
            reserved: HashSet::new(),
        })
    }

    /// Reject every write to these identifiers.
    pub fn with_reserved(mut self, identifiers: impl IntoIterator<Item = Iri>) -> Self {
        self.reserved.extend(identifiers);
        self
    }

    /// An immutable store backed by the same connection.
    pub fn immutable_store(&self) -> SqliteImmutableStore {
        SqliteImmutableStore {
            db: self.db.clone(),
            reserved: HashSet::new(),
        }
    }
}

#[async_trait]
impl RetrievalService for SqliteMutableStore {
    #[tracing::instrument(skip(self), fields(identifier = %identifier))]
    async fn get(&self, identifier: &Iri) -> Result<Resource> {
        let identifier = identifier.clone();

        self.db
            .run(move |conn| {
                let row = conn
                    .query_row(
                        "SELECT interaction_model, container, has_acl, binary, modified
                         FROM resources WHERE identifier = ?1",
                        params![identifier.as_str()],
                        |row| {
                            Ok(ResourceRow {
                                interaction_model: row.get(0)?,
                                container: row.get(1)?,
                                has_acl: row.get(2)?,
                                binary: row.get(3)?,
                                modified: row.get(4)?,
                            })
                        },
                    )
                    .optional()?;

                let Some(row) = row else {
                    return Ok(Resource::Missing);
                };

                let quads = load_quads(
                    conn,
                    "SELECT quad FROM resource_quads WHERE identifier = ?1",
                    identifier.as_str(),
                )?;

                Ok(Resource::Stored(StoredResource {
                    interaction_model: InteractionModel::from_iri(&row.interaction_model)?,
                    container: row.container.map(Iri::new).transpose()?,
                    has_acl: row.has_acl,
                    binary: row.binary.as_deref().map(decode_binary).transpose()?,
                    modified: row.modified,
                    quads,
                    identifier,
                }))
            })
            .await
    }
}

#[async_trait]
impl MutableDataService for SqliteMutableStore {
    #[tracing::instrument(skip_all, fields(identifier = %metadata.identifier()))]
    async fn create(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()> {
        check_reserved(&self.reserved, metadata.identifier())?;
        let record = PendingRecord::new(metadata, dataset)?;

        self.db
            .run(move |conn| {
                let tx = conn.transaction()?;
                if exists(&tx, &record.identifier)? {
                    return Err(StoreError::rejected(
                        &record.identifier,
                        "a current record already exists",
                    ));
                }
                record.write(&tx)?;
                tx.commit()?;
                Ok(())
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(identifier = %metadata.identifier()))]
    async fn replace(&self, metadata: &Metadata, dataset: &Dataset) -> Result<()> {
        check_reserved(&self.reserved, metadata.identifier())?;
        let record = PendingRecord::new(metadata, dataset)?;

        self.db
            .run(move |conn| {
                let tx = conn.transaction()?;
                record.write(&tx)?;
                tx.commit()?;
                Ok(())
            })
            .await
    }

    #[tracing::instrument(skip_all, fields(identifier = %metadata.identifier()))]
    async fn delete(&self, metadata: &Metadata) -> Result<()> {
        check_reserved(&self.reserved, metadata.identifier())?;
        let identifier = metadata.identifier().as_str().to_string();

        self.db
            .run(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "DELETE FROM resource_quads WHERE identifier = ?1",
                    params![identifier],
                )?;
                let removed = tx.execute(
                    "DELETE FROM resources WHERE identifier = ?1",
                    params![identifier],
                )?;
                if removed == 0 {
                    return Err(StoreError::rejected(&identifier, "no current record"));
                }
                tx.commit()?;
                Ok(())
            })
            .await
    }

    async fn touch(&self, identifier: &Iri) -> Result<()> {
        check_reserved(&self.reserved, identifier)?;
        let identifier = identifier.as_str().to_string();

        self.db
            .run(move |conn| {
                let updated = conn.execute(
                    "UPDATE resources SET modified = MAX(modified, ?2) WHERE identifier = ?1",
                    params![identifier, now_millis()],
                )?;
                if updated == 0 {
                    return Err(StoreError::rejected(&identifier, "no current record"));
                }
                Ok(())
            })
            .await
    }
}

/// SQLite-backed append-only store.
pub struct SqliteImmutableStore {
    db: Database,
    reserved: HashSet<Iri>,
}

impl SqliteImmutableStore {
    /// Open a SQLite database at the given path, creating and migrating it
    /// as needed.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        Ok(Self {
            db: Database::open(path)?,
            reserved: HashSet::new(),
        })
    }

    /// Open an in-memory SQLite database.
    pub fn open_memory() -> Result<Self> {
        Ok(Self {
            db: Database::open_memory()?,
            reserved: HashSet::new(),
        })
    }

    /// Reject every append to these identifiers.
    pub fn with_reserved(mut self, identifiers: impl IntoIterator<Item = Iri>) -> Self {
        self.reserved.extend(identifiers);
        self
    }
}

#[async_trait]
impl RetrievalService for SqliteImmutableStore {
    #[tracing::instrument(skip(self), fields(identifier = %identifier))]
    async fn get(&self, identifier: &Iri) -> Result<Resource> {
        let identifier = identifier.clone();

        self.db
            .run(move |conn| {
                let modified: Option<i64> = conn
                    .query_row(
                        "SELECT modified FROM immutable_heads WHERE identifier = ?1",
                        params![identifier.as_str()],
                        |row| row.get(0),
                    )
                    .optional()?;

                let Some(modified) = modified else {
                    return Ok(Resource::Missing);
                };

                let quads = load_quads(
                    conn,
                    "SELECT quad FROM immutable_quads WHERE identifier = ?1 ORDER BY added_at",
                    identifier.as_str(),
                )?;

                Ok(Resource::Stored(StoredResource {
                    identifier,
                    interaction_model: InteractionModel::RdfSource,
                    modified,
                    container: None,
                    has_acl: false,
                    binary: None,
                    quads,
                }))
            })
            .await
    }
}

#[async_trait]
impl ImmutableDataService for SqliteImmutableStore {
    #[tracing::instrument(skip_all, fields(identifier = %identifier, quads = dataset.len()))]
    async fn add(&self, identifier: &Iri, dataset: &Dataset) -> Result<()> {
        check_reserved(&self.reserved, identifier)?;
        if dataset.is_empty() {
            return Ok(());
        }
        let key = identifier.as_str().to_string();
        let quads = dataset.iter().map(encode_quad).collect::<Result<Vec<_>>>()?;

        self.db
            .run(move |conn| {
                let tx = conn.transaction()?;
                let now = now_millis();
                {
                    let mut stmt = tx.prepare(
                        "INSERT OR IGNORE INTO immutable_quads (identifier, quad, added_at)
                         VALUES (?1, ?2, ?3)",
                    )?;
                    for quad in &quads {
                        stmt.execute(params![key, quad, now])?;
                    }
                }
                tx.execute(
                    "INSERT INTO immutable_heads (identifier, modified) VALUES (?1, ?2)
                     ON CONFLICT(identifier) DO UPDATE
                     SET modified = MAX(modified, excluded.modified)",
                    params![key, now],
                )?;
                tx.commit()?;
                Ok(())
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use trellis_core::{graphs, DigestAlgorithm, Term};

    fn iri(s: &str) -> Iri {
        Iri::new(s).unwrap()
    }

    fn quad(graph: &str, s: &str, o: &str) -> Quad {
        Quad::new(
            Some(Term::Iri(iri(graph))),
            Term::Iri(iri(s)),
            iri("http://purl.org/dc/terms/title"),
            Term::literal(o),
        )
    }

    fn dataset(quads: &[Quad]) -> Dataset {
        quads.iter().cloned().collect()
    }

    #[tokio::test]
    async fn test_create_and_get() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");
        let user = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "title");
        let acl = quad(graphs::PREFER_ACCESS_CONTROL, "http://example.com/1#auth", "rule");
        let md = Metadata::builder(id.clone())
            .interaction_model(InteractionModel::BasicContainer)
            .container(iri("http://example.com/"))
            .build()
            .unwrap();

        store
            .create(&md, &dataset(&[user.clone(), acl.clone()]))
            .await
            .unwrap();

        let res = store.get(&id).await.unwrap();
        assert_eq!(res.identifier().unwrap(), &id);
        assert_eq!(res.interaction_model().unwrap(), InteractionModel::BasicContainer);
        assert_eq!(res.container().unwrap().map(Iri::as_str), Some("http://example.com/"));
        assert!(res.has_acl().unwrap());
        assert_eq!(res.quads(), dataset(&[user, acl]));
    }

    #[tokio::test]
    async fn test_binary_metadata_persisted() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let id = iri("http://example.com/bin");
        let binary = BinaryMetadata::new(iri("file:///ab/cd/ef/abcdef"))
            .mime_type("text/plain")
            .digest(DigestAlgorithm::Sha256.digest(b"hello"));
        let md = Metadata::builder(id.clone())
            .interaction_model(InteractionModel::NonRdfSource)
            .binary(binary.clone())
            .build()
            .unwrap();

        store.create(&md, &Dataset::new()).await.unwrap();

        let res = store.get(&id).await.unwrap();
        assert_eq!(res.binary_metadata().unwrap(), Some(&binary));
    }

    #[tokio::test]
    async fn test_missing_is_not_an_error() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let res = store.get(&iri("http://example.com/none")).await.unwrap();
        assert!(res.is_missing());
    }

    #[tokio::test]
    async fn test_create_existing_rejected() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let md = Metadata::builder(iri("http://example.com/1")).build().unwrap();

        store.create(&md, &Dataset::new()).await.unwrap();
        assert!(store.create(&md, &Dataset::new()).await.unwrap_err().is_rejected());
    }

    #[tokio::test]
    async fn test_replace_overwrites_quads() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");
        let md = Metadata::builder(id.clone()).build().unwrap();
        let a = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a");
        let b = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "b");

        store.replace(&md, &dataset(&[a])).await.unwrap();
        store.replace(&md, &dataset(&[b.clone()])).await.unwrap();

        assert_eq!(store.get(&id).await.unwrap().quads(), dataset(&[b]));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");
        let md = Metadata::builder(id.clone()).build().unwrap();
        let a = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a");

        store.create(&md, &dataset(&[a])).await.unwrap();
        store.delete(&md).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_missing());
        assert!(store.delete(&md).await.unwrap_err().is_rejected());

        // The identifier is free again
        store.create(&md, &Dataset::new()).await.unwrap();
        assert!(store.get(&id).await.unwrap().quads().is_empty());
    }

    #[tokio::test]
    async fn test_touch() {
        let store = SqliteMutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");
        let md = Metadata::builder(id.clone()).build().unwrap();

        store.create(&md, &Dataset::new()).await.unwrap();
        let before = store.get(&id).await.unwrap().modified().unwrap();
        store.touch(&id).await.unwrap();
        assert!(store.get(&id).await.unwrap().modified().unwrap() >= before);

        let err = store.touch(&iri("http://example.com/none")).await.unwrap_err();
        assert!(err.is_rejected());
    }

    #[tokio::test]
    async fn test_reserved_rejected_without_mutation() {
        let bad = iri("http://bad.com");
        let store = SqliteMutableStore::open_memory()
            .unwrap()
            .with_reserved([bad.clone()]);
        let md = Metadata::builder(bad.clone()).build().unwrap();

        assert!(store.create(&md, &Dataset::new()).await.unwrap_err().is_rejected());
        assert!(store.get(&bad).await.unwrap().is_missing());
    }

    #[tokio::test]
    async fn test_immutable_append_only() {
        let store = SqliteImmutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");
        let a = quad(graphs::PREFER_AUDIT, "http://example.com/1", "a");
        let b = quad(graphs::PREFER_AUDIT, "http://example.com/1", "b");

        assert!(store.get(&id).await.unwrap().is_missing());

        store.add(&id, &dataset(&[a.clone()])).await.unwrap();
        store.add(&id, &dataset(&[a.clone(), b.clone()])).await.unwrap();

        let res = store.get(&id).await.unwrap();
        assert_eq!(res.quads(), dataset(&[a, b]));
        assert_eq!(res.interaction_model().unwrap(), InteractionModel::RdfSource);
    }

    #[tokio::test]
    async fn test_duplicate_append_advances_modified() {
        let store = SqliteImmutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");
        let a = dataset(&[quad(graphs::PREFER_AUDIT, "http://example.com/1", "a")]);

        store.add(&id, &a).await.unwrap();
        let first = store.get(&id).await.unwrap().modified().unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        store.add(&id, &a).await.unwrap();
        let second = store.get(&id).await.unwrap();

        assert!(second.modified().unwrap() > first);
        assert_eq!(second.quads(), a);
    }

    #[tokio::test]
    async fn test_empty_append_records_nothing() {
        let store = SqliteImmutableStore::open_memory().unwrap();
        let id = iri("http://example.com/1");

        store.add(&id, &Dataset::new()).await.unwrap();
        assert!(store.get(&id).await.unwrap().is_missing());
    }

    #[tokio::test]
    async fn test_shared_connection() {
        let mutable = SqliteMutableStore::open_memory().unwrap();
        let immutable = mutable.immutable_store();
        let id = iri("http://example.com/1");
        let md = Metadata::builder(id.clone()).build().unwrap();
        let a = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a");
        let audit = quad(graphs::PREFER_AUDIT, "http://example.com/1", "created");

        mutable.create(&md, &dataset(&[a.clone()])).await.unwrap();
        immutable.add(&id, &dataset(&[audit.clone()])).await.unwrap();

        assert_eq!(mutable.get(&id).await.unwrap().quads(), dataset(&[a]));
        assert_eq!(immutable.get(&id).await.unwrap().quads(), dataset(&[audit]));
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("resources.db");
        let id = iri("http://example.com/1");
        let a = quad(graphs::PREFER_USER_MANAGED, "http://example.com/1", "a");

        {
            let store = SqliteMutableStore::open(&path).unwrap();
            let md = Metadata::builder(id.clone()).build().unwrap();
            store.create(&md, &dataset(&[a.clone()])).await.unwrap();
        }

        let store = SqliteMutableStore::open(&path).unwrap();
        assert_eq!(store.get(&id).await.unwrap().quads(), dataset(&[a]));
    }
}
