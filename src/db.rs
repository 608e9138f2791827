//! SQLite-backed graph store.
//!
//! Each partition keeps its nodes in one table and its hierarchy entries in another; the child
//! column of a hierarchy table is `UNIQUE`, so the store itself refuses a second parent even if a
//! caller bypasses the mutator.

use futures_core::future::BoxFuture;
use sqlx::{
    error::BoxDynError,
    migrate::{
        MigrateDatabase, Migration as SqlxMigration, MigrationSource, MigrationType, Migrator,
    },
    pool::PoolOptions,
    sqlite::{Sqlite, SqliteConnectOptions},
    ConnectOptions, Pool, Row,
};
use std::{path::Path, result::Result, str::FromStr};

use crate::{
    error::HierarchyError,
    properties::{Edge, EdgeId, Node, NodeId, Partition, RelationKind},
    store::{GraphStore, GraphTxn},
};

/// Table and column names backing one partition.
struct Schema {
    nodes: &'static str,
    label: &'static str,
    hierarchy: &'static str,
    parent: &'static str,
    child: &'static str,
    kind: Option<&'static str>,
}

fn schema(partition: Partition) -> Schema {
    match partition {
        Partition::Notes => Schema {
            nodes: "notes",
            label: "title",
            hierarchy: "note_hierarchy",
            parent: "parent_note_id",
            child: "child_note_id",
            kind: Some("hierarchy_type"),
        },
        Partition::Tags => Schema {
            nodes: "tags",
            label: "name",
            hierarchy: "tag_hierarchy",
            parent: "parent_tag_id",
            child: "child_tag_id",
            kind: None,
        },
    }
}

#[derive(Debug, Clone)]
pub struct DbConnection(pub Pool<Sqlite>);

impl DbConnection {
    pub async fn open<P: AsRef<Path>>(db_path: P) -> Result<Self, HierarchyError> {
        Ok(DbConnection(db_init(db_path).await?))
    }

    /// Creates a note or tag row, standing in for the external node CRUD.
    pub async fn insert_node(
        &self,
        partition: Partition,
        label: &str,
    ) -> Result<NodeId, HierarchyError> {
        let s = schema(partition);
        let sql = format!("INSERT INTO {} ({}) VALUES (?)", s.nodes, s.label);
        let result = sqlx::query(&sql).bind(label).execute(&self.0).await?;
        Ok(NodeId(result.last_insert_rowid()))
    }

    /// Deletes the node row and its tag associations. Hierarchy entries are the caller's to
    /// detach first.
    pub async fn remove_node(
        &self,
        partition: Partition,
        id: NodeId,
    ) -> Result<bool, HierarchyError> {
        let s = schema(partition);
        let mut tx = self.0.begin().await?;
        let assoc_col = match partition {
            Partition::Notes => "note_id",
            Partition::Tags => "tag_id",
        };
        sqlx::query(&format!("DELETE FROM note_tags WHERE {assoc_col} = ?"))
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        let result = sqlx::query(&format!("DELETE FROM {} WHERE id = ?", s.nodes))
            .bind(id.0)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn tag_note(&self, note: NodeId, tag: NodeId) -> Result<(), HierarchyError> {
        sqlx::query("INSERT OR IGNORE INTO note_tags (note_id, tag_id) VALUES (?, ?)")
            .bind(note.0)
            .bind(tag.0)
            .execute(&self.0)
            .await?;
        Ok(())
    }

    /// `(nodes, hierarchy entries)` stored for `partition`.
    pub async fn counts(&self, partition: Partition) -> Result<(i64, i64), HierarchyError> {
        let s = schema(partition);
        let nodes = sqlx::query(&format!("SELECT COUNT(*) FROM {}", s.nodes))
            .fetch_one(&self.0)
            .await?
            .get::<i64, usize>(0);
        let edges = sqlx::query(&format!("SELECT COUNT(*) FROM {}", s.hierarchy))
            .fetch_one(&self.0)
            .await?
            .get::<i64, usize>(0);
        Ok((nodes, edges))
    }
}

impl GraphStore for DbConnection {
    type Txn = DbTxn;

    async fn begin(&self) -> Result<DbTxn, HierarchyError> {
        Ok(DbTxn(self.0.begin().await?))
    }
}

/// An open SQLite transaction. Dropped without commit, it rolls back.
pub struct DbTxn(sqlx::Transaction<'static, Sqlite>);

impl GraphTxn for DbTxn {
    #[tracing::instrument(skip(self))]
    async fn list_nodes(&mut self, partition: Partition) -> Result<Vec<Node>, HierarchyError> {
        let s = schema(partition);
        let sql = format!("SELECT id, {} FROM {} ORDER BY id", s.label, s.nodes);
        let rows = sqlx::query_as::<_, (i64, String)>(&sql)
            .fetch_all(&mut *self.0)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(id, label)| Node::new(NodeId(id), label))
            .collect())
    }

    #[tracing::instrument(skip(self))]
    async fn list_edges(&mut self, partition: Partition) -> Result<Vec<Edge>, HierarchyError> {
        let s = schema(partition);
        let sql = format!(
            "SELECT {}, {}, {} FROM {} ORDER BY id",
            s.parent,
            s.child,
            s.kind.unwrap_or("NULL"),
            s.hierarchy
        );
        let rows = sqlx::query_as::<_, (i64, i64, Option<String>)>(&sql)
            .fetch_all(&mut *self.0)
            .await?;
        Ok(rows
            .into_iter()
            .map(|(parent, child, kind)| Edge {
                parent: NodeId(parent),
                child: NodeId(child),
                kind: kind.and_then(|raw| match RelationKind::from_str(&raw) {
                    Ok(kind) => Some(kind),
                    Err(_) => {
                        tracing::warn!(
                            "Stored {partition} entry {parent} -> {child} has unknown kind \
                            {raw:?}, treating it as untyped"
                        );
                        None
                    }
                }),
            })
            .collect())
    }

    async fn list_tagged_notes(&mut self) -> Result<Vec<(NodeId, Node)>, HierarchyError> {
        let rows = sqlx::query_as::<_, (i64, i64, String)>(
            "SELECT nt.tag_id, n.id, n.title FROM note_tags nt \
             JOIN notes n ON n.id = nt.note_id ORDER BY nt.tag_id, n.id",
        )
        .fetch_all(&mut *self.0)
        .await?;
        Ok(rows
            .into_iter()
            .map(|(tag, id, title)| (NodeId(tag), Node::new(NodeId(id), title)))
            .collect())
    }

    async fn insert_edge(
        &mut self,
        partition: Partition,
        edge: Edge,
    ) -> Result<EdgeId, HierarchyError> {
        let s = schema(partition);
        let result = match s.kind {
            Some(kind_col) => {
                let sql = format!(
                    "INSERT INTO {} ({}, {}, {kind_col}) VALUES (?, ?, ?)",
                    s.hierarchy, s.parent, s.child
                );
                sqlx::query(&sql)
                    .bind(edge.parent.0)
                    .bind(edge.child.0)
                    .bind(edge.kind.map(|kind| kind.as_str()))
                    .execute(&mut *self.0)
                    .await?
            }
            None => {
                let sql = format!(
                    "INSERT INTO {} ({}, {}) VALUES (?, ?)",
                    s.hierarchy, s.parent, s.child
                );
                sqlx::query(&sql)
                    .bind(edge.parent.0)
                    .bind(edge.child.0)
                    .execute(&mut *self.0)
                    .await?
            }
        };
        Ok(EdgeId(result.last_insert_rowid()))
    }

    async fn replace_edge(
        &mut self,
        partition: Partition,
        edge: Edge,
    ) -> Result<bool, HierarchyError> {
        let s = schema(partition);
        let result = match s.kind {
            Some(kind_col) => {
                let sql = format!(
                    "UPDATE {} SET {} = ?, {kind_col} = ? WHERE {} = ?",
                    s.hierarchy, s.parent, s.child
                );
                sqlx::query(&sql)
                    .bind(edge.parent.0)
                    .bind(edge.kind.map(|kind| kind.as_str()))
                    .bind(edge.child.0)
                    .execute(&mut *self.0)
                    .await?
            }
            None => {
                let sql = format!(
                    "UPDATE {} SET {} = ? WHERE {} = ?",
                    s.hierarchy, s.parent, s.child
                );
                sqlx::query(&sql)
                    .bind(edge.parent.0)
                    .bind(edge.child.0)
                    .execute(&mut *self.0)
                    .await?
            }
        };
        Ok(result.rows_affected() > 0)
    }

    async fn delete_edge(
        &mut self,
        partition: Partition,
        child: NodeId,
    ) -> Result<bool, HierarchyError> {
        let s = schema(partition);
        let sql = format!("DELETE FROM {} WHERE {} = ?", s.hierarchy, s.child);
        let result = sqlx::query(&sql)
            .bind(child.0)
            .execute(&mut *self.0)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn commit(self) -> Result<(), HierarchyError> {
        self.0.commit().await?;
        Ok(())
    }
}

/// A migration definition.
#[derive(Debug, Clone)]
pub struct Migration {
    pub version: i64,
    pub description: &'static str,
    pub sql: &'static str,
    pub kind: MigrationType,
}

#[derive(Debug, Clone)]
struct MigrationList(Vec<Migration>);

impl MigrationSource<'static> for MigrationList {
    fn resolve(self) -> BoxFuture<'static, Result<Vec<SqlxMigration>, BoxDynError>> {
        Box::pin(async move {
            Ok(self
                .0
                .into_iter()
                .filter(|migration| matches!(migration.kind, MigrationType::Simple))
                .map(|migration| {
                    SqlxMigration::new(
                        migration.version,
                        migration.description.into(),
                        migration.kind,
                        migration.sql.into(),
                        false,
                    )
                })
                .collect())
        })
    }
}

fn migrations() -> MigrationList {
    MigrationList(vec![Migration {
        version: 1,
        description: "create_hierarchy_tables",
        sql: "\
        CREATE TABLE notes (id INTEGER PRIMARY KEY AUTOINCREMENT, title TEXT NOT NULL); \
        CREATE TABLE tags (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT NOT NULL); \
        CREATE TABLE note_tags (note_id INTEGER NOT NULL, tag_id INTEGER NOT NULL, \
            PRIMARY KEY (note_id, tag_id)); \
        CREATE TABLE note_hierarchy (id INTEGER PRIMARY KEY AUTOINCREMENT, \
            parent_note_id INTEGER NOT NULL, child_note_id INTEGER NOT NULL UNIQUE, \
            hierarchy_type TEXT); \
        CREATE TABLE tag_hierarchy (id INTEGER PRIMARY KEY AUTOINCREMENT, \
            parent_tag_id INTEGER NOT NULL, child_tag_id INTEGER NOT NULL UNIQUE);",
        kind: MigrationType::Simple,
    }])
}

/// Opens (creating if needed) the SQLite file at `db_path` and brings its schema up to date.
pub async fn db_init<P: AsRef<Path>>(db_path: P) -> Result<Pool<Sqlite>, HierarchyError> {
    let fqdb = format!("sqlite:{}", db_path.as_ref().display());
    tracing::debug!("Initializing hierarchy db from file: {:?}", fqdb);
    if !Sqlite::database_exists(&fqdb).await.unwrap_or(false) {
        Sqlite::create_database(&fqdb).await?;
    }
    let options = SqliteConnectOptions::from_str(&fqdb)?
        .read_only(false)
        .disable_statement_logging()
        .create_if_missing(true);
    let pool = PoolOptions::<Sqlite>::new().connect_with(options).await?;

    let migrator = Migrator::new(migrations()).await?;
    migrator.run(&pool).await?;

    let db = DbConnection(pool);
    let mut summary = String::new();
    for partition in Partition::all() {
        let (nodes, edges) = db.counts(*partition).await?;
        summary.push_str(&format!(
            "\n \t{partition}:\t{nodes} ({edges} hierarchy entries)"
        ));
    }
    tracing::info!("DB Connection initialized.{summary}");

    Ok(db.0)
}
