//! SQLite implementation of [`GraphStore`].
//!
//! [`SqliteStore`] persists conversation nodes and the transcript log in a
//! SQLite database with WAL mode and automatic schema migrations. Response
//! maps are stored as JSON TEXT columns via serde_json; timestamps as
//! RFC 3339 text.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use chatgraph_core::{
    NewTransaction, Node, NodeDraft, NodeId, NodeType, ResponseMap, Sender, SessionId,
    Transaction, TransactionId,
};

use crate::error::StorageError;
use crate::traits::GraphStore;

const NODE_COLUMNS: &str = "id, message, message_name, deletable, node_type, responses_json";
const TRANSACTION_COLUMNS: &str = "id, session_id, message, sender, timestamp";

/// SQLite-backed implementation of [`GraphStore`].
///
/// Every node write runs in a transaction so the singleton check and the
/// write are atomic.
pub struct SqliteStore {
    conn: Connection,
}

/// A node row before its text columns are parsed.
struct NodeRow {
    id: i64,
    message: String,
    message_name: Option<String>,
    deletable: bool,
    node_type: String,
    responses_json: String,
}

/// A transaction row before its text columns are parsed.
struct TransactionRow {
    id: i64,
    session_id: i64,
    message: String,
    sender: String,
    timestamp: String,
}

impl SqliteStore {
    /// Opens (or creates) a SQLite database at `path`.
    pub fn new(path: &str) -> Result<Self, StorageError> {
        let conn = crate::schema::open_database(path)?;
        Ok(SqliteStore { conn })
    }

    /// Opens an in-memory SQLite database (for testing).
    pub fn in_memory() -> Result<Self, StorageError> {
        let conn = crate::schema::open_in_memory()?;
        Ok(SqliteStore { conn })
    }

    // -----------------------------------------------------------------------
    // Internal helpers
    // -----------------------------------------------------------------------

    fn read_node_row(row: &Row<'_>) -> rusqlite::Result<NodeRow> {
        Ok(NodeRow {
            id: row.get(0)?,
            message: row.get(1)?,
            message_name: row.get(2)?,
            deletable: row.get::<_, i64>(3)? != 0,
            node_type: row.get(4)?,
            responses_json: row.get(5)?,
        })
    }

    fn node_from_row(row: NodeRow) -> Result<Node, StorageError> {
        let node_type: NodeType = row
            .node_type
            .parse()
            .map_err(|e| StorageError::IntegrityError {
                reason: format!("node {}: {}", row.id, e),
            })?;
        let responses: ResponseMap = serde_json::from_str(&row.responses_json)?;
        Ok(Node {
            id: NodeId(row.id),
            message: row.message,
            message_name: row.message_name,
            deletable: row.deletable,
            node_type,
            responses,
        })
    }

    fn read_transaction_row(row: &Row<'_>) -> rusqlite::Result<TransactionRow> {
        Ok(TransactionRow {
            id: row.get(0)?,
            session_id: row.get(1)?,
            message: row.get(2)?,
            sender: row.get(3)?,
            timestamp: row.get(4)?,
        })
    }

    fn transaction_from_row(row: TransactionRow) -> Result<Transaction, StorageError> {
        let sender: Sender = row.sender.parse().map_err(|e| StorageError::IntegrityError {
            reason: format!("transaction {}: {}", row.id, e),
        })?;
        let timestamp = DateTime::parse_from_rfc3339(&row.timestamp)
            .map_err(|e| StorageError::IntegrityError {
                reason: format!("transaction {}: bad timestamp: {}", row.id, e),
            })?
            .with_timezone(&Utc);
        Ok(Transaction {
            id: TransactionId(row.id),
            session_id: SessionId(row.session_id),
            message: row.message,
            sender,
            timestamp,
        })
    }

    fn query_nodes(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Node>, StorageError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, Self::read_node_row)?;
        let mut nodes = Vec::new();
        for row in rows {
            nodes.push(Self::node_from_row(row?)?);
        }
        Ok(nodes)
    }

    /// Rejects a second First or Invalid node within the given transaction.
    fn check_singleton(
        tx: &rusqlite::Transaction<'_>,
        node_type: NodeType,
        id: Option<NodeId>,
    ) -> Result<(), StorageError> {
        if !node_type.is_singleton() {
            return Ok(());
        }
        let existing: Option<i64> = tx
            .query_row(
                "SELECT id FROM nodes WHERE node_type = ?1 AND id IS NOT ?2 ORDER BY id LIMIT 1",
                params![node_type.as_str(), id.map(|i| i.0)],
                |row| row.get(0),
            )
            .optional()?;
        match existing {
            Some(existing) => Err(StorageError::IntegrityError {
                reason: format!("a {} node already exists with id {}", node_type, existing),
            }),
            None => Ok(()),
        }
    }
}

impl GraphStore for SqliteStore {
    // -------------------------------------------------------------------
    // Node reads
    // -------------------------------------------------------------------

    fn get_node(&self, id: NodeId) -> Result<Node, StorageError> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {} FROM nodes WHERE id = ?1", NODE_COLUMNS),
                params![id.0],
                Self::read_node_row,
            )
            .optional()?;

        match row {
            Some(row) => Self::node_from_row(row),
            None => Err(StorageError::NodeNotFound(id)),
        }
    }

    fn find_nodes_by_type(&self, node_type: NodeType) -> Result<Vec<Node>, StorageError> {
        self.query_nodes(
            &format!(
                "SELECT {} FROM nodes WHERE node_type = ?1 ORDER BY id",
                NODE_COLUMNS
            ),
            params![node_type.as_str()],
        )
    }

    fn list_nodes(&self) -> Result<Vec<Node>, StorageError> {
        self.query_nodes(
            &format!("SELECT {} FROM nodes ORDER BY id", NODE_COLUMNS),
            [],
        )
    }

    // -------------------------------------------------------------------
    // Node writes
    // -------------------------------------------------------------------

    fn insert_node(&mut self, draft: &NodeDraft) -> Result<Node, StorageError> {
        let responses_json = serde_json::to_string(&draft.responses)?;
        let tx = self.conn.transaction()?;
        Self::check_singleton(&tx, draft.node_type, None)?;
        tx.execute(
            "INSERT INTO nodes (message, message_name, deletable, node_type, responses_json) VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                draft.message,
                draft.message_name,
                draft.deletable as i64,
                draft.node_type.as_str(),
                responses_json,
            ],
        )?;
        let id = NodeId(tx.last_insert_rowid());
        tx.commit()?;
        Ok(draft.clone().into_node(id))
    }

    fn upsert_node(&mut self, node: &Node) -> Result<(), StorageError> {
        let responses_json = serde_json::to_string(&node.responses)?;
        let tx = self.conn.transaction()?;
        Self::check_singleton(&tx, node.node_type, Some(node.id))?;
        tx.execute(
            "INSERT INTO nodes (id, message, message_name, deletable, node_type, responses_json) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET
                message = excluded.message,
                message_name = excluded.message_name,
                deletable = excluded.deletable,
                node_type = excluded.node_type,
                responses_json = excluded.responses_json",
            params![
                node.id.0,
                node.message,
                node.message_name,
                node.deletable as i64,
                node.node_type.as_str(),
                responses_json,
            ],
        )?;
        tx.commit()?;
        Ok(())
    }

    fn delete_node(&mut self, id: NodeId) -> Result<(), StorageError> {
        let affected = self
            .conn
            .execute("DELETE FROM nodes WHERE id = ?1", params![id.0])?;
        if affected == 0 {
            return Err(StorageError::NodeNotFound(id));
        }
        Ok(())
    }

    fn delete_all_nodes(&mut self) -> Result<(), StorageError> {
        self.conn.execute("DELETE FROM nodes", [])?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Transaction log
    // -------------------------------------------------------------------

    fn append_transaction(&mut self, new: &NewTransaction) -> Result<Transaction, StorageError> {
        self.conn.execute(
            "INSERT INTO transactions (session_id, message, sender, timestamp) VALUES (?1, ?2, ?3, ?4)",
            params![
                new.session_id.0,
                new.message,
                new.sender.as_str(),
                new.timestamp.to_rfc3339(),
            ],
        )?;
        let id = TransactionId(self.conn.last_insert_rowid());
        Ok(new.clone().into_transaction(id))
    }

    fn list_transactions(&self, session: SessionId) -> Result<Vec<Transaction>, StorageError> {
        let mut stmt = self.conn.prepare_cached(&format!(
            "SELECT {} FROM transactions WHERE session_id = ?1 ORDER BY id",
            TRANSACTION_COLUMNS
        ))?;
        let rows = stmt.query_map(params![session.0], Self::read_transaction_row)?;
        let mut result = Vec::new();
        for row in rows {
            result.push(Self::transaction_from_row(row?)?);
        }
        Ok(result)
    }
}
