mod schema;

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use uuid::Uuid;

use crate::models::*;
use crate::store::{LinkedWriteError, OrphanState, PolicyStore, StoreError, WorkspaceStore};

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    pub fn open(path: PathBuf) -> Result<Self> {
        let parent = path
            .parent()
            .ok_or_else(|| anyhow::anyhow!("Database path has no parent directory"))?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn open_default() -> Result<Self> {
        let dirs = directories::ProjectDirs::from("", "", "feature-policies")
            .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
        let db_path = dirs.data_dir().join("feature-policies.db");
        Self::open(db_path)
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn migrate(&self) -> Result<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        schema::run_migrations(&conn)
    }

    // ============================================================
    // Project operations
    // ============================================================

    pub fn get_project(&self, id: Uuid) -> Result<Option<Project>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let project = conn
            .query_row(
                "SELECT id, name, description, created_at, updated_at
                 FROM projects WHERE id = ?",
                [id.to_string()],
                |row| {
                    Ok(Project {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        name: row.get(1)?,
                        description: row.get(2)?,
                        created_at: parse_datetime(row.get::<_, String>(3)?),
                        updated_at: parse_datetime(row.get::<_, String>(4)?),
                    })
                },
            )
            .optional()?;
        Ok(project)
    }

    pub fn create_project(&self, input: CreateProjectInput) -> Result<Project> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO projects (id, name, description, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                &input.description,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Project {
            id,
            name: input.name,
            description: input.description,
            created_at: now,
            updated_at: now,
        })
    }

    // ============================================================
    // Feature operations
    // ============================================================

    pub fn get_feature(&self, id: Uuid) -> Result<Option<Feature>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let feature = conn
            .query_row(
                "SELECT id, project_id, title, created_at, updated_at
                 FROM features WHERE id = ?",
                [id.to_string()],
                |row| {
                    Ok(Feature {
                        id: parse_uuid(row.get::<_, String>(0)?),
                        project_id: parse_uuid(row.get::<_, String>(1)?),
                        title: row.get(2)?,
                        created_at: parse_datetime(row.get::<_, String>(3)?),
                        updated_at: parse_datetime(row.get::<_, String>(4)?),
                    })
                },
            )
            .optional()?;
        Ok(feature)
    }

    pub fn create_feature(&self, project_id: Uuid, input: CreateFeatureInput) -> Result<Feature> {
        self.get_project(project_id)?
            .ok_or_else(|| anyhow::anyhow!("Project not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO features (id, project_id, title, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?)",
            (
                id.to_string(),
                project_id.to_string(),
                &input.title,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Feature {
            id,
            project_id,
            title: input.title,
            created_at: now,
            updated_at: now,
        })
    }

    // ============================================================
    // Policy operations
    // ============================================================

    pub fn get_policy(&self, id: Uuid) -> Result<Option<Policy>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        select_policy(&conn, id)
    }

    pub fn get_policies_by_project(&self, project_id: Uuid) -> Result<Vec<Policy>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, contents, author_id, created_at
             FROM policies WHERE project_id = ? ORDER BY created_at, rowid",
        )?;

        let policies = stmt
            .query_map([project_id.to_string()], policy_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(policies)
    }

    /// Policies attached to a feature, in link order.
    pub fn get_feature_policies(&self, feature_id: Uuid) -> Result<Vec<Policy>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT p.id, p.project_id, p.contents, p.author_id, p.created_at
             FROM policies p
             JOIN feature_policies fp ON fp.policy_id = p.id
             WHERE fp.feature_id = ?
             ORDER BY fp.created_at, fp.rowid",
        )?;

        let policies = stmt
            .query_map([feature_id.to_string()], policy_from_row)?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(policies)
    }

    pub fn create_policy(&self, input: CreatePolicyInput) -> Result<Policy> {
        let conn = self.conn.lock().expect("database lock poisoned");
        insert_policy(&conn, &input)
    }

    pub fn create_feature_policy(&self, input: CreateFeaturePolicyInput) -> Result<FeaturePolicy> {
        let conn = self.conn.lock().expect("database lock poisoned");
        insert_feature_policy(&conn, &input)
    }

    pub fn delete_policy(&self, id: Uuid) -> Result<bool> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let rows = conn.execute("DELETE FROM policies WHERE id = ?", [id.to_string()])?;
        Ok(rows > 0)
    }

    /// Insert a policy and its feature link in one transaction.
    ///
    /// If the link cannot be created the policy insert is rolled back, so no
    /// unlinked policy is ever visible.
    pub fn create_linked_policy(
        &self,
        input: &CreatePolicyInput,
        feature_id: Uuid,
    ) -> std::result::Result<AddedPolicy, LinkedWriteError> {
        let mut conn = self.conn.lock().expect("database lock poisoned");
        let tx = conn
            .transaction()
            .map_err(|e| LinkedWriteError::CreatePolicy(StoreError::Backend(e.to_string())))?;

        let policy = insert_policy(&tx, input)
            .map_err(|e| LinkedWriteError::CreatePolicy(store_error(e)))?;

        let link_input = CreateFeaturePolicyInput {
            feature_id,
            policy_id: policy.id,
        };
        let link = match insert_feature_policy(&tx, &link_input) {
            Ok(link) => link,
            Err(e) => {
                // Dropping the transaction rolls back the policy insert.
                drop(tx);
                return Err(LinkedWriteError::CreateLink {
                    policy_id: policy.id,
                    source: store_error(e),
                    orphan: OrphanState::RolledBack,
                });
            }
        };

        tx.commit().map_err(|e| LinkedWriteError::CreateLink {
            policy_id: policy.id,
            source: StoreError::Backend(e.to_string()),
            orphan: OrphanState::RolledBack,
        })?;

        Ok(AddedPolicy { policy, link })
    }

    // ============================================================
    // Organization / Actor operations
    // ============================================================

    pub fn create_organization(&self, input: CreateOrganizationInput) -> Result<Organization> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO organizations (id, name, owner_id, created_at) VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                &input.name,
                input.owner_id.to_string(),
                now.to_rfc3339(),
            ),
        )?;

        Ok(Organization {
            id,
            name: input.name,
            owner_id: input.owner_id,
            created_at: now,
        })
    }

    pub fn create_actor(&self, input: CreateActorInput) -> Result<Actor> {
        self.get_project(input.project_id)?
            .ok_or_else(|| anyhow::anyhow!("Project not found"))?;

        let conn = self.conn.lock().expect("database lock poisoned");
        let id = Uuid::new_v4();
        let now = Utc::now();

        conn.execute(
            "INSERT INTO actors (id, project_id, name, created_at) VALUES (?, ?, ?, ?)",
            (
                id.to_string(),
                input.project_id.to_string(),
                &input.name,
                now.to_rfc3339(),
            ),
        )?;

        Ok(Actor {
            id,
            project_id: input.project_id,
            name: input.name,
            created_at: now,
        })
    }

    pub fn get_actors_by_project(&self, project_id: Uuid) -> Result<Vec<Actor>> {
        let conn = self.conn.lock().expect("database lock poisoned");
        let mut stmt = conn.prepare(
            "SELECT id, project_id, name, created_at
             FROM actors WHERE project_id = ? ORDER BY name",
        )?;

        let actors = stmt
            .query_map([project_id.to_string()], |row| {
                Ok(Actor {
                    id: parse_uuid(row.get::<_, String>(0)?),
                    project_id: parse_uuid(row.get::<_, String>(1)?),
                    name: row.get(2)?,
                    created_at: parse_datetime(row.get::<_, String>(3)?),
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(actors)
    }
}

// ============================================================
// Store implementations
// ============================================================

#[async_trait]
impl PolicyStore for Database {
    async fn create_policy(&self, input: &CreatePolicyInput) -> Result<Policy, StoreError> {
        Database::create_policy(self, input.clone()).map_err(store_error)
    }

    async fn create_feature_policy(
        &self,
        input: &CreateFeaturePolicyInput,
    ) -> Result<FeaturePolicy, StoreError> {
        Database::create_feature_policy(self, input.clone()).map_err(store_error)
    }

    async fn delete_policy(&self, id: Uuid) -> Result<bool, StoreError> {
        Database::delete_policy(self, id).map_err(store_error)
    }

    async fn create_linked_policy(
        &self,
        input: &CreatePolicyInput,
        feature_id: Uuid,
    ) -> Result<AddedPolicy, LinkedWriteError> {
        Database::create_linked_policy(self, input, feature_id)
    }
}

#[async_trait]
impl WorkspaceStore for Database {
    async fn create_organization(
        &self,
        input: &CreateOrganizationInput,
    ) -> Result<Organization, StoreError> {
        Database::create_organization(self, input.clone()).map_err(store_error)
    }

    async fn create_actor(&self, input: &CreateActorInput) -> Result<Actor, StoreError> {
        Database::create_actor(self, input.clone()).map_err(store_error)
    }
}

fn store_error(e: anyhow::Error) -> StoreError {
    let msg = e.to_string();
    if msg.contains("not found") {
        StoreError::NotFound(msg)
    } else {
        StoreError::Backend(msg)
    }
}

// ============================================================
// Row helpers shared by plain and transactional writes
// ============================================================

fn select_policy(conn: &Connection, id: Uuid) -> Result<Option<Policy>> {
    let policy = conn
        .query_row(
            "SELECT id, project_id, contents, author_id, created_at
             FROM policies WHERE id = ?",
            [id.to_string()],
            policy_from_row,
        )
        .optional()?;
    Ok(policy)
}

fn policy_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Policy> {
    Ok(Policy {
        id: parse_uuid(row.get::<_, String>(0)?),
        project_id: parse_uuid(row.get::<_, String>(1)?),
        contents: row.get(2)?,
        author_id: parse_uuid(row.get::<_, String>(3)?),
        created_at: parse_datetime(row.get::<_, String>(4)?),
    })
}

fn exists(conn: &Connection, table: &str, id: Uuid) -> Result<bool> {
    let count: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM {} WHERE id = ?", table),
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn insert_policy(conn: &Connection, input: &CreatePolicyInput) -> Result<Policy> {
    if !exists(conn, "projects", input.project_id)? {
        anyhow::bail!("Project not found");
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO policies (id, project_id, contents, author_id, created_at)
         VALUES (?, ?, ?, ?, ?)",
        (
            id.to_string(),
            input.project_id.to_string(),
            &input.contents,
            input.author_id.to_string(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(Policy {
        id,
        project_id: input.project_id,
        contents: input.contents.clone(),
        author_id: input.author_id,
        created_at: now,
    })
}

fn insert_feature_policy(
    conn: &Connection,
    input: &CreateFeaturePolicyInput,
) -> Result<FeaturePolicy> {
    if !exists(conn, "features", input.feature_id)? {
        anyhow::bail!("Feature not found");
    }
    if !exists(conn, "policies", input.policy_id)? {
        anyhow::bail!("Policy not found");
    }

    let id = Uuid::new_v4();
    let now = Utc::now();

    conn.execute(
        "INSERT INTO feature_policies (id, feature_id, policy_id, created_at)
         VALUES (?, ?, ?, ?)",
        (
            id.to_string(),
            input.feature_id.to_string(),
            input.policy_id.to_string(),
            now.to_rfc3339(),
        ),
    )?;

    Ok(FeaturePolicy {
        id,
        feature_id: input.feature_id,
        policy_id: input.policy_id,
        created_at: now,
    })
}

fn parse_uuid(s: String) -> Uuid {
    Uuid::parse_str(&s).unwrap_or_else(|_| Uuid::nil())
}

fn parse_datetime(s: String) -> chrono::DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339(&s)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}
