//! Postgres schema for the dispatch tables.
//!
//! No database-backed [`DispatchStore`](crate::infra::DispatchStore) ships with
//! the crate; this module owns the DDL such a store runs on startup.

use crate::core::error::{DispatchError, DispatchResult};

/// Dispatch tables inside one Postgres schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostgresSchema {
    schema: String,
}

impl Default for PostgresSchema {
    fn default() -> Self {
        Self {
            schema: "public".to_string(),
        }
    }
}

impl PostgresSchema {
    /// Target the given schema. The name is spliced into SQL, so it must be
    /// a plain lowercase identifier.
    pub fn new(schema: impl Into<String>) -> DispatchResult<Self> {
        let schema = schema.into();
        let mut chars = schema.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase() || c == '_')
            && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');
        if !valid {
            return Err(DispatchError::Validation(format!("invalid postgres schema name: {schema:?}")));
        }
        Ok(Self { schema })
    }

    /// Target schema name.
    #[must_use]
    pub fn schema(&self) -> &str {
        &self.schema
    }

    /// Migration statements for the dispatch tables.
    ///
    /// `ra_grants` carries a partial index on allocated rows; releasing is an
    /// `UPDATE ... WHERE status = 'allocated' RETURNING *` so it is one-shot.
    /// Preferences and fleets cascade with their hospital. Requests and grants
    /// are history and keep plain ids.
    #[must_use]
    pub fn migrations() -> &'static [&'static str] {
        &[
            r"
CREATE TABLE IF NOT EXISTS ra_hospitals (
    id BIGINT PRIMARY KEY,
    name TEXT NOT NULL,
    address TEXT NOT NULL DEFAULT '',
    phone TEXT,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    total_ambulances INT NOT NULL CHECK (total_ambulances >= 0),
    total_doctors INT NOT NULL CHECK (total_doctors >= 0),
    total_rooms INT NOT NULL CHECK (total_rooms >= 0),
    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
);
",
            r"
CREATE TABLE IF NOT EXISTS ra_scheduling_preferences (
    hospital_id BIGINT PRIMARY KEY REFERENCES ra_hospitals (id) ON DELETE CASCADE,
    policy TEXT NOT NULL CHECK (policy IN ('priority', 'fcfs', 'sjf', 'hrrn')),
    weights JSONB NOT NULL,
    weighted BOOLEAN NOT NULL DEFAULT FALSE
);
",
            r"
CREATE TABLE IF NOT EXISTS ra_ambulances (
    id BIGSERIAL PRIMARY KEY,
    hospital_id BIGINT NOT NULL REFERENCES ra_hospitals (id) ON DELETE CASCADE,
    vehicle_number TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'available'
);
CREATE INDEX IF NOT EXISTS idx_ra_ambulances_hospital_status ON ra_ambulances (hospital_id, status);
",
            r"
CREATE TABLE IF NOT EXISTS ra_requests (
    id UUID PRIMARY KEY,
    patient TEXT NOT NULL,
    hospital_id BIGINT NOT NULL,
    symptoms TEXT NOT NULL,
    priority TEXT NOT NULL,
    latitude DOUBLE PRECISION NOT NULL,
    longitude DOUBLE PRECISION NOT NULL,
    distance_km DOUBLE PRECISION NOT NULL,
    estimated_arrival_minutes INT NOT NULL,
    status TEXT NOT NULL,
    ambulance_id BIGINT,
    created_at_ms NUMERIC NOT NULL,
    assigned_at_ms NUMERIC,
    completed_at_ms NUMERIC,
    closed_at_ms NUMERIC,
    close_reason TEXT
);
CREATE INDEX IF NOT EXISTS idx_ra_requests_hospital_status ON ra_requests (hospital_id, status, created_at_ms);
CREATE INDEX IF NOT EXISTS idx_ra_requests_patient ON ra_requests (patient, created_at_ms DESC);
",
            r"
CREATE TABLE IF NOT EXISTS ra_grants (
    id BIGSERIAL PRIMARY KEY,
    request_id UUID NOT NULL REFERENCES ra_requests (id),
    hospital_id BIGINT NOT NULL,
    kind TEXT NOT NULL CHECK (kind IN ('ambulance', 'doctor', 'room')),
    count INT NOT NULL CHECK (count > 0),
    status TEXT NOT NULL DEFAULT 'allocated',
    allocated_at_ms NUMERIC NOT NULL,
    released_at_ms NUMERIC
);
CREATE INDEX IF NOT EXISTS idx_ra_grants_allocated ON ra_grants (hospital_id) WHERE status = 'allocated';
CREATE INDEX IF NOT EXISTS idx_ra_grants_request ON ra_grants (request_id);
",
        ]
    }

    /// One script creating the schema, selecting it and running every
    /// migration in order.
    #[must_use]
    pub fn setup_script(&self) -> String {
        let mut script = format!(
            "CREATE SCHEMA IF NOT EXISTS {schema};\nSET search_path TO {schema};\n",
            schema = self.schema
        );
        for statement in Self::migrations() {
            script.push_str(statement.trim_start());
        }
        script
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_names_are_plain_identifiers() {
        assert_eq!(PostgresSchema::new("dispatch_v2").unwrap().schema(), "dispatch_v2");
        assert_eq!(PostgresSchema::default().schema(), "public");
        for bad in ["", "2fast", "Dispatch", "x; DROP TABLE ra_requests", "a-b"] {
            assert!(matches!(PostgresSchema::new(bad), Err(DispatchError::Validation(_))), "{bad}");
        }
    }

    #[test]
    fn setup_script_selects_schema_before_tables() {
        let script = PostgresSchema::new("rapidaid").unwrap().setup_script();
        assert!(script.starts_with("CREATE SCHEMA IF NOT EXISTS rapidaid;\nSET search_path TO rapidaid;\n"));
        let tables = ["ra_hospitals", "ra_scheduling_preferences", "ra_ambulances", "ra_requests", "ra_grants"];
        let positions: Vec<_> = tables
            .iter()
            .map(|table| script.find(&format!("CREATE TABLE IF NOT EXISTS {table}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn grants_table_keeps_partial_index_on_allocated_rows() {
        let grants = PostgresSchema::migrations().last().unwrap();
        assert!(grants.contains("WHERE status = 'allocated'"));
    }
}
