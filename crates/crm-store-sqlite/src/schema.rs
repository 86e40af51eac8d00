//! SQL schema for the CRM SQLite store.
//!
//! Executed once at connection startup. Future migrations will be gated on
//! `PRAGMA user_version`.
//!
//! Column names must match the `FieldSpec` names declared by each entity in
//! `crm-core`; the store builds its statements from those declarations.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

-- AUTOINCREMENT so the id of a deleted row is never handed out again.
CREATE TABLE IF NOT EXISTS contacts (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    version     INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT    NOT NULL,   -- RFC 3339 UTC, nanosecond precision
    updated_at  TEXT,               -- NULL until the first edit
    first_name  TEXT    NOT NULL,
    last_name   TEXT    NOT NULL,
    email       TEXT,
    phone       TEXT,
    company     TEXT,
    position    TEXT,
    address     TEXT
);

CREATE TABLE IF NOT EXISTS clients (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    version         INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT,
    company_name    TEXT    NOT NULL,
    contact_person  TEXT,
    email           TEXT,
    phone           TEXT,
    address         TEXT,
    tax_number      TEXT,
    credit_limit    TEXT                -- decimal as text, exact
);

CREATE TABLE IF NOT EXISTS suppliers (
    id              INTEGER PRIMARY KEY AUTOINCREMENT,
    version         INTEGER NOT NULL DEFAULT 1,
    created_at      TEXT    NOT NULL,
    updated_at      TEXT,
    company_name    TEXT    NOT NULL,
    contact_person  TEXT,
    email           TEXT,
    phone           TEXT,
    address         TEXT,
    tax_number      TEXT,
    category        TEXT
);

CREATE TABLE IF NOT EXISTS prospects (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    version          INTEGER NOT NULL DEFAULT 1,
    created_at       TEXT    NOT NULL,
    updated_at       TEXT,
    company_name     TEXT    NOT NULL,
    contact_person   TEXT,
    email            TEXT,
    phone            TEXT,
    address          TEXT,
    status           INTEGER NOT NULL DEFAULT 0,   -- ProspectStatus code
    estimated_value  TEXT,
    notes            TEXT
);

-- Exactly one parent reference per communication. Deleting the parent
-- deletes its communications.
CREATE TABLE IF NOT EXISTS communications (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    version             INTEGER NOT NULL DEFAULT 1,
    created_at          TEXT    NOT NULL,
    updated_at          TEXT,
    subject             TEXT    NOT NULL,
    content             TEXT    NOT NULL,
    kind                INTEGER NOT NULL DEFAULT 3,   -- CommunicationKind code
    communication_date  TEXT    NOT NULL,
    contact_id          INTEGER REFERENCES contacts(id)  ON DELETE CASCADE,
    client_id           INTEGER REFERENCES clients(id)   ON DELETE CASCADE,
    supplier_id         INTEGER REFERENCES suppliers(id) ON DELETE CASCADE,
    prospect_id         INTEGER REFERENCES prospects(id) ON DELETE CASCADE,
    CHECK (
        (contact_id  IS NOT NULL) + (client_id   IS NOT NULL) +
        (supplier_id IS NOT NULL) + (prospect_id IS NOT NULL) = 1
    )
);

CREATE INDEX IF NOT EXISTS contacts_created_idx       ON contacts(created_at);
CREATE INDEX IF NOT EXISTS clients_created_idx        ON clients(created_at);
CREATE INDEX IF NOT EXISTS suppliers_created_idx      ON suppliers(created_at);
CREATE INDEX IF NOT EXISTS prospects_created_idx      ON prospects(created_at);
CREATE INDEX IF NOT EXISTS communications_created_idx ON communications(created_at);
CREATE INDEX IF NOT EXISTS communications_date_idx    ON communications(communication_date);
CREATE INDEX IF NOT EXISTS communications_contact_idx  ON communications(contact_id);
CREATE INDEX IF NOT EXISTS communications_client_idx   ON communications(client_id);
CREATE INDEX IF NOT EXISTS communications_supplier_idx ON communications(supplier_id);
CREATE INDEX IF NOT EXISTS communications_prospect_idx ON communications(prospect_id);

PRAGMA user_version = 1;
";
