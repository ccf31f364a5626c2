//! SQL schema for the artisan SQLite store.
//!
//! Executed once at connection startup. Upgrades of older files are gated on
//! `PRAGMA user_version`.

/// Full schema DDL; idempotent thanks to `IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS members (
    member_id INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL,
    realm     TEXT NOT NULL,           -- realm slug
    owner     TEXT,                    -- linked chat identity, NULL if unclaimed
    class     TEXT,
    spec      TEXT,
    role      TEXT,                    -- derived; re-derived again on read
    is_main   INTEGER NOT NULL DEFAULT 0,
    UNIQUE (name, realm)
);

-- At most one main per owner.
CREATE UNIQUE INDEX IF NOT EXISTS members_one_main_idx
    ON members(owner) WHERE is_main = 1;

CREATE TABLE IF NOT EXISTS professions (
    profession_id INTEGER PRIMARY KEY AUTOINCREMENT,
    external_id   INTEGER NOT NULL UNIQUE,
    name          TEXT NOT NULL UNIQUE,
    -- every skill tier fetched; recipe bootstrap skips the profession
    recipes_bootstrapped INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS recipes (
    recipe_id       INTEGER PRIMARY KEY AUTOINCREMENT,
    profession_id   INTEGER NOT NULL REFERENCES professions(profession_id),
    skill_tier_id   INTEGER,
    skill_tier_name TEXT,
    external_id     INTEGER NOT NULL,
    name            TEXT NOT NULL,
    item_id         INTEGER,            -- resolved lazily
    UNIQUE (profession_id, external_id)
);

-- Which member currently knows which recipe.
CREATE TABLE IF NOT EXISTS member_recipes (
    member_id     INTEGER NOT NULL REFERENCES members(member_id),
    profession_id INTEGER NOT NULL REFERENCES professions(profession_id),
    recipe_id     INTEGER NOT NULL REFERENCES recipes(recipe_id),
    PRIMARY KEY (member_id, profession_id, recipe_id)
);

CREATE INDEX IF NOT EXISTS members_class_idx          ON members(class COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS members_owner_idx          ON members(owner);
CREATE INDEX IF NOT EXISTS professions_name_idx       ON professions(name COLLATE NOCASE);
CREATE INDEX IF NOT EXISTS recipes_profession_idx     ON recipes(profession_id);
CREATE INDEX IF NOT EXISTS recipes_item_idx           ON recipes(item_id);
CREATE INDEX IF NOT EXISTS member_recipes_recipe_idx  ON member_recipes(recipe_id);
CREATE INDEX IF NOT EXISTS member_recipes_prof_idx    ON member_recipes(profession_id);

PRAGMA user_version = 2;
";

/// Version 1 files predate the per-profession bootstrap flag.
pub const MIGRATE_V1_TO_V2: &str = "
ALTER TABLE professions ADD COLUMN recipes_bootstrapped INTEGER NOT NULL DEFAULT 0;
PRAGMA user_version = 2;
";
