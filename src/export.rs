use anyhow::Result;
use rusqlite::Connection;
use std::fs::File;
use std::io::Write;

use crate::db;

// Dump everything stored so far, newest posts first.
pub fn export_json(conn: &Connection, path: &str) -> Result<()> {
    let posts = db::fetch_all_posts(conn)?;

    let json = serde_json::to_string_pretty(&posts)?;

    let mut file = File::create(path)?;
    file.write_all(json.as_bytes())?;

    Ok(())
}
