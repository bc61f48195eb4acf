use std::path::{Path, PathBuf};

use anyhow::anyhow;
use rusqlite::Connection;
use serde_json::json;

use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use crate::token::TokenSigner;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    match open_workspace(&path) {
        Ok((conn, store, signer)) => {
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.store = Some(store);
            state.signer = Some(signer);
            ok(&req.id, json!({ "workspacePath": path.to_string_lossy() }))
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

/// Opens the workspace db, loads (or seeds) the store, and loads or mints the
/// token-signing secret. The secret lives next to the data so credentials
/// stay valid across daemon restarts against the same workspace.
fn open_workspace(path: &Path) -> anyhow::Result<(Connection, Store, TokenSigner)> {
    let conn = db::open_db(path)?;
    let store = Store::load(&conn)?;
    let signer = match db::snapshot_get_json(&conn, db::KEY_TOKEN_SECRET)? {
        Some(v) => v
            .as_str()
            .and_then(TokenSigner::from_hex)
            .ok_or_else(|| anyhow!("corrupt token secret snapshot"))?,
        None => {
            let signer = TokenSigner::generate();
            db::snapshot_set_json(&conn, db::KEY_TOKEN_SECRET, &json!(signer.secret_hex()))?;
            signer
        }
    };
    Ok((conn, store, signer))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
