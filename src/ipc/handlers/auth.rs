use chrono::Utc;
use serde_json::json;

use crate::ipc::error::{err, ok};
use crate::ipc::helpers::{get_required_str, internal, HandlerErr};
use crate::ipc::types::{AppState, Request};
use crate::store::Store;
use crate::token::TokenSigner;

fn login(
    store: &Store,
    signer: &TokenSigner,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let email = get_required_str(params, "email")?;
    let password = get_required_str(params, "password")?;

    // Plaintext comparison; the demo store never holds real passwords.
    let Some(user) = store
        .users
        .iter()
        .find(|u| u.email == email && u.password == password)
    else {
        return Err(HandlerErr::new(
            "invalid_credential",
            "invalid email or password",
        ));
    };

    let token = signer.issue(user, Utc::now()).map_err(internal)?;
    Ok(json!({
        "token": token,
        "user": {
            "id": user.id,
            "name": user.name,
            "email": user.email,
            "role": user.role.as_str(),
            "studentNo": user.student_no,
            "department": user.department,
        }
    }))
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let (Some(store), Some(signer)) = (state.store.as_ref(), state.signer.as_ref()) else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match login(store, signer, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        _ => None,
    }
}
