//! REST service calls on the `profiles` and `stores` tables.

use reqwest::Method;
use secrecy::SecretString;
use serde::Deserialize;
use tracing::instrument;

use tutaviendo_core::{StoreId, UserId};

use super::{Connection, SupabaseError, check};
use crate::models::{Store, StoreUpdate};

const PROFILES_PATH: &str = "rest/v1/profiles";
const STORES_PATH: &str = "rest/v1/stores";

/// Store columns plus the embedded product rows.
const STORE_SELECT: &str = "*,products(id,name,price)";

/// A row of the `profiles` table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileRow {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub plan_id: Option<String>,
}

/// Fetch the profile of `user_id`, if the row exists.
///
/// # Errors
///
/// Returns `SupabaseError` if the request fails.
#[instrument(skip(conn, access_token))]
pub(crate) async fn fetch_profile(
    conn: &Connection,
    access_token: &SecretString,
    user_id: UserId,
) -> Result<Option<ProfileRow>, SupabaseError> {
    let id_filter = format!("eq.{user_id}");
    let url = conn.endpoint(
        PROFILES_PATH,
        &[("select", "name,avatar_url,plan_id"), ("id", id_filter.as_str())],
    )?;
    let response = conn
        .authed(Method::GET, url, access_token)
        .send()
        .await?;

    let rows: Vec<ProfileRow> = check(response).await?.json().await?;
    Ok(rows.into_iter().next())
}

/// Every store owned by `owner`, oldest first.
///
/// # Errors
///
/// Returns `SupabaseError` if the request fails.
#[instrument(skip(conn, access_token))]
pub(crate) async fn list_stores(
    conn: &Connection,
    access_token: &SecretString,
    owner: UserId,
) -> Result<Vec<Store>, SupabaseError> {
    let owner_filter = format!("eq.{owner}");
    let url = conn.endpoint(
        STORES_PATH,
        &[
            ("select", STORE_SELECT),
            ("owner_id", owner_filter.as_str()),
            ("order", "created_at.asc"),
        ],
    )?;
    let response = conn
        .authed(Method::GET, url, access_token)
        .send()
        .await?;

    Ok(check(response).await?.json().await?)
}

/// Apply `update` to one store and return the saved row, or `None` if no
/// visible row matched.
///
/// # Errors
///
/// Returns `SupabaseError` if the request fails or the write is rejected.
#[instrument(skip(conn, access_token, update))]
pub(crate) async fn update_store(
    conn: &Connection,
    access_token: &SecretString,
    store_id: StoreId,
    update: &StoreUpdate,
) -> Result<Option<Store>, SupabaseError> {
    let id_filter = format!("eq.{store_id}");
    let url = conn.endpoint(
        STORES_PATH,
        &[("select", STORE_SELECT), ("id", id_filter.as_str())],
    )?;
    let response = conn
        .authed(Method::PATCH, url, access_token)
        .header("Prefer", "return=representation")
        .json(update)
        .send()
        .await?;

    let rows: Vec<Store> = check(response).await?.json().await?;
    Ok(rows.into_iter().next())
}
