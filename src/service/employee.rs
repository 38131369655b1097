use derive_more::From;

use crate::{
    api,
    db::{self, Store},
    permission::{ensure, Actor, PermissionDenied},
};

#[derive(Debug, From)]
pub enum Error {
    #[from]
    Store(db::Error),
    #[from]
    PermissionDenied(PermissionDenied),
}

/// Employee directory for picking assignees. Service desk only.
pub async fn list(
    store: &dyn Store,
    actor: &Actor,
) -> Result<Vec<api::employee::Listing>, Error> {
    ensure(actor.can_list_employees())?;
    let listings = store.list_employees().await?;
    Ok(listings.into_iter().map(Into::into).collect())
}
