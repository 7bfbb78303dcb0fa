//! Owner display fields for order listings.

use std::collections::HashMap;

use common::UserId;
use domain::{Order, UserProfile};
use serde::Serialize;
use store::UserDirectory;

use crate::error::Result;

/// The owner fields shown next to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
}

impl From<UserProfile> for OwnerSummary {
    fn from(user: UserProfile) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
        }
    }
}

/// An order paired with its owner, if it has one and the owner is known.
#[derive(Debug, Clone)]
pub struct OwnedOrder {
    pub order: Order,
    pub owner: Option<OwnerSummary>,
}

/// Looks up the owners of `orders` in one batch.
///
/// Guest orders and orders whose owner is no longer in the directory get no
/// owner.
pub async fn with_owners<U>(users: &U, orders: Vec<Order>) -> Result<Vec<OwnedOrder>>
where
    U: UserDirectory + ?Sized,
{
    let mut ids: Vec<UserId> = orders.iter().filter_map(Order::user_id).collect();
    ids.sort();
    ids.dedup();

    let owners: HashMap<UserId, OwnerSummary> = if ids.is_empty() {
        HashMap::new()
    } else {
        users
            .get_users(&ids)
            .await?
            .into_iter()
            .map(|u| (u.id, OwnerSummary::from(u)))
            .collect()
    };

    Ok(orders
        .into_iter()
        .map(|order| {
            let owner = order.user_id().and_then(|id| owners.get(&id).cloned());
            OwnedOrder { order, owner }
        })
        .collect())
}
